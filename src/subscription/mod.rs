//! Subscription management: the [`Subscriber`] that receives pushed values,
//! the [`Subscription`] that controls an active registration, and the traits
//! and unsubscribe strategies that tie them together.
//!
//! [`Subscriber`]: subscribe::Subscriber
//! [`Subscription`]: subscribe::Subscription
pub mod subscribe;
