//! Async operation state tracking and subscription lifecycle management for
//! event-driven applications.
//!
//! `opstate` provides two loosely related utilities built on tokio:
//!
//! - [`OperationTracker`]: wraps a single asynchronous fetch behind an
//!   observable three-state cell ([`OperationState`]: `Loading`, `Success`,
//!   `Error`), re-runnable on demand, with optional retention of the last
//!   good value across reloads and mount-aware suppression of late results
//!   after [`dispose`].
//! - [`SubscriptionRegistry`]: records every subscription created through
//!   it and cancels them in bulk, so a consumer's teardown stops all item
//!   delivery with one awaited call.
//!
//! Both may be owned by the same consumer, but neither depends on the other.
//!
//! # Tracking an asynchronous fetch
//!
//! ```no_run
//! use opstate::subscribe::Subscriber;
//! use opstate::{OperationState, OperationTracker, Subscribeable, TrackerConfig};
//!
//! # async fn demo() {
//! let mut user_count = OperationTracker::new(
//!     || {
//!         Box::pin(async {
//!             // Query a backend, read a file, anything that suspends.
//!             Ok::<_, Box<dyn std::error::Error + Send + Sync>>(1337_u64)
//!         })
//!     },
//!     TrackerConfig::new(),
//! );
//!
//! user_count.subscribe(Subscriber::on_next(|state| match state {
//!     OperationState::Loading { data } => println!("loading (cached: {:?})", data),
//!     OperationState::Success { data } => println!("loaded: {}", data),
//!     OperationState::Error { message, .. } => println!("failed: {:?}", message),
//! }));
//!
//! // Soft refresh, keeping the previous value visible while in flight.
//! user_count.reload(true).await.unwrap();
//! # }
//! ```
//!
//! # Registering and bulk-cancelling subscriptions
//!
//! ```no_run
//! use opstate::subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic};
//! use opstate::{Observer, Source, SubscriptionRegistry};
//!
//! # async fn demo() {
//! let mut ticks = Source::new(|mut subscriber: Subscriber<u32>| {
//!     for i in 0..5 {
//!         subscriber.next(i);
//!     }
//!     subscriber.complete();
//!     Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
//! });
//!
//! let mut registry = SubscriptionRegistry::new();
//! registry.listen(&mut ticks, Subscriber::on_next(|v| println!("tick {}", v)));
//!
//! // First action of the consumer's teardown.
//! registry.cancel_all().await;
//! # }
//! ```
//!
//! [`dispose`]: OperationTracker::dispose

mod errors;
pub mod observer;
pub mod registry;
pub mod source;
pub mod subscription;
pub mod tracker;

pub use errors::*;
pub use observer::Observer;
pub use registry::{SubscriptionId, SubscriptionRegistry};
pub use source::Source;
pub use subscription::subscribe;
pub use subscription::subscribe::{Subscribeable, Unsubscribeable};
pub use tracker::{FetchFuture, OperationState, OperationTracker, TrackerConfig};
