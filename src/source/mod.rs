//! The `source` module provides [`Source`], a cold push-based producer of
//! values that consumers subscribe to.

use crate::subscription::subscribe::{Subscribeable, Subscriber, Subscription};

/// A cold push source of values.
///
/// A `Source` wraps a subscribe function that is run once per subscriber;
/// the function pushes items into the given [`Subscriber`] and returns a
/// [`Subscription`] describing how to stop the emission. Items are delivered
/// in the order the producer emits them, once per item, synchronously with
/// respect to the producer.
///
/// # Example
///
/// ```no_run
/// use opstate::subscribe::{Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic};
/// use opstate::{Observer, Source, Subscribeable};
///
/// let mut numbers = Source::new(|mut subscriber: Subscriber<i32>| {
///     for i in 1..=10 {
///         subscriber.next(i);
///     }
///     subscriber.complete();
///     Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil)
/// });
///
/// numbers.subscribe(Subscriber::new(
///     |v| println!("emitted {}", v),
///     |_| eprintln!("error"),
///     || println!("completed"),
/// ));
/// ```
///
/// Asynchronous sources spawn a tokio task inside the subscribe function and
/// return a `Subscription` carrying the task's join handle together with
/// unsubscribe logic that stops the task.
pub struct Source<T> {
    subscribe_fn: Box<dyn FnMut(Subscriber<T>) -> Subscription + Send>,
}

impl<T: 'static> Source<T> {
    /// Creates a `Source` from the given subscribe function.
    pub fn new(sf: impl FnMut(Subscriber<T>) -> Subscription + Send + 'static) -> Self {
        Source {
            subscribe_fn: Box::new(sf),
        }
    }
}

impl<T: 'static> Subscribeable for Source<T> {
    type ObsType = T;

    fn subscribe(&mut self, v: Subscriber<Self::ObsType>) -> Subscription {
        (self.subscribe_fn)(v)
    }
}
