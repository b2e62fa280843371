//! The `registry` module provides [`SubscriptionRegistry`], a bookkeeping
//! list of active subscriptions with a single bulk-cancel operation.

use crate::subscription::subscribe::{Subscribeable, Subscriber, Subscription, Unsubscribeable};

/// Identifies one registration within a [`SubscriptionRegistry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Records every subscription created through it and cancels them in bulk.
///
/// A consumer owning several subscriptions holds one registry, routes all
/// `subscribe` calls through [`listen`], and calls [`cancel_all`] as the
/// first action of its teardown. Dropping the registry cancels whatever is
/// still registered (asynchronous unsubscribe logic is spawned rather than
/// awaited in that case); call `cancel_all().await` when teardown must not
/// proceed before every cancellation has settled.
///
/// [`listen`]: SubscriptionRegistry::listen
/// [`cancel_all`]: SubscriptionRegistry::cancel_all
pub struct SubscriptionRegistry {
    entries: Vec<(SubscriptionId, Subscription)>,
    next_id: u64,
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        SubscriptionRegistry {
            entries: Vec::new(),
            next_id: 0,
        }
    }

    /// Subscribes `subscriber` to `source` and records the resulting
    /// subscription.
    ///
    /// The returned id can be passed to [`cancel`] to detach this one
    /// registration early; otherwise the registration lives until
    /// [`cancel_all`] or the registry is dropped. Any number of simultaneous
    /// registrations is supported, including several on the same source.
    ///
    /// [`cancel`]: SubscriptionRegistry::cancel
    /// [`cancel_all`]: SubscriptionRegistry::cancel_all
    pub fn listen<S>(&mut self, source: &mut S, subscriber: Subscriber<S::ObsType>) -> SubscriptionId
    where
        S: Subscribeable,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        let subscription = source.subscribe(subscriber);
        self.entries.push((id, subscription));
        id
    }

    /// Cancels one registration. Unknown or already cancelled ids are a
    /// no-op.
    pub fn cancel(&mut self, id: SubscriptionId) {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == id) {
            let (_, subscription) = self.entries.remove(pos);
            subscription.unsubscribe();
        }
    }

    /// Cancels every recorded registration, resolving once all cancellations
    /// have settled.
    ///
    /// Safe to call on an empty registry and safe to call repeatedly; item
    /// callbacks of cancelled registrations no longer fire once this
    /// returns, though a callback already executing is not interrupted.
    pub async fn cancel_all(&mut self) {
        if self.entries.is_empty() {
            return;
        }
        tracing::debug!(count = self.entries.len(), "cancelling all subscriptions");
        for (_, subscription) in self.entries.drain(..) {
            subscription.cancel().await;
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for SubscriptionRegistry {
    fn drop(&mut self) {
        for (_, subscription) in self.entries.drain(..) {
            subscription.unsubscribe();
        }
    }
}
