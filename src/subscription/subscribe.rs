use std::{error::Error, future::Future, pin::Pin, sync::Arc};

use tokio::runtime;
use tokio::task::JoinHandle;

use crate::observer::Observer;

/// A trait for types that can be subscribed to, allowing consumers to receive
/// values pushed by a source.
pub trait Subscribeable {
    /// The type of items emitted by the source.
    type ObsType;

    /// Subscribes to the source and specifies how to handle emitted values.
    ///
    /// The `Subscriber` parameter defines the behavior for processing values
    /// pushed by the source. The returned `Subscription` lets the caller
    /// detach the registration and release associated resources.
    fn subscribe(&mut self, s: Subscriber<Self::ObsType>) -> Subscription;
}

/// A trait for types that can be unsubscribed, releasing the resources
/// associated with an active registration.
///
/// The value this method is called on is consumed, so a registration can be
/// cancelled at most once through it.
pub trait Unsubscribeable {
    fn unsubscribe(self);
}

type NextFn<T> = Box<dyn FnMut(T) + Send>;
type CompleteFn = Box<dyn FnMut() + Send + Sync>;
type ErrorFn = Box<dyn FnMut(Arc<dyn Error + Send + Sync>) + Send + Sync>;

/// Receives values, errors and completion from a source a consumer has
/// subscribed to.
///
/// Once `complete` or `error` has fired, the subscriber is terminal: further
/// `next` calls are ignored and the terminal handlers fire at most once.
pub struct Subscriber<NextFnType> {
    next_fn: NextFn<NextFnType>,
    complete_fn: Option<CompleteFn>,
    error_fn: Option<ErrorFn>,
    completed: bool,
    errored: bool,
}

impl<NextFnType> Subscriber<NextFnType> {
    /// Creates a new `Subscriber` with handling functions for emitted values,
    /// errors, and completion.
    pub fn new(
        next_fn: impl FnMut(NextFnType) + 'static + Send,
        error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send + Sync,
        complete_fn: impl FnMut() + 'static + Send + Sync,
    ) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: Some(Box::new(complete_fn)),
            error_fn: Some(Box::new(error_fn)),
            completed: false,
            errored: false,
        }
    }

    /// Creates a new `Subscriber` with only a `next` function; errors and
    /// completion are ignored.
    pub fn on_next(next_fn: impl FnMut(NextFnType) + 'static + Send) -> Self {
        Subscriber {
            next_fn: Box::new(next_fn),
            complete_fn: None,
            error_fn: None,
            completed: false,
            errored: false,
        }
    }

    /// Sets the completion function, called when the source finishes its
    /// emission sequence.
    pub fn on_complete(&mut self, complete_fn: impl FnMut() + 'static + Send + Sync) {
        self.complete_fn = Some(Box::new(complete_fn));
    }

    /// Sets the error function, called when the source signals a terminal
    /// failure.
    pub fn on_error(
        &mut self,
        error_fn: impl FnMut(Arc<dyn Error + Send + Sync>) + 'static + Send + Sync,
    ) {
        self.error_fn = Some(Box::new(error_fn));
    }
}

impl<T> Observer for Subscriber<T> {
    type NextFnType = T;

    fn next(&mut self, v: Self::NextFnType) {
        if self.errored || self.completed {
            return;
        }
        (self.next_fn)(v);
    }

    fn complete(&mut self) {
        if self.errored || self.completed {
            return;
        }
        self.completed = true;
        if let Some(cfn) = &mut self.complete_fn {
            (cfn)();
        }
    }

    fn error(&mut self, e: Arc<dyn Error + Send + Sync>) {
        if self.errored || self.completed {
            return;
        }
        self.errored = true;
        if let Some(efn) = &mut self.error_fn {
            (efn)(e);
        }
    }
}

/// Handle used by a [`Subscription`] to await the task driving an
/// asynchronous source.
pub enum SubscriptionHandle {
    /// No task to await.
    Nil,

    /// Join handle of the tokio task producing the source's emissions.
    JoinTask(JoinHandle<()>),
}

/// Represents one active registration on a source, allowing control over it.
///
/// Subscribing to a [`Source`] or a tracker returns a `Subscription`. It can
/// be used to detach the registration (`unsubscribe`) or to await the task
/// driving the emissions (`join`).
///
/// [`Source`]: crate::source::Source
pub struct Subscription {
    pub(crate) unsubscribe_logic: UnsubscribeLogic,
    pub(crate) subscription_future: SubscriptionHandle,
    runtime_handle: Result<runtime::Handle, runtime::TryCurrentError>,
}

impl Subscription {
    /// Creates a new `Subscription` with the specified unsubscribe logic and
    /// an optional handle for awaiting the producing task.
    #[must_use]
    pub fn new(
        unsubscribe_logic: UnsubscribeLogic,
        subscription_future: SubscriptionHandle,
    ) -> Self {
        let runtime_handle = runtime::Handle::try_current();
        Subscription {
            unsubscribe_logic,
            subscription_future,
            runtime_handle,
        }
    }

    /// Awaits the completion of the tokio task associated with this
    /// subscription, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the awaited task panicked or was aborted.
    pub async fn join(self) -> Result<(), tokio::task::JoinError> {
        match self.subscription_future {
            SubscriptionHandle::JoinTask(task_handle) => task_handle.await,
            SubscriptionHandle::Nil => Ok(()),
        }
    }

    // Runs the unsubscribe logic in place, awaiting asynchronous logic
    // instead of spawning it. Used by the registry so that a bulk cancel
    // resolves only after every cancellation has settled. Boxed because
    // wrapped subscriptions recurse.
    pub(crate) fn cancel(self) -> Pin<Box<dyn Future<Output = ()> + Send>> {
        Box::pin(async move {
            match self.unsubscribe_logic {
                UnsubscribeLogic::Nil => (),
                UnsubscribeLogic::Logic(fnc) => fnc(),
                UnsubscribeLogic::Wrapped(subscription) => subscription.cancel().await,
                UnsubscribeLogic::Future(future) => future.await,
            }
        })
    }
}

impl Unsubscribeable for Subscription {
    fn unsubscribe(self) {
        self.unsubscribe_logic.unsubscribe(self.runtime_handle);
    }
}

/// Enumerates the unsubscribe strategies a subscription can carry.
pub enum UnsubscribeLogic {
    /// No specific unsubscribe logic.
    Nil,

    /// If one subscription depends on another. The wrapped subscription's
    /// unsubscribe is called upon unsubscribing.
    Wrapped(Box<Subscription>),

    /// Unsubscribe logic defined by a function.
    Logic(Box<dyn FnOnce() + Send>),

    /// Asynchronous unsubscribe logic represented by a future. Use if you
    /// need to spawn tokio tasks or `.await` as part of the unsubscribe
    /// logic.
    Future(Pin<Box<dyn Future<Output = ()> + Send>>),
}

impl UnsubscribeLogic {
    fn unsubscribe(
        mut self,
        runtime_handle: Result<runtime::Handle, runtime::TryCurrentError>,
    ) -> Self {
        match self {
            UnsubscribeLogic::Nil => (),
            UnsubscribeLogic::Logic(fnc) => {
                fnc();
                self = Self::Nil;
            }
            UnsubscribeLogic::Wrapped(subscription) => {
                subscription.unsubscribe();
                self = Self::Nil;
            }
            UnsubscribeLogic::Future(future) => {
                match runtime_handle {
                    Ok(handle) => {
                        handle.spawn(async {
                            future.await;
                        });
                    }
                    e @ Err(_) => {
                        e.expect(
                            "subscription with asynchronous unsubscribe logic \
                             dropped outside of a tokio runtime",
                        );
                    }
                }
                self = Self::Nil;
            }
        }
        self
    }
}
