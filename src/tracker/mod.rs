//! The `tracker` module provides [`OperationState`] and [`OperationTracker`]:
//! a three-state observable wrapper around a single asynchronous fetch.
//!
//! A tracker owns one mutable state cell, always holding a valid
//! [`OperationState`], and notifies every subscribed observer on each
//! transition. Each [`load`] publishes exactly one `Loading` state
//! synchronously, then exactly one terminal `Success` or `Error` state when
//! the fetch resolves, unless a newer `load` has superseded it in the
//! meantime.
//!
//! [`load`]: OperationTracker::load

use std::{
    error::Error,
    future::Future,
    pin::Pin,
    sync::{Arc, Mutex},
};

use tokio::task::JoinHandle;

use crate::errors::TrackerError;
use crate::observer::Observer;
use crate::subscription::subscribe::{
    Subscribeable, Subscriber, Subscription, SubscriptionHandle, UnsubscribeLogic,
};

/// The state of an asynchronous operation: in flight, completed, or failed.
///
/// `Loading` and `Error` may carry the last successfully fetched value so
/// consumers can keep presenting stale data while a refresh is in flight or
/// after it failed.
#[derive(Debug, Clone)]
pub enum OperationState<T> {
    /// An operation is in flight; `data` holds the previous successful value
    /// when the load was started with caching enabled.
    Loading { data: Option<T> },

    /// The operation completed successfully.
    Success { data: T },

    /// The operation failed. `message` is the formatted failure description,
    /// `cause` the error the fetch reported, and `data` the previous
    /// successful value when caching was enabled.
    Error {
        message: Option<String>,
        cause: Option<Arc<dyn Error + Send + Sync>>,
        data: Option<T>,
    },
}

impl<T> OperationState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, OperationState::Loading { .. })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, OperationState::Success { .. })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, OperationState::Error { .. })
    }

    /// The carried value, if this state holds one.
    pub fn data(&self) -> Option<&T> {
        match self {
            OperationState::Loading { data } => data.as_ref(),
            OperationState::Success { data } => Some(data),
            OperationState::Error { data, .. } => data.as_ref(),
        }
    }

    /// Consumes the state, returning the carried value if there is one.
    pub fn into_data(self) -> Option<T> {
        match self {
            OperationState::Loading { data } => data,
            OperationState::Success { data } => Some(data),
            OperationState::Error { data, .. } => data,
        }
    }
}

/// Future produced by a tracker's fetch closure.
pub type FetchFuture<T> =
    Pin<Box<dyn Future<Output = Result<T, Box<dyn Error + Send + Sync>>> + Send>>;

type FetchFn<T> = Box<dyn FnMut() -> FetchFuture<T> + Send>;
type FormatErrorFn = Box<dyn Fn(&(dyn Error + Send + Sync)) -> String + Send + Sync>;
type OnErrorFn = Box<dyn FnMut(&Arc<dyn Error + Send + Sync>) + Send + Sync>;

/// Configuration for an [`OperationTracker`].
///
/// All hooks are injected here explicitly; the tracker performs no ambient
/// configuration lookup. Hooks must not panic: a panicking hook aborts the
/// publishing task and poisons the tracker's state cell.
pub struct TrackerConfig {
    load_on_init: bool,
    format_error: FormatErrorFn,
    on_error: OnErrorFn,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            load_on_init: true,
            format_error: Box::new(|e| e.to_string()),
            on_error: Box::new(|e| tracing::error!(error = %e, "operation failed")),
        }
    }
}

impl TrackerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the tracker starts its first load inside the constructor.
    /// Defaults to `true`.
    #[must_use]
    pub fn load_on_init(mut self, load_on_init: bool) -> Self {
        self.load_on_init = load_on_init;
        self
    }

    /// Sets the formatter producing the `message` of published `Error`
    /// states. Defaults to the error's `Display` output.
    #[must_use]
    pub fn format_error(
        mut self,
        f: impl Fn(&(dyn Error + Send + Sync)) -> String + Send + Sync + 'static,
    ) -> Self {
        self.format_error = Box::new(f);
        self
    }

    /// Sets the side-effect hook invoked on every fetch failure, before the
    /// `Error` state is published. Defaults to a `tracing::error!` record.
    #[must_use]
    pub fn on_error(
        mut self,
        f: impl FnMut(&Arc<dyn Error + Send + Sync>) + Send + Sync + 'static,
    ) -> Self {
        self.on_error = Box::new(f);
        self
    }
}

struct TrackerSource<T> {
    state: OperationState<T>,
    observers: Vec<(u64, Subscriber<OperationState<T>>)>,
    next_key: u64,
    generation: u64,
    alive: bool,
}

impl<T: Clone> TrackerSource<T> {
    fn publish(&mut self, state: OperationState<T>) {
        self.state = state;
        for (_, o) in &mut self.observers {
            o.next(self.state.clone());
        }
    }
}

/// Wraps a single asynchronous fetch behind an observable three-state cell.
///
/// The tracker is created from a fetch closure and a [`TrackerConfig`].
/// Every [`load`] publishes `Loading` immediately and spawns the fetch on a
/// tokio task; the terminal `Success`/`Error` state is published when the
/// fetch resolves, provided the tracker is still alive and no newer load has
/// been started since. Fetch errors never propagate to the caller of `load`.
///
/// Cloning the tracker clones a handle to the same shared cell.
///
/// # Example
///
/// ```no_run
/// use opstate::{OperationState, OperationTracker, TrackerConfig};
/// use opstate::subscribe::Subscriber;
/// use opstate::Subscribeable;
///
/// # async fn demo() {
/// let mut tracker = OperationTracker::new(
///     || Box::pin(async { Ok::<_, Box<dyn std::error::Error + Send + Sync>>(42) }),
///     TrackerConfig::new().load_on_init(false),
/// );
///
/// tracker.subscribe(Subscriber::on_next(|state: OperationState<i32>| {
///     match state {
///         OperationState::Loading { data } => println!("loading, cached {:?}", data),
///         OperationState::Success { data } => println!("loaded {}", data),
///         OperationState::Error { message, .. } => println!("failed: {:?}", message),
///     }
/// }));
///
/// tracker.load(true).await.unwrap();
/// # }
/// ```
///
/// [`load`]: OperationTracker::load
pub struct OperationTracker<T> {
    source: Arc<Mutex<TrackerSource<T>>>,
    fetch: Arc<Mutex<FetchFn<T>>>,
    format_error: Arc<FormatErrorFn>,
    on_error: Arc<Mutex<OnErrorFn>>,
}

impl<T> Clone for OperationTracker<T> {
    fn clone(&self) -> Self {
        OperationTracker {
            source: Arc::clone(&self.source),
            fetch: Arc::clone(&self.fetch),
            format_error: Arc::clone(&self.format_error),
            on_error: Arc::clone(&self.on_error),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> OperationTracker<T> {
    /// Creates a tracker around the given fetch closure.
    ///
    /// When `load_on_init` is set in the config (the default), one
    /// `load(true)` is started before the constructor returns; the `Loading`
    /// state is published synchronously and the fetch resolves later.
    ///
    /// # Panics
    ///
    /// Panics if `load_on_init` is set and the constructor runs outside of a
    /// tokio runtime.
    pub fn new(fetch: impl FnMut() -> FetchFuture<T> + Send + 'static, config: TrackerConfig) -> Self {
        let TrackerConfig {
            load_on_init,
            format_error,
            on_error,
        } = config;

        let tracker = OperationTracker {
            source: Arc::new(Mutex::new(TrackerSource {
                state: OperationState::Loading { data: None },
                observers: Vec::new(),
                next_key: 0,
                generation: 0,
                alive: true,
            })),
            fetch: Arc::new(Mutex::new(Box::new(fetch))),
            format_error: Arc::new(format_error),
            on_error: Arc::new(Mutex::new(on_error)),
        };
        if load_on_init {
            tracker.load(true);
        }
        tracker
    }

    /// Starts a load, publishing `Loading` immediately and the terminal
    /// state when the fetch resolves.
    ///
    /// With `use_cache` set, the previous successful value (if any) is
    /// carried in the published `Loading` state and in a subsequent `Error`
    /// state. The returned handle completes once the terminal state has been
    /// published or the result has been discarded.
    ///
    /// Calling `load` again before a prior fetch resolved supersedes it: the
    /// stale fetch's result is discarded when it eventually resolves.
    /// Loading on a disposed tracker is a no-op.
    pub fn load(&self, use_cache: bool) -> JoinHandle<()> {
        match self.try_load(use_cache) {
            Ok(handle) => handle,
            Err(_) => tokio::task::spawn(async {}),
        }
    }

    /// Soft-refresh entry point; semantically identical to [`load`], kept
    /// separate for call-site clarity.
    ///
    /// [`load`]: OperationTracker::load
    pub fn reload(&self, use_cache: bool) -> JoinHandle<()> {
        self.load(use_cache)
    }

    /// Like [`load`], but reports [`TrackerError::Disposed`] instead of
    /// silently doing nothing when the tracker was already disposed.
    ///
    /// [`load`]: OperationTracker::load
    pub fn try_load(&self, use_cache: bool) -> Result<JoinHandle<()>, TrackerError> {
        let (future, generation, last_data) = {
            let mut src = self.source.lock().unwrap();
            if !src.alive {
                return Err(TrackerError::Disposed);
            }
            let last_data = if use_cache {
                src.state.data().cloned()
            } else {
                None
            };
            src.generation += 1;
            let generation = src.generation;
            tracing::debug!(generation, cached = last_data.is_some(), "load started");
            src.publish(OperationState::Loading {
                data: last_data.clone(),
            });
            let mut fetch = self.fetch.lock().unwrap();
            let future = (*fetch)();
            (future, generation, last_data)
        };

        let source = Arc::clone(&self.source);
        let format_error = Arc::clone(&self.format_error);
        let on_error = Arc::clone(&self.on_error);

        Ok(tokio::task::spawn(async move {
            let outcome = future.await;

            let mut src = source.lock().unwrap();
            if !src.alive || src.generation != generation {
                // Disposed, or a newer load superseded this one.
                tracing::debug!(generation, "discarding stale fetch result");
                return;
            }
            match outcome {
                Ok(data) => {
                    tracing::debug!(generation, "fetch succeeded");
                    src.publish(OperationState::Success { data });
                }
                Err(e) => {
                    let cause: Arc<dyn Error + Send + Sync> = Arc::from(e);
                    let message = (*format_error)(cause.as_ref());
                    let mut hook = on_error.lock().unwrap();
                    (*hook)(&cause);
                    drop(hook);
                    src.publish(OperationState::Error {
                        message: Some(message),
                        cause: Some(cause),
                        data: last_data,
                    });
                }
            }
        }))
    }

    /// A clone of the current state.
    pub fn current(&self) -> OperationState<T> {
        self.source.lock().unwrap().state.clone()
    }

    /// Tears the tracker down: completes and drops all observers and marks
    /// the cell dead. Idempotent. In-flight fetch results arriving afterward
    /// are silently discarded, and further loads are no-ops.
    pub fn dispose(&self) {
        let mut src = self.source.lock().unwrap();
        if !src.alive {
            return;
        }
        src.alive = false;
        for (_, o) in &mut src.observers {
            o.complete();
        }
        src.observers.clear();
        tracing::debug!("tracker disposed");
    }

    pub fn is_disposed(&self) -> bool {
        !self.source.lock().unwrap().alive
    }

    /// Number of currently registered observers.
    pub fn observer_count(&self) -> usize {
        self.source.lock().unwrap().observers.len()
    }
}

impl<T: Clone + Send + Sync + 'static> Subscribeable for OperationTracker<T> {
    type ObsType = OperationState<T>;

    fn subscribe(&mut self, mut v: Subscriber<Self::ObsType>) -> Subscription {
        let key;
        {
            let mut src = self.source.lock().unwrap();
            if !src.alive {
                // Disposed tracker completes every late subscriber right away.
                v.complete();
                return Subscription::new(UnsubscribeLogic::Nil, SubscriptionHandle::Nil);
            }
            // New observers receive the current state upon registration.
            v.next(src.state.clone());
            key = src.next_key;
            src.next_key += 1;
            src.observers.push((key, v));
        }

        let source = Arc::clone(&self.source);
        Subscription::new(
            UnsubscribeLogic::Logic(Box::new(move || {
                source.lock().unwrap().observers.retain(|(k, _)| *k != key);
            })),
            SubscriptionHandle::Nil,
        )
    }
}
