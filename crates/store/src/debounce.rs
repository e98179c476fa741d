//! Trailing-edge debounce for UI callbacks.
//!
//! Wraps a callback so a burst of calls collapses into one invocation after
//! a quiet window. The storefront uses this to keep search-as-you-type from
//! re-filtering on every keystroke and to coalesce repeated button clicks.
//!
//! Scheduling runs on the ambient tokio runtime; tests drive it with the
//! runtime's virtual clock (`start_paused` + `tokio::time::advance`).

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

struct Inner<T> {
    callback: Box<dyn Fn(T) + Send + Sync>,
    wait: Duration,
    /// At most one scheduled invocation exists per wrapper at any time.
    pending: Mutex<Option<JoinHandle<()>>>,
}

/// A debounced wrapper around a callback.
///
/// Each [`call`](Self::call) schedules the callback to run after the quiet
/// window elapses with no further calls; a call before expiry cancels the
/// pending schedule and restarts the window from the new call time. Only
/// the value of the last call reaches the callback.
///
/// Clones share one pending timer - calls from multiple logical sources
/// debounce together, not per caller. The callback's return value is
/// discarded (fire-and-forget), and a panic inside it is confined to the
/// scheduled task.
pub struct Debounced<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Debounced<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + 'static> Debounced<T> {
    /// Schedule the callback with `value`, replacing any pending schedule.
    ///
    /// Must be called within a tokio runtime. A pending invocation survives
    /// the handle being dropped; only a newer call cancels it.
    pub fn call(&self, value: T) {
        let inner = Arc::clone(&self.inner);
        let mut pending = self.inner.pending.lock();

        if let Some(previous) = pending.take() {
            previous.abort();
        }

        *pending = Some(tokio::spawn(async move {
            tokio::time::sleep(inner.wait).await;
            (inner.callback)(value);
        }));
    }

    /// The quiet window length.
    #[must_use]
    pub fn wait(&self) -> Duration {
        self.inner.wait
    }
}

/// Wrap `callback` so invocations within `wait` of each other collapse into
/// a single trailing call.
///
/// A zero `wait` (the lower bound - [`Duration`] cannot go negative) does
/// not invoke inline; the callback still runs on the next runtime tick, so
/// call sites behave identically at every window length.
///
/// # Example
///
/// ```no_run
/// use std::time::Duration;
/// use cartwheel_store::debounce;
///
/// let search = debounce(
///     |query: String| println!("searching {query}"),
///     Duration::from_millis(300),
/// );
/// search.call("cotton".to_string());
/// search.call("cotton fish".to_string()); // only this one runs
/// ```
pub fn debounce<T, F>(callback: F, wait: Duration) -> Debounced<T>
where
    T: Send + 'static,
    F: Fn(T) + Send + Sync + 'static,
{
    Debounced {
        inner: Arc::new(Inner {
            callback: Box::new(callback),
            wait,
            pending: Mutex::new(None),
        }),
    }
}
