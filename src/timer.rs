//! One-shot timer services used to arm the auto-advance delay.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::select;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::trace;

pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// Identifies one scheduled callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

pub trait TimerService {
    /// Run `callback` once after `delay` unless cancelled first.
    fn schedule(&mut self, delay: Duration, callback: TimerCallback) -> TimerHandle;

    /// Cancel a pending callback. Unknown or already-fired handles are ignored.
    fn cancel(&mut self, handle: TimerHandle);
}

/// Timer backed by the tokio clock. Must be used from within a runtime.
#[derive(Debug)]
pub struct TokioTimer {
    next_id: u64,
    live: HashMap<TimerHandle, CancellationToken>,
    parent: CancellationToken,
}

impl TokioTimer {
    pub fn new(parent: CancellationToken) -> Self {
        Self {
            next_id: 0,
            live: HashMap::new(),
            parent,
        }
    }

    /// Number of scheduled callbacks that have neither fired nor been cancelled.
    pub fn pending(&self) -> usize {
        self.live.values().filter(|t| !t.is_cancelled()).count()
    }
}

impl TimerService for TokioTimer {
    fn schedule(&mut self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        self.live.retain(|_, token| !token.is_cancelled());

        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        let token = self.parent.child_token();
        self.live.insert(handle, token.clone());

        tokio::spawn(async move {
            select! {
                _ = token.cancelled() => {
                    trace!(%handle, "timer cancelled");
                }
                _ = sleep(delay) => {
                    // Mark spent so the service can prune it.
                    token.cancel();
                    callback();
                }
            }
        });
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        if let Some(token) = self.live.remove(&handle) {
            token.cancel();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for token in self.live.values() {
            token.cancel();
        }
    }
}

/// Timer driven by hand: nothing fires until [`ManualTimer::fire`] is called.
/// Clones share state so a test can keep one while a controller owns another.
#[derive(Clone, Default)]
pub struct ManualTimer {
    inner: Arc<Mutex<ManualTimerState>>,
}

#[derive(Default)]
struct ManualTimerState {
    next_id: u64,
    pending: Vec<(TimerHandle, Duration, TimerCallback)>,
    scheduled: Vec<(TimerHandle, Duration)>,
    cancelled: Vec<TimerHandle>,
}

impl fmt::Debug for ManualTimer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("ManualTimer")
            .field("pending", &state.pending.len())
            .field("scheduled", &state.scheduled)
            .field("cancelled", &state.cancelled)
            .finish()
    }
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ManualTimerState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handles not yet fired or cancelled, oldest first.
    pub fn pending(&self) -> Vec<TimerHandle> {
        self.lock().pending.iter().map(|(h, _, _)| *h).collect()
    }

    /// Every schedule call with its delay, in order.
    pub fn scheduled(&self) -> Vec<(TimerHandle, Duration)> {
        self.lock().scheduled.clone()
    }

    pub fn cancelled(&self) -> Vec<TimerHandle> {
        self.lock().cancelled.clone()
    }

    /// Fire the oldest pending callback. Returns false when nothing is pending.
    pub fn fire(&self) -> bool {
        let next = {
            let mut state = self.lock();
            if state.pending.is_empty() {
                None
            } else {
                Some(state.pending.remove(0))
            }
        };
        match next {
            Some((_, _, callback)) => {
                callback();
                true
            }
            None => false,
        }
    }
}

impl TimerService for ManualTimer {
    fn schedule(&mut self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let mut state = self.lock();
        let handle = TimerHandle(state.next_id);
        state.next_id += 1;
        state.pending.push((handle, delay, callback));
        state.scheduled.push((handle, delay));
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) {
        let mut state = self.lock();
        let before = state.pending.len();
        state.pending.retain(|(h, _, _)| *h != handle);
        if state.pending.len() != before {
            state.cancelled.push(handle);
        }
    }
}
