//! Per-field debounced commits.
//!
//! A timer task only signals that a key went quiet. The action itself runs
//! on whichever thread drains the debouncer with [`Debouncer::run_due`] or
//! [`Debouncer::run_next`], after checking that the signal still belongs to
//! the latest scheduled action for that key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use log::debug;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;

type Action = Box<dyn FnOnce() + Send>;

/// Key and generation of a timer that expired.
type Due = (String, u64);

struct Entry {
    generation: u64,
    timer: JoinHandle<()>,
    action: Action,
}

#[derive(Default)]
struct Pending {
    next_generation: u64,
    entries: HashMap<String, Entry>,
}

impl Drop for Pending {
    fn drop(&mut self) {
        for (_, entry) in self.entries.drain() {
            entry.timer.abort();
        }
    }
}

struct Shared {
    pending: Mutex<Pending>,
    due_tx: UnboundedSender<Due>,
    due_rx: tokio::sync::Mutex<UnboundedReceiver<Due>>,
}

/// Delays an action per key until the key has been quiet for a while.
///
/// Scheduling an action for a key cancels any action still pending for the
/// same key, so only the latest edit of a field is committed. Pending
/// actions are aborted when the last handle is dropped.
///
/// Expired actions are not run by the runtime. The owner drains them on its
/// own thread, typically from its event loop:
///
/// ```ignore
/// loop {
///     tokio::select! {
///         _ = debouncer.run_next() => {}
///         event = events.recv() => handle(event),
///     }
/// }
/// ```
///
/// Scheduling needs a tokio runtime. Outside of one, [`schedule`](Self::schedule)
/// runs the action immediately and returns `false`.
#[derive(Clone)]
pub struct Debouncer {
    shared: Arc<Shared>,
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new()
    }
}

impl Debouncer {
    pub fn new() -> Self {
        let (due_tx, due_rx) = mpsc::unbounded_channel();
        Self {
            shared: Arc::new(Shared {
                pending: Mutex::new(Pending::default()),
                due_tx,
                due_rx: tokio::sync::Mutex::new(due_rx),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Pending> {
        self.shared
            .pending
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `action` once `key` has been quiet for `delay` and the debouncer
    /// is drained.
    pub fn schedule<F>(&self, key: impl Into<String>, delay: Duration, action: F) -> bool
    where
        F: FnOnce() + Send + 'static,
    {
        let key = key.into();
        let Ok(handle) = Handle::try_current() else {
            debug!("Debouncer: no runtime, committing '{}' immediately", key);
            self.cancel(&key);
            action();
            return false;
        };

        let mut pending = self.lock();
        pending.next_generation += 1;
        let generation = pending.next_generation;

        let timer = handle.spawn(signal_after(
            self.shared.due_tx.clone(),
            key.clone(),
            generation,
            delay,
        ));
        let entry = Entry {
            generation,
            timer,
            action: Box::new(action),
        };

        if let Some(previous) = pending.entries.insert(key.clone(), entry) {
            previous.timer.abort();
            debug!("Debouncer: rescheduled '{}'", key);
        } else {
            debug!("Debouncer: scheduled '{}' in {:?}", key, delay);
        }
        true
    }

    /// Run every action whose timer has expired, on the calling thread.
    /// Returns how many ran.
    pub fn run_due(&self) -> usize {
        let mut due = Vec::new();
        {
            let Ok(mut rx) = self.shared.due_rx.try_lock() else {
                return 0;
            };
            while let Ok(message) = rx.try_recv() {
                due.push(message);
            }
        }
        due.into_iter()
            .filter(|(key, generation)| self.fire(key, *generation))
            .count()
    }

    /// Wait for the next timer to expire and run its action on the calling
    /// task. Returns `false` if the action was cancelled or replaced in the
    /// meantime.
    pub async fn run_next(&self) -> bool {
        let message = self.shared.due_rx.lock().await.recv().await;
        match message {
            Some((key, generation)) => self.fire(&key, generation),
            None => false,
        }
    }

    fn fire(&self, key: &str, generation: u64) -> bool {
        let action = {
            let mut pending = self.lock();
            let current = pending.entries.get(key).map(|entry| entry.generation);
            if current == Some(generation) {
                pending.entries.remove(key).map(|entry| entry.action)
            } else {
                None
            }
        };
        match action {
            Some(action) => {
                debug!("Debouncer: running '{}'", key);
                action();
                true
            }
            None => {
                debug!("Debouncer: skipping stale timer for '{}'", key);
                false
            }
        }
    }

    /// Cancel the pending action for `key`. Returns whether one was pending.
    pub fn cancel(&self, key: &str) -> bool {
        match self.lock().entries.remove(key) {
            Some(entry) => {
                entry.timer.abort();
                true
            }
            None => false,
        }
    }

    /// Cancel every pending action.
    pub fn cancel_all(&self) {
        let mut pending = self.lock();
        for (_, entry) in pending.entries.drain() {
            entry.timer.abort();
        }
    }

    pub fn is_pending(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    pub fn pending_count(&self) -> usize {
        self.lock().entries.len()
    }
}

async fn signal_after(due: UnboundedSender<Due>, key: String, generation: u64, delay: Duration) {
    tokio::time::sleep(delay).await;
    // Fails only once the debouncer is gone.
    let _ = due.send((key, generation));
}

impl std::fmt::Debug for Debouncer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Debouncer")
            .field("pending", &self.pending_count())
            .finish()
    }
}
