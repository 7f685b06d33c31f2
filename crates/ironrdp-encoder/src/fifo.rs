//! Bounded FIFO pair and wait-object signalling (§2.B/C).
//!
//! The reference implementation pairs each `FIFO` with a function-pointer destructor invoked on
//! any item still queued at teardown. Per the "Destructor hooks in FIFO" design note, the Rust
//! rewrite drops the function pointer entirely: destruction is intrinsic to `Job`/`JobResult`
//! via `Drop`, so simply dropping the underlying queue (e.g. when the `Fifo` itself is dropped)
//! already releases everything still queued, with no leaks (§8 scenario 6).
//!
//! Wait-object signalling is implemented with a condvar-guarded boolean rather than OS handles,
//! per the "Wire-object signalling" design note: any environment offering condvar+bool, channels,
//! or real OS events is an equivalent substrate.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// A single-producer/single-consumer queue behind a mutex, paired with an edge-triggered
/// "available" event.
pub struct Fifo<T> {
    queue: Mutex<VecDeque<T>>,
    available: Event,
}

impl<T> Default for Fifo<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Fifo<T> {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(VecDeque::new()),
            available: Event::new(),
        }
    }

    /// Pushes an item and sets the availability event. Held mutex is released before returning.
    pub fn push(&self, item: T) {
        self.queue.lock().expect("fifo mutex poisoned").push_back(item);
        self.available.set();
    }

    /// Pops the oldest item, if any. Does not touch the availability event: callers that drain
    /// in a loop should reset it once, before draining (see `worker::run`).
    pub fn pop(&self) -> Option<T> {
        self.queue.lock().expect("fifo mutex poisoned").pop_front()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.lock().expect("fifo mutex poisoned").is_empty()
    }

    pub fn available_event(&self) -> &Event {
        &self.available
    }
}

/// An edge-triggered wait object: condvar + boolean flag.
///
/// `set` is level-triggered until `reset` clears it, matching `job_available`'s "level-reset
/// before draining" semantics (§9) and the one-shot semantics of the term events (§4.H).
pub struct Event {
    state: Mutex<bool>,
    condvar: Condvar,
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl Event {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(false),
            condvar: Condvar::new(),
        }
    }

    pub fn set(&self) {
        let mut state = self.state.lock().expect("event mutex poisoned");
        *state = true;
        self.condvar.notify_all();
    }

    pub fn reset(&self) {
        *self.state.lock().expect("event mutex poisoned") = false;
    }

    pub fn is_set(&self) -> bool {
        *self.state.lock().expect("event mutex poisoned")
    }

    /// Blocks until set, or `timeout` elapses; returns whether it was observed set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let state = self.state.lock().expect("event mutex poisoned");
        let (state, result) = self
            .condvar
            .wait_timeout_while(state, timeout, |set| !*set)
            .expect("event mutex poisoned");
        let _ = state;
        !result.timed_out()
    }
}

/// Waits on any of several events with no timeout, returning as soon as one is set.
///
/// Grounded on `proc_enc_msg`'s `g_obj_wait(robjs, 3, wobjs, 0, -1)` call, which blocks until one
/// of `{term_obj, lterm_obj, event_to_proc}` becomes signalled.
pub fn wait_any(events: &[&Event]) {
    loop {
        if events.iter().any(|event| event.is_set()) {
            return;
        }
        // No single condvar spans heterogeneous events; a short poll interval keeps the worker
        // responsive without busy-spinning. Real deployments with OS wait-object support would
        // use a native multi-wait instead (e.g. WaitForMultipleObjects/epoll on an eventfd set).
        if events
            .iter()
            .any(|event| event.wait_timeout(Duration::from_millis(20)))
        {
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn push_then_pop_preserves_order() {
        let fifo = Fifo::new();
        fifo.push(1);
        fifo.push(2);
        assert_eq!(fifo.pop(), Some(1));
        assert_eq!(fifo.pop(), Some(2));
        assert_eq!(fifo.pop(), None);
    }

    #[test]
    fn event_reset_clears_level() {
        let event = Event::new();
        event.set();
        assert!(event.is_set());
        event.reset();
        assert!(!event.is_set());
    }

    #[test]
    fn wait_any_wakes_on_any_event() {
        let a = Arc::new(Event::new());
        let b = Arc::new(Event::new());
        let a2 = Arc::clone(&a);
        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(30));
            a2.set();
        });
        wait_any(&[&a, &b]);
        handle.join().unwrap();
        assert!(a.is_set());
    }

    #[test]
    fn dropping_fifo_with_queued_items_does_not_panic() {
        let fifo: Fifo<Vec<u8>> = Fifo::new();
        fifo.push(vec![1, 2, 3]);
        fifo.push(vec![4, 5, 6]);
        drop(fifo);
    }
}
