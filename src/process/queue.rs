//! FIFO registry of pending line consumers.
//!
//! The reader thread feeds every engine output line, in arrival order, to
//! whichever consumer is currently at the head of the queue. A consumer
//! stays head-of-queue until it returns `false`; its [`Ticket`] then
//! resolves and the waiting caller unblocks. When the engine terminates,
//! every ticket still pending resolves with
//! [`EngineError::Terminated`](super::EngineError) instead of leaving its
//! caller blocked.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

use super::EngineError;

/// Callback invoked once per engine output line until it returns `false`.
pub type LineConsumer = Box<dyn FnMut(&str) -> bool + Send>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TicketState {
    Pending,
    Finished,
    Terminated,
}

struct TicketInner {
    state: Mutex<TicketState>,
    cond: Condvar,
}

impl TicketInner {
    fn resolve(&self, state: TicketState) {
        let mut guard = self.state.lock();
        if *guard == TicketState::Pending {
            *guard = state;
            self.cond.notify_all();
        }
    }
}

/// Completion handle for a registered consumer.
///
/// Waiting is bounded: a caller never hangs on a dead or mute engine.
pub struct Ticket {
    inner: Arc<TicketInner>,
    queue: Arc<ConsumerQueue>,
}

impl Ticket {
    /// Block until the consumer signals completion, the engine terminates,
    /// or `timeout` elapses.
    ///
    /// On timeout the consumer is unregistered so it cannot swallow lines
    /// belonging to a later exchange, and the queue is marked desynchronized:
    /// the abandoned command's response may still arrive, and it must not be
    /// delivered to whichever consumer registers next.
    pub fn wait(self, timeout: Duration) -> Result<(), EngineError> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.state.lock();
        loop {
            match *guard {
                TicketState::Finished => return Ok(()),
                TicketState::Terminated => return Err(EngineError::Terminated),
                TicketState::Pending => {}
            }
            let now = Instant::now();
            if now >= deadline {
                drop(guard);
                self.queue.abandon(&self.inner);
                return Err(EngineError::Timeout {
                    waited_ms: timeout.as_millis() as u64,
                });
            }
            self.inner.cond.wait_until(&mut guard, deadline);
        }
    }

    /// Unregister the consumer without waiting.
    pub(crate) fn cancel(self) {
        self.queue.remove(&self.inner);
    }
}

struct Registered {
    consumer: LineConsumer,
    ticket: Arc<TicketInner>,
}

struct QueueInner {
    pending: VecDeque<Registered>,
    terminated: bool,
    // Set when a consumer is abandoned on timeout: its response may still be
    // in flight, so the stream needs a resynchronization barrier.
    desynced: bool,
}

/// Shared between the owning [`EngineProcess`](super::EngineProcess) and
/// its reader thread.
pub(crate) struct ConsumerQueue {
    inner: Mutex<QueueInner>,
}

impl ConsumerQueue {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(ConsumerQueue {
            inner: Mutex::new(QueueInner {
                pending: VecDeque::new(),
                terminated: false,
                desynced: false,
            }),
        })
    }

    /// Append a consumer; fails once the engine has terminated.
    pub(crate) fn register(
        self: &Arc<Self>,
        consumer: LineConsumer,
    ) -> Result<Ticket, EngineError> {
        let mut guard = self.inner.lock();
        if guard.terminated {
            return Err(EngineError::Terminated);
        }
        let ticket = Arc::new(TicketInner {
            state: Mutex::new(TicketState::Pending),
            cond: Condvar::new(),
        });
        guard.pending.push_back(Registered {
            consumer,
            ticket: Arc::clone(&ticket),
        });
        Ok(Ticket {
            inner: ticket,
            queue: Arc::clone(self),
        })
    }

    /// Feed one line to the head-of-queue consumer, if any.
    pub(crate) fn dispatch_line(&self, line: &str) {
        let mut guard = self.inner.lock();
        let finished = match guard.pending.front_mut() {
            Some(head) => !(head.consumer)(line),
            None => {
                log::trace!("unconsumed engine line: {line}");
                return;
            }
        };
        if finished {
            if let Some(head) = guard.pending.pop_front() {
                head.ticket.resolve(TicketState::Finished);
            }
        }
    }

    /// Mark the engine as terminated and fail every pending consumer.
    pub(crate) fn terminate(&self) {
        let mut guard = self.inner.lock();
        guard.terminated = true;
        while let Some(entry) = guard.pending.pop_front() {
            entry.ticket.resolve(TicketState::Terminated);
        }
    }

    pub(crate) fn is_terminated(&self) -> bool {
        self.inner.lock().terminated
    }

    /// Whether a timed-out consumer has left the line stream in an unknown
    /// state. Cleared by [`ConsumerQueue::mark_synced`] once the owner has
    /// run its resynchronization barrier.
    pub(crate) fn is_desynced(&self) -> bool {
        self.inner.lock().desynced
    }

    pub(crate) fn mark_synced(&self) {
        self.inner.lock().desynced = false;
    }

    fn remove(&self, ticket: &Arc<TicketInner>) {
        let mut guard = self.inner.lock();
        guard.pending.retain(|entry| !Arc::ptr_eq(&entry.ticket, ticket));
    }

    /// Remove a timed-out consumer and flag the stream as desynchronized.
    fn abandon(&self, ticket: &Arc<TicketInner>) {
        let mut guard = self.inner.lock();
        guard.pending.retain(|entry| !Arc::ptr_eq(&entry.ticket, ticket));
        guard.desynced = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn lines_reach_head_of_queue_in_order() {
        let queue = ConsumerQueue::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_a = Arc::clone(&seen);
        let ticket = queue
            .register(Box::new(move |line| {
                seen_a.lock().push(line.to_string());
                line != "done"
            }))
            .unwrap();

        queue.dispatch_line("first");
        queue.dispatch_line("second");
        queue.dispatch_line("done");
        queue.dispatch_line("after");

        ticket.wait(Duration::from_millis(100)).unwrap();
        assert_eq!(*seen.lock(), vec!["first", "second", "done"]);
    }

    #[test]
    fn second_consumer_only_sees_later_lines() {
        let queue = ConsumerQueue::new();

        let first = queue.register(Box::new(|line| line != "a")).unwrap();
        let second_seen = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&second_seen);
        let second = queue
            .register(Box::new(move |line| {
                seen.lock().push(line.to_string());
                line != "b"
            }))
            .unwrap();

        queue.dispatch_line("a");
        queue.dispatch_line("b");

        first.wait(Duration::from_millis(100)).unwrap();
        second.wait(Duration::from_millis(100)).unwrap();
        assert_eq!(*second_seen.lock(), vec!["b"]);
    }

    #[test]
    fn wait_times_out_and_unregisters() {
        let queue = ConsumerQueue::new();
        let ticket = queue.register(Box::new(|_| true)).unwrap();

        let err = ticket.wait(Duration::from_millis(10)).unwrap_err();
        assert!(matches!(err, EngineError::Timeout { .. }));

        // The stale consumer must not swallow this line.
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_b = Arc::clone(&seen);
        let ticket = queue
            .register(Box::new(move |line| {
                seen_b.lock().push(line.to_string());
                false
            }))
            .unwrap();
        queue.dispatch_line("fresh");
        ticket.wait(Duration::from_millis(100)).unwrap();
        assert_eq!(*seen.lock(), vec!["fresh"]);
    }

    #[test]
    fn timeout_marks_the_queue_desynced() {
        let queue = ConsumerQueue::new();
        assert!(!queue.is_desynced());

        let ticket = queue.register(Box::new(|_| true)).unwrap();
        let _ = ticket.wait(Duration::from_millis(10)).unwrap_err();
        assert!(queue.is_desynced());

        queue.mark_synced();
        assert!(!queue.is_desynced());
    }

    #[test]
    fn cancel_does_not_mark_the_queue_desynced() {
        // Cancel means the command was never sent, so no response is owed.
        let queue = ConsumerQueue::new();
        let ticket = queue.register(Box::new(|_| true)).unwrap();
        ticket.cancel();
        assert!(!queue.is_desynced());
    }

    #[test]
    fn termination_fails_pending_and_future_consumers() {
        let queue = ConsumerQueue::new();
        let ticket = queue.register(Box::new(|_| true)).unwrap();

        let waiter = {
            let handle = thread::spawn(move || ticket.wait(Duration::from_secs(5)));
            queue.terminate();
            handle
        };
        let err = waiter.join().unwrap().unwrap_err();
        assert!(matches!(err, EngineError::Terminated));

        assert!(matches!(
            queue.register(Box::new(|_| false)),
            Err(EngineError::Terminated)
        ));
    }
}
