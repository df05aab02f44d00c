use std::{
    collections::VecDeque,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};

use tokio::sync::Notify;

use crate::events::notice::Envelope;

/// Per-subscriber queue: one latest-wins slot for snapshot notices plus a
/// bounded FIFO that drops its oldest entry when full.
pub struct Inbox {
    state: Mutex<InboxState>,
    capacity: usize,
    notify: Notify,
    drops_total: AtomicU64,
}

struct InboxState {
    latest: Option<Arc<Envelope>>,
    fifo: VecDeque<Arc<Envelope>>,
    closed: bool,
}

impl Inbox {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);

        Self {
            state: Mutex::new(InboxState {
                latest: None,
                fifo: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            notify: Notify::new(),
            drops_total: AtomicU64::new(0),
        }
    }

    pub fn deliver(&self, envelope: Arc<Envelope>) {
        let mut state = self.state.lock().expect("Inbox poisoned");
        if state.closed {
            return;
        }
        if envelope.notice.is_snapshot() {
            state.latest = Some(envelope);
        } else {
            if state.fifo.len() >= self.capacity {
                let _ = state.fifo.pop_front();
                self.drops_total.fetch_add(1, Ordering::Relaxed);
            }
            state.fifo.push_back(envelope);
        }
        drop(state);
        self.notify.notify_one();
    }

    /// Latest snapshot first, then queued notices in order.
    pub fn try_recv(&self) -> Option<Arc<Envelope>> {
        let mut state = self.state.lock().expect("Inbox poisoned");
        state.latest.take().or_else(|| state.fifo.pop_front())
    }

    /// Wait for the next notice; `None` once closed and drained.
    pub async fn recv(&self) -> Option<Arc<Envelope>> {
        loop {
            let notified = self.notify.notified();
            {
                let mut state = self.state.lock().expect("Inbox poisoned");
                if let Some(envelope) = state.latest.take().or_else(|| state.fifo.pop_front()) {
                    return Some(envelope);
                }
                if state.closed {
                    return None;
                }
            }
            notified.await;
        }
    }

    pub fn close(&self) {
        self.state.lock().expect("Inbox poisoned").closed = true;
        self.notify.notify_waiters();
        self.notify.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().expect("Inbox poisoned").closed
    }

    pub fn drops_total(&self) -> u64 {
        self.drops_total.load(Ordering::Relaxed)
    }
}
