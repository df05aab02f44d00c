use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::SystemTime,
};

use tracing::debug;
use uuid::Uuid;

use crate::events::{
    inbox::Inbox,
    notice::{Envelope, Notice},
};

pub const DEFAULT_INBOX_CAPACITY: usize = 64;

#[derive(Clone)]
pub struct NoticeBus {
    inner: Arc<NoticeBusInner>,
}

struct NoticeBusInner {
    session_id: Uuid,
    next_seq: AtomicU64,
    next_subscriber: AtomicU64,
    closed: AtomicBool,
    subscribers: Mutex<HashMap<u64, Subscriber>>,
}

struct Subscriber {
    name: &'static str,
    inbox: Arc<Inbox>,
}

impl NoticeBus {
    pub fn new(session_id: Uuid) -> Self {
        Self {
            inner: Arc::new(NoticeBusInner {
                session_id,
                next_seq: AtomicU64::new(0),
                next_subscriber: AtomicU64::new(0),
                closed: AtomicBool::new(false),
                subscribers: Mutex::new(HashMap::new()),
            }),
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.inner.session_id
    }

    pub fn publish(&self, notice: Notice) {
        if self.is_closed() {
            return;
        }

        let envelope = Arc::new(Envelope {
            notice,
            session_id: self.inner.session_id,
            seq: self.inner.next_seq.fetch_add(1, Ordering::Relaxed),
            emitted_at: SystemTime::now(),
        });

        let subscribers = self.inner.subscribers.lock().expect("NoticeBus poisoned");
        for subscriber in subscribers.values() {
            subscriber.inbox.deliver(Arc::clone(&envelope));
        }
    }

    /// Register an inbox. The subscription deregisters itself when dropped.
    pub fn subscribe(&self, name: &'static str) -> Subscription {
        self.subscribe_with_capacity(name, DEFAULT_INBOX_CAPACITY)
    }

    pub fn subscribe_with_capacity(&self, name: &'static str, capacity: usize) -> Subscription {
        let id = self.inner.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let inbox = Arc::new(Inbox::new(capacity));

        if self.is_closed() {
            inbox.close();
        } else {
            self.inner
                .subscribers
                .lock()
                .expect("NoticeBus poisoned")
                .insert(
                    id,
                    Subscriber {
                        name,
                        inbox: Arc::clone(&inbox),
                    },
                );
            debug!(subscriber = name, id, "subscribed");
        }

        Subscription {
            id,
            name,
            inbox,
            bus: self.clone(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.lock().expect("NoticeBus poisoned").len()
    }

    /// End every subscription. Later publishes are dropped.
    pub fn close(&self) {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let drained: Vec<Subscriber> = self
            .inner
            .subscribers
            .lock()
            .expect("NoticeBus poisoned")
            .drain()
            .map(|(_, s)| s)
            .collect();
        for subscriber in drained {
            debug!(subscriber = subscriber.name, "closing subscription");
            subscriber.inbox.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    fn unsubscribe(&self, id: u64) {
        self.inner
            .subscribers
            .lock()
            .expect("NoticeBus poisoned")
            .remove(&id);
    }
}

pub struct Subscription {
    id: u64,
    name: &'static str,
    inbox: Arc<Inbox>,
    bus: NoticeBus,
}

impl Subscription {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub async fn recv(&self) -> Option<Arc<Envelope>> {
        self.inbox.recv().await
    }

    pub fn try_recv(&self) -> Option<Arc<Envelope>> {
        self.inbox.try_recv()
    }

    /// Everything queued right now, snapshot first.
    pub fn drain(&self) -> Vec<Arc<Envelope>> {
        std::iter::from_fn(|| self.inbox.try_recv()).collect()
    }

    pub fn is_closed(&self) -> bool {
        self.inbox.is_closed()
    }

    pub fn drops_total(&self) -> u64 {
        self.inbox.drops_total()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.bus.unsubscribe(self.id);
    }
}
