use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{RwLock, mpsc};
use tracing::{debug, info, warn};
use uuid::Uuid;

use roomboard_types::events::BoardEvent;

/// Outbound queue depth per subscriber. A subscriber that falls this far
/// behind is dropped instead of slowing down publishers.
pub const SUBSCRIBER_QUEUE_CAPACITY: usize = 64;

/// Which subscribers receive an event published for a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastScope {
    /// Only subscribers connected to the event's room
    #[default]
    Room,
    /// Every subscriber, regardless of the room they connected to
    Global,
}

#[derive(Debug, Error)]
#[error("unknown broadcast scope '{0}' (expected 'room' or 'global')")]
pub struct UnknownScope(pub String);

impl FromStr for BroadcastScope {
    type Err = UnknownScope;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "room" => Ok(Self::Room),
            "global" => Ok(Self::Global),
            _ => Err(UnknownScope(s.to_string())),
        }
    }
}

/// A registered subscriber's end of the hub. Dropping `rx` (or the hub
/// dropping its sender) ends the subscription.
pub struct Subscription {
    pub id: Uuid,
    pub rx: mpsc::Receiver<BoardEvent>,
}

/// Tracks live subscribers and fans out board events to them.
#[derive(Clone)]
pub struct Hub {
    inner: Arc<HubInner>,
}

struct HubInner {
    scope: BroadcastScope,

    /// subscriber id -> (room, outbound queue)
    subscribers: RwLock<HashMap<Uuid, Subscriber>>,
}

struct Subscriber {
    room_id: String,
    tx: mpsc::Sender<BoardEvent>,
}

impl Hub {
    pub fn new(scope: BroadcastScope) -> Self {
        Self {
            inner: Arc::new(HubInner {
                scope,
                subscribers: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a new subscriber for `room_id`.
    pub async fn subscribe(&self, room_id: &str) -> Subscription {
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_CAPACITY);

        self.inner.subscribers.write().await.insert(
            id,
            Subscriber {
                room_id: room_id.to_string(),
                tx,
            },
        );
        debug!("Subscriber {} joined room '{}'", id, room_id);

        Subscription { id, rx }
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub async fn unsubscribe(&self, id: Uuid) -> bool {
        let removed = self.inner.subscribers.write().await.remove(&id).is_some();
        if removed {
            debug!("Subscriber {} left", id);
        }
        removed
    }

    /// Deliver `event` to every subscriber in scope for `room_id`.
    ///
    /// Delivery never waits on a subscriber: a closed or full queue drops
    /// that subscriber and the rest still receive the event. Returns the
    /// number of subscribers the event was queued for.
    pub async fn publish(&self, room_id: &str, event: BoardEvent) -> usize {
        // Snapshot under the read lock so subscribe/unsubscribe never
        // contend with delivery.
        let targets: Vec<(Uuid, mpsc::Sender<BoardEvent>)> = {
            let subscribers = self.inner.subscribers.read().await;
            subscribers
                .iter()
                .filter(|(_, sub)| self.in_scope(sub, room_id))
                .map(|(id, sub)| (*id, sub.tx.clone()))
                .collect()
        };

        let mut delivered = 0;
        let mut failed = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(event) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!("Subscriber {} is not keeping up, dropping it", id);
                    failed.push(id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    debug!("Subscriber {} went away during publish", id);
                    failed.push(id);
                }
            }
        }

        if !failed.is_empty() {
            let mut subscribers = self.inner.subscribers.write().await;
            for id in &failed {
                subscribers.remove(id);
            }
        }

        debug!("Published '{}' to {} subscribers", event, delivered);
        delivered
    }

    pub async fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().await.len()
    }

    /// Drop every subscriber. Their connection tasks see the queue close
    /// and shut down. Returns how many were dropped.
    pub async fn close_all(&self) -> usize {
        let mut subscribers = self.inner.subscribers.write().await;
        let count = subscribers.len();
        subscribers.clear();
        info!("Closed {} subscribers", count);
        count
    }

    fn in_scope(&self, sub: &Subscriber, room_id: &str) -> bool {
        match self.inner.scope {
            BroadcastScope::Room => sub.room_id == room_id,
            BroadcastScope::Global => true,
        }
    }
}
