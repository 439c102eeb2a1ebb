//! Event store and broadcast fabric (§4.7).
//!
//! A bounded FIFO guarded by a single mutex, with a per-`(track_id,
//! event_type)` dedup window and a `tokio::sync::broadcast` fan-out channel
//! for subscribers. Modeled directly on the in-process job event bus used
//! elsewhere in this stack's orchestration runtime, generalized from a
//! single shared ring to the store's own bounded-FIFO-plus-dedup semantics.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chrono::{DateTime, Local};
use tokio::sync::broadcast;

use crate::model::{ContextValue, Event, EventContext, EventId, EventType, SeverityLevel, ZoneId};

fn reasoning_text(event_type: EventType, ctx: &EventContext, track_id: u64, track_id_2: Option<u64>, duration: f32) -> String {
    let velocity = ctx
        .get("speed_px_s")
        .map(|v| match v {
            ContextValue::Number(n) => format!("{n:.0}"),
            _ => "0".to_string(),
        })
        .unwrap_or_else(|| "0".to_string());
    let count = ctx
        .get("count")
        .map(|v| match v {
            ContextValue::Number(n) => format!("{n:.0}"),
            _ => "0".to_string(),
        })
        .unwrap_or_else(|| "0".to_string());

    match event_type {
        EventType::Loitering => format!(
            "Subject ID {track_id} exhibited loitering behavior for {duration:.0}s. Low velocity ({velocity} px/s) with extended dwell time."
        ),
        EventType::ZoneViolation => format!(
            "Subject ID {track_id} violated zone rules in monitored area. Active violation duration: {duration:.0}s."
        ),
        EventType::Intrusion => format!(
            "Subject ID {track_id} entered restricted area. Perimeter violation active for {duration:.0}s."
        ),
        EventType::Fighting => format!(
            "Rapid oscillating motion involving Subject IDs {track_id} and {}. High-velocity physical interaction pattern observed for {duration:.0}s.",
            track_id_2.unwrap_or_default()
        ),
        EventType::TheftSuspected => format!(
            "Subject ID {track_id} exhibited suspicious object interaction followed by rapid departure ({velocity} px/s). Concealment behavior detected."
        ),
        EventType::CrowdForming => format!(
            "Multiple subjects ({count}+) converging in sector. Crowd density increasing."
        ),
        EventType::AbandonedObject => format!(
            "Static object detected with no associated track for {duration:.0}s. Potential abandoned item."
        ),
        EventType::Running => format!(
            "Subject ID {track_id} moving at elevated speed ({velocity} px/s)."
        ),
        EventType::Normal => format!("Subject ID {track_id} nominal."),
    }
}

#[derive(Debug, Clone)]
struct DedupEntry {
    last_seen: chrono::DateTime<Local>,
}

struct Inner {
    events: VecDeque<Event>,
    next_id: u64,
    dedup: HashMap<(u64, EventType), DedupEntry>,
    capacity: usize,
    dedup_window_s: f32,
}

/// Bounded, deduplicating event store with a broadcast fan-out channel.
pub struct EventStore {
    inner: Mutex<Inner>,
    broadcast: broadcast::Sender<Event>,
    dropped_subscriber_messages: std::sync::atomic::AtomicU64,
}

impl std::fmt::Debug for EventStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock().unwrap();
        f.debug_struct("EventStore")
            .field("len", &inner.events.len())
            .field("capacity", &inner.capacity)
            .field("subscribers", &self.broadcast.receiver_count())
            .finish()
    }
}

/// A publish request carrying everything needed to materialize an [`Event`].
pub struct PublishRequest {
    pub event_type: EventType,
    pub severity_score: f32,
    pub track_id: u64,
    pub track_id_2: Option<u64>,
    pub zone_id: Option<ZoneId>,
    pub duration: f32,
    pub context: EventContext,
    pub timestamp: DateTime<Local>,
}

impl EventStore {
    pub fn new(capacity: usize, dedup_window_s: f32, broadcast_capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(broadcast_capacity.max(1));
        EventStore {
            inner: Mutex::new(Inner {
                events: VecDeque::with_capacity(capacity),
                next_id: 1,
                dedup: HashMap::new(),
                capacity,
                dedup_window_s,
            }),
            broadcast: tx,
            dropped_subscriber_messages: std::sync::atomic::AtomicU64::new(0),
        }
    }

    /// Assign an id, timestamp and reasoning text, append, evict, and
    /// broadcast. Returns `None` if the publish fell within the dedup window.
    pub fn publish(&self, req: PublishRequest) -> Option<Event> {
        let now = req.timestamp;
        let mut inner = self.inner.lock().unwrap();

        let key = (req.track_id, req.event_type);
        if let Some(entry) = inner.dedup.get(&key) {
            let elapsed = (now - entry.last_seen).num_milliseconds() as f32 / 1000.0;
            if elapsed < inner.dedup_window_s {
                tracing::debug!(track_id = req.track_id, ?req.event_type, "dedup suppressed publish");
                return None;
            }
        }

        let id = EventId(inner.next_id);
        inner.next_id += 1;

        let mut context = req.context;
        if let Some(t2) = req.track_id_2 {
            context.insert("track_id_2".to_string(), ContextValue::Number(t2 as f64));
        }

        let text = reasoning_text(req.event_type, &context, req.track_id, req.track_id_2, req.duration);
        let level = SeverityLevel::from_score(req.severity_score);

        let event = Event {
            event_id: id,
            event_type: req.event_type,
            severity: level,
            severity_score: req.severity_score,
            track_id: req.track_id,
            zone_id: req.zone_id,
            reasoning_text: text,
            duration: req.duration,
            timestamp: now,
            context,
        };

        inner.dedup.insert(key, DedupEntry { last_seen: now });
        let stale_before = now - chrono::Duration::milliseconds((inner.dedup_window_s * 10.0 * 1000.0) as i64);
        inner.dedup.retain(|_, entry| entry.last_seen >= stale_before);

        inner.events.push_back(event.clone());
        while inner.events.len() > inner.capacity {
            inner.events.pop_front();
        }

        drop(inner);

        if self.broadcast.send(event.clone()).is_err() {
            tracing::debug!("no active subscribers for reasoning events");
        }

        Some(event)
    }

    /// Newest-first, capped to `limit`.
    pub fn recent(&self, limit: usize) -> Vec<Event> {
        let inner = self.inner.lock().unwrap();
        inner.events.iter().rev().take(limit).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.events.clear();
        inner.dedup.clear();
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.broadcast.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.broadcast.receiver_count()
    }

    pub fn note_dropped_subscriber_message(&self) {
        self.dropped_subscriber_messages
            .fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    }

    pub fn dropped_subscriber_messages(&self) -> u64 {
        self.dropped_subscriber_messages.load(std::sync::atomic::Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(track_id: u64, event_type: EventType) -> PublishRequest {
        PublishRequest {
            event_type,
            severity_score: 0.5,
            track_id,
            track_id_2: None,
            zone_id: None,
            duration: 10.0,
            context: EventContext::new(),
            timestamp: Local::now(),
        }
    }

    #[test]
    fn event_ids_strictly_increasing() {
        let store = EventStore::new(100, 0.0, 16);
        let e1 = store.publish(req(1, EventType::Loitering)).unwrap();
        let e2 = store.publish(req(2, EventType::Running)).unwrap();
        assert!(e1.event_id.0 < e2.event_id.0);
    }

    #[test]
    fn dedup_suppresses_within_window() {
        let store = EventStore::new(100, 5.0, 16);
        let e1 = store.publish(req(42, EventType::Loitering));
        assert!(e1.is_some());
        let e2 = store.publish(req(42, EventType::Loitering));
        assert!(e2.is_none());
    }

    #[test]
    fn capacity_is_bounded() {
        let store = EventStore::new(3, 0.0, 16);
        for i in 0..10u64 {
            store.publish(req(i, EventType::Running));
        }
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn recent_is_newest_first() {
        let store = EventStore::new(10, 0.0, 16);
        store.publish(req(1, EventType::Running));
        store.publish(req(2, EventType::Running));
        let recent = store.recent(10);
        assert_eq!(recent[0].track_id, 2);
        assert_eq!(recent[1].track_id, 1);
    }
}
