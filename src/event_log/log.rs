use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
    time::Instant,
};

use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tokio::sync::mpsc;
use tokio_stream::{Stream, wrappers::UnboundedReceiverStream};

use crate::{
    event_log::{
        error::{EventLogError, corrupted, sequence_violation, serialization_failure},
        store::{EventStore, MemoryEventStore},
        types::{Event, EventPayload},
    },
    types::{Seq, SessionId, TurnId},
};

/// Single writer over an [`EventStore`]. Events reach subscribers only after they are stored.
pub struct EventLog {
    store: Arc<dyn EventStore>,
    // Only turns still open; a completed turn resumes from the store if written again.
    next: BTreeMap<(SessionId, TurnId), Seq>,
    origin: Instant,
    subscribers: Mutex<Vec<mpsc::UnboundedSender<Event>>>,
}

impl EventLog {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self {
            store,
            next: BTreeMap::new(),
            origin: Instant::now(),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryEventStore::new()))
    }

    /// Sequence number the next appended event for this turn must carry.
    pub fn next_seq(&mut self, session_id: &str, turn_id: TurnId) -> Result<Seq, EventLogError> {
        let key = (session_id.to_string(), turn_id);
        if let Some(seq) = self.next.get(&key) {
            return Ok(*seq);
        }
        let resumed = match self.store.last_seq(session_id, turn_id)? {
            Some(last) => last.checked_add(1).ok_or_else(|| {
                corrupted(format!("turn {turn_id} of session {session_id} exhausted its seq space"))
            })?,
            None => 0,
        };
        self.next.insert(key, resumed);
        Ok(resumed)
    }

    pub fn append(&mut self, event: Event) -> Result<(), EventLogError> {
        let expected = self.next_seq(&event.session_id, event.turn_id)?;
        if event.seq != expected {
            return Err(sequence_violation(format!(
                "event for ({}, {}) carries seq {}, expected {}",
                event.session_id, event.turn_id, event.seq, expected
            )));
        }

        if let Err(err) = self.store.append(&event) {
            tracing::error!(
                target: "event_log",
                session_id = %event.session_id,
                turn_id = event.turn_id,
                seq = event.seq,
                error = %err,
                "event_append_failed"
            );
            return Err(err);
        }
        let key = (event.session_id.clone(), event.turn_id);
        if matches!(event.payload, EventPayload::TurnCompleted { .. }) {
            self.next.remove(&key);
        } else {
            self.next.insert(key, expected + 1);
        }
        tracing::trace!(
            target: "event_log",
            session_id = %event.session_id,
            turn_id = event.turn_id,
            seq = event.seq,
            kind = event.kind().as_str(),
            "event_appended"
        );
        self.publish(event);
        Ok(())
    }

    fn publish(&self, event: Event) {
        let mut subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // A closed receiver means the subscriber went away.
        subscribers.retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    /// Stamps, sequences and appends `payload`, returning the committed event.
    pub fn record(
        &mut self,
        session_id: &str,
        turn_id: TurnId,
        payload: EventPayload,
    ) -> Result<Event, EventLogError> {
        let seq = self.next_seq(session_id, turn_id)?;
        let wall_ts = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|err| serialization_failure(format!("failed to format wall clock: {err}")))?;
        let event = Event {
            session_id: session_id.to_string(),
            turn_id,
            seq,
            monotonic_ts_us: self.origin.elapsed().as_micros().min(u64::MAX as u128) as u64,
            wall_ts,
            payload,
        };
        self.append(event.clone())?;
        Ok(event)
    }

    /// Live stream of every event committed after this call, in append order.
    /// Each subscriber buffers until it catches up, so none is ever skipped.
    /// The stream ends when the log is dropped.
    pub fn subscribe(&self) -> impl Stream<Item = Event> + Send + Unpin + 'static {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(sender);
        tracing::debug!(target: "event_log", "event_subscriber_added");
        UnboundedReceiverStream::new(receiver)
    }

    /// Turns with an open sequence counter.
    pub fn open_turns(&self) -> usize {
        self.next.len()
    }

    pub fn reader(&self) -> EventLogReader {
        EventLogReader {
            store: Arc::clone(&self.store),
        }
    }
}

/// Cloneable read handle; safe to use from other tasks while the writer appends.
#[derive(Clone)]
pub struct EventLogReader {
    store: Arc<dyn EventStore>,
}

impl EventLogReader {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Events of one turn in stored order, verified gapless from 0.
    pub fn replay(&self, session_id: &str, turn_id: TurnId) -> Result<Vec<Event>, EventLogError> {
        let events = self.store.load_turn(session_id, turn_id)?;
        verify_gapless(&events)?;
        Ok(events)
    }

    pub fn replay_session(&self, session_id: &str) -> Result<Vec<Event>, EventLogError> {
        let events = self.store.load_session(session_id)?;
        let mut start = 0;
        while start < events.len() {
            let turn_id = events[start].turn_id;
            let end = events[start..]
                .iter()
                .position(|event| event.turn_id != turn_id)
                .map_or(events.len(), |offset| start + offset);
            verify_gapless(&events[start..end])?;
            start = end;
        }
        Ok(events)
    }
}

fn verify_gapless(events: &[Event]) -> Result<(), EventLogError> {
    for (expected, event) in events.iter().enumerate() {
        if event.seq != expected as Seq {
            return Err(corrupted(format!(
                "turn {} of session {}: expected seq {}, found {}",
                event.turn_id, event.session_id, expected, event.seq
            )));
        }
    }
    Ok(())
}
