use std::{
    collections::{BTreeMap, btree_map::Entry},
    fs,
    ops::RangeInclusive,
    path::Path,
    sync::{Mutex, MutexGuard},
};

use rusqlite::{Connection, OptionalExtension, Params, params};

use crate::{
    event_log::{
        error::{EventLogError, corrupted, serialization_failure, storage_failure},
        types::{Event, EventPayload},
    },
    types::{Seq, TurnId},
};

/// Durable append-only backing for the log. Implementations never update or delete rows.
pub trait EventStore: Send + Sync {
    fn append(&self, event: &Event) -> Result<(), EventLogError>;
    fn load_turn(&self, session_id: &str, turn_id: TurnId) -> Result<Vec<Event>, EventLogError>;
    fn load_session(&self, session_id: &str) -> Result<Vec<Event>, EventLogError>;
    fn last_seq(&self, session_id: &str, turn_id: TurnId) -> Result<Option<Seq>, EventLogError>;
}

type EventKey = (String, TurnId, Seq);

/// In-process backend ordered by `(session_id, turn_id, seq)`.
#[derive(Debug, Default)]
pub struct MemoryEventStore {
    events: Mutex<BTreeMap<EventKey, Event>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<EventKey, Event>>, EventLogError> {
        self.events
            .lock()
            .map_err(|_| storage_failure("memory event store lock poisoned"))
    }
}

fn turn_range(session_id: &str, turn_id: TurnId) -> RangeInclusive<EventKey> {
    (session_id.to_string(), turn_id, Seq::MIN)..=(session_id.to_string(), turn_id, Seq::MAX)
}

impl EventStore for MemoryEventStore {
    fn append(&self, event: &Event) -> Result<(), EventLogError> {
        let key = (event.session_id.clone(), event.turn_id, event.seq);
        match self.lock()?.entry(key) {
            Entry::Occupied(_) => Err(storage_failure(format!(
                "duplicate event key ({}, {}, {})",
                event.session_id, event.turn_id, event.seq
            ))),
            Entry::Vacant(slot) => {
                slot.insert(event.clone());
                Ok(())
            }
        }
    }

    fn load_turn(&self, session_id: &str, turn_id: TurnId) -> Result<Vec<Event>, EventLogError> {
        Ok(self
            .lock()?
            .range(turn_range(session_id, turn_id))
            .map(|(_, event)| event.clone())
            .collect())
    }

    fn load_session(&self, session_id: &str) -> Result<Vec<Event>, EventLogError> {
        let range = (session_id.to_string(), TurnId::MIN, Seq::MIN)
            ..=(session_id.to_string(), TurnId::MAX, Seq::MAX);
        Ok(self
            .lock()?
            .range(range)
            .map(|(_, event)| event.clone())
            .collect())
    }

    fn last_seq(&self, session_id: &str, turn_id: TurnId) -> Result<Option<Seq>, EventLogError> {
        Ok(self
            .lock()?
            .range(turn_range(session_id, turn_id))
            .next_back()
            .map(|((_, _, seq), _)| *seq))
    }
}

const CREATE_EVENTS_TABLE: &str = "CREATE TABLE IF NOT EXISTS events (
    session_id TEXT NOT NULL,
    turn_id INTEGER NOT NULL,
    seq INTEGER NOT NULL,
    monotonic_ts_us INTEGER NOT NULL,
    wall_ts TEXT NOT NULL,
    kind TEXT NOT NULL,
    payload TEXT NOT NULL,
    PRIMARY KEY (session_id, turn_id, seq)
)";

const SELECT_COLUMNS: &str = "SELECT session_id, turn_id, seq, monotonic_ts_us, wall_ts, kind, payload FROM events";

type EventRow = (String, i64, i64, i64, String, String, String);

/// Single-table SQLite backend keyed by `(session_id, turn_id, seq)`.
#[derive(Debug)]
pub struct SqliteEventStore {
    conn: Mutex<Connection>,
}

impl SqliteEventStore {
    pub fn open(path: &Path) -> Result<Self, EventLogError> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                storage_failure(format!(
                    "failed to create event store directory {}: {err}",
                    parent.display()
                ))
            })?;
        }
        let conn = Connection::open(path).map_err(|err| {
            storage_failure(format!("failed to open event store {}: {err}", path.display()))
        })?;
        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(|err| storage_failure(format!("failed to enable WAL: {err}")))?;
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, EventLogError> {
        let conn = Connection::open_in_memory()
            .map_err(|err| storage_failure(format!("failed to open in-memory event store: {err}")))?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, EventLogError> {
        conn.execute(CREATE_EVENTS_TABLE, [])
            .map_err(|err| storage_failure(format!("failed to create events table: {err}")))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, EventLogError> {
        self.conn
            .lock()
            .map_err(|_| storage_failure("sqlite event store lock poisoned"))
    }

    fn query(&self, sql: &str, params: impl Params) -> Result<Vec<Event>, EventLogError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(sql)
            .map_err(|err| storage_failure(format!("failed to prepare event query: {err}")))?;
        let rows = stmt
            .query_map(params, |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            })
            .map_err(|err| storage_failure(format!("failed to query events: {err}")))?
            .collect::<Result<Vec<EventRow>, _>>()
            .map_err(|err| storage_failure(format!("failed to read event row: {err}")))?;
        rows.into_iter().map(row_to_event).collect()
    }
}

fn to_sql_int(value: u64, field: &str) -> Result<i64, EventLogError> {
    i64::try_from(value).map_err(|_| storage_failure(format!("{field} {value} exceeds sqlite range")))
}

fn from_sql_int(value: i64, field: &str) -> Result<u64, EventLogError> {
    u64::try_from(value).map_err(|_| corrupted(format!("negative {field} {value} in event store")))
}

fn row_to_event(row: EventRow) -> Result<Event, EventLogError> {
    let (session_id, turn_id, seq, monotonic_ts_us, wall_ts, kind, payload) = row;
    let payload: EventPayload = serde_json::from_str(&payload).map_err(|err| {
        corrupted(format!(
            "event ({session_id}, {turn_id}, {seq}) has an unreadable payload: {err}"
        ))
    })?;
    if payload.kind().as_str() != kind {
        return Err(corrupted(format!(
            "event ({session_id}, {turn_id}, {seq}) kind column '{kind}' disagrees with payload"
        )));
    }
    Ok(Event {
        session_id,
        turn_id: from_sql_int(turn_id, "turn_id")?,
        seq: from_sql_int(seq, "seq")?,
        monotonic_ts_us: from_sql_int(monotonic_ts_us, "monotonic_ts_us")?,
        wall_ts,
        payload,
    })
}

impl EventStore for SqliteEventStore {
    fn append(&self, event: &Event) -> Result<(), EventLogError> {
        let payload = serde_json::to_string(&event.payload)
            .map_err(|err| serialization_failure(format!("failed to encode event payload: {err}")))?;
        let turn_id = to_sql_int(event.turn_id, "turn_id")?;
        let seq = to_sql_int(event.seq, "seq")?;
        let monotonic_ts_us = to_sql_int(event.monotonic_ts_us, "monotonic_ts_us")?;
        self.lock()?
            .execute(
                "INSERT INTO events (session_id, turn_id, seq, monotonic_ts_us, wall_ts, kind, payload)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    event.session_id,
                    turn_id,
                    seq,
                    monotonic_ts_us,
                    event.wall_ts,
                    event.kind().as_str(),
                    payload
                ],
            )
            .map_err(|err| storage_failure(format!("failed to append event: {err}")))?;
        Ok(())
    }

    fn load_turn(&self, session_id: &str, turn_id: TurnId) -> Result<Vec<Event>, EventLogError> {
        let turn_id = to_sql_int(turn_id, "turn_id")?;
        self.query(
            &format!("{SELECT_COLUMNS} WHERE session_id = ?1 AND turn_id = ?2 ORDER BY seq"),
            params![session_id, turn_id],
        )
    }

    fn load_session(&self, session_id: &str) -> Result<Vec<Event>, EventLogError> {
        self.query(
            &format!("{SELECT_COLUMNS} WHERE session_id = ?1 ORDER BY turn_id, seq"),
            params![session_id],
        )
    }

    fn last_seq(&self, session_id: &str, turn_id: TurnId) -> Result<Option<Seq>, EventLogError> {
        let turn_id = to_sql_int(turn_id, "turn_id")?;
        let last: Option<i64> = self
            .lock()?
            .query_row(
                "SELECT MAX(seq) FROM events WHERE session_id = ?1 AND turn_id = ?2",
                params![session_id, turn_id],
                |row| row.get::<_, Option<i64>>(0),
            )
            .optional()
            .map_err(|err| storage_failure(format!("failed to read last seq: {err}")))?
            .flatten();
        last.map(|seq| from_sql_int(seq, "seq")).transpose()
    }
}
