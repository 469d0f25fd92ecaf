use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TimerStatus {
    Idle,
    Running,
    Paused,
}

impl TimerStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerStatus::Idle => "idle",
            TimerStatus::Running => "running",
            TimerStatus::Paused => "paused",
        }
    }
}

/// The single active work session. Persisted verbatim under the timer storage key.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    pub is_running: bool,
    /// Wall-clock anchor of the current run segment.
    pub started_at_epoch_seconds: Option<i64>,
    /// Seconds banked from earlier segments of this session.
    pub accumulated_seconds: i64,
    pub task_id: Option<String>,
    pub task_title: Option<String>,
    /// Anchor of the first segment; becomes the committed `started_at`.
    #[serde(default)]
    pub session_started_at_epoch_seconds: Option<i64>,
}

impl TimerSession {
    pub fn status(&self) -> TimerStatus {
        if self.is_running {
            TimerStatus::Running
        } else if self.session_started_at_epoch_seconds.is_some() {
            TimerStatus::Paused
        } else {
            TimerStatus::Idle
        }
    }

    /// A running session must carry its anchor.
    pub fn is_consistent(&self) -> bool {
        !self.is_running || self.started_at_epoch_seconds.is_some()
    }

    pub fn elapsed_seconds(&self, now_epoch_seconds: i64) -> i64 {
        let running = match (self.is_running, self.started_at_epoch_seconds) {
            (true, Some(anchor)) => (now_epoch_seconds - anchor).max(0),
            _ => 0,
        };
        self.accumulated_seconds.max(0).saturating_add(running)
    }

    pub fn begin(&mut self, now_epoch_seconds: i64, task_id: Option<String>, task_title: Option<String>) {
        *self = Self {
            is_running: true,
            started_at_epoch_seconds: Some(now_epoch_seconds),
            accumulated_seconds: 0,
            task_id,
            task_title,
            session_started_at_epoch_seconds: Some(now_epoch_seconds),
        };
    }

    /// Bank the running segment and drop the anchor.
    pub fn pause(&mut self, now_epoch_seconds: i64) {
        // Payloads written before the session anchor existed only carry the segment anchor
        let segment_anchor = self.started_at_epoch_seconds.unwrap_or(now_epoch_seconds);
        self.session_started_at_epoch_seconds.get_or_insert(segment_anchor);
        self.accumulated_seconds = self.elapsed_seconds(now_epoch_seconds);
        self.is_running = false;
        self.started_at_epoch_seconds = None;
    }

    pub fn resume(&mut self, now_epoch_seconds: i64) {
        self.is_running = true;
        self.started_at_epoch_seconds = Some(now_epoch_seconds);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MutationType {
    Create,
    Update,
    Delete,
}

impl MutationType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "create" => Some(MutationType::Create),
            "update" => Some(MutationType::Update),
            "delete" => Some(MutationType::Delete),
            _ => None,
        }
    }

    /// Updates and deletes address an existing row by its id
    pub fn needs_target(&self) -> bool {
        matches!(self, MutationType::Update | MutationType::Delete)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MutationType::Create => "create",
            MutationType::Update => "update",
            MutationType::Delete => "delete",
        }
    }
}

impl fmt::Display for MutationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Project,
    Task,
    Note,
    TimeEntry,
}

impl EntityKind {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "project" => Some(EntityKind::Project),
            "task" => Some(EntityKind::Task),
            "note" => Some(EntityKind::Note),
            "time_entry" => Some(EntityKind::TimeEntry),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Project => "project",
            EntityKind::Task => "task",
            EntityKind::Note => "note",
            EntityKind::TimeEntry => "time_entry",
        }
    }

    /// Remote table holding rows of this kind
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Project => "projects",
            EntityKind::Task => "tasks",
            EntityKind::Note => "notes",
            EntityKind::TimeEntry => "time_entries",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A buffered mutation waiting for connectivity. The id doubles as the
/// operation's idempotency key on the remote side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OfflineQueueItem {
    pub id: String,
    #[serde(rename = "type")]
    pub mutation: MutationType,
    pub entity: EntityKind,
    pub payload: serde_json::Value,
    pub enqueued_at_epoch_millis: i64,
}

impl OfflineQueueItem {
    /// Row id the mutation targets, read from the payload's `id` field
    pub fn target_id(&self) -> Option<String> {
        match self.payload.get("id")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// Reject mutations the remote could never apply, so they never reach the queue
    pub fn validate(&self) -> Result<()> {
        if self.mutation.needs_target() && self.target_id().is_none() {
            return Err(Error::InvalidMutation {
                message: format!(
                    "{} {} payload needs a string or numeric \"id\"",
                    self.mutation, self.entity
                ),
            });
        }
        Ok(())
    }
}

/// Time-entry row written to the system of record when a session stops
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTimeEntry {
    pub user_id: String,
    pub task_id: Option<String>,
    pub duration_minutes: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_by_default() {
        let session = TimerSession::default();
        assert_eq!(session.status(), TimerStatus::Idle);
        assert_eq!(session.elapsed_seconds(1_000), 0);
    }

    #[test]
    fn elapsed_is_anchor_based() {
        let mut session = TimerSession::default();
        session.begin(1_000, None, None);
        assert_eq!(session.elapsed_seconds(1_000), 0);
        assert_eq!(session.elapsed_seconds(1_042), 42);
    }

    #[test]
    fn pause_banks_segment() {
        let mut session = TimerSession::default();
        session.begin(1_000, Some("t1".into()), None);
        session.pause(1_030);
        assert_eq!(session.status(), TimerStatus::Paused);
        assert_eq!(session.elapsed_seconds(5_000), 30);

        session.resume(6_000);
        assert_eq!(session.elapsed_seconds(6_015), 45);
        assert_eq!(session.session_started_at_epoch_seconds, Some(1_000));
    }

    #[test]
    fn pause_keeps_session_without_stored_session_anchor() {
        let raw = r#"{"isRunning":true,"startedAtEpochSeconds":1000,"accumulatedSeconds":0,"taskId":null,"taskTitle":null}"#;
        let mut session: TimerSession = serde_json::from_str(raw).unwrap();

        session.pause(1_600);
        assert_eq!(session.status(), TimerStatus::Paused);
        assert_eq!(session.elapsed_seconds(9_999), 600);
        assert_eq!(session.session_started_at_epoch_seconds, Some(1_000));
    }

    #[test]
    fn clock_skew_never_goes_negative() {
        let mut session = TimerSession::default();
        session.begin(1_000, None, None);
        assert_eq!(session.elapsed_seconds(900), 0);
    }

    #[test]
    fn running_without_anchor_is_inconsistent() {
        let session = TimerSession {
            is_running: true,
            ..TimerSession::default()
        };
        assert!(!session.is_consistent());
    }

    #[test]
    fn persisted_field_names() {
        let mut session = TimerSession::default();
        session.begin(10, Some("task-1".into()), Some("Write docs".into()));
        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["isRunning"], true);
        assert_eq!(json["startedAtEpochSeconds"], 10);
        assert_eq!(json["accumulatedSeconds"], 0);
        assert_eq!(json["taskId"], "task-1");
        assert_eq!(json["taskTitle"], "Write docs");
    }

    #[test]
    fn loads_payload_without_session_anchor() {
        let raw = r#"{"isRunning":true,"startedAtEpochSeconds":5,"accumulatedSeconds":0,"taskId":null,"taskTitle":null}"#;
        let session: TimerSession = serde_json::from_str(raw).unwrap();
        assert_eq!(session.status(), TimerStatus::Running);
        assert_eq!(session.session_started_at_epoch_seconds, None);
    }

    #[test]
    fn queue_item_wire_shape() {
        let item = OfflineQueueItem {
            id: "1700000000000-abc".into(),
            mutation: MutationType::Update,
            entity: EntityKind::TimeEntry,
            payload: serde_json::json!({ "id": 7, "duration_minutes": 3 }),
            enqueued_at_epoch_millis: 1_700_000_000_000,
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["type"], "update");
        assert_eq!(json["entity"], "time_entry");
        assert_eq!(json["enqueuedAtEpochMillis"], 1_700_000_000_000i64);
        assert_eq!(item.target_id().as_deref(), Some("7"));
    }

    #[test]
    fn update_and_delete_need_an_id() {
        let mut item = OfflineQueueItem {
            id: "1700000000000-abc".into(),
            mutation: MutationType::Update,
            entity: EntityKind::Task,
            payload: serde_json::json!({ "title": "x" }),
            enqueued_at_epoch_millis: 1_700_000_000_000,
        };
        let err = item.validate().unwrap_err();
        assert!(matches!(err, Error::InvalidMutation { .. }));
        assert!(!err.is_transient());

        item.mutation = MutationType::Delete;
        item.payload = serde_json::json!({ "id": true });
        assert!(item.validate().is_err());

        item.mutation = MutationType::Create;
        assert!(item.validate().is_ok());
    }
}
