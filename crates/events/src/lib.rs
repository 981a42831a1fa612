//! Event contracts between the detection session and the UI shell.
//!
//! The session emits these DTOs through an [`EventBus`]; the shell turns
//! them into status, warning and error lines.

mod bus;

pub use bus::{emit_event, EmittedEvent, EventBus, EventBusRef, InMemoryEventBus, NullEventBus};

use serde::{Deserialize, Serialize};
use sightassist_vision::Position;
use uuid::Uuid;

/// Milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Emitted once the frame source is open and the loop is about to run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStartedEvent {
    pub session_id: Uuid,
    pub alerts_enabled: bool,
    pub timestamp_ms: i64,
}

/// Emitted when an alert has been synthesized and playback started.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertSpokenEvent {
    pub session_id: Uuid,
    pub label: String,
    pub position: Position,
    pub sentence: String,
    pub timestamp_ms: i64,
}

/// Emitted when an admitted alert could not be spoken.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertDroppedEvent {
    pub session_id: Uuid,
    pub label: String,
    pub reason: String,
    pub timestamp_ms: i64,
}

/// Emitted when the loop has exited and the session is torn down.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionEndedEvent {
    pub session_id: Uuid,
    pub frames_processed: u64,
    pub alerts_spoken: u64,
    pub alerts_dropped: u64,
    /// Set when the session ended on an error rather than a stop request.
    #[serde(default)]
    pub error: Option<String>,
    pub timestamp_ms: i64,
}

/// Emitted when a session could not start at all.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionFailedEvent {
    pub error: String,
    pub timestamp_ms: i64,
}

/// Event names as constants to prevent typos.
pub mod event_names {
    pub const SESSION_STARTED: &str = "session:started";
    pub const SESSION_ENDED: &str = "session:ended";
    pub const SESSION_FAILED: &str = "session:failed";
    pub const ALERT_SPOKEN: &str = "alert:spoken";
    pub const ALERT_DROPPED: &str = "alert:dropped";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_spoken_roundtrip_shape() {
        let event = AlertSpokenEvent {
            session_id: Uuid::nil(),
            label: "person".to_string(),
            position: Position::Left,
            sentence: "Alert! A person is on your left.".to_string(),
            timestamp_ms: 1,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["position"], "left");
        assert_eq!(json["label"], "person");
    }

    #[test]
    fn test_session_ended_deserialize_without_error() {
        let json = r#"{
            "session_id": "00000000-0000-0000-0000-000000000000",
            "frames_processed": 12,
            "alerts_spoken": 2,
            "alerts_dropped": 0,
            "timestamp_ms": 5
        }"#;
        let event: SessionEndedEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.frames_processed, 12);
        assert!(event.error.is_none());
    }
}
