//! Session events rendered as status, warning and error lines.

use serde_json::Value;
use sightassist_events::{event_names, EventBus};
use tokio::sync::mpsc::UnboundedSender;

/// Forwards every event to the shell loop, which owns stdout.
pub struct ChannelEventBus {
    tx: UnboundedSender<(String, Value)>,
}

impl ChannelEventBus {
    pub fn new(tx: UnboundedSender<(String, Value)>) -> Self {
        Self { tx }
    }
}

impl EventBus for ChannelEventBus {
    fn emit(&self, topic: &str, payload: Value) {
        if self.tx.send((topic.to_string(), payload)).is_err() {
            tracing::debug!(topic, "shell closed, event dropped");
        }
    }
}

/// Severity of a rendered line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Status,
    Warning,
    Error,
}

impl Level {
    fn tag(&self) -> &'static str {
        match self {
            Self::Status => "[ok]",
            Self::Warning => "[warn]",
            Self::Error => "[error]",
        }
    }
}

pub fn print_line(level: Level, message: &str) {
    match level {
        Level::Error => eprintln!("{} {}", level.tag(), message),
        _ => println!("{} {}", level.tag(), message),
    }
}

/// Turn an event into a console line. Unknown topics render nothing.
pub fn render(topic: &str, payload: &Value) -> Option<(Level, String)> {
    let text = |key: &str| payload[key].as_str().unwrap_or_default().to_string();

    match topic {
        event_names::SESSION_STARTED => {
            Some((Level::Status, "Object detection started.".to_string()))
        }
        event_names::ALERT_SPOKEN => Some((Level::Status, text("sentence"))),
        event_names::ALERT_DROPPED => Some((
            Level::Warning,
            format!("Alert for {} dropped: {}", text("label"), text("reason")),
        )),
        event_names::SESSION_FAILED => Some((Level::Error, text("error"))),
        event_names::SESSION_ENDED => match payload["error"].as_str() {
            Some(error) => Some((Level::Error, error.to_string())),
            None => Some((
                Level::Status,
                format!(
                    "Session ended after {} frames ({} alerts spoken).",
                    payload["frames_processed"].as_u64().unwrap_or(0),
                    payload["alerts_spoken"].as_u64().unwrap_or(0),
                ),
            )),
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_session_lines() {
        let started = render(event_names::SESSION_STARTED, &json!({}));
        assert_eq!(
            started,
            Some((Level::Status, "Object detection started.".to_string()))
        );

        let failed = render(
            event_names::SESSION_FAILED,
            &json!({"error": "could not access the camera: /dev/video0"}),
        );
        assert_eq!(failed.map(|(level, _)| level), Some(Level::Error));
    }

    #[test]
    fn test_render_ended_with_and_without_error() {
        let clean = render(
            event_names::SESSION_ENDED,
            &json!({"frames_processed": 12, "alerts_spoken": 2, "error": null}),
        );
        assert_eq!(
            clean,
            Some((
                Level::Status,
                "Session ended after 12 frames (2 alerts spoken).".to_string()
            ))
        );

        let failed = render(
            event_names::SESSION_ENDED,
            &json!({"frames_processed": 1, "error": "failed to capture video: eof"}),
        );
        assert_eq!(
            failed,
            Some((Level::Error, "failed to capture video: eof".to_string()))
        );
    }

    #[test]
    fn test_unknown_topic_is_silent() {
        assert!(render("frame:rendered", &json!({})).is_none());
    }

    #[test]
    fn test_channel_bus_forwards() {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let bus = ChannelEventBus::new(tx);

        bus.emit(event_names::ALERT_SPOKEN, json!({"sentence": "hi"}));

        let (topic, payload) = rx.try_recv().unwrap();
        assert_eq!(topic, event_names::ALERT_SPOKEN);
        assert_eq!(payload["sentence"], "hi");
    }
}
