//! Start/stop state for the terminal shell.
//!
//! At most one session runs at a time, on its own thread. The shell keeps the
//! session's controls so `stop` can cancel it and `alerts on|off` can flip the
//! toggle it reads every frame.

use crate::console::{print_line, ChannelEventBus, Level};
use crate::preview::PreviewSink;
use serde_json::Value;
use sightassist_application::{
    AlertToggle, CameraConfig, FrameSink, NullFrameSink, Session, SessionConfig, SessionControls,
    SessionServices,
};
use sightassist_audio::AudioPlayer;
use sightassist_events::{emit_event, event_names, now_ms, EventBus, EventBusRef, SessionFailedEvent};
use sightassist_speech::GoogleTts;
use sightassist_vision::{FrameSource, ImageDirSource, ObjectDetector};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc::UnboundedSender;

/// Where frames come from.
#[derive(Debug, Clone)]
pub enum SourceKind {
    Camera(CameraConfig),
    Frames(PathBuf),
}

struct RunningSession {
    controls: SessionControls,
    handle: JoinHandle<()>,
}

pub struct Shell {
    config: SessionConfig,
    source: SourceKind,
    preview: Option<PathBuf>,
    detector: Arc<dyn ObjectDetector>,
    player: Arc<dyn AudioPlayer>,
    alerts: AlertToggle,
    events: UnboundedSender<(String, Value)>,
    running: Option<RunningSession>,
}

impl Shell {
    pub fn new(
        config: SessionConfig,
        source: SourceKind,
        preview: Option<PathBuf>,
        detector: Arc<dyn ObjectDetector>,
        player: Arc<dyn AudioPlayer>,
        events: UnboundedSender<(String, Value)>,
    ) -> Self {
        let alerts = AlertToggle::new(config.alerts_enabled);
        Self {
            config,
            source,
            preview,
            detector,
            player,
            alerts,
            events,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .map(|r| !r.handle.is_finished())
            .unwrap_or(false)
    }

    pub fn set_alerts(&self, enabled: bool) {
        self.alerts.set(enabled);
        tracing::info!(enabled, "Audio alerts toggled");
        let state = if enabled { "enabled" } else { "disabled" };
        print_line(Level::Status, &format!("Audio alerts {state}."));
    }

    pub fn status(&self) {
        let detection = if self.is_running() { "running" } else { "idle" };
        let alerts = if self.alerts.is_enabled() { "on" } else { "off" };
        print_line(
            Level::Status,
            &format!("Detection {detection}, audio alerts {alerts}."),
        );
    }

    pub fn start(&mut self) -> anyhow::Result<()> {
        if self.is_running() {
            print_line(Level::Warning, "Object detection is already running.");
            return Ok(());
        }
        // Reap a session that ended on its own.
        if let Some(finished) = self.running.take() {
            let _ = finished.handle.join();
        }

        let controls = SessionControls::new(self.alerts.clone());
        let config = self.config.clone();
        let source = self.source.clone();
        let preview = self.preview.clone();
        let detector = Arc::clone(&self.detector);
        let player = Arc::clone(&self.player);
        let bus: EventBusRef = Arc::new(ChannelEventBus::new(self.events.clone()));
        let session_controls = controls.clone();

        let handle = thread::Builder::new()
            .name("detection-session".to_string())
            .spawn(move || {
                run_session(config, source, preview, detector, player, session_controls, bus)
            })?;

        self.running = Some(RunningSession { controls, handle });
        Ok(())
    }

    /// Cancel the running session and wait for its teardown.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            running.controls.request_stop();
            if let Err(e) = tokio::task::spawn_blocking(move || running.handle.join()).await {
                tracing::error!(error = %e, "Failed to join session thread");
            }
        }
        print_line(Level::Warning, "Object detection stopped.");
    }
}

fn run_session(
    config: SessionConfig,
    source: SourceKind,
    preview: Option<PathBuf>,
    detector: Arc<dyn ObjectDetector>,
    player: Arc<dyn AudioPlayer>,
    controls: SessionControls,
    bus: EventBusRef,
) {
    // The blocking HTTP client must live and die outside the async runtime.
    let synthesizer = match GoogleTts::new(config.speech.clone()) {
        Ok(tts) => Arc::new(tts),
        Err(e) => {
            tracing::error!(error = %e, "Failed to create speech client");
            report_failure(bus.as_ref(), format!("speech client unavailable: {e}"));
            return;
        }
    };
    let services = SessionServices {
        detector,
        synthesizer,
        player,
    };

    let session = match Session::start(&config, || open_source(&source), services, controls, bus) {
        Ok(session) => session,
        // Already reported on the bus.
        Err(_) => return,
    };

    let mut sink: Box<dyn FrameSink> = match preview {
        Some(path) => Box::new(PreviewSink::new(path)),
        None => Box::new(NullFrameSink),
    };
    if let Ok(summary) = session.run(sink.as_mut()) {
        tracing::debug!(?summary, "Session finished");
    }
}

fn open_source(kind: &SourceKind) -> sightassist_vision::Result<Box<dyn FrameSource>> {
    match kind {
        SourceKind::Frames(dir) => Ok(Box::new(ImageDirSource::open(dir)?)),
        #[cfg(target_os = "linux")]
        SourceKind::Camera(camera) => {
            let settings = sightassist_vision::CameraSettings {
                index: camera.index,
                width: camera.width,
                height: camera.height,
            };
            Ok(Box::new(sightassist_vision::Camera::open(settings)?))
        }
        #[cfg(not(target_os = "linux"))]
        SourceKind::Camera(camera) => Err(sightassist_vision::VisionError::DeviceUnavailable(
            format!(
                "camera {} unsupported on this platform, use --frames-dir",
                camera.index
            ),
        )),
    }
}

fn report_failure(bus: &dyn EventBus, error: String) {
    emit_event(
        bus,
        event_names::SESSION_FAILED,
        &SessionFailedEvent {
            error,
            timestamp_ms: now_ms(),
        },
    );
}
