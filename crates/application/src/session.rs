//! One detection session: the span between a start and a stop request.
//!
//! The session owns the frame source, the cooldown table and the audio
//! reclaimer, and runs the synchronous capture, detect, classify, alert and
//! render loop on the calling thread. Everything it owns is released together
//! at teardown, whichever way the loop ends.

use crate::config::SessionConfig;
use crate::controls::SessionControls;
use crate::error::{Result, SessionError};
use image::RgbImage;
use sightassist_alerts::{compose_sentence, AdmittedAlert, AlertPolicy, CooldownTable};
use sightassist_audio::{AudioPlayer, Reclaimer};
use sightassist_events::{
    emit_event, event_names, now_ms, AlertDroppedEvent, AlertSpokenEvent, EventBus, EventBusRef,
    SessionEndedEvent, SessionFailedEvent, SessionStartedEvent,
};
use sightassist_speech::SpeechSynthesizer;
use sightassist_vision::{
    annotate, Detection, Frame, FrameSource, ObjectDetector, Position, VisionError,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// Receives the annotated frame once per iteration.
pub trait FrameSink {
    fn present(&mut self, image: &RgbImage, detections: &[Detection]);
}

/// Discards every frame. Used when running headless.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullFrameSink;

impl FrameSink for NullFrameSink {
    fn present(&mut self, _image: &RgbImage, _detections: &[Detection]) {}
}

/// External collaborators a session talks to. Cheap to clone; the same
/// services can back any number of consecutive sessions.
#[derive(Clone)]
pub struct SessionServices {
    pub detector: Arc<dyn ObjectDetector>,
    pub synthesizer: Arc<dyn SpeechSynthesizer>,
    pub player: Arc<dyn AudioPlayer>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpokenAlert {
    pub label: String,
    pub position: Position,
    pub sentence: String,
}

/// What one iteration of the loop produced.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub detections: Vec<Detection>,
    pub alerts: Vec<SpokenAlert>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub frames_processed: u64,
    pub alerts_spoken: u64,
    pub alerts_dropped: u64,
}

pub struct Session {
    id: Uuid,
    source: Box<dyn FrameSource>,
    detector: Arc<dyn ObjectDetector>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
    reclaimer: Reclaimer,
    policy: AlertPolicy,
    cooldowns: CooldownTable,
    controls: SessionControls,
    bus: EventBusRef,
    artifact_dir: PathBuf,
    frame_interval: Duration,
    summary: SessionSummary,
    released: bool,
}

impl Session {
    /// Prepare the artifact directory and open the frame source.
    ///
    /// On failure nothing is left running: the player is stopped, a
    /// `session:failed` event is emitted and the loop never starts.
    pub fn start<F>(
        config: &SessionConfig,
        open_source: F,
        services: SessionServices,
        controls: SessionControls,
        bus: EventBusRef,
    ) -> Result<Self>
    where
        F: FnOnce() -> sightassist_vision::Result<Box<dyn FrameSource>>,
    {
        if let Err(source) = std::fs::create_dir_all(&config.artifact_dir) {
            let error = SessionError::ArtifactDir {
                path: config.artifact_dir.clone(),
                source,
            };
            return Err(abort_start(services.player.as_ref(), bus.as_ref(), error));
        }

        let source = match open_source() {
            Ok(source) => source,
            Err(e) => {
                let message = match e {
                    VisionError::DeviceUnavailable(message) => message,
                    other => other.to_string(),
                };
                let error = SessionError::DeviceUnavailable(message);
                return Err(abort_start(services.player.as_ref(), bus.as_ref(), error));
            }
        };

        let id = Uuid::new_v4();
        let alerts_enabled = controls.alerts_enabled();
        let policy = AlertPolicy::new(config.cooldown(), config.alert_categories.iter().cloned());
        tracing::info!(
            session_id = %id,
            detector = services.detector.name(),
            synthesizer = services.synthesizer.name(),
            alerts_enabled,
            cooldown_secs = policy.cooldown().as_secs(),
            categories = policy.categories().len(),
            "Session started"
        );
        emit_event(
            bus.as_ref(),
            event_names::SESSION_STARTED,
            &SessionStartedEvent {
                session_id: id,
                alerts_enabled,
                timestamp_ms: now_ms(),
            },
        );

        Ok(Self {
            id,
            source,
            detector: services.detector,
            synthesizer: services.synthesizer,
            reclaimer: Reclaimer::with_poll_interval(
                services.player,
                config.reclaim_poll_interval(),
            ),
            policy,
            cooldowns: CooldownTable::new(),
            controls,
            bus,
            artifact_dir: config.artifact_dir.clone(),
            frame_interval: config.frame_interval(),
            summary: SessionSummary::default(),
            released: false,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn controls(&self) -> &SessionControls {
        &self.controls
    }

    pub fn policy(&self) -> &AlertPolicy {
        &self.policy
    }

    pub fn cooldowns(&self) -> &CooldownTable {
        &self.cooldowns
    }

    pub fn summary(&self) -> SessionSummary {
        self.summary
    }

    /// Run until a stop request, the end of the source, or a fatal error.
    /// Teardown runs in every case and `session:ended` is always emitted.
    pub fn run(mut self, sink: &mut dyn FrameSink) -> Result<SessionSummary> {
        let outcome = self.run_loop(sink);
        self.teardown();

        if let Err(e) = &outcome {
            tracing::error!(session_id = %self.id, error = %e, "Session ended with error");
        }
        emit_event(
            self.bus.as_ref(),
            event_names::SESSION_ENDED,
            &SessionEndedEvent {
                session_id: self.id,
                frames_processed: self.summary.frames_processed,
                alerts_spoken: self.summary.alerts_spoken,
                alerts_dropped: self.summary.alerts_dropped,
                error: outcome.as_ref().err().map(|e| e.to_string()),
                timestamp_ms: now_ms(),
            },
        );

        outcome.map(|()| self.summary)
    }

    fn run_loop(&mut self, sink: &mut dyn FrameSink) -> Result<()> {
        loop {
            if self.controls.is_stop_requested() {
                tracing::info!(session_id = %self.id, "Stop requested");
                return Ok(());
            }

            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    tracing::info!(session_id = %self.id, "Frame source exhausted");
                    return Ok(());
                }
                Err(e) => return Err(SessionError::FrameRead(e.to_string())),
            };

            self.process_frame(&frame, Instant::now(), sink)?;

            if !self.frame_interval.is_zero() {
                std::thread::sleep(self.frame_interval);
            }
        }
    }

    /// One loop iteration on an already captured frame.
    ///
    /// While alert mode is on, objects outside the category filter are
    /// dropped before classification, so they are neither announced nor
    /// boxed. Synthesis and playback failures only drop the alert.
    pub fn process_frame(
        &mut self,
        frame: &Frame,
        now: Instant,
        sink: &mut dyn FrameSink,
    ) -> Result<FrameReport> {
        let alerts_enabled = self.controls.alerts_enabled();

        let objects = self
            .detector
            .detect(frame)
            .map_err(|e| SessionError::Detection(e.to_string()))?;
        let objects = self.policy.filter_objects(objects, alerts_enabled);

        let detections: Vec<Detection> = objects
            .into_iter()
            .map(|object| Detection::classify(object, frame.width()))
            .collect();
        tracing::trace!(frame = frame.index, count = detections.len(), "frame classified");

        // Show the frame before speaking: synthesis may block on the network.
        let annotated = annotate(frame, &detections);
        sink.present(&annotated, &detections);
        self.summary.frames_processed += 1;

        let admitted = self
            .policy
            .evaluate(&detections, &mut self.cooldowns, now, alerts_enabled);
        let alerts = admitted
            .into_iter()
            .filter_map(|alert| self.dispatch(alert))
            .collect();

        Ok(FrameReport { detections, alerts })
    }

    fn dispatch(&mut self, alert: AdmittedAlert) -> Option<SpokenAlert> {
        let sentence = compose_sentence(&alert.label, alert.position);

        let artifact = match self.synthesizer.synthesize(&sentence, &self.artifact_dir) {
            Ok(artifact) => artifact,
            Err(e) => {
                tracing::warn!(label = %alert.label, error = %e, "Speech synthesis failed, alert dropped");
                alert.rollback(&mut self.cooldowns);
                self.record_dropped(&alert.label, format!("speech synthesis failed: {e}"));
                return None;
            }
        };

        // The watcher is detached; dropping its handle leaves it running.
        if let Err(e) = self.reclaimer.emit(artifact.clone()) {
            tracing::warn!(
                label = %alert.label,
                path = %artifact.display(),
                error = %e,
                "Playback failed, artifact left on disk"
            );
            self.record_dropped(&alert.label, format!("playback failed: {e}"));
            return None;
        }

        tracing::info!(label = %alert.label, position = %alert.position, "Alert spoken");
        self.summary.alerts_spoken += 1;
        emit_event(
            self.bus.as_ref(),
            event_names::ALERT_SPOKEN,
            &AlertSpokenEvent {
                session_id: self.id,
                label: alert.label.clone(),
                position: alert.position,
                sentence: sentence.clone(),
                timestamp_ms: now_ms(),
            },
        );

        Some(SpokenAlert {
            label: alert.label,
            position: alert.position,
            sentence,
        })
    }

    fn record_dropped(&mut self, label: &str, reason: String) {
        self.summary.alerts_dropped += 1;
        emit_event(
            self.bus.as_ref(),
            event_names::ALERT_DROPPED,
            &AlertDroppedEvent {
                session_id: self.id,
                label: label.to_string(),
                reason,
                timestamp_ms: now_ms(),
            },
        );
    }

    fn teardown(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        self.source.release();
        self.reclaimer.reset();
        self.cooldowns.clear();
        tracing::info!(
            session_id = %self.id,
            frames = self.summary.frames_processed,
            spoken = self.summary.alerts_spoken,
            dropped = self.summary.alerts_dropped,
            "Session torn down"
        );
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn abort_start(player: &dyn AudioPlayer, bus: &dyn EventBus, error: SessionError) -> SessionError {
    tracing::error!(error = %error, "Session failed to start");
    player.stop();
    emit_event(
        bus,
        event_names::SESSION_FAILED,
        &SessionFailedEvent {
            error: error.to_string(),
            timestamp_ms: now_ms(),
        },
    );
    error
}
