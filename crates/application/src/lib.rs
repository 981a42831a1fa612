mod config;
mod constants;
mod controls;
mod error;
mod session;

pub use config::{CameraConfig, ConfigError, SessionConfig};
pub use constants::*;
pub use controls::{AlertToggle, SessionControls};
pub use error::{Result, SessionError};
pub use session::{
    FrameReport, FrameSink, NullFrameSink, Session, SessionServices, SessionSummary, SpokenAlert,
};
