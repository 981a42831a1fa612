//! Alert dispatch policy.
//!
//! Decides, per frame, which detections earn a spoken warning. A label that
//! was announced less than the cooldown ago stays quiet, and a label is
//! announced at most once per frame however many instances are in view.

mod cooldown;
mod phrases;
mod policy;

pub use cooldown::{CooldownTable, DEFAULT_COOLDOWN};
pub use phrases::{compose_sentence, compose_sentence_with, PHRASE_TEMPLATES};
pub use policy::{AdmittedAlert, AlertPolicy, DEFAULT_ALERT_CATEGORIES};
