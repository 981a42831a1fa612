use crate::cooldown::{CooldownTable, DEFAULT_COOLDOWN};
use serde::{Deserialize, Serialize};
use sightassist_vision::{DetectedObject, Detection, Position};
use std::collections::HashSet;
use std::time::{Duration, Instant};

/// Hazardous objects and living things announced by default.
pub const DEFAULT_ALERT_CATEGORIES: &[&str] = &["person", "cat", "dog", "knife", "fire", "gun"];

/// An alert the policy let through for this frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmittedAlert {
    pub label: String,
    pub position: Position,
    /// Cooldown entry for `label` before this alert was recorded.
    #[serde(skip)]
    pub previous: Option<Instant>,
}

impl AdmittedAlert {
    /// Undo the cooldown entry this alert recorded, so the label may alert
    /// again on the next frame.
    pub fn rollback(&self, table: &mut CooldownTable) {
        table.restore(&self.label, self.previous);
    }
}

#[derive(Debug, Clone)]
pub struct AlertPolicy {
    cooldown: Duration,
    categories: HashSet<String>,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN, DEFAULT_ALERT_CATEGORIES.iter().copied())
    }
}

impl AlertPolicy {
    /// An empty `categories` set admits every label.
    pub fn new<I, S>(cooldown: Duration, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cooldown,
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    pub fn categories(&self) -> &HashSet<String> {
        &self.categories
    }

    pub fn accepts(&self, label: &str) -> bool {
        self.categories.is_empty() || self.categories.contains(label)
    }

    /// Drop objects outside the category filter while alert mode is on.
    ///
    /// Runs before position classification, so filtered objects are neither
    /// announced nor boxed. With alert mode off every object passes.
    pub fn filter_objects(
        &self,
        objects: Vec<DetectedObject>,
        alert_mode_enabled: bool,
    ) -> Vec<DetectedObject> {
        if !alert_mode_enabled {
            return objects;
        }
        objects
            .into_iter()
            .filter(|o| self.accepts(&o.label))
            .collect()
    }

    /// Gate one frame's detections through the cooldown table.
    ///
    /// The table is updated as each alert is admitted, so a label seen twice
    /// in the same frame is admitted at most once.
    pub fn evaluate(
        &self,
        detections: &[Detection],
        table: &mut CooldownTable,
        now: Instant,
        alert_mode_enabled: bool,
    ) -> Vec<AdmittedAlert> {
        if !alert_mode_enabled {
            return Vec::new();
        }

        let mut admitted = Vec::new();
        for detection in detections {
            if !self.accepts(&detection.label) {
                continue;
            }
            if !table.is_eligible(&detection.label, now, self.cooldown) {
                tracing::trace!(label = %detection.label, "alert suppressed by cooldown");
                continue;
            }

            let previous = table.record(&detection.label, now);
            admitted.push(AdmittedAlert {
                label: detection.label.clone(),
                position: detection.position,
                previous,
            });
        }
        admitted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sightassist_vision::BoundingBox;

    fn detection(label: &str, position: Position) -> Detection {
        Detection {
            label: label.to_string(),
            bbox: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            position,
        }
    }

    fn object(label: &str) -> DetectedObject {
        DetectedObject::new(label, BoundingBox::new(0.0, 0.0, 10.0, 10.0), 0.9)
    }

    #[test]
    fn test_default_policy_settings() {
        let policy = AlertPolicy::default();
        assert_eq!(policy.cooldown(), DEFAULT_COOLDOWN);
        assert_eq!(policy.categories().len(), DEFAULT_ALERT_CATEGORIES.len());
        assert!(policy.categories().contains("knife"));
    }

    #[test]
    fn test_first_sighting_is_admitted_and_recorded() {
        let policy = AlertPolicy::default();
        let mut table = CooldownTable::new();
        let now = Instant::now();

        let alerts = policy.evaluate(&[detection("person", Position::Left)], &mut table, now, true);

        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].label, "person");
        assert_eq!(alerts[0].position, Position::Left);
        assert_eq!(alerts[0].previous, None);
        assert_eq!(table.last_alert("person"), Some(now));
    }

    #[test]
    fn test_cooldown_suppresses_until_elapsed() {
        let policy = AlertPolicy::default();
        let mut table = CooldownTable::new();
        let t0 = Instant::now();
        let frame = [detection("dog", Position::Right)];

        assert_eq!(policy.evaluate(&frame, &mut table, t0, true).len(), 1);
        for secs in [1, 5, 9, 10] {
            let alerts = policy.evaluate(&frame, &mut table, t0 + Duration::from_secs(secs), true);
            assert!(alerts.is_empty(), "admitted again after {secs}s");
        }
        let later = t0 + Duration::from_millis(10_001);
        assert_eq!(policy.evaluate(&frame, &mut table, later, true).len(), 1);
        assert_eq!(table.last_alert("dog"), Some(later));
    }

    #[test]
    fn test_duplicate_labels_admit_once_per_frame() {
        let policy = AlertPolicy::default();
        let mut table = CooldownTable::new();
        let frame = [
            detection("person", Position::Left),
            detection("person", Position::Right),
            detection("person", Position::Right),
            detection("cat", Position::Right),
        ];

        let alerts = policy.evaluate(&frame, &mut table, Instant::now(), true);

        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].label, "person");
        assert_eq!(alerts[0].position, Position::Left);
        assert_eq!(alerts[1].label, "cat");
    }

    #[test]
    fn test_filter_excludes_other_labels() {
        let policy = AlertPolicy::new(DEFAULT_COOLDOWN, ["person"]);
        let mut table = CooldownTable::new();

        let alerts = policy.evaluate(
            &[detection("chair", Position::Left)],
            &mut table,
            Instant::now(),
            true,
        );

        assert!(alerts.is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_empty_filter_admits_everything() {
        let policy = AlertPolicy::new(DEFAULT_COOLDOWN, Vec::<String>::new());
        let mut table = CooldownTable::new();

        let alerts = policy.evaluate(
            &[detection("chair", Position::Left)],
            &mut table,
            Instant::now(),
            true,
        );
        assert_eq!(alerts.len(), 1);
    }

    #[test]
    fn test_alert_mode_off_returns_nothing() {
        let policy = AlertPolicy::default();
        let mut table = CooldownTable::new();
        let frame = [detection("person", Position::Left), detection("knife", Position::Right)];

        assert!(policy.evaluate(&frame, &mut table, Instant::now(), false).is_empty());
        assert!(table.is_empty());
    }

    #[test]
    fn test_rollback_reopens_label() {
        let policy = AlertPolicy::default();
        let mut table = CooldownTable::new();
        let now = Instant::now();
        let frame = [detection("knife", Position::Left)];

        let alerts = policy.evaluate(&frame, &mut table, now, true);
        alerts[0].rollback(&mut table);

        assert!(table.last_alert("knife").is_none());
        let retry = policy.evaluate(&frame, &mut table, now + Duration::from_millis(100), true);
        assert_eq!(retry.len(), 1);
    }

    #[test]
    fn test_filter_objects_only_when_alert_mode_on() {
        let policy = AlertPolicy::new(DEFAULT_COOLDOWN, ["person"]);
        let objects = vec![object("person"), object("chair")];

        let filtered = policy.filter_objects(objects.clone(), true);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].label, "person");

        assert_eq!(policy.filter_objects(objects, false).len(), 2);
    }
}
