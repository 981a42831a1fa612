use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Minimum gap between two alerts for the same label.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(10);

/// Last-alert timestamp per label. Lives for one detection session.
#[derive(Debug, Default, Clone)]
pub struct CooldownTable {
    last_alert: HashMap<String, Instant>,
}

impl CooldownTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_alert(&self, label: &str) -> Option<Instant> {
        self.last_alert.get(label).copied()
    }

    /// True if `label` has never alerted, or last alerted strictly more than
    /// `cooldown` before `now`.
    pub fn is_eligible(&self, label: &str, now: Instant, cooldown: Duration) -> bool {
        match self.last_alert.get(label) {
            None => true,
            Some(last) => now.saturating_duration_since(*last) > cooldown,
        }
    }

    /// Record an alert for `label` at `now`, returning the entry it replaced.
    pub fn record(&mut self, label: &str, now: Instant) -> Option<Instant> {
        self.last_alert.insert(label.to_string(), now)
    }

    /// Put back the entry that `record` replaced.
    pub fn restore(&mut self, label: &str, previous: Option<Instant>) {
        match previous {
            Some(at) => {
                self.last_alert.insert(label.to_string(), at);
            }
            None => {
                self.last_alert.remove(label);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.last_alert.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_alert.is_empty()
    }

    pub fn clear(&mut self) {
        self.last_alert.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_label_is_eligible() {
        let table = CooldownTable::new();
        assert!(table.is_eligible("person", Instant::now(), DEFAULT_COOLDOWN));
    }

    #[test]
    fn test_boundary_is_exclusive() {
        let t0 = Instant::now();
        let mut table = CooldownTable::new();
        table.record("dog", t0);

        assert!(!table.is_eligible("dog", t0 + DEFAULT_COOLDOWN, DEFAULT_COOLDOWN));
        assert!(table.is_eligible(
            "dog",
            t0 + DEFAULT_COOLDOWN + Duration::from_millis(1),
            DEFAULT_COOLDOWN
        ));
    }

    #[test]
    fn test_restore_previous_entry() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_secs(20);
        let mut table = CooldownTable::new();

        assert_eq!(table.record("cat", t0), None);
        let previous = table.record("cat", t1);
        assert_eq!(previous, Some(t0));

        table.restore("cat", previous);
        assert_eq!(table.last_alert("cat"), Some(t0));

        table.restore("cat", None);
        assert!(table.is_empty());
    }
}
