use std::sync::{Arc, RwLock};
use std::time::Duration;
use time::OffsetDateTime;

/// One resolved GPS position reading. `valid` reflects the receiver's own
/// status field; only valid fixes may be applied to the shared cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub lat: f64,
    pub lon: f64,
    pub valid: bool,
}

/// Immutable snapshot of the most recent valid fix, stamped at apply time so
/// readers can tell a fresh position from a stale one.
#[derive(Debug, Clone, Copy)]
pub struct LocationSnapshot {
    pub lat: f64,
    pub lon: f64,
    pub at: OffsetDateTime,
}

impl LocationSnapshot {
    pub fn age(&self) -> Duration {
        let secs = (OffsetDateTime::now_utc() - self.at).whole_seconds().max(0);
        Duration::from_secs(secs as u64)
    }
}

/// Shared location state. The GPS ingestor is the sole writer, the risk
/// evaluator and the status page read it. The snapshot is replaced wholesale
/// under the lock, so a reader never observes a half-updated position.
#[derive(Clone, Default)]
pub struct LocationCell {
    inner: Arc<RwLock<Option<LocationSnapshot>>>,
}

impl LocationCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with a new valid fix. Invalid fixes are ignored,
    /// so once a fix has been applied the cell never reverts to empty.
    pub fn apply(&self, fix: &Fix) {
        if !fix.valid {
            return;
        }
        let snap = LocationSnapshot {
            lat: fix.lat,
            lon: fix.lon,
            at: OffsetDateTime::now_utc(),
        };
        *self.inner.write().unwrap() = Some(snap);
    }

    pub fn snapshot(&self) -> Option<LocationSnapshot> {
        *self.inner.read().unwrap()
    }

    pub fn has_fix(&self) -> bool {
        self.inner.read().unwrap().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_without_fix() {
        let cell = LocationCell::new();
        assert!(!cell.has_fix());
        assert!(cell.snapshot().is_none());
    }

    #[test]
    fn valid_fix_is_applied() {
        let cell = LocationCell::new();
        cell.apply(&Fix { lat: 36.10, lon: 128.40, valid: true });
        let snap = cell.snapshot().unwrap();
        assert!((snap.lat - 36.10).abs() < 1e-9);
        assert!((snap.lon - 128.40).abs() < 1e-9);
    }

    #[test]
    fn invalid_fix_leaves_cell_unchanged() {
        let cell = LocationCell::new();
        cell.apply(&Fix { lat: 1.0, lon: 2.0, valid: false });
        assert!(!cell.has_fix());

        cell.apply(&Fix { lat: 36.10, lon: 128.40, valid: true });
        cell.apply(&Fix { lat: 9.0, lon: 9.0, valid: false });
        let snap = cell.snapshot().unwrap();
        assert!((snap.lat - 36.10).abs() < 1e-9);
    }

    #[test]
    fn has_fix_is_monotonic() {
        let cell = LocationCell::new();
        cell.apply(&Fix { lat: 36.10, lon: 128.40, valid: true });
        assert!(cell.has_fix());
        cell.apply(&Fix { lat: 0.0, lon: 0.0, valid: false });
        assert!(cell.has_fix());
    }

    #[test]
    fn repeated_fix_is_idempotent_on_state() {
        let cell = LocationCell::new();
        let fix = Fix { lat: 36.10, lon: 128.40, valid: true };
        cell.apply(&fix);
        let first = cell.snapshot().unwrap();
        cell.apply(&fix);
        let second = cell.snapshot().unwrap();
        assert_eq!(first.lat, second.lat);
        assert_eq!(first.lon, second.lon);
    }

    #[test]
    fn fresh_snapshot_has_small_age() {
        let cell = LocationCell::new();
        cell.apply(&Fix { lat: 36.10, lon: 128.40, valid: true });
        assert!(cell.snapshot().unwrap().age() < Duration::from_secs(2));
    }
}
