use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Pairs a monotonic `Instant` with the wall clock read at the same moment,
/// so later instants can be reported as time since the unix epoch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemInstant {
    instant: Instant,
    duration_since_unix_epoch: Duration,
}

impl SystemInstant {
    pub fn now() -> Self {
        Self::new(Instant::now())
    }

    /// Anchors the wall clock to `instant`, which may come from a simulated clock.
    pub fn new(instant: Instant) -> Self {
        Self {
            instant,
            duration_since_unix_epoch: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_else(|_| Duration::from_secs(0)),
        }
    }

    pub fn duration_since_unix_epoch(&self) -> Duration {
        self.duration_since_unix_epoch
    }

    /// Time since the unix epoch at `now`. Instants before the anchor map to the anchor.
    pub fn unix(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.instant) + self.duration_since_unix_epoch
    }

    /// Milliseconds since the unix epoch at `now`, the unit of W3C stats timestamps.
    pub fn unix_millis(&self, now: Instant) -> f64 {
        self.unix(now).as_secs_f64() * 1000.0
    }
}
