//! Serde helpers shared by the crates of the workspace.

/// (De)serializes an [`Instant`](std::time::Instant) as milliseconds since
/// the UNIX epoch, the DOMHighResTimeStamp form used by W3C stats.
pub mod instant_to_epoch {
    use ::serde::{Deserialize, Deserializer, Serializer};
    use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

    pub fn serialize<S>(instant: &Instant, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let now = Instant::now();
        let system_now = SystemTime::now();
        let system_time = if *instant <= now {
            system_now - now.duration_since(*instant)
        } else {
            system_now + instant.duration_since(now)
        };
        let epoch_ms = system_time
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs_f64()
            * 1000.0;
        serializer.serialize_f64(epoch_ms)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Instant, D::Error>
    where
        D: Deserializer<'de>,
    {
        let epoch_ms = f64::deserialize(deserializer)?;
        let system_time = UNIX_EPOCH + Duration::from_secs_f64(epoch_ms.max(0.0) / 1000.0);

        let now = Instant::now();
        let instant = match SystemTime::now().duration_since(system_time) {
            Ok(elapsed) => now.checked_sub(elapsed).unwrap_or(now),
            Err(err) => now + err.duration(),
        };
        Ok(instant)
    }
}
