use std::time::Duration;

use crate::config::TimerConfig;

/// Retransmission timeout estimator, RFC 4960 section 6.3.1.
#[derive(Debug, Clone)]
pub(crate) struct RtoManager {
    srtt: Option<Duration>,
    rttvar: Duration,
    rto: Duration,
    rto_min: Duration,
    rto_max: Duration,
}

impl RtoManager {
    pub(crate) fn new(config: &TimerConfig) -> Self {
        RtoManager {
            srtt: None,
            rttvar: Duration::ZERO,
            rto: config.rto_initial,
            rto_min: config.rto_min,
            rto_max: config.rto_max,
        }
    }

    /// Feeds one round-trip measurement and returns the new RTO.
    pub(crate) fn set_new_rtt(&mut self, rtt: Duration) -> Duration {
        match self.srtt {
            None => {
                self.srtt = Some(rtt);
                self.rttvar = rtt / 2;
            }
            Some(srtt) => {
                let delta = srtt.abs_diff(rtt);
                self.rttvar = self.rttvar * 3 / 4 + delta / 4;
                self.srtt = Some(srtt * 7 / 8 + rtt / 8);
            }
        }

        let srtt = self.srtt.unwrap_or(rtt);
        self.rto = (srtt + self.rttvar * 4).clamp(self.rto_min, self.rto_max);
        self.rto
    }

    /// Exponential backoff after a timer expiry, RFC 4960 section 6.3.3 E2.
    pub(crate) fn back_off(&mut self) -> Duration {
        self.rto = (self.rto * 2).min(self.rto_max);
        self.rto
    }

    pub(crate) fn rto(&self) -> Duration {
        self.rto
    }

    pub(crate) fn srtt(&self) -> Option<Duration> {
        self.srtt
    }
}
