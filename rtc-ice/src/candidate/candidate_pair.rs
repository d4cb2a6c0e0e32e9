use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{Duration, Instant};

/// Represent the ICE candidate pair state.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidatePairState {
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified = 0,

    /// Means the pair was formed before checks started and waits to be unfrozen.
    #[serde(rename = "frozen")]
    Frozen = 1,

    /// Means a check has not been performed for this pair.
    #[serde(rename = "waiting")]
    Waiting = 2,

    /// Means a check has been sent for this pair, but the transaction is in progress.
    #[serde(rename = "in-progress")]
    InProgress = 3,

    /// Means a check for this pair was already done and failed, either never producing any response
    /// or producing an unrecoverable failure response.
    #[serde(rename = "failed")]
    Failed = 4,

    /// Means a check for this pair was already done and produced a successful result.
    #[serde(rename = "succeeded")]
    Succeeded = 5,
}

impl From<u8> for CandidatePairState {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Frozen,
            2 => Self::Waiting,
            3 => Self::InProgress,
            4 => Self::Failed,
            5 => Self::Succeeded,
            _ => Self::Unspecified,
        }
    }
}

impl fmt::Display for CandidatePairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            Self::Frozen => "frozen",
            Self::Waiting => "waiting",
            Self::InProgress => "in-progress",
            Self::Failed => "failed",
            Self::Succeeded => "succeeded",
            Self::Unspecified => "unspecified",
        };

        write!(f, "{s}")
    }
}

/// Traffic and check counters of one candidate pair.
#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub struct CandidatePairCounters {
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub requests_sent: u64,
    pub requests_received: u64,
    pub responses_sent: u64,
    pub responses_received: u64,
    pub consent_requests_sent: u64,
    pub total_round_trip_time: Duration,
    pub current_round_trip_time: Option<Duration>,
    pub last_packet_sent_timestamp: Option<Instant>,
    pub last_packet_received_timestamp: Option<Instant>,
}

/// Represents a combination of a local and remote candidate.
#[derive(Clone, Copy)]
pub struct CandidatePair {
    pub local_index: usize,
    pub remote_index: usize,
    pub local_priority: u32,
    pub remote_priority: u32,
    pub(crate) ice_role_controlling: bool,
    pub(crate) binding_request_count: u16,
    pub(crate) state: CandidatePairState,
    pub(crate) nominated: bool,
    pub(crate) nominate_on_success: bool,
    pub(crate) counters: CandidatePairCounters,
}

impl fmt::Debug for CandidatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prio {} (local, prio {}) {} <-> {} (remote, prio {}), state: {}, nominated: {}",
            self.priority(),
            self.local_priority,
            self.local_index,
            self.remote_index,
            self.remote_priority,
            self.state,
            self.nominated,
        )
    }
}

impl fmt::Display for CandidatePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "prio {} (local, prio {}) {} <-> {} (remote, prio {})",
            self.priority(),
            self.local_priority,
            self.local_index,
            self.remote_index,
            self.remote_priority,
        )
    }
}

impl PartialEq for CandidatePair {
    fn eq(&self, other: &Self) -> bool {
        self.local_index == other.local_index && self.remote_index == other.remote_index
    }
}

impl CandidatePair {
    #[must_use]
    pub fn new(
        local_index: usize,
        remote_index: usize,
        local_priority: u32,
        remote_priority: u32,
        ice_role_controlling: bool,
    ) -> Self {
        Self {
            local_index,
            remote_index,
            local_priority,
            remote_priority,
            ice_role_controlling,
            state: CandidatePairState::Waiting,
            binding_request_count: 0,
            nominated: false,
            nominate_on_success: false,
            counters: CandidatePairCounters::default(),
        }
    }

    /// RFC 8445 - 6.1.2.3.  Computing Pair Priority and Ordering Pairs
    /// Let G be the priority for the candidate provided by the controlling
    /// agent.  Let D be the priority for the candidate provided by the
    /// controlled agent.
    /// pair priority = 2^32*MIN(G,D) + 2*MAX(G,D) + (G>D?1:0)
    pub fn priority(&self) -> u64 {
        let (g, d) = if self.ice_role_controlling {
            (self.local_priority, self.remote_priority)
        } else {
            (self.remote_priority, self.local_priority)
        };

        // both priorities at u32::MAX would overflow u64, saturate instead
        (u64::from(std::cmp::min(g, d)) << 32)
            .saturating_add(2 * u64::from(std::cmp::max(g, d)))
            .saturating_add(u64::from(g > d))
    }

    /// Returns the pair state.
    pub fn state(&self) -> CandidatePairState {
        self.state
    }

    /// Reports whether this pair has been nominated.
    pub fn is_nominated(&self) -> bool {
        self.nominated
    }

    /// Returns how many binding requests were sent for the current check.
    pub fn binding_request_count(&self) -> u16 {
        self.binding_request_count
    }

    /// Returns the traffic counters of this pair.
    pub fn counters(&self) -> &CandidatePairCounters {
        &self.counters
    }

    pub(crate) fn update_round_trip_time(&mut self, rtt: Duration) {
        self.counters.current_round_trip_time = Some(rtt);
        self.counters.total_round_trip_time += rtt;
        self.counters.responses_received += 1;
    }

    pub(crate) fn on_packet_sent(&mut self, n: usize, now: Instant) {
        self.counters.packets_sent += 1;
        self.counters.bytes_sent += n as u64;
        self.counters.last_packet_sent_timestamp = Some(now);
    }

    pub(crate) fn on_packet_received(&mut self, n: usize, now: Instant) {
        self.counters.packets_received += 1;
        self.counters.bytes_received += n as u64;
        self.counters.last_packet_received_timestamp = Some(now);
    }
}
