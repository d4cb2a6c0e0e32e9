//! ICE candidate pair statistics.
//!
//! This module contains the [`RTCIceCandidatePairStats`] type which provides
//! information about ICE candidate pairs used for connectivity checks.

use super::{RTCStats, RTCStatsType};
use ::serde::{Deserialize, Serialize};
use ice::candidate::candidate_pair::CandidatePairState;
use ice::agent::agent_stats::CandidatePairStats;
use std::time::Instant;

/// Statistics for an ICE candidate pair.
///
/// This struct corresponds to the `RTCIceCandidatePairStats` dictionary in the
/// W3C WebRTC Statistics API. Round trip times are in seconds.
///
/// # W3C Reference
///
/// See [RTCIceCandidatePairStats](https://www.w3.org/TR/webrtc-stats/#candidatepair-dict*)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceCandidatePairStats {
    /// Base statistics fields (timestamp, type, id).
    #[serde(flatten)]
    pub stats: RTCStats,

    /// The ID of the transport this candidate pair belongs to.
    pub transport_id: String,
    /// The ID of the local candidate in this pair.
    pub local_candidate_id: String,
    /// The ID of the remote candidate in this pair.
    pub remote_candidate_id: String,

    pub state: CandidatePairState,
    pub nominated: bool,
    /// Whether the pair carries the application data.
    pub selected: bool,
    pub priority: u64,

    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,

    pub total_round_trip_time: f64,
    pub current_round_trip_time: Option<f64>,

    pub requests_sent: u64,
    pub requests_received: u64,
    pub responses_sent: u64,
    pub responses_received: u64,
    pub consent_requests_sent: u64,
}

impl RTCIceCandidatePairStats {
    pub(crate) fn id(local_candidate_id: &str, remote_candidate_id: &str) -> String {
        format!("RTCIceCandidatePair_{local_candidate_id}_{remote_candidate_id}")
    }

    pub(crate) fn new(now: Instant, transport_id: &str, pair: &CandidatePairStats) -> Self {
        Self {
            stats: RTCStats::new(
                now,
                RTCStatsType::CandidatePair,
                Self::id(&pair.local_candidate_id, &pair.remote_candidate_id),
            ),
            transport_id: transport_id.to_owned(),
            local_candidate_id: format!("RTCIceCandidate_{}", pair.local_candidate_id),
            remote_candidate_id: format!("RTCIceCandidate_{}", pair.remote_candidate_id),
            state: pair.state,
            nominated: pair.nominated,
            selected: pair.selected,
            priority: pair.priority,
            packets_sent: pair.packets_sent,
            packets_received: pair.packets_received,
            bytes_sent: pair.bytes_sent,
            bytes_received: pair.bytes_received,
            total_round_trip_time: pair.total_round_trip_time.as_secs_f64(),
            current_round_trip_time: pair.current_round_trip_time.map(|rtt| rtt.as_secs_f64()),
            requests_sent: pair.requests_sent,
            requests_received: pair.requests_received,
            responses_sent: pair.responses_sent,
            responses_received: pair.responses_received,
            consent_requests_sent: pair.consent_requests_sent,
        }
    }
}
