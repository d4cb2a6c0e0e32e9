use super::{RTCStats, RTCStatsType};
use ice::candidate::CandidateType;
use ice::agent::agent_stats::CandidateStats;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceCandidateStats {
    /// General Stats Fields
    #[serde(flatten)]
    pub stats: RTCStats,

    /// The transport ID this candidate belongs to.
    pub transport_id: String,
    /// The IP address of the candidate.
    pub address: String,
    /// The port number of the candidate.
    pub port: u16,
    /// `udp` or `tcp`.
    pub protocol: String,
    /// The type of candidate (host, srflx, prflx, relay).
    pub candidate_type: CandidateType,
    /// The priority of the candidate.
    pub priority: u32,
    /// The URL of the STUN/TURN server used to gather this candidate.
    pub url: Option<String>,
    /// The foundation string for the candidate.
    pub foundation: String,
}

impl RTCIceCandidateStats {
    pub(crate) fn new(
        now: Instant,
        transport_id: &str,
        candidate: &CandidateStats,
        is_local: bool,
    ) -> Self {
        let typ = if is_local {
            RTCStatsType::LocalCandidate
        } else {
            RTCStatsType::RemoteCandidate
        };
        let protocol = if candidate.network_type.is_tcp() {
            "tcp"
        } else {
            "udp"
        };

        Self {
            stats: RTCStats::new(now, typ, format!("RTCIceCandidate_{}", candidate.id)),
            transport_id: transport_id.to_owned(),
            address: candidate.ip.clone(),
            port: candidate.port,
            protocol: protocol.to_owned(),
            candidate_type: candidate.candidate_type,
            priority: candidate.priority,
            url: candidate.url.clone(),
            foundation: candidate.foundation.clone(),
        }
    }
}
