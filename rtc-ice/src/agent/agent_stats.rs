use super::*;
use crate::network_type::NetworkType;

/// Snapshot of the counters of one candidate pair.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidatePairStats {
    /// The id of the local candidate.
    pub local_candidate_id: String,
    /// The id of the remote candidate.
    pub remote_candidate_id: String,
    pub state: CandidatePairState,
    pub nominated: bool,
    /// Whether this pair carries the application data.
    pub selected: bool,
    pub priority: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,
    pub last_packet_sent_timestamp: Option<Instant>,
    pub last_packet_received_timestamp: Option<Instant>,
    /// Sum of all round trip times measured with STUN checks and consent requests.
    pub total_round_trip_time: Duration,
    /// The latest round trip time measured.
    pub current_round_trip_time: Option<Duration>,
    pub requests_sent: u64,
    pub requests_received: u64,
    pub responses_sent: u64,
    pub responses_received: u64,
    pub consent_requests_sent: u64,
}

/// Snapshot of a local or remote candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateStats {
    pub id: String,
    pub network_type: NetworkType,
    pub ip: String,
    pub port: u16,
    pub candidate_type: CandidateType,
    pub priority: u32,
    /// The STUN or TURN server the candidate was obtained from.
    pub url: Option<String>,
    pub foundation: String,
    pub last_sent: Option<Instant>,
    pub last_received: Option<Instant>,
}

impl From<&Candidate> for CandidateStats {
    fn from(c: &Candidate) -> Self {
        Self {
            id: c.id().to_owned(),
            network_type: c.network_type(),
            ip: c.address().to_owned(),
            port: c.port(),
            candidate_type: c.candidate_type(),
            priority: c.priority(),
            url: c.url().map(str::to_owned),
            foundation: c.foundation(),
            last_sent: c.last_sent(),
            last_received: c.last_received(),
        }
    }
}

impl Agent {
    /// Returns a list of candidate pair stats. Counters start over on restart.
    pub fn get_candidate_pairs_stats(&self) -> Vec<CandidatePairStats> {
        self.candidate_pairs
            .iter()
            .enumerate()
            .map(|(index, p)| CandidatePairStats {
                local_candidate_id: self.local_candidates[p.local_index].id().to_owned(),
                remote_candidate_id: self.remote_candidates[p.remote_index].id().to_owned(),
                state: p.state,
                nominated: p.nominated,
                selected: self.selected_pair == Some(index),
                priority: p.priority(),
                packets_sent: p.counters.packets_sent,
                packets_received: p.counters.packets_received,
                bytes_sent: p.counters.bytes_sent,
                bytes_received: p.counters.bytes_received,
                last_packet_sent_timestamp: p.counters.last_packet_sent_timestamp,
                last_packet_received_timestamp: p.counters.last_packet_received_timestamp,
                total_round_trip_time: p.counters.total_round_trip_time,
                current_round_trip_time: p.counters.current_round_trip_time,
                requests_sent: p.counters.requests_sent,
                requests_received: p.counters.requests_received,
                responses_sent: p.counters.responses_sent,
                responses_received: p.counters.responses_received,
                consent_requests_sent: p.counters.consent_requests_sent,
            })
            .collect()
    }

    /// Returns a list of local candidates stats.
    pub fn get_local_candidates_stats(&self) -> Vec<CandidateStats> {
        self.local_candidates.iter().map(CandidateStats::from).collect()
    }

    /// Returns a list of remote candidates stats.
    pub fn get_remote_candidates_stats(&self) -> Vec<CandidateStats> {
        self.remote_candidates
            .iter()
            .map(CandidateStats::from)
            .collect()
    }
}
