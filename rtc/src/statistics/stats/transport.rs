use super::{RTCStats, RTCStatsType};
use crate::peer_connection::state::ice_connection_state::RTCIceConnectionState;
use crate::peer_connection::transport::RTCIceRole;
use serde::{Deserialize, Serialize};

/// The single bundled transport of a peer connection. Byte and packet
/// counters are those of the selected candidate pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCTransportStats {
    /// General Stats Fields
    #[serde(flatten)]
    pub stats: RTCStats,

    pub packets_sent: u64,
    pub packets_received: u64,
    pub bytes_sent: u64,
    pub bytes_received: u64,

    pub ice_role: RTCIceRole,
    pub ice_local_username_fragment: String,
    pub ice_state: RTCIceConnectionState,
    pub selected_candidate_pair_id: Option<String>,
    /// Number of times the selected pair changed.
    pub selected_candidate_pair_changes: u32,
}

impl RTCTransportStats {
    pub(crate) const ID: &'static str = "RTCTransport_0";

    pub(crate) fn empty(stats: RTCStats) -> Self {
        debug_assert_eq!(stats.typ, RTCStatsType::Transport);
        Self {
            stats,
            packets_sent: 0,
            packets_received: 0,
            bytes_sent: 0,
            bytes_received: 0,
            ice_role: RTCIceRole::Unspecified,
            ice_local_username_fragment: String::new(),
            ice_state: RTCIceConnectionState::New,
            selected_candidate_pair_id: None,
            selected_candidate_pair_changes: 0,
        }
    }
}
