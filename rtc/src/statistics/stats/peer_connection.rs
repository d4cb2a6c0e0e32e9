use super::RTCStats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCPeerConnectionStats {
    /// General Stats Fields
    #[serde(flatten)]
    pub stats: RTCStats,

    /// Total number of data channels that reached the open state.
    pub data_channels_opened: u32,
    /// Total number of open data channels that closed.
    pub data_channels_closed: u32,
    /// Channels created with `create_data_channel`.
    pub data_channels_requested: u32,
    /// Channels announced by the peer.
    pub data_channels_accepted: u32,
}
