use super::{RTCStats, RTCStatsType};
use crate::data_channel::RTCDataChannelState;
use crate::data_channel::internal::RTCDataChannelInternal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCDataChannelStats {
    /// General Stats Fields
    #[serde(flatten)]
    pub stats: RTCStats,

    /// The stream the channel runs on, None before the association is up.
    pub data_channel_identifier: Option<u16>,
    /// The label assigned to the data channel.
    pub label: String,
    /// The sub-protocol name.
    pub protocol: String,
    /// The current state of the data channel.
    pub state: RTCDataChannelState,

    /// Total messages sent through the data channel.
    pub messages_sent: u32,
    /// Total bytes sent through the data channel.
    pub bytes_sent: u64,
    /// Total messages received through the data channel.
    pub messages_received: u32,
    /// Total bytes received through the data channel.
    pub bytes_received: u64,
}

impl RTCDataChannelStats {
    pub(crate) fn new(now: Instant, dc: &RTCDataChannelInternal) -> Self {
        let counters = dc.data_channel.as_ref().map_or((0, 0, 0, 0), |d| {
            (
                d.messages_sent(),
                d.bytes_sent(),
                d.messages_received(),
                d.bytes_received(),
            )
        });

        Self {
            stats: RTCStats::new(
                now,
                RTCStatsType::DataChannel,
                format!("RTCDataChannel_{}", dc.id),
            ),
            data_channel_identifier: dc.stream_id,
            label: dc.label.clone(),
            protocol: dc.protocol.clone(),
            state: dc.ready_state,
            messages_sent: counters.0 as u32,
            bytes_sent: counters.1 as u64,
            messages_received: counters.2 as u32,
            bytes_received: counters.3 as u64,
        }
    }
}
