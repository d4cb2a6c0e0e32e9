//! Peer connection statistics accumulator.

use crate::statistics::stats::peer_connection::RTCPeerConnectionStats;
use crate::statistics::stats::{RTCStats, RTCStatsType};
use std::time::Instant;

pub(crate) const PEER_CONNECTION_STATS_ID: &str = "RTCPeerConnection";

/// Data channel lifecycle counts of a peer connection.
#[derive(Debug, Default)]
pub struct PeerConnectionStatsAccumulator {
    pub data_channels_opened: u32,
    pub data_channels_closed: u32,
    pub data_channels_requested: u32,
    pub data_channels_accepted: u32,
}

impl PeerConnectionStatsAccumulator {
    pub fn on_data_channel_requested(&mut self) {
        self.data_channels_requested += 1;
    }

    pub fn on_data_channel_accepted(&mut self) {
        self.data_channels_accepted += 1;
    }

    pub fn on_data_channel_opened(&mut self) {
        self.data_channels_opened += 1;
    }

    /// Only channels that were open count as closed.
    pub fn on_data_channel_closed(&mut self) {
        self.data_channels_closed += 1;
    }

    pub fn snapshot(&self, now: Instant) -> RTCPeerConnectionStats {
        RTCPeerConnectionStats {
            stats: RTCStats::new(now, RTCStatsType::PeerConnection, PEER_CONNECTION_STATS_ID),
            data_channels_opened: self.data_channels_opened,
            data_channels_closed: self.data_channels_closed,
            data_channels_requested: self.data_channels_requested,
            data_channels_accepted: self.data_channels_accepted,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_close_sequence() {
        let mut acc = PeerConnectionStatsAccumulator::default();
        acc.on_data_channel_requested();
        acc.on_data_channel_requested();
        acc.on_data_channel_accepted();

        acc.on_data_channel_opened();
        acc.on_data_channel_opened();
        acc.on_data_channel_opened();
        acc.on_data_channel_closed();

        assert_eq!(acc.data_channels_requested, 2);
        assert_eq!(acc.data_channels_accepted, 1);
        assert_eq!(acc.data_channels_opened, 3);
        assert_eq!(acc.data_channels_closed, 1);
    }

    #[test]
    fn test_snapshot() {
        let mut acc = PeerConnectionStatsAccumulator::default();
        acc.on_data_channel_opened();
        acc.on_data_channel_opened();
        acc.on_data_channel_closed();

        let now = Instant::now();
        let stats = acc.snapshot(now);

        assert_eq!(stats.stats.id, "RTCPeerConnection");
        assert_eq!(stats.stats.typ, RTCStatsType::PeerConnection);
        assert_eq!(stats.stats.timestamp, now);
        assert_eq!(stats.data_channels_opened, 2);
        assert_eq!(stats.data_channels_closed, 1);
    }

    #[test]
    fn test_snapshot_json_serialization() {
        let mut acc = PeerConnectionStatsAccumulator::default();
        acc.on_data_channel_opened();
        acc.on_data_channel_closed();

        let json = serde_json::to_string(&acc.snapshot(Instant::now())).unwrap();
        assert!(json.contains("\"dataChannelsOpened\":1"));
        assert!(json.contains("\"dataChannelsClosed\":1"));
        assert!(json.contains("\"type\":\"peer-connection\""));
        assert!(json.contains("\"id\":\"RTCPeerConnection\""));
    }
}
