//! Per-track RTP stream statistics.

use super::{RTCStats, RTCStatsType};
use crate::media_stream::track::RtpCodecKind;
use crate::media_stream::track_local::TrackLocal;
use crate::media_stream::track_remote::TrackRemote;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Statistics of the packets sent for a local track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCOutboundRtpStreamStats {
    #[serde(flatten)]
    pub stats: RTCStats,

    pub ssrc: u32,
    pub kind: RtpCodecKind,
    pub transport_id: String,
    pub track_identifier: String,
    pub mid: Option<String>,

    pub packets_sent: u64,
    /// Payload bytes, headers excluded.
    pub bytes_sent: u64,
}

impl RTCOutboundRtpStreamStats {
    pub(crate) fn new(now: Instant, transport_id: &str, track: &TrackLocal) -> Self {
        let ssrc = track.track.ssrc();
        Self {
            stats: RTCStats::new(
                now,
                RTCStatsType::OutboundRTP,
                format!("RTCOutboundRTPStream_{}_{ssrc}", track.track.kind()),
            ),
            ssrc,
            kind: track.track.kind(),
            transport_id: transport_id.to_owned(),
            track_identifier: track.track.track_id().clone(),
            mid: track.mid.clone(),
            packets_sent: track.packets_sent,
            bytes_sent: track.bytes_sent,
        }
    }
}

/// Statistics of the packets received for a remote track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCInboundRtpStreamStats {
    #[serde(flatten)]
    pub stats: RTCStats,

    pub ssrc: u32,
    pub kind: RtpCodecKind,
    pub transport_id: String,
    pub track_identifier: String,
    pub mid: String,

    pub packets_received: u64,
    /// Gaps in the sequence numbers seen so far.
    pub packets_lost: u64,
    /// Payload bytes, headers excluded.
    pub bytes_received: u64,
}

impl RTCInboundRtpStreamStats {
    pub(crate) fn new(now: Instant, transport_id: &str, track: &TrackRemote) -> Self {
        let ssrc = track.track.ssrc();
        Self {
            stats: RTCStats::new(
                now,
                RTCStatsType::InboundRTP,
                format!("RTCInboundRTPStream_{}_{ssrc}", track.track.kind()),
            ),
            ssrc,
            kind: track.track.kind(),
            transport_id: transport_id.to_owned(),
            track_identifier: track.track.track_id().clone(),
            mid: track.mid.clone(),
            packets_received: track.packets_received(),
            packets_lost: track.packets_lost(),
            bytes_received: track.bytes_received(),
        }
    }
}
