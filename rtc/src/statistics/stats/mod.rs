//! WebRTC Statistics types.
//!
//! This module contains the W3C WebRTC Statistics API types.

use ::serde::{Deserialize, Serialize};
use shared::serde::instant_to_epoch;
use std::time::Instant;

pub mod data_channel;
pub mod ice_candidate;
pub mod ice_candidate_pair;
pub mod peer_connection;
pub mod rtp_stream;
pub mod transport;

/// The type of statistics object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RTCStatsType {
    #[serde(rename = "inbound-rtp")]
    InboundRTP,
    #[serde(rename = "outbound-rtp")]
    OutboundRTP,
    #[serde(rename = "peer-connection")]
    PeerConnection,
    #[serde(rename = "data-channel")]
    DataChannel,
    #[serde(rename = "transport")]
    Transport,
    #[serde(rename = "candidate-pair")]
    CandidatePair,
    #[serde(rename = "local-candidate")]
    LocalCandidate,
    #[serde(rename = "remote-candidate")]
    RemoteCandidate,
}

/// The unique identifier for a statistics object.
pub type RTCStatsId = String;

/// Base statistics object containing common fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RTCStats {
    #[serde(with = "instant_to_epoch")]
    pub timestamp: Instant,
    #[serde(rename = "type")]
    pub typ: RTCStatsType,
    pub id: RTCStatsId,
}

impl RTCStats {
    pub(crate) fn new(timestamp: Instant, typ: RTCStatsType, id: impl Into<RTCStatsId>) -> Self {
        Self {
            timestamp,
            typ,
            id: id.into(),
        }
    }
}
