//! WebRTC Statistics Report types.
//!
//! This module provides the `RTCStatsReport` type which is the return value
//! of `get_stats()` and contains a collection of statistics objects.

use crate::statistics::stats::RTCStatsType;
use crate::statistics::stats::data_channel::RTCDataChannelStats;
use crate::statistics::stats::ice_candidate::RTCIceCandidateStats;
use crate::statistics::stats::ice_candidate_pair::RTCIceCandidatePairStats;
use crate::statistics::stats::peer_connection::RTCPeerConnectionStats;
use crate::statistics::stats::rtp_stream::{RTCInboundRtpStreamStats, RTCOutboundRtpStreamStats};
use crate::statistics::stats::transport::RTCTransportStats;
use serde::Serialize;
use shared::error::{Error, Result};
use std::collections::HashMap;

/// An entry in the stats report representing a single statistics object.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RTCStatsReportEntry {
    PeerConnection(RTCPeerConnectionStats),
    Transport(RTCTransportStats),
    IceCandidatePair(RTCIceCandidatePairStats),
    LocalCandidate(RTCIceCandidateStats),
    RemoteCandidate(RTCIceCandidateStats),
    DataChannel(RTCDataChannelStats),
    InboundRtp(RTCInboundRtpStreamStats),
    OutboundRtp(RTCOutboundRtpStreamStats),
}

impl RTCStatsReportEntry {
    /// Returns the stats type for this entry.
    pub fn stats_type(&self) -> RTCStatsType {
        match self {
            RTCStatsReportEntry::PeerConnection(_) => RTCStatsType::PeerConnection,
            RTCStatsReportEntry::Transport(_) => RTCStatsType::Transport,
            RTCStatsReportEntry::IceCandidatePair(_) => RTCStatsType::CandidatePair,
            RTCStatsReportEntry::LocalCandidate(_) => RTCStatsType::LocalCandidate,
            RTCStatsReportEntry::RemoteCandidate(_) => RTCStatsType::RemoteCandidate,
            RTCStatsReportEntry::DataChannel(_) => RTCStatsType::DataChannel,
            RTCStatsReportEntry::InboundRtp(_) => RTCStatsType::InboundRTP,
            RTCStatsReportEntry::OutboundRtp(_) => RTCStatsType::OutboundRTP,
        }
    }

    /// Returns the unique ID for this stats entry.
    pub fn id(&self) -> &str {
        match self {
            RTCStatsReportEntry::PeerConnection(s) => &s.stats.id,
            RTCStatsReportEntry::Transport(s) => &s.stats.id,
            RTCStatsReportEntry::IceCandidatePair(s) => &s.stats.id,
            RTCStatsReportEntry::LocalCandidate(s) | RTCStatsReportEntry::RemoteCandidate(s) => {
                &s.stats.id
            }
            RTCStatsReportEntry::DataChannel(s) => &s.stats.id,
            RTCStatsReportEntry::InboundRtp(s) => &s.stats.id,
            RTCStatsReportEntry::OutboundRtp(s) => &s.stats.id,
        }
    }
}

/// A collection of statistics objects returned by `get_stats()`, keyed by
/// their unique IDs and iterated in insertion order.
///
/// # Example
///
/// ```ignore
/// let report = peer_connection.get_stats(Instant::now());
///
/// for entry in report.iter() {
///     println!("{:?}: {:?}", entry.stats_type(), entry.id());
/// }
///
/// if let Some(pc) = report.peer_connection() {
///     println!("{} channels opened", pc.data_channels_opened);
/// }
/// ```
#[derive(Debug, Default, Clone)]
pub struct RTCStatsReport {
    entries: HashMap<String, RTCStatsReportEntry>,
    order: Vec<String>,
}

impl RTCStatsReport {
    pub(crate) fn new(entries: Vec<RTCStatsReportEntry>) -> Self {
        let mut map = HashMap::new();
        let mut order = Vec::with_capacity(entries.len());

        for entry in entries {
            let id = entry.id().to_string();
            if map.insert(id.clone(), entry).is_none() {
                order.push(id);
            }
        }

        Self {
            entries: map,
            order,
        }
    }

    /// Returns the number of stats entries in the report.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gets a stats entry by its unique ID.
    pub fn get(&self, id: &str) -> Option<&RTCStatsReportEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries.contains_key(id)
    }

    /// Returns an iterator over all stats entries.
    pub fn iter(&self) -> impl Iterator<Item = &RTCStatsReportEntry> {
        self.order.iter().filter_map(|id| self.entries.get(id))
    }

    /// Returns an iterator over stats entries of a specific type.
    pub fn iter_by_type(&self, typ: RTCStatsType) -> impl Iterator<Item = &RTCStatsReportEntry> {
        self.iter().filter(move |e| e.stats_type() == typ)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Serializes the report as a JSON object keyed by entry ID, the shape
    /// browsers give `JSON.stringify(await pc.getStats())`.
    pub fn to_json(&self) -> Result<String> {
        let mut map = serde_json::Map::new();
        for entry in self.iter() {
            let value = serde_json::to_value(entry).map_err(|e| Error::Other(e.to_string()))?;
            map.insert(entry.id().to_owned(), value);
        }
        serde_json::to_string(&map).map_err(|e| Error::Other(e.to_string()))
    }

    pub fn peer_connection(&self) -> Option<&RTCPeerConnectionStats> {
        self.get(crate::statistics::accumulator::PEER_CONNECTION_STATS_ID)
            .and_then(|e| match e {
                RTCStatsReportEntry::PeerConnection(s) => Some(s),
                _ => None,
            })
    }

    pub fn transport(&self) -> Option<&RTCTransportStats> {
        self.get(RTCTransportStats::ID).and_then(|e| match e {
            RTCStatsReportEntry::Transport(s) => Some(s),
            _ => None,
        })
    }

    pub fn inbound_rtp_streams(&self) -> impl Iterator<Item = &RTCInboundRtpStreamStats> {
        self.iter().filter_map(|e| match e {
            RTCStatsReportEntry::InboundRtp(s) => Some(s),
            _ => None,
        })
    }

    pub fn outbound_rtp_streams(&self) -> impl Iterator<Item = &RTCOutboundRtpStreamStats> {
        self.iter().filter_map(|e| match e {
            RTCStatsReportEntry::OutboundRtp(s) => Some(s),
            _ => None,
        })
    }

    pub fn data_channels(&self) -> impl Iterator<Item = &RTCDataChannelStats> {
        self.iter().filter_map(|e| match e {
            RTCStatsReportEntry::DataChannel(s) => Some(s),
            _ => None,
        })
    }

    pub fn candidate_pairs(&self) -> impl Iterator<Item = &RTCIceCandidatePairStats> {
        self.iter().filter_map(|e| match e {
            RTCStatsReportEntry::IceCandidatePair(s) => Some(s),
            _ => None,
        })
    }

    /// The candidate pair currently carrying application data.
    pub fn selected_candidate_pair(&self) -> Option<&RTCIceCandidatePairStats> {
        self.candidate_pairs().find(|pair| pair.selected)
    }
}
