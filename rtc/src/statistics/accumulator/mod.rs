//! Counters kept while the pipeline runs.
//!
//! Most numbers of a report already live where the traffic is handled: the
//! ICE agent counts per candidate pair, data channels count their messages
//! and tracks count their packets. The accumulator only keeps what has no
//! other owner, and [`RTCStatsAccumulator::snapshot`] reads everything into
//! one report.

mod peer_connection;

pub use peer_connection::PeerConnectionStatsAccumulator;
pub(crate) use peer_connection::PEER_CONNECTION_STATS_ID;

use crate::data_channel::RTCDataChannelId;
use crate::data_channel::internal::RTCDataChannelInternal;
use crate::media_stream::track_local::TrackLocal;
use crate::media_stream::track_remote::TrackRemote;
use crate::peer_connection::transport::ice::RTCIceTransport;
use crate::statistics::report::{RTCStatsReport, RTCStatsReportEntry};
use crate::statistics::stats::data_channel::RTCDataChannelStats;
use crate::statistics::stats::ice_candidate::RTCIceCandidateStats;
use crate::statistics::stats::ice_candidate_pair::RTCIceCandidatePairStats;
use crate::statistics::stats::rtp_stream::{RTCInboundRtpStreamStats, RTCOutboundRtpStreamStats};
use crate::statistics::stats::transport::RTCTransportStats;
use crate::statistics::stats::{RTCStats, RTCStatsType};
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Default)]
pub struct RTCStatsAccumulator {
    pub peer_connection: PeerConnectionStatsAccumulator,
    /// Number of times the selected candidate pair changed.
    pub selected_candidate_pair_changes: u32,
}

impl RTCStatsAccumulator {
    pub(crate) fn on_selected_candidate_pair_change(&mut self) {
        self.selected_candidate_pair_changes += 1;
    }

    /// Builds a report of everything the connection knows at `now`.
    pub(crate) fn snapshot(
        &self,
        now: Instant,
        ice_transport: &RTCIceTransport,
        data_channels: &HashMap<RTCDataChannelId, RTCDataChannelInternal>,
        local_tracks: &[TrackLocal],
        remote_tracks: &[TrackRemote],
    ) -> RTCStatsReport {
        let transport_id = RTCTransportStats::ID;
        let mut entries = vec![RTCStatsReportEntry::PeerConnection(
            self.peer_connection.snapshot(now),
        )];

        let pairs = ice_transport.agent.get_candidate_pairs_stats();
        let mut transport = RTCTransportStats::empty(RTCStats::new(
            now,
            RTCStatsType::Transport,
            transport_id,
        ));
        transport.ice_role = ice_transport.role();
        transport.ice_state = ice_transport.connection_state();
        transport.ice_local_username_fragment =
            ice_transport.get_local_parameters().username_fragment;
        transport.selected_candidate_pair_changes = self.selected_candidate_pair_changes;
        if let Some(selected) = pairs.iter().find(|pair| pair.selected) {
            transport.selected_candidate_pair_id = Some(RTCIceCandidatePairStats::id(
                &selected.local_candidate_id,
                &selected.remote_candidate_id,
            ));
            transport.packets_sent = selected.packets_sent;
            transport.packets_received = selected.packets_received;
            transport.bytes_sent = selected.bytes_sent;
            transport.bytes_received = selected.bytes_received;
        }
        entries.push(RTCStatsReportEntry::Transport(transport));

        entries.extend(pairs.iter().map(|pair| {
            RTCStatsReportEntry::IceCandidatePair(RTCIceCandidatePairStats::new(
                now,
                transport_id,
                pair,
            ))
        }));
        entries.extend(
            ice_transport
                .agent
                .get_local_candidates_stats()
                .iter()
                .map(|c| {
                    RTCStatsReportEntry::LocalCandidate(RTCIceCandidateStats::new(
                        now,
                        transport_id,
                        c,
                        true,
                    ))
                }),
        );
        entries.extend(
            ice_transport
                .agent
                .get_remote_candidates_stats()
                .iter()
                .map(|c| {
                    RTCStatsReportEntry::RemoteCandidate(RTCIceCandidateStats::new(
                        now,
                        transport_id,
                        c,
                        false,
                    ))
                }),
        );

        let mut ids: Vec<&RTCDataChannelId> = data_channels.keys().collect();
        ids.sort();
        entries.extend(ids.into_iter().filter_map(|id| {
            data_channels
                .get(id)
                .map(|dc| RTCStatsReportEntry::DataChannel(RTCDataChannelStats::new(now, dc)))
        }));

        entries.extend(local_tracks.iter().map(|track| {
            RTCStatsReportEntry::OutboundRtp(RTCOutboundRtpStreamStats::new(
                now,
                transport_id,
                track,
            ))
        }));
        entries.extend(remote_tracks.iter().map(|track| {
            RTCStatsReportEntry::InboundRtp(RTCInboundRtpStreamStats::new(
                now,
                transport_id,
                track,
            ))
        }));

        RTCStatsReport::new(entries)
    }
}
