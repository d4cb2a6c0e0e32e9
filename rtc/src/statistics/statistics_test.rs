use super::accumulator::PeerConnectionStatsAccumulator;
use super::report::{RTCStatsReport, RTCStatsReportEntry};
use super::stats::data_channel::RTCDataChannelStats;
use super::stats::ice_candidate_pair::RTCIceCandidatePairStats;
use super::stats::transport::RTCTransportStats;
use super::stats::{RTCStats, RTCStatsType};
use crate::data_channel::RTCDataChannelState;
use ice::candidate::candidate_pair::CandidatePairState;
use std::time::Instant;

fn data_channel(now: Instant, id: usize, label: &str) -> RTCStatsReportEntry {
    RTCStatsReportEntry::DataChannel(RTCDataChannelStats {
        stats: RTCStats::new(now, RTCStatsType::DataChannel, format!("RTCDataChannel_{id}")),
        data_channel_identifier: Some(id as u16),
        label: label.to_owned(),
        protocol: String::new(),
        state: RTCDataChannelState::Open,
        messages_sent: 3,
        bytes_sent: 30,
        messages_received: 1,
        bytes_received: 5,
    })
}

fn candidate_pair(now: Instant, local: &str, remote: &str, selected: bool) -> RTCStatsReportEntry {
    RTCStatsReportEntry::IceCandidatePair(RTCIceCandidatePairStats {
        stats: RTCStats::new(
            now,
            RTCStatsType::CandidatePair,
            RTCIceCandidatePairStats::id(local, remote),
        ),
        transport_id: RTCTransportStats::ID.to_owned(),
        local_candidate_id: format!("RTCIceCandidate_{local}"),
        remote_candidate_id: format!("RTCIceCandidate_{remote}"),
        state: if selected {
            CandidatePairState::Succeeded
        } else {
            CandidatePairState::Waiting
        },
        nominated: selected,
        selected,
        priority: 100,
        packets_sent: 0,
        packets_received: 0,
        bytes_sent: 0,
        bytes_received: 0,
        total_round_trip_time: 0.5,
        current_round_trip_time: selected.then_some(0.25),
        requests_sent: 2,
        requests_received: 2,
        responses_sent: 2,
        responses_received: 2,
        consent_requests_sent: 0,
    })
}

#[test]
fn test_report_keeps_insertion_order() {
    let now = Instant::now();
    let report = RTCStatsReport::new(vec![
        RTCStatsReportEntry::PeerConnection(PeerConnectionStatsAccumulator::default().snapshot(now)),
        data_channel(now, 2, "b"),
        data_channel(now, 1, "a"),
        candidate_pair(now, "l1", "r1", false),
    ]);

    assert_eq!(report.len(), 4);
    assert_eq!(
        report.ids().collect::<Vec<_>>(),
        vec![
            "RTCPeerConnection",
            "RTCDataChannel_2",
            "RTCDataChannel_1",
            "RTCIceCandidatePair_l1_r1"
        ]
    );
    assert_eq!(report.data_channels().count(), 2);
    assert_eq!(report.iter_by_type(RTCStatsType::DataChannel).count(), 2);
    assert!(report.peer_connection().is_some());
    assert!(report.transport().is_none());
}

#[test]
fn test_report_duplicate_id_replaces_entry() {
    let now = Instant::now();
    let report = RTCStatsReport::new(vec![data_channel(now, 1, "old"), data_channel(now, 1, "new")]);

    assert_eq!(report.len(), 1);
    assert_eq!(report.ids().count(), 1);
    assert_eq!(report.data_channels().next().map(|dc| dc.label.as_str()), Some("new"));
}

#[test]
fn test_report_selected_candidate_pair() {
    let now = Instant::now();
    let report = RTCStatsReport::new(vec![
        candidate_pair(now, "l1", "r1", false),
        candidate_pair(now, "l2", "r2", true),
    ]);

    let selected = report.selected_candidate_pair().map(|p| p.stats.id.as_str());
    assert_eq!(selected, Some("RTCIceCandidatePair_l2_r2"));
    assert!(report.contains("RTCIceCandidatePair_l1_r1"));
    assert_eq!(
        report.get("RTCIceCandidatePair_l1_r1").map(|e| e.stats_type()),
        Some(RTCStatsType::CandidatePair)
    );
}

#[test]
fn test_report_to_json() {
    let now = Instant::now();
    let report = RTCStatsReport::new(vec![
        data_channel(now, 1, "chat"),
        candidate_pair(now, "l1", "r1", true),
    ]);

    let json = report.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    let dc = &value["RTCDataChannel_1"];
    assert_eq!(dc["type"], "data-channel");
    assert_eq!(dc["label"], "chat");
    assert_eq!(dc["state"], "open");
    assert_eq!(dc["messagesSent"], 3);
    assert_eq!(dc["dataChannelIdentifier"], 1);
    assert!(dc["timestamp"].as_f64().is_some());

    let pair = &value["RTCIceCandidatePair_l1_r1"];
    assert_eq!(pair["type"], "candidate-pair");
    assert_eq!(pair["state"], "succeeded");
    assert_eq!(pair["currentRoundTripTime"], 0.25);
    assert_eq!(pair["localCandidateId"], "RTCIceCandidate_l1");
}

#[test]
fn test_empty_report() {
    let report = RTCStatsReport::default();
    assert!(report.is_empty());
    assert_eq!(report.to_json().unwrap(), "{}");
}
