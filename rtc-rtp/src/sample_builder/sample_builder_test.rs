use bytes::Bytes;

use super::*;
use crate::header::Header;

fn packet(sequence_number: u16, timestamp: u32, marker: bool, payload: &'static [u8]) -> Packet {
    Packet {
        header: Header {
            version: 2,
            sequence_number,
            timestamp,
            marker,
            ..Default::default()
        },
        payload: Bytes::from_static(payload),
    }
}

#[test]
fn test_reassemble_fragments() {
    let mut builder = SampleBuilder::new();
    assert_eq!(builder.push(packet(10, 100, false, b"ab")), None);
    assert_eq!(builder.push(packet(11, 100, false, b"cd")), None);
    assert_eq!(
        builder.push(packet(12, 100, true, b"e")),
        Some(Sample {
            data: Bytes::from_static(b"abcde"),
            timestamp: 100,
            prev_dropped_packets: 0,
        })
    );
    assert_eq!(builder.packets_received(), 3);
    assert_eq!(builder.bytes_received(), 5);
}

#[test]
fn test_gap_drops_interrupted_sample() {
    let mut builder = SampleBuilder::new();
    assert_eq!(builder.push(packet(65534, 100, false, b"ab")), None);
    // 65535 lost, the rest of the sample is discarded
    assert_eq!(builder.push(packet(0, 100, true, b"cd")), None);
    assert_eq!(builder.packets_lost(), 1);

    let sample = builder.push(packet(1, 200, true, b"next"));
    assert_eq!(
        sample,
        Some(Sample {
            data: Bytes::from_static(b"next"),
            timestamp: 200,
            prev_dropped_packets: 1,
        })
    );
}

#[test]
fn test_gap_between_samples_keeps_next_sample() {
    let mut builder = SampleBuilder::new();
    assert!(builder.push(packet(1, 100, true, b"a")).is_some());
    // 2 and 3 lost
    let sample = builder.push(packet(4, 300, true, b"c"));
    assert_eq!(sample.map(|s| s.prev_dropped_packets), Some(2));
    assert_eq!(builder.packets_lost(), 2);
}

#[test]
fn test_late_packets_discarded() {
    let mut builder = SampleBuilder::new();
    assert!(builder.push(packet(5, 100, true, b"a")).is_some());
    assert_eq!(builder.push(packet(5, 100, true, b"a")), None);
    assert_eq!(builder.push(packet(3, 50, true, b"old")), None);
    assert_eq!(builder.packets_received(), 1);
    assert_eq!(builder.packets_lost(), 0);
}
