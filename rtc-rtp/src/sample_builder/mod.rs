#[cfg(test)]
mod sample_builder_test;

use bytes::{Bytes, BytesMut};
use log::trace;

use crate::packet::Packet;

/// A media sample reassembled from one or more RTP packets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sample {
    pub data: Bytes,
    pub timestamp: u32,
    /// Packets lost since the previous sample was returned.
    pub prev_dropped_packets: u16,
}

/// SampleBuilder reassembles samples split by a Packetizer. Packets must arrive
/// in sequence order; a sequence gap drops the partial sample it interrupts, and
/// late or duplicated packets are discarded.
#[derive(Debug, Default)]
pub struct SampleBuilder {
    pending: Vec<Packet>,
    expected_sequence_number: Option<u16>,
    last_timestamp: Option<u32>,
    discarding_timestamp: Option<u32>,
    dropped_since_sample: u16,

    packets_received: u64,
    packets_lost: u64,
    bytes_received: u64,
}

impl SampleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a packet and returns the sample it completes, if any.
    pub fn push(&mut self, packet: Packet) -> Option<Sample> {
        let sequence_number = packet.header.sequence_number;
        if let Some(expected) = self.expected_sequence_number {
            let diff = sequence_number.wrapping_sub(expected) as i16;
            if diff < 0 {
                trace!("discard late packet {sequence_number}, expected {expected}");
                return None;
            }
            if diff > 0 {
                trace!("{diff} packets lost before {sequence_number}");
                self.packets_lost += diff as u64;
                self.dropped_since_sample = self.dropped_since_sample.saturating_add(diff as u16);
                self.pending.clear();
                if self.last_timestamp == Some(packet.header.timestamp) {
                    self.discarding_timestamp = Some(packet.header.timestamp);
                }
            }
        }
        self.expected_sequence_number = Some(sequence_number.wrapping_add(1));
        self.last_timestamp = Some(packet.header.timestamp);
        self.packets_received += 1;
        self.bytes_received += packet.payload.len() as u64;

        if let Some(timestamp) = self.discarding_timestamp {
            if timestamp == packet.header.timestamp {
                if packet.header.marker {
                    self.discarding_timestamp = None;
                }
                return None;
            }
            self.discarding_timestamp = None;
        }

        if self
            .pending
            .first()
            .is_some_and(|p| p.header.timestamp != packet.header.timestamp)
        {
            self.pending.clear();
        }

        let marker = packet.header.marker;
        self.pending.push(packet);
        if !marker {
            return None;
        }

        let mut data = BytesMut::new();
        let mut timestamp = 0;
        for p in self.pending.drain(..) {
            timestamp = p.header.timestamp;
            data.extend_from_slice(&p.payload);
        }

        Some(Sample {
            data: data.freeze(),
            timestamp,
            prev_dropped_packets: std::mem::take(&mut self.dropped_since_sample),
        })
    }

    pub fn packets_received(&self) -> u64 {
        self.packets_received
    }

    /// Packets inferred lost from sequence number gaps.
    pub fn packets_lost(&self) -> u64 {
        self.packets_lost
    }

    pub fn bytes_received(&self) -> u64 {
        self.bytes_received
    }
}
