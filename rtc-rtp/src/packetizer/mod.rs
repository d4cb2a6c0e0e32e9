#[cfg(test)]
mod packetizer_test;

use bytes::Bytes;

use crate::header::*;
use crate::packet::*;
use crate::sequence::*;
use shared::error::{Error, Result};
use shared::marshal::MarshalSize;

/// Packetizer splits opaque samples into RTP packets no larger than the MTU.
/// The last packet of every sample carries the marker bit.
#[derive(Debug, Clone)]
pub struct Packetizer {
    mtu: usize,
    payload_type: u8,
    ssrc: u32,
    sequencer: Sequencer,
    timestamp: u32,
    clock_rate: u32,
    extensions: Vec<Extension>,
}

impl Packetizer {
    pub fn new(
        mtu: usize,
        payload_type: u8,
        ssrc: u32,
        sequencer: Sequencer,
        clock_rate: u32,
    ) -> Self {
        Packetizer {
            mtu,
            payload_type,
            ssrc,
            sequencer,
            timestamp: rand::random::<u32>(),
            clock_rate,
            extensions: vec![],
        }
    }

    /// Adds a header extension carried by every packet from now on.
    pub fn with_extension(mut self, id: u8, payload: Bytes) -> Self {
        self.extensions.push(Extension { id, payload });
        self
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub fn clock_rate(&self) -> u32 {
        self.clock_rate
    }

    /// Packetizes the payload of one sample and advances the timestamp by `samples`.
    pub fn packetize(&mut self, payload: &Bytes, samples: u32) -> Result<Vec<Packet>> {
        if payload.is_empty() {
            return Ok(vec![]);
        }

        let mut template = Header {
            version: 2,
            payload_type: self.payload_type,
            timestamp: self.timestamp,
            ssrc: self.ssrc,
            ..Default::default()
        };
        for extension in &self.extensions {
            template.set_extension(extension.id, extension.payload.clone())?;
        }

        let header_size = template.marshal_size();
        if self.mtu <= header_size {
            return Err(Error::ErrBufferTooSmall);
        }
        let max_payload = self.mtu - header_size;

        let chunks: Vec<Bytes> = (0..payload.len())
            .step_by(max_payload)
            .map(|start| payload.slice(start..(start + max_payload).min(payload.len())))
            .collect();
        let last = chunks.len() - 1;

        let packets = chunks
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| Packet {
                header: Header {
                    marker: i == last,
                    sequence_number: self.sequencer.next_sequence_number(),
                    ..template.clone()
                },
                payload: chunk,
            })
            .collect();

        self.timestamp = self.timestamp.wrapping_add(samples);

        Ok(packets)
    }

    /// Causes a gap in sample count between Packetize requests so the
    /// RTP payloads produced have a gap in timestamps
    pub fn skip_samples(&mut self, skipped_samples: u32) {
        self.timestamp = self.timestamp.wrapping_add(skipped_samples);
    }
}
