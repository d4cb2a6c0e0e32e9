use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::chunk::Chunk;
use crate::config::COMMON_HEADER_SIZE;
use crate::util::generate_packet_checksum;
use shared::error::{Error, Result};

/// First byte of every association packet. It places the packet inside the
/// 20..=63 range that RFC 7983 reserves for the association layer so it can
/// share one UDP flow with STUN and RTP.
pub const PACKET_MARKER: u8 = 0x17;

const MARKER_LENGTH: usize = 1;
const CHECKSUM_OFFSET: usize = MARKER_LENGTH + 8;

/// Packet represents an SCTP packet, defined in RFC 4960 section 3, behind
/// a one byte demultiplexing marker.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+
/// | Marker = 0x17 |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Source Port Number        |     Destination Port Number   |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      Verification Tag                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Checksum                            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                           Chunk #1..n                         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///
/// The checksum is CRC-32C over everything after the marker with the
/// checksum field zeroed, stored little-endian as in RFC 4960 appendix B.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub source_port: u16,
    pub destination_port: u16,
    pub verification_tag: u32,
    pub chunks: Vec<Chunk>,
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet: sourcePort={} destinationPort={} verificationTag={}",
            self.source_port, self.destination_port, self.verification_tag,
        )?;
        for chunk in &self.chunks {
            write!(f, "\n  {chunk}")?;
        }
        Ok(())
    }
}

impl Packet {
    pub fn unmarshal(raw: &Bytes) -> Result<Self> {
        if raw.len() < COMMON_HEADER_SIZE {
            return Err(Error::ErrPacketTooShort);
        }
        if raw[0] != PACKET_MARKER {
            return Err(Error::ErrChunkTypeUnknown(raw[0]));
        }

        let reader = &mut raw.slice(MARKER_LENGTH..);
        let source_port = reader.get_u16();
        let destination_port = reader.get_u16();
        let verification_tag = reader.get_u32();
        let their_checksum = reader.get_u32_le();

        let mut zeroed = raw.slice(MARKER_LENGTH..).to_vec();
        zeroed[CHECKSUM_OFFSET - MARKER_LENGTH..COMMON_HEADER_SIZE - MARKER_LENGTH].fill(0);
        if their_checksum != generate_packet_checksum(&zeroed) {
            return Err(Error::ErrChecksumMismatch);
        }

        let mut chunks = vec![];
        while reader.has_remaining() {
            chunks.push(Chunk::unmarshal(reader)?);
        }

        Ok(Packet {
            source_port,
            destination_port,
            verification_tag,
            chunks,
        })
    }

    pub fn marshal_size(&self) -> usize {
        COMMON_HEADER_SIZE + self.chunks.iter().map(|c| c.marshal_size()).sum::<usize>()
    }

    pub fn marshal(&self) -> BytesMut {
        let mut buf = BytesMut::with_capacity(self.marshal_size());
        buf.put_u8(PACKET_MARKER);
        buf.put_u16(self.source_port);
        buf.put_u16(self.destination_port);
        buf.put_u32(self.verification_tag);
        buf.put_u32(0);
        for chunk in &self.chunks {
            chunk.marshal_to(&mut buf);
        }

        let checksum = generate_packet_checksum(&buf[MARKER_LENGTH..]);
        buf[CHECKSUM_OFFSET..COMMON_HEADER_SIZE].copy_from_slice(&checksum.to_le_bytes());
        buf
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::chunk::chunk_init::ChunkInit;

    fn init_packet() -> Packet {
        Packet {
            source_port: 5000,
            destination_port: 5000,
            verification_tag: 0,
            chunks: vec![Chunk::Init(ChunkInit {
                is_ack: false,
                initiate_tag: 0xabcd,
                advertised_receiver_window_credit: 65535,
                num_outbound_streams: 16,
                num_inbound_streams: 16,
                initial_tsn: 1,
            })],
        }
    }

    #[test]
    fn test_packet_marshal_unmarshal() -> Result<()> {
        let pkt = init_packet();
        let raw = pkt.marshal();
        assert_eq!(raw[0], PACKET_MARKER);
        assert_eq!(raw.len(), pkt.marshal_size());

        let parsed = Packet::unmarshal(&raw.freeze())?;
        assert_eq!(parsed, pkt);
        Ok(())
    }

    #[test]
    fn test_packet_checksum_mismatch() {
        let mut raw = init_packet().marshal();
        let last = raw.len() - 1;
        raw[last] ^= 0xff;
        assert_eq!(
            Packet::unmarshal(&raw.freeze()),
            Err(Error::ErrChecksumMismatch)
        );
    }

    #[test]
    fn test_packet_too_short() {
        let raw = Bytes::from_static(&[PACKET_MARKER, 0, 0, 0]);
        assert_eq!(Packet::unmarshal(&raw), Err(Error::ErrPacketTooShort));
    }

    #[test]
    fn test_packet_wrong_marker() {
        let mut raw = init_packet().marshal();
        raw[0] = 0x16;
        assert_eq!(
            Packet::unmarshal(&raw.freeze()),
            Err(Error::ErrChunkTypeUnknown(0x16))
        );
    }
}
