#[cfg(test)]
mod chunk_test;

pub mod chunk_abort;
pub mod chunk_forward_tsn;
pub mod chunk_init;
pub mod chunk_payload_data;
pub mod chunk_reconfig;
pub mod chunk_selective_ack;
pub mod chunk_shutdown;
pub mod chunk_type;

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use chunk_abort::ChunkAbort;
use chunk_forward_tsn::ChunkForwardTsn;
use chunk_init::ChunkInit;
use chunk_payload_data::ChunkPayloadData;
use chunk_reconfig::ChunkReconfig;
use chunk_selective_ack::ChunkSelectiveAck;
use chunk_shutdown::ChunkShutdown;
use chunk_type::*;
use shared::error::{Error, Result};

pub(crate) const CHUNK_HEADER_SIZE: usize = 4;

/// A single SCTP chunk, RFC 4960 section 3.2.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   Chunk Type  | Chunk  Flags  |        Chunk Length           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// \                                                               \
/// /                          Chunk Value                          /
/// \                                                               \
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Chunk {
    Init(ChunkInit),
    PayloadData(ChunkPayloadData),
    SelectiveAck(ChunkSelectiveAck),
    Abort(ChunkAbort),
    Shutdown(ChunkShutdown),
    ShutdownAck,
    ShutdownComplete,
    Reconfig(ChunkReconfig),
    ForwardTsn(ChunkForwardTsn),
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Chunk::PayloadData(d) => write!(
                f,
                "{} tsn={} sid={} ssn={} len={}",
                self.chunk_type(),
                d.tsn,
                d.stream_identifier,
                d.stream_sequence_number,
                d.user_data.len()
            ),
            Chunk::SelectiveAck(s) => write!(
                f,
                "{} cum_tsn={} a_rwnd={} gaps={}",
                self.chunk_type(),
                s.cumulative_tsn_ack,
                s.advertised_receiver_window_credit,
                s.gap_ack_blocks.len()
            ),
            Chunk::ForwardTsn(t) => {
                write!(f, "{} new_cum_tsn={}", self.chunk_type(), t.new_cumulative_tsn)
            }
            _ => write!(f, "{}", self.chunk_type()),
        }
    }
}

impl Chunk {
    pub fn chunk_type(&self) -> ChunkType {
        match self {
            Chunk::Init(i) if i.is_ack => CT_INIT_ACK,
            Chunk::Init(_) => CT_INIT,
            Chunk::PayloadData(_) => CT_PAYLOAD_DATA,
            Chunk::SelectiveAck(_) => CT_SACK,
            Chunk::Abort(_) => CT_ABORT,
            Chunk::Shutdown(_) => CT_SHUTDOWN,
            Chunk::ShutdownAck => CT_SHUTDOWN_ACK,
            Chunk::ShutdownComplete => CT_SHUTDOWN_COMPLETE,
            Chunk::Reconfig(_) => CT_RECONFIG,
            Chunk::ForwardTsn(_) => CT_FORWARD_TSN,
        }
    }

    fn flags(&self) -> u8 {
        match self {
            Chunk::PayloadData(d) => d.flags(),
            _ => 0,
        }
    }

    fn value_length(&self) -> usize {
        match self {
            Chunk::Init(c) => c.value_length(),
            Chunk::PayloadData(c) => c.value_length(),
            Chunk::SelectiveAck(c) => c.value_length(),
            Chunk::Abort(c) => c.value_length(),
            Chunk::Shutdown(c) => c.value_length(),
            Chunk::ShutdownAck | Chunk::ShutdownComplete => 0,
            Chunk::Reconfig(c) => c.value_length(),
            Chunk::ForwardTsn(c) => c.value_length(),
        }
    }

    /// Size on the wire including the trailing padding.
    pub fn marshal_size(&self) -> usize {
        let length = CHUNK_HEADER_SIZE + self.value_length();
        length + get_padding_size(length)
    }

    pub fn marshal_to(&self, buf: &mut BytesMut) {
        let length = CHUNK_HEADER_SIZE + self.value_length();
        buf.put_u8(self.chunk_type().0);
        buf.put_u8(self.flags());
        buf.put_u16(length as u16);
        match self {
            Chunk::Init(c) => c.marshal_value(buf),
            Chunk::PayloadData(c) => c.marshal_value(buf),
            Chunk::SelectiveAck(c) => c.marshal_value(buf),
            Chunk::Abort(c) => c.marshal_value(buf),
            Chunk::Shutdown(c) => c.marshal_value(buf),
            Chunk::ShutdownAck | Chunk::ShutdownComplete => {}
            Chunk::Reconfig(c) => c.marshal_value(buf),
            Chunk::ForwardTsn(c) => c.marshal_value(buf),
        }
        buf.put_bytes(0, get_padding_size(length));
    }

    /// Reads one chunk and its padding from `reader`.
    pub fn unmarshal(reader: &mut Bytes) -> Result<Self> {
        if reader.remaining() < CHUNK_HEADER_SIZE {
            return Err(Error::ErrChunkTooShort);
        }
        let typ = ChunkType(reader.get_u8());
        let flags = reader.get_u8();
        let length = reader.get_u16() as usize;
        if length < CHUNK_HEADER_SIZE || reader.remaining() < length - CHUNK_HEADER_SIZE {
            return Err(Error::ErrChunkTooShort);
        }
        let value = reader.copy_to_bytes(length - CHUNK_HEADER_SIZE);
        // the last chunk of a packet may come without padding
        let padding = get_padding_size(length).min(reader.remaining());
        reader.advance(padding);

        Ok(match typ {
            CT_INIT => Chunk::Init(ChunkInit::unmarshal_value(false, &value)?),
            CT_INIT_ACK => Chunk::Init(ChunkInit::unmarshal_value(true, &value)?),
            CT_PAYLOAD_DATA => Chunk::PayloadData(ChunkPayloadData::unmarshal_value(flags, &value)?),
            CT_SACK => Chunk::SelectiveAck(ChunkSelectiveAck::unmarshal_value(&value)?),
            CT_ABORT => Chunk::Abort(ChunkAbort::unmarshal_value(&value)),
            CT_SHUTDOWN => Chunk::Shutdown(ChunkShutdown::unmarshal_value(&value)?),
            CT_SHUTDOWN_ACK => Chunk::ShutdownAck,
            CT_SHUTDOWN_COMPLETE => Chunk::ShutdownComplete,
            CT_RECONFIG => Chunk::Reconfig(ChunkReconfig::unmarshal_value(&value)?),
            CT_FORWARD_TSN => Chunk::ForwardTsn(ChunkForwardTsn::unmarshal_value(&value)?),
            ChunkType(t) => return Err(Error::ErrChunkTypeUnknown(t)),
        })
    }
}

pub(crate) fn get_padding_size(len: usize) -> usize {
    (4 - (len % 4)) % 4
}
