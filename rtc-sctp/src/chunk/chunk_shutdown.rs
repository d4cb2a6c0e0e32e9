use bytes::{Buf, BufMut, Bytes, BytesMut};

use shared::error::{Error, Result};

const CUMULATIVE_TSN_ACK_LENGTH: usize = 4;

///chunkShutdown represents an SCTP Chunk of type SHUTDOWN
///
///0                   1                   2                   3
///0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|   Type = 7    | Chunk  Flags  |      Length = 8               |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|                      Cumulative TSN Ack                       |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ChunkShutdown {
    pub cumulative_tsn_ack: u32,
}

impl ChunkShutdown {
    pub(crate) fn unmarshal_value(value: &Bytes) -> Result<Self> {
        if value.len() < CUMULATIVE_TSN_ACK_LENGTH {
            return Err(Error::ErrChunkTooShort);
        }
        let reader = &mut value.clone();
        Ok(ChunkShutdown {
            cumulative_tsn_ack: reader.get_u32(),
        })
    }

    pub(crate) fn marshal_value(&self, buf: &mut BytesMut) {
        buf.put_u32(self.cumulative_tsn_ack);
    }

    pub(crate) fn value_length(&self) -> usize {
        CUMULATIVE_TSN_ACK_LENGTH
    }
}
