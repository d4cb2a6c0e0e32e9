use bytes::{Buf, BufMut, Bytes, BytesMut};

use shared::error::{Error, Result};

pub(crate) const NEW_CUMULATIVE_TSN_LENGTH: usize = 4;
pub(crate) const FORWARD_TSN_STREAM_LENGTH: usize = 4;

/// This chunk shall be used by the data sender to inform the data
/// receiver to adjust its cumulative received TSN point forward because
/// some missing TSNs are associated with data chunks that SHOULD NOT be
/// transmitted or retransmitted by the sender, RFC 3758.
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |   Type = 192  |  Flags = 0x00 |        Length = Variable      |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                      New Cumulative TSN                       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |         Stream-1              |       Stream Sequence-1       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ChunkForwardTsn {
    /// This indicates the new cumulative TSN to the data receiver.
    pub new_cumulative_tsn: u32,
    /// Ordered streams whose delivery point moves forward with it.
    pub streams: Vec<ChunkForwardTsnStream>,
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct ChunkForwardTsnStream {
    pub identifier: u16,
    /// The largest stream sequence number being skipped.
    pub sequence: u16,
}

impl ChunkForwardTsn {
    pub(crate) fn unmarshal_value(value: &Bytes) -> Result<Self> {
        if value.len() < NEW_CUMULATIVE_TSN_LENGTH {
            return Err(Error::ErrChunkTooShort);
        }

        let reader = &mut value.clone();
        let new_cumulative_tsn = reader.get_u32();

        let mut streams = vec![];
        while reader.remaining() >= FORWARD_TSN_STREAM_LENGTH {
            streams.push(ChunkForwardTsnStream {
                identifier: reader.get_u16(),
                sequence: reader.get_u16(),
            });
        }

        Ok(ChunkForwardTsn {
            new_cumulative_tsn,
            streams,
        })
    }

    pub(crate) fn marshal_value(&self, buf: &mut BytesMut) {
        buf.put_u32(self.new_cumulative_tsn);
        for s in &self.streams {
            buf.put_u16(s.identifier);
            buf.put_u16(s.sequence);
        }
    }

    pub(crate) fn value_length(&self) -> usize {
        NEW_CUMULATIVE_TSN_LENGTH + self.streams.len() * FORWARD_TSN_STREAM_LENGTH
    }
}
