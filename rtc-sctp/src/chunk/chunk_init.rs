use bytes::{Buf, BufMut, Bytes, BytesMut};

use shared::error::{Error, Result};

pub(crate) const INIT_CHUNK_VALUE_LENGTH: usize = 16;

///chunkInitCommon represents an SCTP Chunk body of type INIT and INIT ACK
///
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|   Type = 1    |  Chunk Flags  |      Chunk Length             |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|                         Initiate Tag                          |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|           Advertised Receiver Window Credit (a_rwnd)          |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|  Number of Outbound Streams   |  Number of Inbound Streams    |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|                          Initial TSN                          |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///
/// The INIT ACK carries the same fields. The association in this crate
/// completes after the INIT/INIT ACK exchange.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ChunkInit {
    pub is_ack: bool,
    pub initiate_tag: u32,
    pub advertised_receiver_window_credit: u32,
    pub num_outbound_streams: u16,
    pub num_inbound_streams: u16,
    pub initial_tsn: u32,
}

impl ChunkInit {
    pub(crate) fn unmarshal_value(is_ack: bool, value: &Bytes) -> Result<Self> {
        if value.len() < INIT_CHUNK_VALUE_LENGTH {
            return Err(Error::ErrChunkTooShort);
        }

        let reader = &mut value.clone();
        let init = ChunkInit {
            is_ack,
            initiate_tag: reader.get_u32(),
            advertised_receiver_window_credit: reader.get_u32(),
            num_outbound_streams: reader.get_u16(),
            num_inbound_streams: reader.get_u16(),
            initial_tsn: reader.get_u32(),
        };
        init.check()?;

        Ok(init)
    }

    pub(crate) fn marshal_value(&self, buf: &mut BytesMut) {
        buf.put_u32(self.initiate_tag);
        buf.put_u32(self.advertised_receiver_window_credit);
        buf.put_u16(self.num_outbound_streams);
        buf.put_u16(self.num_inbound_streams);
        buf.put_u32(self.initial_tsn);
    }

    pub(crate) fn value_length(&self) -> usize {
        INIT_CHUNK_VALUE_LENGTH
    }

    /// The receiver of an INIT with a zero initiate tag or zero stream counts
    /// must abort, RFC 4960 section 3.3.2.
    pub(crate) fn check(&self) -> Result<()> {
        if self.initiate_tag == 0 {
            return Err(Error::ErrInitTagZero);
        }
        if self.num_inbound_streams == 0 || self.num_outbound_streams == 0 {
            return Err(Error::ErrInitStreamsZero);
        }
        Ok(())
    }
}
