use std::fmt;
use std::time::Instant;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use shared::error::{Error, Result};

pub(crate) const PAYLOAD_DATA_ENDING_FRAGMENT_BITMASK: u8 = 1;
pub(crate) const PAYLOAD_DATA_BEGINNING_FRAGMENT_BITMASK: u8 = 2;
pub(crate) const PAYLOAD_DATA_UNORDERED_BITMASK: u8 = 4;
pub(crate) const PAYLOAD_DATA_IMMEDIATE_SACK: u8 = 8;
pub(crate) const PAYLOAD_DATA_HEADER_SIZE: usize = 12;

/// PayloadProtocolIdentifier is an enum for DataChannel payload types
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum PayloadProtocolIdentifier {
    Dcep = 50,
    String = 51,
    Binary = 53,
    StringEmpty = 56,
    BinaryEmpty = 57,
    #[default]
    Unknown,
}

impl fmt::Display for PayloadProtocolIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            PayloadProtocolIdentifier::Dcep => "WebRTC DCEP",
            PayloadProtocolIdentifier::String => "WebRTC String",
            PayloadProtocolIdentifier::Binary => "WebRTC Binary",
            PayloadProtocolIdentifier::StringEmpty => "WebRTC String (Empty)",
            PayloadProtocolIdentifier::BinaryEmpty => "WebRTC Binary (Empty)",
            _ => "Unknown Payload Protocol Identifier",
        };
        write!(f, "{s}")
    }
}

impl From<u32> for PayloadProtocolIdentifier {
    fn from(v: u32) -> PayloadProtocolIdentifier {
        match v {
            50 => PayloadProtocolIdentifier::Dcep,
            51 => PayloadProtocolIdentifier::String,
            53 => PayloadProtocolIdentifier::Binary,
            56 => PayloadProtocolIdentifier::StringEmpty,
            57 => PayloadProtocolIdentifier::BinaryEmpty,
            _ => PayloadProtocolIdentifier::Unknown,
        }
    }
}

impl PayloadProtocolIdentifier {
    pub fn to_u32(self) -> u32 {
        match self {
            PayloadProtocolIdentifier::Unknown => 0,
            ppi => ppi as u32,
        }
    }
}

///chunkPayloadData represents an SCTP Chunk of type DATA
///
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|   Type = 0    | Reserved|U|B|E|    Length                     |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|                              TSN                              |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|      Stream Identifier S      |   Stream Sequence Number n    |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|                  Payload Protocol Identifier                  |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///\                                                               \
////                 User Data (seq n of Stream S)                 /
///\                                                               \
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChunkPayloadData {
    pub unordered: bool,
    pub beginning_fragment: bool,
    pub ending_fragment: bool,
    pub immediate_sack: bool,

    pub tsn: u32,
    pub stream_identifier: u16,
    pub stream_sequence_number: u16,
    pub payload_type: PayloadProtocolIdentifier,
    pub user_data: Bytes,
}

impl ChunkPayloadData {
    pub(crate) fn unmarshal_value(flags: u8, value: &Bytes) -> Result<Self> {
        if value.len() < PAYLOAD_DATA_HEADER_SIZE {
            return Err(Error::ErrChunkTooShort);
        }

        let reader = &mut value.slice(..PAYLOAD_DATA_HEADER_SIZE);
        let tsn = reader.get_u32();
        let stream_identifier = reader.get_u16();
        let stream_sequence_number = reader.get_u16();
        let payload_type: PayloadProtocolIdentifier = reader.get_u32().into();
        let user_data = value.slice(PAYLOAD_DATA_HEADER_SIZE..);
        if user_data.is_empty() {
            return Err(Error::ErrPayloadDataEmpty);
        }

        Ok(ChunkPayloadData {
            unordered: flags & PAYLOAD_DATA_UNORDERED_BITMASK != 0,
            beginning_fragment: flags & PAYLOAD_DATA_BEGINNING_FRAGMENT_BITMASK != 0,
            ending_fragment: flags & PAYLOAD_DATA_ENDING_FRAGMENT_BITMASK != 0,
            immediate_sack: flags & PAYLOAD_DATA_IMMEDIATE_SACK != 0,
            tsn,
            stream_identifier,
            stream_sequence_number,
            payload_type,
            user_data,
        })
    }

    pub(crate) fn marshal_value(&self, buf: &mut BytesMut) {
        buf.put_u32(self.tsn);
        buf.put_u16(self.stream_identifier);
        buf.put_u16(self.stream_sequence_number);
        buf.put_u32(self.payload_type.to_u32());
        buf.extend_from_slice(&self.user_data);
    }

    pub(crate) fn flags(&self) -> u8 {
        let mut flags = 0;
        if self.ending_fragment {
            flags |= PAYLOAD_DATA_ENDING_FRAGMENT_BITMASK;
        }
        if self.beginning_fragment {
            flags |= PAYLOAD_DATA_BEGINNING_FRAGMENT_BITMASK;
        }
        if self.unordered {
            flags |= PAYLOAD_DATA_UNORDERED_BITMASK;
        }
        if self.immediate_sack {
            flags |= PAYLOAD_DATA_IMMEDIATE_SACK;
        }
        flags
    }

    pub(crate) fn value_length(&self) -> usize {
        PAYLOAD_DATA_HEADER_SIZE + self.user_data.len()
    }
}

/// Sender-side bookkeeping for a DATA chunk waiting in the inflight queue.
#[derive(Debug, Clone)]
pub(crate) struct InflightChunk {
    pub(crate) data: ChunkPayloadData,
    /// When the user message was handed to the association.
    pub(crate) since: Instant,
    pub(crate) sent_at: Option<Instant>,
    pub(crate) nsent: usize,
    pub(crate) acked: bool,
    pub(crate) abandoned: bool,
    pub(crate) retransmit: bool,
    pub(crate) miss_indicator: usize,
}

impl InflightChunk {
    pub(crate) fn new(data: ChunkPayloadData, since: Instant) -> Self {
        InflightChunk {
            data,
            since,
            sent_at: None,
            nsent: 0,
            acked: false,
            abandoned: false,
            retransmit: false,
            miss_indicator: 0,
        }
    }
}
