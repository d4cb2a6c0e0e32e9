use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use shared::error::{Error, Result};

pub(crate) const PARAM_HEADER_LENGTH: usize = 4;
pub(crate) const PARAM_OUTGOING_RESET_REQUEST: u16 = 13;
pub(crate) const PARAM_RECONFIG_RESPONSE: u16 = 16;
const OUTGOING_RESET_REQUEST_FIXED_LENGTH: usize = 12;
const RECONFIG_RESPONSE_LENGTH: usize = 8;

/// Outcome carried by a Re-configuration Response, RFC 6525 section 4.4.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
#[repr(u32)]
pub enum ReconfigResult {
    SuccessNop = 0,
    #[default]
    SuccessPerformed = 1,
    Denied = 2,
    ErrorWrongSsn = 3,
    ErrorRequestAlreadyInProgress = 4,
    ErrorBadSequenceNumber = 5,
    InProgress = 6,
}

impl From<u32> for ReconfigResult {
    fn from(v: u32) -> Self {
        match v {
            0 => ReconfigResult::SuccessNop,
            1 => ReconfigResult::SuccessPerformed,
            2 => ReconfigResult::Denied,
            3 => ReconfigResult::ErrorWrongSsn,
            4 => ReconfigResult::ErrorRequestAlreadyInProgress,
            5 => ReconfigResult::ErrorBadSequenceNumber,
            _ => ReconfigResult::InProgress,
        }
    }
}

impl fmt::Display for ReconfigResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ReconfigResult::SuccessNop => "0: Success - Nothing to do",
            ReconfigResult::SuccessPerformed => "1: Success - Performed",
            ReconfigResult::Denied => "2: Denied",
            ReconfigResult::ErrorWrongSsn => "3: Error - Wrong SSN",
            ReconfigResult::ErrorRequestAlreadyInProgress => {
                "4: Error - Request already in progress"
            }
            ReconfigResult::ErrorBadSequenceNumber => "5: Error - Bad Sequence Number",
            ReconfigResult::InProgress => "6: In progress",
        };
        write!(f, "{s}")
    }
}

/// Outgoing SSN Reset Request Parameter, RFC 6525 section 4.1
///
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |     Parameter Type = 13       | Parameter Length = 16 + 2 * N |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           Re-configuration Request Sequence Number            |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |           Re-configuration Response Sequence Number           |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |                Sender's Last Assigned TSN                     |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |  Stream Number 1 (optional)   |    Stream Number 2 (optional) |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct OutgoingResetRequest {
    pub reconfig_request_sequence_number: u32,
    pub reconfig_response_sequence_number: u32,
    pub sender_last_tsn: u32,
    pub stream_identifiers: Vec<u16>,
}

/// Re-configuration Response Parameter, RFC 6525 section 4.4
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ReconfigResponse {
    pub reconfig_response_sequence_number: u32,
    pub result: ReconfigResult,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconfigParam {
    OutgoingResetRequest(OutgoingResetRequest),
    Response(ReconfigResponse),
}

impl ReconfigParam {
    fn unmarshal(reader: &mut Bytes) -> Result<Self> {
        if reader.remaining() < PARAM_HEADER_LENGTH {
            return Err(Error::ErrChunkTooShort);
        }
        let typ = reader.get_u16();
        let length = reader.get_u16() as usize;
        if length < PARAM_HEADER_LENGTH || reader.remaining() < length - PARAM_HEADER_LENGTH {
            return Err(Error::ErrChunkTooShort);
        }
        let mut value = reader.copy_to_bytes(length - PARAM_HEADER_LENGTH);
        let padding = (4 - length % 4) % 4;
        reader.advance(padding.min(reader.remaining()));

        match typ {
            PARAM_OUTGOING_RESET_REQUEST => {
                if value.remaining() < OUTGOING_RESET_REQUEST_FIXED_LENGTH {
                    return Err(Error::ErrChunkTooShort);
                }
                let reconfig_request_sequence_number = value.get_u32();
                let reconfig_response_sequence_number = value.get_u32();
                let sender_last_tsn = value.get_u32();
                let mut stream_identifiers = vec![];
                while value.remaining() >= 2 {
                    stream_identifiers.push(value.get_u16());
                }
                Ok(ReconfigParam::OutgoingResetRequest(OutgoingResetRequest {
                    reconfig_request_sequence_number,
                    reconfig_response_sequence_number,
                    sender_last_tsn,
                    stream_identifiers,
                }))
            }
            PARAM_RECONFIG_RESPONSE => {
                if value.remaining() < RECONFIG_RESPONSE_LENGTH {
                    return Err(Error::ErrChunkTooShort);
                }
                Ok(ReconfigParam::Response(ReconfigResponse {
                    reconfig_response_sequence_number: value.get_u32(),
                    result: value.get_u32().into(),
                }))
            }
            typ => Err(Error::ErrReconfigParamUnknown(typ)),
        }
    }

    /// Length without trailing padding.
    fn unpadded_length(&self) -> usize {
        match self {
            ReconfigParam::OutgoingResetRequest(r) => {
                PARAM_HEADER_LENGTH
                    + OUTGOING_RESET_REQUEST_FIXED_LENGTH
                    + r.stream_identifiers.len() * 2
            }
            ReconfigParam::Response(_) => PARAM_HEADER_LENGTH + RECONFIG_RESPONSE_LENGTH,
        }
    }

    fn marshal_to(&self, buf: &mut BytesMut) {
        let length = self.unpadded_length();
        match self {
            ReconfigParam::OutgoingResetRequest(r) => {
                buf.put_u16(PARAM_OUTGOING_RESET_REQUEST);
                buf.put_u16(length as u16);
                buf.put_u32(r.reconfig_request_sequence_number);
                buf.put_u32(r.reconfig_response_sequence_number);
                buf.put_u32(r.sender_last_tsn);
                for id in &r.stream_identifiers {
                    buf.put_u16(*id);
                }
            }
            ReconfigParam::Response(r) => {
                buf.put_u16(PARAM_RECONFIG_RESPONSE);
                buf.put_u16(length as u16);
                buf.put_u32(r.reconfig_response_sequence_number);
                buf.put_u32(r.result as u32);
            }
        }
    }
}

/// Re-configuration Chunk, RFC 6525 section 3.1. Carries one or two
/// parameters; the second one, if present, must be padded to 4 bytes
/// by the first.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ChunkReconfig {
    pub param_a: Option<ReconfigParam>,
    pub param_b: Option<ReconfigParam>,
}

impl ChunkReconfig {
    pub(crate) fn unmarshal_value(value: &Bytes) -> Result<Self> {
        let reader = &mut value.clone();
        let param_a = Some(ReconfigParam::unmarshal(reader)?);
        let param_b = if reader.remaining() >= PARAM_HEADER_LENGTH {
            Some(ReconfigParam::unmarshal(reader)?)
        } else {
            None
        };
        Ok(ChunkReconfig { param_a, param_b })
    }

    pub(crate) fn marshal_value(&self, buf: &mut BytesMut) {
        if let Some(a) = &self.param_a {
            a.marshal_to(buf);
            if self.param_b.is_some() {
                let padding = (4 - a.unpadded_length() % 4) % 4;
                buf.put_bytes(0, padding);
            }
        }
        if let Some(b) = &self.param_b {
            b.marshal_to(buf);
        }
    }

    pub(crate) fn value_length(&self) -> usize {
        let mut length = 0;
        if let Some(a) = &self.param_a {
            length += a.unpadded_length();
            if self.param_b.is_some() {
                length += (4 - a.unpadded_length() % 4) % 4;
            }
        }
        if let Some(b) = &self.param_b {
            length += b.unpadded_length();
        }
        length
    }
}
