use bytes::{Buf, BufMut, Bytes, BytesMut};

const ERROR_CAUSE_HEADER_LENGTH: usize = 4;
/// User-Initiated Abort, RFC 4960 section 3.3.10.12
pub(crate) const USER_INITIATED_ABORT: u16 = 12;

///Abort represents an SCTP Chunk of type ABORT
///
///The ABORT chunk is sent to the peer of an association to close the
///association.  The ABORT chunk may contain Cause Parameters to inform
///the receiver about the reason of the abort.  Only the User-Initiated
///Abort cause is produced and understood here.
///
/// 0                   1                   2                   3
/// 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|   Type = 6    |Reserved     |T|           Length              |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
///|                                                               |
///|                   zero or more Error Causes                   |
///|                                                               |
///+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct ChunkAbort {
    pub reason: String,
}

impl ChunkAbort {
    pub(crate) fn unmarshal_value(value: &Bytes) -> Self {
        let reader = &mut value.clone();
        while reader.remaining() >= ERROR_CAUSE_HEADER_LENGTH {
            let code = reader.get_u16();
            let length = reader.get_u16() as usize;
            if length < ERROR_CAUSE_HEADER_LENGTH
                || reader.remaining() < length - ERROR_CAUSE_HEADER_LENGTH
            {
                break;
            }
            let info = reader.copy_to_bytes(length - ERROR_CAUSE_HEADER_LENGTH);
            if code == USER_INITIATED_ABORT {
                return ChunkAbort {
                    reason: String::from_utf8_lossy(&info).into_owned(),
                };
            }
            // causes are padded to 4 bytes
            let padding = (4 - length % 4) % 4;
            reader.advance(padding.min(reader.remaining()));
        }
        ChunkAbort::default()
    }

    pub(crate) fn marshal_value(&self, buf: &mut BytesMut) {
        if self.reason.is_empty() {
            return;
        }
        buf.put_u16(USER_INITIATED_ABORT);
        buf.put_u16((ERROR_CAUSE_HEADER_LENGTH + self.reason.len()) as u16);
        buf.extend_from_slice(self.reason.as_bytes());
    }

    pub(crate) fn value_length(&self) -> usize {
        if self.reason.is_empty() {
            0
        } else {
            ERROR_CAUSE_HEADER_LENGTH + self.reason.len()
        }
    }
}
