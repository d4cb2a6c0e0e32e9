use bytes::BytesMut;

/// RTCDataChannelMessage represents a message received from the
/// data channel. IsString will be set to true if the incoming
/// message is of the string type. Otherwise, the message is of
/// a binary type.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RTCDataChannelMessage {
    pub is_string: bool,
    pub data: BytesMut,
}

impl RTCDataChannelMessage {
    pub fn text(s: impl Into<String>) -> Self {
        Self {
            is_string: true,
            data: BytesMut::from(s.into().as_bytes()),
        }
    }

    pub fn binary(data: impl AsRef<[u8]>) -> Self {
        Self {
            is_string: false,
            data: BytesMut::from(data.as_ref()),
        }
    }
}
