//! RFC 4571 framing for ICE over TCP: every packet on the stream carries a
//! 2-byte big-endian length prefix. No I/O happens here.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! -----------------------------------------------------------------
//! |             LENGTH            |  STUN/association/RTP packet  |
//! -----------------------------------------------------------------
//! ```

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Error, Result};

/// Length of the framing header (2 bytes for length prefix).
pub const FRAMING_HEADER_LEN: usize = 2;

/// Maximum packet size that can be framed (u16::MAX = 65535 bytes).
pub const MAX_FRAMED_PACKET_SIZE: usize = u16::MAX as usize;

/// Adds the RFC 4571 framing header to a packet.
pub fn frame_packet(buf: &[u8]) -> Result<BytesMut> {
    if buf.len() > MAX_FRAMED_PACKET_SIZE {
        return Err(Error::ErrPacketTooBig);
    }

    let mut framed = BytesMut::with_capacity(FRAMING_HEADER_LEN + buf.len());
    framed.put_u16(buf.len() as u16);
    framed.extend_from_slice(buf);
    Ok(framed)
}

/// A stateful decoder for RFC 4571 framed TCP streams. It can be fed data in
/// any chunk size.
#[derive(Debug, Default)]
pub struct TcpFrameDecoder {
    buffer: BytesMut,
}

impl TcpFrameDecoder {
    pub fn new() -> Self {
        Self {
            buffer: BytesMut::new(),
        }
    }

    /// Appends stream data to the internal buffer.
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Extracts the next complete packet without its header, or None if more
    /// data is needed.
    pub fn next_packet(&mut self) -> Option<BytesMut> {
        if self.buffer.len() < FRAMING_HEADER_LEN {
            return None;
        }

        let length = u16::from_be_bytes([self.buffer[0], self.buffer[1]]) as usize;
        if self.buffer.len() < FRAMING_HEADER_LEN + length {
            return None;
        }

        self.buffer.advance(FRAMING_HEADER_LEN);
        Some(self.buffer.split_to(length))
    }

    /// Returns the number of buffered bytes.
    pub fn buffered_len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
