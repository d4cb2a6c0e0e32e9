use std::fmt;

use bytes::BytesMut;

use crate::chunk::chunk_payload_data::PayloadProtocolIdentifier;
use crate::queue::ReassemblyQueue;

/// Reliability type for stream
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum ReliabilityType {
    /// ReliabilityTypeReliable is used for reliable transmission
    #[default]
    Reliable = 0,
    /// ReliabilityTypeRexmit is used for partial reliability by retransmission count
    Rexmit = 1,
    /// ReliabilityTypeTimed is used for partial reliability by retransmission duration
    Timed = 2,
}

impl fmt::Display for ReliabilityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            ReliabilityType::Reliable => "Reliable",
            ReliabilityType::Rexmit => "Rexmit",
            ReliabilityType::Timed => "Timed",
        };
        write!(f, "{s}")
    }
}

/// A user message on one stream, as handed to or delivered by the association.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StreamMessage {
    pub stream_id: u16,
    pub ppi: PayloadProtocolIdentifier,
    pub payload: BytesMut,
}

/// Progress of the outgoing half of a stream towards an RFC 6525 reset.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum ResetState {
    #[default]
    Open,
    /// Close requested, waiting for queued data to drain.
    Pending,
    /// RECONFIG sent with this request sequence number.
    Requested(u32),
    Done,
}

/// Per-stream state kept by the association.
#[derive(Debug, Default, Clone)]
pub(crate) struct Stream {
    pub(crate) stream_id: u16,
    pub(crate) unordered: bool,
    pub(crate) reliability_type: ReliabilityType,
    pub(crate) reliability_value: u32,
    pub(crate) next_ssn: u16,
    pub(crate) buffered_amount: usize,
    pub(crate) buffered_amount_low: usize,
    pub(crate) reassembly: ReassemblyQueue,
    pub(crate) outgoing: ResetState,
    pub(crate) incoming_reset: bool,
}

impl Stream {
    pub(crate) fn new(
        stream_id: u16,
        unordered: bool,
        reliability_type: ReliabilityType,
        reliability_value: u32,
    ) -> Self {
        Stream {
            stream_id,
            unordered,
            reliability_type,
            reliability_value,
            ..Default::default()
        }
    }

    /// Returns true when the amount crossed down through the low threshold.
    pub(crate) fn on_buffer_released(&mut self, n_bytes: usize) -> bool {
        let from = self.buffered_amount;
        self.buffered_amount = self.buffered_amount.saturating_sub(n_bytes);
        from > self.buffered_amount_low && self.buffered_amount <= self.buffered_amount_low
    }

    pub(crate) fn is_writable(&self) -> bool {
        self.outgoing == ResetState::Open
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.outgoing == ResetState::Done && self.incoming_reset
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_buffered_amount_low_crossing() {
        let mut s = Stream::new(0, false, ReliabilityType::Reliable, 0);
        s.buffered_amount_low = 100;
        s.buffered_amount = 300;

        assert!(!s.on_buffer_released(100));
        assert!(s.on_buffer_released(150));
        assert!(!s.on_buffer_released(10));
        assert_eq!(s.buffered_amount, 40);
        assert!(!s.on_buffer_released(1000));
        assert_eq!(s.buffered_amount, 0);
    }

    #[test]
    fn test_reliability_type_string() {
        assert_eq!(ReliabilityType::Reliable.to_string(), "Reliable");
        assert_eq!(ReliabilityType::Timed.to_string(), "Timed");
    }
}
