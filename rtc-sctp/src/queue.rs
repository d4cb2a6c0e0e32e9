use bytes::BytesMut;

use crate::chunk::chunk_payload_data::{ChunkPayloadData, PayloadProtocolIdentifier};
use crate::util::*;

/// Fragments of one ordered user message, kept in TSN order.
#[derive(Debug, Default, Clone)]
struct ChunkSet {
    ssn: u16,
    ppi: PayloadProtocolIdentifier,
    chunks: Vec<ChunkPayloadData>,
}

impl ChunkSet {
    fn new(ssn: u16, ppi: PayloadProtocolIdentifier) -> Self {
        ChunkSet {
            ssn,
            ppi,
            chunks: vec![],
        }
    }

    /// Returns false for a duplicate fragment.
    fn push(&mut self, chunk: ChunkPayloadData) -> bool {
        if self.chunks.iter().any(|c| c.tsn == chunk.tsn) {
            return false;
        }
        let pos = self
            .chunks
            .iter()
            .position(|c| sna32gt(c.tsn, chunk.tsn))
            .unwrap_or(self.chunks.len());
        self.chunks.insert(pos, chunk);
        true
    }

    fn is_complete(&self) -> bool {
        let (Some(first), Some(last)) = (self.chunks.first(), self.chunks.last()) else {
            return false;
        };
        if !first.beginning_fragment || !last.ending_fragment {
            return false;
        }
        self.chunks
            .windows(2)
            .all(|w| w[1].tsn == w[0].tsn.wrapping_add(1))
    }

    fn n_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.user_data.len()).sum()
    }
}

/// A reassembled user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ReassembledMessage {
    pub(crate) ppi: PayloadProtocolIdentifier,
    pub(crate) payload: BytesMut,
}

/// Per-stream receive queue. Ordered messages are released by stream
/// sequence number, unordered ones as soon as all their fragments arrived.
#[derive(Debug, Default, Clone)]
pub(crate) struct ReassemblyQueue {
    next_ssn: u16,
    ordered: Vec<ChunkSet>,
    unordered: Vec<ChunkSet>,
    unordered_chunks: Vec<ChunkPayloadData>,
    n_bytes: usize,
}

impl ReassemblyQueue {
    /// Returns true when a message became complete.
    pub(crate) fn push(&mut self, chunk: ChunkPayloadData) -> bool {
        if chunk.unordered {
            self.n_bytes += chunk.user_data.len();
            let pos = self
                .unordered_chunks
                .iter()
                .position(|c| sna32gt(c.tsn, chunk.tsn))
                .unwrap_or(self.unordered_chunks.len());
            self.unordered_chunks.insert(pos, chunk);
            if let Some(set) = self.find_complete_unordered() {
                self.unordered.push(set);
                return true;
            }
            return false;
        }

        // stale message, already delivered or skipped
        if sna16lt(chunk.stream_sequence_number, self.next_ssn) {
            return false;
        }

        let n = chunk.user_data.len();
        let ssn = chunk.stream_sequence_number;
        if let Some(set) = self.ordered.iter_mut().find(|s| s.ssn == ssn) {
            if !set.push(chunk) {
                return false;
            }
            self.n_bytes += n;
            return set.is_complete();
        }

        let mut set = ChunkSet::new(ssn, chunk.payload_type);
        set.push(chunk);
        let complete = set.is_complete();
        let pos = self
            .ordered
            .iter()
            .position(|s| sna16lt(ssn, s.ssn))
            .unwrap_or(self.ordered.len());
        self.ordered.insert(pos, set);
        self.n_bytes += n;
        complete
    }

    /// Pulls a contiguous B..E run out of the unordered fragments.
    fn find_complete_unordered(&mut self) -> Option<ChunkSet> {
        let mut start = None;
        for i in 0..self.unordered_chunks.len() {
            let c = &self.unordered_chunks[i];
            if c.beginning_fragment {
                start = Some(i);
            } else if i > 0 && c.tsn != self.unordered_chunks[i - 1].tsn.wrapping_add(1) {
                start = None;
            }

            let ending = c.ending_fragment;
            if let Some(s) = start
                && ending
            {
                let chunks: Vec<ChunkPayloadData> = self.unordered_chunks.drain(s..=i).collect();
                return Some(ChunkSet {
                    ssn: 0,
                    ppi: chunks[0].payload_type,
                    chunks,
                });
            }
        }
        None
    }

    pub(crate) fn is_readable(&self) -> bool {
        !self.unordered.is_empty()
            || self
                .ordered
                .first()
                .is_some_and(|s| s.ssn == self.next_ssn && s.is_complete())
    }

    pub(crate) fn read(&mut self) -> Option<ReassembledMessage> {
        let set = if !self.unordered.is_empty() {
            self.unordered.remove(0)
        } else if self.is_readable() {
            self.next_ssn = self.next_ssn.wrapping_add(1);
            self.ordered.remove(0)
        } else {
            return None;
        };

        self.n_bytes -= set.n_bytes();
        let mut payload = BytesMut::with_capacity(set.n_bytes());
        for c in &set.chunks {
            payload.extend_from_slice(&c.user_data);
        }
        Some(ReassembledMessage {
            ppi: set.ppi,
            payload,
        })
    }

    /// Drops incomplete ordered messages up to `last_ssn` and moves the
    /// delivery point past it.
    pub(crate) fn forward_tsn_for_ordered(&mut self, last_ssn: u16) {
        let mut dropped = 0;
        self.ordered.retain(|s| {
            if sna16lte(s.ssn, last_ssn) && !s.is_complete() {
                dropped += s.n_bytes();
                false
            } else {
                true
            }
        });
        self.n_bytes -= dropped;

        if sna16lte(self.next_ssn, last_ssn) {
            self.next_ssn = last_ssn.wrapping_add(1);
        }
    }

    /// Drops unordered fragments whose TSN is covered by the new cumulative TSN.
    pub(crate) fn forward_tsn_for_unordered(&mut self, new_cumulative_tsn: u32) {
        let mut dropped = 0;
        self.unordered_chunks.retain(|c| {
            if sna32lte(c.tsn, new_cumulative_tsn) {
                dropped += c.user_data.len();
                false
            } else {
                true
            }
        });
        self.n_bytes -= dropped;
    }

    /// Restarts stream sequence numbering after an incoming stream reset.
    pub(crate) fn reset(&mut self) {
        self.next_ssn = 0;
        self.ordered.clear();
        self.unordered_chunks.clear();
        self.n_bytes = self.unordered.iter().map(|s| s.n_bytes()).sum();
    }

    pub(crate) fn n_bytes(&self) -> usize {
        self.n_bytes
    }
}

#[cfg(test)]
mod test {
    use bytes::Bytes;

    use super::*;

    fn fragment(
        tsn: u32,
        ssn: u16,
        b: bool,
        e: bool,
        unordered: bool,
        data: &'static [u8],
    ) -> ChunkPayloadData {
        ChunkPayloadData {
            unordered,
            beginning_fragment: b,
            ending_fragment: e,
            tsn,
            stream_sequence_number: ssn,
            payload_type: PayloadProtocolIdentifier::Binary,
            user_data: Bytes::from_static(data),
            ..Default::default()
        }
    }

    #[test]
    fn test_ordered_delivery_waits_for_gap() {
        let mut q = ReassemblyQueue::default();
        assert!(q.push(fragment(2, 1, true, true, false, b"second")));
        assert!(!q.is_readable());
        assert!(q.push(fragment(1, 0, true, true, false, b"first")));

        assert_eq!(q.read().map(|m| m.payload), Some(BytesMut::from(&b"first"[..])));
        assert_eq!(q.read().map(|m| m.payload), Some(BytesMut::from(&b"second"[..])));
        assert!(q.read().is_none());
        assert_eq!(q.n_bytes(), 0);
    }

    #[test]
    fn test_ordered_fragments_out_of_order() {
        let mut q = ReassemblyQueue::default();
        assert!(!q.push(fragment(12, 0, false, true, false, b"CD")));
        assert!(!q.push(fragment(10, 0, true, false, false, b"AB")));
        assert!(!q.push(fragment(10, 0, true, false, false, b"AB")));
        assert!(q.push(fragment(11, 0, false, false, false, b"xx")));

        let msg = q.read();
        assert_eq!(msg.map(|m| m.payload), Some(BytesMut::from(&b"ABxxCD"[..])));
    }

    #[test]
    fn test_unordered_delivered_immediately() {
        let mut q = ReassemblyQueue::default();
        assert!(!q.push(fragment(5, 0, true, false, true, b"he")));
        assert!(q.push(fragment(7, 0, true, true, true, b"solo")));
        assert_eq!(q.read().map(|m| m.payload), Some(BytesMut::from(&b"solo"[..])));
        assert!(q.push(fragment(6, 0, false, true, true, b"llo")));
        assert_eq!(q.read().map(|m| m.payload), Some(BytesMut::from(&b"hello"[..])));
    }

    #[test]
    fn test_forward_tsn_skips_abandoned() {
        let mut q = ReassemblyQueue::default();
        q.push(fragment(1, 0, true, false, false, b"lost"));
        q.push(fragment(4, 1, true, true, false, b"next"));
        assert!(!q.is_readable());

        q.forward_tsn_for_ordered(0);
        assert!(q.is_readable());
        assert_eq!(q.read().map(|m| m.payload), Some(BytesMut::from(&b"next"[..])));

        q.push(fragment(8, 0, true, false, true, b"gone"));
        q.forward_tsn_for_unordered(8);
        assert_eq!(q.n_bytes(), 0);
    }

    #[test]
    fn test_stale_ssn_ignored() {
        let mut q = ReassemblyQueue::default();
        q.push(fragment(1, 0, true, true, false, b"a"));
        q.read();
        assert!(!q.push(fragment(2, 0, true, true, false, b"dup")));
        assert_eq!(q.n_bytes(), 0);
    }
}
