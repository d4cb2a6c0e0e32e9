use std::collections::HashMap;
use std::mem;

use log::{debug, trace, warn};

use super::*;
use crate::chunk::chunk_forward_tsn::{ChunkForwardTsn, ChunkForwardTsnStream};
use crate::chunk::chunk_reconfig::{ChunkReconfig, ReconfigParam, ReconfigResponse, ReconfigResult};
use crate::chunk::chunk_selective_ack::{ChunkSelectiveAck, GapAckBlock};
use crate::chunk::chunk_shutdown::ChunkShutdown;
use crate::config::COMMON_HEADER_SIZE;
use crate::util::*;

impl Association {
    pub(super) fn handle_packet(&mut self, p: Packet) -> Result<()> {
        trace!("[{}] received {}", self.name, p);

        if self.state == AssociationState::Closed && self.peer_verification_tag != 0 {
            debug!("[{}] association closed, ignoring packet", self.name);
            return Ok(());
        }

        let has_init = p
            .chunks
            .iter()
            .any(|c| matches!(c, Chunk::Init(i) if !i.is_ack));
        if has_init {
            // RFC 4960 section 6.10, INIT must not be bundled
            if p.chunks.len() != 1 || p.verification_tag != 0 {
                warn!("[{}] dropping malformed INIT packet", self.name);
                return Ok(());
            }
        } else if p.verification_tag != self.my_verification_tag {
            warn!(
                "[{}] dropping packet with verification tag {} (expected {})",
                self.name, p.verification_tag, self.my_verification_tag
            );
            return Ok(());
        }

        for chunk in p.chunks {
            match chunk {
                Chunk::Init(init) if init.is_ack => self.handle_init_ack(init),
                Chunk::Init(init) => self.handle_init(init),
                Chunk::PayloadData(d) => self.handle_data(d),
                Chunk::SelectiveAck(sack) => self.handle_sack(sack),
                Chunk::ForwardTsn(fwd) => self.handle_forward_tsn(fwd),
                Chunk::Reconfig(reconfig) => self.handle_reconfig(reconfig),
                Chunk::Shutdown(shutdown) => self.handle_shutdown(shutdown),
                Chunk::ShutdownAck => self.handle_shutdown_ack(),
                Chunk::ShutdownComplete => self.handle_shutdown_complete(),
                Chunk::Abort(abort) => {
                    self.handle_abort(abort);
                    return Ok(());
                }
            }
        }

        if mem::take(&mut self.ack_needed) && self.peer_verification_tag != 0 {
            let sack = self.create_selective_ack();
            self.control.push_back(Chunk::SelectiveAck(sack));
        }
        self.flush();

        Ok(())
    }

    fn handle_init(&mut self, init: ChunkInit) {
        if self.is_client {
            debug!("[{}] ignoring INIT on the initiating side", self.name);
            return;
        }

        match self.state {
            AssociationState::Closed => {
                self.peer_verification_tag = init.initiate_tag;
                self.peer_last_tsn = init.initial_tsn.wrapping_sub(1);
                self.rwnd = init.advertised_receiver_window_credit;
                self.ssthresh = self.rwnd;
                self.num_outbound_streams = self
                    .config
                    .max_num_outbound_streams()
                    .min(init.num_inbound_streams);
                self.send_init_ack();
                self.set_state(AssociationState::Established);
                self.events.push_back(Event::Connected);
            }
            AssociationState::Established if init.initiate_tag == self.peer_verification_tag => {
                debug!("[{}] duplicate INIT, resending INIT ACK", self.name);
                self.send_init_ack();
            }
            _ => {
                debug!("[{}] ignoring INIT in state {}", self.name, self.state);
            }
        }
    }

    fn send_init_ack(&mut self) {
        let init_ack = ChunkInit {
            is_ack: true,
            initiate_tag: self.my_verification_tag,
            advertised_receiver_window_credit: self.config.max_receive_buffer_size(),
            num_outbound_streams: self.config.max_num_outbound_streams(),
            num_inbound_streams: self.config.max_num_inbound_streams(),
            // the first TSN this side sends
            initial_tsn: self.cumulative_tsn_ack_point.wrapping_add(1),
        };
        self.transmit_packet(self.peer_verification_tag, vec![Chunk::Init(init_ack)]);
    }

    fn handle_init_ack(&mut self, init_ack: ChunkInit) {
        if self.state != AssociationState::InitSent {
            debug!("[{}] ignoring INIT ACK in state {}", self.name, self.state);
            return;
        }

        self.peer_verification_tag = init_ack.initiate_tag;
        self.peer_last_tsn = init_ack.initial_tsn.wrapping_sub(1);
        self.rwnd = init_ack.advertised_receiver_window_credit;
        self.ssthresh = self.rwnd;
        self.num_outbound_streams = self
            .config
            .max_num_outbound_streams()
            .min(init_ack.num_inbound_streams);
        self.t1_init = None;
        self.nretransmits = 0;
        self.set_state(AssociationState::Established);
        self.events.push_back(Event::Connected);
    }

    fn can_receive_data(&self) -> bool {
        !matches!(
            self.state,
            AssociationState::Closed | AssociationState::InitSent
        )
    }

    fn queued_receive_bytes(&self) -> usize {
        self.streams.values().map(|s| s.reassembly.n_bytes()).sum()
    }

    fn handle_data(&mut self, d: ChunkPayloadData) {
        if !self.can_receive_data() {
            return;
        }
        self.ack_needed = true;

        let tsn = d.tsn;
        if sna32lte(tsn, self.peer_last_tsn) || self.received_ahead.contains(&tsn) {
            trace!("[{}] duplicate DATA tsn={}", self.name, tsn);
            self.duplicate_tsn.push(tsn);
            return;
        }

        let max_receive_buffer = self.config.max_receive_buffer_size() as usize;
        if self.queued_receive_bytes() + d.user_data.len() > max_receive_buffer {
            debug!("[{}] receive buffer full, dropping tsn={}", self.name, tsn);
            return;
        }

        if tsn == self.peer_last_tsn.wrapping_add(1) {
            self.peer_last_tsn = tsn;
            self.advance_peer_last_tsn();
        } else {
            let pos = self
                .received_ahead
                .iter()
                .position(|t| sna32gt(*t, tsn))
                .unwrap_or(self.received_ahead.len());
            self.received_ahead.insert(pos, tsn);
        }

        let stream_id = d.stream_identifier;
        self.accept_stream(stream_id, d.unordered);

        if let Some(s) = self.streams.get_mut(&stream_id) {
            if s.incoming_reset {
                debug!(
                    "[{}] DATA on reset stream {}, ignoring",
                    self.name, stream_id
                );
            } else {
                s.reassembly.push(d);
            }
        }
        self.deliver(stream_id);
        self.check_incoming_resets();
    }

    /// Creates the receive side of a stream the peer started using.
    fn accept_stream(&mut self, stream_id: u16, unordered: bool) {
        if !self.streams.contains_key(&stream_id) {
            debug!("[{}] peer opened stream {}", self.name, stream_id);
            self.streams.insert(
                stream_id,
                Stream::new(stream_id, unordered, ReliabilityType::Reliable, 0),
            );
            self.events.push_back(Event::StreamOpened(stream_id));
        }
    }

    /// Moves the cumulative received TSN over TSNs that arrived early.
    fn advance_peer_last_tsn(&mut self) {
        while let Some(pos) = self
            .received_ahead
            .iter()
            .position(|t| *t == self.peer_last_tsn.wrapping_add(1))
        {
            self.peer_last_tsn = self.received_ahead.remove(pos);
        }
        let peer_last_tsn = self.peer_last_tsn;
        self.received_ahead.retain(|t| sna32gt(*t, peer_last_tsn));
    }

    fn deliver(&mut self, stream_id: u16) {
        let Some(s) = self.streams.get_mut(&stream_id) else {
            return;
        };
        while let Some(m) = s.reassembly.read() {
            self.reads.push_back(StreamMessage {
                stream_id,
                ppi: m.ppi,
                payload: m.payload,
            });
        }
    }

    pub(super) fn create_selective_ack(&mut self) -> ChunkSelectiveAck {
        let mut gap_ack_blocks: Vec<GapAckBlock> = vec![];
        for tsn in &self.received_ahead {
            let offset = tsn.wrapping_sub(self.peer_last_tsn) as u16;
            match gap_ack_blocks.last_mut() {
                Some(last) if last.end.wrapping_add(1) == offset => last.end = offset,
                _ => gap_ack_blocks.push(GapAckBlock {
                    start: offset,
                    end: offset,
                }),
            }
        }

        let max_receive_buffer = self.config.max_receive_buffer_size() as usize;
        ChunkSelectiveAck {
            cumulative_tsn_ack: self.peer_last_tsn,
            advertised_receiver_window_credit: max_receive_buffer
                .saturating_sub(self.queued_receive_bytes())
                as u32,
            gap_ack_blocks,
            duplicate_tsn: mem::take(&mut self.duplicate_tsn),
        }
    }

    fn outstanding_bytes(&self) -> u32 {
        self.inflight
            .iter()
            .filter(|c| !c.acked && !c.abandoned)
            .map(|c| c.data.user_data.len() as u32)
            .sum()
    }

    fn handle_sack(&mut self, sack: ChunkSelectiveAck) {
        if !self.can_receive_data() {
            return;
        }
        let cum = sack.cumulative_tsn_ack;
        if sna32lt(cum, self.cumulative_tsn_ack_point) {
            debug!(
                "[{}] stale SACK cum_tsn={} (ack point {})",
                self.name, cum, self.cumulative_tsn_ack_point
            );
            return;
        }
        if sna32gte(cum, self.my_next_tsn) {
            warn!("[{}] SACK acknowledges unsent tsn={}", self.name, cum);
            return;
        }

        let now = self.now;
        let mut bytes_acked = 0u32;
        let mut rtt = None;
        let mut released: Vec<(u16, usize)> = vec![];
        let mut highest_newly_acked: Option<u32> = None;

        let mut ack = |c: &mut InflightChunk| {
            if c.acked {
                return;
            }
            c.acked = true;
            if c.abandoned {
                return;
            }
            let n = c.data.user_data.len();
            bytes_acked += n as u32;
            released.push((c.data.stream_identifier, n));
            // Karn's algorithm, only chunks sent exactly once give a sample
            if rtt.is_none()
                && c.nsent == 1
                && let Some(sent_at) = c.sent_at
            {
                rtt = Some(now.saturating_duration_since(sent_at));
            }
        };

        for c in self.inflight.iter_mut() {
            if sna32gt(c.data.tsn, cum) {
                break;
            }
            ack(c);
        }
        for g in &sack.gap_ack_blocks {
            let start = cum.wrapping_add(g.start as u32);
            let end = cum.wrapping_add(g.end as u32);
            for c in self.inflight.iter_mut() {
                let tsn = c.data.tsn;
                if sna32gte(tsn, start) && sna32lte(tsn, end) && !c.acked {
                    ack(c);
                    if highest_newly_acked.is_none_or(|h| sna32gt(tsn, h)) {
                        highest_newly_acked = Some(tsn);
                    }
                }
            }
        }

        while self
            .inflight
            .front()
            .is_some_and(|c| sna32lte(c.data.tsn, cum))
        {
            self.inflight.pop_front();
        }

        let cum_advanced = sna32gt(cum, self.cumulative_tsn_ack_point);
        self.cumulative_tsn_ack_point = cum;
        if sna32lt(self.advanced_peer_tsn_ack_point, cum) {
            self.advanced_peer_tsn_ack_point = cum;
        }

        if let Some(rtt) = rtt {
            let rto = self.rto_mgr.set_new_rtt(rtt);
            trace!("[{}] rtt={:?} rto={:?}", self.name, rtt, rto);
        }

        if cum_advanced && bytes_acked > 0 {
            self.on_cumulative_ack(bytes_acked);
        }
        if let Some(htna) = highest_newly_acked {
            self.update_miss_indicators(htna);
        }
        if self.in_fast_recovery && sna32gte(cum, self.fast_recover_exit_point) {
            debug!("[{}] exit fast recovery", self.name);
            self.in_fast_recovery = false;
        }

        self.rwnd = sack
            .advertised_receiver_window_credit
            .saturating_sub(self.outstanding_bytes());

        for (stream_id, n) in released {
            self.release_buffer(stream_id, n);
        }

        self.advance_peer_ack_point();
        if self.outstanding_bytes() == 0
            && self.advanced_peer_tsn_ack_point == self.cumulative_tsn_ack_point
        {
            self.t3_rtx = None;
        } else if cum_advanced {
            self.t3_rtx = Some(now + self.rto_mgr.rto());
        }

        self.try_send_shutdown();
    }

    /// Congestion window growth, RFC 4960 section 7.2.1 and 7.2.2.
    fn on_cumulative_ack(&mut self, bytes_acked: u32) {
        let mtu = self.config.mtu();
        if self.cwnd <= self.ssthresh {
            if !self.in_fast_recovery {
                self.cwnd += bytes_acked.min(mtu);
                trace!(
                    "[{}] slow start cwnd={} ssthresh={}",
                    self.name, self.cwnd, self.ssthresh
                );
            }
        } else {
            self.partial_bytes_acked += bytes_acked;
            if self.partial_bytes_acked >= self.cwnd {
                self.partial_bytes_acked -= self.cwnd;
                self.cwnd += mtu;
                trace!(
                    "[{}] congestion avoidance cwnd={} ssthresh={}",
                    self.name, self.cwnd, self.ssthresh
                );
            }
        }
    }

    /// Fast retransmit after three miss reports, RFC 4960 section 7.2.4.
    fn update_miss_indicators(&mut self, highest_newly_acked: u32) {
        let mut lost = vec![];
        for (i, c) in self.inflight.iter_mut().enumerate() {
            if !sna32lt(c.data.tsn, highest_newly_acked) {
                break;
            }
            if c.acked || c.abandoned || c.retransmit {
                continue;
            }
            c.miss_indicator += 1;
            if c.miss_indicator == 3 {
                lost.push(i);
            }
        }
        if lost.is_empty() {
            return;
        }

        if !self.in_fast_recovery {
            let mtu = self.config.mtu();
            self.in_fast_recovery = true;
            self.fast_recover_exit_point = self.my_next_tsn.wrapping_sub(1);
            self.ssthresh = (self.cwnd / 2).max(4 * mtu);
            self.cwnd = self.ssthresh;
            self.partial_bytes_acked = 0;
            debug!(
                "[{}] enter fast recovery cwnd={} exit_point={}",
                self.name, self.cwnd, self.fast_recover_exit_point
            );
        }

        for i in lost {
            if self.should_abandon(i) {
                self.abandon_message(i);
            } else if let Some(c) = self.inflight.get_mut(i) {
                c.retransmit = true;
            }
        }
    }

    fn release_buffer(&mut self, stream_id: u16, n_bytes: usize) {
        if let Some(s) = self.streams.get_mut(&stream_id)
            && s.on_buffer_released(n_bytes)
        {
            self.events.push_back(Event::BufferedAmountLow(stream_id));
        }
    }

    /// Partial reliability policy of the chunk at `i`, RFC 3758.
    fn should_abandon(&self, i: usize) -> bool {
        let Some(c) = self.inflight.get(i) else {
            return false;
        };
        let Some(s) = self.streams.get(&c.data.stream_identifier) else {
            return false;
        };
        match s.reliability_type {
            ReliabilityType::Reliable => false,
            ReliabilityType::Rexmit => c.nsent > s.reliability_value as usize,
            ReliabilityType::Timed => {
                self.now.saturating_duration_since(c.since)
                    >= Duration::from_millis(s.reliability_value as u64)
            }
        }
    }

    /// Abandons every fragment of the message the chunk at `i` belongs to,
    /// including fragments that were not assigned a TSN yet.
    fn abandon_message(&mut self, i: usize) {
        let mut start = i;
        while start > 0 && !self.inflight[start].data.beginning_fragment {
            start -= 1;
        }
        let mut end = i;
        while !self.inflight[end].data.ending_fragment && end + 1 < self.inflight.len() {
            end += 1;
        }
        let complete = self.inflight[end].data.ending_fragment;

        let mut released = vec![];
        for c in self.inflight.range_mut(start..=end) {
            if !c.acked && !c.abandoned {
                c.abandoned = true;
                c.retransmit = false;
                released.push((c.data.stream_identifier, c.data.user_data.len()));
            }
        }
        if !complete {
            while let Some(c) = self.pending.pop_front() {
                released.push((c.data.stream_identifier, c.data.user_data.len()));
                if c.data.ending_fragment {
                    break;
                }
            }
        }

        debug!(
            "[{}] abandoned message tsn={}..={}",
            self.name, self.inflight[start].data.tsn, self.inflight[end].data.tsn
        );
        for (stream_id, n) in released {
            self.release_buffer(stream_id, n);
        }
    }

    /// Moves the advanced peer ack point over abandoned chunks, RFC 3758
    /// section 3.5 C2, and schedules a FORWARD TSN when it moved.
    fn advance_peer_ack_point(&mut self) {
        let mut advanced = self.advanced_peer_tsn_ack_point;
        for c in &self.inflight {
            if sna32lte(c.data.tsn, advanced) {
                continue;
            }
            if c.data.tsn == advanced.wrapping_add(1) && c.abandoned {
                advanced = c.data.tsn;
            } else {
                break;
            }
        }
        if sna32gt(advanced, self.advanced_peer_tsn_ack_point) {
            self.advanced_peer_tsn_ack_point = advanced;
        }
        if sna32gt(self.advanced_peer_tsn_ack_point, self.cumulative_tsn_ack_point) {
            self.will_send_forward_tsn = true;
        }
    }

    fn create_forward_tsn(&self) -> ChunkForwardTsn {
        let mut streams: HashMap<u16, u16> = HashMap::new();
        for c in &self.inflight {
            if sna32gt(c.data.tsn, self.advanced_peer_tsn_ack_point) {
                break;
            }
            if c.abandoned && !c.data.unordered {
                let ssn = streams
                    .entry(c.data.stream_identifier)
                    .or_insert(c.data.stream_sequence_number);
                if sna16lt(*ssn, c.data.stream_sequence_number) {
                    *ssn = c.data.stream_sequence_number;
                }
            }
        }

        let mut streams: Vec<ChunkForwardTsnStream> = streams
            .into_iter()
            .map(|(identifier, sequence)| ChunkForwardTsnStream {
                identifier,
                sequence,
            })
            .collect();
        streams.sort_by_key(|s| s.identifier);

        ChunkForwardTsn {
            new_cumulative_tsn: self.advanced_peer_tsn_ack_point,
            streams,
        }
    }

    fn handle_forward_tsn(&mut self, fwd: ChunkForwardTsn) {
        if !self.can_receive_data() {
            return;
        }
        self.ack_needed = true;

        if sna32lte(fwd.new_cumulative_tsn, self.peer_last_tsn) {
            trace!("[{}] stale FORWARD TSN", self.name);
            return;
        }
        debug!(
            "[{}] FORWARD TSN moves cum_tsn {} -> {}",
            self.name, self.peer_last_tsn, fwd.new_cumulative_tsn
        );
        self.peer_last_tsn = fwd.new_cumulative_tsn;
        self.advance_peer_last_tsn();

        for fs in &fwd.streams {
            self.accept_stream(fs.identifier, false);
            if let Some(s) = self.streams.get_mut(&fs.identifier) {
                s.reassembly.forward_tsn_for_ordered(fs.sequence);
            }
        }
        let stream_ids: Vec<u16> = self.streams.keys().copied().collect();
        for stream_id in stream_ids {
            if let Some(s) = self.streams.get_mut(&stream_id) {
                s.reassembly
                    .forward_tsn_for_unordered(fwd.new_cumulative_tsn);
            }
            self.deliver(stream_id);
        }
        self.check_incoming_resets();
    }

    fn handle_reconfig(&mut self, reconfig: ChunkReconfig) {
        if !self.can_receive_data() {
            return;
        }
        for param in [reconfig.param_a, reconfig.param_b].into_iter().flatten() {
            match param {
                ReconfigParam::OutgoingResetRequest(req) => {
                    if let Some(response) = self.handle_outgoing_reset_request(req) {
                        self.control.push_back(Chunk::Reconfig(ChunkReconfig {
                            param_a: Some(ReconfigParam::Response(response)),
                            param_b: None,
                        }));
                    }
                }
                ReconfigParam::Response(response) => self.handle_reconfig_response(response),
            }
        }
    }

    /// The peer resets its outgoing streams, our incoming ones.
    fn handle_outgoing_reset_request(
        &mut self,
        req: OutgoingResetRequest,
    ) -> Option<ReconfigResponse> {
        let rsn = req.reconfig_request_sequence_number;
        if self.peer_last_rsn.is_some_and(|last| sna32lte(rsn, last)) {
            return Some(ReconfigResponse {
                reconfig_response_sequence_number: rsn,
                result: ReconfigResult::SuccessPerformed,
            });
        }

        if sna32gt(req.sender_last_tsn, self.peer_last_tsn) {
            // data up to sender_last_tsn still missing, RFC 6525 section 5.2.2
            if !self
                .incoming_reset_requests
                .iter()
                .any(|r| r.reconfig_request_sequence_number == rsn)
            {
                self.incoming_reset_requests.push(req);
            }
            return Some(ReconfigResponse {
                reconfig_response_sequence_number: rsn,
                result: ReconfigResult::InProgress,
            });
        }

        self.peer_last_rsn = Some(rsn);
        for stream_id in req.stream_identifiers {
            self.reset_incoming(stream_id);
        }
        Some(ReconfigResponse {
            reconfig_response_sequence_number: rsn,
            result: ReconfigResult::SuccessPerformed,
        })
    }

    fn check_incoming_resets(&mut self) {
        let peer_last_tsn = self.peer_last_tsn;
        let (ready, waiting): (Vec<_>, Vec<_>) = mem::take(&mut self.incoming_reset_requests)
            .into_iter()
            .partition(|r| sna32lte(r.sender_last_tsn, peer_last_tsn));
        self.incoming_reset_requests = waiting;

        for req in ready {
            if let Some(response) = self.handle_outgoing_reset_request(req) {
                self.control.push_back(Chunk::Reconfig(ChunkReconfig {
                    param_a: Some(ReconfigParam::Response(response)),
                    param_b: None,
                }));
            }
        }
    }

    fn reset_incoming(&mut self, stream_id: u16) {
        let Some(s) = self.streams.get_mut(&stream_id) else {
            debug!("[{}] reset of unknown stream {}", self.name, stream_id);
            return;
        };
        if s.incoming_reset {
            return;
        }
        s.reassembly.reset();
        s.incoming_reset = true;
        if s.outgoing == ResetState::Open {
            s.outgoing = ResetState::Pending;
        }
        debug!("[{}] incoming stream {} reset", self.name, stream_id);
        self.events.push_back(Event::StreamClosing(stream_id));
        self.check_stream_closed(stream_id);
    }

    fn handle_reconfig_response(&mut self, response: ReconfigResponse) {
        let rsn = response.reconfig_response_sequence_number;
        if response.result == ReconfigResult::InProgress {
            trace!("[{}] reset request {} in progress", self.name, rsn);
            return;
        }
        let Some(req) = self.reconfig_requests.remove(&rsn) else {
            return;
        };
        if response.result != ReconfigResult::SuccessPerformed
            && response.result != ReconfigResult::SuccessNop
        {
            warn!(
                "[{}] reset request {} failed: {}",
                self.name, rsn, response.result
            );
        }

        for stream_id in req.stream_identifiers {
            if let Some(s) = self.streams.get_mut(&stream_id) {
                s.outgoing = ResetState::Done;
                s.next_ssn = 0;
            }
            self.check_stream_closed(stream_id);
        }
        if self.reconfig_requests.is_empty() {
            self.t_reconfig = None;
        }
    }

    fn check_stream_closed(&mut self, stream_id: u16) {
        if self.streams.get(&stream_id).is_some_and(|s| s.is_closed()) {
            self.streams.remove(&stream_id);
            debug!("[{}] stream {} closed", self.name, stream_id);
            self.events.push_back(Event::StreamClosed(stream_id));
        }
    }

    /// Sends outgoing reset requests for closing streams whose messages all
    /// have a TSN, so `sender_last_tsn` covers them.
    pub(super) fn send_pending_resets(&mut self) {
        if !self.is_established() {
            return;
        }
        let mut closing: Vec<u16> = self
            .streams
            .values()
            .filter(|s| s.outgoing == ResetState::Pending)
            .map(|s| s.stream_id)
            .filter(|id| !self.pending.iter().any(|c| c.data.stream_identifier == *id))
            .collect();
        if closing.is_empty() {
            return;
        }
        closing.sort_unstable();

        let rsn = self.my_next_rsn;
        self.my_next_rsn = self.my_next_rsn.wrapping_add(1);
        for stream_id in &closing {
            if let Some(s) = self.streams.get_mut(stream_id) {
                s.outgoing = ResetState::Requested(rsn);
            }
        }

        let req = OutgoingResetRequest {
            reconfig_request_sequence_number: rsn,
            reconfig_response_sequence_number: self.peer_last_rsn.unwrap_or(0),
            sender_last_tsn: self.my_next_tsn.wrapping_sub(1),
            stream_identifiers: closing,
        };
        debug!(
            "[{}] sending reset request {} for streams {:?}",
            self.name, rsn, req.stream_identifiers
        );
        self.control.push_back(Chunk::Reconfig(ChunkReconfig {
            param_a: Some(ReconfigParam::OutgoingResetRequest(req.clone())),
            param_b: None,
        }));
        self.reconfig_requests.insert(rsn, req);
        if self.t_reconfig.is_none() {
            self.t_reconfig = Some(self.now + self.rto_mgr.rto());
        }
    }

    fn handle_shutdown(&mut self, shutdown: ChunkShutdown) {
        match self.state {
            AssociationState::Established
            | AssociationState::ShutdownPending
            | AssociationState::ShutdownReceived => {
                let a_rwnd = self.rwnd.saturating_add(self.outstanding_bytes());
                self.handle_sack(ChunkSelectiveAck {
                    cumulative_tsn_ack: shutdown.cumulative_tsn_ack,
                    advertised_receiver_window_credit: a_rwnd,
                    ..Default::default()
                });
                self.set_state(AssociationState::ShutdownReceived);
                self.try_send_shutdown();
            }
            AssociationState::ShutdownSent => {
                // both sides shut down at once, RFC 4960 section 9.2
                self.control.push_back(Chunk::ShutdownAck);
                self.set_state(AssociationState::ShutdownAckSent);
                self.t2_shutdown = Some(self.now + self.rto_mgr.rto());
            }
            _ => {}
        }
    }

    fn handle_shutdown_ack(&mut self) {
        if matches!(
            self.state,
            AssociationState::ShutdownSent | AssociationState::ShutdownAckSent
        ) {
            self.transmit_packet(self.peer_verification_tag, vec![Chunk::ShutdownComplete]);
            self.teardown();
            self.events.push_back(Event::Closed);
        }
    }

    fn handle_shutdown_complete(&mut self) {
        if self.state == AssociationState::ShutdownAckSent {
            self.teardown();
            self.events.push_back(Event::Closed);
        }
    }

    fn handle_abort(&mut self, abort: ChunkAbort) {
        warn!("[{}] aborted by peer: {}", self.name, abort.reason);
        self.teardown();
        self.events
            .push_back(Event::Lost(Error::ErrAssociationAborted(abort.reason)));
    }

    /// Queues SHUTDOWN or SHUTDOWN ACK once nothing is left to send.
    pub(super) fn try_send_shutdown(&mut self) {
        if !self.pending.is_empty() || !self.inflight.is_empty() {
            return;
        }
        match self.state {
            AssociationState::ShutdownPending => {
                self.control.push_back(Chunk::Shutdown(ChunkShutdown {
                    cumulative_tsn_ack: self.peer_last_tsn,
                }));
                self.set_state(AssociationState::ShutdownSent);
            }
            AssociationState::ShutdownReceived => {
                self.control.push_back(Chunk::ShutdownAck);
                self.set_state(AssociationState::ShutdownAckSent);
            }
            _ => return,
        }
        self.nretransmits = 0;
        self.t2_shutdown = Some(self.now + self.rto_mgr.rto());
    }

    fn gather_data_chunks(&mut self) -> Vec<Chunk> {
        if !matches!(
            self.state,
            AssociationState::Established
                | AssociationState::ShutdownPending
                | AssociationState::ShutdownReceived
        ) {
            return vec![];
        }

        let now = self.now;
        let cwnd = self.cwnd;
        let mut chunks = vec![];

        let mut retransmitted = 0u32;
        for c in self.inflight.iter_mut() {
            if !c.retransmit || c.acked || c.abandoned {
                continue;
            }
            let n = c.data.user_data.len() as u32;
            if retransmitted > 0 && retransmitted + n > cwnd {
                break;
            }
            retransmitted += n;
            c.retransmit = false;
            c.nsent += 1;
            c.sent_at = Some(now);
            chunks.push(Chunk::PayloadData(c.data.clone()));
        }

        while let Some(front) = self.pending.front() {
            let n = front.data.user_data.len() as u32;
            let outstanding = self.outstanding_bytes();
            if outstanding >= self.cwnd {
                break;
            }
            // a single chunk may probe a closed window, RFC 4960 section 6.1 A
            if n > self.rwnd && outstanding > 0 {
                break;
            }
            let Some(mut c) = self.pending.pop_front() else {
                break;
            };
            c.data.tsn = self.my_next_tsn;
            self.my_next_tsn = self.my_next_tsn.wrapping_add(1);
            c.nsent = 1;
            c.sent_at = Some(now);
            self.rwnd = self.rwnd.saturating_sub(n);
            chunks.push(Chunk::PayloadData(c.data.clone()));
            self.inflight.push_back(c);
        }

        if !chunks.is_empty() && self.t3_rtx.is_none() {
            self.t3_rtx = Some(now + self.rto_mgr.rto());
        }
        chunks
    }

    /// Bundles queued control chunks and DATA into packets of at most one MTU.
    pub(super) fn flush(&mut self) {
        if self.peer_verification_tag == 0 || self.state == AssociationState::Closed {
            self.control.clear();
            return;
        }

        self.send_pending_resets();

        let mut chunks: Vec<Chunk> = self.control.drain(..).collect();
        if mem::take(&mut self.will_send_forward_tsn) {
            chunks.push(Chunk::ForwardTsn(self.create_forward_tsn()));
            if self.t3_rtx.is_none() {
                self.t3_rtx = Some(self.now + self.rto_mgr.rto());
            }
        }
        chunks.extend(self.gather_data_chunks());

        let mtu = self.config.mtu() as usize;
        let mut bundle = vec![];
        let mut size = COMMON_HEADER_SIZE;
        for chunk in chunks {
            let n = chunk.marshal_size();
            if !bundle.is_empty() && size + n > mtu {
                self.transmit_packet(self.peer_verification_tag, mem::take(&mut bundle));
                size = COMMON_HEADER_SIZE;
            }
            size += n;
            bundle.push(chunk);
        }
        if !bundle.is_empty() {
            self.transmit_packet(self.peer_verification_tag, bundle);
        }
    }

    pub(super) fn on_t1_init_timeout(&mut self) {
        self.nretransmits += 1;
        if self.nretransmits > self.config.timer_config().max_init_retransmits {
            warn!("[{}] INIT retransmissions exhausted", self.name);
            self.teardown();
            self.events.push_back(Event::Lost(Error::ErrHandshakeTimeout));
            return;
        }
        let rto = self.rto_mgr.back_off();
        debug!(
            "[{}] T1-init timeout, resending INIT (rto={:?})",
            self.name, rto
        );
        self.send_init();
        self.t1_init = Some(self.now + rto);
    }

    pub(super) fn on_t2_shutdown_timeout(&mut self) {
        self.nretransmits += 1;
        if self.nretransmits > self.config.timer_config().max_init_retransmits {
            warn!("[{}] SHUTDOWN retransmissions exhausted", self.name);
            self.teardown();
            self.events.push_back(Event::Closed);
            return;
        }
        let rto = self.rto_mgr.back_off();
        let chunk = match self.state {
            AssociationState::ShutdownSent => Chunk::Shutdown(ChunkShutdown {
                cumulative_tsn_ack: self.peer_last_tsn,
            }),
            AssociationState::ShutdownAckSent => Chunk::ShutdownAck,
            _ => {
                self.t2_shutdown = None;
                return;
            }
        };
        debug!("[{}] T2-shutdown timeout, resending {}", self.name, chunk);
        self.control.push_back(chunk);
        self.t2_shutdown = Some(self.now + rto);
        self.flush();
    }

    pub(super) fn on_t3_rtx_timeout(&mut self) {
        self.t3_rtx = None;
        let rto = self.rto_mgr.back_off();
        let mtu = self.config.mtu();
        self.ssthresh = (self.cwnd / 2).max(4 * mtu);
        self.cwnd = mtu;
        self.partial_bytes_acked = 0;
        self.in_fast_recovery = false;
        debug!(
            "[{}] T3-rtx timeout rto={:?} cwnd={} ssthresh={}",
            self.name, rto, self.cwnd, self.ssthresh
        );

        let max_data_retransmits = self.config.timer_config().max_data_retransmits;
        for i in 0..self.inflight.len() {
            let c = &self.inflight[i];
            if c.acked || c.abandoned || c.nsent == 0 {
                continue;
            }
            if self.should_abandon(i) {
                self.abandon_message(i);
                continue;
            }
            if max_data_retransmits.is_some_and(|max| c.nsent > max) {
                warn!(
                    "[{}] DATA tsn={} retransmissions exhausted",
                    self.name, c.data.tsn
                );
                self.abort("too many retransmissions");
                self.events
                    .push_back(Event::Lost(Error::ErrAssociationAborted(
                        "too many retransmissions".to_owned(),
                    )));
                return;
            }
            self.inflight[i].retransmit = true;
        }

        self.advance_peer_ack_point();
        self.flush();
    }

    pub(super) fn on_reconfig_timeout(&mut self) {
        if self.reconfig_requests.is_empty() {
            self.t_reconfig = None;
            return;
        }
        let mut requests: Vec<OutgoingResetRequest> =
            self.reconfig_requests.values().cloned().collect();
        requests.sort_by_key(|r| r.reconfig_request_sequence_number);
        for req in requests {
            debug!(
                "[{}] resending reset request {}",
                self.name, req.reconfig_request_sequence_number
            );
            self.control.push_back(Chunk::Reconfig(ChunkReconfig {
                param_a: Some(ReconfigParam::OutgoingResetRequest(req)),
                param_b: None,
            }));
        }
        self.t_reconfig = Some(self.now + self.rto_mgr.rto());
        self.flush();
    }
}
