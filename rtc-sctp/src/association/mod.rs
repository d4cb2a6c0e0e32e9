
mod association_internal;
mod rtx_timer;

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use log::{debug, info, trace};
use shared::TaggedBytesMut;
use shared::error::{Error, Result};

use crate::chunk::Chunk;
use crate::chunk::chunk_abort::ChunkAbort;
use crate::chunk::chunk_init::ChunkInit;
use crate::chunk::chunk_payload_data::{ChunkPayloadData, InflightChunk};
use crate::chunk::chunk_reconfig::OutgoingResetRequest;
use crate::config::TransportConfig;
use crate::packet::Packet;
use crate::stream::{ReliabilityType, ResetState, Stream, StreamMessage};
use rtx_timer::RtoManager;

/// association state enums
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum AssociationState {
    #[default]
    Closed,
    /// INIT sent, waiting for INIT ACK
    InitSent,
    Established,
    ShutdownPending,
    ShutdownSent,
    ShutdownReceived,
    ShutdownAckSent,
}

impl fmt::Display for AssociationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            AssociationState::Closed => "Closed",
            AssociationState::InitSent => "InitSent",
            AssociationState::Established => "Established",
            AssociationState::ShutdownPending => "ShutdownPending",
            AssociationState::ShutdownSent => "ShutdownSent",
            AssociationState::ShutdownReceived => "ShutdownReceived",
            AssociationState::ShutdownAckSent => "ShutdownAckSent",
        };
        write!(f, "{s}")
    }
}

/// Notifications raised by the association, polled with `poll_event`.
#[derive(Debug, PartialEq)]
pub enum Event {
    /// The INIT/INIT ACK exchange completed.
    Connected,
    /// The peer sent data on a stream this side did not open.
    StreamOpened(u16),
    /// The peer reset its outgoing half of the stream.
    StreamClosing(u16),
    /// Both halves of the stream have been reset.
    StreamClosed(u16),
    BufferedAmountLow(u16),
    /// Graceful shutdown completed.
    Closed,
    /// The association was aborted by the peer or gave up retransmitting.
    Lost(Error),
}

/// Association represents an SCTP association
///
/// The association completes with a two way INIT / INIT ACK exchange and
/// performs no I/O. Packets to send are returned by `poll_write`, user
/// messages by `poll_read`.
pub struct Association {
    config: TransportConfig,
    is_client: bool,
    state: AssociationState,
    now: Instant,
    name: String,

    my_verification_tag: u32,
    peer_verification_tag: u32,
    num_outbound_streams: u16,

    // handshake and shutdown
    t1_init: Option<Instant>,
    t2_shutdown: Option<Instant>,
    nretransmits: usize,

    // sending
    my_next_tsn: u32,
    cumulative_tsn_ack_point: u32,
    advanced_peer_tsn_ack_point: u32,
    pending: VecDeque<InflightChunk>,
    inflight: VecDeque<InflightChunk>,
    rwnd: u32,
    cwnd: u32,
    ssthresh: u32,
    partial_bytes_acked: u32,
    in_fast_recovery: bool,
    fast_recover_exit_point: u32,
    will_send_forward_tsn: bool,
    rto_mgr: RtoManager,
    t3_rtx: Option<Instant>,

    // receiving
    peer_last_tsn: u32,
    received_ahead: Vec<u32>,
    duplicate_tsn: Vec<u32>,
    ack_needed: bool,

    // stream reset
    streams: HashMap<u16, Stream>,
    my_next_rsn: u32,
    peer_last_rsn: Option<u32>,
    reconfig_requests: HashMap<u32, OutgoingResetRequest>,
    incoming_reset_requests: Vec<OutgoingResetRequest>,
    t_reconfig: Option<Instant>,

    control: VecDeque<Chunk>,
    reads: VecDeque<StreamMessage>,
    transmits: VecDeque<BytesMut>,
    events: VecDeque<Event>,

    bytes_sent: usize,
    bytes_received: usize,
}

impl fmt::Debug for Association {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt.debug_struct("Association")
            .field("name", &self.name)
            .field("state", &self.state)
            .field("my_next_tsn", &self.my_next_tsn)
            .field("peer_last_tsn", &self.peer_last_tsn)
            .field("inflight", &self.inflight.len())
            .field("pending", &self.pending.len())
            .field("streams", &self.streams.len())
            .finish()
    }
}

impl Association {
    fn new(config: TransportConfig, is_client: bool, now: Instant) -> Self {
        let my_verification_tag = random_nonzero();
        let my_next_tsn = rand::random::<u32>();
        let mtu = config.mtu();
        let rto_mgr = RtoManager::new(&config.timer_config());
        let name = if is_client { "client" } else { "server" }.to_owned();

        Association {
            is_client,
            state: AssociationState::Closed,
            now,
            name,

            my_verification_tag,
            peer_verification_tag: 0,
            num_outbound_streams: config.max_num_outbound_streams(),

            t1_init: None,
            t2_shutdown: None,
            nretransmits: 0,

            my_next_tsn,
            cumulative_tsn_ack_point: my_next_tsn.wrapping_sub(1),
            advanced_peer_tsn_ack_point: my_next_tsn.wrapping_sub(1),
            pending: VecDeque::new(),
            inflight: VecDeque::new(),
            rwnd: 0,
            // RFC 4960 section 7.2.1
            cwnd: (4 * mtu).min(4380.max(2 * mtu)),
            ssthresh: 0,
            partial_bytes_acked: 0,
            in_fast_recovery: false,
            fast_recover_exit_point: 0,
            will_send_forward_tsn: false,
            rto_mgr,
            t3_rtx: None,

            peer_last_tsn: 0,
            received_ahead: vec![],
            duplicate_tsn: vec![],
            ack_needed: false,

            streams: HashMap::new(),
            my_next_rsn: my_next_tsn,
            peer_last_rsn: None,
            reconfig_requests: HashMap::new(),
            incoming_reset_requests: vec![],
            t_reconfig: None,

            control: VecDeque::new(),
            reads: VecDeque::new(),
            transmits: VecDeque::new(),
            events: VecDeque::new(),

            bytes_sent: 0,
            bytes_received: 0,

            config,
        }
    }

    /// Creates the initiating side and queues the INIT chunk.
    pub fn client(config: TransportConfig, now: Instant) -> Self {
        let mut a = Association::new(config, true, now);
        a.set_state(AssociationState::InitSent);
        a.send_init();
        a.t1_init = Some(now + a.rto_mgr.rto());
        a
    }

    /// Creates the accepting side, which waits for an INIT.
    pub fn server(config: TransportConfig, now: Instant) -> Self {
        Association::new(config, false, now)
    }

    pub fn state(&self) -> AssociationState {
        self.state
    }

    pub fn is_client(&self) -> bool {
        self.is_client
    }

    pub fn is_established(&self) -> bool {
        self.state == AssociationState::Established
    }

    /// Current retransmission timeout.
    pub fn rto(&self) -> Duration {
        self.rto_mgr.rto()
    }

    /// Smoothed round trip time, once measured.
    pub fn srtt(&self) -> Option<Duration> {
        self.rto_mgr.srtt()
    }

    pub fn cwnd(&self) -> u32 {
        self.cwnd
    }

    /// Receiver window last advertised by the peer minus outstanding bytes.
    pub fn rwnd(&self) -> u32 {
        self.rwnd
    }

    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    pub fn bytes_received(&self) -> usize {
        self.bytes_received
    }

    pub fn max_message_size(&self) -> u32 {
        self.config.max_message_size()
    }

    /// Opens a stream for sending. Streams opened by the peer are created
    /// on the first DATA chunk and announced with `Event::StreamOpened`.
    pub fn open_stream(
        &mut self,
        stream_id: u16,
        unordered: bool,
        reliability_type: ReliabilityType,
        reliability_value: u32,
    ) -> Result<()> {
        if self.streams.contains_key(&stream_id) {
            return Err(Error::ErrStreamAlreadyExist);
        }
        self.streams.insert(
            stream_id,
            Stream::new(stream_id, unordered, reliability_type, reliability_value),
        );
        Ok(())
    }

    /// Updates the delivery mode of an existing stream, creating it if needed.
    pub fn set_reliability_params(
        &mut self,
        stream_id: u16,
        unordered: bool,
        reliability_type: ReliabilityType,
        reliability_value: u32,
    ) {
        let s = self.streams.entry(stream_id).or_insert_with(|| {
            Stream::new(stream_id, unordered, reliability_type, reliability_value)
        });
        s.unordered = unordered;
        s.reliability_type = reliability_type;
        s.reliability_value = reliability_value;
    }

    pub fn has_stream(&self, stream_id: u16) -> bool {
        self.streams.contains_key(&stream_id)
    }

    /// Bytes queued on the stream that the peer has not acknowledged yet.
    pub fn buffered_amount(&self, stream_id: u16) -> usize {
        self.streams.get(&stream_id).map_or(0, |s| s.buffered_amount)
    }

    pub fn buffered_amount_low_threshold(&self, stream_id: u16) -> usize {
        self.streams.get(&stream_id).map_or(0, |s| s.buffered_amount_low)
    }

    pub fn set_buffered_amount_low_threshold(&mut self, stream_id: u16, threshold: usize) {
        if let Some(s) = self.streams.get_mut(&stream_id) {
            s.buffered_amount_low = threshold;
        }
    }

    /// Resets the outgoing half of the stream once its queued data has been
    /// acknowledged, RFC 6525. The peer answers by resetting its own half.
    pub fn close_stream(&mut self, stream_id: u16) -> Result<()> {
        let Some(s) = self.streams.get_mut(&stream_id) else {
            return Err(Error::ErrStreamNotExisted);
        };
        if s.outgoing != ResetState::Open {
            return Ok(());
        }
        debug!("[{}] closing stream {}", self.name, stream_id);
        s.outgoing = ResetState::Pending;
        self.send_pending_resets();
        self.flush();
        Ok(())
    }

    /// Queues a user message on its stream.
    pub fn write(&mut self, msg: StreamMessage) -> Result<()> {
        match self.state {
            AssociationState::Established => {}
            AssociationState::Closed if self.peer_verification_tag != 0 => {
                return Err(Error::ErrAssociationClosed);
            }
            AssociationState::Closed | AssociationState::InitSent => {
                return Err(Error::ErrAssociationNotEstablished);
            }
            _ => return Err(Error::ErrAssociationClosed),
        }
        if msg.payload.len() > self.config.max_message_size() as usize {
            return Err(Error::ErrOutboundPacketTooLarge);
        }
        if msg.payload.is_empty() {
            return Err(Error::ErrPayloadDataEmpty);
        }
        if msg.stream_id >= self.num_outbound_streams {
            return Err(Error::ErrStreamNotExisted);
        }

        let stream = self.streams.entry(msg.stream_id).or_insert_with(|| {
            Stream::new(msg.stream_id, false, ReliabilityType::Reliable, 0)
        });
        if !stream.is_writable() {
            return Err(Error::ErrStreamClosed);
        }

        let payload = msg.payload.freeze();
        let max_payload_size = self.config.max_payload_size() as usize;
        let ssn = stream.next_ssn;
        if !stream.unordered {
            stream.next_ssn = stream.next_ssn.wrapping_add(1);
        }
        stream.buffered_amount += payload.len();

        let mut offset = 0;
        while offset < payload.len() {
            let end = (offset + max_payload_size).min(payload.len());
            let chunk = ChunkPayloadData {
                unordered: stream.unordered,
                beginning_fragment: offset == 0,
                ending_fragment: end == payload.len(),
                immediate_sack: false,
                tsn: 0,
                stream_identifier: msg.stream_id,
                stream_sequence_number: ssn,
                payload_type: msg.ppi,
                user_data: payload.slice(offset..end),
            };
            self.pending.push_back(InflightChunk::new(chunk, self.now));
            offset = end;
        }

        self.flush();
        Ok(())
    }

    /// Starts a graceful SHUTDOWN once all queued data is acknowledged.
    pub fn shutdown(&mut self) -> Result<()> {
        match self.state {
            AssociationState::Established => {
                self.set_state(AssociationState::ShutdownPending);
                self.try_send_shutdown();
                self.flush();
            }
            AssociationState::InitSent => {
                self.t1_init = None;
                self.set_state(AssociationState::Closed);
            }
            _ => {}
        }
        Ok(())
    }

    /// Sends an ABORT and tears the association down immediately.
    pub fn abort(&mut self, reason: &str) {
        if self.state == AssociationState::Closed {
            return;
        }
        if self.peer_verification_tag != 0 {
            self.control.push_back(Chunk::Abort(ChunkAbort {
                reason: reason.to_owned(),
            }));
            self.flush();
        }
        self.teardown();
    }

    fn set_state(&mut self, state: AssociationState) {
        if self.state != state {
            info!(
                "[{}] state change: '{}' => '{}'",
                self.name, self.state, state
            );
            self.state = state;
        }
    }

    fn send_init(&mut self) {
        let init = ChunkInit {
            is_ack: false,
            initiate_tag: self.my_verification_tag,
            advertised_receiver_window_credit: self.config.max_receive_buffer_size(),
            num_outbound_streams: self.config.max_num_outbound_streams(),
            num_inbound_streams: self.config.max_num_inbound_streams(),
            initial_tsn: self.my_next_tsn,
        };
        // INIT always travels with a zero verification tag
        self.transmit_packet(0, vec![Chunk::Init(init)]);
    }

    /// Drops every timer and queue; no further packets are produced.
    fn teardown(&mut self) {
        self.set_state(AssociationState::Closed);
        self.t1_init = None;
        self.t2_shutdown = None;
        self.t3_rtx = None;
        self.t_reconfig = None;
        self.pending.clear();
        self.inflight.clear();
        self.control.clear();
    }

    fn transmit_packet(&mut self, verification_tag: u32, chunks: Vec<Chunk>) {
        let packet = Packet {
            source_port: self.config.sctp_port(),
            destination_port: self.config.sctp_port(),
            verification_tag,
            chunks,
        };
        trace!("[{}] sending {}", self.name, packet);
        let raw = packet.marshal();
        self.bytes_sent += raw.len();
        self.transmits.push_back(raw);
    }

    fn earliest_timeout(&self) -> Option<Instant> {
        [self.t1_init, self.t2_shutdown, self.t3_rtx, self.t_reconfig]
            .into_iter()
            .flatten()
            .min()
    }
}

impl sansio::Protocol<TaggedBytesMut, StreamMessage, ()> for Association {
    type Rout = StreamMessage;
    type Wout = BytesMut;
    type Eout = Event;
    type Error = Error;
    type Time = Instant;

    /// Consumes one association packet received on the transport.
    fn handle_read(&mut self, msg: TaggedBytesMut) -> std::result::Result<(), Self::Error> {
        if msg.now > self.now {
            self.now = msg.now;
        }
        self.bytes_received += msg.message.len();

        let packet = Packet::unmarshal(&msg.message.freeze())?;
        self.handle_packet(packet)
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        self.reads.pop_front()
    }

    fn handle_write(&mut self, msg: StreamMessage) -> std::result::Result<(), Self::Error> {
        self.write(msg)
    }

    fn poll_write(&mut self) -> Option<Self::Wout> {
        self.transmits.pop_front()
    }

    fn handle_event(&mut self, _evt: ()) -> std::result::Result<(), Self::Error> {
        Ok(())
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        self.events.pop_front()
    }

    fn handle_timeout(&mut self, now: Self::Time) -> std::result::Result<(), Self::Error> {
        if now > self.now {
            self.now = now;
        }

        if self.t1_init.is_some_and(|t| now >= t) {
            self.on_t1_init_timeout();
        }
        if self.t2_shutdown.is_some_and(|t| now >= t) {
            self.on_t2_shutdown_timeout();
        }
        if self.t3_rtx.is_some_and(|t| now >= t) {
            self.on_t3_rtx_timeout();
        }
        if self.t_reconfig.is_some_and(|t| now >= t) {
            self.on_reconfig_timeout();
        }

        Ok(())
    }

    fn poll_timeout(&mut self) -> Option<Self::Time> {
        self.earliest_timeout()
    }

    fn close(&mut self) -> std::result::Result<(), Self::Error> {
        self.shutdown()
    }
}

fn random_nonzero() -> u32 {
    loop {
        let v = rand::random::<u32>();
        if v != 0 {
            return v;
        }
    }
}
