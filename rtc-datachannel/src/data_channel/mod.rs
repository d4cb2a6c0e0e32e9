#[cfg(test)]
mod data_channel_test;

use crate::message::{message_channel_ack::*, message_channel_open::*, message_type::*, *};
use bytes::{Buf, BytesMut};
use log::{debug, warn};
use sctp::{PayloadProtocolIdentifier, ReliabilityType, StreamMessage};
use shared::error::{Error, Result};
use shared::marshal::*;
use std::collections::VecDeque;
use std::fmt;

/// Default upper bound on bytes queued but not yet acknowledged by the peer.
pub const DEFAULT_HIGH_WATER_MARK: usize = 16 * 1024 * 1024;

/// DataChannelConfig is used to configure the data channel.
#[derive(Eq, PartialEq, Default, Clone, Debug)]
pub struct DataChannelConfig {
    pub channel_type: ChannelType,
    pub negotiated: bool,
    pub priority: u16,
    pub reliability_parameter: u32,
    pub label: String,
    pub protocol: String,
}

impl DataChannelConfig {
    /// Returns (unordered, reliability type, reliability value) for the association stream.
    pub fn reliability_params(&self) -> (bool, ReliabilityType, u32) {
        let (unordered, reliability_type) = DataChannel::get_reliability_params(self.channel_type);
        (unordered, reliability_type, self.reliability_parameter)
    }
}

/// DataChannelMessage is used to data sent over SCTP
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DataChannelMessage {
    pub stream_id: u16,
    pub ppi: PayloadProtocolIdentifier,
    pub payload: BytesMut,
}

impl DataChannelMessage {
    pub fn is_string(&self) -> bool {
        matches!(
            self.ppi,
            PayloadProtocolIdentifier::String | PayloadProtocolIdentifier::StringEmpty
        )
    }
}

impl From<StreamMessage> for DataChannelMessage {
    fn from(m: StreamMessage) -> Self {
        Self {
            stream_id: m.stream_id,
            ppi: m.ppi,
            payload: m.payload,
        }
    }
}

impl From<DataChannelMessage> for StreamMessage {
    fn from(m: DataChannelMessage) -> Self {
        Self {
            stream_id: m.stream_id,
            ppi: m.ppi,
            payload: m.payload,
        }
    }
}

/// Lifecycle of a data channel. Closed is terminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum DataChannelState {
    #[default]
    Connecting,
    Open,
    Closing,
    Closed,
}

impl fmt::Display for DataChannelState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            DataChannelState::Connecting => "connecting",
            DataChannelState::Open => "open",
            DataChannelState::Closing => "closing",
            DataChannelState::Closed => "closed",
        };
        write!(f, "{s}")
    }
}

/// Notifications raised by a data channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DataChannelEvent {
    Open,
    BufferedAmountLow,
    Closing,
    Closed,
}

/// Stream level facts reported by the association carrying the channel.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Bytes written on the stream and not yet acknowledged.
    BufferedAmount(usize),
    /// The peer reset its outgoing half of the stream.
    Closing,
    /// Both halves of the stream were reset.
    Closed,
}

/// DataChannel represents a data channel
#[derive(Debug, Default, Clone)]
pub struct DataChannel {
    config: DataChannelConfig,
    stream_id: u16,
    state: DataChannelState,

    buffered_amount: usize,
    buffered_amount_low_threshold: usize,
    /// (bytes on the wire, is padding) per message the association still holds
    unacked: VecDeque<(usize, bool)>,
    unacked_bytes: usize,
    high_water_mark: usize,

    read_outs: VecDeque<DataChannelMessage>,
    write_outs: VecDeque<DataChannelMessage>,
    event_outs: VecDeque<DataChannelEvent>,

    // stats
    messages_sent: usize,
    messages_received: usize,
    bytes_sent: usize,
    bytes_received: usize,
}

impl DataChannel {
    fn new(config: DataChannelConfig, stream_id: u16) -> Self {
        Self {
            config,
            stream_id,
            high_water_mark: DEFAULT_HIGH_WATER_MARK,
            ..Default::default()
        }
    }

    /// Dial opens a data channels over SCTP
    pub fn dial(config: DataChannelConfig, stream_id: u16) -> Result<Self> {
        let mut data_channel = DataChannel::new(config.clone(), stream_id);

        if config.negotiated {
            data_channel.set_open();
        } else {
            let msg = Message::DataChannelOpen(DataChannelOpen {
                channel_type: config.channel_type,
                priority: config.priority,
                reliability_parameter: config.reliability_parameter,
                label: config.label.bytes().collect(),
                protocol: config.protocol.bytes().collect(),
            })
            .marshal()?;

            data_channel.write_outs.push_back(DataChannelMessage {
                stream_id,
                ppi: PayloadProtocolIdentifier::Dcep,
                payload: msg,
            });
        }

        Ok(data_channel)
    }

    /// Accept is used to accept incoming data channels over SCTP
    pub fn accept(
        mut config: DataChannelConfig,
        stream_id: u16,
        ppi: PayloadProtocolIdentifier,
        buf: &[u8],
    ) -> Result<Self> {
        if ppi != PayloadProtocolIdentifier::Dcep {
            return Err(Error::InvalidPayloadProtocolIdentifier(ppi.to_u32()));
        }

        let mut read_buf = buf;
        let msg = Message::unmarshal(&mut read_buf)?;

        if let Message::DataChannelOpen(dco) = msg {
            config.channel_type = dco.channel_type;
            config.priority = dco.priority;
            config.reliability_parameter = dco.reliability_parameter;
            config.label = String::from_utf8(dco.label)?;
            config.protocol = String::from_utf8(dco.protocol)?;
        } else {
            return Err(Error::InvalidMessageType(MESSAGE_TYPE_ACK));
        };

        let mut data_channel = DataChannel::new(config, stream_id);

        data_channel.write_data_channel_ack()?;
        data_channel.set_open();

        Ok(data_channel)
    }

    /// MessagesSent returns the number of messages sent
    pub fn messages_sent(&self) -> usize {
        self.messages_sent
    }

    /// MessagesReceived returns the number of messages received
    pub fn messages_received(&self) -> usize {
        self.messages_received
    }

    /// BytesSent returns the number of bytes sent
    pub fn bytes_sent(&self) -> usize {
        self.bytes_sent
    }

    /// BytesReceived returns the number of bytes received
    pub fn bytes_received(&self) -> usize {
        self.bytes_received
    }

    /// StreamIdentifier returns the Stream identifier associated to the stream.
    pub fn stream_identifier(&self) -> u16 {
        self.stream_id
    }

    pub fn config(&self) -> &DataChannelConfig {
        &self.config
    }

    pub fn state(&self) -> DataChannelState {
        self.state
    }

    /// BufferedAmount returns the number of bytes of data currently queued to be
    /// sent over this stream.
    pub fn buffered_amount(&self) -> usize {
        self.buffered_amount
    }

    /// BufferedAmountLowThreshold returns the number of bytes of buffered outgoing
    /// data that is considered "low." Defaults to 0.
    pub fn buffered_amount_low_threshold(&self) -> usize {
        self.buffered_amount_low_threshold
    }

    /// SetBufferedAmountLowThreshold is used to update the threshold.
    /// See BufferedAmountLowThreshold().
    pub fn set_buffered_amount_low_threshold(&mut self, threshold: usize) {
        self.buffered_amount_low_threshold = threshold;
    }

    pub fn high_water_mark(&self) -> usize {
        self.high_water_mark
    }

    /// Sets the buffered amount above which writes fail with ErrBufferFull.
    pub fn set_high_water_mark(&mut self, high_water_mark: usize) {
        self.high_water_mark = high_water_mark;
    }

    /// Queues a user message, choosing the PPI from `is_string` and the payload length.
    pub fn send(&mut self, is_string: bool, data: BytesMut) -> Result<()> {
        let msg = DataChannel::get_data_channel_message(is_string, data);
        sansio::Protocol::handle_write(self, msg)
    }

    fn set_open(&mut self) {
        if self.state == DataChannelState::Connecting {
            self.state = DataChannelState::Open;
            self.event_outs.push_back(DataChannelEvent::Open);
        }
    }

    fn set_closed(&mut self) {
        if self.state != DataChannelState::Closed {
            self.state = DataChannelState::Closed;
            self.write_outs.clear();
            self.unacked.clear();
            self.unacked_bytes = 0;
            self.event_outs.push_back(DataChannelEvent::Closed);
        }
    }

    fn handle_dcep<B>(&mut self, data: &mut B) -> Result<()>
    where
        B: Buf,
    {
        let msg = Message::unmarshal(data)?;

        match msg {
            Message::DataChannelOpen(_) => {
                // accept() consumes the first OPEN, a repeat only needs another ACK
                debug!("Received DATA_CHANNEL_OPEN on stream {}", self.stream_id);
                self.write_data_channel_ack()?;
            }
            Message::DataChannelAck(_) => {
                debug!("Received DATA_CHANNEL_ACK on stream {}", self.stream_id);
                self.set_open();
            }
        };

        Ok(())
    }

    fn write_data_channel_ack(&mut self) -> Result<()> {
        let ack = Message::DataChannelAck(DataChannelAck).marshal()?;
        self.write_outs.push_back(DataChannelMessage {
            stream_id: self.stream_id,
            ppi: PayloadProtocolIdentifier::Dcep,
            payload: ack,
        });
        Ok(())
    }

    /// Reconciles with the association's count, which includes the zero byte
    /// sent for each empty message. Messages drain in queue order.
    fn on_buffered_amount(&mut self, amount: usize) {
        let mut drained = self.unacked_bytes.saturating_sub(amount);
        while drained > 0 {
            let Some(front) = self.unacked.front_mut() else {
                break;
            };
            let n = front.0.min(drained);
            front.0 -= n;
            drained -= n;
            self.unacked_bytes -= n;
            if front.0 == 0 {
                self.unacked.pop_front();
            }
        }
        let padding = self.unacked.iter().filter(|(_, padding)| *padding).count();

        let previous = self.buffered_amount;
        let amount = amount.saturating_sub(padding);
        self.buffered_amount = amount;
        if previous > self.buffered_amount_low_threshold
            && amount <= self.buffered_amount_low_threshold
        {
            self.event_outs.push_back(DataChannelEvent::BufferedAmountLow);
        }
    }

    pub fn get_reliability_params(channel_type: ChannelType) -> (bool, ReliabilityType) {
        match channel_type {
            ChannelType::Reliable => (false, ReliabilityType::Reliable),
            ChannelType::ReliableUnordered => (true, ReliabilityType::Reliable),
            ChannelType::PartialReliableRexmit => (false, ReliabilityType::Rexmit),
            ChannelType::PartialReliableRexmitUnordered => (true, ReliabilityType::Rexmit),
            ChannelType::PartialReliableTimed => (false, ReliabilityType::Timed),
            ChannelType::PartialReliableTimedUnordered => (true, ReliabilityType::Timed),
        }
    }

    /// Maps the W3C channel options onto a DCEP channel type and reliability parameter.
    /// At most one of `max_retransmits` and `max_packet_life_time` may be set.
    pub fn get_channel_type_and_reliability_parameter(
        ordered: bool,
        max_retransmits: Option<u16>,
        max_packet_life_time: Option<u16>,
    ) -> Result<(ChannelType, u32)> {
        let (channel_type, reliability_parameter) = match (max_retransmits, max_packet_life_time)
        {
            (Some(_), Some(_)) => return Err(Error::ErrRetransmitsOrPacketLifeTime),
            (None, None) => {
                if ordered {
                    (ChannelType::Reliable, 0)
                } else {
                    (ChannelType::ReliableUnordered, 0)
                }
            }
            (Some(max_retransmits), None) => {
                if ordered {
                    (ChannelType::PartialReliableRexmit, max_retransmits as u32)
                } else {
                    (
                        ChannelType::PartialReliableRexmitUnordered,
                        max_retransmits as u32,
                    )
                }
            }
            (None, Some(max_packet_lifetime)) => {
                if ordered {
                    (ChannelType::PartialReliableTimed, max_packet_lifetime as u32)
                } else {
                    (
                        ChannelType::PartialReliableTimedUnordered,
                        max_packet_lifetime as u32,
                    )
                }
            }
        };

        Ok((channel_type, reliability_parameter))
    }

    pub fn get_data_channel_message(is_string: bool, data: BytesMut) -> DataChannelMessage {
        // https://www.rfc-editor.org/rfc/rfc8831#section-6.6
        // SCTP does not support the sending of empty user messages.  Therefore,
        // if an empty message has to be sent, the appropriate PPID (WebRTC
        // String Empty or WebRTC Binary Empty) is used and the SCTP user
        // message of one zero byte is sent.  When receiving an SCTP user
        // message with one of these PPIDs, the receiver MUST ignore the SCTP
        // user message and process it as an empty message.
        let ppi = match (is_string, data.len()) {
            (false, 0) => PayloadProtocolIdentifier::BinaryEmpty,
            (false, _) => PayloadProtocolIdentifier::Binary,
            (true, 0) => PayloadProtocolIdentifier::StringEmpty,
            (true, _) => PayloadProtocolIdentifier::String,
        };

        if data.is_empty() {
            DataChannelMessage {
                ppi,
                payload: BytesMut::from(&[0][..]),
                ..Default::default()
            }
        } else {
            DataChannelMessage {
                ppi,
                payload: data,
                ..Default::default()
            }
        }
    }
}

fn is_empty_ppi(ppi: PayloadProtocolIdentifier) -> bool {
    matches!(
        ppi,
        PayloadProtocolIdentifier::StringEmpty | PayloadProtocolIdentifier::BinaryEmpty
    )
}

impl sansio::Protocol<DataChannelMessage, DataChannelMessage, StreamEvent> for DataChannel {
    type Rout = DataChannelMessage;
    type Wout = DataChannelMessage;
    type Eout = DataChannelEvent;
    type Error = Error;
    type Time = ();

    /// Handles a message delivered on the channel's stream. DCEP messages are
    /// consumed, user messages are queued for poll_read.
    fn handle_read(&mut self, mut msg: DataChannelMessage) -> Result<()> {
        if msg.ppi == PayloadProtocolIdentifier::Dcep {
            let mut data_buf = &msg.payload[..];
            return self.handle_dcep(&mut data_buf);
        }

        if self.state == DataChannelState::Closed {
            debug!("dropping message for closed data channel {}", self.stream_id);
            return Ok(());
        }

        // the peer may send before its ACK reaches us
        self.set_open();

        if is_empty_ppi(msg.ppi) {
            msg.payload.clear();
        }
        self.messages_received += 1;
        self.bytes_received += msg.payload.len();

        msg.stream_id = self.stream_id;
        self.read_outs.push_back(msg);
        Ok(())
    }

    fn poll_read(&mut self) -> Option<DataChannelMessage> {
        self.read_outs.pop_front()
    }

    /// Queues a user message. Fails without queueing when the channel is not
    /// open or when the buffered amount would pass the high-water mark.
    fn handle_write(&mut self, mut msg: DataChannelMessage) -> Result<()> {
        match self.state {
            DataChannelState::Open => {}
            DataChannelState::Connecting => return Err(Error::ErrDataChannelNotOpen),
            DataChannelState::Closing | DataChannelState::Closed => {
                return Err(Error::ErrDataChannelClosed);
            }
        }

        let wire_len = msg.payload.len();
        let padding = is_empty_ppi(msg.ppi);
        let len = if padding { 0 } else { wire_len };
        if self.buffered_amount + len > self.high_water_mark {
            warn!(
                "data channel {} buffer full: {} + {} > {}",
                self.stream_id, self.buffered_amount, len, self.high_water_mark
            );
            return Err(Error::ErrBufferFull);
        }

        self.messages_sent += 1;
        self.bytes_sent += len;
        self.buffered_amount += len;
        self.unacked.push_back((wire_len, padding));
        self.unacked_bytes += wire_len;

        msg.stream_id = self.stream_id;
        self.write_outs.push_back(msg);

        Ok(())
    }

    /// Returns messages to hand to the association
    fn poll_write(&mut self) -> Option<DataChannelMessage> {
        self.write_outs.pop_front()
    }

    fn handle_event(&mut self, evt: StreamEvent) -> Result<()> {
        match evt {
            StreamEvent::BufferedAmount(amount) => self.on_buffered_amount(amount),
            StreamEvent::Closing => {
                if matches!(
                    self.state,
                    DataChannelState::Connecting | DataChannelState::Open
                ) {
                    self.state = DataChannelState::Closing;
                    self.event_outs.push_back(DataChannelEvent::Closing);
                }
            }
            StreamEvent::Closed => self.set_closed(),
        }
        Ok(())
    }

    fn poll_event(&mut self) -> Option<DataChannelEvent> {
        self.event_outs.pop_front()
    }

    /// Close starts closing the DataChannel. The owner resets the outgoing
    /// stream and reports StreamEvent::Closed once both halves are reset.
    fn close(&mut self) -> Result<()> {
        // https://www.rfc-editor.org/rfc/rfc8831#section-6.7
        // Closing of a data channel MUST be signaled by resetting the
        // corresponding outgoing streams [RFC6525].  This means that if one
        // side decides to close the data channel, it resets the corresponding
        // outgoing stream.  When the peer sees that an incoming stream was
        // reset, it also resets its corresponding outgoing stream.  Once this
        // is completed, the data channel is closed.
        if matches!(
            self.state,
            DataChannelState::Connecting | DataChannelState::Open
        ) {
            self.state = DataChannelState::Closing;
        }
        Ok(())
    }
}
