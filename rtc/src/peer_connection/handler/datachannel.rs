use crate::data_channel::RTCDataChannelId;
use crate::data_channel::internal::RTCDataChannelInternal;
use crate::data_channel::message::RTCDataChannelMessage;
use crate::data_channel::state::RTCDataChannelState;
use crate::peer_connection::event::RTCEventInternal;
use crate::peer_connection::event::RTCPeerConnectionEvent;
use crate::peer_connection::event::data_channel_event::RTCDataChannelEvent;
use crate::peer_connection::message::internal::{
    ApplicationMessage, RTCMessageInternal, SCTPMessage, TaggedRTCMessageInternal,
};
use crate::statistics::accumulator::RTCStatsAccumulator;
use datachannel::{DataChannel, DataChannelEvent, DataChannelMessage, StreamEvent};
use log::{debug, info, warn};
use sctp::PayloadProtocolIdentifier;
use shared::TransportContext;
use shared::error::{Error, Result};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// Stream 65535 is reserved
const MAX_STREAM_ID: u16 = u16::MAX - 1;

pub(crate) struct DataChannelHandlerContext {
    next_data_channel_id: RTCDataChannelId,
    /// Set while the association is up, true if this side initiated it.
    pub(crate) is_client: Option<bool>,
    pub(crate) high_water_mark: usize,

    pub(crate) read_outs: VecDeque<TaggedRTCMessageInternal>,
    pub(crate) write_outs: VecDeque<TaggedRTCMessageInternal>,
    pub(crate) event_outs: VecDeque<RTCEventInternal>,
}

impl DataChannelHandlerContext {
    pub(crate) fn new(high_water_mark: usize) -> Self {
        Self {
            next_data_channel_id: 0,
            is_client: None,
            high_water_mark,

            read_outs: VecDeque::new(),
            write_outs: VecDeque::new(),
            event_outs: VecDeque::new(),
        }
    }

    pub(crate) fn allocate_data_channel_id(&mut self) -> RTCDataChannelId {
        let id = self.next_data_channel_id;
        self.next_data_channel_id += 1;
        id
    }

    fn push_write(&mut self, message: RTCMessageInternal) {
        self.write_outs.push_back(TaggedRTCMessageInternal {
            now: Instant::now(),
            transport: TransportContext::default(),
            message,
        });
    }

    fn push_event(&mut self, event: RTCDataChannelEvent) {
        self.event_outs
            .push_back(RTCEventInternal::RTCPeerConnectionEvent(
                RTCPeerConnectionEvent::OnDataChannel(event),
            ));
    }
}

/// DataChannelHandler runs DCEP and the per-channel state machines on top
/// of the association streams.
pub(crate) struct DataChannelHandler<'a> {
    ctx: &'a mut DataChannelHandlerContext,
    data_channels: &'a mut HashMap<RTCDataChannelId, RTCDataChannelInternal>,
    stats: &'a mut RTCStatsAccumulator,
}

impl<'a> DataChannelHandler<'a> {
    pub(crate) fn new(
        ctx: &'a mut DataChannelHandlerContext,
        data_channels: &'a mut HashMap<RTCDataChannelId, RTCDataChannelInternal>,
        stats: &'a mut RTCStatsAccumulator,
    ) -> Self {
        DataChannelHandler {
            ctx,
            data_channels,
            stats,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        "DataChannelHandler"
    }

    /// The live channel carried by `stream_id`
    fn find_by_stream(&self, stream_id: u16) -> Option<RTCDataChannelId> {
        self.data_channels
            .values()
            .find(|dc| {
                dc.stream_id == Some(stream_id)
                    && dc.data_channel.is_some()
                    && dc.ready_state != RTCDataChannelState::Closed
            })
            .map(|dc| dc.id)
    }

    fn stream_in_use(&self, stream_id: u16) -> bool {
        self.data_channels.values().any(|dc| {
            dc.stream_id == Some(stream_id) && dc.ready_state != RTCDataChannelState::Closed
        })
    }

    /// Picks the lowest free stream id of our parity: even for the side that
    /// initiated the association, odd for the other.
    fn generate_stream_id(&self, is_client: bool) -> Result<u16> {
        let mut stream_id: u16 = if is_client { 0 } else { 1 };
        while stream_id <= MAX_STREAM_ID {
            if !self.stream_in_use(stream_id) {
                return Ok(stream_id);
            }
            stream_id = match stream_id.checked_add(2) {
                Some(next) => next,
                None => break,
            };
        }
        Err(Error::ErrMaxDataChannelId)
    }

    /// Opens every channel still waiting for the association. A channel that
    /// cannot be opened is closed.
    pub(crate) fn dial_pending(&mut self) -> Result<()> {
        let Some(is_client) = self.ctx.is_client else {
            return Ok(());
        };

        let mut pending: Vec<RTCDataChannelId> = self
            .data_channels
            .values()
            .filter(|dc| {
                dc.ready_state == RTCDataChannelState::Connecting && dc.data_channel.is_none()
            })
            .map(|dc| dc.id)
            .collect();
        pending.sort_unstable();

        for id in pending {
            if let Err(err) = self.dial(id, is_client) {
                warn!("failed to open data channel {id}: {err}");
                if let Some(dc) = self.data_channels.get_mut(&id)
                    && dc.force_closed()
                {
                    self.ctx.push_event(RTCDataChannelEvent::OnClose(id));
                }
            }
        }
        Ok(())
    }

    fn dial(&mut self, id: RTCDataChannelId, is_client: bool) -> Result<()> {
        let negotiated_stream_id = self
            .data_channels
            .get(&id)
            .ok_or(Error::ErrDataChannelClosed)?
            .stream_id;
        let stream_id = match negotiated_stream_id {
            Some(stream_id) => stream_id,
            None => self.generate_stream_id(is_client)?,
        };

        let dc = self
            .data_channels
            .get_mut(&id)
            .ok_or(Error::ErrDataChannelClosed)?;
        let config = dc.config()?;
        let (unordered, reliability_type) = DataChannel::get_reliability_params(config.channel_type);
        dc.dial(stream_id)?;
        debug!("dial data channel {id} '{}' on stream {stream_id}", dc.label);

        self.ctx
            .push_write(RTCMessageInternal::Sctp(SCTPMessage::OpenStream {
                stream_id,
                unordered,
                reliability_type,
                reliability_value: config.reliability_parameter,
            }));
        self.drain_data_channel(id);
        Ok(())
    }

    /// Creates the channel announced by a DATA_CHANNEL_OPEN of the peer.
    fn accept(&mut self, message: DataChannelMessage) -> Result<()> {
        let stream_id = message.stream_id;
        let id = self.ctx.allocate_data_channel_id();
        let dc = RTCDataChannelInternal::accept(
            id,
            stream_id,
            message.ppi,
            &message.payload,
            self.ctx.high_water_mark,
        )?;
        info!(
            "accepted data channel {id} '{}' on stream {stream_id}",
            dc.label
        );

        let config = dc.config()?;
        let (unordered, reliability_type) = DataChannel::get_reliability_params(config.channel_type);
        self.data_channels.insert(id, dc);
        self.stats.peer_connection.on_data_channel_accepted();

        // our half of the stream follows the reliability the peer asked for
        self.ctx
            .push_write(RTCMessageInternal::Sctp(SCTPMessage::OpenStream {
                stream_id,
                unordered,
                reliability_type,
                reliability_value: config.reliability_parameter,
            }));
        self.ctx.push_event(RTCDataChannelEvent::OnDataChannel(id));
        self.drain_data_channel(id);
        Ok(())
    }

    fn feed_stream_event(&mut self, stream_id: u16, evt: StreamEvent) -> Result<()> {
        let Some(id) = self.find_by_stream(stream_id) else {
            debug!("stream event {evt:?} for unknown stream {stream_id}");
            return Ok(());
        };
        if let Some(data_channel) = self
            .data_channels
            .get_mut(&id)
            .and_then(|dc| dc.data_channel.as_mut())
        {
            sansio::Protocol::handle_event(data_channel, evt)?;
        }
        self.drain_data_channel(id);
        Ok(())
    }

    /// Moves the reads, writes and events of one channel into the handler
    /// queues.
    fn drain_data_channel(&mut self, id: RTCDataChannelId) {
        let Some(dc) = self.data_channels.get_mut(&id) else {
            return;
        };
        let Some(data_channel) = dc.data_channel.as_mut() else {
            return;
        };

        while let Some(message) = sansio::Protocol::poll_read(data_channel) {
            self.ctx.read_outs.push_back(TaggedRTCMessageInternal {
                now: Instant::now(),
                transport: TransportContext::default(),
                message: RTCMessageInternal::DataChannel(ApplicationMessage {
                    data_channel_id: id,
                    message: RTCDataChannelMessage {
                        is_string: message.is_string(),
                        data: message.payload,
                    },
                }),
            });
        }

        while let Some(message) = sansio::Protocol::poll_write(data_channel) {
            self.ctx.write_outs.push_back(TaggedRTCMessageInternal {
                now: Instant::now(),
                transport: TransportContext::default(),
                message: RTCMessageInternal::Sctp(SCTPMessage::Stream(message)),
            });
        }

        while let Some(evt) = sansio::Protocol::poll_event(data_channel) {
            let event = match evt {
                DataChannelEvent::Open => {
                    dc.ready_state = RTCDataChannelState::Open;
                    self.stats.peer_connection.on_data_channel_opened();
                    RTCDataChannelEvent::OnOpen(id)
                }
                DataChannelEvent::BufferedAmountLow => RTCDataChannelEvent::OnBufferedAmountLow(id),
                DataChannelEvent::Closing => {
                    dc.ready_state = RTCDataChannelState::Closing;
                    RTCDataChannelEvent::OnClosing(id)
                }
                DataChannelEvent::Closed => {
                    if dc.ready_state == RTCDataChannelState::Closed {
                        continue;
                    }
                    dc.ready_state = RTCDataChannelState::Closed;
                    self.stats.peer_connection.on_data_channel_closed();
                    RTCDataChannelEvent::OnClose(id)
                }
            };
            self.ctx.push_event(event);
        }
    }

    /// The association went away, no channel can make progress.
    fn close_all(&mut self) {
        self.ctx.is_client = None;

        let mut ids: Vec<RTCDataChannelId> = self.data_channels.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            let Some(dc) = self.data_channels.get_mut(&id) else {
                continue;
            };
            let was_open = matches!(
                dc.ready_state,
                RTCDataChannelState::Open | RTCDataChannelState::Closing
            );
            if dc.force_closed() {
                if was_open {
                    self.stats.peer_connection.on_data_channel_closed();
                }
                self.ctx.push_event(RTCDataChannelEvent::OnClose(id));
            }
        }
    }
}

impl<'a> sansio::Protocol<TaggedRTCMessageInternal, TaggedRTCMessageInternal, RTCEventInternal>
    for DataChannelHandler<'a>
{
    type Rout = TaggedRTCMessageInternal;
    type Wout = TaggedRTCMessageInternal;
    type Eout = RTCEventInternal;
    type Error = Error;
    type Time = Instant;

    fn handle_read(&mut self, msg: TaggedRTCMessageInternal) -> Result<()> {
        if let RTCMessageInternal::Sctp(SCTPMessage::Stream(message)) = msg.message {
            let stream_id = message.stream_id;
            match self.find_by_stream(stream_id) {
                Some(id) => {
                    if let Some(data_channel) = self
                        .data_channels
                        .get_mut(&id)
                        .and_then(|dc| dc.data_channel.as_mut())
                    {
                        sansio::Protocol::handle_read(data_channel, message)?;
                    }
                    self.drain_data_channel(id);
                }
                None if message.ppi == PayloadProtocolIdentifier::Dcep => {
                    self.accept(message)?;
                }
                None => {
                    warn!(
                        "drop {} bytes on stream {stream_id} without data channel",
                        message.payload.len()
                    );
                }
            }
        } else {
            // Bypass
            self.ctx.read_outs.push_back(msg);
        }
        Ok(())
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        self.ctx.read_outs.pop_front()
    }

    fn handle_write(&mut self, msg: TaggedRTCMessageInternal) -> Result<()> {
        if let RTCMessageInternal::DataChannel(message) = msg.message {
            let id = message.data_channel_id;
            self.data_channels
                .get_mut(&id)
                .ok_or(Error::ErrDataChannelClosed)?
                .send(message.message.is_string, message.message.data)?;
            self.drain_data_channel(id);
        } else {
            // Bypass
            self.ctx.write_outs.push_back(msg);
        }
        Ok(())
    }

    fn poll_write(&mut self) -> Option<Self::Wout> {
        for dc in self.data_channels.values_mut() {
            if let Some(data_channel) = dc.data_channel.as_mut() {
                while let Some(message) = sansio::Protocol::poll_write(data_channel) {
                    self.ctx.write_outs.push_back(TaggedRTCMessageInternal {
                        now: Instant::now(),
                        transport: TransportContext::default(),
                        message: RTCMessageInternal::Sctp(SCTPMessage::Stream(message)),
                    });
                }
            }
        }

        self.ctx.write_outs.pop_front()
    }

    fn handle_event(&mut self, evt: RTCEventInternal) -> Result<()> {
        match evt {
            RTCEventInternal::SCTPConnected(is_client) => {
                self.ctx.is_client = Some(is_client);
                self.dial_pending()?;
                self.ctx.event_outs.push_back(evt);
            }
            RTCEventInternal::SCTPBufferedAmount(stream_id, amount) => {
                self.feed_stream_event(stream_id, StreamEvent::BufferedAmount(amount))?;
            }
            RTCEventInternal::SCTPStreamClosing(stream_id) => {
                self.feed_stream_event(stream_id, StreamEvent::Closing)?;
            }
            RTCEventInternal::SCTPStreamClosed(stream_id) => {
                self.feed_stream_event(stream_id, StreamEvent::Closed)?;
            }
            RTCEventInternal::SCTPClosed => {
                self.close_all();
                self.ctx.event_outs.push_back(evt);
            }
            _ => {
                self.ctx.event_outs.push_back(evt);
            }
        }
        Ok(())
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        self.ctx.event_outs.pop_front()
    }

    fn handle_timeout(&mut self, _now: Instant) -> Result<()> {
        Ok(())
    }

    fn poll_timeout(&mut self) -> Option<Instant> {
        None
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
