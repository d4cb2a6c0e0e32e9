use crate::peer_connection::event::RTCEventInternal;
use crate::peer_connection::message::internal::{
    RTCMessageInternal, SCTPMessage, TaggedRTCMessageInternal,
};
use crate::peer_connection::state::ice_connection_state::RTCIceConnectionState;
use datachannel::DataChannelMessage;
use log::{debug, info, warn};
use sctp::{Association, Event, ReliabilityType, TransportConfig};
use shared::error::{Error, Result};
use shared::{TransportContext, TransportMessage};
use std::collections::{HashMap, VecDeque};
use std::time::Instant;

/// Parameters of the association a remote description asked for. The
/// association is created once ICE is connected.
#[derive(Debug, Clone)]
pub(crate) struct SctpStartParams {
    pub(crate) is_client: bool,
    pub(crate) config: TransportConfig,
}

#[derive(Default)]
pub(crate) struct SctpHandlerContext {
    pub(crate) association: Option<Association>,
    pub(crate) start_params: Option<SctpStartParams>,
    ice_connected: bool,
    /// Last buffered amount reported per stream
    buffered_amounts: HashMap<u16, usize>,
    last_now: Option<Instant>,

    pub(crate) read_outs: VecDeque<TaggedRTCMessageInternal>,
    pub(crate) write_outs: VecDeque<TaggedRTCMessageInternal>,
    pub(crate) event_outs: VecDeque<RTCEventInternal>,
}

impl SctpHandlerContext {
    /// Requests an association. Later requests are ignored: the association
    /// survives renegotiation and ICE restarts.
    pub(crate) fn start(&mut self, is_client: bool, config: TransportConfig) {
        if self.start_params.is_some() {
            return;
        }
        debug!(
            "sctp association requested as {}",
            if is_client { "client" } else { "server" }
        );
        self.start_params = Some(SctpStartParams { is_client, config });
    }

    pub(crate) fn is_established(&self) -> bool {
        self.association
            .as_ref()
            .is_some_and(|association| association.is_established())
    }

    fn now(&self) -> Instant {
        self.last_now.unwrap_or_else(Instant::now)
    }

    fn try_create_association(&mut self, now: Instant) {
        if self.association.is_some() {
            return;
        }
        let Some(params) = self.start_params.as_ref() else {
            return;
        };

        info!(
            "creating sctp association as {}",
            if params.is_client { "client" } else { "server" }
        );
        let association = if params.is_client {
            Association::client(params.config.clone(), now)
        } else {
            Association::server(params.config.clone(), now)
        };
        self.association = Some(association);
    }

    /// Moves everything the association produced into the handler queues.
    fn drain(&mut self) {
        let now = self.now();
        let Some(association) = self.association.as_mut() else {
            return;
        };

        while let Some(message) = sansio::Protocol::poll_read(association) {
            self.read_outs.push_back(TaggedRTCMessageInternal {
                now,
                transport: TransportContext::default(),
                message: RTCMessageInternal::Sctp(SCTPMessage::Stream(DataChannelMessage::from(
                    message,
                ))),
            });
        }

        while let Some(packet) = sansio::Protocol::poll_write(association) {
            self.write_outs.push_back(TaggedRTCMessageInternal {
                now,
                transport: TransportContext::default(),
                message: RTCMessageInternal::Sctp(SCTPMessage::Raw(packet)),
            });
        }

        let mut closed = false;
        while let Some(evt) = sansio::Protocol::poll_event(association) {
            match evt {
                Event::Connected => {
                    info!("sctp association established");
                    self.event_outs
                        .push_back(RTCEventInternal::SCTPConnected(association.is_client()));
                }
                Event::StreamOpened(stream_id) => {
                    debug!("sctp stream {stream_id} opened by remote");
                    self.buffered_amounts.entry(stream_id).or_insert(0);
                }
                Event::StreamClosing(stream_id) => {
                    self.event_outs
                        .push_back(RTCEventInternal::SCTPStreamClosing(stream_id));
                }
                Event::StreamClosed(stream_id) => {
                    self.buffered_amounts.remove(&stream_id);
                    self.event_outs
                        .push_back(RTCEventInternal::SCTPStreamClosed(stream_id));
                }
                Event::BufferedAmountLow(_) => {}
                Event::Closed => {
                    info!("sctp association closed");
                    closed = true;
                }
                Event::Lost(err) => {
                    warn!("sctp association lost: {err}");
                    closed = true;
                }
            }
        }

        for (stream_id, reported) in self.buffered_amounts.iter_mut() {
            let amount = association.buffered_amount(*stream_id);
            if amount != *reported {
                *reported = amount;
                self.event_outs
                    .push_back(RTCEventInternal::SCTPBufferedAmount(*stream_id, amount));
            }
        }

        if closed {
            self.association = None;
            self.buffered_amounts.clear();
            self.event_outs.push_back(RTCEventInternal::SCTPClosed);
        }
    }
}

/// SctpHandler runs the association carrying the data channels.
pub(crate) struct SctpHandler<'a> {
    ctx: &'a mut SctpHandlerContext,
}

impl<'a> SctpHandler<'a> {
    pub(crate) fn new(ctx: &'a mut SctpHandlerContext) -> Self {
        SctpHandler { ctx }
    }

    pub(crate) fn name(&self) -> &'static str {
        "SctpHandler"
    }

    fn association(&mut self) -> Result<&mut Association> {
        self.ctx
            .association
            .as_mut()
            .ok_or(Error::ErrAssociationNotEstablished)
    }

    fn open_stream(
        &mut self,
        stream_id: u16,
        unordered: bool,
        reliability_type: ReliabilityType,
        reliability_value: u32,
    ) -> Result<()> {
        let association = self.association()?;
        if association.has_stream(stream_id) {
            association.set_reliability_params(
                stream_id,
                unordered,
                reliability_type,
                reliability_value,
            );
        } else {
            association.open_stream(stream_id, unordered, reliability_type, reliability_value)?;
        }
        self.ctx.buffered_amounts.entry(stream_id).or_insert(0);
        Ok(())
    }
}

impl<'a> sansio::Protocol<TaggedRTCMessageInternal, TaggedRTCMessageInternal, RTCEventInternal>
    for SctpHandler<'a>
{
    type Rout = TaggedRTCMessageInternal;
    type Wout = TaggedRTCMessageInternal;
    type Eout = RTCEventInternal;
    type Error = Error;
    type Time = Instant;

    fn handle_read(&mut self, msg: TaggedRTCMessageInternal) -> Result<()> {
        if let RTCMessageInternal::Sctp(SCTPMessage::Raw(message)) = msg.message {
            self.ctx.last_now = Some(msg.now);
            // packets only arrive over a working path, the peer may be faster
            // to notice than our ICE agent
            self.ctx.try_create_association(msg.now);

            let Some(association) = self.ctx.association.as_mut() else {
                debug!(
                    "drop sctp packet from {:?} without association",
                    msg.transport.peer_addr
                );
                return Ok(());
            };
            let result = sansio::Protocol::handle_read(
                association,
                TransportMessage {
                    now: msg.now,
                    transport: msg.transport,
                    message,
                },
            );
            self.ctx.drain();
            result
        } else {
            // Bypass
            self.ctx.read_outs.push_back(msg);
            Ok(())
        }
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        self.ctx.read_outs.pop_front()
    }

    fn handle_write(&mut self, msg: TaggedRTCMessageInternal) -> Result<()> {
        let result = match msg.message {
            RTCMessageInternal::Sctp(SCTPMessage::Stream(message)) => {
                let stream_id = message.stream_id;
                let result = self
                    .association()
                    .and_then(|association| association.write(message.into()));
                if result.is_ok() {
                    self.ctx.buffered_amounts.entry(stream_id).or_insert(0);
                }
                result
            }
            RTCMessageInternal::Sctp(SCTPMessage::OpenStream {
                stream_id,
                unordered,
                reliability_type,
                reliability_value,
            }) => self.open_stream(stream_id, unordered, reliability_type, reliability_value),
            RTCMessageInternal::Sctp(SCTPMessage::CloseStream(stream_id)) => {
                debug!("reset sctp stream {stream_id}");
                self.association()
                    .and_then(|association| association.close_stream(stream_id))
            }
            message => {
                // Bypass
                self.ctx.write_outs.push_back(TaggedRTCMessageInternal {
                    now: msg.now,
                    transport: msg.transport,
                    message,
                });
                return Ok(());
            }
        };
        self.ctx.drain();
        result
    }

    fn poll_write(&mut self) -> Option<Self::Wout> {
        self.ctx.drain();
        self.ctx.write_outs.pop_front()
    }

    fn handle_event(&mut self, evt: RTCEventInternal) -> Result<()> {
        if let RTCEventInternal::ICEConnectionStateChange(state) = &evt {
            self.ctx.ice_connected = matches!(
                state,
                RTCIceConnectionState::Connected | RTCIceConnectionState::Completed
            );
            if self.ctx.ice_connected {
                let now = self.ctx.now();
                self.ctx.try_create_association(now);
                self.ctx.drain();
            }
        }
        self.ctx.event_outs.push_back(evt);
        Ok(())
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        self.ctx.drain();
        self.ctx.event_outs.pop_front()
    }

    fn handle_timeout(&mut self, now: Instant) -> Result<()> {
        self.ctx.last_now = Some(now);
        if self.ctx.ice_connected {
            self.ctx.try_create_association(now);
        }
        if let Some(association) = self.ctx.association.as_mut() {
            sansio::Protocol::handle_timeout(association, now)?;
        }
        self.ctx.drain();
        Ok(())
    }

    fn poll_timeout(&mut self) -> Option<Instant> {
        self.ctx
            .association
            .as_mut()
            .and_then(sansio::Protocol::poll_timeout)
    }

    /// Aborts the association so the peer learns about the close at once.
    fn close(&mut self) -> Result<()> {
        if let Some(mut association) = self.ctx.association.take() {
            association.abort("peer connection closed");
            while let Some(packet) = sansio::Protocol::poll_write(&mut association) {
                self.ctx.write_outs.push_back(TaggedRTCMessageInternal {
                    now: self.ctx.now(),
                    transport: TransportContext::default(),
                    message: RTCMessageInternal::Sctp(SCTPMessage::Raw(packet)),
                });
            }
        }
        self.ctx.start_params = None;
        self.ctx.buffered_amounts.clear();
        Ok(())
    }
}
