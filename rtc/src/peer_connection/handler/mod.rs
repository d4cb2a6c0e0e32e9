pub(crate) mod datachannel;
pub(crate) mod demuxer;
pub(crate) mod endpoint;
pub(crate) mod ice;
pub(crate) mod sctp;

use crate::peer_connection::RTCPeerConnection;
use crate::peer_connection::event::RTCPeerConnectionEvent;
use crate::peer_connection::handler::datachannel::{DataChannelHandler, DataChannelHandlerContext};
use crate::peer_connection::handler::demuxer::{DemuxerHandler, DemuxerHandlerContext};
use crate::peer_connection::handler::endpoint::{EndpointHandler, EndpointHandlerContext};
use crate::peer_connection::handler::ice::{IceHandler, IceHandlerContext};
use crate::peer_connection::handler::sctp::{SctpHandler, SctpHandlerContext};
use crate::peer_connection::message::{
    RTCMessage,
    internal::{ApplicationMessage, RTCMessageInternal, TaggedRTCMessageInternal, TrackSample},
};
use crate::peer_connection::transport::ice::RTCIceTransport;
use crate::statistics::accumulator::RTCStatsAccumulator;
use log::warn;
use sansio::Protocol;
use shared::TaggedBytesMut;
use shared::error::{Error, Result, flatten_errs};
use std::collections::VecDeque;
use std::time::Instant;

/// Forward handler list - invokes callback with handler list
macro_rules! forward_handlers {
    ($callback:ident!($($args:tt)*)) => {
        $callback!(
            $($args)*,
            [
                get_ice_handler,
                get_demuxer_handler,
                get_sctp_handler,
                get_datachannel_handler,
                get_endpoint_handler
            ]
        )
    };
}

/// Reverse handler list - invokes callback with handler list
macro_rules! reverse_handlers {
    ($callback:ident!($($args:tt)*)) => {
        $callback!(
            $($args)*,
            [
                get_endpoint_handler,
                get_datachannel_handler,
                get_sctp_handler,
                get_demuxer_handler,
                get_ice_handler
            ]
        )
    };
}

/// Helper macro that processes a list of handlers with code blocks
macro_rules! process_handler_list {
    (call_macro: process_handler!($self:expr, $handler:ident, $code:block), [$($getter:ident),+]) => {{
        $(
            {
                let mut $handler = $self.$getter();
                $code
            }
        )+
    }};
}

/// Unified macro to iterate over handlers with code blocks
macro_rules! for_each_handler {
    // Forward order: execute code block for each handler
    (forward: $macro:ident!($($args:tt)*)) => {
        forward_handlers!(process_handler_list!(call_macro: $macro!($($args)*)))
    };

    // Reverse order: execute code block for each handler
    (reverse: $macro:ident!($($args:tt)*)) => {
        reverse_handlers!(process_handler_list!(call_macro: $macro!($($args)*)))
    };
}

pub(crate) struct PipelineContext {
    // Handler contexts
    pub(crate) ice_handler_context: IceHandlerContext,
    pub(crate) demuxer_handler_context: DemuxerHandlerContext,
    pub(crate) sctp_handler_context: SctpHandlerContext,
    pub(crate) datachannel_handler_context: DataChannelHandlerContext,
    pub(crate) endpoint_handler_context: EndpointHandlerContext,

    // Pipeline
    pub(crate) read_outs: VecDeque<RTCMessage>,
    pub(crate) write_outs: VecDeque<TaggedBytesMut>,
    pub(crate) event_outs: VecDeque<RTCPeerConnectionEvent>,

    // Statistics accumulator
    pub(crate) stats: RTCStatsAccumulator,
}

impl PipelineContext {
    pub(crate) fn new(ice_transport: RTCIceTransport, high_water_mark: usize) -> Self {
        Self {
            ice_handler_context: IceHandlerContext::new(ice_transport),
            demuxer_handler_context: DemuxerHandlerContext::default(),
            sctp_handler_context: SctpHandlerContext::default(),
            datachannel_handler_context: DataChannelHandlerContext::new(high_water_mark),
            endpoint_handler_context: EndpointHandlerContext::default(),

            read_outs: VecDeque::new(),
            write_outs: VecDeque::new(),
            event_outs: VecDeque::new(),

            stats: RTCStatsAccumulator::default(),
        }
    }
}

impl RTCPeerConnection {
    /*
     Pipeline Flow (Read Path):
     Raw Bytes -> ICE -> Demuxer -> SCTP -> DataChannel -> Endpoint -> Application

     Pipeline Flow (Write Path):
     Application -> Endpoint -> DataChannel -> SCTP -> Demuxer -> ICE -> Raw Bytes

     ICE comes first: the agent consumes STUN and unwraps TCP framing and TURN
     data indications before the application payload is demultiplexed.
    */

    pub(crate) fn get_ice_handler(&mut self) -> IceHandler<'_> {
        IceHandler::new(&mut self.pipeline_context.ice_handler_context)
    }

    pub(crate) fn get_demuxer_handler(&mut self) -> DemuxerHandler<'_> {
        DemuxerHandler::new(&mut self.pipeline_context.demuxer_handler_context)
    }

    pub(crate) fn get_sctp_handler(&mut self) -> SctpHandler<'_> {
        SctpHandler::new(&mut self.pipeline_context.sctp_handler_context)
    }

    pub(crate) fn get_datachannel_handler(&mut self) -> DataChannelHandler<'_> {
        DataChannelHandler::new(
            &mut self.pipeline_context.datachannel_handler_context,
            &mut self.data_channels,
            &mut self.pipeline_context.stats,
        )
    }

    pub(crate) fn get_endpoint_handler(&mut self) -> EndpointHandler<'_> {
        EndpointHandler::new(
            &mut self.pipeline_context.endpoint_handler_context,
            &mut self.local_tracks,
            &mut self.remote_tracks,
        )
    }

    /// Runs the write path and queues the resulting datagrams.
    pub(crate) fn flush_writes(&mut self) {
        let mut intermediate_wouts = VecDeque::new();

        for_each_handler!(reverse: process_handler!(self, handler, {
            while let Some(msg) = intermediate_wouts.pop_front() {
                if let Err(err) = handler.handle_write(msg) {
                    warn!("{}.handle_write got error: {}", handler.name(), err);
                }
            }
            while let Some(msg) = handler.poll_write() {
                intermediate_wouts.push_back(msg);
            }
        }));

        // Final poll write out to pipeline's write out
        while let Some(msg) = intermediate_wouts.pop_front() {
            if let RTCMessageInternal::Raw(message) = msg.message {
                self.pipeline_context.write_outs.push_back(TaggedBytesMut {
                    now: msg.now,
                    transport: msg.transport,
                    message,
                });
            }
        }
    }

    /// Closes every handler, last stage of the write path first.
    pub(crate) fn close_handlers(&mut self) -> Result<()> {
        let mut close_errs = vec![];
        for_each_handler!(reverse: process_handler!(self, handler, {
            if let Err(err) = handler.close() {
                close_errs.push(err);
            }
        }));
        flatten_errs(close_errs)
    }
}

impl sansio::Protocol<TaggedBytesMut, RTCMessage, ()> for RTCPeerConnection {
    type Rout = RTCMessage;
    type Wout = TaggedBytesMut;
    type Eout = RTCPeerConnectionEvent;
    type Error = Error;
    type Time = Instant;

    fn handle_read(&mut self, msg: TaggedBytesMut) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }

        let mut intermediate_routs = VecDeque::new();
        intermediate_routs.push_back(TaggedRTCMessageInternal {
            now: msg.now,
            transport: msg.transport,
            message: RTCMessageInternal::Raw(msg.message),
        });

        for_each_handler!(forward: process_handler!(self, handler, {
            while let Some(msg) = intermediate_routs.pop_front() {
                if let Err(err) = handler.handle_read(msg) {
                    warn!("{}.handle_read got error: {}", handler.name(), err);
                }
            }
            while let Some(msg) = handler.poll_read() {
                intermediate_routs.push_back(msg);
            }
        }));

        // Finally, put intermediate_routs into RTCPeerConnection's routs
        while let Some(msg) = intermediate_routs.pop_front() {
            let rtc_message = match msg.message {
                RTCMessageInternal::DataChannel(application_message) => {
                    Some(RTCMessage::DataChannelMessage(
                        application_message.data_channel_id,
                        application_message.message,
                    ))
                }
                RTCMessageInternal::Track(track_sample) => Some(RTCMessage::MediaSample(
                    track_sample.track_id,
                    track_sample.sample,
                )),
                _ => None,
            };

            if let Some(rtc_message) = rtc_message {
                self.pipeline_context.read_outs.push_back(rtc_message);
            }
        }

        Ok(())
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        self.pipeline_context.read_outs.pop_front()
    }

    fn handle_write(&mut self, msg: RTCMessage) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }

        let rtc_message_internal = match msg {
            RTCMessage::DataChannelMessage(data_channel_id, message) => {
                RTCMessageInternal::DataChannel(ApplicationMessage {
                    data_channel_id,
                    message,
                })
            }
            RTCMessage::MediaSample(track_id, sample) => {
                RTCMessageInternal::Track(TrackSample { track_id, sample })
            }
        };

        // Application writes enter at the head of the write path
        match rtc_message_internal {
            RTCMessageInternal::DataChannel(_) => {
                let mut datachannel_handler = self.get_datachannel_handler();
                datachannel_handler.handle_write(TaggedRTCMessageInternal {
                    now: Instant::now(),
                    transport: Default::default(),
                    message: rtc_message_internal,
                })
            }
            _ => {
                let mut endpoint_handler = self.get_endpoint_handler();
                endpoint_handler.handle_write(TaggedRTCMessageInternal {
                    now: Instant::now(),
                    transport: Default::default(),
                    message: rtc_message_internal,
                })
            }
        }
    }

    fn poll_write(&mut self) -> Option<Self::Wout> {
        if !self.is_closed() {
            self.flush_writes();
        }
        self.pipeline_context.write_outs.pop_front()
    }

    fn handle_event(&mut self, _evt: ()) -> Result<()> {
        Ok(())
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        if self.is_closed() {
            return self.pipeline_context.event_outs.pop_front();
        }

        let mut intermediate_eouts = VecDeque::new();

        for_each_handler!(forward: process_handler!(self, handler, {
            while let Some(evt) = intermediate_eouts.pop_front() {
                if let Err(err) = handler.handle_event(evt) {
                    warn!("{}.handle_event got error: {}", handler.name(), err);
                }
            }
            while let Some(msg) = handler.poll_event() {
                intermediate_eouts.push_back(msg);
            }
        }));

        // Finally, put intermediate_eouts into RTCPeerConnection's eouts
        while let Some(evt_internal) = intermediate_eouts.pop_front() {
            self.handle_internal_event(evt_internal);
        }

        self.pipeline_context.event_outs.pop_front()
    }

    fn handle_timeout(&mut self, now: Instant) -> Result<()> {
        if self.is_closed() {
            return Ok(());
        }
        for_each_handler!(forward: process_handler!(self, handler, {
            if let Err(err) = handler.handle_timeout(now) {
                warn!("{}.handle_timeout got error: {}", handler.name(), err);
            }
        }));
        Ok(())
    }

    fn poll_timeout(&mut self) -> Option<Instant> {
        if self.is_closed() {
            return None;
        }
        let mut eto: Option<Instant> = None;
        for_each_handler!(forward: process_handler!(self, handler, {
            if let Some(next) = handler.poll_timeout() {
                eto = Some(eto.map_or(next, |curr| std::cmp::min(curr, next)));
            }
        }));
        eto
    }

    /// Closes the connection. Every channel reports `OnClose`, then the ICE
    /// and connection states report `Closed`; nothing is emitted afterwards.
    /// Closing twice is a no-op.
    fn close(&mut self) -> Result<()> {
        // https://www.w3.org/TR/webrtc/#dom-rtcpeerconnection-close (step #1)
        if self.is_closed() {
            return Ok(());
        }
        self.do_close()
    }
}
