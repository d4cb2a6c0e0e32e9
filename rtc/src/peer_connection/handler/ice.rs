use crate::peer_connection::event::RTCEventInternal;
use crate::peer_connection::message::internal::{RTCMessageInternal, TaggedRTCMessageInternal};
use crate::peer_connection::transport::ice::RTCIceTransport;
use log::{debug, trace};
use shared::TransportMessage;
use shared::error::{Error, Result};
use std::collections::VecDeque;
use std::time::Instant;

pub(crate) struct IceHandlerContext {
    pub(crate) ice_transport: RTCIceTransport,

    pub(crate) read_outs: VecDeque<TaggedRTCMessageInternal>,
    pub(crate) write_outs: VecDeque<TaggedRTCMessageInternal>,
    pub(crate) event_outs: VecDeque<RTCEventInternal>,
}

impl IceHandlerContext {
    pub(crate) fn new(ice_transport: RTCIceTransport) -> Self {
        Self {
            ice_transport,

            read_outs: VecDeque::new(),
            write_outs: VecDeque::new(),
            event_outs: VecDeque::new(),
        }
    }
}

/// IceHandler feeds every datagram to the ICE agent and passes on the
/// application payload the agent lets through.
pub(crate) struct IceHandler<'a> {
    ctx: &'a mut IceHandlerContext,
}

impl<'a> IceHandler<'a> {
    pub(crate) fn new(ctx: &'a mut IceHandlerContext) -> Self {
        IceHandler { ctx }
    }

    pub(crate) fn name(&self) -> &'static str {
        "IceHandler"
    }
}

impl<'a> sansio::Protocol<TaggedRTCMessageInternal, TaggedRTCMessageInternal, RTCEventInternal>
    for IceHandler<'a>
{
    type Rout = TaggedRTCMessageInternal;
    type Wout = TaggedRTCMessageInternal;
    type Eout = RTCEventInternal;
    type Error = Error;
    type Time = Instant;

    fn handle_read(&mut self, msg: TaggedRTCMessageInternal) -> Result<()> {
        let RTCMessageInternal::Raw(message) = msg.message else {
            debug!("drop non-RAW packet {:?}", msg.message);
            return Ok(());
        };

        let agent = &mut self.ctx.ice_transport.agent;
        sansio::Protocol::handle_read(
            agent,
            TransportMessage {
                now: msg.now,
                transport: msg.transport,
                message,
            },
        )?;

        while let Some(app) = sansio::Protocol::poll_read(agent) {
            trace!("bypass ice read {:?}", app.transport.peer_addr);
            self.ctx.read_outs.push_back(TaggedRTCMessageInternal {
                now: app.now,
                transport: app.transport,
                message: RTCMessageInternal::Raw(app.message),
            });
        }

        Ok(())
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        self.ctx.read_outs.pop_front()
    }

    fn handle_write(&mut self, msg: TaggedRTCMessageInternal) -> Result<()> {
        let RTCMessageInternal::Raw(message) = msg.message else {
            debug!("drop non-RAW packet {:?}", msg.message);
            return Ok(());
        };

        let agent = &mut self.ctx.ice_transport.agent;
        if agent.get_selected_candidate_pair().is_some() {
            // the agent addresses the payload to the selected pair
            sansio::Protocol::handle_write(agent, message)
        } else {
            trace!(
                "drop {} bytes before ICE connection is connected",
                message.len()
            );
            Ok(())
        }
    }

    fn poll_write(&mut self) -> Option<Self::Wout> {
        while let Some(transmit) = sansio::Protocol::poll_write(&mut self.ctx.ice_transport.agent)
        {
            self.ctx.write_outs.push_back(TaggedRTCMessageInternal {
                now: transmit.now,
                transport: transmit.transport,
                message: RTCMessageInternal::Raw(transmit.message),
            });
        }

        self.ctx.write_outs.pop_front()
    }

    fn handle_event(&mut self, evt: RTCEventInternal) -> Result<()> {
        self.ctx.event_outs.push_back(evt);
        Ok(())
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        while let Some(evt) = sansio::Protocol::poll_event(&mut self.ctx.ice_transport.agent) {
            let evt = match evt {
                ::ice::Event::LocalCandidate(candidate) => {
                    RTCEventInternal::ICELocalCandidate(candidate)
                }
                ::ice::Event::GatheringStateChange(state) => {
                    RTCEventInternal::ICEGatheringStateChange(state.into())
                }
                ::ice::Event::ConnectionStateChange(state) => {
                    RTCEventInternal::ICEConnectionStateChange(state.into())
                }
                ::ice::Event::SelectedCandidatePairChange(local, remote) => {
                    debug!(
                        "ice selected candidate pair {:?} <-> {:?}",
                        local.addr(),
                        remote.addr()
                    );
                    RTCEventInternal::ICESelectedCandidatePairChange(local, remote)
                }
                ::ice::Event::RestartNeeded => RTCEventInternal::ICERestartNeeded,
            };
            self.ctx.event_outs.push_back(evt);
        }

        self.ctx.event_outs.pop_front()
    }

    fn handle_timeout(&mut self, now: Instant) -> Result<()> {
        sansio::Protocol::handle_timeout(&mut self.ctx.ice_transport.agent, now)
    }

    fn poll_timeout(&mut self) -> Option<Instant> {
        sansio::Protocol::poll_timeout(&mut self.ctx.ice_transport.agent)
    }

    fn close(&mut self) -> Result<()> {
        self.ctx.ice_transport.close()
    }
}
