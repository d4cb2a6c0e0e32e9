use crate::peer_connection::event::RTCEventInternal;
use crate::peer_connection::message::internal::{
    RTCMessageInternal, RTPMessage, SCTPMessage, TaggedRTCMessageInternal,
};
use log::{debug, warn};
use shared::error::{Error, Result};
use shared::util::{match_association, match_rtp};
use std::collections::VecDeque;
use std::time::Instant;

#[derive(Default)]
pub(crate) struct DemuxerHandlerContext {
    pub(crate) read_outs: VecDeque<TaggedRTCMessageInternal>,
    pub(crate) write_outs: VecDeque<TaggedRTCMessageInternal>,
    pub(crate) event_outs: VecDeque<RTCEventInternal>,
}

/// DemuxerHandler splits the application payload of the ICE transport into
/// association packets and RTP packets by their first byte (RFC 7983).
///
/// ```text
///              +----------------+
///              |      [20..63] -+--> forward to SCTP
///  packet -->  |                |
///              |    [128..191] -+--> forward to RTP
///              +----------------+
/// ```
pub(crate) struct DemuxerHandler<'a> {
    ctx: &'a mut DemuxerHandlerContext,
}

impl<'a> DemuxerHandler<'a> {
    pub(crate) fn new(ctx: &'a mut DemuxerHandlerContext) -> Self {
        DemuxerHandler { ctx }
    }

    pub(crate) fn name(&self) -> &'static str {
        "DemuxerHandler"
    }
}

impl<'a> sansio::Protocol<TaggedRTCMessageInternal, TaggedRTCMessageInternal, RTCEventInternal>
    for DemuxerHandler<'a>
{
    type Rout = TaggedRTCMessageInternal;
    type Wout = TaggedRTCMessageInternal;
    type Eout = RTCEventInternal;
    type Error = Error;
    type Time = Instant;

    fn handle_read(&mut self, msg: TaggedRTCMessageInternal) -> Result<()> {
        if let RTCMessageInternal::Raw(message) = msg.message {
            let message = if message.is_empty() {
                warn!("drop invalid packet due to zero length");
                return Ok(());
            } else if match_association(&message) {
                RTCMessageInternal::Sctp(SCTPMessage::Raw(message))
            } else if match_rtp(&message) {
                RTCMessageInternal::Rtp(RTPMessage::Raw(message))
            } else {
                debug!(
                    "drop unknown packet starting with {} from {:?}",
                    message[0], msg.transport.peer_addr
                );
                return Ok(());
            };
            self.ctx.read_outs.push_back(TaggedRTCMessageInternal {
                now: msg.now,
                transport: msg.transport,
                message,
            });
        } else {
            debug!("drop non-RAW packet {:?}", msg.message);
        }
        Ok(())
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        self.ctx.read_outs.pop_front()
    }

    fn handle_write(&mut self, msg: TaggedRTCMessageInternal) -> Result<()> {
        match msg.message {
            RTCMessageInternal::Raw(message)
            | RTCMessageInternal::Sctp(SCTPMessage::Raw(message))
            | RTCMessageInternal::Rtp(RTPMessage::Raw(message)) => {
                self.ctx.write_outs.push_back(TaggedRTCMessageInternal {
                    now: msg.now,
                    transport: msg.transport,
                    message: RTCMessageInternal::Raw(message),
                });
            }
            _ => {
                debug!("drop non-RAW packet {:?}", msg.message);
            }
        }
        Ok(())
    }

    fn poll_write(&mut self) -> Option<Self::Wout> {
        self.ctx.write_outs.pop_front()
    }

    fn handle_event(&mut self, evt: RTCEventInternal) -> Result<()> {
        self.ctx.event_outs.push_back(evt);
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
