use crate::media_stream::track_local::TrackLocal;
use crate::media_stream::track_remote::TrackRemote;
use crate::peer_connection::event::RTCEventInternal;
use crate::peer_connection::message::internal::{
    RTCMessageInternal, RTPMessage, TaggedRTCMessageInternal, TrackSample,
};
use log::{debug, trace};
use shared::TransportContext;
use shared::error::{Error, Result};
use shared::marshal::{Marshal, Unmarshal};
use std::collections::VecDeque;
use std::time::Instant;

#[derive(Default)]
pub(crate) struct EndpointHandlerContext {
    pub(crate) read_outs: VecDeque<TaggedRTCMessageInternal>,
    pub(crate) write_outs: VecDeque<TaggedRTCMessageInternal>,
    pub(crate) event_outs: VecDeque<RTCEventInternal>,
}

/// EndpointHandler binds RTP packets to media tracks: received packets are
/// reassembled into samples of the remote track owning their SSRC, written
/// samples are packetized for the local track.
pub(crate) struct EndpointHandler<'a> {
    ctx: &'a mut EndpointHandlerContext,
    local_tracks: &'a mut Vec<TrackLocal>,
    remote_tracks: &'a mut Vec<TrackRemote>,
}

impl<'a> EndpointHandler<'a> {
    pub(crate) fn new(
        ctx: &'a mut EndpointHandlerContext,
        local_tracks: &'a mut Vec<TrackLocal>,
        remote_tracks: &'a mut Vec<TrackRemote>,
    ) -> Self {
        EndpointHandler {
            ctx,
            local_tracks,
            remote_tracks,
        }
    }

    pub(crate) fn name(&self) -> &'static str {
        "EndpointHandler"
    }

    fn handle_rtp_packet(&mut self, msg: TaggedRTCMessageInternal, packet: rtp::Packet) {
        let ssrc = packet.header.ssrc;
        let Some(remote) = self
            .remote_tracks
            .iter_mut()
            .find(|t| t.track.ssrc() == ssrc)
        else {
            debug!("drop rtp packet ssrc = {ssrc}");
            return;
        };

        if let Some(sample) = remote.push(packet) {
            self.ctx.read_outs.push_back(TaggedRTCMessageInternal {
                now: msg.now,
                transport: msg.transport,
                message: RTCMessageInternal::Track(TrackSample {
                    track_id: remote.track.track_id().to_owned(),
                    sample,
                }),
            });
        }
    }

    fn handle_track_sample(
        &mut self,
        now: Instant,
        transport: TransportContext,
        sample: TrackSample,
    ) -> Result<()> {
        let local = self
            .local_tracks
            .iter_mut()
            .find(|t| t.track.track_id() == &sample.track_id)
            .ok_or(Error::ErrTrackNotFound)?;
        if local.mid.is_none() {
            trace!(
                "drop sample of track {} before it is negotiated",
                sample.track_id
            );
            return Ok(());
        }

        for packet in local.packetize(&sample.sample)? {
            self.ctx.write_outs.push_back(TaggedRTCMessageInternal {
                now,
                transport,
                message: RTCMessageInternal::Rtp(RTPMessage::Raw(packet.marshal()?)),
            });
        }
        Ok(())
    }
}

impl<'a> sansio::Protocol<TaggedRTCMessageInternal, TaggedRTCMessageInternal, RTCEventInternal>
    for EndpointHandler<'a>
{
    type Rout = TaggedRTCMessageInternal;
    type Wout = TaggedRTCMessageInternal;
    type Eout = RTCEventInternal;
    type Error = Error;
    type Time = Instant;

    fn handle_read(&mut self, msg: TaggedRTCMessageInternal) -> Result<()> {
        if let RTCMessageInternal::Rtp(RTPMessage::Raw(message)) = &msg.message {
            let mut buf = &message[..];
            let packet = rtp::Packet::unmarshal(&mut buf)?;
            self.handle_rtp_packet(msg, packet);
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
        if let RTCMessageInternal::Track(sample) = msg.message {
            self.handle_track_sample(msg.now, msg.transport, sample)
        } else {
            // Bypass
            self.ctx.write_outs.push_back(msg);
            Ok(())
        }
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
