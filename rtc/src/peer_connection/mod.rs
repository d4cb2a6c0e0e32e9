//! The peer connection: a sans-IO coordinator of one ICE agent, the
//! offer/answer negotiator, the association carrying data channels and the
//! media tracks.
//!
//! [`RTCPeerConnection`] owns no socket, thread or clock. The application
//! registers its socket addresses with [`RTCPeerConnection::add_local_address`]
//! and then drives the connection through [`sansio::Protocol`]:
//!
//! ```text
//!   loop {
//!       while let Some(datagram) = pc.poll_write()  -> send on socket
//!       while let Some(event)    = pc.poll_event()  -> react
//!       while let Some(message)  = pc.poll_read()   -> application data
//!       wait for socket input or pc.poll_timeout()
//!       pc.handle_read(datagram) / pc.handle_timeout(now)
//!   }
//! ```
//!
//! Every mutation goes through `&mut self`, so the offer/answer exchange,
//! connectivity checks and data transfer are serialized by construction.

pub mod configuration;
pub mod event;
pub(crate) mod handler;
mod internal;
pub mod message;
mod negotiator;
pub mod sdp;
pub mod state;
pub mod transport;

use crate::data_channel::internal::RTCDataChannelInternal;
use crate::data_channel::{RTCDataChannel, RTCDataChannelId, RTCDataChannelInit};
use crate::media_stream::track::{MediaStreamTrack, MediaStreamTrackId};
use crate::media_stream::track_local::TrackLocal;
use crate::media_stream::track_remote::TrackRemote;
use crate::media_stream::RTCTrack;
use crate::peer_connection::configuration::{RTCAnswerOptions, RTCConfiguration, RTCOfferOptions};
use crate::peer_connection::handler::PipelineContext;
use crate::peer_connection::negotiator::Negotiator;
use crate::peer_connection::sdp::{RTCSdpType, RTCSessionDescription, extract_ice_details};
use crate::peer_connection::state::signaling_state::StateChangeOp;
use crate::peer_connection::state::{
    RTCIceConnectionState, RTCIceGatheringState, RTCPeerConnectionState, RTCSignalingState,
};
use crate::peer_connection::transport::ice::RTCIceTransport;
use crate::peer_connection::transport::{RTCIceCandidateInit, RTCIceParameters};
use crate::statistics::RTCStatsReport;
use log::{debug, info};
use shared::TransportProtocol;
use shared::error::{Error, Result};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Instant;

/// PeerConnection represents a WebRTC connection that establishes a
/// peer-to-peer communications with another PeerConnection instance.
///
/// ```no_run
/// use rtc::peer_connection::RTCPeerConnection;
/// use rtc::peer_connection::configuration::RTCConfigurationBuilder;
/// use shared::TransportProtocol;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let mut pc = RTCPeerConnection::new(RTCConfigurationBuilder::new().build())?;
/// pc.add_local_address("192.168.1.10:50000".parse()?, TransportProtocol::UDP)?;
/// pc.create_data_channel("chat", None)?;
///
/// let offer = pc.create_offer(None)?;
/// pc.set_local_description(offer.clone())?;
/// // send `offer` to the remote peer, apply its answer with
/// // set_remote_description and run the sansio::Protocol loop
/// # Ok(())
/// # }
/// ```
pub struct RTCPeerConnection {
    configuration: RTCConfiguration,
    negotiator: Negotiator,

    ice_connection_state: RTCIceConnectionState,
    ice_gathering_state: RTCIceGatheringState,
    peer_connection_state: RTCPeerConnectionState,
    is_closed: bool,

    is_negotiation_needed: bool,
    /// restart_ice was called, the next offer carries new credentials
    ice_restart_requested: bool,
    /// automatic restarts since the connection was last connected
    ice_restarts: u32,

    pub(crate) pipeline_context: PipelineContext,
    pub(crate) data_channels: HashMap<RTCDataChannelId, RTCDataChannelInternal>,
    pub(crate) local_tracks: Vec<TrackLocal>,
    pub(crate) remote_tracks: Vec<TrackRemote>,
}

impl RTCPeerConnection {
    /// creates a PeerConnection with RTCConfiguration
    pub fn new(configuration: RTCConfiguration) -> Result<Self> {
        let ice_transport = RTCIceTransport::new(configuration.agent_config()?, Instant::now())?;
        let pipeline_context = PipelineContext::new(
            ice_transport,
            configuration.setting_engine.data_channel_high_water_mark,
        );

        Ok(Self {
            configuration,
            negotiator: Negotiator::default(),

            ice_connection_state: RTCIceConnectionState::New,
            ice_gathering_state: RTCIceGatheringState::New,
            peer_connection_state: RTCPeerConnectionState::New,
            is_closed: false,

            is_negotiation_needed: false,
            ice_restart_requested: false,
            ice_restarts: 0,

            pipeline_context,
            data_channels: HashMap::new(),
            local_tracks: vec![],
            remote_tracks: vec![],
        })
    }

    pub fn configuration(&self) -> &RTCConfiguration {
        &self.configuration
    }

    /// create_offer builds an offer reflecting the current tracks and data
    /// channels. Until the offer is applied with set_local_description or
    /// rolled back, another create_offer or create_answer fails with
    /// `ErrOperationInProgress`.
    /// <https://w3c.github.io/webrtc-pc/#dom-rtcpeerconnection-createoffer>
    pub fn create_offer(
        &mut self,
        options: Option<RTCOfferOptions>,
    ) -> Result<RTCSessionDescription> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }

        self.negotiator.begin(RTCSdpType::Offer)?;
        self.do_create_offer(&options.unwrap_or_default())
            .inspect_err(|_| self.negotiator.abort())
    }

    /// create_answer builds the answer to the applied remote offer.
    /// <https://w3c.github.io/webrtc-pc/#dom-rtcpeerconnection-createanswer>
    pub fn create_answer(
        &mut self,
        _options: Option<RTCAnswerOptions>,
    ) -> Result<RTCSessionDescription> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }
        if self.negotiator.remote_description().is_none() {
            return Err(Error::ErrNoRemoteDescription);
        }
        let state = self.signaling_state();
        if state != RTCSignalingState::HaveRemoteOffer
            && state != RTCSignalingState::HaveLocalPranswer
        {
            return Err(Error::ErrIncorrectSignalingState);
        }

        self.negotiator.begin(RTCSdpType::Answer)?;
        self.do_create_answer().inspect_err(|_| self.negotiator.abort())
    }

    /// set_local_description applies an offer or answer created by this
    /// connection. A description with an empty `sdp` stands for the last one
    /// created of its type.
    pub fn set_local_description(&mut self, mut description: RTCSessionDescription) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }

        self.negotiator
            .fill_implicit_description(&mut description)?;
        if description.sdp_type != RTCSdpType::Rollback {
            description.parsed()?;
        }

        let prev = self.signaling_state();
        let next = self
            .negotiator
            .set_description(&description, StateChangeOp::SetLocal)?;

        if description.sdp_type != RTCSdpType::Rollback {
            self.pipeline_context
                .ice_handler_context
                .ice_transport
                .gather()?;
        }
        self.on_signaling_state_applied(prev, next);
        Ok(())
    }

    /// local_description returns the pending local description if there is
    /// one and the current one otherwise.
    /// <https://www.w3.org/TR/webrtc/#dom-rtcpeerconnection-localdescription>
    pub fn local_description(&self) -> Option<&RTCSessionDescription> {
        self.negotiator.local_description()
    }

    /// The local description of the last completed negotiation.
    pub fn current_local_description(&self) -> Option<&RTCSessionDescription> {
        self.negotiator.current_local_description.as_ref()
    }

    pub fn pending_local_description(&self) -> Option<&RTCSessionDescription> {
        self.negotiator.pending_local_description.as_ref()
    }

    /// set_remote_description applies the offer or answer of the remote
    /// peer. Its ICE credentials and candidates are handed to the agent and
    /// the tracks it announces are reported with `OnTrack`.
    pub fn set_remote_description(&mut self, mut description: RTCSessionDescription) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }

        let ice_details = if description.sdp_type == RTCSdpType::Rollback {
            None
        } else {
            Some(extract_ice_details(description.parsed()?)?)
        };

        let prev = self.signaling_state();
        let applied = self.negotiator.clone();
        let next = self
            .negotiator
            .set_description(&description, StateChangeOp::SetRemote)?;

        if let Some((ufrag, pwd, candidates)) = ice_details {
            if let Err(err) = self.start_ice(description.sdp_type, ufrag, pwd, candidates) {
                self.negotiator = applied;
                return Err(err);
            }
            self.update_remote_tracks(&description);
        }
        self.on_signaling_state_applied(prev, next);
        Ok(())
    }

    pub fn remote_description(&self) -> Option<&RTCSessionDescription> {
        self.negotiator.remote_description()
    }

    pub fn current_remote_description(&self) -> Option<&RTCSessionDescription> {
        self.negotiator.current_remote_description.as_ref()
    }

    pub fn pending_remote_description(&self) -> Option<&RTCSessionDescription> {
        self.negotiator.pending_remote_description.as_ref()
    }

    /// add_ice_candidate hands a trickled remote candidate to the ICE agent.
    /// Candidates arriving before the remote description are kept until its
    /// credentials are known; candidates of a previous ICE generation are
    /// dropped. An empty candidate marks the end of remote candidates.
    pub fn add_ice_candidate(&mut self, candidate: RTCIceCandidateInit) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }

        let Some(c) = candidate.to_ice()? else {
            debug!("remote end-of-candidates");
            return Ok(());
        };

        let ice_transport = &mut self.pipeline_context.ice_handler_context.ice_transport;
        if let Some(ufrag) = candidate.username_fragment.as_deref() {
            let (remote_ufrag, _) = ice_transport.agent.get_remote_user_credentials();
            if !remote_ufrag.is_empty() && remote_ufrag != ufrag {
                debug!("drop remote candidate {c} of stale ufrag {ufrag}");
                return Ok(());
            }
        }
        ice_transport.add_remote_candidate(c)
    }

    /// Registers a local socket address. The application owns the socket;
    /// a host candidate is gathered on it.
    pub fn add_local_address(
        &mut self,
        addr: SocketAddr,
        transport_protocol: TransportProtocol,
    ) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }
        self.pipeline_context
            .ice_handler_context
            .ice_transport
            .add_local_address(addr, transport_protocol)
    }

    /// ICE credentials the local descriptions carry.
    pub fn local_ice_parameters(&self) -> RTCIceParameters {
        self.pipeline_context
            .ice_handler_context
            .ice_transport
            .get_local_parameters()
    }

    /// add_track adds a local track and returns its handle. The track is
    /// negotiated with the next offer or answer.
    pub fn add_track(&mut self, track: MediaStreamTrack) -> Result<RTCTrack<'_>> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }
        if self
            .local_tracks
            .iter()
            .any(|t| t.track.track_id() == track.track_id())
        {
            return Err(Error::ErrTrackAlreadyExists);
        }

        let track_id = track.track_id().clone();
        info!("adding {} track {track_id}", track.kind());
        self.local_tracks.push(TrackLocal::new(
            track,
            self.configuration.setting_engine.receive_mtu,
        ));
        self.update_negotiation_needed();

        Ok(RTCTrack {
            track_id,
            peer_connection: self,
        })
    }

    /// remove_track stops sending the track. Its media section turns
    /// receive-only with the next negotiation.
    pub fn remove_track(&mut self, track_id: &str) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }
        let index = self
            .local_tracks
            .iter()
            .position(|t| t.track.track_id() == track_id)
            .ok_or(Error::ErrTrackNotFound)?;

        let mut removed = self.local_tracks.remove(index);
        removed.track.stop();
        info!("removed track {track_id}");
        self.update_negotiation_needed();
        Ok(())
    }

    /// Returns the handle of a local track.
    pub fn track(&mut self, track_id: &str) -> Option<RTCTrack<'_>> {
        let track_id = self
            .local_tracks
            .iter()
            .find(|t| t.track.track_id() == track_id)?
            .track
            .track_id()
            .clone();
        Some(RTCTrack {
            track_id,
            peer_connection: self,
        })
    }

    /// Ids of the local tracks.
    pub fn track_ids(&self) -> Vec<MediaStreamTrackId> {
        self.local_tracks
            .iter()
            .map(|t| t.track.track_id().clone())
            .collect()
    }

    /// Tracks announced by the remote description.
    pub fn remote_tracks(&self) -> Vec<MediaStreamTrack> {
        self.remote_tracks.iter().map(|t| t.track.clone()).collect()
    }

    /// create_data_channel creates a new DataChannel object with the given
    /// label and optional DataChannelInit used to configure properties of
    /// the underlying channel such as data reliability.
    /// <https://w3c.github.io/webrtc-pc/#dom-rtcpeerconnection-createdatachannel>
    pub fn create_data_channel(
        &mut self,
        label: &str,
        options: Option<RTCDataChannelInit>,
    ) -> Result<RTCDataChannel<'_>> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }

        let options = options.unwrap_or_default();
        if let Some(stream_id) = options.negotiated
            && self
                .data_channels
                .values()
                .any(|dc| dc.stream_id == Some(stream_id))
        {
            return Err(Error::ErrDataChannelIdInUse);
        }

        let ctx = &mut self.pipeline_context.datachannel_handler_context;
        let id = ctx.allocate_data_channel_id();
        let dc = RTCDataChannelInternal::new(id, label, options, ctx.high_water_mark)?;
        info!("created data channel {id} '{label}'");
        self.data_channels.insert(id, dc);
        self.pipeline_context
            .stats
            .peer_connection
            .on_data_channel_requested();

        if self.pipeline_context.sctp_handler_context.is_established() {
            self.get_datachannel_handler().dial_pending()?;
        }
        self.update_negotiation_needed();

        Ok(RTCDataChannel {
            id,
            peer_connection: self,
        })
    }

    /// Returns the handle of a data channel, local or announced by the peer.
    pub fn data_channel(&mut self, id: RTCDataChannelId) -> Option<RTCDataChannel<'_>> {
        if self.data_channels.contains_key(&id) {
            Some(RTCDataChannel {
                id,
                peer_connection: self,
            })
        } else {
            None
        }
    }

    pub fn data_channel_ids(&self) -> Vec<RTCDataChannelId> {
        let mut ids: Vec<RTCDataChannelId> = self.data_channels.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// restart_ice asks for new ICE credentials with the next offer and
    /// raises negotiation-needed.
    /// <https://w3c.github.io/webrtc-pc/#dom-rtcpeerconnection-restartice>
    pub fn restart_ice(&mut self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }
        info!("ICE restart requested");
        self.ice_restart_requested = true;
        self.update_negotiation_needed();
        Ok(())
    }

    /// get_stats returns a report of every counter known at `now`. Taking a
    /// report has no effect on the connection.
    pub fn get_stats(&self, now: Instant) -> RTCStatsReport {
        self.pipeline_context.stats.snapshot(
            now,
            &self.pipeline_context.ice_handler_context.ice_transport,
            &self.data_channels,
            &self.local_tracks,
            &self.remote_tracks,
        )
    }

    pub fn signaling_state(&self) -> RTCSignalingState {
        self.negotiator.signaling_state
    }

    pub fn ice_connection_state(&self) -> RTCIceConnectionState {
        self.ice_connection_state
    }

    pub fn ice_gathering_state(&self) -> RTCIceGatheringState {
        self.ice_gathering_state
    }

    pub fn connection_state(&self) -> RTCPeerConnectionState {
        self.peer_connection_state
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.is_closed
    }
}

#[cfg(test)]
mod peer_connection_test;
