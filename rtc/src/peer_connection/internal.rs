use super::*;
use crate::data_channel::RTCDataChannelState;
use crate::peer_connection::event::data_channel_event::RTCDataChannelEvent;
use crate::peer_connection::event::ice_event::RTCPeerConnectionIceEvent;
use crate::peer_connection::event::track_event::RTCTrackEvent;
use crate::peer_connection::event::{RTCEventInternal, RTCPeerConnectionEvent};
use crate::peer_connection::sdp::{
    DEFAULT_SCTP_PORT, PopulateSdpParams, get_application_media_section, get_max_message_size,
    get_mid_value, get_peer_direction, get_sctp_port, have_application_media_section,
    track_details_from_sdp,
};
use crate::peer_connection::transport::RTCIceRole;
use crate::peer_connection::transport::ice::candidate::RTCIceCandidate;
use ::ice::candidate::Candidate;
use ::sdp::MEDIA_SECTION_APPLICATION;
use log::{trace, warn};
use shared::error::flatten_errs;

impl RTCPeerConnection {
    pub(super) fn do_create_offer(
        &mut self,
        options: &RTCOfferOptions,
    ) -> Result<RTCSessionDescription> {
        if options.ice_restart || self.ice_restart_requested {
            self.restart_transport()?;
            self.ice_restart_requested = false;
        }
        self.pipeline_context
            .ice_handler_context
            .ice_transport
            .gather()?;

        let want_application = !self.data_channels.is_empty();
        let sections =
            self.negotiator
                .offer_sections(&mut self.local_tracks, want_application, options);

        let ice_transport = &self.pipeline_context.ice_handler_context.ice_transport;
        let ice_params = ice_transport.get_local_parameters();
        let params = PopulateSdpParams {
            ice_ufrag: &ice_params.username_fragment,
            ice_pwd: &ice_params.password,
            candidates: ice_transport.agent.get_local_candidates(),
            gathering_complete: ice_transport.gathering_state() == RTCIceGatheringState::Complete,
            sctp_port: DEFAULT_SCTP_PORT,
            max_message_size: self.configuration.setting_engine.sctp_max_message_size,
        };
        Ok(self.negotiator.build(RTCSdpType::Offer, &sections, params))
    }

    pub(super) fn do_create_answer(&mut self) -> Result<RTCSessionDescription> {
        let sections = self.negotiator.answer_sections(&mut self.local_tracks)?;

        let ice_transport = &mut self.pipeline_context.ice_handler_context.ice_transport;
        ice_transport.gather()?;
        let ice_params = ice_transport.get_local_parameters();
        let params = PopulateSdpParams {
            ice_ufrag: &ice_params.username_fragment,
            ice_pwd: &ice_params.password,
            candidates: ice_transport.agent.get_local_candidates(),
            gathering_complete: ice_transport.gathering_state() == RTCIceGatheringState::Complete,
            sctp_port: DEFAULT_SCTP_PORT,
            max_message_size: self.configuration.setting_engine.sctp_max_message_size,
        };
        Ok(self.negotiator.build(RTCSdpType::Answer, &sections, params))
    }

    /// Follows up on a description that was applied.
    pub(super) fn on_signaling_state_applied(
        &mut self,
        prev: RTCSignalingState,
        next: RTCSignalingState,
    ) {
        if prev != next {
            self.push_event(RTCPeerConnectionEvent::OnSignalingStateChangeEvent(next));
        }
        if next == RTCSignalingState::Stable {
            self.start_sctp();
            self.is_negotiation_needed = false;
            self.update_negotiation_needed();
        }
    }

    /// Hands the remote credentials and candidates to the agent. The side
    /// that receives an answer made the offer and controls.
    pub(super) fn start_ice(
        &mut self,
        sdp_type: RTCSdpType,
        remote_ufrag: String,
        remote_pwd: String,
        candidates: Vec<Candidate>,
    ) -> Result<()> {
        let ice_transport = &self.pipeline_context.ice_handler_context.ice_transport;
        if sdp_type == RTCSdpType::Offer
            && ice_transport.is_started()
            && ice_transport.have_remote_credentials_change(&remote_ufrag, &remote_pwd)
        {
            info!("remote ICE credentials changed, restarting ICE");
            self.restart_transport()?;
        }

        let ice_transport = &mut self.pipeline_context.ice_handler_context.ice_transport;
        for c in candidates {
            if let Err(err) = ice_transport.add_remote_candidate(c) {
                warn!("failed to add remote candidate: {err}");
            }
        }

        if !ice_transport.is_started() {
            let role = match sdp_type {
                RTCSdpType::Answer | RTCSdpType::Pranswer => RTCIceRole::Controlling,
                _ => RTCIceRole::Controlled,
            };
            info!("starting ICE as {role}");
            ice_transport.start(role, remote_ufrag, remote_pwd)?;
        }
        Ok(())
    }

    /// Requests the association once both completed descriptions carry an
    /// application section. The controlling agent initiates it.
    fn start_sctp(&mut self) {
        let (Some(local), Some(remote)) = (
            self.negotiator
                .current_local_description
                .as_ref()
                .and_then(|d| d.parsed.as_ref()),
            self.negotiator
                .current_remote_description
                .as_ref()
                .and_then(|d| d.parsed.as_ref()),
        ) else {
            return;
        };
        if !have_application_media_section(local) {
            return;
        }
        let Some(remote_application) = get_application_media_section(remote) else {
            return;
        };

        let setting_engine = &self.configuration.setting_engine;
        let mut config = setting_engine.sctp_transport_config(get_sctp_port(remote_application));
        if let Some(remote_max) = get_max_message_size(remote_application)
            && remote_max < setting_engine.sctp_max_message_size
        {
            config = config.with_max_message_size(remote_max);
        }

        let is_client = self.pipeline_context.ice_handler_context.ice_transport.role()
            == RTCIceRole::Controlling;
        self.pipeline_context
            .sctp_handler_context
            .start(is_client, config);
    }

    /// Registers the tracks a remote description announces and forgets those
    /// it no longer carries.
    pub(super) fn update_remote_tracks(&mut self, description: &RTCSessionDescription) {
        let Some(parsed) = description.parsed.as_ref() else {
            return;
        };
        let details = track_details_from_sdp(parsed);

        self.remote_tracks.retain(|t| {
            let announced = details.iter().any(|d| d.ssrc == t.track.ssrc());
            if !announced {
                info!("remote track {} ended", t.track.track_id());
            }
            announced
        });

        for d in details {
            if self.remote_tracks.iter().any(|t| t.track.ssrc() == d.ssrc) {
                continue;
            }

            let mut track =
                MediaStreamTrack::new(d.stream_id.clone(), d.track_id.clone(), d.track_id.clone(), d.kind)
                    .with_ssrc(d.ssrc);
            if let Some(codec) = d.codec.clone() {
                track = track.with_codec(codec);
            }
            info!(
                "remote {} track {} on mid {} ssrc {}",
                d.kind, d.track_id, d.mid, d.ssrc
            );
            self.remote_tracks.push(TrackRemote::new(track, d.mid.clone()));

            let stream_ids = if d.stream_id.is_empty() {
                vec![]
            } else {
                vec![d.stream_id]
            };
            self.push_event(RTCPeerConnectionEvent::OnTrack(RTCTrackEvent {
                track_id: d.track_id,
                stream_ids,
                kind: d.kind,
                mid: d.mid,
                ssrc: d.ssrc,
                codec: d.codec,
            }));
        }
    }

    /// New local credentials, remote candidates forgotten, gathering again.
    /// Pair and track counters start over.
    pub(super) fn restart_transport(&mut self) -> Result<()> {
        self.pipeline_context
            .ice_handler_context
            .ice_transport
            .restart()?;
        for track in &mut self.local_tracks {
            track.reset_stats();
        }
        for track in &mut self.remote_tracks {
            track.reset_stats();
        }
        Ok(())
    }

    /// Raises negotiation-needed once per negotiation, and only while
    /// stable; reaching stable again re-checks.
    /// <https://www.w3.org/TR/webrtc/#updating-the-negotiation-needed-flag>
    pub(super) fn update_negotiation_needed(&mut self) {
        if self.is_closed()
            || self.signaling_state() != RTCSignalingState::Stable
            || self.negotiator.is_negotiation_ongoing
        {
            return;
        }
        if !self.ice_restart_requested && !self.check_negotiation_needed() {
            self.is_negotiation_needed = false;
            return;
        }
        if self.is_negotiation_needed {
            return;
        }

        info!("negotiation needed");
        self.is_negotiation_needed = true;
        self.push_event(RTCPeerConnectionEvent::OnNegotiationNeededEvent);
    }

    /// <https://www.w3.org/TR/webrtc/#dfn-check-if-negotiation-is-needed>
    fn check_negotiation_needed(&self) -> bool {
        let Some(local) = self
            .negotiator
            .current_local_description
            .as_ref()
            .and_then(|d| d.parsed.as_ref())
        else {
            return !self.data_channels.is_empty() || !self.local_tracks.is_empty();
        };

        // data channels need an application section
        if !self.data_channels.is_empty() && !have_application_media_section(local) {
            return true;
        }

        // credentials changed by an ICE restart
        let ice_params = self.local_ice_parameters();
        if extract_ice_details(local)
            .is_ok_and(|(ufrag, _, _)| ufrag != ice_params.username_fragment)
        {
            return true;
        }

        // every track is sent in a negotiated section
        for track in &self.local_tracks {
            let Some(mid) = track.mid.as_deref() else {
                return true;
            };
            match local
                .media_descriptions
                .iter()
                .find(|m| get_mid_value(m) == Some(mid))
            {
                Some(media) if get_peer_direction(media).has_send() => {}
                _ => return true,
            }
        }

        // removed tracks are no longer sent
        local.media_descriptions.iter().any(|media| {
            media.media_name.media != MEDIA_SECTION_APPLICATION
                && get_peer_direction(media).has_send()
                && get_mid_value(media).is_some_and(|mid| {
                    !self
                        .local_tracks
                        .iter()
                        .any(|t| t.mid.as_deref() == Some(mid))
                })
        })
    }

    pub(crate) fn handle_internal_event(&mut self, evt: RTCEventInternal) {
        match evt {
            RTCEventInternal::ICELocalCandidate(candidate) => {
                let (sdp_mid, sdp_mline_index) = self.first_mid();
                let candidate = candidate.map(|c| RTCIceCandidate {
                    sdp_mid,
                    sdp_mline_index,
                    ..RTCIceCandidate::from(&c)
                });
                let url = candidate
                    .as_ref()
                    .and_then(|c| c.url.clone())
                    .unwrap_or_default();
                self.push_event(RTCPeerConnectionEvent::OnIceCandidateEvent(
                    RTCPeerConnectionIceEvent { candidate, url },
                ));
            }
            RTCEventInternal::ICEGatheringStateChange(state) => {
                if self.ice_gathering_state != state {
                    info!("ICE gathering state changed: {state}");
                    self.ice_gathering_state = state;
                    self.push_event(RTCPeerConnectionEvent::OnIceGatheringStateChangeEvent(
                        state,
                    ));
                }
            }
            RTCEventInternal::ICEConnectionStateChange(state) => {
                self.update_ice_connection_state(state);
            }
            RTCEventInternal::ICESelectedCandidatePairChange(local, remote) => {
                info!("selected candidate pair {local} <-> {remote}");
                self.pipeline_context
                    .stats
                    .on_selected_candidate_pair_change();
            }
            RTCEventInternal::ICERestartNeeded => self.handle_restart_needed(),
            RTCEventInternal::RTCPeerConnectionEvent(evt) => self.push_event(evt),
            evt => trace!("unhandled internal event {evt:?}"),
        }
    }

    fn update_ice_connection_state(&mut self, state: RTCIceConnectionState) {
        if self.ice_connection_state == state {
            return;
        }
        info!("ICE connection state changed: {state}");
        self.ice_connection_state = state;
        self.push_event(RTCPeerConnectionEvent::OnIceConnectionStateChangeEvent(
            state,
        ));

        if matches!(
            state,
            RTCIceConnectionState::Connected | RTCIceConnectionState::Completed
        ) {
            self.ice_restarts = 0;
        }
        self.update_connection_state(state.into());
    }

    fn update_connection_state(&mut self, state: RTCPeerConnectionState) {
        if self.is_closed() && state != RTCPeerConnectionState::Closed {
            return;
        }
        if self.peer_connection_state == state {
            return;
        }
        info!("peer connection state changed: {state}");
        self.peer_connection_state = state;
        self.push_event(RTCPeerConnectionEvent::OnConnectionStateChangeEvent(state));
    }

    /// The agent lost an established connection. The controlling side
    /// restarts right away, up to `max_ice_restarts` times in a row.
    fn handle_restart_needed(&mut self) {
        if self.is_closed() {
            return;
        }
        if self.pipeline_context.ice_handler_context.ice_transport.role()
            != RTCIceRole::Controlling
        {
            debug!("ICE restart needed, waiting for an offer of the controlling peer");
            return;
        }

        let max_ice_restarts = self.configuration.setting_engine.max_ice_restarts;
        if self.ice_restarts >= max_ice_restarts {
            warn!("{} ({max_ice_restarts})", Error::ErrIceRestartLimit);
            self.update_connection_state(RTCPeerConnectionState::Failed);
            return;
        }

        self.ice_restarts += 1;
        info!(
            "restarting ICE ({}/{max_ice_restarts})",
            self.ice_restarts
        );
        if let Err(err) = self.restart_transport() {
            warn!("ICE restart failed: {err}");
            self.update_connection_state(RTCPeerConnectionState::Failed);
            return;
        }
        self.update_negotiation_needed();
    }

    /// The mid and m-line index trickled candidates are signaled with.
    fn first_mid(&self) -> (String, u16) {
        self.negotiator
            .local_description()
            .and_then(|d| d.parsed.as_ref())
            .and_then(|parsed| parsed.media_descriptions.first())
            .and_then(get_mid_value)
            .map_or_else(|| ("0".to_owned(), 0), |mid| (mid.to_owned(), 0))
    }

    fn push_event(&mut self, evt: RTCPeerConnectionEvent) {
        self.pipeline_context.event_outs.push_back(evt);
    }

    /// Tears the connection down: every channel reports `OnClose` once, the
    /// peer is told through an association abort, the agent stops and the
    /// ICE and connection states end in `Closed`.
    /// <https://www.w3.org/TR/webrtc/#dom-rtcpeerconnection-close>
    pub(crate) fn do_close(&mut self) -> Result<()> {
        info!("closing peer connection");
        self.is_closed = true;
        self.negotiator.close();
        self.push_event(RTCPeerConnectionEvent::OnSignalingStateChangeEvent(
            RTCSignalingState::Closed,
        ));

        for id in self.data_channel_ids() {
            let Some(dc) = self.data_channels.get_mut(&id) else {
                continue;
            };
            let was_open = matches!(
                dc.ready_state,
                RTCDataChannelState::Open | RTCDataChannelState::Closing
            );
            if dc.force_closed() {
                if was_open {
                    self.pipeline_context
                        .stats
                        .peer_connection
                        .on_data_channel_closed();
                }
                self.push_event(RTCPeerConnectionEvent::OnDataChannel(
                    RTCDataChannelEvent::OnClose(id),
                ));
            }
        }

        let mut close_errs = vec![];
        if let Err(err) = sansio::Protocol::close(&mut self.get_sctp_handler()) {
            close_errs.push(err);
        }
        // the abort leaves before the agent closes
        self.flush_writes();
        if let Err(err) = self.close_handlers() {
            close_errs.push(err);
        }

        self.update_ice_connection_state(RTCIceConnectionState::Closed);
        flatten_errs(close_errs)
    }
}
