use crate::media_stream::track::{RTCRtpCodec, RtpCodecKind};
use crate::media_stream::track_local::TrackLocal;
use crate::peer_connection::configuration::RTCOfferOptions;
use crate::peer_connection::sdp::{
    MediaSection, MediaSectionKind, MediaSource, PopulateSdpParams, RTCSdpType,
    RTCSessionDescription, get_mid_value, get_peer_direction, is_rejected, populate_sdp,
    update_sdp_origin,
};
use crate::peer_connection::state::signaling_state::{
    RTCSignalingState, StateChangeOp, check_next_signaling_state,
};
use ::sdp::MEDIA_SECTION_APPLICATION;
use ::sdp::description::media::MediaDescription;
use ::sdp::description::session::{Origin, SessionDescription};
use ::sdp::direction::Direction;
use log::{debug, info};
use shared::error::{Error, Result};

/// Negotiator runs the offer/answer exchange of a peer connection: it builds
/// local descriptions, keeps the current and pending descriptions of both
/// sides and walks the signaling state graph.
///
/// `create_offer` and `create_answer` leave a pending operation behind that
/// is resolved when the created description is applied locally or rolled
/// back. Only one operation may be pending at a time.
#[derive(Default, Clone)]
pub(crate) struct Negotiator {
    pub(crate) signaling_state: RTCSignalingState,

    pub(crate) current_local_description: Option<RTCSessionDescription>,
    pub(crate) pending_local_description: Option<RTCSessionDescription>,
    pub(crate) current_remote_description: Option<RTCSessionDescription>,
    pub(crate) pending_remote_description: Option<RTCSessionDescription>,

    last_offer: String,
    last_answer: String,
    pending_operation: Option<RTCSdpType>,

    sdp_origin: Origin,
    greater_mid: usize,
    pub(crate) is_negotiation_ongoing: bool,
}

impl Negotiator {
    /// Records the start of a create_offer or create_answer.
    pub(crate) fn begin(&mut self, sdp_type: RTCSdpType) -> Result<()> {
        if let Some(pending) = self.pending_operation {
            debug!("create {sdp_type} rejected, {pending} still pending");
            return Err(Error::ErrOperationInProgress);
        }
        self.pending_operation = Some(sdp_type);
        Ok(())
    }

    /// Gives up the pending operation, used when building the description
    /// failed.
    pub(crate) fn abort(&mut self) {
        self.pending_operation = None;
    }

    pub(crate) fn has_pending_offer(&self) -> bool {
        self.pending_operation == Some(RTCSdpType::Offer)
    }

    pub(crate) fn close(&mut self) {
        self.pending_operation = None;
        self.signaling_state = RTCSignalingState::Closed;
    }

    /// local_description returns the pending local description if there is
    /// one and the current one otherwise.
    pub(crate) fn local_description(&self) -> Option<&RTCSessionDescription> {
        self.pending_local_description
            .as_ref()
            .or(self.current_local_description.as_ref())
    }

    pub(crate) fn remote_description(&self) -> Option<&RTCSessionDescription> {
        self.pending_remote_description
            .as_ref()
            .or(self.current_remote_description.as_ref())
    }

    /// Fills in the text of an empty local description with the last
    /// created offer or answer.
    pub(crate) fn fill_implicit_description(&self, sd: &mut RTCSessionDescription) -> Result<()> {
        if !sd.sdp.is_empty() {
            return Ok(());
        }
        match sd.sdp_type {
            RTCSdpType::Answer | RTCSdpType::Pranswer => sd.sdp.clone_from(&self.last_answer),
            RTCSdpType::Offer => sd.sdp.clone_from(&self.last_offer),
            RTCSdpType::Rollback => {}
            RTCSdpType::Unspecified => {
                return Err(Error::ErrPeerConnSdpTypeInvalidValueSetLocalDescription);
            }
        }
        Ok(())
    }

    /// Applies `sd` and returns the new signaling state.
    pub(crate) fn set_description(
        &mut self,
        sd: &RTCSessionDescription,
        op: StateChangeOp,
    ) -> Result<RTCSignalingState> {
        if sd.sdp_type == RTCSdpType::Unspecified {
            return Err(Error::ErrPeerConnSdpTypeInvalidValue);
        }
        let cur = self.signaling_state;

        if op == StateChangeOp::SetLocal
            && sd.sdp_type == RTCSdpType::Rollback
            && cur == RTCSignalingState::Stable
            && self.pending_operation.take().is_some()
        {
            debug!("rolled back an offer or answer that was never applied");
            return Ok(cur);
        }
        if op == StateChangeOp::SetRemote
            && sd.sdp_type == RTCSdpType::Offer
            && self.has_pending_offer()
        {
            return Err(Error::ErrOperationInProgress);
        }

        let next_state = match op {
            StateChangeOp::SetLocal => match sd.sdp_type {
                // stable->SetLocal(offer)->have-local-offer
                RTCSdpType::Offer => {
                    let next_state = check_next_signaling_state(
                        cur,
                        RTCSignalingState::HaveLocalOffer,
                        op,
                        sd.sdp_type,
                    )?;
                    if sd.sdp != self.last_offer {
                        return Err(Error::ErrSdpDoesNotMatchOffer);
                    }
                    self.pending_local_description = Some(sd.clone());
                    next_state
                }
                // have-remote-offer->SetLocal(answer)->stable
                // have-local-pranswer->SetLocal(answer)->stable
                RTCSdpType::Answer => {
                    let next_state =
                        check_next_signaling_state(cur, RTCSignalingState::Stable, op, sd.sdp_type)?;
                    if sd.sdp != self.last_answer {
                        return Err(Error::ErrSdpDoesNotMatchAnswer);
                    }
                    self.pending_local_description = None;
                    self.current_local_description = Some(sd.clone());
                    if let Some(remote) = self.pending_remote_description.take() {
                        self.current_remote_description = Some(remote);
                    }
                    next_state
                }
                // have-remote-offer->SetLocal(pranswer)->have-local-pranswer
                RTCSdpType::Pranswer => {
                    let next_state = check_next_signaling_state(
                        cur,
                        RTCSignalingState::HaveLocalPranswer,
                        op,
                        sd.sdp_type,
                    )?;
                    if sd.sdp != self.last_answer {
                        return Err(Error::ErrSdpDoesNotMatchAnswer);
                    }
                    self.pending_local_description = Some(sd.clone());
                    next_state
                }
                RTCSdpType::Rollback => {
                    let next_state =
                        check_next_signaling_state(cur, RTCSignalingState::Stable, op, sd.sdp_type)?;
                    self.pending_local_description = None;
                    self.pending_remote_description = None;
                    next_state
                }
                RTCSdpType::Unspecified => return Err(Error::ErrPeerConnStateChangeInvalid),
            },
            StateChangeOp::SetRemote => match sd.sdp_type {
                // stable->SetRemote(offer)->have-remote-offer
                RTCSdpType::Offer => {
                    let next_state = check_next_signaling_state(
                        cur,
                        RTCSignalingState::HaveRemoteOffer,
                        op,
                        sd.sdp_type,
                    )?;
                    self.pending_remote_description = Some(sd.clone());
                    next_state
                }
                // have-local-offer->SetRemote(answer)->stable
                // have-remote-pranswer->SetRemote(answer)->stable
                RTCSdpType::Answer => {
                    let next_state =
                        check_next_signaling_state(cur, RTCSignalingState::Stable, op, sd.sdp_type)?;
                    self.pending_remote_description = None;
                    self.current_remote_description = Some(sd.clone());
                    if let Some(local) = self.pending_local_description.take() {
                        self.current_local_description = Some(local);
                    }
                    next_state
                }
                // have-local-offer->SetRemote(pranswer)->have-remote-pranswer
                RTCSdpType::Pranswer => {
                    let next_state = check_next_signaling_state(
                        cur,
                        RTCSignalingState::HaveRemotePranswer,
                        op,
                        sd.sdp_type,
                    )?;
                    self.pending_remote_description = Some(sd.clone());
                    next_state
                }
                RTCSdpType::Rollback => {
                    let next_state =
                        check_next_signaling_state(cur, RTCSignalingState::Stable, op, sd.sdp_type)?;
                    self.pending_remote_description = None;
                    next_state
                }
                RTCSdpType::Unspecified => return Err(Error::ErrPeerConnStateChangeInvalid),
            },
        };

        if op == StateChangeOp::SetLocal || sd.sdp_type == RTCSdpType::Rollback {
            self.pending_operation = None;
        }
        self.is_negotiation_ongoing = next_state != RTCSignalingState::Stable;
        if next_state != cur {
            info!("signaling state changed from {cur} to {next_state}");
        }
        self.signaling_state = next_state;
        Ok(next_state)
    }

    /// Raises the next free mid above every numeric mid seen in either
    /// description.
    fn update_greater_mid(&mut self) {
        let descriptions = [
            self.current_local_description.as_ref(),
            self.current_remote_description.as_ref(),
            self.pending_remote_description.as_ref(),
        ];
        for parsed in descriptions
            .into_iter()
            .flatten()
            .filter_map(|d| d.parsed.as_ref())
        {
            for media in &parsed.media_descriptions {
                if let Some(n) = get_mid_value(media).and_then(|mid| mid.parse::<usize>().ok())
                    && n >= self.greater_mid
                {
                    self.greater_mid = n + 1;
                }
            }
        }
    }

    fn next_mid(&mut self) -> String {
        let mid = self.greater_mid.to_string();
        self.greater_mid += 1;
        mid
    }

    /// Lays out the m-sections of an offer: the sections already negotiated
    /// keep their mid and order, new local tracks get a fresh mid, receive-only
    /// sections are added as requested by `options`.
    pub(crate) fn offer_sections(
        &mut self,
        local_tracks: &mut [TrackLocal],
        want_application: bool,
        options: &RTCOfferOptions,
    ) -> Vec<MediaSection> {
        self.update_greater_mid();

        let mut sections = vec![];
        if let Some(parsed) = self
            .current_local_description
            .as_ref()
            .and_then(|d| d.parsed.as_ref())
        {
            for media in &parsed.media_descriptions {
                let Some(mid) = get_mid_value(media) else {
                    continue;
                };
                let kind = section_kind(media);
                let section = match kind {
                    MediaSectionKind::Application => MediaSection::application(mid.to_owned()),
                    MediaSectionKind::Unsupported { .. } => MediaSection {
                        mid: mid.to_owned(),
                        kind,
                        direction: Direction::Inactive,
                        codec: None,
                        sources: vec![],
                    },
                    MediaSectionKind::Audio | MediaSectionKind::Video => {
                        let track = local_tracks
                            .iter()
                            .find(|t| t.mid.as_deref() == Some(mid));
                        match track {
                            Some(track) => track_section(mid.to_owned(), track, Direction::SendRecv),
                            None => MediaSection {
                                mid: mid.to_owned(),
                                kind,
                                direction: Direction::RecvOnly,
                                codec: media.codecs().first().map(RTCRtpCodec::from),
                                sources: vec![],
                            },
                        }
                    }
                };
                sections.push(section);
            }
        }

        for track in local_tracks.iter_mut().filter(|t| t.mid.is_none()) {
            let mid = self.next_mid();
            debug!("assign mid {mid} to track {}", track.track.track_id());
            track.mid = Some(mid.clone());
            sections.push(track_section(mid, track, Direction::SendRecv));
        }

        for (wanted, kind) in [
            (options.offer_to_receive_audio, RtpCodecKind::Audio),
            (options.offer_to_receive_video, RtpCodecKind::Video),
        ] {
            let section_kind = MediaSectionKind::from(kind);
            if wanted && !sections.iter().any(|s| s.kind == section_kind) {
                sections.push(MediaSection {
                    mid: self.next_mid(),
                    kind: section_kind,
                    direction: Direction::RecvOnly,
                    codec: Some(RTCRtpCodec::default_for(kind)),
                    sources: vec![],
                });
            }
        }

        if want_application
            && !sections
                .iter()
                .any(|s| s.kind == MediaSectionKind::Application)
        {
            sections.push(MediaSection::application(self.next_mid()));
        }

        sections
    }

    /// Mirrors the m-sections of the remote offer: same mids and order,
    /// directions intersected with what the local tracks send, sections of
    /// unknown media rejected.
    pub(crate) fn answer_sections(
        &mut self,
        local_tracks: &mut [TrackLocal],
    ) -> Result<Vec<MediaSection>> {
        self.update_greater_mid();

        let remote = self
            .remote_description()
            .and_then(|d| d.parsed.as_ref())
            .ok_or(Error::ErrNoRemoteDescription)?;

        let mut sections = vec![];
        for media in &remote.media_descriptions {
            let mid = match get_mid_value(media) {
                Some(mid) if !mid.is_empty() => mid.to_owned(),
                _ => return Err(Error::ErrPeerConnRemoteDescriptionWithoutMidValue),
            };

            let kind = section_kind(media);
            let section = match kind {
                MediaSectionKind::Application => MediaSection::application(mid),
                MediaSectionKind::Unsupported { .. } => {
                    debug!("rejecting media section {mid} ({})", media.media_name.media);
                    MediaSection {
                        mid,
                        kind,
                        direction: Direction::Inactive,
                        codec: None,
                        sources: vec![],
                    }
                }
                MediaSectionKind::Audio | MediaSectionKind::Video => {
                    let offered = match get_peer_direction(media) {
                        Direction::Unspecified => Direction::SendRecv,
                        direction => direction,
                    };
                    let remote_codec = media.codecs().first().map(RTCRtpCodec::from);

                    let position = local_tracks
                        .iter()
                        .position(|t| t.mid.as_deref() == Some(mid.as_str()))
                        .or_else(|| {
                            local_tracks.iter().position(|t| {
                                t.mid.is_none()
                                    && MediaSectionKind::from(t.track.kind()) == kind
                                    && offered.has_recv()
                            })
                        });

                    match position {
                        Some(i) => {
                            let track = &mut local_tracks[i];
                            track.mid = Some(mid.clone());
                            let direction = Direction::SendRecv.intersect(offered);
                            let mut section = track_section(mid, track, direction);
                            if remote_codec.is_some() {
                                section.codec = remote_codec;
                            }
                            section
                        }
                        None => MediaSection {
                            mid,
                            direction: Direction::RecvOnly.intersect(offered),
                            codec: remote_codec.or_else(|| {
                                let kind = if kind == MediaSectionKind::Audio {
                                    RtpCodecKind::Audio
                                } else {
                                    RtpCodecKind::Video
                                };
                                Some(RTCRtpCodec::default_for(kind))
                            }),
                            kind,
                            sources: vec![],
                        },
                    }
                }
            };
            sections.push(section);
        }

        Ok(sections)
    }

    /// Writes `sections` into a new description of `sdp_type` and remembers
    /// its text for the matching `set_local_description`.
    pub(crate) fn build(
        &mut self,
        sdp_type: RTCSdpType,
        sections: &[MediaSection],
        params: PopulateSdpParams<'_>,
    ) -> RTCSessionDescription {
        let mut d = populate_sdp(
            SessionDescription::new_jsep_session_description(false),
            sections,
            params,
        );
        update_sdp_origin(&mut self.sdp_origin, &mut d);

        let description = RTCSessionDescription::from_parsed(sdp_type, d);
        match sdp_type {
            RTCSdpType::Offer => self.last_offer.clone_from(&description.sdp),
            _ => self.last_answer.clone_from(&description.sdp),
        }
        description
    }
}

fn section_kind(media: &MediaDescription) -> MediaSectionKind {
    let name = &media.media_name;
    if !is_rejected(media) {
        if name.media == MEDIA_SECTION_APPLICATION {
            return MediaSectionKind::Application;
        }
        match RtpCodecKind::from(name.media.as_str()) {
            RtpCodecKind::Audio => return MediaSectionKind::Audio,
            RtpCodecKind::Video => return MediaSectionKind::Video,
            RtpCodecKind::Unspecified => {}
        }
    }
    MediaSectionKind::Unsupported {
        media: name.media.clone(),
        protos: name.protos.clone(),
        formats: name.formats.clone(),
    }
}

fn track_section(mid: String, track: &TrackLocal, direction: Direction) -> MediaSection {
    let track = &track.track;
    MediaSection {
        mid,
        kind: MediaSectionKind::from(track.kind()),
        direction,
        codec: Some(track.codec().clone()),
        sources: vec![MediaSource {
            track_id: track.track_id().clone(),
            stream_id: track.stream_id().clone(),
            ssrc: track.ssrc(),
        }],
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::media_stream::track::MediaStreamTrack;
    use crate::peer_connection::sdp::DEFAULT_SCTP_PORT;

    fn params() -> PopulateSdpParams<'static> {
        PopulateSdpParams {
            ice_ufrag: "ufragufragufrag1",
            ice_pwd: "pwdpwdpwdpwdpwdpwdpwdpwdpwdpwd12",
            candidates: &[],
            gathering_complete: false,
            sctp_port: DEFAULT_SCTP_PORT,
            max_message_size: 262144,
        }
    }

    fn audio_track(id: &str) -> TrackLocal {
        TrackLocal::new(
            MediaStreamTrack::new(
                "stream".to_owned(),
                id.to_owned(),
                "microphone".to_owned(),
                RtpCodecKind::Audio,
            ),
            1460,
        )
    }

    fn offer(negotiator: &mut Negotiator, tracks: &mut [TrackLocal]) -> Result<RTCSessionDescription> {
        negotiator.begin(RTCSdpType::Offer)?;
        let sections = negotiator.offer_sections(tracks, true, &RTCOfferOptions::default());
        Ok(negotiator.build(RTCSdpType::Offer, &sections, params()))
    }

    fn answer(negotiator: &mut Negotiator, tracks: &mut [TrackLocal]) -> Result<RTCSessionDescription> {
        negotiator.begin(RTCSdpType::Answer)?;
        let sections = negotiator.answer_sections(tracks)?;
        Ok(negotiator.build(RTCSdpType::Answer, &sections, params()))
    }

    #[test]
    fn test_offer_answer_reaches_stable() -> Result<()> {
        let mut offerer = Negotiator::default();
        let mut answerer = Negotiator::default();
        let mut tracks = vec![audio_track("a")];

        let offer = offer(&mut offerer, &mut tracks)?;
        assert_eq!(tracks[0].mid.as_deref(), Some("0"));
        assert_eq!(
            offerer.set_description(&offer, StateChangeOp::SetLocal)?,
            RTCSignalingState::HaveLocalOffer
        );

        let remote_offer = RTCSessionDescription::offer(offer.sdp.clone())?;
        assert_eq!(
            answerer.set_description(&remote_offer, StateChangeOp::SetRemote)?,
            RTCSignalingState::HaveRemoteOffer
        );
        let answer = answer(&mut answerer, &mut [])?;
        let parsed = answer.parsed.as_ref().ok_or(Error::ErrNoRemoteDescription)?;
        assert_eq!(parsed.media_descriptions.len(), 2);
        assert_eq!(
            get_peer_direction(&parsed.media_descriptions[0]),
            Direction::RecvOnly
        );
        assert_eq!(
            answerer.set_description(&answer, StateChangeOp::SetLocal)?,
            RTCSignalingState::Stable
        );

        let remote_answer = RTCSessionDescription::answer(answer.sdp)?;
        assert_eq!(
            offerer.set_description(&remote_answer, StateChangeOp::SetRemote)?,
            RTCSignalingState::Stable
        );
        assert!(offerer.current_local_description.is_some());
        assert!(offerer.current_remote_description.is_some());
        assert!(offerer.pending_local_description.is_none());
        Ok(())
    }

    #[test]
    fn test_second_local_offer_is_invalid() -> Result<()> {
        let mut negotiator = Negotiator::default();
        let first = offer(&mut negotiator, &mut [])?;
        negotiator.set_description(&first, StateChangeOp::SetLocal)?;

        let second = offer(&mut negotiator, &mut [])?;
        let err = negotiator
            .set_description(&second, StateChangeOp::SetLocal)
            .err();
        assert!(err.is_some_and(|e| e.is_invalid_state_transition()));
        assert_eq!(negotiator.signaling_state, RTCSignalingState::HaveLocalOffer);
        Ok(())
    }

    #[test]
    fn test_foreign_local_offer_reports_state_error() -> Result<()> {
        let mut negotiator = Negotiator::default();
        let first = offer(&mut negotiator, &mut [])?;
        negotiator.set_description(&first, StateChangeOp::SetLocal)?;

        let mut other = Negotiator::default();
        let foreign = offer(&mut other, &mut [])?;
        assert_ne!(foreign.sdp, first.sdp);
        let err = negotiator
            .set_description(&foreign, StateChangeOp::SetLocal)
            .err();
        assert!(
            err.as_ref().is_some_and(|e| e.is_invalid_state_transition()),
            "{err:?}"
        );
        assert_eq!(negotiator.signaling_state, RTCSignalingState::HaveLocalOffer);
        Ok(())
    }

    #[test]
    fn test_pending_operation_guard() -> Result<()> {
        let mut negotiator = Negotiator::default();
        let created = offer(&mut negotiator, &mut [])?;
        assert_eq!(
            negotiator.begin(RTCSdpType::Offer),
            Err(Error::ErrOperationInProgress)
        );

        // a remote offer races the one we created
        let mut other = Negotiator::default();
        let remote = offer(&mut other, &mut [])?;
        let remote = RTCSessionDescription::offer(remote.sdp)?;
        assert_eq!(
            negotiator.set_description(&remote, StateChangeOp::SetRemote),
            Err(Error::ErrOperationInProgress)
        );

        negotiator.set_description(&created, StateChangeOp::SetLocal)?;
        assert!(negotiator.begin(RTCSdpType::Offer).is_ok());
        Ok(())
    }

    #[test]
    fn test_rollback() -> Result<()> {
        let mut negotiator = Negotiator::default();
        assert_eq!(
            negotiator.set_description(&RTCSessionDescription::rollback(), StateChangeOp::SetLocal),
            Err(Error::ErrSignalingStateCannotRollback)
        );

        let created = offer(&mut negotiator, &mut [])?;
        // discarding an offer that was never applied
        assert_eq!(
            negotiator.set_description(&RTCSessionDescription::rollback(), StateChangeOp::SetLocal)?,
            RTCSignalingState::Stable
        );

        negotiator.begin(RTCSdpType::Offer)?;
        negotiator.set_description(&created, StateChangeOp::SetLocal)?;
        assert_eq!(
            negotiator.set_description(&RTCSessionDescription::rollback(), StateChangeOp::SetLocal)?,
            RTCSignalingState::Stable
        );
        assert!(negotiator.local_description().is_none());
        Ok(())
    }

    #[test]
    fn test_sdp_must_match_created() -> Result<()> {
        let mut negotiator = Negotiator::default();
        let created = offer(&mut negotiator, &mut [])?;
        let mut tampered = created.clone();
        tampered.sdp.push_str("a=foo\r\n");
        assert_eq!(
            negotiator.set_description(&tampered, StateChangeOp::SetLocal),
            Err(Error::ErrSdpDoesNotMatchOffer)
        );

        let mut implicit = RTCSessionDescription {
            sdp_type: RTCSdpType::Offer,
            ..Default::default()
        };
        negotiator.fill_implicit_description(&mut implicit)?;
        assert_eq!(implicit, created);
        Ok(())
    }

    #[test]
    fn test_answer_without_mid_fails() -> Result<()> {
        let mut negotiator = Negotiator::default();
        let sdp = "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n\
                   m=audio 9 UDP/TLS/RTP/SAVPF 111\r\na=rtpmap:111 opus/48000/2\r\n";
        let remote = RTCSessionDescription::offer(sdp.to_owned())?;
        negotiator.set_description(&remote, StateChangeOp::SetRemote)?;
        assert_eq!(
            negotiator.answer_sections(&mut []).err(),
            Some(Error::ErrPeerConnRemoteDescriptionWithoutMidValue)
        );
        Ok(())
    }

    #[test]
    fn test_answer_rejects_unknown_media() -> Result<()> {
        let mut negotiator = Negotiator::default();
        let sdp = "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n\
                   m=text 9 RTP/AVP 98\r\na=mid:0\r\n";
        let remote = RTCSessionDescription::offer(sdp.to_owned())?;
        negotiator.set_description(&remote, StateChangeOp::SetRemote)?;
        let answer = answer(&mut negotiator, &mut [])?;
        let parsed = answer.parsed.as_ref().ok_or(Error::ErrNoRemoteDescription)?;
        assert_eq!(parsed.media_descriptions.len(), 1);
        assert!(is_rejected(&parsed.media_descriptions[0]));
        Ok(())
    }

    #[test]
    fn test_renegotiation_keeps_mids() -> Result<()> {
        let mut offerer = Negotiator::default();
        let mut answerer = Negotiator::default();
        let mut tracks = vec![audio_track("a")];

        let first = offer(&mut offerer, &mut tracks)?;
        offerer.set_description(&first, StateChangeOp::SetLocal)?;
        answerer.set_description(
            &RTCSessionDescription::offer(first.sdp.clone())?,
            StateChangeOp::SetRemote,
        )?;
        let first_answer = answer(&mut answerer, &mut [])?;
        answerer.set_description(&first_answer, StateChangeOp::SetLocal)?;
        offerer.set_description(
            &RTCSessionDescription::answer(first_answer.sdp)?,
            StateChangeOp::SetRemote,
        )?;

        tracks.push(audio_track("b"));
        let second = offer(&mut offerer, &mut tracks)?;
        let parsed = second.parsed.as_ref().ok_or(Error::ErrNoRemoteDescription)?;
        let mids: Vec<_> = parsed
            .media_descriptions
            .iter()
            .filter_map(get_mid_value)
            .collect();
        assert_eq!(mids, vec!["0", "1", "2"]);
        assert_eq!(tracks[1].mid.as_deref(), Some("2"));
        assert!(parsed.origin.session_version > 1);
        Ok(())
    }
}
