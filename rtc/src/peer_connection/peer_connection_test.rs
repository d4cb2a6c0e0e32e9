use super::*;
use crate::data_channel::RTCDataChannelState;
use crate::media_stream::track::RtpCodecKind;
use crate::peer_connection::configuration::RTCConfigurationBuilder;
use crate::peer_connection::event::RTCPeerConnectionEvent;
use crate::peer_connection::event::data_channel_event::RTCDataChannelEvent;
use sansio::Protocol;

fn new_pc() -> Result<RTCPeerConnection> {
    RTCPeerConnection::new(RTCConfigurationBuilder::new().build())
}

fn drain_events(pc: &mut RTCPeerConnection) -> Vec<RTCPeerConnectionEvent> {
    let mut events = vec![];
    while let Some(evt) = pc.poll_event() {
        events.push(evt);
    }
    events
}

fn audio_track(id: &str) -> MediaStreamTrack {
    MediaStreamTrack::new(
        "stream".to_owned(),
        id.to_owned(),
        "microphone".to_owned(),
        RtpCodecKind::Audio,
    )
}

/// Runs a complete offer/answer exchange from `offerer` to `answerer`.
fn negotiate(offerer: &mut RTCPeerConnection, answerer: &mut RTCPeerConnection) -> Result<()> {
    let offer = offerer.create_offer(None)?;
    offerer.set_local_description(offer.clone())?;
    answerer.set_remote_description(RTCSessionDescription::offer(offer.sdp)?)?;

    let answer = answerer.create_answer(None)?;
    answerer.set_local_description(answer.clone())?;
    offerer.set_remote_description(RTCSessionDescription::answer(answer.sdp)?)?;
    Ok(())
}

#[test]
fn test_offer_answer_reaches_stable() -> Result<()> {
    let mut offerer = new_pc()?;
    let mut answerer = new_pc()?;
    offerer.create_data_channel("chat", None)?;

    let offer = offerer.create_offer(None)?;
    offerer.set_local_description(offer.clone())?;
    assert_eq!(offerer.signaling_state(), RTCSignalingState::HaveLocalOffer);

    answerer.set_remote_description(RTCSessionDescription::offer(offer.sdp)?)?;
    assert_eq!(answerer.signaling_state(), RTCSignalingState::HaveRemoteOffer);

    let answer = answerer.create_answer(None)?;
    answerer.set_local_description(answer.clone())?;
    offerer.set_remote_description(RTCSessionDescription::answer(answer.sdp)?)?;

    assert_eq!(offerer.signaling_state(), RTCSignalingState::Stable);
    assert_eq!(answerer.signaling_state(), RTCSignalingState::Stable);
    assert!(offerer.current_local_description().is_some());
    assert!(offerer.pending_local_description().is_none());
    assert!(answerer.current_remote_description().is_some());

    let events = drain_events(&mut offerer);
    assert!(events.contains(&RTCPeerConnectionEvent::OnSignalingStateChangeEvent(
        RTCSignalingState::HaveLocalOffer
    )));
    assert!(events.contains(&RTCPeerConnectionEvent::OnSignalingStateChangeEvent(
        RTCSignalingState::Stable
    )));
    Ok(())
}

#[test]
fn test_second_local_offer_is_invalid() -> Result<()> {
    let mut pc = new_pc()?;
    let offer = pc.create_offer(None)?;
    pc.set_local_description(offer.clone())?;

    let err = pc.set_local_description(offer).err();
    assert!(err.is_some_and(|e| e.is_invalid_state_transition()));
    assert_eq!(pc.signaling_state(), RTCSignalingState::HaveLocalOffer);
    Ok(())
}

#[test]
fn test_create_offer_while_pending() -> Result<()> {
    let mut pc = new_pc()?;
    let offer = pc.create_offer(None)?;
    assert_eq!(
        pc.create_offer(None).err(),
        Some(Error::ErrOperationInProgress)
    );

    pc.set_local_description(offer)?;
    pc.set_local_description(RTCSessionDescription::rollback())?;
    assert_eq!(pc.signaling_state(), RTCSignalingState::Stable);
    assert!(pc.create_offer(None).is_ok());
    Ok(())
}

#[test]
fn test_create_answer_without_offer() -> Result<()> {
    let mut pc = new_pc()?;
    assert_eq!(
        pc.create_answer(None).err(),
        Some(Error::ErrNoRemoteDescription)
    );
    Ok(())
}

#[test]
fn test_implicit_local_description() -> Result<()> {
    let mut pc = new_pc()?;
    let offer = pc.create_offer(None)?;

    let mut implicit = offer.clone();
    implicit.sdp.clear();
    implicit.parsed = None;
    pc.set_local_description(implicit)?;
    assert_eq!(pc.local_description().map(|d| &d.sdp), Some(&offer.sdp));
    Ok(())
}

#[test]
fn test_negotiation_needed_once() -> Result<()> {
    let mut pc = new_pc()?;
    pc.create_data_channel("a", None)?;
    pc.create_data_channel("b", None)?;

    let needed = drain_events(&mut pc)
        .into_iter()
        .filter(|e| *e == RTCPeerConnectionEvent::OnNegotiationNeededEvent)
        .count();
    assert_eq!(needed, 1);
    Ok(())
}

#[test]
fn test_negotiation_needed_after_stable() -> Result<()> {
    let mut offerer = new_pc()?;
    let mut answerer = new_pc()?;
    offerer.create_data_channel("chat", None)?;
    negotiate(&mut offerer, &mut answerer)?;
    drain_events(&mut offerer);

    // a second channel rides on the negotiated application section
    offerer.create_data_channel("more", None)?;
    assert!(
        !drain_events(&mut offerer).contains(&RTCPeerConnectionEvent::OnNegotiationNeededEvent)
    );

    offerer.add_track(audio_track("audio"))?;
    assert!(
        drain_events(&mut offerer).contains(&RTCPeerConnectionEvent::OnNegotiationNeededEvent)
    );
    Ok(())
}

#[test]
fn test_restart_ice_changes_credentials() -> Result<()> {
    let mut offerer = new_pc()?;
    let mut answerer = new_pc()?;
    offerer.create_data_channel("chat", None)?;
    negotiate(&mut offerer, &mut answerer)?;
    drain_events(&mut offerer);

    let before = offerer.local_ice_parameters();
    offerer.restart_ice()?;
    assert!(
        drain_events(&mut offerer).contains(&RTCPeerConnectionEvent::OnNegotiationNeededEvent)
    );

    let offer = offerer.create_offer(None)?;
    let after = offerer.local_ice_parameters();
    assert_ne!(before.username_fragment, after.username_fragment);
    assert!(offer.sdp.contains(&format!("a=ice-ufrag:{}", after.username_fragment)));
    Ok(())
}

#[test]
fn test_remote_offer_not_applied_when_ice_fails() -> Result<()> {
    let mut offerer = new_pc()?;
    let mut answerer = new_pc()?;
    offerer.create_data_channel("chat", None)?;
    let offer = offerer.create_offer(None)?;
    offerer.set_local_description(offer.clone())?;

    answerer
        .pipeline_context
        .ice_handler_context
        .ice_transport
        .agent
        .close()?;
    drain_events(&mut answerer);

    assert_eq!(
        answerer.set_remote_description(RTCSessionDescription::offer(offer.sdp)?),
        Err(Error::ErrClosed)
    );
    assert_eq!(answerer.signaling_state(), RTCSignalingState::Stable);
    assert!(answerer.remote_description().is_none());
    assert!(answerer.pending_remote_description().is_none());
    assert!(
        !drain_events(&mut answerer)
            .iter()
            .any(|e| matches!(e, RTCPeerConnectionEvent::OnSignalingStateChangeEvent(_)))
    );
    Ok(())
}

#[test]
fn test_duplicate_track() -> Result<()> {
    let mut pc = new_pc()?;
    pc.add_track(audio_track("audio"))?;
    assert_eq!(
        pc.add_track(audio_track("audio")).err(),
        Some(Error::ErrTrackAlreadyExists)
    );
    assert_eq!(pc.track_ids(), vec!["audio".to_owned()]);

    pc.remove_track("audio")?;
    assert_eq!(pc.remove_track("audio"), Err(Error::ErrTrackNotFound));
    assert!(pc.track("audio").is_none());
    Ok(())
}

#[test]
fn test_remote_track_announced() -> Result<()> {
    let mut offerer = new_pc()?;
    let mut answerer = new_pc()?;
    offerer.add_track(audio_track("audio"))?;
    negotiate(&mut offerer, &mut answerer)?;

    let track_event = drain_events(&mut answerer).into_iter().find_map(|e| match e {
        RTCPeerConnectionEvent::OnTrack(evt) => Some(evt),
        _ => None,
    });
    let track_event = track_event.ok_or(Error::ErrTrackNotFound)?;
    assert_eq!(track_event.track_id, "audio");
    assert_eq!(track_event.kind, RtpCodecKind::Audio);
    assert_eq!(track_event.stream_ids, vec!["stream".to_owned()]);

    let remote = answerer.remote_tracks();
    assert_eq!(remote.len(), 1);
    assert_eq!(remote[0].ssrc(), track_event.ssrc);
    Ok(())
}

#[test]
fn test_negotiated_data_channel_id_in_use() -> Result<()> {
    let mut pc = new_pc()?;
    let init = RTCDataChannelInit {
        negotiated: Some(5),
        ..Default::default()
    };
    pc.create_data_channel("a", Some(init.clone()))?;
    assert_eq!(
        pc.create_data_channel("b", Some(init)).err(),
        Some(Error::ErrDataChannelIdInUse)
    );
    Ok(())
}

#[test]
fn test_add_ice_candidate_before_remote_description() -> Result<()> {
    let mut pc = new_pc()?;
    pc.add_ice_candidate(RTCIceCandidateInit {
        candidate: "candidate:1 1 udp 2130706431 192.168.1.10 50000 typ host".to_owned(),
        sdp_mid: Some("0".to_owned()),
        sdp_mline_index: Some(0),
        username_fragment: None,
    })?;
    // end of candidates
    pc.add_ice_candidate(RTCIceCandidateInit::default())?;
    Ok(())
}

#[test]
fn test_close() -> Result<()> {
    let mut pc = new_pc()?;
    let id = pc.create_data_channel("chat", None)?.id();
    drain_events(&mut pc);

    pc.close()?;
    let events = drain_events(&mut pc);
    let closes = events
        .iter()
        .filter(|e| {
            **e == RTCPeerConnectionEvent::OnDataChannel(RTCDataChannelEvent::OnClose(id))
        })
        .count();
    assert_eq!(closes, 1);
    assert!(events.contains(&RTCPeerConnectionEvent::OnIceConnectionStateChangeEvent(
        RTCIceConnectionState::Closed
    )));
    assert!(events.contains(&RTCPeerConnectionEvent::OnConnectionStateChangeEvent(
        RTCPeerConnectionState::Closed
    )));

    assert_eq!(pc.signaling_state(), RTCSignalingState::Closed);
    assert_eq!(pc.ice_connection_state(), RTCIceConnectionState::Closed);
    assert_eq!(
        pc.data_channel(id).map(|dc| dc.ready_state()).transpose()?,
        Some(RTCDataChannelState::Closed)
    );

    assert_eq!(pc.create_offer(None).err(), Some(Error::ErrConnectionClosed));
    assert_eq!(
        pc.create_data_channel("late", None).err(),
        Some(Error::ErrConnectionClosed)
    );

    // closing twice is a no-op and emits nothing
    pc.close()?;
    assert!(pc.poll_event().is_none());
    assert!(pc.poll_timeout().is_none());
    Ok(())
}

#[test]
fn test_get_stats() -> Result<()> {
    let mut pc = new_pc()?;
    pc.create_data_channel("chat", None)?;

    let report = pc.get_stats(Instant::now());
    let peer_connection = report.peer_connection().ok_or(Error::ErrNoRemoteDescription)?;
    assert_eq!(peer_connection.data_channels_requested, 1);
    assert_eq!(peer_connection.data_channels_opened, 0);
    assert!(report.transport().is_some());

    let channels: Vec<_> = report.data_channels().collect();
    assert_eq!(channels.len(), 1);
    assert_eq!(channels[0].label, "chat");
    assert_eq!(channels[0].state, RTCDataChannelState::Connecting);

    // taking a report leaves the connection untouched
    assert_eq!(pc.signaling_state(), RTCSignalingState::Stable);
    assert_eq!(pc.get_stats(Instant::now()).len(), report.len());
    Ok(())
}
