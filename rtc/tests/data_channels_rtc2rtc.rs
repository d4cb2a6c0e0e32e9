/// Data channels between two rtc (sansio) peers over an in-memory network.
///
/// Covers the open handshake, message exchange in both directions,
/// backpressure and the statistics of an established connection.
mod common;

use anyhow::Result;
use bytes::BytesMut;
use common::{Network, init_log};
use rtc::data_channel::{RTCDataChannelInit, RTCDataChannelState};
use rtc::peer_connection::configuration::setting_engine::SettingEngine;
use rtc::peer_connection::event::RTCPeerConnectionEvent;
use rtc::peer_connection::event::data_channel_event::RTCDataChannelEvent;
use rtc::peer_connection::state::{
    RTCIceConnectionState, RTCPeerConnectionState, RTCSignalingState,
};
use rtc::shared::error::Error;
use std::time::Duration;

const TEST_MESSAGE: &str = "Hello from offer!";
const ECHO_MESSAGE: &str = "Echo from answer!";

fn remote_channel(network: &Network) -> Option<usize> {
    network.answerer.events.iter().find_map(|e| match e {
        RTCPeerConnectionEvent::OnDataChannel(RTCDataChannelEvent::OnDataChannel(id)) => Some(*id),
        _ => None,
    })
}

/// Negotiates one channel and runs until both ends can use it.
fn open_channel(network: &mut Network) -> Result<usize> {
    let id = network
        .offerer
        .pc
        .create_data_channel("test-channel", None)?
        .id();
    network.negotiate()?;
    assert_eq!(network.offerer.pc.signaling_state(), RTCSignalingState::Stable);
    assert_eq!(network.answerer.pc.signaling_state(), RTCSignalingState::Stable);

    network.run_until(Duration::from_secs(10), |n| {
        n.offerer.saw(&RTCPeerConnectionEvent::OnDataChannel(
            RTCDataChannelEvent::OnOpen(id),
        )) && remote_channel(n).is_some()
    })?;
    Ok(id)
}

#[test]
fn test_data_channel_rtc_to_rtc() -> Result<()> {
    init_log();
    let mut network = Network::new(SettingEngine::default(), SettingEngine::default())?;
    let id = open_channel(&mut network)?;

    assert_eq!(
        network.offerer.ice_connection_state(),
        RTCIceConnectionState::Connected
    );
    assert_eq!(
        network.answerer.connection_state(),
        RTCPeerConnectionState::Connected
    );

    network
        .offerer
        .pc
        .data_channel(id)
        .ok_or(Error::ErrDataChannelClosed)?
        .send_text(TEST_MESSAGE)?;
    network.run_until(Duration::from_secs(5), |n| {
        n.answerer.text_messages().contains(&TEST_MESSAGE.to_owned())
    })?;

    let remote_id = remote_channel(&network).ok_or(Error::ErrDataChannelClosed)?;
    let mut remote = network
        .answerer
        .pc
        .data_channel(remote_id)
        .ok_or(Error::ErrDataChannelClosed)?;
    assert_eq!(remote.label()?, "test-channel");
    assert_eq!(remote.ready_state()?, RTCDataChannelState::Open);
    remote.send_text(ECHO_MESSAGE)?;

    network.run_until(Duration::from_secs(5), |n| {
        n.offerer.text_messages().contains(&ECHO_MESSAGE.to_owned())
    })?;

    let report = network.offerer.pc.get_stats(network.now);
    let peer_connection = report.peer_connection().ok_or(Error::ErrNoRemoteDescription)?;
    assert_eq!(peer_connection.data_channels_opened, 1);
    assert!(report.selected_candidate_pair().is_some());
    let channel = report
        .data_channels()
        .next()
        .ok_or(Error::ErrDataChannelClosed)?;
    assert_eq!(channel.messages_sent, 1);
    assert_eq!(channel.messages_received, 1);
    Ok(())
}

#[test]
fn test_data_channel_unordered_binary() -> Result<()> {
    init_log();
    let mut network = Network::new(SettingEngine::default(), SettingEngine::default())?;
    let id = network
        .offerer
        .pc
        .create_data_channel(
            "unordered",
            Some(RTCDataChannelInit {
                ordered: Some(false),
                max_retransmits: Some(0),
                ..Default::default()
            }),
        )?
        .id();
    network.negotiate()?;
    network.run_until(Duration::from_secs(10), |n| {
        n.offerer.saw(&RTCPeerConnectionEvent::OnDataChannel(
            RTCDataChannelEvent::OnOpen(id),
        ))
    })?;

    let mut dc = network
        .offerer
        .pc
        .data_channel(id)
        .ok_or(Error::ErrDataChannelClosed)?;
    assert!(!dc.ordered()?);
    assert_eq!(dc.max_retransmits()?, Some(0));
    dc.send(BytesMut::from(&[1u8, 2, 3][..]))?;

    network.run_until(Duration::from_secs(5), |n| !n.answerer.messages.is_empty())?;
    let remote_id = remote_channel(&network).ok_or(Error::ErrDataChannelClosed)?;
    let remote = network
        .answerer
        .pc
        .data_channel(remote_id)
        .ok_or(Error::ErrDataChannelClosed)?;
    assert!(!remote.ordered()?);
    Ok(())
}

#[test]
fn test_data_channel_buffer_full() -> Result<()> {
    init_log();
    let mut setting_engine = SettingEngine::default();
    setting_engine.set_data_channel_high_water_mark(1024);
    let mut network = Network::new(setting_engine, SettingEngine::default())?;
    let id = open_channel(&mut network)?;

    let mut dc = network
        .offerer
        .pc
        .data_channel(id)
        .ok_or(Error::ErrDataChannelClosed)?;
    dc.send(BytesMut::from(&[0u8; 1000][..]))?;
    assert_eq!(dc.buffered_amount()?, 1000);

    assert_eq!(
        dc.send(BytesMut::from(&[0u8; 100][..])),
        Err(Error::ErrBufferFull)
    );
    // the rejected message is not queued
    assert_eq!(dc.buffered_amount()?, 1000);

    // acknowledged data frees the buffer
    network.run_until(Duration::from_secs(5), |n| !n.answerer.messages.is_empty())?;
    network.run_for(Duration::from_millis(500))?;
    let mut dc = network
        .offerer
        .pc
        .data_channel(id)
        .ok_or(Error::ErrDataChannelClosed)?;
    assert_eq!(dc.buffered_amount()?, 0);
    dc.send(BytesMut::from(&[0u8; 100][..]))?;
    assert_eq!(network.answerer.messages.len(), 1);
    Ok(())
}

#[test]
fn test_data_channel_close_by_peer() -> Result<()> {
    init_log();
    let mut network = Network::new(SettingEngine::default(), SettingEngine::default())?;
    let id = open_channel(&mut network)?;
    let remote_id = remote_channel(&network).ok_or(Error::ErrDataChannelClosed)?;

    network
        .offerer
        .pc
        .data_channel(id)
        .ok_or(Error::ErrDataChannelClosed)?
        .close()?;
    network.run_until(Duration::from_secs(5), |n| {
        n.offerer.saw(&RTCPeerConnectionEvent::OnDataChannel(
            RTCDataChannelEvent::OnClose(id),
        )) && n.answerer.saw(&RTCPeerConnectionEvent::OnDataChannel(
            RTCDataChannelEvent::OnClose(remote_id),
        ))
    })?;

    let mut dc = network
        .offerer
        .pc
        .data_channel(id)
        .ok_or(Error::ErrDataChannelClosed)?;
    assert_eq!(dc.ready_state()?, RTCDataChannelState::Closed);
    assert_eq!(dc.send_text("late"), Err(Error::ErrDataChannelClosed));

    // the connection itself stays up
    assert_eq!(
        network.offerer.connection_state(),
        RTCPeerConnectionState::Connected
    );
    let report = network.offerer.pc.get_stats(network.now);
    assert_eq!(
        report.peer_connection().map(|s| s.data_channels_closed),
        Some(1)
    );
    Ok(())
}
