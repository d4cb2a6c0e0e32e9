use super::*;
use sansio::Protocol;
use sctp::{Association, Event, TransportConfig};
use shared::{TransportContext, TransportMessage};
use std::time::Instant;

fn dial_and_accept(cfg: DataChannelConfig, stream_id: u16) -> Result<(DataChannel, DataChannel)> {
    let mut dc0 = DataChannel::dial(cfg, stream_id)?;
    let msg = dc0.poll_write().ok_or(Error::ErrStreamNotExisted)?;
    let mut dc1 = DataChannel::accept(
        DataChannelConfig::default(),
        msg.stream_id,
        msg.ppi,
        &msg.payload,
    )?;

    let ack = dc1.poll_write().ok_or(Error::ErrStreamNotExisted)?;
    dc0.handle_read(ack)?;
    Ok((dc0, dc1))
}

fn events(dc: &mut DataChannel) -> Vec<DataChannelEvent> {
    let mut events = vec![];
    while let Some(e) = dc.poll_event() {
        events.push(e);
    }
    events
}

#[test]
fn test_data_channel_channel_type_reliable_ordered() -> Result<()> {
    let mut sbuf = vec![0u8; 1000];

    let cfg = DataChannelConfig {
        channel_type: ChannelType::Reliable,
        reliability_parameter: 123,
        label: "data".to_string(),
        ..Default::default()
    };

    let (mut dc0, mut dc1) = dial_and_accept(cfg.clone(), 100)?;

    assert_eq!(dc0.config, cfg, "local config should match");
    assert_eq!(dc1.config, cfg, "remote config should match");
    assert_eq!(dc0.state(), DataChannelState::Open);
    assert_eq!(dc1.state(), DataChannelState::Open);
    assert_eq!(events(&mut dc0), vec![DataChannelEvent::Open]);
    assert_eq!(events(&mut dc1), vec![DataChannelEvent::Open]);

    sbuf[0..4].copy_from_slice(&1u32.to_be_bytes());
    dc0.send(true, BytesMut::from(&sbuf[0..4]))?;
    assert_eq!(dc0.bytes_sent(), 4, "data length should match");

    sbuf[0..4].copy_from_slice(&2u32.to_be_bytes());
    dc0.send(false, BytesMut::from(&sbuf[0..4]))?;
    assert_eq!(dc0.bytes_sent(), 8, "data length should match");
    assert_eq!(dc0.messages_sent(), 2);

    let msg = dc0.poll_write().ok_or(Error::ErrStreamNotExisted)?;
    assert_eq!(msg.stream_id, 100);
    dc1.handle_read(msg)?;
    assert_eq!(dc1.bytes_received(), 4, "data length should match");
    let data_channel_message = dc1.poll_read().ok_or(Error::ErrStreamNotExisted)?;
    assert!(data_channel_message.is_string());
    assert_eq!(
        1,
        u32::from_be_bytes([
            data_channel_message.payload[0],
            data_channel_message.payload[1],
            data_channel_message.payload[2],
            data_channel_message.payload[3]
        ]),
        "data should match"
    );

    let msg = dc0.poll_write().ok_or(Error::ErrStreamNotExisted)?;
    dc1.handle_read(msg)?;
    assert_eq!(dc1.bytes_received(), 8, "data length should match");
    let data_channel_message = dc1.poll_read().ok_or(Error::ErrStreamNotExisted)?;
    assert!(!data_channel_message.is_string());
    assert_eq!(
        2,
        u32::from_be_bytes([
            data_channel_message.payload[0],
            data_channel_message.payload[1],
            data_channel_message.payload[2],
            data_channel_message.payload[3]
        ]),
        "data should match"
    );
    assert_eq!(dc1.messages_received(), 2);

    Ok(())
}

#[test]
fn test_data_channel_negotiated_opens_without_dcep() -> Result<()> {
    let cfg = DataChannelConfig {
        negotiated: true,
        label: "pre".to_string(),
        ..Default::default()
    };
    let mut dc = DataChannel::dial(cfg, 4)?;

    assert!(dc.poll_write().is_none(), "no DATA_CHANNEL_OPEN expected");
    assert_eq!(dc.state(), DataChannelState::Open);
    assert_eq!(events(&mut dc), vec![DataChannelEvent::Open]);
    Ok(())
}

#[test]
fn test_data_channel_write_before_ack() -> Result<()> {
    let mut dc = DataChannel::dial(DataChannelConfig::default(), 0)?;
    assert_eq!(dc.state(), DataChannelState::Connecting);
    assert_eq!(
        dc.send(false, BytesMut::from(&b"x"[..])),
        Err(Error::ErrDataChannelNotOpen)
    );
    assert_eq!(dc.messages_sent(), 0);
    Ok(())
}

#[test]
fn test_data_channel_accept_rejects_non_dcep() {
    let result = DataChannel::accept(
        DataChannelConfig::default(),
        1,
        PayloadProtocolIdentifier::Binary,
        &[0x03],
    );
    assert_eq!(
        result.err(),
        Some(Error::InvalidPayloadProtocolIdentifier(53))
    );

    let result = DataChannel::accept(
        DataChannelConfig::default(),
        1,
        PayloadProtocolIdentifier::Dcep,
        &[0x02],
    );
    assert_eq!(result.err(), Some(Error::InvalidMessageType(0x02)));
}

#[test]
fn test_data_channel_empty_messages() -> Result<()> {
    let (mut dc0, mut dc1) = dial_and_accept(DataChannelConfig::default(), 2)?;

    dc0.send(true, BytesMut::new())?;
    dc0.send(false, BytesMut::new())?;
    assert_eq!(dc0.bytes_sent(), 0);

    let msg = dc0.poll_write().ok_or(Error::ErrStreamNotExisted)?;
    assert_eq!(msg.ppi, PayloadProtocolIdentifier::StringEmpty);
    assert_eq!(&msg.payload[..], &[0]);
    dc1.handle_read(msg)?;

    let msg = dc0.poll_write().ok_or(Error::ErrStreamNotExisted)?;
    assert_eq!(msg.ppi, PayloadProtocolIdentifier::BinaryEmpty);
    dc1.handle_read(msg)?;

    let text = dc1.poll_read().ok_or(Error::ErrStreamNotExisted)?;
    assert!(text.is_string());
    assert!(text.payload.is_empty());
    let binary = dc1.poll_read().ok_or(Error::ErrStreamNotExisted)?;
    assert!(!binary.is_string());
    assert!(binary.payload.is_empty());
    Ok(())
}

#[test]
fn test_data_channel_empty_messages_buffer_nothing() -> Result<()> {
    let (mut dc, _) = dial_and_accept(DataChannelConfig::default(), 0)?;
    dc.set_high_water_mark(4);

    dc.send(false, BytesMut::from(&b"abcd"[..]))?;
    dc.send(true, BytesMut::new())?;
    dc.send(false, BytesMut::new())?;
    assert_eq!(dc.buffered_amount(), 4);
    assert_eq!(dc.messages_sent(), 3);

    // the association counts one padding byte per empty message
    dc.handle_event(StreamEvent::BufferedAmount(6))?;
    assert_eq!(dc.buffered_amount(), 4);
    dc.handle_event(StreamEvent::BufferedAmount(2))?;
    assert_eq!(dc.buffered_amount(), 0);
    dc.handle_event(StreamEvent::BufferedAmount(1))?;
    assert_eq!(dc.buffered_amount(), 0);
    dc.handle_event(StreamEvent::BufferedAmount(0))?;
    assert_eq!(dc.buffered_amount(), 0);

    dc.send(false, BytesMut::from(&b"wxyz"[..]))?;
    assert_eq!(dc.buffered_amount(), 4);
    Ok(())
}

#[test]
fn test_data_channel_buffer_full() -> Result<()> {
    let (mut dc, _) = dial_and_accept(DataChannelConfig::default(), 0)?;
    dc.set_high_water_mark(10);

    dc.send(false, BytesMut::from(&[0u8; 8][..]))?;
    assert_eq!(dc.buffered_amount(), 8);
    assert_eq!(
        dc.send(false, BytesMut::from(&[0u8; 3][..])),
        Err(Error::ErrBufferFull)
    );
    assert_eq!(dc.buffered_amount(), 8, "rejected message must not be queued");
    assert_eq!(dc.messages_sent(), 1);

    dc.send(false, BytesMut::from(&[0u8; 2][..]))?;
    assert_eq!(dc.buffered_amount(), 10);
    Ok(())
}

#[test]
fn test_data_channel_buffered_amount_low() -> Result<()> {
    let (mut dc, _) = dial_and_accept(DataChannelConfig::default(), 0)?;
    events(&mut dc);
    dc.set_buffered_amount_low_threshold(100);

    dc.send(false, BytesMut::from(&[0u8; 300][..]))?;
    dc.handle_event(StreamEvent::BufferedAmount(200))?;
    assert!(events(&mut dc).is_empty());

    dc.handle_event(StreamEvent::BufferedAmount(100))?;
    assert_eq!(events(&mut dc), vec![DataChannelEvent::BufferedAmountLow]);

    dc.handle_event(StreamEvent::BufferedAmount(0))?;
    assert!(events(&mut dc).is_empty(), "only a downward crossing fires");
    Ok(())
}

#[test]
fn test_data_channel_close() -> Result<()> {
    let (mut dc0, mut dc1) = dial_and_accept(DataChannelConfig::default(), 0)?;
    events(&mut dc0);
    events(&mut dc1);

    dc0.close()?;
    assert_eq!(dc0.state(), DataChannelState::Closing);
    assert_eq!(
        dc0.send(false, BytesMut::from(&b"late"[..])),
        Err(Error::ErrDataChannelClosed)
    );

    dc1.handle_event(StreamEvent::Closing)?;
    assert_eq!(dc1.state(), DataChannelState::Closing);
    assert_eq!(events(&mut dc1), vec![DataChannelEvent::Closing]);

    dc0.handle_event(StreamEvent::Closed)?;
    dc1.handle_event(StreamEvent::Closed)?;
    assert_eq!(dc0.state(), DataChannelState::Closed);
    assert_eq!(events(&mut dc0), vec![DataChannelEvent::Closed]);
    assert_eq!(events(&mut dc1), vec![DataChannelEvent::Closed]);

    dc1.handle_event(StreamEvent::Closed)?;
    assert!(events(&mut dc1).is_empty(), "closed is terminal");
    Ok(())
}

#[test]
fn test_channel_type_and_reliability_parameter() -> Result<()> {
    assert_eq!(
        DataChannel::get_channel_type_and_reliability_parameter(true, None, None)?,
        (ChannelType::Reliable, 0)
    );
    assert_eq!(
        DataChannel::get_channel_type_and_reliability_parameter(false, Some(3), None)?,
        (ChannelType::PartialReliableRexmitUnordered, 3)
    );
    assert_eq!(
        DataChannel::get_channel_type_and_reliability_parameter(true, None, Some(500))?,
        (ChannelType::PartialReliableTimed, 500)
    );
    assert_eq!(
        DataChannel::get_channel_type_and_reliability_parameter(true, Some(1), Some(1)),
        Err(Error::ErrRetransmitsOrPacketLifeTime)
    );

    let cfg = DataChannelConfig {
        channel_type: ChannelType::PartialReliableTimedUnordered,
        reliability_parameter: 250,
        ..Default::default()
    };
    assert_eq!(cfg.reliability_params(), (true, ReliabilityType::Timed, 250));
    Ok(())
}

fn bridge(from: &mut Association, to: &mut Association, now: Instant) -> Result<usize> {
    let mut n = 0;
    while let Some(message) = from.poll_write() {
        to.handle_read(TransportMessage {
            now,
            transport: TransportContext::default(),
            message,
        })?;
        n += 1;
    }
    Ok(n)
}

fn pump(a0: &mut Association, a1: &mut Association, now: Instant) -> Result<()> {
    while bridge(a0, a1, now)? + bridge(a1, a0, now)? > 0 {}
    Ok(())
}

fn drain_writes(dc: &mut DataChannel, association: &mut Association) -> Result<()> {
    while let Some(msg) = dc.poll_write() {
        association.write(msg.into())?;
    }
    Ok(())
}

#[test]
fn test_data_channel_over_association() -> Result<()> {
    let now = Instant::now();
    let mut a0 = Association::client(TransportConfig::default(), now);
    let mut a1 = Association::server(TransportConfig::default(), now);
    pump(&mut a0, &mut a1, now)?;
    assert!(a0.is_established() && a1.is_established());
    while a0.poll_event().is_some() {}
    while a1.poll_event().is_some() {}

    let cfg = DataChannelConfig {
        channel_type: ChannelType::PartialReliableRexmit,
        reliability_parameter: 0,
        label: "chat".to_string(),
        protocol: "json".to_string(),
        ..Default::default()
    };
    let (unordered, reliability_type, reliability_value) = cfg.reliability_params();
    a0.open_stream(0, unordered, reliability_type, reliability_value)?;
    let mut dc0 = DataChannel::dial(cfg.clone(), 0)?;
    drain_writes(&mut dc0, &mut a0)?;
    bridge(&mut a0, &mut a1, now)?;

    let mut opened = vec![];
    while let Some(e) = a1.poll_event() {
        opened.push(e);
    }
    assert_eq!(opened, vec![Event::StreamOpened(0)]);

    let open = a1.poll_read().ok_or(Error::ErrStreamNotExisted)?;
    let mut dc1 = DataChannel::accept(
        DataChannelConfig::default(),
        open.stream_id,
        open.ppi,
        &open.payload,
    )?;
    assert_eq!(dc1.config, cfg, "remote config should match");
    let (unordered, reliability_type, reliability_value) = dc1.config().reliability_params();
    a1.set_reliability_params(0, unordered, reliability_type, reliability_value);
    drain_writes(&mut dc1, &mut a1)?;
    pump(&mut a0, &mut a1, now)?;

    while let Some(msg) = a0.poll_read() {
        dc0.handle_read(msg.into())?;
    }
    assert_eq!(dc0.state(), DataChannelState::Open);

    dc0.send(true, BytesMut::from(&b"hello"[..]))?;
    drain_writes(&mut dc0, &mut a0)?;
    pump(&mut a0, &mut a1, now)?;
    dc0.handle_event(StreamEvent::BufferedAmount(a0.buffered_amount(0)))?;
    assert_eq!(dc0.buffered_amount(), 0);

    while let Some(msg) = a1.poll_read() {
        dc1.handle_read(msg.into())?;
    }
    let got = dc1.poll_read().ok_or(Error::ErrStreamNotExisted)?;
    assert!(got.is_string());
    assert_eq!(&got.payload[..], b"hello");
    Ok(())
}
