use bytes::{Bytes, BytesMut};

use super::*;

#[test]
fn test_channel_type_unmarshal_success() -> Result<()> {
    for (byte, expected) in [
        (0x00u8, ChannelType::Reliable),
        (0x80, ChannelType::ReliableUnordered),
        (0x01, ChannelType::PartialReliableRexmit),
        (0x81, ChannelType::PartialReliableRexmitUnordered),
        (0x02, ChannelType::PartialReliableTimed),
        (0x82, ChannelType::PartialReliableTimedUnordered),
    ] {
        let mut buf = Bytes::copy_from_slice(&[byte]);
        assert_eq!(ChannelType::unmarshal(&mut buf)?, expected);
    }
    Ok(())
}

#[test]
fn test_channel_type_unmarshal_invalid() {
    let mut bytes = Bytes::from_static(&[0x11]);
    assert_eq!(
        ChannelType::unmarshal(&mut bytes),
        Err(Error::InvalidChannelType(0x11))
    );
}

#[test]
fn test_channel_type_unmarshal_unexpected_end_of_buffer() {
    let mut bytes = Bytes::from_static(&[]);
    assert_eq!(
        ChannelType::unmarshal(&mut bytes),
        Err(Error::UnexpectedEndOfBuffer {
            expected: 1,
            actual: 0,
        })
    );
}

#[test]
fn test_channel_type_ordering() {
    assert!(ChannelType::Reliable.is_ordered());
    assert!(ChannelType::PartialReliableTimed.is_ordered());
    assert!(!ChannelType::ReliableUnordered.is_ordered());
    assert!(!ChannelType::PartialReliableRexmitUnordered.is_ordered());
}

#[test]
fn test_channel_open_unmarshal_success() -> Result<()> {
    let mut bytes = Bytes::from_static(&[
        0x01, // channel type
        0x00, 0x00, // priority
        0x00, 0x00, 0xFF, 0xFF, // reliability parameter
        0x00, 0x03, // label length
        0x00, 0x03, // protocol length
        0x66, 0x6f, 0x6f, // label
        0x62, 0x61, 0x72, // protocol
    ]);

    let channel_open = DataChannelOpen::unmarshal(&mut bytes)?;

    assert_eq!(channel_open.channel_type, ChannelType::PartialReliableRexmit);
    assert_eq!(channel_open.priority, 0);
    assert_eq!(channel_open.reliability_parameter, 65535);
    assert_eq!(channel_open.label, b"foo");
    assert_eq!(channel_open.protocol, b"bar");
    Ok(())
}

#[test]
fn test_channel_open_unmarshal_unexpected_end_of_buffer() {
    let mut bytes = Bytes::from_static(&[0x00; 5]);
    assert_eq!(
        DataChannelOpen::unmarshal(&mut bytes),
        Err(Error::UnexpectedEndOfBuffer {
            expected: 11,
            actual: 5,
        })
    );
}

#[test]
fn test_channel_open_unmarshal_truncated_label() {
    let mut bytes = Bytes::from_static(&[
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x05, // label length
        0x00, 0x00, // protocol length
        0x66, 0x6f, // label, short by three bytes
    ]);
    assert_eq!(
        DataChannelOpen::unmarshal(&mut bytes),
        Err(Error::UnexpectedEndOfBuffer {
            expected: 5,
            actual: 2,
        })
    );
}

#[test]
fn test_channel_open_marshal() -> Result<()> {
    let channel_open = DataChannelOpen {
        channel_type: ChannelType::PartialReliableTimedUnordered,
        priority: CHANNEL_PRIORITY_NORMAL,
        reliability_parameter: 1500,
        label: b"chat".to_vec(),
        protocol: b"".to_vec(),
    };

    let mut buf = BytesMut::with_capacity(channel_open.marshal_size());
    buf.resize(channel_open.marshal_size(), 0u8);
    let n = channel_open.marshal_to(&mut buf)?;

    assert_eq!(n, 15);
    assert_eq!(
        &buf[..],
        &[
            0x82, // channel type
            0x01, 0x00, // priority
            0x00, 0x00, 0x05, 0xDC, // reliability parameter
            0x00, 0x04, // label length
            0x00, 0x00, // protocol length
            0x63, 0x68, 0x61, 0x74, // label
        ]
    );
    Ok(())
}

#[test]
fn test_message_unmarshal_open() -> Result<()> {
    let mut bytes = Bytes::from_static(&[
        0x03, // message type
        0x00, // channel type
        0x00, 0x00, 0x00, 0x00, 0x00, 0x00, //
        0x00, 0x01, // label length
        0x00, 0x00, // protocol length
        0x61, // label
    ]);

    let msg = Message::unmarshal(&mut bytes)?;
    assert_eq!(
        msg,
        Message::DataChannelOpen(DataChannelOpen {
            channel_type: ChannelType::Reliable,
            priority: 0,
            reliability_parameter: 0,
            label: b"a".to_vec(),
            protocol: vec![],
        })
    );
    assert_eq!(msg.message_type(), MessageType::DataChannelOpen);
    Ok(())
}

#[test]
fn test_message_marshal_ack() -> Result<()> {
    let bytes = Message::DataChannelAck(DataChannelAck).marshal()?;
    assert_eq!(&bytes[..], &[0x02]);

    let mut buf = bytes.freeze();
    assert_eq!(
        Message::unmarshal(&mut buf)?,
        Message::DataChannelAck(DataChannelAck)
    );
    Ok(())
}

#[test]
fn test_message_unmarshal_invalid_message_type() {
    let mut bytes = Bytes::from_static(&[0x01]);
    assert_eq!(
        Message::unmarshal(&mut bytes),
        Err(Error::InvalidMessageType(0x01))
    );
}

#[test]
fn test_message_type_display() {
    assert_eq!(MessageType::DataChannelOpen.to_string(), "DATA_CHANNEL_OPEN");
    assert_eq!(MessageType::DataChannelAck.to_string(), "DATA_CHANNEL_ACK");
}
