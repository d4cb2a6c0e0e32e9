use bytes::{Bytes, BytesMut};

use super::*;
use crate::packet::Packet;

const RAW_PACKET: [u8; 25] = [
    0x90, 0xe0, 0x69, 0x8f, 0xd9, 0xc2, 0x93, 0xda, 0x1c, 0x64, 0x27, 0x82, 0xBE, 0xDE, 0x00,
    0x01, 0x50, 0xAA, 0x00, 0x00, 0x98, 0x36, 0xbe, 0x88, 0x9e,
];

#[test]
fn test_basic() -> Result<()> {
    let mut buf = &RAW_PACKET[..];
    let packet = Packet::unmarshal(&mut buf)?;

    let expected = Packet {
        header: Header {
            version: 2,
            padding: false,
            extension: true,
            marker: true,
            payload_type: 96,
            sequence_number: 27023,
            timestamp: 3653407706,
            ssrc: 476325762,
            csrc: vec![],
            extension_profile: EXTENSION_PROFILE_ONE_BYTE,
            extensions: vec![Extension {
                id: 5,
                payload: Bytes::from_static(&[0xAA]),
            }],
        },
        payload: Bytes::from_static(&RAW_PACKET[20..]),
    };
    assert_eq!(packet, expected);
    assert_eq!(packet.header.marshal_size(), 20);
    assert_eq!(packet.marshal()?, BytesMut::from(&RAW_PACKET[..]));

    Ok(())
}

#[test]
fn test_header_too_short() {
    let mut buf = &RAW_PACKET[..3];
    assert_eq!(
        Header::unmarshal(&mut buf),
        Err(Error::ErrHeaderSizeInsufficient)
    );

    // two CSRCs announced, none present
    let raw = [0x82, 0x60, 0x00, 0x01, 0, 0, 0, 1, 0, 0, 0, 2];
    let mut buf = &raw[..];
    assert_eq!(
        Header::unmarshal(&mut buf),
        Err(Error::ErrHeaderSizeInsufficient)
    );
}

#[test]
fn test_version_mismatch() {
    let mut raw = RAW_PACKET;
    raw[0] = 0x50;
    let mut buf = &raw[..];
    assert_eq!(Header::unmarshal(&mut buf), Err(Error::ErrRtpVersionMismatch));
}

#[test]
fn test_extension_too_short() {
    // extension length claims two words while only one follows
    let mut raw = RAW_PACKET[..20].to_vec();
    raw[15] = 0x02;
    let mut buf = &raw[..];
    assert_eq!(
        Header::unmarshal(&mut buf),
        Err(Error::ErrHeaderSizeInsufficientForExtension)
    );
}

#[test]
fn test_extension_accessors() -> Result<()> {
    let mut header = Header {
        version: 2,
        ..Default::default()
    };
    assert!(header.get_extension(1).is_none());
    assert_eq!(
        header.del_extension(1),
        Err(Error::ErrHeaderExtensionsNotEnabled)
    );

    header.set_extension(1, Bytes::from_static(b"0"))?;
    assert_eq!(header.extension_profile, EXTENSION_PROFILE_ONE_BYTE);
    header.set_extension(3, Bytes::from_static(b"mid"))?;
    header.set_extension(1, Bytes::from_static(b"1"))?;
    assert_eq!(header.get_extension_ids(), vec![1, 3]);
    assert_eq!(header.get_extension(1), Some(Bytes::from_static(b"1")));

    assert_eq!(
        header.set_extension(15, Bytes::from_static(b"x")),
        Err(Error::ErrRfc8285oneByteHeaderIdRange)
    );
    assert_eq!(
        header.set_extension(2, Bytes::from(vec![0u8; 17])),
        Err(Error::ErrRfc8285oneByteHeaderSize)
    );

    header.del_extension(1)?;
    assert_eq!(
        header.del_extension(1),
        Err(Error::ErrHeaderExtensionNotFound)
    );

    let raw = header.marshal()?;
    let mut buf = &raw[..];
    assert_eq!(Header::unmarshal(&mut buf)?, header);

    Ok(())
}

#[test]
fn test_two_byte_extension() -> Result<()> {
    let mut header = Header {
        version: 2,
        sequence_number: 1,
        ..Default::default()
    };
    header.set_extension(7, Bytes::from(vec![0xABu8; 20]))?;
    assert_eq!(header.extension_profile, EXTENSION_PROFILE_TWO_BYTE);

    // 12 fixed + 4 extension header + 22 rounded to 24
    assert_eq!(header.marshal_size(), 40);
    let raw = header.marshal()?;
    let mut buf = &raw[..];
    assert_eq!(Header::unmarshal(&mut buf)?, header);

    Ok(())
}

#[test]
fn test_too_many_csrcs() {
    let header = Header {
        version: 2,
        csrc: (0..16).collect(),
        ..Default::default()
    };
    assert_eq!(header.marshal(), Err(Error::ErrTooManyCsrcs));
}
