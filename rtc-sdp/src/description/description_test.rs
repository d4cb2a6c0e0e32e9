use std::io::Cursor;

use super::common::*;
use super::media::*;
use super::session::*;
use crate::util::Codec;
use shared::error::{Error, Result};

const CANONICAL_UNMARSHAL_SDP: &str = "v=0\r\n\
o=jdoe 2890844526 2890842807 IN IP4 10.47.16.5\r\n\
s=SDP Seminar\r\n\
i=A Seminar on the session description protocol\r\n\
u=http://www.example.com/seminars/sdp.pdf\r\n\
e=j.doe@example.com (Jane Doe)\r\n\
p=+1 617 555-6011\r\n\
c=IN IP4 224.2.17.12/127\r\n\
b=X-YZ:128\r\n\
b=AS:12345\r\n\
t=2873397496 2873404696\r\n\
t=3034423619 3042462419\r\n\
r=604800 3600 0 90000\r\n\
z=2882844526 -3600 2898848070 0\r\n\
k=prompt\r\n\
a=candidate:0 1 UDP 2113667327 203.0.113.1 54400 typ host\r\n\
a=recvonly\r\n\
m=audio 49170 RTP/AVP 0\r\n\
i=Vivamus a posuere nisl\r\n\
c=IN IP4 203.0.113.1\r\n\
b=X-YZ:128\r\n\
k=prompt\r\n\
a=sendrecv\r\n\
m=video 51372 RTP/AVP 99\r\n\
a=rtpmap:99 h263-1998/90000\r\n";

const SESSION_HEADER: &str = "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\n";

fn unmarshal(sdp: &str) -> Result<SessionDescription> {
    let mut reader = Cursor::new(sdp.as_bytes());
    SessionDescription::unmarshal(&mut reader)
}

#[test]
fn test_unmarshal_marshal() -> Result<()> {
    let sdp = unmarshal(CANONICAL_UNMARSHAL_SDP)?;
    assert_eq!(sdp.marshal(), CANONICAL_UNMARSHAL_SDP);

    assert_eq!(sdp.origin.session_id, 2890844526);
    assert_eq!(sdp.session_name, "SDP Seminar");
    assert_eq!(sdp.bandwidth.len(), 2);
    assert!(sdp.bandwidth[0].experimental);
    assert_eq!(
        sdp.connection_information,
        Some(ConnectionInformation {
            network_type: "IN".to_owned(),
            address_type: "IP4".to_owned(),
            address: Some(Address {
                address: "224.2.17.12".to_owned(),
                ttl: Some(127),
                range: None,
            }),
        })
    );
    assert_eq!(sdp.time_descriptions.len(), 2);
    assert_eq!(sdp.time_descriptions[1].repeat_times.len(), 1);
    assert_eq!(sdp.time_zones.len(), 2);
    assert_eq!(sdp.media_descriptions.len(), 2);
    assert_eq!(
        sdp.media_descriptions[0].media_title.as_deref(),
        Some("Vivamus a posuere nisl")
    );
    Ok(())
}

#[test]
fn test_unmarshal_bare_line_feeds() -> Result<()> {
    let sdp = unmarshal("v=0\no=- 1 1 IN IP4 0.0.0.0\ns=-\nt=0 0\na=ice-lite\n")?;
    assert!(sdp.has_attribute(ATTR_KEY_ICELITE));
    assert_eq!(
        sdp.marshal(),
        "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\na=ice-lite\r\n"
    );
    Ok(())
}

#[test]
fn test_unmarshal_time_units() -> Result<()> {
    let sdp = unmarshal(&format!(
        "{SESSION_HEADER}t=0 0\r\nr=7d 1h 0 25h\r\nz=2882844526 -1h\r\n"
    ))?;
    assert_eq!(
        sdp.time_descriptions[0].repeat_times,
        vec![RepeatTime {
            interval: 604800,
            duration: 3600,
            offsets: vec![0, 90000],
        }]
    );
    assert_eq!(
        sdp.time_zones,
        vec![TimeZone {
            adjustment_time: 2882844526,
            offset: -3600,
        }]
    );
    Ok(())
}

#[test]
fn test_unmarshal_rejects_misordered_lines() {
    let tests = vec![
        (
            "origin after session name",
            "v=0\r\ns=-\r\no=- 1 1 IN IP4 0.0.0.0\r\nt=0 0\r\n",
        ),
        ("missing version", "o=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n"),
        (
            "bandwidth after timing",
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\nb=AS:1\r\n",
        ),
        (
            "repeat without timing",
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nr=1 1 0\r\nt=0 0\r\n",
        ),
        (
            "duplicate session name",
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\ns=-\r\nt=0 0\r\n",
        ),
        (
            "timing inside media",
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\nm=audio 9 RTP/AVP 0\r\nt=0 0\r\n",
        ),
        (
            "title after attribute",
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\nm=audio 9 RTP/AVP 0\r\na=sendrecv\r\ni=late\r\n",
        ),
        (
            "unknown line type",
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nx=1\r\nt=0 0\r\n",
        ),
    ];

    for (name, sdp) in tests {
        assert!(unmarshal(sdp).is_err(), "{name}");
    }
}

#[test]
fn test_unmarshal_rejects_invalid_values() {
    let tests = vec![
        ("version", "v=1\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n"),
        ("nettype", "v=0\r\no=- 1 1 XX IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n"),
        ("addrtype", "v=0\r\no=- 1 1 IN IP5 0.0.0.0\r\ns=-\r\nt=0 0\r\n"),
        ("session id", "v=0\r\no=- one 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n"),
        ("origin fields", "v=0\r\no=- 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\n"),
        (
            "bandwidth type",
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nb=ZZ:1\r\nt=0 0\r\n",
        ),
        (
            "media type",
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\nm=hologram 9 RTP/AVP 0\r\n",
        ),
        (
            "media proto",
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\nm=audio 9 RTP/QUIC 0\r\n",
        ),
        (
            "media port",
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\nm=audio 70000 RTP/AVP 0\r\n",
        ),
        (
            "time zones",
            "v=0\r\no=- 1 1 IN IP4 0.0.0.0\r\ns=-\r\nt=0 0\r\nz=2882844526\r\n",
        ),
    ];

    for (name, sdp) in tests {
        assert!(unmarshal(sdp).is_err(), "{name}");
    }
}

#[test]
fn test_unmarshal_requires_timing() {
    assert_eq!(
        unmarshal(SESSION_HEADER),
        Err(Error::SdpEmptyTimeDescription)
    );
    assert!(unmarshal("v=0\r\nt=0 0\r\n").is_err());
}

#[test]
fn test_jsep_description_builders() -> Result<()> {
    let media = MediaDescription::new_jsep_media_description("audio".to_owned(), vec![])
        .with_codec(111, "opus".to_owned(), 48000, 2, "minptime=10".to_owned())
        .with_codec(0, "PCMU".to_owned(), 8000, 0, String::new())
        .with_ice_credentials("ufrag".to_owned(), "pwd".to_owned())
        .with_value_attribute(ATTR_KEY_MID.to_owned(), "0".to_owned())
        .with_property_attribute(ATTR_KEY_SEND_RECV.to_owned())
        .with_media_source(1234, "cname".to_owned(), "stream".to_owned(), "track".to_owned());

    let sdp = SessionDescription::new_jsep_session_description(false)
        .with_value_attribute(ATTR_KEY_GROUP.to_owned(), "BUNDLE 0".to_owned())
        .with_media(media);

    let parsed = unmarshal(&sdp.marshal())?;
    assert_eq!(parsed, sdp);
    assert_eq!(parsed.attribute(ATTR_KEY_GROUP), Some("BUNDLE 0"));
    assert_eq!(parsed.attribute(ATTR_KEY_ICELITE), None);

    let media = parsed
        .media_description("0")
        .ok_or_else(|| Error::Other("missing mid".to_owned()))?;
    assert_eq!(media.attribute(ATTR_KEY_ICE_UFRAG), Some("ufrag"));
    assert_eq!(media.attribute(ATTR_KEY_SEND_RECV), Some(""));
    assert_eq!(media.attributes_with_key(ATTR_KEY_SSRC).count(), 3);
    assert_eq!(
        media.codecs(),
        vec![
            Codec {
                payload_type: 111,
                name: "opus".to_owned(),
                clock_rate: 48000,
                encoding_parameters: "2".to_owned(),
                fmtp: "minptime=10".to_owned(),
            },
            Codec {
                payload_type: 0,
                name: "PCMU".to_owned(),
                clock_rate: 8000,
                encoding_parameters: String::new(),
                fmtp: String::new(),
            },
        ]
    );
    assert!(parsed.media_description("1").is_none());

    Ok(())
}
