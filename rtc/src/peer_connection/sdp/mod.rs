//! Session description types and the helpers that build and read SDP.
//!
//! [`RTCSessionDescription`] is the signaling form of an offer or answer.
//! The crate-private helpers in this module turn the local state of a peer
//! connection into a [`SessionDescription`] and extract ICE credentials,
//! candidates, directions and announced tracks from a remote one.

pub(crate) mod sdp_type;
pub(crate) mod session_description;

pub use sdp_type::RTCSdpType;
pub use session_description::RTCSessionDescription;

use crate::media_stream::track::{RTCRtpCodec, RtpCodecKind};
use ::sdp::description::media::{MediaDescription, MediaName, RangedPort};
use ::sdp::description::session::*;
use ::sdp::direction::Direction;
use ::sdp::{MEDIA_SECTION_APPLICATION, SessionDescription};
use ice::candidate::{Candidate, unmarshal_candidate};
use log::warn;
use shared::error::{Error, Result};

pub(crate) const MEDIA_SECTION_AUDIO: &str = "audio";
pub(crate) const MEDIA_SECTION_VIDEO: &str = "video";

pub(crate) const SDP_BUNDLE: &str = "BUNDLE";
pub(crate) const ICE_OPTION_TRICKLE: &str = "trickle";

/// m-line protocol and format of the data channel section
pub(crate) const DATA_CHANNEL_PROTOS: [&str; 3] = ["UDP", "DTLS", "SCTP"];
pub(crate) const DATA_CHANNEL_FORMAT: &str = "webrtc-datachannel";
pub(crate) const DEFAULT_SCTP_PORT: u16 = 5000;

/// A stream announced in a media section through `a=msid` and `a=ssrc`.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct MediaSource {
    pub(crate) track_id: String,
    pub(crate) stream_id: String,
    pub(crate) ssrc: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum MediaSectionKind {
    Audio,
    Video,
    Application,
    /// A section of the remote offer this endpoint cannot handle. It is
    /// echoed with port 0 in the answer.
    Unsupported {
        media: String,
        protos: Vec<String>,
        formats: Vec<String>,
    },
}

impl From<RtpCodecKind> for MediaSectionKind {
    fn from(kind: RtpCodecKind) -> Self {
        match kind {
            RtpCodecKind::Audio => MediaSectionKind::Audio,
            _ => MediaSectionKind::Video,
        }
    }
}

/// One m-section to write into a local description.
#[derive(Debug, Clone)]
pub(crate) struct MediaSection {
    pub(crate) mid: String,
    pub(crate) kind: MediaSectionKind,
    pub(crate) direction: Direction,
    pub(crate) codec: Option<RTCRtpCodec>,
    pub(crate) sources: Vec<MediaSource>,
}

impl MediaSection {
    pub(crate) fn application(mid: String) -> Self {
        Self {
            mid,
            kind: MediaSectionKind::Application,
            direction: Direction::Unspecified,
            codec: None,
            sources: vec![],
        }
    }

    fn is_rejected(&self) -> bool {
        matches!(self.kind, MediaSectionKind::Unsupported { .. })
    }
}

pub(crate) struct PopulateSdpParams<'a> {
    pub(crate) ice_ufrag: &'a str,
    pub(crate) ice_pwd: &'a str,
    pub(crate) candidates: &'a [Candidate],
    pub(crate) gathering_complete: bool,
    pub(crate) sctp_port: u16,
    pub(crate) max_message_size: u32,
}

/// Writes `media_sections` into `d`, bundled onto one transport.
pub(crate) fn populate_sdp(
    mut d: SessionDescription,
    media_sections: &[MediaSection],
    params: PopulateSdpParams<'_>,
) -> SessionDescription {
    let mut bundle_value = SDP_BUNDLE.to_owned();

    for section in media_sections {
        let media = if section.is_rejected() {
            rejected_media_description(section)
        } else {
            bundle_value.push(' ');
            bundle_value.push_str(&section.mid);
            accepted_media_description(section, &params)
        };
        d = d.with_media(media);
    }

    d.with_value_attribute(ATTR_KEY_GROUP.to_owned(), bundle_value)
        .with_value_attribute(
            ATTR_KEY_MSID_SEMANTIC.to_owned(),
            format!(" {SEMANTIC_TOKEN_WEBRTC_MEDIA_STREAMS} *"),
        )
}

fn rejected_media_description(section: &MediaSection) -> MediaDescription {
    let MediaSectionKind::Unsupported {
        media,
        protos,
        formats,
    } = &section.kind
    else {
        return MediaDescription::default();
    };

    let mut m = MediaDescription::new_jsep_media_description(media.clone(), vec![]);
    m.media_name = MediaName {
        media: media.clone(),
        port: RangedPort {
            value: 0,
            range: None,
        },
        protos: protos.clone(),
        formats: formats.clone(),
    };
    m.with_value_attribute(ATTR_KEY_MID.to_owned(), section.mid.clone())
}

fn accepted_media_description(
    section: &MediaSection,
    params: &PopulateSdpParams<'_>,
) -> MediaDescription {
    let mut m = match section.kind {
        MediaSectionKind::Application => {
            let mut m = MediaDescription::new_jsep_media_description(
                MEDIA_SECTION_APPLICATION.to_owned(),
                vec![],
            );
            m.media_name.protos = DATA_CHANNEL_PROTOS.iter().map(|p| p.to_string()).collect();
            m.media_name.formats = vec![DATA_CHANNEL_FORMAT.to_owned()];
            m
        }
        MediaSectionKind::Audio => {
            MediaDescription::new_jsep_media_description(MEDIA_SECTION_AUDIO.to_owned(), vec![])
        }
        _ => MediaDescription::new_jsep_media_description(MEDIA_SECTION_VIDEO.to_owned(), vec![]),
    };

    m = m
        .with_value_attribute(ATTR_KEY_MID.to_owned(), section.mid.clone())
        .with_ice_credentials(params.ice_ufrag.to_owned(), params.ice_pwd.to_owned())
        .with_value_attribute(ATTR_KEY_ICE_OPTIONS.to_owned(), ICE_OPTION_TRICKLE.to_owned());

    if section.kind == MediaSectionKind::Application {
        m = m
            .with_value_attribute(
                ATTR_KEY_SCTP_PORT.to_owned(),
                params.sctp_port.to_string(),
            )
            .with_value_attribute(
                ATTR_KEY_MAX_MESSAGE_SIZE.to_owned(),
                params.max_message_size.to_string(),
            );
    } else {
        if let Some(codec) = &section.codec {
            m = m.with_codec(
                codec.payload_type,
                codec.name.clone(),
                codec.clock_rate,
                codec.channels,
                String::new(),
            );
        }
        m = m
            .with_property_attribute(ATTR_KEY_RTCPMUX.to_owned())
            .with_property_attribute(section.direction.to_string());
        if section.direction.has_send() {
            for source in &section.sources {
                m = m
                    .with_value_attribute(
                        ATTR_KEY_MSID.to_owned(),
                        format!("{} {}", source.stream_id, source.track_id),
                    )
                    .with_media_source(
                        source.ssrc,
                        source.stream_id.clone(),
                        source.stream_id.clone(),
                        source.track_id.clone(),
                    );
            }
        }
    }

    for c in params.candidates {
        m = m.with_candidate(c.marshal());
    }
    if params.gathering_complete {
        m = m.with_property_attribute(ATTR_KEY_END_OF_CANDIDATES.to_owned());
    }

    m
}

/// Keeps the session id of the first description and bumps the version of
/// every later one.
pub(crate) fn update_sdp_origin(origin: &mut Origin, d: &mut SessionDescription) {
    if origin.session_version == 0 {
        origin.session_id = d.origin.session_id;
        origin.session_version = d.origin.session_version.max(1);
    } else {
        origin.session_version += 1;
    }
    d.origin.session_id = origin.session_id;
    d.origin.session_version = origin.session_version;
}

pub(crate) fn get_mid_value(media: &MediaDescription) -> Option<&str> {
    media.attribute(ATTR_KEY_MID)
}

/// Direction announced by the sender of `media`, `Unspecified` if none.
pub(crate) fn get_peer_direction(media: &MediaDescription) -> Direction {
    for a in &media.attributes {
        let direction = Direction::new(&a.key);
        if direction != Direction::Unspecified {
            return direction;
        }
    }
    Direction::Unspecified
}

pub(crate) fn is_rejected(media: &MediaDescription) -> bool {
    media.media_name.port.value == 0
}

pub(crate) fn have_application_media_section(desc: &SessionDescription) -> bool {
    desc.media_descriptions
        .iter()
        .any(|m| m.media_name.media == MEDIA_SECTION_APPLICATION && !is_rejected(m))
}

pub(crate) fn get_application_media_section(
    desc: &SessionDescription,
) -> Option<&MediaDescription> {
    desc.media_descriptions
        .iter()
        .find(|m| m.media_name.media == MEDIA_SECTION_APPLICATION && !is_rejected(m))
}

pub(crate) fn get_sctp_port(media: &MediaDescription) -> u16 {
    media
        .attribute(ATTR_KEY_SCTP_PORT)
        .and_then(|v| v.parse::<u16>().ok())
        .unwrap_or(DEFAULT_SCTP_PORT)
}

pub(crate) fn get_max_message_size(media: &MediaDescription) -> Option<u32> {
    media
        .attribute(ATTR_KEY_MAX_MESSAGE_SIZE)
        .and_then(|v| v.parse::<u32>().ok())
}

/// Returns the remote ufrag, pwd and candidates. Credentials may sit at the
/// session level or in the media sections, but must agree.
pub(crate) fn extract_ice_details(
    desc: &SessionDescription,
) -> Result<(String, String, Vec<Candidate>)> {
    let mut candidates: Vec<Candidate> = vec![];

    let mut remote_ufrag = desc.attribute(ATTR_KEY_ICE_UFRAG).map(str::to_owned);
    let mut remote_pwd = desc.attribute(ATTR_KEY_ICE_PWD).map(str::to_owned);

    for m in &desc.media_descriptions {
        if is_rejected(m) {
            continue;
        }

        if let Some(ufrag) = m.attribute(ATTR_KEY_ICE_UFRAG) {
            match &remote_ufrag {
                Some(existing) if existing != ufrag => {
                    return Err(Error::ErrMalformedDescription(
                        "ice-ufrag differs between media sections".to_owned(),
                    ));
                }
                Some(_) => {}
                None => remote_ufrag = Some(ufrag.to_owned()),
            }
        }
        if let Some(pwd) = m.attribute(ATTR_KEY_ICE_PWD) {
            match &remote_pwd {
                Some(existing) if existing != pwd => {
                    return Err(Error::ErrMalformedDescription(
                        "ice-pwd differs between media sections".to_owned(),
                    ));
                }
                Some(_) => {}
                None => remote_pwd = Some(pwd.to_owned()),
            }
        }

        for raw in m.attributes_with_key(ATTR_KEY_CANDIDATE) {
            match unmarshal_candidate(raw) {
                Ok(c) => {
                    if !candidates.iter().any(|e| e.equal(&c)) {
                        candidates.push(c);
                    }
                }
                Err(err) => warn!("ignoring remote candidate {raw}: {err}"),
            }
        }
    }

    let remote_ufrag = remote_ufrag
        .filter(|u| !u.is_empty())
        .ok_or_else(|| Error::ErrMalformedDescription("missing ice-ufrag".to_owned()))?;
    let remote_pwd = remote_pwd
        .filter(|p| !p.is_empty())
        .ok_or_else(|| Error::ErrMalformedDescription("missing ice-pwd".to_owned()))?;

    Ok((remote_ufrag, remote_pwd, candidates))
}

/// A track the remote side announced it sends.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub(crate) struct TrackDetails {
    pub(crate) mid: String,
    pub(crate) kind: RtpCodecKind,
    pub(crate) stream_id: String,
    pub(crate) track_id: String,
    pub(crate) ssrc: u32,
    pub(crate) codec: Option<RTCRtpCodec>,
}

/// Collects the sending tracks of every audio and video section of a remote
/// description. Sections without an `a=ssrc` line carry no track.
pub(crate) fn track_details_from_sdp(desc: &SessionDescription) -> Vec<TrackDetails> {
    let mut details = vec![];

    for media in &desc.media_descriptions {
        let kind = RtpCodecKind::from(media.media_name.media.as_str());
        if kind == RtpCodecKind::Unspecified || is_rejected(media) {
            continue;
        }
        let direction = get_peer_direction(media);
        if direction != Direction::Unspecified && !direction.has_send() {
            continue;
        }
        let Some(mid) = get_mid_value(media) else {
            continue;
        };

        let (mut stream_id, mut track_id) = media
            .attribute(ATTR_KEY_MSID)
            .and_then(|msid| msid.split_once(' '))
            .map(|(s, t)| (s.to_owned(), t.to_owned()))
            .unwrap_or_default();

        let mut ssrc = None;
        for value in media.attributes_with_key(ATTR_KEY_SSRC) {
            let mut fields = value.splitn(2, ' ');
            let Some(Ok(parsed)) = fields.next().map(str::parse::<u32>) else {
                warn!("ignoring malformed ssrc attribute {value}");
                continue;
            };
            if ssrc.is_some_and(|s| s != parsed) {
                continue;
            }
            ssrc = Some(parsed);
            if let Some(msid) = fields.next().and_then(|f| f.strip_prefix("msid:"))
                && track_id.is_empty()
                && let Some((s, t)) = msid.split_once(' ')
            {
                stream_id = s.to_owned();
                track_id = t.to_owned();
            }
        }

        let Some(ssrc) = ssrc else {
            continue;
        };
        if track_id.is_empty() {
            track_id = format!("{mid}-{ssrc}");
        }

        details.push(TrackDetails {
            mid: mid.to_owned(),
            kind,
            stream_id,
            track_id,
            ssrc,
            codec: media.codecs().first().map(RTCRtpCodec::from),
        });
    }

    details
}
