use std::fmt;

use crate::media_stream::MediaStreamId;
use crate::media_stream::track_state::MediaStreamTrackState;
use crate::peer_connection::configuration::UNSPECIFIED_STR;
use serde::{Deserialize, Serialize};

pub type MediaStreamTrackId = String;

/// Codec kind identifying the media type.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RtpCodecKind {
    #[default]
    Unspecified = 0,
    Audio = 1,
    Video = 2,
}

impl From<&str> for RtpCodecKind {
    fn from(raw: &str) -> Self {
        match raw {
            "audio" => RtpCodecKind::Audio,
            "video" => RtpCodecKind::Video,
            _ => RtpCodecKind::Unspecified,
        }
    }
}

impl fmt::Display for RtpCodecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RtpCodecKind::Audio => "audio",
            RtpCodecKind::Video => "video",
            RtpCodecKind::Unspecified => UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

pub const MIME_TYPE_OPUS: &str = "audio/opus";
pub const MIME_TYPE_VP8: &str = "video/VP8";

/// The codec line announced for a track. Samples are opaque to the peer
/// connection, so the codec is descriptive only and payloads are never
/// inspected.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCRtpCodec {
    pub payload_type: u8,
    /// Encoding name as written in `a=rtpmap`, e.g. `opus`
    pub name: String,
    pub clock_rate: u32,
    /// Number of audio channels, 0 for video
    pub channels: u16,
}

impl RTCRtpCodec {
    /// Opus for audio, VP8 for video.
    pub fn default_for(kind: RtpCodecKind) -> Self {
        match kind {
            RtpCodecKind::Audio => RTCRtpCodec {
                payload_type: 111,
                name: "opus".to_owned(),
                clock_rate: 48000,
                channels: 2,
            },
            _ => RTCRtpCodec {
                payload_type: 96,
                name: "VP8".to_owned(),
                clock_rate: 90000,
                channels: 0,
            },
        }
    }

    pub fn mime_type(&self, kind: RtpCodecKind) -> String {
        format!("{kind}/{}", self.name)
    }
}

impl From<&sdp::util::Codec> for RTCRtpCodec {
    fn from(codec: &sdp::util::Codec) -> Self {
        RTCRtpCodec {
            payload_type: codec.payload_type,
            name: codec.name.clone(),
            clock_rate: codec.clock_rate,
            channels: codec.encoding_parameters.parse().unwrap_or(0),
        }
    }
}

/// A single audio or video track, local or remote.
///
/// ## Specifications
///
/// * [W3C](https://www.w3.org/TR/mediacapture-streams/#mediastreamtrack)
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MediaStreamTrack {
    stream_id: MediaStreamId,
    track_id: MediaStreamTrackId,
    label: String,
    kind: RtpCodecKind,
    enabled: bool,
    ready_state: MediaStreamTrackState,
    ssrc: u32,
    codec: RTCRtpCodec,
}

impl MediaStreamTrack {
    /// Creates a live, enabled track carrying the default codec of `kind`.
    pub fn new(
        stream_id: MediaStreamId,
        track_id: MediaStreamTrackId,
        label: String,
        kind: RtpCodecKind,
    ) -> Self {
        Self {
            stream_id,
            track_id,
            label,
            kind,
            enabled: true,
            ready_state: MediaStreamTrackState::Live,
            ssrc: rand::random::<u32>(),
            codec: RTCRtpCodec::default_for(kind),
        }
    }

    pub fn with_codec(mut self, codec: RTCRtpCodec) -> Self {
        self.codec = codec;
        self
    }

    pub fn with_ssrc(mut self, ssrc: u32) -> Self {
        self.ssrc = ssrc;
        self
    }

    pub fn stream_id(&self) -> &MediaStreamId {
        &self.stream_id
    }

    pub fn track_id(&self) -> &MediaStreamTrackId {
        &self.track_id
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn kind(&self) -> RtpCodecKind {
        self.kind
    }

    pub fn ssrc(&self) -> u32 {
        self.ssrc
    }

    pub fn codec(&self) -> &RTCRtpCodec {
        &self.codec
    }

    /// A disabled local track drops written samples.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn ready_state(&self) -> MediaStreamTrackState {
        self.ready_state
    }

    pub fn stop(&mut self) {
        self.ready_state = MediaStreamTrackState::Ended;
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_media_stream_track_defaults() {
        let mut track = MediaStreamTrack::new(
            "stream".to_owned(),
            "audio".to_owned(),
            "microphone".to_owned(),
            RtpCodecKind::Audio,
        );
        assert!(track.enabled());
        assert_eq!(track.ready_state(), MediaStreamTrackState::Live);
        assert_eq!(track.codec().name, "opus");
        assert_eq!(track.codec().mime_type(track.kind()), MIME_TYPE_OPUS);

        track.stop();
        assert_eq!(track.ready_state(), MediaStreamTrackState::Ended);
    }

    #[test]
    fn test_codec_from_sdp() {
        let codec = RTCRtpCodec::from(&sdp::util::Codec {
            payload_type: 96,
            name: "VP8".to_owned(),
            clock_rate: 90000,
            ..Default::default()
        });
        assert_eq!(codec, RTCRtpCodec::default_for(RtpCodecKind::Video));
        assert_eq!(codec.mime_type(RtpCodecKind::Video), MIME_TYPE_VP8);
    }

    #[test]
    fn test_rtp_codec_kind_string() {
        assert_eq!(RtpCodecKind::from("audio"), RtpCodecKind::Audio);
        assert_eq!(RtpCodecKind::from("application"), RtpCodecKind::Unspecified);
        assert_eq!(RtpCodecKind::Video.to_string(), "video");
    }
}
