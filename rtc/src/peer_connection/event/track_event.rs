use crate::media_stream::MediaStreamId;
use crate::media_stream::track::{MediaStreamTrackId, RTCRtpCodec, RtpCodecKind};

/// A remote track announced by an applied remote description. Samples of
/// the track are returned by `poll_read` under the same `track_id`.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RTCTrackEvent {
    pub track_id: MediaStreamTrackId,
    pub stream_ids: Vec<MediaStreamId>,
    pub kind: RtpCodecKind,
    pub mid: String,
    pub ssrc: u32,
    pub codec: Option<RTCRtpCodec>,
}
