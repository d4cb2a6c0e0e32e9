//! Media tracks and the opaque samples they carry.
//!
//! Samples are never decoded: a local track splits each written sample into
//! RTP packets, a remote track reassembles them and hands the sample back
//! unchanged through `poll_read`.

pub mod track;
pub(crate) mod track_local;
pub(crate) mod track_remote;
pub mod track_state;

pub use track::{MediaStreamTrack, MediaStreamTrackId, RTCRtpCodec, RtpCodecKind};
pub use track_state::MediaStreamTrackState;

use crate::media_stream::track_local::TrackLocal;
use crate::peer_connection::RTCPeerConnection;
use crate::peer_connection::message::RTCMessage;
use bytes::Bytes;
use shared::error::{Error, Result};
use std::time::Duration;

/// <https://www.w3.org/TR/mediacapture-streams/#stream-api>
pub type MediaStreamId = String;

/// One encoded media frame.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MediaSample {
    pub data: Bytes,
    /// Playout duration, used to advance the RTP timestamp on send.
    pub duration: Duration,
    /// RTP timestamp of a received sample, ignored on send.
    pub packet_timestamp: u32,
    /// Packets lost between the previous received sample and this one.
    pub prev_dropped_packets: u16,
}

impl MediaSample {
    pub fn new(data: Bytes, duration: Duration) -> Self {
        Self {
            data,
            duration,
            ..Default::default()
        }
    }
}

/// Handle of a local track added with `add_track`.
///
/// ```no_run
/// use rtc::media_stream::{MediaSample, MediaStreamTrack, RtpCodecKind};
/// use rtc::peer_connection::RTCPeerConnection;
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// # fn example(pc: &mut RTCPeerConnection) -> Result<(), Box<dyn std::error::Error>> {
/// let track = MediaStreamTrack::new(
///     "stream".to_owned(),
///     "audio".to_owned(),
///     "microphone".to_owned(),
///     RtpCodecKind::Audio,
/// );
/// let mut sender = pc.add_track(track)?;
/// sender.write_sample(MediaSample::new(
///     Bytes::from_static(&[0u8; 160]),
///     Duration::from_millis(20),
/// ))?;
/// # Ok(())
/// # }
/// ```
pub struct RTCTrack<'a> {
    pub(crate) track_id: MediaStreamTrackId,
    pub(crate) peer_connection: &'a mut RTCPeerConnection,
}

impl RTCTrack<'_> {
    fn local(&self) -> Result<&TrackLocal> {
        self.peer_connection
            .local_tracks
            .iter()
            .find(|t| t.track.track_id() == &self.track_id)
            .ok_or(Error::ErrTrackNotFound)
    }

    fn local_mut(&mut self) -> Result<&mut TrackLocal> {
        let track_id = &self.track_id;
        self.peer_connection
            .local_tracks
            .iter_mut()
            .find(|t| t.track.track_id() == track_id)
            .ok_or(Error::ErrTrackNotFound)
    }

    pub fn track_id(&self) -> &MediaStreamTrackId {
        &self.track_id
    }

    pub fn track(&self) -> Result<&MediaStreamTrack> {
        Ok(&self.local()?.track)
    }

    /// The media section the track is sent in, once an offer or answer
    /// carrying it has been created.
    pub fn mid(&self) -> Result<Option<String>> {
        Ok(self.local()?.mid.clone())
    }

    pub fn set_enabled(&mut self, enabled: bool) -> Result<()> {
        self.local_mut()?.track.set_enabled(enabled);
        Ok(())
    }

    /// Packetizes the sample and queues the packets for `poll_write`.
    /// Samples written before the connection is up are dropped by the
    /// transport.
    pub fn write_sample(&mut self, sample: MediaSample) -> Result<()> {
        let track_id = self.track_id.clone();
        sansio::Protocol::handle_write(
            &mut *self.peer_connection,
            RTCMessage::MediaSample(track_id, sample),
        )
    }
}
