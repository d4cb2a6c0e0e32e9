use crate::media_stream::MediaSample;
use crate::media_stream::track::MediaStreamTrack;
use crate::media_stream::track_state::MediaStreamTrackState;
use log::trace;
use rtp::Packet;
use rtp::packetizer::Packetizer;
use rtp::sequence::Sequencer;
use shared::error::{Error, Result};

/// RTP header and padding headroom kept below the receive MTU
const RTP_OUTBOUND_OVERHEAD: usize = 12 + 48;

/// A track added with `add_track`, sending samples once its media section
/// has been negotiated.
#[derive(Debug, Clone)]
pub(crate) struct TrackLocal {
    pub(crate) track: MediaStreamTrack,
    pub(crate) mid: Option<String>,
    packetizer: Packetizer,

    pub(crate) packets_sent: u64,
    pub(crate) bytes_sent: u64,
}

impl TrackLocal {
    pub(crate) fn new(track: MediaStreamTrack, mtu: usize) -> Self {
        let codec = track.codec();
        let packetizer = Packetizer::new(
            mtu.saturating_sub(RTP_OUTBOUND_OVERHEAD),
            codec.payload_type,
            track.ssrc(),
            Sequencer::new_random(),
            codec.clock_rate,
        );
        Self {
            track,
            mid: None,
            packetizer,
            packets_sent: 0,
            bytes_sent: 0,
        }
    }

    /// Splits the sample into RTP packets. A disabled track swallows samples.
    pub(crate) fn packetize(&mut self, sample: &MediaSample) -> Result<Vec<Packet>> {
        if self.track.ready_state() == MediaStreamTrackState::Ended {
            return Err(Error::ErrClosed);
        }
        if !self.track.enabled() {
            trace!("track {} disabled, dropping sample", self.track.track_id());
            return Ok(vec![]);
        }

        let samples =
            (sample.duration.as_secs_f64() * self.packetizer.clock_rate() as f64).round() as u32;
        let packets = self.packetizer.packetize(&sample.data, samples)?;

        self.packets_sent += packets.len() as u64;
        self.bytes_sent += packets.iter().map(|p| p.payload.len() as u64).sum::<u64>();
        Ok(packets)
    }

    pub(crate) fn reset_stats(&mut self) {
        self.packets_sent = 0;
        self.bytes_sent = 0;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::media_stream::track::RtpCodecKind;
    use bytes::Bytes;
    use std::time::Duration;

    fn local_track() -> TrackLocal {
        TrackLocal::new(
            MediaStreamTrack::new(
                "stream".to_owned(),
                "video".to_owned(),
                "camera".to_owned(),
                RtpCodecKind::Video,
            )
            .with_ssrc(1234),
            1460,
        )
    }

    #[test]
    fn test_track_local_packetize() -> Result<()> {
        let mut t = local_track();
        let sample = MediaSample::new(Bytes::from(vec![7u8; 3000]), Duration::from_millis(33));
        let packets = t.packetize(&sample)?;

        assert!(packets.len() >= 3);
        assert!(packets.iter().all(|p| p.header.ssrc == 1234));
        assert!(packets.iter().all(|p| p.header.payload_type == 96));
        assert!(packets.last().is_some_and(|p| p.header.marker));
        assert_eq!(t.packets_sent, packets.len() as u64);
        assert_eq!(t.bytes_sent, 3000);
        Ok(())
    }

    #[test]
    fn test_track_local_disabled_and_ended() -> Result<()> {
        let mut t = local_track();
        let sample = MediaSample::new(Bytes::from_static(b"frame"), Duration::from_millis(20));

        t.track.set_enabled(false);
        assert!(t.packetize(&sample)?.is_empty());
        assert_eq!(t.packets_sent, 0);

        t.track.stop();
        assert_eq!(t.packetize(&sample).err(), Some(Error::ErrClosed));
        Ok(())
    }
}
