use crate::media_stream::MediaSample;
use crate::media_stream::track::MediaStreamTrack;
use rtp::Packet;
use rtp::sample_builder::SampleBuilder;
use std::time::Duration;

/// A track announced by the remote description, reassembling samples from
/// the RTP packets carrying its SSRC.
#[derive(Debug)]
pub(crate) struct TrackRemote {
    pub(crate) track: MediaStreamTrack,
    pub(crate) mid: String,
    sample_builder: SampleBuilder,
    last_timestamp: Option<u32>,
}

impl TrackRemote {
    pub(crate) fn new(track: MediaStreamTrack, mid: String) -> Self {
        Self {
            track,
            mid,
            sample_builder: SampleBuilder::new(),
            last_timestamp: None,
        }
    }

    /// Returns the sample completed by `packet`. The duration is derived from
    /// the timestamp distance to the previous sample.
    pub(crate) fn push(&mut self, packet: Packet) -> Option<MediaSample> {
        let sample = self.sample_builder.push(packet)?;

        let clock_rate = self.track.codec().clock_rate;
        let duration = match self.last_timestamp {
            Some(last) if clock_rate != 0 => Duration::from_nanos(
                sample.timestamp.wrapping_sub(last) as u64 * 1_000_000_000 / clock_rate as u64,
            ),
            _ => Duration::ZERO,
        };
        self.last_timestamp = Some(sample.timestamp);

        Some(MediaSample {
            data: sample.data,
            duration,
            packet_timestamp: sample.timestamp,
            prev_dropped_packets: sample.prev_dropped_packets,
        })
    }

    pub(crate) fn packets_received(&self) -> u64 {
        self.sample_builder.packets_received()
    }

    pub(crate) fn packets_lost(&self) -> u64 {
        self.sample_builder.packets_lost()
    }

    pub(crate) fn bytes_received(&self) -> u64 {
        self.sample_builder.bytes_received()
    }

    pub(crate) fn reset_stats(&mut self) {
        self.sample_builder = SampleBuilder::new();
        self.last_timestamp = None;
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::media_stream::track::RtpCodecKind;
    use crate::media_stream::track_local::TrackLocal;
    use bytes::Bytes;
    use shared::error::Result;

    #[test]
    fn test_track_remote_reassembles_local_samples() -> Result<()> {
        let track = MediaStreamTrack::new(
            "stream".to_owned(),
            "audio".to_owned(),
            "microphone".to_owned(),
            RtpCodecKind::Audio,
        );
        let mut local = TrackLocal::new(track.clone(), 1460);
        let mut remote = TrackRemote::new(track, "0".to_owned());

        let mut received = vec![];
        for i in 0..3u8 {
            let sample = MediaSample::new(
                Bytes::from(vec![i; 2000]),
                Duration::from_millis(20),
            );
            for packet in local.packetize(&sample)? {
                if let Some(s) = remote.push(packet) {
                    received.push(s);
                }
            }
        }

        assert_eq!(received.len(), 3);
        assert_eq!(received[0].duration, Duration::ZERO);
        assert_eq!(received[1].duration, Duration::from_millis(20));
        assert_eq!(received[2].data, Bytes::from(vec![2u8; 2000]));
        assert_eq!(remote.packets_lost(), 0);
        assert_eq!(remote.bytes_received(), 6000);
        Ok(())
    }

    #[test]
    fn test_track_remote_counts_lost_packets() -> Result<()> {
        let track = MediaStreamTrack::new(
            "stream".to_owned(),
            "video".to_owned(),
            "camera".to_owned(),
            RtpCodecKind::Video,
        );
        let mut local = TrackLocal::new(track.clone(), 1460);
        let mut remote = TrackRemote::new(track, "1".to_owned());

        let first = local.packetize(&MediaSample::new(
            Bytes::from_static(b"one"),
            Duration::from_millis(33),
        ))?;
        let _lost = local.packetize(&MediaSample::new(
            Bytes::from_static(b"two"),
            Duration::from_millis(33),
        ))?;
        let third = local.packetize(&MediaSample::new(
            Bytes::from_static(b"three"),
            Duration::from_millis(33),
        ))?;

        assert!(first.into_iter().filter_map(|p| remote.push(p)).count() == 1);
        let samples: Vec<MediaSample> = third.into_iter().filter_map(|p| remote.push(p)).collect();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].prev_dropped_packets, 1);
        assert_eq!(remote.packets_lost(), 1);

        remote.reset_stats();
        assert_eq!(remote.packets_received(), 0);
        Ok(())
    }
}
