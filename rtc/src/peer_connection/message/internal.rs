use crate::data_channel::RTCDataChannelId;
use crate::data_channel::message::RTCDataChannelMessage;
use crate::media_stream::MediaSample;
use crate::media_stream::track::MediaStreamTrackId;
use bytes::BytesMut;
use datachannel::DataChannelMessage;
use sctp::ReliabilityType;
use shared::TransportContext;
use std::time::Instant;

#[derive(Debug, Clone)]
pub(crate) struct ApplicationMessage {
    pub(crate) data_channel_id: RTCDataChannelId,
    pub(crate) message: RTCDataChannelMessage,
}

#[derive(Debug, Clone)]
pub(crate) struct TrackSample {
    pub(crate) track_id: MediaStreamTrackId,
    pub(crate) sample: MediaSample,
}

#[derive(Debug, Clone)]
pub(crate) enum SCTPMessage {
    Raw(BytesMut),
    Stream(DataChannelMessage),
    OpenStream {
        stream_id: u16,
        unordered: bool,
        reliability_type: ReliabilityType,
        reliability_value: u32,
    },
    CloseStream(u16),
}

#[derive(Debug, Clone)]
pub(crate) enum RTPMessage {
    Raw(BytesMut),
}

#[derive(Debug, Clone)]
pub(crate) enum RTCMessageInternal {
    Raw(BytesMut),
    Sctp(SCTPMessage),
    DataChannel(ApplicationMessage),
    Rtp(RTPMessage),
    Track(TrackSample),
}

pub(crate) struct TaggedRTCMessageInternal {
    pub(crate) now: Instant,
    pub(crate) transport: TransportContext,
    pub(crate) message: RTCMessageInternal,
}
