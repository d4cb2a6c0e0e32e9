use crate::data_channel::RTCDataChannelId;

/// Lifecycle notifications of one data channel. Received messages are not
/// events; they are returned by `poll_read`.
#[allow(clippy::enum_variant_names)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RTCDataChannelEvent {
    /// The remote peer opened a channel in-band.
    OnDataChannel(RTCDataChannelId),
    OnOpen(RTCDataChannelId),
    OnBufferedAmountLow(RTCDataChannelId),
    /// The remote peer started closing the channel.
    OnClosing(RTCDataChannelId),
    OnClose(RTCDataChannelId),
}

impl RTCDataChannelEvent {
    pub fn channel_id(&self) -> RTCDataChannelId {
        match *self {
            RTCDataChannelEvent::OnDataChannel(id)
            | RTCDataChannelEvent::OnOpen(id)
            | RTCDataChannelEvent::OnBufferedAmountLow(id)
            | RTCDataChannelEvent::OnClosing(id)
            | RTCDataChannelEvent::OnClose(id) => id,
        }
    }
}
