use crate::peer_connection::RTCPeerConnection;
use crate::peer_connection::event::RTCEventInternal;
use crate::peer_connection::event::RTCPeerConnectionEvent;
use crate::peer_connection::event::data_channel_event::RTCDataChannelEvent;
use crate::peer_connection::message::internal::{
    RTCMessageInternal, SCTPMessage, TaggedRTCMessageInternal,
};
use bytes::BytesMut;
use log::debug;
use shared::TransportContext;
use shared::error::{Error, Result};
use std::time::Instant;

pub mod init;
pub(crate) mod internal;
pub mod message;
pub mod state;

pub use init::RTCDataChannelInit;
pub use message::RTCDataChannelMessage;
pub use state::RTCDataChannelState;

/// Local handle of a data channel within a particular peer connection. It is
/// allocated at creation and never changes; the SCTP stream id is reported
/// separately by [`RTCDataChannel::stream_id`].
pub type RTCDataChannelId = usize;

/// DataChannel represents a WebRTC DataChannel
/// The DataChannel interface represents a network channel
/// which can be used for bidirectional peer-to-peer transfers of arbitrary data
///
/// ## Specifications
///
/// * [MDN]
/// * [W3C]
///
/// [MDN]: https://developer.mozilla.org/en-US/docs/Web/API/RTCDataChannel
/// [W3C]: https://w3c.github.io/webrtc-pc/#dom-rtcdatachannel
pub struct RTCDataChannel<'a> {
    pub(crate) id: RTCDataChannelId,
    pub(crate) peer_connection: &'a mut RTCPeerConnection,
}

impl RTCDataChannel<'_> {
    fn internal(&self) -> Result<&internal::RTCDataChannelInternal> {
        self.peer_connection
            .data_channels
            .get(&self.id)
            .ok_or(Error::ErrDataChannelClosed)
    }

    fn internal_mut(&mut self) -> Result<&mut internal::RTCDataChannelInternal> {
        self.peer_connection
            .data_channels
            .get_mut(&self.id)
            .ok_or(Error::ErrDataChannelClosed)
    }

    /// label represents a label that can be used to distinguish this
    /// DataChannel object from other DataChannel objects. Scripts are
    /// allowed to create multiple DataChannel objects with the same label.
    pub fn label(&self) -> Result<String> {
        Ok(self.internal()?.label.clone())
    }

    /// Ordered returns true if the DataChannel is ordered, and false if
    /// out-of-order delivery is allowed.
    pub fn ordered(&self) -> Result<bool> {
        Ok(self.internal()?.ordered)
    }

    /// max_packet_lifetime represents the length of the time window (msec) during
    /// which transmissions and retransmissions may occur in unreliable mode.
    pub fn max_packet_life_time(&self) -> Result<Option<u16>> {
        Ok(self.internal()?.max_packet_life_time)
    }

    /// max_retransmits represents the maximum number of retransmissions that are
    /// attempted in unreliable mode.
    pub fn max_retransmits(&self) -> Result<Option<u16>> {
        Ok(self.internal()?.max_retransmits)
    }

    /// protocol represents the name of the sub-protocol used with this
    /// DataChannel.
    pub fn protocol(&self) -> Result<String> {
        Ok(self.internal()?.protocol.clone())
    }

    /// negotiated represents whether this DataChannel was negotiated by the
    /// application (true), or not (false).
    pub fn negotiated(&self) -> Result<bool> {
        Ok(self.internal()?.negotiated)
    }

    pub fn id(&self) -> RTCDataChannelId {
        self.id
    }

    /// The SCTP stream carrying the channel. None until the association is
    /// up, unless the channel was negotiated out-of-band.
    pub fn stream_id(&self) -> Result<Option<u16>> {
        Ok(self.internal()?.stream_id)
    }

    /// ready_state represents the state of the DataChannel object.
    pub fn ready_state(&self) -> Result<RTCDataChannelState> {
        Ok(self.internal()?.ready_state)
    }

    /// buffered_amount represents the number of bytes of application data
    /// (UTF-8 text and binary data) that have been queued using send() and
    /// not yet acknowledged by the peer. It does not reset to zero once the
    /// channel closes.
    pub fn buffered_amount(&self) -> Result<usize> {
        Ok(self.internal()?.buffered_amount())
    }

    /// buffered_amount_low_threshold represents the threshold at which the
    /// bufferedAmount is considered to be low. When the bufferedAmount decreases
    /// from above this threshold to equal or below it, the bufferedamountlow
    /// event fires. The threshold is set to 0 by default.
    pub fn buffered_amount_low_threshold(&self) -> Result<usize> {
        Ok(self.internal()?.buffered_amount_low_threshold)
    }

    /// set_buffered_amount_low_threshold sets the threshold at which the
    /// bufferedAmount is considered to be low.
    pub fn set_buffered_amount_low_threshold(&mut self, threshold: usize) -> Result<()> {
        self.internal_mut()?
            .set_buffered_amount_low_threshold(threshold);
        Ok(())
    }

    /// send sends the binary message to the DataChannel peer. It fails with
    /// `ErrBufferFull`, without queueing, once the buffered amount would pass
    /// the high-water mark.
    pub fn send(&mut self, data: BytesMut) -> Result<()> {
        self.send_message(RTCDataChannelMessage {
            is_string: false,
            data,
        })
    }

    /// send_text sends the text message to the DataChannel peer
    pub fn send_text(&mut self, s: impl Into<String>) -> Result<()> {
        self.send_message(RTCDataChannelMessage {
            is_string: true,
            data: BytesMut::from(s.into().as_str()),
        })
    }

    pub fn send_message(&mut self, message: RTCDataChannelMessage) -> Result<()> {
        if self.peer_connection.is_closed() {
            return Err(Error::ErrConnectionClosed);
        }
        self.internal_mut()?.send(message.is_string, message.data)
    }

    /// Starts closing the channel. The stream is reset and `OnClose` follows
    /// once the peer reset its half too. A channel that never opened closes
    /// at once.
    pub fn close(&mut self) -> Result<()> {
        let id = self.id;
        let pc = &mut *self.peer_connection;
        let dc = pc
            .data_channels
            .get_mut(&id)
            .ok_or(Error::ErrDataChannelClosed)?;
        match dc.ready_state {
            RTCDataChannelState::Closing | RTCDataChannelState::Closed => return Ok(()),
            _ => {}
        }

        let ctx = &mut pc.pipeline_context;
        let open_stream_id = dc.stream_id.filter(|_| dc.data_channel.is_some());
        if let Some(stream_id) = open_stream_id {
            debug!("closing data channel {id} on stream {stream_id}");
            dc.ready_state = RTCDataChannelState::Closing;
            if let Some(data_channel) = dc.data_channel.as_mut() {
                sansio::Protocol::close(data_channel)?;
            }
            ctx.datachannel_handler_context
                .write_outs
                .push_back(TaggedRTCMessageInternal {
                    now: Instant::now(),
                    transport: TransportContext::default(),
                    message: RTCMessageInternal::Sctp(SCTPMessage::CloseStream(stream_id)),
                });
        } else {
            debug!("closing data channel {id} before it was opened");
            dc.force_closed();
            ctx.datachannel_handler_context
                .event_outs
                .push_back(RTCEventInternal::RTCPeerConnectionEvent(
                    RTCPeerConnectionEvent::OnDataChannel(RTCDataChannelEvent::OnClose(id)),
                ));
        }
        Ok(())
    }
}
