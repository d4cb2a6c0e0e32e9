//! Application data exchanged with a peer connection.
//!
//! The peer connection performs no I/O. Datagrams received on the sockets
//! the application owns go in through `handle_read`; what the connection
//! delivers back is an [`RTCMessage`] returned by `poll_read`:
//!
//! ```text
//!   application  --RTCMessage-->  handle_write     poll_read  --RTCMessage-->  application
//!                                        \           /
//!                                     RTCPeerConnection
//!                                        /           \
//!   socket       --datagram-->    handle_read      poll_write --datagram-->   socket
//! ```
//!
//! ```no_run
//! use rtc::peer_connection::message::RTCMessage;
//!
//! # fn receive(message: RTCMessage) {
//! match message {
//!     RTCMessage::DataChannelMessage(channel_id, msg) => {
//!         if msg.is_string {
//!             println!("channel {channel_id}: {}", String::from_utf8_lossy(&msg.data));
//!         }
//!     }
//!     RTCMessage::MediaSample(track_id, sample) => {
//!         println!("track {track_id}: {} bytes", sample.data.len());
//!     }
//! }
//! # }
//! ```

pub(crate) mod internal;

use crate::data_channel::RTCDataChannelId;
use crate::data_channel::message::RTCDataChannelMessage;
use crate::media_stream::MediaSample;
use crate::media_stream::track::MediaStreamTrackId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RTCMessage {
    DataChannelMessage(RTCDataChannelId, RTCDataChannelMessage),
    MediaSample(MediaStreamTrackId, MediaSample),
}
