//! # RTC - Sans-I/O WebRTC peer connection
//!
//! A peer-connection core modelled on the [WebRTC specification](https://www.w3.org/TR/webrtc/)
//! using a **sans-I/O architecture**: ICE connectivity establishment, offer/answer
//! negotiation, data channels over a reliable/partially reliable association, opaque media
//! tracks carried in RTP packets and a pull-based statistics report.
//!
//! ## What is Sans-I/O?
//!
//! The connection owns no socket, thread or clock. **You** feed it the datagrams received on
//! your sockets and the current time, and send whatever it hands back:
//!
//! - **Runtime Independence**: Works with tokio, smol or blocking I/O
//! - **Deterministic tests**: Two connections can be wired through an in-memory network
//!   with simulated time
//!
//! ## Quick Start
//!
//! ```no_run
//! use rtc::peer_connection::RTCPeerConnection;
//! use rtc::peer_connection::configuration::RTCConfigurationBuilder;
//! use rtc::peer_connection::transport::RTCIceServer;
//! use rtc::signaling::SignalingMessage;
//! use rtc::shared::TransportProtocol;
//!
//! # fn send_to_remote_peer(_: &str) {}
//! # fn receive_from_remote_peer() -> String { String::new() }
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RTCConfigurationBuilder::new()
//!     .with_ice_servers(vec![RTCIceServer {
//!         urls: vec!["stun:stun.l.google.com:19302".to_string()],
//!         ..Default::default()
//!     }])
//!     .build();
//! let mut pc = RTCPeerConnection::new(config)?;
//!
//! // the socket belongs to the application
//! pc.add_local_address("192.168.1.100:50000".parse()?, TransportProtocol::UDP)?;
//! pc.create_data_channel("chat", None)?;
//!
//! let offer = pc.create_offer(None)?;
//! pc.set_local_description(offer.clone())?;
//! send_to_remote_peer(&SignalingMessage::try_from(&offer)?.to_json()?);
//!
//! let answer = SignalingMessage::from_json(&receive_from_remote_peer())?;
//! pc.set_remote_description(answer.to_description()?)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Event Loop
//!
//! ```no_run
//! use rtc::peer_connection::RTCPeerConnection;
//! use rtc::peer_connection::event::RTCPeerConnectionEvent;
//! use rtc::peer_connection::message::RTCMessage;
//! use rtc::shared::{TaggedBytesMut, TransportContext, TransportProtocol};
//! use rtc::sansio::Protocol;
//! use std::time::{Duration, Instant};
//! use tokio::net::UdpSocket;
//! use bytes::BytesMut;
//!
//! # async fn run(mut pc: RTCPeerConnection, socket: UdpSocket) -> Result<(), Box<dyn std::error::Error>> {
//! let local_addr = socket.local_addr()?;
//! let mut buf = vec![0u8; 2000];
//!
//! loop {
//!     while let Some(msg) = pc.poll_write() {
//!         socket.send_to(&msg.message, msg.transport.peer_addr).await?;
//!     }
//!     while let Some(event) = pc.poll_event() {
//!         if let RTCPeerConnectionEvent::OnConnectionStateChangeEvent(state) = event {
//!             println!("Connection State: {state}");
//!         }
//!     }
//!     while let Some(message) = pc.poll_read() {
//!         if let RTCMessage::DataChannelMessage(channel_id, msg) = message {
//!             println!("channel {channel_id}: {} bytes", msg.data.len());
//!         }
//!     }
//!
//!     let timeout = pc
//!         .poll_timeout()
//!         .unwrap_or(Instant::now() + Duration::from_secs(1));
//!     let delay = timeout.saturating_duration_since(Instant::now());
//!     tokio::select! {
//!         _ = tokio::time::sleep(delay) => {
//!             pc.handle_timeout(Instant::now())?;
//!         }
//!         Ok((n, peer_addr)) = socket.recv_from(&mut buf) => {
//!             pc.handle_read(TaggedBytesMut {
//!                 now: Instant::now(),
//!                 transport: TransportContext {
//!                     local_addr,
//!                     peer_addr,
//!                     transport_protocol: TransportProtocol::UDP,
//!                 },
//!                 message: BytesMut::from(&buf[..n]),
//!             })?;
//!         }
//!     }
//! }
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - **[`peer_connection`]** - [`RTCPeerConnection`](peer_connection::RTCPeerConnection),
//!   configuration, events, session descriptions, states and ICE transport types
//! - **[`data_channel`]** - data channel handles, options and messages
//! - **[`media_stream`]** - media tracks and the samples they carry
//! - **[`signaling`]** - JSON messages for an external signaling channel
//! - **[`statistics`]** - the report returned by `get_stats`
//!
//! The data plane is not encrypted: DTLS and SRTP are not part of this stack, so the
//! transport does not interoperate with browsers.
//!
//! ## Specification Compliance
//!
//! - [W3C WebRTC 1.0] - peer connection API and state machines
//! - [RFC 8829] - JSEP: JavaScript Session Establishment Protocol
//! - [RFC 8866] - SDP: Session Description Protocol
//! - [RFC 8445] - ICE: Interactive Connectivity Establishment
//! - [RFC 8832] - WebRTC Data Channel Establishment Protocol
//! - [RFC 3550] - RTP: Real-time Transport Protocol
//!
//! [W3C WebRTC 1.0]: https://www.w3.org/TR/webrtc/
//! [RFC 8829]: https://datatracker.ietf.org/doc/html/rfc8829
//! [RFC 8866]: https://datatracker.ietf.org/doc/html/rfc8866
//! [RFC 8445]: https://datatracker.ietf.org/doc/html/rfc8445
//! [RFC 8832]: https://datatracker.ietf.org/doc/html/rfc8832
//! [RFC 3550]: https://datatracker.ietf.org/doc/html/rfc3550

#![doc(
    html_logo_url = "https://raw.githubusercontent.com/webrtc-rs/webrtc-rs.github.io/master/res/rtc.png"
)]
#![warn(rust_2018_idioms)]

pub use {datachannel, ice, rtp, sansio, sctp, sdp, shared};

pub mod data_channel;
pub mod media_stream;
pub mod peer_connection;
pub mod signaling;
pub mod statistics;
