//! ICE transport types.
//!
//! A peer connection runs every media section and its data channels over a
//! single bundled ICE transport. Candidates are described by
//! [`RTCIceCandidate`] and exchanged in the [`RTCIceCandidateInit`] form; the
//! STUN and TURN servers the agent may use come from [`RTCIceServer`].
//!
//! ```
//! use rtc::peer_connection::transport::RTCIceCandidateInit;
//!
//! let init: RTCIceCandidateInit = serde_json::from_str(
//!     r#"{"candidate":"candidate:1 1 udp 2130706431 10.0.0.1 4000 typ host","sdpMid":"0","sdpMLineIndex":0}"#,
//! ).unwrap();
//! assert_eq!(init.sdp_mid.as_deref(), Some("0"));
//! ```
//!
//! # Specifications
//!
//! - [RFC 8445] - ICE: Interactive Connectivity Establishment
//! - [RFC 8838] - Trickle ICE
//! - [W3C WebRTC Specification]
//!
//! [RFC 8445]: https://datatracker.ietf.org/doc/html/rfc8445
//! [RFC 8838]: https://datatracker.ietf.org/doc/html/rfc8838
//! [W3C WebRTC Specification]: https://w3c.github.io/webrtc-pc/

pub(crate) mod ice;

pub use self::ice::candidate::{RTCIceCandidate, RTCIceCandidateInit};
pub use self::ice::candidate_pair::RTCIceCandidatePair;
pub use self::ice::parameters::RTCIceParameters;
pub use self::ice::role::RTCIceRole;
pub use self::ice::server::RTCIceServer;
pub use ::ice::candidate::CandidateType as RTCIceCandidateType;
