//! Connection state types.
//!
//! A peer connection tracks four independent state machines:
//!
//! - **[`RTCSignalingState`]** - offer/answer progress (stable, have-local-offer, ...)
//! - **[`RTCIceConnectionState`]** - connectivity of the ICE agent
//! - **[`RTCIceGatheringState`]** - local candidate gathering progress
//! - **[`RTCPeerConnectionState`]** - the aggregate connection state
//!
//! Every transition is reported as an event from `poll_event`; nothing is
//! delivered through callbacks.
//!
//! ```no_run
//! use rtc::peer_connection::event::RTCPeerConnectionEvent;
//! use rtc::peer_connection::state::{RTCIceConnectionState, RTCPeerConnectionState};
//!
//! # fn example(event: RTCPeerConnectionEvent) {
//! match event {
//!     RTCPeerConnectionEvent::OnIceConnectionStateChangeEvent(state) => {
//!         if state == RTCIceConnectionState::Disconnected {
//!             println!("ICE lost connectivity, a restart may follow");
//!         }
//!     }
//!     RTCPeerConnectionEvent::OnConnectionStateChangeEvent(state) => {
//!         if state == RTCPeerConnectionState::Failed {
//!             println!("connection failed");
//!         }
//!     }
//!     _ => {}
//! }
//! # }
//! ```

pub(crate) mod ice_connection_state;
pub(crate) mod ice_gathering_state;
pub(crate) mod peer_connection_state;
pub(crate) mod signaling_state;

pub use ice_connection_state::RTCIceConnectionState;
pub use ice_gathering_state::RTCIceGatheringState;
pub use peer_connection_state::RTCPeerConnectionState;
pub use signaling_state::RTCSignalingState;
