use crate::peer_connection::configuration::UNSPECIFIED_STR;
use crate::peer_connection::state::ice_connection_state::RTCIceConnectionState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// PeerConnectionState indicates the state of the PeerConnection.
///
/// The state aggregates the ICE transport state; there is no other transport
/// underneath the association, so ICE alone decides connectivity.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcpeerconnectionstate)
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RTCPeerConnectionState {
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified,

    #[serde(rename = "new")]
    New,

    #[serde(rename = "connecting")]
    Connecting,

    #[serde(rename = "connected")]
    Connected,

    #[serde(rename = "disconnected")]
    Disconnected,

    /// Connectivity failed, or the automatic restart budget ran out.
    #[serde(rename = "failed")]
    Failed,

    /// Terminal.
    #[serde(rename = "closed")]
    Closed,
}

const PEER_CONNECTION_STATE_NEW_STR: &str = "new";
const PEER_CONNECTION_STATE_CONNECTING_STR: &str = "connecting";
const PEER_CONNECTION_STATE_CONNECTED_STR: &str = "connected";
const PEER_CONNECTION_STATE_DISCONNECTED_STR: &str = "disconnected";
const PEER_CONNECTION_STATE_FAILED_STR: &str = "failed";
const PEER_CONNECTION_STATE_CLOSED_STR: &str = "closed";

impl From<&str> for RTCPeerConnectionState {
    fn from(raw: &str) -> Self {
        match raw {
            PEER_CONNECTION_STATE_NEW_STR => RTCPeerConnectionState::New,
            PEER_CONNECTION_STATE_CONNECTING_STR => RTCPeerConnectionState::Connecting,
            PEER_CONNECTION_STATE_CONNECTED_STR => RTCPeerConnectionState::Connected,
            PEER_CONNECTION_STATE_DISCONNECTED_STR => RTCPeerConnectionState::Disconnected,
            PEER_CONNECTION_STATE_FAILED_STR => RTCPeerConnectionState::Failed,
            PEER_CONNECTION_STATE_CLOSED_STR => RTCPeerConnectionState::Closed,
            _ => RTCPeerConnectionState::Unspecified,
        }
    }
}

impl From<RTCIceConnectionState> for RTCPeerConnectionState {
    fn from(state: RTCIceConnectionState) -> Self {
        match state {
            RTCIceConnectionState::New => RTCPeerConnectionState::New,
            RTCIceConnectionState::Checking => RTCPeerConnectionState::Connecting,
            RTCIceConnectionState::Connected | RTCIceConnectionState::Completed => {
                RTCPeerConnectionState::Connected
            }
            RTCIceConnectionState::Disconnected => RTCPeerConnectionState::Disconnected,
            RTCIceConnectionState::Failed => RTCPeerConnectionState::Failed,
            RTCIceConnectionState::Closed => RTCPeerConnectionState::Closed,
            RTCIceConnectionState::Unspecified => RTCPeerConnectionState::Unspecified,
        }
    }
}

impl fmt::Display for RTCPeerConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCPeerConnectionState::New => PEER_CONNECTION_STATE_NEW_STR,
            RTCPeerConnectionState::Connecting => PEER_CONNECTION_STATE_CONNECTING_STR,
            RTCPeerConnectionState::Connected => PEER_CONNECTION_STATE_CONNECTED_STR,
            RTCPeerConnectionState::Disconnected => PEER_CONNECTION_STATE_DISCONNECTED_STR,
            RTCPeerConnectionState::Failed => PEER_CONNECTION_STATE_FAILED_STR,
            RTCPeerConnectionState::Closed => PEER_CONNECTION_STATE_CLOSED_STR,
            RTCPeerConnectionState::Unspecified => UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_peer_connection_state() {
        let tests = vec![
            (UNSPECIFIED_STR, RTCPeerConnectionState::Unspecified),
            ("new", RTCPeerConnectionState::New),
            ("connecting", RTCPeerConnectionState::Connecting),
            ("connected", RTCPeerConnectionState::Connected),
            ("disconnected", RTCPeerConnectionState::Disconnected),
            ("failed", RTCPeerConnectionState::Failed),
            ("closed", RTCPeerConnectionState::Closed),
        ];

        for (state_string, expected_state) in tests {
            assert_eq!(
                RTCPeerConnectionState::from(state_string),
                expected_state,
                "testCase: {expected_state}",
            );
            assert_eq!(expected_state.to_string(), state_string);
        }
    }

    #[test]
    fn test_peer_connection_state_from_ice() {
        let tests = vec![
            (RTCIceConnectionState::New, RTCPeerConnectionState::New),
            (
                RTCIceConnectionState::Checking,
                RTCPeerConnectionState::Connecting,
            ),
            (
                RTCIceConnectionState::Connected,
                RTCPeerConnectionState::Connected,
            ),
            (
                RTCIceConnectionState::Completed,
                RTCPeerConnectionState::Connected,
            ),
            (
                RTCIceConnectionState::Disconnected,
                RTCPeerConnectionState::Disconnected,
            ),
            (RTCIceConnectionState::Failed, RTCPeerConnectionState::Failed),
            (RTCIceConnectionState::Closed, RTCPeerConnectionState::Closed),
        ];

        for (ice_state, expected_state) in tests {
            assert_eq!(RTCPeerConnectionState::from(ice_state), expected_state);
        }
    }
}
