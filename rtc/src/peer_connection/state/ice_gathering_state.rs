use crate::peer_connection::configuration::UNSPECIFIED_STR;
use ice::state::GatheringState;
use serde::{Deserialize, Serialize};
use std::fmt;

/// ICEGatheringState describes the state of the candidate gathering process.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcicegatheringstate)
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RTCIceGatheringState {
    #[default]
    #[serde(rename = "unspecified")]
    Unspecified,

    #[serde(rename = "new")]
    New,

    #[serde(rename = "gathering")]
    Gathering,

    /// Every gatherer finished, the end-of-candidates marker has been emitted.
    #[serde(rename = "complete")]
    Complete,
}

const ICE_GATHERING_STATE_NEW_STR: &str = "new";
const ICE_GATHERING_STATE_GATHERING_STR: &str = "gathering";
const ICE_GATHERING_STATE_COMPLETE_STR: &str = "complete";

impl From<&str> for RTCIceGatheringState {
    fn from(raw: &str) -> Self {
        match raw {
            ICE_GATHERING_STATE_NEW_STR => RTCIceGatheringState::New,
            ICE_GATHERING_STATE_GATHERING_STR => RTCIceGatheringState::Gathering,
            ICE_GATHERING_STATE_COMPLETE_STR => RTCIceGatheringState::Complete,
            _ => RTCIceGatheringState::Unspecified,
        }
    }
}

impl From<GatheringState> for RTCIceGatheringState {
    fn from(raw: GatheringState) -> Self {
        match raw {
            GatheringState::New => RTCIceGatheringState::New,
            GatheringState::Gathering => RTCIceGatheringState::Gathering,
            GatheringState::Complete => RTCIceGatheringState::Complete,
            GatheringState::Unspecified => RTCIceGatheringState::Unspecified,
        }
    }
}

impl fmt::Display for RTCIceGatheringState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCIceGatheringState::New => ICE_GATHERING_STATE_NEW_STR,
            RTCIceGatheringState::Gathering => ICE_GATHERING_STATE_GATHERING_STR,
            RTCIceGatheringState::Complete => ICE_GATHERING_STATE_COMPLETE_STR,
            RTCIceGatheringState::Unspecified => UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}
