use std::fmt;

use crate::peer_connection::configuration::UNSPECIFIED_STR;
use crate::peer_connection::sdp::sdp_type::RTCSdpType;
use serde::{Deserialize, Serialize};
use shared::error::{Error, Result};

#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum StateChangeOp {
    #[default]
    SetLocal,
    SetRemote,
}

impl fmt::Display for StateChangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            StateChangeOp::SetLocal => write!(f, "SetLocal"),
            StateChangeOp::SetRemote => write!(f, "SetRemote"),
        }
    }
}

/// SignalingState indicates the signaling state of the offer/answer process.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcsignalingstate)
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RTCSignalingState {
    #[serde(rename = "unspecified")]
    Unspecified = 0,

    /// No offer/answer exchange in progress. This is also the initial state.
    #[default]
    #[serde(rename = "stable")]
    Stable,

    /// A local offer has been applied.
    #[serde(rename = "have-local-offer")]
    HaveLocalOffer,

    /// A remote offer has been applied.
    #[serde(rename = "have-remote-offer")]
    HaveRemoteOffer,

    /// A remote offer and a local pranswer have been applied.
    #[serde(rename = "have-local-pranswer")]
    HaveLocalPranswer,

    /// A local offer and a remote pranswer have been applied.
    #[serde(rename = "have-remote-pranswer")]
    HaveRemotePranswer,

    #[serde(rename = "closed")]
    Closed,
}

const SIGNALING_STATE_STABLE_STR: &str = "stable";
const SIGNALING_STATE_HAVE_LOCAL_OFFER_STR: &str = "have-local-offer";
const SIGNALING_STATE_HAVE_REMOTE_OFFER_STR: &str = "have-remote-offer";
const SIGNALING_STATE_HAVE_LOCAL_PRANSWER_STR: &str = "have-local-pranswer";
const SIGNALING_STATE_HAVE_REMOTE_PRANSWER_STR: &str = "have-remote-pranswer";
const SIGNALING_STATE_CLOSED_STR: &str = "closed";

impl From<&str> for RTCSignalingState {
    fn from(raw: &str) -> Self {
        match raw {
            SIGNALING_STATE_STABLE_STR => RTCSignalingState::Stable,
            SIGNALING_STATE_HAVE_LOCAL_OFFER_STR => RTCSignalingState::HaveLocalOffer,
            SIGNALING_STATE_HAVE_REMOTE_OFFER_STR => RTCSignalingState::HaveRemoteOffer,
            SIGNALING_STATE_HAVE_LOCAL_PRANSWER_STR => RTCSignalingState::HaveLocalPranswer,
            SIGNALING_STATE_HAVE_REMOTE_PRANSWER_STR => RTCSignalingState::HaveRemotePranswer,
            SIGNALING_STATE_CLOSED_STR => RTCSignalingState::Closed,
            _ => RTCSignalingState::Unspecified,
        }
    }
}

impl fmt::Display for RTCSignalingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCSignalingState::Stable => SIGNALING_STATE_STABLE_STR,
            RTCSignalingState::HaveLocalOffer => SIGNALING_STATE_HAVE_LOCAL_OFFER_STR,
            RTCSignalingState::HaveRemoteOffer => SIGNALING_STATE_HAVE_REMOTE_OFFER_STR,
            RTCSignalingState::HaveLocalPranswer => SIGNALING_STATE_HAVE_LOCAL_PRANSWER_STR,
            RTCSignalingState::HaveRemotePranswer => SIGNALING_STATE_HAVE_REMOTE_PRANSWER_STR,
            RTCSignalingState::Closed => SIGNALING_STATE_CLOSED_STR,
            RTCSignalingState::Unspecified => UNSPECIFIED_STR,
        };
        write!(f, "{s}")
    }
}

/// Validates a proposed transition of the offer/answer state machine and
/// returns the state to enter.
///
/// A second local offer in have-local-offer is rejected: the pending offer
/// has to be answered or rolled back first. Rollback is allowed from every
/// have-* state and leads back to stable.
pub(crate) fn check_next_signaling_state(
    cur: RTCSignalingState,
    next: RTCSignalingState,
    op: StateChangeOp,
    sdp_type: RTCSdpType,
) -> Result<RTCSignalingState> {
    // Special case for rollbacks
    if sdp_type == RTCSdpType::Rollback {
        return match cur {
            RTCSignalingState::Stable => Err(Error::ErrSignalingStateCannotRollback),
            RTCSignalingState::HaveLocalOffer
            | RTCSignalingState::HaveRemoteOffer
            | RTCSignalingState::HaveLocalPranswer
            | RTCSignalingState::HaveRemotePranswer
                if next == RTCSignalingState::Stable =>
            {
                Ok(next)
            }
            _ => Err(transition_error(cur, op, sdp_type)),
        };
    }

    // 4.3.1 valid state transitions
    let valid = match (cur, op, sdp_type) {
        // stable->SetLocal(offer)->have-local-offer
        (RTCSignalingState::Stable, StateChangeOp::SetLocal, RTCSdpType::Offer) => {
            next == RTCSignalingState::HaveLocalOffer
        }
        // stable->SetRemote(offer)->have-remote-offer
        (RTCSignalingState::Stable, StateChangeOp::SetRemote, RTCSdpType::Offer) => {
            next == RTCSignalingState::HaveRemoteOffer
        }
        // have-local-offer->SetRemote(answer)->stable
        (RTCSignalingState::HaveLocalOffer, StateChangeOp::SetRemote, RTCSdpType::Answer) => {
            next == RTCSignalingState::Stable
        }
        // have-local-offer->SetRemote(pranswer)->have-remote-pranswer
        (RTCSignalingState::HaveLocalOffer, StateChangeOp::SetRemote, RTCSdpType::Pranswer) => {
            next == RTCSignalingState::HaveRemotePranswer
        }
        // have-remote-pranswer->SetRemote(pranswer|answer)->have-remote-pranswer|stable
        (RTCSignalingState::HaveRemotePranswer, StateChangeOp::SetRemote, RTCSdpType::Pranswer) => {
            next == RTCSignalingState::HaveRemotePranswer
        }
        (RTCSignalingState::HaveRemotePranswer, StateChangeOp::SetRemote, RTCSdpType::Answer) => {
            next == RTCSignalingState::Stable
        }
        // have-remote-offer->SetLocal(answer)->stable
        (RTCSignalingState::HaveRemoteOffer, StateChangeOp::SetLocal, RTCSdpType::Answer) => {
            next == RTCSignalingState::Stable
        }
        // have-remote-offer->SetLocal(pranswer)->have-local-pranswer
        (RTCSignalingState::HaveRemoteOffer, StateChangeOp::SetLocal, RTCSdpType::Pranswer) => {
            next == RTCSignalingState::HaveLocalPranswer
        }
        // have-local-pranswer->SetLocal(pranswer|answer)->have-local-pranswer|stable
        (RTCSignalingState::HaveLocalPranswer, StateChangeOp::SetLocal, RTCSdpType::Pranswer) => {
            next == RTCSignalingState::HaveLocalPranswer
        }
        (RTCSignalingState::HaveLocalPranswer, StateChangeOp::SetLocal, RTCSdpType::Answer) => {
            next == RTCSignalingState::Stable
        }
        _ => false,
    };

    if valid {
        Ok(next)
    } else {
        Err(transition_error(cur, op, sdp_type))
    }
}

fn transition_error(cur: RTCSignalingState, op: StateChangeOp, sdp_type: RTCSdpType) -> Error {
    Error::ErrSignalingStateProposedTransitionInvalid(format!(
        "from {cur} applying {op}({sdp_type})"
    ))
}

/// The state entered when a description of `sdp_type` is applied by `op`.
pub(crate) fn next_signaling_state(op: StateChangeOp, sdp_type: RTCSdpType) -> RTCSignalingState {
    match (op, sdp_type) {
        (StateChangeOp::SetLocal, RTCSdpType::Offer) => RTCSignalingState::HaveLocalOffer,
        (StateChangeOp::SetRemote, RTCSdpType::Offer) => RTCSignalingState::HaveRemoteOffer,
        (StateChangeOp::SetLocal, RTCSdpType::Pranswer) => RTCSignalingState::HaveLocalPranswer,
        (StateChangeOp::SetRemote, RTCSdpType::Pranswer) => RTCSignalingState::HaveRemotePranswer,
        (_, RTCSdpType::Answer) | (_, RTCSdpType::Rollback) => RTCSignalingState::Stable,
        (_, RTCSdpType::Unspecified) => RTCSignalingState::Unspecified,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_signaling_state() {
        let tests = vec![
            ("Unspecified", RTCSignalingState::Unspecified),
            ("stable", RTCSignalingState::Stable),
            ("have-local-offer", RTCSignalingState::HaveLocalOffer),
            ("have-remote-offer", RTCSignalingState::HaveRemoteOffer),
            ("have-local-pranswer", RTCSignalingState::HaveLocalPranswer),
            (
                "have-remote-pranswer",
                RTCSignalingState::HaveRemotePranswer,
            ),
            ("closed", RTCSignalingState::Closed),
        ];

        for (state_string, expected_state) in tests {
            assert_eq!(RTCSignalingState::from(state_string), expected_state);
            assert_eq!(expected_state.to_string(), state_string);
        }
    }

    #[test]
    fn test_signaling_state_transitions() {
        let tests = vec![
            (
                "stable->SetLocal(offer)->have-local-offer",
                RTCSignalingState::Stable,
                StateChangeOp::SetLocal,
                RTCSdpType::Offer,
                Ok(RTCSignalingState::HaveLocalOffer),
            ),
            (
                "stable->SetRemote(offer)->have-remote-offer",
                RTCSignalingState::Stable,
                StateChangeOp::SetRemote,
                RTCSdpType::Offer,
                Ok(RTCSignalingState::HaveRemoteOffer),
            ),
            (
                "have-local-offer->SetRemote(answer)->stable",
                RTCSignalingState::HaveLocalOffer,
                StateChangeOp::SetRemote,
                RTCSdpType::Answer,
                Ok(RTCSignalingState::Stable),
            ),
            (
                "have-local-offer->SetRemote(pranswer)->have-remote-pranswer",
                RTCSignalingState::HaveLocalOffer,
                StateChangeOp::SetRemote,
                RTCSdpType::Pranswer,
                Ok(RTCSignalingState::HaveRemotePranswer),
            ),
            (
                "have-remote-pranswer->SetRemote(answer)->stable",
                RTCSignalingState::HaveRemotePranswer,
                StateChangeOp::SetRemote,
                RTCSdpType::Answer,
                Ok(RTCSignalingState::Stable),
            ),
            (
                "have-remote-offer->SetLocal(answer)->stable",
                RTCSignalingState::HaveRemoteOffer,
                StateChangeOp::SetLocal,
                RTCSdpType::Answer,
                Ok(RTCSignalingState::Stable),
            ),
            (
                "have-remote-offer->SetLocal(pranswer)->have-local-pranswer",
                RTCSignalingState::HaveRemoteOffer,
                StateChangeOp::SetLocal,
                RTCSdpType::Pranswer,
                Ok(RTCSignalingState::HaveLocalPranswer),
            ),
            (
                "have-local-pranswer->SetLocal(answer)->stable",
                RTCSignalingState::HaveLocalPranswer,
                StateChangeOp::SetLocal,
                RTCSdpType::Answer,
                Ok(RTCSignalingState::Stable),
            ),
            (
                "have-local-offer->Rollback->stable",
                RTCSignalingState::HaveLocalOffer,
                StateChangeOp::SetLocal,
                RTCSdpType::Rollback,
                Ok(RTCSignalingState::Stable),
            ),
            (
                "have-remote-offer->Rollback->stable",
                RTCSignalingState::HaveRemoteOffer,
                StateChangeOp::SetRemote,
                RTCSdpType::Rollback,
                Ok(RTCSignalingState::Stable),
            ),
            (
                "(invalid) stable->Rollback",
                RTCSignalingState::Stable,
                StateChangeOp::SetLocal,
                RTCSdpType::Rollback,
                Err(Error::ErrSignalingStateCannotRollback),
            ),
            (
                "(invalid) have-local-offer->SetLocal(offer)",
                RTCSignalingState::HaveLocalOffer,
                StateChangeOp::SetLocal,
                RTCSdpType::Offer,
                Err(Error::ErrSignalingStateProposedTransitionInvalid(
                    "from have-local-offer applying SetLocal(offer)".to_owned(),
                )),
            ),
            (
                "(invalid) stable->SetRemote(pranswer)",
                RTCSignalingState::Stable,
                StateChangeOp::SetRemote,
                RTCSdpType::Pranswer,
                Err(Error::ErrSignalingStateProposedTransitionInvalid(
                    "from stable applying SetRemote(pranswer)".to_owned(),
                )),
            ),
            (
                "(invalid) stable->SetRemote(answer)",
                RTCSignalingState::Stable,
                StateChangeOp::SetRemote,
                RTCSdpType::Answer,
                Err(Error::ErrSignalingStateProposedTransitionInvalid(
                    "from stable applying SetRemote(answer)".to_owned(),
                )),
            ),
            (
                "(invalid) have-remote-offer->SetRemote(offer)",
                RTCSignalingState::HaveRemoteOffer,
                StateChangeOp::SetRemote,
                RTCSdpType::Offer,
                Err(Error::ErrSignalingStateProposedTransitionInvalid(
                    "from have-remote-offer applying SetRemote(offer)".to_owned(),
                )),
            ),
        ];

        for (desc, cur, op, sdp_type, expected) in tests {
            let next = next_signaling_state(op, sdp_type);
            let result = check_next_signaling_state(cur, next, op, sdp_type);
            assert_eq!(result, expected, "{desc}");
            if let Err(err) = result {
                assert!(err.is_invalid_state_transition(), "{desc}");
            }
        }
    }
}
