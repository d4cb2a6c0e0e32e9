use std::fmt;

use ice::candidate::CandidateType;
use serde::{Deserialize, Serialize};

/// Defines which ICE candidates the agent may gather and use.
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#rtcicetransportpolicy-enum)
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum RTCIceTransportPolicy {
    /// Unspecified - not a valid policy, used as default value
    #[default]
    Unspecified = 0,

    /// Host, server reflexive and relay candidates.
    #[serde(rename = "all")]
    All = 1,

    /// Only relay candidates from TURN servers, hiding local and public addresses.
    #[serde(rename = "relay")]
    Relay = 2,
}

const ICE_TRANSPORT_POLICY_RELAY_STR: &str = "relay";
const ICE_TRANSPORT_POLICY_ALL_STR: &str = "all";

impl From<&str> for RTCIceTransportPolicy {
    fn from(raw: &str) -> Self {
        match raw {
            ICE_TRANSPORT_POLICY_RELAY_STR => RTCIceTransportPolicy::Relay,
            ICE_TRANSPORT_POLICY_ALL_STR => RTCIceTransportPolicy::All,
            _ => RTCIceTransportPolicy::Unspecified,
        }
    }
}

impl fmt::Display for RTCIceTransportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCIceTransportPolicy::Relay => ICE_TRANSPORT_POLICY_RELAY_STR,
            RTCIceTransportPolicy::All => ICE_TRANSPORT_POLICY_ALL_STR,
            RTCIceTransportPolicy::Unspecified => {
                crate::peer_connection::configuration::UNSPECIFIED_STR
            }
        };
        write!(f, "{s}")
    }
}

impl RTCIceTransportPolicy {
    /// Candidate types the agent gathers under this policy. An empty list lets
    /// the agent use its defaults.
    pub(crate) fn candidate_types(self) -> Vec<CandidateType> {
        match self {
            RTCIceTransportPolicy::Relay => vec![CandidateType::Relay],
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_ice_transport_policy() {
        let tests = vec![
            ("relay", RTCIceTransportPolicy::Relay),
            ("all", RTCIceTransportPolicy::All),
            ("any", RTCIceTransportPolicy::Unspecified),
        ];

        for (policy_string, expected_policy) in tests {
            assert_eq!(RTCIceTransportPolicy::from(policy_string), expected_policy);
        }
    }

    #[test]
    fn test_ice_transport_policy_candidate_types() {
        assert_eq!(
            RTCIceTransportPolicy::Relay.candidate_types(),
            vec![CandidateType::Relay]
        );
        assert!(RTCIceTransportPolicy::All.candidate_types().is_empty());
    }
}
