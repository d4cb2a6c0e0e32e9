use std::fmt;

use crate::peer_connection::configuration::UNSPECIFIED_STR;
use serde::{Deserialize, Serialize};

/// Describes the type of a session description in the offer/answer model.
///
/// ```
/// use rtc::peer_connection::sdp::RTCSdpType;
///
/// let parsed: RTCSdpType = "pranswer".into();
/// assert_eq!(parsed, RTCSdpType::Pranswer);
/// assert_eq!(RTCSdpType::Offer.to_string(), "offer");
/// ```
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#dom-rtcsessiondescription-type)
/// * [RFC 3264](https://datatracker.ietf.org/doc/html/rfc3264)
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum RTCSdpType {
    #[default]
    Unspecified = 0,

    /// The description is an SDP offer.
    #[serde(rename = "offer")]
    Offer,

    /// The description is a provisional answer. It may be applied in
    /// response to an offer or as an update of an earlier pranswer.
    #[serde(rename = "pranswer")]
    Pranswer,

    /// The description is the final answer of an offer/answer exchange.
    #[serde(rename = "answer")]
    Answer,

    /// Cancels the current exchange and returns to the stable state.
    #[serde(rename = "rollback")]
    Rollback,
}

const SDP_TYPE_OFFER_STR: &str = "offer";
const SDP_TYPE_PRANSWER_STR: &str = "pranswer";
const SDP_TYPE_ANSWER_STR: &str = "answer";
const SDP_TYPE_ROLLBACK_STR: &str = "rollback";

impl From<&str> for RTCSdpType {
    fn from(raw: &str) -> Self {
        match raw {
            SDP_TYPE_OFFER_STR => RTCSdpType::Offer,
            SDP_TYPE_PRANSWER_STR => RTCSdpType::Pranswer,
            SDP_TYPE_ANSWER_STR => RTCSdpType::Answer,
            SDP_TYPE_ROLLBACK_STR => RTCSdpType::Rollback,
            _ => RTCSdpType::Unspecified,
        }
    }
}

impl fmt::Display for RTCSdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RTCSdpType::Offer => write!(f, "{SDP_TYPE_OFFER_STR}"),
            RTCSdpType::Pranswer => write!(f, "{SDP_TYPE_PRANSWER_STR}"),
            RTCSdpType::Answer => write!(f, "{SDP_TYPE_ANSWER_STR}"),
            RTCSdpType::Rollback => write!(f, "{SDP_TYPE_ROLLBACK_STR}"),
            _ => write!(f, "{UNSPECIFIED_STR}"),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_new_sdp_type() {
        let tests = vec![
            ("Unspecified", RTCSdpType::Unspecified),
            ("offer", RTCSdpType::Offer),
            ("pranswer", RTCSdpType::Pranswer),
            ("answer", RTCSdpType::Answer),
            ("rollback", RTCSdpType::Rollback),
        ];

        for (sdp_type_string, expected_sdp_type) in tests {
            assert_eq!(RTCSdpType::from(sdp_type_string), expected_sdp_type);
            assert_eq!(expected_sdp_type.to_string(), sdp_type_string);
        }
    }
}
