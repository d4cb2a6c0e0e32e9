//! Messages exchanged with the remote peer over an external signaling
//! channel.
//!
//! The transport of the channel (a room server, a websocket, a file) is up
//! to the application. [`SignalingMessage`] only fixes the JSON shape:
//!
//! ```text
//! {"type":"offer","sdp":"v=0..."}
//! {"type":"answer","sdp":"v=0..."}
//! {"type":"candidate","label":0,"id":"0","candidate":"candidate:..."}
//! {"type":"bye"}
//! ```
//!
//! ```
//! use rtc::signaling::SignalingMessage;
//!
//! # fn example() -> Result<(), rtc::shared::error::Error> {
//! let msg = SignalingMessage::from_json(r#"{"type":"bye"}"#)?;
//! assert_eq!(msg, SignalingMessage::Bye);
//! assert_eq!(msg.to_json()?, r#"{"type":"bye"}"#);
//! # Ok(())
//! # }
//! ```

use crate::peer_connection::sdp::{RTCSdpType, RTCSessionDescription};
use crate::peer_connection::transport::{RTCIceCandidate, RTCIceCandidateInit};
use serde::{Deserialize, Serialize};
use shared::error::{Error, Result};

const MESSAGE_TYPES: [&str; 4] = ["offer", "answer", "candidate", "bye"];

/// One message of the signaling channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SignalingMessage {
    Offer {
        sdp: String,
    },
    Answer {
        sdp: String,
    },
    /// A trickled candidate. An empty `candidate` ends the remote candidates.
    Candidate {
        /// m-line index of the media section
        label: u16,
        /// mid of the media section
        id: String,
        candidate: String,
    },
    /// The remote peer hung up.
    Bye,
}

impl SignalingMessage {
    pub fn from_json(s: &str) -> Result<Self> {
        let value: serde_json::Value =
            serde_json::from_str(s).map_err(|err| Error::ErrSignalingMessage(err.to_string()))?;

        let typ = value
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| Error::ErrSignalingMessage("missing type".to_owned()))?;
        if !MESSAGE_TYPES.contains(&typ) {
            return Err(Error::ErrSignalingMessage(format!(
                "unknown message type {typ}"
            )));
        }

        serde_json::from_value(value).map_err(|err| Error::ErrSignalingMessage(err.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|err| Error::ErrSignalingMessage(err.to_string()))
    }

    /// Turns an offer or answer message into a description, parsing its SDP.
    pub fn to_description(&self) -> Result<RTCSessionDescription> {
        match self {
            SignalingMessage::Offer { sdp } => RTCSessionDescription::offer(sdp.clone()),
            SignalingMessage::Answer { sdp } => RTCSessionDescription::answer(sdp.clone()),
            _ => Err(Error::ErrSignalingMessage(
                "not a session description".to_owned(),
            )),
        }
    }

    pub fn to_candidate(&self) -> Result<RTCIceCandidateInit> {
        match self {
            SignalingMessage::Candidate {
                label,
                id,
                candidate,
            } => Ok(RTCIceCandidateInit {
                candidate: candidate.clone(),
                sdp_mid: Some(id.clone()),
                sdp_mline_index: Some(*label),
                username_fragment: None,
            }),
            _ => Err(Error::ErrSignalingMessage("not a candidate".to_owned())),
        }
    }
}

impl TryFrom<&RTCSessionDescription> for SignalingMessage {
    type Error = Error;

    fn try_from(description: &RTCSessionDescription) -> Result<Self> {
        let sdp = description.sdp.clone();
        match description.sdp_type {
            RTCSdpType::Offer => Ok(SignalingMessage::Offer { sdp }),
            RTCSdpType::Answer => Ok(SignalingMessage::Answer { sdp }),
            sdp_type => Err(Error::ErrSignalingMessage(format!(
                "{sdp_type} has no signaling message"
            ))),
        }
    }
}

impl From<&RTCIceCandidateInit> for SignalingMessage {
    fn from(init: &RTCIceCandidateInit) -> Self {
        SignalingMessage::Candidate {
            label: init.sdp_mline_index.unwrap_or_default(),
            id: init.sdp_mid.clone().unwrap_or_default(),
            candidate: init.candidate.clone(),
        }
    }
}

impl From<&RTCIceCandidate> for SignalingMessage {
    fn from(candidate: &RTCIceCandidate) -> Self {
        SignalingMessage::from(&candidate.to_json())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const CANDIDATE: &str = "candidate:1 1 udp 2130706431 192.168.1.10 50000 typ host";

    #[test]
    fn test_signaling_message_json() -> Result<()> {
        let tests = vec![
            (
                r#"{"type":"offer","sdp":"v=0"}"#,
                SignalingMessage::Offer {
                    sdp: "v=0".to_owned(),
                },
            ),
            (
                r#"{"type":"answer","sdp":"v=0"}"#,
                SignalingMessage::Answer {
                    sdp: "v=0".to_owned(),
                },
            ),
            (
                r#"{"type":"candidate","label":1,"id":"video","candidate":"candidate:1"}"#,
                SignalingMessage::Candidate {
                    label: 1,
                    id: "video".to_owned(),
                    candidate: "candidate:1".to_owned(),
                },
            ),
            (r#"{"type":"bye"}"#, SignalingMessage::Bye),
        ];

        for (json, expected) in tests {
            assert_eq!(SignalingMessage::from_json(json)?, expected, "{json}");
            assert_eq!(expected.to_json()?, json);
        }
        Ok(())
    }

    #[test]
    fn test_signaling_message_invalid() {
        let tests = vec![
            r#"{"type":"hello"}"#,
            r#"{"sdp":"v=0"}"#,
            r#"{"type":"offer"}"#,
            r#"{"type":"candidate","label":"x","id":"0","candidate":""}"#,
            "not json",
        ];

        for json in tests {
            assert!(
                matches!(
                    SignalingMessage::from_json(json),
                    Err(Error::ErrSignalingMessage(_))
                ),
                "{json}"
            );
        }
    }

    #[test]
    fn test_signaling_message_candidate() -> Result<()> {
        let init = RTCIceCandidateInit {
            candidate: CANDIDATE.to_owned(),
            sdp_mid: Some("0".to_owned()),
            sdp_mline_index: Some(0),
            username_fragment: None,
        };

        let msg = SignalingMessage::from(&init);
        let parsed = SignalingMessage::from_json(&msg.to_json()?)?;
        assert_eq!(parsed.to_candidate()?, init);
        assert!(parsed.to_description().is_err());
        Ok(())
    }

    #[test]
    fn test_signaling_message_description() -> Result<()> {
        assert!(SignalingMessage::try_from(&RTCSessionDescription::rollback()).is_err());
        assert!(SignalingMessage::Bye.to_candidate().is_err());
        assert!(
            SignalingMessage::Offer {
                sdp: "m=broken".to_owned()
            }
            .to_description()
            .is_err()
        );
        Ok(())
    }
}
