use serde::{Deserialize, Serialize};
use std::fmt;

use ice::candidate::{Candidate, CandidateType, unmarshal_candidate};
use ice::tcp_type::TcpType;
use shared::error::Result;

/// ICECandidate represents a ice candidate
///
/// ## Specifications
///
/// * [MDN]
/// * [W3C]
///
/// [MDN]: https://developer.mozilla.org/en-US/docs/Web/API/RTCIceCandidate
/// [W3C]: https://w3c.github.io/webrtc-pc/#rtcicecandidate-interface
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceCandidate {
    pub stats_id: String,
    pub foundation: String,
    pub priority: u32,
    pub address: String,
    /// `udp` or `tcp`
    pub protocol: String,
    pub port: u16,
    #[serde(rename = "type")]
    pub typ: CandidateType,
    pub component: u16,
    pub related_address: String,
    pub related_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tcp_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// The media section the candidate is signaled with. All sections share
    /// one transport, so this is the first bundled mid.
    pub sdp_mid: String,
    pub sdp_mline_index: u16,

    /// SDP attribute form, `candidate:...`
    #[serde(skip)]
    pub(crate) attribute: String,
}

impl From<&Candidate> for RTCIceCandidate {
    fn from(c: &Candidate) -> Self {
        let (related_address, related_port) = if let Some(ra) = c.related_address() {
            (ra.address, ra.port)
        } else {
            (String::new(), 0)
        };
        let tcp_type = match c.tcp_type() {
            TcpType::Unspecified => None,
            t => Some(t.to_string()),
        };

        RTCIceCandidate {
            stats_id: c.id().to_owned(),
            foundation: c.foundation(),
            priority: c.priority(),
            address: c.address().to_owned(),
            protocol: c.network_type().transport_protocol().to_string(),
            port: c.port(),
            typ: c.candidate_type(),
            component: c.component(),
            related_address,
            related_port,
            tcp_type,
            url: c.url().map(|u| u.to_owned()),
            sdp_mid: String::new(),
            sdp_mline_index: 0,
            attribute: c.to_sdp_attribute(),
        }
    }
}

impl RTCIceCandidate {
    /// to_json returns an ICECandidateInit
    /// as indicated by the spec <https://w3c.github.io/webrtc-pc/#dom-rtcicecandidate-tojson>
    pub fn to_json(&self) -> RTCIceCandidateInit {
        RTCIceCandidateInit {
            candidate: self.attribute.clone(),
            sdp_mid: Some(self.sdp_mid.clone()),
            sdp_mline_index: Some(self.sdp_mline_index),
            username_fragment: None,
        }
    }
}

impl fmt::Display for RTCIceCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}:{}",
            self.protocol, self.typ, self.address, self.port
        )?;
        if !self.related_address.is_empty() {
            write!(f, " related {}:{}", self.related_address, self.related_port)?;
        }
        Ok(())
    }
}

/// ICECandidateInit is used to serialize ice candidates
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceCandidateInit {
    /// The candidate attribute, an empty string marks the end of candidates.
    pub candidate: String,
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    pub username_fragment: Option<String>,
}

impl RTCIceCandidateInit {
    /// Parses the candidate attribute. `Ok(None)` is the end-of-candidates marker.
    pub(crate) fn to_ice(&self) -> Result<Option<Candidate>> {
        if self.candidate.trim().is_empty() {
            return Ok(None);
        }
        unmarshal_candidate(&self.candidate).map(Some)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_ice_candidate_serialization() {
        let tests = vec![
            (
                RTCIceCandidateInit {
                    candidate: "candidate:abc123".to_string(),
                    sdp_mid: Some("0".to_string()),
                    sdp_mline_index: Some(0),
                    username_fragment: Some("def".to_string()),
                },
                r#"{"candidate":"candidate:abc123","sdpMid":"0","sdpMLineIndex":0,"usernameFragment":"def"}"#,
            ),
            (
                RTCIceCandidateInit {
                    candidate: "candidate:abc123".to_string(),
                    sdp_mid: None,
                    sdp_mline_index: None,
                    username_fragment: None,
                },
                r#"{"candidate":"candidate:abc123","sdpMid":null,"sdpMLineIndex":null,"usernameFragment":null}"#,
            ),
        ];

        for (candidate_init, expected_string) in tests {
            let result = serde_json::to_string(&candidate_init);
            assert!(result.is_ok(), "testCase: marshal err: {result:?}");
            let candidate_data = result.unwrap();
            assert_eq!(candidate_data, expected_string, "string is not expected");

            let result = serde_json::from_str::<RTCIceCandidateInit>(&candidate_data);
            assert!(result.is_ok(), "testCase: unmarshal err: {result:?}");
            if let Ok(actual_candidate_init) = result {
                assert_eq!(actual_candidate_init, candidate_init);
            }
        }
    }

    #[test]
    fn test_ice_candidate_from_ice() -> Result<()> {
        let raw = "candidate:4207374051 1 udp 2130706431 192.168.1.2 50000 typ host";
        let c = unmarshal_candidate(raw)?;
        let mut rtc_candidate = RTCIceCandidate::from(&c);
        rtc_candidate.sdp_mid = "0".to_owned();

        assert_eq!(rtc_candidate.typ, CandidateType::Host);
        assert_eq!(rtc_candidate.protocol, "udp");
        assert_eq!(rtc_candidate.address, "192.168.1.2");
        assert_eq!(rtc_candidate.port, 50000);
        assert_eq!(rtc_candidate.priority, 2130706431);

        let init = rtc_candidate.to_json();
        assert_eq!(init.candidate, raw);
        assert_eq!(init.sdp_mid.as_deref(), Some("0"));

        let parsed = init.to_ice()?;
        assert!(parsed.is_some_and(|p| p.equal(&c)));
        Ok(())
    }

    #[test]
    fn test_ice_candidate_init_end_of_candidates() -> Result<()> {
        let init = RTCIceCandidateInit::default();
        assert!(init.to_ice()?.is_none());
        Ok(())
    }
}
