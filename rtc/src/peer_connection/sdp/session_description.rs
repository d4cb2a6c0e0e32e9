use std::fmt::Display;
use std::io::Cursor;

use sdp::description::session::SessionDescription;
use serde::{Deserialize, Serialize};

use super::sdp_type::RTCSdpType;
use shared::error::{Error, Result};

/// A session description of the offer/answer model: its type and the SDP text.
///
/// Descriptions built with [`offer`](Self::offer), [`answer`](Self::answer)
/// or [`pranswer`](Self::pranswer) are parsed up front, so malformed SDP is
/// rejected before it reaches a peer connection. Descriptions deserialized
/// from JSON are parsed when applied. Equality compares type and text.
///
/// ```
/// use rtc::peer_connection::sdp::{RTCSdpType, RTCSessionDescription};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let desc: RTCSessionDescription =
///     serde_json::from_str(r#"{"type":"offer","sdp":"v=0\r\n"}"#)?;
/// assert_eq!(desc.sdp_type, RTCSdpType::Offer);
/// # Ok(())
/// # }
/// ```
///
/// ## Specifications
///
/// * [W3C](https://w3c.github.io/webrtc-pc/#rtcsessiondescription-class)
#[derive(Default, Debug, Clone, Serialize, Deserialize)]
pub struct RTCSessionDescription {
    #[serde(rename = "type")]
    pub sdp_type: RTCSdpType,

    pub sdp: String,

    /// This will never be initialized by callers, internal use only
    #[serde(skip)]
    pub(crate) parsed: Option<SessionDescription>,
}

impl PartialEq for RTCSessionDescription {
    fn eq(&self, other: &Self) -> bool {
        self.sdp_type == other.sdp_type && self.sdp == other.sdp
    }
}

impl Eq for RTCSessionDescription {}

impl Display for RTCSessionDescription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "type: {}, sdp:\n{}", self.sdp_type, self.sdp)
    }
}

impl RTCSessionDescription {
    /// Given SDP representing an answer, wrap it in an RTCSessionDescription
    /// that can be given to a peer connection.
    pub fn answer(sdp: String) -> Result<RTCSessionDescription> {
        Self::new(RTCSdpType::Answer, sdp)
    }

    /// Given SDP representing an offer, wrap it in an RTCSessionDescription
    /// that can be given to a peer connection.
    pub fn offer(sdp: String) -> Result<RTCSessionDescription> {
        Self::new(RTCSdpType::Offer, sdp)
    }

    /// Given SDP representing a provisional answer, wrap it in an
    /// RTCSessionDescription that can be given to a peer connection.
    pub fn pranswer(sdp: String) -> Result<RTCSessionDescription> {
        Self::new(RTCSdpType::Pranswer, sdp)
    }

    /// A rollback carries no SDP.
    pub fn rollback() -> RTCSessionDescription {
        RTCSessionDescription {
            sdp_type: RTCSdpType::Rollback,
            sdp: String::new(),
            parsed: None,
        }
    }

    fn new(sdp_type: RTCSdpType, sdp: String) -> Result<RTCSessionDescription> {
        let mut desc = RTCSessionDescription {
            sdp_type,
            sdp,
            parsed: None,
        };
        desc.parsed = Some(desc.unmarshal()?);
        Ok(desc)
    }

    pub(crate) fn from_parsed(
        sdp_type: RTCSdpType,
        parsed: SessionDescription,
    ) -> RTCSessionDescription {
        RTCSessionDescription {
            sdp_type,
            sdp: parsed.marshal(),
            parsed: Some(parsed),
        }
    }

    /// Parses the SDP text. Failures are reported as `ErrMalformedDescription`.
    pub fn unmarshal(&self) -> Result<SessionDescription> {
        let mut reader = Cursor::new(self.sdp.as_bytes());
        SessionDescription::unmarshal(&mut reader)
            .map_err(|err| Error::ErrMalformedDescription(err.to_string()))
    }

    /// Returns the parsed form, parsing the text when this description was
    /// deserialized.
    pub(crate) fn parsed(&mut self) -> Result<&SessionDescription> {
        if self.parsed.is_none() {
            self.parsed = Some(self.unmarshal()?);
        }
        self.parsed
            .as_ref()
            .ok_or_else(|| Error::ErrMalformedDescription("empty description".to_owned()))
    }
}
