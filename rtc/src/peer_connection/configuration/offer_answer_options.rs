/// Options for creating SDP answers.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone)]
pub struct RTCAnswerOptions {
    /// Enable voice activity detection for audio tracks. Carried for API
    /// parity; no codec is involved in this stack.
    pub voice_activity_detection: bool,
}

/// Options for creating SDP offers.
///
/// ```
/// use rtc::peer_connection::configuration::RTCOfferOptions;
///
/// let options = RTCOfferOptions {
///     ice_restart: true,
///     ..Default::default()
/// };
/// ```
///
/// ## Specifications
///
/// * [W3C RTCOfferOptions](https://w3c.github.io/webrtc-pc/#dictionary-rtcofferoptions-members)
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone)]
pub struct RTCOfferOptions {
    /// Generate new ICE credentials and gather again.
    pub ice_restart: bool,

    /// Add a recv-only audio section when no local audio track exists.
    pub offer_to_receive_audio: bool,

    /// Add a recv-only video section when no local video track exists.
    pub offer_to_receive_video: bool,
}
