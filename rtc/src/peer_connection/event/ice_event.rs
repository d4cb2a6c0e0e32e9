use crate::peer_connection::transport::ice::candidate::RTCIceCandidate;

/// A gathered local candidate to trickle to the remote peer. `candidate` is
/// `None` once gathering completed.
#[derive(Default, Clone, Debug, PartialEq, Eq)]
pub struct RTCPeerConnectionIceEvent {
    pub candidate: Option<RTCIceCandidate>,
    /// The STUN or TURN server the candidate was gathered from.
    pub url: String,
}
