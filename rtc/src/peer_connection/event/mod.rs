use crate::peer_connection::event::data_channel_event::RTCDataChannelEvent;
use crate::peer_connection::event::ice_event::RTCPeerConnectionIceEvent;
use crate::peer_connection::event::track_event::RTCTrackEvent;
use crate::peer_connection::state::ice_connection_state::RTCIceConnectionState;
use crate::peer_connection::state::ice_gathering_state::RTCIceGatheringState;
use crate::peer_connection::state::peer_connection_state::RTCPeerConnectionState;
use crate::peer_connection::state::signaling_state::RTCSignalingState;
use ice::candidate::Candidate;

pub mod data_channel_event;
pub mod ice_event;
pub mod track_event;

/// Notifications polled with `poll_event`.
#[allow(clippy::enum_variant_names)]
#[derive(Default, Debug, Clone, PartialEq)]
pub enum RTCPeerConnectionEvent {
    #[default]
    OnNegotiationNeededEvent,
    OnIceCandidateEvent(RTCPeerConnectionIceEvent),
    OnSignalingStateChangeEvent(RTCSignalingState),
    OnIceConnectionStateChangeEvent(RTCIceConnectionState),
    OnIceGatheringStateChangeEvent(RTCIceGatheringState),
    OnConnectionStateChangeEvent(RTCPeerConnectionState),

    // The Peer-to-peer data API extends the RTCPeerConnection interface as described below.
    OnDataChannel(RTCDataChannelEvent),

    // The RTP media API extends the RTCPeerConnection interface as described below.
    OnTrack(RTCTrackEvent),
}

/// Events exchanged between pipeline handlers.
#[derive(Debug, Clone)]
pub(crate) enum RTCEventInternal {
    ICELocalCandidate(Option<Candidate>),
    ICEConnectionStateChange(RTCIceConnectionState),
    ICEGatheringStateChange(RTCIceGatheringState),
    ICESelectedCandidatePairChange(Box<Candidate>, Box<Candidate>),
    ICERestartNeeded,
    /// The association is up, carries whether this side initiated it.
    SCTPConnected(bool),
    SCTPBufferedAmount(u16, usize),
    SCTPStreamClosing(u16),
    SCTPStreamClosed(u16),
    SCTPClosed,
    RTCPeerConnectionEvent(RTCPeerConnectionEvent),
}
