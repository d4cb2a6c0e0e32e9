#![allow(dead_code)]

use std::io;
use std::net;
use std::num::ParseIntError;
use std::string::FromUtf8Error;
use substring::Substring;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("buffer: full")]
    ErrBufferFull,
    #[error("buffer: short")]
    ErrBufferShort,
    #[error("packet too big")]
    ErrPacketTooBig,
    #[error("unexpected end of buffer: (expected: {expected}, actual: {actual})")]
    UnexpectedEndOfBuffer { expected: usize, actual: usize },
    #[error("failed to parse ipaddr")]
    ErrFailedToParseIpaddr,
    #[error("address parse failed")]
    ErrAddressParseFailed,

    //STUN errors
    #[error("attribute not found")]
    ErrAttributeNotFound,
    #[error("transaction is stopped")]
    ErrTransactionStopped,
    #[error("transaction not exists")]
    ErrTransactionNotExists,
    #[error("transaction exists with same id")]
    ErrTransactionExists,
    #[error("agent is closed")]
    ErrAgentClosed,
    #[error("transaction is timed out")]
    ErrTransactionTimeOut,
    #[error("no default reason for ErrorCode")]
    ErrNoDefaultReason,
    #[error("unexpected EOF")]
    ErrUnexpectedEof,
    #[error("attribute size is invalid")]
    ErrAttributeSizeInvalid,
    #[error("attribute size overflow")]
    ErrAttributeSizeOverflow,
    #[error("attempt to decode to nil message")]
    ErrDecodeToNil,
    #[error("unexpected EOF: not enough bytes to read header")]
    ErrUnexpectedHeaderEof,
    #[error("integrity check failed")]
    ErrIntegrityMismatch,
    #[error("fingerprint check failed")]
    ErrFingerprintMismatch,
    #[error("FINGERPRINT before MESSAGE-INTEGRITY attribute")]
    ErrFingerprintBeforeIntegrity,
    #[error("bad UNKNOWN-ATTRIBUTES size")]
    ErrBadUnknownAttrsSize,
    #[error("invalid length of IP value")]
    ErrBadIpLength,
    #[error("no connection provided")]
    ErrNoConnection,
    #[error("client is closed")]
    ErrClientClosed,
    #[error("no agent is set")]
    ErrNoAgent,
    #[error("collector is closed")]
    ErrCollectorClosed,
    #[error("unsupported network")]
    ErrUnsupportedNetwork,
    #[error("invalid url")]
    ErrInvalidUrl,
    #[error("unknown scheme type")]
    ErrSchemeType,
    #[error("invalid hostname")]
    ErrHost,
    #[error("{0} is not a STUN message")]
    ErrNotStunMessage(String),
    #[error("unexpected STUN request message")]
    ErrUnexpectedStunRequestMessage,
    #[error("non-STUN message from STUN server")]
    ErrNonStunMessage,
    #[error("invalid magic cookie")]
    ErrInvalidMagicCookie,
    #[error("{0}")]
    ErrStunErrorResponse(String),

    //TURN errors
    #[error("relayed transport protocol is not supported")]
    ErrRelayTransportUnsupported,
    #[error("turn: TURN server address is not set")]
    ErrTurnServerAddressNotSet,
    #[error("turn: STUN server address is not set")]
    ErrStunServerAddressNotSet,
    #[error("turn: no permission for peer address")]
    ErrNoPermission,
    #[error("turn: relay allocation not found")]
    ErrRelayNotFound,
    #[error("turn: unexpected response type")]
    ErrUnexpectedResponse,
    #[error("turn: stale nonce, try again")]
    ErrTryAgain,
    #[error("turn: data is too large")]
    ErrDataTooLarge,

    //ICE errors
    /// Indicates an error with Unknown info.
    #[error("Unknown type")]
    ErrUnknownType,
    /// Indicates query arguments are provided in a STUN URL.
    #[error("queries not supported in stun address")]
    ErrStunQuery,
    /// Indicates an malformed query is provided.
    #[error("invalid query")]
    ErrInvalidQuery,
    /// Indicates malformed port is provided.
    #[error("invalid port number")]
    ErrPort,
    /// Indicates local username fragment insufficient bits are provided.
    /// Have to be at least 24 bits long.
    #[error("local username fragment is less than 24 bits long")]
    ErrLocalUfragInsufficientBits,
    /// Indicates local password insufficient bits are provided.
    /// Have to be at least 128 bits long.
    #[error("local password is less than 128 bits long")]
    ErrLocalPwdInsufficientBits,
    /// Indicates an unsupported transport type was provided.
    #[error("invalid transport protocol type")]
    ErrProtoType,
    /// Indicates agent does not have a valid candidate pair.
    #[error("no candidate pairs available")]
    ErrNoCandidatePairs,
    /// Indicates agent connection was canceled by the caller.
    #[error("connecting canceled by caller")]
    ErrCanceledByCaller,
    /// Indicates agent was started twice.
    #[error("attempted to start agent twice")]
    ErrMultipleStart,
    /// Indicates agent was started with an empty remote ufrag.
    #[error("remote ufrag is empty")]
    ErrRemoteUfragEmpty,
    /// Indicates agent was started with an empty remote pwd.
    #[error("remote pwd is empty")]
    ErrRemotePwdEmpty,
    /// Indicates agent was started without a remote description.
    #[error("remote credentials are not set")]
    ErrRemoteCredentialsNotSet,
    /// Indicates the agent is closed.
    #[error("the agent is closed")]
    ErrClosed,
    /// Indicates the agent was asked to do something in a state it cannot.
    #[error("operation is not allowed in the current ICE state")]
    ErrIceInvalidState,
    /// Indicates every candidate pair was exhausted without a success.
    #[error("ice connectivity failed: all candidate pairs exhausted")]
    ErrIceConnectivityFailed,
    #[error("attribute not long enough to be ICE candidate")]
    ErrAttributeTooShortIceCandidate,
    #[error("could not parse component")]
    ErrParseComponent,
    #[error("could not parse priority")]
    ErrParsePriority,
    #[error("could not parse port")]
    ErrParsePort,
    #[error("could not parse related addresses")]
    ErrParseRelatedAddr,
    #[error("could not parse type")]
    ErrParseType,
    #[error("unknown candidate type")]
    ErrUnknownCandidateType,
    #[error("failed to get XOR-MAPPED-ADDRESS response")]
    ErrGetXorMappedAddrResponse,
    #[error("connection with same remote address already exists")]
    ErrConnectionAddrAlreadyExist,
    #[error("ICE candidate type unknown")]
    ErrIceCandidateTypeUnknown,
    #[error("username mismatch")]
    ErrMismatchUsername,
    #[error("the ICE conn can't write STUN messages")]
    ErrIceWriteStunMessage,
    #[error("invalid url scheme for ice server")]
    ErrInvalidIceServerUrl,
    #[error("turn server credentials required")]
    ErrNoTurnCredentials,
    #[error("no candidate pair is selected")]
    ErrNoSelectedCandidatePair,
    #[error("unhandled STUN packet")]
    ErrUnhandledStunPacket,
    #[error("role conflict")]
    ErrRoleConflict,
    #[error("empty candidate attribute")]
    ErrEmptyCandidate,

    //SDP errors
    #[error("sdp: invalid syntax `{0}`")]
    SdpInvalidSyntax(String),
    #[error("sdp: invalid value `{0}`")]
    SdpInvalidValue(String),
    #[error("sdp: empty time_descriptions")]
    SdpEmptyTimeDescription,
    #[error("parse extmap: {0}")]
    ParseExtMap(String),
    #[error("{} --> {} <-- {}", .s.substring(0,*.p), .s.substring(*.p, *.p+1), .s.substring(*.p+1, .s.len()))]
    SyntaxError { s: String, p: usize },

    //association errors
    #[error("association closed")]
    ErrAssociationClosed,
    #[error("association is not established")]
    ErrAssociationNotEstablished,
    #[error("association init failed")]
    ErrAssociationInitFailed,
    #[error("stream not existed")]
    ErrStreamNotExisted,
    #[error("stream closed")]
    ErrStreamClosed,
    #[error("stream already exists")]
    ErrStreamAlreadyExist,
    #[error("outbound packet larger than maximum message size")]
    ErrOutboundPacketTooLarge,
    #[error("packet checksum mismatch")]
    ErrChecksumMismatch,
    #[error("chunk type is unknown: {0}")]
    ErrChunkTypeUnknown(u8),
    #[error("chunk too short")]
    ErrChunkTooShort,
    #[error("packet too short")]
    ErrPacketTooShort,
    #[error("association verification tag mismatch")]
    ErrVerificationTagMismatch,
    #[error("init chunk initiate tag must not be 0")]
    ErrInitTagZero,
    #[error("init chunk stream count must not be 0")]
    ErrInitStreamsZero,
    #[error("unknown reconfig parameter type {0}")]
    ErrReconfigParamUnknown(u16),
    #[error("association handshake timed out")]
    ErrHandshakeTimeout,
    #[error("association aborted: {0}")]
    ErrAssociationAborted(String),
    #[error("payload data is empty")]
    ErrPayloadDataEmpty,

    //data channel errors
    #[error("Unknown MessageType {0}")]
    InvalidMessageType(u8),
    #[error("Unknown ChannelType {0}")]
    InvalidChannelType(u8),
    #[error("Unknown PayloadProtocolIdentifier {0}")]
    InvalidPayloadProtocolIdentifier(u32),
    #[error("Data channel is closed")]
    ErrDataChannelClosed,
    #[error("Data channel is not open")]
    ErrDataChannelNotOpen,
    #[error("both MaxPacketLifeTime and MaxRetransmits was set")]
    ErrRetransmitsOrPacketLifeTime,
    #[error("protocol is larger then 65535 bytes")]
    ErrProtocolTooLarge,
    #[error("maximum number of datachannels reached")]
    ErrMaxDataChannelId,
    #[error("data channel id already in use")]
    ErrDataChannelIdInUse,
    #[error("data channel label is larger then 65535 bytes")]
    ErrStringSizeLimit,

    //RTP errors
    #[error("RTP header size insufficient")]
    ErrHeaderSizeInsufficient,
    #[error("RTP header size insufficient for extension")]
    ErrHeaderSizeInsufficientForExtension,
    #[error("buffer too small")]
    ErrBufferTooSmall,
    #[error("RTP version must be 2")]
    ErrRtpVersionMismatch,
    #[error("too many CSRCs")]
    ErrTooManyCsrcs,
    #[error("extension not enabled")]
    ErrHeaderExtensionsNotEnabled,
    #[error("extension not found")]
    ErrHeaderExtensionNotFound,
    #[error("header extension id must be between 1 and 14 for RFC 5285 one byte extensions")]
    ErrRfc8285oneByteHeaderIdRange,
    #[error("header extension payload must be 16bytes or less for RFC 5285 one byte extensions")]
    ErrRfc8285oneByteHeaderSize,
    #[error("header extension id must be between 1 and 255 for RFC 5285 two byte extensions")]
    ErrRfc8285twoByteHeaderIdRange,
    #[error("header extension payload must be 255bytes or less for RFC 5285 two byte extensions")]
    ErrRfc8285twoByteHeaderSize,
    #[error("header extension id must be 0 for non-RFC 5285 extensions")]
    ErrRfc3550headerIdRange,
    #[error("packet padding size is larger than payload")]
    ErrInvalidPadding,
    #[error("packet is not large enough")]
    ErrShortPacket,

    //peer connection errors
    /// Indicates the connection was closed and no further operation is accepted.
    #[error("connection closed")]
    ErrConnectionClosed,
    /// Indicates a negotiation step was requested while another one is pending.
    #[error("operation in progress")]
    ErrOperationInProgress,
    /// Indicates a session description could not be parsed.
    #[error("malformed session description: {0}")]
    ErrMalformedDescription(String),
    #[error("invalid state change op")]
    ErrPeerConnStateChangeInvalid,
    #[error("invalid SDP type supplied to SetLocalDescription()")]
    ErrPeerConnSdpTypeInvalidValueSetLocalDescription,
    #[error("invalid SDP type")]
    ErrPeerConnSdpTypeInvalidValue,
    #[error("remote description has a media section without a mid value")]
    ErrPeerConnRemoteDescriptionWithoutMidValue,
    #[error("cannot rollback from stable state")]
    ErrSignalingStateCannotRollback,
    #[error("invalid proposed signaling state transition: {0}")]
    ErrSignalingStateProposedTransitionInvalid(String),
    #[error("operation can not be run in current signaling state")]
    ErrIncorrectSignalingState,
    #[error("new sdp does not match previous offer")]
    ErrSdpDoesNotMatchOffer,
    #[error("new sdp does not match previous answer")]
    ErrSdpDoesNotMatchAnswer,
    #[error("remote description is not set")]
    ErrNoRemoteDescription,
    #[error("ICE restart limit reached")]
    ErrIceRestartLimit,
    #[error("track already exists")]
    ErrTrackAlreadyExists,
    #[error("track not found")]
    ErrTrackNotFound,
    #[error("track is disabled")]
    ErrTrackDisabled,
    #[error("unknown media kind: {0}")]
    ErrUnknownMediaKind(String),
    #[error("signaling message: {0}")]
    ErrSignalingMessage(String),
    #[error("the ICE agent does not exist")]
    ErrIceAgentNotExist,
    #[error("excessive retries in CreateOffer")]
    ErrExcessiveRetries,

    #[error("parse ip: {0}")]
    ParseIp(#[from] net::AddrParseError),
    #[error("parse int: {0}")]
    ParseInt(#[from] ParseIntError),
    #[error("{0}")]
    Io(#[source] IoError),
    #[error("utf8: {0}")]
    Utf8(#[from] FromUtf8Error),
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Reports whether this error is one of the signaling state graph violations.
    pub fn is_invalid_state_transition(&self) -> bool {
        matches!(
            self,
            Error::ErrSignalingStateCannotRollback
                | Error::ErrSignalingStateProposedTransitionInvalid(_)
                | Error::ErrIncorrectSignalingState
        )
    }

    /// Reports whether this error was raised because a channel or connection is closed.
    pub fn is_channel_closed(&self) -> bool {
        matches!(
            self,
            Error::ErrDataChannelClosed
                | Error::ErrConnectionClosed
                | Error::ErrStreamClosed
                | Error::ErrAssociationClosed
        )
    }
}

#[derive(Debug, Error)]
#[error("io error: {0}")]
pub struct IoError(#[from] pub io::Error);

// Workaround for wanting PartialEq for io::Error.
impl PartialEq for IoError {
    fn eq(&self, other: &Self) -> bool {
        self.0.kind() == other.0.kind()
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(IoError(e))
    }
}

impl From<url::ParseError> for Error {
    fn from(e: url::ParseError) -> Self {
        Error::Other(e.to_string())
    }
}

/// flatten_errs flattens multiple errors into one
pub fn flatten_errs(errs: Vec<impl Into<Error>>) -> Result<()> {
    if errs.is_empty() {
        Ok(())
    } else {
        let errs_strs: Vec<String> = errs.into_iter().map(|e| e.into().to_string()).collect();
        Err(Error::Other(errs_strs.join("\n")))
    }
}
