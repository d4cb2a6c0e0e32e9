use std::time::Duration;

use super::*;
use crate::url::*;

/// The interval at which the agent starts a new connectivity check.
pub(crate) const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_millis(50);

/// The number of connectivity checks allowed to be outstanding at once.
pub(crate) const DEFAULT_MAX_IN_FLIGHT_CHECKS: usize = 5;

/// The first retransmission timeout of a connectivity check.
pub(crate) const DEFAULT_INITIAL_RTO: Duration = Duration::from_millis(100);

/// The factor the retransmission timeout grows by on every retransmission.
pub(crate) const DEFAULT_BACKOFF_MULTIPLIER: f64 = 2.0;

/// Max binding request before considering a pair failed.
pub(crate) const DEFAULT_MAX_BINDING_REQUESTS: u16 = 7;

/// How long a strictly better pair may still replace the first selected one.
pub(crate) const DEFAULT_NOMINATION_WINDOW: Duration = Duration::from_millis(500);

/// The interval used to keep candidates alive.
pub(crate) const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(2);

/// The default time till an Agent transitions disconnected.
pub(crate) const DEFAULT_DISCONNECTED_TIMEOUT: Duration = Duration::from_secs(5);

/// The default time till an Agent transitions to failed.
pub(crate) const DEFAULT_FAILED_TIMEOUT: Duration = Duration::from_secs(25);

/// Remote candidates kept while the remote credentials are still unknown.
pub(crate) const MAX_PENDING_REMOTE_CANDIDATES: usize = 64;

/// Wait time before keepalive binding requests can be deleted.
pub(crate) const MAX_BINDING_REQUEST_TIMEOUT: Duration = Duration::from_millis(4000);

pub(crate) fn default_candidate_types() -> Vec<CandidateType> {
    vec![
        CandidateType::Host,
        CandidateType::ServerReflexive,
        CandidateType::Relay,
    ]
}

/// Collects the arguments to `ice::Agent` construction into a single structure, for
/// future-proofness of the interface.
#[derive(Default, Debug, Clone)]
pub struct AgentConfig {
    pub urls: Vec<Url>,

    /// It is used to perform connectivity checks. The values MUST be unguessable, with at least
    /// 128 bits of random number generator output used to generate the password, and at least 24
    /// bits of output to generate the username fragment.
    pub local_ufrag: String,
    /// It is used to perform connectivity checks. The values MUST be unguessable, with at least
    /// 128 bits of random number generator output used to generate the password, and at least 24
    /// bits of output to generate the username fragment.
    pub local_pwd: String,

    /// An optional configuration for disabling or enabling support for specific candidate types.
    pub candidate_types: Vec<CandidateType>,

    pub is_controlling: bool,

    /// Pacing between two new connectivity checks. Defaults to 50 ms.
    pub check_interval: Option<Duration>,

    /// Upper bound of connectivity checks waiting for a response. Defaults to 5.
    pub max_in_flight_checks: Option<usize>,

    /// Retransmission timeout of the first transmission of a check. Defaults to 100 ms.
    pub initial_rto: Option<Duration>,

    /// Growth factor of the retransmission timeout, at least 1.0. Defaults to 2.0.
    pub backoff_multiplier: Option<f64>,

    /// The max amount of binding requests the agent will send over a candidate pair for validation
    /// or nomination, if after max_binding_requests the candidate is yet to answer a binding
    /// request or a nomination we set the pair as failed.
    pub max_binding_requests: Option<u16>,

    /// Once a pair is selected, a strictly higher priority pair succeeding within this window
    /// replaces it. Defaults to 500 ms.
    pub nomination_window: Option<Duration>,

    /// Determines how often should we send ICE keepalives (should be less than connection timeout
    /// above) when this is nil, it defaults to 2 seconds.
    /// A keepalive interval of 0 means we never send keepalive packets
    pub keepalive_interval: Option<Duration>,

    /// Defaults to 5 seconds when this property is nil.
    /// If the duration is 0, the ICE Agent will never go to disconnected.
    pub disconnected_timeout: Option<Duration>,

    /// Defaults to 25 seconds when this property is nil.
    /// If the duration is 0, we will never go to failed.
    pub failed_timeout: Option<Duration>,
}
