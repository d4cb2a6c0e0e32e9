#[cfg(test)]
mod agent_test;

pub mod agent_config;
pub mod agent_gather;
pub mod agent_proto;
pub mod agent_selector;
pub mod agent_stats;
pub mod agent_transport;

use agent_config::*;
use agent_gather::Gatherer;
use agent_transport::CandidateTransport;
use bytes::BytesMut;
use log::{debug, info, warn};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};
use stun::attributes::*;
use stun::integrity::*;
use stun::message::*;
use stun::textattrs::*;

use crate::candidate::{candidate_pair::*, *};
use crate::rand::*;
use crate::state::*;
use crate::url::*;
use shared::error::*;
use shared::tcp_framing::TcpFrameDecoder;
use shared::{FourTuple, TaggedBytesMut, TransportProtocol};

/// Events reported by the agent through `poll_event`.
#[derive(Debug, Clone)]
pub enum Event {
    /// A new local candidate, `None` marks the end of candidates.
    LocalCandidate(Option<Candidate>),
    GatheringStateChange(GatheringState),
    ConnectionStateChange(ConnectionState),
    /// The (local, remote) candidates of the newly selected pair.
    SelectedCandidatePairChange(Box<Candidate>, Box<Candidate>),
    /// The selected pair stopped receiving traffic, a restart is advised.
    RestartNeeded,
}

#[derive(Debug, Clone)]
pub(crate) struct BindingRequest {
    pub(crate) timestamp: Instant,
    pub(crate) transaction_id: TransactionId,
    pub(crate) destination: SocketAddr,
    pub(crate) pair_index: usize,
    pub(crate) is_controlling: bool,
    pub(crate) is_use_candidate: bool,
    pub(crate) is_keepalive: bool,
    pub(crate) raw: Vec<u8>,
    pub(crate) transmissions: u16,
    pub(crate) rto: Duration,
    pub(crate) next_retransmit: Instant,
}

#[derive(Default)]
pub(crate) struct UfragPwd {
    pub(crate) local_ufrag: String,
    pub(crate) local_pwd: String,
    pub(crate) remote_ufrag: String,
    pub(crate) remote_pwd: String,
}

impl UfragPwd {
    pub(crate) fn has_remote_credentials(&self) -> bool {
        !self.remote_ufrag.is_empty() && !self.remote_pwd.is_empty()
    }
}

fn assert_inbound_username(m: &Message, expected_username: &str) -> Result<()> {
    let mut username = Username::new(ATTR_USERNAME, String::new());
    username.get_from(m)?;

    if username.to_string() != expected_username {
        return Err(Error::Other(format!(
            "{:?} expected({}) actual({})",
            Error::ErrMismatchUsername,
            expected_username,
            username,
        )));
    }

    Ok(())
}

fn assert_inbound_message_integrity(m: &mut Message, key: &[u8]) -> Result<()> {
    let message_integrity_attr = MessageIntegrity(key.to_vec());
    message_integrity_attr.check(m)
}

/// Represents the ICE agent.
///
/// The agent never touches a socket: the owner registers the addresses it listens on
/// with [`Agent::add_local_address`], feeds received datagrams through
/// `handle_read`, sends what `poll_write` returns and drives time with
/// `handle_timeout`/`poll_timeout`.
pub struct Agent {
    pub(crate) now: Instant,
    pub(crate) tie_breaker: u64,
    pub(crate) is_controlling: bool,
    pub(crate) closed: bool,

    pub(crate) connection_state: ConnectionState,
    pub(crate) gathering_state: GatheringState,

    pub(crate) ufrag_pwd: UfragPwd,

    pub(crate) local_addresses: Vec<(SocketAddr, TransportProtocol)>,
    pub(crate) local_candidates: Vec<Candidate>,
    pub(crate) local_transports: Vec<CandidateTransport>,
    pub(crate) remote_candidates: Vec<Candidate>,
    pub(crate) pending_remote_candidates: Vec<Candidate>,
    pub(crate) candidate_pairs: Vec<CandidatePair>,
    pub(crate) selected_pair: Option<usize>,

    pub(crate) pending_binding_requests: Vec<BindingRequest>,

    pub(crate) checks_started: bool,
    pub(crate) checking_since: Option<Instant>,
    pub(crate) last_check: Option<Instant>,
    pub(crate) last_keepalive: Option<Instant>,
    pub(crate) nomination_deadline: Option<Instant>,
    pub(crate) restart_requested: bool,

    pub(crate) gatherers: Vec<Gatherer>,
    pub(crate) has_gathered: bool,
    pub(crate) tcp_decoders: HashMap<FourTuple, TcpFrameDecoder>,

    // the following variables won't be changed after new()
    pub(crate) check_interval: Duration,
    pub(crate) max_in_flight_checks: usize,
    pub(crate) initial_rto: Duration,
    pub(crate) backoff_multiplier: f64,
    pub(crate) max_binding_requests: u16,
    pub(crate) nomination_window: Duration,
    pub(crate) keepalive_interval: Duration,
    pub(crate) disconnected_timeout: Duration,
    pub(crate) failed_timeout: Duration,

    pub(crate) candidate_types: Vec<CandidateType>,
    pub(crate) urls: Vec<Url>,

    pub(crate) transmits: VecDeque<TaggedBytesMut>,
    pub(crate) reads: VecDeque<TaggedBytesMut>,
    pub(crate) events: VecDeque<Event>,
}

impl Agent {
    /// Creates a new Agent.
    pub fn new(config: AgentConfig, now: Instant) -> Result<Self> {
        let candidate_types = if config.candidate_types.is_empty() {
            default_candidate_types()
        } else {
            config.candidate_types.clone()
        };

        let mut agent = Self {
            now,
            tie_breaker: generate_tie_breaker(),
            is_controlling: config.is_controlling,
            closed: false,

            connection_state: ConnectionState::New,
            gathering_state: GatheringState::New,

            ufrag_pwd: UfragPwd::default(),

            local_addresses: vec![],
            local_candidates: vec![],
            local_transports: vec![],
            remote_candidates: vec![],
            pending_remote_candidates: vec![],
            candidate_pairs: vec![],
            selected_pair: None,

            pending_binding_requests: vec![],

            checks_started: false,
            checking_since: None,
            last_check: None,
            last_keepalive: None,
            nomination_deadline: None,
            restart_requested: false,

            gatherers: vec![],
            has_gathered: false,
            tcp_decoders: HashMap::new(),

            check_interval: config
                .check_interval
                .filter(|d| *d != Duration::ZERO)
                .unwrap_or(DEFAULT_CHECK_INTERVAL),
            max_in_flight_checks: config
                .max_in_flight_checks
                .filter(|n| *n != 0)
                .unwrap_or(DEFAULT_MAX_IN_FLIGHT_CHECKS),
            initial_rto: config
                .initial_rto
                .filter(|d| *d != Duration::ZERO)
                .unwrap_or(DEFAULT_INITIAL_RTO),
            backoff_multiplier: config
                .backoff_multiplier
                .unwrap_or(DEFAULT_BACKOFF_MULTIPLIER)
                .max(1.0),
            max_binding_requests: config
                .max_binding_requests
                .filter(|n| *n != 0)
                .unwrap_or(DEFAULT_MAX_BINDING_REQUESTS),
            nomination_window: config
                .nomination_window
                .unwrap_or(DEFAULT_NOMINATION_WINDOW),
            keepalive_interval: config
                .keepalive_interval
                .unwrap_or(DEFAULT_KEEPALIVE_INTERVAL),
            disconnected_timeout: config
                .disconnected_timeout
                .unwrap_or(DEFAULT_DISCONNECTED_TIMEOUT),
            failed_timeout: config.failed_timeout.unwrap_or(DEFAULT_FAILED_TIMEOUT),

            candidate_types,
            urls: config.urls.clone(),

            transmits: VecDeque::new(),
            reads: VecDeque::new(),
            events: VecDeque::new(),
        };

        agent.set_local_credentials(config.local_ufrag, config.local_pwd)?;

        Ok(agent)
    }

    fn set_local_credentials(&mut self, mut ufrag: String, mut pwd: String) -> Result<()> {
        if ufrag.is_empty() {
            ufrag = generate_ufrag();
        }
        if pwd.is_empty() {
            pwd = generate_pwd();
        }

        if ufrag.len() * 8 < 24 {
            return Err(Error::ErrLocalUfragInsufficientBits);
        }
        if pwd.len() * 8 < 128 {
            return Err(Error::ErrLocalPwdInsufficientBits);
        }

        self.ufrag_pwd.local_ufrag = ufrag;
        self.ufrag_pwd.local_pwd = pwd;
        Ok(())
    }

    /// Registers a transport address the owner receives on. A host candidate is
    /// derived from it when gathering.
    pub fn add_local_address(
        &mut self,
        addr: SocketAddr,
        transport_protocol: TransportProtocol,
    ) -> Result<()> {
        if self.closed {
            return Err(Error::ErrClosed);
        }
        if self.local_addresses.contains(&(addr, transport_protocol)) {
            return Ok(());
        }
        self.local_addresses.push((addr, transport_protocol));

        if self.gathering_state == GatheringState::Gathering {
            self.gather_from_address(addr, transport_protocol);
        }
        Ok(())
    }

    /// Adds a new remote candidate. Candidates arriving before the remote credentials
    /// are queued and applied once the credentials are set.
    pub fn add_remote_candidate(&mut self, c: Candidate) -> Result<()> {
        if self.closed {
            return Err(Error::ErrClosed);
        }

        if c.candidate_type() == CandidateType::Host && c.address().ends_with(".local") {
            warn!(
                "[{}]: remote mDNS candidate ignored, mDNS is not supported: ({})",
                self.get_name(),
                c.address()
            );
            return Ok(());
        }

        if c.component() != COMPONENT_RTP {
            debug!(
                "[{}]: ignore remote candidate for component {}",
                self.get_name(),
                c.component()
            );
            return Ok(());
        }

        if !self.ufrag_pwd.has_remote_credentials() {
            if self.pending_remote_candidates.iter().any(|p| p.equal(&c)) {
                return Ok(());
            }
            if self.pending_remote_candidates.len() >= MAX_PENDING_REMOTE_CANDIDATES {
                warn!(
                    "[{}]: dropping remote candidate {}, {} already wait for credentials",
                    self.get_name(),
                    c,
                    MAX_PENDING_REMOTE_CANDIDATES
                );
                return Ok(());
            }
            self.pending_remote_candidates.push(c);
            return Ok(());
        }

        self.add_remote_candidate_internal(c);
        Ok(())
    }

    pub(crate) fn add_remote_candidate_internal(&mut self, c: Candidate) -> usize {
        if let Some(index) = self.remote_candidates.iter().position(|r| r.equal(&c)) {
            return index;
        }

        debug!("[{}]: add remote candidate {}", self.get_name(), c);
        self.remote_candidates.push(c);
        let remote_index = self.remote_candidates.len() - 1;

        for local_index in 0..self.local_candidates.len() {
            self.add_pair(local_index, remote_index);
        }

        remote_index
    }

    /// Returns the local user credentials.
    pub fn get_local_user_credentials(&self) -> (&str, &str) {
        (&self.ufrag_pwd.local_ufrag, &self.ufrag_pwd.local_pwd)
    }

    /// Returns the remote user credentials.
    pub fn get_remote_user_credentials(&self) -> (&str, &str) {
        (&self.ufrag_pwd.remote_ufrag, &self.ufrag_pwd.remote_pwd)
    }

    /// Sets the credentials of the remote agent and applies queued remote candidates.
    pub fn set_remote_credentials(
        &mut self,
        remote_ufrag: String,
        remote_pwd: String,
    ) -> Result<()> {
        if self.closed {
            return Err(Error::ErrClosed);
        }
        if remote_ufrag.is_empty() {
            return Err(Error::ErrRemoteUfragEmpty);
        } else if remote_pwd.is_empty() {
            return Err(Error::ErrRemotePwdEmpty);
        }

        self.ufrag_pwd.remote_ufrag = remote_ufrag;
        self.ufrag_pwd.remote_pwd = remote_pwd;

        for c in std::mem::take(&mut self.pending_remote_candidates) {
            self.add_remote_candidate_internal(c);
        }
        Ok(())
    }

    /// Starts probing the checklist with the given role and remote credentials.
    pub fn start_connectivity_checks(
        &mut self,
        is_controlling: bool,
        remote_ufrag: String,
        remote_pwd: String,
    ) -> Result<()> {
        if self.closed {
            return Err(Error::ErrClosed);
        }

        debug!(
            "[{}]: start connectivity checks: isControlling? {}, remoteUfrag: {}",
            self.get_name(),
            is_controlling,
            remote_ufrag,
        );
        self.set_remote_credentials(remote_ufrag, remote_pwd)?;
        self.set_role(is_controlling);

        for p in &mut self.candidate_pairs {
            if p.state == CandidatePairState::Frozen {
                p.state = CandidatePairState::Waiting;
            }
        }
        self.checks_started = true;
        self.checking_since = Some(self.now);
        self.last_check = None;

        if self.selected_pair.is_none() {
            self.update_connection_state(ConnectionState::Checking);
        }

        Ok(())
    }

    /// Restarts the ICE Agent with the provided ufrag/pwd
    /// If no ufrag/pwd is provided the Agent will generate one itself.
    /// Remote candidates, pairs and their counters are discarded; local candidates are
    /// gathered again unless `keep_local_candidates` is set.
    pub fn restart(
        &mut self,
        ufrag: String,
        pwd: String,
        keep_local_candidates: bool,
    ) -> Result<()> {
        if self.closed {
            return Err(Error::ErrClosed);
        }

        self.set_local_credentials(ufrag, pwd)?;
        info!("[{}]: restarting ICE", self.get_name());

        // Clear all agent needed to take back to fresh state
        self.ufrag_pwd.remote_ufrag = String::new();
        self.ufrag_pwd.remote_pwd = String::new();
        self.remote_candidates.clear();
        self.pending_remote_candidates.clear();
        self.candidate_pairs.clear();
        self.pending_binding_requests.clear();
        self.tcp_decoders.clear();
        self.selected_pair = None;
        self.nomination_deadline = None;
        self.restart_requested = false;
        self.last_keepalive = None;
        self.checks_started = false;

        if !keep_local_candidates {
            self.close_gatherers();
            self.local_candidates.clear();
            self.local_transports.clear();
            self.update_gathering_state(GatheringState::New);
            if self.has_gathered {
                self.gather_candidates()?;
            }
        }

        if self.connection_state != ConnectionState::New {
            self.checking_since = Some(self.now);
            self.update_connection_state(ConnectionState::Checking);
        }

        Ok(())
    }

    /// Returns the local candidates gathered so far.
    pub fn get_local_candidates(&self) -> &[Candidate] {
        &self.local_candidates
    }

    /// Returns the remote candidates in use.
    pub fn get_remote_candidates(&self) -> &[Candidate] {
        &self.remote_candidates
    }

    /// Returns the candidate pairs formed so far.
    pub fn get_candidate_pairs(&self) -> &[CandidatePair] {
        &self.candidate_pairs
    }

    /// Returns the (local, remote) candidates of the selected pair.
    pub fn get_selected_candidate_pair(&self) -> Option<(&Candidate, &Candidate)> {
        self.selected_pair.map(|index| {
            let p = &self.candidate_pairs[index];
            (
                &self.local_candidates[p.local_index],
                &self.remote_candidates[p.remote_index],
            )
        })
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection_state
    }

    pub fn gathering_state(&self) -> GatheringState {
        self.gathering_state
    }

    pub fn is_controlling(&self) -> bool {
        self.is_controlling
    }

    pub(crate) fn set_role(&mut self, is_controlling: bool) {
        if self.is_controlling != is_controlling {
            info!(
                "[{}]: switching role to {}",
                self.get_name(),
                if is_controlling {
                    "controlling"
                } else {
                    "controlled"
                }
            );
        }
        self.is_controlling = is_controlling;
        for p in &mut self.candidate_pairs {
            p.ice_role_controlling = is_controlling;
        }
    }

    pub(crate) fn update_connection_state(&mut self, new_state: ConnectionState) {
        if self.connection_state != new_state {
            info!(
                "[{}]: Setting new connection state: {}",
                self.get_name(),
                new_state
            );
            self.connection_state = new_state;
            self.events
                .push_back(Event::ConnectionStateChange(new_state));
        }
    }

    pub(crate) fn update_gathering_state(&mut self, new_state: GatheringState) {
        if self.gathering_state != new_state {
            debug!(
                "[{}]: Setting new gathering state: {}",
                self.get_name(),
                new_state
            );
            self.gathering_state = new_state;
            self.events.push_back(Event::GatheringStateChange(new_state));
        }
    }

    pub(crate) fn set_selected_pair(&mut self, pair_index: usize) {
        let (local_index, remote_index) = {
            let p = &mut self.candidate_pairs[pair_index];
            p.nominated = true;
            (p.local_index, p.remote_index)
        };
        info!(
            "[{}]: Set selected candidate pair: {} <-> {}",
            self.get_name(),
            self.local_candidates[local_index],
            self.remote_candidates[remote_index],
        );

        self.selected_pair = Some(pair_index);
        self.restart_requested = false;
        self.events.push_back(Event::SelectedCandidatePairChange(
            Box::new(self.local_candidates[local_index].clone()),
            Box::new(self.remote_candidates[remote_index].clone()),
        ));
        self.update_connection_state(ConnectionState::Connected);
    }

    /// Local candidates that take part in pairing: relayed ones, and host ones unless
    /// the host type is disabled. Reflexive candidates share the base of a host.
    pub(crate) fn is_pairable_local(&self, local_index: usize) -> bool {
        match self.local_candidates[local_index].candidate_type() {
            CandidateType::Host => {
                contains_candidate_type(CandidateType::Host, &self.candidate_types)
            }
            CandidateType::Relay => true,
            _ => false,
        }
    }

    pub(crate) fn add_pair(&mut self, local_index: usize, remote_index: usize) -> Option<usize> {
        if let Some(index) = self.find_pair(local_index, remote_index) {
            return Some(index);
        }

        let (local, remote) = (
            &self.local_candidates[local_index],
            &self.remote_candidates[remote_index],
        );
        if !self.is_pairable_local(local_index)
            || local.network_type() != remote.network_type()
            || local.component() != remote.component()
        {
            return None;
        }
        // RFC 6544: an active end has to meet a passive one
        if local.network_type().is_tcp() && local.tcp_type() == remote.tcp_type() {
            return None;
        }

        let mut p = CandidatePair::new(
            local_index,
            remote_index,
            local.priority(),
            remote.priority(),
            self.is_controlling,
        );
        if !self.checks_started {
            p.state = CandidatePairState::Frozen;
        }
        self.candidate_pairs.push(p);
        Some(self.candidate_pairs.len() - 1)
    }

    pub(crate) fn find_pair(&self, local_index: usize, remote_index: usize) -> Option<usize> {
        self.candidate_pairs
            .iter()
            .position(|p| p.local_index == local_index && p.remote_index == remote_index)
    }

    pub(crate) fn find_remote_candidate(
        &self,
        local_index: usize,
        addr: SocketAddr,
    ) -> Option<usize> {
        let network_type = self.local_candidates[local_index].network_type();
        self.remote_candidates
            .iter()
            .position(|c| c.addr() == addr && c.network_type() == network_type)
    }

    pub(crate) fn find_local_candidate(
        &self,
        addr: SocketAddr,
        transport_protocol: TransportProtocol,
    ) -> Option<usize> {
        self.local_candidates
            .iter()
            .zip(self.local_transports.iter())
            .position(|(c, t)| {
                c.candidate_type() == CandidateType::Host
                    && c.addr() == addr
                    && t.transport_protocol() == Some(transport_protocol)
            })
    }

    /// Closes the agent. In-flight checks and gathering transactions are cancelled.
    /// Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.close_gatherers();
        self.pending_binding_requests.clear();
        self.pending_remote_candidates.clear();
        self.selected_pair = None;
        self.closed = true;
        self.update_connection_state(ConnectionState::Closed);

        Ok(())
    }

    pub(crate) fn get_name(&self) -> &str {
        if self.is_controlling {
            "controlling"
        } else {
            "controlled"
        }
    }
}
