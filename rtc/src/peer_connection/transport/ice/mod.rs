use crate::peer_connection::state::ice_connection_state::RTCIceConnectionState;
use crate::peer_connection::state::ice_gathering_state::RTCIceGatheringState;
use crate::peer_connection::transport::ice::candidate::RTCIceCandidate;
use crate::peer_connection::transport::ice::candidate_pair::RTCIceCandidatePair;
use crate::peer_connection::transport::ice::parameters::RTCIceParameters;
use crate::peer_connection::transport::ice::role::RTCIceRole;
use ice::agent::Agent;
use ice::agent::agent_config::AgentConfig;
use ice::candidate::Candidate;
use ice::tcp_type::TcpType;
use log::info;
use shared::TransportProtocol;
use shared::error::Result;
use std::net::SocketAddr;
use std::time::Instant;

pub(crate) mod candidate;
pub(crate) mod candidate_pair;
pub(crate) mod parameters;
pub(crate) mod role;
pub(crate) mod server;

/// ICETransport owns the ICE agent shared by every bundled media section.
pub(crate) struct RTCIceTransport {
    pub(crate) agent: Agent,
    started: bool,
}

impl RTCIceTransport {
    pub(crate) fn new(agent_config: AgentConfig, now: Instant) -> Result<Self> {
        Ok(RTCIceTransport {
            agent: Agent::new(agent_config, now)?,
            started: false,
        })
    }

    /// get_local_parameters returns the ICE parameters of the local agent.
    pub(crate) fn get_local_parameters(&self) -> RTCIceParameters {
        let (frag, pwd) = self.agent.get_local_user_credentials();
        RTCIceParameters {
            username_fragment: frag.to_owned(),
            password: pwd.to_owned(),
        }
    }

    pub(crate) fn get_local_candidates(&self) -> Vec<RTCIceCandidate> {
        self.agent
            .get_local_candidates()
            .iter()
            .map(RTCIceCandidate::from)
            .collect()
    }

    pub(crate) fn have_remote_credentials_change(&self, new_ufrag: &str, new_pwd: &str) -> bool {
        let (ufrag, pwd) = self.agent.get_remote_user_credentials();
        ufrag != new_ufrag || pwd != new_pwd
    }

    pub(crate) fn add_local_address(
        &mut self,
        addr: SocketAddr,
        transport_protocol: TransportProtocol,
    ) -> Result<()> {
        self.agent.add_local_address(addr, transport_protocol)
    }

    /// Starts gathering once. Later calls are no-ops while gathering runs or
    /// after it completed.
    pub(crate) fn gather(&mut self) -> Result<()> {
        if self.agent.gathering_state() == ice::state::GatheringState::New {
            self.agent.gather_candidates()?;
        }
        Ok(())
    }

    pub(crate) fn add_remote_candidate(&mut self, c: Candidate) -> Result<()> {
        if c.tcp_type() == TcpType::Active {
            // active remote candidates reach our passive ones on their own
            info!("Ignoring remote candidate with tcpType active: {c}");
            return Ok(());
        }
        self.agent.add_remote_candidate(c)
    }

    /// Sets the remote credentials and starts connectivity checks in `role`.
    pub(crate) fn start(
        &mut self,
        role: RTCIceRole,
        remote_ufrag: String,
        remote_pwd: String,
    ) -> Result<()> {
        self.agent.start_connectivity_checks(
            role == RTCIceRole::Controlling,
            remote_ufrag,
            remote_pwd,
        )?;
        self.started = true;
        Ok(())
    }

    pub(crate) fn is_started(&self) -> bool {
        self.started
    }

    /// Regenerates the local credentials and forgets every remote candidate.
    /// Local candidates are gathered again.
    pub(crate) fn restart(&mut self) -> Result<()> {
        self.started = false;
        self.agent.restart(String::new(), String::new(), false)
    }

    pub(crate) fn role(&self) -> RTCIceRole {
        RTCIceRole::from(self.agent.is_controlling())
    }

    pub(crate) fn connection_state(&self) -> RTCIceConnectionState {
        self.agent.connection_state().into()
    }

    pub(crate) fn gathering_state(&self) -> RTCIceGatheringState {
        self.agent.gathering_state().into()
    }

    pub(crate) fn get_selected_candidate_pair(&self) -> Option<RTCIceCandidatePair> {
        self.agent
            .get_selected_candidate_pair()
            .map(|(local, remote)| {
                RTCIceCandidatePair::new(RTCIceCandidate::from(local), RTCIceCandidate::from(remote))
            })
    }

    pub(crate) fn close(&mut self) -> Result<()> {
        self.agent.close()
    }
}
