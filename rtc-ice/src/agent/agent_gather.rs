use super::*;
use crate::candidate::candidate_host::CandidateHostConfig;
use crate::candidate::candidate_relay::CandidateRelayConfig;
use crate::candidate::candidate_server_reflexive::CandidateServerReflexiveConfig;
use crate::network_type::network_type_of;
use crate::tcp_type::TcpType;
use sansio::Protocol;
use turn::client::{Client, ClientConfig, Event as ClientEvent, RelayedAddr};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum GatherKind {
    ServerReflexive,
    Relay,
}

/// One STUN/TURN server transaction started from a host base.
pub(crate) struct Gatherer {
    pub(crate) client: Client,
    pub(crate) kind: GatherKind,
    pub(crate) url: Url,
    pub(crate) base_index: usize,
    pub(crate) transaction_id: Option<TransactionId>,
    pub(crate) relayed_addr: Option<RelayedAddr>,
    pub(crate) done: bool,
}

impl Agent {
    /// Starts gathering local candidates. Each candidate is reported with
    /// `Event::LocalCandidate` as soon as it is known, followed by
    /// `Event::LocalCandidate(None)` once every server transaction has succeeded,
    /// failed or timed out.
    pub fn gather_candidates(&mut self) -> Result<()> {
        if self.closed {
            return Err(Error::ErrClosed);
        }
        if self.gathering_state == GatheringState::Gathering {
            debug!("[{}]: gathering already in progress", self.get_name());
            return Ok(());
        }

        self.has_gathered = true;
        self.update_gathering_state(GatheringState::Gathering);

        for (addr, transport_protocol) in self.local_addresses.clone() {
            self.gather_from_address(addr, transport_protocol);
        }

        self.check_gathering_complete();
        Ok(())
    }

    pub(crate) fn gather_from_address(
        &mut self,
        addr: SocketAddr,
        transport_protocol: TransportProtocol,
    ) {
        let host_config = CandidateHostConfig {
            base_config: CandidateConfig {
                network: network_type_of(transport_protocol, &addr.ip()).to_string(),
                address: addr.ip().to_string(),
                port: addr.port(),
                component: COMPONENT_RTP,
                ..Default::default()
            },
            tcp_type: if transport_protocol == TransportProtocol::TCP {
                TcpType::Passive
            } else {
                TcpType::Unspecified
            },
        };

        let host = match host_config.new_candidate_host() {
            Ok(host) => host,
            Err(err) => {
                warn!(
                    "[{}]: failed to create host candidate for {}: {}",
                    self.get_name(),
                    addr,
                    err
                );
                return;
            }
        };
        let base_index = self.add_local_candidate(host, transport_protocol.into());

        if transport_protocol != TransportProtocol::UDP {
            return;
        }

        for url in self.urls.clone() {
            let kind = match url.scheme {
                SchemeType::Stun | SchemeType::Stuns
                    if contains_candidate_type(
                        CandidateType::ServerReflexive,
                        &self.candidate_types,
                    ) =>
                {
                    GatherKind::ServerReflexive
                }
                SchemeType::Turn | SchemeType::Turns
                    if contains_candidate_type(CandidateType::Relay, &self.candidate_types) =>
                {
                    if url.proto != ProtoType::Udp {
                        warn!(
                            "[{}]: skip {}, only UDP allocations are supported",
                            self.get_name(),
                            url
                        );
                        continue;
                    }
                    GatherKind::Relay
                }
                _ => continue,
            };

            if let Err(err) = self.start_gatherer(kind, url.clone(), base_index, addr) {
                warn!(
                    "[{}]: failed to query {} from {}: {}",
                    self.get_name(),
                    url,
                    addr,
                    err
                );
            }
        }
    }

    fn start_gatherer(
        &mut self,
        kind: GatherKind,
        url: Url,
        base_index: usize,
        local_addr: SocketAddr,
    ) -> Result<()> {
        let (stun_serv_addr, turn_serv_addr) = match kind {
            GatherKind::ServerReflexive => (url.server_addr(), String::new()),
            GatherKind::Relay => (String::new(), url.server_addr()),
        };

        let mut client = Client::new(
            ClientConfig {
                stun_serv_addr,
                turn_serv_addr,
                local_addr,
                transport_protocol: TransportProtocol::UDP,
                username: url.username.clone(),
                password: url.password.clone(),
                realm: String::new(),
                software: String::new(),
                rto: Duration::ZERO,
            },
            self.now,
        )?;

        let transaction_id = match kind {
            GatherKind::ServerReflexive => client.send_binding_request()?,
            GatherKind::Relay => client.allocate()?,
        };
        debug!(
            "[{}]: querying {} from {}",
            self.get_name(),
            url,
            local_addr
        );

        self.gatherers.push(Gatherer {
            client,
            kind,
            url,
            base_index,
            transaction_id: Some(transaction_id),
            relayed_addr: None,
            done: false,
        });
        self.drain_gatherers();
        self.prune_gatherers();

        Ok(())
    }

    pub(crate) fn add_local_candidate(
        &mut self,
        c: Candidate,
        transport: CandidateTransport,
    ) -> usize {
        if let Some(index) = self.local_candidates.iter().position(|l| l.equal(&c)) {
            return index;
        }

        debug!("[{}]: add local candidate {}", self.get_name(), c);
        self.local_candidates.push(c.clone());
        self.local_transports.push(transport);
        let local_index = self.local_candidates.len() - 1;

        // reflexive candidates are only advertised, they share the host base
        let advertise = match c.candidate_type() {
            CandidateType::Host => {
                contains_candidate_type(CandidateType::Host, &self.candidate_types)
            }
            _ => true,
        };
        if advertise {
            self.events.push_back(Event::LocalCandidate(Some(c)));
        }

        for remote_index in 0..self.remote_candidates.len() {
            self.add_pair(local_index, remote_index);
        }

        local_index
    }

    /// Collects what the server clients produced and applies their results.
    pub(crate) fn drain_gatherers(&mut self) {
        let mut results = vec![];
        for (index, gatherer) in self.gatherers.iter_mut().enumerate() {
            while let Some(transmit) = gatherer.client.poll_write() {
                self.transmits.push_back(transmit);
            }
            while let Some(event) = gatherer.client.poll_event() {
                results.push((index, event));
            }
        }

        for (index, event) in results {
            self.handle_gatherer_event(index, event);
        }
    }

    /// Drops finished server reflexive and failed relay transactions, then completes
    /// gathering if nothing is outstanding. Gatherer indices are only stable between
    /// two calls.
    pub(crate) fn prune_gatherers(&mut self) {
        self.gatherers
            .retain(|g| !g.done || (g.kind == GatherKind::Relay && g.relayed_addr.is_some()));
        self.check_gathering_complete();
    }

    fn handle_gatherer_event(&mut self, index: usize, event: ClientEvent) {
        let name = self.get_name().to_owned();
        let (kind, url, base_index, transaction_id) = {
            let g = &self.gatherers[index];
            (g.kind, g.url.clone(), g.base_index, g.transaction_id)
        };
        let is_ours = |tid: &TransactionId| transaction_id.as_ref() == Some(tid);

        match event {
            ClientEvent::BindingResponse(tid, mapped) if is_ours(&tid) => {
                self.gatherers[index].done = true;
                self.add_server_reflexive_candidate(base_index, &url, mapped);
            }
            ClientEvent::AllocateResponse(tid, relayed) if is_ours(&tid) => {
                self.gatherers[index].done = true;
                self.gatherers[index].relayed_addr = Some(relayed);
                self.add_relay_candidate(base_index, &url, relayed);
            }
            ClientEvent::BindingError(tid, err) | ClientEvent::AllocateError(tid, err)
                if is_ours(&tid) =>
            {
                warn!("[{name}]: {url} failed: {err}");
                self.gatherers[index].done = true;
            }
            ClientEvent::TransactionTimeout(tid) if is_ours(&tid) => {
                warn!("[{name}]: {url} timed out");
                self.gatherers[index].done = true;
            }
            ClientEvent::CreatePermissionError(_, err) => {
                warn!("[{name}]: {url} refused a permission: {err}");
            }
            ClientEvent::DataIndication(peer_addr, data) if kind == GatherKind::Relay => {
                let relayed_addr = self.gatherers[index].relayed_addr;
                if let Some(local_index) = self.local_transports.iter().position(|t| {
                    relayed_addr.is_some_and(|relayed| *t == CandidateTransport::Relay(relayed))
                }) {
                    self.handle_inbound_candidate_msg(local_index, &data, peer_addr);
                }
            }
            event => {
                log::trace!("[{name}]: unhandled server event {event:?}");
            }
        }
    }

    fn add_server_reflexive_candidate(&mut self, base_index: usize, url: &Url, mapped: SocketAddr) {
        let base = &self.local_candidates[base_index];
        let duplicate = self.local_candidates.iter().any(|c| {
            c.candidate_type() == CandidateType::ServerReflexive && c.addr() == mapped
        });
        if duplicate {
            debug!(
                "[{}]: suppress duplicate srflx candidate {}",
                self.get_name(),
                mapped
            );
            return;
        }

        let config = CandidateServerReflexiveConfig {
            base_config: CandidateConfig {
                network: base.network_type().to_string(),
                address: mapped.ip().to_string(),
                port: mapped.port(),
                component: base.component(),
                ..Default::default()
            },
            rel_addr: base.address().to_owned(),
            rel_port: base.port(),
            url: Some(url.to_string()),
        };

        match config.new_candidate_server_reflexive() {
            Ok(c) => {
                self.add_local_candidate(c, CandidateTransport::Udp);
            }
            Err(err) => warn!(
                "[{}]: failed to create srflx candidate {}: {}",
                self.get_name(),
                mapped,
                err
            ),
        }
    }

    fn add_relay_candidate(&mut self, base_index: usize, url: &Url, relayed: RelayedAddr) {
        let base = &self.local_candidates[base_index];
        let config = CandidateRelayConfig {
            base_config: CandidateConfig {
                network: network_type_of(TransportProtocol::UDP, &relayed.ip()).to_string(),
                address: relayed.ip().to_string(),
                port: relayed.port(),
                component: base.component(),
                ..Default::default()
            },
            rel_addr: base.address().to_owned(),
            rel_port: base.port(),
            url: Some(url.to_string()),
        };

        match config.new_candidate_relay() {
            Ok(c) => {
                self.add_local_candidate(c, CandidateTransport::Relay(relayed));
            }
            Err(err) => warn!(
                "[{}]: failed to create relay candidate {}: {}",
                self.get_name(),
                relayed,
                err
            ),
        }
    }

    pub(crate) fn check_gathering_complete(&mut self) {
        if self.gathering_state == GatheringState::Gathering
            && self.gatherers.iter().all(|g| g.done)
        {
            self.events.push_back(Event::LocalCandidate(None));
            self.update_gathering_state(GatheringState::Complete);
        }
    }

    /// Releases every server transaction and allocation.
    pub(crate) fn close_gatherers(&mut self) {
        for gatherer in &mut self.gatherers {
            if let Err(err) = gatherer.client.close() {
                debug!("closing client of {} failed: {}", gatherer.url, err);
            }
            while let Some(transmit) = gatherer.client.poll_write() {
                self.transmits.push_back(transmit);
            }
        }
        self.gatherers.clear();
    }

    pub(crate) fn gatherers_poll_timeout(&mut self) -> Option<Instant> {
        self.gatherers
            .iter_mut()
            .filter_map(|g| g.client.poll_timeout())
            .min()
    }

    pub(crate) fn gatherers_handle_timeout(&mut self, now: Instant) {
        for gatherer in &mut self.gatherers {
            if let Err(err) = gatherer.client.handle_timeout(now) {
                warn!("timeout handling of {} failed: {}", gatherer.url, err);
            }
        }
        self.drain_gatherers();
        self.prune_gatherers();
    }
}
