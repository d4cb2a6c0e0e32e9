use super::*;
use log::{error, trace};
use stun::error_code::*;
use stun::fingerprint::*;
use stun::xoraddr::*;

use crate::attributes::{control::*, priority::*, use_candidate::*};
use crate::candidate::candidate_peer_reflexive::CandidatePeerReflexiveConfig;

trait ControllingSelector {
    fn handle_success_response(&mut self, pair_index: usize, is_use_candidate: bool);
    fn handle_binding_request(&mut self, m: &Message, pair_index: usize);
}

trait ControlledSelector {
    fn handle_success_response(&mut self, pair_index: usize, is_use_candidate: bool);
    fn handle_binding_request(&mut self, m: &Message, pair_index: usize);
}

/// PRIORITY of a peer reflexive candidate learned from this base (RFC 8445 7.1.1).
fn peer_reflexive_priority(c: &Candidate) -> u32 {
    (1 << 24) * u32::from(CandidateType::PeerReflexive.preference())
        + (1 << 8) * u32::from(c.local_preference())
        + (256 - u32::from(c.component()))
}

impl Agent {
    /// Pair indices in probing order: local priority descending, then remote
    /// priority descending.
    pub(crate) fn checklist(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.candidate_pairs.len()).collect();
        order.sort_by(|a, b| {
            let (pa, pb) = (&self.candidate_pairs[*a], &self.candidate_pairs[*b]);
            pb.local_priority
                .cmp(&pa.local_priority)
                .then(pb.remote_priority.cmp(&pa.remote_priority))
        });
        order
    }

    pub(crate) fn in_flight_checks(&self) -> usize {
        self.pending_binding_requests
            .iter()
            .filter(|r| !r.is_keepalive)
            .count()
    }

    /// The window opens with the first selection; before that it is open too.
    pub(crate) fn is_nomination_open(&self) -> bool {
        self.nomination_deadline.is_none_or(|deadline| self.now < deadline)
    }

    pub(crate) fn has_pending_checks(&self) -> bool {
        if self.selected_pair.is_some() && !self.is_nomination_open() {
            return false;
        }
        self.candidate_pairs
            .iter()
            .any(|p| p.state == CandidatePairState::Waiting)
    }

    /// Starts at most one new check, on the first waiting pair of the
    /// checklist. Triggered checks are waiting pairs too, so they never
    /// overtake a higher-priority pair.
    pub(crate) fn contact_candidates(&mut self) {
        if !self.has_pending_checks() {
            return;
        }
        if self.in_flight_checks() >= self.max_in_flight_checks {
            trace!(
                "[{}]: {} checks in flight, waiting",
                self.get_name(),
                self.max_in_flight_checks
            );
            return;
        }

        let next = self
            .checklist()
            .into_iter()
            .find(|&index| self.candidate_pairs[index].state == CandidatePairState::Waiting);
        if let Some(pair_index) = next {
            self.ping_candidate(pair_index, false);
        }
    }

    /// Schedules a check of the pair in response to an inbound request
    /// (RFC 8445 7.3.1.4).
    pub(crate) fn enqueue_triggered_check(&mut self, pair_index: usize) {
        let p = &mut self.candidate_pairs[pair_index];
        if p.state == CandidatePairState::InProgress || p.state == CandidatePairState::Succeeded {
            return;
        }
        p.state = CandidatePairState::Waiting;
    }

    /// Sends a Binding request over the pair. Keepalives refresh consent on the
    /// selected pair and never change its state.
    pub(crate) fn ping_candidate(&mut self, pair_index: usize, is_keepalive: bool) {
        let (local_index, remote_index) = {
            let p = &self.candidate_pairs[pair_index];
            (p.local_index, p.remote_index)
        };
        let use_candidate = self.is_controlling && !is_keepalive && self.is_nomination_open();

        let (msg, result) = {
            let ufrag_pwd = &self.ufrag_pwd;
            let username = ufrag_pwd.remote_ufrag.clone() + ":" + ufrag_pwd.local_ufrag.as_str();
            let mut setters: Vec<Box<dyn Setter>> = vec![
                Box::new(BINDING_REQUEST),
                Box::new(TransactionId::new()),
                Box::new(Username::new(ATTR_USERNAME, username)),
            ];
            if use_candidate {
                setters.push(Box::new(UseCandidateAttr::new()));
            }
            if self.is_controlling {
                setters.push(Box::new(AttrControlling(self.tie_breaker)));
            } else {
                setters.push(Box::new(AttrControlled(self.tie_breaker)));
            }
            setters.push(Box::new(PriorityAttr(peer_reflexive_priority(
                &self.local_candidates[local_index],
            ))));
            setters.push(Box::new(MessageIntegrity::new_short_term_integrity(
                ufrag_pwd.remote_pwd.clone(),
            )));
            setters.push(Box::new(FINGERPRINT));

            let mut msg = Message::new();
            let result = msg.build(&setters);
            (msg, result)
        };

        if let Err(err) = result {
            error!("[{}]: {}", self.get_name(), err);
            return;
        }

        trace!(
            "[{}]: ping STUN{} from {} to {}",
            self.get_name(),
            if use_candidate { " (nominate)" } else { "" },
            self.local_candidates[local_index],
            self.remote_candidates[remote_index],
        );

        let now = self.now;
        {
            let p = &mut self.candidate_pairs[pair_index];
            if is_keepalive {
                p.counters.consent_requests_sent += 1;
            } else {
                p.state = CandidatePairState::InProgress;
            }
            p.binding_request_count += 1;
            p.counters.requests_sent += 1;
        }

        self.pending_binding_requests.push(BindingRequest {
            timestamp: now,
            transaction_id: msg.transaction_id,
            destination: self.remote_candidates[remote_index].addr(),
            pair_index,
            is_controlling: self.is_controlling,
            is_use_candidate: use_candidate,
            is_keepalive,
            raw: msg.raw.clone(),
            transmissions: 1,
            rto: self.initial_rto,
            next_retransmit: now + self.initial_rto,
        });

        self.send_stun(&msg.raw, local_index, remote_index);
    }

    /// Retransmits unanswered checks with exponential backoff and fails the pairs
    /// whose last transmission went unanswered. Keepalives are not retransmitted.
    pub(crate) fn retransmit_binding_requests(&mut self) {
        let now = self.now;
        let max_binding_requests = self.max_binding_requests;
        let backoff_multiplier = self.backoff_multiplier;

        let mut resend = vec![];
        let mut failed = vec![];
        self.pending_binding_requests.retain_mut(|r| {
            if r.is_keepalive {
                return now.saturating_duration_since(r.timestamp) < MAX_BINDING_REQUEST_TIMEOUT;
            }
            if now < r.next_retransmit {
                return true;
            }
            if r.transmissions >= max_binding_requests {
                failed.push(r.pair_index);
                return false;
            }

            r.transmissions += 1;
            r.rto = r.rto.mul_f64(backoff_multiplier);
            r.next_retransmit = now + r.rto;
            resend.push((r.pair_index, r.raw.clone()));
            true
        });

        for (pair_index, raw) in resend {
            let (local_index, remote_index) = {
                let p = &mut self.candidate_pairs[pair_index];
                p.binding_request_count += 1;
                p.counters.requests_sent += 1;
                (p.local_index, p.remote_index)
            };
            self.send_stun(&raw, local_index, remote_index);
        }

        for &pair_index in &failed {
            let p = &mut self.candidate_pairs[pair_index];
            if p.state == CandidatePairState::InProgress {
                debug!(
                    "max requests reached for pair {}, marking it as failed",
                    *p
                );
                p.state = CandidatePairState::Failed;
            }
        }
        if !failed.is_empty() {
            self.check_all_pairs_failed();
        }
    }

    /// Fails the agent once nothing is left to try.
    pub(crate) fn check_all_pairs_failed(&mut self) {
        if self.connection_state == ConnectionState::Checking
            && self.selected_pair.is_none()
            && self.gathering_state != GatheringState::Gathering
            && !self.candidate_pairs.is_empty()
            && self
                .candidate_pairs
                .iter()
                .all(|p| p.state == CandidatePairState::Failed)
        {
            warn!("[{}]: {}", self.get_name(), Error::ErrIceConnectivityFailed);
            self.update_connection_state(ConnectionState::Failed);
        }
    }

    pub(crate) fn check_checking_timeout(&mut self) {
        if self.connection_state == ConnectionState::Checking
            && self.failed_timeout != Duration::ZERO
            && let Some(since) = self.checking_since
            && self.now >= since + self.failed_timeout
        {
            warn!(
                "[{}]: no pair succeeded within {:?}",
                self.get_name(),
                self.failed_timeout
            );
            self.update_connection_state(ConnectionState::Failed);
        }
    }

    fn selected_last_received(&self) -> Option<Instant> {
        let pair_index = self.selected_pair?;
        let remote_index = self.candidate_pairs[pair_index].remote_index;
        Some(
            self.remote_candidates[remote_index]
                .last_received()
                .unwrap_or(self.now),
        )
    }

    /// Checks if the selected pair is (still) receiving traffic.
    pub(crate) fn validate_selected_pair(&mut self) {
        if self.connection_state != ConnectionState::Connected
            && self.connection_state != ConnectionState::Disconnected
        {
            return;
        }
        let Some(last_received) = self.selected_last_received() else {
            return;
        };

        let disconnected_time = self.now.saturating_duration_since(last_received);
        if self.failed_timeout != Duration::ZERO && disconnected_time >= self.failed_timeout {
            self.update_connection_state(ConnectionState::Failed);
        } else if self.disconnected_timeout != Duration::ZERO
            && disconnected_time >= self.disconnected_timeout
        {
            self.update_connection_state(ConnectionState::Disconnected);
            if !self.restart_requested {
                self.restart_requested = true;
                self.events.push_back(Event::RestartNeeded);
            }
        } else {
            self.update_connection_state(ConnectionState::Connected);
        }
    }

    /// Sends a consent Binding request on the selected pair every keepalive interval.
    pub(crate) fn check_keepalive(&mut self) {
        if self.keepalive_interval == Duration::ZERO
            || (self.connection_state != ConnectionState::Connected
                && self.connection_state != ConnectionState::Disconnected)
        {
            return;
        }
        let Some(pair_index) = self.selected_pair else {
            return;
        };

        if self
            .last_keepalive
            .is_none_or(|last| self.now >= last + self.keepalive_interval)
        {
            self.last_keepalive = Some(self.now);
            self.ping_candidate(pair_index, true);
        }
    }

    /// Deadlines of the check scheduler and liveness tracking.
    pub(crate) fn selector_poll_timeout(&self) -> Option<Instant> {
        let mut deadlines = vec![];

        if self.checks_started && self.has_pending_checks() {
            deadlines.push(
                self.last_check
                    .map_or(self.now, |last| last + self.check_interval),
            );
        }

        for r in &self.pending_binding_requests {
            if r.is_keepalive {
                deadlines.push(r.timestamp + MAX_BINDING_REQUEST_TIMEOUT);
            } else {
                deadlines.push(r.next_retransmit);
            }
        }

        if self.connection_state == ConnectionState::Checking
            && self.failed_timeout != Duration::ZERO
            && let Some(since) = self.checking_since
        {
            deadlines.push(since + self.failed_timeout);
        }

        if let Some(last_received) = self.selected_last_received() {
            match self.connection_state {
                ConnectionState::Connected => {
                    if self.disconnected_timeout != Duration::ZERO {
                        deadlines.push(last_received + self.disconnected_timeout);
                    } else if self.failed_timeout != Duration::ZERO {
                        deadlines.push(last_received + self.failed_timeout);
                    }
                }
                ConnectionState::Disconnected => {
                    if self.failed_timeout != Duration::ZERO {
                        deadlines.push(last_received + self.failed_timeout);
                    }
                }
                _ => {}
            }

            if self.keepalive_interval != Duration::ZERO
                && (self.connection_state == ConnectionState::Connected
                    || self.connection_state == ConnectionState::Disconnected)
            {
                deadlines.push(
                    self.last_keepalive
                        .map_or(self.now, |last| last + self.keepalive_interval),
                );
            }
        }

        deadlines.into_iter().min()
    }

    /// Selects a nominated pair. The first one wins; a strictly better one replaces
    /// it while the nomination window is open.
    pub(crate) fn nominate_pair(&mut self, pair_index: usize) {
        self.candidate_pairs[pair_index].nominated = true;

        match self.selected_pair {
            None => {
                self.set_selected_pair(pair_index);
                self.nomination_deadline = Some(self.now + self.nomination_window);
                self.last_keepalive = Some(self.now);
            }
            Some(current) if current == pair_index => {}
            Some(current) => {
                if self.is_nomination_open()
                    && self.candidate_pairs[pair_index].priority()
                        > self.candidate_pairs[current].priority()
                {
                    debug!(
                        "[{}]: higher priority pair {} supersedes {}",
                        self.get_name(),
                        self.candidate_pairs[pair_index],
                        self.candidate_pairs[current]
                    );
                    self.set_selected_pair(pair_index);
                    self.last_keepalive = Some(self.now);
                } else {
                    trace!(
                        "[{}]: keep selected pair {}",
                        self.get_name(),
                        self.candidate_pairs[current]
                    );
                }
            }
        }
    }

    /// Processes STUN traffic from a remote candidate.
    pub(crate) fn handle_inbound(
        &mut self,
        m: &mut Message,
        local_index: usize,
        remote_addr: SocketAddr,
    ) {
        if m.typ.method != METHOD_BINDING {
            trace!(
                "[{}]: unhandled STUN from {} to {} class({}) method({})",
                self.get_name(),
                remote_addr,
                local_index,
                m.typ.class,
                m.typ.method
            );
            return;
        }

        if m.typ.class == CLASS_REQUEST {
            self.handle_inbound_binding_request(m, local_index, remote_addr);
        } else if m.typ.class == CLASS_SUCCESS_RESPONSE {
            self.handle_inbound_binding_success(m, local_index, remote_addr);
        } else if m.typ.class == CLASS_ERROR_RESPONSE {
            self.handle_inbound_binding_error(m, remote_addr);
        } else if let Some(remote_index) = self.find_remote_candidate(local_index, remote_addr) {
            let now = self.now;
            self.remote_candidates[remote_index].seen(false, now);
        }
    }

    fn handle_inbound_binding_request(
        &mut self,
        m: &mut Message,
        local_index: usize,
        remote_addr: SocketAddr,
    ) {
        if !self.ufrag_pwd.has_remote_credentials() {
            debug!(
                "[{}]: discard request from ({}), remote credentials not set",
                self.get_name(),
                remote_addr
            );
            return;
        }

        {
            let ufrag_pwd = &self.ufrag_pwd;
            let username = ufrag_pwd.local_ufrag.clone() + ":" + ufrag_pwd.remote_ufrag.as_str();
            let local_pwd = ufrag_pwd.local_pwd.clone();
            if let Err(err) = assert_inbound_username(m, &username)
                .and_then(|_| assert_inbound_message_integrity(m, local_pwd.as_bytes()))
            {
                warn!(
                    "[{}]: discard message from ({}), {}",
                    self.get_name(),
                    remote_addr,
                    err
                );
                return;
            }
        }

        // RFC 8445 7.3.1.1
        if self.is_controlling && m.contains(ATTR_ICE_CONTROLLING) {
            let mut theirs = AttrControlling::default();
            if theirs.get_from(m).is_err() {
                return;
            }
            if self.tie_breaker >= theirs.0 {
                self.send_role_conflict(m, local_index, remote_addr);
                return;
            }
            self.set_role(false);
        } else if !self.is_controlling && m.contains(ATTR_ICE_CONTROLLED) {
            let mut theirs = AttrControlled::default();
            if theirs.get_from(m).is_err() {
                return;
            }
            if self.tie_breaker >= theirs.0 {
                self.set_role(true);
            } else {
                self.send_role_conflict(m, local_index, remote_addr);
                return;
            }
        }

        let remote_index = match self.find_remote_candidate(local_index, remote_addr) {
            Some(remote_index) => remote_index,
            None => match self.learn_peer_reflexive_candidate(m, local_index, remote_addr) {
                Some(remote_index) => remote_index,
                None => return,
            },
        };

        let now = self.now;
        self.remote_candidates[remote_index].seen(false, now);

        let Some(pair_index) = self.add_pair(local_index, remote_index) else {
            debug!(
                "[{}]: no pair for request from {}",
                self.get_name(),
                remote_addr
            );
            return;
        };

        trace!(
            "[{}]: inbound STUN (Request) from {} to {}",
            self.get_name(),
            remote_addr,
            local_index
        );

        self.candidate_pairs[pair_index].counters.requests_received += 1;
        self.send_binding_success(m, local_index, remote_index);
        self.candidate_pairs[pair_index].counters.responses_sent += 1;

        if self.is_controlling {
            ControllingSelector::handle_binding_request(self, m, pair_index);
        } else {
            ControlledSelector::handle_binding_request(self, m, pair_index);
        }
    }

    fn learn_peer_reflexive_candidate(
        &mut self,
        m: &Message,
        local_index: usize,
        remote_addr: SocketAddr,
    ) -> Option<usize> {
        let mut priority = PriorityAttr::default();
        if let Err(err) = priority.get_from(m) {
            warn!(
                "[{}]: discard request from ({}) without priority: {}",
                self.get_name(),
                remote_addr,
                err
            );
            return None;
        }

        let local = &self.local_candidates[local_index];
        let prflx_candidate_config = CandidatePeerReflexiveConfig {
            base_config: CandidateConfig {
                network: local.network_type().to_string(),
                address: remote_addr.ip().to_string(),
                port: remote_addr.port(),
                component: local.component(),
                priority: priority.0,
                ..CandidateConfig::default()
            },
            rel_addr: String::new(),
            rel_port: 0,
        };

        match prflx_candidate_config.new_candidate_peer_reflexive() {
            Ok(prflx_candidate) => {
                debug!(
                    "[{}]: adding a new peer-reflexive candidate: {}",
                    self.get_name(),
                    remote_addr
                );
                Some(self.add_remote_candidate_internal(prflx_candidate))
            }
            Err(err) => {
                error!(
                    "[{}]: Failed to create new remote prflx candidate ({})",
                    self.get_name(),
                    err
                );
                None
            }
        }
    }

    fn handle_inbound_binding_success(
        &mut self,
        m: &mut Message,
        local_index: usize,
        remote_addr: SocketAddr,
    ) {
        let remote_pwd = self.ufrag_pwd.remote_pwd.clone();
        if let Err(err) = assert_inbound_message_integrity(m, remote_pwd.as_bytes()) {
            warn!(
                "[{}]: discard message from ({}), {}",
                self.get_name(),
                remote_addr,
                err
            );
            return;
        }

        let Some(position) = self
            .pending_binding_requests
            .iter()
            .position(|r| r.transaction_id == m.transaction_id)
        else {
            warn!(
                "[{}]: discard message from ({}), unknown TransactionID 0x{:?}",
                self.get_name(),
                remote_addr,
                m.transaction_id
            );
            return;
        };
        let request = self.pending_binding_requests.remove(position);

        // Assert that NAT is not symmetric
        // https://tools.ietf.org/html/rfc8445#section-7.2.5.2.1
        let pair_index = request.pair_index;
        if request.destination != remote_addr
            || self.candidate_pairs[pair_index].local_index != local_index
        {
            debug!(
                "[{}]: discard message: transaction source and destination does not match expected({}), actual({})",
                self.get_name(),
                request.destination,
                remote_addr
            );
            return;
        }

        let now = self.now;
        let remote_index = self.candidate_pairs[pair_index].remote_index;
        self.remote_candidates[remote_index].seen(false, now);
        self.candidate_pairs[pair_index]
            .update_round_trip_time(now.saturating_duration_since(request.timestamp));

        if request.is_keepalive {
            trace!("[{}]: consent refreshed by {}", self.get_name(), remote_addr);
            return;
        }

        let mut mapped = XorMappedAddress::default();
        if mapped.get_from(m).is_ok() {
            trace!(
                "[{}]: {} is seen as {}:{}",
                self.get_name(),
                self.local_candidates[local_index],
                mapped.ip,
                mapped.port
            );
        }

        self.candidate_pairs[pair_index].state = CandidatePairState::Succeeded;
        trace!(
            "[{}]: Found valid candidate pair: {}, isUseCandidate: {}",
            self.get_name(),
            self.candidate_pairs[pair_index],
            request.is_use_candidate,
        );

        if self.is_controlling {
            ControllingSelector::handle_success_response(self, pair_index, request.is_use_candidate);
        } else {
            ControlledSelector::handle_success_response(self, pair_index, request.is_use_candidate);
        }
    }

    fn handle_inbound_binding_error(&mut self, m: &mut Message, remote_addr: SocketAddr) {
        let remote_pwd = self.ufrag_pwd.remote_pwd.clone();
        if let Err(err) = assert_inbound_message_integrity(m, remote_pwd.as_bytes()) {
            warn!(
                "[{}]: discard error from ({}), {}",
                self.get_name(),
                remote_addr,
                err
            );
            return;
        }

        let Some(position) = self
            .pending_binding_requests
            .iter()
            .position(|r| r.transaction_id == m.transaction_id)
        else {
            return;
        };
        let request = self.pending_binding_requests.remove(position);

        let mut code = ErrorCodeAttribute::default();
        if code.get_from(m).is_ok() && code.code == CODE_ROLE_CONFLICT {
            // switch to the role the request did not carry and check the pair again
            if request.is_controlling == self.is_controlling {
                self.set_role(!request.is_controlling);
            }
            if !request.is_keepalive {
                self.candidate_pairs[request.pair_index].state = CandidatePairState::Waiting;
            }
            return;
        }

        warn!(
            "[{}]: check to {} failed: {}",
            self.get_name(),
            remote_addr,
            code.code.0
        );
        if !request.is_keepalive {
            self.candidate_pairs[request.pair_index].state = CandidatePairState::Failed;
            self.check_all_pairs_failed();
        }
    }

    pub(crate) fn send_binding_success(
        &mut self,
        m: &Message,
        local_index: usize,
        remote_index: usize,
    ) {
        let addr = self.remote_candidates[remote_index].addr();
        let (ip, port) = (addr.ip(), addr.port());
        let local_pwd = self.ufrag_pwd.local_pwd.clone();

        let mut out = Message::new();
        let result = out.build(&[
            Box::new(m.clone()),
            Box::new(BINDING_SUCCESS),
            Box::new(XorMappedAddress { ip, port }),
            Box::new(MessageIntegrity::new_short_term_integrity(local_pwd)),
            Box::new(FINGERPRINT),
        ]);

        if let Err(err) = result {
            warn!(
                "[{}]: Failed to handle inbound ICE from: {} to: {} error: {}",
                self.get_name(),
                local_index,
                remote_index,
                err
            );
        } else {
            self.send_stun(&out.raw, local_index, remote_index);
        }
    }

    fn send_role_conflict(&mut self, m: &Message, local_index: usize, remote_addr: SocketAddr) {
        debug!(
            "[{}]: role conflict with {}, answering 487",
            self.get_name(),
            remote_addr
        );
        let local_pwd = self.ufrag_pwd.local_pwd.clone();

        let mut out = Message::new();
        let result = out.build(&[
            Box::new(m.clone()),
            Box::new(BINDING_ERROR),
            Box::new(ErrorCodeAttribute {
                code: CODE_ROLE_CONFLICT,
                reason: b"Role Conflict".to_vec(),
            }),
            Box::new(MessageIntegrity::new_short_term_integrity(local_pwd)),
            Box::new(FINGERPRINT),
        ]);

        match result {
            Ok(()) => {
                if let Err(err) = self.send_to(local_index, remote_addr, &out.raw) {
                    warn!("[{}]: failed to send 487: {}", self.get_name(), err);
                }
            }
            Err(err) => error!("[{}]: {}", self.get_name(), err),
        }
    }
}

impl ControllingSelector for Agent {
    fn handle_success_response(&mut self, pair_index: usize, is_use_candidate: bool) {
        if is_use_candidate {
            self.nominate_pair(pair_index);
        }
    }

    fn handle_binding_request(&mut self, _m: &Message, pair_index: usize) {
        self.enqueue_triggered_check(pair_index);
    }
}

impl ControlledSelector for Agent {
    fn handle_success_response(&mut self, pair_index: usize, _is_use_candidate: bool) {
        if self.candidate_pairs[pair_index].nominate_on_success {
            self.candidate_pairs[pair_index].nominate_on_success = false;
            self.nominate_pair(pair_index);
        }
    }

    fn handle_binding_request(&mut self, m: &Message, pair_index: usize) {
        // https://tools.ietf.org/html/rfc8445#section-7.3.1.5
        if UseCandidateAttr::is_set(m) {
            if self.candidate_pairs[pair_index].state == CandidatePairState::Succeeded {
                // If the state of this pair is Succeeded, it means that the check
                // previously sent by this pair produced a successful response and
                // generated a valid pair (Section 7.2.5.3.2).  The agent sets the
                // nominated flag value of the valid pair to true.
                self.nominate_pair(pair_index);
            } else {
                // Once the triggered check succeeds the pair is nominated.
                self.candidate_pairs[pair_index].nominate_on_success = true;
                self.enqueue_triggered_check(pair_index);
            }
        } else {
            self.enqueue_triggered_check(pair_index);
        }
    }
}
