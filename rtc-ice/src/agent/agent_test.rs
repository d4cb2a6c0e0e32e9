use super::*;
use crate::attributes::{control::AttrControlled, priority::PriorityAttr};
use sansio::Protocol;
use shared::tcp_framing::frame_packet;
use shared::{TransportContext, TransportMessage};
use stun::fingerprint::FINGERPRINT;
use stun::xoraddr::XorMappedAddress;

const A_UFRAG: &str = "aUfragAgentAAAAA";
const A_PWD: &str = "aPasswordOfAgentAAAAAAAAAAAAAAAA";
const B_UFRAG: &str = "bUfragAgentBBBBB";
const B_PWD: &str = "bPasswordOfAgentBBBBBBBBBBBBBBBB";

const A_ADDR: &str = "10.0.0.1:5000";
const B_ADDR: &str = "10.0.0.2:6000";

fn init_log() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init()
        .ok();
}

fn config(is_controlling: bool, ufrag: &str, pwd: &str) -> AgentConfig {
    AgentConfig {
        local_ufrag: ufrag.to_owned(),
        local_pwd: pwd.to_owned(),
        is_controlling,
        ..Default::default()
    }
}

fn deliver(to: &mut Agent, transmit: TaggedBytesMut) -> Result<()> {
    to.handle_read(TransportMessage {
        now: transmit.now,
        transport: TransportContext {
            local_addr: transmit.transport.peer_addr,
            peer_addr: transmit.transport.local_addr,
            transport_protocol: transmit.transport.transport_protocol,
        },
        message: transmit.message,
    })
}

fn pump(a: &mut Agent, b: &mut Agent) -> Result<()> {
    loop {
        let mut idle = true;
        while let Some(transmit) = a.poll_write() {
            idle = false;
            deliver(b, transmit)?;
        }
        while let Some(transmit) = b.poll_write() {
            idle = false;
            deliver(a, transmit)?;
        }
        if idle {
            return Ok(());
        }
    }
}

fn run(a: &mut Agent, b: &mut Agent, now: &mut Instant, duration: Duration) -> Result<()> {
    let end = *now + duration;
    while *now < end {
        a.handle_timeout(*now)?;
        b.handle_timeout(*now)?;
        pump(a, b)?;
        *now += Duration::from_millis(10);
    }
    Ok(())
}

/// Drives a single agent by its own deadlines, handing every transmit to `sink`.
fn drive(
    a: &mut Agent,
    now: &mut Instant,
    until: impl Fn(&Agent) -> bool,
    mut sink: impl FnMut(TaggedBytesMut),
) -> Result<()> {
    for _ in 0..1000 {
        while let Some(transmit) = a.poll_write() {
            sink(transmit);
        }
        if until(&*a) {
            return Ok(());
        }
        let Some(next) = a.poll_timeout() else {
            break;
        };
        *now = next.max(*now);
        a.handle_timeout(*now)?;
    }
    while let Some(transmit) = a.poll_write() {
        sink(transmit);
    }
    Ok(())
}

fn drain_events(a: &mut Agent) -> Vec<Event> {
    let mut events = vec![];
    while let Some(event) = a.poll_event() {
        events.push(event);
    }
    events
}

/// Gathers and returns the advertised candidates the way signaling would carry them.
fn gather(a: &mut Agent, addr: &str, transport_protocol: TransportProtocol) -> Result<Vec<Candidate>> {
    a.add_local_address(addr.parse()?, transport_protocol)?;
    a.gather_candidates()?;

    let mut candidates = vec![];
    for event in drain_events(a) {
        if let Event::LocalCandidate(Some(c)) = event {
            candidates.push(unmarshal_candidate(&c.marshal())?);
        }
    }
    Ok(candidates)
}

fn connect(a: &mut Agent, b: &mut Agent, now: &mut Instant) -> Result<()> {
    init_log();
    let a_candidates = gather(a, A_ADDR, TransportProtocol::UDP)?;
    let b_candidates = gather(b, B_ADDR, TransportProtocol::UDP)?;
    for c in b_candidates {
        a.add_remote_candidate(c)?;
    }
    for c in a_candidates {
        b.add_remote_candidate(c)?;
    }

    a.start_connectivity_checks(a.is_controlling(), B_UFRAG.to_owned(), B_PWD.to_owned())?;
    b.start_connectivity_checks(b.is_controlling(), A_UFRAG.to_owned(), A_PWD.to_owned())?;

    run(a, b, now, Duration::from_secs(1))
}

fn remote_host(priority: u32, addr: &str) -> Result<Candidate> {
    let addr: SocketAddr = addr.parse()?;
    unmarshal_candidate(&format!(
        "candidate:{} 1 udp {} {} {} typ host",
        addr.port(),
        priority,
        addr.ip(),
        addr.port()
    ))
}

#[test]
fn test_connectivity_udp() -> Result<()> {
    let mut now = Instant::now();
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), now)?;
    let mut b = Agent::new(config(false, B_UFRAG, B_PWD), now)?;

    connect(&mut a, &mut b, &mut now)?;

    assert_eq!(a.connection_state(), ConnectionState::Connected);
    assert_eq!(b.connection_state(), ConnectionState::Connected);

    let (local, remote) = a
        .get_selected_candidate_pair()
        .ok_or(Error::ErrNoSelectedCandidatePair)?;
    assert_eq!(local.addr(), A_ADDR.parse::<SocketAddr>()?);
    assert_eq!(remote.addr(), B_ADDR.parse::<SocketAddr>()?);

    a.handle_write(BytesMut::from(&b"hello"[..]))?;
    pump(&mut a, &mut b)?;
    let read = b.poll_read().ok_or(Error::ErrNoSelectedCandidatePair)?;
    assert_eq!(&read.message[..], b"hello");
    assert_eq!(read.transport.peer_addr, A_ADDR.parse::<SocketAddr>()?);

    let stats = a.get_candidate_pairs_stats();
    assert_eq!(stats.len(), 1);
    assert!(stats[0].selected);
    assert!(stats[0].nominated);
    assert_eq!(stats[0].packets_sent, 1);
    assert!(stats[0].requests_sent >= 1);
    assert!(stats[0].responses_received >= 1);

    Ok(())
}

#[test]
fn test_write_without_selected_pair() -> Result<()> {
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), Instant::now())?;
    assert_eq!(
        a.handle_write(BytesMut::from(&b"early"[..])),
        Err(Error::ErrNoSelectedCandidatePair)
    );
    Ok(())
}

#[test]
fn test_pairs_frozen_until_checks_start() -> Result<()> {
    let now = Instant::now();
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), now)?;
    gather(&mut a, A_ADDR, TransportProtocol::UDP)?;
    a.set_remote_credentials(B_UFRAG.to_owned(), B_PWD.to_owned())?;
    a.add_remote_candidate(remote_host(100, "10.0.0.2:6001")?)?;

    assert_eq!(a.get_candidate_pairs().len(), 1);
    assert_eq!(a.get_candidate_pairs()[0].state(), CandidatePairState::Frozen);

    a.start_connectivity_checks(true, B_UFRAG.to_owned(), B_PWD.to_owned())?;
    assert_eq!(a.get_candidate_pairs()[0].state(), CandidatePairState::Waiting);

    a.add_remote_candidate(remote_host(200, "10.0.0.2:6002")?)?;
    assert_eq!(a.get_candidate_pairs()[1].state(), CandidatePairState::Waiting);

    Ok(())
}

#[test]
fn test_checks_follow_checklist_order() -> Result<()> {
    let mut now = Instant::now();
    let mut a = Agent::new(
        AgentConfig {
            initial_rto: Some(Duration::from_secs(10)),
            ..config(true, A_UFRAG, A_PWD)
        },
        now,
    )?;
    gather(&mut a, A_ADDR, TransportProtocol::UDP)?;
    a.set_remote_credentials(B_UFRAG.to_owned(), B_PWD.to_owned())?;
    for (priority, addr) in [
        (100, "10.0.0.2:6001"),
        (300, "10.0.0.2:6003"),
        (200, "10.0.0.2:6002"),
    ] {
        a.add_remote_candidate(remote_host(priority, addr)?)?;
    }
    a.start_connectivity_checks(true, B_UFRAG.to_owned(), B_PWD.to_owned())?;

    let mut probed: Vec<SocketAddr> = vec![];
    let end = now + Duration::from_millis(400);
    while now < end {
        a.handle_timeout(now)?;
        while let Some(transmit) = a.poll_write() {
            if !probed.contains(&transmit.transport.peer_addr) {
                probed.push(transmit.transport.peer_addr);
            }
        }
        now += Duration::from_millis(10);
    }

    let expected: Vec<SocketAddr> = vec![
        "10.0.0.2:6003".parse()?,
        "10.0.0.2:6002".parse()?,
        "10.0.0.2:6001".parse()?,
    ];
    assert_eq!(probed, expected);

    let order: Vec<(u32, u32)> = a
        .checklist()
        .into_iter()
        .map(|i| {
            let p = &a.get_candidate_pairs()[i];
            (p.local_priority, p.remote_priority)
        })
        .collect();
    assert!(order.windows(2).all(|w| w[0] >= w[1]));

    Ok(())
}

#[test]
fn test_in_flight_checks_are_bounded() -> Result<()> {
    let mut now = Instant::now();
    let mut a = Agent::new(
        AgentConfig {
            max_in_flight_checks: Some(2),
            initial_rto: Some(Duration::from_secs(10)),
            ..config(true, A_UFRAG, A_PWD)
        },
        now,
    )?;
    gather(&mut a, A_ADDR, TransportProtocol::UDP)?;
    a.set_remote_credentials(B_UFRAG.to_owned(), B_PWD.to_owned())?;
    for port in 6001u16..6006 {
        a.add_remote_candidate(remote_host(u32::from(port), &format!("10.0.0.2:{port}"))?)?;
    }
    a.start_connectivity_checks(true, B_UFRAG.to_owned(), B_PWD.to_owned())?;

    let mut requests = 0;
    let end = now + Duration::from_millis(500);
    while now < end {
        a.handle_timeout(now)?;
        while a.poll_write().is_some() {
            requests += 1;
        }
        now += Duration::from_millis(10);
    }

    assert_eq!(requests, 2);
    assert_eq!(a.in_flight_checks(), 2);
    let waiting = a
        .get_candidate_pairs()
        .iter()
        .filter(|p| p.state() == CandidatePairState::Waiting)
        .count();
    assert_eq!(waiting, 3);

    Ok(())
}

#[test]
fn test_retransmission_backoff_until_failed() -> Result<()> {
    let mut now = Instant::now();
    let start = now;
    let mut a = Agent::new(
        AgentConfig {
            initial_rto: Some(Duration::from_millis(100)),
            backoff_multiplier: Some(2.0),
            max_binding_requests: Some(3),
            ..config(true, A_UFRAG, A_PWD)
        },
        now,
    )?;
    gather(&mut a, A_ADDR, TransportProtocol::UDP)?;
    a.add_remote_candidate(remote_host(100, B_ADDR)?)?;
    a.start_connectivity_checks(true, B_UFRAG.to_owned(), B_PWD.to_owned())?;
    drain_events(&mut a);

    let mut sent_at = vec![];
    drive(
        &mut a,
        &mut now,
        |a| a.connection_state() == ConnectionState::Failed,
        |transmit| sent_at.push(transmit.now - start),
    )?;

    assert_eq!(
        sent_at,
        vec![
            Duration::ZERO,
            Duration::from_millis(100),
            Duration::from_millis(300)
        ]
    );
    assert_eq!(now - start, Duration::from_millis(700));
    assert_eq!(a.get_candidate_pairs()[0].state(), CandidatePairState::Failed);
    assert!(
        drain_events(&mut a)
            .iter()
            .any(|e| matches!(e, Event::ConnectionStateChange(ConnectionState::Failed)))
    );

    Ok(())
}

#[test]
fn test_checking_without_pairs_times_out() -> Result<()> {
    let mut now = Instant::now();
    let start = now;
    let mut a = Agent::new(
        AgentConfig {
            failed_timeout: Some(Duration::from_secs(1)),
            ..config(true, A_UFRAG, A_PWD)
        },
        now,
    )?;
    gather(&mut a, A_ADDR, TransportProtocol::UDP)?;
    a.start_connectivity_checks(true, B_UFRAG.to_owned(), B_PWD.to_owned())?;
    assert_eq!(a.connection_state(), ConnectionState::Checking);

    drive(
        &mut a,
        &mut now,
        |a| a.connection_state() == ConnectionState::Failed,
        |_| {},
    )?;

    assert_eq!(a.connection_state(), ConnectionState::Failed);
    assert_eq!(now - start, Duration::from_secs(1));

    Ok(())
}

#[test]
fn test_nomination_window_supersede() -> Result<()> {
    let now = Instant::now();
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), now)?;
    gather(&mut a, A_ADDR, TransportProtocol::UDP)?;
    a.set_remote_credentials(B_UFRAG.to_owned(), B_PWD.to_owned())?;
    a.add_remote_candidate(remote_host(100, "10.0.0.2:6001")?)?;
    a.add_remote_candidate(remote_host(300, "10.0.0.2:6003")?)?;
    a.add_remote_candidate(remote_host(500, "10.0.0.2:6005")?)?;
    a.add_remote_candidate(remote_host(200, "10.0.0.2:6002")?)?;
    a.start_connectivity_checks(true, B_UFRAG.to_owned(), B_PWD.to_owned())?;
    drain_events(&mut a);

    let pair = |a: &Agent, remote: usize| a.find_pair(0, remote).ok_or(Error::ErrNoCandidatePairs);
    let (low, mid, high, lower) = (pair(&a, 0)?, pair(&a, 1)?, pair(&a, 2)?, pair(&a, 3)?);

    a.nominate_pair(low);
    assert_eq!(a.selected_pair, Some(low));
    assert_eq!(a.connection_state(), ConnectionState::Connected);

    // a better pair inside the window replaces it
    a.now += Duration::from_millis(100);
    a.nominate_pair(mid);
    assert_eq!(a.selected_pair, Some(mid));

    // a worse one never does
    a.nominate_pair(lower);
    assert_eq!(a.selected_pair, Some(mid));

    // the window is closed
    a.now += DEFAULT_NOMINATION_WINDOW;
    a.nominate_pair(high);
    assert_eq!(a.selected_pair, Some(mid));

    let changes = drain_events(&mut a)
        .into_iter()
        .filter(|e| matches!(e, Event::SelectedCandidatePairChange(_, _)))
        .count();
    assert_eq!(changes, 2);

    Ok(())
}

/// Answers a connectivity check the way the remote agent would.
fn success_response(check: &TaggedBytesMut, now: Instant) -> Result<TaggedBytesMut> {
    let mut request = Message::new();
    request.unmarshal_binary(&check.message)?;
    let mut response = Message::new();
    response.build(&[
        Box::new(request),
        Box::new(BINDING_SUCCESS),
        Box::new(XorMappedAddress {
            ip: check.transport.local_addr.ip(),
            port: check.transport.local_addr.port(),
        }),
        Box::new(MessageIntegrity::new_short_term_integrity(B_PWD.to_owned())),
        Box::new(FINGERPRINT),
    ])?;
    Ok(TransportMessage {
        now,
        transport: TransportContext {
            local_addr: check.transport.local_addr,
            peer_addr: check.transport.peer_addr,
            transport_protocol: check.transport.transport_protocol,
        },
        message: BytesMut::from(&response.raw[..]),
    })
}

#[test]
fn test_nomination_window_through_checks() -> Result<()> {
    init_log();
    let mut now = Instant::now();
    let mut a = Agent::new(
        AgentConfig {
            initial_rto: Some(Duration::from_secs(10)),
            ..config(true, A_UFRAG, A_PWD)
        },
        now,
    )?;
    gather(&mut a, A_ADDR, TransportProtocol::UDP)?;
    a.set_remote_credentials(B_UFRAG.to_owned(), B_PWD.to_owned())?;
    for (priority, addr) in [
        (100, "10.0.0.2:6001"),
        (300, "10.0.0.2:6003"),
        (500, "10.0.0.2:6005"),
    ] {
        a.add_remote_candidate(remote_host(priority, addr)?)?;
    }
    a.start_connectivity_checks(true, B_UFRAG.to_owned(), B_PWD.to_owned())?;
    drain_events(&mut a);

    let mut checks: HashMap<SocketAddr, TaggedBytesMut> = HashMap::new();
    let end = now + Duration::from_millis(300);
    while now < end {
        a.handle_timeout(now)?;
        while let Some(transmit) = a.poll_write() {
            checks.entry(transmit.transport.peer_addr).or_insert(transmit);
        }
        now += Duration::from_millis(10);
    }
    assert_eq!(checks.len(), 3);
    let check = |addr: &str| -> Result<TaggedBytesMut> {
        let addr: SocketAddr = addr.parse()?;
        checks.get(&addr).cloned().ok_or(Error::ErrNoCandidatePairs)
    };
    let selected = |a: &Agent| a.get_selected_candidate_pair().map(|(_, remote)| remote.addr());

    // the lowest pair answers first and is selected
    a.handle_read(success_response(&check("10.0.0.2:6001")?, now)?)?;
    assert_eq!(a.connection_state(), ConnectionState::Connected);
    assert_eq!(selected(&a), Some("10.0.0.2:6001".parse()?));

    // a better pair answering inside the window takes over
    now += Duration::from_millis(100);
    a.handle_timeout(now)?;
    a.handle_read(success_response(&check("10.0.0.2:6003")?, now)?)?;
    assert_eq!(selected(&a), Some("10.0.0.2:6003".parse()?));

    // the best pair answers too late
    now += DEFAULT_NOMINATION_WINDOW;
    a.handle_timeout(now)?;
    a.handle_read(success_response(&check("10.0.0.2:6005")?, now)?)?;
    assert_eq!(selected(&a), Some("10.0.0.2:6003".parse()?));

    let changes = drain_events(&mut a)
        .into_iter()
        .filter(|e| matches!(e, Event::SelectedCandidatePairChange(_, _)))
        .count();
    assert_eq!(changes, 2);

    Ok(())
}

#[test]
fn test_triggered_check_keeps_checklist_order() -> Result<()> {
    init_log();
    let mut now = Instant::now();
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), now)?;
    let mut b = Agent::new(
        AgentConfig {
            initial_rto: Some(Duration::from_secs(10)),
            ..config(false, B_UFRAG, B_PWD)
        },
        now,
    )?;
    gather(&mut a, A_ADDR, TransportProtocol::UDP)?;
    for c in gather(&mut b, B_ADDR, TransportProtocol::UDP)? {
        a.add_remote_candidate(c)?;
    }
    // b knows the address a checks from, and a better one at the head of its checklist
    b.set_remote_credentials(A_UFRAG.to_owned(), A_PWD.to_owned())?;
    b.add_remote_candidate(remote_host(100, A_ADDR)?)?;
    b.add_remote_candidate(remote_host(900, "10.0.0.1:5009")?)?;
    a.start_connectivity_checks(true, B_UFRAG.to_owned(), B_PWD.to_owned())?;
    b.start_connectivity_checks(false, A_UFRAG.to_owned(), A_PWD.to_owned())?;

    // a's check arrives before b has probed anything
    a.handle_timeout(now)?;
    let inbound = a.poll_write().ok_or(Error::ErrNoCandidatePairs)?;
    deliver(&mut b, inbound)?;

    let mut probed: Vec<SocketAddr> = vec![];
    let end = now + Duration::from_millis(300);
    while now < end {
        b.handle_timeout(now)?;
        while let Some(transmit) = b.poll_write() {
            let mut m = Message::new();
            if m.unmarshal_binary(&transmit.message).is_ok() && m.typ == BINDING_REQUEST {
                probed.push(transmit.transport.peer_addr);
            }
        }
        now += Duration::from_millis(10);
    }

    let expected: Vec<SocketAddr> = vec!["10.0.0.1:5009".parse()?, A_ADDR.parse()?];
    assert_eq!(probed, expected);

    Ok(())
}

#[test]
fn test_role_conflict_resolution() -> Result<()> {
    let mut now = Instant::now();
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), now)?;
    let mut b = Agent::new(config(true, B_UFRAG, B_PWD), now)?;

    connect(&mut a, &mut b, &mut now)?;

    assert_ne!(a.is_controlling(), b.is_controlling());
    assert_eq!(a.connection_state(), ConnectionState::Connected);
    assert_eq!(b.connection_state(), ConnectionState::Connected);

    Ok(())
}

#[test]
fn test_peer_reflexive_candidate_learned() -> Result<()> {
    let mut now = Instant::now();
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), now)?;
    let mut b = Agent::new(config(false, B_UFRAG, B_PWD), now)?;

    let a_candidates = gather(&mut a, A_ADDR, TransportProtocol::UDP)?;
    gather(&mut b, B_ADDR, TransportProtocol::UDP)?;
    for c in a_candidates {
        b.add_remote_candidate(c)?;
    }
    a.start_connectivity_checks(true, B_UFRAG.to_owned(), B_PWD.to_owned())?;
    b.start_connectivity_checks(false, A_UFRAG.to_owned(), A_PWD.to_owned())?;

    run(&mut a, &mut b, &mut now, Duration::from_secs(1))?;

    let remotes = a.get_remote_candidates();
    assert_eq!(remotes.len(), 1);
    assert_eq!(remotes[0].candidate_type(), CandidateType::PeerReflexive);
    assert_eq!(remotes[0].addr(), B_ADDR.parse::<SocketAddr>()?);
    assert_eq!(a.connection_state(), ConnectionState::Connected);
    assert_eq!(b.connection_state(), ConnectionState::Connected);

    Ok(())
}

#[test]
fn test_remote_candidates_queued_until_credentials() -> Result<()> {
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), Instant::now())?;
    gather(&mut a, A_ADDR, TransportProtocol::UDP)?;

    a.add_remote_candidate(remote_host(100, B_ADDR)?)?;
    a.add_remote_candidate(remote_host(100, B_ADDR)?)?;
    assert!(a.get_remote_candidates().is_empty());
    assert!(a.get_candidate_pairs().is_empty());

    assert_eq!(
        a.set_remote_credentials(String::new(), B_PWD.to_owned()),
        Err(Error::ErrRemoteUfragEmpty)
    );
    a.set_remote_credentials(B_UFRAG.to_owned(), B_PWD.to_owned())?;
    assert_eq!(a.get_remote_candidates().len(), 1);
    assert_eq!(a.get_candidate_pairs().len(), 1);

    Ok(())
}

#[test]
fn test_pending_remote_candidates_are_bounded() -> Result<()> {
    init_log();
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), Instant::now())?;
    gather(&mut a, A_ADDR, TransportProtocol::UDP)?;

    for i in 0..MAX_PENDING_REMOTE_CANDIDATES + 10 {
        let addr = format!("10.0.1.{}:{}", i % 200 + 1, 7000 + i);
        a.add_remote_candidate(remote_host(100, &addr)?)?;
    }
    assert!(a.get_remote_candidates().is_empty());

    a.set_remote_credentials(B_UFRAG.to_owned(), B_PWD.to_owned())?;
    assert_eq!(
        a.get_remote_candidates().len(),
        MAX_PENDING_REMOTE_CANDIDATES
    );

    // the cap only applies while credentials are missing
    a.add_remote_candidate(remote_host(100, "10.0.2.1:9000")?)?;
    assert_eq!(
        a.get_remote_candidates().len(),
        MAX_PENDING_REMOTE_CANDIDATES + 1
    );
    Ok(())
}

#[test]
fn test_mdns_candidate_ignored() -> Result<()> {
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), Instant::now())?;
    a.set_remote_credentials(B_UFRAG.to_owned(), B_PWD.to_owned())?;

    let c = unmarshal_candidate(
        "candidate:1 1 udp 2130706431 e2b3c3d1-0cf4-4b5d-9c8e-8b0f6a0e7a11.local 6000 typ host",
    );
    // an unresolvable hostname may already be refused while parsing
    if let Ok(c) = c {
        a.add_remote_candidate(c)?;
    }
    assert!(a.get_remote_candidates().is_empty());

    Ok(())
}

#[test]
fn test_gather_server_reflexive() -> Result<()> {
    let now = Instant::now();
    let mut a = Agent::new(
        AgentConfig {
            urls: vec![Url::parse_url("stun:1.2.3.4:3478")?],
            ..config(true, A_UFRAG, A_PWD)
        },
        now,
    )?;
    a.add_local_address(A_ADDR.parse()?, TransportProtocol::UDP)?;
    a.gather_candidates()?;
    assert_eq!(a.gathering_state(), GatheringState::Gathering);

    let events = drain_events(&mut a);
    assert!(events.iter().any(|e| matches!(e, Event::LocalCandidate(Some(c)) if c.candidate_type() == CandidateType::Host)));
    assert!(!events.iter().any(|e| matches!(e, Event::LocalCandidate(None))));

    let transmit = a.poll_write().ok_or(Error::ErrNoCandidatePairs)?;
    let server: SocketAddr = "1.2.3.4:3478".parse()?;
    assert_eq!(transmit.transport.peer_addr, server);
    let mut request = Message::new();
    request.unmarshal_binary(&transmit.message)?;
    assert_eq!(request.typ, BINDING_REQUEST);

    let mut response = Message::new();
    response.build(&[
        Box::new(request.clone()),
        Box::new(BINDING_SUCCESS),
        Box::new(XorMappedAddress {
            ip: "5.6.7.8".parse()?,
            port: 9000,
        }),
    ])?;
    a.handle_read(TransportMessage {
        now,
        transport: TransportContext {
            local_addr: A_ADDR.parse()?,
            peer_addr: server,
            transport_protocol: TransportProtocol::UDP,
        },
        message: BytesMut::from(&response.raw[..]),
    })?;

    let events = drain_events(&mut a);
    let srflx = events.iter().find_map(|e| match e {
        Event::LocalCandidate(Some(c)) => Some(c.clone()),
        _ => None,
    });
    let srflx = srflx.ok_or(Error::ErrNoCandidatePairs)?;
    assert_eq!(srflx.candidate_type(), CandidateType::ServerReflexive);
    assert_eq!(srflx.addr(), "5.6.7.8:9000".parse::<SocketAddr>()?);
    assert_eq!(srflx.url(), Some("stun:1.2.3.4:3478"));
    assert!(events.iter().any(|e| matches!(e, Event::LocalCandidate(None))));
    assert_eq!(a.gathering_state(), GatheringState::Complete);

    Ok(())
}

#[test]
fn test_gather_completes_when_server_is_silent() -> Result<()> {
    let mut now = Instant::now();
    let mut a = Agent::new(
        AgentConfig {
            urls: vec![Url::parse_url("stun:1.2.3.4:3478")?],
            ..config(true, A_UFRAG, A_PWD)
        },
        now,
    )?;
    gather(&mut a, A_ADDR, TransportProtocol::UDP)?;
    assert_eq!(a.gathering_state(), GatheringState::Gathering);

    let mut requests = 0;
    drive(
        &mut a,
        &mut now,
        |a| a.gathering_state() == GatheringState::Complete,
        |_| requests += 1,
    )?;

    assert_eq!(a.gathering_state(), GatheringState::Complete);
    assert!(requests > 1);
    assert_eq!(a.get_local_candidates().len(), 1);
    assert!(
        drain_events(&mut a)
            .iter()
            .any(|e| matches!(e, Event::LocalCandidate(None)))
    );

    Ok(())
}

#[test]
fn test_restart_resets_checks_and_counters() -> Result<()> {
    let mut now = Instant::now();
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), now)?;
    let mut b = Agent::new(config(false, B_UFRAG, B_PWD), now)?;
    connect(&mut a, &mut b, &mut now)?;
    assert!(!a.get_candidate_pairs_stats().is_empty());
    drain_events(&mut a);

    a.restart(String::new(), String::new(), false)?;

    let (ufrag, pwd) = a.get_local_user_credentials();
    assert_ne!(ufrag, A_UFRAG);
    assert_ne!(pwd, A_PWD);
    assert_eq!(ufrag.len(), 16);
    assert_eq!(pwd.len(), 32);
    assert_eq!(a.get_remote_user_credentials(), ("", ""));
    assert!(a.get_remote_candidates().is_empty());
    assert!(a.get_candidate_pairs_stats().is_empty());
    assert!(a.get_selected_candidate_pair().is_none());
    assert_eq!(a.connection_state(), ConnectionState::Checking);

    // host candidates are gathered again
    assert_eq!(a.get_local_candidates().len(), 1);
    assert_eq!(a.gathering_state(), GatheringState::Complete);
    let events = drain_events(&mut a);
    assert!(events.iter().any(|e| matches!(e, Event::LocalCandidate(Some(_)))));
    assert!(events.iter().any(|e| matches!(e, Event::LocalCandidate(None))));

    Ok(())
}

#[test]
fn test_consent_loss_disconnects_then_fails() -> Result<()> {
    let mut now = Instant::now();
    let timing = |c: AgentConfig| AgentConfig {
        keepalive_interval: Some(Duration::from_secs(1)),
        disconnected_timeout: Some(Duration::from_secs(2)),
        failed_timeout: Some(Duration::from_secs(4)),
        ..c
    };
    let mut a = Agent::new(timing(config(true, A_UFRAG, A_PWD)), now)?;
    let mut b = Agent::new(timing(config(false, B_UFRAG, B_PWD)), now)?;
    connect(&mut a, &mut b, &mut now)?;
    assert_eq!(a.connection_state(), ConnectionState::Connected);
    drain_events(&mut a);

    // b goes away
    let mut consent_requests = 0;
    drive(
        &mut a,
        &mut now,
        |a| a.connection_state() == ConnectionState::Failed,
        |transmit| {
            let mut m = Message::new();
            if m.unmarshal_binary(&transmit.message).is_ok() && m.typ == BINDING_REQUEST {
                consent_requests += 1;
            }
        },
    )?;

    assert!(consent_requests >= 2);
    let states: Vec<String> = drain_events(&mut a)
        .into_iter()
        .filter_map(|e| match e {
            Event::ConnectionStateChange(s) => Some(s.to_string()),
            Event::RestartNeeded => Some("restart".to_owned()),
            _ => None,
        })
        .collect();
    assert_eq!(
        states,
        vec![
            ConnectionState::Disconnected.to_string(),
            "restart".to_owned(),
            ConnectionState::Failed.to_string(),
        ]
    );

    Ok(())
}

#[test]
fn test_tcp_passive_answers_framed_requests() -> Result<()> {
    let now = Instant::now();
    let local: SocketAddr = "10.0.0.1:9000".parse()?;
    let peer: SocketAddr = "10.0.0.2:50123".parse()?;

    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), now)?;
    let candidates = gather(&mut a, "10.0.0.1:9000", TransportProtocol::TCP)?;
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].tcp_type(), crate::tcp_type::TcpType::Passive);
    a.set_remote_credentials(B_UFRAG.to_owned(), B_PWD.to_owned())?;

    let mut request = Message::new();
    request.build(&[
        Box::new(BINDING_REQUEST),
        Box::new(TransactionId::new()),
        Box::new(Username::new(ATTR_USERNAME, format!("{A_UFRAG}:{B_UFRAG}"))),
        Box::new(AttrControlled(1)),
        Box::new(PriorityAttr(1_845_501_695)),
        Box::new(MessageIntegrity::new_short_term_integrity(A_PWD.to_owned())),
        Box::new(FINGERPRINT),
    ])?;
    let framed = frame_packet(&request.raw)?;

    // the frame arrives in two segments
    let (first, second) = framed.split_at(5);
    for segment in [first, second] {
        a.handle_read(TransportMessage {
            now,
            transport: TransportContext {
                local_addr: local,
                peer_addr: peer,
                transport_protocol: TransportProtocol::TCP,
            },
            message: BytesMut::from(segment),
        })?;
    }

    let transmit = a.poll_write().ok_or(Error::ErrNoCandidatePairs)?;
    assert_eq!(transmit.transport.transport_protocol, TransportProtocol::TCP);
    assert_eq!(transmit.transport.peer_addr, peer);

    let mut decoder = TcpFrameDecoder::new();
    decoder.extend_from_slice(&transmit.message);
    let packet = decoder.next_packet().ok_or(Error::ErrNoCandidatePairs)?;
    assert!(decoder.is_empty());

    let mut response = Message::new();
    response.unmarshal_binary(&packet)?;
    assert_eq!(response.typ, BINDING_SUCCESS);
    assert_eq!(response.transaction_id, request.transaction_id);

    let remotes = a.get_remote_candidates();
    assert_eq!(remotes.len(), 1);
    assert_eq!(remotes[0].candidate_type(), CandidateType::PeerReflexive);
    assert!(remotes[0].network_type().is_tcp());

    Ok(())
}

#[test]
fn test_close() -> Result<()> {
    let mut now = Instant::now();
    let mut a = Agent::new(config(true, A_UFRAG, A_PWD), now)?;
    let mut b = Agent::new(config(false, B_UFRAG, B_PWD), now)?;
    connect(&mut a, &mut b, &mut now)?;
    drain_events(&mut a);

    a.close()?;
    assert_eq!(a.connection_state(), ConnectionState::Closed);
    a.close()?;

    let events = drain_events(&mut a);
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        Event::ConnectionStateChange(ConnectionState::Closed)
    ));

    assert_eq!(
        a.add_remote_candidate(remote_host(100, B_ADDR)?),
        Err(Error::ErrClosed)
    );
    assert_eq!(
        a.handle_write(BytesMut::from(&b"late"[..])),
        Err(Error::ErrClosed)
    );
    assert!(a.poll_timeout().is_none());

    Ok(())
}
