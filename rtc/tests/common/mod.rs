//! Two peer connections wired through an in-memory network driven by a
//! simulated clock.

#![allow(dead_code)]

use anyhow::{Result, anyhow};
use rtc::peer_connection::RTCPeerConnection;
use rtc::peer_connection::configuration::RTCConfigurationBuilder;
use rtc::peer_connection::configuration::setting_engine::SettingEngine;
use rtc::peer_connection::event::RTCPeerConnectionEvent;
use rtc::peer_connection::message::RTCMessage;
use rtc::peer_connection::state::{RTCIceConnectionState, RTCPeerConnectionState};
use rtc::signaling::SignalingMessage;
use sansio::Protocol;
use shared::{TaggedBytesMut, TransportContext, TransportProtocol};
use std::time::{Duration, Instant};

pub const STEP: Duration = Duration::from_millis(10);

pub fn init_log() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init()
        .ok();
}

pub struct Peer {
    pub name: &'static str,
    pub pc: RTCPeerConnection,
    pub events: Vec<RTCPeerConnectionEvent>,
    pub messages: Vec<RTCMessage>,
    /// signaling messages waiting to be delivered to the other peer
    pub outbox: Vec<String>,
}

impl Peer {
    pub fn new(name: &'static str, addr: &str, setting_engine: SettingEngine) -> Result<Self> {
        let config = RTCConfigurationBuilder::new()
            .with_setting_engine(setting_engine)
            .build();
        let mut pc = RTCPeerConnection::new(config)?;
        pc.add_local_address(addr.parse()?, TransportProtocol::UDP)?;
        Ok(Self {
            name,
            pc,
            events: vec![],
            messages: vec![],
            outbox: vec![],
        })
    }

    pub fn ice_connection_state(&self) -> RTCIceConnectionState {
        self.pc.ice_connection_state()
    }

    pub fn connection_state(&self) -> RTCPeerConnectionState {
        self.pc.connection_state()
    }

    pub fn saw(&self, evt: &RTCPeerConnectionEvent) -> bool {
        self.events.contains(evt)
    }

    pub fn count(&self, evt: &RTCPeerConnectionEvent) -> usize {
        self.events.iter().filter(|e| *e == evt).count()
    }

    pub fn text_messages(&self) -> Vec<String> {
        self.messages
            .iter()
            .filter_map(|m| match m {
                RTCMessage::DataChannelMessage(_, msg) if msg.is_string => {
                    Some(String::from_utf8_lossy(&msg.data).into_owned())
                }
                _ => None,
            })
            .collect()
    }

    /// Drains events and inbound data. Trickled candidates are queued as
    /// signaling messages for the other peer.
    fn poll(&mut self) -> Result<()> {
        while let Some(evt) = self.pc.poll_event() {
            log::debug!("{}: {evt:?}", self.name);
            if let RTCPeerConnectionEvent::OnIceCandidateEvent(ice_event) = &evt
                && let Some(candidate) = &ice_event.candidate
            {
                self.outbox
                    .push(SignalingMessage::from(candidate).to_json()?);
            }
            self.events.push(evt);
        }
        while let Some(message) = self.pc.poll_read() {
            self.messages.push(message);
        }
        Ok(())
    }

    fn on_signaling(&mut self, json: &str) -> Result<()> {
        if self.pc.connection_state() == RTCPeerConnectionState::Closed {
            return Ok(());
        }
        match SignalingMessage::from_json(json)? {
            msg @ SignalingMessage::Candidate { .. } => {
                self.pc.add_ice_candidate(msg.to_candidate()?)?;
            }
            msg @ (SignalingMessage::Offer { .. } | SignalingMessage::Answer { .. }) => {
                self.pc.set_remote_description(msg.to_description()?)?;
            }
            SignalingMessage::Bye => self.pc.close()?,
        }
        Ok(())
    }
}

pub struct Network {
    pub now: Instant,
    pub offerer: Peer,
    pub answerer: Peer,
    /// drops every datagram while set
    pub partitioned: bool,
    /// datagrams delivered so far
    pub delivered: usize,
}

impl Network {
    pub fn new(offerer_engine: SettingEngine, answerer_engine: SettingEngine) -> Result<Self> {
        Ok(Self {
            now: Instant::now(),
            offerer: Peer::new("offerer", "10.0.0.1:5000", offerer_engine)?,
            answerer: Peer::new("answerer", "10.0.0.2:6000", answerer_engine)?,
            partitioned: false,
            delivered: 0,
        })
    }

    /// Runs one offer/answer exchange through JSON signaling messages.
    pub fn negotiate(&mut self) -> Result<()> {
        let offer = self.offerer.pc.create_offer(None)?;
        self.offerer.pc.set_local_description(offer.clone())?;
        let offer_json = SignalingMessage::try_from(&offer)?.to_json()?;
        self.answerer.on_signaling(&offer_json)?;

        let answer = self.answerer.pc.create_answer(None)?;
        self.answerer.pc.set_local_description(answer.clone())?;
        let answer_json = SignalingMessage::try_from(&answer)?.to_json()?;
        self.offerer.on_signaling(&answer_json)?;
        Ok(())
    }

    /// Advances the clock by one step and exchanges everything pending.
    pub fn step(&mut self) -> Result<()> {
        self.now += STEP;
        self.offerer.pc.handle_timeout(self.now)?;
        self.answerer.pc.handle_timeout(self.now)?;

        loop {
            let mut idle = true;
            while let Some(datagram) = self.offerer.pc.poll_write() {
                idle = false;
                self.deliver(true, datagram)?;
            }
            while let Some(datagram) = self.answerer.pc.poll_write() {
                idle = false;
                self.deliver(false, datagram)?;
            }

            self.offerer.poll()?;
            self.answerer.poll()?;
            for json in std::mem::take(&mut self.offerer.outbox) {
                idle = false;
                self.answerer.on_signaling(&json)?;
            }
            for json in std::mem::take(&mut self.answerer.outbox) {
                idle = false;
                self.offerer.on_signaling(&json)?;
            }

            if idle {
                return Ok(());
            }
        }
    }

    fn deliver(&mut self, from_offerer: bool, datagram: TaggedBytesMut) -> Result<()> {
        if self.partitioned {
            return Ok(());
        }
        self.delivered += 1;
        let to = if from_offerer {
            &mut self.answerer
        } else {
            &mut self.offerer
        };
        if to.pc.ice_connection_state() == RTCIceConnectionState::Closed {
            return Ok(());
        }
        to.pc.handle_read(TaggedBytesMut {
            now: self.now,
            transport: TransportContext {
                local_addr: datagram.transport.peer_addr,
                peer_addr: datagram.transport.local_addr,
                transport_protocol: datagram.transport.transport_protocol,
            },
            message: datagram.message,
        })?;
        Ok(())
    }

    /// Steps until `done` holds, failing after `limit` of simulated time.
    pub fn run_until(&mut self, limit: Duration, done: impl Fn(&Network) -> bool) -> Result<()> {
        let deadline = self.now + limit;
        while self.now < deadline {
            self.step()?;
            if done(self) {
                return Ok(());
            }
        }
        Err(anyhow!(
            "not done after {limit:?}: offerer {} / answerer {}",
            self.offerer.ice_connection_state(),
            self.answerer.ice_connection_state()
        ))
    }

    pub fn run_for(&mut self, duration: Duration) -> Result<()> {
        let end = self.now + duration;
        while self.now < end {
            self.step()?;
        }
        Ok(())
    }
}
