
pub mod permission;
pub mod relay;
pub mod transaction;

use bytes::BytesMut;
use log::{debug, trace};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use stun::attributes::*;
use stun::error_code::*;
use stun::fingerprint::FINGERPRINT;
use stun::integrity::*;
use stun::message::*;
use stun::textattrs::*;
use stun::xoraddr::*;

use transaction::*;

use crate::client::relay::{Relay, RelayState};
use crate::proto::data::*;
use crate::proto::lifetime::Lifetime;
use crate::proto::peeraddr::*;
use crate::proto::relayaddr::RelayedAddress;
use crate::proto::reqtrans::RequestedTransport;
use crate::proto::{PROTO_TCP, PROTO_UDP};
use shared::error::{Error, Result};
use shared::util::lookup_host;
use shared::{TaggedBytesMut, TransportContext, TransportMessage, TransportProtocol};

const DEFAULT_RTO: Duration = Duration::from_millis(200);

pub type RelayedAddr = SocketAddr;
pub type ReflexiveAddr = SocketAddr;
pub type PeerAddr = SocketAddr;

#[derive(Debug)]
pub enum Event {
    TransactionTimeout(TransactionId),

    BindingResponse(TransactionId, ReflexiveAddr),
    BindingError(TransactionId, Error),

    AllocateResponse(TransactionId, RelayedAddr),
    AllocateError(TransactionId, Error),

    CreatePermissionResponse(TransactionId, PeerAddr),
    CreatePermissionError(TransactionId, Error),

    DataIndication(PeerAddr, BytesMut),
}

//              interval [msec]
// 0: 0 ms      +200
// 1: 200 ms    +400
// 2: 600 ms    +800
// 3: 1400 ms   +1600
// 4: 3000 ms   +1600
// 5: 4600 ms   +1600
// 6: 6200 ms   +1600
// -: 7800 ms   failed

/// ClientConfig is a bag of config parameters for Client.
pub struct ClientConfig {
    pub stun_serv_addr: String, // STUN server address (e.g. "stun.abc.com:3478")
    pub turn_serv_addr: String, // TURN server address (e.g. "turn.abc.com:3478")
    pub local_addr: SocketAddr,
    pub transport_protocol: TransportProtocol,
    pub username: String,
    pub password: String,
    pub realm: String,
    pub software: String,
    pub rto: Duration,
}

/// Client is a sans-IO STUN/TURN client bound to one local transport address.
pub struct Client {
    stun_serv_addr: Option<SocketAddr>,
    turn_serv_addr: Option<SocketAddr>,
    local_addr: SocketAddr,
    transport_protocol: TransportProtocol,
    username: Username,
    password: String,
    realm: Realm,
    integrity: MessageIntegrity,
    software: Software,
    tr_map: TransactionMap,
    rto: Duration,
    now: Instant,

    relays: HashMap<RelayedAddr, RelayState>,
    transmits: VecDeque<TaggedBytesMut>,
    events: VecDeque<Event>,
}

impl Client {
    /// new returns a new Client instance.
    pub fn new(config: ClientConfig, now: Instant) -> Result<Self> {
        let stun_serv_addr = if config.stun_serv_addr.is_empty() {
            None
        } else {
            Some(lookup_host(
                config.local_addr.is_ipv4(),
                config.stun_serv_addr.as_str(),
            )?)
        };

        let turn_serv_addr = if config.turn_serv_addr.is_empty() {
            None
        } else {
            Some(lookup_host(
                config.local_addr.is_ipv4(),
                config.turn_serv_addr.as_str(),
            )?)
        };

        Ok(Client {
            stun_serv_addr,
            turn_serv_addr,
            local_addr: config.local_addr,
            transport_protocol: config.transport_protocol,
            username: Username::new(ATTR_USERNAME, config.username),
            password: config.password,
            realm: Realm::new(ATTR_REALM, config.realm),
            software: Software::new(ATTR_SOFTWARE, config.software),
            tr_map: TransactionMap::new(),
            rto: if config.rto != Duration::ZERO {
                config.rto
            } else {
                DEFAULT_RTO
            },
            now,
            integrity: MessageIntegrity::new_short_term_integrity(String::new()),

            relays: HashMap::new(),
            transmits: VecDeque::new(),
            events: VecDeque::new(),
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// is_server_addr reports whether inbound traffic from addr belongs to this client.
    pub fn is_server_addr(&self, addr: &SocketAddr) -> bool {
        self.stun_serv_addr.as_ref() == Some(addr) || self.turn_serv_addr.as_ref() == Some(addr)
    }

    /// relayed_addrs lists the allocations currently held.
    pub fn relayed_addrs(&self) -> Vec<RelayedAddr> {
        self.relays.keys().copied().collect()
    }

    // handle_inbound demultiplexes a datagram received from a server.
    // Non-STUN traffic that does not come from the STUN server is left to the
    // caller as application data.
    fn handle_inbound(&mut self, data: &[u8], from: SocketAddr) -> Result<()> {
        if is_message(data) {
            self.handle_stun_message(data)
        } else if self.stun_serv_addr.as_ref() == Some(&from) {
            // received from STUN server, but it is not a STUN message
            Err(Error::ErrNonStunMessage)
        } else {
            trace!("non-STUN/TURN packet, unhandled");
            Ok(())
        }
    }

    fn handle_stun_message(&mut self, data: &[u8]) -> Result<()> {
        let mut msg = Message::new();
        msg.unmarshal_binary(data)?;

        if msg.typ.class == CLASS_REQUEST {
            return Err(Error::Other(format!(
                "{:?} : {}",
                Error::ErrUnexpectedStunRequestMessage,
                msg
            )));
        }

        if msg.typ.class == CLASS_INDICATION {
            if msg.typ.method == METHOD_DATA {
                let mut peer_addr = PeerAddress::default();
                peer_addr.get_from(&msg)?;
                let from = SocketAddr::new(peer_addr.ip, peer_addr.port);

                let mut data = Data::default();
                data.get_from(&msg)?;

                trace!("data indication received from {from}");

                self.events
                    .push_back(Event::DataIndication(from, BytesMut::from(&data.0[..])))
            }

            return Ok(());
        }

        // This is a STUN response message (transactional)
        let Some(tr) = self.tr_map.delete(&msg.transaction_id) else {
            // silently discard
            debug!("no transaction for {msg}");
            return Ok(());
        };

        match msg.typ.method {
            METHOD_BINDING => {
                if msg.typ.class == CLASS_ERROR_RESPONSE {
                    let err = error_from_response(&msg);
                    self.events
                        .push_back(Event::BindingError(tr.transaction_id, err));
                } else {
                    let mut refl_addr = XorMappedAddress::default();
                    match refl_addr.get_from(&msg) {
                        Ok(_) => {
                            self.events.push_back(Event::BindingResponse(
                                tr.transaction_id,
                                ReflexiveAddr::new(refl_addr.ip, refl_addr.port),
                            ));
                        }
                        Err(err) => {
                            self.events
                                .push_back(Event::BindingError(tr.transaction_id, err));
                        }
                    }
                }
            }
            METHOD_ALLOCATE => {
                self.handle_allocate_response(msg, tr.transaction_type)?;
            }
            METHOD_CREATE_PERMISSION => {
                if let TransactionType::CreatePermissionRequest(relayed_addr, peer_addrs) =
                    tr.transaction_type
                {
                    let mut relay = Relay {
                        relayed_addr,
                        client: self,
                    };
                    relay.handle_create_permission_response(msg, peer_addrs)?;
                }
            }
            METHOD_REFRESH => {
                if let TransactionType::RefreshRequest(relayed_addr) = tr.transaction_type {
                    let mut relay = Relay {
                        relayed_addr,
                        client: self,
                    };
                    relay.handle_refresh_allocation_response(msg)?;
                }
            }
            _ => {}
        }

        Ok(())
    }

    pub fn relay(&mut self, relayed_addr: RelayedAddr) -> Result<Relay<'_>> {
        if !self.relays.contains_key(&relayed_addr) {
            Err(Error::ErrRelayNotFound)
        } else {
            Ok(Relay {
                relayed_addr,
                client: self,
            })
        }
    }

    /// send_binding_request_to sends a new STUN request to the given transport address
    /// return key to find out corresponding Event either BindingResponse or TransactionTimeout
    pub fn send_binding_request_to(&mut self, to: SocketAddr) -> Result<TransactionId> {
        let msg = {
            let attrs: Vec<Box<dyn Setter>> = if !self.software.text.is_empty() {
                vec![
                    Box::new(TransactionId::new()),
                    Box::new(BINDING_REQUEST),
                    Box::new(self.software.clone()),
                ]
            } else {
                vec![Box::new(TransactionId::new()), Box::new(BINDING_REQUEST)]
            };

            let mut msg = Message::new();
            msg.build(&attrs)?;
            msg
        };

        Ok(self.perform_transaction(&msg, to, TransactionType::BindingRequest))
    }

    /// send_binding_request sends a new STUN request to the STUN server
    pub fn send_binding_request(&mut self) -> Result<TransactionId> {
        if let Some(stun_serv_addr) = self.stun_serv_addr {
            self.send_binding_request_to(stun_serv_addr)
        } else {
            Err(Error::ErrStunServerAddressNotSet)
        }
    }

    fn requested_transport(&self) -> RequestedTransport {
        RequestedTransport {
            protocol: if self.transport_protocol == TransportProtocol::UDP {
                PROTO_UDP
            } else {
                PROTO_TCP
            },
        }
    }

    /* https://datatracker.ietf.org/doc/html/rfc8656#section-20
    TURN                                 TURN
    client                               server
      |                                    |
      |--- Allocate request -------------->|
      |    REQUESTED-TRANSPORT=17 (UDP)    |
      |                                    |
      |<-- Allocate error response --------|
      |    ERROR-CODE=401 (Unauthorized)   |
      |    REALM="example.com"             |
      |    NONCE="obMatJos2gAAAadl7W7PeDU4hKE72jda"
      |                                    |
      |--- Allocate request -------------->|
      |    REQUESTED-TRANSPORT=17 (UDP)    |
      |    USERNAME="George"               |
      |    REALM="example.com"             |
      |    NONCE="obMatJos2gAAAadl7W7PeDU4hKE72jda"
      |    MESSAGE-INTEGRITY=...           |
      |                                    |
      |<-- Allocate success response ------|
      |    LIFETIME=1200 (20 minutes)      |
      |    XOR-RELAYED-ADDRESS=192.0.2.15:50000
      |    XOR-MAPPED-ADDRESS=192.0.2.1:7000
    */
    /// allocate sends a TURN allocation request to the TURN server
    pub fn allocate(&mut self) -> Result<TransactionId> {
        let mut msg = Message::new();
        msg.build(&[
            Box::new(TransactionId::new()),
            Box::new(MessageType::new(METHOD_ALLOCATE, CLASS_REQUEST)),
            Box::new(self.requested_transport()),
            Box::new(FINGERPRINT),
        ])?;

        let tid = self.perform_transaction(
            &msg,
            self.turn_server_addr()?,
            TransactionType::AllocateAttempt,
        );
        Ok(tid)
    }

    fn handle_allocate_response(
        &mut self,
        response: Message,
        allocate_state: TransactionType,
    ) -> Result<()> {
        match allocate_state {
            TransactionType::AllocateAttempt => {
                if response.typ.class == CLASS_SUCCESS_RESPONSE {
                    // server accepted an unauthenticated allocation
                    let nonce = Nonce::new(ATTR_NONCE, String::new());
                    return self.on_allocate_success(response, nonce);
                }

                let mut code = ErrorCodeAttribute::default();
                if code.get_from(&response).is_ok() && code.code != CODE_UNAUTHORIZED {
                    self.events.push_back(Event::AllocateError(
                        response.transaction_id,
                        error_from_response(&response),
                    ));
                    return Ok(());
                }

                // Anonymous allocate failed, trying to authenticate.
                let nonce = match Nonce::get_from_as(&response, ATTR_NONCE) {
                    Ok(nonce) => nonce,
                    Err(err) => {
                        self.events
                            .push_back(Event::AllocateError(response.transaction_id, err));
                        return Ok(());
                    }
                };
                self.realm = match Realm::get_from_as(&response, ATTR_REALM) {
                    Ok(realm) => realm,
                    Err(err) => {
                        self.events
                            .push_back(Event::AllocateError(response.transaction_id, err));
                        return Ok(());
                    }
                };

                self.integrity = MessageIntegrity::new_long_term_integrity(
                    self.username.text.clone(),
                    self.realm.text.clone(),
                    self.password.clone(),
                );

                let mut msg = Message::new();
                msg.build(&[
                    Box::new(TransactionId::new()),
                    Box::new(MessageType::new(METHOD_ALLOCATE, CLASS_REQUEST)),
                    Box::new(self.requested_transport()),
                    Box::new(self.username.clone()),
                    Box::new(self.realm.clone()),
                    Box::new(nonce.clone()),
                    Box::new(self.integrity.clone()),
                    Box::new(FINGERPRINT),
                ])?;

                debug!("allocate: retrying with long-term credentials");
                self.perform_transaction(
                    &msg,
                    self.turn_server_addr()?,
                    TransactionType::AllocateRequest(nonce),
                );
            }
            TransactionType::AllocateRequest(nonce) => {
                if response.typ.class == CLASS_ERROR_RESPONSE {
                    self.events.push_back(Event::AllocateError(
                        response.transaction_id,
                        error_from_response(&response),
                    ));
                    return Ok(());
                }
                self.on_allocate_success(response, nonce)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn on_allocate_success(&mut self, response: Message, nonce: Nonce) -> Result<()> {
        // Getting relayed addresses from response.
        let mut relayed = RelayedAddress::default();
        relayed.get_from(&response)?;
        let relayed_addr = RelayedAddr::new(relayed.ip, relayed.port);

        // Getting lifetime from response
        let mut lifetime = Lifetime::default();
        lifetime.get_from(&response)?;

        self.relays.insert(
            relayed_addr,
            RelayState::new(
                relayed_addr,
                self.integrity.clone(),
                nonce,
                lifetime.0,
                self.now,
            ),
        );
        self.events.push_back(Event::AllocateResponse(
            response.transaction_id,
            relayed_addr,
        ));
        Ok(())
    }

    /// turn_server_addr return the TURN server address
    fn turn_server_addr(&self) -> Result<SocketAddr> {
        self.turn_serv_addr.ok_or(Error::ErrTurnServerAddressNotSet)
    }

    fn username(&self) -> Username {
        self.username.clone()
    }

    fn realm(&self) -> Realm {
        self.realm.clone()
    }

    // write_to queues data for the given destination through the local address.
    fn write_to(&mut self, data: &[u8], remote: SocketAddr) {
        self.transmits.push_back(TransportMessage {
            now: self.now,
            transport: TransportContext {
                local_addr: self.local_addr,
                peer_addr: remote,
                transport_protocol: self.transport_protocol,
            },
            message: BytesMut::from(data),
        });
    }

    // perform_transaction sends msg and tracks it until a response or timeout
    fn perform_transaction(
        &mut self,
        msg: &Message,
        to: SocketAddr,
        transaction_type: TransactionType,
    ) -> TransactionId {
        let tr = Transaction::new(
            TransactionConfig {
                transaction_id: msg.transaction_id,
                transaction_type,
                raw: BytesMut::from(&msg.raw[..]),
                local_addr: self.local_addr,
                peer_addr: to,
                transport_protocol: self.transport_protocol,
                interval: self.rto,
            },
            self.now,
        );

        trace!(
            "start {} transaction {} to {}",
            msg.typ, msg.transaction_id, tr.peer_addr
        );
        self.tr_map.insert(msg.transaction_id, tr);

        self.write_to(&msg.raw, to);

        msg.transaction_id
    }
}

fn error_from_response(msg: &Message) -> Error {
    let mut code = ErrorCodeAttribute::default();
    if code.get_from(msg).is_err() {
        Error::ErrStunErrorResponse(format!("{}", msg.typ))
    } else {
        Error::ErrStunErrorResponse(format!("{} (error {})", msg.typ, code))
    }
}

impl sansio::Protocol<TaggedBytesMut, (), ()> for Client {
    type Rout = ();
    type Wout = TaggedBytesMut;
    type Eout = Event;
    type Error = Error;
    type Time = Instant;

    fn handle_read(&mut self, msg: TaggedBytesMut) -> std::result::Result<(), Self::Error> {
        if msg.now > self.now {
            self.now = msg.now;
        }
        self.handle_inbound(&msg.message[..], msg.transport.peer_addr)
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        None
    }

    fn handle_write(&mut self, _msg: ()) -> std::result::Result<(), Self::Error> {
        Ok(())
    }

    fn poll_write(&mut self) -> Option<Self::Wout> {
        while let Some(transmit) = self.tr_map.poll_transmit() {
            self.transmits.push_back(transmit);
        }
        self.transmits.pop_front()
    }

    fn handle_event(&mut self, _evt: ()) -> std::result::Result<(), Self::Error> {
        Ok(())
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        while let Some(event) = self.tr_map.poll_event() {
            self.events.push_back(event);
        }
        self.events.pop_front()
    }

    fn handle_timeout(&mut self, now: Instant) -> std::result::Result<(), Self::Error> {
        if now > self.now {
            self.now = now;
        }
        self.tr_map.handle_timeout(now);

        for relayed_addr in self.relayed_addrs() {
            let mut relay = Relay {
                relayed_addr,
                client: self,
            };
            relay.handle_timeout(now)?;
        }

        Ok(())
    }

    fn poll_timeout(&mut self) -> Option<Instant> {
        let mut eto = self.tr_map.poll_timeout();

        for relayed_addr in self.relayed_addrs() {
            let relay = Relay {
                relayed_addr,
                client: self,
            };
            if let Some(to) = relay.poll_timeout()
                && eto.is_none_or(|eto| to < eto)
            {
                eto = Some(to);
            }
        }

        eto
    }

    fn close(&mut self) -> std::result::Result<(), Self::Error> {
        for relayed_addr in self.relayed_addrs() {
            let mut relay = Relay {
                relayed_addr,
                client: self,
            };
            relay.close()?;
        }
        Ok(())
    }
}
