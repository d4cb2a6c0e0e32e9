use log::{debug, warn};
use std::time::{Duration, Instant};

use stun::attributes::*;
use stun::error_code::*;
use stun::fingerprint::*;
use stun::integrity::*;
use stun::message::*;
use stun::textattrs::*;

use super::permission::*;
use super::transaction::*;
use crate::proto;

use crate::client::{Client, Event, PeerAddr, RelayedAddr};
use shared::error::{Error, Result};

const PERM_REFRESH_INTERVAL: Duration = Duration::from_secs(120);

// RelayState is the per-allocation state kept by the client
pub(crate) struct RelayState {
    pub(crate) relayed_addr: RelayedAddr,
    pub(crate) integrity: MessageIntegrity,
    pub(crate) nonce: Nonce,
    pub(crate) lifetime: Duration,
    perm_map: PermissionMap,
    refresh_alloc_timer: Instant,
    refresh_perms_timer: Instant,
    closing: bool,
}

impl RelayState {
    pub(crate) fn new(
        relayed_addr: RelayedAddr,
        integrity: MessageIntegrity,
        nonce: Nonce,
        lifetime: Duration,
        now: Instant,
    ) -> Self {
        debug!("initial lifetime: {} seconds", lifetime.as_secs());

        Self {
            relayed_addr,
            integrity,
            nonce,
            lifetime,
            perm_map: PermissionMap::new(),
            refresh_alloc_timer: now + lifetime / 2,
            refresh_perms_timer: now + PERM_REFRESH_INTERVAL,
            closing: false,
        }
    }

    pub(crate) fn set_nonce_from_msg(&mut self, msg: &Message) {
        match Nonce::get_from_as(msg, ATTR_NONCE) {
            Ok(nonce) => {
                self.nonce = nonce;
                debug!("refresh allocation: 438, got new nonce.");
            }
            Err(_) => warn!("refresh allocation: 438 but no nonce."),
        }
    }
}

/// Relay is a handle onto one allocation of the client.
pub struct Relay<'a> {
    pub(crate) relayed_addr: RelayedAddr,
    pub(crate) client: &'a mut Client,
}

impl Relay<'_> {
    pub fn relayed_addr(&self) -> RelayedAddr {
        self.relayed_addr
    }

    /// create_permission installs a permission for the peer IP unless one is
    /// already requested or permitted.
    pub fn create_permission(&mut self, peer_addr: PeerAddr) -> Result<()> {
        let idle = {
            let relay = self
                .client
                .relays
                .get_mut(&self.relayed_addr)
                .ok_or(Error::ErrRelayNotFound)?;
            if !relay.perm_map.contains(&peer_addr) {
                relay.perm_map.insert(peer_addr, Permission::default());
            }
            relay
                .perm_map
                .get(&peer_addr)
                .is_some_and(|perm| perm.state() == PermState::Idle)
        };

        if idle {
            self.create_permissions(&[peer_addr])?;
        }
        Ok(())
    }

    /// has_permission reports whether the server acknowledged a permission for the peer IP.
    pub fn has_permission(&self, peer_addr: &PeerAddr) -> bool {
        self.client
            .relays
            .get(&self.relayed_addr)
            .and_then(|relay| relay.perm_map.get(peer_addr))
            .is_some_and(|perm| perm.state() == PermState::Permitted)
    }

    pub(crate) fn poll_timeout(&self) -> Option<Instant> {
        let relay = self.client.relays.get(&self.relayed_addr)?;
        if relay.closing {
            None
        } else {
            Some(relay.refresh_alloc_timer.min(relay.refresh_perms_timer))
        }
    }

    pub(crate) fn handle_timeout(&mut self, now: Instant) -> Result<()> {
        let (refresh_alloc, refresh_perms) = {
            let relay = self
                .client
                .relays
                .get_mut(&self.relayed_addr)
                .ok_or(Error::ErrRelayNotFound)?;
            if relay.closing {
                return Ok(());
            }

            let refresh_alloc = if relay.refresh_alloc_timer <= now {
                relay.refresh_alloc_timer = now + relay.lifetime / 2;
                Some(relay.lifetime)
            } else {
                None
            };

            let refresh_perms = if relay.refresh_perms_timer <= now {
                relay.refresh_perms_timer = now + PERM_REFRESH_INTERVAL;
                true
            } else {
                false
            };

            (refresh_alloc, refresh_perms)
        };

        if let Some(lifetime) = refresh_alloc {
            self.refresh_allocation(lifetime)?;
        }
        if refresh_perms {
            self.refresh_permissions()?;
        }
        Ok(())
    }

    /// send_to relays p to the peer with a Send indication. A permission is
    /// requested on first use; the server drops data until it is installed.
    pub fn send_to(&mut self, p: &[u8], peer_addr: PeerAddr) -> Result<()> {
        if !self.client.relays.contains_key(&self.relayed_addr) {
            return Err(Error::ErrRelayNotFound);
        }
        self.create_permission(peer_addr)?;

        let mut msg = Message::new();
        msg.build(&[
            Box::new(TransactionId::new()),
            Box::new(MessageType::new(METHOD_SEND, CLASS_INDICATION)),
            Box::new(proto::data::Data(p.to_vec())),
            Box::new(proto::peeraddr::PeerAddress::from(peer_addr)),
            Box::new(FINGERPRINT),
        ])?;

        // indication has no transaction (fire-and-forget)
        let turn_server_addr = self.client.turn_server_addr()?;
        self.client.write_to(&msg.raw, turn_server_addr);
        Ok(())
    }

    /// close releases the allocation by refreshing it with a zero lifetime.
    pub fn close(&mut self) -> Result<()> {
        if let Some(relay) = self.client.relays.get_mut(&self.relayed_addr) {
            relay.closing = true;
        }
        self.refresh_allocation(Duration::from_secs(0))
    }

    fn create_permissions(&mut self, peer_addrs: &[PeerAddr]) -> Result<()> {
        let (username, realm) = (self.client.username(), self.client.realm());
        let turn_server_addr = self.client.turn_server_addr()?;
        let relay = self
            .client
            .relays
            .get_mut(&self.relayed_addr)
            .ok_or(Error::ErrRelayNotFound)?;

        let mut setters: Vec<Box<dyn Setter>> = vec![
            Box::new(TransactionId::new()),
            Box::new(MessageType::new(METHOD_CREATE_PERMISSION, CLASS_REQUEST)),
        ];
        for addr in peer_addrs {
            setters.push(Box::new(proto::peeraddr::PeerAddress::from(*addr)));
            if let Some(perm) = relay.perm_map.get_mut(addr)
                && perm.state() == PermState::Idle
            {
                perm.set_state(PermState::Requested);
            }
        }
        setters.push(Box::new(username));
        setters.push(Box::new(realm));
        setters.push(Box::new(relay.nonce.clone()));
        setters.push(Box::new(relay.integrity.clone()));
        setters.push(Box::new(FINGERPRINT));

        let mut msg = Message::new();
        msg.build(&setters)?;

        self.client.perform_transaction(
            &msg,
            turn_server_addr,
            TransactionType::CreatePermissionRequest(self.relayed_addr, peer_addrs.to_vec()),
        );
        Ok(())
    }

    pub(super) fn handle_create_permission_response(
        &mut self,
        res: Message,
        peer_addrs: Vec<PeerAddr>,
    ) -> Result<()> {
        let relay = self
            .client
            .relays
            .get_mut(&self.relayed_addr)
            .ok_or(Error::ErrRelayNotFound)?;

        if res.typ.class == CLASS_ERROR_RESPONSE {
            let mut code = ErrorCodeAttribute::default();
            let err = if code.get_from(&res).is_err() {
                Error::Other(format!("{}", res.typ))
            } else if code.code == CODE_STALE_NONCE {
                relay.set_nonce_from_msg(&res);
                Error::ErrTryAgain
            } else {
                Error::Other(format!("{} (error {})", res.typ, code))
            };
            let retry = err == Error::ErrTryAgain;
            for peer_addr in &peer_addrs {
                if retry {
                    if let Some(perm) = relay.perm_map.get_mut(peer_addr) {
                        perm.set_state(PermState::Idle);
                    }
                } else {
                    relay.perm_map.delete(peer_addr);
                }
            }
            if retry {
                return self.create_permissions(&peer_addrs);
            }
            self.client
                .events
                .push_back(Event::CreatePermissionError(res.transaction_id, err));
        } else {
            for peer_addr in peer_addrs {
                if let Some(perm) = relay.perm_map.get_mut(&peer_addr) {
                    perm.set_state(PermState::Permitted);
                    self.client
                        .events
                        .push_back(Event::CreatePermissionResponse(res.transaction_id, peer_addr));
                }
            }
        }

        Ok(())
    }

    fn refresh_allocation(&mut self, lifetime: Duration) -> Result<()> {
        let (username, realm) = (self.client.username(), self.client.realm());
        let turn_server_addr = self.client.turn_server_addr()?;
        let relay = self
            .client
            .relays
            .get(&self.relayed_addr)
            .ok_or(Error::ErrRelayNotFound)?;

        let mut msg = Message::new();
        msg.build(&[
            Box::new(TransactionId::new()),
            Box::new(MessageType::new(METHOD_REFRESH, CLASS_REQUEST)),
            Box::new(proto::lifetime::Lifetime(lifetime)),
            Box::new(username),
            Box::new(realm),
            Box::new(relay.nonce.clone()),
            Box::new(relay.integrity.clone()),
            Box::new(FINGERPRINT),
        ])?;

        self.client.perform_transaction(
            &msg,
            turn_server_addr,
            TransactionType::RefreshRequest(self.relayed_addr),
        );
        Ok(())
    }

    pub(super) fn handle_refresh_allocation_response(&mut self, res: Message) -> Result<()> {
        let relay = self
            .client
            .relays
            .get_mut(&self.relayed_addr)
            .ok_or(Error::ErrRelayNotFound)?;

        if res.typ.class == CLASS_ERROR_RESPONSE {
            let mut code = ErrorCodeAttribute::default();
            if code.get_from(&res).is_err() {
                Err(Error::Other(format!("{}", res.typ)))
            } else if code.code == CODE_STALE_NONCE {
                relay.set_nonce_from_msg(&res);
                let lifetime = if relay.closing {
                    Duration::from_secs(0)
                } else {
                    relay.lifetime
                };
                self.refresh_allocation(lifetime)
            } else {
                Err(Error::Other(format!("{} (error {})", res.typ, code)))
            }
        } else if relay.closing {
            debug!("allocation {} released", self.relayed_addr);
            self.client.relays.remove(&self.relayed_addr);
            Ok(())
        } else {
            let mut updated_lifetime = proto::lifetime::Lifetime::default();
            updated_lifetime.get_from(&res)?;

            relay.lifetime = updated_lifetime.0;
            debug!("updated lifetime: {} seconds", relay.lifetime.as_secs());
            Ok(())
        }
    }

    fn refresh_permissions(&mut self) -> Result<()> {
        let addrs = match self.client.relays.get(&self.relayed_addr) {
            Some(relay) => relay.perm_map.addrs(),
            None => return Err(Error::ErrRelayNotFound),
        };
        if addrs.is_empty() {
            debug!("no permission to refresh");
            return Ok(());
        }
        self.create_permissions(&addrs)
    }
}

