use super::*;
use log::trace;
use shared::tcp_framing::frame_packet;
use shared::{TransportContext, TransportMessage};
use turn::client::RelayedAddr;

/// How bytes leave through a local candidate.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CandidateTransport {
    /// Plain datagrams from the candidate address.
    Udp,
    /// RFC 4571 framed packets over the owner's TCP connection.
    Tcp,
    /// TURN Send indications through the allocation of this relayed address.
    Relay(RelayedAddr),
}

impl CandidateTransport {
    pub(crate) fn transport_protocol(&self) -> Option<TransportProtocol> {
        match self {
            CandidateTransport::Udp => Some(TransportProtocol::UDP),
            CandidateTransport::Tcp => Some(TransportProtocol::TCP),
            CandidateTransport::Relay(_) => None,
        }
    }
}

impl From<TransportProtocol> for CandidateTransport {
    fn from(transport_protocol: TransportProtocol) -> Self {
        match transport_protocol {
            TransportProtocol::UDP => CandidateTransport::Udp,
            TransportProtocol::TCP => CandidateTransport::Tcp,
        }
    }
}

impl Agent {
    /// Sends `buf` to `peer_addr` from the local candidate, addressed the way its
    /// transport requires.
    pub(crate) fn send_to(
        &mut self,
        local_index: usize,
        peer_addr: SocketAddr,
        buf: &[u8],
    ) -> Result<()> {
        let local_addr = self.local_candidates[local_index].addr();
        match self.local_transports[local_index] {
            CandidateTransport::Udp => {
                self.transmits.push_back(TransportMessage {
                    now: self.now,
                    transport: TransportContext {
                        local_addr,
                        peer_addr,
                        transport_protocol: TransportProtocol::UDP,
                    },
                    message: BytesMut::from(buf),
                });
            }
            CandidateTransport::Tcp => {
                let framed = frame_packet(buf)?;
                self.transmits.push_back(TransportMessage {
                    now: self.now,
                    transport: TransportContext {
                        local_addr,
                        peer_addr,
                        transport_protocol: TransportProtocol::TCP,
                    },
                    message: framed,
                });
            }
            CandidateTransport::Relay(relayed_addr) => {
                let gatherer = self
                    .gatherers
                    .iter_mut()
                    .find(|g| g.relayed_addr == Some(relayed_addr))
                    .ok_or(Error::ErrRelayNotFound)?;
                gatherer.client.relay(relayed_addr)?.send_to(buf, peer_addr)?;
                self.drain_gatherers();
            }
        }

        self.local_candidates[local_index].seen(true, self.now);
        Ok(())
    }

    pub(crate) fn send_stun(&mut self, msg: &[u8], local_index: usize, remote_index: usize) {
        let peer_addr = self.remote_candidates[remote_index].addr();
        if let Err(err) = self.send_to(local_index, peer_addr, msg) {
            warn!(
                "[{}]: failed to send STUN to {}: {}",
                self.get_name(),
                peer_addr,
                err
            );
        }
    }

    /// Sends application data over the selected pair.
    pub(crate) fn send_application_data(&mut self, buf: &[u8]) -> Result<()> {
        if self.closed {
            return Err(Error::ErrClosed);
        }
        let pair_index = self
            .selected_pair
            .ok_or(Error::ErrNoSelectedCandidatePair)?;
        let (local_index, remote_index) = {
            let p = &self.candidate_pairs[pair_index];
            (p.local_index, p.remote_index)
        };

        let peer_addr = self.remote_candidates[remote_index].addr();
        self.send_to(local_index, peer_addr, buf)?;

        let now = self.now;
        self.candidate_pairs[pair_index].on_packet_sent(buf.len(), now);
        Ok(())
    }

    /// Routes a datagram (or TCP segment) received by the owner.
    pub(crate) fn handle_inbound_transport_message(&mut self, msg: TaggedBytesMut) -> Result<()> {
        if msg.now > self.now {
            self.now = msg.now;
        }

        let transport = msg.transport;
        if transport.transport_protocol == TransportProtocol::UDP
            && let Some(gatherer) = self.gatherers.iter_mut().find(|g| {
                g.client.local_addr() == transport.local_addr
                    && g.client.is_server_addr(&transport.peer_addr)
            })
        {
            let result = sansio::Protocol::handle_read(&mut gatherer.client, msg);
            self.drain_gatherers();
            self.prune_gatherers();
            if let Err(err) = result {
                warn!(
                    "[{}]: discard message from server {}: {}",
                    self.get_name(),
                    transport.peer_addr,
                    err
                );
            }
            return Ok(());
        }

        let Some(local_index) =
            self.find_local_candidate(transport.local_addr, transport.transport_protocol)
        else {
            warn!(
                "[{}]: Discarded message, not a valid local candidate from {:?}:{}",
                self.get_name(),
                transport.transport_protocol,
                transport.local_addr,
            );
            return Err(Error::ErrUnhandledStunPacket);
        };

        match transport.transport_protocol {
            TransportProtocol::UDP => {
                self.handle_inbound_candidate_msg(local_index, &msg.message, transport.peer_addr);
            }
            TransportProtocol::TCP => {
                let mut packets = vec![];
                {
                    let decoder = self
                        .tcp_decoders
                        .entry(FourTuple::from(&transport))
                        .or_default();
                    decoder.extend_from_slice(&msg.message);
                    while let Some(packet) = decoder.next_packet() {
                        packets.push(packet);
                    }
                }
                for packet in packets {
                    self.handle_inbound_candidate_msg(local_index, &packet, transport.peer_addr);
                }
            }
        }

        Ok(())
    }

    pub(crate) fn handle_inbound_candidate_msg(
        &mut self,
        local_index: usize,
        buf: &[u8],
        src_addr: SocketAddr,
    ) {
        if is_message(buf) {
            let mut m = Message::new();
            if let Err(err) = m.unmarshal_binary(buf) {
                warn!(
                    "[{}]: Failed to handle decode ICE from {} to {}: {}",
                    self.get_name(),
                    src_addr,
                    self.local_candidates[local_index].addr(),
                    err
                );
            } else {
                self.handle_inbound(&mut m, local_index, src_addr);
            }
        } else if let Some(remote_index) = self.find_remote_candidate(local_index, src_addr) {
            let now = self.now;
            self.remote_candidates[remote_index].seen(false, now);
            if let Some(pair_index) = self.find_pair(local_index, remote_index) {
                self.candidate_pairs[pair_index].on_packet_received(buf.len(), now);
            }

            trace!(
                "[{}]: {} bytes of application data from {}",
                self.get_name(),
                buf.len(),
                src_addr
            );
            let local = &self.local_candidates[local_index];
            self.reads.push_back(TransportMessage {
                now,
                transport: TransportContext {
                    local_addr: local.addr(),
                    peer_addr: src_addr,
                    transport_protocol: local.network_type().transport_protocol(),
                },
                message: BytesMut::from(buf),
            });
        } else {
            warn!(
                "[{}]: Discarded message from {}, not a valid remote candidate",
                self.get_name(),
                src_addr
            );
        }
    }
}
