use super::*;

impl sansio::Protocol<TaggedBytesMut, BytesMut, ()> for Agent {
    type Rout = TaggedBytesMut;
    type Wout = TaggedBytesMut;
    type Eout = Event;
    type Error = Error;
    type Time = Instant;

    /// Consumes a datagram or TCP segment received on one of the local addresses.
    /// STUN traffic is processed internally, application data shows up in `poll_read`.
    fn handle_read(&mut self, msg: TaggedBytesMut) -> std::result::Result<(), Self::Error> {
        if self.closed {
            return Err(Error::ErrClosed);
        }
        self.handle_inbound_transport_message(msg)
    }

    fn poll_read(&mut self) -> Option<Self::Rout> {
        self.reads.pop_front()
    }

    /// Sends application data over the selected candidate pair.
    fn handle_write(&mut self, msg: BytesMut) -> std::result::Result<(), Self::Error> {
        self.send_application_data(&msg)
    }

    fn poll_write(&mut self) -> Option<Self::Wout> {
        self.transmits.pop_front()
    }

    fn handle_event(&mut self, _evt: ()) -> std::result::Result<(), Self::Error> {
        Ok(())
    }

    fn poll_event(&mut self) -> Option<Self::Eout> {
        self.events.pop_front()
    }

    fn handle_timeout(&mut self, now: Self::Time) -> std::result::Result<(), Self::Error> {
        if now > self.now {
            self.now = now;
        }
        self.gatherers_handle_timeout(self.now);
        if self.closed {
            return Ok(());
        }

        self.retransmit_binding_requests();

        if self.checks_started
            && self.connection_state != ConnectionState::Failed
            && self.has_pending_checks()
            && self
                .last_check
                .is_none_or(|last| self.now >= last + self.check_interval)
        {
            self.last_check = Some(self.now);
            self.contact_candidates();
        }

        self.check_checking_timeout();
        self.validate_selected_pair();
        self.check_keepalive();

        Ok(())
    }

    fn poll_timeout(&mut self) -> Option<Self::Time> {
        let gatherers = self.gatherers_poll_timeout();
        if self.closed {
            return gatherers;
        }

        match (gatherers, self.selector_poll_timeout()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    fn close(&mut self) -> std::result::Result<(), Self::Error> {
        Agent::close(self)
    }
}
