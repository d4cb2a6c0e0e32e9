//! Transport tunables that sit outside the W3C configuration dictionary.
//!
//! `SettingEngine` controls the pacing and timeouts of the ICE agent, the
//! automatic ICE restart budget, data channel backpressure and the
//! retransmission bounds of the association carrying data channels.
//!
//! ```
//! use rtc::peer_connection::configuration::setting_engine::SettingEngine;
//! use std::time::Duration;
//!
//! let mut setting_engine = SettingEngine::default();
//! setting_engine.set_ice_timeouts(
//!     Some(Duration::from_secs(10)), // disconnected_timeout (default: 5s)
//!     Some(Duration::from_secs(30)), // failed_timeout (default: 25s)
//!     Some(Duration::from_secs(3)),  // keepalive_interval (default: 2s)
//! );
//! setting_engine.set_max_ice_restarts(1);
//! ```

use ice::agent::agent_config::AgentConfig;
use sctp::{TimerConfig, TransportConfig};
use shared::error::{Error, Result};
use std::time::Duration;

/// Equal to UDP MTU
pub(crate) const RECEIVE_MTU: usize = 1460;

/// Number of automatic ICE restarts before the connection is declared failed.
pub(crate) const DEFAULT_MAX_ICE_RESTARTS: u32 = 3;

/// ICE timeout configuration for connection health monitoring.
#[derive(Default, Debug, Clone)]
pub struct Timeout {
    /// Duration without network activity before ICE is considered disconnected.
    /// Default: 5 seconds.
    pub ice_disconnected_timeout: Option<Duration>,

    /// Duration without network activity before ICE is considered failed.
    /// Default: 25 seconds.
    pub ice_failed_timeout: Option<Duration>,

    /// How often ICE sends keepalive/consent checks on the selected pair.
    /// Default: 2 seconds.
    pub ice_keepalive_interval: Option<Duration>,
}

/// Pacing of the connectivity check scheduler.
#[derive(Default, Debug, Clone)]
pub struct Checks {
    /// Interval between two new checks. Default: 50 ms.
    pub check_interval: Option<Duration>,
    /// Upper bound of checks waiting for a response. Default: 5.
    pub max_in_flight_checks: Option<usize>,
    /// Retransmission timeout of the first transmission. Default: 100 ms.
    pub initial_rto: Option<Duration>,
    /// Growth factor of the retransmission timeout. Default: 2.0.
    pub backoff_multiplier: Option<f64>,
    /// Transmissions of one check before the pair fails. Default: 7.
    pub max_binding_requests: Option<u16>,
    /// How long a strictly better pair may replace the first selected one.
    /// Default: 500 ms.
    pub nomination_window: Option<Duration>,
}

/// Fixed ICE credentials, mostly useful for reproducible tests.
#[derive(Default, Debug, Clone)]
pub struct Candidates {
    pub username_fragment: String,
    pub password: String,
}

/// Advanced configuration engine for fine-tuning transport behavior.
#[derive(Debug, Clone)]
pub struct SettingEngine {
    pub(crate) timeout: Timeout,
    pub(crate) checks: Checks,
    pub(crate) candidates: Candidates,
    pub(crate) max_ice_restarts: u32,
    pub(crate) data_channel_high_water_mark: usize,
    pub(crate) sctp_timer_config: TimerConfig,
    pub(crate) sctp_max_message_size: u32,
    pub(crate) receive_mtu: usize,
}

impl Default for SettingEngine {
    fn default() -> Self {
        Self {
            timeout: Timeout::default(),
            checks: Checks::default(),
            candidates: Candidates::default(),
            max_ice_restarts: DEFAULT_MAX_ICE_RESTARTS,
            data_channel_high_water_mark: datachannel::data_channel::DEFAULT_HIGH_WATER_MARK,
            sctp_timer_config: TimerConfig::default(),
            sctp_max_message_size: TransportConfig::default().max_message_size(),
            receive_mtu: RECEIVE_MTU,
        }
    }
}

impl SettingEngine {
    /// Sets the disconnected/failed timeouts and the keepalive interval of the agent.
    pub fn set_ice_timeouts(
        &mut self,
        disconnected_timeout: Option<Duration>,
        failed_timeout: Option<Duration>,
        keepalive_interval: Option<Duration>,
    ) {
        self.timeout.ice_disconnected_timeout = disconnected_timeout;
        self.timeout.ice_failed_timeout = failed_timeout;
        self.timeout.ice_keepalive_interval = keepalive_interval;
    }

    /// Sets the pacing of connectivity checks.
    pub fn set_ice_check_pacing(
        &mut self,
        check_interval: Option<Duration>,
        max_in_flight_checks: Option<usize>,
    ) {
        self.checks.check_interval = check_interval;
        self.checks.max_in_flight_checks = max_in_flight_checks;
    }

    /// Sets the retransmission schedule of a single connectivity check.
    pub fn set_ice_retransmission(
        &mut self,
        initial_rto: Option<Duration>,
        backoff_multiplier: Option<f64>,
        max_binding_requests: Option<u16>,
    ) {
        self.checks.initial_rto = initial_rto;
        self.checks.backoff_multiplier = backoff_multiplier;
        self.checks.max_binding_requests = max_binding_requests;
    }

    pub fn set_ice_nomination_window(&mut self, nomination_window: Option<Duration>) {
        self.checks.nomination_window = nomination_window;
    }

    /// Sets a fixed local username fragment and password. They must carry at
    /// least 24 and 128 bits of randomness respectively.
    pub fn set_ice_credentials(&mut self, username_fragment: String, password: String) {
        self.candidates.username_fragment = username_fragment;
        self.candidates.password = password;
    }

    /// Bounds the automatic ICE restarts done by the controlling side.
    pub fn set_max_ice_restarts(&mut self, max_ice_restarts: u32) {
        self.max_ice_restarts = max_ice_restarts;
    }

    /// Sets the buffered amount above which data channel sends fail with BufferFull.
    pub fn set_data_channel_high_water_mark(&mut self, high_water_mark: usize) {
        self.data_channel_high_water_mark = high_water_mark;
    }

    /// Sets the retransmission timeout bounds of the association.
    pub fn set_sctp_rto(
        &mut self,
        rto_initial: Duration,
        rto_min: Duration,
        rto_max: Duration,
    ) -> Result<()> {
        if rto_min > rto_max || rto_initial < rto_min || rto_initial > rto_max {
            return Err(Error::Other(format!(
                "invalid rto bounds: initial {rto_initial:?} min {rto_min:?} max {rto_max:?}"
            )));
        }
        self.sctp_timer_config.rto_initial = rto_initial;
        self.sctp_timer_config.rto_min = rto_min;
        self.sctp_timer_config.rto_max = rto_max;
        Ok(())
    }

    /// Sets the largest message the association accepts, advertised with
    /// `a=max-message-size`.
    pub fn set_sctp_max_message_size(&mut self, max_message_size: u32) {
        self.sctp_max_message_size = max_message_size;
    }

    pub fn set_receive_mtu(&mut self, receive_mtu: usize) {
        self.receive_mtu = receive_mtu;
    }

    /// Copies the ICE tunables into an agent configuration.
    pub(crate) fn apply_to_agent_config(&self, config: &mut AgentConfig) {
        config.local_ufrag = self.candidates.username_fragment.clone();
        config.local_pwd = self.candidates.password.clone();
        config.check_interval = self.checks.check_interval;
        config.max_in_flight_checks = self.checks.max_in_flight_checks;
        config.initial_rto = self.checks.initial_rto;
        config.backoff_multiplier = self.checks.backoff_multiplier;
        config.max_binding_requests = self.checks.max_binding_requests;
        config.nomination_window = self.checks.nomination_window;
        config.keepalive_interval = self.timeout.ice_keepalive_interval;
        config.disconnected_timeout = self.timeout.ice_disconnected_timeout;
        config.failed_timeout = self.timeout.ice_failed_timeout;
    }

    /// Builds the association configuration for the negotiated remote port.
    pub(crate) fn sctp_transport_config(&self, sctp_port: u16) -> TransportConfig {
        TransportConfig::default()
            .with_sctp_port(sctp_port)
            .with_max_message_size(self.sctp_max_message_size)
            .with_timer_config(self.sctp_timer_config)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_setting_engine_defaults() {
        let s = SettingEngine::default();
        assert_eq!(s.max_ice_restarts, 3);
        assert_eq!(s.data_channel_high_water_mark, 16 * 1024 * 1024);
        assert_eq!(s.sctp_max_message_size, 262144);
    }

    #[test]
    fn test_setting_engine_agent_config() {
        let mut s = SettingEngine::default();
        s.set_ice_timeouts(
            Some(Duration::from_secs(1)),
            Some(Duration::from_secs(2)),
            Some(Duration::from_millis(500)),
        );
        s.set_ice_check_pacing(Some(Duration::from_millis(20)), Some(3));
        s.set_ice_credentials("abcdefgh".to_owned(), "0123456789abcdef0123".to_owned());

        let mut config = AgentConfig::default();
        s.apply_to_agent_config(&mut config);
        assert_eq!(config.disconnected_timeout, Some(Duration::from_secs(1)));
        assert_eq!(config.failed_timeout, Some(Duration::from_secs(2)));
        assert_eq!(config.keepalive_interval, Some(Duration::from_millis(500)));
        assert_eq!(config.check_interval, Some(Duration::from_millis(20)));
        assert_eq!(config.max_in_flight_checks, Some(3));
        assert_eq!(config.local_ufrag, "abcdefgh");
    }

    #[test]
    fn test_setting_engine_sctp_rto_bounds() {
        let mut s = SettingEngine::default();
        assert!(
            s.set_sctp_rto(
                Duration::from_millis(200),
                Duration::from_millis(100),
                Duration::from_secs(2)
            )
            .is_ok()
        );
        assert_eq!(s.sctp_timer_config.rto_initial, Duration::from_millis(200));
        assert!(
            s.set_sctp_rto(
                Duration::from_secs(5),
                Duration::from_millis(100),
                Duration::from_secs(2)
            )
            .is_err()
        );
    }
}
