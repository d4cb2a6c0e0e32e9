use std::time::Duration;

/// Initial MTU for outgoing packets
pub(crate) const INITIAL_MTU: u32 = 1228;
pub(crate) const INITIAL_RECV_BUF_SIZE: u32 = 1024 * 1024;
/// Marker byte plus the SCTP common header
pub(crate) const COMMON_HEADER_SIZE: usize = 13;
pub(crate) const DATA_CHUNK_HEADER_SIZE: u32 = 16;
pub(crate) const DEFAULT_MAX_MESSAGE_SIZE: u32 = 262144;
pub(crate) const DEFAULT_SCTP_PORT: u16 = 5000;

pub(crate) const RTO_INITIAL: Duration = Duration::from_secs(1);
pub(crate) const RTO_MIN: Duration = Duration::from_secs(1);
pub(crate) const RTO_MAX: Duration = Duration::from_secs(60);
pub(crate) const MAX_INIT_RETRANSMITS: usize = 8;

/// Retransmission timer settings (RFC 4960 section 15)
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TimerConfig {
    pub rto_initial: Duration,
    pub rto_min: Duration,
    pub rto_max: Duration,
    /// Transmissions of INIT and SHUTDOWN before the association gives up.
    pub max_init_retransmits: usize,
    /// Retransmissions of one DATA chunk before the association is aborted,
    /// `None` retries forever.
    pub max_data_retransmits: Option<usize>,
}

impl Default for TimerConfig {
    fn default() -> Self {
        TimerConfig {
            rto_initial: RTO_INITIAL,
            rto_min: RTO_MIN,
            rto_max: RTO_MAX,
            max_init_retransmits: MAX_INIT_RETRANSMITS,
            max_data_retransmits: None,
        }
    }
}

/// Config collects the arguments to create_association construction into
/// a single structure
#[derive(Debug, Clone)]
pub struct TransportConfig {
    sctp_port: u16,
    mtu: u32,
    max_receive_buffer_size: u32,
    max_message_size: u32,
    max_num_outbound_streams: u16,
    max_num_inbound_streams: u16,
    timer_config: TimerConfig,
}

impl Default for TransportConfig {
    fn default() -> Self {
        TransportConfig {
            sctp_port: DEFAULT_SCTP_PORT,
            mtu: INITIAL_MTU,
            max_receive_buffer_size: INITIAL_RECV_BUF_SIZE,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            max_num_outbound_streams: u16::MAX,
            max_num_inbound_streams: u16::MAX,
            timer_config: TimerConfig::default(),
        }
    }
}

impl TransportConfig {
    pub fn with_sctp_port(mut self, value: u16) -> Self {
        self.sctp_port = value;
        self
    }

    pub fn with_mtu(mut self, value: u32) -> Self {
        self.mtu = value;
        self
    }

    pub fn with_max_receive_buffer_size(mut self, value: u32) -> Self {
        self.max_receive_buffer_size = value;
        self
    }

    pub fn with_max_message_size(mut self, value: u32) -> Self {
        self.max_message_size = value;
        self
    }

    pub fn with_max_num_outbound_streams(mut self, value: u16) -> Self {
        self.max_num_outbound_streams = value;
        self
    }

    pub fn with_max_num_inbound_streams(mut self, value: u16) -> Self {
        self.max_num_inbound_streams = value;
        self
    }

    pub fn with_timer_config(mut self, value: TimerConfig) -> Self {
        self.timer_config = value;
        self
    }

    pub fn sctp_port(&self) -> u16 {
        self.sctp_port
    }

    pub fn mtu(&self) -> u32 {
        self.mtu
    }

    pub fn max_receive_buffer_size(&self) -> u32 {
        self.max_receive_buffer_size
    }

    pub fn max_message_size(&self) -> u32 {
        self.max_message_size
    }

    pub fn max_num_outbound_streams(&self) -> u16 {
        self.max_num_outbound_streams
    }

    pub fn max_num_inbound_streams(&self) -> u16 {
        self.max_num_inbound_streams
    }

    pub fn timer_config(&self) -> TimerConfig {
        self.timer_config
    }

    /// Largest DATA chunk payload that fits in one packet, padding included.
    pub(crate) fn max_payload_size(&self) -> u32 {
        (self.mtu.saturating_sub(COMMON_HEADER_SIZE as u32 + DATA_CHUNK_HEADER_SIZE) & !3).max(4)
    }
}
