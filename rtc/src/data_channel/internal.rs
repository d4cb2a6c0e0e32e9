use crate::data_channel::RTCDataChannelId;
use crate::data_channel::init::RTCDataChannelInit;
use crate::data_channel::state::RTCDataChannelState;
use bytes::BytesMut;
use datachannel::message::message_channel_open::CHANNEL_PRIORITY_NORMAL;
use datachannel::{DataChannel, DataChannelConfig};
use log::warn;
use sctp::PayloadProtocolIdentifier;
use shared::error::{Error, Result};

#[derive(Debug, Clone)]
pub(crate) struct RTCDataChannelInternal {
    pub(crate) id: RTCDataChannelId,
    /// Assigned when the association comes up unless negotiated out-of-band.
    pub(crate) stream_id: Option<u16>,
    pub(crate) label: String,
    pub(crate) protocol: String,
    pub(crate) ordered: bool,
    pub(crate) max_packet_life_time: Option<u16>,
    pub(crate) max_retransmits: Option<u16>,
    pub(crate) negotiated: bool,
    pub(crate) ready_state: RTCDataChannelState,
    pub(crate) buffered_amount_low_threshold: usize,
    pub(crate) high_water_mark: usize,

    pub(crate) data_channel: Option<DataChannel>,
}

impl RTCDataChannelInternal {
    /// create the DataChannel object before the networking is set up.
    pub(crate) fn new(
        id: RTCDataChannelId,
        label: &str,
        options: RTCDataChannelInit,
        high_water_mark: usize,
    ) -> Result<Self> {
        if options.max_packet_life_time.is_some() && options.max_retransmits.is_some() {
            return Err(Error::ErrRetransmitsOrPacketLifeTime);
        }
        let protocol = options.protocol.unwrap_or_default();
        if protocol.len() > 65535 {
            return Err(Error::ErrProtocolTooLarge);
        }
        if label.len() > 65535 {
            return Err(Error::ErrStringSizeLimit);
        }

        Ok(Self {
            id,
            stream_id: options.negotiated,
            label: label.to_owned(),
            protocol,
            ordered: options.ordered.unwrap_or(true),
            max_packet_life_time: options.max_packet_life_time,
            max_retransmits: options.max_retransmits,
            negotiated: options.negotiated.is_some(),
            ready_state: RTCDataChannelState::Connecting,
            buffered_amount_low_threshold: 0,
            high_water_mark,
            data_channel: None,
        })
    }

    pub(crate) fn config(&self) -> Result<DataChannelConfig> {
        let (channel_type, reliability_parameter) =
            DataChannel::get_channel_type_and_reliability_parameter(
                self.ordered,
                self.max_retransmits,
                self.max_packet_life_time,
            )?;

        Ok(DataChannelConfig {
            channel_type,
            negotiated: self.negotiated,
            priority: CHANNEL_PRIORITY_NORMAL,
            reliability_parameter,
            label: self.label.clone(),
            protocol: self.protocol.clone(),
        })
    }

    /// Opens the channel on `stream_id`. Negotiated channels are open at once,
    /// others once the peer acknowledges the DATA_CHANNEL_OPEN.
    pub(crate) fn dial(&mut self, stream_id: u16) -> Result<()> {
        let mut data_channel = DataChannel::dial(self.config()?, stream_id)?;
        data_channel.set_buffered_amount_low_threshold(self.buffered_amount_low_threshold);
        data_channel.set_high_water_mark(self.high_water_mark);

        self.stream_id = Some(stream_id);
        self.data_channel = Some(data_channel);
        Ok(())
    }

    /// Creates the channel announced by a DATA_CHANNEL_OPEN from the peer.
    pub(crate) fn accept(
        id: RTCDataChannelId,
        stream_id: u16,
        ppi: PayloadProtocolIdentifier,
        buf: &[u8],
        high_water_mark: usize,
    ) -> Result<Self> {
        let mut data_channel =
            DataChannel::accept(DataChannelConfig::default(), stream_id, ppi, buf)?;
        data_channel.set_high_water_mark(high_water_mark);

        let config = data_channel.config();
        let (unordered, reliability_type) = DataChannel::get_reliability_params(config.channel_type);
        let (max_retransmits, max_packet_life_time) = match reliability_type {
            sctp::ReliabilityType::Rexmit => (Some(config.reliability_parameter as u16), None),
            sctp::ReliabilityType::Timed => (None, Some(config.reliability_parameter as u16)),
            sctp::ReliabilityType::Reliable => (None, None),
        };

        Ok(Self {
            id,
            stream_id: Some(stream_id),
            label: config.label.clone(),
            protocol: config.protocol.clone(),
            ordered: !unordered,
            max_packet_life_time,
            max_retransmits,
            negotiated: false,
            ready_state: RTCDataChannelState::Connecting,
            buffered_amount_low_threshold: 0,
            high_water_mark,
            data_channel: Some(data_channel),
        })
    }

    pub(crate) fn send(&mut self, is_string: bool, data: BytesMut) -> Result<()> {
        match self.data_channel.as_mut() {
            Some(data_channel) => data_channel.send(is_string, data),
            None if self.ready_state == RTCDataChannelState::Closed => {
                Err(Error::ErrDataChannelClosed)
            }
            None => Err(Error::ErrDataChannelNotOpen),
        }
    }

    pub(crate) fn buffered_amount(&self) -> usize {
        self.data_channel
            .as_ref()
            .map_or(0, |data_channel| data_channel.buffered_amount())
    }

    pub(crate) fn set_buffered_amount_low_threshold(&mut self, threshold: usize) {
        self.buffered_amount_low_threshold = threshold;
        if let Some(data_channel) = self.data_channel.as_mut() {
            data_channel.set_buffered_amount_low_threshold(threshold);
        }
    }

    /// Marks the channel closed without waiting for the stream reset, used
    /// when the association or the peer connection goes away. Returns false
    /// if it already was.
    pub(crate) fn force_closed(&mut self) -> bool {
        if self.ready_state == RTCDataChannelState::Closed {
            return false;
        }
        self.ready_state = RTCDataChannelState::Closed;
        if let Some(data_channel) = self.data_channel.as_mut() {
            if let Err(err) =
                sansio::Protocol::handle_event(data_channel, datachannel::StreamEvent::Closed)
            {
                warn!("data channel {} close got error: {}", self.id, err);
            }
            while sansio::Protocol::poll_event(data_channel).is_some() {}
        }
        true
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use datachannel::message::message_channel_open::ChannelType;

    #[test]
    fn test_data_channel_internal_options() -> Result<()> {
        let dc = RTCDataChannelInternal::new(
            0,
            "chat",
            RTCDataChannelInit {
                ordered: Some(false),
                max_retransmits: Some(3),
                ..Default::default()
            },
            1024,
        )?;
        let config = dc.config()?;
        assert_eq!(
            config.channel_type,
            ChannelType::PartialReliableRexmitUnordered
        );
        assert_eq!(config.reliability_parameter, 3);
        assert_eq!(dc.stream_id, None);

        let result = RTCDataChannelInternal::new(
            1,
            "chat",
            RTCDataChannelInit {
                max_retransmits: Some(3),
                max_packet_life_time: Some(1000),
                ..Default::default()
            },
            1024,
        );
        assert_eq!(result.err(), Some(Error::ErrRetransmitsOrPacketLifeTime));
        Ok(())
    }

    #[test]
    fn test_data_channel_internal_send_before_open() -> Result<()> {
        let mut dc = RTCDataChannelInternal::new(0, "chat", RTCDataChannelInit::default(), 1024)?;
        assert_eq!(
            dc.send(true, BytesMut::from("hello")),
            Err(Error::ErrDataChannelNotOpen)
        );

        assert!(dc.force_closed());
        assert!(!dc.force_closed());
        assert_eq!(
            dc.send(true, BytesMut::from("hello")),
            Err(Error::ErrDataChannelClosed)
        );
        Ok(())
    }

    #[test]
    fn test_data_channel_internal_negotiated() -> Result<()> {
        let mut dc = RTCDataChannelInternal::new(
            0,
            "pre",
            RTCDataChannelInit {
                negotiated: Some(7),
                ..Default::default()
            },
            8,
        )?;
        assert_eq!(dc.stream_id, Some(7));
        dc.dial(7)?;

        // negotiated channels open without DCEP
        dc.send(false, BytesMut::from(&b"1234"[..]))?;
        assert_eq!(dc.buffered_amount(), 4);
        assert_eq!(
            dc.send(false, BytesMut::from(&b"12345"[..])),
            Err(Error::ErrBufferFull)
        );
        assert_eq!(dc.buffered_amount(), 4);
        Ok(())
    }

    #[test]
    fn test_data_channel_internal_force_closed_closes_stream() -> Result<()> {
        let mut dc = RTCDataChannelInternal::new(
            0,
            "pre",
            RTCDataChannelInit {
                negotiated: Some(3),
                ..Default::default()
            },
            1024,
        )?;
        dc.dial(3)?;
        assert_eq!(
            dc.data_channel.as_ref().map(|d| d.state()),
            Some(datachannel::DataChannelState::Open)
        );

        assert!(dc.force_closed());
        assert_eq!(dc.ready_state, RTCDataChannelState::Closed);
        assert_eq!(
            dc.data_channel.as_ref().map(|d| d.state()),
            Some(datachannel::DataChannelState::Closed)
        );
        Ok(())
    }
}
