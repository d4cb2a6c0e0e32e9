
use std::fmt;

use shared::error::{Error, Result};

/// Codec represents a codec
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Codec {
    pub payload_type: u8,
    pub name: String,
    pub clock_rate: u32,
    pub encoding_parameters: String,
    pub fmtp: String,
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}/{}/{} ({})",
            self.payload_type, self.name, self.clock_rate, self.encoding_parameters, self.fmtp,
        )
    }
}

/// Parses the value of an `a=rtpmap:` attribute,
/// `<payload type> <encoding name>/<clock rate>[/<encoding parameters>]`.
pub(crate) fn parse_rtpmap(rtpmap: &str) -> Result<Codec> {
    let (payload_type, encoding) = rtpmap
        .split_once(' ')
        .ok_or_else(|| Error::SdpInvalidValue(rtpmap.to_owned()))?;

    let payload_type = payload_type
        .parse::<u8>()
        .map_err(|_| Error::SdpInvalidValue(rtpmap.to_owned()))?;

    let split: Vec<&str> = encoding.split('/').collect();
    let name = split[0].trim().to_owned();
    let clock_rate = if split.len() > 1 {
        split[1]
            .parse::<u32>()
            .map_err(|_| Error::SdpInvalidValue(rtpmap.to_owned()))?
    } else {
        0
    };
    let encoding_parameters = if split.len() > 2 {
        split[2].to_owned()
    } else {
        String::new()
    };

    Ok(Codec {
        payload_type,
        name,
        clock_rate,
        encoding_parameters,
        ..Default::default()
    })
}
