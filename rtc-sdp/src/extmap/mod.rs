
use std::{fmt, io};

use super::direction::*;
use crate::description::common::*;
use crate::lexer::*;
use shared::error::{Error, Result};

/// Default ext values
pub const DEF_EXT_MAP_VALUE_ABS_SEND_TIME: usize = 1;
pub const DEF_EXT_MAP_VALUE_TRANSPORT_CC: usize = 2;
pub const DEF_EXT_MAP_VALUE_SDES_MID: usize = 3;

pub const ABS_SEND_TIME_URI: &str = "http://www.webrtc.org/experiments/rtp-hdrext/abs-send-time";
pub const SDES_MID_URI: &str = "urn:ietf:params:rtp-hdrext:sdes:mid";
pub const AUDIO_LEVEL_URI: &str = "urn:ietf:params:rtp-hdrext:ssrc-audio-level";

/// ExtMap represents the activation of a single RTP header extension
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtMap {
    pub value: isize,
    pub direction: Direction,
    pub uri: String,
    pub ext_attr: Option<String>,
}

impl fmt::Display for ExtMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut output = format!("{}", self.value);
        if self.direction != Direction::Unspecified {
            output += format!("/{}", self.direction).as_str();
        }
        output += format!(" {}", self.uri).as_str();
        if let Some(ext_attr) = &self.ext_attr {
            output += format!(" {ext_attr}").as_str();
        }

        write!(f, "{output}")
    }
}

impl ExtMap {
    /// converts this object to an Attribute
    pub fn convert(&self) -> Attribute {
        Attribute::new("extmap".to_owned(), Some(self.to_string()))
    }

    /// unmarshal creates an Extmap from a string
    pub fn unmarshal<R: io::BufRead>(reader: &mut R) -> Result<Self> {
        let line = read_line(reader)?.ok_or(Error::SdpInvalidSyntax(String::new()))?;
        let Some(value) = line.value.strip_prefix("extmap:").filter(|_| line.key == b'a') else {
            return Err(Error::ParseExtMap(line.value));
        };

        let fields: Vec<&str> = value.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(Error::ParseExtMap(value.to_owned()));
        }

        let valdir: Vec<&str> = fields[0].split('/').collect();
        let ext_value = valdir[0]
            .parse::<isize>()
            .map_err(|_| Error::ParseExtMap(value.to_owned()))?;
        if !(1..=246).contains(&ext_value) {
            return Err(Error::ParseExtMap(format!(
                "{} -- extmap key must be in the range 1-246",
                valdir[0]
            )));
        }

        let mut direction = Direction::Unspecified;
        if valdir.len() == 2 {
            direction = Direction::new(valdir[1]);
            if direction == Direction::Unspecified {
                return Err(Error::ParseExtMap(format!(
                    "unknown direction from {}",
                    valdir[1]
                )));
            }
        }

        let ext_attr = if fields.len() == 3 {
            Some(fields[2].to_owned())
        } else {
            None
        };

        Ok(ExtMap {
            value: ext_value,
            direction,
            uri: fields[1].to_owned(),
            ext_attr,
        })
    }

    /// marshal creates a string from an ExtMap
    pub fn marshal(&self) -> String {
        format!("extmap:{self}")
    }
}
