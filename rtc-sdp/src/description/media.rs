use std::fmt;

use super::common::*;
use super::session::*;
use crate::extmap::*;
use crate::lexer::*;
use crate::util::*;
use shared::error::{Error, Result};

/// Constants for extmap key
pub const EXT_MAP_VALUE_TRANSPORT_CC_KEY: isize = 3;
pub const EXT_MAP_VALUE_TRANSPORT_CC_URI: &str =
    "http://www.ietf.org/id/draft-holmer-rmcat-transport-wide-cc-extensions-01";

/// RangedPort supports special format for the media field "m=" port value. If
/// it may be necessary to specify multiple transport ports, the protocol allows
/// to write it as: <port>/<number of ports> where number of ports is a an
/// offsetting range.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RangedPort {
    pub value: isize,
    pub range: Option<isize>,
}

impl fmt::Display for RangedPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(range) = self.range {
            write!(f, "{}/{}", self.value, range)
        } else {
            write!(f, "{}", self.value)
        }
    }
}

/// MediaName describes the "m=" field storage structure.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MediaName {
    pub media: String,
    pub port: RangedPort,
    pub protos: Vec<String>,
    pub formats: Vec<String>,
}

impl fmt::Display for MediaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = [
            self.media.clone(),
            self.port.to_string(),
            self.protos.join("/"),
            self.formats.join(" "),
        ];
        write!(f, "{}", s.join(" "))
    }
}

/// MediaDescription represents a media type.
/// <https://tools.ietf.org/html/rfc4566#section-5.14>
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MediaDescription {
    /// `m=<media> <port>/<number of ports> <proto> <fmt> ...`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.14>
    pub media_name: MediaName,

    /// `i=<session description>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.4>
    pub media_title: Option<Information>,

    /// `c=<nettype> <addrtype> <connection-address>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.7>
    pub connection_information: Option<ConnectionInformation>,

    /// `b=<bwtype>:<bandwidth>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.8>
    pub bandwidth: Vec<Bandwidth>,

    /// `k=<method>`
    ///
    /// `k=<method>:<encryption key>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.12>
    pub encryption_key: Option<EncryptionKey>,

    /// Attributes are the primary means for extending SDP.  Attributes may
    /// be defined to be used as "session-level" attributes, "media-level"
    /// attributes, or both.
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.14>
    pub attributes: Vec<Attribute>,
}

impl MediaDescription {
    /// new_jsep_media_description creates a new MediaName with
    /// some settings that are required by the JSEP spec.
    pub fn new_jsep_media_description(codec_type: String, codec_prefs: Vec<&str>) -> Self {
        MediaDescription {
            media_name: MediaName {
                media: codec_type,
                port: RangedPort {
                    value: 9,
                    range: None,
                },
                protos: vec![
                    "UDP".to_string(),
                    "TLS".to_string(),
                    "RTP".to_string(),
                    "SAVPF".to_string(),
                ],
                formats: codec_prefs.into_iter().map(|s| s.to_owned()).collect(),
            },
            media_title: None,
            connection_information: Some(ConnectionInformation {
                network_type: "IN".to_string(),
                address_type: "IP4".to_string(),
                address: Some(Address {
                    address: "0.0.0.0".to_string(),
                    ttl: None,
                    range: None,
                }),
            }),
            bandwidth: vec![],
            encryption_key: None,
            attributes: vec![],
        }
    }

    /// attribute returns the value of an attribute and if it exists
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_deref().unwrap_or_default())
    }

    /// has_attribute returns true if the media section carries an attribute with `key`
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.iter().any(|a| a.key == key)
    }

    /// Returns every value of the attributes with `key`, in order.
    pub fn attributes_with_key<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        self.attributes
            .iter()
            .filter(move |a| a.key == key)
            .map(|a| a.value.as_deref().unwrap_or_default())
    }

    /// with_property_attribute adds a property attribute 'a=key' to the media description
    pub fn with_property_attribute(mut self, key: String) -> Self {
        self.attributes.push(Attribute::new(key, None));
        self
    }

    /// with_value_attribute adds a value attribute 'a=key:value' to the media description
    pub fn with_value_attribute(mut self, key: String, value: String) -> Self {
        self.attributes.push(Attribute::new(key, Some(value)));
        self
    }

    /// with_ice_credentials adds ICE credentials to the media description
    pub fn with_ice_credentials(self, username: String, password: String) -> Self {
        self.with_value_attribute(ATTR_KEY_ICE_UFRAG.to_string(), username)
            .with_value_attribute(ATTR_KEY_ICE_PWD.to_string(), password)
    }

    /// with_codec adds codec information to the media description
    pub fn with_codec(
        mut self,
        payload_type: u8,
        name: String,
        clockrate: u32,
        channels: u16,
        fmtp: String,
    ) -> Self {
        self.media_name.formats.push(payload_type.to_string());
        let rtpmap = if channels > 0 {
            format!("{payload_type} {name}/{clockrate}/{channels}")
        } else {
            format!("{payload_type} {name}/{clockrate}")
        };

        if !fmtp.is_empty() {
            self.with_value_attribute("rtpmap".to_string(), rtpmap)
                .with_value_attribute("fmtp".to_string(), format!("{payload_type} {fmtp}"))
        } else {
            self.with_value_attribute("rtpmap".to_string(), rtpmap)
        }
    }

    /// with_media_source adds media source information to the media description
    pub fn with_media_source(
        self,
        ssrc: u32,
        cname: String,
        stream_label: String,
        label: String,
    ) -> Self {
        self.with_value_attribute(ATTR_KEY_SSRC.to_string(), format!("{ssrc} cname:{cname}"))
            .with_value_attribute(
                ATTR_KEY_SSRC.to_string(),
                format!("{ssrc} msid:{stream_label} {label}"),
            )
            .with_value_attribute(ATTR_KEY_SSRC.to_string(), format!("{ssrc} label:{label}"))
    }

    /// with_candidate adds an ICE candidate to the media description
    pub fn with_candidate(self, value: String) -> Self {
        self.with_value_attribute(ATTR_KEY_CANDIDATE.to_string(), value)
    }

    pub fn with_extmap(self, e: ExtMap) -> Self {
        self.with_property_attribute(e.marshal())
    }

    /// with_transport_cc_extmap adds an extmap to the media description
    pub fn with_transport_cc_extmap(self) -> Self {
        let e = ExtMap {
            value: EXT_MAP_VALUE_TRANSPORT_CC_KEY,
            uri: EXT_MAP_VALUE_TRANSPORT_CC_URI.to_owned(),
            ..Default::default()
        };

        self.with_extmap(e)
    }

    /// Returns the codecs described by the rtpmap and fmtp attributes, in
    /// m-line format order.
    pub fn codecs(&self) -> Vec<Codec> {
        let mut codecs: Vec<Codec> = vec![];
        for format in &self.media_name.formats {
            let Ok(payload_type) = format.parse::<u8>() else {
                continue;
            };
            let mut codec = Codec {
                payload_type,
                ..Default::default()
            };
            for rtpmap in self.attributes_with_key("rtpmap") {
                if let Ok(c) = parse_rtpmap(rtpmap)
                    && c.payload_type == payload_type
                {
                    codec = c;
                }
            }
            for fmtp in self.attributes_with_key("fmtp") {
                if let Some((pt, params)) = fmtp.split_once(' ')
                    && pt.parse::<u8>().ok() == Some(payload_type)
                {
                    codec.fmtp = params.to_owned();
                }
            }
            codecs.push(codec);
        }
        codecs
    }

    pub(crate) fn marshal(&self) -> String {
        let mut result = String::new();

        result += key_value_build("m=", Some(&self.media_name.to_string())).as_str();
        result += key_value_build("i=", self.media_title.as_ref()).as_str();
        if let Some(connection_information) = &self.connection_information {
            result += key_value_build("c=", Some(&connection_information.to_string())).as_str();
        }
        for bandwidth in &self.bandwidth {
            result += key_value_build("b=", Some(&bandwidth.to_string())).as_str();
        }
        result += key_value_build("k=", self.encryption_key.as_ref()).as_str();
        for attribute in &self.attributes {
            result += key_value_build("a=", Some(&attribute.to_string())).as_str();
        }

        result
    }
}

pub(crate) fn unmarshal_media_name(value: &str) -> Result<MediaDescription> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(Error::SdpInvalidSyntax(format!("`m={value}`")));
    }

    // <media>
    // Set according to currently registered with IANA
    // https://tools.ietf.org/html/rfc4566#section-5.14
    // including "application" from RFC 4145 and "text"/"message" from RFC 4566
    if index_of(
        fields[0],
        &["audio", "video", "text", "application", "message"],
    ) == -1
    {
        return Err(Error::SdpInvalidValue(fields[0].to_owned()));
    }

    // <port>
    let port_parts: Vec<&str> = fields[1].split('/').collect();
    let port_value = port_parts[0]
        .parse::<u16>()
        .map_err(|_| Error::SdpInvalidValue(port_parts[0].to_owned()))?
        as isize;
    let port_range = if port_parts.len() > 1 {
        Some(
            port_parts[1]
                .parse::<i32>()
                .map_err(|_| Error::SdpInvalidValue(port_parts[1].to_owned()))?
                as isize,
        )
    } else {
        None
    };

    // <proto>
    // Set according to currently registered with IANA
    // https://tools.ietf.org/html/rfc4566#section-5.14
    // https://tools.ietf.org/html/rfc4975#section-8.1
    let mut protos = vec![];
    for proto in fields[2].split('/') {
        if index_of(
            proto,
            &[
                "UDP", "RTP", "AVP", "SAVP", "SAVPF", "TLS", "DTLS", "SCTP", "AVPF", "TCP",
                "MSRP", "BFCP", "UDT", "IX", "MRCPv2",
            ],
        ) == -1
        {
            return Err(Error::SdpInvalidValue(fields[2].to_owned()));
        }
        protos.push(proto.to_owned());
    }

    // <fmt>...
    let formats = fields[3..].iter().map(|f| (*f).to_owned()).collect();

    Ok(MediaDescription {
        media_name: MediaName {
            media: fields[0].to_owned(),
            port: RangedPort {
                value: port_value,
                range: port_range,
            },
            protos,
            formats,
        },
        ..Default::default()
    })
}
