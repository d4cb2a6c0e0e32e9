use std::time::{Duration, SystemTime, UNIX_EPOCH};
use std::{fmt, io};

use url::Url;

use super::common::*;
use super::media::*;
use crate::lexer::*;
use shared::error::{Error, Result};

/// Constants for SDP attributes used in JSEP
pub const ATTR_KEY_CANDIDATE: &str = "candidate";
pub const ATTR_KEY_END_OF_CANDIDATES: &str = "end-of-candidates";
pub const ATTR_KEY_IDENTITY: &str = "identity";
pub const ATTR_KEY_GROUP: &str = "group";
pub const ATTR_KEY_SSRC: &str = "ssrc";
pub const ATTR_KEY_SSRC_GROUP: &str = "ssrc-group";
pub const ATTR_KEY_MSID: &str = "msid";
pub const ATTR_KEY_MSID_SEMANTIC: &str = "msid-semantic";
pub const ATTR_KEY_CONNECTION_SETUP: &str = "setup";
pub const ATTR_KEY_MID: &str = "mid";
pub const ATTR_KEY_ICELITE: &str = "ice-lite";
pub const ATTR_KEY_ICE_UFRAG: &str = "ice-ufrag";
pub const ATTR_KEY_ICE_PWD: &str = "ice-pwd";
pub const ATTR_KEY_ICE_OPTIONS: &str = "ice-options";
pub const ATTR_KEY_RTCPMUX: &str = "rtcp-mux";
pub const ATTR_KEY_RTCPRSIZE: &str = "rtcp-rsize";
pub const ATTR_KEY_INACTIVE: &str = "inactive";
pub const ATTR_KEY_RECV_ONLY: &str = "recvonly";
pub const ATTR_KEY_SEND_ONLY: &str = "sendonly";
pub const ATTR_KEY_SEND_RECV: &str = "sendrecv";
pub const ATTR_KEY_EXT_MAP: &str = "extmap";
pub const ATTR_KEY_SCTP_PORT: &str = "sctp-port";
pub const ATTR_KEY_MAX_MESSAGE_SIZE: &str = "max-message-size";

/// Constants for semantic tokens used in JSEP
pub const SEMANTIC_TOKEN_LIP_SYNCHRONIZATION: &str = "LS";
pub const SEMANTIC_TOKEN_FLOW_IDENTIFICATION: &str = "FID";
pub const SEMANTIC_TOKEN_FORWARD_ERROR_CORRECTION: &str = "FEC";
pub const SEMANTIC_TOKEN_WEBRTC_MEDIA_STREAMS: &str = "WMS";

/// Version describes the value provided by the "v=" field which gives
/// the version of the Session Description Protocol.
pub type Version = isize;

/// Origin defines the structure for the "o=" field which provides the
/// originator of the session plus a session identifier and version number.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Origin {
    pub username: String,
    pub session_id: u64,
    pub session_version: u64,
    pub network_type: String,
    pub address_type: String,
    pub unicast_address: String,
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.username,
            self.session_id,
            self.session_version,
            self.network_type,
            self.address_type,
            self.unicast_address,
        )
    }
}

impl Origin {
    pub fn new() -> Self {
        Origin {
            username: "-".to_owned(),
            session_id: 0,
            session_version: 0,
            network_type: "IN".to_owned(),
            address_type: "IP4".to_owned(),
            unicast_address: "0.0.0.0".to_owned(),
        }
    }
}

/// SessionName describes a structured representations for the "s=" field
/// and is the textual session name.
pub type SessionName = String;

/// EmailAddress describes a structured representations for the "e=" line
/// which specifies email contact information for the person responsible for
/// the conference.
pub type EmailAddress = String;

/// PhoneNumber describes a structured representations for the "p=" line
/// specify phone contact information for the person responsible for the
/// conference.
pub type PhoneNumber = String;

/// TimeZone defines the structured object for "z=" line which describes
/// repeated sessions scheduling.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimeZone {
    pub adjustment_time: u64,
    pub offset: i64,
}

impl fmt::Display for TimeZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.adjustment_time, self.offset)
    }
}

/// TimeDescription describes "t=", "r=" fields of the session description
/// which are used to specify the start and stop times for a session as well as
/// repeat intervals and durations for the scheduled session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TimeDescription {
    /// `t=<start-time> <stop-time>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.9>
    pub timing: Timing,

    /// `r=<repeat interval> <active duration> <offsets from start-time>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.10>
    pub repeat_times: Vec<RepeatTime>,
}

/// Timing defines the "t=" field's structured representation for the start and
/// stop times.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Timing {
    pub start_time: u64,
    pub stop_time: u64,
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.start_time, self.stop_time)
    }
}

/// RepeatTime describes the "r=" fields of the session description which
/// represents the intervals and durations for repeated scheduled sessions.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RepeatTime {
    pub interval: i64,
    pub duration: i64,
    pub offsets: Vec<i64>,
}

impl fmt::Display for RepeatTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.interval, self.duration)?;
        for value in &self.offsets {
            write!(f, " {value}")?;
        }
        Ok(())
    }
}

/// SessionDescription is a a well-defined format for conveying sufficient
/// information to discover and participate in a multimedia session.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    /// `v=0`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.1>
    pub version: Version,

    /// `o=<username> <sess-id> <sess-version> <nettype> <addrtype> <unicast-address>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.2>
    pub origin: Origin,

    /// `s=<session name>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.3>
    pub session_name: SessionName,

    /// `i=<session description>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.4>
    pub session_information: Option<Information>,

    /// `u=<uri>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.5>
    pub uri: Option<Url>,

    /// `e=<email-address>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.6>
    pub email_address: Option<EmailAddress>,

    /// `p=<phone-number>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.6>
    pub phone_number: Option<PhoneNumber>,

    /// `c=<nettype> <addrtype> <connection-address>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.7>
    pub connection_information: Option<ConnectionInformation>,

    /// `b=<bwtype>:<bandwidth>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.8>
    pub bandwidth: Vec<Bandwidth>,

    /// <https://tools.ietf.org/html/rfc4566#section-5.9>
    /// <https://tools.ietf.org/html/rfc4566#section-5.10>
    pub time_descriptions: Vec<TimeDescription>,

    /// `z=<adjustment time> <offset> <adjustment time> <offset> ...`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.11>
    pub time_zones: Vec<TimeZone>,

    /// `k=<method>`
    ///
    /// `k=<method>:<encryption key>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.12>
    pub encryption_key: Option<EncryptionKey>,

    /// `a=<attribute>`
    ///
    /// `a=<attribute>:<value>`
    ///
    /// <https://tools.ietf.org/html/rfc4566#section-5.13>
    pub attributes: Vec<Attribute>,

    /// <https://tools.ietf.org/html/rfc4566#section-5.14>
    pub media_descriptions: Vec<MediaDescription>,
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.marshal())
    }
}

/// Position of each line type within the session level, in the order RFC 4566
/// mandates. Repeatable types may follow themselves.
fn session_rank(key: u8) -> Option<(u8, bool)> {
    match key {
        b'v' => Some((0, false)),
        b'o' => Some((1, false)),
        b's' => Some((2, false)),
        b'i' => Some((3, false)),
        b'u' => Some((4, false)),
        b'e' => Some((5, false)),
        b'p' => Some((6, false)),
        b'c' => Some((7, false)),
        b'b' => Some((8, true)),
        b't' | b'r' => Some((9, true)),
        b'z' => Some((10, false)),
        b'k' => Some((11, false)),
        b'a' => Some((12, true)),
        _ => None,
    }
}

fn media_rank(key: u8) -> Option<(u8, bool)> {
    match key {
        b'm' => Some((0, false)),
        b'i' => Some((1, false)),
        b'c' => Some((2, true)),
        b'b' => Some((3, true)),
        b'k' => Some((4, false)),
        b'a' => Some((5, true)),
        _ => None,
    }
}

impl SessionDescription {
    /// Creates a new description with the fields JSEP requires for a session
    /// created at `session_id`, version 2, no time bounds.
    pub fn new_jsep_session_description(identity: bool) -> Self {
        let mut d = SessionDescription {
            version: 0,
            origin: Origin {
                username: "-".to_string(),
                session_id: new_session_id(),
                session_version: SystemTime::now()
                    .duration_since(UNIX_EPOCH)
                    .unwrap_or_else(|_| Duration::from_secs(0))
                    .subsec_nanos() as u64,
                network_type: "IN".to_string(),
                address_type: "IP4".to_string(),
                unicast_address: "0.0.0.0".to_string(),
            },
            session_name: "-".to_string(),
            time_descriptions: vec![TimeDescription {
                timing: Timing {
                    start_time: 0,
                    stop_time: 0,
                },
                repeat_times: vec![],
            }],
            ..Default::default()
        };

        if identity {
            d = d.with_property_attribute(ATTR_KEY_IDENTITY.to_string());
        }

        d
    }

    /// with_property_attribute adds a property attribute 'a=key' to the session description
    pub fn with_property_attribute(mut self, key: String) -> Self {
        self.attributes.push(Attribute::new(key, None));
        self
    }

    /// with_value_attribute adds a value attribute 'a=key:value' to the session description
    pub fn with_value_attribute(mut self, key: String, value: String) -> Self {
        self.attributes.push(Attribute::new(key, Some(value)));
        self
    }

    /// with_media adds a media description to the session description
    pub fn with_media(mut self, md: MediaDescription) -> Self {
        self.media_descriptions.push(md);
        self
    }

    /// Returns the value of the first attribute with `key`. A property attribute
    /// yields `Some("")`.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.key == key)
            .map(|a| a.value.as_deref().unwrap_or_default())
    }

    /// has_attribute returns true if the session carries an attribute with `key`
    pub fn has_attribute(&self, key: &str) -> bool {
        self.attributes.iter().any(|a| a.key == key)
    }

    /// Returns the media description whose mid is `mid`.
    pub fn media_description(&self, mid: &str) -> Option<&MediaDescription> {
        self.media_descriptions
            .iter()
            .find(|m| m.attribute(ATTR_KEY_MID) == Some(mid))
    }

    /// Marshal takes a SDP struct to text
    /// <https://tools.ietf.org/html/rfc4566#section-5>
    /// Session description
    ///    v=  (protocol version)
    ///    o=  (originator and session identifier)
    ///    s=  (session name)
    ///    i=* (session information)
    ///    u=* (URI of description)
    ///    e=* (email address)
    ///    p=* (phone number)
    ///    c=* (connection information -- not required if included in
    ///         all media)
    ///    b=* (zero or more bandwidth information lines)
    ///    One or more time descriptions ("t=" and "r=" lines; see below)
    ///    z=* (time zone adjustments)
    ///    k=* (encryption key)
    ///    a=* (zero or more session attribute lines)
    ///    Zero or more media descriptions
    ///
    /// Time description
    ///    t=  (time the session is active)
    ///    r=* (zero or more repeat times)
    ///
    /// Media description, if present
    ///    m=  (media name and transport address)
    ///    i=* (media title)
    ///    c=* (connection information -- optional if included at
    ///         session level)
    ///    b=* (zero or more bandwidth information lines)
    ///    k=* (encryption key)
    ///    a=* (zero or more media attribute lines)
    pub fn marshal(&self) -> String {
        let mut result = String::new();

        result += key_value_build("v=", Some(&self.version.to_string())).as_str();
        result += key_value_build("o=", Some(&self.origin.to_string())).as_str();
        result += key_value_build("s=", Some(&self.session_name)).as_str();

        result += key_value_build("i=", self.session_information.as_ref()).as_str();

        if let Some(uri) = &self.uri {
            result += key_value_build("u=", Some(&uri.to_string())).as_str();
        }
        result += key_value_build("e=", self.email_address.as_ref()).as_str();
        result += key_value_build("p=", self.phone_number.as_ref()).as_str();
        if let Some(connection_information) = &self.connection_information {
            result += key_value_build("c=", Some(&connection_information.to_string())).as_str();
        }

        for bandwidth in &self.bandwidth {
            result += key_value_build("b=", Some(&bandwidth.to_string())).as_str();
        }
        for time_description in &self.time_descriptions {
            result += key_value_build("t=", Some(&time_description.timing.to_string())).as_str();
            for repeat_time in &time_description.repeat_times {
                result += key_value_build("r=", Some(&repeat_time.to_string())).as_str();
            }
        }
        if !self.time_zones.is_empty() {
            let mut time_zones = vec![];
            for time_zone in &self.time_zones {
                time_zones.push(time_zone.to_string());
            }
            result += key_value_build("z=", Some(&time_zones.join(" "))).as_str();
        }
        result += key_value_build("k=", self.encryption_key.as_ref()).as_str();
        for attribute in &self.attributes {
            result += key_value_build("a=", Some(&attribute.to_string())).as_str();
        }

        for media_description in &self.media_descriptions {
            result += media_description.marshal().as_str();
        }

        result
    }

    /// Unmarshal is the primary function that deserializes the session description
    /// message and stores it inside of a structured SessionDescription object.
    ///
    /// Lines out of the order of RFC 4566, unknown line types, and values that do not
    /// parse are rejected. CRLF and bare LF line endings are both accepted.
    pub fn unmarshal<R: io::BufRead>(reader: &mut R) -> Result<Self> {
        let mut sd = SessionDescription::default();

        let mut previous: Option<(u8, u8)> = None;
        let mut in_media = false;
        let mut seen_origin = false;
        let mut seen_session_name = false;

        while let Some(line) = read_line(reader)? {
            if previous.is_none() && line.key != b'v' {
                return Err(Error::SdpInvalidSyntax(format!(
                    "{}={}",
                    line.key as char, line.value
                )));
            }

            if line.key == b'm' {
                in_media = true;
            }

            let (rank, repeatable) = if in_media {
                media_rank(line.key)
            } else {
                session_rank(line.key)
            }
            .ok_or_else(|| Error::SyntaxError {
                s: format!("{}={}", line.key as char, line.value),
                p: 0,
            })?;

            // r= may only follow a t= or another r=
            if line.key == b'r' && !matches!(previous, Some((b't' | b'r', _))) {
                return Err(Error::SdpInvalidSyntax(format!("r={}", line.value)));
            }
            if let Some((previous_key, previous_rank)) = previous
                && line.key != b'm'
                && (rank < previous_rank
                    || (rank == previous_rank && previous_key == line.key && !repeatable))
            {
                return Err(Error::SyntaxError {
                    s: format!("{}={}", line.key as char, line.value),
                    p: 0,
                });
            }
            previous = Some((line.key, rank));

            if in_media {
                unmarshal_media_line(&mut sd, line.key, &line.value)?;
                continue;
            }

            match line.key {
                b'v' => sd.version = unmarshal_version(&line.value)?,
                b'o' => {
                    sd.origin = unmarshal_origin(&line.value)?;
                    seen_origin = true;
                }
                b's' => {
                    sd.session_name = line.value;
                    seen_session_name = true;
                }
                b'i' => sd.session_information = Some(line.value),
                b'u' => {
                    sd.uri = Some(
                        Url::parse(&line.value)
                            .map_err(|_| Error::SdpInvalidValue(line.value.clone()))?,
                    )
                }
                b'e' => sd.email_address = Some(line.value),
                b'p' => sd.phone_number = Some(line.value),
                b'c' => {
                    sd.connection_information =
                        Some(unmarshal_connection_information(&line.value)?)
                }
                b'b' => sd.bandwidth.push(unmarshal_bandwidth(&line.value)?),
                b't' => sd.time_descriptions.push(TimeDescription {
                    timing: unmarshal_timing(&line.value)?,
                    repeat_times: vec![],
                }),
                b'r' => {
                    let repeat_time = unmarshal_repeat_time(&line.value)?;
                    if let Some(latest) = sd.time_descriptions.last_mut() {
                        latest.repeat_times.push(repeat_time);
                    }
                }
                b'z' => sd.time_zones = unmarshal_time_zones(&line.value)?,
                b'k' => sd.encryption_key = Some(line.value),
                b'a' => sd.attributes.push(unmarshal_attribute(&line.value)),
                _ => {}
            }
        }

        if !seen_origin || !seen_session_name {
            return Err(Error::SdpInvalidSyntax(
                "missing origin or session name".to_owned(),
            ));
        }
        if sd.time_descriptions.is_empty() {
            return Err(Error::SdpEmptyTimeDescription);
        }

        Ok(sd)
    }
}

fn unmarshal_media_line(sd: &mut SessionDescription, key: u8, value: &str) -> Result<()> {
    if key == b'm' {
        sd.media_descriptions.push(unmarshal_media_name(value)?);
        return Ok(());
    }

    let Some(md) = sd.media_descriptions.last_mut() else {
        return Err(Error::SdpInvalidSyntax(value.to_owned()));
    };
    match key {
        b'i' => md.media_title = Some(value.to_owned()),
        b'c' => md.connection_information = Some(unmarshal_connection_information(value)?),
        b'b' => md.bandwidth.push(unmarshal_bandwidth(value)?),
        b'k' => md.encryption_key = Some(value.to_owned()),
        b'a' => md.attributes.push(unmarshal_attribute(value)),
        _ => {}
    }
    Ok(())
}

/// Returns a random session id that fits the 63 bits RFC 3264 suggests.
pub(crate) fn new_session_id() -> u64 {
    let c = u64::MAX ^ (1u64 << 63);
    rand::random::<u64>() & c
}

pub(crate) fn key_value_build(key: &str, value: Option<&String>) -> String {
    if let Some(val) = value {
        format!("{key}{val}{END_LINE}")
    } else {
        "".to_string()
    }
}

fn unmarshal_version(value: &str) -> Result<Version> {
    let version = value
        .parse::<isize>()
        .map_err(|_| Error::SdpInvalidValue(value.to_owned()))?;
    // As off the latest draft of the rfc this value is required to be 0.
    // https://tools.ietf.org/html/draft-ietf-rtcweb-jsep-24#section-5.8.1
    if version != 0 {
        return Err(Error::SdpInvalidValue(value.to_owned()));
    }
    Ok(version)
}

fn unmarshal_origin(value: &str) -> Result<Origin> {
    let fields = fields(value, 6)?;

    let session_id = fields[1]
        .parse::<u64>()
        .map_err(|_| Error::SdpInvalidValue(fields[1].to_owned()))?;
    let session_version = fields[2]
        .parse::<u64>()
        .map_err(|_| Error::SdpInvalidValue(fields[2].to_owned()))?;

    // Set according to currently registered with IANA
    // https://tools.ietf.org/html/rfc4566#section-8.2.6
    if index_of(fields[3], &["IN"]) == -1 {
        return Err(Error::SdpInvalidValue(fields[3].to_owned()));
    }
    // Set according to currently registered with IANA
    // https://tools.ietf.org/html/rfc4566#section-8.2.7
    if index_of(fields[4], &["IP4", "IP6"]) == -1 {
        return Err(Error::SdpInvalidValue(fields[4].to_owned()));
    }

    Ok(Origin {
        username: fields[0].to_owned(),
        session_id,
        session_version,
        network_type: fields[3].to_owned(),
        address_type: fields[4].to_owned(),
        unicast_address: fields[5].to_owned(),
    })
}

pub(crate) fn unmarshal_connection_information(value: &str) -> Result<ConnectionInformation> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.len() < 2 || fields.len() > 3 {
        return Err(Error::SdpInvalidSyntax(format!("`c={value}`")));
    }

    // Set according to currently registered with IANA
    // https://tools.ietf.org/html/rfc4566#section-8.2.6
    if index_of(fields[0], &["IN"]) == -1 {
        return Err(Error::SdpInvalidValue(fields[0].to_owned()));
    }
    // Set according to currently registered with IANA
    // https://tools.ietf.org/html/rfc4566#section-8.2.7
    if index_of(fields[1], &["IP4", "IP6"]) == -1 {
        return Err(Error::SdpInvalidValue(fields[1].to_owned()));
    }

    let address = if fields.len() > 2 {
        let mut parts = fields[2].split('/');
        let address = parts.next().unwrap_or_default().to_owned();
        let parse = |part: Option<&str>| -> Result<Option<isize>> {
            part.map(|p| {
                p.parse::<isize>()
                    .map_err(|_| Error::SdpInvalidValue(fields[2].to_owned()))
            })
            .transpose()
        };
        let ttl = parse(parts.next())?;
        let range = parse(parts.next())?;
        Some(Address {
            address,
            ttl,
            range,
        })
    } else {
        None
    };

    Ok(ConnectionInformation {
        network_type: fields[0].to_owned(),
        address_type: fields[1].to_owned(),
        address,
    })
}

pub(crate) fn unmarshal_bandwidth(value: &str) -> Result<Bandwidth> {
    let mut parts: Vec<&str> = value.split(':').collect();
    if parts.len() != 2 {
        return Err(Error::SdpInvalidValue(format!("`b={value}`")));
    }

    let experimental = parts[0].starts_with("X-");
    if experimental {
        parts[0] = parts[0].trim_start_matches("X-");
    } else {
        // Set according to currently registered with IANA
        // https://tools.ietf.org/html/rfc4566#section-5.8 and
        // https://tools.ietf.org/html/rfc3890#section-6.2
        if index_of(parts[0], &["CT", "AS", "TIAS", "RS", "RR"]) == -1 {
            return Err(Error::SdpInvalidValue(parts[0].to_owned()));
        }
    }

    let bandwidth = parts[1]
        .parse::<u64>()
        .map_err(|_| Error::SdpInvalidValue(parts[1].to_owned()))?;

    Ok(Bandwidth {
        experimental,
        bandwidth_type: parts[0].to_owned(),
        bandwidth,
    })
}

fn unmarshal_timing(value: &str) -> Result<Timing> {
    let fields = fields(value, 2)?;

    let start_time = fields[0]
        .parse::<u64>()
        .map_err(|_| Error::SdpInvalidValue(fields[0].to_owned()))?;
    let stop_time = fields[1]
        .parse::<u64>()
        .map_err(|_| Error::SdpInvalidValue(fields[1].to_owned()))?;

    Ok(Timing {
        start_time,
        stop_time,
    })
}

fn unmarshal_repeat_time(value: &str) -> Result<RepeatTime> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.len() < 3 {
        return Err(Error::SdpInvalidSyntax(format!("`r={value}`")));
    }

    let interval = parse_time_units(fields[0])?;
    let duration = parse_time_units(fields[1])?;
    let mut offsets = vec![];
    for field in &fields[2..] {
        offsets.push(parse_time_units(field)?);
    }

    Ok(RepeatTime {
        interval,
        duration,
        offsets,
    })
}

fn unmarshal_time_zones(value: &str) -> Result<Vec<TimeZone>> {
    // These fields are transimitted in pairs
    // z=<adjustment time> <offset> <adjustment time> <offset> ....
    // so we are making sure that there are actually multiple of 2 total.
    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.is_empty() || fields.len() % 2 != 0 {
        return Err(Error::SdpInvalidSyntax(format!("`z={value}`")));
    }

    let mut time_zones = vec![];
    for pair in fields.chunks(2) {
        let adjustment_time = pair[0]
            .parse::<u64>()
            .map_err(|_| Error::SdpInvalidValue(pair[0].to_owned()))?;
        let offset = parse_time_units(pair[1])?;
        time_zones.push(TimeZone {
            adjustment_time,
            offset,
        });
    }

    Ok(time_zones)
}

pub(crate) fn unmarshal_attribute(value: &str) -> Attribute {
    match value.split_once(':') {
        Some((key, value)) => Attribute::new(key.to_owned(), Some(value.to_owned())),
        None => Attribute::new(value.to_owned(), None),
    }
}
