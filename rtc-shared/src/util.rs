use crate::error::{Error, Result};
use rand::{Rng, rng};
use std::net::{SocketAddr, ToSocketAddrs};

// match_range is a MatchFunc that accepts packets with the first byte in [lower..upper]
fn match_range(lower: u8, upper: u8) -> impl Fn(&[u8]) -> bool {
    move |buf: &[u8]| -> bool {
        if buf.is_empty() {
            return false;
        }
        let b = buf[0];
        b >= lower && b <= upper
    }
}

/// MatchFuncs as described in RFC7983
/// <https://tools.ietf.org/html/rfc7983>
///              +----------------+
///              |        [0..3] -+--> forward to STUN
///              |                |
///              |      [20..63] -+--> forward to the data association
///              |                |
///              |    [128..191] -+--> forward to RTP
///              +----------------+
/// match_stun is a MatchFunc that accepts packets with the first byte in [0..3]
pub fn match_stun(b: &[u8]) -> bool {
    match_range(0, 3)(b)
}

/// match_association accepts packets with the first byte in [20..63], the range
/// RFC7983 reserves for the secured data transport.
pub fn match_association(b: &[u8]) -> bool {
    match_range(20, 63)(b)
}

/// match_rtp accepts packets with the first byte in [128..191] that are not RTCP
pub fn match_rtp(buf: &[u8]) -> bool {
    match_range(128, 191)(buf) && !is_rtcp(buf)
}

fn is_rtcp(buf: &[u8]) -> bool {
    // Not long enough to determine RTP/RTCP
    if buf.len() < 4 {
        return false;
    }

    let rtcp_packet_type = buf[1];
    (192..=223).contains(&rtcp_packet_type)
}

/// lookup host to SocketAddr
pub fn lookup_host<T>(use_ipv4: bool, host: T) -> Result<SocketAddr>
where
    T: ToSocketAddrs,
{
    for remote_addr in host.to_socket_addrs()? {
        if (use_ipv4 && remote_addr.is_ipv4()) || (!use_ipv4 && remote_addr.is_ipv6()) {
            return Ok(remote_addr);
        }
    }

    Err(Error::ErrAddressParseFailed)
}

const RUNES_ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// math_rand_alpha generates a mathematical random alphabet sequence of the requested length.
pub fn math_rand_alpha(n: usize) -> String {
    generate_crypto_random_string(n, RUNES_ALPHA)
}

/// generate_crypto_random_string picks `n` characters out of `runes` with the thread rng.
pub fn generate_crypto_random_string(n: usize, runes: &[u8]) -> String {
    let mut rng = rng();

    (0..n)
        .map(|_| {
            let idx = rng.random_range(0..runes.len());
            runes[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_demux_ranges() {
        assert!(match_stun(&[0x00, 0x01]));
        assert!(match_stun(&[0x03]));
        assert!(!match_stun(&[0x04]));
        assert!(!match_stun(&[]));

        assert!(match_association(&[20]));
        assert!(match_association(&[63]));
        assert!(!match_association(&[64]));

        assert!(match_rtp(&[0x80, 96, 0, 1]));
        assert!(!match_rtp(&[0x80, 200, 0, 1]), "rtcp packet type must not match");
        assert!(!match_rtp(&[0x40, 96, 0, 1]));
    }

    #[test]
    fn test_random_string_uses_runes() {
        let s = generate_crypto_random_string(64, b"ab");
        assert_eq!(s.len(), 64);
        assert!(s.chars().all(|c| c == 'a' || c == 'b'));

        assert_eq!(math_rand_alpha(10).len(), 10);
    }
}
