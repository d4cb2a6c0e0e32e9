use shared::util::generate_crypto_random_string;


const RUNES_ALPHA: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";
const RUNES_ICE_CHAR: &[u8] =
    b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789/+";

pub(crate) const LEN_UFRAG: usize = 16;
pub(crate) const LEN_PWD: usize = 32;

/// <https://tools.ietf.org/html/rfc5245#section-15.1>
/// candidate-id = "candidate" ":" foundation
/// foundation   = 1*32ice-char
/// ice-char     = ALPHA / DIGIT / "+" / "/"
pub fn generate_cand_id() -> String {
    format!(
        "candidate:{}",
        generate_crypto_random_string(32, RUNES_ICE_CHAR)
    )
}

/// Generates ICE pwd out of the ice-char alphabet.
pub fn generate_pwd() -> String {
    generate_crypto_random_string(LEN_PWD, RUNES_ICE_CHAR)
}

/// Generates ICE user fragment out of the ice-char alphabet.
pub fn generate_ufrag() -> String {
    generate_crypto_random_string(LEN_UFRAG, RUNES_ICE_CHAR)
}

/// Generates the tie-breaker used to resolve role conflicts.
pub fn generate_tie_breaker() -> u64 {
    ::rand::random::<u64>()
}

/// Reports whether every character of `s` is an ice-char.
pub(crate) fn is_ice_chars(s: &str) -> bool {
    s.bytes().all(|b| RUNES_ICE_CHAR.contains(&b))
}
