//! ICE specific STUN attributes, RFC 8445 section 16.1.

#[cfg(test)]
mod attributes_test;

pub mod control;
pub mod priority;
pub mod use_candidate;
