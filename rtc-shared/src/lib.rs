#![warn(rust_2018_idioms)]
#![allow(dead_code)]

#[cfg(feature = "marshal")]
pub mod marshal;

pub mod error;
pub mod serde;
pub mod tcp_framing;
pub mod time;
pub(crate) mod transport;
pub mod util;

pub use transport::{
    FiveTuple, FourTuple, TaggedBytesMut, TransportContext, TransportMessage,
    TransportProtocol,
};
