#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod association;
pub mod chunk;
pub mod config;
pub mod packet;
pub(crate) mod queue;
pub mod stream;
pub(crate) mod util;

pub use association::{Association, AssociationState, Event};
pub use chunk::chunk_payload_data::PayloadProtocolIdentifier;
pub use config::{TimerConfig, TransportConfig};
pub use stream::{ReliabilityType, StreamMessage};
