#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod data_channel;
pub mod message;

pub use data_channel::{
    DataChannel, DataChannelConfig, DataChannelEvent, DataChannelMessage, DataChannelState,
    StreamEvent,
};
