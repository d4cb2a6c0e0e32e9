#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod agent;
pub mod attributes;
pub mod candidate;
pub mod network_type;
pub mod rand;
pub mod state;
pub mod tcp_type;
pub mod url;

pub use agent::Event;
