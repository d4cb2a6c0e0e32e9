#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod client;
pub mod proto;
