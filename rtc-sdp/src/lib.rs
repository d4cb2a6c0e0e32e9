#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod description;
pub mod direction;
pub mod extmap;
mod lexer;
pub mod util;

pub use description::{media::MediaDescription, session::SessionDescription};

/// Media type of the m-section carrying data channels.
pub const MEDIA_SECTION_APPLICATION: &str = "application";
