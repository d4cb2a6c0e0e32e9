#![no_main]
use libfuzzer_sys::fuzz_target;

use std::io::Cursor;

use sdp::extmap::ExtMap;

fuzz_target!(|data: &[u8]| {
    let mut reader = Cursor::new(data);
    let _ = ExtMap::unmarshal(&mut reader);
});
