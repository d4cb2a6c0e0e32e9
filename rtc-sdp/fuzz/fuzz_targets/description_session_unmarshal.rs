#![no_main]
use libfuzzer_sys::fuzz_target;

use std::io::Cursor;

use sdp::SessionDescription;

fuzz_target!(|data: &[u8]| {
    let mut reader = Cursor::new(data);
    if let Ok(sdp) = SessionDescription::unmarshal(&mut reader) {
        let mut reader = Cursor::new(sdp.marshal());
        let _ = SessionDescription::unmarshal(&mut reader);
    }
});
