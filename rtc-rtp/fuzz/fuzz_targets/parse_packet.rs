#![no_main]
use libfuzzer_sys::fuzz_target;

use rtp::packet::Packet;
use shared::marshal::Unmarshal;

fuzz_target!(|data: &[u8]| {
    let mut buf = data;
    let _ = Packet::unmarshal(&mut buf);
});
