#![no_main]
use libfuzzer_sys::fuzz_target;

use bytes::Bytes;
use sctp::packet::Packet;

fuzz_target!(|data: &[u8]| {
    let _ = Packet::unmarshal(&Bytes::copy_from_slice(data));
});
