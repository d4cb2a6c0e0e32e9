#![no_main]
use libfuzzer_sys::fuzz_target;

use std::time::Instant;

use bytes::BytesMut;
use sansio::Protocol;
use sctp::{Association, TransportConfig};
use shared::{TransportContext, TransportMessage};

fuzz_target!(|data: &[u8]| {
    let now = Instant::now();
    let mut association = Association::server(TransportConfig::default(), now);
    let _ = association.handle_read(TransportMessage {
        now,
        transport: TransportContext::default(),
        message: BytesMut::from(data),
    });
    while association.poll_write().is_some() {}
});
