use bytes::{Bytes, BytesMut};

use super::chunk_abort::ChunkAbort;
use super::chunk_forward_tsn::*;
use super::chunk_init::ChunkInit;
use super::chunk_payload_data::*;
use super::chunk_reconfig::*;
use super::chunk_selective_ack::*;
use super::chunk_type::*;
use super::*;

fn reparse(chunk: &Chunk) -> Result<Chunk> {
    let mut buf = BytesMut::new();
    chunk.marshal_to(&mut buf);
    assert_eq!(buf.len(), chunk.marshal_size());
    assert_eq!(buf.len() % 4, 0);
    let mut raw = buf.freeze();
    let parsed = Chunk::unmarshal(&mut raw)?;
    assert!(raw.is_empty());
    Ok(parsed)
}

#[test]
fn test_chunk_type_string() {
    let tests = vec![
        (CT_PAYLOAD_DATA, "DATA"),
        (CT_INIT, "INIT"),
        (CT_INIT_ACK, "INIT-ACK"),
        (CT_SACK, "SACK"),
        (CT_ABORT, "ABORT"),
        (CT_SHUTDOWN_COMPLETE, "SHUTDOWN-COMPLETE"),
        (CT_RECONFIG, "RECONFIG"),
        (CT_FORWARD_TSN, "FORWARD-TSN"),
        (ChunkType(255), "Unknown ChunkType: 255"),
    ];

    for (ct, expected) in tests {
        assert_eq!(ct.to_string(), expected, "failed to stringify chunkType {ct:?}");
    }
}

#[test]
fn test_payload_data_flags_and_padding() -> Result<()> {
    let chunk = Chunk::PayloadData(ChunkPayloadData {
        unordered: true,
        beginning_fragment: true,
        ending_fragment: false,
        tsn: 42,
        stream_identifier: 3,
        stream_sequence_number: 7,
        payload_type: PayloadProtocolIdentifier::String,
        user_data: Bytes::from_static(b"hello"),
        ..Default::default()
    });

    let mut buf = BytesMut::new();
    chunk.marshal_to(&mut buf);
    assert_eq!(buf[0], 0);
    assert_eq!(buf[1], 0x06);
    assert_eq!(&buf[2..4], &[0, 21]);
    assert_eq!(buf.len(), 24);

    assert_eq!(reparse(&chunk)?, chunk);
    Ok(())
}

#[test]
fn test_payload_data_requires_user_data() {
    let raw = [0u8, 0x03, 0, 16, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 51];
    let result = Chunk::unmarshal(&mut Bytes::copy_from_slice(&raw));
    assert_eq!(result, Err(Error::ErrPayloadDataEmpty));
}

#[test]
fn test_ppi_conversion() {
    assert_eq!(PayloadProtocolIdentifier::from(50), PayloadProtocolIdentifier::Dcep);
    assert_eq!(PayloadProtocolIdentifier::from(57), PayloadProtocolIdentifier::BinaryEmpty);
    assert_eq!(PayloadProtocolIdentifier::from(99), PayloadProtocolIdentifier::Unknown);
}

#[test]
fn test_init_validation() -> Result<()> {
    let init = Chunk::Init(ChunkInit {
        is_ack: true,
        initiate_tag: 0x1234,
        advertised_receiver_window_credit: 1024 * 1024,
        num_outbound_streams: u16::MAX,
        num_inbound_streams: u16::MAX,
        initial_tsn: 99,
    });
    assert_eq!(init.chunk_type(), CT_INIT_ACK);
    assert_eq!(reparse(&init)?, init);

    let zero_tag = Chunk::Init(ChunkInit {
        initiate_tag: 0,
        num_outbound_streams: 1,
        num_inbound_streams: 1,
        ..Default::default()
    });
    assert_eq!(reparse(&zero_tag), Err(Error::ErrInitTagZero));

    let zero_streams = Chunk::Init(ChunkInit {
        initiate_tag: 1,
        num_outbound_streams: 0,
        num_inbound_streams: 1,
        ..Default::default()
    });
    assert_eq!(reparse(&zero_streams), Err(Error::ErrInitStreamsZero));
    Ok(())
}

#[test]
fn test_selective_ack_blocks() -> Result<()> {
    let sack = Chunk::SelectiveAck(ChunkSelectiveAck {
        cumulative_tsn_ack: 100,
        advertised_receiver_window_credit: 5000,
        gap_ack_blocks: vec![GapAckBlock { start: 2, end: 3 }, GapAckBlock { start: 5, end: 5 }],
        duplicate_tsn: vec![98],
    });
    assert_eq!(reparse(&sack)?, sack);

    // header claims one gap block but carries none
    let raw = [3u8, 0, 0, 16, 0, 0, 0, 1, 0, 0, 0, 1, 0, 1, 0, 0];
    assert_eq!(
        Chunk::unmarshal(&mut Bytes::copy_from_slice(&raw)),
        Err(Error::ErrChunkTooShort)
    );
    Ok(())
}

#[test]
fn test_forward_tsn_streams() -> Result<()> {
    let fwd = Chunk::ForwardTsn(ChunkForwardTsn {
        new_cumulative_tsn: 3,
        streams: vec![
            ChunkForwardTsnStream {
                identifier: 1,
                sequence: 2,
            },
            ChunkForwardTsnStream {
                identifier: 4,
                sequence: 0,
            },
        ],
    });
    assert_eq!(reparse(&fwd)?, fwd);
    Ok(())
}

#[test]
fn test_abort_reason() -> Result<()> {
    let abort = Chunk::Abort(ChunkAbort {
        reason: "bye".to_owned(),
    });
    assert_eq!(reparse(&abort)?, abort);
    assert_eq!(
        reparse(&Chunk::Abort(ChunkAbort::default()))?,
        Chunk::Abort(ChunkAbort::default())
    );
    Ok(())
}

#[test]
fn test_reconfig_two_params() -> Result<()> {
    let reconfig = Chunk::Reconfig(ChunkReconfig {
        param_a: Some(ReconfigParam::OutgoingResetRequest(OutgoingResetRequest {
            reconfig_request_sequence_number: 10,
            reconfig_response_sequence_number: 9,
            sender_last_tsn: 1000,
            stream_identifiers: vec![1],
        })),
        param_b: Some(ReconfigParam::Response(ReconfigResponse {
            reconfig_response_sequence_number: 20,
            result: ReconfigResult::SuccessPerformed,
        })),
    });
    assert_eq!(reparse(&reconfig)?, reconfig);
    Ok(())
}

#[test]
fn test_reconfig_unknown_param() {
    let raw = [130u8, 0, 0, 12, 0, 99, 0, 8, 0, 0, 0, 0];
    assert_eq!(
        Chunk::unmarshal(&mut Bytes::copy_from_slice(&raw)),
        Err(Error::ErrReconfigParamUnknown(99))
    );
}

#[test]
fn test_unknown_chunk_type() {
    let raw = [0x42u8, 0, 0, 4];
    assert_eq!(
        Chunk::unmarshal(&mut Bytes::copy_from_slice(&raw)),
        Err(Error::ErrChunkTypeUnknown(0x42))
    );
}
