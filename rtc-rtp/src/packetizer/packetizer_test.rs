use super::*;
use shared::marshal::Marshal;

#[test]
fn test_packetize_splits_at_mtu() -> Result<()> {
    let mut packetizer = Packetizer::new(100, 98, 0x1234ABCD, Sequencer::new_fixed(65534), 90000);
    let payload = Bytes::from(vec![7u8; 200]);

    let packets = packetizer.packetize(&payload, 3000)?;
    // 88 payload bytes fit after the 12 byte header
    assert_eq!(packets.len(), 3);
    assert_eq!(
        packets.iter().map(|p| p.payload.len()).collect::<Vec<_>>(),
        vec![88, 88, 24]
    );
    assert_eq!(
        packets
            .iter()
            .map(|p| p.header.sequence_number)
            .collect::<Vec<_>>(),
        vec![65534, 65535, 0]
    );
    assert_eq!(
        packets.iter().map(|p| p.header.marker).collect::<Vec<_>>(),
        vec![false, false, true]
    );
    for p in &packets {
        assert!(p.marshal()?.len() <= 100);
        assert_eq!(p.header.ssrc, 0x1234ABCD);
        assert_eq!(p.header.payload_type, 98);
        assert_eq!(p.header.timestamp, packets[0].header.timestamp);
    }

    let next = packetizer.packetize(&Bytes::from_static(b"x"), 3000)?;
    assert_eq!(
        next[0].header.timestamp,
        packets[0].header.timestamp.wrapping_add(3000)
    );
    assert!(next[0].header.marker);

    Ok(())
}

#[test]
fn test_packetize_with_extension() -> Result<()> {
    let mut packetizer = Packetizer::new(1200, 111, 1, Sequencer::new_fixed(0), 48000)
        .with_extension(3, Bytes::from_static(b"0"));
    let packets = packetizer.packetize(&Bytes::from_static(b"opus"), 960)?;
    assert_eq!(packets.len(), 1);
    assert_eq!(
        packets[0].header.get_extension(3),
        Some(Bytes::from_static(b"0"))
    );
    Ok(())
}

#[test]
fn test_packetize_empty_and_tiny_mtu() -> Result<()> {
    let mut packetizer = Packetizer::new(12, 96, 1, Sequencer::new_fixed(0), 90000);
    assert!(packetizer.packetize(&Bytes::new(), 1)?.is_empty());
    assert_eq!(
        packetizer.packetize(&Bytes::from_static(b"x"), 1),
        Err(Error::ErrBufferTooSmall)
    );
    Ok(())
}
