use crc::{CRC_32_ISCSI, Crc};

pub(crate) const ISCSI_CRC: Crc<u32> = Crc::<u32>::new(&CRC_32_ISCSI);

/// Computes the CRC-32C of a packet whose checksum field is zeroed.
pub(crate) fn generate_packet_checksum(raw: &[u8]) -> u32 {
    ISCSI_CRC.checksum(raw)
}

/// Serial number arithmetic (RFC 1982) on 32 bit TSNs.
pub(crate) fn sna32lt(i1: u32, i2: u32) -> bool {
    (i1 < i2 && i2 - i1 < 1 << 31) || (i1 > i2 && i1 - i2 > 1 << 31)
}

pub(crate) fn sna32lte(i1: u32, i2: u32) -> bool {
    i1 == i2 || sna32lt(i1, i2)
}

pub(crate) fn sna32gt(i1: u32, i2: u32) -> bool {
    (i1 < i2 && (i2 - i1) >= 1 << 31) || (i1 > i2 && (i1 - i2) <= 1 << 31)
}

pub(crate) fn sna32gte(i1: u32, i2: u32) -> bool {
    i1 == i2 || sna32gt(i1, i2)
}

/// Serial number arithmetic on 16 bit stream sequence numbers.
pub(crate) fn sna16lt(i1: u16, i2: u16) -> bool {
    (i1 < i2 && (i2 - i1) < 1 << 15) || (i1 > i2 && (i1 - i2) > 1 << 15)
}

pub(crate) fn sna16lte(i1: u16, i2: u16) -> bool {
    i1 == i2 || sna16lt(i1, i2)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_serial_number_arithmetic() {
        assert!(sna32lt(1, 2));
        assert!(sna32lt(u32::MAX, 0));
        assert!(!sna32lt(0, u32::MAX));
        assert!(sna32lte(7, 7));
        assert!(sna32gt(0, u32::MAX));
        assert!(sna32gte(5, 5));
        assert!(!sna32gt(5, 6));

        assert!(sna16lt(u16::MAX, 0));
        assert!(sna16lt(100, 101));
        assert!(!sna16lt(101, 100));
        assert!(sna16lte(3, 3));
    }

    #[test]
    fn test_checksum() {
        // RFC 3720 B.4, 32 bytes of zeroes
        assert_eq!(generate_packet_checksum(&[0u8; 32]), 0x8a9136aa);
    }
}
