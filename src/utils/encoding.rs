use std::io::{self, Write};

/// Encode a u32 as a variable-length integer
pub fn encode_varint(mut value: u32, buf: &mut Vec<u8>) {
    loop {
        if value < 0x80 {
            buf.push(value as u8);
            break;
        }
        buf.push((value as u8) | 0x80);
        value >>= 7;
    }
}

/// Decode a variable-length u32 from the front of `buf`, returning
/// `(value, bytes_consumed)`. Encodings longer than five bytes or carrying
/// bits past 32 are rejected.
pub fn decode_varint(buf: &[u8]) -> Option<(u32, usize)> {
    let mut result: u32 = 0;

    for (i, &byte) in buf.iter().take(5).enumerate() {
        let payload = (byte & 0x7F) as u32;
        if i == 4 && payload > 0x0F {
            return None;
        }
        result |= payload << (7 * i);

        if byte & 0x80 == 0 {
            return Some((result, i + 1));
        }
    }

    None
}

/// Write a u32 in little-endian format
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Write a u64 in little-endian format
pub fn write_u64_le<W: Write>(writer: &mut W, value: u64) -> io::Result<()> {
    writer.write_all(&value.to_le_bytes())
}

/// Read a little-endian u32 at `pos`, if the slice is long enough
#[inline]
pub fn read_u32_le_at(buf: &[u8], pos: usize) -> Option<u32> {
    let bytes = buf.get(pos..pos.checked_add(4)?)?;
    Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
}

/// Read a little-endian u64 at `pos`, if the slice is long enough
#[inline]
pub fn read_u64_le_at(buf: &[u8], pos: usize) -> Option<u64> {
    let bytes = buf.get(pos..pos.checked_add(8)?)?;
    let mut raw = [0u8; 8];
    raw.copy_from_slice(bytes);
    Some(u64::from_le_bytes(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_varint_roundtrip() {
        let values = [0, 1, 127, 128, 16383, 16384, u32::MAX];
        for value in values {
            let mut buf = Vec::new();
            encode_varint(value, &mut buf);
            let (decoded, _) = decode_varint(&buf).unwrap();
            assert_eq!(value, decoded);
        }
    }

    #[test]
    fn test_varint_incomplete() {
        assert_eq!(decode_varint(&[0x80, 0x80]), None);
        assert_eq!(decode_varint(&[]), None);
    }

    #[test]
    fn test_varint_overflow_rejected() {
        assert_eq!(decode_varint(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]), Some((u32::MAX, 5)));
        assert_eq!(decode_varint(&[0xFF, 0xFF, 0xFF, 0xFF, 0x1F]), None);
        assert_eq!(decode_varint(&[0x80, 0x80, 0x80, 0x80, 0x80, 0x00]), None);
    }

    #[test]
    fn test_read_at_bounds() {
        let mut buf = Vec::new();
        write_u32_le(&mut buf, 0xDEADBEEF).unwrap();
        write_u64_le(&mut buf, 7).unwrap();
        assert_eq!(read_u32_le_at(&buf, 0), Some(0xDEADBEEF));
        assert_eq!(read_u64_le_at(&buf, 4), Some(7));
        assert_eq!(read_u32_le_at(&buf, 10), None);
        assert_eq!(read_u64_le_at(&buf, usize::MAX), None);
    }
}
