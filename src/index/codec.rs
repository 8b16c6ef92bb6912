//! On-disk form of one file's id map.
//!
//! Layout: varint entry count, then per entry a 4-byte little-endian hash
//! followed by a 1-byte mask. Masks are written masked to [`OccurrenceMask::ANY`].

use crate::index::error::CodecError;
use crate::index::hash_mask::IdHashMaskMap;
use crate::index::types::OccurrenceMask;
use crate::utils::{decode_varint, encode_varint};

/// Bytes per encoded entry
pub const ENTRY_SIZE: usize = 5;

/// Append the encoded map to `buf`
pub fn encode_id_map(map: &IdHashMaskMap, buf: &mut Vec<u8>) {
    encode_varint(map.len() as u32, buf);
    buf.reserve(map.len() * ENTRY_SIZE);
    map.for_each(|hash, mask| {
        buf.extend_from_slice(&hash.to_le_bytes());
        buf.push(mask & OccurrenceMask::ANY);
        true
    });
}

/// Decode a map from the start of `buf`.
/// Returns the map and the number of bytes consumed.
pub fn decode_id_map(buf: &[u8]) -> Result<(IdHashMaskMap, usize), CodecError> {
    let (count, header) = decode_varint(buf).ok_or(CodecError::BadHeader)?;
    let needed = header + count as usize * ENTRY_SIZE;
    if buf.len() < needed {
        return Err(CodecError::Truncated {
            entries: count,
            needed,
            available: buf.len(),
        });
    }

    let mut map = IdHashMaskMap::with_capacity(count as usize);
    for_each_encoded(&buf[header..needed], |hash, mask| {
        map.update_mask(hash, mask);
        true
    });
    Ok((map, needed))
}

/// Walk encoded entries without building a map.
/// `entries` must hold whole entries only (no count prefix).
pub fn for_each_encoded<F>(entries: &[u8], mut f: F) -> bool
where
    F: FnMut(i32, u8) -> bool,
{
    for chunk in entries.chunks_exact(ENTRY_SIZE) {
        let hash = i32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        if !f(hash, chunk[4]) {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_map() -> IdHashMaskMap {
        let mut map = IdHashMaskMap::new();
        map.update_mask(0, OccurrenceMask::IN_CODE);
        map.update_mask(i32::MIN, OccurrenceMask::ANY);
        map.update_mask(12345, OccurrenceMask::IN_COMMENTS | OccurrenceMask::IN_STRINGS);
        map
    }

    #[test]
    fn test_decode_restores_map() {
        let map = sample_map();
        let mut buf = Vec::new();
        encode_id_map(&map, &mut buf);

        assert_eq!(buf.len(), 1 + 3 * ENTRY_SIZE);
        let (decoded, consumed) = decode_id_map(&buf).unwrap();
        assert_eq!(consumed, buf.len());
        assert_eq!(decoded, map);
    }

    #[test]
    fn test_decode_stops_at_record_end() {
        let mut buf = Vec::new();
        encode_id_map(&sample_map(), &mut buf);
        let first_len = buf.len();
        encode_id_map(&IdHashMaskMap::new(), &mut buf);

        let (_, consumed) = decode_id_map(&buf).unwrap();
        assert_eq!(consumed, first_len);
        let (empty, rest) = decode_id_map(&buf[consumed..]).unwrap();
        assert!(empty.is_empty());
        assert_eq!(rest, 1);
    }

    #[test]
    fn test_truncated_input() {
        let mut buf = Vec::new();
        encode_id_map(&sample_map(), &mut buf);
        buf.truncate(buf.len() - 2);

        match decode_id_map(&buf) {
            Err(CodecError::Truncated { entries, .. }) => assert_eq!(entries, 3),
            other => panic!("expected truncation error, got {:?}", other),
        }
        assert_eq!(decode_id_map(&[]).unwrap_err(), CodecError::BadHeader);
    }

    #[test]
    fn test_primed_bytes_match_fresh_encoding() {
        let mut map = sample_map();
        let fresh = map.serialized_bytes().into_owned();
        map.prime_serialization();
        assert_eq!(map.serialized_bytes().as_ref(), fresh.as_slice());
    }
}
