#![no_main]

use idindex::index::codec::{decode_id_map, encode_id_map};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decode or fail cleanly; whatever decodes must re-encode to the same map
    if let Ok((map, _)) = decode_id_map(data) {
        let mut buf = Vec::new();
        encode_id_map(&map, &mut buf);
        let (again, used) = decode_id_map(&buf).expect("re-encoded map must decode");
        assert_eq!(used, buf.len());
        assert_eq!(again, map);
    }
});
