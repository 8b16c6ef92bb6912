use crate::index::entry::WordHashes;
use crate::index::hash_mask::IdHashMaskMap;
use crate::index::types::{EAGER_SERIALIZATION_THRESHOLD, HashAlgorithm};

/// Accumulates `(hash, mask)` pairs for one file scan.
///
/// Each identifier span is recorded under its case-sensitive hash and, when
/// different, under its case-insensitive hash, so both kinds of lookup can be
/// answered from a single pass. One collector serves exactly one file.
pub struct OccurrenceCollector {
    map: IdHashMaskMap,
    algorithm: HashAlgorithm,
    eager_threshold: usize,
}

impl OccurrenceCollector {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            map: IdHashMaskMap::new(),
            algorithm,
            eager_threshold: EAGER_SERIALIZATION_THRESHOLD,
        }
    }

    /// Override the eager serialization threshold
    pub fn with_eager_threshold(mut self, threshold: usize) -> Self {
        self.eager_threshold = threshold;
        self
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Record `text[start..end]` with `mask`.
    ///
    /// Empty spans and zero masks are ignored. Offsets are byte offsets and
    /// must lie on char boundaries.
    #[inline]
    pub fn add_occurrence(&mut self, text: &str, start: usize, end: usize, mask: u8) {
        if start == end || mask == 0 {
            return;
        }
        if let Some(hashes) = WordHashes::compute(&text[start..end], self.algorithm) {
            self.add_hashes(hashes, mask);
        }
    }

    /// Record precomputed hashes
    #[inline]
    pub fn add_hashes(&mut self, hashes: WordHashes, mask: u8) {
        if mask == 0 {
            return;
        }
        self.map.update_mask(hashes.sensitive, mask);
        if !hashes.is_case_invariant() {
            self.map.update_mask(hashes.insensitive, mask);
        }
    }

    /// Record a single precomputed hash
    #[inline]
    pub fn add_occurrence_hash(&mut self, hash: i32, mask: u8) {
        if mask != 0 {
            self.map.update_mask(hash, mask);
        }
    }

    /// Distinct hashes collected so far
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Finish the scan and hand the map over.
    ///
    /// Small maps are serialized here, on the scanning worker, so the shared
    /// index writer only copies bytes. Large maps are left for the writer to
    /// encode.
    pub fn into_result(mut self) -> IdHashMaskMap {
        if self.map.len() < self.eager_threshold {
            self.map.prime_serialization();
        }
        self.map
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::entry::{IdIndexEntry, string_hash};
    use crate::index::types::OccurrenceMask;

    #[test]
    fn test_lowercase_word_single_entry() {
        let mut collector = OccurrenceCollector::new(HashAlgorithm::Stronger);
        collector.add_occurrence("let foo = 1", 4, 7, OccurrenceMask::IN_CODE);
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_mixed_case_word_two_entries() {
        for algorithm in [HashAlgorithm::Stronger, HashAlgorithm::Compact] {
            let mut collector = OccurrenceCollector::new(algorithm);
            collector.add_occurrence("Foo", 0, 3, OccurrenceMask::IN_CODE);
            assert_eq!(collector.len(), 2);

            let map = collector.into_result();
            let sensitive = IdIndexEntry::from_word("Foo", true, algorithm);
            let insensitive = IdIndexEntry::from_word("fOO", false, algorithm);
            assert_eq!(map.get(&sensitive), Some(OccurrenceMask::IN_CODE));
            assert_eq!(map.get(&insensitive), Some(OccurrenceMask::IN_CODE));
        }
    }

    #[test]
    fn test_degenerate_occurrences_ignored() {
        let mut collector = OccurrenceCollector::new(HashAlgorithm::Stronger);
        collector.add_occurrence("foo", 0, 3, OccurrenceMask::IN_CODE);
        let before = collector.map.clone();

        collector.add_occurrence("foo bar", 4, 4, OccurrenceMask::IN_CODE);
        collector.add_occurrence("foo bar", 4, 7, 0);
        collector.add_occurrence_hash(99, 0);

        assert_eq!(collector.map, before);
        assert_eq!(collector.len(), 1);
    }

    #[test]
    fn test_same_word_in_two_contexts() {
        let mut collector = OccurrenceCollector::new(HashAlgorithm::Stronger);
        collector.add_occurrence("qwerty", 0, 6, OccurrenceMask::IN_CODE);
        collector.add_occurrence("\"qwerty\"", 1, 7, OccurrenceMask::IN_STRINGS);

        let map = collector.into_result();
        assert_eq!(
            map.get_mask(string_hash("qwerty")),
            Some(OccurrenceMask::IN_CODE | OccurrenceMask::IN_STRINGS)
        );
    }

    fn collector_with(entries: i32) -> OccurrenceCollector {
        let mut collector = OccurrenceCollector::new(HashAlgorithm::Stronger);
        for hash in 1..=entries {
            collector.add_occurrence_hash(hash, OccurrenceMask::IN_CODE);
        }
        collector
    }

    #[test]
    fn test_small_result_is_primed() {
        let map = collector_with(499).into_result();
        assert_eq!(map.len(), 499);
        assert!(map.is_serialization_primed());
    }

    #[test]
    fn test_large_result_is_not_primed() {
        let map = collector_with(501).into_result();
        assert_eq!(map.len(), 501);
        assert!(!map.is_serialization_primed());

        let boundary = collector_with(500).into_result();
        assert!(!boundary.is_serialization_primed());
    }

    #[test]
    fn test_threshold_override() {
        let map = collector_with(10).with_eager_threshold(5).into_result();
        assert!(!map.is_serialization_primed());
    }
}
