//! Primitive `i32 -> u8` map from identifier hash to occurrence mask.
//!
//! This is an open-addressing table with linear probing over two parallel
//! arrays, so the hot path (`update_mask`) never allocates beyond amortized
//! growth and never boxes keys or values.
//!
//! # Invariants
//! - Table size is a power of two; `keys.len() - 1` is the slot mask.
//! - Key `0` marks a free slot, so the hash `0` lives in a dedicated
//!   out-of-table slot (`zero_mask`) and behaves like every other key.
//! - `filled <= keys.len() * 3 / 4`.
//! - Any mutation drops the cached serialized bytes.

use crate::index::codec::encode_id_map;
use crate::index::entry::IdIndexEntry;
use std::borrow::Cow;
use std::fmt;

/// Smallest non-empty table size.
const MIN_CAPACITY: usize = 16;
/// Load factor numerator (3/4).
const LOAD_FACTOR_NUM: usize = 3;
/// Load factor denominator.
const LOAD_FACTOR_DEN: usize = 4;

/// Map from identifier hash to the OR of every occurrence mask seen for it.
#[derive(Clone, Default)]
pub struct IdHashMaskMap {
    keys: Vec<i32>,
    masks: Vec<u8>,
    /// Occupied table slots (excludes the zero key)
    filled: usize,
    zero_mask: Option<u8>,
    serialized: Option<Box<[u8]>>,
}

impl IdHashMaskMap {
    /// Create an empty map. No table is allocated until the first insert.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a map sized for `expected` entries without rehashing
    pub fn with_capacity(expected: usize) -> Self {
        let mut map = Self::new();
        if expected > 0 {
            map.allocate(table_size_for(expected));
        }
        map
    }

    /// Build from a generic entry mapping, OR-merging duplicate keys
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (IdIndexEntry, u8)>,
    {
        let entries = entries.into_iter();
        let mut map = Self::with_capacity(entries.size_hint().0);
        for (entry, mask) in entries {
            map.update_mask(entry.hash(), mask);
        }
        map
    }

    /// Insert `mask` for `hash`, or OR it into the stored mask
    #[inline]
    pub fn update_mask(&mut self, hash: i32, mask: u8) {
        self.serialized = None;

        if hash == 0 {
            self.zero_mask = Some(self.zero_mask.unwrap_or(0) | mask);
            return;
        }

        if self.keys.is_empty() {
            self.allocate(MIN_CAPACITY);
        }

        let slot = self.find_slot(hash);
        if self.keys[slot] == hash {
            self.masks[slot] |= mask;
            return;
        }

        self.keys[slot] = hash;
        self.masks[slot] = mask;
        self.filled += 1;

        if self.filled * LOAD_FACTOR_DEN > self.keys.len() * LOAD_FACTOR_NUM {
            self.rehash(self.keys.len() * 2);
        }
    }

    /// Number of distinct hashes
    #[inline]
    pub fn len(&self) -> usize {
        self.filled + usize::from(self.zero_mask.is_some())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored mask for a raw hash
    #[inline]
    pub fn get_mask(&self, hash: i32) -> Option<u8> {
        if hash == 0 {
            return self.zero_mask;
        }
        if self.keys.is_empty() {
            return None;
        }
        let slot = self.find_slot(hash);
        (self.keys[slot] == hash).then(|| self.masks[slot])
    }

    pub fn get(&self, entry: &IdIndexEntry) -> Option<u8> {
        self.get_mask(entry.hash())
    }

    pub fn contains_key(&self, entry: &IdIndexEntry) -> bool {
        self.get_mask(entry.hash()).is_some()
    }

    /// Visit every `(hash, mask)` pair without building entry objects.
    ///
    /// Order is unspecified. Returning `false` from `f` stops the walk;
    /// the return value tells whether every pair was visited.
    #[inline]
    pub fn for_each<F>(&self, mut f: F) -> bool
    where
        F: FnMut(i32, u8) -> bool,
    {
        if let Some(mask) = self.zero_mask {
            if !f(0, mask) {
                return false;
            }
        }
        for (&key, &mask) in self.keys.iter().zip(&self.masks) {
            if key != 0 && !f(key, mask) {
                return false;
            }
        }
        true
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            zero: self.zero_mask,
            slots: self.keys.iter().zip(&self.masks),
            remaining: self.len(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = IdIndexEntry> + '_ {
        self.iter().map(|(entry, _)| entry)
    }

    pub fn values(&self) -> impl Iterator<Item = u8> + '_ {
        self.iter().map(|(_, mask)| mask)
    }

    /// Encode the map now and keep the bytes until the next mutation
    pub fn prime_serialization(&mut self) {
        if self.serialized.is_none() {
            let mut buf = Vec::with_capacity(self.encoded_len_hint());
            encode_id_map(self, &mut buf);
            self.serialized = Some(buf.into_boxed_slice());
        }
    }

    /// Whether serialized bytes are already cached
    pub fn is_serialization_primed(&self) -> bool {
        self.serialized.is_some()
    }

    /// Serialized form, from the cache when primed
    pub fn serialized_bytes(&self) -> Cow<'_, [u8]> {
        match &self.serialized {
            Some(bytes) => Cow::Borrowed(bytes),
            None => {
                let mut buf = Vec::with_capacity(self.encoded_len_hint());
                encode_id_map(self, &mut buf);
                Cow::Owned(buf)
            }
        }
    }

    /// Approximate heap memory used by the table
    pub fn memory_usage(&self) -> usize {
        self.keys.capacity() * 4
            + self.masks.capacity()
            + self.serialized.as_ref().map_or(0, |b| b.len())
            + std::mem::size_of::<Self>()
    }

    fn encoded_len_hint(&self) -> usize {
        5 + self.len() * 5
    }

    fn allocate(&mut self, capacity: usize) {
        debug_assert!(capacity.is_power_of_two());
        self.keys = vec![0; capacity];
        self.masks = vec![0; capacity];
        self.filled = 0;
    }

    fn rehash(&mut self, capacity: usize) {
        let old_keys = std::mem::take(&mut self.keys);
        let old_masks = std::mem::take(&mut self.masks);
        self.allocate(capacity);

        for (key, mask) in old_keys.into_iter().zip(old_masks) {
            if key != 0 {
                let slot = self.find_slot(key);
                self.keys[slot] = key;
                self.masks[slot] = mask;
                self.filled += 1;
            }
        }
    }

    /// Slot holding `hash`, or the free slot where it would go.
    /// The table is never full, so the search always terminates.
    #[inline]
    fn find_slot(&self, hash: i32) -> usize {
        let slot_mask = self.keys.len() - 1;
        let mut slot = mix(hash) & slot_mask;
        loop {
            let key = self.keys[slot];
            if key == 0 || key == hash {
                return slot;
            }
            slot = (slot + 1) & slot_mask;
        }
    }
}

/// Spread low-entropy hashes (e.g. compact hashes) across the table
#[inline]
fn mix(hash: i32) -> usize {
    let h = (hash as u32).wrapping_mul(0x9E37_79B9);
    (h ^ (h >> 16)) as usize
}

fn table_size_for(expected: usize) -> usize {
    let needed = expected * LOAD_FACTOR_DEN / LOAD_FACTOR_NUM + 1;
    needed.next_power_of_two().max(MIN_CAPACITY)
}

impl PartialEq for IdHashMaskMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.for_each(|hash, mask| other.get_mask(hash) == Some(mask))
    }
}

impl Eq for IdHashMaskMap {}

impl fmt::Debug for IdHashMaskMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl Extend<(IdIndexEntry, u8)> for IdHashMaskMap {
    fn extend<T: IntoIterator<Item = (IdIndexEntry, u8)>>(&mut self, iter: T) {
        for (entry, mask) in iter {
            self.update_mask(entry.hash(), mask);
        }
    }
}

impl FromIterator<(IdIndexEntry, u8)> for IdHashMaskMap {
    fn from_iter<T: IntoIterator<Item = (IdIndexEntry, u8)>>(iter: T) -> Self {
        Self::from_entries(iter)
    }
}

impl<'a> IntoIterator for &'a IdHashMaskMap {
    type Item = (IdIndexEntry, u8);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Entry view over an [`IdHashMaskMap`]
pub struct Iter<'a> {
    zero: Option<u8>,
    slots: std::iter::Zip<std::slice::Iter<'a, i32>, std::slice::Iter<'a, u8>>,
    remaining: usize,
}

impl Iterator for Iter<'_> {
    type Item = (IdIndexEntry, u8);

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(mask) = self.zero.take() {
            self.remaining -= 1;
            return Some((IdIndexEntry::new(0), mask));
        }
        for (&key, &mask) in self.slots.by_ref() {
            if key != 0 {
                self.remaining -= 1;
                return Some((IdIndexEntry::new(key), mask));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Iter<'_> {}
