//! An open-addressed hash table preserving insertion order.
//!
//! Entries are packed in a contiguous, insertion-ordered array; a
//! separate bucket-head array maps `hash % bucket_count` to the first
//! entry in that bucket's chain, each entry carrying the index of the
//! next entry sharing its bucket. Erasing an entry swaps the last entry
//! into the freed slot and patches whatever pointed at the moved entry,
//! so entries stay packed without leaving holes.

use std::sync::atomic::{AtomicU64, Ordering};

use super::resbuf::ResBuf;
use super::string::JsonString;
use super::value::Value;
use crate::error::AllocError;
use crate::resource::ResourceHandle;

const NULL_INDEX: u32 = u32::MAX;
const LOAD_FACTOR: f64 = 0.75;
const MIN_ENTRY_CAPACITY: usize = 16;

/// Ascending prime bucket counts ("load factor 0.75
/// ... bucket count taken from a fixed ascending prime table").
const PRIMES: &[usize] = &[
    2, 5, 11, 23, 47, 97, 197, 397, 797, 1597, 3203, 6421, 12853, 25717, 51437, 102877, 205759, 411527, 823117,
    1646237, 3292489, 6584983, 13169977, 26339969, 52679969, 105359939, 210719881, 421439783, 842879579, 1685759167,
];

fn bucket_count_at_least(min: usize) -> usize {
    PRIMES
        .iter()
        .copied()
        .find(|&p| p >= min)
        .unwrap_or(*PRIMES.last().expect("PRIMES is non-empty"))
}

fn splitmix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    let mut x = z;
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

static SALT_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Draws a per-instance salt from a process-wide counter mixed with a
/// caller-supplied address, so bucket selection varies across instances
/// and process runs without needing an OS entropy source (see `DESIGN.md`, Open
/// Question 4).
fn next_salt(mix: usize) -> u64 {
    let counter = SALT_COUNTER.fetch_add(1, Ordering::Relaxed);
    splitmix64(counter.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ mix as u64)
}

fn fnv1a(bytes: &[u8], salt: u64) -> u64 {
    let mut hash = 0xcbf2_9ce4_8422_2325u64 ^ salt;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x100_0000_01b3);
    }
    hash
}

struct Entry {
    key: JsonString,
    value: Value,
    hash: u64,
    next: u32,
}

/// A resource-backed object preserving insertion order on iteration.
pub struct JsonObject {
    entries: ResBuf<Entry>,
    buckets: ResBuf<u32>,
    salt: u64,
}

impl JsonObject {
    /// An empty object using the default resource.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(ResourceHandle::default())
    }

    /// An empty object allocating from `resource` once it grows.
    #[must_use]
    pub fn new_in(resource: ResourceHandle) -> Self {
        let token = 0u8;
        let salt = next_salt(std::ptr::addr_of!(token) as usize);
        Self {
            entries: ResBuf::new_in(resource.clone()),
            buckets: ResBuf::new_in(resource),
            salt,
        }
    }

    /// Builds an object of exactly `len` key-value pairs from an
    /// exact-size iterator, as the value builder needs. Later
    /// pairs overwrite earlier ones with the same key (see `DESIGN.md`, Open Question
    /// 2: "keep last").
    pub fn from_exact_pairs_in<I>(resource: ResourceHandle, len: usize, pairs: I) -> Result<Self, AllocError>
    where
        I: Iterator<Item = (JsonString, Value)>,
    {
        let mut obj = Self::new_in(resource);
        obj.reserve(len)?;
        for (key, value) in pairs {
            obj.emplace(key, value)?;
        }
        Ok(obj)
    }

    /// The resource this object allocates from.
    #[must_use]
    pub fn resource(&self) -> &ResourceHandle {
        self.entries.resource()
    }

    /// Number of key-value pairs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when the object has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.len() == 0
    }

    /// An iterator over `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.as_slice().iter().map(|e| (e.key.as_str(), &e.value))
    }

    /// The `(key, value)` pair at insertion-order position `idx`, for
    /// callers (such as the serializer) that walk entries by index
    /// instead of through [`JsonObject::iter`].
    #[must_use]
    pub fn get_index(&self, idx: usize) -> Option<(&str, &Value)> {
        self.entries.as_slice().get(idx).map(|e| (e.key.as_str(), &e.value))
    }

    /// Reserves room for at least `additional` more entries, rehashing
    /// the bucket table up front if needed.
    pub fn reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        let target_len = self.entries.len() + additional;
        self.entries.ensure_capacity(additional, MIN_ENTRY_CAPACITY.max(target_len))?;
        self.maybe_rehash_for_len(target_len)
    }

    fn bucket_for(&self, hash: u64) -> usize {
        debug_assert!(!self.buckets.as_slice().is_empty());
        (hash % self.buckets.len() as u64) as usize
    }

    fn maybe_rehash_for_len(&mut self, len: usize) -> Result<(), AllocError> {
        let needed_buckets = ((len as f64 / LOAD_FACTOR).ceil() as usize).max(1);
        if self.buckets.is_empty() || needed_buckets > self.buckets.len() {
            let target = if self.buckets.is_empty() {
                needed_buckets
            } else {
                needed_buckets.max(self.buckets.len() * 2)
            };
            self.rehash(bucket_count_at_least(target))?;
        }
        Ok(())
    }

    fn rehash(&mut self, new_bucket_count: usize) -> Result<(), AllocError> {
        let mut new_buckets: ResBuf<u32> = ResBuf::from_exact_iter(
            self.entries.resource().clone(),
            new_bucket_count,
            std::iter::repeat(NULL_INDEX).take(new_bucket_count),
        )?;
        for (idx, entry) in self.entries.as_mut_slice().iter_mut().enumerate() {
            let bucket = (entry.hash % new_bucket_count as u64) as usize;
            let head = new_buckets.as_slice()[bucket];
            entry.next = head;
            new_buckets.as_mut_slice()[bucket] = idx as u32;
        }
        self.buckets = new_buckets;
        Ok(())
    }

    fn find_slot(&self, key: &str) -> Option<(usize, u64)> {
        if self.buckets.is_empty() {
            return None;
        }
        let salt = self.salt();
        let hash = fnv1a(key.as_bytes(), salt);
        let bucket = self.bucket_for(hash);
        let mut cur = self.buckets.as_slice()[bucket];
        let entries = self.entries.as_slice();
        while cur != NULL_INDEX {
            let entry = &entries[cur as usize];
            if entry.hash == hash && entry.key.as_str() == key {
                return Some((cur as usize, hash));
            }
            cur = entry.next;
        }
        None
    }

    fn salt(&self) -> u64 {
        self.salt
    }

    /// Inserts or overwrites `key` with `value`, returning `(index,
    /// inserted)`: `inserted` is `false` when `key` already existed (its
    /// value was overwritten in place, keeping the original position).
    pub fn emplace(&mut self, key: JsonString, value: Value) -> Result<(usize, bool), AllocError> {
        if self.buckets.is_empty() {
            self.rehash(bucket_count_at_least(MIN_ENTRY_CAPACITY))?;
        }
        if let Some((idx, _)) = self.find_slot(key.as_str()) {
            self.entries.as_mut_slice()[idx].value = value;
            return Ok((idx, false));
        }

        self.maybe_rehash_for_len(self.entries.len() + 1)?;

        let salt = self.salt();
        let hash = fnv1a(key.as_bytes(), salt);
        let bucket = self.bucket_for(hash);
        let head = self.buckets.as_slice()[bucket];
        let new_idx = self.entries.len();
        self.entries.push(
            Entry {
                key,
                value,
                hash,
                next: head,
            },
            MIN_ENTRY_CAPACITY,
        )?;
        self.buckets.as_mut_slice()[bucket] = new_idx as u32;
        Ok((new_idx, true))
    }

    /// Looks up `key`.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&Value> {
        self.find_slot(key).map(|(idx, _)| &self.entries.as_slice()[idx].value)
    }

    /// Mutably looks up `key`.
    pub fn find_mut(&mut self, key: &str) -> Option<&mut Value> {
        let idx = self.find_slot(key)?.0;
        Some(&mut self.entries.as_mut_slice()[idx].value)
    }

    /// `true` when `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.find_slot(key).is_some()
    }

    /// Removes `key`, returning its value if it was present.
    pub fn erase(&mut self, key: &str) -> Option<Value> {
        let (idx, hash) = self.find_slot(key)?;
        self.unlink(idx, hash);

        let last = self.entries.len() - 1;
        if idx != last {
            let moved_hash = self.entries.as_slice()[last].hash;
            let moved_bucket = self.bucket_for(moved_hash);
            let mut cur = self.buckets.as_slice()[moved_bucket];
            if cur == last as u32 {
                self.buckets.as_mut_slice()[moved_bucket] = idx as u32;
            } else {
                loop {
                    let next = self.entries.as_slice()[cur as usize].next;
                    if next == last as u32 {
                        self.entries.as_mut_slice()[cur as usize].next = idx as u32;
                        break;
                    }
                    cur = next;
                }
            }
        }
        let removed = self.entries.swap_remove(idx);
        Some(removed.value)
    }

    fn unlink(&mut self, idx: usize, hash: u64) {
        let bucket = self.bucket_for(hash);
        let mut cur = self.buckets.as_slice()[bucket];
        if cur == idx as u32 {
            self.buckets.as_mut_slice()[bucket] = self.entries.as_slice()[idx].next;
            return;
        }
        loop {
            let next = self.entries.as_slice()[cur as usize].next;
            if next == idx as u32 {
                self.entries.as_mut_slice()[cur as usize].next = self.entries.as_slice()[idx].next;
                return;
            }
            cur = next;
        }
    }

    /// Drops every entry, keeping the backing allocations.
    pub fn clear(&mut self) {
        self.entries.clear();
        for b in self.buckets.as_mut_slice() {
            *b = NULL_INDEX;
        }
    }
}

impl Default for JsonObject {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for JsonObject {
    fn clone(&self) -> Self {
        let resource = self.resource().clone();
        let len = self.len();
        let pairs = self.iter().map(|(k, v)| (JsonString::from_str_in(resource.clone(), k).expect("clone key"), v.clone()));
        Self::from_exact_pairs_in(resource.clone(), len, pairs)
            .unwrap_or_else(|_| Self::from_exact_pairs_in(ResourceHandle::default(), len, self.iter().map(|(k, v)| (JsonString::from_str_in(ResourceHandle::default(), k).expect("clone key"), v.clone()))).expect("default resource"))
    }
}

impl PartialEq for JsonObject {
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().all(|(k, v)| other.find(k) == Some(v))
    }
}

impl std::fmt::Debug for JsonObject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
