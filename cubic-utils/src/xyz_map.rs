//! Open-addressing hash table for objects addressed by integer `(x, y, z)` triples.
//!
//! The table uses linear probing over a power-of-two bucket array, so masking replaces
//! modulo. Removal never leaves tombstones: the cluster following the removed bucket is
//! collapsed backwards, which keeps every entry reachable by probing forward from its
//! ideal bucket.

use std::fmt::Debug;
use std::mem;

use thiserror::Error;

use crate::types::{BlockPos, SubChunkPos};

/// A large prime used as the seed of the coordinate hash.
const HASH_SEED: i32 = 1_183_822_147;

/// Largest bucket count a map may be created with.
pub const MAX_INITIAL_CAPACITY: usize = 1 << 30;

/// An object that knows its own integer coordinates.
pub trait XyzAddressable {
    /// The x coordinate.
    fn x(&self) -> i32;
    /// The y coordinate.
    fn y(&self) -> i32;
    /// The z coordinate.
    fn z(&self) -> i32;
}

impl XyzAddressable for SubChunkPos {
    fn x(&self) -> i32 {
        self.x
    }

    fn y(&self) -> i32 {
        self.y
    }

    fn z(&self) -> i32 {
        self.z
    }
}

impl XyzAddressable for BlockPos {
    fn x(&self) -> i32 {
        self.x
    }

    fn y(&self) -> i32 {
        self.y
    }

    fn z(&self) -> i32 {
        self.z
    }
}

/// Rejected map configurations.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum XyzMapError {
    /// The load factor must lie in `(0, 1]`.
    #[error("load factor {0} is not in (0, 1]")]
    InvalidLoadFactor(f32),
    /// The initial capacity rounds up past [`MAX_INITIAL_CAPACITY`].
    #[error("initial capacity {0} exceeds 2^30 buckets")]
    CapacityTooLarge(usize),
}

/// A hash map storing objects by their own coordinates.
///
/// Not synchronized; callers sharing it between threads must wrap it in a lock.
#[derive(Debug, Clone)]
pub struct XyzMap<T: XyzAddressable> {
    /// Backing array, always a power of two long.
    buckets: Box<[Option<T>]>,
    /// Number of occupied buckets.
    size: usize,
    /// Maximum permissible load before the table doubles.
    load_factor: f32,
    /// Occupied bucket count above which the table doubles.
    load_threshold: usize,
    /// `buckets.len() - 1`.
    mask: usize,
}

impl<T: XyzAddressable> XyzMap<T> {
    /// Creates a map with the given load factor and at least the given capacity.
    ///
    /// The capacity is rounded up to the next power of two, which may not exceed
    /// [`MAX_INITIAL_CAPACITY`].
    pub fn new(load_factor: f32, capacity: usize) -> Result<Self, XyzMapError> {
        if !(load_factor > 0.0 && load_factor <= 1.0) {
            return Err(XyzMapError::InvalidLoadFactor(load_factor));
        }

        let capacity = capacity
            .max(1)
            .checked_next_power_of_two()
            .filter(|&rounded| rounded <= MAX_INITIAL_CAPACITY)
            .ok_or(XyzMapError::CapacityTooLarge(capacity))?;
        let mut map = Self {
            buckets: Self::empty_buckets(capacity),
            size: 0,
            load_factor,
            load_threshold: 0,
            mask: 0,
        };
        map.refresh_fields();
        Ok(map)
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.size
    }

    /// Returns true if the map holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Returns the length of the backing array.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buckets.len()
    }

    /// Inserts the value at its own coordinates, returning the value it replaced.
    pub fn put(&mut self, value: T) -> Option<T> {
        let (x, y, z) = (value.x(), value.y(), value.z());
        let mut index = self.index_of(x, y, z);

        // find the closest empty bucket or the entry to replace
        while let Some(bucket) = &self.buckets[index] {
            if Self::is_at(bucket, x, y, z) {
                return self.buckets[index].replace(value);
            }
            index = self.next_index(index);
        }

        self.buckets[index] = Some(value);
        self.size += 1;
        if self.size > self.load_threshold {
            self.grow();
        }

        None
    }

    /// Returns the entry at the given coordinates.
    #[must_use]
    pub fn get(&self, x: i32, y: i32, z: i32) -> Option<&T> {
        self.find(x, y, z).and_then(|index| self.buckets[index].as_ref())
    }

    /// Returns the entry at the given coordinates mutably.
    ///
    /// The entry's coordinates must not be changed through the reference.
    pub fn get_mut(&mut self, x: i32, y: i32, z: i32) -> Option<&mut T> {
        self.find(x, y, z).and_then(|index| self.buckets[index].as_mut())
    }

    /// Returns true if an entry exists at the given coordinates.
    #[must_use]
    pub fn contains(&self, x: i32, y: i32, z: i32) -> bool {
        self.find(x, y, z).is_some()
    }

    /// Removes and returns the entry at the given coordinates.
    pub fn remove(&mut self, x: i32, y: i32, z: i32) -> Option<T> {
        let index = self.find(x, y, z)?;
        let removed = self.buckets[index].take();
        self.size -= 1;
        self.collapse_bucket(index);
        removed
    }

    /// Removes every entry, keeping the current capacity.
    pub fn clear(&mut self) {
        self.buckets.iter_mut().for_each(|bucket| *bucket = None);
        self.size = 0;
    }

    /// Iterates over all entries in bucket order.
    ///
    /// The order is stable as long as the map is not mutated.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.buckets.iter().flatten()
    }

    /// Iterates mutably over all entries in bucket order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut T> {
        self.buckets.iter_mut().flatten()
    }

    fn empty_buckets(capacity: usize) -> Box<[Option<T>]> {
        (0..capacity).map(|_| None).collect()
    }

    fn hash(x: i32, y: i32, z: i32) -> i32 {
        let mut hash = HASH_SEED;
        hash = hash.wrapping_add(x).wrapping_mul(HASH_SEED);
        hash = hash.wrapping_add(y).wrapping_mul(HASH_SEED);
        hash = hash.wrapping_add(z).wrapping_mul(HASH_SEED);
        hash
    }

    fn index_of(&self, x: i32, y: i32, z: i32) -> usize {
        (Self::hash(x, y, z) as u32 as usize) & self.mask
    }

    fn ideal_index(&self, value: &T) -> usize {
        self.index_of(value.x(), value.y(), value.z())
    }

    fn next_index(&self, index: usize) -> usize {
        (index + 1) & self.mask
    }

    fn is_at(value: &T, x: i32, y: i32, z: i32) -> bool {
        value.x() == x && value.y() == y && value.z() == z
    }

    /// Probes from the ideal bucket up to the next empty one.
    fn find(&self, x: i32, y: i32, z: i32) -> Option<usize> {
        let mut index = self.index_of(x, y, z);
        while let Some(bucket) = &self.buckets[index] {
            if Self::is_at(bucket, x, y, z) {
                return Some(index);
            }
            index = self.next_index(index);
        }
        None
    }

    /// Doubles the backing array and re-probes every entry into it.
    fn grow(&mut self) {
        let new_capacity = self.buckets.len() * 2;
        let old_buckets = mem::replace(&mut self.buckets, Self::empty_buckets(new_capacity));
        self.refresh_fields();

        for value in old_buckets.into_vec().into_iter().flatten() {
            let mut index = self.ideal_index(&value);
            while self.buckets[index].is_some() {
                index = self.next_index(index);
            }
            self.buckets[index] = Some(value);
        }
    }

    /// Fills the emptied bucket `hole` by shifting later entries of its cluster back.
    ///
    /// An entry at `current` may move into `hole` only if its ideal bucket does not lie
    /// cyclically in `(hole, current]`, otherwise it would become unreachable.
    fn collapse_bucket(&mut self, mut hole: usize) {
        let mut current = hole;
        loop {
            current = self.next_index(current);

            let Some(value) = &self.buckets[current] else {
                return;
            };
            let target = self.ideal_index(value);

            let movable = if hole < current {
                target <= hole || current < target
            } else {
                // the cluster wrapped around the end of the array
                hole >= target && target > current
            };

            if movable {
                self.buckets[hole] = self.buckets[current].take();
                hole = current;
            }
        }
    }

    fn refresh_fields(&mut self) {
        let len = self.buckets.len();
        // always keep one empty bucket so probing terminates
        self.load_threshold = (len - 1).min((len as f32 * self.load_factor) as usize);
        self.mask = len - 1;
    }
}

impl<'a, T: XyzAddressable> IntoIterator for &'a XyzMap<T> {
    type Item = &'a T;
    type IntoIter = std::iter::Flatten<std::slice::Iter<'a, Option<T>>>;

    fn into_iter(self) -> Self::IntoIter {
        self.buckets.iter().flatten()
    }
}
