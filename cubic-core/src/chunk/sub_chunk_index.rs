//! Sparse, ordered set of the sub-chunks resident in one column.

use std::collections::{BTreeMap, btree_map::Entry};
use std::ops::{Bound, RangeInclusive};
use std::sync::Arc;

use cubic_utils::{ColumnPos, locks::SyncRwLock};

use crate::chunk::{
    block_storage::BlockStorage,
    sub_chunk::{EmptySubChunkFactory, SubChunk, SubChunkFactory},
};

/// One slot of the legacy projection.
pub type LegacySegment = Option<Arc<SyncRwLock<BlockStorage>>>;

/// `min..=max`, or an empty range when the bounds are inverted.
fn inclusive_bounds(min: i32, max: i32) -> (Bound<i32>, Bound<i32>) {
    if min <= max {
        (Bound::Included(min), Bound::Included(max))
    } else {
        (Bound::Included(min), Bound::Excluded(min))
    }
}

/// The sub-chunks of a column keyed by vertical index.
#[derive(Debug)]
pub struct SubChunkIndex {
    column: ColumnPos,
    has_sky: bool,
    sub_chunks: BTreeMap<i32, SubChunk>,
    factory: Arc<dyn SubChunkFactory>,
    /// Dense projection for fixed-height consumers, dropped on every membership change.
    legacy_view: Option<Box<[LegacySegment]>>,
}

impl SubChunkIndex {
    /// Creates an empty index allocating sub-chunks through the empty factory.
    #[must_use]
    pub fn new(column: ColumnPos, has_sky: bool) -> Self {
        Self::with_factory(column, has_sky, Arc::new(EmptySubChunkFactory))
    }

    /// Creates an empty index allocating sub-chunks through the given factory.
    #[must_use]
    pub fn with_factory(
        column: ColumnPos,
        has_sky: bool,
        factory: Arc<dyn SubChunkFactory>,
    ) -> Self {
        Self {
            column,
            has_sky,
            sub_chunks: BTreeMap::new(),
            factory,
            legacy_view: None,
        }
    }

    /// The factory new sub-chunks come from.
    #[must_use]
    pub fn factory(&self) -> &Arc<dyn SubChunkFactory> {
        &self.factory
    }

    /// Number of resident sub-chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sub_chunks.len()
    }

    /// Returns true if no sub-chunk is resident.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sub_chunks.is_empty()
    }

    /// Returns true if a sub-chunk is resident at `y`.
    #[must_use]
    pub fn contains(&self, y: i32) -> bool {
        self.sub_chunks.contains_key(&y)
    }

    /// Gets the sub-chunk at `y`.
    #[must_use]
    pub fn get(&self, y: i32) -> Option<&SubChunk> {
        self.sub_chunks.get(&y)
    }

    /// Gets the sub-chunk at `y` mutably.
    pub fn get_mut(&mut self, y: i32) -> Option<&mut SubChunk> {
        self.sub_chunks.get_mut(&y)
    }

    /// Gets the sub-chunk at `y`, creating an empty one if absent.
    pub fn get_or_create(&mut self, y: i32) -> &mut SubChunk {
        match self.sub_chunks.entry(y) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                self.legacy_view = None;
                entry.insert(
                    self.factory
                        .create(self.column.x, y, self.column.z, self.has_sky),
                )
            }
        }
    }

    /// Creates an empty sub-chunk at `y`.
    ///
    /// If one is already resident it is kept untouched and returned instead.
    pub fn add_empty(&mut self, y: i32) -> &mut SubChunk {
        match self.sub_chunks.entry(y) {
            Entry::Occupied(entry) => {
                log::warn!("Column {} already has sub-chunk at {y}!", self.column);
                entry.into_mut()
            }
            Entry::Vacant(entry) => {
                self.legacy_view = None;
                entry.insert(
                    self.factory
                        .create(self.column.x, y, self.column.z, self.has_sky),
                )
            }
        }
    }

    /// Inserts a sub-chunk at its own vertical index, returning the one it replaced.
    pub fn insert(&mut self, sub_chunk: SubChunk) -> Option<SubChunk> {
        self.legacy_view = None;
        self.sub_chunks.insert(sub_chunk.y(), sub_chunk)
    }

    /// Removes the sub-chunk at `y`.
    pub fn remove(&mut self, y: i32) -> Option<SubChunk> {
        self.legacy_view = None;
        self.sub_chunks.remove(&y)
    }

    /// Sub-chunks whose index lies in `min_y..=max_y`, bottom to top.
    pub fn range(&self, min_y: i32, max_y: i32) -> impl DoubleEndedIterator<Item = &SubChunk> {
        self.sub_chunks
            .range(inclusive_bounds(min_y, max_y))
            .map(|(_, sub_chunk)| sub_chunk)
    }

    /// Mutable variant of [`SubChunkIndex::range`].
    pub fn range_mut(
        &mut self,
        min_y: i32,
        max_y: i32,
    ) -> impl DoubleEndedIterator<Item = &mut SubChunk> {
        self.sub_chunks
            .range_mut(inclusive_bounds(min_y, max_y))
            .map(|(_, sub_chunk)| sub_chunk)
    }

    /// All sub-chunks, bottom to top.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &SubChunk> {
        self.sub_chunks.values()
    }

    /// All resident vertical indices, ascending.
    pub fn ys(&self) -> impl DoubleEndedIterator<Item = i32> + '_ {
        self.sub_chunks.keys().copied()
    }

    /// The lowest resident index.
    #[must_use]
    pub fn first_y(&self) -> Option<i32> {
        self.sub_chunks.first_key_value().map(|(&y, _)| y)
    }

    /// The highest resident index.
    #[must_use]
    pub fn last_y(&self) -> Option<i32> {
        self.sub_chunks.last_key_value().map(|(&y, _)| y)
    }

    /// The minimal list of closed intervals covering every resident index.
    #[must_use]
    pub fn compressed_ranges(&self) -> Vec<RangeInclusive<i32>> {
        let mut ranges = Vec::new();
        let mut current: Option<(i32, i32)> = None;

        for y in self.ys() {
            current = match current {
                Some((start, stop)) if y == stop + 1 => Some((start, y)),
                Some((start, stop)) => {
                    ranges.push(start..=stop);
                    Some((y, y))
                }
                None => Some((y, y)),
            };
        }
        if let Some((start, stop)) = current {
            ranges.push(start..=stop);
        }

        ranges
    }

    /// Dense view with one slot per index from 0 up to the highest resident one.
    ///
    /// Built lazily and cached until the membership changes. Negative indices have no
    /// slot.
    pub fn legacy_view(&mut self) -> &[LegacySegment] {
        let sub_chunks = &self.sub_chunks;
        self.legacy_view.get_or_insert_with(|| {
            let len = sub_chunks
                .last_key_value()
                .and_then(|(&top, _)| usize::try_from(top).ok())
                .map_or(0, |top| top + 1);

            let mut segments: Box<[LegacySegment]> = (0..len).map(|_| None).collect();
            for (&y, sub_chunk) in sub_chunks.range(0..) {
                if let Ok(index) = usize::try_from(y) {
                    segments[index] = Some(Arc::clone(sub_chunk.storage()));
                }
            }
            segments
        })
    }

    /// Returns true if the legacy projection is currently cached.
    #[must_use]
    pub fn has_cached_legacy_view(&self) -> bool {
        self.legacy_view.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BlockId;

    fn index_with(ys: &[i32]) -> SubChunkIndex {
        let mut index = SubChunkIndex::new(ColumnPos::new(2, -3), true);
        for &y in ys {
            index.get_or_create(y);
        }
        index
    }

    #[test]
    fn test_get_or_create_returns_same_instance() {
        let mut index = index_with(&[]);
        index.get_or_create(5).set_block(0, 0, 0, BlockId(1), 0);
        let storage = Arc::clone(index.get_or_create(5).storage());

        assert_eq!(index.len(), 1);
        assert_eq!(storage.read().block(0, 0, 0), BlockId(1));
        assert!(Arc::ptr_eq(&storage, index.get_or_create(5).storage()));
    }

    #[test]
    fn test_add_empty_keeps_existing() {
        let mut index = index_with(&[1]);
        index.get_or_create(1).set_block(3, 3, 3, BlockId(2), 0);
        let sub_chunk = index.add_empty(1);
        assert_eq!(sub_chunk.block(3, 3, 3), BlockId(2));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_compressed_ranges() {
        let index = index_with(&[7, 2, 3, 8, 4]);
        assert_eq!(index.compressed_ranges(), vec![2..=4, 7..=8]);
        assert!(index_with(&[]).compressed_ranges().is_empty());
        assert_eq!(index_with(&[-1, 0]).compressed_ranges(), vec![-1..=0]);
    }

    #[test]
    fn test_range_is_inclusive_and_ordered() {
        let index = index_with(&[-2, 0, 3, 5, 9]);
        let ys: Vec<i32> = index.range(0, 5).map(SubChunk::y).collect();
        assert_eq!(ys, vec![0, 3, 5]);

        let top_down: Vec<i32> = index.range(-10, 10).rev().map(SubChunk::y).collect();
        assert_eq!(top_down, vec![9, 5, 3, 0, -2]);

        assert_eq!(index.range(5, 0).count(), 0);
    }

    #[test]
    fn test_legacy_view_layout_and_invalidation() {
        let mut index = index_with(&[-1, 0, 2]);
        {
            let view = index.legacy_view();
            assert_eq!(view.len(), 3);
            assert!(view[0].is_some());
            assert!(view[1].is_none());
            assert!(view[2].is_some());
        }
        assert!(index.has_cached_legacy_view());

        index.get_or_create(4);
        assert!(!index.has_cached_legacy_view());
        assert_eq!(index.legacy_view().len(), 5);

        index.remove(4);
        assert!(!index.has_cached_legacy_view());
        assert_eq!(index.legacy_view().len(), 3);
    }

    #[test]
    fn test_legacy_view_of_negative_column() {
        let mut index = index_with(&[-3, -1]);
        assert!(index.legacy_view().is_empty());
    }

    #[test]
    fn test_lookups_do_not_invalidate() {
        let mut index = index_with(&[0]);
        index.legacy_view();
        let _ = index.get(0);
        index.get_or_create(0);
        assert!(index.has_cached_legacy_view());
    }
}
