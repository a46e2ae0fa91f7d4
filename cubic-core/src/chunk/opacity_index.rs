//! Column-local opacity record, independent of which sub-chunks are resident.
//!
//! Each of the 256 block columns keeps its opacity as a list of runs: a run starts at
//! its key height and lasts until the next key. The last run is transparent unless
//! opacity was written at `i32::MAX`, and neighbouring runs always differ, so the top
//! non-transparent block is the last key minus one.

use std::collections::BTreeMap;
use std::io::{Read, Write};

use cubic_utils::serial::{ReadFrom, WriteTo};

use crate::error::{ColumnReadError, ColumnWriteError};

const COLUMNS: usize = 256;

#[inline]
const fn column_index(x: usize, z: usize) -> usize {
    z << 4 | x
}

/// Opacity runs of a single block column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct OpacityRuns {
    runs: BTreeMap<i32, u8>,
}

impl OpacityRuns {
    fn get(&self, y: i32) -> u8 {
        self.runs.range(..=y).next_back().map_or(0, |(_, &opacity)| opacity)
    }

    fn set(&mut self, y: i32, opacity: u8) {
        let current = self.get(y);
        if current == opacity {
            return;
        }

        // heights above keep what they had, nothing lies above i32::MAX
        let above = y.checked_add(1);
        if let Some(above) = above {
            self.runs.entry(above).or_insert(current);
        }
        self.runs.insert(y, opacity);

        let below = self.runs.range(..y).next_back().map_or(0, |(_, &v)| v);
        if below == opacity {
            self.runs.remove(&y);
        }
        if let Some(above) = above.filter(|above| self.runs.get(above) == Some(&opacity)) {
            self.runs.remove(&above);
        }
    }

    fn top(&self) -> Option<i32> {
        let (&start, &opacity) = self.runs.last_key_value()?;
        // a non-transparent last run reaches i32::MAX
        if opacity == 0 { Some(start - 1) } else { Some(i32::MAX) }
    }

    fn is_well_formed(&self) -> bool {
        let first_is_set = self.runs.first_key_value().is_none_or(|(_, &v)| v != 0);
        let alternates = self
            .runs
            .values()
            .zip(self.runs.values().skip(1))
            .all(|(a, b)| a != b);
        first_is_set && alternates
    }
}

/// Opacity of every block ever written in a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpacityIndex {
    columns: Box<[OpacityRuns]>,
}

impl Default for OpacityIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl OpacityIndex {
    /// Creates an index where every height is transparent.
    #[must_use]
    pub fn new() -> Self {
        Self {
            columns: (0..COLUMNS).map(|_| OpacityRuns::default()).collect(),
        }
    }

    /// Gets the opacity recorded at a height, 0 if never written.
    #[must_use]
    pub fn opacity(&self, x: usize, y: i32, z: usize) -> u8 {
        self.columns[column_index(x, z)].get(y)
    }

    /// Records the opacity at a height.
    pub fn set_opacity(&mut self, x: usize, y: i32, z: usize, opacity: u8) {
        self.columns[column_index(x, z)].set(y, opacity);
    }

    /// The highest block with nonzero opacity in a block column.
    #[must_use]
    pub fn top_non_transparent(&self, x: usize, z: usize) -> Option<i32> {
        self.columns[column_index(x, z)].top()
    }

    /// The highest block with nonzero opacity anywhere in the column.
    #[must_use]
    pub fn top_non_transparent_overall(&self) -> Option<i32> {
        self.columns.iter().filter_map(OpacityRuns::top).max()
    }

    /// Writes every block column in `z * 16 + x` order as a run count followed by
    /// `(start, opacity)` pairs, big-endian.
    pub fn write_to(&self, writer: &mut impl Write) -> Result<(), ColumnWriteError> {
        for (position, column) in self.columns.iter().enumerate() {
            let count = u16::try_from(column.runs.len()).map_err(|_| {
                ColumnWriteError::TooManyOpacityRuns {
                    position,
                    runs: column.runs.len(),
                }
            })?;
            count.write(writer)?;
            for (&start, &opacity) in &column.runs {
                start.write(writer)?;
                opacity.write(writer)?;
            }
        }
        Ok(())
    }

    /// Reads an index written by [`OpacityIndex::write_to`].
    pub fn read_from(data: &mut impl Read) -> Result<Self, ColumnReadError> {
        let mut index = Self::new();
        for (position, column) in index.columns.iter_mut().enumerate() {
            let count = u16::read(data)?;
            let mut previous = None;
            for _ in 0..count {
                let start = i32::read(data)?;
                let opacity = u8::read(data)?;
                if previous.is_some_and(|p| p >= start) {
                    return Err(ColumnReadError::MalformedOpacityIndex { position });
                }
                previous = Some(start);
                column.runs.insert(start, opacity);
            }
            if !column.is_well_formed() {
                return Err(ColumnReadError::MalformedOpacityIndex { position });
            }
        }
        Ok(index)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::io::Cursor;
    use std::iter;

    use proptest::prelude::*;

    use super::*;

    #[test]
    fn test_top_follows_writes() {
        let mut index = OpacityIndex::new();
        assert_eq!(index.top_non_transparent(3, 4), None);

        index.set_opacity(3, 10, 4, 5);
        assert_eq!(index.top_non_transparent(3, 4), Some(10));

        index.set_opacity(3, 20, 4, 3);
        assert_eq!(index.top_non_transparent(3, 4), Some(20));

        index.set_opacity(3, 20, 4, 0);
        assert_eq!(index.top_non_transparent(3, 4), Some(10));

        index.set_opacity(3, 10, 4, 0);
        assert_eq!(index.top_non_transparent(3, 4), None);
        assert_eq!(index.top_non_transparent(4, 3), None);
    }

    #[test]
    fn test_reads_between_runs() {
        let mut index = OpacityIndex::new();
        index.set_opacity(0, -5, 0, 255);
        index.set_opacity(0, -4, 0, 255);
        index.set_opacity(0, 0, 0, 1);

        assert_eq!(index.opacity(0, -6, 0), 0);
        assert_eq!(index.opacity(0, -5, 0), 255);
        assert_eq!(index.opacity(0, -4, 0), 255);
        assert_eq!(index.opacity(0, -3, 0), 0);
        assert_eq!(index.opacity(0, 0, 0), 1);
        assert_eq!(index.opacity(0, 1, 0), 0);
    }

    #[test]
    fn test_extreme_heights() {
        let mut index = OpacityIndex::new();
        index.set_opacity(0, i32::MAX, 0, 5);
        assert_eq!(index.opacity(0, i32::MAX, 0), 5);
        assert_eq!(index.opacity(0, i32::MAX - 1, 0), 0);
        assert_eq!(index.top_non_transparent(0, 0), Some(i32::MAX));

        index.set_opacity(0, i32::MAX - 1, 0, 5);
        assert_eq!(index.columns[0].runs.len(), 1);
        assert_eq!(index.top_non_transparent(0, 0), Some(i32::MAX));

        index.set_opacity(0, i32::MAX, 0, 0);
        assert_eq!(index.top_non_transparent(0, 0), Some(i32::MAX - 1));
        index.set_opacity(0, i32::MAX - 1, 0, 0);
        assert_eq!(index.top_non_transparent(0, 0), None);
        assert!(index.columns[0].runs.is_empty());

        index.set_opacity(1, i32::MIN, 0, 7);
        assert_eq!(index.opacity(1, i32::MIN, 0), 7);
        assert_eq!(index.opacity(1, i32::MIN + 1, 0), 0);
        assert_eq!(index.top_non_transparent(1, 0), Some(i32::MIN));
        index.set_opacity(1, i32::MIN, 0, 0);
        assert!(index.columns[1].runs.is_empty());
    }

    #[test]
    fn test_open_ended_run_survives_round_trip() {
        let mut index = OpacityIndex::new();
        index.set_opacity(4, i32::MAX, 4, 255);
        index.set_opacity(4, 0, 4, 3);

        let mut bytes = Vec::new();
        index.write_to(&mut bytes).unwrap();
        let read = OpacityIndex::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(read, index);
        assert_eq!(read.top_non_transparent(4, 4), Some(i32::MAX));
    }

    #[test]
    fn test_adjacent_equal_runs_merge() {
        let mut index = OpacityIndex::new();
        for y in 0..16 {
            index.set_opacity(2, y, 2, 255);
        }
        assert_eq!(index.columns[column_index(2, 2)].runs.len(), 2);
        assert!(index.columns[column_index(2, 2)].is_well_formed());
    }

    #[test]
    fn test_overall_top() {
        let mut index = OpacityIndex::new();
        index.set_opacity(0, 12, 0, 2);
        index.set_opacity(15, 70, 15, 255);
        assert_eq!(index.top_non_transparent_overall(), Some(70));
    }

    #[test]
    fn test_serialized_layout() {
        let mut index = OpacityIndex::new();
        index.set_opacity(1, 10, 0, 5);

        let mut bytes = Vec::new();
        index.write_to(&mut bytes).unwrap();
        // 255 empty columns plus one with two runs
        assert_eq!(bytes.len(), 256 * 2 + 2 * 5);
        // position 1 comes right after the empty position 0
        assert_eq!(&bytes[2..4], &[0, 2]);
        assert_eq!(&bytes[4..9], &[0, 0, 0, 10, 5]);
        assert_eq!(&bytes[9..14], &[0, 0, 0, 11, 0]);

        let read = OpacityIndex::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(read, index);
    }

    #[test]
    fn test_rejects_malformed_runs() {
        let mut bytes = Vec::new();
        // two neighbouring runs with the same opacity
        2u16.write(&mut bytes).unwrap();
        4i32.write(&mut bytes).unwrap();
        7u8.write(&mut bytes).unwrap();
        9i32.write(&mut bytes).unwrap();
        7u8.write(&mut bytes).unwrap();
        bytes.extend(iter::repeat_n(0, 255 * 2));

        let err = OpacityIndex::read_from(&mut Cursor::new(bytes)).err();
        assert!(matches!(
            err,
            Some(ColumnReadError::MalformedOpacityIndex { position: 0 })
        ));
    }

    #[test]
    fn test_truncated_index() {
        let err = OpacityIndex::read_from(&mut Cursor::new(vec![0, 0, 0])).err();
        assert!(matches!(err, Some(ColumnReadError::Io(_))));
    }

    proptest! {
        // the runs agree with a plain height -> opacity map after any write sequence
        #[test]
        fn runs_match_model(writes in prop::collection::vec((-20i32..20, prop_oneof![Just(0u8), Just(1u8), Just(3u8), Just(255u8)]), 0..200)) {
            let mut index = OpacityIndex::new();
            let mut model = [0u8; 40];

            for (y, opacity) in writes {
                index.set_opacity(7, y, 9, opacity);
                model[(y + 20) as usize] = opacity;
            }

            for y in -25..25 {
                let expected = if (-20..20).contains(&y) { model[(y + 20) as usize] } else { 0 };
                prop_assert_eq!(index.opacity(7, y, 9), expected);
            }

            let top = (-20..20).rev().find(|&y| model[(y + 20) as usize] != 0);
            prop_assert_eq!(index.top_non_transparent(7, 9), top);
            prop_assert!(index.columns[column_index(7, 9)].is_well_formed());
        }
    }
}
