//! WrapIndex - buffer row ↔ screen row mapping via Fenwick tree
//!
//! Each buffer row occupies one or more screen rows once soft wrap is applied.
//! The index stores those counts and answers:
//!
//! - first screen row of a buffer row (`start_of`): O(log n)
//! - buffer row rendered on a screen row (`lower_bound`): O(log² n)
//! - single-row updates after an edit (`set`): O(log n)

/// Prefix sums of screen rows per buffer row.
#[derive(Debug, Clone)]
pub struct WrapIndex {
    /// Fenwick tree backing storage, exactly `len` long.
    tree: Vec<isize>,
    len: usize,
}

impl WrapIndex {
    /// Builds an index from per-buffer-row screen row counts.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scroll_keeper::host::wrap_index::WrapIndex;
    /// let index = WrapIndex::from_heights(&[1, 3, 2]);
    /// assert_eq!(index.total(), 6);
    /// assert_eq!(index.start_of(2), 4);
    /// ```
    pub fn from_heights(heights: &[usize]) -> Self {
        let mut tree = vec![0isize; heights.len()];
        for (index, &height) in heights.iter().enumerate() {
            fenwick::array::update(&mut tree, index, height as isize);
        }
        Self {
            tree,
            len: heights.len(),
        }
    }

    /// Screen rows occupied by a buffer row.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn height(&self, index: usize) -> usize {
        self.prefix_sum(index) - self.start_of(index)
    }

    /// Sets the screen row count of a buffer row.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn set(&mut self, index: usize, height: usize) {
        let delta = height as isize - self.height(index) as isize;
        if delta != 0 {
            fenwick::array::update(&mut self.tree, index, delta);
        }
    }

    /// Screen rows occupied by buffer rows `0..=index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn prefix_sum(&self, index: usize) -> usize {
        assert!(
            index < self.len,
            "index {} out of bounds (len: {})",
            index,
            self.len
        );
        fenwick::array::prefix_sum(&self.tree, index).max(0) as usize
    }

    /// First screen row of a buffer row.
    ///
    /// # Panics
    ///
    /// Panics if `index >= len()`.
    pub fn start_of(&self, index: usize) -> usize {
        assert!(
            index < self.len,
            "index {} out of bounds (len: {})",
            index,
            self.len
        );
        if index == 0 {
            0
        } else {
            self.prefix_sum(index - 1)
        }
    }

    /// Buffer row containing a screen row: the first index whose prefix sum
    /// exceeds `screen_row`. `None` past the last screen row.
    ///
    /// # Examples
    ///
    /// ```
    /// # use scroll_keeper::host::wrap_index::WrapIndex;
    /// let index = WrapIndex::from_heights(&[1, 3, 2]);
    /// assert_eq!(index.lower_bound(0), Some(0));
    /// assert_eq!(index.lower_bound(3), Some(1));
    /// assert_eq!(index.lower_bound(4), Some(2));
    /// assert_eq!(index.lower_bound(6), None);
    /// ```
    pub fn lower_bound(&self, screen_row: usize) -> Option<usize> {
        let mut left = 0;
        let mut right = self.len;

        while left < right {
            let mid = left + (right - left) / 2;
            if self.prefix_sum(mid) > screen_row {
                right = mid;
            } else {
                left = mid + 1;
            }
        }

        (left < self.len).then_some(left)
    }

    /// Total screen rows.
    pub fn total(&self) -> usize {
        if self.len == 0 {
            0
        } else {
            self.prefix_sum(self.len - 1)
        }
    }

    /// Number of buffer rows.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the index covers no buffer rows.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_index_has_no_rows() {
        let index = WrapIndex::from_heights(&[]);
        assert!(index.is_empty());
        assert_eq!(index.total(), 0);
        assert_eq!(index.lower_bound(0), None);
    }

    #[test]
    fn unwrapped_rows_map_one_to_one() {
        let index = WrapIndex::from_heights(&[1; 10]);
        for row in 0..10 {
            assert_eq!(index.start_of(row), row);
            assert_eq!(index.lower_bound(row), Some(row));
        }
    }

    #[test]
    fn set_shifts_following_rows() {
        let mut index = WrapIndex::from_heights(&[1, 1, 1, 1]);
        index.set(1, 3);

        assert_eq!(index.height(1), 3);
        assert_eq!(index.start_of(2), 4);
        assert_eq!(index.total(), 6);
        assert_eq!(index.lower_bound(2), Some(1));
        assert_eq!(index.lower_bound(3), Some(1));
        assert_eq!(index.lower_bound(4), Some(2));
    }

    #[test]
    fn every_continuation_row_maps_back_to_its_buffer_row() {
        let index = WrapIndex::from_heights(&[2, 1, 4]);
        let expected = [0, 0, 1, 2, 2, 2, 2];
        for (screen, buffer) in expected.iter().enumerate() {
            assert_eq!(index.lower_bound(screen), Some(*buffer));
        }
    }

    proptest! {
        /// start_of(i) lands on buffer row i, and the row before it belongs to i - 1.
        #[test]
        fn prop_start_of_inverts_lower_bound(heights in prop::collection::vec(1usize..=5, 1..60)) {
            let index = WrapIndex::from_heights(&heights);
            for row in 0..heights.len() {
                let start = index.start_of(row);
                prop_assert_eq!(index.lower_bound(start), Some(row));
                if row > 0 {
                    prop_assert_eq!(index.lower_bound(start - 1), Some(row - 1));
                }
            }
        }

        /// total equals the sum of heights.
        #[test]
        fn prop_total_is_sum(heights in prop::collection::vec(1usize..=5, 0..60)) {
            let index = WrapIndex::from_heights(&heights);
            prop_assert_eq!(index.total(), heights.iter().sum::<usize>());
        }

        /// set changes only the targeted height.
        #[test]
        fn prop_set_updates_height(
            heights in prop::collection::vec(1usize..=5, 1..40),
            target in 0usize..40,
            new_height in 1usize..=5
        ) {
            let mut index = WrapIndex::from_heights(&heights);
            if target < heights.len() {
                index.set(target, new_height);
                for (row, &h) in heights.iter().enumerate() {
                    let expected = if row == target { new_height } else { h };
                    prop_assert_eq!(index.height(row), expected);
                }
            }
        }
    }
}
