//! Virtual flow: which rows of a long table need to be realized.
//!
//! Rows have variable heights. Until a row has been measured by its skin the
//! flow uses the estimated height, so offsets settle as the user scrolls.
//! Offsets come from a Fenwick tree over the row heights, so offset and
//! position lookups stay logarithmic in the item count.

use std::ops::Range;

/// Binary indexed tree of row heights.
#[derive(Debug, Default)]
struct HeightIndex {
    /// 1-based; `tree[0]` is unused.
    tree: Vec<f32>,
}

impl HeightIndex {
    fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    fn rebuild(&mut self, heights: &[f32]) {
        let n = heights.len();
        self.tree.clear();
        self.tree.resize(n + 1, 0.0);
        for i in 1..=n {
            self.tree[i] += heights[i - 1];
            let parent = i + (i & i.wrapping_neg());
            if parent <= n {
                self.tree[parent] += self.tree[i];
            }
        }
    }

    fn push(&mut self, height: f32) {
        if self.tree.is_empty() {
            self.tree.push(0.0);
        }
        let i = self.tree.len();
        let covered = self.prefix(i - 1) - self.prefix(i - (i & i.wrapping_neg()));
        self.tree.push(height + covered);
    }

    fn truncate(&mut self, len: usize) {
        self.tree.truncate(len + 1);
    }

    fn add(&mut self, index: usize, delta: f32) {
        let mut i = index + 1;
        while i < self.tree.len() {
            self.tree[i] += delta;
            i += i & i.wrapping_neg();
        }
    }

    /// Sum of the first `count` heights.
    fn prefix(&self, count: usize) -> f32 {
        let mut i = count.min(self.len());
        let mut sum = 0.0;
        while i > 0 {
            sum += self.tree[i];
            i &= i - 1;
        }
        sum
    }

    /// Largest `k` with `prefix(k) <= y`.
    fn count_within(&self, y: f32) -> usize {
        let n = self.len();
        if n == 0 {
            return 0;
        }
        let mut pos = 0;
        let mut remaining = y;
        let mut step = 1 << (usize::BITS - 1 - n.leading_zeros());
        while step > 0 {
            let next = pos + step;
            if next <= n && self.tree[next] <= remaining {
                pos = next;
                remaining -= self.tree[next];
            }
            step >>= 1;
        }
        pos
    }
}

/// Scroll and measurement state of a table body.
#[derive(Debug)]
pub struct VirtualFlow {
    /// Height assumed for rows that have not been measured.
    estimated: f32,
    /// Current height of every row, measured or estimated.
    heights: Vec<f32>,
    index: HeightIndex,
    cached_total_height: f32,
    scroll_offset: f32,
    viewport_height: f32,
    /// Rows realized above and below the viewport.
    overscan: usize,
}

impl VirtualFlow {
    pub fn new(estimated: f32, overscan: usize) -> Self {
        Self {
            estimated,
            heights: Vec::new(),
            index: HeightIndex::default(),
            cached_total_height: 0.0,
            scroll_offset: 0.0,
            viewport_height: 0.0,
            overscan,
        }
    }

    fn rebuild_index(&mut self) {
        self.index.rebuild(&self.heights);
        self.cached_total_height = self.heights.iter().sum();
    }

    /// Updates the total number of items, clamping the scroll offset.
    ///
    /// Measurements of rows that still exist are kept.
    pub fn set_total_items(&mut self, count: usize) {
        let current = self.heights.len();
        if count == current {
            return;
        }
        if count < current {
            self.heights.truncate(count);
            self.index.truncate(count);
            self.cached_total_height = self.index.prefix(count);
        } else {
            for _ in current..count {
                self.heights.push(self.estimated);
                self.index.push(self.estimated);
            }
            self.cached_total_height += self.estimated * (count - current) as f32;
        }

        let max_offset = self.max_scroll_offset();
        if self.scroll_offset > max_offset {
            self.scroll_offset = max_offset;
        }
    }

    pub fn total_items(&self) -> usize {
        self.heights.len()
    }

    pub fn set_viewport_height(&mut self, height: f32) {
        self.viewport_height = height.max(0.0);
    }

    pub fn viewport_height(&self) -> f32 {
        self.viewport_height
    }

    pub fn scroll_offset(&self) -> f32 {
        self.scroll_offset
    }

    pub fn set_scroll_offset(&mut self, offset: f32) {
        self.scroll_offset = offset.clamp(0.0, self.max_scroll_offset());
    }

    pub fn scroll_by(&mut self, delta: f32) {
        self.set_scroll_offset(self.scroll_offset + delta);
    }

    /// Scrolls the minimum distance that makes row `index` fully visible.
    pub fn scroll_to_item(&mut self, index: usize) {
        if index >= self.total_items() {
            return;
        }

        let offset = self.item_offset(index);
        let height = self.item_height(index);
        if offset >= self.scroll_offset
            && offset + height <= self.scroll_offset + self.viewport_height
        {
            return;
        }

        let target = if offset < self.scroll_offset {
            offset
        } else {
            (offset + height - self.viewport_height).max(0.0)
        };
        self.set_scroll_offset(target);
    }

    pub fn item_height(&self, index: usize) -> f32 {
        self.heights.get(index).copied().unwrap_or(self.estimated)
    }

    /// Record the preferred height a row skin computed for row `index`.
    pub fn set_measured(&mut self, index: usize, height: f32) {
        let Some(current) = self.heights.get_mut(index) else {
            return;
        };
        let height = height.max(0.0);
        let delta = height - *current;
        if delta != 0.0 {
            *current = height;
            self.index.add(index, delta);
            self.cached_total_height += delta;
        }
    }

    /// Forget every measurement, e.g. after rows were inserted or removed.
    pub fn reset_measurements(&mut self) {
        self.heights.fill(self.estimated);
        self.rebuild_index();
    }

    /// Y offset of row `index` from the top of the table body.
    pub fn item_offset(&self, index: usize) -> f32 {
        self.index.prefix(index)
    }

    /// Row index at body-relative `y`.
    pub fn item_at_position(&self, y: f32) -> Option<usize> {
        if y < 0.0 {
            return None;
        }
        let index = self.index.count_within(y);
        (index < self.total_items()).then_some(index)
    }

    pub fn total_height(&self) -> f32 {
        self.cached_total_height
    }

    pub fn max_scroll_offset(&self) -> f32 {
        (self.total_height() - self.viewport_height).max(0.0)
    }

    /// Rows to realize, overscan included.
    pub fn visible_range(&self) -> Range<usize> {
        let total = self.total_items();
        if total == 0 || self.viewport_height <= 0.0 {
            return 0..0;
        }

        let start = self
            .item_at_position(self.scroll_offset)
            .unwrap_or(0)
            .saturating_sub(self.overscan);
        let end = self
            .item_at_position(self.scroll_offset + self.viewport_height)
            .map(|i| i + 1)
            .unwrap_or(total)
            .saturating_add(self.overscan)
            .min(total);

        start..end
    }
}
