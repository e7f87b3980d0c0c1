//! Windowing: which contiguous slice of rows has to be materialized for the
//! current scroll position, and how to scroll a given row into view.

use std::ops::Range;

/// Rows materialized on each side of the viewport.
pub const DEFAULT_OVERSCAN: usize = 8;

/// Row geometry of a list.
///
/// Fixed sizes are plain arithmetic. Variable sizes keep cumulative offsets so
/// offset to index lookups are a binary search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowMetrics {
    Fixed { size: u32, len: usize },
    /// `offsets[i]` is where row `i` starts; the last entry is the total extent.
    Variable { offsets: Vec<u64> },
}

impl Default for RowMetrics {
    fn default() -> Self {
        Self::Fixed { size: 1, len: 0 }
    }
}

impl RowMetrics {
    /// A size of zero is treated as one.
    pub fn fixed(size: u32, len: usize) -> Self {
        Self::Fixed {
            size: size.max(1),
            len,
        }
    }

    pub fn variable(len: usize, size_of: impl Fn(usize) -> u32) -> Self {
        let mut offsets = Vec::with_capacity(len + 1);
        let mut total = 0u64;
        offsets.push(total);
        for index in 0..len {
            total += u64::from(size_of(index));
            offsets.push(total);
        }
        Self::Variable { offsets }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Fixed { len, .. } => *len,
            Self::Variable { offsets } => offsets.len().saturating_sub(1),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn total_extent(&self) -> u64 {
        match self {
            Self::Fixed { size, len } => u64::from(*size) * *len as u64,
            Self::Variable { offsets } => offsets.last().copied().unwrap_or(0),
        }
    }

    /// Start offset of row `index`; indexes past the end map to the total extent.
    pub fn offset_of(&self, index: usize) -> u64 {
        let index = index.min(self.len());
        match self {
            Self::Fixed { size, .. } => u64::from(*size) * index as u64,
            Self::Variable { offsets } => offsets[index],
        }
    }

    pub fn size_of(&self, index: usize) -> u64 {
        if index >= self.len() {
            return 0;
        }
        self.offset_of(index + 1) - self.offset_of(index)
    }

    /// Row covering `offset`, or `None` past the end.
    pub fn index_at(&self, offset: u64) -> Option<usize> {
        if offset >= self.total_extent() {
            return None;
        }
        match self {
            Self::Fixed { size, .. } => Some((offset / u64::from(*size)) as usize),
            Self::Variable { offsets } => {
                // offsets[0] == 0 <= offset, so the partition point is at least 1
                let starts = &offsets[..offsets.len() - 1];
                Some(starts.partition_point(|start| *start <= offset) - 1)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    /// Move as little as possible; nothing when the row is fully visible.
    Auto,
    Start,
    Center,
    End,
}

/// Scroll position and viewport extent over a list described by [`RowMetrics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window {
    scroll_offset: u64,
    extent: u64,
    overscan: usize,
}

impl Default for Window {
    fn default() -> Self {
        Self::new(DEFAULT_OVERSCAN)
    }
}

impl Window {
    pub fn new(overscan: usize) -> Self {
        Self {
            scroll_offset: 0,
            extent: 0,
            overscan,
        }
    }

    pub fn scroll_offset(&self) -> u64 {
        self.scroll_offset
    }

    pub fn extent(&self) -> u64 {
        self.extent
    }

    pub fn overscan(&self) -> usize {
        self.overscan
    }

    pub fn set_extent(&mut self, extent: u64, metrics: &RowMetrics) {
        self.extent = extent;
        self.clamp(metrics);
    }

    pub fn max_scroll_offset(&self, metrics: &RowMetrics) -> u64 {
        metrics.total_extent().saturating_sub(self.extent)
    }

    /// Pulls the offset back into range after the list shrank.
    pub fn clamp(&mut self, metrics: &RowMetrics) {
        self.scroll_offset = self.scroll_offset.min(self.max_scroll_offset(metrics));
    }

    /// Rows intersecting the viewport.
    pub fn visible_range(&self, metrics: &RowMetrics) -> Range<usize> {
        let len = metrics.len();
        if len == 0 || self.extent == 0 {
            return 0..0;
        }
        let Some(start) = metrics.index_at(self.scroll_offset) else {
            return len..len;
        };
        let last_offset = self.scroll_offset + self.extent - 1;
        let end = metrics.index_at(last_offset).map_or(len, |index| index + 1);
        start..end
    }

    /// Rows to materialize: the visible range widened by the overscan.
    pub fn render_range(&self, metrics: &RowMetrics) -> Range<usize> {
        let visible = self.visible_range(metrics);
        if visible.is_empty() {
            return visible;
        }
        let start = visible.start.saturating_sub(self.overscan);
        let end = visible
            .end
            .saturating_add(self.overscan)
            .min(metrics.len());
        start..end
    }

    /// Row under a viewport-relative position.
    pub fn row_at(&self, position: u64, metrics: &RowMetrics) -> Option<usize> {
        if position >= self.extent {
            return None;
        }
        metrics.index_at(self.scroll_offset + position)
    }

    pub fn scroll_to_offset(&mut self, offset: u64, metrics: &RowMetrics) -> bool {
        let before = self.scroll_offset;
        self.scroll_offset = offset.min(self.max_scroll_offset(metrics));
        self.scroll_offset != before
    }

    pub fn scroll_by(&mut self, delta: i64, metrics: &RowMetrics) -> bool {
        let target = if delta.is_negative() {
            self.scroll_offset.saturating_sub(delta.unsigned_abs())
        } else {
            self.scroll_offset.saturating_add(delta.unsigned_abs())
        };
        self.scroll_to_offset(target, metrics)
    }

    /// Scrolls so row `index` is in view. Indexes past the end target the last
    /// row. Returns whether the offset changed; a second call for the same row
    /// never does.
    pub fn scroll_to_item(&mut self, index: usize, align: Align, metrics: &RowMetrics) -> bool {
        if metrics.is_empty() {
            return false;
        }
        let index = index.min(metrics.len() - 1);
        let start = metrics.offset_of(index);
        let size = metrics.size_of(index);
        let end = start + size;

        let target = match align {
            Align::Start => start,
            Align::End => end.saturating_sub(self.extent),
            Align::Center => (start + size / 2).saturating_sub(self.extent / 2),
            Align::Auto => {
                if start < self.scroll_offset || size > self.extent {
                    start
                } else if end > self.scroll_offset + self.extent {
                    end - self.extent
                } else {
                    self.scroll_offset
                }
            }
        };
        self.scroll_to_offset(target, metrics)
    }
}
