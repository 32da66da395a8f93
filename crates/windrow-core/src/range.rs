#![forbid(unsafe_code)]

//! Visible-range math over an [`AxisContext`] and window shift planning.
//!
//! [`visible_range`] maps a scroll offset and viewport extent to the index
//! range that must be materialized, with its pixel bounds. The uniform case
//! and the uniform regions before/after the exception table resolve in O(1);
//! otherwise a single ascending scan over the exceptions decides, so cost is
//! O(k) in the exceptions near the viewport, never O(n) in items.
//!
//! [`plan_shift`] classifies a fresh range against the committed window into
//! the minimal reconciliation plan. All windowing controllers reuse it: the
//! row axis, the grid's column axis, and per-row cell reconciliation.

use std::ops::Range;

use crate::axis::AxisContext;

/// Index range covering a pixel viewport, with the pixel bounds of the
/// covered items.
///
/// `first_pos` is the leading edge of item `first`; `end_pos` is the
/// trailing edge of item `last`. Outside dataset boundaries the range
/// over-covers the viewport, never under-covers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleRange {
    pub first: usize,
    pub last: usize,
    pub first_pos: f64,
    pub end_pos: f64,
}

impl VisibleRange {
    /// Number of items in the range.
    #[must_use]
    pub fn len(&self) -> usize {
        self.last - self.first + 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        index >= self.first && index <= self.last
    }
}

/// Computes the visible index range for `offset..offset + viewport` pixels.
///
/// An empty axis yields the degenerate `{0, 0, 0.0, 0.0}` range; callers
/// check [`AxisContext::is_empty`] before materializing anything.
#[must_use]
pub fn visible_range(offset: f64, viewport: f64, ctx: &AxisContext) -> VisibleRange {
    let count = ctx.item_count();
    if count == 0 {
        return VisibleRange {
            first: 0,
            last: 0,
            first_pos: 0.0,
            end_pos: 0.0,
        };
    }
    let default = ctx.default_extent();
    let offset2 = offset + viewport;

    // Uniform-region calculation, shifted so index `index_shift` starts at
    // pixel `offset_shift`.
    let calc = |offset_shift: f64, index_shift: usize| -> VisibleRange {
        let shifted = offset - offset_shift;
        let shifted2 = offset2 - offset_shift;
        let first_rel = (shifted / default).floor().max(0.0) as usize;
        let last_rel = (shifted2 / default).ceil().max(0.0) as usize;
        let first = (index_shift + first_rel).min(count - 1);
        let last = (index_shift + last_rel).min(count - 1);
        VisibleRange {
            first,
            last,
            first_pos: offset_shift + (first as f64 - index_shift as f64) * default,
            end_pos: offset_shift + (last as f64 + 1.0 - index_shift as f64) * default,
        }
    };

    let exceptions = ctx.exceptions();
    let uniform = calc(0.0, 0);
    let Some(first_exception) = exceptions.first() else {
        return uniform;
    };
    if uniform.last < first_exception.index {
        // Viewport lies entirely in the exact uniform prefix.
        return uniform;
    }
    let last_exception = exceptions[exceptions.len() - 1];
    if offset > last_exception.end() {
        // Uniform tail after every exception.
        return calc(last_exception.end(), last_exception.index + 1);
    }

    // Scan for the exceptions intersecting [offset, offset2), remembering
    // the closest one fully before the viewport as a shift base.
    let mut closest: Option<&crate::axis::ExtentException> = None;
    let mut visible: Option<(usize, usize)> = None;
    for (slot, e) in exceptions.iter().enumerate() {
        if e.pos >= offset2 {
            break;
        }
        if e.end() <= offset {
            closest = Some(e);
            continue;
        }
        visible = Some(match visible {
            Some((lo, _)) => (lo, slot),
            None => (slot, slot),
        });
    }

    let Some((lo, hi)) = visible else {
        return match closest {
            // Uniform gap between two exceptions.
            Some(c) => calc(c.end(), c.index + 1),
            // No exception precedes the viewport; the uniform guess is exact.
            None => uniform,
        };
    };

    #[cfg(feature = "tracing")]
    tracing::trace!(
        target: "windrow::range",
        lo,
        hi,
        offset,
        viewport,
        "range scan hit exceptions"
    );

    let e0 = exceptions[lo];
    let en = exceptions[hi];
    let before = ((e0.pos - offset) / default).ceil().max(0.0) as usize;
    let after = ((offset2 - en.end()) / default).ceil().max(0.0) as usize;
    let first = e0.index.saturating_sub(before);
    let last = (en.index + after).min(count - 1);
    VisibleRange {
        first,
        last,
        first_pos: e0.pos - (e0.index - first) as f64 * default,
        end_pos: en.end() + (last - en.index) as f64 * default,
    }
}

/// Pixel extent of the inclusive index range `[start, end]`, accounting for
/// exceptions inside it.
#[must_use]
pub fn slice_extent(ctx: &AxisContext, start: usize, end: usize) -> f64 {
    if end < start {
        return 0.0;
    }
    let default = ctx.default_extent();
    let mut extent = (end - start + 1) as f64 * default;
    for e in ctx.exceptions() {
        if e.index > end {
            break;
        }
        if e.index >= start {
            extent += e.extent - default;
        }
    }
    extent
}

/// Scroll direction reported by the host alongside its offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Forward,
    Backward,
}

/// How much of the live window a scroll step invalidated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollResult {
    /// The committed window already covers the fresh range.
    None,
    /// One edge shifted; the rest of the window survived.
    Partial,
    /// The window was rebuilt wholesale.
    All,
}

/// Minimal reconciliation plan turning the committed window `[c_first,
/// c_last]` into the fresh window `[first, last]`.
///
/// All ranges are half-open index ranges and may be empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShiftPlan {
    /// Fresh range is contained in the committed window.
    None,
    /// No overlap; tear down and build fresh.
    Rebuild,
    /// Fresh range is a strict superset; grow both edges.
    Extend {
        prepend: Range<usize>,
        append: Range<usize>,
    },
    /// Scrolled toward higher indices: trim the front, append at the back.
    Forward {
        trim_front: Range<usize>,
        append: Range<usize>,
    },
    /// Scrolled toward lower indices: prepend at the front, trim the back.
    Backward {
        prepend: Range<usize>,
        trim_back: Range<usize>,
    },
}

impl ShiftPlan {
    #[must_use]
    pub fn result(&self) -> ScrollResult {
        match self {
            ShiftPlan::None => ScrollResult::None,
            ShiftPlan::Rebuild => ScrollResult::All,
            _ => ScrollResult::Partial,
        }
    }
}

/// Classifies the fresh inclusive range `[first, last]` against the
/// committed inclusive window `[c_first, c_last]`.
#[must_use]
pub fn plan_shift(c_first: usize, c_last: usize, first: usize, last: usize) -> ShiftPlan {
    if first >= c_first && last <= c_last {
        return ShiftPlan::None;
    }
    if first > c_last || last < c_first {
        return ShiftPlan::Rebuild;
    }
    if first < c_first && last > c_last {
        return ShiftPlan::Extend {
            prepend: first..c_first,
            append: c_last + 1..last + 1,
        };
    }
    if first < c_first {
        return ShiftPlan::Backward {
            prepend: first..c_first,
            trim_back: last + 1..c_last + 1,
        };
    }
    ShiftPlan::Forward {
        trim_front: c_first..first,
        append: c_last + 1..(last + 1).max(c_last + 1),
    }
}
