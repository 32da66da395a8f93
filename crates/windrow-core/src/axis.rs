#![forbid(unsafe_code)]

//! Sparse extent model for one virtualized axis (rows or columns).
//!
//! Most items on an axis share a single default pixel extent. Items that
//! deviate are recorded as [`ExtentException`] entries carrying their index,
//! absolute pixel position, and extent. An [`AxisContext`] bundles the sorted
//! exception table with a reverse lookup and the precomputed total, so range
//! queries stay O(k) in the number of exceptions rather than O(n) in the
//! number of items.

use std::collections::HashMap;

use thiserror::Error;

/// An item whose pixel extent differs from the axis default.
///
/// `pos` is the absolute pixel offset of the item's leading edge, assuming
/// every non-exception item before it uses the default extent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtentException {
    pub index: usize,
    pub pos: f64,
    pub extent: f64,
}

impl ExtentException {
    /// Pixel offset of the item's trailing edge.
    #[must_use]
    pub fn end(&self) -> f64 {
        self.pos + self.extent
    }
}

/// Structural defects detectable in a hand-built [`AxisContext`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AxisError {
    #[error("default extent must be positive, got {0}")]
    NonPositiveDefault(f64),
    #[error("exception index {index} out of bounds for {count} items")]
    IndexOutOfBounds { index: usize, count: usize },
    #[error("exception table not sorted strictly ascending at table slot {slot}")]
    Unsorted { slot: usize },
    #[error("exception {index} placed at {actual}, cumulative layout expects {expected}")]
    Misplaced {
        index: usize,
        expected: f64,
        actual: f64,
    },
    #[error("total extent {actual} does not match accumulated {expected}")]
    TotalMismatch { expected: f64, actual: f64 },
}

/// One axis of virtualization: item count, default extent, and the sparse
/// table of exceptions.
///
/// Contexts are immutable; a dataset change builds a fresh one.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AxisContext {
    default_extent: f64,
    exceptions: Vec<ExtentException>,
    lookup: HashMap<usize, f64>,
    total_extent: f64,
    item_count: usize,
}

impl AxisContext {
    /// Axis where every item has the same extent.
    #[must_use]
    pub fn uniform(item_count: usize, default_extent: f64) -> Self {
        Self {
            default_extent,
            exceptions: Vec::new(),
            lookup: HashMap::new(),
            total_extent: item_count as f64 * default_extent,
            item_count,
        }
    }

    /// Builds an axis from one extent per item, recording only the items
    /// that deviate from `default_extent`.
    pub fn non_uniform<I>(extents: I, default_extent: f64) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut exceptions = Vec::new();
        let mut lookup = HashMap::new();
        let mut prev: Option<usize> = None;
        let mut acc = 0.0;
        let mut total = 0.0;
        let mut count = 0usize;
        for (index, extent) in extents.into_iter().enumerate() {
            count += 1;
            total += extent;
            if extent == default_extent {
                continue;
            }
            let gap = match prev {
                Some(p) => (index - p - 1) as f64,
                None => index as f64,
            };
            let pos = acc + gap * default_extent;
            acc = pos + extent;
            prev = Some(index);
            lookup.insert(index, extent);
            exceptions.push(ExtentException { index, pos, extent });
        }
        Self {
            default_extent,
            exceptions,
            lookup,
            total_extent: total,
            item_count: count,
        }
    }

    /// Builds an axis from an `index -> extent` map of deviating items.
    ///
    /// Map entries at or beyond `item_count`, or equal to the default, are
    /// ignored.
    #[must_use]
    pub fn from_lookup(
        lookup: &HashMap<usize, f64>,
        default_extent: f64,
        item_count: usize,
    ) -> Self {
        let mut indices: Vec<usize> = lookup
            .keys()
            .copied()
            .filter(|&i| i < item_count && lookup[&i] != default_extent)
            .collect();
        indices.sort_unstable();

        let mut exceptions = Vec::with_capacity(indices.len());
        let mut kept = HashMap::with_capacity(indices.len());
        let mut prev: Option<usize> = None;
        let mut acc = 0.0;
        for index in indices {
            let extent = lookup[&index];
            let gap = match prev {
                Some(p) => (index - p - 1) as f64,
                None => index as f64,
            };
            let pos = acc + gap * default_extent;
            acc = pos + extent;
            prev = Some(index);
            kept.insert(index, extent);
            exceptions.push(ExtentException { index, pos, extent });
        }

        let deviating: f64 = exceptions.iter().map(|e| e.extent).sum();
        let total =
            (item_count - exceptions.len()) as f64 * default_extent + deviating;
        Self {
            default_extent,
            exceptions,
            lookup: kept,
            total_extent: total,
            item_count,
        }
    }

    /// Builds an axis with randomized extents from a deterministic seed.
    ///
    /// Roughly `ratio` of the items draw an extent uniformly from
    /// `[min_extent, max_extent]`; the rest use the default. Intended for
    /// benchmarks and stress tests.
    #[must_use]
    pub fn random(
        item_count: usize,
        default_extent: f64,
        min_extent: f64,
        max_extent: f64,
        ratio: f64,
        seed: u64,
    ) -> Self {
        // splitmix64; good enough spread for test data.
        let mut state = seed;
        let mut next = move || {
            state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
            let mut z = state;
            z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
            z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
            z = z ^ (z >> 31);
            z as f64 / u64::MAX as f64
        };
        Self::non_uniform(
            (0..item_count).map(|_| {
                if next() < ratio {
                    (min_extent + next() * (max_extent - min_extent)).round()
                } else {
                    default_extent
                }
            }),
            default_extent,
        )
    }

    #[must_use]
    pub fn default_extent(&self) -> f64 {
        self.default_extent
    }

    #[must_use]
    pub fn exceptions(&self) -> &[ExtentException] {
        &self.exceptions
    }

    #[must_use]
    pub fn total_extent(&self) -> f64 {
        self.total_extent
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.item_count
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.item_count == 0
    }

    /// Pixel extent of the item at `index`.
    #[must_use]
    pub fn extent_of(&self, index: usize) -> f64 {
        self.lookup.get(&index).copied().unwrap_or(self.default_extent)
    }

    #[must_use]
    pub fn is_exception(&self, index: usize) -> bool {
        self.lookup.contains_key(&index)
    }

    /// Checks the structural invariants: positive default, in-bounds sorted
    /// exceptions at their cumulative positions, and a consistent total.
    pub fn validate(&self) -> Result<(), AxisError> {
        if self.default_extent <= 0.0 {
            return Err(AxisError::NonPositiveDefault(self.default_extent));
        }
        let mut prev: Option<&ExtentException> = None;
        for (slot, e) in self.exceptions.iter().enumerate() {
            if e.index >= self.item_count {
                return Err(AxisError::IndexOutOfBounds {
                    index: e.index,
                    count: self.item_count,
                });
            }
            if prev.is_some_and(|p| p.index >= e.index) {
                return Err(AxisError::Unsorted { slot });
            }
            let expected = match prev {
                Some(p) => p.end() + (e.index - p.index - 1) as f64 * self.default_extent,
                None => e.index as f64 * self.default_extent,
            };
            if (expected - e.pos).abs() > 1e-6 {
                return Err(AxisError::Misplaced {
                    index: e.index,
                    expected,
                    actual: e.pos,
                });
            }
            prev = Some(e);
        }
        let deviating: f64 = self.exceptions.iter().map(|e| e.extent).sum();
        let expected = (self.item_count - self.exceptions.len()) as f64 * self.default_extent
            + deviating;
        if (expected - self.total_extent).abs() > 1e-6 {
            return Err(AxisError::TotalMismatch {
                expected,
                actual: self.total_extent,
            });
        }
        Ok(())
    }
}
