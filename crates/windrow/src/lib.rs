#![forbid(unsafe_code)]

//! Windowing controllers over the windrow-core axis model: single-axis row
//! windows, two-axis grid windows, quad-tree partitions, and horizontal
//! section strips.

pub mod delegate;
pub mod grid;
pub mod loading;
pub mod pool;
pub mod quad;
pub mod row;
pub mod strip;

pub use windrow_core::{
    AxisContext, AxisError, ExtentException, ScrollDirection, ScrollResult, ShiftPlan,
    VisibleRange, plan_shift, slice_extent, visible_range,
};

pub use delegate::{CellUpdate, GridDelegate, QuadDelegate, RowContent, RowDelegate};
pub use grid::GridWindow;
pub use loading::{LoadHandle, LoadSignal, Settlement, load_channel};
pub use pool::PoolStats;
pub use quad::{QuadNodeInfo, QuadPartition};
pub use row::{RowWindow, WindowStats};
pub use strip::{Section, SectionStrip, StripOptions};
