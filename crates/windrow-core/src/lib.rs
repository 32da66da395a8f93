#![forbid(unsafe_code)]

//! Core: axis extent model and visible-range math for virtual scrolling.

pub mod axis;
pub mod range;

pub use axis::{AxisContext, AxisError, ExtentException};
pub use range::{
    ScrollDirection, ScrollResult, ShiftPlan, VisibleRange, plan_shift, slice_extent,
    visible_range,
};
