//! Rowskin Core
//!
//! Shared utilities for the rowskin table engine: collections, geometry,
//! colors, logging and profiling.

pub mod alloc;
pub mod color;
pub mod geometry;
pub mod logging;
pub mod math;
pub mod profiling;

pub use color::Color;
pub use geometry::{Insets, Rect};
