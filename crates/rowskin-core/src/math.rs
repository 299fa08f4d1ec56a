//! Vector math re-exported from [`glam`].
//!
//! Marker shapes and node offsets are expressed in [`Vec2`].
//!
//! ```
//! use rowskin_core::math::Vec2;
//!
//! let origin = Vec2::new(120.0, 0.0);
//! let tip = origin + Vec2::new(10.0, 0.0);
//! assert_eq!(tip.x, 130.0);
//! ```

pub use glam::Vec2;
