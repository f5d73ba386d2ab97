//! # Utilities Module
//!
//! Float vector math shared by the gravity model and pixel geometry, and the
//! grid path finder.

pub mod math;
pub mod pathfinding;

pub use math::*;
pub use pathfinding::*;
