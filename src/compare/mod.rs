//! Desired versus observed comparison
//!
//! Pure functions only: nothing in here talks to AWS or fails.

pub mod delta;
pub mod sets;
pub mod tags;

pub use delta::{Delta, Difference, WHOLE_RESOURCE};
pub use sets::SetDifference;
pub use tags::{TagDifference, Tags};
