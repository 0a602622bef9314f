//! Small async building blocks that don't belong to any one crate.

mod bounded;
pub mod error;

pub use crate::bounded::{BoundedStream, BoundedStreamExt};
