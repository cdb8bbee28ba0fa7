#![forbid(unsafe_code)]

//! Core: path keys, geometry, input events, and logging shims.

pub mod event;
pub mod geometry;
pub mod logging;
pub mod path;

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
