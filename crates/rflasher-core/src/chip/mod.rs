//! Flash chip types and registry
//!
//! This module provides types for describing flash chips and their
//! capabilities, as well as the built-in registry of known chips.

mod builtin;
mod features;
mod types;

#[cfg(feature = "std")]
mod registry;

pub use builtin::{BUILTIN_CHIPS, DEMO_DUAL_ERASER, DEMO_SINGLE_ERASER};
pub use features::Features;
pub use types::*;

#[cfg(feature = "std")]
pub use registry::*;
