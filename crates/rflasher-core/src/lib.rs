//! rflasher-core - chip-independent flash erase/write/verify engine
//!
//! Generalizes flashrom's core loop: identify a chip, pick a usable block
//! eraser, and drive a minimal-erase, differential write/verify pass
//! against it, independent of the bus a programmer backend drives it over.
//! Designed to be `no_std` compatible for use in constrained environments;
//! the CLI and chip registry file loading are `std`-only.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable heap allocation (runtime chip registry loading)
//!
//! # Example
//!
//! ```ignore
//! use rflasher_core::{chip, probe, erase_write};
//!
//! let chip = probe::probe_flash(&mut programmer, chip::BUILTIN_CHIPS, None, None, false)?;
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std;

pub mod chip;
pub mod erase_write;
pub mod error;
pub mod flash;
pub mod hwaccess;
pub mod probe;
pub mod programmer;
pub mod session;
pub mod shutdown;
pub mod testpattern;

pub use error::{Error, Result};
