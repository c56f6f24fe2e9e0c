//! CLI-level errors.
//!
//! Distinct from [`rflasher_core::error::Error`] the same way the core's own
//! `std`-only [`rflasher_core::chip::ChipDbError`] is: the core error stays a
//! `no_std`, allocation-free `Copy` enum, while argument parsing and file I/O
//! failures here are `std`-only and get to carry an owned path and a real
//! `std::io::Error` source.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("--read, --write, --verify and --erase are mutually exclusive")]
    ConflictingOperations,

    #[error("one of --read, --write, --verify or --erase is required")]
    NoOperation,

    #[error("{operation} requires a filename")]
    MissingFilename { operation: &'static str },

    #[error("{operation} takes no filename")]
    UnexpectedFilename { operation: &'static str },

    #[error("unknown programmer '{name}' (available: {available})")]
    UnknownProgrammer { name: String, available: String },

    #[error("invalid programmer parameter: {0}")]
    BadParam(String),

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{path} is {actual} bytes, chip is {expected} bytes")]
    SizeMismatch {
        path: PathBuf,
        actual: usize,
        expected: usize,
    },

    #[error("{0} (try --force with --chip to select one explicitly)")]
    ChipNotFound(rflasher_core::error::Error),

    #[error(transparent)]
    Engine(#[from] rflasher_core::error::Error),

    #[error(
        "verify mismatch: first differing byte at {offset:#x} (want {want:#04x}, have {have:#04x}), {count} byte(s) differ in total"
    )]
    VerifyMismatch {
        offset: usize,
        want: u8,
        have: u8,
        count: usize,
    },

    #[error("erase/write failed ({source}), but chip contents are unchanged -- nothing was written")]
    NothingChanged {
        #[source]
        source: rflasher_core::error::Error,
    },

    #[error(
        "erase/write failed ({source}) and chip contents no longer match the prior image. DO NOT REBOOT."
    )]
    WriteFailedEmergency {
        #[source]
        source: rflasher_core::error::Error,
    },
}

impl CliError {
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
