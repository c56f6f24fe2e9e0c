//! Error types for rflasher-core
//!
//! This module provides a no_std compatible error type that can be used
//! throughout the crate.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Probe errors
    /// No chip in the registry matched the programmer and name filter
    ChipNotFound,
    /// More than one non-generic chip matched; a name filter is required
    ChipAmbiguous,

    // Chip registry errors
    /// The chip registry failed self-check (sum of regions != total size,
    /// malformed region counts, or duplicate erase functions)
    SelfCheckFailed,
    /// A block eraser has a region layout but no erase function, or vice versa
    EraserMalformed,
    /// No usable erase function remains for this chip
    NoUsableEraseFunction,

    // Operation errors
    /// Erase operation failed
    EraseError,
    /// Post-erase verification found bytes that are not all-ones
    EraseVerifyError,
    /// Write/program operation failed
    WriteError,
    /// Verify operation failed (data mismatch against desired contents)
    VerifyError,
    /// A read issued during fallback recovery failed; no further attempts are safe
    RecoveryReadError,
    /// Write granularity is not one of the supported values
    InvalidGranularity,

    // Address/size errors
    /// Address is beyond flash chip size
    AddressOutOfBounds,
    /// Operation requires aligned address or size
    InvalidAlignment,
    /// Provided buffer is too small for the operation, or doesn't match chip size
    BufferSizeMismatch,

    // Protection errors
    /// Flash chip is write protected
    WriteProtected,

    // Programmer/shutdown errors
    /// Programmer is not ready (not initialized or busy)
    ProgrammerNotReady,
    /// General programmer error
    ProgrammerError,
    /// Shutdown registry is full (fixed bound reached)
    ShutdownRegistryFull,
    /// Shutdown registry is not open for registration
    ShutdownRegistryClosed,

    // I/O errors
    /// Read operation failed
    ReadError,
    /// I/O error occurred (file access, chip-database load, ...)
    IoError,

    // Configuration errors
    /// Mutually exclusive CLI operation flags given, or required argument missing
    ConfigError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChipNotFound => write!(f, "flash chip not found"),
            Self::ChipAmbiguous => write!(f, "more than one chip matched, use --chip to disambiguate"),
            Self::SelfCheckFailed => write!(f, "chip registry self-check failed"),
            Self::EraserMalformed => write!(f, "block eraser has mismatched region layout and erase function"),
            Self::NoUsableEraseFunction => write!(f, "no usable erase function for this chip"),
            Self::EraseError => write!(f, "erase operation failed"),
            Self::EraseVerifyError => write!(f, "erased region is not all-ones"),
            Self::WriteError => write!(f, "write operation failed"),
            Self::VerifyError => write!(f, "verify failed: data mismatch"),
            Self::RecoveryReadError => write!(f, "read failed during fallback recovery, aborting"),
            Self::InvalidGranularity => write!(f, "unknown write granularity"),
            Self::AddressOutOfBounds => write!(f, "address out of bounds"),
            Self::InvalidAlignment => write!(f, "invalid alignment"),
            Self::BufferSizeMismatch => write!(f, "buffer size does not match flash chip size"),
            Self::WriteProtected => write!(f, "flash chip is write protected"),
            Self::ProgrammerNotReady => write!(f, "programmer not ready"),
            Self::ProgrammerError => write!(f, "programmer error"),
            Self::ShutdownRegistryFull => write!(f, "shutdown registry is full"),
            Self::ShutdownRegistryClosed => write!(f, "shutdown registry is not open"),
            Self::ReadError => write!(f, "read operation failed"),
            Self::IoError => write!(f, "I/O error"),
            Self::ConfigError => write!(f, "configuration error"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
