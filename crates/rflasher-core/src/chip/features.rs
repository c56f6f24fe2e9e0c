//! Flash chip feature flags

use bitflags::bitflags;

bitflags! {
    /// Feature flags for flash chips.
    ///
    /// Bus-agnostic by design: these describe quirks the erase/write engine
    /// itself needs to know about, not wire-level protocol capabilities
    /// (opcode choice, I/O mode, ...), which are the concern of whatever
    /// chip function or programmer backend is selected.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "std", serde(transparent))]
    pub struct Features: u32 {
        /// Has a One-Time-Programmable area outside the main array.
        const OTP              = 1 << 0;
        /// Chip-relative addresses must be shifted before being presented
        /// to the programmer (seen on some parallel/LPC parts whose address
        /// lines don't map 1:1 onto flash-relative offsets).
        const ADDRESS_SHIFT    = 1 << 1;
        /// Byte-granularity writes (can write single bytes, not just pages).
        const WRITE_BYTE       = 1 << 2;
        /// Requires 4-byte addressing above 16 MiB.
        const FOUR_BYTE_ADDR   = 1 << 3;
        /// Supports a software deep-power-down state.
        const DEEP_POWER_DOWN  = 1 << 4;
    }
}

impl Default for Features {
    fn default() -> Self {
        Features::empty()
    }
}
