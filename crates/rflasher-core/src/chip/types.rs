//! Flash chip type definitions
//!
//! A [`FlashChip`] is a flat, `Copy` capability record: everything needed to
//! probe, read, erase, and write one chip model, including the function
//! pointers that carry out those operations. This generalizes the source's
//! `struct flashchip` (plain function pointers, `struct block_eraser
//! block_erasers[NUM_ERASEFUNCTIONS]`, each with `struct eraseblock
//! eraseblocks[NUM_ERASEREGIONS]`) into a single representation usable both
//! as a `&'static` built-in table entry and as the product of a runtime chip
//! registry load.

use crate::error::{Error, Result};
use crate::flash::FlashContext;
use crate::programmer::BusType;

use super::features::Features;

/// Upper bound on the number of distinct erase-size regions a single block
/// eraser describes, standing in for the source's `NUM_ERASEREGIONS`.
pub const MAX_ERASE_REGIONS: usize = 4;

/// Upper bound on the number of alternative block erasers a chip may offer,
/// standing in for the source's `NUM_ERASEFUNCTIONS`.
pub const MAX_BLOCK_ERASERS: usize = 8;

/// A chip erase/read/write/probe operation. Plain function pointers, not
/// closures, mirroring the source's C function-pointer vtable.
pub type EraseFn = fn(&mut FlashContext<'_>, u32, u32) -> Result<()>;
/// Read `buf.len()` bytes starting at `addr` into `buf`.
pub type ReadFn = fn(&mut FlashContext<'_>, u32, &mut [u8]) -> Result<()>;
/// Write `data` starting at `addr`.
pub type WriteFn = fn(&mut FlashContext<'_>, u32, &[u8]) -> Result<()>;
/// Attempt to identify the chip; `true` on a positive match.
pub type ProbeFn = fn(&mut FlashContext<'_>) -> bool;
/// Clear any software/hardware write-protect latch blocking erase/write.
pub type UnlockFn = fn(&mut FlashContext<'_>) -> Result<()>;
/// Log the chip's current protection state at debug level.
pub type PrintlockFn = fn(&mut FlashContext<'_>);

/// One contiguous run of equally-sized erase blocks within a block eraser's
/// layout, e.g. "16 blocks of 4096 bytes".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct EraseRegion {
    /// Number of blocks in this run.
    pub count: u32,
    /// Size in bytes of each block in this run.
    pub size: u32,
}

impl EraseRegion {
    /// An empty/unused region slot.
    pub const EMPTY: Self = Self { count: 0, size: 0 };

    /// Create a region of `count` blocks of `size` bytes each.
    pub const fn new(count: u32, size: u32) -> Self {
        Self { count, size }
    }

    /// Total bytes spanned by this region.
    pub fn bytes(&self) -> u64 {
        self.count as u64 * self.size as u64
    }

    /// Whether this slot is unused (both fields zero).
    fn is_empty(&self) -> bool {
        self.count == 0 && self.size == 0
    }
}

/// One alternative way to erase a chip: a region layout paired with the
/// function that carries out an erase of any block described by that
/// layout. A chip typically offers several alternatives (e.g. a uniform
/// 4 KiB layout and a uniform 64 KiB layout over the same chip) so the
/// engine can fall back to a different eraser if one proves unusable.
#[derive(Debug, Clone, Copy)]
pub struct BlockEraser {
    /// Erase region runs, smallest address first. Unused trailing slots are
    /// [`EraseRegion::EMPTY`].
    pub regions: [EraseRegion; MAX_ERASE_REGIONS],
    /// Number of entries in `regions` that are meaningful.
    pub num_regions: usize,
    /// The erase function for blocks in this layout, if implemented.
    pub erase: Option<EraseFn>,
}

impl BlockEraser {
    /// An eraser slot with no layout and no function: a genuinely absent
    /// alternative, not an error.
    pub const UNUSED: Self = Self {
        regions: [EraseRegion::EMPTY; MAX_ERASE_REGIONS],
        num_regions: 0,
        erase: None,
    };

    /// The meaningful region entries.
    pub fn regions(&self) -> &[EraseRegion] {
        &self.regions[..self.num_regions]
    }

    /// Whether this eraser has a non-empty region layout.
    pub fn has_layout(&self) -> bool {
        self.regions().iter().any(|r| !r.is_empty())
    }

    /// Total bytes covered by this eraser's layout.
    pub fn layout_bytes(&self) -> u64 {
        self.regions().iter().map(EraseRegion::bytes).sum()
    }
}

/// Write granularity supported by a chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum WriteGranularity {
    /// Can write individual bits (1->0 only)
    Bit,
    /// Can write individual bytes
    Byte,
    /// Must write full pages
    #[default]
    Page,
}

/// Outcome of testing a chip operation against real hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub enum TestStatus {
    /// Never exercised against real hardware
    #[default]
    Unknown,
    /// Confirmed working
    Ok,
    /// Known to misbehave; surfaced instead of silently treated as working
    Bad,
}

/// Per-operation test status for a chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "std", derive(serde::Serialize, serde::Deserialize))]
pub struct ChipTestStatus {
    /// Probe/identification
    pub probe: TestStatus,
    /// Read operation
    pub read: TestStatus,
    /// Erase operation
    pub erase: TestStatus,
    /// Write/program operation
    pub write: TestStatus,
}

/// Flash chip capability record.
///
/// Fully `Copy`: usable directly as a `&'static [FlashChip]` built-in table
/// entry with no allocator, and as the product of a runtime registry load
/// (whose owned strings are leaked to `'static` so the representation stays
/// uniform either way).
#[derive(Debug, Clone, Copy)]
pub struct FlashChip {
    /// Vendor name (e.g., "Winbond")
    pub vendor: &'static str,
    /// Chip model name (e.g., "W25Q128FV")
    pub name: &'static str,
    /// Buses this chip can be attached to
    pub bus_types: BusType,
    /// JEDEC manufacturer ID (first byte of RDID response)
    pub jedec_manufacturer: u8,
    /// JEDEC device ID (second and third bytes of RDID response)
    pub jedec_device: u16,
    /// Total flash size in bytes
    pub total_size: u32,
    /// Page size in bytes (for programming)
    pub page_size: u16,
    /// Feature flags
    pub features: Features,
    /// Minimum operating voltage in millivolts
    pub voltage_min_mv: u16,
    /// Maximum operating voltage in millivolts
    pub voltage_max_mv: u16,
    /// Write granularity
    pub write_granularity: WriteGranularity,
    /// Alternative block erasers. Unused trailing slots are
    /// [`BlockEraser::UNUSED`].
    pub block_erasers: [BlockEraser; MAX_BLOCK_ERASERS],
    /// Number of entries in `block_erasers` that are meaningful.
    pub num_erasers: usize,
    /// Probe function
    pub probe: Option<ProbeFn>,
    /// Read function
    pub read: Option<ReadFn>,
    /// Write function
    pub write: Option<WriteFn>,
    /// Unlock function, if this chip can be software write-locked
    pub unlock: Option<UnlockFn>,
    /// Print current lock state at debug level, if applicable
    pub printlock: Option<PrintlockFn>,
    /// Known test status against real hardware
    pub tested: ChipTestStatus,
}

impl FlashChip {
    /// Get the JEDEC ID as a 24-bit value (manufacturer << 16 | device)
    pub fn jedec_id(&self) -> u32 {
        ((self.jedec_manufacturer as u32) << 16) | (self.jedec_device as u32)
    }

    /// Check if this chip matches the given JEDEC ID
    pub fn matches_jedec_id(&self, manufacturer: u8, device: u16) -> bool {
        self.jedec_manufacturer == manufacturer && self.jedec_device == device
    }

    /// The meaningful eraser entries.
    pub fn erasers(&self) -> &[BlockEraser] {
        &self.block_erasers[..self.num_erasers]
    }

    /// Get the smallest erase block size across all erasers.
    pub fn min_erase_size(&self) -> Option<u32> {
        self.erasers()
            .iter()
            .flat_map(|e| e.regions())
            .filter(|r| r.size > 0)
            .map(|r| r.size)
            .min()
    }

    /// Validate this chip's block eraser table.
    ///
    /// For every eraser slot: a layout with no erase function, or an erase
    /// function with no layout, is malformed. A defined eraser's regions
    /// must sum to exactly `total_size`, and no two defined erasers may
    /// share the same erase function pointer. A slot with neither a layout
    /// nor a function is simply unused, not an error.
    pub fn selfcheck(&self) -> Result<()> {
        let mut seen_fns: [usize; MAX_BLOCK_ERASERS] = [0; MAX_BLOCK_ERASERS];
        let mut seen = 0usize;

        for eraser in self.erasers() {
            let has_layout = eraser.has_layout();
            let erase = match (has_layout, eraser.erase) {
                (false, None) => continue,
                (true, None) | (false, Some(_)) => return Err(Error::EraserMalformed),
                (true, Some(f)) => f,
            };

            let mut total = 0u64;
            for region in eraser.regions() {
                match (region.count, region.size) {
                    (0, 0) => continue,
                    (0, _) | (_, 0) => return Err(Error::EraserMalformed),
                    (count, size) => total += count as u64 * size as u64,
                }
            }
            if total != self.total_size as u64 {
                return Err(Error::SelfCheckFailed);
            }

            let fp = erase as usize;
            if seen_fns[..seen].contains(&fp) {
                return Err(Error::SelfCheckFailed);
            }
            seen_fns[seen] = fp;
            seen += 1;
        }
        Ok(())
    }
}

/// JEDEC manufacturer IDs
pub mod manufacturer {
    /// AMD/Spansion
    pub const AMD: u8 = 0x01;
    /// Atmel
    pub const ATMEL: u8 = 0x1F;
    /// EON
    pub const EON: u8 = 0x1C;
    /// Fujitsu
    pub const FUJITSU: u8 = 0x04;
    /// GigaDevice
    pub const GIGADEVICE: u8 = 0xC8;
    /// Intel
    pub const INTEL: u8 = 0x89;
    /// ISSI
    pub const ISSI: u8 = 0x9D;
    /// Macronix
    pub const MACRONIX: u8 = 0xC2;
    /// Micron
    pub const MICRON: u8 = 0x20;
    /// PMC
    pub const PMC: u8 = 0x9D;
    /// Sanyo
    pub const SANYO: u8 = 0x62;
    /// SST
    pub const SST: u8 = 0xBF;
    /// ST (now Micron)
    pub const ST: u8 = 0x20;
    /// Winbond
    pub const WINBOND: u8 = 0xEF;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop_erase(_ctx: &mut FlashContext<'_>, _addr: u32, _len: u32) -> Result<()> {
        Ok(())
    }
    fn noop_erase2(_ctx: &mut FlashContext<'_>, _addr: u32, _len: u32) -> Result<()> {
        Ok(())
    }

    fn eraser(regions: &[EraseRegion], erase: EraseFn) -> BlockEraser {
        let mut arr = [EraseRegion::EMPTY; MAX_ERASE_REGIONS];
        arr[..regions.len()].copy_from_slice(regions);
        BlockEraser {
            regions: arr,
            num_regions: regions.len(),
            erase: Some(erase),
        }
    }

    fn base_chip() -> FlashChip {
        FlashChip {
            vendor: "Test",
            name: "T25",
            bus_types: BusType::SPI,
            jedec_manufacturer: 0xEF,
            jedec_device: 0x4018,
            total_size: 1024 * 1024,
            page_size: 256,
            features: Features::empty(),
            voltage_min_mv: 2700,
            voltage_max_mv: 3600,
            write_granularity: WriteGranularity::Page,
            block_erasers: [BlockEraser::UNUSED; MAX_BLOCK_ERASERS],
            num_erasers: 0,
            probe: None,
            read: None,
            write: None,
            unlock: None,
            printlock: None,
            tested: ChipTestStatus::default(),
        }
    }

    #[test]
    fn selfcheck_passes_for_well_formed_single_eraser() {
        let mut chip = base_chip();
        chip.block_erasers[0] = eraser(&[EraseRegion::new(256, 4096)], noop_erase);
        chip.num_erasers = 1;
        assert!(chip.selfcheck().is_ok());
    }

    #[test]
    fn selfcheck_rejects_region_sum_mismatch() {
        let mut chip = base_chip();
        chip.block_erasers[0] = eraser(&[EraseRegion::new(1, 4096)], noop_erase);
        chip.num_erasers = 1;
        assert_eq!(chip.selfcheck(), Err(Error::SelfCheckFailed));
    }

    #[test]
    fn selfcheck_rejects_layout_without_erase_fn() {
        let mut chip = base_chip();
        let mut e = eraser(&[EraseRegion::new(256, 4096)], noop_erase);
        e.erase = None;
        chip.block_erasers[0] = e;
        chip.num_erasers = 1;
        assert_eq!(chip.selfcheck(), Err(Error::EraserMalformed));
    }

    #[test]
    fn selfcheck_rejects_erase_fn_without_layout() {
        let mut chip = base_chip();
        let mut e = eraser(&[EraseRegion::new(256, 4096)], noop_erase);
        e.num_regions = 0;
        chip.block_erasers[0] = e;
        chip.num_erasers = 1;
        assert_eq!(chip.selfcheck(), Err(Error::EraserMalformed));
    }

    #[test]
    fn selfcheck_rejects_duplicate_erase_fn_pointer() {
        let mut chip = base_chip();
        chip.block_erasers[0] = eraser(&[EraseRegion::new(256, 4096)], noop_erase);
        chip.block_erasers[1] = eraser(&[EraseRegion::new(16, 65536)], noop_erase);
        chip.num_erasers = 2;
        assert_eq!(chip.selfcheck(), Err(Error::SelfCheckFailed));
    }

    #[test]
    fn selfcheck_allows_two_distinct_erasers_over_same_chip() {
        let mut chip = base_chip();
        chip.block_erasers[0] = eraser(&[EraseRegion::new(256, 4096)], noop_erase);
        chip.block_erasers[1] = eraser(&[EraseRegion::new(16, 65536)], noop_erase2);
        chip.num_erasers = 2;
        assert!(chip.selfcheck().is_ok());
    }

    #[test]
    fn unused_eraser_slot_is_not_an_error() {
        let chip = base_chip();
        assert!(chip.selfcheck().is_ok());
    }
}
