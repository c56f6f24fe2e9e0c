//! Chip identification
//!
//! Walks a chip table against the active programmer, mirroring the
//! source's `probe_flash()`: chips are filtered by bus and (optionally) by
//! a case-insensitive name substring, then each surviving candidate's probe
//! function is invoked (or treated as a hit unconditionally when `force` is
//! set and a name filter narrowed the table to one entry). A chip whose
//! JEDEC device ID is the catch-all [`GENERIC_DEVICE_ID`] sentinel never by
//! itself makes the result ambiguous: it loses to any specific match, and
//! multiple generic matches with no specific match collapse to "not found"
//! rather than "ambiguous", since a catch-all entry carries no information
//! about which physical part is attached.

use crate::chip::FlashChip;
use crate::error::{Error, Result};
use crate::flash::FlashContext;
use crate::programmer::{BusType, ProgrammerDispatch, UNMAPPED};

/// JEDEC device ID used by catch-all chip entries (e.g. "generic SPI
/// flash", "unrecognized SFDP part") that match many physical chips but
/// identify none of them specifically.
pub const GENERIC_DEVICE_ID: u16 = 0xFFFF;

/// Upper bound on the number of chips a single probe pass may match before
/// ambiguity is reported; a bound well above any registry used in practice.
const MAX_CANDIDATES: usize = 8;

fn name_matches(chip: &FlashChip, filter: &str) -> bool {
    let name = chip.name.as_bytes();
    let filter = filter.as_bytes();
    if filter.is_empty() {
        return true;
    }
    if filter.len() > name.len() {
        return false;
    }
    name.windows(filter.len())
        .any(|window| window.eq_ignore_ascii_case(filter))
}

/// Map a non-SPI chip's physical window at the top of the 32-bit address
/// space, matching the source's convention that memory-mapped flash is
/// addressed from `0xFFFFFFFF` downward regardless of its actual size.
fn top_aligned_base(size: u32) -> u32 {
    0xFFFF_FFFFu32 - size + 1
}

fn probe_one(programmer: &mut dyn ProgrammerDispatch, chip: &FlashChip, force: bool) -> bool {
    let needs_window = !chip.bus_types.contains(BusType::SPI);
    let base = if needs_window {
        let base = top_aligned_base(chip.total_size);
        match programmer.map_flash_region(base, chip.total_size) {
            Ok(_) => Some(base),
            Err(_) => return false,
        }
    } else {
        None
    };

    let matched = if force {
        true
    } else if let Some(probe_fn) = chip.probe {
        let mut ctx = FlashContext::new(*chip, programmer);
        probe_fn(&mut ctx)
    } else {
        false
    };

    if let Some(base) = base {
        if base != UNMAPPED {
            programmer.unmap_flash_region(base, chip.total_size);
        }
    }

    matched
}

/// Identify the attached chip.
///
/// `name_filter` restricts candidates to chips whose name contains the
/// given substring (case-insensitive). `bus_filter` restricts candidates to
/// chips supporting at least one of the given buses; `None` means "any bus
/// the programmer supports". `force` skips each candidate's probe function
/// and accepts it outright -- only sound when `name_filter` narrows the
/// table to exactly one chip, matching the source's requirement that
/// forced identification always names an exact part.
pub fn probe_flash(
    programmer: &mut dyn ProgrammerDispatch,
    chips: &[FlashChip],
    name_filter: Option<&str>,
    bus_filter: Option<BusType>,
    force: bool,
) -> Result<FlashChip> {
    if force && name_filter.is_none() {
        return Err(Error::ConfigError);
    }

    let allowed_buses = bus_filter.unwrap_or(programmer.supported_buses());

    let mut specific: [Option<FlashChip>; MAX_CANDIDATES] = [None; MAX_CANDIDATES];
    let mut specific_len = 0usize;
    let mut generic: [Option<FlashChip>; MAX_CANDIDATES] = [None; MAX_CANDIDATES];
    let mut generic_len = 0usize;

    for chip in chips {
        if !chip.bus_types.intersects(allowed_buses) {
            continue;
        }
        if let Some(filter) = name_filter {
            if !name_matches(chip, filter) {
                continue;
            }
        }
        if !probe_one(programmer, chip, force) {
            continue;
        }
        if chip.jedec_device == GENERIC_DEVICE_ID {
            if generic_len < MAX_CANDIDATES {
                generic[generic_len] = Some(*chip);
                generic_len += 1;
            }
        } else if specific_len < MAX_CANDIDATES {
            specific[specific_len] = Some(*chip);
            specific_len += 1;
        }
    }

    match specific_len {
        1 => Ok(specific[0].unwrap()),
        0 => match generic_len {
            1 => Ok(generic[0].unwrap()),
            _ => Err(Error::ChipNotFound),
        },
        _ => Err(Error::ChipAmbiguous),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chip::{BlockEraser, ChipTestStatus, Features, WriteGranularity};

    struct MockProgrammer {
        id: (u8, u16),
    }

    impl ProgrammerDispatch for MockProgrammer {
        fn supported_buses(&self) -> BusType {
            BusType::SPI
        }
        fn chip_readb(&mut self, _addr: u32) -> Result<u8> {
            Ok(0xFF)
        }
        fn chip_writeb(&mut self, _addr: u32, _val: u8) -> Result<()> {
            Ok(())
        }
        fn erase_region(&mut self, _addr: u32, _len: u32) -> Result<()> {
            Ok(())
        }
        fn read_id(&mut self) -> Result<(u8, u16)> {
            Ok(self.id)
        }
    }

    fn probe_by_id(ctx: &mut FlashContext<'_>) -> bool {
        match ctx.programmer.read_id() {
            Ok((m, d)) => ctx.chip.matches_jedec_id(m, d),
            Err(_) => false,
        }
    }

    fn chip(name: &'static str, manufacturer: u8, device: u16) -> FlashChip {
        FlashChip {
            vendor: "Test",
            name,
            bus_types: BusType::SPI,
            jedec_manufacturer: manufacturer,
            jedec_device: device,
            total_size: 65536,
            page_size: 256,
            features: Features::empty(),
            voltage_min_mv: 2700,
            voltage_max_mv: 3600,
            write_granularity: WriteGranularity::Page,
            block_erasers: [BlockEraser::UNUSED; crate::chip::MAX_BLOCK_ERASERS],
            num_erasers: 0,
            probe: Some(probe_by_id),
            read: None,
            write: None,
            unlock: None,
            printlock: None,
            tested: ChipTestStatus::default(),
        }
    }

    #[test]
    fn finds_the_single_matching_chip() {
        let table = [chip("ChipA", 1, 1), chip("ChipB", 2, 2)];
        let mut prog = MockProgrammer { id: (2, 2) };
        let found = probe_flash(&mut prog, &table, None, None, false).unwrap();
        assert_eq!(found.name, "ChipB");
    }

    #[test]
    fn not_found_when_nothing_matches() {
        let table = [chip("ChipA", 1, 1)];
        let mut prog = MockProgrammer { id: (9, 9) };
        assert_eq!(
            probe_flash(&mut prog, &table, None, None, false),
            Err(Error::ChipNotFound)
        );
    }

    #[test]
    fn ambiguous_when_two_specific_chips_match() {
        // Two different table entries that both happen to carry the same ID
        // (e.g. two second-sourced parts), both probing true against one ID.
        let table = [chip("ChipA", 5, 5), chip("ChipA-clone", 5, 5)];
        let mut prog = MockProgrammer { id: (5, 5) };
        assert_eq!(
            probe_flash(&mut prog, &table, None, None, false),
            Err(Error::ChipAmbiguous)
        );
    }

    #[test]
    fn name_filter_narrows_to_exactly_one_candidate_for_force() {
        let table = [chip("ChipA", 1, 1), chip("ChipB", 2, 2)];
        let mut prog = MockProgrammer { id: (9, 9) };
        let found = probe_flash(&mut prog, &table, Some("chipb"), None, true).unwrap();
        assert_eq!(found.name, "ChipB");
    }

    #[test]
    fn force_without_name_filter_is_rejected() {
        let table = [chip("ChipA", 1, 1)];
        let mut prog = MockProgrammer { id: (1, 1) };
        assert_eq!(
            probe_flash(&mut prog, &table, None, None, true),
            Err(Error::ConfigError)
        );
    }

    #[test]
    fn specific_match_wins_over_generic_catch_all() {
        let mut generic_chip = chip("Generic SPI", 0, GENERIC_DEVICE_ID);
        generic_chip.probe = Some(|_ctx| true);
        let table = [generic_chip, chip("ChipB", 2, 2)];
        let mut prog = MockProgrammer { id: (2, 2) };
        let found = probe_flash(&mut prog, &table, None, None, false).unwrap();
        assert_eq!(found.name, "ChipB");
    }
}
