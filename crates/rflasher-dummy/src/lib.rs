//! rflasher-dummy - a RAM-backed [`ProgrammerDispatch`] for exercising the
//! erase/write/verify engine without real hardware.
//!
//! Mirrors the source's `programmer_dummy.c`: a flat in-memory array stands
//! in for the chip array, `erase_region` fills with `0xff`, and writes AND
//! new bytes into old ones the way real NOR flash can only clear bits. Two
//! optional fault knobs (a dropped write, a failing erase call) exist purely
//! so the engine's recovery paths can be exercised deterministically in
//! tests, rather than as anything a real programmer backend would offer.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use rflasher_core::error::Result;
use rflasher_core::programmer::{BusType, ProgrammerDispatch};

/// Identity and size of the emulated chip.
#[derive(Debug, Clone, Copy)]
pub struct DummyConfig {
    /// JEDEC manufacturer ID returned by `read_id`.
    pub manufacturer_id: u8,
    /// JEDEC device ID returned by `read_id`.
    pub device_id: u16,
    /// Flash size in bytes.
    pub size: usize,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            manufacturer_id: 0xEF, // Winbond
            device_id: 0x4018,     // W25Q128-demo
            size: 1024 * 1024,
        }
    }
}

/// Deterministic fault injection, off by default.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaultConfig {
    /// Silently drop this 1-indexed `chip_writen` call: report success
    /// without touching memory, so a later verify catches the mismatch.
    pub drop_write_call: Option<u32>,
    /// Fail this 1-indexed `erase_region` call with [`rflasher_core::error::Error::EraseError`],
    /// exactly once. Later calls (e.g. a fallback eraser's) are unaffected.
    pub fail_erase_call: Option<u32>,
}

/// In-memory flash emulator.
#[cfg(feature = "alloc")]
pub struct DummyProgrammer {
    config: DummyConfig,
    data: Vec<u8>,
    faults: FaultConfig,
    write_calls: u32,
    erase_calls: u32,
    erase_fault_spent: bool,
}

#[cfg(feature = "alloc")]
impl DummyProgrammer {
    /// Create a fresh, fully-erased (`0xff`) emulated chip.
    pub fn new(config: DummyConfig) -> Self {
        Self::with_faults(config, FaultConfig::default())
    }

    /// Create an emulated chip with fault injection enabled.
    pub fn with_faults(config: DummyConfig, faults: FaultConfig) -> Self {
        let data = vec![0xffu8; config.size];
        Self {
            config,
            data,
            faults,
            write_calls: 0,
            erase_calls: 0,
            erase_fault_spent: false,
        }
    }

    /// Build a chip with pre-existing (non-erased) contents, e.g. to model
    /// a chip that already holds firmware before a write is attempted.
    pub fn with_data(config: DummyConfig, initial: &[u8]) -> Self {
        let mut d = Self::new(config);
        let len = initial.len().min(d.data.len());
        d.data[..len].copy_from_slice(&initial[..len]);
        d
    }

    /// The emulated chip's raw contents.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The configuration this instance was built with.
    pub fn config(&self) -> &DummyConfig {
        &self.config
    }
}

#[cfg(feature = "alloc")]
impl ProgrammerDispatch for DummyProgrammer {
    fn supported_buses(&self) -> BusType {
        BusType::SPI
    }

    fn chip_readb(&mut self, addr: u32) -> Result<u8> {
        Ok(self.data[addr as usize])
    }

    fn chip_writeb(&mut self, addr: u32, val: u8) -> Result<()> {
        self.data[addr as usize] &= val;
        Ok(())
    }

    fn chip_readn(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        let start = addr as usize;
        buf.copy_from_slice(&self.data[start..start + buf.len()]);
        Ok(())
    }

    fn chip_writen(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        self.write_calls += 1;
        if self.faults.drop_write_call == Some(self.write_calls) {
            log::warn!("dropping write call {} ({} bytes at {addr:#x})", self.write_calls, data.len());
            return Ok(());
        }
        let start = addr as usize;
        for (i, &byte) in data.iter().enumerate() {
            self.data[start + i] &= byte;
        }
        Ok(())
    }

    fn erase_region(&mut self, addr: u32, len: u32) -> Result<()> {
        self.erase_calls += 1;
        if !self.erase_fault_spent && self.faults.fail_erase_call == Some(self.erase_calls) {
            self.erase_fault_spent = true;
            return Err(rflasher_core::error::Error::EraseError);
        }
        let start = addr as usize;
        let end = start + len as usize;
        self.data[start..end].fill(0xff);
        Ok(())
    }

    fn read_id(&mut self) -> Result<(u8, u16)> {
        Ok((self.config.manufacturer_id, self.config.device_id))
    }
}

#[cfg(all(test, feature = "alloc"))]
mod tests {
    use super::*;
    use rflasher_core::chip::{DEMO_DUAL_ERASER, DEMO_SINGLE_ERASER};
    use rflasher_core::erase_write::{erase_and_write_flash, verify_range};
    use rflasher_core::flash::FlashContext;
    use rflasher_core::testpattern::generate_testpattern;

    #[test]
    fn read_id_matches_configuration() {
        let mut dummy = DummyProgrammer::new(DummyConfig::default());
        assert_eq!(dummy.read_id().unwrap(), (0xEF, 0x4018));
    }

    // S1: erasing a chip pre-filled with a non-0xff pattern brings every
    // byte back to 0xff.
    #[test]
    fn erase_brings_the_whole_chip_to_all_ones() {
        let chip = DEMO_SINGLE_ERASER;
        let total = chip.total_size as usize;
        let old = vec![0xA5u8; total];
        let mut dummy = DummyProgrammer::with_data(
            DummyConfig {
                size: total,
                ..DummyConfig::default()
            },
            &old,
        );

        let new = vec![0xffu8; total];
        let mut cur = vec![0u8; total];
        {
            let mut ctx = FlashContext::new(chip, &mut dummy);
            erase_and_write_flash(&mut ctx, &old, &new, &mut cur).unwrap();
            verify_range(&mut ctx, &new, 0).unwrap();
        }
        assert!(dummy.data().iter().all(|&b| b == 0xff));
    }

    // S2: writing contents identical to what's already on the chip needs no
    // erase and no write call anywhere.
    #[test]
    fn write_identical_contents_touches_nothing() {
        let chip = DEMO_SINGLE_ERASER;
        let total = chip.total_size as usize;
        let same = vec![0x3cu8; total];
        let mut dummy = DummyProgrammer::with_data(
            DummyConfig {
                size: total,
                ..DummyConfig::default()
            },
            &same,
        );

        let old = same.clone();
        let new = same;
        let mut cur = vec![0u8; total];
        {
            let mut ctx = FlashContext::new(chip, &mut dummy);
            erase_and_write_flash(&mut ctx, &old, &new, &mut cur).unwrap();
            verify_range(&mut ctx, &new, 0).unwrap();
        }
        assert_eq!(dummy.write_calls, 0);
        assert_eq!(dummy.erase_calls, 0);
    }

    // S3: a single differing run inside one erase block forces that block
    // (and only that block) to be erased and rewritten.
    #[test]
    fn partial_change_within_one_block_erases_only_that_block() {
        let chip = DEMO_SINGLE_ERASER; // 256 blocks of 4 KiB
        let total = chip.total_size as usize;
        let mut old = vec![0xffu8; total];
        old[0x1000..0x1010].fill(0x00);
        let mut dummy = DummyProgrammer::with_data(
            DummyConfig {
                size: total,
                ..DummyConfig::default()
            },
            &old,
        );

        let new = vec![0xffu8; total];
        let mut cur = vec![0u8; total];
        {
            let mut ctx = FlashContext::new(chip, &mut dummy);
            erase_and_write_flash(&mut ctx, &old, &new, &mut cur).unwrap();
            verify_range(&mut ctx, &new, 0).unwrap();
        }
        assert_eq!(dummy.erase_calls, 1);
        assert!(dummy.data().iter().all(|&b| b == 0xff));
    }

    #[test]
    fn full_round_trip_on_the_single_eraser_demo_chip() {
        let chip = DEMO_SINGLE_ERASER;
        let total = chip.total_size as usize;
        let mut dummy = DummyProgrammer::new(DummyConfig {
            size: total,
            ..DummyConfig::default()
        });

        let old = vec![0xffu8; total];
        let mut new = vec![0xffu8; total];
        generate_testpattern(&mut new[..512], 0);
        let mut cur = vec![0u8; total];

        let mut ctx = FlashContext::new(chip, &mut dummy);
        erase_and_write_flash(&mut ctx, &old, &new, &mut cur).unwrap();
        verify_range(&mut ctx, &new, 0).unwrap();
    }

    // S4: the dummy silently drops the very first sub-block write. The
    // engine still reports the erase/write pass as successful (it has no
    // way to see the drop), but a subsequent verify against the intended
    // contents must fail.
    #[test]
    fn dropped_write_is_caught_by_a_later_verify() {
        let chip = DEMO_SINGLE_ERASER;
        let total = chip.total_size as usize;
        let mut dummy = DummyProgrammer::with_faults(
            DummyConfig {
                size: total,
                ..DummyConfig::default()
            },
            FaultConfig {
                drop_write_call: Some(1),
                ..FaultConfig::default()
            },
        );

        let old = vec![0xffu8; total];
        let mut new = vec![0xffu8; total];
        new[10] = 0x42;
        let mut cur = vec![0u8; total];

        let mut ctx = FlashContext::new(chip, &mut dummy);
        erase_and_write_flash(&mut ctx, &old, &new, &mut cur).unwrap();
        assert_eq!(
            verify_range(&mut ctx, &new, 0),
            Err(rflasher_core::error::Error::VerifyError)
        );
    }

    // S5: the dual-eraser demo chip's first eraser (256 blocks of 4 KiB)
    // fails on its fifth block; the engine must fall back to the second
    // eraser (16 blocks of 64 KiB) and complete successfully from a fresh
    // re-read.
    #[test]
    fn eraser_fallback_after_failure_on_the_fifth_block() {
        let chip = DEMO_DUAL_ERASER;
        let total = chip.total_size as usize;
        let mut dummy = DummyProgrammer::with_faults(
            DummyConfig {
                size: total,
                ..DummyConfig::default()
            },
            FaultConfig {
                fail_erase_call: Some(5),
                ..FaultConfig::default()
            },
        );

        let old = vec![0xffu8; total];
        let mut new = vec![0x00u8; total];
        let mut cur = vec![0u8; total];

        let mut ctx = FlashContext::new(chip, &mut dummy);
        erase_and_write_flash(&mut ctx, &old, &new, &mut cur).unwrap();
        verify_range(&mut ctx, &new, 0).unwrap();
    }
}
