//! Runtime chip registry
//!
//! Supplements [`super::BUILTIN_CHIPS`] with chip descriptors loaded from a
//! RON file at runtime. RON descriptors can only describe chips whose
//! read/write/erase are the generic pass-through functions (no descriptor
//! format can name an arbitrary function pointer), so this loader targets
//! the same generic functions the built-in demo chips use.
//!
//! Mirrors the source's `flashchips.c` table plus an external-database
//! escape hatch in spirit: an intermediate, serde-friendly `ChipDef` is
//! deserialized and then turned into the real `Copy` [`FlashChip`]
//! representation, leaking its owned strings to `'static` so the
//! registry's output stays uniform with the built-in table.

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

use serde::Deserialize;
use thiserror::Error as ThisError;

use crate::error::Error;
use crate::programmer::BusType;

use super::builtin::{generic_probe, generic_read, generic_write, GENERIC_ERASE_FNS};
use super::{
    BlockEraser, ChipTestStatus, EraseRegion, Features, FlashChip, WriteGranularity,
    MAX_BLOCK_ERASERS, MAX_ERASE_REGIONS,
};

#[derive(Debug, Deserialize)]
struct RegionDef {
    count: u32,
    size: u32,
}

#[derive(Debug, Deserialize)]
struct EraserDef {
    regions: Vec<RegionDef>,
}

#[derive(Debug, Deserialize)]
struct ChipDef {
    vendor: String,
    name: String,
    #[serde(default)]
    bus_types: u8,
    jedec_manufacturer: u8,
    jedec_device: u16,
    total_size: u32,
    page_size: u16,
    #[serde(default)]
    features: u32,
    #[serde(default = "default_voltage_min")]
    voltage_min_mv: u16,
    #[serde(default = "default_voltage_max")]
    voltage_max_mv: u16,
    erasers: Vec<EraserDef>,
}

fn default_voltage_min() -> u16 {
    2700
}

fn default_voltage_max() -> u16 {
    3600
}

#[derive(Debug, Deserialize)]
struct ChipFile {
    chips: Vec<ChipDef>,
}

/// `std`-only errors from loading a supplementary chip registry file.
///
/// Kept distinct from [`crate::error::Error`], which stays a `no_std`,
/// allocation-free `Copy` enum usable from chip functions; this type only
/// ever surfaces from the `std`-gated registry loader, so it is free to
/// carry an owned `ron` parse error.
#[derive(Debug, ThisError)]
pub enum ChipDbError {
    /// The RON text itself didn't parse.
    #[error("failed to parse chip registry file: {0}")]
    Parse(String),
    /// A chip descriptor named more erasers or regions than this registry
    /// representation can hold.
    #[error(
        "chip descriptor exceeds registry limits (at most {MAX_BLOCK_ERASERS} erasers, {MAX_ERASE_REGIONS} regions each)"
    )]
    TooManyEntries,
    /// A chip descriptor built without error but failed [`FlashChip::selfcheck`].
    #[error("chip descriptor failed validation: {0}")]
    InvalidChip(#[from] Error),
}

fn build_chip(def: ChipDef) -> Result<FlashChip, ChipDbError> {
    if def.erasers.is_empty() || def.erasers.len() > MAX_BLOCK_ERASERS {
        return Err(ChipDbError::TooManyEntries);
    }

    let vendor: &'static str = Box::leak(def.vendor.into_boxed_str());
    let name: &'static str = Box::leak(def.name.into_boxed_str());

    let mut block_erasers = [BlockEraser::UNUSED; MAX_BLOCK_ERASERS];
    for (i, eraser_def) in def.erasers.iter().enumerate() {
        if eraser_def.regions.is_empty() || eraser_def.regions.len() > MAX_ERASE_REGIONS {
            return Err(ChipDbError::TooManyEntries);
        }
        let mut regions = [EraseRegion::EMPTY; MAX_ERASE_REGIONS];
        for (r, region_def) in regions.iter_mut().zip(eraser_def.regions.iter()) {
            *r = EraseRegion::new(region_def.count, region_def.size);
        }
        block_erasers[i] = BlockEraser {
            regions,
            num_regions: eraser_def.regions.len(),
            erase: Some(GENERIC_ERASE_FNS[i]),
        };
    }

    let chip = FlashChip {
        vendor,
        name,
        bus_types: BusType::from_bits_truncate(def.bus_types),
        jedec_manufacturer: def.jedec_manufacturer,
        jedec_device: def.jedec_device,
        total_size: def.total_size,
        page_size: def.page_size,
        features: Features::from_bits_truncate(def.features),
        voltage_min_mv: def.voltage_min_mv,
        voltage_max_mv: def.voltage_max_mv,
        write_granularity: WriteGranularity::Page,
        block_erasers,
        num_erasers: def.erasers.len(),
        probe: Some(generic_probe),
        read: Some(generic_read),
        write: Some(generic_write),
        unlock: None,
        printlock: None,
        tested: ChipTestStatus::default(),
    };

    chip.selfcheck()?;
    Ok(chip)
}

/// Parse a RON chip-definition file, validating every descriptor's erase
/// layout before returning it. A single malformed chip fails the whole
/// load, matching the all-or-nothing posture of
/// [`FlashChip::selfcheck`] over the built-in table.
pub fn load_chip_file(ron_text: &str) -> Result<Vec<FlashChip>, ChipDbError> {
    let file: ChipFile = ron::from_str(ron_text).map_err(|e| ChipDbError::Parse(e.to_string()))?;
    file.chips.into_iter().map(build_chip).collect()
}
