//! Programmer selection
//!
//! Only the RAM-backed dummy programmer ships with this binary; every other
//! bus backend the source supports (USB SPI programmers, Linux spidev,
//! chipset-internal flash, ...) is out of scope here, since programmer
//! backends are implementations of [`rflasher_core::programmer::ProgrammerDispatch`]
//! rather than something this core builds. `build` is still shaped to grow a
//! real match arm per backend the way the source's `programmer_table`
//! dispatch does.

use rflasher_dummy::{DummyConfig, DummyProgrammer, FaultConfig};

use crate::error::CliError;
use crate::params::{parse_int, ParamString};

/// Programmer names this binary accepts for `--programmer`, with a short description.
pub const AVAILABLE: &[(&str, &str)] =
    &[("dummy", "RAM-backed flash emulator for testing and demonstration")];

/// Build the selected programmer from its name and `key=value,...` parameter string.
pub fn build(name: &str, params: &str) -> Result<DummyProgrammer, CliError> {
    match name {
        "dummy" => build_dummy(params),
        other => Err(CliError::UnknownProgrammer {
            name: other.to_string(),
            available: AVAILABLE
                .iter()
                .map(|(n, _)| *n)
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

fn build_dummy(params: &str) -> Result<DummyProgrammer, CliError> {
    let mut p = ParamString::parse(params);
    let mut config = DummyConfig::default();
    let mut faults = FaultConfig::default();

    if let Some(v) = p.take("size") {
        config.size = parse_int(&v).map_err(CliError::BadParam)? as usize;
    }
    if let Some(v) = p.take("manufacturer_id") {
        config.manufacturer_id = parse_int(&v).map_err(CliError::BadParam)? as u8;
    }
    if let Some(v) = p.take("device_id") {
        config.device_id = parse_int(&v).map_err(CliError::BadParam)? as u16;
    }
    if let Some(v) = p.take("drop_write_call") {
        faults.drop_write_call = Some(parse_int(&v).map_err(CliError::BadParam)? as u32);
    }
    if let Some(v) = p.take("fail_erase_call") {
        faults.fail_erase_call = Some(parse_int(&v).map_err(CliError::BadParam)? as u32);
    }

    p.warn_unused();
    Ok(DummyProgrammer::with_faults(config, faults))
}
