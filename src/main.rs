//! rflasher - a chip-independent flash erase/write/verify engine
//!
//! CLI front end over `rflasher_core`: identify a chip through the active
//! programmer, then drive a read, write, verify, or erase pass against it.

mod cli;
mod error;
mod params;
mod programmers;

use clap::Parser;
use cli::{Cli, Operation};
use error::CliError;
use rflasher_core::chip;
use rflasher_core::erase_write::{erase_and_write_flash, read_full, verify_range};
use rflasher_core::error::Error;
use rflasher_core::flash::FlashContext;
use rflasher_core::probe::probe_flash;
use rflasher_core::session::Session;
use std::fs;
use std::process::ExitCode;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    if cli.list_supported {
        print_supported();
        return ExitCode::SUCCESS;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_supported() {
    println!("Programmers:");
    for (name, description) in programmers::AVAILABLE {
        println!("  {name:<10} {description}");
    }
    println!();
    println!("Chips:");
    for c in chip::BUILTIN_CHIPS {
        println!(
            "  {:<10} {:<18} {:#06x}:{:#06x}  {} bytes",
            c.vendor, c.name, c.jedec_manufacturer, c.jedec_device, c.total_size
        );
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    let operation = cli.operation()?.ok_or(CliError::NoOperation)?;

    match (operation.needs_filename(), cli.filename.is_some()) {
        (true, false) => {
            return Err(CliError::MissingFilename {
                operation: operation.name(),
            })
        }
        (false, true) => {
            return Err(CliError::UnexpectedFilename {
                operation: operation.name(),
            })
        }
        _ => {}
    }

    let (prog_name, prog_params) = cli.programmer_name_and_params();
    let programmer = programmers::build(prog_name, prog_params)?;

    let mut session = Session::new(programmer);
    let chip = probe_flash(
        session.programmer(),
        chip::BUILTIN_CHIPS,
        cli.chip.as_deref(),
        None,
        cli.force,
    )
    .map_err(|e| match e {
        Error::ChipNotFound => CliError::ChipNotFound(e),
        other => CliError::Engine(other),
    })?;
    log::info!(
        "identified {} {} ({} bytes)",
        chip.vendor,
        chip.name,
        chip.total_size
    );

    let mut ctx = session.context_for(chip);
    let total = ctx.total_size();

    match operation {
        Operation::Read => {
            let path = cli.filename.as_ref().unwrap();
            let mut buf = vec![0u8; total];
            read_full(&mut ctx, &mut buf)?;
            fs::write(path, &buf).map_err(|e| CliError::io(path, e))?;
            log::info!("read {total} bytes to {}", path.display());
        }
        Operation::Write => {
            let path = cli.filename.as_ref().unwrap();
            let new = read_image(path, total)?;
            let mut old = vec![0u8; total];
            read_full(&mut ctx, &mut old)?;
            let mut cur = vec![0u8; total];

            erase_and_write(&mut ctx, &old, &new, &mut cur)?;
            log::info!("Erase/write done.");

            if let Err(e) = verify_range(&mut ctx, &new, 0) {
                log::error!(
                    "verification failed after write: chip contents do not match {}. DO NOT REBOOT.",
                    path.display()
                );
                return Err(CliError::Engine(e));
            }
            log::info!("verified OK");
        }
        Operation::Verify => {
            let path = cli.filename.as_ref().unwrap();
            let want = read_image(path, total)?;
            let mut have = vec![0u8; total];
            read_full(&mut ctx, &mut have)?;
            report_mismatch(&want, &have)?;
            log::info!("verified OK");
        }
        Operation::Erase => {
            let mut old = vec![0u8; total];
            read_full(&mut ctx, &mut old)?;
            let new = vec![0xffu8; total];
            let mut cur = vec![0u8; total];
            erase_and_write(&mut ctx, &old, &new, &mut cur)?;
            log::info!("Erase/write done.");
        }
    }

    Ok(())
}

/// Run the erase/write engine, and on failure distinguish "nothing changed"
/// from an emergency: re-read the whole chip and compare it against `old`.
/// If it still matches `old`, the chip (or programmer) never took the write
/// and is still in its prior, known-good state. If it doesn't, the chip is
/// in an unknown state and the operator must not reboot.
fn erase_and_write(
    ctx: &mut FlashContext<'_>,
    old: &[u8],
    new: &[u8],
    cur: &mut [u8],
) -> Result<(), CliError> {
    let source = match erase_and_write_flash(ctx, old, new, cur) {
        Ok(()) => return Ok(()),
        Err(e) => e,
    };

    let total = old.len();
    let mut recheck = vec![0u8; total];
    match read_full(ctx, &mut recheck) {
        Ok(()) if recheck == old => {
            log::error!("erase/write failed ({source}): nothing changed, chip still matches its prior contents");
            Err(CliError::NothingChanged { source })
        }
        Ok(()) => {
            log::error!("erase/write failed ({source}): chip contents no longer match the prior image. DO NOT REBOOT.");
            Err(CliError::WriteFailedEmergency { source })
        }
        Err(read_err) => {
            log::error!("erase/write failed ({source}), and the recovery re-read also failed ({read_err}). DO NOT REBOOT.");
            Err(CliError::WriteFailedEmergency { source: read_err })
        }
    }
}

fn read_image(path: &std::path::Path, total: usize) -> Result<Vec<u8>, CliError> {
    let data = fs::read(path).map_err(|e| CliError::io(path, e))?;
    if data.len() != total {
        return Err(CliError::SizeMismatch {
            path: path.to_path_buf(),
            actual: data.len(),
            expected: total,
        });
    }
    Ok(data)
}

/// Byte-level diagnostic for a verify-without-write mismatch: first
/// differing offset plus the total count of differing bytes.
fn report_mismatch(want: &[u8], have: &[u8]) -> Result<(), CliError> {
    let mut first = None;
    let mut count = 0usize;
    for (i, (&w, &h)) in want.iter().zip(have.iter()).enumerate() {
        if w != h {
            first.get_or_insert(i);
            count += 1;
        }
    }
    match first {
        None => Ok(()),
        Some(offset) => Err(CliError::VerifyMismatch {
            offset,
            want: want[offset],
            have: have[offset],
            count,
        }),
    }
}
