//! CLI argument parsing
//!
//! Flat flashrom-style flags rather than subcommands: exactly one of
//! `--read`/`--write`/`--verify`/`--erase` selects the operation, and the
//! image file is a plain positional argument shared by all of them (absent
//! for `--erase`).

use clap::Parser;
use std::path::PathBuf;

use crate::error::CliError;

#[derive(Parser, Debug)]
#[command(
    name = "rflasher",
    author,
    version,
    about = "Chip-independent flash erase/write/verify engine",
    long_about = None
)]
pub struct Cli {
    /// Read chip contents into the given file
    #[arg(long)]
    pub read: bool,

    /// Write the given file's contents to the chip
    #[arg(long)]
    pub write: bool,

    /// Verify chip contents against the given file
    #[arg(long)]
    pub verify: bool,

    /// Erase the whole chip
    #[arg(long)]
    pub erase: bool,

    /// Flash image file (required for --read/--write/--verify, forbidden for --erase)
    pub filename: Option<PathBuf>,

    /// Restrict probing to chips whose name contains this substring
    #[arg(long)]
    pub chip: Option<String>,

    /// Bypass probe mismatch and identify the chip named by --chip outright
    #[arg(long)]
    pub force: bool,

    /// Programmer to use, as NAME or NAME:key=value,key2=value2
    #[arg(long, default_value = "dummy")]
    pub programmer: String,

    /// Raise log verbosity by one level (stackable: -v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Print supported programmers and chips, then exit
    #[arg(long)]
    pub list_supported: bool,
}

/// The single operation an invocation selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
    Verify,
    Erase,
}

impl Operation {
    pub fn name(self) -> &'static str {
        match self {
            Operation::Read => "--read",
            Operation::Write => "--write",
            Operation::Verify => "--verify",
            Operation::Erase => "--erase",
        }
    }

    /// Whether this operation takes a filename argument.
    pub fn needs_filename(self) -> bool {
        !matches!(self, Operation::Erase)
    }
}

impl Cli {
    /// The operation selected by the mutually-exclusive flags, or `Ok(None)`
    /// if none was given (only valid alongside `--list-supported`).
    pub fn operation(&self) -> Result<Option<Operation>, CliError> {
        let candidates = [
            (self.read, Operation::Read),
            (self.write, Operation::Write),
            (self.verify, Operation::Verify),
            (self.erase, Operation::Erase),
        ];
        let selected: Vec<Operation> = candidates
            .into_iter()
            .filter(|(set, _)| *set)
            .map(|(_, op)| op)
            .collect();

        match selected.as_slice() {
            [] => Ok(None),
            [op] => Ok(Some(*op)),
            _ => Err(CliError::ConflictingOperations),
        }
    }

    /// Split `--programmer NAME[:params]` into its name and parameter string.
    pub fn programmer_name_and_params(&self) -> (&str, &str) {
        match self.programmer.split_once(':') {
            Some((name, params)) => (name, params),
            None => (self.programmer.as_str(), ""),
        }
    }
}
