//! Flash context - runtime state for flash operations

use crate::chip::FlashChip;
use crate::programmer::ProgrammerDispatch;

/// Runtime context bundling a chip's capability record with a live borrow of
/// the active programmer.
///
/// There is exactly one programmer active per run, selected before any chip
/// operation and immutable for the run's duration, so `FlashContext` borrows
/// it directly rather than holding an index into a process-wide table or an
/// owning back-reference to the session that created it.
pub struct FlashContext<'p> {
    /// The identified (or user-forced) flash chip.
    pub chip: FlashChip,
    /// The active programmer, borrowed for the lifetime of this context.
    pub programmer: &'p mut dyn ProgrammerDispatch,
}

impl<'p> FlashContext<'p> {
    /// Create a new flash context for the given chip and programmer.
    pub fn new(chip: FlashChip, programmer: &'p mut dyn ProgrammerDispatch) -> Self {
        Self { chip, programmer }
    }

    /// Get the page size for this chip
    pub fn page_size(&self) -> usize {
        self.chip.page_size as usize
    }

    /// Get the total size of this chip
    pub fn total_size(&self) -> usize {
        self.chip.total_size as usize
    }

    /// Check if an address is valid for this chip
    pub fn is_valid_address(&self, addr: u32) -> bool {
        addr < self.chip.total_size
    }

    /// Check if an address range is valid for this chip
    pub fn is_valid_range(&self, addr: u32, len: usize) -> bool {
        if addr >= self.chip.total_size {
            return false;
        }
        let end = addr as u64 + len as u64;
        end <= self.chip.total_size as u64
    }
}
