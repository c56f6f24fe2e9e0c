//! Shutdown registry
//!
//! A bounded, append-only (until drained) list of teardown callbacks invoked
//! in LIFO order at programmer shutdown. Mirrors the source's fixed
//! `shutdown_fn[SHUTDOWN_MAXFN]` array and `register_shutdown`/
//! `programmer_shutdown` pair, replacing the process-wide array with a
//! value owned by the [`crate::Session`].

use heapless::Vec;

use crate::error::{Error, Result};

/// Maximum number of shutdown callbacks that may be registered in one run.
pub const MAX_SHUTDOWN_FNS: usize = 32;

/// A registered teardown callback and its opaque context.
///
/// Callbacks are plain function pointers closing over no state beyond
/// `data`, mirroring the source's `(shutdown_fn, void *data)` pairs.
type ShutdownFn = fn(data: usize) -> Result<()>;

#[derive(Clone, Copy)]
struct ShutdownEntry {
    callback: ShutdownFn,
    data: usize,
}

/// Whether new callbacks may currently be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gate {
    Closed,
    Open,
    Drained,
}

/// Bounded LIFO registry of teardown callbacks.
pub struct ShutdownRegistry {
    entries: Vec<ShutdownEntry, MAX_SHUTDOWN_FNS>,
    gate: Gate,
}

impl ShutdownRegistry {
    /// Create a registry that is closed for registration until [`open`](Self::open) is called.
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
            gate: Gate::Closed,
        }
    }

    /// Permit registration. Called at the start of programmer init.
    pub fn open(&mut self) {
        self.gate = Gate::Open;
    }

    /// Register a teardown callback.
    ///
    /// Returns [`Error::ShutdownRegistryClosed`] if registration is not
    /// currently permitted, or [`Error::ShutdownRegistryFull`] if the fixed
    /// bound has been reached.
    pub fn register(&mut self, callback: ShutdownFn, data: usize) -> Result<()> {
        if self.gate != Gate::Open {
            return Err(Error::ShutdownRegistryClosed);
        }
        self.entries
            .push(ShutdownEntry { callback, data })
            .map_err(|_| Error::ShutdownRegistryFull)
    }

    /// Disable further registration and invoke every callback in reverse
    /// registration order, OR-reducing the results: any callback failure
    /// makes the overall drain report failure, but every callback still runs.
    ///
    /// Safe to call once per run; a second call is a no-op returning `Ok(())`.
    pub fn drain(&mut self) -> Result<()> {
        if self.gate == Gate::Drained {
            return Ok(());
        }
        self.gate = Gate::Drained;
        let mut result = Ok(());
        while let Some(entry) = self.entries.pop() {
            if let Err(e) = (entry.callback)(entry.data) {
                log::error!("shutdown callback failed: {e}");
                result = Err(e);
            }
        }
        result
    }

    /// Number of callbacks currently registered.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry has no callbacks registered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ShutdownRegistry {
    fn default() -> Self {
        Self::new()
    }
}
