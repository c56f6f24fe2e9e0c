//! Session: the value that owns the active programmer and its shutdown
//! registry for one run.
//!
//! Generalizes the source's combination of a single selected
//! `programmer_table` entry plus the process-wide `shutdown_fn` array into
//! one value with no global state, so nothing but this value needs to be
//! constructed to run a test in isolation. There is exactly one programmer
//! active per session; chip operations borrow it through a
//! [`crate::flash::FlashContext`] built by [`Session::context_for`].

use crate::chip::FlashChip;
use crate::flash::FlashContext;
use crate::programmer::ProgrammerDispatch;
use crate::shutdown::ShutdownRegistry;
use crate::Result;

/// Owns the active programmer and its shutdown registry for the duration
/// of one run.
pub struct Session<P: ProgrammerDispatch> {
    programmer: P,
    shutdown: ShutdownRegistry,
}

impl<P: ProgrammerDispatch> Session<P> {
    /// Start a session over an already-constructed programmer, opening its
    /// shutdown registry for registration.
    pub fn new(programmer: P) -> Self {
        let mut shutdown = ShutdownRegistry::new();
        shutdown.open();
        Self {
            programmer,
            shutdown,
        }
    }

    /// Register a teardown callback, run in LIFO order at [`Session::shutdown`].
    pub fn register_shutdown(&mut self, callback: fn(usize) -> Result<()>, data: usize) -> Result<()> {
        self.shutdown.register(callback, data)
    }

    /// Build a [`FlashContext`] borrowing this session's programmer for the
    /// given chip.
    pub fn context_for(&mut self, chip: FlashChip) -> FlashContext<'_> {
        FlashContext::new(chip, &mut self.programmer)
    }

    /// Run every registered shutdown callback in LIFO order. Safe to call
    /// once; further calls are a no-op, matching
    /// [`ShutdownRegistry::drain`].
    pub fn shutdown(&mut self) -> Result<()> {
        self.shutdown.drain()
    }

    /// Borrow the programmer directly, for operations that don't need a
    /// chip (e.g. bus capability queries).
    pub fn programmer(&mut self) -> &mut P {
        &mut self.programmer
    }
}

impl<P: ProgrammerDispatch> Drop for Session<P> {
    fn drop(&mut self) {
        let _ = self.shutdown.drain();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::programmer::BusType;

    struct Noop;
    impl ProgrammerDispatch for Noop {
        fn supported_buses(&self) -> BusType {
            BusType::SPI
        }
        fn chip_readb(&mut self, _addr: u32) -> Result<u8> {
            Ok(0xff)
        }
        fn chip_writeb(&mut self, _addr: u32, _val: u8) -> Result<()> {
            Ok(())
        }
        fn erase_region(&mut self, _addr: u32, _len: u32) -> Result<()> {
            Ok(())
        }
        fn read_id(&mut self) -> Result<(u8, u16)> {
            Ok((0, 0))
        }
    }

    // A per-test stack-local counter, reached through its address cast to
    // `usize` and back, so parallel test execution can't share state the
    // way a shared `static mut` would.
    fn bump(data: usize) -> Result<()> {
        let counter = unsafe { &mut *(data as *mut u8) };
        *counter += 1;
        Ok(())
    }

    #[test]
    fn drop_drains_registered_shutdown_callbacks() {
        let mut calls: u8 = 0;
        let ptr = &mut calls as *mut u8 as usize;
        {
            let mut session = Session::new(Noop);
            session.register_shutdown(bump, ptr).unwrap();
            session.register_shutdown(bump, ptr).unwrap();
        }
        assert_eq!(calls, 2);
    }

    #[test]
    fn explicit_shutdown_then_drop_does_not_double_run() {
        let mut calls: u8 = 0;
        let ptr = &mut calls as *mut u8 as usize;
        let mut session = Session::new(Noop);
        session.register_shutdown(bump, ptr).unwrap();
        session.shutdown().unwrap();
        drop(session);
        assert_eq!(calls, 1);
    }

    #[test]
    fn context_for_borrows_the_session_programmer() {
        let mut session = Session::new(Noop);
        let chip = crate::chip::BUILTIN_CHIPS[0];
        let mut ctx = session.context_for(chip);
        assert_eq!(ctx.programmer.read_id(), Ok((0, 0)));
        let _ = Error::ProgrammerError;
    }
}
