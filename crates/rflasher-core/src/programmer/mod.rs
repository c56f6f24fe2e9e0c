//! Programmer dispatch
//!
//! A programmer is the backend that drives the physical bus to the chip.
//! Selecting one fixes the implementations of the byte/word/long/n-byte
//! read/write primitives and the physical-window mapping functions for the
//! rest of the run, mirroring the source's `programmer_table[programmer]`
//! indirection.

use bitflags::bitflags;

use crate::error::Result;

bitflags! {
    /// Bus types a chip or a programmer may support.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BusType: u8 {
        /// Parallel flash bus
        const PARALLEL = 1 << 0;
        /// LPC (Low Pin Count) bus
        const LPC      = 1 << 1;
        /// FWH (Firmware Hub) bus
        const FWH      = 1 << 2;
        /// SPI bus
        const SPI      = 1 << 3;
    }
}

/// Sentinel returned by [`ProgrammerDispatch::map_flash_region`] for
/// transports that have no memory-mapped window (e.g. a USB/serial
/// programmer). Chip functions must go through the dispatch vtable rather
/// than dereferencing this directly.
pub const UNMAPPED: u32 = u32::MAX;

/// The fixed set of primitives a selected programmer provides for the rest
/// of the run.
///
/// `chip_read{b,w,l,n}` and `chip_write{b,w,l,n}` operate on a *flash-
/// relative* address (`0..total_size`), not a physical address; it is the
/// implementation's job to translate that into whatever its transport needs
/// (a memory-mapped offset, a USB command, ...).
pub trait ProgrammerDispatch {
    /// Buses this programmer can reach.
    fn supported_buses(&self) -> BusType;

    /// Read a single byte at a flash-relative address.
    fn chip_readb(&mut self, addr: u32) -> Result<u8>;
    /// Write a single byte at a flash-relative address.
    fn chip_writeb(&mut self, addr: u32, val: u8) -> Result<()>;

    /// Read a little-endian word. Default: synthesized from two byte reads.
    fn chip_readw(&mut self, addr: u32) -> Result<u16> {
        fallback_chip_readw(self, addr)
    }
    /// Read a little-endian long. Default: synthesized from four byte reads.
    fn chip_readl(&mut self, addr: u32) -> Result<u32> {
        fallback_chip_readl(self, addr)
    }
    /// Read `buf.len()` bytes starting at `addr`. Default: iterates `chip_readb`.
    fn chip_readn(&mut self, addr: u32, buf: &mut [u8]) -> Result<()> {
        fallback_chip_readn(self, addr, buf)
    }

    /// Write a little-endian word. Default: synthesized from two byte writes.
    fn chip_writew(&mut self, addr: u32, val: u16) -> Result<()> {
        fallback_chip_writew(self, addr, val)
    }
    /// Write a little-endian long. Default: synthesized from four byte writes.
    fn chip_writel(&mut self, addr: u32, val: u32) -> Result<()> {
        fallback_chip_writel(self, addr, val)
    }
    /// Write `data` starting at `addr`. Default: iterates `chip_writeb`.
    fn chip_writen(&mut self, addr: u32, data: &[u8]) -> Result<()> {
        fallback_chip_writen(self, addr, data)
    }

    /// Erase `len` bytes starting at `addr`. This is the one primitive that
    /// is not just byte-transport: it is the programmer's concrete erase
    /// operation (the wire-level command sequence is out of scope here; a
    /// real backend would translate this into the appropriate sector/block
    /// erase command for the bus it drives).
    fn erase_region(&mut self, addr: u32, len: u32) -> Result<()>;

    /// Identify the attached chip, analogous to a JEDEC `RDID`/parallel ID
    /// read. Returns `(manufacture_id, model_id)`.
    fn read_id(&mut self) -> Result<(u8, u16)>;

    /// Map the chip's physical window at `base` for `size` bytes, returning
    /// a virtual base address, or [`UNMAPPED`] if this transport has no
    /// memory-mapped window.
    fn map_flash_region(&mut self, base: u32, size: u32) -> Result<u32> {
        let _ = (base, size);
        Ok(UNMAPPED)
    }

    /// Release a window returned by `map_flash_region`.
    fn unmap_flash_region(&mut self, _virtual_base: u32, _size: u32) {}

    /// Busy-sleep for timing-sensitive chip protocol gaps.
    fn delay_us(&mut self, _us: u32) {}
}

/// Read a little-endian word from two byte reads.
pub fn fallback_chip_readw<D: ProgrammerDispatch + ?Sized>(d: &mut D, addr: u32) -> Result<u16> {
    let lo = d.chip_readb(addr)?;
    let hi = d.chip_readb(addr + 1)?;
    Ok(u16::from_le_bytes([lo, hi]))
}

/// Read a little-endian long from four byte reads.
pub fn fallback_chip_readl<D: ProgrammerDispatch + ?Sized>(d: &mut D, addr: u32) -> Result<u32> {
    let mut bytes = [0u8; 4];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = d.chip_readb(addr + i as u32)?;
    }
    Ok(u32::from_le_bytes(bytes))
}

/// Read `buf.len()` bytes by iterating `chip_readb`.
pub fn fallback_chip_readn<D: ProgrammerDispatch + ?Sized>(
    d: &mut D,
    addr: u32,
    buf: &mut [u8],
) -> Result<()> {
    for (i, b) in buf.iter_mut().enumerate() {
        *b = d.chip_readb(addr + i as u32)?;
    }
    Ok(())
}

/// Write a little-endian word as two byte writes.
pub fn fallback_chip_writew<D: ProgrammerDispatch + ?Sized>(
    d: &mut D,
    addr: u32,
    val: u16,
) -> Result<()> {
    let [lo, hi] = val.to_le_bytes();
    d.chip_writeb(addr, lo)?;
    d.chip_writeb(addr + 1, hi)
}

/// Write a little-endian long as four byte writes.
pub fn fallback_chip_writel<D: ProgrammerDispatch + ?Sized>(
    d: &mut D,
    addr: u32,
    val: u32,
) -> Result<()> {
    for (i, b) in val.to_le_bytes().iter().enumerate() {
        d.chip_writeb(addr + i as u32, *b)?;
    }
    Ok(())
}

/// Write `data` by iterating `chip_writeb`.
pub fn fallback_chip_writen<D: ProgrammerDispatch + ?Sized>(
    d: &mut D,
    addr: u32,
    data: &[u8],
) -> Result<()> {
    for (i, b) in data.iter().enumerate() {
        d.chip_writeb(addr + i as u32, *b)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ByteOnly {
        mem: [u8; 16],
    }

    impl ProgrammerDispatch for ByteOnly {
        fn supported_buses(&self) -> BusType {
            BusType::SPI
        }
        fn chip_readb(&mut self, addr: u32) -> Result<u8> {
            Ok(self.mem[addr as usize])
        }
        fn chip_writeb(&mut self, addr: u32, val: u8) -> Result<()> {
            self.mem[addr as usize] = val;
            Ok(())
        }
        fn erase_region(&mut self, addr: u32, len: u32) -> Result<()> {
            for b in &mut self.mem[addr as usize..(addr + len) as usize] {
                *b = 0xFF;
            }
            Ok(())
        }
        fn read_id(&mut self) -> Result<(u8, u16)> {
            Ok((0, 0))
        }
    }

    #[test]
    fn fallback_readw_is_little_endian() {
        let mut d = ByteOnly { mem: [0; 16] };
        d.mem[0] = 0x34;
        d.mem[1] = 0x12;
        assert_eq!(d.chip_readw(0).unwrap(), 0x1234);
    }

    #[test]
    fn fallback_writel_roundtrips() {
        let mut d = ByteOnly { mem: [0; 16] };
        d.chip_writel(4, 0xAABB_CCDD).unwrap();
        assert_eq!(d.chip_readl(4).unwrap(), 0xAABB_CCDD);
    }

    #[test]
    fn fallback_readn_writen_roundtrip() {
        let mut d = ByteOnly { mem: [0; 16] };
        d.chip_writen(2, &[1, 2, 3, 4]).unwrap();
        let mut buf = [0u8; 4];
        d.chip_readn(2, &mut buf).unwrap();
        assert_eq!(buf, [1, 2, 3, 4]);
    }
}
