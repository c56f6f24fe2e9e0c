//! The differential erase/write/verify engine
//!
//! Generalizes the source's `erase_and_write_flash()` / `walk_eraseregions()`
//! / `erase_and_write_block_helper()` chain: write only the blocks that
//! differ, erase only the blocks where a bit needs to flip 0->1 (which a
//! plain write can never do), and fall back to the next usable block eraser
//! -- after a full chip re-read -- if the one in use fails partway through.
//!
//! Buffers are caller-supplied rather than allocated here so the engine
//! stays usable from a `no_std` caller with a fixed scratch buffer; the
//! `std` CLI is the one that owns `Vec<u8>` buffers sized to the chip.

use crate::chip::{BlockEraser, WriteGranularity};
use crate::error::{Error, Result};
use crate::flash::FlashContext;

/// Size of the scratch chunk used when streaming a read-verify over a
/// range larger than we want to put on the stack at once.
const CHUNK: usize = 256;

/// Byte stride a `Page`-granularity chip writes atomically. `Bit` and `Byte`
/// granularity both operate at 1-byte stride.
const PAGE_STRIDE: usize = 256;

fn write_stride(granularity: WriteGranularity) -> usize {
    match granularity {
        WriteGranularity::Page => PAGE_STRIDE,
        WriteGranularity::Bit | WriteGranularity::Byte => 1,
    }
}

/// Whether writing `new` over `old` requires an erase first.
///
/// A plain write can only clear bits (never set them), so whether an erase
/// is needed depends on what the chip's granularity can clear in place:
/// - `Bit`: any individual bit that must rise from 0 to 1 forces an erase,
///   byte-by-byte (`have & want != want`).
/// - `Byte`: a byte forces an erase only if it differs from the desired
///   value *and* isn't already `0xFF` (a from-erased byte can always be
///   written down to any value without erasing first).
/// - `Page`: the same byte-level test as `Byte`, but applied per
///   `PAGE_STRIDE`-byte subblock rather than per byte -- a single differing,
///   non-erased byte forces the whole subblock to be erased.
pub fn need_erase(old: &[u8], new: &[u8], granularity: WriteGranularity) -> bool {
    match granularity {
        WriteGranularity::Bit => old.iter().zip(new.iter()).any(|(&o, &n)| (o & n) != n),
        WriteGranularity::Byte => old
            .iter()
            .zip(new.iter())
            .any(|(&o, &n)| o != n && o != 0xff),
        WriteGranularity::Page => old
            .chunks(PAGE_STRIDE)
            .zip(new.chunks(PAGE_STRIDE))
            .any(|(oc, nc)| oc != nc && !oc.iter().all(|&b| b == 0xff)),
    }
}

/// Find the next contiguous run starting at or after `from` where `old` and
/// `new` differ, returning `(run_start, run_len)` relative to the start of
/// both slices, or `None` once no further differences remain.
///
/// Differences are checked in units of the chip's write stride (1 byte for
/// `Bit`/`Byte` granularity, `PAGE_STRIDE` bytes for `Page`), so a
/// `Page`-granularity chip is never handed a sub-page partial write: a
/// single differing byte anywhere in a page pulls the whole page into the
/// run.
pub fn get_next_write(
    old: &[u8],
    new: &[u8],
    from: usize,
    granularity: WriteGranularity,
) -> Option<(usize, usize)> {
    let stride = write_stride(granularity);
    let len = old.len();
    let differs = |i: usize| {
        let end = (i + stride).min(len);
        old[i..end] != new[i..end]
    };

    let mut i = from;
    while i < len && !differs(i) {
        i += stride;
    }
    if i >= len {
        return None;
    }
    let start = i;
    while i < len && differs(i) {
        i += stride;
    }
    Some((start, i.min(len) - start))
}

/// Compare two equally-sized in-memory buffers. No chip I/O: used when the
/// desired contents are already known to equal a freshly-read buffer, e.g.
/// a verify-only pass with no preceding write.
pub fn compare_range(want: &[u8], have: &[u8]) -> Result<()> {
    if want.len() == have.len() && want == have {
        Ok(())
    } else {
        Err(Error::VerifyError)
    }
}

/// Read `want.len()` bytes starting at `start` from the chip and compare
/// them against `want`, streaming the read through a fixed-size chunk
/// buffer so this works regardless of `want`'s size.
pub fn verify_range(ctx: &mut FlashContext<'_>, want: &[u8], start: u32) -> Result<()> {
    let read = ctx.chip.read.ok_or(Error::VerifyError)?;
    let mut chunk = [0u8; CHUNK];
    let mut offset = 0usize;
    while offset < want.len() {
        let n = CHUNK.min(want.len() - offset);
        read(ctx, start + offset as u32, &mut chunk[..n]).map_err(|_| Error::VerifyError)?;
        if chunk[..n] != want[offset..offset + n] {
            return Err(Error::VerifyError);
        }
        offset += n;
    }
    Ok(())
}

/// Read `len` bytes starting at `start` from the chip and confirm every
/// byte is `0xFF`, streaming the read through a fixed-size chunk buffer.
pub fn check_erased_range(ctx: &mut FlashContext<'_>, start: u32, len: u32) -> Result<()> {
    let read = ctx.chip.read.ok_or(Error::EraseVerifyError)?;
    let mut chunk = [0u8; CHUNK];
    let mut offset = 0u32;
    while offset < len {
        let n = (CHUNK as u32).min(len - offset) as usize;
        read(ctx, start + offset, &mut chunk[..n]).map_err(|_| Error::EraseVerifyError)?;
        if chunk[..n].iter().any(|&b| b != 0xff) {
            return Err(Error::EraseVerifyError);
        }
        offset += n as u32;
    }
    Ok(())
}

/// Read the whole chip into `buf`, which must be exactly `ctx.total_size()`
/// bytes, streaming through a fixed-size chunk buffer.
pub fn read_full(ctx: &mut FlashContext<'_>, buf: &mut [u8]) -> Result<()> {
    if buf.len() != ctx.total_size() {
        return Err(Error::BufferSizeMismatch);
    }
    let read = ctx.chip.read.ok_or(Error::RecoveryReadError)?;
    let mut offset = 0usize;
    while offset < buf.len() {
        let n = CHUNK.min(buf.len() - offset);
        let (_, rest) = buf.split_at_mut(offset);
        let (chunk, _) = rest.split_at_mut(n);
        read(ctx, offset as u32, chunk).map_err(|_| Error::RecoveryReadError)?;
        offset += n;
    }
    Ok(())
}

/// Erase (if needed) and write one block, then verify the result landed in
/// `curcontents` (the engine's running model of chip state).
fn erase_and_write_block_helper(
    ctx: &mut FlashContext<'_>,
    start: u32,
    len: u32,
    erase: crate::chip::EraseFn,
    oldcontents: &[u8],
    newcontents: &[u8],
    curcontents: &mut [u8],
) -> Result<()> {
    let s = start as usize;
    let l = len as usize;
    let old_slice = &oldcontents[s..s + l];
    let new_slice = &newcontents[s..s + l];
    let granularity = ctx.chip.write_granularity;

    if need_erase(old_slice, new_slice, granularity) {
        erase(ctx, start, len).map_err(|_| Error::EraseError)?;
        check_erased_range(ctx, start, len)?;
        curcontents[s..s + l].fill(0xff);
        log::trace!("erased block at {start:#x}, len {len:#x}");
    }

    let write = ctx.chip.write.ok_or(Error::WriteError)?;
    let mut offset = 0usize;
    let mut wrote_any = false;
    while let Some((rel_start, rel_len)) =
        get_next_write(&curcontents[s..s + l], new_slice, offset, granularity)
    {
        wrote_any = true;
        let chunk = &new_slice[rel_start..rel_start + rel_len];
        write(ctx, start + rel_start as u32, chunk).map_err(|_| Error::WriteError)?;
        curcontents[s + rel_start..s + rel_start + rel_len].copy_from_slice(chunk);
        log::trace!("wrote {rel_len} bytes at {:#x}", start as usize + rel_start);
        offset = rel_start + rel_len;
    }
    if !wrote_any {
        // matches the source's "S" (skip) progress glyph: block already matched
        log::trace!("S");
    }
    Ok(())
}

/// Erase and write every block described by one eraser's region layout, in
/// ascending address order, stopping at the first block that fails.
fn walk_eraseregions(
    ctx: &mut FlashContext<'_>,
    eraser: &BlockEraser,
    oldcontents: &[u8],
    newcontents: &[u8],
    curcontents: &mut [u8],
) -> Result<()> {
    let erase = eraser.erase.ok_or(Error::NoUsableEraseFunction)?;
    let mut start: u32 = 0;
    for region in eraser.regions() {
        for _ in 0..region.count {
            erase_and_write_block_helper(
                ctx,
                start,
                region.size,
                erase,
                oldcontents,
                newcontents,
                curcontents,
            )?;
            start += region.size;
        }
    }
    Ok(())
}

/// Drive a full differential erase/write pass: try each of the chip's
/// block erasers in turn (skipping any with no layout or no erase
/// function) until one completes every block without error. Between
/// attempts, `curcontents` -- the engine's model of chip state -- is
/// reset by a full chip re-read, since a partially-completed attempt may
/// have left the chip in a state `oldcontents` no longer describes.
///
/// `oldcontents`, `newcontents`, and `curcontents` must each be exactly
/// `ctx.total_size()` bytes; `curcontents` is overwritten as scratch space.
pub fn erase_and_write_flash(
    ctx: &mut FlashContext<'_>,
    oldcontents: &[u8],
    newcontents: &[u8],
    curcontents: &mut [u8],
) -> Result<()> {
    let total = ctx.total_size();
    if oldcontents.len() != total || newcontents.len() != total || curcontents.len() != total {
        return Err(Error::BufferSizeMismatch);
    }

    curcontents.copy_from_slice(oldcontents);

    let num_erasers = ctx.chip.num_erasers;
    let mut last_err = Error::NoUsableEraseFunction;
    let mut tried_any = false;

    for k in 0..num_erasers {
        let eraser = ctx.chip.block_erasers[k];
        if !eraser.has_layout() || eraser.erase.is_none() {
            continue;
        }
        tried_any = true;
        match walk_eraseregions(ctx, &eraser, oldcontents, newcontents, curcontents) {
            Ok(()) => return Ok(()),
            Err(e) => {
                last_err = e;
                log::error!("eraser {k} failed ({e}), trying next usable eraser");
                if k + 1 < num_erasers {
                    read_full(ctx, curcontents)?;
                }
            }
        }
    }

    if !tried_any {
        Err(Error::NoUsableEraseFunction)
    } else {
        Err(last_err)
    }
}
