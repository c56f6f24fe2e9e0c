//! Flash context: the runtime handle bundling a chip record with its
//! programmer borrow. The erase/write/verify engine built on top of it
//! lives in [`crate::erase_write`].

mod context;

pub use context::FlashContext;
