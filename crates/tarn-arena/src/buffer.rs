//! The shared buffer cell behind every region and handle.
//!
//! The original trick this crate is built around: nothing except the
//! [`crate::Arena`] ever holds the buffer's address. Regions keep strong
//! references to the cell, handles keep weak ones, and every access
//! resolves its offset against the buffer's current contents — so the
//! arena is free to move (resize) or drop the allocation at any time.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::ArenaError;

/// The arena's single heap allocation plus its liveness flag.
pub(crate) struct BaseCell {
    /// The one buffer. Replaced with an empty vec on abort.
    pub(crate) buf: Vec<u8>,
    /// Cleared by abort; checked on every access.
    pub(crate) live: bool,
}

/// Strong reference to the buffer cell (arena and regions).
pub(crate) type SharedBuffer = Rc<RefCell<BaseCell>>;

/// Weak reference to the buffer cell (handles).
pub(crate) type WeakBuffer = Weak<RefCell<BaseCell>>;

impl BaseCell {
    /// Allocate a zero-filled cell of `len` bytes.
    pub(crate) fn new_shared(len: usize) -> Result<SharedBuffer, ArenaError> {
        let mut buf = Vec::new();
        buf.try_reserve_exact(len)
            .map_err(|_| ArenaError::OutOfMemory { requested: len })?;
        buf.resize(len, 0);
        Ok(Rc::new(RefCell::new(BaseCell { buf, live: true })))
    }

    /// Grow the cell's buffer to `new_len` bytes, zero-filling the tail.
    ///
    /// The backing allocation may move; offsets into it stay meaningful.
    pub(crate) fn grow(cell: &SharedBuffer, new_len: usize) -> Result<(), ArenaError> {
        let mut inner = cell.borrow_mut();
        let extra = new_len.saturating_sub(inner.buf.len());
        inner
            .buf
            .try_reserve_exact(extra)
            .map_err(|_| ArenaError::OutOfMemory { requested: new_len })?;
        inner.buf.resize(new_len, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_shared_is_zeroed_and_live() {
        let cell = BaseCell::new_shared(64).unwrap();
        let inner = cell.borrow();
        assert_eq!(inner.buf.len(), 64);
        assert!(inner.buf.iter().all(|&b| b == 0));
        assert!(inner.live);
    }

    #[test]
    fn grow_preserves_content() {
        let cell = BaseCell::new_shared(16).unwrap();
        cell.borrow_mut().buf[3] = 0xAB;
        BaseCell::grow(&cell, 4096).unwrap();
        let inner = cell.borrow();
        assert_eq!(inner.buf.len(), 4096);
        assert_eq!(inner.buf[3], 0xAB);
        assert!(inner.buf[16..].iter().all(|&b| b == 0));
    }
}
