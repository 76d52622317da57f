//! Bump-allocated regions carved out of the arena buffer.
//!
//! A [`Region`] never allocates memory itself — it marks out a byte
//! range of the arena's single buffer and advances a cursor through it.
//! A two-word canary sits immediately past the region's capacity;
//! [`Region::check`] (via [`crate::Arena::check`]) detects consumers
//! that wrote past their bound.

use std::fmt;
use std::rc::Rc;

use crate::buffer::SharedBuffer;
use crate::error::ArenaError;
use crate::handle::{BoundsMode, RelPtr};

/// First canary word, written at `origin + capacity`.
pub(crate) const CANARY_HEAD: [u8; 4] = *b"DATA";

/// Second canary word, written four bytes after the first.
pub(crate) const CANARY_TAIL: [u8; 4] = *b"BLOK";

/// Canary footprint past each region's capacity.
pub(crate) const CANARY_LEN: usize = 8;

/// Which fixed-purpose region of the arena an allocation lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RegionKind {
    /// Allocations whose count and size are fixed at startup and never
    /// resized: configuration, window state, text buffers.
    Static,
    /// Data whose volume is only known at runtime and is expected to
    /// grow. The only region [`crate::Arena::resize`] extends, and the
    /// only one with `dealloc`/`realloc` support.
    Dynamic,
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static => write!(f, "static"),
            Self::Dynamic => write!(f, "dynamic"),
        }
    }
}

/// A bump-allocated byte range within the arena buffer.
///
/// Constructed only by the arena; collaborators reach it through
/// [`crate::Arena::region`] for stats and allocate through the arena's
/// methods. The cursor only moves forward, except for the dynamic
/// region's LIFO rewind.
pub struct Region {
    kind: RegionKind,
    buffer: SharedBuffer,
    /// Offset of the region within the arena buffer. 16-byte aligned;
    /// never changes once carved, even across a resize.
    origin: usize,
    capacity: usize,
    cursor: usize,
}

impl Region {
    /// Carve a region and write its canary.
    pub(crate) fn new(
        kind: RegionKind,
        buffer: SharedBuffer,
        origin: usize,
        capacity: usize,
    ) -> Self {
        let mut region = Self {
            kind,
            buffer,
            origin,
            capacity,
            cursor: 0,
        };
        region.write_canary();
        region
    }

    /// (Re)write the canary pair at `origin + capacity`.
    pub(crate) fn write_canary(&mut self) {
        let mut inner = self.buffer.borrow_mut();
        let at = self.origin + self.capacity;
        inner.buf[at..at + 4].copy_from_slice(&CANARY_HEAD);
        inner.buf[at + 4..at + CANARY_LEN].copy_from_slice(&CANARY_TAIL);
    }

    /// Bump-allocate `size` bytes, zero-filled.
    ///
    /// The returned handle's spans are `forward = size`,
    /// `backward = cursor` — the distance back to the region's start at
    /// the moment of allocation.
    pub(crate) fn try_alloc<M: BoundsMode>(
        &mut self,
        size: usize,
    ) -> Result<RelPtr<u8, M>, ArenaError> {
        let new_cursor = match self.cursor.checked_add(size) {
            Some(c) if c <= self.capacity => c,
            _ => {
                return Err(ArenaError::CapacityExceeded {
                    region: self.kind,
                    requested: self.cursor.saturating_add(size),
                    capacity: self.capacity,
                })
            }
        };
        {
            let mut inner = self.buffer.borrow_mut();
            let at = self.origin + self.cursor;
            inner.buf[at..at + size].fill(0);
        }
        let handle = RelPtr::new(
            self.origin + self.cursor,
            Rc::downgrade(&self.buffer),
            size,
            self.cursor,
        );
        self.cursor = new_cursor;
        Ok(handle)
    }

    /// Verify the canary pair.
    pub(crate) fn check(&self) -> Result<(), ArenaError> {
        let inner = self.buffer.borrow();
        let at = self.origin + self.capacity;
        let tags = inner
            .buf
            .get(at..at + CANARY_LEN)
            .ok_or(ArenaError::Aborted)?;
        if tags[..4] != CANARY_HEAD || tags[4..] != CANARY_TAIL {
            return Err(ArenaError::CorruptionDetected { region: self.kind });
        }
        Ok(())
    }

    /// Grow the region's capacity in place after the arena buffer grew.
    ///
    /// The old canary location falls inside the usable range afterwards,
    /// so it is zeroed before the canary is rewritten at the new bound.
    pub(crate) fn extend(&mut self, new_capacity: usize) {
        debug_assert!(new_capacity >= self.capacity);
        {
            let mut inner = self.buffer.borrow_mut();
            let old = self.origin + self.capacity;
            inner.buf[old..old + CANARY_LEN].fill(0);
        }
        self.capacity = new_capacity;
        self.write_canary();
    }

    /// Rewind the cursor iff `[rel, rel + size)` is the most recent
    /// allocation. Interior ranges cannot be reclaimed by a bump
    /// allocator and are left in place.
    pub(crate) fn rewind(&mut self, rel: usize, size: usize) -> bool {
        if rel.saturating_add(size) == self.cursor {
            self.cursor = rel;
            true
        } else {
            false
        }
    }

    /// Regrow the top allocation `[rel, rel + old)` to `new` bytes in
    /// place, zero-filling any newly exposed tail.
    ///
    /// The caller has verified `rel + old == cursor`.
    pub(crate) fn regrow<M: BoundsMode>(
        &mut self,
        rel: usize,
        old: usize,
        new: usize,
    ) -> Result<RelPtr<u8, M>, ArenaError> {
        debug_assert_eq!(rel + old, self.cursor);
        let new_cursor = match rel.checked_add(new) {
            Some(c) if c <= self.capacity => c,
            _ => {
                return Err(ArenaError::CapacityExceeded {
                    region: self.kind,
                    requested: rel.saturating_add(new),
                    capacity: self.capacity,
                })
            }
        };
        if new > old {
            let mut inner = self.buffer.borrow_mut();
            let at = self.origin + rel;
            inner.buf[at + old..at + new].fill(0);
        }
        self.cursor = new_cursor;
        Ok(RelPtr::new(
            self.origin + rel,
            Rc::downgrade(&self.buffer),
            new,
            rel,
        ))
    }

    /// Which region this is.
    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    /// Offset of the region within the arena buffer.
    pub fn origin(&self) -> usize {
        self.origin
    }

    /// Usable capacity in bytes, excluding the canary.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes allocated so far.
    pub fn used(&self) -> usize {
        self.cursor
    }

    /// Bytes still available to `alloc`.
    pub fn remaining(&self) -> usize {
        self.capacity - self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::BaseCell;
    use crate::handle::Checked;

    fn region(capacity: usize) -> Region {
        let cell = BaseCell::new_shared(capacity + CANARY_LEN + 32).unwrap();
        Region::new(RegionKind::Static, cell, 0, capacity)
    }

    #[test]
    fn canary_written_at_capacity() {
        let r = region(64);
        let inner = r.buffer.borrow();
        assert_eq!(&inner.buf[64..68], b"DATA");
        assert_eq!(&inner.buf[68..72], b"BLOK");
    }

    #[test]
    fn sequential_alloc_offsets() {
        let mut r = region(200);
        let a = r.try_alloc::<Checked>(100).unwrap();
        let b = r.try_alloc::<Checked>(50).unwrap();
        assert_eq!(a.offset(), 0);
        assert_eq!(b.offset(), 100);
        assert_eq!(r.used(), 150);
        assert_eq!(r.remaining(), 50);
    }

    #[test]
    fn alloc_past_capacity_is_rejected() {
        let mut r = region(200);
        let err = r.try_alloc::<Checked>(201).unwrap_err();
        assert_eq!(
            err,
            ArenaError::CapacityExceeded {
                region: RegionKind::Static,
                requested: 201,
                capacity: 200,
            }
        );
        // cursor untouched by the failed attempt
        assert_eq!(r.used(), 0);
    }

    #[test]
    fn exact_fit_succeeds() {
        let mut r = region(64);
        assert!(r.try_alloc::<Checked>(64).is_ok());
        assert!(r.try_alloc::<Checked>(1).is_err());
    }

    #[test]
    fn check_detects_smashed_canary() {
        let r = region(64);
        r.buffer.borrow_mut().buf[64] = 0;
        assert_eq!(
            r.check(),
            Err(ArenaError::CorruptionDetected {
                region: RegionKind::Static
            })
        );
    }

    #[test]
    fn check_passes_on_interior_writes() {
        let mut r = region(64);
        let p = r.try_alloc::<Checked>(64).unwrap();
        for i in 0..64 {
            p.set_at(i, 0xFF).unwrap();
        }
        assert!(r.check().is_ok());
    }

    #[test]
    fn rewind_reclaims_top_only() {
        let mut r = region(128);
        let _a = r.try_alloc::<Checked>(32).unwrap();
        let b = r.try_alloc::<Checked>(16).unwrap();
        // b is the top allocation: rel offset 32
        assert!(r.rewind(b.offset(), 16));
        assert_eq!(r.used(), 32);
        // a is now the top but we try to rewind a stale interior claim
        assert!(!r.rewind(4, 8));
        assert_eq!(r.used(), 32);
    }

    #[test]
    fn alloc_zero_fills_reused_bytes() {
        let mut r = region(64);
        let a = r.try_alloc::<Checked>(16).unwrap();
        a.copy_from_slice(&[0xEE; 16]).unwrap();
        assert!(r.rewind(0, 16));
        let b = r.try_alloc::<Checked>(16).unwrap();
        assert_eq!(b.to_vec(16).unwrap(), vec![0u8; 16]);
    }

    #[test]
    fn extend_moves_canary() {
        let cell = BaseCell::new_shared(256).unwrap();
        let mut r = Region::new(RegionKind::Dynamic, cell, 0, 64);
        r.extend(128);
        let inner = r.buffer.borrow();
        // old canary location zeroed, new one written
        assert_eq!(&inner.buf[64..72], &[0u8; 8]);
        assert_eq!(&inner.buf[128..132], b"DATA");
        assert_eq!(&inner.buf[132..136], b"BLOK");
        drop(inner);
        assert_eq!(r.capacity(), 128);
        assert!(r.check().is_ok());
    }
}
