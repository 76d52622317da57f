//! Relocation-safe handles into the arena buffer.
//!
//! A [`RelPtr`] stores a byte offset plus a weak reference to the
//! arena's buffer cell — never an absolute address. Every access
//! recomputes its position against the buffer's current contents, so a
//! handle issued before [`crate::Arena::resize`] still resolves to the
//! same logical bytes afterwards, even though the allocation moved.
//!
//! Span tracking is selected by the [`BoundsMode`] type parameter.
//! [`Checked`] handles carry the forward and backward byte spans they
//! were created with and reject arithmetic or indexing that leaves
//! them. [`Unchecked`] handles carry no span state at all; an access
//! through one only fails when it falls outside the live buffer, which
//! Rust's slice checks catch regardless. Either way there is no
//! `unsafe` and no way to read or write freed memory.

use std::fmt;
use std::marker::PhantomData;
use std::mem;

use bytemuck::{Pod, Zeroable};

use crate::buffer::WeakBuffer;
use crate::error::ArenaError;

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::Checked {}
    impl Sealed for super::Unchecked {}
}

/// Span bookkeeping strategy for [`RelPtr`].
///
/// Implemented by [`Checked`] and [`Unchecked`] only; the trait exists
/// so the two handle flavours share one interface instead of living
/// behind scattered build flags.
pub trait BoundsMode: sealed::Sealed + Copy + fmt::Debug + 'static {
    /// Per-handle span state; `()` for [`Unchecked`].
    type Span: Copy + fmt::Debug;

    /// Span for a fresh allocation: `forward` usable bytes ahead of the
    /// handle, `backward` bytes behind it within the same region.
    fn span(forward: usize, backward: usize) -> Self::Span;

    /// Move the span `bytes` forward.
    fn advance(span: Self::Span, bytes: usize) -> Result<Self::Span, ArenaError>;

    /// Move the span `bytes` backward.
    fn retreat(span: Self::Span, bytes: usize) -> Result<Self::Span, ArenaError>;

    /// Verify an access of `bytes` bytes starting at the handle.
    fn check_access(span: Self::Span, bytes: usize) -> Result<(), ArenaError>;
}

/// Forward/backward span of a [`Checked`] handle, in bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    forward: usize,
    backward: usize,
}

impl Span {
    /// Usable bytes ahead of the handle.
    pub fn forward(&self) -> usize {
        self.forward
    }

    /// Bytes behind the handle, back to the start of its allocation's
    /// region extent at creation time.
    pub fn backward(&self) -> usize {
        self.backward
    }
}

/// Bounds-checked mode: every handle carries its spans and every move
/// or access is validated against them.
#[derive(Clone, Copy, Debug)]
pub struct Checked;

impl BoundsMode for Checked {
    type Span = Span;

    fn span(forward: usize, backward: usize) -> Span {
        Span { forward, backward }
    }

    fn advance(span: Span, bytes: usize) -> Result<Span, ArenaError> {
        if bytes > span.forward {
            return Err(ArenaError::BoundsViolation {
                requested: bytes,
                bound: span.forward,
            });
        }
        Ok(Span {
            forward: span.forward - bytes,
            backward: span.backward + bytes,
        })
    }

    fn retreat(span: Span, bytes: usize) -> Result<Span, ArenaError> {
        if bytes > span.backward {
            return Err(ArenaError::BoundsViolation {
                requested: bytes,
                bound: span.backward,
            });
        }
        Ok(Span {
            forward: span.forward + bytes,
            backward: span.backward - bytes,
        })
    }

    fn check_access(span: Span, bytes: usize) -> Result<(), ArenaError> {
        if bytes > span.forward {
            return Err(ArenaError::BoundsViolation {
                requested: bytes,
                bound: span.forward,
            });
        }
        Ok(())
    }
}

/// Unchecked mode: no span fields, no span checks, zero per-handle
/// overhead beyond the offset and the buffer reference.
///
/// The trade is diagnostics, not safety: an out-of-span access through
/// an unchecked handle can scribble over a neighbouring allocation or a
/// region canary, but never outside the live buffer.
#[derive(Clone, Copy, Debug)]
pub struct Unchecked;

impl BoundsMode for Unchecked {
    type Span = ();

    fn span(_forward: usize, _backward: usize) {}

    fn advance(_span: (), _bytes: usize) -> Result<(), ArenaError> {
        Ok(())
    }

    fn retreat(_span: (), _bytes: usize) -> Result<(), ArenaError> {
        Ok(())
    }

    fn check_access(_span: (), _bytes: usize) -> Result<(), ArenaError> {
        Ok(())
    }
}

/// A relocation-safe pointer into an arena region.
///
/// Handed out by region allocation; application code never fabricates
/// one from a raw address. `T` must be plain-old-data ([`Pod`]) so
/// reads and writes are bit copies with no drop obligations. Arithmetic
/// is in elements of `T`; spans are tracked in bytes, so
/// [`RelPtr::cast`] is free.
///
/// All accessors take `&self`: the handle only names bytes, the arena's
/// shared cell owns them.
#[must_use]
pub struct RelPtr<T: Pod = u8, M: BoundsMode = Checked> {
    /// Byte offset from the arena base.
    offset: usize,
    /// The arena's buffer cell. Weak: a handle must never keep a dead
    /// arena's memory alive.
    cell: WeakBuffer,
    span: M::Span,
    _elem: PhantomData<T>,
}

impl<T: Pod, M: BoundsMode> RelPtr<T, M> {
    /// Build a handle. Only regions do this.
    pub(crate) fn new(offset: usize, cell: WeakBuffer, forward: usize, backward: usize) -> Self {
        Self {
            offset,
            cell,
            span: M::span(forward, backward),
            _elem: PhantomData,
        }
    }

    /// Byte offset from the arena base.
    ///
    /// Meaningless without the arena: this is a relative handle, not an
    /// address.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Whether the handle currently resolves inside a live arena.
    ///
    /// The closest thing to the classic "is non-null" test: `false`
    /// once the arena was aborted or dropped.
    pub fn is_live(&self) -> bool {
        match self.cell.upgrade() {
            Some(rc) => {
                let inner = rc.borrow();
                inner.live && self.offset < inner.buf.len()
            }
            None => false,
        }
    }

    /// The handle's current absolute address, if it is live.
    ///
    /// Diagnostic only: the address is stale the moment the arena
    /// resizes. Never read or write through it.
    pub fn as_raw(&self) -> Option<*const u8> {
        let rc = self.cell.upgrade()?;
        let inner = rc.borrow();
        if !inner.live || self.offset >= inner.buf.len() {
            return None;
        }
        Some(inner.buf[self.offset..].as_ptr())
    }

    /// Reinterpret the element type.
    ///
    /// Spans are byte-denominated, so the cast changes only the stride
    /// of subsequent arithmetic, never the reachable range.
    pub fn cast<U: Pod>(self) -> RelPtr<U, M> {
        RelPtr {
            offset: self.offset,
            cell: self.cell,
            span: self.span,
            _elem: PhantomData,
        }
    }

    /// Move the handle `n` elements forward.
    pub fn add(&self, n: usize) -> Result<Self, ArenaError> {
        let bytes = n.saturating_mul(mem::size_of::<T>());
        let span = M::advance(self.span, bytes)?;
        Ok(Self {
            offset: self.offset.saturating_add(bytes),
            cell: self.cell.clone(),
            span,
            _elem: PhantomData,
        })
    }

    /// Move the handle `n` elements backward.
    pub fn sub(&self, n: usize) -> Result<Self, ArenaError> {
        let bytes = n.saturating_mul(mem::size_of::<T>());
        let span = M::retreat(self.span, bytes)?;
        if bytes > self.offset {
            return Err(ArenaError::BoundsViolation {
                requested: bytes,
                bound: self.offset,
            });
        }
        Ok(Self {
            offset: self.offset - bytes,
            cell: self.cell.clone(),
            span,
            _elem: PhantomData,
        })
    }

    /// Read the element the handle points at.
    pub fn get(&self) -> Result<T, ArenaError> {
        self.get_at(0)
    }

    /// Read the `i`-th element after the handle.
    pub fn get_at(&self, i: usize) -> Result<T, ArenaError> {
        let sz = mem::size_of::<T>();
        let start = i.saturating_mul(sz);
        M::check_access(self.span, start.saturating_add(sz))?;
        self.with_buf(|buf| {
            let at = self.offset.saturating_add(start);
            let bytes = buf
                .get(at..at.saturating_add(sz))
                .ok_or(ArenaError::BoundsViolation {
                    requested: at.saturating_add(sz),
                    bound: buf.len(),
                })?;
            Ok(bytemuck::pod_read_unaligned(bytes))
        })
    }

    /// Write the element the handle points at.
    pub fn set(&self, value: T) -> Result<(), ArenaError> {
        self.set_at(0, value)
    }

    /// Write the `i`-th element after the handle.
    pub fn set_at(&self, i: usize, value: T) -> Result<(), ArenaError> {
        let sz = mem::size_of::<T>();
        let start = i.saturating_mul(sz);
        M::check_access(self.span, start.saturating_add(sz))?;
        self.with_buf_mut(|buf| {
            let len = buf.len();
            let at = self.offset.saturating_add(start);
            let bytes =
                buf.get_mut(at..at.saturating_add(sz))
                    .ok_or(ArenaError::BoundsViolation {
                        requested: at.saturating_add(sz),
                        bound: len,
                    })?;
            bytes.copy_from_slice(bytemuck::bytes_of(&value));
            Ok(())
        })
    }

    /// Copy a slice of elements into the arena starting at the handle.
    pub fn copy_from_slice(&self, src: &[T]) -> Result<(), ArenaError> {
        let raw: &[u8] = bytemuck::cast_slice(src);
        M::check_access(self.span, raw.len())?;
        self.with_buf_mut(|buf| {
            let len = buf.len();
            let dst = buf
                .get_mut(self.offset..self.offset.saturating_add(raw.len()))
                .ok_or(ArenaError::BoundsViolation {
                    requested: self.offset.saturating_add(raw.len()),
                    bound: len,
                })?;
            dst.copy_from_slice(raw);
            Ok(())
        })
    }

    /// Copy `len` elements out of the arena starting at the handle.
    pub fn to_vec(&self, len: usize) -> Result<Vec<T>, ArenaError> {
        let sz = mem::size_of::<T>();
        if sz == 0 {
            return Ok((0..len).map(|_| Zeroable::zeroed()).collect());
        }
        let total = len.saturating_mul(sz);
        M::check_access(self.span, total)?;
        self.with_buf(|buf| {
            let bytes = buf
                .get(self.offset..self.offset.saturating_add(total))
                .ok_or(ArenaError::BoundsViolation {
                    requested: self.offset.saturating_add(total),
                    bound: buf.len(),
                })?;
            Ok(bytes.chunks_exact(sz).map(bytemuck::pod_read_unaligned).collect())
        })
    }

    fn with_buf<R>(&self, f: impl FnOnce(&[u8]) -> Result<R, ArenaError>) -> Result<R, ArenaError> {
        let rc = self.cell.upgrade().ok_or(ArenaError::Aborted)?;
        let inner = rc.borrow();
        if !inner.live {
            return Err(ArenaError::Aborted);
        }
        f(&inner.buf)
    }

    fn with_buf_mut<R>(
        &self,
        f: impl FnOnce(&mut [u8]) -> Result<R, ArenaError>,
    ) -> Result<R, ArenaError> {
        let rc = self.cell.upgrade().ok_or(ArenaError::Aborted)?;
        let mut inner = rc.borrow_mut();
        if !inner.live {
            return Err(ArenaError::Aborted);
        }
        f(&mut inner.buf)
    }
}

impl<T: Pod> RelPtr<T, Checked> {
    /// The handle's remaining forward/backward span.
    pub fn span(&self) -> Span {
        self.span
    }
}

impl<T: Pod, M: BoundsMode> Clone for RelPtr<T, M> {
    fn clone(&self) -> Self {
        Self {
            offset: self.offset,
            cell: self.cell.clone(),
            span: self.span,
            _elem: PhantomData,
        }
    }
}

impl<T: Pod, M: BoundsMode> fmt::Debug for RelPtr<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelPtr")
            .field("offset", &self.offset)
            .field("span", &self.span)
            .finish()
    }
}

impl<T: Pod, M: BoundsMode> fmt::Display for RelPtr<T, M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RelPtr(off={}, span={:?})", self.offset, self.span)
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::buffer::BaseCell;

    fn handle(len: usize, forward: usize) -> (crate::buffer::SharedBuffer, RelPtr<u8>) {
        let cell = BaseCell::new_shared(len).unwrap();
        let p = RelPtr::new(0, Rc::downgrade(&cell), forward, 0);
        (cell, p)
    }

    #[test]
    fn get_set_round_trip() {
        let (_cell, p) = handle(64, 16);
        p.set(0xAB).unwrap();
        assert_eq!(p.get().unwrap(), 0xAB);
    }

    #[test]
    fn add_shrinks_forward_and_grows_backward() {
        let (_cell, p) = handle(64, 16);
        let q = p.add(6).unwrap();
        assert_eq!(q.offset(), 6);
        assert_eq!(q.span().forward(), 10);
        assert_eq!(q.span().backward(), 6);
    }

    #[test]
    fn add_past_forward_is_rejected() {
        let (_cell, p) = handle(64, 16);
        assert!(matches!(
            p.add(17),
            Err(ArenaError::BoundsViolation {
                requested: 17,
                bound: 16
            })
        ));
    }

    #[test]
    fn sub_past_backward_is_rejected() {
        let (_cell, p) = handle(64, 16);
        let q = p.add(4).unwrap();
        assert!(q.sub(5).is_err());
        let r = q.sub(4).unwrap();
        assert_eq!(r.offset(), 0);
        assert_eq!(r.span().forward(), 16);
    }

    #[test]
    fn index_past_forward_is_rejected() {
        let (_cell, p) = handle(64, 16);
        assert!(p.get_at(15).is_ok());
        assert!(p.get_at(16).is_err());
    }

    #[test]
    fn typed_cast_keeps_byte_spans() {
        let (_cell, p) = handle(64, 16);
        let words = p.cast::<u32>();
        words.set_at(1, 0xDEAD_BEEF).unwrap();
        assert_eq!(words.get_at(1).unwrap(), 0xDEAD_BEEF);
        // one u32 step consumes four bytes of span
        let step = words.add(1).unwrap();
        assert_eq!(step.offset(), 4);
        assert_eq!(step.span().forward(), 12);
        // a fifth u32 would need 20 bytes of span
        assert!(words.get_at(4).is_err());
    }

    #[test]
    fn bulk_copy_round_trip() {
        let (_cell, p) = handle(64, 16);
        p.copy_from_slice(b"relocate").unwrap();
        assert_eq!(p.to_vec(8).unwrap(), b"relocate");
        assert!(p.copy_from_slice(&[0u8; 17]).is_err());
    }

    #[test]
    fn dropped_arena_kills_handles() {
        let (cell, p) = handle(64, 16);
        assert!(p.is_live());
        drop(cell);
        assert!(!p.is_live());
        assert_eq!(p.get(), Err(ArenaError::Aborted));
        assert_eq!(p.set(1), Err(ArenaError::Aborted));
        assert!(p.as_raw().is_none());
    }

    #[test]
    fn dead_cell_kills_handles() {
        let (cell, p) = handle(64, 16);
        cell.borrow_mut().live = false;
        cell.borrow_mut().buf = Vec::new();
        assert!(!p.is_live());
        assert_eq!(p.get(), Err(ArenaError::Aborted));
    }

    #[test]
    fn unchecked_walks_freely_but_stays_in_buffer() {
        let cell = BaseCell::new_shared(32).unwrap();
        let p: RelPtr<u8, Unchecked> = RelPtr::new(0, Rc::downgrade(&cell), 8, 0);
        // Far past any span an allocation would have granted, still in buffer.
        let q = p.add(31).unwrap();
        q.set(7).unwrap();
        assert_eq!(cell.borrow().buf[31], 7);
        // Past the buffer itself: rejected by the live-range check.
        let r = p.add(32).unwrap();
        assert!(matches!(r.get(), Err(ArenaError::BoundsViolation { .. })));
    }

    #[test]
    fn as_raw_tracks_current_buffer() {
        let (cell, p) = handle(16, 16);
        let want = cell.borrow().buf.as_ptr();
        assert_eq!(p.as_raw().unwrap(), want);
    }
}
