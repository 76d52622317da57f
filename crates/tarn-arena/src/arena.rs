//! The top-level arena: one owned buffer, carved into regions.

use std::rc::Rc;

use tracing::{error, info, warn};

use tarn_core::{AppId, SizeRecord, SizeStore};

use crate::buffer::{BaseCell, SharedBuffer};
use crate::config::ArenaConfig;
use crate::error::ArenaError;
use crate::handle::{BoundsMode, Checked, RelPtr, Unchecked};
use crate::region::{Region, RegionKind, CANARY_LEN};

/// Region origins are multiples of this within the buffer.
const ALIGN: usize = 16;

/// Slack kept past the last region's canary.
const TAIL_SLACK: usize = 256;

fn align_up(n: usize) -> usize {
    (n + ALIGN - 1) & !(ALIGN - 1)
}

/// Byte layout derived from a config: static region first, dynamic
/// second, each followed by its canary, origins aligned.
struct Layout {
    static_origin: usize,
    dynamic_origin: usize,
    min_total: usize,
}

fn layout(config: &ArenaConfig) -> Layout {
    let static_origin = 0;
    let dynamic_origin = align_up(static_origin + config.static_size + CANARY_LEN);
    let min_total = dynamic_origin + config.dynamic_size + CANARY_LEN + TAIL_SLACK;
    Layout {
        static_origin,
        dynamic_origin,
        min_total,
    }
}

/// The single owned allocation backing every sub-allocator of one
/// application instance.
///
/// The arena derives a stable id from the application name, sizes its
/// buffer from the persisted [`SizeRecord`] for that id, carves the
/// buffer into a static and a dynamic [`Region`], and hands out
/// [`RelPtr`] handles through them. The buffer may move when the arena
/// grows; handles resolve through the shared base cell and never notice.
///
/// Failure policy: conditions that would corrupt memory if ignored
/// (region exhaustion, canary mismatch) abort the arena — the buffer is
/// released and everything downstream fails fast — and surface as typed
/// errors. Whether the process then terminates is the caller's call.
pub struct Arena {
    id: AppId,
    cell: SharedBuffer,
    static_region: Region,
    dynamic_region: Region,
}

impl Arena {
    /// Open the arena for `name`, sizing it from the persisted record.
    ///
    /// A missing, unreadable, or version-mismatched record is a soft
    /// failure: the compiled-in defaults are used, a fresh default
    /// record is stored so the next run observes a consistent value,
    /// and startup continues.
    pub fn open(name: &str, store: &dyn SizeStore) -> Result<Self, ArenaError> {
        let id = AppId::from_name(name);
        info!("allocator: generated app id {id}");

        let config = match store.load(id) {
            Some(record) if record.matches_current() => {
                info!(
                    "allocator: loaded size record (static {}, dynamic {})",
                    record.static_size, record.dynamic_size
                );
                ArenaConfig::from_record(&record)
            }
            loaded => {
                match &loaded {
                    Some(record) => warn!(
                        "allocator: size record version {} does not match {}, rewriting",
                        record.version,
                        SizeRecord::CURRENT_VERSION
                    ),
                    None => info!("allocator: no usable size record for app {id}, writing defaults"),
                }
                let defaults = SizeRecord::default();
                if !store.store(id, &defaults) {
                    warn!("allocator: failed to persist default size record for app {id}");
                }
                ArenaConfig::from_record(&defaults)
            }
        };

        Self::with_config(id, &config)
    }

    /// Build an arena directly from explicit sizes.
    ///
    /// Bypasses the size store entirely; `open` is this plus the record
    /// lookup.
    pub fn with_config(id: AppId, config: &ArenaConfig) -> Result<Self, ArenaError> {
        let lay = layout(config);
        let total = lay.min_total.max(config.total_hint);
        let cell = BaseCell::new_shared(total)?;
        info!("allocator: allocated {total} bytes");
        info!("  {} for static memory", config.static_size);
        info!("  {} for dynamic memory", config.dynamic_size);

        let static_region = Region::new(
            RegionKind::Static,
            Rc::clone(&cell),
            lay.static_origin,
            config.static_size,
        );
        let dynamic_region = Region::new(
            RegionKind::Dynamic,
            Rc::clone(&cell),
            lay.dynamic_origin,
            config.dynamic_size,
        );

        Ok(Self {
            id,
            cell,
            static_region,
            dynamic_region,
        })
    }

    /// The application id this arena was opened for.
    pub fn id(&self) -> AppId {
        self.id
    }

    /// Current buffer size in bytes (regions, canaries, and slack).
    /// Zero once the arena has been aborted.
    pub fn total_size(&self) -> usize {
        self.cell.borrow().buf.len()
    }

    /// Whether the arena can still serve allocations.
    pub fn is_live(&self) -> bool {
        self.cell.borrow().live
    }

    /// The named sub-block, read-only.
    ///
    /// Collaborators never construct regions; they inspect them here and
    /// allocate through [`Arena::alloc`].
    pub fn region(&self, kind: RegionKind) -> &Region {
        match kind {
            RegionKind::Static => &self.static_region,
            RegionKind::Dynamic => &self.dynamic_region,
        }
    }

    fn region_mut(&mut self, kind: RegionKind) -> &mut Region {
        match kind {
            RegionKind::Static => &mut self.static_region,
            RegionKind::Dynamic => &mut self.dynamic_region,
        }
    }

    /// Bump-allocate `size` zero-filled bytes from the named region.
    ///
    /// Exhausting a region is fatal for the arena: there is no fallback
    /// growth at the region level, the arena aborts, and the error
    /// reports requested versus available bytes. Growth is an explicit
    /// arena-level operation ([`Arena::resize`]), never a silent one.
    pub fn alloc(&mut self, kind: RegionKind, size: usize) -> Result<RelPtr<u8>, ArenaError> {
        self.alloc_in::<Checked>(kind, size)
    }

    /// [`Arena::alloc`] without span tracking on the returned handle.
    ///
    /// The handle is two words smaller and its arithmetic unchecked
    /// against the allocation's extent; accesses outside the live
    /// buffer still fail. See [`Unchecked`].
    pub fn alloc_unchecked(
        &mut self,
        kind: RegionKind,
        size: usize,
    ) -> Result<RelPtr<u8, Unchecked>, ArenaError> {
        self.alloc_in::<Unchecked>(kind, size)
    }

    fn alloc_in<M: BoundsMode>(
        &mut self,
        kind: RegionKind,
        size: usize,
    ) -> Result<RelPtr<u8, M>, ArenaError> {
        if !self.is_live() {
            return Err(ArenaError::Aborted);
        }
        match self.region_mut(kind).try_alloc::<M>(size) {
            Ok(handle) => Ok(handle),
            Err(e) => {
                error!("allocator: {e}");
                self.abort();
                Err(e)
            }
        }
    }

    /// Return the most recent dynamic allocation to its region.
    ///
    /// LIFO only: the cursor rewinds iff `[handle, handle + size)` is
    /// the top of the dynamic region, and the return value says whether
    /// it did. Interior deallocations leak by design — a bump allocator
    /// has no free list to give them back to.
    pub fn dealloc<M: BoundsMode>(
        &mut self,
        handle: &RelPtr<u8, M>,
        size: usize,
    ) -> Result<bool, ArenaError> {
        if !self.is_live() {
            return Err(ArenaError::Aborted);
        }
        let rel = self.dynamic_rel(handle, size)?;
        Ok(self.dynamic_region.rewind(rel, size))
    }

    /// Resize the dynamic allocation `[handle, handle + old)` to `new`
    /// bytes.
    ///
    /// Regrows in place when the handle is the region's top allocation;
    /// otherwise allocates fresh space and copies `min(old, new)` bytes
    /// (the old range leaks). Capacity exhaustion follows the fatal
    /// alloc path.
    pub fn realloc<M: BoundsMode>(
        &mut self,
        handle: &RelPtr<u8, M>,
        old: usize,
        new: usize,
    ) -> Result<RelPtr<u8, M>, ArenaError> {
        if !self.is_live() {
            return Err(ArenaError::Aborted);
        }
        let rel = self.dynamic_rel(handle, old)?;

        if rel + old == self.dynamic_region.used() {
            return match self.dynamic_region.regrow::<M>(rel, old, new) {
                Ok(h) => Ok(h),
                Err(e) => {
                    error!("allocator: {e}");
                    self.abort();
                    Err(e)
                }
            };
        }

        let fresh = match self.dynamic_region.try_alloc::<M>(new) {
            Ok(h) => h,
            Err(e) => {
                error!("allocator: {e}");
                self.abort();
                return Err(e);
            }
        };
        let copy = old.min(new);
        {
            let mut inner = self.cell.borrow_mut();
            let src = self.dynamic_region.origin() + rel;
            let dst = fresh.offset();
            inner.buf.copy_within(src..src + copy, dst);
        }
        Ok(fresh)
    }

    /// Offset of `handle` relative to the dynamic region, if the range
    /// `[handle, handle + size)` lies inside it.
    fn dynamic_rel<M: BoundsMode>(
        &self,
        handle: &RelPtr<u8, M>,
        size: usize,
    ) -> Result<usize, ArenaError> {
        let region = &self.dynamic_region;
        let off = handle.offset();
        let end = off.saturating_add(size);
        if off < region.origin() || end > region.origin() + region.capacity() {
            return Err(ArenaError::OutsideRegion {
                region: RegionKind::Dynamic,
                offset: off,
            });
        }
        Ok(off - region.origin())
    }

    /// Grow the whole buffer to `new_total` bytes.
    ///
    /// The canaries are verified first — a corrupted arena is never
    /// moved, it is aborted. The extra space extends the dynamic region
    /// in place (region origins never change), the dynamic canary moves
    /// to the new bound, and both canaries are re-initialized. Every
    /// previously issued handle remains valid: only the buffer's
    /// absolute address changes, and nothing stores that.
    pub fn resize(&mut self, new_total: usize) -> Result<(), ArenaError> {
        if !self.is_live() {
            return Err(ArenaError::Aborted);
        }
        self.check()?;
        let minimum = self.total_size();
        if new_total < minimum {
            return Err(ArenaError::ResizeTooSmall {
                requested: new_total,
                minimum,
            });
        }
        let new_dynamic = new_total - (self.dynamic_region.origin() + CANARY_LEN + TAIL_SLACK);
        BaseCell::grow(&self.cell, new_total)?;
        self.dynamic_region.extend(new_dynamic);
        self.static_region.write_canary();
        info!("allocator: resized to {new_total} bytes");
        Ok(())
    }

    /// Verify every region's canary.
    ///
    /// A single mismatch means some consumer wrote past its region's
    /// bound; the arena aborts — corruption is never tolerated or
    /// auto-healed, because a corrupted arena cannot be trusted to hold
    /// further writes correctly.
    pub fn check(&mut self) -> Result<(), ArenaError> {
        if !self.is_live() {
            return Err(ArenaError::Aborted);
        }
        for kind in [RegionKind::Static, RegionKind::Dynamic] {
            if let Err(e) = self.region(kind).check() {
                error!("allocator: {e}");
                self.abort();
                return Err(e);
            }
        }
        Ok(())
    }

    /// Release the buffer and mark the arena dead.
    ///
    /// Every subsequent operation — on the arena or through any
    /// outstanding handle — fails fast with [`ArenaError::Aborted`].
    pub fn abort(&mut self) {
        let mut inner = self.cell.borrow_mut();
        inner.buf = Vec::new();
        inner.live = false;
        warn!("allocator: abort has been called");
    }

    /// Current sizes as a record suitable for persistence.
    pub fn snapshot_sizes(&self) -> SizeRecord {
        SizeRecord {
            version: SizeRecord::CURRENT_VERSION,
            total: self.total_size() as u64,
            static_size: self.static_region.capacity() as u64,
            dynamic_size: self.dynamic_region.capacity() as u64,
        }
    }

    /// Best-effort write-back of the current sizes, so the next run
    /// opens the arena pre-sized. Failure is soft and only logged.
    pub fn persist_sizes(&self, store: &dyn SizeStore) -> bool {
        let ok = store.store(self.id, &self.snapshot_sizes());
        if !ok {
            warn!("allocator: failed to persist size record for app {}", self.id);
        }
        ok
    }
}

impl Drop for Arena {
    fn drop(&mut self) {
        if self.is_live() {
            info!("allocator: deallocated {} bytes", self.total_size());
        }
    }
}
