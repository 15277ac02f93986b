//! A bump allocator over a fixed, caller-supplied buffer.

use std::alloc::Layout;
use std::any::Any;
use std::cell::Cell;
use std::ptr::NonNull;

use super::MemoryResource;
use crate::error::AllocError;

/// Allocates by bumping a cursor through a caller-provided byte buffer.
///
/// `allocate` fails with [`AllocError::OutOfMemory`] once the buffer is
/// exhausted; `deallocate` is always a no-op. Useful for parsing into a
/// bounded, pre-sized scratch buffer with zero heap traffic.
#[derive(Debug)]
pub struct StaticResource {
    base: NonNull<u8>,
    len: usize,
    // Offset of the next free byte, relative to `base`.
    cursor: Cell<usize>,
}

// SAFETY: `StaticResource` only ever touches the buffer it owns through
// `&self` with interior mutability confined to a single `Cell<usize>`
// cursor; it is not `Sync` in the sense of allowing concurrent mutation,
// but callers are required (by `MemoryResource`'s contract) not to use a
// resource from multiple threads concurrently for allocation.
unsafe impl Send for StaticResource {}
unsafe impl Sync for StaticResource {}

impl StaticResource {
    /// Wraps `buffer` for bump allocation. The buffer must outlive every
    /// value allocated from the returned resource; in practice this means
    /// leaking it or keeping it alive for the process lifetime, since
    /// [`ResourceHandle`](super::ResourceHandle) is `'static`.
    #[must_use]
    pub fn new(buffer: &'static mut [u8]) -> Self {
        let len = buffer.len();
        // SAFETY: `buffer` is non-null and `'static`.
        let base = unsafe { NonNull::new_unchecked(buffer.as_mut_ptr()) };
        Self {
            base,
            len,
            cursor: Cell::new(0),
        }
    }

    /// Bytes consumed so far.
    #[must_use]
    pub fn high_water_mark(&self) -> usize {
        self.cursor.get()
    }

    /// Total capacity of the backing buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.len
    }
}

// SAFETY: `allocate` only ever returns sub-slices of `base..base+len`
// computed with checked arithmetic and bounds checks; `deallocate` is a
// no-op so its safety contract is vacuous.
unsafe impl MemoryResource for StaticResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let cursor = self.cursor.get();
        let base_addr = self.base.as_ptr() as usize;
        let current = base_addr
            .checked_add(cursor)
            .ok_or(AllocError::OutOfMemory)?;
        let aligned = current
            .checked_add(layout.align() - 1)
            .map(|v| v & !(layout.align() - 1))
            .ok_or(AllocError::OutOfMemory)?;
        let padding = aligned - current;
        let needed = cursor
            .checked_add(padding)
            .and_then(|v| v.checked_add(layout.size()))
            .ok_or(AllocError::OutOfMemory)?;
        if needed > self.len {
            return Err(AllocError::OutOfMemory);
        }
        self.cursor.set(needed);
        // SAFETY: `aligned` lies within `base..base+len`, which is valid
        // for `layout.size()` bytes by the bounds check above.
        Ok(unsafe { NonNull::new_unchecked(aligned as *mut u8) })
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}

    fn needs_free(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
