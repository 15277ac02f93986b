//! A bump allocator that owns a linked list of geometrically growing
//! blocks and frees them all at once on drop.

use std::alloc::{self, Layout};
use std::any::Any;
use std::cell::RefCell;
use std::ptr::NonNull;

use super::MemoryResource;
use crate::error::AllocError;

const MIN_BLOCK_SIZE: usize = 1024;
const MAX_BLOCK_SIZE: usize = (1usize << 31) - 1;

struct Block {
    base: NonNull<u8>,
    layout: Layout,
    cursor: usize,
    next: Option<Box<Block>>,
}

impl Block {
    fn new(size: usize) -> Result<Box<Self>, AllocError> {
        let layout = Layout::from_size_align(size, align_of::<usize>()).map_err(|_| AllocError::OutOfMemory)?;
        // SAFETY: `layout.size() > 0` for any `size >= MIN_BLOCK_SIZE`.
        let ptr = unsafe { alloc::alloc(layout) };
        let base = NonNull::new(ptr).ok_or(AllocError::OutOfMemory)?;
        Ok(Box::new(Block {
            base,
            layout,
            cursor: 0,
            next: None,
        }))
    }

    fn try_allocate(&mut self, layout: Layout) -> Option<NonNull<u8>> {
        let base_addr = self.base.as_ptr() as usize;
        let current = base_addr.checked_add(self.cursor)?;
        let aligned = current
            .checked_add(layout.align() - 1)
            .map(|v| v & !(layout.align() - 1))?;
        let padding = aligned - current;
        let needed = self.cursor.checked_add(padding)?.checked_add(layout.size())?;
        if needed > self.layout.size() {
            return None;
        }
        self.cursor = needed;
        // SAFETY: `aligned` lies within this block's allocation, valid for
        // `layout.size()` bytes by the bounds check above.
        Some(unsafe { NonNull::new_unchecked(aligned as *mut u8) })
    }
}

impl Drop for Block {
    fn drop(&mut self) {
        // SAFETY: `self.base`/`self.layout` describe exactly the allocation
        // made in `Block::new`.
        unsafe { alloc::dealloc(self.base.as_ptr(), self.layout) }
    }
}

/// A fast resource using a chain of large, fixed-size blocks.
///
/// `deallocate` is a no-op; every allocation made from this resource is
/// released at once, without visiting individual elements, when the
/// resource itself is dropped. The next block's size doubles each time a
/// new one is needed, clamped to `[1024, 2^31 - 1]` bytes.
#[derive(Debug)]
pub struct MonotonicResource {
    state: RefCell<State>,
}

struct State {
    head: Option<Box<Block>>,
    next_block_size: usize,
}

impl std::fmt::Debug for State {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("State")
            .field("next_block_size", &self.next_block_size)
            .finish_non_exhaustive()
    }
}

// SAFETY: all interior mutability is confined to a single `RefCell`, and
// the `MemoryResource` contract already forbids concurrent use of one
// resource from multiple threads.
unsafe impl Send for MonotonicResource {}
unsafe impl Sync for MonotonicResource {}

impl MonotonicResource {
    /// Creates a resource whose first block is at least `initial_size`
    /// bytes (clamped to the `[1024, 2^31-1]` range).
    #[must_use]
    pub fn new(initial_size: usize) -> Self {
        let size = initial_size.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE);
        Self {
            state: RefCell::new(State {
                head: None,
                next_block_size: size,
            }),
        }
    }

    fn grow_block_size(size: usize) -> usize {
        size.saturating_mul(2).clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE)
    }
}

impl Default for MonotonicResource {
    fn default() -> Self {
        Self::new(MIN_BLOCK_SIZE)
    }
}

// SAFETY: every pointer returned by `allocate` lies within a block this
// resource owns and keeps alive until `Drop`; `deallocate` never touches
// memory (it is a documented no-op for this resource kind).
unsafe impl MemoryResource for MonotonicResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        let mut state = self.state.borrow_mut();

        if let Some(block) = state.head.as_deref_mut() {
            if let Some(ptr) = block.try_allocate(layout) {
                return Ok(ptr);
            }
        }

        let needed = layout.size().saturating_add(layout.align());
        let mut block_size = state.next_block_size.max(needed);
        block_size = block_size.clamp(MIN_BLOCK_SIZE, MAX_BLOCK_SIZE);
        let mut new_block = Block::new(block_size)?;
        let ptr = new_block.try_allocate(layout).ok_or(AllocError::OutOfMemory)?;
        new_block.next = state.head.take();
        state.head = Some(new_block);
        state.next_block_size = Self::grow_block_size(block_size);
        Ok(ptr)
    }

    unsafe fn deallocate(&self, _ptr: NonNull<u8>, _layout: Layout) {}

    fn needs_free(&self) -> bool {
        false
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
