//! Polymorphic memory resources.
//!
//! A [`MemoryResource`] is a trait-object allocator: every DOM container
//! (`JsonString`, `JsonArray`, `JsonObject`) allocates its backing storage
//! through one, rather than through the global allocator directly. This is
//! what lets a whole parsed document live in one [`MonotonicResource`] arena
//! and be freed in a single deallocation, or be built entirely inside a
//! caller-supplied stack buffer via [`StaticResource`].
//!
//! Concrete resources: [`DefaultResource`] (the global allocator),
//! [`MonotonicResource`] (bump allocator, `deallocate` is a no-op),
//! [`StaticResource`] (bump allocator over a fixed caller buffer), and
//! [`NullResource`] (every allocation fails).

mod default_resource;
mod monotonic;
mod null_resource;
mod static_resource;

use std::alloc::Layout;
use std::any::Any;
use std::fmt;
use std::ptr::NonNull;
use std::sync::Arc;

pub use default_resource::DefaultResource;
pub use monotonic::MonotonicResource;
pub use null_resource::NullResource;
pub use static_resource::StaticResource;

use crate::error::AllocError;

/// A polymorphic allocator used by every DOM container.
///
/// # Safety
///
/// Implementations must return a pointer suitably aligned and sized for
/// `layout` from `allocate`, and must accept back via `deallocate` only
/// pointers previously returned by `allocate` on the *same* resource
/// instance, with the same layout.
pub unsafe trait MemoryResource: fmt::Debug + Any {
    /// Allocates a region of memory satisfying `layout`.
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError>;

    /// Releases a region previously returned by `allocate` on `self`.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by a prior `allocate(layout)` call on
    /// this same resource instance, and must not have been deallocated
    /// already.
    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout);

    /// `false` indicates `deallocate` is a no-op, letting containers skip
    /// per-element destructor walks when elements are themselves
    /// deallocate-is-null-only.
    fn needs_free(&self) -> bool {
        true
    }

    /// Type-erased downcasting hook, used only to implement
    /// [`ResourceHandle::is_equal`]'s "is this the stateless default
    /// resource" check.
    fn as_any(&self) -> &dyn Any;
}

/// A cheap, cloneable reference to a [`MemoryResource`].
///
/// `ResourceHandle::default()` is a *null handle*: it resolves to the
/// process-wide [`DefaultResource`] singleton at first use without paying
/// for an `Arc` allocation, mirroring the tagged "null storage pointer"
/// fast path the design notes call for (see `DESIGN.md`).
#[derive(Clone, Debug)]
pub struct ResourceHandle {
    inner: Option<Arc<dyn MemoryResource + Send + Sync>>,
    needs_free: bool,
}

impl Default for ResourceHandle {
    fn default() -> Self {
        Self {
            inner: None,
            needs_free: true,
        }
    }
}

impl ResourceHandle {
    /// Wraps a concrete resource behind a shared, reference-counted handle.
    #[must_use]
    pub fn new<R>(resource: R) -> Self
    where
        R: MemoryResource + Send + Sync + 'static,
    {
        let needs_free = resource.needs_free();
        Self {
            inner: Some(Arc::new(resource)),
            needs_free,
        }
    }

    /// The handle for the default, process-wide heap resource.
    #[must_use]
    pub fn default_resource() -> Self {
        Self::default()
    }

    /// `false` indicates this handle's `deallocate` is a no-op.
    #[must_use]
    pub fn needs_free(&self) -> bool {
        self.needs_free
    }

    /// Allocates memory satisfying `layout` from the underlying resource.
    pub fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        match &self.inner {
            Some(r) => r.allocate(layout),
            None => default_resource::allocate_global(layout),
        }
    }

    /// Deallocates a region previously returned by `allocate` on this
    /// handle.
    ///
    /// # Safety
    ///
    /// See [`MemoryResource::deallocate`].
    pub unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        match &self.inner {
            Some(r) => unsafe { r.deallocate(ptr, layout) },
            None => unsafe { default_resource::deallocate_global(ptr, layout) },
        }
    }

    /// Two handles are equal when they refer to the same resource instance,
    /// or when both resolve to the stateless default resource. Containers
    /// may only exchange ownership of allocated storage between resources
    /// that compare equal.
    #[must_use]
    pub fn is_equal(&self, other: &ResourceHandle) -> bool {
        fn is_default(r: &(dyn MemoryResource + Send + Sync)) -> bool {
            r.as_any().is::<DefaultResource>()
        }

        match (&self.inner, &other.inner) {
            (None, None) => true,
            (Some(a), Some(b)) => Arc::ptr_eq(a, b) || (is_default(a.as_ref()) && is_default(b.as_ref())),
            (None, Some(b)) => is_default(b.as_ref()),
            (Some(a), None) => is_default(a.as_ref()),
        }
    }
}

// SAFETY: `DefaultResource` holds no state; every instance allocates from
// and deallocates to the same global allocator, so any two instances are
// freely interchangeable.
unsafe impl MemoryResource for DefaultResource {
    fn allocate(&self, layout: Layout) -> Result<NonNull<u8>, AllocError> {
        default_resource::allocate_global(layout)
    }

    unsafe fn deallocate(&self, ptr: NonNull<u8>, layout: Layout) {
        unsafe { default_resource::deallocate_global(ptr, layout) }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
