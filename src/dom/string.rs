//! A DOM string with small-buffer optimisation.
//!
//! Up to [`SBO_CAPACITY`] bytes are stored inline, with no allocation at
//! all; longer strings spill to a resource-backed heap buffer. Both
//! representations are validated UTF-8 (unless constructed via
//! [`JsonString::from_unchecked_in`], which the parser uses once it has
//! already validated the bytes itself).

use std::fmt;

use super::resbuf::ResBuf;
use crate::error::AllocError;
use crate::resource::ResourceHandle;

/// Bytes storable inline before a [`JsonString`] spills to the heap.
///
/// Sized as `2*sizeof(ptr) - sizeof(kind) - 1` (14 on a 64-bit host with
/// an 8-byte pointer and 1-byte discriminator), matching the inline
/// capacity a tagged union of that width would give a short string even
/// though the discriminator here lives alongside the payload rather than
/// packed into it (see `DESIGN.md`).
pub const SBO_CAPACITY: usize = 14;

const HEAP_MIN_CAPACITY: usize = 32;

enum Repr {
    Inline { len: u8, buf: [u8; SBO_CAPACITY] },
    Heap(ResBuf<u8>),
}

/// A UTF-8 string value owned by a memory resource, with inline storage
/// for short strings.
pub struct JsonString {
    resource: ResourceHandle,
    repr: Repr,
}

impl JsonString {
    /// An empty string using the default resource.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(ResourceHandle::default())
    }

    /// An empty string allocating (if it ever grows past SBO) from
    /// `resource`.
    #[must_use]
    pub fn new_in(resource: ResourceHandle) -> Self {
        Self {
            resource,
            repr: Repr::Inline {
                len: 0,
                buf: [0; SBO_CAPACITY],
            },
        }
    }

    /// Builds a string from `s`, choosing inline or heap storage by
    /// length.
    pub fn from_str_in(resource: ResourceHandle, s: &str) -> Result<Self, AllocError> {
        let mut out = Self::new_in(resource);
        out.push_str(s)?;
        Ok(out)
    }

    /// Builds a string directly from bytes the caller has already
    /// validated as UTF-8 (the SAX parser, after its own validation
    /// pass). Panics in debug builds if `bytes` isn't valid UTF-8.
    pub fn from_unchecked_in(resource: ResourceHandle, bytes: &[u8]) -> Result<Self, AllocError> {
        debug_assert!(std::str::from_utf8(bytes).is_ok(), "bytes must be valid UTF-8");
        let mut out = Self::new_in(resource);
        out.push_bytes_unchecked(bytes)?;
        Ok(out)
    }

    /// The resource this string allocates from.
    #[must_use]
    pub fn resource(&self) -> &ResourceHandle {
        &self.resource
    }

    /// Number of bytes in the string.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.repr {
            Repr::Inline { len, .. } => *len as usize,
            Repr::Heap(buf) => buf.len(),
        }
    }

    /// `true` when the string has no bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The string's current backing capacity (inline strings report
    /// [`SBO_CAPACITY`]).
    #[must_use]
    pub fn capacity(&self) -> usize {
        match &self.repr {
            Repr::Inline { .. } => SBO_CAPACITY,
            Repr::Heap(buf) => buf.capacity(),
        }
    }

    /// Borrows the string's bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match &self.repr {
            Repr::Inline { len, buf } => &buf[..*len as usize],
            Repr::Heap(buf) => buf.as_slice(),
        }
    }

    /// Borrows the string as `&str`.
    ///
    /// # Panics
    ///
    /// Never, in practice: every construction path validates UTF-8 (or
    /// the caller promised it via [`from_unchecked_in`](Self::from_unchecked_in)).
    #[must_use]
    pub fn as_str(&self) -> &str {
        // SAFETY in spirit, not in the `unsafe` sense: every path that
        // builds a `JsonString` either validates UTF-8 or is documented
        // to require it from the caller.
        std::str::from_utf8(self.as_bytes()).expect("JsonString bytes are always valid UTF-8")
    }

    fn is_inline(&self) -> bool {
        matches!(self.repr, Repr::Inline { .. })
    }

    /// Appends `s`, validating it is already `&str` (so always valid
    /// UTF-8), growing to heap storage if it no longer fits inline.
    pub fn push_str(&mut self, s: &str) -> Result<(), AllocError> {
        self.push_bytes_unchecked(s.as_bytes())
    }

    fn push_bytes_unchecked(&mut self, bytes: &[u8]) -> Result<(), AllocError> {
        let new_len = self.len() + bytes.len();
        if self.is_inline() && new_len <= SBO_CAPACITY {
            if let Repr::Inline { len, buf } = &mut self.repr {
                buf[*len as usize..new_len].copy_from_slice(bytes);
                *len = new_len as u8;
            }
            return Ok(());
        }
        self.ensure_heap(new_len)?;
        if let Repr::Heap(buf) = &mut self.repr {
            for &b in bytes {
                buf.push(b, HEAP_MIN_CAPACITY)?;
            }
        }
        Ok(())
    }

    /// Migrates to heap storage (no-op if already heap) with at least
    /// `needed` bytes of capacity, following the growth policy `new_cap =
    /// max(2*old_cap, needed)`.
    fn ensure_heap(&mut self, needed: usize) -> Result<(), AllocError> {
        if let Repr::Heap(buf) = &mut self.repr {
            buf.ensure_capacity(needed.saturating_sub(buf.len()), HEAP_MIN_CAPACITY)?;
            return Ok(());
        }
        let Repr::Inline { len, buf: inline } = &self.repr else {
            unreachable!()
        };
        let mut heap: ResBuf<u8> = ResBuf::new_in(self.resource.clone());
        heap.ensure_capacity(needed, needed.max(HEAP_MIN_CAPACITY))?;
        for &b in &inline[..*len as usize] {
            // Capacity was just reserved above; this cannot fail.
            heap.push(b, HEAP_MIN_CAPACITY)?;
        }
        self.repr = Repr::Heap(heap);
        Ok(())
    }

    /// Inserts `s` at byte offset `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not a char boundary.
    pub fn insert_str(&mut self, index: usize, s: &str) -> Result<(), AllocError> {
        assert!(self.as_str().is_char_boundary(index), "index not a char boundary");
        if s.is_empty() {
            return Ok(());
        }
        let mut rebuilt = String::with_capacity(self.len() + s.len());
        rebuilt.push_str(&self.as_str()[..index]);
        rebuilt.push_str(s);
        rebuilt.push_str(&self.as_str()[index..]);
        *self = Self::from_str_in(self.resource.clone(), &rebuilt)?;
        Ok(())
    }

    /// Removes the byte range `start..end`.
    ///
    /// # Panics
    ///
    /// Panics if the range's endpoints aren't char boundaries.
    pub fn erase(&mut self, start: usize, end: usize) -> Result<(), AllocError> {
        assert!(start <= end && end <= self.len());
        let s = self.as_str();
        assert!(s.is_char_boundary(start) && s.is_char_boundary(end));
        let mut rebuilt = String::with_capacity(self.len() - (end - start));
        rebuilt.push_str(&s[..start]);
        rebuilt.push_str(&s[end..]);
        *self = Self::from_str_in(self.resource.clone(), &rebuilt)?;
        Ok(())
    }

    /// Replaces the byte range `start..end` with `with`.
    pub fn replace(&mut self, start: usize, end: usize, with: &str) -> Result<(), AllocError> {
        let s = self.as_str();
        assert!(start <= end && end <= s.len());
        assert!(s.is_char_boundary(start) && s.is_char_boundary(end));
        let mut rebuilt = String::with_capacity(s.len() - (end - start) + with.len());
        rebuilt.push_str(&s[..start]);
        rebuilt.push_str(with);
        rebuilt.push_str(&s[end..]);
        *self = Self::from_str_in(self.resource.clone(), &rebuilt)?;
        Ok(())
    }

    /// Clears the string's contents, keeping whatever representation
    /// (inline/heap) it already has.
    pub fn clear(&mut self) {
        match &mut self.repr {
            Repr::Inline { len, .. } => *len = 0,
            Repr::Heap(buf) => buf.clear(),
        }
    }

    /// Downgrades heap storage back to inline when the current contents
    /// fit, and otherwise leaves heap storage as-is (this implementation
    /// doesn't shrink a heap buffer's own capacity, since the resource
    /// abstraction offers no `realloc`).
    pub fn shrink_to_fit(&mut self) {
        if self.len() <= SBO_CAPACITY && !self.is_inline() {
            let bytes: Vec<u8> = self.as_bytes().to_vec();
            let mut buf = [0u8; SBO_CAPACITY];
            buf[..bytes.len()].copy_from_slice(&bytes);
            self.repr = Repr::Inline {
                len: bytes.len() as u8,
                buf,
            };
        }
    }
}

impl Default for JsonString {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for JsonString {
    fn clone(&self) -> Self {
        // Falls back to the default resource if the original is exhausted,
        // keeping `Clone::clone`'s infallible signature.
        Self::from_str_in(self.resource.clone(), self.as_str())
            .unwrap_or_else(|_| Self::from_str_in(ResourceHandle::default(), self.as_str()).expect("default resource"))
    }
}

impl PartialEq for JsonString {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for JsonString {}

impl fmt::Debug for JsonString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.as_str(), f)
    }
}

impl PartialEq<str> for JsonString {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for JsonString {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
