//! A contiguous array of [`Value`]s.
//!
//! Minimum capacity on first allocation is 16; growth doubles. Values are
//! relocated by bytewise move when the backing buffer grows — safe here
//! because every [`Value`] is address-independent (it never borrows from
//! its own previous address).

use super::resbuf::ResBuf;
use super::value::Value;
use crate::error::AllocError;
use crate::resource::ResourceHandle;

const MIN_CAPACITY: usize = 16;

/// A resource-backed, insertion-ordered array of JSON values.
pub struct JsonArray {
    buf: ResBuf<Value>,
}

impl JsonArray {
    /// An empty array using the default resource.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(ResourceHandle::default())
    }

    /// An empty array allocating from `resource` once it grows.
    #[must_use]
    pub fn new_in(resource: ResourceHandle) -> Self {
        Self {
            buf: ResBuf::new_in(resource),
        }
    }

    /// Builds an array of exactly `len` elements from an exact-size
    /// iterator in a single allocation, as the value builder needs.
    pub fn from_exact_iter_in<I>(resource: ResourceHandle, len: usize, iter: I) -> Result<Self, AllocError>
    where
        I: Iterator<Item = Value>,
    {
        Ok(Self {
            buf: ResBuf::from_exact_iter(resource, len, iter)?,
        })
    }

    /// The resource this array allocates from.
    #[must_use]
    pub fn resource(&self) -> &ResourceHandle {
        self.buf.resource()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    /// `true` when the array has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buf.len() == 0
    }

    /// Current backing capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    /// Borrows all elements in order.
    #[must_use]
    pub fn as_slice(&self) -> &[Value] {
        self.buf.as_slice()
    }

    /// Mutably borrows all elements in order.
    pub fn as_mut_slice(&mut self) -> &mut [Value] {
        self.buf.as_mut_slice()
    }

    /// Borrows the element at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_slice().get(index)
    }

    /// Mutably borrows the element at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.buf.as_mut_slice().get_mut(index)
    }

    /// Appends `value` to the end.
    pub fn push(&mut self, value: Value) -> Result<(), AllocError> {
        self.buf.push(value, MIN_CAPACITY)
    }

    /// Removes and returns the last element.
    pub fn pop(&mut self) -> Option<Value> {
        self.buf.pop()
    }

    /// Inserts `value` at `index`, shifting later elements right.
    pub fn insert(&mut self, index: usize, value: Value) -> Result<(), AllocError> {
        self.buf.insert(index, value, MIN_CAPACITY)
    }

    /// Removes and returns the element at `index`, shifting later
    /// elements left.
    pub fn erase(&mut self, index: usize) -> Value {
        self.buf.remove(index)
    }

    /// Drops every element, keeping the backing allocation.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    /// Reserves capacity for at least `additional` more elements.
    pub fn reserve(&mut self, additional: usize) -> Result<(), AllocError> {
        self.buf.ensure_capacity(additional, MIN_CAPACITY)
    }

    /// An iterator over the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Value> {
        self.as_slice().iter()
    }
}

impl Default for JsonArray {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for JsonArray {
    fn clone(&self) -> Self {
        let resource = self.resource().clone();
        let len = self.len();
        Self::from_exact_iter_in(resource.clone(), len, self.iter().cloned())
            .unwrap_or_else(|_| Self::from_exact_iter_in(ResourceHandle::default(), len, self.iter().cloned()).expect("default resource"))
    }
}

impl PartialEq for JsonArray {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl std::fmt::Debug for JsonArray {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a JsonArray {
    type Item = &'a Value;
    type IntoIter = std::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<Value> for JsonArray {
    /// Builds an array on the default resource from an arbitrary
    /// iterator. Prefer [`JsonArray::from_exact_iter_in`] with an
    /// explicit resource when one is available, since this allocates
    /// incrementally rather than in one shot.
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let mut arr = Self::new();
        for v in iter {
            // The default resource only fails on host OOM, which we treat
            // as unrecoverable here, matching `Vec`'s own panic-on-OOM
            // behavior for this convenience constructor.
            arr.push(v).expect("default resource allocation failed");
        }
        arr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::value::Value;

    #[test]
    fn push_and_index() {
        let mut arr = JsonArray::new();
        arr.push(Value::from(1i64)).unwrap();
        arr.push(Value::from(2i64)).unwrap();
        arr.push(Value::from(3i64)).unwrap();
        assert_eq!(arr.len(), 3);
        assert_eq!(arr.get(1).unwrap().as_i64(), Some(2));
    }

    #[test]
    fn erase_shifts_left() {
        let mut arr: JsonArray = [1i64, 2, 3].into_iter().map(Value::from).collect();
        let removed = arr.erase(1);
        assert_eq!(removed.as_i64(), Some(2));
        assert_eq!(arr.len(), 2);
        assert_eq!(arr.get(1).unwrap().as_i64(), Some(3));
    }

    #[test]
    fn grows_past_minimum_capacity() {
        let mut arr = JsonArray::new();
        for i in 0..100i64 {
            arr.push(Value::from(i)).unwrap();
        }
        assert_eq!(arr.len(), 100);
        assert_eq!(arr.get(99).unwrap().as_i64(), Some(99));
    }
}
