//! The tagged-union DOM value.
//!
//! A [`Value`] holds exactly one of null/bool/int64/uint64/double/string/
//! array/object, plus a [`ResourceHandle`] every value carries regardless
//! of which variant is active. The discriminator lives alongside the
//! payload as a plain Rust enum (see `DESIGN.md`), which is the idiomatic
//! shape for a tagged union in this language rather than packing a tag
//! bit into a fixed-size union.

use std::fmt;

use super::array::JsonArray;
use super::object::JsonObject;
use super::string::JsonString;
use crate::error::ConvertError;
use crate::resource::ResourceHandle;

/// Which of the eight JSON/extended-JSON kinds a [`Value`] currently
/// holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Kind {
    /// `null`.
    Null,
    /// `true` or `false`.
    Bool,
    /// A signed integer that doesn't fit `Uint64` or need `Double`.
    Int64,
    /// An unsigned integer that doesn't fit `Int64`.
    Uint64,
    /// Any number requiring a fractional/exponent part, or whose
    /// magnitude overflows the 64-bit integer kinds.
    Double,
    /// A UTF-8 string.
    String,
    /// An ordered array of values.
    Array,
    /// An insertion-ordered object.
    Object,
}

enum Repr {
    Null,
    Bool(bool),
    Int64(i64),
    Uint64(u64),
    Double(f64),
    String(JsonString),
    Array(JsonArray),
    Object(JsonObject),
}

/// A JSON (or extended-JSON) value: one of null, bool, int64, uint64,
/// double, string, array, or object.
pub struct Value {
    resource: ResourceHandle,
    repr: Repr,
}

impl Value {
    fn from_repr(resource: ResourceHandle, repr: Repr) -> Self {
        Self { resource, repr }
    }

    /// The `null` value on the default resource.
    #[must_use]
    pub fn null() -> Self {
        Self::from_repr(ResourceHandle::default(), Repr::Null)
    }

    /// A `null` value on `resource` (after a move-from, a value
    /// transitions here while keeping its original resource handle,
    /// null/bool/int64/uint64/double/string/array/object).
    #[must_use]
    pub fn null_in(resource: ResourceHandle) -> Self {
        Self::from_repr(resource, Repr::Null)
    }

    /// Wraps a string value, inheriting the string's own resource.
    #[must_use]
    pub fn from_string(s: JsonString) -> Self {
        let resource = s.resource().clone();
        Self::from_repr(resource, Repr::String(s))
    }

    /// Wraps an array value, inheriting the array's own resource.
    #[must_use]
    pub fn from_array(a: JsonArray) -> Self {
        let resource = a.resource().clone();
        Self::from_repr(resource, Repr::Array(a))
    }

    /// Wraps an object value, inheriting the object's own resource.
    #[must_use]
    pub fn from_object(o: JsonObject) -> Self {
        let resource = o.resource().clone();
        Self::from_repr(resource, Repr::Object(o))
    }

    /// The resource this value (and, transitively, anything it owns)
    /// allocates from.
    #[must_use]
    pub fn resource(&self) -> &ResourceHandle {
        match &self.repr {
            Repr::String(s) => s.resource(),
            Repr::Array(a) => a.resource(),
            Repr::Object(o) => o.resource(),
            _ => &self.resource,
        }
    }

    /// This value's discriminator.
    #[must_use]
    pub fn kind(&self) -> Kind {
        match &self.repr {
            Repr::Null => Kind::Null,
            Repr::Bool(_) => Kind::Bool,
            Repr::Int64(_) => Kind::Int64,
            Repr::Uint64(_) => Kind::Uint64,
            Repr::Double(_) => Kind::Double,
            Repr::String(_) => Kind::String,
            Repr::Array(_) => Kind::Array,
            Repr::Object(_) => Kind::Object,
        }
    }

    /// `true` for `Kind::Null`.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self.repr, Repr::Null)
    }

    /// Borrows the bool, if this is `Kind::Bool`.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self.repr {
            Repr::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Reads this value as a `bool`, erroring if it isn't one.
    pub fn to_bool(&self) -> Result<bool, ConvertError> {
        self.as_bool().ok_or(ConvertError::NotBool)
    }

    /// Borrows the value as `i64` without any conversion between kinds.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self.repr {
            Repr::Int64(i) => Some(i),
            _ => None,
        }
    }

    /// Borrows the value as `u64` without any conversion between kinds.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self.repr {
            Repr::Uint64(u) => Some(u),
            _ => None,
        }
    }

    /// Borrows the value as `f64`, only when it is exactly `Kind::Double`.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self.repr {
            Repr::Double(d) => Some(d),
            _ => None,
        }
    }

    /// Reads this value as `i64`, converting exactly from `Uint64` or
    /// `Double` when the value fits without loss, and erroring otherwise.
    pub fn to_i64(&self) -> Result<i64, ConvertError> {
        match self.repr {
            Repr::Int64(i) => Ok(i),
            Repr::Uint64(u) => i64::try_from(u).map_err(|_| ConvertError::IntegerOverflow),
            Repr::Double(d) => exact_double_to_i64(d).ok_or(ConvertError::NotExact),
            _ => Err(ConvertError::NotNumber),
        }
    }

    /// Reads this value as `u64`, converting exactly from `Int64` or
    /// `Double` when the value fits without loss, and erroring otherwise.
    pub fn to_u64(&self) -> Result<u64, ConvertError> {
        match self.repr {
            Repr::Uint64(u) => Ok(u),
            Repr::Int64(i) => u64::try_from(i).map_err(|_| ConvertError::IntegerOverflow),
            Repr::Double(d) => exact_double_to_u64(d).ok_or(ConvertError::NotExact),
            _ => Err(ConvertError::NotNumber),
        }
    }

    /// Reads this value as `f64`, widening `Int64`/`Uint64` (lossily for
    /// magnitudes beyond 2^53, matching `as` semantics); only errors for
    /// non-numeric kinds.
    pub fn to_f64(&self) -> Result<f64, ConvertError> {
        match self.repr {
            Repr::Double(d) => Ok(d),
            Repr::Int64(i) => Ok(i as f64),
            Repr::Uint64(u) => Ok(u as f64),
            _ => Err(ConvertError::NotNumber),
        }
    }

    /// Borrows the string, if this is `Kind::String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match &self.repr {
            Repr::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Reads this value as `&str`, erroring if it isn't a string.
    pub fn to_str(&self) -> Result<&str, ConvertError> {
        self.as_str().ok_or(ConvertError::NotString)
    }

    /// Borrows the array, if this is `Kind::Array`.
    #[must_use]
    pub fn as_array(&self) -> Option<&JsonArray> {
        match &self.repr {
            Repr::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Mutably borrows the array, if this is `Kind::Array`.
    pub fn as_array_mut(&mut self) -> Option<&mut JsonArray> {
        match &mut self.repr {
            Repr::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Reads this value as `&JsonArray`, erroring if it isn't an array.
    pub fn to_array(&self) -> Result<&JsonArray, ConvertError> {
        self.as_array().ok_or(ConvertError::NotArray)
    }

    /// Borrows the object, if this is `Kind::Object`.
    #[must_use]
    pub fn as_object(&self) -> Option<&JsonObject> {
        match &self.repr {
            Repr::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Mutably borrows the object, if this is `Kind::Object`.
    pub fn as_object_mut(&mut self) -> Option<&mut JsonObject> {
        match &mut self.repr {
            Repr::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Reads this value as `&JsonObject`, erroring if it isn't an object.
    pub fn to_object(&self) -> Result<&JsonObject, ConvertError> {
        self.as_object().ok_or(ConvertError::NotObject)
    }
}

fn exact_double_to_i64(d: f64) -> Option<i64> {
    if d.fract() != 0.0 || !d.is_finite() {
        return None;
    }
    if d >= i64::MIN as f64 && d < 9_223_372_036_854_775_808.0_f64 {
        Some(d as i64)
    } else {
        None
    }
}

fn exact_double_to_u64(d: f64) -> Option<u64> {
    if d.fract() != 0.0 || !d.is_finite() || d < 0.0 {
        return None;
    }
    if d < 18_446_744_073_709_551_616.0_f64 {
        Some(d as u64)
    } else {
        None
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::from_repr(ResourceHandle::default(), Repr::Bool(b))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::from_repr(ResourceHandle::default(), Repr::Int64(i))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Self::from_repr(ResourceHandle::default(), Repr::Uint64(u))
    }
}

impl From<f64> for Value {
    fn from(d: f64) -> Self {
        Self::from_repr(ResourceHandle::default(), Repr::Double(d))
    }
}

impl From<JsonString> for Value {
    fn from(s: JsonString) -> Self {
        Self::from_string(s)
    }
}

impl From<JsonArray> for Value {
    fn from(a: JsonArray) -> Self {
        Self::from_array(a)
    }
}

impl From<JsonObject> for Value {
    fn from(o: JsonObject) -> Self {
        Self::from_object(o)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::from_string(JsonString::from_str_in(ResourceHandle::default(), s).expect("default resource allocation failed"))
    }
}

impl Default for Value {
    fn default() -> Self {
        Self::null()
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        let repr = match &self.repr {
            Repr::Null => Repr::Null,
            Repr::Bool(b) => Repr::Bool(*b),
            Repr::Int64(i) => Repr::Int64(*i),
            Repr::Uint64(u) => Repr::Uint64(*u),
            Repr::Double(d) => Repr::Double(*d),
            Repr::String(s) => Repr::String(s.clone()),
            Repr::Array(a) => Repr::Array(a.clone()),
            Repr::Object(o) => Repr::Object(o.clone()),
        };
        Self {
            resource: self.resource.clone(),
            repr,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Null => f.write_str("Null"),
            Repr::Bool(b) => write!(f, "Bool({b})"),
            Repr::Int64(i) => write!(f, "Int64({i})"),
            Repr::Uint64(u) => write!(f, "Uint64({u})"),
            Repr::Double(d) => write!(f, "Double({d})"),
            Repr::String(s) => write!(f, "String({s:?})"),
            Repr::Array(a) => write!(f, "Array({a:?})"),
            Repr::Object(o) => write!(f, "Object({o:?})"),
        }
    }
}

impl PartialEq for Value {
    /// Value-structural equality: same kind and same contents,
    /// except `Int64`/`Uint64` compare numerically across those two
    /// kinds, and `Double` compares bitwise only to another `Double`.
    fn eq(&self, other: &Self) -> bool {
        match (&self.repr, &other.repr) {
            (Repr::Null, Repr::Null) => true,
            (Repr::Bool(a), Repr::Bool(b)) => a == b,
            (Repr::Int64(a), Repr::Int64(b)) => a == b,
            (Repr::Uint64(a), Repr::Uint64(b)) => a == b,
            (Repr::Int64(a), Repr::Uint64(b)) | (Repr::Uint64(b), Repr::Int64(a)) => *a >= 0 && (*a as u64) == *b,
            (Repr::Double(a), Repr::Double(b)) => a.to_bits() == b.to_bits(),
            (Repr::String(a), Repr::String(b)) => a == b,
            (Repr::Array(a), Repr::Array(b)) => a == b,
            (Repr::Object(a), Repr::Object(b)) => a == b,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int64_and_uint64_compare_numerically() {
        assert_eq!(Value::from(5i64), Value::from(5u64));
        assert_ne!(Value::from(-1i64), Value::from(u64::MAX));
    }

    #[test]
    fn double_never_equals_an_integer_kind() {
        assert_ne!(Value::from(5.0_f64), Value::from(5i64));
    }

    #[test]
    fn double_equality_is_bitwise_not_ieee() {
        assert_ne!(Value::from(0.0_f64), Value::from(-0.0_f64));
        assert_eq!(Value::from(f64::NAN), Value::from(f64::NAN));
    }

    #[test]
    fn to_i64_rejects_inexact_double() {
        assert_eq!(Value::from(1.5_f64).to_i64(), Err(ConvertError::NotExact));
        assert_eq!(Value::from(2.0_f64).to_i64(), Ok(2));
    }

    #[test]
    fn clone_deep_copies_nested_containers() {
        let mut arr = JsonArray::new();
        arr.push(Value::from("nested")).unwrap();
        let original = Value::from_array(arr);
        let cloned = original.clone();
        assert_eq!(original, cloned);
    }
}
