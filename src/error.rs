//! Error types shared across the crate: allocation failure, value-kind
//! conversion failure, and serialization failure. Parse errors live in
//! [`crate::sax::error`] since they additionally carry a byte offset.

use thiserror::Error;

/// Failure to satisfy an allocation request from a memory resource.
///
/// See [`crate::resource::MemoryResource`].
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AllocError {
    /// The resource could not satisfy the request (the host allocator
    /// failed, a `static` resource's buffer is exhausted, or the resource
    /// is a `null` resource).
    #[error("out of memory")]
    OutOfMemory,
}

/// Raised when a caller asks a [`crate::dom::Value`] of one kind to be
/// interpreted as another.
///
/// Unlike parse errors, these are recoverable locally: they don't poison
/// the document, only the single conversion attempt.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvertError {
    /// The value is not an object.
    #[error("not an object")]
    NotObject,
    /// The value is not an array.
    #[error("not an array")]
    NotArray,
    /// The value is not a string.
    #[error("not a string")]
    NotString,
    /// The value is not a number.
    #[error("not a number")]
    NotNumber,
    /// The value is not a bool.
    #[error("not a bool")]
    NotBool,
    /// The value is not null.
    #[error("not null")]
    NotNull,
    /// The requested integer type cannot represent the value exactly.
    #[error("number cast is not exact")]
    NotExact,
    /// The value overflows the requested integer type.
    #[error("integer overflow")]
    IntegerOverflow,
}

/// Raised by the serializer's string-returning entry point.
///
/// The byte-buffer-oriented [`crate::serializer::Serializer::read`]
/// overload cannot fail after construction; only the convenience
/// `serialize(value) -> String` path can, and only because of a
/// non-finite double.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeError {
    /// A `Value::Double` held a `NaN` or infinite value. JSON text cannot
    /// spell such numbers, so serialization must error rather than emit
    /// something unparseable.
    #[error("cannot serialize a non-finite double")]
    NonFiniteNumber,
    /// The memory resource backing the destination buffer ran out of space.
    #[error(transparent)]
    Alloc(#[from] AllocError),
}
