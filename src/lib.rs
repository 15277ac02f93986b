//! An incremental SAX-style JSON parser, a tagged-union DOM built on a
//! pluggable memory-resource abstraction, and a resumable serializer.
//!
//! # Examples
//!
//! Parsing and serializing a whole document at once:
//!
//! ```rust
//! use jsonic::{parse, serialize};
//!
//! let value = parse(br#"{"a":[1,2,3],"b":null}"#).unwrap();
//! assert_eq!(value.as_object().unwrap().find("a").unwrap().as_array().unwrap().len(), 3);
//! assert_eq!(serialize(&value).unwrap(), r#"{"a":[1,2,3],"b":null}"#);
//! ```
//!
//! Feeding a document to the incremental parser in arbitrary chunks:
//!
//! ```rust
//! use jsonic::StreamParser;
//!
//! let mut parser = StreamParser::new();
//! parser.write_some(true, br#"{"a":[1,2,"#).unwrap();
//! parser.finish(br#"3]}"#).unwrap();
//! let value = parser.into_value().unwrap();
//! assert_eq!(value.as_object().unwrap().find("a").unwrap().as_array().unwrap().len(), 3);
//! ```

pub mod dom;
pub mod error;
pub mod number;
pub mod rawstack;
pub mod resource;
pub mod sax;
pub mod serializer;
pub mod value_builder;

use error::{AllocError, SerializeError};
use sax::Parser;
use value_builder::ValueBuilder;

pub use dom::{JsonArray, JsonObject, JsonString, Kind, Value};
pub use resource::{DefaultResource, MemoryResource, MonotonicResource, NullResource, ResourceHandle, StaticResource};
pub use sax::Handler as SaxHandler;
pub use sax::{ParseError, ParserOptions};
pub use serializer::{Serializer, SerializerOptions};

use thiserror::Error;

/// Everything that can go wrong turning bytes into a [`Value`]: either
/// the document itself is malformed ([`ParseError`]), or a handler
/// callback rejected it because a memory resource ran out of space
/// ([`AllocError`]).
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseToValueError {
    /// The document is not well-formed JSON (or violates a parser
    /// option such as `max_depth`).
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// A memory resource could not satisfy an allocation while the
    /// value tree was being built.
    #[error(transparent)]
    Alloc(#[from] AllocError),
}

/// Parses a complete, in-memory JSON document into a [`Value`] tree
/// allocated from the default (global heap) resource.
pub fn parse(bytes: &[u8]) -> Result<Value, ParseToValueError> {
    parse_in(ResourceHandle::default(), ParserOptions::default(), bytes)
}

/// Like [`parse`], but every node in the resulting tree allocates from
/// `resource` instead of the default heap resource.
pub fn parse_in(resource: ResourceHandle, options: ParserOptions, bytes: &[u8]) -> Result<Value, ParseToValueError> {
    let mut parser = Parser::new(options);
    let mut builder = ValueBuilder::new_in(resource);
    parser.finish(bytes, &mut builder)?;
    if let Some(err) = builder.take_error() {
        return Err(err.into());
    }
    Ok(builder.release().expect("parser reported a complete document"))
}

/// Serializes `value` to a canonical JSON `String`: no insignificant
/// whitespace, minimal string escapes, shortest-round-trip doubles.
pub fn serialize(value: &Value) -> Result<String, SerializeError> {
    serializer::to_string(value)
}

/// Serializes `value` as canonical JSON text directly into `writer`,
/// without ever materializing the whole document in memory at once.
pub fn stream_serialize<W: std::io::Write>(value: &Value, mut writer: W) -> Result<(), StreamSerializeError> {
    let mut ser = Serializer::new();
    ser.reset(value)?;
    let mut buf = [0u8; 4096];
    while !ser.is_done() {
        let n = ser.read(&mut buf);
        if n == 0 {
            break;
        }
        writer.write_all(&buf[..n])?;
    }
    Ok(())
}

/// Errors from [`stream_serialize`]: either the value itself couldn't be
/// serialized ([`SerializeError`]), or the destination writer failed.
#[derive(Error, Debug)]
pub enum StreamSerializeError {
    /// See [`SerializeError`].
    #[error(transparent)]
    Serialize(#[from] SerializeError),
    /// The destination writer returned an I/O error.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// An incremental parser that reifies SAX events directly into a single
/// [`Value`] tree, for callers who want DOM ergonomics but can only feed
/// the document in pieces (e.g. as it arrives off a socket).
///
/// Pairs [`sax::Parser`] with [`ValueBuilder`] the way [`parse`] does
/// internally, but across as many [`write_some`](Self::write_some) calls
/// as the caller likes before finishing with
/// [`finish`](Self::finish)/[`into_value`](Self::into_value).
#[derive(Debug)]
pub struct StreamParser {
    parser: Parser,
    builder: ValueBuilder,
}

impl StreamParser {
    /// A stream parser building its value on the default resource, with
    /// default parser options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(ResourceHandle::default(), ParserOptions::default())
    }

    /// A stream parser allocating from `resource`, scanning under `options`.
    #[must_use]
    pub fn with_options(resource: ResourceHandle, options: ParserOptions) -> Self {
        Self {
            parser: Parser::new(options),
            builder: ValueBuilder::new_in(resource),
        }
    }

    /// Feeds one chunk of input. `more` indicates whether additional
    /// chunks will follow; pass `false` only on the final chunk (or call
    /// [`finish`](Self::finish) instead). Returns the number of bytes
    /// consumed from `bytes`.
    pub fn write_some(&mut self, more: bool, bytes: &[u8]) -> Result<usize, ParseToValueError> {
        let n = self.parser.write_some(more, bytes, &mut self.builder)?;
        if let Some(err) = self.builder.take_error() {
            return Err(err.into());
        }
        Ok(n)
    }

    /// Feeds the final chunk of input and requires the document to be
    /// complete afterward.
    pub fn finish(&mut self, bytes: &[u8]) -> Result<usize, ParseToValueError> {
        let n = self.parser.finish(bytes, &mut self.builder)?;
        if let Some(err) = self.builder.take_error() {
            return Err(err.into());
        }
        Ok(n)
    }

    /// `true` once a complete top-level value has been scanned.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.parser.is_complete()
    }

    /// Takes the built value, if parsing completed successfully.
    pub fn into_value(mut self) -> Option<Value> {
        self.builder.release()
    }
}

impl Default for StreamParser {
    fn default() -> Self {
        Self::new()
    }
}
