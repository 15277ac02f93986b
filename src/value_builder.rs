//! Reifies SAX events into a [`Value`] tree.
//!
//! [`ValueBuilder`] implements [`Handler`], buffering each array/object's
//! completed children in a plain `Vec`/`Vec` of pairs while the container is
//! still open — its final length isn't known until the matching close
//! fires — then converting that buffer into the resource-backed
//! [`JsonArray`]/[`JsonObject`] in one allocation via
//! `from_exact_iter_in`/`from_exact_pairs_in` once the count is known. This
//! is the streaming counterpart of those constructors' "single allocation"
//! guarantee: a document driven through in one `write_some` call still
//! costs one allocation per container, not one per child.
//!
//! String and key bytes may also arrive in several chunks
//! (`on_key_part`/`on_key`, `on_string_part`/`on_string`); they accumulate
//! in a scratch `Vec<u8>` until the final chunk is reported.

use crate::dom::{JsonArray, JsonObject, JsonString, Value};
use crate::error::AllocError;
use crate::resource::ResourceHandle;
use crate::sax::Handler;

#[derive(Debug)]
enum Frame {
    Array(Vec<Value>),
    Object {
        pending_key: Option<JsonString>,
        pairs: Vec<(JsonString, Value)>,
    },
}

/// Builds a single [`Value`] from one SAX-parsed document.
///
/// Pair this with [`crate::sax::Parser`]: drive the parser's `write_some`/
/// `finish` with a `&mut ValueBuilder` as the handler, then call
/// [`ValueBuilder::release`] once the parser reports `is_complete()`.
///
/// Only documents using the parser's default UTF-8 validation are
/// supported; a parser configured with `allow_invalid_utf8` may hand this
/// builder bytes that aren't valid UTF-8, which [`JsonString::from_unchecked_in`]
/// only debug-asserts against.
#[derive(Debug)]
pub struct ValueBuilder {
    resource: ResourceHandle,
    stack: Vec<Frame>,
    current: Vec<u8>,
    root: Option<Value>,
    error: Option<AllocError>,
}

impl ValueBuilder {
    /// A builder that allocates every value from the default resource.
    #[must_use]
    pub fn new() -> Self {
        Self::new_in(ResourceHandle::default())
    }

    /// A builder that allocates every value from `resource`.
    #[must_use]
    pub fn new_in(resource: ResourceHandle) -> Self {
        Self {
            resource,
            stack: Vec::new(),
            current: Vec::new(),
            root: None,
            error: None,
        }
    }

    /// Takes the completed root value, if the document has finished and no
    /// allocation failed along the way.
    pub fn release(&mut self) -> Option<Value> {
        self.root.take()
    }

    /// Takes the allocation failure that made a handler callback reject
    /// the document, if one occurred.
    pub fn take_error(&mut self) -> Option<AllocError> {
        self.error.take()
    }

    fn fail(&mut self, err: AllocError) -> bool {
        self.error = Some(err);
        false
    }

    fn emit_value(&mut self, value: Value) -> bool {
        match self.stack.last_mut() {
            None => {
                self.root = Some(value);
                true
            }
            Some(Frame::Array(items)) => {
                items.push(value);
                true
            }
            Some(Frame::Object { pending_key, pairs }) => match pending_key.take() {
                Some(key) => {
                    pairs.push((key, value));
                    true
                }
                // The parser never emits a value inside an object without
                // a preceding key.
                None => false,
            },
        }
    }

    fn take_string(&mut self) -> Result<JsonString, AllocError> {
        let bytes = std::mem::take(&mut self.current);
        JsonString::from_unchecked_in(self.resource.clone(), &bytes)
    }
}

impl Default for ValueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for ValueBuilder {
    fn on_object_begin(&mut self) -> bool {
        self.stack.push(Frame::Object {
            pending_key: None,
            pairs: Vec::new(),
        });
        true
    }

    fn on_object_end(&mut self, _size: usize) -> bool {
        let Some(Frame::Object { pairs, .. }) = self.stack.pop() else {
            return false;
        };
        let len = pairs.len();
        match JsonObject::from_exact_pairs_in(self.resource.clone(), len, pairs.into_iter()) {
            Ok(obj) => self.emit_value(Value::from_object(obj)),
            Err(e) => self.fail(e),
        }
    }

    fn on_array_begin(&mut self) -> bool {
        self.stack.push(Frame::Array(Vec::new()));
        true
    }

    fn on_array_end(&mut self, _size: usize) -> bool {
        let Some(Frame::Array(items)) = self.stack.pop() else {
            return false;
        };
        let len = items.len();
        match JsonArray::from_exact_iter_in(self.resource.clone(), len, items.into_iter()) {
            Ok(arr) => self.emit_value(Value::from_array(arr)),
            Err(e) => self.fail(e),
        }
    }

    fn on_key_part(&mut self, chunk: &[u8], _total_so_far: usize) -> bool {
        self.current.extend_from_slice(chunk);
        true
    }

    fn on_key(&mut self, chunk: &[u8], _total: usize) -> bool {
        self.current.extend_from_slice(chunk);
        let key = match self.take_string() {
            Ok(key) => key,
            Err(e) => return self.fail(e),
        };
        match self.stack.last_mut() {
            Some(Frame::Object { pending_key, .. }) => {
                *pending_key = Some(key);
                true
            }
            _ => false,
        }
    }

    fn on_string_part(&mut self, chunk: &[u8], _total_so_far: usize) -> bool {
        self.current.extend_from_slice(chunk);
        true
    }

    fn on_string(&mut self, chunk: &[u8], _total: usize) -> bool {
        self.current.extend_from_slice(chunk);
        match self.take_string() {
            Ok(s) => self.emit_value(Value::from_string(s)),
            Err(e) => self.fail(e),
        }
    }

    fn on_int64(&mut self, value: i64, _text: &[u8]) -> bool {
        self.emit_value(Value::from(value))
    }

    fn on_uint64(&mut self, value: u64, _text: &[u8]) -> bool {
        self.emit_value(Value::from(value))
    }

    fn on_double(&mut self, value: f64, _text: &[u8]) -> bool {
        self.emit_value(Value::from(value))
    }

    fn on_bool(&mut self, value: bool) -> bool {
        self.emit_value(Value::from(value))
    }

    fn on_null(&mut self) -> bool {
        self.emit_value(Value::null_in(self.resource.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sax::{Parser, ParserOptions};

    fn build(text: &str) -> Value {
        let mut parser = Parser::new(ParserOptions::default());
        let mut builder = ValueBuilder::new();
        parser.finish(text.as_bytes(), &mut builder).unwrap();
        builder.release().expect("document completed")
    }

    #[test]
    fn builds_nested_array_and_object() {
        let value = build(r#"{"a":[1,2,3],"b":null,"c":"hi"}"#);
        let obj = value.as_object().unwrap();
        assert_eq!(obj.find("a").unwrap().as_array().unwrap().len(), 3);
        assert!(obj.find("b").unwrap().is_null());
        assert_eq!(obj.find("c").unwrap().as_str(), Some("hi"));
    }

    #[test]
    fn duplicate_keys_keep_last_value() {
        let value = build(r#"{"a":1,"a":2}"#);
        assert_eq!(value.as_object().unwrap().find("a").unwrap().as_i64(), Some(2));
    }

    #[test]
    fn chunked_string_parts_concatenate() {
        let mut parser = Parser::new(ParserOptions::default());
        let mut builder = ValueBuilder::new();
        parser.write_some(true, br#""hello"#, &mut builder).unwrap();
        parser.finish(br#" world""#, &mut builder).unwrap();
        assert_eq!(builder.release().unwrap().as_str(), Some("hello world"));
    }

    #[test]
    fn empty_array_and_object_build_without_allocating_elements() {
        let value = build("[]");
        assert_eq!(value.as_array().unwrap().len(), 0);
        let value = build("{}");
        assert_eq!(value.as_object().unwrap().len(), 0);
    }
}
