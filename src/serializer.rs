//! A resumable byte-at-a-time JSON encoder.
//!
//! [`Serializer`] walks a [`Value`] tree and emits canonical JSON text:
//! no insignificant whitespace, the shortest round-tripping decimal for
//! doubles (via `ryu`), plain decimal integers (via `itoa`), and minimal
//! string escaping (control characters, `"`, and `\` only).
//!
//! Like the SAX parser, it never recurses into the tree: [`Serializer::read`]
//! can be called with a buffer far smaller than the document (even one
//! byte at a time) and will suspend mid-string, mid-number, or between
//! any two structural tokens, resuming exactly where it left off on the
//! next call. Nesting state that would otherwise live on the call stack
//! instead lives in an explicit `Vec` of [`Frame`]s, one per open
//! array/object, each carrying only `Copy` data borrowed from the tree
//! being serialized (see `DESIGN.md`).
//!
//! Non-finite doubles (`NaN`, `+inf`, `-inf`) cannot be spelled in JSON
//! text, so they're rejected eagerly in [`Serializer::reset`] rather than
//! discovered mid-stream: that keeps [`Serializer::read`] itself
//! infallible, matching its byte-buffer contract.

use crate::dom::{JsonObject, Kind, Value};
use crate::error::SerializeError;

/// Reserved for future output-formatting knobs (indentation, trailing
/// newlines); currently has no fields.
#[derive(Debug, Default, Clone, Copy)]
pub struct SerializerOptions {}

/// A small fixed-capacity buffer for a single atomic emission: a
/// structural byte, a literal (`true`/`false`/`null`), a formatted
/// number, or one escape sequence within a string. 32 bytes comfortably
/// covers the longest of these (a `ryu`-formatted `f64`).
#[derive(Debug, Clone, Copy)]
struct ByteToken {
    buf: [u8; 32],
    len: u8,
    pos: u8,
}

impl ByteToken {
    fn from_slice(bytes: &[u8]) -> Self {
        debug_assert!(bytes.len() <= 32);
        let mut buf = [0u8; 32];
        buf[..bytes.len()].copy_from_slice(bytes);
        Self {
            buf,
            len: bytes.len() as u8,
            pos: 0,
        }
    }

    fn is_empty(&self) -> bool {
        self.pos >= self.len
    }

    fn drain(&mut self, dest: &mut [u8]) -> usize {
        let remaining = (self.len - self.pos) as usize;
        let n = remaining.min(dest.len());
        let start = self.pos as usize;
        dest[..n].copy_from_slice(&self.buf[start..start + n]);
        self.pos += n as u8;
        n
    }
}

fn needs_escape(b: u8) -> bool {
    b < 0x20 || b == b'"' || b == b'\\'
}

fn escape_token(b: u8) -> ByteToken {
    match b {
        b'"' => ByteToken::from_slice(b"\\\""),
        b'\\' => ByteToken::from_slice(b"\\\\"),
        0x08 => ByteToken::from_slice(b"\\b"),
        0x0c => ByteToken::from_slice(b"\\f"),
        0x0a => ByteToken::from_slice(b"\\n"),
        0x0d => ByteToken::from_slice(b"\\r"),
        0x09 => ByteToken::from_slice(b"\\t"),
        _ => {
            const HEX: &[u8; 16] = b"0123456789abcdef";
            let bytes = [b'\\', b'u', b'0', b'0', HEX[(b >> 4) as usize], HEX[(b & 0xf) as usize]];
            ByteToken::from_slice(&bytes)
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum StrPhase {
    OpenQuote,
    Scanning,
    CloseQuote,
    Done,
}

/// Streams one quoted, escaped JSON string a chunk at a time.
#[derive(Debug, Clone, Copy)]
struct StrEmit<'a> {
    bytes: &'a [u8],
    pos: usize,
    phase: StrPhase,
    pending: ByteToken,
}

impl<'a> StrEmit<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            pos: 0,
            phase: StrPhase::OpenQuote,
            pending: ByteToken::from_slice(b""),
        }
    }

    fn is_empty(&self) -> bool {
        matches!(self.phase, StrPhase::Done) && self.pending.is_empty()
    }

    fn drain(&mut self, dest: &mut [u8]) -> usize {
        let mut written = 0;
        while written < dest.len() {
            if !self.pending.is_empty() {
                written += self.pending.drain(&mut dest[written..]);
                continue;
            }
            match self.phase {
                StrPhase::OpenQuote => {
                    self.pending = ByteToken::from_slice(b"\"");
                    self.phase = StrPhase::Scanning;
                }
                StrPhase::Scanning => {
                    if self.pos >= self.bytes.len() {
                        self.phase = StrPhase::CloseQuote;
                        continue;
                    }
                    let start = self.pos;
                    let mut end = start;
                    while end < self.bytes.len() && !needs_escape(self.bytes[end]) {
                        end += 1;
                    }
                    if end > start {
                        let run = &self.bytes[start..end];
                        let n = run.len().min(dest.len() - written);
                        dest[written..written + n].copy_from_slice(&run[..n]);
                        written += n;
                        self.pos += n;
                        if n < run.len() {
                            // Destination buffer filled up mid-run.
                            break;
                        }
                        continue;
                    }
                    let b = self.bytes[self.pos];
                    self.pos += 1;
                    self.pending = escape_token(b);
                }
                StrPhase::CloseQuote => {
                    self.pending = ByteToken::from_slice(b"\"");
                    self.phase = StrPhase::Done;
                }
                StrPhase::Done => break,
            }
        }
        written
    }
}

#[derive(Debug, Clone, Copy)]
enum Current<'a> {
    Token(ByteToken),
    Str(StrEmit<'a>),
}

impl<'a> Current<'a> {
    fn is_empty(&self) -> bool {
        match self {
            Self::Token(t) => t.is_empty(),
            Self::Str(s) => s.is_empty(),
        }
    }

    fn drain(&mut self, dest: &mut [u8]) -> usize {
        match self {
            Self::Token(t) => t.drain(dest),
            Self::Str(s) => s.drain(dest),
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum ArrSub {
    ElemOrClose,
    CommaOrClose,
}

#[derive(Debug, Clone, Copy)]
enum ObjSub<'a> {
    EntryOrClose,
    ColonPending { value: &'a Value },
    ValuePending { value: &'a Value },
    CommaOrClose,
}

#[derive(Debug, Clone, Copy)]
enum Frame<'a> {
    Array {
        items: &'a [Value],
        idx: usize,
        sub: ArrSub,
    },
    Object {
        obj: &'a JsonObject,
        idx: usize,
        sub: ObjSub<'a>,
    },
}

/// Walks a [`Value`] tree, emitting canonical JSON text without
/// recursing: nesting lives in an explicit `Vec<Frame>` rather than the
/// call stack, so [`read`](Self::read) can suspend and resume at any
/// byte boundary.
#[derive(Debug)]
pub struct Serializer<'a> {
    options: SerializerOptions,
    root: Option<&'a Value>,
    stack: Vec<Frame<'a>>,
    current: Option<Current<'a>>,
    done: bool,
}

impl<'a> Serializer<'a> {
    /// A serializer with no value loaded; [`reset`](Self::reset) must be
    /// called before [`read`](Self::read) will produce anything.
    #[must_use]
    pub fn new() -> Self {
        Self {
            options: SerializerOptions::default(),
            root: None,
            stack: Vec::new(),
            current: None,
            done: true,
        }
    }

    /// The formatting options this serializer was constructed with.
    #[must_use]
    pub fn options(&self) -> SerializerOptions {
        self.options
    }

    /// Loads `value` to be serialized from scratch, discarding any
    /// in-progress state. Fails without emitting anything if `value`
    /// contains a `NaN` or infinite double anywhere in its tree, since
    /// JSON text cannot spell such a number.
    pub fn reset(&mut self, value: &'a Value) -> Result<(), SerializeError> {
        check_finite(value)?;
        self.stack.clear();
        self.current = None;
        self.root = Some(value);
        self.done = false;
        Ok(())
    }

    /// `true` once every byte of the loaded value has been read.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Writes as many bytes of the serialized value into `dest` as fit,
    /// returning how many were written. Returns `0` only when
    /// [`is_done`](Self::is_done) is already `true` or no value has been
    /// loaded. Safe to call with a `dest` shorter than any single token;
    /// the next call resumes exactly where this one left off.
    pub fn read(&mut self, dest: &mut [u8]) -> usize {
        let mut written = 0;
        while written < dest.len() {
            match self.current.as_mut() {
                Some(cur) => {
                    written += cur.drain(&mut dest[written..]);
                    if cur.is_empty() {
                        self.current = None;
                    } else {
                        break;
                    }
                }
                None => {
                    if self.done {
                        break;
                    }
                    self.advance();
                }
            }
        }
        written
    }

    fn advance(&mut self) {
        let Some(frame) = self.stack.pop() else {
            match self.root.take() {
                Some(root) => self.render_value_entry(root),
                None => self.done = true,
            }
            return;
        };
        match frame {
            Frame::Array { items, idx, sub } => self.advance_array(items, idx, sub),
            Frame::Object { obj, idx, sub } => self.advance_object(obj, idx, sub),
        }
    }

    fn advance_array(&mut self, items: &'a [Value], idx: usize, sub: ArrSub) {
        match sub {
            ArrSub::ElemOrClose => {
                if idx >= items.len() {
                    self.current = Some(Current::Token(ByteToken::from_slice(b"]")));
                } else {
                    let value = &items[idx];
                    self.stack.push(Frame::Array {
                        items,
                        idx: idx + 1,
                        sub: ArrSub::CommaOrClose,
                    });
                    self.render_value_entry(value);
                }
            }
            ArrSub::CommaOrClose => {
                if idx >= items.len() {
                    self.current = Some(Current::Token(ByteToken::from_slice(b"]")));
                } else {
                    self.current = Some(Current::Token(ByteToken::from_slice(b",")));
                    self.stack.push(Frame::Array {
                        items,
                        idx,
                        sub: ArrSub::ElemOrClose,
                    });
                }
            }
        }
    }

    fn advance_object(&mut self, obj: &'a JsonObject, idx: usize, sub: ObjSub<'a>) {
        match sub {
            ObjSub::EntryOrClose => {
                if idx >= obj.len() {
                    self.current = Some(Current::Token(ByteToken::from_slice(b"}")));
                } else {
                    let (key, value) = obj.get_index(idx).expect("idx < obj.len()");
                    self.stack.push(Frame::Object {
                        obj,
                        idx: idx + 1,
                        sub: ObjSub::ColonPending { value },
                    });
                    self.current = Some(Current::Str(StrEmit::new(key.as_bytes())));
                }
            }
            ObjSub::ColonPending { value } => {
                self.current = Some(Current::Token(ByteToken::from_slice(b":")));
                self.stack.push(Frame::Object {
                    obj,
                    idx,
                    sub: ObjSub::ValuePending { value },
                });
            }
            ObjSub::ValuePending { value } => {
                self.stack.push(Frame::Object {
                    obj,
                    idx,
                    sub: ObjSub::CommaOrClose,
                });
                self.render_value_entry(value);
            }
            ObjSub::CommaOrClose => {
                if idx >= obj.len() {
                    self.current = Some(Current::Token(ByteToken::from_slice(b"}")));
                } else {
                    self.current = Some(Current::Token(ByteToken::from_slice(b",")));
                    self.stack.push(Frame::Object {
                        obj,
                        idx,
                        sub: ObjSub::EntryOrClose,
                    });
                }
            }
        }
    }

    fn render_value_entry(&mut self, value: &'a Value) {
        self.current = Some(match value.kind() {
            Kind::Null => Current::Token(ByteToken::from_slice(b"null")),
            Kind::Bool => {
                let b = value.as_bool().expect("Kind::Bool");
                Current::Token(ByteToken::from_slice(if b { b"true" } else { b"false" }))
            }
            Kind::Int64 => {
                let mut buf = itoa::Buffer::new();
                let text = buf.format(value.as_i64().expect("Kind::Int64"));
                Current::Token(ByteToken::from_slice(text.as_bytes()))
            }
            Kind::Uint64 => {
                let mut buf = itoa::Buffer::new();
                let text = buf.format(value.as_u64().expect("Kind::Uint64"));
                Current::Token(ByteToken::from_slice(text.as_bytes()))
            }
            Kind::Double => {
                let mut buf = ryu::Buffer::new();
                let text = buf.format(value.as_f64().expect("Kind::Double"));
                Current::Token(ByteToken::from_slice(text.as_bytes()))
            }
            Kind::String => Current::Str(StrEmit::new(value.as_str().expect("Kind::String").as_bytes())),
            Kind::Array => {
                let items = value.as_array().expect("Kind::Array").as_slice();
                self.stack.push(Frame::Array {
                    items,
                    idx: 0,
                    sub: ArrSub::ElemOrClose,
                });
                Current::Token(ByteToken::from_slice(b"["))
            }
            Kind::Object => {
                let obj = value.as_object().expect("Kind::Object");
                self.stack.push(Frame::Object {
                    obj,
                    idx: 0,
                    sub: ObjSub::EntryOrClose,
                });
                Current::Token(ByteToken::from_slice(b"{"))
            }
        });
    }
}

impl Default for Serializer<'_> {
    fn default() -> Self {
        Self::new()
    }
}

fn check_finite(value: &Value) -> Result<(), SerializeError> {
    match value.kind() {
        Kind::Double => {
            if value.as_f64().expect("Kind::Double").is_finite() {
                Ok(())
            } else {
                Err(SerializeError::NonFiniteNumber)
            }
        }
        Kind::Array => value.as_array().expect("Kind::Array").iter().try_for_each(check_finite),
        Kind::Object => value
            .as_object()
            .expect("Kind::Object")
            .iter()
            .try_for_each(|(_, v)| check_finite(v)),
        _ => Ok(()),
    }
}

/// Serializes `value` into canonical JSON text in one call, draining
/// [`Serializer`] through an internal scratch buffer.
pub fn to_string(value: &Value) -> Result<String, SerializeError> {
    let mut serializer = Serializer::new();
    serializer.reset(value)?;
    let mut out = Vec::new();
    let mut buf = [0u8; 4096];
    while !serializer.is_done() {
        let n = serializer.read(&mut buf);
        if n == 0 {
            break;
        }
        out.extend_from_slice(&buf[..n]);
    }
    Ok(String::from_utf8(out).expect("serializer only emits valid UTF-8"))
}
