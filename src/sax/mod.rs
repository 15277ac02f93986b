//! A resumable, allocation-light SAX-style JSON scanner.
//!
//! [`Parser`] consumes input one chunk at a time through
//! [`Parser::write_some`], firing [`Handler`] callbacks as it recognizes
//! tokens. A chunk boundary may fall anywhere — mid-string, mid-number,
//! mid-literal, mid-escape — and the parser parks exactly enough state in
//! a [`crate::rawstack::RawStack`] to resume on the next call rather than
//! re-scanning or requiring the whole document up front.
//!
//! Container nesting (array/object open frames) is the part of this
//! state that's genuinely unbounded in size, so it lives on the raw
//! stack as a sequence of small [`Frame`] values, one per open container.
//! The *token*-level state (which literal is partway through matching,
//! which byte of a `\u` escape we're on, a number's running mantissa) is
//! bounded and single-flight — only one token can be mid-scan at any
//! suspension point — so it lives directly on the [`Parser`] as a plain
//! field; parking it on the byte stack too would just be ceremony.

mod error;
mod handler;
mod options;

pub use error::{ErrorCode, ParseError};
pub use handler::Handler;
pub use options::{DecodeMode, ParserOptions};

use crate::number::{Classified, NumberAccum};
use crate::rawstack::RawStack;

/// A key or string's byte length, or an array/object's entry count, may
/// not exceed this many units.
const MAX_LEN: usize = (1usize << 31) - 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContainerKind {
    Array,
    Object,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubState {
    /// Array: a value or `]` is next. Object: a key or `}` is next.
    ExpectFirstOrClose,
    /// After a value (array) or value (object): `,` or the close bracket.
    ExpectCommaOrClose,
    /// After `,`: array expects a value, object expects a key. Accepts an
    /// immediate close instead when `allow_trailing_commas` is set.
    ExpectNextOrClose,
    /// Object, after a key: `:` is next.
    ExpectColon,
    /// Object, after `:`: a value is next.
    ExpectObjectValue,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: ContainerKind,
    count: u32,
    sub_state: SubState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DocPhase {
    /// No bytes processed yet; `on_document_begin` not yet fired.
    Start,
    /// Scanning toward, or inside, the single top-level value.
    BeforeValue,
    /// The top-level value is complete; only whitespace/comments/EOF are
    /// still legal.
    AfterValue,
}

#[derive(Debug, Clone, Copy)]
enum LiteralKind {
    True,
    False,
    Null,
}

#[derive(Debug, Clone, Copy)]
enum StrState {
    Normal,
    Escape,
    UnicodeEscape {
        nibble_idx: u8,
        value: u16,
        pending_high: Option<u16>,
    },
    ExpectLowBackslash {
        high: u16,
    },
    ExpectLowU {
        high: u16,
    },
}

#[derive(Debug, Clone, Copy)]
enum NumState {
    Start,
    IntDigits { leading_zero: bool, digit_count: u32 },
    FracStart,
    FracDigits,
    ExpStart,
    ExpSignSeen,
    ExpDigits,
}

#[derive(Debug, Clone, Copy)]
enum CommentKind {
    Line,
    Block,
}

#[derive(Debug, Clone, Copy)]
enum TokenState {
    None,
    Literal {
        lit: LiteralKind,
        matched: usize,
    },
    Str {
        is_key: bool,
        state: StrState,
        reported_len: usize,
    },
    Number {
        accum: NumberAccum,
        state: NumState,
    },
    Comment {
        kind: CommentKind,
        prev_star: bool,
    },
}

/// A resumable JSON scanner. See the module docs for the chunking model.
#[derive(Debug)]
pub struct Parser {
    options: ParserOptions,
    stack: RawStack,
    token: TokenState,
    phase: DocPhase,
    depth: usize,
    base_offset: usize,
    cursor_abs: usize,
    error: Option<ParseError>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl Parser {
    /// Builds a parser with the given options.
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self {
            options,
            stack: RawStack::new(),
            token: TokenState::None,
            phase: DocPhase::Start,
            depth: 0,
            base_offset: 0,
            cursor_abs: 0,
            error: None,
        }
    }

    /// The configured options.
    #[must_use]
    pub fn options(&self) -> ParserOptions {
        self.options
    }

    /// The maximum array/object nesting depth this parser accepts.
    #[must_use]
    pub fn max_depth(&self) -> usize {
        self.options.max_depth
    }

    /// Changes the maximum array/object nesting depth. Takes effect on
    /// already-open containers too: a document deeper than the new limit
    /// will fail the next time it descends further, even mid-document.
    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.options.max_depth = max_depth;
    }

    /// Discards all state, making the parser ready to scan a new
    /// document from the start.
    pub fn reset(&mut self) {
        self.stack.clear();
        self.token = TokenState::None;
        self.phase = DocPhase::Start;
        self.depth = 0;
        self.base_offset = 0;
        self.cursor_abs = 0;
        self.error = None;
    }

    /// Current array/object nesting depth.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// `true` once a full top-level document has been scanned
    /// successfully.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.error.is_none() && self.phase == DocPhase::AfterValue
    }

    /// Feeds a chunk of input. `more` indicates whether additional bytes
    /// will follow in a later call; when `false`, the document must be
    /// structurally complete by the end of `bytes` or `Err` is returned
    /// with [`ErrorCode::Incomplete`].
    ///
    /// Returns the number of bytes from `bytes` that were consumed. This
    /// is normally `bytes.len()`; it can be one less when `bytes` ends in
    /// a lone `/` under `allow_comments` and the parser needs the next
    /// byte to tell a line comment from a block comment.
    ///
    /// # Errors
    ///
    /// Returns the first [`ParseError`] encountered. Once an error has
    /// been returned the parser is poisoned: every subsequent call
    /// returns the same error until [`Parser::reset`] is called.
    pub fn write_some(
        &mut self,
        more: bool,
        bytes: &[u8],
        handler: &mut dyn Handler,
    ) -> Result<usize, ParseError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        if self.phase == DocPhase::Start {
            self.phase = DocPhase::BeforeValue;
            self.cursor_abs = self.base_offset;
            if !handler.on_document_begin() {
                let err = self.fail(ErrorCode::HandlerRejected);
                self.error = Some(err);
                return Err(err);
            }
        }
        let mut pos = 0usize;
        let result = self.run(bytes, &mut pos, handler).and_then(|()| {
            if more {
                Ok(())
            } else {
                self.finalize(handler)
            }
        });
        self.base_offset += pos;
        match result {
            Ok(()) => Ok(pos),
            Err(err) => {
                self.error = Some(err);
                Err(err)
            }
        }
    }

    /// Equivalent to `write_some(false, bytes, handler)`: feeds the final
    /// chunk of a document and requires it to complete.
    ///
    /// # Errors
    ///
    /// See [`Parser::write_some`].
    pub fn finish(&mut self, bytes: &[u8], handler: &mut dyn Handler) -> Result<usize, ParseError> {
        self.write_some(false, bytes, handler)
    }

    fn fail(&self, code: ErrorCode) -> ParseError {
        ParseError::new(code, self.cursor_abs)
    }

    fn err(&self, code: ErrorCode) -> ParseError {
        self.fail(code)
    }

    fn run(&mut self, bytes: &[u8], pos: &mut usize, handler: &mut dyn Handler) -> Result<(), ParseError> {
        loop {
            if !matches!(self.token, TokenState::None) {
                if !self.resume_token(bytes, pos, handler)? {
                    return Ok(());
                }
                continue;
            }
            if *pos >= bytes.len() {
                return Ok(());
            }
            self.cursor_abs = self.base_offset + *pos;
            let b = bytes[*pos];

            if is_ws(b) {
                *pos += 1;
                continue;
            }
            if self.options.allow_comments && b == b'/' {
                if *pos + 1 >= bytes.len() {
                    return Ok(());
                }
                self.begin_comment(bytes, pos)?;
                continue;
            }

            self.dispatch_structural(b, bytes, pos, handler)?;
        }
    }

    fn dispatch_structural(
        &mut self,
        b: u8,
        bytes: &[u8],
        pos: &mut usize,
        handler: &mut dyn Handler,
    ) -> Result<(), ParseError> {
        if self.depth == 0 {
            return match self.phase {
                DocPhase::AfterValue => Err(self.err(ErrorCode::ExtraData)),
                _ => self.start_value(b, bytes, pos, handler),
            };
        }
        let frame = self.top_frame();
        match frame.sub_state {
            SubState::ExpectFirstOrClose => {
                let close = close_byte(frame.kind);
                if b == close {
                    *pos += 1;
                    return self.close_container(handler);
                }
                if frame.kind == ContainerKind::Object {
                    self.begin_key(b, pos)
                } else {
                    self.start_value(b, bytes, pos, handler)
                }
            }
            SubState::ExpectCommaOrClose => {
                let close = close_byte(frame.kind);
                if b == close {
                    *pos += 1;
                    self.close_container(handler)
                } else if b == b',' {
                    *pos += 1;
                    let mut f = frame;
                    f.sub_state = SubState::ExpectNextOrClose;
                    self.set_top_frame(f);
                    Ok(())
                } else {
                    Err(self.err(ErrorCode::ExpectedComma))
                }
            }
            SubState::ExpectNextOrClose => {
                let close = close_byte(frame.kind);
                if self.options.allow_trailing_commas && b == close {
                    *pos += 1;
                    return self.close_container(handler);
                }
                if frame.kind == ContainerKind::Object {
                    self.begin_key(b, pos)
                } else {
                    self.start_value(b, bytes, pos, handler)
                }
            }
            SubState::ExpectColon => {
                if b == b':' {
                    *pos += 1;
                    let mut f = frame;
                    f.sub_state = SubState::ExpectObjectValue;
                    self.set_top_frame(f);
                    Ok(())
                } else {
                    Err(self.err(ErrorCode::ExpectedColon))
                }
            }
            SubState::ExpectObjectValue => self.start_value(b, bytes, pos, handler),
        }
    }

    fn begin_key(&mut self, b: u8, pos: &mut usize) -> Result<(), ParseError> {
        if b != b'"' {
            return Err(self.err(ErrorCode::ExpectedQuotes));
        }
        *pos += 1;
        self.token = TokenState::Str {
            is_key: true,
            state: StrState::Normal,
            reported_len: 0,
        };
        Ok(())
    }

    fn start_value(
        &mut self,
        b: u8,
        bytes: &[u8],
        pos: &mut usize,
        handler: &mut dyn Handler,
    ) -> Result<(), ParseError> {
        match b {
            b'"' => {
                *pos += 1;
                self.token = TokenState::Str {
                    is_key: false,
                    state: StrState::Normal,
                    reported_len: 0,
                };
                Ok(())
            }
            b'{' => {
                *pos += 1;
                self.push_frame(ContainerKind::Object)?;
                if !handler.on_object_begin() {
                    return Err(self.err(ErrorCode::HandlerRejected));
                }
                Ok(())
            }
            b'[' => {
                *pos += 1;
                self.push_frame(ContainerKind::Array)?;
                if !handler.on_array_begin() {
                    return Err(self.err(ErrorCode::HandlerRejected));
                }
                Ok(())
            }
            b't' => {
                *pos += 1;
                self.token = TokenState::Literal { lit: LiteralKind::True, matched: 1 };
                self.resume_literal_inline(bytes, pos, handler)
            }
            b'f' => {
                *pos += 1;
                self.token = TokenState::Literal { lit: LiteralKind::False, matched: 1 };
                self.resume_literal_inline(bytes, pos, handler)
            }
            b'n' => {
                *pos += 1;
                self.token = TokenState::Literal { lit: LiteralKind::Null, matched: 1 };
                self.resume_literal_inline(bytes, pos, handler)
            }
            b'-' => {
                let mut accum = NumberAccum::new();
                accum.set_negative();
                self.push_scratch_byte(false, b)?;
                *pos += 1;
                self.token = TokenState::Number { accum, state: NumState::Start };
                Ok(())
            }
            b'0'..=b'9' => {
                let mut accum = NumberAccum::new();
                accum.push_int_digit(b - b'0');
                self.push_scratch_byte(false, b)?;
                *pos += 1;
                self.token = TokenState::Number {
                    accum,
                    state: NumState::IntDigits { leading_zero: b == b'0', digit_count: 1 },
                };
                Ok(())
            }
            _ => Err(self.err(ErrorCode::IllegalChar)),
        }
    }

    fn resume_literal_inline(
        &mut self,
        bytes: &[u8],
        pos: &mut usize,
        handler: &mut dyn Handler,
    ) -> Result<(), ParseError> {
        self.resume_token(bytes, pos, handler).map(|_| ())
    }

    fn resume_token(
        &mut self,
        bytes: &[u8],
        pos: &mut usize,
        handler: &mut dyn Handler,
    ) -> Result<bool, ParseError> {
        match core::mem::replace(&mut self.token, TokenState::None) {
            TokenState::None => Ok(true),
            TokenState::Literal { lit, mut matched } => {
                let done = self.resume_literal(lit, &mut matched, bytes, pos, handler)?;
                if !done {
                    self.token = TokenState::Literal { lit, matched };
                }
                Ok(done)
            }
            TokenState::Str { is_key, mut state, mut reported_len } => {
                let done = self.resume_string(is_key, &mut state, &mut reported_len, bytes, pos, handler)?;
                if !done {
                    self.token = TokenState::Str { is_key, state, reported_len };
                }
                Ok(done)
            }
            TokenState::Number { mut accum, mut state } => {
                let done = self.resume_number(&mut accum, &mut state, bytes, pos, handler)?;
                if !done {
                    self.token = TokenState::Number { accum, state };
                }
                Ok(done)
            }
            TokenState::Comment { kind, mut prev_star } => {
                let done = self.resume_comment(kind, &mut prev_star, bytes, pos)?;
                if done {
                    self.finish_comment(handler)?;
                } else {
                    self.token = TokenState::Comment { kind, prev_star };
                }
                Ok(done)
            }
        }
    }

    fn resume_literal(
        &mut self,
        lit: LiteralKind,
        matched: &mut usize,
        bytes: &[u8],
        pos: &mut usize,
        handler: &mut dyn Handler,
    ) -> Result<bool, ParseError> {
        let full: &[u8] = match lit {
            LiteralKind::True => b"true",
            LiteralKind::False => b"false",
            LiteralKind::Null => b"null",
        };
        while *matched < full.len() {
            if *pos >= bytes.len() {
                return Ok(false);
            }
            self.cursor_abs = self.base_offset + *pos;
            let b = bytes[*pos];
            if b != full[*matched] {
                let code = match lit {
                    LiteralKind::True => ErrorCode::ExpectedTrue,
                    LiteralKind::False => ErrorCode::ExpectedFalse,
                    LiteralKind::Null => ErrorCode::ExpectedNull,
                };
                return Err(self.err(code));
            }
            *matched += 1;
            *pos += 1;
        }
        self.token = TokenState::None;
        let ok = match lit {
            LiteralKind::True => handler.on_bool(true),
            LiteralKind::False => handler.on_bool(false),
            LiteralKind::Null => handler.on_null(),
        };
        if !ok {
            return Err(self.err(ErrorCode::HandlerRejected));
        }
        self.after_value(handler)?;
        Ok(true)
    }

    fn resume_string(
        &mut self,
        is_key: bool,
        state: &mut StrState,
        reported_len: &mut usize,
        bytes: &[u8],
        pos: &mut usize,
        handler: &mut dyn Handler,
    ) -> Result<bool, ParseError> {
        loop {
            match state {
                StrState::Normal => {
                    while *pos < bytes.len() {
                        self.cursor_abs = self.base_offset + *pos;
                        let b = bytes[*pos];
                        if b == b'"' {
                            *pos += 1;
                            self.finish_string(is_key, reported_len, handler)?;
                            return Ok(true);
                        }
                        if b == b'\\' {
                            *pos += 1;
                            *state = StrState::Escape;
                            break;
                        }
                        if b < 0x20 {
                            return Err(self.err(ErrorCode::IllegalControlChar));
                        }
                        self.push_scratch_byte(is_key, b)?;
                        *pos += 1;
                    }
                    if matches!(state, StrState::Normal) {
                        self.emit_string_part(is_key, reported_len, handler)?;
                        return Ok(false);
                    }
                }
                StrState::Escape => {
                    if *pos >= bytes.len() {
                        self.emit_string_part(is_key, reported_len, handler)?;
                        return Ok(false);
                    }
                    self.cursor_abs = self.base_offset + *pos;
                    let b = bytes[*pos];
                    *pos += 1;
                    match b {
                        b'"' => {
                            self.push_scratch_byte(is_key, b'"')?;
                            *state = StrState::Normal;
                        }
                        b'\\' => {
                            self.push_scratch_byte(is_key, b'\\')?;
                            *state = StrState::Normal;
                        }
                        b'/' => {
                            self.push_scratch_byte(is_key, b'/')?;
                            *state = StrState::Normal;
                        }
                        b'b' => {
                            self.push_scratch_byte(is_key, 0x08)?;
                            *state = StrState::Normal;
                        }
                        b'f' => {
                            self.push_scratch_byte(is_key, 0x0C)?;
                            *state = StrState::Normal;
                        }
                        b'n' => {
                            self.push_scratch_byte(is_key, 0x0A)?;
                            *state = StrState::Normal;
                        }
                        b'r' => {
                            self.push_scratch_byte(is_key, 0x0D)?;
                            *state = StrState::Normal;
                        }
                        b't' => {
                            self.push_scratch_byte(is_key, 0x09)?;
                            *state = StrState::Normal;
                        }
                        b'u' => {
                            *state = StrState::UnicodeEscape { nibble_idx: 0, value: 0, pending_high: None };
                        }
                        _ => return Err(self.err(ErrorCode::IllegalEscapeChar)),
                    }
                }
                StrState::UnicodeEscape { nibble_idx, value, pending_high } => {
                    while *nibble_idx < 4 {
                        if *pos >= bytes.len() {
                            self.emit_string_part(is_key, reported_len, handler)?;
                            return Ok(false);
                        }
                        self.cursor_abs = self.base_offset + *pos;
                        let b = bytes[*pos];
                        let Some(nib) = hex_val(b) else {
                            return Err(self.err(ErrorCode::ExpectedHexDigit));
                        };
                        *value = (*value << 4) | u16::from(nib);
                        *nibble_idx += 1;
                        *pos += 1;
                    }
                    let code = *value;
                    match pending_high.take() {
                        Some(high) => {
                            if (0xDC00..=0xDFFF).contains(&code) {
                                let c = decode_surrogate_pair(high, code);
                                self.push_scratch_char(is_key, c)?;
                                *state = StrState::Normal;
                            } else if self.options.allow_invalid_utf16 {
                                self.push_scratch_char(is_key, '\u{FFFD}')?;
                                self.push_scratch_char(is_key, '\u{FFFD}')?;
                                *state = StrState::Normal;
                            } else {
                                return Err(self.err(ErrorCode::IllegalLeadingSurrogate));
                            }
                        }
                        None => {
                            if (0xD800..=0xDBFF).contains(&code) {
                                *state = StrState::ExpectLowBackslash { high: code };
                            } else if (0xDC00..=0xDFFF).contains(&code) {
                                if self.options.allow_invalid_utf16 {
                                    self.push_scratch_char(is_key, '\u{FFFD}')?;
                                    *state = StrState::Normal;
                                } else {
                                    return Err(self.err(ErrorCode::IllegalTrailingSurrogate));
                                }
                            } else {
                                let c = char::from_u32(u32::from(code)).unwrap_or('\u{FFFD}');
                                self.push_scratch_char(is_key, c)?;
                                *state = StrState::Normal;
                            }
                        }
                    }
                }
                StrState::ExpectLowBackslash { high } => {
                    if *pos >= bytes.len() {
                        self.emit_string_part(is_key, reported_len, handler)?;
                        return Ok(false);
                    }
                    self.cursor_abs = self.base_offset + *pos;
                    let b = bytes[*pos];
                    if b == b'\\' {
                        *pos += 1;
                        *state = StrState::ExpectLowU { high: *high };
                    } else if self.options.allow_invalid_utf16 {
                        self.push_scratch_char(is_key, '\u{FFFD}')?;
                        *state = StrState::Normal;
                    } else {
                        return Err(self.err(ErrorCode::IllegalLeadingSurrogate));
                    }
                }
                StrState::ExpectLowU { high } => {
                    if *pos >= bytes.len() {
                        self.emit_string_part(is_key, reported_len, handler)?;
                        return Ok(false);
                    }
                    self.cursor_abs = self.base_offset + *pos;
                    let b = bytes[*pos];
                    if b == b'u' {
                        *pos += 1;
                        *state = StrState::UnicodeEscape { nibble_idx: 0, value: 0, pending_high: Some(*high) };
                    } else if self.options.allow_invalid_utf16 {
                        self.push_scratch_char(is_key, '\u{FFFD}')?;
                        *state = StrState::Normal;
                    } else {
                        return Err(self.err(ErrorCode::ExpectedUtf16Escape));
                    }
                }
            }
        }
    }

    fn emit_string_part(
        &mut self,
        is_key: bool,
        reported_len: &mut usize,
        handler: &mut dyn Handler,
    ) -> Result<(), ParseError> {
        let buf = self.stack.bytes();
        if buf.len() <= *reported_len {
            return Ok(());
        }
        let candidate = &buf[*reported_len..];
        let safe_len = if self.options.allow_invalid_utf8 {
            candidate.len()
        } else {
            match core::str::from_utf8(candidate) {
                Ok(_) => candidate.len(),
                Err(e) => {
                    if e.error_len().is_some() {
                        return Err(self.err(ErrorCode::IllegalChar));
                    }
                    e.valid_up_to()
                }
            }
        };
        if safe_len == 0 {
            return Ok(());
        }
        let chunk = &self.stack.bytes()[*reported_len..*reported_len + safe_len];
        let total_so_far = *reported_len + safe_len;
        let ok = if is_key {
            handler.on_key_part(chunk, total_so_far)
        } else {
            handler.on_string_part(chunk, total_so_far)
        };
        if !ok {
            return Err(self.err(ErrorCode::HandlerRejected));
        }
        *reported_len += safe_len;
        Ok(())
    }

    fn finish_string(
        &mut self,
        is_key: bool,
        reported_len: &mut usize,
        handler: &mut dyn Handler,
    ) -> Result<(), ParseError> {
        if !self.options.allow_invalid_utf8 {
            let remaining = &self.stack.bytes()[*reported_len..];
            if core::str::from_utf8(remaining).is_err() {
                return Err(self.err(ErrorCode::IllegalChar));
            }
        }
        let buf = self.stack.take_bytes();
        let total = buf.len();
        let chunk = &buf[*reported_len..];
        let ok = if is_key { handler.on_key(chunk, total) } else { handler.on_string(chunk, total) };
        if !ok {
            return Err(self.err(ErrorCode::HandlerRejected));
        }
        self.token = TokenState::None;
        if is_key {
            let mut f = self.top_frame();
            f.sub_state = SubState::ExpectColon;
            self.set_top_frame(f);
            Ok(())
        } else {
            self.after_value(handler)
        }
    }

    fn resume_number(
        &mut self,
        accum: &mut NumberAccum,
        state: &mut NumState,
        bytes: &[u8],
        pos: &mut usize,
        handler: &mut dyn Handler,
    ) -> Result<bool, ParseError> {
        loop {
            if *pos >= bytes.len() {
                return Ok(false);
            }
            self.cursor_abs = self.base_offset + *pos;
            let b = bytes[*pos];
            match state {
                NumState::Start => {
                    if b.is_ascii_digit() {
                        self.push_scratch_byte(false, b)?;
                        accum.push_int_digit(b - b'0');
                        *pos += 1;
                        *state = NumState::IntDigits { leading_zero: b == b'0', digit_count: 1 };
                    } else {
                        return Err(self.err(ErrorCode::ExpectedMantissa));
                    }
                }
                NumState::IntDigits { leading_zero, digit_count } => {
                    if b.is_ascii_digit() {
                        if *leading_zero && *digit_count == 1 {
                            return Err(self.err(ErrorCode::IllegalExtraDigits));
                        }
                        self.push_scratch_byte(false, b)?;
                        accum.push_int_digit(b - b'0');
                        *digit_count += 1;
                        *pos += 1;
                    } else if b == b'.' {
                        self.push_scratch_byte(false, b)?;
                        accum.begin_fraction();
                        *pos += 1;
                        *state = NumState::FracStart;
                    } else if b == b'e' || b == b'E' {
                        self.push_scratch_byte(false, b)?;
                        accum.begin_exponent();
                        *pos += 1;
                        *state = NumState::ExpStart;
                    } else if is_number_terminator(b) {
                        let accum = *accum;
                        self.finish_number(&accum, handler)?;
                        return Ok(true);
                    } else {
                        return Err(self.err(ErrorCode::IllegalChar));
                    }
                }
                NumState::FracStart => {
                    if b.is_ascii_digit() {
                        self.push_scratch_byte(false, b)?;
                        accum.push_frac_digit(b - b'0');
                        *pos += 1;
                        *state = NumState::FracDigits;
                    } else {
                        return Err(self.err(ErrorCode::ExpectedFraction));
                    }
                }
                NumState::FracDigits => {
                    if b.is_ascii_digit() {
                        self.push_scratch_byte(false, b)?;
                        accum.push_frac_digit(b - b'0');
                        *pos += 1;
                    } else if b == b'e' || b == b'E' {
                        self.push_scratch_byte(false, b)?;
                        accum.begin_exponent();
                        *pos += 1;
                        *state = NumState::ExpStart;
                    } else if is_number_terminator(b) {
                        let accum = *accum;
                        self.finish_number(&accum, handler)?;
                        return Ok(true);
                    } else {
                        return Err(self.err(ErrorCode::IllegalChar));
                    }
                }
                NumState::ExpStart => {
                    if b == b'+' || b == b'-' {
                        self.push_scratch_byte(false, b)?;
                        *pos += 1;
                        *state = NumState::ExpSignSeen;
                    } else if b.is_ascii_digit() {
                        self.push_scratch_byte(false, b)?;
                        if !accum.push_exp_digit(b - b'0') {
                            return Err(self.err(ErrorCode::ExponentOverflow));
                        }
                        *pos += 1;
                        *state = NumState::ExpDigits;
                    } else {
                        return Err(self.err(ErrorCode::ExpectedExponent));
                    }
                }
                NumState::ExpSignSeen => {
                    if b.is_ascii_digit() {
                        self.push_scratch_byte(false, b)?;
                        if !accum.push_exp_digit(b - b'0') {
                            return Err(self.err(ErrorCode::ExponentOverflow));
                        }
                        *pos += 1;
                        *state = NumState::ExpDigits;
                    } else {
                        return Err(self.err(ErrorCode::ExpectedExponent));
                    }
                }
                NumState::ExpDigits => {
                    if b.is_ascii_digit() {
                        self.push_scratch_byte(false, b)?;
                        if !accum.push_exp_digit(b - b'0') {
                            return Err(self.err(ErrorCode::ExponentOverflow));
                        }
                        *pos += 1;
                    } else if is_number_terminator(b) {
                        let accum = *accum;
                        self.finish_number(&accum, handler)?;
                        return Ok(true);
                    } else {
                        return Err(self.err(ErrorCode::IllegalChar));
                    }
                }
            }
        }
    }

    fn finish_number(&mut self, accum: &NumberAccum, handler: &mut dyn Handler) -> Result<(), ParseError> {
        let raw = self.stack.take_bytes();
        self.token = TokenState::None;
        let ok = match self.options.numbers {
            DecodeMode::RawText => handler.on_number_text(&raw),
            DecodeMode::Fast | DecodeMode::Precise => {
                let text = core::str::from_utf8(&raw).expect("number literal bytes are always ASCII");
                match accum.classify(text) {
                    Classified::Int64(v) => handler.on_int64(v, &raw),
                    Classified::Uint64(v) => handler.on_uint64(v, &raw),
                    Classified::Double(v) if v.is_finite() => handler.on_double(v, &raw),
                    // A magnitude outside any finite f64's range (e.g. `1e400`)
                    // parses to +/-infinity; strict JSON has no way to spell
                    // that, so it's the same error as overflowing the
                    // exponent accumulator itself.
                    Classified::Double(_) => return Err(self.err(ErrorCode::ExponentOverflow)),
                }
            }
        };
        if !ok {
            return Err(self.err(ErrorCode::HandlerRejected));
        }
        self.after_value(handler)
    }

    fn begin_comment(&mut self, bytes: &[u8], pos: &mut usize) -> Result<(), ParseError> {
        self.cursor_abs = self.base_offset + *pos;
        let kind = match bytes[*pos + 1] {
            b'/' => CommentKind::Line,
            b'*' => CommentKind::Block,
            _ => return Err(self.err(ErrorCode::IllegalChar)),
        };
        *pos += 2;
        self.token = TokenState::Comment { kind, prev_star: false };
        Ok(())
    }

    /// Advances a comment token. Returns `Ok(true)` once the terminator
    /// was found (caller still owes `finish_comment`), `Ok(false)` if
    /// input ran out.
    fn resume_comment(
        &mut self,
        kind: CommentKind,
        prev_star: &mut bool,
        bytes: &[u8],
        pos: &mut usize,
    ) -> Result<bool, ParseError> {
        match kind {
            CommentKind::Line => {
                while *pos < bytes.len() {
                    let b = bytes[*pos];
                    if b == b'\n' {
                        return Ok(true);
                    }
                    self.stack.push_byte(b);
                    *pos += 1;
                }
                Ok(false)
            }
            CommentKind::Block => {
                while *pos < bytes.len() {
                    let b = bytes[*pos];
                    if *prev_star && b == b'/' {
                        *pos += 1;
                        let trimmed = self.stack.byte_len().saturating_sub(1);
                        self.stack.truncate_bytes(trimmed);
                        return Ok(true);
                    }
                    *prev_star = b == b'*';
                    self.stack.push_byte(b);
                    *pos += 1;
                }
                Ok(false)
            }
        }
    }

    fn finish_comment(&mut self, handler: &mut dyn Handler) -> Result<(), ParseError> {
        let text = self.stack.take_bytes();
        self.token = TokenState::None;
        if !handler.on_comment(&text) {
            return Err(self.err(ErrorCode::HandlerRejected));
        }
        Ok(())
    }

    fn after_value(&mut self, handler: &mut dyn Handler) -> Result<(), ParseError> {
        if self.depth == 0 {
            self.phase = DocPhase::AfterValue;
            if !handler.on_document_end() {
                return Err(self.err(ErrorCode::HandlerRejected));
            }
            return Ok(());
        }
        let mut f = self.top_frame();
        if f.count as usize >= MAX_LEN {
            let code = if f.kind == ContainerKind::Array {
                ErrorCode::ArrayTooLarge
            } else {
                ErrorCode::ObjectTooLarge
            };
            return Err(self.err(code));
        }
        f.count += 1;
        f.sub_state = SubState::ExpectCommaOrClose;
        self.set_top_frame(f);
        Ok(())
    }

    fn close_container(&mut self, handler: &mut dyn Handler) -> Result<(), ParseError> {
        let frame = self.pop_frame();
        let ok = match frame.kind {
            ContainerKind::Array => handler.on_array_end(frame.count as usize),
            ContainerKind::Object => handler.on_object_end(frame.count as usize),
        };
        if !ok {
            return Err(self.err(ErrorCode::HandlerRejected));
        }
        self.after_value(handler)
    }

    fn push_frame(&mut self, kind: ContainerKind) -> Result<(), ParseError> {
        if self.depth >= self.options.max_depth {
            return Err(self.err(ErrorCode::TooDeep));
        }
        self.stack.push(Frame { kind, count: 0, sub_state: SubState::ExpectFirstOrClose });
        self.depth += 1;
        Ok(())
    }

    fn pop_frame(&mut self) -> Frame {
        self.depth -= 1;
        self.stack.pop::<Frame>()
    }

    fn top_frame(&self) -> Frame {
        self.stack.peek::<Frame>()
    }

    fn set_top_frame(&mut self, f: Frame) {
        self.stack.pop::<Frame>();
        self.stack.push(f);
    }

    fn push_scratch_byte(&mut self, is_key: bool, b: u8) -> Result<(), ParseError> {
        if self.stack.byte_len() >= MAX_LEN {
            let code = if is_key { ErrorCode::KeyTooLarge } else { ErrorCode::StringTooLarge };
            return Err(self.err(code));
        }
        self.stack.push_byte(b);
        Ok(())
    }

    fn push_scratch_char(&mut self, is_key: bool, c: char) -> Result<(), ParseError> {
        let mut buf = [0u8; 4];
        let s = c.encode_utf8(&mut buf);
        for &b in s.as_bytes() {
            self.push_scratch_byte(is_key, b)?;
        }
        Ok(())
    }

    fn finalize(&mut self, handler: &mut dyn Handler) -> Result<(), ParseError> {
        if let TokenState::Number { accum, .. } = &self.token {
            let accum = *accum;
            self.finish_number(&accum, handler)?;
        } else if matches!(&self.token, TokenState::Comment { kind: CommentKind::Line, .. }) {
            self.finish_comment(handler)?;
        }
        if !matches!(self.token, TokenState::None) {
            return Err(self.err(ErrorCode::Incomplete));
        }
        if self.depth != 0 || self.phase != DocPhase::AfterValue {
            return Err(self.err(ErrorCode::Incomplete));
        }
        Ok(())
    }
}

fn close_byte(kind: ContainerKind) -> u8 {
    match kind {
        ContainerKind::Array => b']',
        ContainerKind::Object => b'}',
    }
}

fn is_ws(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

fn is_number_terminator(b: u8) -> bool {
    is_ws(b) || matches!(b, b',' | b']' | b'}' | b'/')
}

fn hex_val(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

fn decode_surrogate_pair(high: u16, low: u16) -> char {
    let c = 0x10000 + (u32::from(high) - 0xD800) * 0x400 + (u32::from(low) - 0xDC00);
    char::from_u32(c).unwrap_or('\u{FFFD}')
}
