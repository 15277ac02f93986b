//! Parse error codes and the error type the SAX parser returns.

use thiserror::Error;

/// A specific parse failure reason. Every `write_some`/`finish` call that
/// fails returns exactly one of these, alongside the byte offset (within
/// the whole document, not just the current chunk) where it was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ErrorCode {
    /// A byte didn't match the JSON grammar at the current position.
    #[error("syntax error")]
    Syntax,
    /// Non-whitespace, non-comment bytes followed a complete top-level
    /// value.
    #[error("unexpected extra data after the document")]
    ExtraData,
    /// `more=false` but the document wasn't structurally complete.
    #[error("incomplete document")]
    Incomplete,
    /// Nesting exceeded `max_depth`.
    #[error("maximum nesting depth exceeded")]
    TooDeep,
    /// A byte is not valid anywhere in the current context.
    #[error("illegal character")]
    IllegalChar,
    /// An unescaped control character (`< 0x20`) appeared inside a string.
    #[error("illegal control character in string")]
    IllegalControlChar,
    /// `\` was followed by a byte that isn't a recognised escape.
    #[error("illegal escape character")]
    IllegalEscapeChar,
    /// A number had a leading zero followed by further digits (`012`).
    #[error("illegal extra digits in number")]
    IllegalExtraDigits,
    /// A `\uD800`..`\uDBFF` high surrogate wasn't followed by a valid low
    /// surrogate.
    #[error("illegal leading (high) surrogate")]
    IllegalLeadingSurrogate,
    /// A `\uDC00`..`\uDFFF` low surrogate appeared without a preceding
    /// high surrogate.
    #[error("illegal trailing (low) surrogate")]
    IllegalTrailingSurrogate,
    /// Expected `,`.
    #[error("expected ','")]
    ExpectedComma,
    /// Expected `:`.
    #[error("expected ':'")]
    ExpectedColon,
    /// Expected an opening `"`.
    #[error("expected '\"'")]
    ExpectedQuotes,
    /// Expected a hex digit in a `\u` escape.
    #[error("expected a hex digit")]
    ExpectedHexDigit,
    /// Expected a `\u` escape continuing a surrogate pair.
    #[error("expected a \\u escape")]
    ExpectedUtf16Escape,
    /// Expected at least one digit in a number's integer part.
    #[error("expected a digit")]
    ExpectedMantissa,
    /// Expected at least one digit after `.`.
    #[error("expected a digit in the fraction part")]
    ExpectedFraction,
    /// Expected at least one digit in the exponent part.
    #[error("expected a digit in the exponent part")]
    ExpectedExponent,
    /// `t` wasn't followed by `rue`.
    #[error("expected 'true'")]
    ExpectedTrue,
    /// `f` wasn't followed by `alse`.
    #[error("expected 'false'")]
    ExpectedFalse,
    /// `n` wasn't followed by `ull`.
    #[error("expected 'null'")]
    ExpectedNull,
    /// A number's mantissa overflowed internal accumulation (not fatal by
    /// itself, folded into `Double` classification, but reported when
    /// `numbers` is configured to reject it; see `ParserOptions`).
    #[error("mantissa overflow")]
    MantissaOverflow,
    /// A number's exponent magnitude is unrepresentable.
    #[error("exponent overflow")]
    ExponentOverflow,
    /// An object exceeded `2^31 - 2` entries.
    #[error("object too large")]
    ObjectTooLarge,
    /// An array exceeded `2^31 - 2` elements.
    #[error("array too large")]
    ArrayTooLarge,
    /// A key exceeded `2^31 - 2` bytes.
    #[error("key too large")]
    KeyTooLarge,
    /// A string exceeded `2^31 - 2` bytes.
    #[error("string too large")]
    StringTooLarge,
    /// `write_some`/`finish` was called without a preceding `reset`
    /// after a prior error.
    #[error("parser must be reset before reuse")]
    NeedStart,
    /// A handler callback returned `false` without the parser being able
    /// to attribute a more specific code.
    #[error("handler rejected the document")]
    HandlerRejected,
}

/// A parse failure: an [`ErrorCode`] plus the byte offset (from the start
/// of the document) where it was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{code} at byte offset {offset}")]
pub struct ParseError {
    /// The specific failure reason.
    pub code: ErrorCode,
    /// Byte offset from the start of the document.
    pub offset: usize,
}

impl ParseError {
    /// Builds a parse error at `offset`.
    #[must_use]
    pub fn new(code: ErrorCode, offset: usize) -> Self {
        Self { code, offset }
    }
}
