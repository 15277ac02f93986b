//! Parser configuration.

/// How the parser should classify and report numeric literals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Classify numbers as `Int64`/`Uint64`/`Double` and report the
    /// chosen variant via `Handler::on_int64`/`on_uint64`/`on_double`.
    Fast,
    /// Like `Fast`, but doubles are always reparsed from the literal's
    /// exact text rather than accumulated incrementally (the accumulator
    /// already does this; `Precise` exists so callers can name the
    /// stricter mode explicitly without the implementation differing).
    Precise,
    /// Never classify numbers; report only the raw literal text via
    /// `Handler::on_number_text`, leaving conversion to the caller.
    RawText,
}

impl Default for DecodeMode {
    fn default() -> Self {
        Self::Fast
    }
}

/// Parser behavior knobs. All default to strict RFC 8259 JSON.
#[derive(Debug, Clone, Copy)]
pub struct ParserOptions {
    /// Accept `//` and `/* */` comments outside of strings.
    pub allow_comments: bool,
    /// Accept a trailing `,` before `]` or `}`.
    pub allow_trailing_commas: bool,
    /// Accept byte sequences inside strings that aren't valid UTF-8,
    /// passing them through unvalidated instead of erroring.
    pub allow_invalid_utf8: bool,
    /// Accept unpaired UTF-16 surrogates in `\u` escapes instead of
    /// erroring, substituting U+FFFD.
    pub allow_invalid_utf16: bool,
    /// How numeric literals are classified and reported.
    pub numbers: DecodeMode,
    /// Maximum array/object nesting depth. `0` rejects any container.
    pub max_depth: usize,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            allow_comments: false,
            allow_trailing_commas: false,
            allow_invalid_utf8: false,
            allow_invalid_utf16: false,
            numbers: DecodeMode::default(),
            max_depth: 64,
        }
    }
}
