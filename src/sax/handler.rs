//! The callback interface the SAX parser drives as it scans.

/// Receives one callback per token (or per chunk of a token, for strings
/// split across `write_some` calls) as the parser advances.
///
/// Every method defaults to a no-op that accepts the token (returns
/// `true`); override only the ones a given handler cares about. Returning
/// `false` aborts parsing with [`crate::sax::ErrorCode::HandlerRejected`].
#[allow(unused_variables)]
pub trait Handler {
    /// Fired once, before the first token of the document.
    fn on_document_begin(&mut self) -> bool {
        true
    }

    /// Fired once, after the top-level value is fully parsed.
    fn on_document_end(&mut self) -> bool {
        true
    }

    /// An object's `{` was scanned.
    fn on_object_begin(&mut self) -> bool {
        true
    }

    /// An object's `}` was scanned. `size` is the number of key/value
    /// pairs the object contained.
    fn on_object_end(&mut self, size: usize) -> bool {
        true
    }

    /// An array's `[` was scanned.
    fn on_array_begin(&mut self) -> bool {
        true
    }

    /// An array's `]` was scanned. `size` is the number of elements the
    /// array contained.
    fn on_array_end(&mut self, size: usize) -> bool {
        true
    }

    /// A chunk of an object key's raw bytes (already unescaped), with
    /// more of the same key still to come. `total_so_far` is the number of
    /// key bytes reported across this and every prior `on_key_part` call
    /// for the key currently being scanned.
    fn on_key_part(&mut self, chunk: &[u8], total_so_far: usize) -> bool {
        true
    }

    /// The final chunk of an object key's raw bytes. `total` is the key's
    /// full length in bytes.
    fn on_key(&mut self, chunk: &[u8], total: usize) -> bool {
        true
    }

    /// A chunk of a string value's raw bytes, with more of the same
    /// string still to come. `total_so_far` is the number of bytes
    /// reported across this and every prior `on_string_part` call for the
    /// string currently being scanned.
    fn on_string_part(&mut self, chunk: &[u8], total_so_far: usize) -> bool {
        true
    }

    /// The final chunk of a string value's raw bytes. `total` is the
    /// string's full length in bytes.
    fn on_string(&mut self, chunk: &[u8], total: usize) -> bool {
        true
    }

    /// A complete numeric literal classified as a signed 64-bit integer.
    fn on_int64(&mut self, value: i64, text: &[u8]) -> bool {
        true
    }

    /// A complete numeric literal classified as an unsigned 64-bit
    /// integer (too large for `i64`, still exact).
    fn on_uint64(&mut self, value: u64, text: &[u8]) -> bool {
        true
    }

    /// A complete numeric literal classified as a double (has a
    /// fraction/exponent, or overflows the 64-bit integer kinds).
    fn on_double(&mut self, value: f64, text: &[u8]) -> bool {
        true
    }

    /// A complete numeric literal's raw text, reported instead of
    /// `on_int64`/`on_uint64`/`on_double` when `numbers` is
    /// `DecodeMode::RawText`.
    fn on_number_text(&mut self, text: &[u8]) -> bool {
        true
    }

    /// `true` or `false`.
    fn on_bool(&mut self, value: bool) -> bool {
        true
    }

    /// `null`.
    fn on_null(&mut self) -> bool {
        true
    }

    /// A complete `//` or `/* */` comment's contents, only fired when
    /// `allow_comments` is set.
    fn on_comment(&mut self, text: &[u8]) -> bool {
        true
    }
}
