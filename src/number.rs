//! Numeric literal accumulation and classification.
//!
//! The SAX parser feeds digits to a [`NumberAccum`] one at a time as it
//! scans a number token, so the accumulator must tolerate arbitrarily
//! long literals without itself allocating. Once the token ends, the
//! parser classifies the literal into exactly one of `Int64` / `Uint64`
//! / `Double` by asking the accumulator, passing along the
//! original literal text.
//!
//! The accumulator always tries to fold digits into a 64-bit mantissa;
//! once that overflows, or once a fraction/exponent is present, the
//! value is double territory. Rather than reconstructing a double from
//! `mantissa * 10^exponent` with tracked precision loss, doubles are
//! classified by handing the literal's exact text to
//! [`str::parse::<f64>`], which is itself a correctly-rounded decimal
//! parser (see `DESIGN.md`).

/// The outcome of classifying a complete numeric literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classified {
    /// Fits a signed 64-bit integer exactly.
    Int64(i64),
    /// Fits an unsigned 64-bit integer but not a signed one.
    Uint64(u64),
    /// Has a fraction or exponent, or overflows the 64-bit integer kinds.
    Double(f64),
}

/// Accumulates the digits of one numeric literal as the parser scans it.
#[derive(Debug, Default, Clone, Copy)]
pub struct NumberAccum {
    neg: bool,
    mantissa: u64,
    overflowed: bool,
    has_fraction: bool,
    has_exponent: bool,
    exp_value: i32,
    exp_overflowed: bool,
}

impl NumberAccum {
    /// A fresh accumulator for a new numeric literal.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the literal's leading `-`.
    pub fn set_negative(&mut self) {
        self.neg = true;
    }

    /// `true` if [`set_negative`](Self::set_negative) was called.
    #[must_use]
    pub fn is_negative(&self) -> bool {
        self.neg
    }

    /// Folds one integer-part digit (`0`..=`9`) into the mantissa.
    pub fn push_int_digit(&mut self, d: u8) {
        self.fold_digit(d);
    }

    /// Marks that a `.` was seen (a fraction part follows).
    pub fn begin_fraction(&mut self) {
        self.has_fraction = true;
    }

    /// Folds one fraction-part digit into the mantissa (purely for the
    /// fast-path check below; classification always re-parses exact text
    /// once a fraction is present).
    pub fn push_frac_digit(&mut self, d: u8) {
        self.fold_digit(d);
    }

    fn fold_digit(&mut self, d: u8) {
        if self.overflowed {
            return;
        }
        match self.mantissa.checked_mul(10).and_then(|m| m.checked_add(u64::from(d))) {
            Some(m) => self.mantissa = m,
            None => self.overflowed = true,
        }
    }

    /// Marks that an `e`/`E` was seen (an exponent part follows).
    pub fn begin_exponent(&mut self) {
        self.has_exponent = true;
    }

    /// Folds one exponent digit. Returns `false` once the exponent
    /// magnitude overflows the `i32` accumulator itself, corresponding to
    /// the `exponent_overflow` error code; the parser should fail the
    /// document when this returns `false`. A magnitude that fits `i32` but
    /// still can't be represented by any finite `f64` (e.g. `1e400`) isn't
    /// caught here — the parser rejects that case separately, by checking
    /// `classify`'s `Double` result for finiteness.
    pub fn push_exp_digit(&mut self, d: u8) -> bool {
        match self.exp_value.checked_mul(10).and_then(|e| e.checked_add(i32::from(d))) {
            Some(e) if e <= 9999 => {
                self.exp_value = e;
                true
            }
            _ => {
                self.exp_overflowed = true;
                false
            }
        }
    }

    /// `true` once [`push_exp_digit`](Self::push_exp_digit) has reported
    /// overflow.
    #[must_use]
    pub fn exponent_overflowed(&self) -> bool {
        self.exp_overflowed
    }

    /// Classifies the accumulated literal:
    /// - no fraction, no exponent, fits `i64`/`u64` exactly → `Int64`/`Uint64`;
    /// - otherwise → `Double`, parsed from the literal's exact `text`.
    ///
    /// # Panics
    ///
    /// Panics if `text` isn't a syntactically valid JSON number, which
    /// cannot happen when called from the SAX parser (it only classifies
    /// text it has already scanned as a valid number token).
    #[must_use]
    pub fn classify(&self, text: &str) -> Classified {
        if !self.has_fraction && !self.has_exponent && !self.overflowed {
            if self.neg {
                if let Some(i) = negate_mantissa(self.mantissa) {
                    return Classified::Int64(i);
                }
            } else if self.mantissa <= i64::MAX as u64 {
                return Classified::Int64(self.mantissa as i64);
            } else {
                return Classified::Uint64(self.mantissa);
            }
        }
        Classified::Double(
            text.parse::<f64>()
                .expect("parser only classifies syntactically valid numeric literals"),
        )
    }
}

fn negate_mantissa(mantissa: u64) -> Option<i64> {
    if mantissa <= i64::MAX as u64 {
        Some(-(mantissa as i64))
    } else if mantissa == i64::MIN.unsigned_abs() {
        Some(i64::MIN)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn accumulate(digits: &str) -> NumberAccum {
        let mut acc = NumberAccum::new();
        for d in digits.bytes() {
            acc.push_int_digit(d - b'0');
        }
        acc
    }

    #[test]
    fn small_non_negative_integer_is_int64() {
        let acc = accumulate("123");
        assert_eq!(acc.classify("123"), Classified::Int64(123));
    }

    #[test]
    fn negative_integer_is_int64() {
        let mut acc = accumulate("9223372036854775808");
        acc.set_negative();
        assert_eq!(acc.classify("-9223372036854775808"), Classified::Int64(i64::MIN));
    }

    #[test]
    fn non_negative_overflowing_i64_is_uint64() {
        let acc = accumulate("9223372036854775808");
        assert_eq!(acc.classify("9223372036854775808"), Classified::Uint64(9_223_372_036_854_775_808));
    }

    #[test]
    fn overflowing_uint64_is_double() {
        let acc = accumulate("99999999999999999999");
        assert_eq!(
            acc.classify("99999999999999999999"),
            Classified::Double(99_999_999_999_999_999_999.0_f64)
        );
    }

    #[test]
    fn fraction_forces_double() {
        let mut acc = NumberAccum::new();
        acc.push_int_digit(1);
        acc.begin_fraction();
        acc.push_frac_digit(5);
        assert_eq!(acc.classify("1.5"), Classified::Double(1.5));
    }

    #[test]
    fn exponent_forces_double() {
        let mut acc = NumberAccum::new();
        acc.push_int_digit(1);
        acc.begin_exponent();
        acc.push_exp_digit(2);
        assert_eq!(acc.classify("1e2"), Classified::Double(100.0));
    }
}
