//! Allocation-free value rendering for response formatting.
//!
//! Each `from_*` call renders a single value into the formatter's scratch
//! area and returns the rendered bytes. The result borrows the scratch area,
//! so it has to be copied out (into the response ring) before the next
//! conversion.

/// Size of the scratch area.
///
/// Largest outputs: `-9223372036854775808` (20 bytes) and
/// `18446744073709549568.000000` (27 bytes).
pub const SCRATCH_SIZE: usize = 32;

/// Fractional digits produced by [`Formatter::from_double`].
pub const DOUBLE_PRECISION: usize = 6;

/// `10^DOUBLE_PRECISION`.
const DOUBLE_SCALE: u64 = 1_000_000;

/// Smallest magnitude whose integer part no longer fits a `u64` (2^64).
const U64_LIMIT: f64 = 18_446_744_073_709_551_616.0;

/// Conversion requested by a `%` directive in a format string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Conversion {
    /// `%%` - literal percent sign.
    Percent,
    /// `%c`
    Character,
    /// `%d`, `%i`
    SignedInt,
    /// `%u`
    UnsignedInt,
    /// `%ld`, `%li`
    LongSignedInt,
    /// `%lu`
    LongUnsignedInt,
    /// `%lld`, `%lli`
    LongLongSignedInt,
    /// `%llu`
    LongLongUnsignedInt,
    /// `%p` - rendered as an unsigned decimal address.
    Pointer,
    /// `%f`, `%lf`
    Double,
    /// `%s`
    String,
    /// No recognized conversion letter.
    Unknown,
}

impl Conversion {
    /// Whether this conversion consumes an argument.
    #[inline]
    #[must_use]
    pub const fn takes_argument(self) -> bool {
        !matches!(self, Self::Percent | Self::Unknown)
    }
}

/// Renders one value at a time into a fixed scratch buffer.
pub struct Formatter {
    scratch: [u8; SCRATCH_SIZE],
}

impl Formatter {
    /// Create a formatter with a zeroed scratch area.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            scratch: [0; SCRATCH_SIZE],
        }
    }

    /// Recognize the directive that follows a `%`.
    ///
    /// `format` starts just past the `%`. Returns the conversion and the
    /// number of bytes (modifiers plus letter) it occupies. An unrecognized
    /// directive yields `(Conversion::Unknown, 0)`.
    #[must_use]
    pub fn parse(format: &[u8]) -> (Conversion, usize) {
        let mut longs = 0;
        while longs < 2 && format.get(longs) == Some(&b'l') {
            longs += 1;
        }

        let Some(&letter) = format.get(longs) else {
            return (Conversion::Unknown, 0);
        };

        let conversion = match (longs, letter) {
            (0, b'%') => Conversion::Percent,
            (0, b'c') => Conversion::Character,
            (0, b'd' | b'i') => Conversion::SignedInt,
            (0, b'u') => Conversion::UnsignedInt,
            (1, b'd' | b'i') => Conversion::LongSignedInt,
            (1, b'u') => Conversion::LongUnsignedInt,
            (2, b'd' | b'i') => Conversion::LongLongSignedInt,
            (2, b'u') => Conversion::LongLongUnsignedInt,
            (0, b'p') => Conversion::Pointer,
            (0 | 1, b'f') => Conversion::Double,
            (0, b's') => Conversion::String,
            _ => return (Conversion::Unknown, 0),
        };

        (conversion, longs + 1)
    }

    /// Render a single character (UTF-8 encoded).
    pub fn from_character(&mut self, c: char) -> &[u8] {
        c.encode_utf8(&mut self.scratch).as_bytes()
    }

    /// Render a raw byte as-is, for `%c` given an integer.
    pub fn from_byte(&mut self, b: u8) -> &[u8] {
        self.scratch[0] = b;
        &self.scratch[..1]
    }

    /// Render a signed integer in decimal.
    pub fn from_signed_int(&mut self, value: i64) -> &[u8] {
        // unsigned_abs keeps i64::MIN representable
        let mut start = write_digits(&mut self.scratch, SCRATCH_SIZE, value.unsigned_abs());
        if value < 0 {
            start -= 1;
            self.scratch[start] = b'-';
        }
        &self.scratch[start..]
    }

    /// Render an unsigned integer in decimal.
    pub fn from_unsigned_int(&mut self, value: u64) -> &[u8] {
        let start = write_digits(&mut self.scratch, SCRATCH_SIZE, value);
        &self.scratch[start..]
    }

    /// Render a floating value with [`DOUBLE_PRECISION`] fractional digits.
    ///
    /// NaN and infinities render as `nan`, `inf` and `-inf`. Magnitudes whose
    /// integer part does not fit a `u64` use the `d.dddddde+NN` form.
    pub fn from_double(&mut self, value: f64) -> &[u8] {
        if value.is_nan() {
            return self.copy(b"nan");
        }
        if value.is_infinite() {
            return self.copy(if value < 0.0 { b"-inf" } else { b"inf" });
        }

        let negative = value < 0.0;
        let magnitude = if negative { -value } else { value };
        if magnitude >= U64_LIMIT {
            return self.from_scientific(negative, magnitude);
        }

        let mut whole = magnitude as u64;
        let mut fraction = ((magnitude - whole as f64) * DOUBLE_SCALE as f64 + 0.5) as u64;
        if fraction >= DOUBLE_SCALE {
            whole += 1;
            fraction -= DOUBLE_SCALE;
        }

        let mut start = write_fraction(&mut self.scratch, SCRATCH_SIZE, fraction);
        start -= 1;
        self.scratch[start] = b'.';
        start = write_digits(&mut self.scratch, start, whole);
        if negative {
            start -= 1;
            self.scratch[start] = b'-';
        }
        &self.scratch[start..]
    }

    /// Pass a string through unchanged, up to the first NUL if any.
    #[must_use]
    pub fn from_string(value: &str) -> &[u8] {
        let bytes = value.as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        &bytes[..end]
    }

    fn from_scientific(&mut self, negative: bool, mut magnitude: f64) -> &[u8] {
        let mut exponent: u64 = 0;
        while magnitude >= 10.0 {
            magnitude /= 10.0;
            exponent += 1;
        }

        let mut mantissa = (magnitude * DOUBLE_SCALE as f64 + 0.5) as u64;
        if mantissa >= 10 * DOUBLE_SCALE {
            mantissa /= 10;
            exponent += 1;
        }

        let mut start = write_digits(&mut self.scratch, SCRATCH_SIZE, exponent);
        start -= 2;
        self.scratch[start..start + 2].copy_from_slice(b"e+");
        start = write_fraction(&mut self.scratch, start, mantissa % DOUBLE_SCALE);
        start -= 1;
        self.scratch[start] = b'.';
        start = write_digits(&mut self.scratch, start, mantissa / DOUBLE_SCALE);
        if negative {
            start -= 1;
            self.scratch[start] = b'-';
        }
        &self.scratch[start..]
    }

    fn copy(&mut self, text: &[u8]) -> &[u8] {
        self.scratch[..text.len()].copy_from_slice(text);
        &self.scratch[..text.len()]
    }
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new()
    }
}

/// Write `value` in decimal so that it ends just before `end`.
///
/// Returns the index of the first digit.
#[inline]
fn write_digits(buf: &mut [u8], end: usize, mut value: u64) -> usize {
    let mut pos = end;
    loop {
        pos -= 1;
        buf[pos] = b'0' + (value % 10) as u8;
        value /= 10;
        if value == 0 {
            return pos;
        }
    }
}

/// Write exactly [`DOUBLE_PRECISION`] zero-padded digits ending before `end`.
#[inline]
fn write_fraction(buf: &mut [u8], end: usize, mut value: u64) -> usize {
    let mut pos = end;
    for _ in 0..DOUBLE_PRECISION {
        pos -= 1;
        buf[pos] = b'0' + (value % 10) as u8;
        value /= 10;
    }
    pos
}
