//! Circular response buffer between response generation and the transport.
//!
//! The controller appends bytes at the write cursor; the transport reads the
//! contiguous unsent span starting at the send cursor and reports how much
//! it took. One slot is always left free so that "full" (write cursor one
//! step behind the send cursor) and "empty" (cursors equal) never coincide.
//!
//! ```
//! use irrigation_proto::{Arg, ResponseBuffer};
//!
//! let mut response = ResponseBuffer::<64>::new();
//! response.write("Er%d\r\n", &[Arg::Int(42)]);
//! assert_eq!(response.peek_span(), b"Er42\r\n");
//! response.consume(6);
//! assert!(response.is_empty());
//! ```

use crate::args::Arg;
use crate::fmt::{Conversion, Formatter};

/// Why a formatted write stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteError {
    /// The ring filled up; the rest of the response was dropped.
    BufferFull,
    /// Unknown directive or missing/mismatched argument; the rest of the
    /// format string was discarded.
    Format,
}

impl core::fmt::Display for WriteError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::BufferFull => write!(f, "response buffer full"),
            Self::Format => write!(f, "invalid format directive"),
        }
    }
}

/// Fixed-capacity single-producer/single-consumer byte ring.
///
/// `N` is the size of the backing array; at most `N - 1` bytes can be
/// pending at once.
pub struct ResponseBuffer<const N: usize> {
    buffer: [u8; N],
    write_cursor: usize,
    send_cursor: usize,
}

impl<const N: usize> ResponseBuffer<N> {
    const CAPACITY_OK: () = assert!(N >= 2, "response buffer needs at least two slots");

    /// Create an empty buffer.
    #[must_use]
    pub const fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::CAPACITY_OK;
        Self {
            buffer: [0; N],
            write_cursor: 0,
            send_cursor: 0,
        }
    }

    /// Maximum number of bytes that can be pending.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        N - 1
    }

    /// Number of bytes written but not yet consumed.
    #[inline]
    #[must_use]
    pub const fn pending(&self) -> usize {
        (self.write_cursor + N - self.send_cursor) % N
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.write_cursor == self.send_cursor
    }

    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        (self.write_cursor + 1) % N == self.send_cursor
    }

    /// Drop everything pending.
    pub fn clear(&mut self) {
        self.write_cursor = 0;
        self.send_cursor = 0;
    }

    /// Append one byte. Returns `false` without writing if the ring is full.
    #[inline]
    pub fn put(&mut self, byte: u8) -> bool {
        let next = (self.write_cursor + 1) % N;
        if next == self.send_cursor {
            return false;
        }
        self.buffer[self.write_cursor] = byte;
        self.write_cursor = next;
        true
    }

    /// Expand `format` against `args` into the ring.
    ///
    /// Returns the number of bytes written. Output stops early, leaving a
    /// partial response, when the ring fills up or when a directive is not
    /// recognized or has no usable argument.
    pub fn write(&mut self, format: &str, args: &[Arg<'_>]) -> usize {
        self.render(format, args).0
    }

    /// Like [`write`](Self::write), but reports why output stopped early.
    ///
    /// # Errors
    ///
    /// Returns [`WriteError::BufferFull`] if the ring filled up and
    /// [`WriteError::Format`] if formatting was abandoned.
    pub fn try_write(&mut self, format: &str, args: &[Arg<'_>]) -> Result<usize, WriteError> {
        let (written, result) = self.render(format, args);
        result.map(|()| written)
    }

    /// Contiguous unsent bytes starting at the send cursor.
    ///
    /// When the pending data wraps around the end of the array only the part
    /// up to the end is returned; call again after [`consume`](Self::consume)
    /// for the remainder.
    #[must_use]
    pub fn peek_span(&self) -> &[u8] {
        if self.write_cursor >= self.send_cursor {
            &self.buffer[self.send_cursor..self.write_cursor]
        } else {
            &self.buffer[self.send_cursor..]
        }
    }

    /// Mark `len` bytes of the current span as sent.
    ///
    /// `len` is clamped to the span returned by [`peek_span`](Self::peek_span).
    pub fn consume(&mut self, len: usize) {
        let len = len.min(self.peek_span().len());
        self.send_cursor = (self.send_cursor + len) % N;
    }

    /// Push pending bytes into `writer` until it stops accepting them.
    ///
    /// Only what the writer accepted is consumed. Returns the byte count.
    ///
    /// # Errors
    ///
    /// Propagates the writer's error; bytes accepted before it are consumed.
    #[cfg(feature = "embedded-io")]
    pub fn drain_io<W: embedded_io::Write>(&mut self, writer: &mut W) -> Result<usize, W::Error> {
        let mut total = 0;
        while !self.is_empty() {
            let written = writer.write(self.peek_span())?;
            if written == 0 {
                break;
            }
            self.consume(written);
            total += written;
        }
        Ok(total)
    }

    fn render(&mut self, format: &str, args: &[Arg<'_>]) -> (usize, Result<(), WriteError>) {
        let mut formatter = Formatter::new();
        let mut args = args.iter();
        let format = format.as_bytes();
        let mut written = 0;
        let mut pos = 0;

        while let Some(&byte) = format.get(pos) {
            pos += 1;
            if byte != b'%' {
                if !self.put(byte) {
                    return (written, Err(WriteError::BufferFull));
                }
                written += 1;
                continue;
            }

            let (conversion, used) = Formatter::parse(&format[pos..]);
            pos += used;

            let arg = if conversion.takes_argument() {
                match args.next() {
                    Some(arg) => Some(*arg),
                    None => return (written, Err(WriteError::Format)),
                }
            } else {
                None
            };

            let Some(rendered) = convert(&mut formatter, conversion, arg) else {
                return (written, Err(WriteError::Format));
            };
            for &b in rendered {
                if !self.put(b) {
                    return (written, Err(WriteError::BufferFull));
                }
                written += 1;
            }
        }

        (written, Ok(()))
    }
}

impl<const N: usize> Default for ResponseBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Render one directive. `None` aborts the rest of the format string.
fn convert<'f>(
    formatter: &'f mut Formatter,
    conversion: Conversion,
    arg: Option<Arg<'f>>,
) -> Option<&'f [u8]> {
    match conversion {
        Conversion::Percent => Some(formatter.from_character('%')),
        Conversion::Character => match arg? {
            Arg::Char(c) => Some(formatter.from_character(c)),
            // an integer is a C char: one raw byte
            other => Some(formatter.from_byte(other.as_i64()? as u8)),
        },
        Conversion::SignedInt => {
            let value = arg?.as_i64()? as i32;
            Some(formatter.from_signed_int(i64::from(value)))
        }
        Conversion::UnsignedInt => {
            let value = arg?.as_u64()? as u32;
            Some(formatter.from_unsigned_int(u64::from(value)))
        }
        Conversion::LongSignedInt | Conversion::LongLongSignedInt => {
            let value = arg?.as_i64()?;
            Some(formatter.from_signed_int(value))
        }
        Conversion::LongUnsignedInt
        | Conversion::LongLongUnsignedInt
        | Conversion::Pointer => {
            let value = arg?.as_u64()?;
            Some(formatter.from_unsigned_int(value))
        }
        Conversion::Double => {
            let value = arg?.as_f64()?;
            Some(formatter.from_double(value))
        }
        Conversion::String => {
            let value = arg?.as_str()?;
            Some(Formatter::from_string(value))
        }
        Conversion::Unknown => None,
    }
}
