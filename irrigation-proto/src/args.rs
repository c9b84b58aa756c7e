//! Typed argument list for formatted responses.
//!
//! Format strings are expanded against a slice of [`Arg`] values built by
//! the caller. Each directive takes the next argument and converts it the
//! way a C vararg would be read: integer arguments are cast to the width
//! the directive asks for, characters may come from integers, and `%f`
//! accepts any numeric argument.

/// One formatting argument.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Arg<'a> {
    /// Unicode character; `%c` writes it UTF-8 encoded.
    Char(char),
    /// Renders as `0` or `1`.
    Bool(bool),
    /// C `int`.
    Int(i32),
    /// C `unsigned`.
    UInt(u32),
    /// C `long`/`long long`.
    Long(i64),
    /// C `unsigned long`/`unsigned long long`.
    ULong(u64),
    /// Address for `%p`.
    Ptr(usize),
    /// C `double`.
    Double(f64),
    /// Text for `%s`, cut at the first NUL.
    Str(&'a str),
}

impl<'a> Arg<'a> {
    /// Integer view of the argument, if it has one.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Self::Char(c) => Some(i64::from(u32::from(c))),
            Self::Bool(b) => Some(i64::from(b)),
            Self::Int(v) => Some(i64::from(v)),
            Self::UInt(v) => Some(i64::from(v)),
            Self::Long(v) => Some(v),
            Self::ULong(v) => Some(v as i64),
            Self::Ptr(v) => Some(v as i64),
            Self::Double(_) | Self::Str(_) => None,
        }
    }

    /// Unsigned integer view (two's complement reinterpretation).
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Self::ULong(v) => Some(v),
            _ => self.as_i64().map(|v| v as u64),
        }
    }

    /// Character view. Integers are truncated to their low byte.
    #[must_use]
    pub fn as_char(&self) -> Option<char> {
        match *self {
            Self::Char(c) => Some(c),
            _ => self.as_i64().map(|v| char::from(v as u8)),
        }
    }

    /// Floating view.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Double(v) => Some(v),
            Self::ULong(v) => Some(v as f64),
            _ => self.as_i64().map(|v| v as f64),
        }
    }

    /// String view. Only [`Arg::Str`] has one.
    #[must_use]
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for Arg<'_> {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value.into())
                }
            }
        )+
    };
}

impl_from!(Char: char);
impl_from!(Bool: bool);
impl_from!(Int: i8, i16, i32);
impl_from!(UInt: u8, u16, u32);
impl_from!(Long: i64);
impl_from!(ULong: u64);
impl_from!(Double: f32, f64);

impl From<usize> for Arg<'_> {
    #[inline]
    fn from(value: usize) -> Self {
        Self::ULong(value as u64)
    }
}

impl From<isize> for Arg<'_> {
    #[inline]
    fn from(value: isize) -> Self {
        Self::Long(value as i64)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    #[inline]
    fn from(value: &'a str) -> Self {
        Self::Str(value)
    }
}

impl<T> From<*const T> for Arg<'_> {
    #[inline]
    fn from(value: *const T) -> Self {
        Self::Ptr(value as usize)
    }
}
