//! Byte-at-a-time command parser.
//!
//! The protocol has no line framing. A command completes when it needs no
//! arguments (`S`), when both value slots are filled, or when a value is
//! followed by any byte other than a digit, a separator or ESC:
//!
//! ```text
//! S                          status request
//! R<digits><terminator>      reset request
//! V<digit><digits><term>     valve pulse (target, duration)
//! ```
//!
//! ESC (0x1B) cancels a command that is collecting its target or values.
//! Values are separated by `,` or `:`.

/// Number of value slots a command can fill.
pub const NUM_VALUES: usize = 2;

/// Cancels the command in progress.
pub const ESC: u8 = 0x1B;

/// Position within the command currently being received.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    /// Waiting for a command letter.
    #[default]
    Command,
    /// Waiting for the target digit.
    Target,
    /// Waiting for the first digit of the next value.
    NextValue,
    /// Accumulating value digits.
    Value,
}

/// Command recognized from the leading letter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    #[default]
    None,
    Status,
    Reset,
    Valve,
}

/// Syntax errors. The parser has already reset itself when these are returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Printable byte that is not a command letter.
    UnknownCommand(u8),
    /// Printable byte in the target position that is not a digit.
    UnknownTarget(u8),
}

impl core::fmt::Display for ParseError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::UnknownCommand(c) => write!(f, "unknown command {:?}", char::from(*c)),
            Self::UnknownTarget(c) => write!(f, "unknown target {:?}", char::from(*c)),
        }
    }
}

/// Explicit state machine fed one byte at a time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandParser {
    state: ParserState,
    command: Command,
    target: u8,
    index: u8,
    values: [u16; NUM_VALUES],
}

impl CommandParser {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ParserState::Command,
            command: Command::None,
            target: 0,
            index: 0,
            values: [0; NUM_VALUES],
        }
    }

    /// Drop any partial command.
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Advance the state machine by one byte.
    ///
    /// Returns `Ok(true)` once a full command is available through
    /// [`command`](Self::command), [`target`](Self::target) and
    /// [`values`](Self::values). The caller resets the parser after handling
    /// it.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError`] for a printable byte that cannot start a
    /// command or name a target. The parser is back in
    /// [`ParserState::Command`] when that happens.
    pub fn parse(&mut self, c: u8) -> Result<bool, ParseError> {
        match self.state {
            ParserState::Command => match c {
                b's' | b'S' => {
                    self.command = Command::Status;
                    return Ok(true);
                }
                b'r' | b'R' => {
                    self.command = Command::Reset;
                    self.state = ParserState::NextValue;
                }
                b'v' | b'V' => {
                    self.command = Command::Valve;
                    self.state = ParserState::Target;
                }
                c if c > b' ' => {
                    self.reset();
                    return Err(ParseError::UnknownCommand(c));
                }
                _ => {}
            },
            ParserState::Target => match c {
                ESC => self.reset(),
                b'0'..=b'9' => {
                    self.target = c - b'0';
                    self.state = ParserState::NextValue;
                }
                c if c > b' ' => {
                    self.reset();
                    return Err(ParseError::UnknownTarget(c));
                }
                _ => {}
            },
            ParserState::NextValue => match c {
                ESC => self.reset(),
                b'0'..=b'9' => {
                    if let Some(value) = self.values.get_mut(usize::from(self.index)) {
                        *value = u16::from(c - b'0');
                    }
                    self.state = ParserState::Value;
                }
                _ => {}
            },
            ParserState::Value => match c {
                ESC => self.reset(),
                b'0'..=b'9' => {
                    // wraps on overflow; the protocol bounds digit counts, not values
                    if let Some(value) = self.values.get_mut(usize::from(self.index)) {
                        *value = value.wrapping_mul(10).wrapping_add(u16::from(c - b'0'));
                    }
                }
                b',' | b':' => {
                    self.index = self.index.saturating_add(1);
                    if usize::from(self.index) < NUM_VALUES {
                        self.state = ParserState::NextValue;
                    } else {
                        return Ok(true);
                    }
                }
                _ => return Ok(true),
            },
        }
        Ok(false)
    }

    /// Feed bytes until a command completes or is rejected.
    ///
    /// Returns how many bytes were consumed (including the completing or
    /// offending byte) and the result of the last [`parse`](Self::parse)
    /// call. Bytes after a completion are left for the caller.
    pub fn feed(&mut self, bytes: &[u8]) -> (usize, Result<bool, ParseError>) {
        for (i, &c) in bytes.iter().enumerate() {
            match self.parse(c) {
                Ok(false) => {}
                result => return (i + 1, result),
            }
        }
        (bytes.len(), Ok(false))
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> ParserState {
        self.state
    }

    #[inline]
    #[must_use]
    pub const fn command(&self) -> Command {
        self.command
    }

    /// Peripheral index given after `V`.
    #[inline]
    #[must_use]
    pub const fn target(&self) -> u8 {
        self.target
    }

    /// Slot currently being filled.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> u8 {
        self.index
    }

    #[inline]
    #[must_use]
    pub const fn values(&self) -> &[u16; NUM_VALUES] {
        &self.values
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}
