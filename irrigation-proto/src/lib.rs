//! Command protocol engine for the irrigation controller's host link.
//!
//! This crate holds the parts of the link that have real state to manage:
//!
//! - [`parser`]: byte-at-a-time command parser ([`CommandParser`])
//! - [`fmt`]: allocation-free value rendering ([`Formatter`])
//! - [`args`]: typed argument list for formatted responses ([`Arg`])
//! - [`response`]: circular output buffer ([`ResponseBuffer`])
//!
//! # Protocol
//!
//! Commands are line-free ASCII:
//!
//! ```text
//! S                         status request
//! R<digits><terminator>     reset request
//! V<digit><digits><term>    valve pulse: target index, duration
//! ```
//!
//! ESC cancels, `,`/`:` separate values, any other non-digit finalizes the
//! last value. Responses end with CR LF.
//!
//! # Example
//!
//! ```
//! use irrigation_proto::{Arg, Command, CommandParser, ResponseBuffer};
//!
//! let mut parser = CommandParser::new();
//! let mut response = ResponseBuffer::<128>::new();
//!
//! let (_, result) = parser.feed(b"V1300\r");
//! assert_eq!(result, Ok(true));
//! assert_eq!(parser.command(), Command::Valve);
//! response.write("AV%d\r\n", &[Arg::from(parser.target())]);
//! parser.reset();
//!
//! assert_eq!(response.peek_span(), b"AV1\r\n");
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//! - **`embedded-io`**: Enable [`ResponseBuffer::drain_io`]
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod args;
pub mod fmt;
pub mod parser;
pub mod response;

pub use args::Arg;
pub use fmt::{Conversion, Formatter, DOUBLE_PRECISION};
pub use parser::{Command, CommandParser, ParseError, ParserState, ESC, NUM_VALUES};
pub use response::{ResponseBuffer, WriteError};
