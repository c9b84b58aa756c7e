//! Platform-agnostic irrigation controller: peripheral traits and command
//! dispatch.
//!
//! This crate ties the protocol engine in `irrigation-proto` to a set of
//! valves, sensors and a status indicator without depending on any
//! particular board. It can be used both in embedded `no_std` environments
//! and on host for testing.
//!
//! # Overview
//!
//! - [`peripherals`]: device traits ([`Valve`], [`Sensor`], [`Indicator`],
//!   [`SystemControl`], [`Clock`]) and the [`Peripherals`] set
//! - [`status`]: the status line sent in reply to `S` ([`StatusReport`])
//! - [`controller`]: byte handling, dispatch and indicator logic ([`Controller`])
//! - [`config`]: timing constants and magic reset values
//!
//! # Responses
//!
//! ```text
//! R{"l":<n>,"v0":<0|1>,"v1":<0|1>,"m0":<f><n>,...}   status
//! AV<target>                                         valve accepted
//! Ev<target>                                         no such valve
//! Er<value>                                          unknown reset value
//! Ec'<c>'                                            unknown command letter
//! Et'<c>'                                            bad valve target
//! ```
//!
//! Every response ends with CR LF.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting and controller logging
//! - **`embedded-io`**: Forwarded to `irrigation-proto`

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod config;
pub mod controller;
pub mod peripherals;
pub mod status;

// Re-export main types at crate root
pub use controller::Controller;
pub use peripherals::{Clock, Indicator, IndicatorState, Peripherals, Sensor, SystemControl, Valve};
pub use status::{SensorReading, StatusReport, STATUS_FORMAT};

pub use irrigation_proto as proto;
