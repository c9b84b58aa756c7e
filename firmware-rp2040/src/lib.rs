//! Irrigation controller firmware for RP2040.
//!
//! This crate provides the board side of the irrigation controller: GPIO
//! drivers for the valves, sensors and status LED, plus the reset
//! primitives, all implementing the traits from [`irrigation_core`].
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Presents a USB CDC-ACM serial port to the host
//! 2. Feeds every received byte to the command parser
//! 3. Opens valves, reports status and reboots on request
//! 4. Streams the queued responses back over the same port
//!
//! # Hardware Configuration
//!
//! | Function  | GPIO | Description |
//! |-----------|------|-------------|
//! | VALVE0    | 2    | Valve 0 driver (active high) |
//! | VALVE1    | 3    | Valve 1 driver (active high) |
//! | MOISTURE0 | 6    | Moisture probe 0 frequency output |
//! | MOISTURE1 | 7    | Moisture probe 1 frequency output |
//! | FLOW0     | 10   | Flow meter 0 pulse output |
//! | FLOW1     | 11   | Flow meter 1 pulse output |
//! | LED_RED   | 18   | RGB LED red (active low) |
//! | LED_GRN   | 19   | RGB LED green (active low) |
//! | LED_BLU   | 20   | RGB LED blue (active low) |
//!
//! # Architecture
//!
//! The Embassy executor runs two tasks:
//!
//! - **USB Task**: Manages the USB device stack
//! - **Controller Task**: Waits for either a USB packet or the 1 ms poll
//!   tick, hands it to the [`Controller`], then drains the response ring
//!   back to the host
//!
//! # Modules
//!
//! - [`valve`]: timed GPIO valve ([`GpioValve`])
//! - [`indicator`]: RGB status LED ([`RgbIndicator`])
//! - [`sensor`]: edge-counting frequency sensor ([`PulseSensor`])
//! - [`system`]: boot ROM/watchdog reboots and time ([`Rp2040System`], [`EmbassyClock`])
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//!
//! # Re-exports
//!
//! This crate re-exports the controller types from [`irrigation_core`] for
//! convenience, so the binary only needs to depend on this crate.

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` - they install conflicting panic handlers");

// Re-export core types for convenience
pub use irrigation_core::{
    config, Clock, Controller, Indicator, IndicatorState, Peripherals, Sensor, SystemControl,
    Valve,
};

pub mod indicator;
pub mod sensor;
pub mod system;
pub mod valve;

pub use indicator::RgbIndicator;
pub use sensor::PulseSensor;
pub use system::{EmbassyClock, Rp2040System};
pub use valve::GpioValve;
