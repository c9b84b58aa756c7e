//! Compile-time configuration.

/// Without a received byte for this long the link counts as disconnected.
pub const TIMEOUT_DELAY_US: u64 = 10 * 1000 * 1000;

/// Watchdog delay before the requested reboot takes effect.
pub const RESET_DELAY_MS: u32 = 100;

/// `R` value that restarts into the USB bootloader for reflashing.
pub const REFLASH_CODE: u16 = 5511;

/// `R` value that reboots through the watchdog.
pub const REBOOT_CODE: u16 = 1033;

/// Size of the response ring (one slot stays free).
pub const RESPONSE_BUFFER_SIZE: usize = 2048;

/// Receive scratch size: one full-speed USB packet plus one.
pub const RX_BUFFER_SIZE: usize = 64 + 1;

/// Cadence of [`Controller::poll`](crate::Controller::poll).
pub const POLL_PERIOD_MS: u64 = 1;

pub const VALVE_COUNT: usize = 2;
pub const MOISTURE_COUNT: usize = 2;
pub const FLOW_COUNT: usize = 2;
