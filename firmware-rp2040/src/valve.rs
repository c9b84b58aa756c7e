//! Solenoid valve on a GPIO output.
//!
//! The valve is driven open for a number of seconds and closed again from
//! [`Valve::periodic`] once the deadline has passed. A pulse of zero closes
//! it immediately.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::OutputPin;
use irrigation_core::Valve;

/// Valve driver for any `embedded-hal` output pin (active high).
pub struct GpioValve<P> {
    pin: P,
    /// Close time of the current pulse, `None` while closed.
    deadline: Option<Instant>,
}

impl<P: OutputPin> GpioValve<P> {
    /// Wrap `pin` and drive it low.
    pub fn new(mut pin: P) -> Self {
        if pin.set_low().is_err() {
            defmt::warn!("Valve pin did not accept initial level");
        }
        Self {
            pin,
            deadline: None,
        }
    }

    fn drive(&mut self, open: bool) {
        let result = if open {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        if result.is_err() {
            defmt::error!("Valve pin write failed");
        }
    }
}

impl<P: OutputPin> Valve for GpioValve<P> {
    fn pulse(&mut self, duration: u16) {
        if duration == 0 {
            self.deadline = None;
            self.drive(false);
            return;
        }
        self.deadline = Some(Instant::now() + Duration::from_secs(u64::from(duration)));
        self.drive(true);
    }

    fn is_on(&self) -> bool {
        self.deadline.is_some()
    }

    fn periodic(&mut self) {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                self.deadline = None;
                self.drive(false);
            }
        }
    }
}
