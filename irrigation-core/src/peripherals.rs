//! Peripheral traits and the set of peripherals the controller owns.
//!
//! The controller only needs a narrow interface from each device; the
//! firmware implements these traits on top of GPIO, timers and the boot
//! ROM, and tests implement them with plain mocks.
//!
//! # `no_std` Compatibility
//!
//! All implementations must be `#![no_std]` compatible with no heap allocation.

use crate::config::{FLOW_COUNT, MOISTURE_COUNT, VALVE_COUNT};

/// What the status indicator is showing, by priority.
///
/// The numeric code is reported in the status line's `l` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum IndicatorState {
    /// No command received within the timeout window.
    #[default]
    Disconnected = 0,
    /// Host is talking to us, no valve open.
    Connected = 1,
    /// Valve 0 open.
    Valve0On = 2,
    /// Valve 1 open.
    Valve1On = 3,
    /// Both valves open.
    BothValvesOn = 4,
}

impl IndicatorState {
    /// Code reported over the link.
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

/// A solenoid valve that can be opened for a fixed time.
pub trait Valve {
    /// Open the valve for `duration` seconds. Zero closes it.
    fn pulse(&mut self, duration: u16);

    /// Whether the valve is currently open.
    fn is_on(&self) -> bool;

    /// Called every poll cycle; closes the valve once its pulse has elapsed.
    fn periodic(&mut self);
}

/// A moisture or flow sensor sampled in the background.
pub trait Sensor {
    /// Called every poll cycle.
    fn periodic(&mut self);

    /// `true` while the last reading is fresh.
    fn updated(&self) -> bool;

    /// Last reading.
    fn value(&self) -> i32;
}

/// The status LED.
pub trait Indicator {
    /// Called every poll cycle (blinking, fades).
    fn periodic(&mut self);

    fn set_state(&mut self, state: IndicatorState);

    fn state(&self) -> IndicatorState;
}

/// Deliberate terminations of the running firmware.
///
/// On hardware neither call returns in practice.
pub trait SystemControl {
    /// Restart into the USB bootloader so a new image can be loaded.
    fn reboot_to_bootloader(&mut self);

    /// Reboot through the watchdog after `delay_ms`.
    fn watchdog_reboot(&mut self, delay_ms: u32);
}

/// Monotonic time source.
pub trait Clock {
    /// Microseconds since boot.
    fn now_us(&self) -> u64;
}

/// Everything the controller polls and reports on.
pub struct Peripherals<V, M, F, L> {
    pub indicator: L,
    pub valves: [V; VALVE_COUNT],
    pub moisture: [M; MOISTURE_COUNT],
    pub flow: [F; FLOW_COUNT],
}

impl<V: Valve, M: Sensor, F: Sensor, L: Indicator> Peripherals<V, M, F, L> {
    /// Run every device's periodic update.
    pub fn periodic(&mut self) {
        self.indicator.periodic();
        self.valves.iter_mut().for_each(Valve::periodic);
        self.moisture.iter_mut().for_each(Sensor::periodic);
        self.flow.iter_mut().for_each(Sensor::periodic);
    }

    /// Valve by protocol index.
    #[inline]
    pub fn valve_mut(&mut self, index: u8) -> Option<&mut V> {
        self.valves.get_mut(usize::from(index))
    }

    /// Indicator state implied by the valves alone.
    ///
    /// Returns `None` when no valve is open and the link state decides.
    #[must_use]
    pub fn valve_indication(&self) -> Option<IndicatorState> {
        match (self.valves[0].is_on(), self.valves[1].is_on()) {
            (true, true) => Some(IndicatorState::BothValvesOn),
            (true, false) => Some(IndicatorState::Valve0On),
            (false, true) => Some(IndicatorState::Valve1On),
            (false, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indicator_codes() {
        assert_eq!(IndicatorState::Disconnected.code(), 0);
        assert_eq!(IndicatorState::Connected.code(), 1);
        assert_eq!(IndicatorState::Valve0On.code(), 2);
        assert_eq!(IndicatorState::Valve1On.code(), 3);
        assert_eq!(IndicatorState::BothValvesOn.code(), 4);
    }
}
