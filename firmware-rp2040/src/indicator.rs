//! RGB status LED.
//!
//! | State          | Colour                |
//! |----------------|-----------------------|
//! | Disconnected   | red, blinking at 1 Hz |
//! | Connected      | green                 |
//! | Valve0On       | blue                  |
//! | Valve1On       | cyan                  |
//! | BothValvesOn   | magenta               |

use embassy_time::{Duration, Instant};
use embedded_hal::digital::OutputPin;
use irrigation_core::{Indicator, IndicatorState};

/// Half period of the disconnected blink.
const BLINK_INTERVAL: Duration = Duration::from_millis(500);

/// Which of red, green and blue are lit.
type Colour = [bool; 3];

const fn colour(state: IndicatorState) -> Colour {
    match state {
        IndicatorState::Disconnected => [true, false, false],
        IndicatorState::Connected => [false, true, false],
        IndicatorState::Valve0On => [false, false, true],
        IndicatorState::Valve1On => [false, true, true],
        IndicatorState::BothValvesOn => [true, false, true],
    }
}

/// Three-pin RGB LED. `active_low` inverts the pin levels for common-anode
/// parts.
pub struct RgbIndicator<P> {
    pins: [P; 3],
    active_low: bool,
    state: IndicatorState,
    lit: bool,
    next_toggle: Instant,
}

impl<P: OutputPin> RgbIndicator<P> {
    /// Pins are given as red, green, blue.
    pub fn new(pins: [P; 3], active_low: bool) -> Self {
        let mut indicator = Self {
            pins,
            active_low,
            state: IndicatorState::Disconnected,
            lit: true,
            next_toggle: Instant::now() + BLINK_INTERVAL,
        };
        indicator.show();
        indicator
    }

    fn show(&mut self) {
        let colour = if self.lit {
            colour(self.state)
        } else {
            [false; 3]
        };
        for (pin, on) in self.pins.iter_mut().zip(colour) {
            let result = if on != self.active_low {
                pin.set_high()
            } else {
                pin.set_low()
            };
            if result.is_err() {
                defmt::error!("Indicator pin write failed");
            }
        }
    }
}

impl<P: OutputPin> Indicator for RgbIndicator<P> {
    fn periodic(&mut self) {
        if self.state != IndicatorState::Disconnected {
            return;
        }
        let now = Instant::now();
        if now >= self.next_toggle {
            self.lit = !self.lit;
            self.next_toggle = now + BLINK_INTERVAL;
            self.show();
        }
    }

    fn set_state(&mut self, state: IndicatorState) {
        if state == self.state {
            return;
        }
        defmt::debug!("Indicator: {}", state);
        self.state = state;
        self.lit = true;
        self.next_toggle = Instant::now() + BLINK_INTERVAL;
        self.show();
    }

    fn state(&self) -> IndicatorState {
        self.state
    }
}
