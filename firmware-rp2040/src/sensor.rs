//! Frequency-output sensors (capacitive moisture probes, hall-effect flow
//! meters) read by counting rising edges.
//!
//! The pin is sampled on every poll; with the 1 ms poll period this covers
//! signals up to a few hundred hertz. Each one-second window yields one
//! reading in edges per second.

use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;
use irrigation_core::Sensor;

/// Counting window.
pub const SAMPLE_WINDOW: Duration = Duration::from_secs(1);

/// A reading older than this is reported as stale.
pub const STALE_AFTER: Duration = Duration::from_secs(3);

pub struct PulseSensor<P> {
    pin: P,
    level: bool,
    edges: u32,
    window_start: Instant,
    value: i32,
    last_update: Option<Instant>,
}

impl<P: InputPin> PulseSensor<P> {
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            level: false,
            edges: 0,
            window_start: Instant::now(),
            value: 0,
            last_update: None,
        }
    }
}

impl<P: InputPin> Sensor for PulseSensor<P> {
    fn periodic(&mut self) {
        match self.pin.is_high() {
            Ok(high) => {
                if high && !self.level {
                    self.edges = self.edges.saturating_add(1);
                }
                self.level = high;
            }
            Err(_) => defmt::warn!("Sensor pin read failed"),
        }

        let now = Instant::now();
        if now.duration_since(self.window_start) >= SAMPLE_WINDOW {
            self.value = i32::try_from(self.edges).unwrap_or(i32::MAX);
            self.edges = 0;
            self.window_start = now;
            self.last_update = Some(now);
        }
    }

    fn updated(&self) -> bool {
        self.last_update
            .is_some_and(|at| Instant::now().duration_since(at) < STALE_AFTER)
    }

    fn value(&self) -> i32 {
        self.value
    }
}
