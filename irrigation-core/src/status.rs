//! Status snapshot reported in reply to `S`.
//!
//! ```text
//! R{"l":1,"v0":0,"v1":1,"m0": 512,"m1": 87,"m2": 0,"f0": 3,"f1": 0}\r\n
//! ```
//!
//! Each sensor field is a freshness flag (space when fresh, `-` when stale)
//! followed by the reading. The `m2` slot has no sensor fitted: it reads
//! zero and carries moisture probe 1's freshness flag.

use irrigation_proto::{Arg, ResponseBuffer};

use crate::config::{FLOW_COUNT, VALVE_COUNT};
use crate::peripherals::{Indicator, IndicatorState, Peripherals, Sensor, Valve};

/// Moisture slots in the status line, fitted or not.
pub const MOISTURE_SLOTS: usize = 3;

/// Format of the status line.
pub const STATUS_FORMAT: &str = concat!(
    "R{\"l\":%d,\"v0\":%d,\"v1\":%d,",
    "\"m0\":%c%d,\"m1\":%c%d,\"m2\":%c%d,",
    "\"f0\":%c%d,\"f1\":%c%d}\r\n",
);

/// One sensor's reading and freshness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SensorReading {
    pub fresh: bool,
    pub value: i32,
}

impl SensorReading {
    #[must_use]
    pub fn from_sensor<S: Sensor>(sensor: &S) -> Self {
        Self {
            fresh: sensor.updated(),
            value: sensor.value(),
        }
    }

    /// Freshness flag as it appears on the wire.
    #[inline]
    #[must_use]
    pub const fn flag(&self) -> char {
        if self.fresh {
            ' '
        } else {
            '-'
        }
    }
}

/// Snapshot of every peripheral at the time `S` was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatusReport {
    pub indicator: IndicatorState,
    pub valves: [bool; VALVE_COUNT],
    pub moisture: [SensorReading; MOISTURE_SLOTS],
    pub flow: [SensorReading; FLOW_COUNT],
}

impl StatusReport {
    /// Read the current state of all peripherals.
    #[must_use]
    pub fn capture<V, M, F, L>(peripherals: &Peripherals<V, M, F, L>) -> Self
    where
        V: Valve,
        M: Sensor,
        F: Sensor,
        L: Indicator,
    {
        let [m0, m1] = &peripherals.moisture;

        Self {
            indicator: peripherals.indicator.state(),
            valves: [peripherals.valves[0].is_on(), peripherals.valves[1].is_on()],
            moisture: [
                SensorReading::from_sensor(m0),
                SensorReading::from_sensor(m1),
                // unfitted slot
                SensorReading {
                    fresh: m1.updated(),
                    value: 0,
                },
            ],
            flow: [
                SensorReading::from_sensor(&peripherals.flow[0]),
                SensorReading::from_sensor(&peripherals.flow[1]),
            ],
        }
    }

    /// Render the status line into `response`.
    ///
    /// Returns the number of bytes written, which is short of the full line
    /// if the ring filled up.
    pub fn write_to<const N: usize>(&self, response: &mut ResponseBuffer<N>) -> usize {
        let [m0, m1, m2] = self.moisture;
        let [f0, f1] = self.flow;
        let args = [
            Arg::from(self.indicator.code()),
            Arg::from(self.valves[0]),
            Arg::from(self.valves[1]),
            Arg::from(m0.flag()),
            Arg::from(m0.value),
            Arg::from(m1.flag()),
            Arg::from(m1.value),
            Arg::from(m2.flag()),
            Arg::from(m2.value),
            Arg::from(f0.flag()),
            Arg::from(f0.value),
            Arg::from(f1.flag()),
            Arg::from(f1.value),
        ];
        response.write(STATUS_FORMAT, &args)
    }
}
