//! Byte-in/bytes-out exercise of the controller through its public API.

use std::cell::Cell;
use std::rc::Rc;

use irrigation_core::config::{REFLASH_CODE, RESET_DELAY_MS, RX_BUFFER_SIZE};
use irrigation_core::{
    Clock, Controller, Indicator, IndicatorState, Peripherals, Sensor, SystemControl, Valve,
};

/// Valve whose pulse runs down by one second per poll.
#[derive(Default)]
struct CountdownValve {
    remaining: u16,
}

impl Valve for CountdownValve {
    fn pulse(&mut self, duration: u16) {
        self.remaining = duration;
    }

    fn is_on(&self) -> bool {
        self.remaining > 0
    }

    fn periodic(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
    }
}

#[derive(Default)]
struct FixedSensor {
    value: i32,
    fresh: bool,
}

impl Sensor for FixedSensor {
    fn periodic(&mut self) {}

    fn updated(&self) -> bool {
        self.fresh
    }

    fn value(&self) -> i32 {
        self.value
    }
}

#[derive(Default)]
struct Led(IndicatorState);

impl Indicator for Led {
    fn periodic(&mut self) {}

    fn set_state(&mut self, state: IndicatorState) {
        self.0 = state;
    }

    fn state(&self) -> IndicatorState {
        self.0
    }
}

#[derive(Default)]
struct Resets {
    bootloader: u32,
    watchdog: Vec<u32>,
}

impl SystemControl for Resets {
    fn reboot_to_bootloader(&mut self) {
        self.bootloader += 1;
    }

    fn watchdog_reboot(&mut self, delay_ms: u32) {
        self.watchdog.push(delay_ms);
    }
}

#[derive(Clone, Default)]
struct SharedClock(Rc<Cell<u64>>);

impl Clock for SharedClock {
    fn now_us(&self) -> u64 {
        self.0.get()
    }
}

type App = Controller<CountdownValve, FixedSensor, FixedSensor, Led, Resets, SharedClock>;

fn app() -> (App, SharedClock) {
    let clock = SharedClock::default();
    let peripherals = Peripherals {
        indicator: Led::default(),
        valves: Default::default(),
        moisture: [
            FixedSensor { value: 640, fresh: true },
            FixedSensor { value: 12, fresh: true },
        ],
        flow: [
            FixedSensor { value: 7, fresh: true },
            FixedSensor::default(),
        ],
    };
    let mut app: App = Controller::new(peripherals, Resets::default(), clock.clone());
    app.init();
    (app, clock)
}

/// Host side of the link: deliver `input` in packets of `chunk` bytes and
/// collect everything the controller queues in reply.
fn exchange(app: &mut App, input: &[u8], chunk: usize) -> String {
    let mut out = Vec::new();
    for packet in input.chunks(chunk) {
        let rx = app.read_buffer();
        rx[..packet.len()].copy_from_slice(packet);
        app.read_done(packet.len());

        loop {
            let span = app.write_buffer();
            if span.is_empty() {
                break;
            }
            // Partial writes, like a host endpoint with small packets.
            let len = span.len().min(5);
            out.extend_from_slice(&span[..len]);
            app.write_done(len);
        }
    }
    String::from_utf8(out).unwrap()
}

#[test]
fn session_over_split_packets() {
    let (mut app, _clock) = app();
    let script = b"S V1,30\r V7,1\r R99\r x V?";

    let replies = exchange(&mut app, script, 3);
    assert_eq!(
        replies,
        concat!(
            "R{\"l\":0,\"v0\":0,\"v1\":0,\"m0\": 640,\"m1\": 12,\"m2\": 0,\"f0\": 7,\"f1\":-0}\r\n",
            "AV1\r\n",
            "Ev7\r\n",
            "Er99\r\n",
            "Ec'x'\r\n",
            "Et'?'\r\n",
        )
    );
    assert!(app.peripherals().valves[1].is_on());
    assert!(!app.peripherals().valves[0].is_on());
}

#[test]
fn chunking_does_not_change_replies() {
    let script = b"V0,5\rSR1\rV1 2:3 S";
    let (mut whole, _) = app();
    let (mut bytewise, _) = app();
    assert_eq!(
        exchange(&mut whole, script, RX_BUFFER_SIZE),
        exchange(&mut bytewise, script, 1)
    );
}

#[test]
fn valve_pulse_drives_indicator_and_expires() {
    let (mut app, clock) = app();
    clock.0.set(1_000);
    exchange(&mut app, b"V02\r", 64);

    app.poll();
    assert_eq!(app.peripherals().indicator.state(), IndicatorState::Valve0On);
    app.poll();
    // pulse ran out, link still fresh
    assert_eq!(app.peripherals().indicator.state(), IndicatorState::Connected);

    clock.0.set(u64::MAX);
    app.poll();
    assert_eq!(app.peripherals().indicator.state(), IndicatorState::Disconnected);
}

#[test]
fn privileged_resets_produce_no_reply() {
    let (mut app, _clock) = app();
    let input = format!("R{REFLASH_CODE}\rR1033\r");
    assert_eq!(exchange(&mut app, input.as_bytes(), 4), "");

    let (_, system, _) = app.into_parts();
    assert_eq!(system.bootloader, 1);
    assert_eq!(system.watchdog, vec![RESET_DELAY_MS]);
}
