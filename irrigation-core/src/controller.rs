//! Controller: connects the host link to the peripherals.

use irrigation_proto::{Arg, Command, CommandParser, ParseError, ResponseBuffer};

use crate::config::{
    REBOOT_CODE, REFLASH_CODE, RESET_DELAY_MS, RESPONSE_BUFFER_SIZE, RX_BUFFER_SIZE,
    TIMEOUT_DELAY_US,
};
use crate::peripherals::{
    Clock, Indicator, IndicatorState, Peripherals, Sensor, SystemControl, Valve,
};
use crate::status::StatusReport;

/// Owns the parser, the response ring and the peripherals.
///
/// Bytes from the transport go through [`on_byte`](Self::on_byte) (or the
/// [`read_buffer`](Self::read_buffer)/[`read_done`](Self::read_done)
/// handshake); completed commands are dispatched immediately and their
/// responses queued in the ring, which the transport drains with
/// [`write_buffer`](Self::write_buffer)/[`write_done`](Self::write_done).
/// [`poll`](Self::poll) runs on a fixed cadence and keeps the peripherals
/// and the indicator up to date.
///
/// Name the controller through a type alias so the ring size falls back to
/// [`RESPONSE_BUFFER_SIZE`]:
///
/// ```ignore
/// type App = Controller<GpioValve, PulseSensor, PulseSensor, RgbIndicator, Rp2040System, EmbassyClock>;
/// let mut app = App::new(peripherals, system, clock);
/// ```
pub struct Controller<V, M, F, L, S, C, const N: usize = RESPONSE_BUFFER_SIZE> {
    peripherals: Peripherals<V, M, F, L>,
    system: S,
    clock: C,
    parser: CommandParser,
    response: ResponseBuffer<N>,
    rx_buffer: [u8; RX_BUFFER_SIZE],
    /// Link counts as disconnected once the clock passes this.
    timeout_us: u64,
}

impl<V, M, F, L, S, C, const N: usize> Controller<V, M, F, L, S, C, N>
where
    V: Valve,
    M: Sensor,
    F: Sensor,
    L: Indicator,
    S: SystemControl,
    C: Clock,
{
    pub fn new(peripherals: Peripherals<V, M, F, L>, system: S, clock: C) -> Self {
        Self {
            peripherals,
            system,
            clock,
            parser: CommandParser::new(),
            response: ResponseBuffer::new(),
            rx_buffer: [0; RX_BUFFER_SIZE],
            timeout_us: 0,
        }
    }

    /// Put the indicator into its start-up state.
    pub fn init(&mut self) {
        self.peripherals
            .indicator
            .set_state(IndicatorState::Disconnected);
    }

    /// Periodic update: poll every peripheral, then refresh the indicator.
    ///
    /// Priority: both valves > valve 0 > valve 1 > disconnected > connected.
    pub fn poll(&mut self) {
        self.peripherals.periodic();
        let state = self.display_state();
        self.peripherals.indicator.set_state(state);
    }

    /// Handle one byte from the host.
    pub fn on_byte(&mut self, c: u8) {
        self.timeout_us = self.clock.now_us().saturating_add(TIMEOUT_DELAY_US);

        match self.parser.parse(c) {
            Ok(false) => {}
            Ok(true) => {
                self.perform_command();
                self.parser.reset();
            }
            Err(e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("Protocol error: {}", e);
                match e {
                    ParseError::UnknownCommand(c) => self.respond("Ec'%c'\r\n", &[Arg::from(c)]),
                    ParseError::UnknownTarget(c) => self.respond("Et'%c'\r\n", &[Arg::from(c)]),
                }
            }
        }
    }

    /// Handle a run of bytes from the host.
    pub fn on_bytes(&mut self, bytes: &[u8]) {
        for &c in bytes {
            self.on_byte(c);
        }
    }

    /// Scratch area for the transport to fill with received bytes.
    pub fn read_buffer(&mut self) -> &mut [u8] {
        &mut self.rx_buffer
    }

    /// The transport put `len` bytes into [`read_buffer`](Self::read_buffer).
    pub fn read_done(&mut self, len: usize) {
        for i in 0..len.min(RX_BUFFER_SIZE) {
            let c = self.rx_buffer[i];
            self.on_byte(c);
        }
    }

    /// Contiguous span of unsent response bytes (possibly empty).
    #[must_use]
    pub fn write_buffer(&self) -> &[u8] {
        self.response.peek_span()
    }

    /// The transport sent the first `len` bytes of [`write_buffer`](Self::write_buffer).
    pub fn write_done(&mut self, len: usize) {
        self.response.consume(len);
    }

    #[must_use]
    pub fn peripherals(&self) -> &Peripherals<V, M, F, L> {
        &self.peripherals
    }

    pub fn peripherals_mut(&mut self) -> &mut Peripherals<V, M, F, L> {
        &mut self.peripherals
    }

    #[must_use]
    pub fn system(&self) -> &S {
        &self.system
    }

    #[must_use]
    pub fn parser(&self) -> &CommandParser {
        &self.parser
    }

    #[must_use]
    pub fn response(&self) -> &ResponseBuffer<N> {
        &self.response
    }

    /// Decompose the controller into its peripherals, system control and clock.
    pub fn into_parts(self) -> (Peripherals<V, M, F, L>, S, C) {
        (self.peripherals, self.system, self.clock)
    }

    fn display_state(&self) -> IndicatorState {
        if let Some(state) = self.peripherals.valve_indication() {
            state
        } else if self.timeout_us < self.clock.now_us() {
            IndicatorState::Disconnected
        } else {
            IndicatorState::Connected
        }
    }

    fn perform_command(&mut self) {
        let value = self.parser.values()[0];

        match self.parser.command() {
            Command::Status => {
                StatusReport::capture(&self.peripherals).write_to(&mut self.response);
            }
            Command::Reset => {
                #[cfg(feature = "defmt")]
                defmt::info!("Reset value: {}", value);
                match value {
                    // Restart as if BOOTSEL were held down
                    REFLASH_CODE => self.system.reboot_to_bootloader(),
                    REBOOT_CODE => self.system.watchdog_reboot(RESET_DELAY_MS),
                    _ => self.respond("Er%d\r\n", &[Arg::from(value)]),
                }
            }
            Command::Valve => {
                let target = self.parser.target();
                #[cfg(feature = "defmt")]
                defmt::info!("Valve target: {} pulse: {}", target, value);
                if let Some(valve) = self.peripherals.valve_mut(target) {
                    valve.pulse(value);
                    self.respond("AV%d\r\n", &[Arg::from(target)]);
                } else {
                    self.respond("Ev%d\r\n", &[Arg::from(target)]);
                }
            }
            Command::None => {}
        }
    }

    /// Queue a response; bytes that do not fit are dropped.
    fn respond(&mut self, format: &str, args: &[Arg<'_>]) {
        if let Err(_e) = self.response.try_write(format, args) {
            #[cfg(feature = "defmt")]
            defmt::debug!("Response dropped: {}", _e);
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::rc::Rc;
    use std::cell::Cell;
    use std::vec;
    use std::vec::Vec;

    #[derive(Default)]
    struct MockValve {
        on: bool,
        pulses: Vec<u16>,
        periodic_calls: usize,
    }

    impl Valve for MockValve {
        fn pulse(&mut self, duration: u16) {
            self.pulses.push(duration);
            self.on = duration > 0;
        }

        fn is_on(&self) -> bool {
            self.on
        }

        fn periodic(&mut self) {
            self.periodic_calls += 1;
        }
    }

    #[derive(Default)]
    struct MockSensor {
        fresh: bool,
        value: i32,
        periodic_calls: usize,
    }

    impl Sensor for MockSensor {
        fn periodic(&mut self) {
            self.periodic_calls += 1;
        }

        fn updated(&self) -> bool {
            self.fresh
        }

        fn value(&self) -> i32 {
            self.value
        }
    }

    #[derive(Default)]
    struct MockIndicator {
        state: IndicatorState,
    }

    impl Indicator for MockIndicator {
        fn periodic(&mut self) {}

        fn set_state(&mut self, state: IndicatorState) {
            self.state = state;
        }

        fn state(&self) -> IndicatorState {
            self.state
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum SystemCall {
        Bootloader,
        Watchdog(u32),
    }

    #[derive(Default)]
    struct MockSystem {
        calls: Vec<SystemCall>,
    }

    impl SystemControl for MockSystem {
        fn reboot_to_bootloader(&mut self) {
            self.calls.push(SystemCall::Bootloader);
        }

        fn watchdog_reboot(&mut self, delay_ms: u32) {
            self.calls.push(SystemCall::Watchdog(delay_ms));
        }
    }

    #[derive(Clone, Default)]
    struct MockClock(Rc<Cell<u64>>);

    impl MockClock {
        fn set(&self, now_us: u64) {
            self.0.set(now_us);
        }
    }

    impl Clock for MockClock {
        fn now_us(&self) -> u64 {
            self.0.get()
        }
    }

    type TestController<const N: usize = 256> =
        Controller<MockValve, MockSensor, MockSensor, MockIndicator, MockSystem, MockClock, N>;

    fn peripherals() -> Peripherals<MockValve, MockSensor, MockSensor, MockIndicator> {
        Peripherals {
            indicator: MockIndicator::default(),
            valves: Default::default(),
            moisture: Default::default(),
            flow: Default::default(),
        }
    }

    fn controller() -> (TestController, MockClock) {
        let clock = MockClock::default();
        let mut controller = TestController::new(peripherals(), MockSystem::default(), clock.clone());
        controller.init();
        (controller, clock)
    }

    fn drain<const N: usize>(controller: &mut TestController<N>) -> Vec<u8> {
        let mut out = Vec::new();
        loop {
            let span = controller.write_buffer();
            if span.is_empty() {
                return out;
            }
            let len = span.len();
            out.extend_from_slice(span);
            controller.write_done(len);
        }
    }

    #[test]
    fn test_status_response() {
        let (mut controller, _clock) = controller();
        {
            let p = controller.peripherals_mut();
            p.indicator.state = IndicatorState::Connected;
            p.valves[0].on = true;
            p.moisture[0] = MockSensor { fresh: true, value: 512, periodic_calls: 0 };
            p.moisture[1] = MockSensor { fresh: false, value: 300, periodic_calls: 0 };
            p.flow[0] = MockSensor { fresh: true, value: 12, periodic_calls: 0 };
        }

        controller.on_byte(b'S');
        assert_eq!(
            drain(&mut controller),
            b"R{\"l\":1,\"v0\":1,\"v1\":0,\"m0\": 512,\"m1\":-300,\"m2\":-0,\"f0\": 12,\"f1\":-0}\r\n"
                .as_slice()
        );
        assert_eq!(controller.parser(), &CommandParser::new());
    }

    #[test]
    fn test_status_unfitted_slot_follows_probe_one() {
        let (mut controller, _clock) = controller();
        controller.peripherals_mut().moisture[1] = MockSensor { fresh: true, value: 7, periodic_calls: 0 };

        controller.on_byte(b'S');
        let line = drain(&mut controller);
        let line = std::str::from_utf8(&line).unwrap();
        assert!(line.contains("\"m1\": 7,\"m2\": 0,"), "{line}");
    }

    #[test]
    fn test_reset_reflash() {
        let (mut controller, _clock) = controller();
        controller.on_bytes(b"R5511\r");
        assert_eq!(controller.system().calls, vec![SystemCall::Bootloader]);
        assert!(drain(&mut controller).is_empty());
    }

    #[test]
    fn test_reset_watchdog() {
        let (mut controller, _clock) = controller();
        controller.on_bytes(b"R1033\n");
        assert_eq!(
            controller.system().calls,
            vec![SystemCall::Watchdog(RESET_DELAY_MS)]
        );
        assert!(drain(&mut controller).is_empty());
    }

    #[test]
    fn test_reset_invalid_value() {
        let (mut controller, _clock) = controller();
        controller.on_bytes(b"R42\r\n");
        assert!(controller.system().calls.is_empty());
        assert_eq!(drain(&mut controller), b"Er42\r\n");
    }

    #[test]
    fn test_valve_pulse() {
        let (mut controller, _clock) = controller();
        controller.on_bytes(b"V0300\rV1,15\r");
        assert_eq!(controller.peripherals().valves[0].pulses, vec![300]);
        assert_eq!(controller.peripherals().valves[1].pulses, vec![15]);
        assert_eq!(drain(&mut controller), b"AV0\r\nAV1\r\n");
    }

    #[test]
    fn test_valve_invalid_target() {
        let (mut controller, _clock) = controller();
        controller.on_bytes(b"V2100\r");
        assert!(controller.peripherals().valves.iter().all(|v| v.pulses.is_empty()));
        assert_eq!(drain(&mut controller), b"Ev2\r\n");
    }

    #[test]
    fn test_syntax_errors() {
        let (mut controller, _clock) = controller();
        controller.on_bytes(b"xVq");
        assert_eq!(drain(&mut controller), b"Ec'x'\r\nEt'q'\r\n");
    }

    #[test]
    fn test_syntax_error_echoes_raw_byte() {
        let (mut controller, _clock) = controller();
        controller.on_byte(0xE9);
        controller.on_bytes(b"V");
        controller.on_byte(0xFF);
        assert_eq!(drain(&mut controller), b"Ec'\xE9'\r\nEt'\xFF'\r\n");
    }

    #[test]
    fn test_escape_cancels_silently() {
        let (mut controller, _clock) = controller();
        controller.on_bytes(b"V1\x1b");
        controller.on_bytes(b"R10\x1b");
        assert!(drain(&mut controller).is_empty());
        assert!(controller.system().calls.is_empty());
        assert!(controller.peripherals().valves[1].pulses.is_empty());
    }

    #[test]
    fn test_read_handshake() {
        let (mut controller, _clock) = controller();
        let buf = controller.read_buffer();
        assert_eq!(buf.len(), RX_BUFFER_SIZE);
        buf[..3].copy_from_slice(b"R7 ");
        controller.read_done(3);
        assert_eq!(drain(&mut controller), b"Er7\r\n");
    }

    #[test]
    fn test_full_buffer_drops_response_bytes() {
        let clock = MockClock::default();
        let mut controller: TestController<8> =
            Controller::new(peripherals(), MockSystem::default(), clock);
        controller.on_bytes(b"R42\rR43\r");
        // seven bytes fit, the second response is cut short
        assert_eq!(drain(&mut controller), b"Er42\r\nE");
        controller.on_bytes(b"R44\r");
        assert_eq!(drain(&mut controller), b"Er44\r\n");
    }

    #[test]
    fn test_poll_runs_every_peripheral() {
        let (mut controller, _clock) = controller();
        controller.poll();
        controller.poll();
        let p = controller.peripherals();
        assert!(p.valves.iter().all(|v| v.periodic_calls == 2));
        assert!(p.moisture.iter().all(|s| s.periodic_calls == 2));
        assert!(p.flow.iter().all(|s| s.periodic_calls == 2));
    }

    #[test]
    fn test_indicator_priority() {
        let (mut controller, clock) = controller();
        clock.set(1);
        controller.poll();
        assert_eq!(controller.peripherals().indicator.state, IndicatorState::Disconnected);

        controller.on_byte(b' ');
        controller.poll();
        assert_eq!(controller.peripherals().indicator.state, IndicatorState::Connected);

        controller.peripherals_mut().valves[1].on = true;
        controller.poll();
        assert_eq!(controller.peripherals().indicator.state, IndicatorState::Valve1On);

        controller.peripherals_mut().valves[0].on = true;
        controller.poll();
        assert_eq!(controller.peripherals().indicator.state, IndicatorState::BothValvesOn);

        controller.peripherals_mut().valves[1].on = false;
        controller.poll();
        assert_eq!(controller.peripherals().indicator.state, IndicatorState::Valve0On);
    }

    #[test]
    fn test_link_timeout() {
        let (mut controller, clock) = controller();
        clock.set(5_000_000);
        controller.on_byte(b'\n');

        clock.set(5_000_000 + TIMEOUT_DELAY_US);
        controller.poll();
        assert_eq!(controller.peripherals().indicator.state, IndicatorState::Connected);

        clock.set(5_000_001 + TIMEOUT_DELAY_US);
        controller.poll();
        assert_eq!(controller.peripherals().indicator.state, IndicatorState::Disconnected);
    }
}
