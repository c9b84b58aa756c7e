#![no_std]
#![no_main]

use defmt::{info, warn};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_futures::select::{select, Either};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::{with_timeout, Duration, Ticker};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Config as UsbConfig};
use irrigation_firmware_rp2040::config::POLL_PERIOD_MS;
use irrigation_firmware_rp2040::{
    Controller, EmbassyClock, GpioValve, Peripherals, PulseSensor, RgbIndicator, Rp2040System,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

type App = Controller<
    GpioValve<Output<'static>>,
    PulseSensor<Input<'static>>,
    PulseSensor<Input<'static>>,
    RgbIndicator<Output<'static>>,
    Rp2040System,
    EmbassyClock,
>;

type SerialClass = CdcAcmClass<'static, Driver<'static, USB>>;

/// Full-speed bulk endpoint size.
const MAX_PACKET_SIZE: u16 = 64;

/// A host that stops reading must not stall valve timing.
const WRITE_TIMEOUT: Duration = Duration::from_millis(10);

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// CDC-ACM state.
static CDC_STATE: StaticCell<State> = StaticCell::new();

/// Controller lives in static memory; the response ring is too big for the task stack.
static APP: StaticCell<App> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Irrigation controller starting...");

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    // --- Peripherals ---
    let peripherals = Peripherals {
        indicator: RgbIndicator::new(
            [
                Output::new(p.PIN_18, Level::High),
                Output::new(p.PIN_19, Level::High),
                Output::new(p.PIN_20, Level::High),
            ],
            true,
        ),
        valves: [
            GpioValve::new(Output::new(p.PIN_2, Level::Low)),
            GpioValve::new(Output::new(p.PIN_3, Level::Low)),
        ],
        moisture: [
            PulseSensor::new(Input::new(p.PIN_6, Pull::Down)),
            PulseSensor::new(Input::new(p.PIN_7, Pull::Down)),
        ],
        flow: [
            PulseSensor::new(Input::new(p.PIN_10, Pull::Up)),
            PulseSensor::new(Input::new(p.PIN_11, Pull::Up)),
        ],
    };
    let system = Rp2040System::new(p.WATCHDOG);

    let app = APP.init(App::new(peripherals, system, EmbassyClock));
    app.init();

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("Rust Irrigation");
    usb_config.product = Some("Irrigation Controller");
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    // Configure CDC-ACM class
    let cdc_state = CDC_STATE.init(State::new());
    let class = CdcAcmClass::new(&mut builder, cdc_state, MAX_PACKET_SIZE);

    // Build the USB device
    let usb_device = builder.build();

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(controller_task(class, app).unwrap());

    info!("Irrigation controller initialized, waiting for host...");
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, Driver<'static, USB>>) {
    device.run().await;
}

/// Controller task - feeds host bytes in, polls peripherals, streams responses out.
#[embassy_executor::task]
async fn controller_task(mut class: SerialClass, app: &'static mut App) {
    let mut ticker = Ticker::every(Duration::from_millis(POLL_PERIOD_MS));
    let mut connected = false;

    loop {
        let event = select(class.read_packet(app.read_buffer()), ticker.next()).await;
        match event {
            Either::First(Ok(len)) => {
                if !connected {
                    info!("Host connected");
                    connected = true;
                }
                app.read_done(len);
            }
            Either::First(Err(EndpointError::Disabled)) => {
                if connected {
                    info!("Host disconnected");
                    connected = false;
                }
                // Endpoint is down until the host configures us again.
                ticker.next().await;
                app.poll();
            }
            Either::First(Err(EndpointError::BufferOverflow)) => {
                warn!("USB packet larger than receive buffer");
            }
            Either::Second(()) => app.poll(),
        }

        if connected {
            drain(&mut class, app).await;
        }
    }
}

/// Write queued response bytes until the ring is empty or the host stalls.
async fn drain(class: &mut SerialClass, app: &mut App) {
    loop {
        let span = app.write_buffer();
        if span.is_empty() {
            return;
        }
        // Short packets end the transfer without a zero-length packet.
        let len = span.len().min(usize::from(MAX_PACKET_SIZE) - 1);
        let result = with_timeout(WRITE_TIMEOUT, class.write_packet(&span[..len])).await;
        match result {
            Ok(Ok(())) => app.write_done(len),
            Ok(Err(e)) => {
                warn!("USB write error: {:?}", e);
                return;
            }
            Err(_) => {
                warn!("USB write timed out, {} bytes pending", len);
                return;
            }
        }
    }
}
