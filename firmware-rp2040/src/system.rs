//! RP2040 reset primitives and time source.

use embassy_rp::peripherals::WATCHDOG;
use embassy_rp::rom_data::reset_to_usb_boot;
use embassy_rp::watchdog::Watchdog;
use embassy_rp::Peri;
use embassy_time::{Duration, Instant};
use irrigation_core::{Clock, SystemControl};

/// Reboot paths requested over the link.
pub struct Rp2040System {
    watchdog: Watchdog,
}

impl Rp2040System {
    pub fn new(watchdog: Peri<'static, WATCHDOG>) -> Self {
        Self {
            watchdog: Watchdog::new(watchdog),
        }
    }
}

impl SystemControl for Rp2040System {
    fn reboot_to_bootloader(&mut self) {
        defmt::info!("Rebooting into USB bootloader");
        // Same as holding BOOTSEL: mass storage and PICOBOOT both enabled.
        reset_to_usb_boot(0, 0);
    }

    fn watchdog_reboot(&mut self, delay_ms: u32) {
        defmt::info!("Watchdog reboot in {} ms", delay_ms);
        // Never fed again; the chip resets when it expires.
        self.watchdog
            .start(Duration::from_millis(u64::from(delay_ms)));
    }
}

/// [`Clock`] on top of the embassy time driver.
#[derive(Clone, Copy, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    fn now_us(&self) -> u64 {
        Instant::now().as_micros()
    }
}
