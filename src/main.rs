//! brewrig firmware — main entry point.
//!
//! Wires the ESP-IDF peripherals into the port adapters, then runs the
//! cooperative control loop:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                  Adapters (outer ring)                   │
//! │                                                          │
//! │  GpioOutputBank      Mcp3008        LogEventSink         │
//! │  (OutputPort)        (AdcPort)      (EventSink)          │
//! │                                                          │
//! │  ─────────────── Port Trait Boundary ──────────────      │
//! │                                                          │
//! │  ┌────────────────────────────────────────────────┐      │
//! │  │           BrewService (pure logic)             │      │
//! │  │  Recipe · Step · PID · Output arbitration      │      │
//! │  └────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Transport adapters (socket relay, serial console) enqueue
//! [`BrewCommand`]s on the static channel; the loop drains them between
//! ticks. A `Quit` command is the single shutdown path and is guaranteed
//! to de-energize every output.

#![deny(unused_must_use)]

use std::time::{Duration, Instant};

use anyhow::Result;
use log::info;

use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::spi::{config::Config as SpiConfig, SpiDeviceDriver, SpiDriverConfig};
use esp_idf_hal::units::FromValueType;

use brewrig::adapters::adc::Mcp3008;
use brewrig::adapters::gpio::GpioOutputBank;
use brewrig::adapters::log_sink::LogEventSink;
use brewrig::app::channel::drain_commands;
use brewrig::app::commands::BrewCommand;
use brewrig::app::service::BrewService;
use brewrig::config::BrewSettings;
use brewrig::io::BreweryIo;

/// Control loop cadence. Fine enough to hit the 66 ms thermistor sampling
/// and the sub-second heater pulse deadlines with acceptable jitter.
const LOOP_INTERVAL_MS: u64 = 25;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("brewrig v{} starting", env!("CARGO_PKG_VERSION"));

    let peripherals = Peripherals::take()?;

    // ── Output bank: the six relay/SSR lines ──────────────────
    let pins = peripherals.pins;
    let outputs = [
        PinDriver::output(AnyOutputPin::from(pins.gpio15))?,
        PinDriver::output(AnyOutputPin::from(pins.gpio16))?,
        PinDriver::output(AnyOutputPin::from(pins.gpio17))?,
        PinDriver::output(AnyOutputPin::from(pins.gpio18))?,
        PinDriver::output(AnyOutputPin::from(pins.gpio8))?,
        PinDriver::output(AnyOutputPin::from(pins.gpio9))?,
    ];
    let bank = GpioOutputBank::new(outputs);

    // ── Thermistor ADC (MCP3008 over SPI2) ────────────────────
    let spi = SpiDeviceDriver::new_single(
        peripherals.spi2,
        pins.gpio12, // SCLK
        pins.gpio11, // MOSI
        Some(pins.gpio13), // MISO
        Some(pins.gpio10), // CS
        &SpiDriverConfig::new(),
        &SpiConfig::new().baudrate(1.MHz().into()),
    )?;
    let adc = Mcp3008::new(spi);

    // ── Core service ──────────────────────────────────────────
    let settings = BrewSettings::default();
    let io = BreweryIo::new(Box::new(bank), Box::new(adc), settings.timing.temp_sample_ms);
    let mut service = BrewService::new(io, settings);
    let mut sink = LogEventSink::new();

    info!("system ready, entering control loop");

    // ── Control loop ──────────────────────────────────────────
    let epoch = Instant::now();
    let mut quit = false;
    loop {
        let now = epoch.elapsed().as_millis() as u64;

        drain_commands(|cmd| {
            if matches!(cmd, BrewCommand::Quit) {
                quit = true;
            }
            service.handle_command(cmd, now, &mut sink);
        });

        if quit {
            // handle_command already ran the idempotent quit path and
            // released every output.
            break;
        }

        service.tick(now, &mut sink);
        std::thread::sleep(Duration::from_millis(LOOP_INTERVAL_MS));
    }

    info!("brewrig stopped");
    Ok(())
}
