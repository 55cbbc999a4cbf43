// Slap AI - Firmware Entry Point
//
// Boot sequence:
//   1. Load settings from NVS and confirm the running OTA slot.
//   2. Bring up the round display (SPI) and the IMU bus (I2C).
//   3. Start WiFi (AP or station per settings) and the config portal.
//   4. Spawn sensor, UI, and network tasks.
//
// A slap is any jolt whose gravity-free acceleration exceeds the configured
// threshold; it stays on screen until 3 seconds pass without another one.

mod config;
mod drivers;
mod events;
mod input;
mod net;
mod shared;
mod store;
mod tasks;

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyIOPin, IOPin, OutputPin, PinDriver, Pull};
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::prelude::*;
use esp_idf_hal::spi::{SpiConfig, SpiDeviceDriver, SpiDriver, SpiDriverConfig};
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::ota::EspOta;

use crate::config::*;
use crate::drivers::display::RoundDisplay;
use crate::drivers::imu::Qmi8658;
use crate::net::portal::Portal;
use crate::net::wifi::WifiManager;
use crate::shared::{lock, DeviceState};
use crate::store::ConfigStore;

// ---------------------------------------------------------------------------
// Utility: milliseconds since boot (wraps at ~49 days, fine for timeouts)
// ---------------------------------------------------------------------------
pub fn now_ms() -> u32 {
    unsafe { (esp_idf_sys::esp_timer_get_time() / 1000) as u32 }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------
fn main() -> anyhow::Result<()> {
    // Link esp-idf-sys runtime patches and initialise logging.
    esp_idf_svc::sys::link_patches();
    esp_idf_svc::log::EspLogger::initialize_default();
    log::info!("Slap AI firmware starting…");

    // ---- Peripherals ------------------------------------------------------
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    // On-board power LED off.
    let mut led = PinDriver::output(pins.gpio7)?;
    led.set_low()?;

    // ---- Settings ---------------------------------------------------------
    let store = Arc::new(Mutex::new(ConfigStore::open(nvs.clone())?));
    let threshold = lock(&store).settings().threshold;
    let state = Arc::new(DeviceState::new(threshold));

    // A freshly flashed OTA image is only kept if it reaches this point.
    match EspOta::new().and_then(|mut ota| ota.mark_running_slot_valid()) {
        Ok(()) => log::info!("Running firmware slot marked valid"),
        Err(e) => log::warn!("Could not mark firmware slot valid: {}", e),
    }

    // ---- Display (SPI2) ---------------------------------------------------
    let spi = SpiDriver::new(
        peripherals.spi2,
        pins.gpio40, // SCLK
        pins.gpio38, // MOSI
        None::<AnyIOPin>,
        &SpiDriverConfig::new(),
    )?;
    let spi = SpiDeviceDriver::new(
        spi,
        Some(pins.gpio4), // CS
        &SpiConfig::new().baudrate(SPI_BAUDRATE_MHZ.MHz().into()),
    )?;
    let mut display = RoundDisplay::new(
        spi,
        PinDriver::output(pins.gpio2.downgrade_output())?, // DC
        PinDriver::output(pins.gpio1.downgrade_output())?, // RST
        PinDriver::output(pins.gpio3.downgrade_output())?, // BL
    );
    display.init()?;

    // ---- IMU (I2C0) -------------------------------------------------------
    let i2c_config = I2cConfig::new().baudrate(I2C_BAUDRATE_KHZ.kHz().into());
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        pins.gpio12, // SDA
        pins.gpio11, // SCL
        &i2c_config,
    )?;
    let imu = Qmi8658::new(i2c);

    // ---- Button (BOOT, pull-up, active LOW) -------------------------------
    let mut button = PinDriver::input(pins.gpio0.downgrade())?;
    button.set_pull(Pull::Up)?;

    // ---- Network ----------------------------------------------------------
    let mut wifi = WifiManager::new(peripherals.modem, sysloop, nvs, store.clone())?;
    if let Err(e) = wifi.begin(now_ms()) {
        log::error!("WiFi start failed: {}", e);
    }
    let _portal = Portal::start(state.clone(), store.clone())?;

    // ---- Channels ---------------------------------------------------------
    let (ui_tx, ui_rx) = mpsc::channel();

    // ---- Spawn tasks (map to FreeRTOS tasks via std::thread) ---------------

    // Sensor task: tightest timing.
    let sensor_state = Arc::clone(&state);
    let sensor_ui_tx = ui_tx.clone();
    thread::Builder::new()
        .name("sensor".into())
        .stack_size(STACK_SENSOR)
        .spawn(move || {
            tasks::sensor::sensor_task(imu, sensor_state, sensor_ui_tx);
        })?;

    // UI task (display + button)
    let ui_state = Arc::clone(&state);
    let ui_store = Arc::clone(&store);
    let ui_tx_for_input = ui_tx.clone();
    thread::Builder::new()
        .name("ui".into())
        .stack_size(STACK_UI)
        .spawn(move || {
            tasks::ui::ui_task(display, button, ui_rx, ui_tx_for_input, ui_store, ui_state);
        })?;

    // Network task (link polling + restarts)
    let net_state = Arc::clone(&state);
    thread::Builder::new()
        .name("network".into())
        .stack_size(STACK_NETWORK)
        .spawn(move || {
            tasks::network::network_task(wifi, net_state, ui_tx);
        })?;

    log::debug!(
        "Pins: button={} led={} imu sda={} scl={} tft sclk={} mosi={} cs={} dc={} rst={} bl={}",
        PIN_BUTTON,
        PIN_LED_PWR,
        PIN_I2C_SDA,
        PIN_I2C_SCL,
        PIN_TFT_SCLK,
        PIN_TFT_MOSI,
        PIN_TFT_CS,
        PIN_TFT_DC,
        PIN_TFT_RST,
        PIN_TFT_BL
    );
    log::info!("Boot complete: threshold={:.2}g", threshold.get());

    // Main thread keeps the portal alive; all other work happens in the
    // spawned tasks.
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}
