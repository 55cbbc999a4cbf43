// Slap AI - Network Task
//
// Drives the WiFi link, publishes its status for the portal and its view for
// the display, and performs restarts requested elsewhere.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::config::*;
use crate::events::UiEvent;
use crate::net::wifi::WifiManager;
use crate::now_ms;
use crate::shared::DeviceState;

pub fn network_task(mut wifi: WifiManager, state: Arc<DeviceState>, ui_tx: Sender<UiEvent>) {
    log::info!("Network task started");

    publish(&wifi, &state, &ui_tx);
    let poll_interval = Duration::from_millis(NETWORK_POLL_INTERVAL_MS);

    loop {
        if state.restart_requested() {
            log::info!("Restart requested, rebooting in {} ms", RESTART_DELAY_MS);
            thread::sleep(Duration::from_millis(RESTART_DELAY_MS));
            esp_idf_hal::reset::restart();
        }

        match wifi.poll(now_ms()) {
            Ok(true) => publish(&wifi, &state, &ui_tx),
            Ok(false) => {}
            Err(e) => log::error!("WiFi error ({:?}): {}", wifi.state(), e),
        }

        // RSSI and DHCP-assigned addresses drift; keep the snapshot fresh.
        *state.net() = wifi.status();

        thread::sleep(poll_interval);
    }
}

fn publish(wifi: &WifiManager, state: &DeviceState, ui_tx: &Sender<UiEvent>) {
    *state.net() = wifi.status();
    let _ = ui_tx.send(UiEvent::Network(wifi.view()));
}
