// Slap AI - UI Task
//
// Sole owner of the display. Polls the button and applies events from the
// sensor and network tasks through the view tracker, drawing only what
// changed.

use std::sync::mpsc::{Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver};
use slap_core::view::{render, Redraw, ViewTracker};

use crate::config::*;
use crate::drivers::display::RoundDisplay;
use crate::events::UiEvent;
use crate::input::InputManager;
use crate::now_ms;
use crate::shared::{lock, DeviceState};
use crate::store::ConfigStore;

pub fn ui_task(
    mut display: RoundDisplay,
    button_pin: PinDriver<'static, AnyIOPin, Input>,
    ui_rx: Receiver<UiEvent>,
    ui_tx: Sender<UiEvent>,
    store: Arc<Mutex<ConfigStore>>,
    state: Arc<DeviceState>,
) {
    log::info!("UI task started");

    let mut input = InputManager::new(button_pin, ui_tx);
    let mut views = ViewTracker::new();
    let mut reset_done = false;

    let poll_interval = Duration::from_millis(UI_POLL_INTERVAL_MS);

    loop {
        // 1. Poll the button (debounce + long-press tracking).
        input.update();

        // 2. Drain all pending UI events (non-blocking).
        while let Ok(event) = ui_rx.try_recv() {
            let redraw = match event {
                UiEvent::SlapStarted(peak) => views.slap_started(peak),
                UiEvent::SlapPeak(peak) => views.slap_peak(peak),
                UiEvent::SlapEnded => views.slap_ended(),
                UiEvent::Network(view) => views.set_network(view),
                UiEvent::ButtonHeld(progress) => views.reset_progress(progress),
                UiEvent::ButtonReleased => views.reset_cancelled(),
                UiEvent::ButtonLongPress => {
                    let redraw = views.reset_progress(1.0);
                    if !reset_done {
                        reset_done = true;
                        factory_reset(&store, &state);
                    }
                    redraw
                }
            };
            draw(&mut display, redraw);
        }

        // 3. Connecting animation.
        draw(&mut display, views.animate(now_ms()));

        thread::sleep(poll_interval);
    }
}

fn draw(display: &mut RoundDisplay, redraw: Option<Redraw>) {
    if let Some(redraw) = redraw {
        if let Err(e) = render(display, &redraw) {
            log::error!("Display error: {}", e);
        }
    }
}

fn factory_reset(store: &Mutex<ConfigStore>, state: &DeviceState) {
    if let Err(e) = lock(store).factory_reset() {
        log::error!("Factory reset failed: {}", e);
        return;
    }
    state.request_restart();
}
