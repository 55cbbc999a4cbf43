// Slap AI - Button Input Manager
//
// Debounced BOOT button. Holding it shows reset progress; a full long press
// requests a factory reset. Polled from the UI task loop.

use std::sync::mpsc::Sender;
use std::time::Instant;

use esp_idf_hal::gpio::{AnyIOPin, Input, PinDriver};
use slap_core::button::{ButtonEvent, LongPress};

use crate::config::*;
use crate::events::UiEvent;
use crate::now_ms;

pub struct InputManager {
    pin: PinDriver<'static, AnyIOPin, Input>,
    ui_tx: Sender<UiEvent>,

    // Debounce state
    last_raw: bool,
    last_debounce: Instant,

    long_press: LongPress,
}

impl InputManager {
    pub fn new(pin: PinDriver<'static, AnyIOPin, Input>, ui_tx: Sender<UiEvent>) -> Self {
        Self {
            pin,
            ui_tx,
            last_raw: true, // pull-up → idle HIGH
            last_debounce: Instant::now(),
            long_press: LongPress::default(),
        }
    }

    /// Call every UI tick.
    pub fn update(&mut self) {
        let current = self.pin.is_high(); // true = released (pull-up)
        let now = Instant::now();

        // ---- debounce filter ----
        if current != self.last_raw {
            self.last_debounce = now;
        }
        self.last_raw = current;

        let stable_ms = now.duration_since(self.last_debounce).as_millis() as u64;
        if stable_ms < DEBOUNCE_MS {
            return;
        }

        let pressed = !current; // active LOW
        let event = match self.long_press.update(pressed, now_ms()) {
            ButtonEvent::Pressed => {
                log::info!("Button pressed, hold for factory reset");
                Some(UiEvent::ButtonHeld(0.0))
            }
            ButtonEvent::Held(progress) => Some(UiEvent::ButtonHeld(progress)),
            ButtonEvent::LongPress => {
                log::warn!("Button long press: factory reset");
                Some(UiEvent::ButtonLongPress)
            }
            ButtonEvent::Cancelled => {
                log::info!("Button released, factory reset cancelled");
                Some(UiEvent::ButtonReleased)
            }
            ButtonEvent::Released | ButtonEvent::None => None,
        };

        if let Some(event) = event {
            let _ = self.ui_tx.send(event);
        }
    }
}
