// Slap AI - Button Long-Press Tracker
//
// Polled with the debounced "pressed" level. Reports hold progress so the UI
// can draw the reset bar, and fires once when the hold completes.

/// Hold duration that triggers a factory reset.
pub const LONG_PRESS_MS: u32 = 5000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ButtonEvent {
    None,
    Pressed,
    /// Still held; progress toward the long press in [0, 1].
    Held(f32),
    LongPress,
    /// Released before the long press completed.
    Cancelled,
    /// Released after a long press already fired.
    Released,
}

#[derive(Debug, Clone)]
pub struct LongPress {
    duration_ms: u32,
    pressed_since: Option<u32>,
    fired: bool,
}

impl Default for LongPress {
    fn default() -> Self {
        Self::new(LONG_PRESS_MS)
    }
}

impl LongPress {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms: duration_ms.max(1),
            pressed_since: None,
            fired: false,
        }
    }

    pub fn update(&mut self, pressed: bool, now_ms: u32) -> ButtonEvent {
        match (self.pressed_since, pressed) {
            (None, true) => {
                self.pressed_since = Some(now_ms);
                self.fired = false;
                ButtonEvent::Pressed
            }
            (Some(since), true) => {
                if self.fired {
                    return ButtonEvent::None;
                }
                let held = now_ms.wrapping_sub(since);
                if held >= self.duration_ms {
                    self.fired = true;
                    ButtonEvent::LongPress
                } else {
                    ButtonEvent::Held(held as f32 / self.duration_ms as f32)
                }
            }
            (Some(_), false) => {
                self.pressed_since = None;
                if self.fired {
                    ButtonEvent::Released
                } else {
                    ButtonEvent::Cancelled
                }
            }
            (None, false) => ButtonEvent::None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed_since.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_hold_fires_long_press_once() {
        let mut b = LongPress::default();
        assert_eq!(b.update(true, 0), ButtonEvent::Pressed);
        assert_eq!(b.update(true, 2500), ButtonEvent::Held(0.5));
        assert_eq!(b.update(true, 5000), ButtonEvent::LongPress);
        assert_eq!(b.update(true, 6000), ButtonEvent::None);
        assert_eq!(b.update(false, 6100), ButtonEvent::Released);
        assert!(!b.is_pressed());
    }

    #[test]
    fn early_release_cancels() {
        let mut b = LongPress::default();
        b.update(true, 100);
        assert_eq!(b.update(true, 1100), ButtonEvent::Held(0.2));
        assert_eq!(b.update(false, 1200), ButtonEvent::Cancelled);
        assert_eq!(b.update(false, 1300), ButtonEvent::None);
    }

    #[test]
    fn new_press_rearms_after_long_press() {
        let mut b = LongPress::new(1000);
        b.update(true, 0);
        b.update(true, 1000);
        b.update(false, 1100);
        assert_eq!(b.update(true, 2000), ButtonEvent::Pressed);
        assert_eq!(b.update(true, 3000), ButtonEvent::LongPress);
    }
}
