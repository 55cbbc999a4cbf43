// Slap AI - Display Views
//
// What the round display should show, and the minimum drawing needed to get
// there. Network views form the base layer; a slap or a pending factory
// reset is drawn on top and the base view comes back when it ends.

pub const SCREEN_WIDTH: i32 = 128;
pub const SCREEN_HEIGHT: i32 = 128;

/// Connecting-dots animation period.
pub const DOT_INTERVAL_MS: u32 = 500;

/// RGB565 colours.
pub mod color {
    pub const BLACK: u16 = 0x0000;
    pub const RED: u16 = 0xF800;
    pub const GREEN: u16 = 0x07E0;
    pub const BLUE: u16 = 0x001F;
    pub const CYAN: u16 = 0x07FF;
    pub const YELLOW: u16 = 0xFFE0;
    pub const WHITE: u16 = 0xFFFF;
    pub const ORANGE: u16 = 0xFD20;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSize {
    Small,
    Medium,
    Large,
}

/// The drawing surface. Implemented by the display driver.
pub trait Panel {
    type Error;

    fn fill_screen(&mut self, color: u16) -> Result<(), Self::Error>;
    fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: u16) -> Result<(), Self::Error>;
    /// Draw `text` with its top-left corner at (x, y).
    fn draw_text(
        &mut self,
        x: i32,
        y: i32,
        text: &str,
        size: TextSize,
        color: u16,
    ) -> Result<(), Self::Error>;
    fn text_width(&self, text: &str, size: TextSize) -> u32;
}

#[derive(Debug, Clone, PartialEq)]
pub enum View {
    Idle,
    AccessPoint { ip: String },
    Connecting { ssid: String },
    Connected { ip: String },
    Slap { peak: f32 },
    Resetting { progress: f32 },
}

/// A drawing job produced by `ViewTracker`.
#[derive(Debug, Clone, PartialEq)]
pub enum Redraw {
    Full(View),
    Peak(f32),
    Progress(f32),
    Dots(u8),
}

// ---------------------------------------------------------------------------
// Tracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ViewTracker {
    base: View,
    slap_peak: Option<f32>,
    reset_progress: Option<f32>,
    shown: Option<View>,
    dots: u8,
    last_dot_ms: u32,
}

impl Default for ViewTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewTracker {
    pub fn new() -> Self {
        Self {
            base: View::Idle,
            slap_peak: None,
            reset_progress: None,
            shown: None,
            dots: 1,
            last_dot_ms: 0,
        }
    }

    /// The view currently on screen, if anything has been drawn yet.
    pub fn shown(&self) -> Option<&View> {
        self.shown.as_ref()
    }

    pub fn set_network(&mut self, view: View) -> Option<Redraw> {
        self.base = view;
        self.refresh()
    }

    pub fn slap_started(&mut self, peak: f32) -> Option<Redraw> {
        self.slap_peak = Some(peak);
        self.refresh()
    }

    pub fn slap_peak(&mut self, peak: f32) -> Option<Redraw> {
        if self.slap_peak.is_none() {
            return None;
        }
        self.slap_peak = Some(peak);
        self.refresh()
    }

    pub fn slap_ended(&mut self) -> Option<Redraw> {
        self.slap_peak = None;
        self.refresh()
    }

    pub fn reset_progress(&mut self, progress: f32) -> Option<Redraw> {
        self.reset_progress = Some(progress.clamp(0.0, 1.0));
        self.refresh()
    }

    pub fn reset_cancelled(&mut self) -> Option<Redraw> {
        self.reset_progress = None;
        self.refresh()
    }

    /// Advance the connecting animation. Call from the UI loop.
    pub fn animate(&mut self, now_ms: u32) -> Option<Redraw> {
        if !matches!(self.shown, Some(View::Connecting { .. })) {
            return None;
        }
        if now_ms.wrapping_sub(self.last_dot_ms) < DOT_INTERVAL_MS {
            return None;
        }
        self.last_dot_ms = now_ms;
        self.dots = (self.dots + 1) % 4;
        Some(Redraw::Dots(self.dots))
    }

    fn effective(&self) -> View {
        if let Some(progress) = self.reset_progress {
            View::Resetting { progress }
        } else if let Some(peak) = self.slap_peak {
            View::Slap { peak }
        } else {
            self.base.clone()
        }
    }

    fn refresh(&mut self) -> Option<Redraw> {
        let next = self.effective();
        let redraw = match (&self.shown, &next) {
            (Some(current), next) if current == next => None,
            (Some(View::Slap { .. }), View::Slap { peak }) => Some(Redraw::Peak(*peak)),
            (Some(View::Resetting { .. }), View::Resetting { progress }) => {
                Some(Redraw::Progress(*progress))
            }
            (_, next) => {
                if matches!(next, View::Connecting { .. }) {
                    self.dots = 1;
                }
                Some(Redraw::Full(next.clone()))
            }
        };
        self.shown = Some(next);
        redraw
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

const AP_SSID_LABEL: &str = "slap-ai";

const PEAK_Y: i32 = 90;
const PEAK_BAND_H: u32 = 24;
const DOTS_Y: i32 = 95;
const BAR_X: i32 = (SCREEN_WIDTH - BAR_W as i32) / 2;
const BAR_Y: i32 = 70;
const BAR_W: u32 = 100;
const BAR_H: u32 = 10;

fn centered<P: Panel>(
    panel: &mut P,
    y: i32,
    text: &str,
    size: TextSize,
    color: u16,
) -> Result<(), P::Error> {
    let w = panel.text_width(text, size) as i32;
    let x = ((SCREEN_WIDTH - w) / 2).max(0);
    panel.draw_text(x, y, text, size, color)
}

/// Pick the larger size only if the text fits across the screen.
fn fitting_size<P: Panel>(panel: &P, text: &str) -> TextSize {
    if panel.text_width(text, TextSize::Medium) as i32 <= SCREEN_WIDTH {
        TextSize::Medium
    } else {
        TextSize::Small
    }
}

fn peak_label(peak: f32) -> String {
    format!("{:.2}g", peak)
}

pub fn render<P: Panel>(panel: &mut P, redraw: &Redraw) -> Result<(), P::Error> {
    match redraw {
        Redraw::Full(view) => render_view(panel, view),
        Redraw::Peak(peak) => {
            panel.fill_rect(0, PEAK_Y - 2, SCREEN_WIDTH as u32, PEAK_BAND_H, color::RED)?;
            centered(panel, PEAK_Y, &peak_label(*peak), TextSize::Medium, color::BLACK)
        }
        Redraw::Progress(progress) => render_progress(panel, *progress),
        Redraw::Dots(count) => {
            panel.fill_rect(0, DOTS_Y, SCREEN_WIDTH as u32, 20, color::BLACK)?;
            let dots = ".".repeat(*count as usize);
            centered(panel, DOTS_Y, &dots, TextSize::Medium, color::YELLOW)
        }
    }
}

fn render_view<P: Panel>(panel: &mut P, view: &View) -> Result<(), P::Error> {
    match view {
        View::Idle => panel.fill_screen(color::BLACK),
        View::AccessPoint { ip } => {
            panel.fill_screen(color::BLACK)?;
            centered(panel, 20, "AP MODE", TextSize::Medium, color::CYAN)?;
            centered(panel, 50, AP_SSID_LABEL, TextSize::Small, color::WHITE)?;
            centered(panel, 65, "(open)", TextSize::Small, color::WHITE)?;
            centered(panel, 85, "Connect to:", TextSize::Small, color::GREEN)?;
            let size = fitting_size(panel, ip);
            centered(panel, 100, ip, size, color::GREEN)
        }
        View::Connecting { ssid } => {
            panel.fill_screen(color::BLACK)?;
            centered(panel, 30, "Connecting to:", TextSize::Small, color::YELLOW)?;
            let size = fitting_size(panel, ssid);
            centered(panel, 50, ssid, size, color::WHITE)?;
            centered(panel, DOTS_Y, ".", TextSize::Medium, color::YELLOW)
        }
        View::Connected { ip } => {
            panel.fill_screen(color::BLACK)?;
            centered(panel, 50, "Connected", TextSize::Small, color::GREEN)?;
            centered(panel, 65, ip, TextSize::Small, color::WHITE)
        }
        View::Slap { peak } => {
            panel.fill_screen(color::RED)?;
            centered(panel, 55, "SLAP!", TextSize::Large, color::BLACK)?;
            centered(panel, PEAK_Y, &peak_label(*peak), TextSize::Medium, color::BLACK)
        }
        View::Resetting { progress } => {
            panel.fill_screen(color::BLACK)?;
            centered(panel, 40, "RESET", TextSize::Medium, color::ORANGE)?;
            render_progress(panel, *progress)
        }
    }
}

fn render_progress<P: Panel>(panel: &mut P, progress: f32) -> Result<(), P::Error> {
    // 1 px white border two pixels outside the bar.
    let (x, y) = (BAR_X - 2, BAR_Y - 2);
    let (w, h) = (BAR_W + 4, BAR_H + 4);
    panel.fill_rect(x, y, w, 1, color::WHITE)?;
    panel.fill_rect(x, y + h as i32 - 1, w, 1, color::WHITE)?;
    panel.fill_rect(x, y, 1, h, color::WHITE)?;
    panel.fill_rect(x + w as i32 - 1, y, 1, h, color::WHITE)?;

    let fill = (BAR_W as f32 * progress.clamp(0.0, 1.0)) as u32;
    if fill > 0 {
        panel.fill_rect(BAR_X, BAR_Y, fill, BAR_H, color::ORANGE)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Op {
        Screen(u16),
        Rect(i32, i32, u32, u32, u16),
        Text(i32, i32, String, TextSize, u16),
    }

    /// Records draw calls; 6 px per character per size step.
    #[derive(Default)]
    struct RecordingPanel {
        ops: Vec<Op>,
    }

    impl Panel for RecordingPanel {
        type Error = ();

        fn fill_screen(&mut self, color: u16) -> Result<(), ()> {
            self.ops.push(Op::Screen(color));
            Ok(())
        }

        fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: u16) -> Result<(), ()> {
            self.ops.push(Op::Rect(x, y, w, h, color));
            Ok(())
        }

        fn draw_text(
            &mut self,
            x: i32,
            y: i32,
            text: &str,
            size: TextSize,
            color: u16,
        ) -> Result<(), ()> {
            self.ops.push(Op::Text(x, y, text.to_owned(), size, color));
            Ok(())
        }

        fn text_width(&self, text: &str, size: TextSize) -> u32 {
            let scale = match size {
                TextSize::Small => 1,
                TextSize::Medium => 2,
                TextSize::Large => 3,
            };
            text.len() as u32 * 6 * scale
        }
    }

    fn ap() -> View {
        View::AccessPoint {
            ip: "10.0.0.1".into(),
        }
    }

    #[test]
    fn first_view_is_drawn_and_repeat_is_suppressed() {
        let mut t = ViewTracker::new();
        assert_eq!(t.set_network(ap()), Some(Redraw::Full(ap())));
        assert_eq!(t.set_network(ap()), None);
        assert_eq!(t.shown(), Some(&ap()));
    }

    #[test]
    fn slap_overlays_and_restores_base_view() {
        let mut t = ViewTracker::new();
        t.set_network(ap());

        assert_eq!(
            t.slap_started(1.5),
            Some(Redraw::Full(View::Slap { peak: 1.5 }))
        );
        assert_eq!(t.slap_peak(2.5), Some(Redraw::Peak(2.5)));
        assert_eq!(t.slap_ended(), Some(Redraw::Full(ap())));
    }

    #[test]
    fn network_change_during_slap_shows_after_it() {
        let mut t = ViewTracker::new();
        t.set_network(ap());
        t.slap_started(2.0);

        let connected = View::Connected {
            ip: "192.168.1.20".into(),
        };
        assert_eq!(t.set_network(connected.clone()), None);
        assert_eq!(t.slap_ended(), Some(Redraw::Full(connected)));
    }

    #[test]
    fn peak_outside_slap_is_ignored() {
        let mut t = ViewTracker::new();
        t.set_network(View::Idle);
        assert_eq!(t.slap_peak(3.0), None);
        assert_eq!(t.shown(), Some(&View::Idle));
    }

    #[test]
    fn reset_preempts_slap_and_cancel_returns_to_it() {
        let mut t = ViewTracker::new();
        t.set_network(View::Idle);
        t.slap_started(2.0);

        assert_eq!(
            t.reset_progress(0.1),
            Some(Redraw::Full(View::Resetting { progress: 0.1 }))
        );
        assert_eq!(t.reset_progress(0.4), Some(Redraw::Progress(0.4)));
        // Slap updates keep flowing underneath without touching the screen.
        assert_eq!(t.slap_peak(2.2), None);
        assert_eq!(
            t.reset_cancelled(),
            Some(Redraw::Full(View::Slap { peak: 2.2 }))
        );
    }

    #[test]
    fn connecting_dots_cycle_every_interval() {
        let mut t = ViewTracker::new();
        assert_eq!(t.animate(0), None);

        t.set_network(View::Connecting {
            ssid: "home".into(),
        });
        assert_eq!(t.animate(500), Some(Redraw::Dots(2)));
        assert_eq!(t.animate(700), None);
        assert_eq!(t.animate(1000), Some(Redraw::Dots(3)));
        assert_eq!(t.animate(1500), Some(Redraw::Dots(0)));
        assert_eq!(t.animate(2000), Some(Redraw::Dots(1)));
    }

    #[test]
    fn slap_screen_is_red_with_centered_label() {
        let mut panel = RecordingPanel::default();
        render(&mut panel, &Redraw::Full(View::Slap { peak: 2.5 })).unwrap();

        assert_eq!(panel.ops[0], Op::Screen(color::RED));
        // "SLAP!" is 5 * 18 = 90 px wide.
        assert_eq!(
            panel.ops[1],
            Op::Text(19, 55, "SLAP!".into(), TextSize::Large, color::BLACK)
        );
        assert_eq!(
            panel.ops[2],
            Op::Text(34, PEAK_Y, "2.50g".into(), TextSize::Medium, color::BLACK)
        );
    }

    #[test]
    fn peak_update_only_repaints_the_readout() {
        let mut panel = RecordingPanel::default();
        render(&mut panel, &Redraw::Peak(3.25)).unwrap();
        assert_eq!(panel.ops.len(), 2);
        assert!(matches!(panel.ops[0], Op::Rect(0, _, 128, _, color::RED)));
        assert!(matches!(&panel.ops[1], Op::Text(_, _, t, _, _) if t == "3.25g"));
    }

    #[test]
    fn long_ssid_falls_back_to_small_text() {
        let mut panel = RecordingPanel::default();
        let ssid = "a-very-long-network-name";
        render(
            &mut panel,
            &Redraw::Full(View::Connecting { ssid: ssid.into() }),
        )
        .unwrap();
        assert!(panel
            .ops
            .iter()
            .any(|op| matches!(op, Op::Text(_, 50, t, TextSize::Small, _) if t == ssid)));
    }

    #[test]
    fn progress_bar_fill_scales_with_progress() {
        let mut panel = RecordingPanel::default();
        render(&mut panel, &Redraw::Progress(0.5)).unwrap();
        // Four border strokes, then the fill.
        assert_eq!(panel.ops.len(), 5);
        assert_eq!(
            panel.ops[4],
            Op::Rect(BAR_X, BAR_Y, 50, BAR_H, color::ORANGE)
        );

        let mut empty = RecordingPanel::default();
        render(&mut empty, &Redraw::Progress(0.0)).unwrap();
        assert_eq!(empty.ops.len(), 4);
    }
}
