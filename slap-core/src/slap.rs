// Slap AI - Slap Detector
//
// Turns a stream of motion magnitudes into slap events. A crossing above the
// threshold enters `Active`; the state holds for DISPLAY_TIMEOUT_MS after the
// most recent crossing and then drops back to `Quiet`.

/// Hold time after the last above-threshold sample before a slap ends.
pub const DISPLAY_TIMEOUT_MS: u32 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SlapPhase {
    #[default]
    Quiet,
    Active,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlapState {
    pub phase: SlapPhase,
    /// Largest magnitude seen in the current active window, 0 while quiet.
    pub peak_magnitude: f32,
    /// Timestamp (ms since boot) of the latest above-threshold sample.
    pub last_motion_ms: u32,
}

impl Default for SlapState {
    fn default() -> Self {
        Self {
            phase: SlapPhase::Quiet,
            peak_magnitude: 0.0,
            last_motion_ms: 0,
        }
    }
}

/// Outcome of one `evaluate` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub phase: SlapPhase,
    pub peak_magnitude: f32,
    /// A new slap started on this tick. Set together with
    /// `just_exited_active` when a crossing lands after the window expired.
    pub just_entered_active: bool,
    /// Active -> Quiet on this tick: the hold window expired.
    pub just_exited_active: bool,
    /// Another crossing inside the window pushed the peak higher.
    pub peak_raised: bool,
}

impl Evaluation {
    pub fn is_active(&self) -> bool {
        self.phase == SlapPhase::Active
    }

    /// True when the caller has something to redraw.
    pub fn has_change(&self) -> bool {
        self.just_entered_active || self.just_exited_active || self.peak_raised
    }
}

#[derive(Debug, Clone)]
pub struct SlapDetector {
    state: SlapState,
    timeout_ms: u32,
}

impl Default for SlapDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl SlapDetector {
    pub fn new() -> Self {
        Self::with_timeout(DISPLAY_TIMEOUT_MS)
    }

    pub fn with_timeout(timeout_ms: u32) -> Self {
        Self {
            state: SlapState::default(),
            timeout_ms,
        }
    }

    /// Advance the state machine by one tick.
    ///
    /// Only a magnitude strictly greater than `threshold` counts as a
    /// crossing. `now_ms` is a wrapping millisecond counter.
    pub fn evaluate(&mut self, magnitude: f32, threshold: f32, now_ms: u32) -> Evaluation {
        let crossed = magnitude > threshold;
        let mut just_entered_active = false;
        let mut just_exited_active = false;
        let mut peak_raised = false;

        match self.state.phase {
            SlapPhase::Quiet => {
                if crossed {
                    self.state.phase = SlapPhase::Active;
                    self.state.peak_magnitude = magnitude;
                    self.state.last_motion_ms = now_ms;
                    just_entered_active = true;
                }
            }
            SlapPhase::Active => {
                // Measured against the previous crossing: a window that ran
                // out between ticks ends before this sample is considered.
                let idle_ms = now_ms.wrapping_sub(self.state.last_motion_ms);
                if idle_ms >= self.timeout_ms {
                    just_exited_active = true;
                    if crossed {
                        self.state.peak_magnitude = magnitude;
                        self.state.last_motion_ms = now_ms;
                        just_entered_active = true;
                    } else {
                        self.state.phase = SlapPhase::Quiet;
                        self.state.peak_magnitude = 0.0;
                    }
                } else if crossed {
                    self.state.last_motion_ms = now_ms;
                    if magnitude > self.state.peak_magnitude {
                        self.state.peak_magnitude = magnitude;
                        peak_raised = true;
                    }
                }
            }
        }

        Evaluation {
            phase: self.state.phase,
            peak_magnitude: self.state.peak_magnitude,
            just_entered_active,
            just_exited_active,
            peak_raised,
        }
    }

    pub fn state(&self) -> &SlapState {
        &self.state
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }
}
