// Slap AI - System Events & Data Types

use slap_core::view::View;
use slap_core::Vector3;

// ---------------------------------------------------------------------------
// Sensor Data (6-axis IMU reading from QMI8658C)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone, Copy, Default)]
pub struct ImuSample {
    /// Acceleration in g.
    pub accel: Vector3,
    /// Angular rate in °/s.
    pub gyro: Vector3,
    pub temperature: f32,
}

// ---------------------------------------------------------------------------
// UI Events (sent to the UI task via channel)
// ---------------------------------------------------------------------------
#[derive(Debug, Clone)]
pub enum UiEvent {
    /// A new slap crossed the threshold.
    SlapStarted(f32),
    /// A later jolt in the same hold window raised the peak.
    SlapPeak(f32),
    /// The hold window expired.
    SlapEnded,
    /// WiFi state changed; the view to show underneath any slap.
    Network(View),
    /// Button held, progress toward the factory-reset long press.
    ButtonHeld(f32),
    /// Button released before the long press completed.
    ButtonReleased,
    /// Button held for the full long-press duration.
    ButtonLongPress,
}
