// Slap AI - Target-independent logic
//
// Everything in here builds and tests on the host. The firmware crate wires
// these pieces to the IMU, display, radio and button.

pub mod button;
pub mod link;
pub mod motion;
pub mod pipeline;
pub mod portal;
pub mod settings;
pub mod slap;
pub mod view;

pub use motion::{AccelSample, MotionEstimator, Vector3};
pub use pipeline::{PipelineConfig, SlapPipeline, TickReport};
pub use slap::{Evaluation, SlapDetector, SlapPhase, SlapState};
