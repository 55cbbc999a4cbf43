// Slap AI - Sensor Task
//
// Samples the IMU once per 100 ms, runs the gravity filter and slap state
// machine, and reports slap start, peak and end to the UI task.

use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use slap_core::{PipelineConfig, SlapPipeline, TickReport};

use crate::config::*;
use crate::drivers::imu::Qmi8658;
use crate::events::UiEvent;
use crate::now_ms;
use crate::shared::DeviceState;

/// Log a read failure on the first occurrence and every this many after.
const READ_ERROR_LOG_EVERY: u32 = 50;

pub fn sensor_task(mut imu: Qmi8658, state: Arc<DeviceState>, ui_tx: Sender<UiEvent>) {
    log::info!("Sensor task started");

    if let Err(e) = imu.init() {
        log::error!("QMI8658C init failed in sensor task: {}", e);
        return;
    }

    let mut pipeline = SlapPipeline::new(PipelineConfig::default());
    let mut read_errors: u32 = 0;
    let mut slap_peak: f32 = 0.0;
    let poll = Duration::from_millis(SENSOR_POLL_INTERVAL_MS);

    loop {
        let now = now_ms();
        if !pipeline.is_due(now) {
            thread::sleep(poll);
            continue;
        }

        let threshold = state.threshold.get();
        let report = match imu.read() {
            Ok(sample) => {
                read_errors = 0;
                let report = pipeline.tick(sample.accel, threshold, now);
                if let Some(report) = &report {
                    log::trace!(
                        "accel=({:.3},{:.3},{:.3}) gyro=({:.1},{:.1},{:.1}) temp={:.1}°C mag={:.3} phase={:?}",
                        sample.accel.x,
                        sample.accel.y,
                        sample.accel.z,
                        sample.gyro.x,
                        sample.gyro.y,
                        sample.gyro.z,
                        sample.temperature,
                        report.magnitude,
                        report.evaluation.phase
                    );
                }
                report
            }
            Err(e) => {
                if read_errors % READ_ERROR_LOG_EVERY == 0 {
                    log::warn!("IMU read error ({} in a row): {}", read_errors + 1, e);
                }
                read_errors = read_errors.wrapping_add(1);
                // Keep the hold window running so a slap still ends.
                pipeline.skip(threshold, now)
            }
        };

        if let Some(report) = report {
            if let Some(event) = slap_event(&report, threshold, &mut slap_peak) {
                if ui_tx.send(event).is_err() {
                    log::warn!("UI channel closed, exiting sensor task");
                    return;
                }
            }
        }

        thread::sleep(poll);
    }
}

/// Map a tick to the UI event it implies, logging slap start and end.
fn slap_event(report: &TickReport, threshold: f32, slap_peak: &mut f32) -> Option<UiEvent> {
    let eval = report.evaluation;
    if eval.just_exited_active {
        log::info!("Slap ended, peak {:.2}g", slap_peak);
    }
    if eval.is_active() {
        *slap_peak = eval.peak_magnitude;
    }

    if eval.just_entered_active {
        log::info!(
            "SLAP! magnitude={:.2}g threshold={:.2}g",
            eval.peak_magnitude,
            threshold
        );
        Some(UiEvent::SlapStarted(eval.peak_magnitude))
    } else if eval.peak_raised {
        log::debug!("Slap peak raised to {:.2}g", eval.peak_magnitude);
        Some(UiEvent::SlapPeak(eval.peak_magnitude))
    } else if eval.just_exited_active {
        Some(UiEvent::SlapEnded)
    } else {
        None
    }
}
