// Slap AI - State shared between tasks

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Mutex, MutexGuard};

use slap_core::link::LinkState;
use slap_core::settings::Threshold;

/// Detection threshold, written by the portal and read by the sensor task
/// on every tick.
pub struct SharedThreshold(AtomicU32);

impl SharedThreshold {
    pub fn new(threshold: Threshold) -> Self {
        Self(AtomicU32::new(threshold.to_bits()))
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    pub fn set(&self, threshold: Threshold) {
        self.0.store(threshold.to_bits(), Ordering::Relaxed);
    }
}

/// Snapshot of the radio for the status endpoint.
#[derive(Debug, Clone, Default)]
pub struct NetStatus {
    pub link: LinkState,
    pub ip: String,
    pub rssi: i32,
}

pub struct DeviceState {
    pub threshold: SharedThreshold,
    pub net: Mutex<NetStatus>,
    restart: AtomicBool,
}

impl DeviceState {
    pub fn new(threshold: Threshold) -> Self {
        Self {
            threshold: SharedThreshold::new(threshold),
            net: Mutex::new(NetStatus::default()),
            restart: AtomicBool::new(false),
        }
    }

    /// Ask the network task to reboot once in-flight responses have gone out.
    pub fn request_restart(&self) {
        self.restart.store(true, Ordering::SeqCst);
    }

    pub fn restart_requested(&self) -> bool {
        self.restart.load(Ordering::SeqCst)
    }

    pub fn net(&self) -> MutexGuard<'_, NetStatus> {
        lock(&self.net)
    }
}

/// Lock, recovering the data if another task panicked while holding it.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
