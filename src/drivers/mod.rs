pub mod display;
pub mod imu;
