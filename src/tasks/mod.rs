pub mod network;
pub mod sensor;
pub mod ui;
