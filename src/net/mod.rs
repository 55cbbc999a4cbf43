pub mod portal;
pub mod wifi;
