// Slap AI - Configuration Portal API
//
// JSON bodies exchanged with the settings page. Parsing and validation live
// here so the HTTP handlers only move bytes.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::link::LinkState;
use crate::settings::{SettingsError, Threshold, WifiCredentials};

/// Largest request body the portal will buffer for a JSON endpoint.
pub const MAX_JSON_BODY: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub enum PortalError {
    BodyTooLarge(usize),
    InvalidJson,
    InvalidThreshold,
    Settings(SettingsError),
}

impl PortalError {
    /// Message returned to the browser in `{"error": ...}`.
    pub fn message(&self) -> &'static str {
        match self {
            Self::BodyTooLarge(_) => "Body too large",
            Self::InvalidJson => "Invalid JSON",
            Self::InvalidThreshold => "Invalid threshold",
            Self::Settings(SettingsError::EmptySsid) => "SSID required",
            Self::Settings(SettingsError::SsidTooLong(_)) => "SSID too long",
            Self::Settings(SettingsError::PasswordTooLong(_)) => "Password too long",
            Self::Settings(SettingsError::ThresholdOutOfRange(_)) => "Invalid threshold",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            Self::BodyTooLarge(_) => 413,
            _ => 400,
        }
    }

    pub fn to_json(&self) -> String {
        error_json(self.message())
    }
}

impl fmt::Display for PortalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BodyTooLarge(n) => write!(f, "request body of {} bytes exceeds {}", n, MAX_JSON_BODY),
            Self::Settings(e) => write!(f, "{}", e),
            other => f.write_str(other.message()),
        }
    }
}

impl std::error::Error for PortalError {}

impl From<SettingsError> for PortalError {
    fn from(e: SettingsError) -> Self {
        match e {
            SettingsError::ThresholdOutOfRange(_) => Self::InvalidThreshold,
            other => Self::Settings(other),
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ThresholdRequest {
    // Absent reads as 0 and fails the range check.
    #[serde(default)]
    threshold: f32,
}

#[derive(Debug, Deserialize)]
struct WifiRequest {
    #[serde(default)]
    ssid: String,
    #[serde(default)]
    password: String,
}

fn check_len(body: &[u8]) -> Result<(), PortalError> {
    if body.len() > MAX_JSON_BODY {
        return Err(PortalError::BodyTooLarge(body.len()));
    }
    Ok(())
}

/// `POST /api/threshold` body: `{"threshold": 1.5}`.
pub fn parse_threshold(body: &[u8]) -> Result<Threshold, PortalError> {
    check_len(body)?;
    let req: ThresholdRequest =
        serde_json::from_slice(body).map_err(|_| PortalError::InvalidJson)?;
    Ok(Threshold::new(req.threshold)?)
}

/// `POST /api/wifi` body: `{"ssid": "...", "password": "..."}`.
pub fn parse_wifi(body: &[u8]) -> Result<WifiCredentials, PortalError> {
    check_len(body)?;
    let req: WifiRequest = serde_json::from_slice(body).map_err(|_| PortalError::InvalidJson)?;
    Ok(WifiCredentials::new(&req.ssid, &req.password)?)
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

/// `GET /api/status`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(rename = "isAPMode")]
    pub is_ap_mode: bool,
    pub ip: String,
    pub rssi: i32,
    pub threshold: f32,
    pub ssid: String,
}

impl StatusResponse {
    /// `ssid` is the configured station network, which stays visible after
    /// a failed connect has dropped the radio back to the access point.
    pub fn new(link: LinkState, ip: String, rssi: i32, threshold: f32, ssid: String) -> Self {
        Self {
            status: link.label().to_owned(),
            is_ap_mode: link == LinkState::AccessPoint,
            ip,
            rssi,
            threshold,
            ssid,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| error_json("Serialization failed"))
    }
}

pub const SUCCESS_JSON: &str = r#"{"success":true}"#;

pub fn error_json(message: &str) -> String {
    serde_json::json!({ "error": message }).to_string()
}
