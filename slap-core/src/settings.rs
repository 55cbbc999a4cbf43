// Slap AI - Runtime Settings
//
// The persisted configuration model and the validation applied before any
// value reaches the store.

use core::fmt;

pub const THRESHOLD_MIN: f32 = 0.1;
pub const THRESHOLD_MAX: f32 = 5.0;
pub const THRESHOLD_DEFAULT: f32 = 1.0;

pub const SSID_MAX_LEN: usize = 32;
pub const PASSWORD_MAX_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum SettingsError {
    ThresholdOutOfRange(f32),
    EmptySsid,
    SsidTooLong(usize),
    PasswordTooLong(usize),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ThresholdOutOfRange(v) => write!(
                f,
                "threshold {} outside [{}, {}] g",
                v, THRESHOLD_MIN, THRESHOLD_MAX
            ),
            Self::EmptySsid => f.write_str("SSID is empty"),
            Self::SsidTooLong(n) => write!(f, "SSID is {} bytes, max {}", n, SSID_MAX_LEN),
            Self::PasswordTooLong(n) => {
                write!(f, "password is {} bytes, max {}", n, PASSWORD_MAX_LEN)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// ---------------------------------------------------------------------------
// Threshold
// ---------------------------------------------------------------------------

/// Detection threshold in g. Always finite and within range.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Threshold(f32);

impl Threshold {
    pub fn new(g: f32) -> Result<Self, SettingsError> {
        if g.is_finite() && (THRESHOLD_MIN..=THRESHOLD_MAX).contains(&g) {
            Ok(Self(g))
        } else {
            Err(SettingsError::ThresholdOutOfRange(g))
        }
    }

    /// Restore a threshold from its stored bit pattern, falling back to the
    /// default when the stored value is not valid.
    pub fn from_bits_or_default(bits: u32) -> Self {
        Self::new(f32::from_bits(bits)).unwrap_or_default()
    }

    pub fn get(self) -> f32 {
        self.0
    }

    pub fn to_bits(self) -> u32 {
        self.0.to_bits()
    }
}

impl Default for Threshold {
    fn default() -> Self {
        Self(THRESHOLD_DEFAULT)
    }
}

// ---------------------------------------------------------------------------
// WiFi credentials
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiCredentials {
    pub ssid: String,
    pub password: String,
}

impl WifiCredentials {
    pub fn new(ssid: &str, password: &str) -> Result<Self, SettingsError> {
        if ssid.is_empty() {
            return Err(SettingsError::EmptySsid);
        }
        if ssid.len() > SSID_MAX_LEN {
            return Err(SettingsError::SsidTooLong(ssid.len()));
        }
        if password.len() > PASSWORD_MAX_LEN {
            return Err(SettingsError::PasswordTooLong(password.len()));
        }
        Ok(Self {
            ssid: ssid.to_owned(),
            password: password.to_owned(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.ssid.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub ap_mode: bool,
    pub credentials: WifiCredentials,
    pub threshold: Threshold,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ap_mode: true,
            credentials: WifiCredentials::default(),
            threshold: Threshold::default(),
        }
    }
}

impl Settings {
    /// Boot into the access point when asked to, or when there is nothing to
    /// connect to.
    pub fn wants_access_point(&self) -> bool {
        self.ap_mode || self.credentials.is_empty()
    }

    /// Store new station credentials and leave AP mode.
    pub fn join_network(&mut self, credentials: WifiCredentials) {
        self.credentials = credentials;
        self.ap_mode = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_range_is_inclusive() {
        assert!(Threshold::new(0.1).is_ok());
        assert!(Threshold::new(5.0).is_ok());
        assert_eq!(Threshold::new(2.5).map(Threshold::get), Ok(2.5));
        assert!(Threshold::new(0.09).is_err());
        assert!(Threshold::new(5.01).is_err());
        assert!(Threshold::new(-1.0).is_err());
    }

    #[test]
    fn threshold_rejects_non_finite() {
        assert!(Threshold::new(f32::NAN).is_err());
        assert!(Threshold::new(f32::INFINITY).is_err());
    }

    #[test]
    fn threshold_bits_round_trip_and_fallback() {
        let t = Threshold::new(1.7).unwrap();
        assert_eq!(Threshold::from_bits_or_default(t.to_bits()), t);
        assert_eq!(
            Threshold::from_bits_or_default(f32::NAN.to_bits()).get(),
            THRESHOLD_DEFAULT
        );
        assert_eq!(Threshold::from_bits_or_default(0).get(), THRESHOLD_DEFAULT);
    }

    #[test]
    fn credentials_validation() {
        assert_eq!(WifiCredentials::new("", "x"), Err(SettingsError::EmptySsid));
        assert_eq!(
            WifiCredentials::new(&"s".repeat(33), ""),
            Err(SettingsError::SsidTooLong(33))
        );
        assert_eq!(
            WifiCredentials::new("home", &"p".repeat(65)),
            Err(SettingsError::PasswordTooLong(65))
        );
        let ok = WifiCredentials::new(&"s".repeat(32), "").unwrap();
        assert_eq!(ok.ssid.len(), 32);
        assert!(ok.password.is_empty());
    }

    #[test]
    fn defaults_start_in_access_point_mode() {
        let s = Settings::default();
        assert!(s.ap_mode);
        assert!(s.wants_access_point());
        assert_eq!(s.threshold.get(), 1.0);
    }

    #[test]
    fn joining_a_network_leaves_ap_mode() {
        let mut s = Settings::default();
        s.join_network(WifiCredentials::new("home", "secret123").unwrap());
        assert!(!s.ap_mode);
        assert!(!s.wants_access_point());
    }

    #[test]
    fn empty_ssid_forces_access_point() {
        let s = Settings {
            ap_mode: false,
            ..Settings::default()
        };
        assert!(s.wants_access_point());
    }
}
