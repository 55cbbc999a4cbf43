// Slap AI - Persistent Settings (NVS)
//
// Keeps an in-memory copy of the settings in sync with the "slap-ai" NVS
// namespace. Every setter writes through.

use esp_idf_svc::nvs::{EspDefaultNvsPartition, EspNvs, NvsDefault};
use slap_core::settings::{
    Settings, Threshold, WifiCredentials, PASSWORD_MAX_LEN, SSID_MAX_LEN,
};

use crate::config::NVS_NAMESPACE;

const KEY_AP_MODE: &str = "isAPMode";
const KEY_SSID: &str = "ssid";
const KEY_PASSWORD: &str = "password";
const KEY_THRESHOLD: &str = "threshold";

const ALL_KEYS: [&str; 4] = [KEY_AP_MODE, KEY_SSID, KEY_PASSWORD, KEY_THRESHOLD];

pub struct ConfigStore {
    nvs: EspNvs<NvsDefault>,
    settings: Settings,
}

impl ConfigStore {
    pub fn open(partition: EspDefaultNvsPartition) -> anyhow::Result<Self> {
        let nvs = EspNvs::new(partition, NVS_NAMESPACE, true)?;
        let mut store = Self {
            nvs,
            settings: Settings::default(),
        };
        store.load()?;
        Ok(store)
    }

    /// Read every key, keeping defaults for anything missing.
    pub fn load(&mut self) -> anyhow::Result<()> {
        let ap_mode = self.nvs.get_u8(KEY_AP_MODE)?.map_or(true, |v| v != 0);

        // +1 for the NUL terminator NVS stores with strings.
        let mut ssid_buf = [0u8; SSID_MAX_LEN + 1];
        let ssid = self
            .nvs
            .get_str(KEY_SSID, &mut ssid_buf)?
            .unwrap_or_default()
            .to_owned();
        let mut password_buf = [0u8; PASSWORD_MAX_LEN + 1];
        let password = self
            .nvs
            .get_str(KEY_PASSWORD, &mut password_buf)?
            .unwrap_or_default()
            .to_owned();

        let threshold = self
            .nvs
            .get_u32(KEY_THRESHOLD)?
            .map(Threshold::from_bits_or_default)
            .unwrap_or_default();

        self.settings = Settings {
            ap_mode,
            credentials: WifiCredentials { ssid, password },
            threshold,
        };

        log::info!(
            "Settings loaded: mode={} ssid='{}' threshold={:.2}g",
            if self.settings.wants_access_point() { "AP" } else { "STA" },
            self.settings.credentials.ssid,
            self.settings.threshold.get()
        );
        Ok(())
    }

    pub fn save(&mut self) -> anyhow::Result<()> {
        let s = &self.settings;
        self.nvs.set_u8(KEY_AP_MODE, s.ap_mode as u8)?;
        self.nvs.set_str(KEY_SSID, &s.credentials.ssid)?;
        self.nvs.set_str(KEY_PASSWORD, &s.credentials.password)?;
        self.nvs.set_u32(KEY_THRESHOLD, s.threshold.to_bits())?;
        log::debug!("Settings saved");
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_threshold(&mut self, threshold: Threshold) -> anyhow::Result<()> {
        self.settings.threshold = threshold;
        self.nvs.set_u32(KEY_THRESHOLD, threshold.to_bits())?;
        log::info!("Threshold set to {:.2}g", threshold.get());
        Ok(())
    }

    pub fn set_ap_mode(&mut self, ap_mode: bool) -> anyhow::Result<()> {
        self.settings.ap_mode = ap_mode;
        self.nvs.set_u8(KEY_AP_MODE, ap_mode as u8)?;
        Ok(())
    }

    /// Store station credentials and switch to station mode on next boot.
    pub fn join_network(&mut self, credentials: WifiCredentials) -> anyhow::Result<()> {
        log::info!("WiFi credentials saved for '{}'", credentials.ssid);
        self.settings.join_network(credentials);
        self.save()
    }

    /// Erase every stored key and fall back to defaults.
    pub fn factory_reset(&mut self) -> anyhow::Result<()> {
        for key in ALL_KEYS {
            self.nvs.remove(key)?;
        }
        self.settings = Settings::default();
        log::warn!("Factory reset: settings erased");
        Ok(())
    }
}
