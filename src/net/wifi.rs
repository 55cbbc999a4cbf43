// Slap AI - WiFi Manager
//
// Brings the radio up either as the open "slap-ai" access point or as a
// station joining the stored network. Station connects are polled rather
// than blocked on, and fall back to the access point on timeout. A joined
// station is advertised as slap-ai.local.

use std::net::Ipv4Addr;
use std::sync::{Arc, Mutex};

use anyhow::anyhow;
use esp_idf_hal::modem::Modem;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::mdns::EspMdns;
use esp_idf_svc::ipv4::{self, Mask, RouterConfiguration, Subnet};
use esp_idf_svc::netif::{EspNetif, NetifConfiguration, NetifStack};
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::wifi::{
    AccessPointConfiguration, AuthMethod, ClientConfiguration, Configuration, EspWifi, WifiDriver,
};
use slap_core::link::{Link, LinkAction, LinkState};
use slap_core::settings::WifiCredentials;
use slap_core::view::View;

use crate::config::*;
use crate::shared::{lock, NetStatus};
use crate::store::ConfigStore;

pub struct WifiManager {
    wifi: EspWifi<'static>,
    link: Link,
    store: Arc<Mutex<ConfigStore>>,
    ssid: String,
    mdns: Option<EspMdns>,
}

impl WifiManager {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
        store: Arc<Mutex<ConfigStore>>,
    ) -> anyhow::Result<Self> {
        let [a, b, c, d] = AP_ADDRESS;
        let ap_netif = EspNetif::new_with_conf(&NetifConfiguration {
            ip_configuration: Some(ipv4::Configuration::Router(RouterConfiguration {
                subnet: Subnet {
                    gateway: Ipv4Addr::new(a, b, c, d),
                    mask: Mask(24),
                },
                dhcp_enabled: true,
                dns: None,
                secondary_dns: None,
            })),
            ..NetifConfiguration::wifi_default_router()
        })?;

        let driver = WifiDriver::new(modem, sysloop, Some(nvs))?;
        let wifi = EspWifi::wrap_all(driver, EspNetif::new(NetifStack::Sta)?, ap_netif)?;

        Ok(Self {
            wifi,
            link: Link::new(),
            store,
            ssid: String::new(),
            mdns: None,
        })
    }

    /// Start in whichever mode the stored settings ask for.
    pub fn begin(&mut self, now_ms: u32) -> anyhow::Result<()> {
        let settings = lock(&self.store).settings().clone();
        if settings.wants_access_point() {
            self.start_access_point()
        } else {
            self.start_station(&settings.credentials, now_ms)
        }
    }

    fn start_access_point(&mut self) -> anyhow::Result<()> {
        let config = Configuration::AccessPoint(AccessPointConfiguration {
            ssid: AP_SSID
                .try_into()
                .map_err(|_| anyhow!("AP SSID too long"))?,
            auth_method: AuthMethod::None,
            channel: AP_CHANNEL,
            ..Default::default()
        });

        let result = self
            .wifi
            .set_configuration(&config)
            .and_then(|_| self.wifi.start());
        self.link.access_point_started(result.is_ok());
        self.ssid = AP_SSID.to_owned();

        match result {
            Ok(()) => {
                log::info!(
                    "Access point '{}' up at {}",
                    AP_SSID,
                    self.ap_ip().unwrap_or_default()
                );
                Ok(())
            }
            Err(e) => {
                log::error!("Access point start failed: {}", e);
                Err(e.into())
            }
        }
    }

    fn start_station(&mut self, creds: &WifiCredentials, now_ms: u32) -> anyhow::Result<()> {
        let auth_method = if creds.password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: creds
                .ssid
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("SSID too long"))?,
            password: creds
                .password
                .as_str()
                .try_into()
                .map_err(|_| anyhow!("Password too long"))?,
            auth_method,
            ..Default::default()
        });

        self.wifi.set_configuration(&config)?;
        self.wifi.start()?;
        self.wifi.connect()?;
        self.link.connect_started(now_ms);
        self.ssid = creds.ssid.clone();

        log::info!("Connecting to '{}'", creds.ssid);
        Ok(())
    }

    /// Advance a pending station connect. Returns true when the visible state
    /// changed.
    pub fn poll(&mut self, now_ms: u32) -> anyhow::Result<bool> {
        if !matches!(self.link.state(), LinkState::Connecting { .. }) {
            return Ok(false);
        }

        let up = self.wifi.is_up().unwrap_or(false);
        match self.link.poll(up, now_ms) {
            LinkAction::None => Ok(false),
            LinkAction::Connected => {
                log::info!(
                    "WiFi connected: ip={} rssi={} dBm",
                    self.sta_ip().unwrap_or_default(),
                    station_rssi()
                );
                self.start_mdns();
                Ok(true)
            }
            LinkAction::FallBackToAccessPoint => {
                log::warn!(
                    "WiFi connect to '{}' timed out, falling back to AP mode",
                    self.ssid
                );
                if let Err(e) = self.wifi.disconnect() {
                    log::warn!("WiFi disconnect failed: {}", e);
                }
                self.wifi.stop()?;
                lock(&self.store).set_ap_mode(true)?;
                self.start_access_point()?;
                Ok(true)
            }
        }
    }

    fn start_mdns(&mut self) {
        if self.mdns.is_some() {
            return;
        }
        let started = EspMdns::take().and_then(|mut mdns| {
            mdns.set_hostname(MDNS_HOSTNAME)?;
            mdns.set_instance_name(MDNS_HOSTNAME)?;
            mdns.add_service(None, "_http", "_tcp", HTTP_PORT, &[])?;
            Ok(mdns)
        });
        match started {
            Ok(mdns) => {
                log::info!("mDNS responder started: http://{}.local", MDNS_HOSTNAME);
                self.mdns = Some(mdns);
            }
            Err(e) => log::warn!("mDNS start failed: {}", e),
        }
    }

    pub fn state(&self) -> LinkState {
        self.link.state()
    }

    /// The network view for the display's base layer.
    pub fn view(&self) -> View {
        match self.link.state() {
            LinkState::AccessPoint => View::AccessPoint {
                ip: self.ap_ip().unwrap_or_default(),
            },
            LinkState::Connecting { .. } => View::Connecting {
                ssid: self.ssid.clone(),
            },
            LinkState::Connected => View::Connected {
                ip: self.sta_ip().unwrap_or_default(),
            },
            LinkState::Idle | LinkState::Failed => View::Idle,
        }
    }

    pub fn status(&self) -> NetStatus {
        let is_ap_mode = self.link.is_access_point();
        let connected = self.link.is_connected();
        let ip = if is_ap_mode {
            self.ap_ip()
        } else if connected {
            self.sta_ip()
        } else {
            None
        };
        NetStatus {
            link: self.link.state(),
            ip: ip.unwrap_or_default(),
            rssi: if connected { station_rssi() } else { 0 },
        }
    }

    fn ap_ip(&self) -> Option<String> {
        let info = self.wifi.ap_netif().get_ip_info().ok()?;
        Some(info.ip.to_string())
    }

    fn sta_ip(&self) -> Option<String> {
        let info = self.wifi.sta_netif().get_ip_info().ok()?;
        Some(info.ip.to_string())
    }
}

/// Signal strength of the joined AP, 0 when unavailable.
fn station_rssi() -> i32 {
    unsafe {
        let mut info: esp_idf_sys::wifi_ap_record_t = core::mem::zeroed();
        if esp_idf_sys::esp!(esp_idf_sys::esp_wifi_sta_get_ap_info(&mut info)).is_ok() {
            info.rssi as i32
        } else {
            0
        }
    }
}
