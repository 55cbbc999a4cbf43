// Slap AI - Configuration Portal
//
// Serves the settings page and its JSON API, plus firmware upload.
//
//   GET  /               settings page
//   GET  /api/status     link state, IP, RSSI, threshold
//   POST /api/threshold  {"threshold": g}
//   POST /api/wifi       {"ssid", "password"}, then restart
//   POST /api/reset      erase settings, then restart
//   POST /api/update     raw firmware image, then restart

use std::sync::{Arc, Mutex};

use esp_idf_svc::http::server::{Configuration, EspHttpConnection, EspHttpServer, Request};
use esp_idf_svc::http::{Headers, Method};
use esp_idf_svc::io::{Read, Write};
use esp_idf_svc::ota::EspOta;
use log::{info, warn};
use slap_core::portal::{
    error_json, parse_threshold, parse_wifi, StatusResponse, MAX_JSON_BODY, SUCCESS_JSON,
};

use crate::config::*;
use crate::shared::{lock, DeviceState};
use crate::store::ConfigStore;

const INDEX_HTML: &str = include_str!("index.html");

/// Log OTA progress every this many bytes.
const OTA_LOG_EVERY: usize = 64 * 1024;

pub struct Portal {
    _server: EspHttpServer<'static>,
}

impl Portal {
    pub fn start(state: Arc<DeviceState>, store: Arc<Mutex<ConfigStore>>) -> anyhow::Result<Self> {
        let config = Configuration {
            http_port: HTTP_PORT,
            max_uri_handlers: 8,
            stack_size: HTTP_STACK_SIZE,
            ..Default::default()
        };
        let mut server = EspHttpServer::new(&config)?;

        server.fn_handler("/", Method::Get, |req| -> anyhow::Result<()> {
            let len = INDEX_HTML.len().to_string();
            let mut resp = req.into_response(
                200,
                None,
                &[
                    ("Content-Type", "text/html; charset=utf-8"),
                    ("Content-Length", &len),
                ],
            )?;
            resp.write_all(INDEX_HTML.as_bytes())?;
            Ok(())
        })?;

        let status_state = state.clone();
        let status_store = store.clone();
        server.fn_handler("/api/status", Method::Get, move |req| -> anyhow::Result<()> {
            let net = status_state.net().clone();
            let ssid = lock(&status_store).settings().credentials.ssid.clone();
            let status = StatusResponse::new(
                net.link,
                net.ip,
                net.rssi,
                status_state.threshold.get(),
                ssid,
            );
            send_json(req, 200, &status.to_json())
        })?;

        let threshold_state = state.clone();
        let threshold_store = store.clone();
        server.fn_handler("/api/threshold", Method::Post, move |mut req| -> anyhow::Result<()> {
            let body = read_body(&mut req)?;
            match parse_threshold(&body) {
                Ok(threshold) => {
                    lock(&threshold_store).set_threshold(threshold)?;
                    threshold_state.threshold.set(threshold);
                    send_json(req, 200, SUCCESS_JSON)
                }
                Err(e) => {
                    warn!("POST /api/threshold rejected: {}", e);
                    send_json(req, e.status(), &e.to_json())
                }
            }
        })?;

        let wifi_state = state.clone();
        let wifi_store = store.clone();
        server.fn_handler("/api/wifi", Method::Post, move |mut req| -> anyhow::Result<()> {
            let body = read_body(&mut req)?;
            match parse_wifi(&body) {
                Ok(credentials) => {
                    lock(&wifi_store).join_network(credentials)?;
                    send_json(req, 200, SUCCESS_JSON)?;
                    wifi_state.request_restart();
                    Ok(())
                }
                Err(e) => {
                    warn!("POST /api/wifi rejected: {}", e);
                    send_json(req, e.status(), &e.to_json())
                }
            }
        })?;

        let reset_state = state.clone();
        let reset_store = store;
        server.fn_handler("/api/reset", Method::Post, move |req| -> anyhow::Result<()> {
            lock(&reset_store).factory_reset()?;
            send_json(req, 200, SUCCESS_JSON)?;
            reset_state.request_restart();
            Ok(())
        })?;

        let ota_state = state;
        server.fn_handler("/api/update", Method::Post, move |mut req| -> anyhow::Result<()> {
            let expected = req.content_len().unwrap_or(0) as usize;
            if expected == 0 {
                return send_json(req, 400, &error_json("Empty firmware image"));
            }

            info!("OTA update started ({} bytes)", expected);
            let mut ota = EspOta::new()?;
            let mut update = ota.initiate_update()?;
            let mut buf = vec![0u8; OTA_CHUNK_SIZE];
            let mut written = 0usize;
            let mut next_log = OTA_LOG_EVERY;

            loop {
                let n = match req.read(&mut buf) {
                    Ok(n) => n,
                    Err(e) => {
                        warn!("OTA receive failed after {} bytes: {}", written, e);
                        update.abort()?;
                        return Err(e.into());
                    }
                };
                if n == 0 {
                    break;
                }
                if let Err(e) = update.write_all(&buf[..n]) {
                    warn!("OTA flash write failed after {} bytes: {}", written, e);
                    update.abort()?;
                    return Err(e.into());
                }
                written += n;
                if written >= next_log {
                    info!("OTA progress: {}/{} bytes", written, expected);
                    next_log += OTA_LOG_EVERY;
                }
            }

            if written != expected {
                warn!("OTA image truncated: {}/{} bytes", written, expected);
                update.abort()?;
                return send_json(req, 400, &error_json("Incomplete firmware image"));
            }

            update.complete()?;
            info!("OTA update written ({} bytes), restarting", written);
            send_json(req, 200, SUCCESS_JSON)?;
            ota_state.request_restart();
            Ok(())
        })?;

        info!("Portal listening on port {}", HTTP_PORT);
        Ok(Self { _server: server })
    }
}

/// Read a JSON request body. Reads at most one byte past the limit so
/// oversized bodies are still reported as too large.
fn read_body(req: &mut Request<&mut EspHttpConnection>) -> anyhow::Result<Vec<u8>> {
    let limit = MAX_JSON_BODY + 1;
    let mut body = vec![0u8; limit];
    let mut filled = 0;
    while filled < limit {
        let n = req.read(&mut body[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    body.truncate(filled);
    Ok(body)
}

fn send_json(req: Request<&mut EspHttpConnection>, status: u16, body: &str) -> anyhow::Result<()> {
    let mut resp = req.into_response(status, None, &[("Content-Type", "application/json")])?;
    resp.write_all(body.as_bytes())?;
    Ok(())
}
