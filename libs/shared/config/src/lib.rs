use std::env;

use chrono::NaiveTime;
use serde::Serialize;
use tracing::warn;

pub const DEFAULT_CLINIC_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_SLOT_HEIGHT_PX: u32 = 48;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Debug, Clone, Serialize)]
pub struct AppConfig {
    pub clinic_api_url: String,
    pub clinic_open_time: NaiveTime,
    pub clinic_last_slot: NaiveTime,
    pub slot_height_px: u32,
    pub break_time: Option<NaiveTime>,
    pub unavailable_from: Option<NaiveTime>,
    pub request_timeout_secs: u64,
    pub bind_addr: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            clinic_api_url: DEFAULT_CLINIC_API_URL.to_string(),
            clinic_open_time: default_open_time(),
            clinic_last_slot: default_last_slot(),
            slot_height_px: DEFAULT_SLOT_HEIGHT_PX,
            break_time: None,
            unavailable_from: None,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Every missing or
    /// unparsable value falls back to its default with a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let clinic_api_url = lookup("CLINIC_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or_else(|| {
                warn!("CLINIC_API_URL not set, using {}", DEFAULT_CLINIC_API_URL);
                defaults.clinic_api_url.clone()
            });

        let config = Self {
            clinic_api_url,
            clinic_open_time: time_var(&lookup, "CLINIC_OPEN_TIME")
                .unwrap_or(defaults.clinic_open_time),
            clinic_last_slot: time_var(&lookup, "CLINIC_LAST_SLOT")
                .unwrap_or(defaults.clinic_last_slot),
            slot_height_px: parsed_var(&lookup, "SLOT_HEIGHT_PX")
                .unwrap_or(defaults.slot_height_px),
            break_time: time_var(&lookup, "BREAK_TIME"),
            unavailable_from: time_var(&lookup, "UNAVAILABLE_FROM"),
            request_timeout_secs: parsed_var(&lookup, "REQUEST_TIMEOUT_SECS")
                .unwrap_or(defaults.request_timeout_secs),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
        };

        if !config.has_valid_window() {
            warn!(
                "Operating window {}..{} is invalid, falling back to {}..{}",
                config.clinic_open_time,
                config.clinic_last_slot,
                default_open_time(),
                default_last_slot()
            );
            return Self {
                clinic_open_time: default_open_time(),
                clinic_last_slot: default_last_slot(),
                ..config
            };
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.clinic_api_url.is_empty()
    }

    /// The window must start no later than its last slot and both bounds must
    /// sit on a half-hour boundary.
    pub fn has_valid_window(&self) -> bool {
        use chrono::Timelike;

        let aligned = |t: NaiveTime| t.minute() % 30 == 0 && t.second() == 0;
        self.clinic_open_time <= self.clinic_last_slot
            && aligned(self.clinic_open_time)
            && aligned(self.clinic_last_slot)
    }
}

fn default_open_time() -> NaiveTime {
    NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn default_last_slot() -> NaiveTime {
    NaiveTime::from_hms_opt(20, 0, 0).unwrap_or(NaiveTime::MIN)
}

fn time_var<F>(lookup: &F, key: &str) -> Option<NaiveTime>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(key)?;
    match NaiveTime::parse_from_str(raw.trim(), "%H:%M") {
        Ok(time) => Some(time),
        Err(_) => {
            warn!("{} has invalid time '{}', expected HH:MM", key, raw);
            None
        }
    }
}

fn parsed_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("{} has invalid value '{}', using default", key, raw);
            None
        }
    }
}
