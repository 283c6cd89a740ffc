use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Read},
    net::{Ipv4Addr, SocketAddr, SocketAddrV4},
    path::{Path, PathBuf},
};
use tracing::{info, warn};

pub const SETTINGS_PATH: &str = "core/settings.json";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("could not read settings: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings file is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid value {value:?} for {name}")]
    InvalidValue { name: String, value: String },
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Settings {
    pub ipv4_addr: Ipv4Setting,
    pub port: U16Setting,
    pub remote_url: StrSetting,
    pub data_path: StrSetting,
    pub key_path: StrSetting,
    pub session_ttl_hours: U32Setting,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StrSetting {
    pub name: String,
    pub value: String,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct U16Setting {
    pub name: String,
    pub value: u16,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct U32Setting {
    pub name: String,
    pub value: u32,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Ipv4Setting {
    pub name: String,
    pub value: Ipv4Addr,
}

impl Settings {
    /// Reads `path`, falling back to [`Settings::new`] when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            info!("No settings at {}, using defaults", path.display());
            return Ok(Settings::new());
        }
        let mut buffer = Vec::new();
        BufReader::new(File::open(path)?).read_to_end(&mut buffer)?;
        Ok(serde_json::from_slice::<Settings>(&buffer)?)
    }

    /// Applies `FOLIO_*` overrides; `lookup` is `std::env::var` outside tests.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("FOLIO_HOST") {
            self.ipv4_addr.value = parse_setting("FOLIO_HOST", &value)?;
        }
        if let Some(value) = lookup("FOLIO_PORT") {
            self.port.value = parse_setting("FOLIO_PORT", &value)?;
        }
        if let Some(value) = lookup("FOLIO_SESSION_TTL_HOURS") {
            self.session_ttl_hours.value = parse_setting("FOLIO_SESSION_TTL_HOURS", &value)?;
        }
        if let Some(value) = lookup("FOLIO_DATA_DIR") {
            self.data_path.value = value;
        }
        if let Some(value) = lookup("FOLIO_KEY_PATH") {
            self.key_path.value = value;
        }
        if let Some(value) = lookup("FOLIO_REMOTE_URL") {
            self.remote_url.value = value;
        }
        if self.session_ttl_hours.value == 0 {
            warn!("Session TTL of 0 hours makes every login expire immediately");
        }
        Ok(())
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::V4(SocketAddrV4::new(self.ipv4_addr.value, self.port.value))
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.data_path.value)
    }

    pub fn key_file(&self) -> PathBuf {
        PathBuf::from(&self.key_path.value)
    }

    pub fn remote_url(&self) -> Option<&str> {
        let url = self.remote_url.value.trim();
        (!url.is_empty()).then_some(url)
    }

    pub fn new() -> Self {
        Settings {
            ipv4_addr: Ipv4Setting {
                name: "Ipv4 Address".to_string(),
                value: Ipv4Addr::new(127, 0, 0, 1),
            },
            port: U16Setting {
                name: "Port".to_string(),
                value: 4010,
            },
            remote_url: StrSetting {
                name: "Remote URL".to_string(),
                value: String::new(),
            },
            data_path: StrSetting {
                name: "data_path".to_string(),
                value: "data".to_string(),
            },
            key_path: StrSetting {
                name: "key_path".to_string(),
                value: "key/pass.key".to_string(),
            },
            session_ttl_hours: U32Setting {
                name: "Session TTL (hours)".to_string(),
                value: 12,
            },
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings::new()
    }
}

fn parse_setting<T: std::str::FromStr>(name: &str, value: &str) -> Result<T, SettingsError> {
    value
        .trim()
        .parse::<T>()
        .map_err(|_| SettingsError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("settings.json")).unwrap();

        assert_eq!(settings.port.value, 4010);
        assert_eq!(settings.data_dir(), PathBuf::from("data"));
        assert!(settings.remote_url().is_none());
    }

    #[test]
    fn file_values_are_read() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        let mut settings = Settings::new();
        settings.port.value = 9000;
        std::fs::write(&path, serde_json::to_string(&settings).unwrap()).unwrap();

        let loaded = Settings::load(&path).unwrap();

        assert_eq!(loaded.port.value, 9000);
    }

    #[test]
    fn environment_overrides_file() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FOLIO_PORT", "8088"),
            ("FOLIO_HOST", "0.0.0.0"),
            ("FOLIO_DATA_DIR", "/srv/folio"),
            ("FOLIO_REMOTE_URL", "https://cdn.example.com/projects.json"),
        ]);
        let mut settings = Settings::new();

        settings
            .apply_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(settings.addr().to_string(), "0.0.0.0:8088");
        assert_eq!(settings.data_dir(), PathBuf::from("/srv/folio"));
        assert_eq!(
            settings.remote_url(),
            Some("https://cdn.example.com/projects.json")
        );
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut settings = Settings::new();

        let result = settings.apply_overrides(|key| (key == "FOLIO_PORT").then(|| "http".to_string()));

        assert!(matches!(
            result,
            Err(SettingsError::InvalidValue { ref name, .. }) if name == "FOLIO_PORT"
        ));
    }
}
