use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};

const DEFAULT_PORT: u16 = 5001;
const DEFAULT_HOST: &str = "0.0.0.0";
const CONFIG_RELATIVE_PATH: &str = "mongoose/mongoose.json";

/// Operating mode. Unrecognised names are kept verbatim so they still show up
/// in answers and status payloads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Mode {
    /// Answers come from the local template table only.
    #[default]
    Passive,
    /// Reserved; nothing in the router behaves differently yet.
    Active,
    Other(String),
}

impl From<String> for Mode {
    fn from(name: String) -> Self {
        match name.as_str() {
            "passive" => Mode::Passive,
            "active" => Mode::Active,
            _ => Mode::Other(name),
        }
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.to_string()
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Passive => f.write_str("passive"),
            Mode::Active => f.write_str("active"),
            Mode::Other(name) => f.write_str(name),
        }
    }
}

/// Operator record read from `mongoose.json`. Built once at start-up and
/// shared read-only with every handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorConfig {
    #[serde(default = "default_operator")]
    pub operator: String,
    #[serde(default = "now_iso")]
    pub attached: String,
    #[serde(default)]
    pub mode: Mode,
}

fn default_operator() -> String {
    "Unknown".to_string()
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            operator: default_operator(),
            attached: now_iso(),
            mode: Mode::Passive,
        }
    }
}

impl fmt::Display for OperatorConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "operator={}, mode={}, attached={}",
            self.operator, self.mode, self.attached
        )
    }
}

async fn read_config(path: &Path) -> Result<OperatorConfig> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let config = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", path.display()))?;
    Ok(config)
}

/// Load the operator config, falling back to the default record on any
/// failure. Never returns an error.
pub async fn load_config(path: &Path) -> OperatorConfig {
    match read_config(path).await {
        Ok(config) => {
            info!("Loaded Mongoose config from {}", path.display());
            if let Mode::Other(name) = &config.mode {
                warn!("Unrecognised Mongoose mode {:?}, using it as-is", name);
            }
            config
        }
        Err(e) => {
            warn!("Could not load Mongoose config: {:#}", e);
            OperatorConfig::default()
        }
    }
}

/// `mongoose/mongoose.json` beside the executable, else beside the working
/// directory.
pub fn default_config_path() -> PathBuf {
    let beside_exe = env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join(CONFIG_RELATIVE_PATH)));

    match beside_exe {
        Some(path) if path.exists() => path,
        _ => PathBuf::from(CONFIG_RELATIVE_PATH),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub debug: bool,
    pub config_path: PathBuf,
}

impl ServerSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("ROUTER_PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("ROUTER_PORT must be a port number, got {:?}", raw))?,
            None => DEFAULT_PORT,
        };

        let host = lookup("ROUTER_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let debug = lookup("ROUTER_DEBUG")
            .or_else(|| lookup("FLASK_DEBUG"))
            .map(|v| v.trim().eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let config_path = lookup("MONGOOSE_CONFIG_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_config_path);

        Ok(Self {
            host,
            port,
            debug,
            config_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn loads_valid_config() {
        let file = write_config(
            r#"{"operator": "Ada", "attached": "2024-01-01T00:00:00", "mode": "passive"}"#,
        );

        let config = load_config(file.path()).await;

        assert_eq!(config.operator, "Ada");
        assert_eq!(config.attached, "2024-01-01T00:00:00");
        assert_eq!(config.mode, Mode::Passive);
    }

    #[tokio::test]
    async fn partial_config_fills_defaults() {
        let file = write_config(r#"{"operator": "Ada"}"#);

        let config = load_config(file.path()).await;

        assert_eq!(config.operator, "Ada");
        assert_eq!(config.mode, Mode::Passive);
        assert!(!config.attached.is_empty());
    }

    #[tokio::test]
    async fn missing_file_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();

        let config = load_config(&dir.path().join("nope.json")).await;

        assert_eq!(config.operator, "Unknown");
        assert_eq!(config.mode, Mode::Passive);
    }

    #[tokio::test]
    async fn malformed_file_falls_back_to_default() {
        let file = write_config("{ operator: ");

        let config = load_config(file.path()).await;

        assert_eq!(config.operator, "Unknown");
        assert_eq!(config.mode, Mode::Passive);
    }

    #[tokio::test]
    async fn unknown_mode_keeps_the_rest_of_the_record() {
        let file = write_config(r#"{"operator": "Ada", "mode": "turbo"}"#);

        let config = load_config(file.path()).await;

        assert_eq!(config.operator, "Ada");
        assert_eq!(config.mode, Mode::Other("turbo".to_string()));
        assert_eq!(config.mode.to_string(), "turbo");
    }

    #[test]
    fn mode_round_trips_through_its_name() {
        assert_eq!(Mode::from("passive".to_string()), Mode::Passive);
        assert_eq!(Mode::from("active".to_string()), Mode::Active);
        assert_eq!(
            serde_json::to_value(Mode::Other("turbo".to_string())).unwrap(),
            "turbo"
        );
    }

    #[test]
    fn settings_defaults() {
        let settings = ServerSettings::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(settings.port, 5001);
        assert_eq!(settings.host, "0.0.0.0");
        assert!(!settings.debug);
    }

    #[test]
    fn settings_overrides() {
        let settings = ServerSettings::from_lookup(lookup_from(&[
            ("ROUTER_PORT", "8088"),
            ("ROUTER_DEBUG", "TRUE"),
            ("MONGOOSE_CONFIG_PATH", "/etc/mongoose.json"),
        ]))
        .unwrap();

        assert_eq!(settings.port, 8088);
        assert!(settings.debug);
        assert_eq!(settings.config_path, PathBuf::from("/etc/mongoose.json"));
    }

    #[test]
    fn legacy_debug_flag_is_honored() {
        let settings =
            ServerSettings::from_lookup(lookup_from(&[("FLASK_DEBUG", "true")])).unwrap();
        assert!(settings.debug);

        let settings = ServerSettings::from_lookup(lookup_from(&[
            ("ROUTER_DEBUG", "false"),
            ("FLASK_DEBUG", "true"),
        ]))
        .unwrap();
        assert!(!settings.debug);
    }

    #[test]
    fn bad_port_is_an_error() {
        let result = ServerSettings::from_lookup(lookup_from(&[("ROUTER_PORT", "abc")]));
        assert!(result.is_err());
    }
}
