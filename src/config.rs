use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

use crate::state::UptimeFormula;

const LOCAL_CONFIG_FILE: &str = "fleetmon.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub devices: DevicesConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Requests taking longer than this are answered with 408
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DevicesConfig {
    /// Device manifest: a `device_id` header followed by one id per line
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default)]
    pub uptime_formula: UptimeFormula,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive, used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    6733
}

fn default_request_timeout() -> u64 {
    30
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("devices.csv")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Get the default config directory path (~/.config/fleetmon/)
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("fleetmon")
    }

    /// Get the default config file path (~/.config/fleetmon/config.toml)
    pub fn default_path() -> PathBuf {
        Self::default_dir().join("config.toml")
    }

    /// Find config file using fallback chain:
    /// 1. If explicit path provided, use it
    /// 2. If ./fleetmon.toml exists in current directory, use it
    /// 3. If ~/.config/fleetmon/config.toml exists, use it
    /// 4. Otherwise None (built-in defaults)
    pub fn find_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit_path {
            return Some(path.to_path_buf());
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        let default_path = Self::default_path();
        default_path.exists().then_some(default_path)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Load from the resolved config path, or fall back to defaults
    pub fn load_or_default(explicit_path: Option<&Path>) -> Result<Self> {
        match Self::find_config_path(explicit_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.host.trim().is_empty() {
            bail!("Server host cannot be empty");
        }
        if self.server.port == 0 {
            bail!("Server port must be non-zero");
        }
        if self.server.request_timeout_secs == 0 {
            bail!("Request timeout must be at least one second");
        }
        if self.devices.manifest_path.as_os_str().is_empty() {
            bail!("Device manifest path cannot be empty");
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .server
            .host
            .parse()
            .with_context(|| format!("Invalid server host: {}", self.server.host))?;
        Ok(SocketAddr::new(ip, self.server.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 6733);
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.devices.manifest_path, PathBuf::from("devices.csv"));
        assert_eq!(config.stats.uptime_formula, UptimeFormula::Inclusive);
        assert_eq!(config.logging.level, "info");
        assert!(!config.logging.json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config = Config::parse(
            r#"
[server]
host = "0.0.0.0"
port = 8080
request_timeout_secs = 5

[devices]
manifest_path = "/etc/fleetmon/devices.csv"

[stats]
uptime_formula = "span"

[logging]
level = "debug"
json = true
"#,
        )
        .unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.request_timeout_secs, 5);
        assert_eq!(
            config.devices.manifest_path,
            PathBuf::from("/etc/fleetmon/devices.csv")
        );
        assert_eq!(config.stats.uptime_formula, UptimeFormula::Span);
        assert_eq!(config.logging.level, "debug");
        assert!(config.logging.json);
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let config = Config::parse("[server]\nport = 9000\n").unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.devices, DevicesConfig::default());
    }

    #[test]
    fn test_parse_rejects_unknown_formula() {
        assert!(Config::parse("[stats]\nuptime_formula = \"average\"\n").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.host = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.request_timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.devices.manifest_path = PathBuf::new();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[devices]\nmanifest_path = \"fleet.csv\"\n")
            .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.devices.manifest_path, PathBuf::from("fleet.csv"));
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = PathBuf::from("/tmp/custom-fleetmon.toml");
        assert_eq!(Config::find_config_path(Some(path.as_path())), Some(path));
    }

    #[test]
    fn test_socket_addr() {
        let config = Config::default();
        assert_eq!(
            config.socket_addr().unwrap(),
            "127.0.0.1:6733".parse::<SocketAddr>().unwrap()
        );

        let mut config = Config::default();
        config.server.host = "not-an-ip".to_string();
        assert!(config.socket_addr().is_err());
    }
}
