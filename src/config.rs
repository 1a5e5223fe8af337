use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::eyre::{Result, WrapErr};
use serde::Deserialize;
use tracing::info;

use crate::legacy::AdapterSettings;
use crate::network::ActivationGate;

// ─── Embedded Default ────────────────────────────────────────────────────
/// Baked into the binary at compile time. The service can never fail to start
/// because of a missing config file; this is always the base layer.
const DEFAULT_CONFIG_TOML: &str = include_str!("../default_config.toml");

// ─── CLI Arguments (override layer) ─────────────────────────────────────
/// wifimanager-compat: legacy WiFiManager API on top of NetworkManager
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "wifimanager-compat", version, about, long_about = None)]
pub struct CliArgs {
    /// Path to a custom config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Log level filter (overrides config file)
    #[arg(short, long)]
    pub log_level: Option<String>,

    /// Log file path (overrides config file)
    #[arg(long)]
    pub log_file: Option<String>,

    /// WiFi interface toggled by setEnabled (overrides config file)
    #[arg(short, long)]
    pub interface: Option<String>,

    /// Maximum time to wait for NetworkManager, in milliseconds (overrides config file)
    #[arg(long)]
    pub max_wait_ms: Option<u64>,

    /// Print the default config to stdout and exit
    #[arg(long)]
    pub print_default_config: bool,
}

// ─── TOML Structs ───────────────────────────────────────────────────────

/// Root configuration, parsed from TOML, then overridden by CLI flags.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub gate: GateConfig,
    #[serde(default)]
    pub forwarder: ForwarderConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub host: HostConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,
    /// Empty string = log to stderr
    pub log_file: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub poll_interval_ms: u64,
    pub max_wait_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ForwarderConfig {
    pub queue_depth: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub service: String,
    pub path: String,
    pub call_timeout_ms: u64,
    pub wifi_interface: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    pub service: String,
    pub path: String,
}

/// Floor for `gate.poll_interval_ms`; each attempt opens a bus connection
const MIN_POLL_INTERVAL_MS: u64 = 1;

// ─── Defaults ───────────────────────────────────────────────────────────

impl Default for Config {
    fn default() -> Self {
        // Parse the embedded TOML; it ships with the binary
        toml::from_str(DEFAULT_CONFIG_TOML)
            .expect("BUG: embedded default_config.toml is invalid TOML")
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".into(),
            log_file: String::new(),
        }
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            max_wait_ms: 5000,
        }
    }
}

impl Default for ForwarderConfig {
    fn default() -> Self {
        Self { queue_depth: 64 }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            service: "org.rdk.NetworkManager".into(),
            path: "/org/rdk/NetworkManager".into(),
            call_timeout_ms: 10_000,
            wifi_interface: "wlan0".into(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            service: "org.rdk.WiFiManager".into(),
            path: "/org/rdk/WiFiManager".into(),
        }
    }
}

// ─── Path Resolution ────────────────────────────────────────────────────

impl Config {
    /// Standard config file path: ~/.config/wifimanager-compat/config.toml
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wifimanager-compat")
            .join("config.toml")
    }

    /// Convenience: log file as Option<&str> (empty = None)
    pub fn log_file(&self) -> Option<&str> {
        let path = self.general.log_file.trim();
        if path.is_empty() { None } else { Some(path) }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.backend.call_timeout_ms)
    }

    pub fn gate(&self) -> ActivationGate {
        ActivationGate::new(
            Duration::from_millis(self.gate.poll_interval_ms.max(MIN_POLL_INTERVAL_MS)),
            Duration::from_millis(self.gate.max_wait_ms),
        )
    }

    pub fn adapter_settings(&self) -> AdapterSettings {
        AdapterSettings {
            gate: self.gate(),
            queue_depth: self.forwarder.queue_depth,
            wifi_interface: self.backend.wifi_interface.clone(),
        }
    }

    /// Apply CLI flags on top of the file values
    pub fn apply_overrides(&mut self, cli: &CliArgs) {
        if let Some(ref level) = cli.log_level {
            self.general.log_level = level.clone();
        }
        if let Some(ref path) = cli.log_file {
            self.general.log_file = path.clone();
        }
        if let Some(ref iface) = cli.interface {
            self.backend.wifi_interface = iface.clone();
        }
        if let Some(ms) = cli.max_wait_ms {
            self.gate.max_wait_ms = ms;
        }
    }
}

// ─── Bootloader ─────────────────────────────────────────────────────────

/// The single entry point for configuration. Called exactly once at startup.
///
/// 1. Resolve config file path (CLI override or default)
/// 2. If the file doesn't exist, fall back to the embedded defaults
/// 3. Parse TOML from disk into Config
/// 4. Apply CLI overrides on top
pub fn load(cli: &CliArgs) -> Result<Config> {
    let config_path = cli.config.clone().unwrap_or_else(Config::config_path);

    let mut config = if config_path.exists() {
        let toml_str = std::fs::read_to_string(&config_path)
            .wrap_err_with(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&toml_str).wrap_err_with(|| {
            format!(
                "Failed to parse config at {}.\n\
                 Fix or delete the file, or start from:\n  \
                 wifimanager-compat --print-default-config > {:?}",
                config_path.display(),
                config_path
            )
        })?
    } else {
        info!("No config at {}, using defaults", config_path.display());
        Config::default()
    };

    config.apply_overrides(cli);
    Ok(config)
}

/// Returns the embedded default config TOML string.
pub fn default_config_toml() -> &'static str {
    DEFAULT_CONFIG_TOML
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_defaults_match_struct_defaults() {
        let config = Config::default();
        assert_eq!(config.gate.poll_interval_ms, GateConfig::default().poll_interval_ms);
        assert_eq!(config.gate.max_wait_ms, 5000);
        assert_eq!(config.forwarder.queue_depth, 64);
        assert_eq!(config.backend.service, "org.rdk.NetworkManager");
        assert_eq!(config.host.path, "/org/rdk/WiFiManager");
        assert_eq!(config.log_file(), None);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: Config = toml::from_str("[gate]\nmax_wait_ms = 200\n").unwrap();
        assert_eq!(config.gate.max_wait_ms, 200);
        assert_eq!(config.gate.poll_interval_ms, 500);
        assert_eq!(config.backend.wifi_interface, "wlan0");
    }

    #[test]
    fn cli_overrides_file() {
        let mut config = Config::default();
        let cli = CliArgs {
            interface: Some("wlp2s0".into()),
            max_wait_ms: Some(100),
            log_file: Some("/tmp/compat.log".into()),
            ..Default::default()
        };
        config.apply_overrides(&cli);

        let settings = config.adapter_settings();
        assert_eq!(settings.wifi_interface, "wlp2s0");
        assert_eq!(settings.gate.max_wait, Duration::from_millis(100));
        assert_eq!(config.log_file(), Some("/tmp/compat.log"));
    }

    #[test]
    fn zero_poll_interval_is_clamped() {
        let config: Config = toml::from_str("[gate]\npoll_interval_ms = 0\n").unwrap();
        assert_eq!(config.gate().poll_interval, Duration::from_millis(1));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cli = CliArgs {
            config: Some(PathBuf::from("/nonexistent/wifimanager-compat.toml")),
            ..Default::default()
        };
        let config = load(&cli).unwrap();
        assert_eq!(config.backend.call_timeout_ms, 10_000);
    }
}
