// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use helpbot_app::{
    Anchor, DEFAULT_BASE_URL, DEFAULT_REOPEN_DELAY, DisplayMode, Theme, WidgetConfig,
};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

pub const APP_NAME: &str = "helpbot";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub endpoint: Endpoint,
    #[serde(default)]
    pub widget: Widget,
    #[serde(default)]
    pub log: Log,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            endpoint: Endpoint::default(),
            widget: Widget::default(),
            log: Log::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Endpoint {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Widget {
    pub position: Option<String>,
    pub theme: Option<String>,
    pub default_mode: Option<String>,
    pub auto_init: Option<bool>,
    pub reopen_delay: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Log {
    pub level: Option<String>,
    pub file: Option<String>,
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("HELPBOT_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set HELPBOT_CONFIG_PATH to the config file")
        })?;
        Ok(config_root.join(APP_NAME).join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.validate(path)?;
            return Ok(config);
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} is not versioned. Add `version = 1` and put values under [endpoint], [widget], and [log]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1. Run `helpbot --print-example-config` for the current schema",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        helpbot_client::validate_base_url(&self.base_url())
            .with_context(|| format!("invalid endpoint.base_url for {}", path.display()))?;

        if let Some(timeout) = self.timeout()?
            && timeout.is_zero()
        {
            bail!(
                "endpoint.timeout in {} must be positive; remove it to disable the client-side timeout",
                path.display()
            );
        }

        self.widget_config()
            .with_context(|| format!("invalid [widget] settings for {}", path.display()))?;
        self.auto_init()?;

        EnvFilter::try_new(self.log_filter())
            .with_context(|| format!("invalid log.level {:?}", self.log_filter()))?;
        Ok(())
    }

    /// File value first, then `HELPBOT_API_URL`, then the default.
    pub fn base_url(&self) -> String {
        self.endpoint
            .base_url
            .clone()
            .or_else(|| env_value("HELPBOT_API_URL"))
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned())
            .trim()
            .trim_end_matches('/')
            .to_owned()
    }

    pub fn timeout(&self) -> Result<Option<Duration>> {
        self.endpoint
            .timeout
            .as_deref()
            .map(|raw| parse_duration(raw).context("endpoint.timeout"))
            .transpose()
    }

    pub fn anchor(&self) -> Result<Anchor> {
        let Some(raw) = self
            .widget
            .position
            .clone()
            .or_else(|| env_value("HELPBOT_POSITION"))
        else {
            return Ok(Anchor::default());
        };
        Anchor::parse(&raw).ok_or_else(|| {
            anyhow!(
                "widget.position {raw:?} must be one of bottom-right, bottom-left, top-right, top-left (also settable via HELPBOT_POSITION)"
            )
        })
    }

    pub fn theme(&self) -> Result<Theme> {
        let Some(raw) = self
            .widget
            .theme
            .clone()
            .or_else(|| env_value("HELPBOT_THEME"))
        else {
            return Ok(Theme::default());
        };
        Theme::parse(&raw).ok_or_else(|| {
            anyhow!(
                "widget.theme {raw:?} must be one of default, dark, light (also settable via HELPBOT_THEME)"
            )
        })
    }

    pub fn default_mode(&self) -> Result<DisplayMode> {
        let Some(raw) = self
            .widget
            .default_mode
            .clone()
            .or_else(|| env_value("HELPBOT_DEFAULT_MODE"))
        else {
            return Ok(DisplayMode::default());
        };
        DisplayMode::parse(&raw).ok_or_else(|| {
            anyhow!(
                "widget.default_mode {raw:?} must be widget or sidebar (also settable via HELPBOT_DEFAULT_MODE)"
            )
        })
    }

    pub fn auto_init(&self) -> Result<bool> {
        if let Some(auto_init) = self.widget.auto_init {
            return Ok(auto_init);
        }
        match env_value("HELPBOT_AUTO_INIT") {
            None => Ok(true),
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" => Ok(true),
                "0" | "false" | "no" => Ok(false),
                _ => bail!("HELPBOT_AUTO_INIT {raw:?} must be true or false"),
            },
        }
    }

    pub fn reopen_delay(&self) -> Result<Duration> {
        match self.widget.reopen_delay.as_deref() {
            Some(raw) => parse_duration(raw).context("widget.reopen_delay"),
            None => Ok(DEFAULT_REOPEN_DELAY),
        }
    }

    pub fn widget_config(&self) -> Result<WidgetConfig> {
        Ok(WidgetConfig {
            base_url: self.base_url(),
            anchor: self.anchor()?,
            theme: self.theme()?,
            default_mode: self.default_mode()?,
            reopen_delay: self.reopen_delay()?,
        })
    }

    /// `HELPBOT_LOG` wins over `log.level`.
    pub fn log_filter(&self) -> String {
        env_value("HELPBOT_LOG")
            .or_else(|| self.log.level.clone())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_owned())
    }

    pub fn log_path(&self) -> Result<PathBuf> {
        if let Some(file) = &self.log.file {
            return Ok(PathBuf::from(file));
        }
        let data_root = dirs::data_dir().ok_or_else(|| {
            anyhow!("cannot resolve data directory; set log.file in the config")
        })?;
        Ok(data_root.join(APP_NAME).join("helpbot.log"))
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# helpbot config\n# Place this file at: {}\n\nversion = 1\n\n[endpoint]\n# HELPBOT_API_URL is used when base_url is not set here\nbase_url = \"{}\"\n# Optional. Without it requests wait for the transport to fail.\n# timeout = \"30s\"\n\n[widget]\n# bottom-right | bottom-left | top-right | top-left\nposition = \"bottom-right\"\n# default | dark | light\ntheme = \"default\"\n# widget | sidebar\ndefault_mode = \"widget\"\n# false: press F1 to load the widget\nauto_init = true\nreopen_delay = \"{}ms\"\n\n[log]\n# tracing filter; HELPBOT_LOG overrides\nlevel = \"{}\"\n# Optional. Default is the platform data dir (for example ~/.local/share/helpbot/helpbot.log)\n# file = \"/absolute/path/to/helpbot.log\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_REOPEN_DELAY.as_millis(),
            DEFAULT_LOG_LEVEL,
        )
    }
}

fn env_value(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_owned())
        .filter(|value| !value.is_empty())
}

fn parse_duration(raw: &str) -> Result<Duration> {
    if let Some(value) = raw.strip_suffix("ms") {
        let millis: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_millis(millis));
    }
    if let Some(value) = raw.strip_suffix('s') {
        let secs: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(secs));
    }
    if let Some(value) = raw.strip_suffix('m') {
        let mins: u64 = value
            .parse()
            .with_context(|| format!("invalid duration {raw:?}"))?;
        return Ok(Duration::from_secs(mins * 60));
    }

    bail!("invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 100ms or 30s)")
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use helpbot_app::{Anchor, DisplayMode, Theme};
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;

    const ENV_KEYS: [&str; 6] = [
        "HELPBOT_API_URL",
        "HELPBOT_POSITION",
        "HELPBOT_THEME",
        "HELPBOT_DEFAULT_MODE",
        "HELPBOT_AUTO_INIT",
        "HELPBOT_LOG",
    ];

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn clear_env() {
        for key in ENV_KEYS {
            // SAFETY: test-only process-local env mutation under env_lock.
            unsafe {
                std::env::remove_var(key);
            }
        }
    }

    fn set_env(key: &str, value: &str) {
        // SAFETY: test-only process-local env mutation under env_lock.
        unsafe {
            std::env::set_var(key, value);
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let _guard = env_lock();
        clear_env();
        let temp = tempfile::tempdir()?;
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(config.timeout()?, None);
        assert_eq!(config.anchor()?, Anchor::BottomRight);
        assert_eq!(config.default_mode()?, DisplayMode::Widget);
        assert!(config.auto_init()?);
        assert_eq!(config.reopen_delay()?, Duration::from_millis(100));
        assert_eq!(config.log_filter(), "info");
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[endpoint]\nbase_url = \"http://localhost:8000\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[endpoint], [widget], and [log]"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn full_config_parses() -> Result<()> {
        let _guard = env_lock();
        clear_env();
        let (_temp, path) = write_config(
            "version = 1\n[endpoint]\nbase_url = \"https://helpbot.internal:9000//\"\ntimeout = \"30s\"\n[widget]\nposition = \"top-left\"\ntheme = \"dark\"\ndefault_mode = \"sidebar\"\nauto_init = false\nreopen_delay = \"0ms\"\n[log]\nlevel = \"debug\"\nfile = \"/tmp/helpbot-test.log\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "https://helpbot.internal:9000");
        assert_eq!(config.timeout()?, Some(Duration::from_secs(30)));
        assert!(!config.auto_init()?);
        assert_eq!(config.log_filter(), "debug");
        assert_eq!(config.log_path()?, PathBuf::from("/tmp/helpbot-test.log"));

        let widget = config.widget_config()?;
        assert_eq!(widget.anchor, Anchor::TopLeft);
        assert_eq!(widget.theme, Theme::Dark);
        assert_eq!(widget.default_mode, DisplayMode::Sidebar);
        assert_eq!(widget.reopen_delay, Duration::ZERO);
        Ok(())
    }

    #[test]
    fn env_fills_values_missing_from_file() -> Result<()> {
        let _guard = env_lock();
        clear_env();
        let (_temp, path) = write_config("version = 1\n[widget]\ntheme = \"light\"\n")?;
        set_env("HELPBOT_API_URL", "http://10.0.0.5:8000/");
        set_env("HELPBOT_POSITION", "bottom-left");
        set_env("HELPBOT_THEME", "dark");
        set_env("HELPBOT_DEFAULT_MODE", "sidebar");
        set_env("HELPBOT_AUTO_INIT", "false");

        let loaded = Config::load(&path);
        let config = loaded?;
        let widget = config.widget_config()?;
        let auto_init = config.auto_init()?;
        clear_env();

        assert_eq!(widget.base_url, "http://10.0.0.5:8000");
        assert_eq!(widget.anchor, Anchor::BottomLeft);
        assert_eq!(widget.theme, Theme::Light);
        assert_eq!(widget.default_mode, DisplayMode::Sidebar);
        assert!(!auto_init);
        Ok(())
    }

    #[test]
    fn log_env_overrides_file_level() -> Result<()> {
        let _guard = env_lock();
        clear_env();
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"warn\"\n")?;
        set_env("HELPBOT_LOG", "helpbot_client=trace");
        let config = Config::load(&path);
        let filter = config.map(|config| config.log_filter());
        clear_env();
        assert_eq!(filter?, "helpbot_client=trace");
        Ok(())
    }

    #[test]
    fn invalid_enum_values_are_rejected() -> Result<()> {
        let _guard = env_lock();
        clear_env();
        let (_temp, path) = write_config("version = 1\n[widget]\nposition = \"center\"\n")?;
        let error = Config::load(&path).expect_err("unknown position should fail");
        assert!(format!("{error:#}").contains("bottom-right, bottom-left"));

        let (_temp, path) = write_config("version = 1\n[widget]\ndefault_mode = \"Sidebar\"\n")?;
        let error = Config::load(&path).expect_err("enum values are case-sensitive");
        assert!(format!("{error:#}").contains("widget or sidebar"));
        Ok(())
    }

    #[test]
    fn invalid_env_auto_init_is_rejected() -> Result<()> {
        let _guard = env_lock();
        clear_env();
        let (_temp, path) = write_config("version = 1\n")?;
        set_env("HELPBOT_AUTO_INIT", "maybe");
        let result = Config::load(&path);
        clear_env();
        let error = result.expect_err("bad auto_init should fail");
        assert!(error.to_string().contains("must be true or false"));
        Ok(())
    }

    #[test]
    fn base_url_must_be_absolute_http() -> Result<()> {
        let _guard = env_lock();
        clear_env();
        let (_temp, path) = write_config("version = 1\n[endpoint]\nbase_url = \"localhost:8000\"\n")?;
        let error = Config::load(&path).expect_err("schemeless URL should fail");
        assert!(error.to_string().contains("invalid endpoint.base_url"));

        let (_temp, path) = write_config("version = 1\n[endpoint]\nbase_url = \"ftp://files\"\n")?;
        let error = Config::load(&path).expect_err("ftp URL should fail");
        assert!(format!("{error:#}").contains("only http and https"));
        Ok(())
    }

    #[test]
    fn zero_timeout_is_rejected() -> Result<()> {
        let _guard = env_lock();
        clear_env();
        let (_temp, path) = write_config("version = 1\n[endpoint]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn invalid_log_level_is_rejected() -> Result<()> {
        let _guard = env_lock();
        clear_env();
        let (_temp, path) = write_config("version = 1\n[log]\nlevel = \"helpbot=loud\"\n")?;
        let error = Config::load(&path).expect_err("bad filter should fail");
        assert!(error.to_string().contains("invalid log.level"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("HELPBOT_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("HELPBOT_CONFIG_PATH");
        }
        assert_eq!(resolved?, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("HELPBOT_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("helpbot/config.toml"));
        Ok(())
    }

    #[test]
    fn durations_parse_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("100ms")?, Duration::from_millis(100));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        let error = parse_duration("soon").expect_err("invalid duration should fail");
        assert!(error.to_string().contains("invalid duration"));
        Ok(())
    }

    #[test]
    fn example_config_round_trips() -> Result<()> {
        let _guard = env_lock();
        clear_env();
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[endpoint]"));
        assert!(example.contains("[widget]"));
        assert!(example.contains("[log]"));

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.reopen_delay()?, Duration::from_millis(100));
        assert_eq!(config.base_url(), "http://localhost:8000");
        Ok(())
    }
}
