//! Application configuration
//!
//! Loaded from `~/.config/lexbridge-studio/config.toml`. Missing keys take
//! their defaults; `LEXBRIDGE_SERVICE_URL` overrides the service URL.

use crate::citation::ResolutionPolicy;
use crate::diagram::renderer::{RenderSettings, DIM_OPACITY, EDGE_LABEL_MIN_ZOOM};
use crate::error::{LexError, Result};
use crate::viewport::FocusTimings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const SERVICE_URL_ENV: &str = "LEXBRIDGE_SERVICE_URL";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Base URL of the research service
    pub service_url: String,

    /// Per-request timeout; answers can take a while
    pub timeout_secs: u64,

    /// Language answers are written in
    pub language: String,

    /// Language queries are written in
    pub input_language: String,

    /// "dark" or "light"
    pub theme: String,

    pub log_level: LogLevel,

    /// How entity names in answers are turned into citation links
    pub resolution_policy: ResolutionPolicy,

    pub render: RenderConfig,

    pub focus: FocusConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Opacity of nodes filtered out by the regime toggle
    pub dim_opacity: f32,
    /// Edge labels are hidden below this zoom
    pub edge_label_min_zoom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FocusConfig {
    pub center_secs: f32,
    pub zoom_secs: f32,
    /// Zoom level after focusing a node
    pub zoom: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    #[default]
    Warn,
    Error,
}

impl LogLevel {
    /// Filter string for env_logger
    pub fn as_filter(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:8000".to_string(),
            timeout_secs: 120,
            language: "English".to_string(),
            input_language: "English".to_string(),
            theme: "dark".to_string(),
            log_level: LogLevel::default(),
            resolution_policy: ResolutionPolicy::default(),
            render: RenderConfig::default(),
            focus: FocusConfig::default(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            dim_opacity: DIM_OPACITY,
            edge_label_min_zoom: EDGE_LABEL_MIN_ZOOM,
        }
    }
}

impl Default for FocusConfig {
    fn default() -> Self {
        let timings = FocusTimings::default();
        Self {
            center_secs: timings.center_secs,
            zoom_secs: timings.zoom_secs,
            zoom: timings.target_zoom,
        }
    }
}

impl AppConfig {
    /// Default config file location
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .map(|d| d.join("lexbridge-studio/config.toml"))
            .unwrap_or_else(|| PathBuf::from("lexbridge-studio.toml"))
    }

    /// Load from the default location and apply the env override. A missing
    /// file yields the defaults; an unreadable or invalid one is an error so
    /// the caller can report it once logging is up.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path())?;
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus the env override, used when the file is rejected
    pub fn fallback() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            LexError::Config(msg) => LexError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| LexError::Config(e.to_string()))?;
        Ok(config.sanitized())
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(|e| LexError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(SERVICE_URL_ENV) {
            if !url.trim().is_empty() {
                self.service_url = url.trim().to_string();
            }
        }
    }

    /// Clamp tunables into usable ranges
    fn sanitized(mut self) -> Self {
        let defaults = RenderConfig::default();
        self.render.dim_opacity = if self.render.dim_opacity.is_finite() {
            self.render.dim_opacity.clamp(0.0, 1.0)
        } else {
            defaults.dim_opacity
        };
        if !self.render.edge_label_min_zoom.is_finite() {
            self.render.edge_label_min_zoom = defaults.edge_label_min_zoom;
        }

        let focus = FocusConfig::default();
        for (value, default) in [
            (&mut self.focus.center_secs, focus.center_secs),
            (&mut self.focus.zoom_secs, focus.zoom_secs),
            (&mut self.focus.zoom, focus.zoom),
        ] {
            if !value.is_finite() || *value < 0.0 {
                *value = default;
            }
        }
        if self.focus.zoom == 0.0 {
            self.focus.zoom = focus.zoom;
        }
        self.timeout_secs = self.timeout_secs.max(1);
        self
    }

    pub fn render_settings(&self) -> RenderSettings {
        RenderSettings {
            dim_opacity: self.render.dim_opacity,
            edge_label_min_zoom: self.render.edge_label_min_zoom,
        }
    }

    pub fn focus_timings(&self) -> FocusTimings {
        FocusTimings {
            center_secs: self.focus.center_secs,
            zoom_secs: self.focus.zoom_secs,
            target_zoom: self.focus.zoom,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.service_url, "http://localhost:8000");
        assert_eq!(config.resolution_policy, ResolutionPolicy::SinglePass);
        assert_eq!(config.render.dim_opacity, 0.1);
        assert_eq!(config.focus_timings(), FocusTimings::default());
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = AppConfig::parse(
            r#"
            service_url = "http://research.local:9000"
            resolution_policy = "sequential"

            [render]
            edge_label_min_zoom = 2.0
            "#,
        )
        .unwrap();
        assert_eq!(config.service_url, "http://research.local:9000");
        assert_eq!(config.resolution_policy, ResolutionPolicy::Sequential);
        assert_eq!(config.render.edge_label_min_zoom, 2.0);
        assert_eq!(config.render.dim_opacity, DIM_OPACITY);
        assert_eq!(config.language, "English");
    }

    #[test]
    fn test_out_of_range_values_are_clamped() {
        let config = AppConfig::parse(
            r#"
            timeout_secs = 0
            [render]
            dim_opacity = 3.5
            [focus]
            center_secs = -1.0
            "#,
        )
        .unwrap();
        assert_eq!(config.render.dim_opacity, 1.0);
        assert_eq!(config.focus.center_secs, 0.5);
        assert_eq!(config.timeout_secs, 1);
    }

    #[test]
    fn test_invalid_toml_is_a_config_error() {
        let err = AppConfig::parse("service_url = [").unwrap_err();
        assert!(matches!(err, LexError::Config(_)));
    }

    #[test]
    fn test_policy_display_names_parse() {
        for policy in ResolutionPolicy::all() {
            let config =
                AppConfig::parse(&format!("resolution_policy = \"{}\"", policy.name())).unwrap();
            assert_eq!(config.resolution_policy, *policy);
        }
        // Older files spelled it with an underscore
        let config = AppConfig::parse(r#"resolution_policy = "single_pass""#).unwrap();
        assert_eq!(config.resolution_policy, ResolutionPolicy::SinglePass);
    }

    #[test]
    fn test_saved_policy_uses_display_name() {
        let content = toml::to_string_pretty(&AppConfig::default()).unwrap();
        assert!(content.contains(&format!(
            "resolution_policy = \"{}\"",
            ResolutionPolicy::SinglePass.name()
        )));
    }

    #[test]
    fn test_invalid_file_error_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "resolution_policy = \"fastest\"\n").unwrap();

        match AppConfig::load_from(&path) {
            Err(LexError::Config(msg)) => {
                assert!(msg.contains(&path.display().to_string()), "{}", msg);
                assert!(msg.contains("fastest"), "{}", msg);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/config.toml");

        let mut config = AppConfig::default();
        config.language = "Hindi".to_string();
        config.log_level = LogLevel::Debug;
        config.save_to(&path).unwrap();

        let loaded = AppConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.log_level.as_filter(), "debug");
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, AppConfig::default());
    }
}
