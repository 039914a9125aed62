//! Dashboard configuration loading
//!
//! Loads configuration from `~/.config/hrdash/dashboard.toml` (or `HRDASH_CONFIG` env).
//! Every key is optional; a missing file yields the defaults.

use crate::errors::{InsightsError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Root configuration for the dashboard
#[derive(Debug, Deserialize, Clone)]
pub struct DashboardConfig {
    /// Path to the records SQLite database
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Optional taxonomy file (TOML or JSON) replacing the builtin catalog
    #[serde(default)]
    pub taxonomy_path: Option<String>,

    /// Trailing window for the "recent" summary figure
    #[serde(default = "default_recent_window_days")]
    pub recent_window_days: u32,

    /// Number of trailing months on the trend chart
    #[serde(default = "default_trend_months")]
    pub trend_months: usize,

    /// Which sub-category's indicators the indicator chart shows
    #[serde(default)]
    pub indicator_chart: IndicatorChartConfig,

    /// Placeholder synthesis settings
    #[serde(default)]
    pub fallback: FallbackConfig,

    /// Colour palette overrides
    #[serde(default)]
    pub palettes: PaletteConfig,
}

fn default_db_path() -> String {
    dirs::home_dir()
        .map(|h| {
            h.join(".config")
                .join("hrdash")
                .join("records.db")
                .to_string_lossy()
                .into_owned()
        })
        .unwrap_or_else(|| "records.db".to_string())
}

fn default_recent_window_days() -> u32 {
    crate::recency::RECENT_WINDOW_DAYS
}

fn default_trend_months() -> usize {
    6
}

/// Indicator chart target
#[derive(Debug, Deserialize, Clone)]
pub struct IndicatorChartConfig {
    #[serde(default = "default_indicator_category")]
    pub category_id: String,

    #[serde(default = "default_indicator_sub_category")]
    pub sub_category_id: String,
}

fn default_indicator_category() -> String {
    "women_hrds".to_string()
}

fn default_indicator_sub_category() -> String {
    "gbv".to_string()
}

impl Default for IndicatorChartConfig {
    fn default() -> Self {
        Self {
            category_id: default_indicator_category(),
            sub_category_id: default_indicator_sub_category(),
        }
    }
}

/// Random ranges for one chart's placeholder values (both bounds inclusive)
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct FallbackWindow {
    /// Lower bound of the random base; unused by index-derived charts
    #[serde(default)]
    pub base_min: i64,

    #[serde(default)]
    pub base_max: i64,

    /// Perturbation added on top of the base
    #[serde(default)]
    pub jitter_min: i64,

    #[serde(default)]
    pub jitter_max: i64,
}

impl FallbackWindow {
    pub const fn new(base_min: i64, base_max: i64, jitter_min: i64, jitter_max: i64) -> Self {
        Self {
            base_min,
            base_max,
            jitter_min,
            jitter_max,
        }
    }

    fn normalize(&mut self, chart: &str) {
        if self.base_min > self.base_max {
            tracing::warn!(chart, "fallback base range inverted, swapping bounds");
            std::mem::swap(&mut self.base_min, &mut self.base_max);
        }
        if self.jitter_min > self.jitter_max {
            tracing::warn!(chart, "fallback jitter range inverted, swapping bounds");
            std::mem::swap(&mut self.jitter_min, &mut self.jitter_max);
        }
    }
}

/// Placeholder synthesis configuration
#[derive(Debug, Deserialize, Clone)]
pub struct FallbackConfig {
    #[serde(default = "default_category_window")]
    pub category: FallbackWindow,

    #[serde(default = "default_indicator_window")]
    pub indicator: FallbackWindow,

    #[serde(default = "default_province_window")]
    pub province: FallbackWindow,

    #[serde(default = "default_status_window")]
    pub status: FallbackWindow,

    #[serde(default = "default_trend_window")]
    pub trend: FallbackWindow,

    /// Multiplier for province and trend placeholders while a global
    /// province filter is active
    #[serde(default = "default_province_scale")]
    pub province_scale: f64,

    #[serde(default)]
    pub summary: SummaryFallbackConfig,
}

fn default_category_window() -> FallbackWindow {
    FallbackWindow::new(0, 0, 0, 14)
}
fn default_indicator_window() -> FallbackWindow {
    FallbackWindow::new(0, 0, 0, 4)
}
fn default_province_window() -> FallbackWindow {
    FallbackWindow::new(10, 50, 0, 0)
}
fn default_status_window() -> FallbackWindow {
    FallbackWindow::new(5, 25, 0, 0)
}
fn default_trend_window() -> FallbackWindow {
    FallbackWindow::new(15, 45, 0, 0)
}
fn default_province_scale() -> f64 {
    0.6
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            category: default_category_window(),
            indicator: default_indicator_window(),
            province: default_province_window(),
            status: default_status_window(),
            trend: default_trend_window(),
            province_scale: default_province_scale(),
            summary: SummaryFallbackConfig::default(),
        }
    }
}

/// Placeholder ranges for the summary statistics
#[derive(Debug, Deserialize, Clone)]
pub struct SummaryFallbackConfig {
    #[serde(default = "default_summary_total_min")]
    pub total_min: u64,
    #[serde(default = "default_summary_total_max")]
    pub total_max: u64,
    #[serde(default = "default_summary_recent_min")]
    pub recent_min: u64,
    #[serde(default = "default_summary_recent_max")]
    pub recent_max: u64,
}

fn default_summary_total_min() -> u64 {
    150
}
fn default_summary_total_max() -> u64 {
    300
}
fn default_summary_recent_min() -> u64 {
    10
}
fn default_summary_recent_max() -> u64 {
    50
}

impl Default for SummaryFallbackConfig {
    fn default() -> Self {
        Self {
            total_min: default_summary_total_min(),
            total_max: default_summary_total_max(),
            recent_min: default_summary_recent_min(),
            recent_max: default_summary_recent_max(),
        }
    }
}

/// Per-chart colour lists; `None` keeps the builtin palette
#[derive(Debug, Deserialize, Clone, Default)]
pub struct PaletteConfig {
    #[serde(default)]
    pub category: Option<Vec<String>>,
    #[serde(default)]
    pub indicator: Option<Vec<String>>,
    #[serde(default)]
    pub province: Option<Vec<String>>,
    #[serde(default)]
    pub trend: Option<Vec<String>>,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            taxonomy_path: None,
            recent_window_days: default_recent_window_days(),
            trend_months: default_trend_months(),
            indicator_chart: IndicatorChartConfig::default(),
            fallback: FallbackConfig::default(),
            palettes: PaletteConfig::default(),
        }
    }
}

impl DashboardConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "HRDASH_CONFIG";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "dashboard.toml";

    /// Load configuration from file
    ///
    /// Resolution order:
    /// 1. `HRDASH_CONFIG` environment variable
    /// 2. `~/.config/hrdash/dashboard.toml`
    ///
    /// If the config file doesn't exist, returns default configuration.
    pub fn load() -> Result<Self> {
        let path = Self::resolve_config_path();

        if !path.exists() {
            tracing::info!(
                path = %path.display(),
                "Dashboard config not found, using defaults"
            );
            return Ok(Self::default());
        }

        Self::load_from_path(&path)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            InsightsError::config_with_source(
                format!("failed to read config at {}", path.display()),
                e,
            )
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let mut cfg: DashboardConfig = toml::from_str(contents)
            .map_err(|e| InsightsError::config_with_source("failed to parse config", e))?;

        cfg.validate()?;
        Ok(cfg)
    }

    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .map(|h| {
                h.join(".config")
                    .join("hrdash")
                    .join(Self::DEFAULT_CONFIG_FILENAME)
            })
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }

    /// Reject unusable settings and repair soft issues in place
    fn validate(&mut self) -> Result<()> {
        if self.trend_months == 0 || self.trend_months > 12 {
            return Err(InsightsError::config(format!(
                "trend_months must be between 1 and 12, got {}",
                self.trend_months
            )));
        }

        let fallback = &mut self.fallback;
        fallback.category.normalize("category");
        fallback.indicator.normalize("indicator");
        fallback.province.normalize("province");
        fallback.status.normalize("status");
        fallback.trend.normalize("trend");

        if !(fallback.province_scale > 0.0 && fallback.province_scale <= 1.0) {
            tracing::warn!(
                province_scale = fallback.province_scale,
                "province_scale outside (0, 1], using 0.6"
            );
            fallback.province_scale = default_province_scale();
        }

        let summary = &mut fallback.summary;
        if summary.total_min > summary.total_max {
            tracing::warn!("summary total range inverted, swapping bounds");
            std::mem::swap(&mut summary.total_min, &mut summary.total_max);
        }
        if summary.recent_min > summary.recent_max {
            tracing::warn!("summary recent range inverted, swapping bounds");
            std::mem::swap(&mut summary.recent_min, &mut summary.recent_max);
        }

        for (chart, palette) in [
            ("category", &mut self.palettes.category),
            ("indicator", &mut self.palettes.indicator),
            ("province", &mut self.palettes.province),
            ("trend", &mut self.palettes.trend),
        ] {
            if palette.as_ref().is_some_and(Vec::is_empty) {
                tracing::warn!(chart, "empty palette override ignored");
                *palette = None;
            }
        }

        Ok(())
    }

    /// Get the resolved database path (expanding ~ if needed)
    pub fn resolved_db_path(&self) -> PathBuf {
        expand_home(&self.db_path)
    }

    pub fn resolved_taxonomy_path(&self) -> Option<PathBuf> {
        self.taxonomy_path.as_deref().map(expand_home)
    }
}

fn expand_home(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(stripped);
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = DashboardConfig::default();
        assert_eq!(cfg.recent_window_days, 30);
        assert_eq!(cfg.trend_months, 6);
        assert_eq!(cfg.indicator_chart.sub_category_id, "gbv");
        assert_eq!(cfg.fallback.province, FallbackWindow::new(10, 50, 0, 0));
        assert_eq!(cfg.fallback.summary.total_max, 300);
        assert!(cfg.palettes.category.is_none());
    }

    #[test]
    fn test_parse_minimal_config() {
        let toml = r#"
            db_path = "/tmp/records.db"
        "#;

        let cfg = DashboardConfig::parse(toml).expect("should parse");
        assert_eq!(cfg.db_path, "/tmp/records.db");
        assert_eq!(cfg.fallback.province_scale, 0.6);
        assert_eq!(cfg.fallback.status, FallbackWindow::new(5, 25, 0, 0));
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r##"
            db_path = "~/hrdash/records.db"
            taxonomy_path = "/etc/hrdash/taxonomy.toml"
            recent_window_days = 14
            trend_months = 12

            [indicator_chart]
            category_id = "legal_harassment"
            sub_category_id = "fabricated_cases"

            [fallback]
            province_scale = 0.5

            [fallback.category]
            jitter_min = 2
            jitter_max = 3

            [fallback.trend]
            base_min = 40
            base_max = 20

            [fallback.summary]
            total_min = 10
            total_max = 20

            [palettes]
            category = ["#000000", "#ffffff"]
            trend = []
        "##;

        let cfg = DashboardConfig::parse(toml).expect("should parse");
        assert_eq!(cfg.recent_window_days, 14);
        assert_eq!(cfg.trend_months, 12);
        assert_eq!(cfg.indicator_chart.category_id, "legal_harassment");
        assert_eq!(cfg.fallback.province_scale, 0.5);
        assert_eq!(cfg.fallback.category, FallbackWindow::new(0, 0, 2, 3));
        // Inverted range is repaired rather than rejected
        assert_eq!(cfg.fallback.trend, FallbackWindow::new(20, 40, 0, 0));
        assert_eq!(cfg.fallback.summary.total_min, 10);
        assert_eq!(cfg.palettes.category.as_ref().map(Vec::len), Some(2));
        assert!(cfg.palettes.trend.is_none());
        assert_eq!(
            cfg.resolved_taxonomy_path(),
            Some(PathBuf::from("/etc/hrdash/taxonomy.toml"))
        );
    }

    #[test]
    fn test_rejects_unusable_trend_length() {
        let err = DashboardConfig::parse("trend_months = 0").expect_err("zero months");
        assert!(err.to_string().contains("trend_months"));
        assert!(DashboardConfig::parse("trend_months = 13").is_err());
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("dashboard.toml");
        std::fs::write(&path, "recent_window_days = 7\n").expect("write");

        let cfg = DashboardConfig::load_from_path(&path).expect("load");
        assert_eq!(cfg.recent_window_days, 7);

        let missing = DashboardConfig::load_from_path(&dir.path().join("missing.toml"));
        assert!(missing.is_err());
    }
}
