//! Placeholder synthesis for empty buckets
//!
//! When a chart has no chart-local filter and a bucket's real count is zero,
//! the bucket shows a synthesized value so the chart never renders empty.
//! A chart-local filter always wins: filtered emptiness is shown truthfully.
//!
//! ```text
//! category  base = 20 + 8·i
//! indicator base = 8 + 3·⌊i/5⌋ + 2·(1 + i mod 5)
//! province  base ∈ U[10, 50]   × province_scale when a global province filter is set
//! status    base ∈ U[5, 25]
//! trend     base ∈ U[15, 45]   × province_scale when a global province filter is set
//!
//! value = max(1, ⌊(base + jitter) · scale⌋)
//! ```
//!
//! Randomness is injected by the caller, so a seeded RNG reproduces a run.

use crate::config::{FallbackConfig, FallbackWindow};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// The five dashboard charts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Category,
    Indicator,
    Province,
    Status,
    Trend,
}

impl ChartKind {
    pub const ALL: [ChartKind; 5] = [
        Self::Category,
        Self::Indicator,
        Self::Province,
        Self::Status,
        Self::Trend,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Category => "category",
            Self::Indicator => "indicator",
            Self::Province => "province",
            Self::Status => "status",
            Self::Trend => "trend",
        }
    }

    /// Whether a global province filter shrinks this chart's placeholders
    fn scales_with_province_filter(&self) -> bool {
        matches!(self, Self::Province | Self::Trend)
    }
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter state relevant to fallback decisions for one chart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FallbackContext {
    /// The viewer narrowed this chart's own scope
    pub chart_filters_active: bool,
    /// The dashboard-wide scope pins a province
    pub global_province_active: bool,
}

/// Value displayed for one bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Filled {
    pub count: u64,
    pub synthetic: bool,
}

pub struct FallbackGenerator<'a> {
    config: &'a FallbackConfig,
}

impl<'a> FallbackGenerator<'a> {
    pub fn new(config: &'a FallbackConfig) -> Self {
        Self { config }
    }

    /// Displayed count for bucket `index` of `kind`
    pub fn fill<R: Rng + ?Sized>(
        &self,
        kind: ChartKind,
        index: usize,
        real_count: u64,
        ctx: FallbackContext,
        rng: &mut R,
    ) -> Filled {
        if ctx.chart_filters_active || real_count > 0 {
            return Filled {
                count: real_count,
                synthetic: false,
            };
        }

        Filled {
            count: self.synthesize(kind, index, ctx, rng),
            synthetic: true,
        }
    }

    /// Placeholder value for bucket `index`; always at least 1
    pub fn synthesize<R: Rng + ?Sized>(
        &self,
        kind: ChartKind,
        index: usize,
        ctx: FallbackContext,
        rng: &mut R,
    ) -> u64 {
        let window = self.window(kind);
        let i = index as i64;

        let base = match kind {
            ChartKind::Category => 20 + 8 * i,
            ChartKind::Indicator => 8 + 3 * (i / 5) + 2 * (1 + i % 5),
            ChartKind::Province | ChartKind::Status | ChartKind::Trend => {
                sample_inclusive(rng, window.base_min, window.base_max)
            }
        };
        let jitter = sample_inclusive(rng, window.jitter_min, window.jitter_max);

        let scale = if ctx.global_province_active && kind.scales_with_province_filter() {
            self.config.province_scale
        } else {
            1.0
        };

        // Nudge absorbs binary error in products such as 45 · 0.6
        let value = ((base + jitter) as f64 * scale + 1e-9).floor();
        if value < 1.0 { 1 } else { value as u64 }
    }

    fn window(&self, kind: ChartKind) -> FallbackWindow {
        match kind {
            ChartKind::Category => self.config.category,
            ChartKind::Indicator => self.config.indicator,
            ChartKind::Province => self.config.province,
            ChartKind::Status => self.config.status,
            ChartKind::Trend => self.config.trend,
        }
    }
}

/// Uniform draw from `[lo, hi]`; a degenerate range returns `lo` without consuming randomness
pub(crate) fn sample_inclusive<R: Rng + ?Sized, T>(rng: &mut R, lo: T, hi: T) -> T
where
    T: rand::distr::uniform::SampleUniform + PartialOrd + Copy,
{
    if lo >= hi {
        lo
    } else {
        rng.random_range(lo..=hi)
    }
}
