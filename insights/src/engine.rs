//! Dashboard pipeline: filter → aggregate → fallback → annotate, per chart
//!
//! [`DashboardEngine::run`] is a pure function of records, scopes, taxonomy,
//! `now` and the injected RNG. Callers re-run it whenever any scope changes;
//! coalescing rapid changes is the caller's job.

use crate::aggregate::{Dimension, aggregate, trailing_months};
use crate::assemble::{
    ChartDataset, ChartLayout, EXPECTED_CATEGORY_BUCKETS, EXPECTED_INDICATOR_BUCKETS,
    EXPECTED_STATUS_BUCKETS, Palette, assemble,
};
use crate::config::DashboardConfig;
use crate::errors::Result;
use crate::fallback::{ChartKind, FallbackContext, FallbackGenerator};
use crate::record::{RecordQuery, RecordSource, ViolationRecord};
use crate::scope::{ChartConfig, DashboardScopes, GlobalScope, Predicate, compose};
use crate::summary::{SummaryStats, summarize, summary_fallback};
use crate::taxonomy::Taxonomy;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

/// Everything the presentation layer needs after one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSnapshot {
    pub generated_at: DateTime<Utc>,
    pub category: ChartDataset,
    pub indicator: ChartDataset,
    pub province: ChartDataset,
    pub status: ChartDataset,
    pub trend: ChartDataset,
    pub summary: SummaryStats,
}

impl DashboardSnapshot {
    pub fn datasets(&self) -> [&ChartDataset; 5] {
        [
            &self.category,
            &self.indicator,
            &self.province,
            &self.status,
            &self.trend,
        ]
    }

    pub fn dataset(&self, kind: ChartKind) -> &ChartDataset {
        match kind {
            ChartKind::Category => &self.category,
            ChartKind::Indicator => &self.indicator,
            ChartKind::Province => &self.province,
            ChartKind::Status => &self.status,
            ChartKind::Trend => &self.trend,
        }
    }
}

#[derive(Debug, Clone)]
struct Palettes {
    category: Palette,
    indicator: Palette,
    province: Palette,
    status: Palette,
    trend: Palette,
}

impl Palettes {
    fn resolve(config: &DashboardConfig, taxonomy: &Taxonomy) -> Self {
        let pick = |kind: ChartKind, custom: &Option<Vec<String>>| {
            custom
                .clone()
                .and_then(Palette::from_colors)
                .unwrap_or_else(|| Palette::builtin(kind, taxonomy))
        };
        let overrides = &config.palettes;
        Self {
            category: pick(ChartKind::Category, &overrides.category),
            indicator: pick(ChartKind::Indicator, &overrides.indicator),
            province: pick(ChartKind::Province, &overrides.province),
            status: Palette::builtin(ChartKind::Status, taxonomy),
            trend: pick(ChartKind::Trend, &overrides.trend),
        }
    }

    fn get(&self, kind: ChartKind) -> &Palette {
        match kind {
            ChartKind::Category => &self.category,
            ChartKind::Indicator => &self.indicator,
            ChartKind::Province => &self.province,
            ChartKind::Status => &self.status,
            ChartKind::Trend => &self.trend,
        }
    }
}

/// Main entry point for dashboard runs
pub struct DashboardEngine {
    taxonomy: Taxonomy,
    config: DashboardConfig,
    palettes: Palettes,
}

impl DashboardEngine {
    pub fn new(taxonomy: Taxonomy, config: DashboardConfig) -> Self {
        let palettes = Palettes::resolve(&config, &taxonomy);
        Self {
            taxonomy,
            config,
            palettes,
        }
    }

    /// Build an engine from config, loading `taxonomy_path` when set
    pub fn from_config(config: DashboardConfig) -> Result<Self> {
        let taxonomy = match config.resolved_taxonomy_path() {
            Some(path) => {
                let taxonomy = Taxonomy::load(&path)?;
                tracing::info!(path = %path.display(), "Loaded taxonomy file");
                taxonomy
            }
            None => Taxonomy::builtin(),
        };
        Ok(Self::new(taxonomy, config))
    }

    /// Load config from the standard location and build an engine
    pub fn load() -> Result<Self> {
        Self::from_config(DashboardConfig::load()?)
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Run the full pipeline over a record snapshot
    pub fn run<R: Rng + ?Sized>(
        &self,
        records: &[ViolationRecord],
        scopes: &DashboardScopes,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> DashboardSnapshot {
        let indicator_dimension = Dimension::Indicator {
            category_id: self.config.indicator_chart.category_id.clone(),
            sub_category_id: self.config.indicator_chart.sub_category_id.clone(),
        };
        let trend_dimension = Dimension::EventMonth {
            months: trailing_months(now.date_naive(), self.config.trend_months),
        };

        let category = self.chart(
            ChartKind::Category,
            &scopes.category,
            &scopes.global,
            &Dimension::Category,
            EXPECTED_CATEGORY_BUCKETS,
            records,
            rng,
        );
        let indicator = self.chart(
            ChartKind::Indicator,
            &scopes.indicator,
            &scopes.global,
            &indicator_dimension,
            EXPECTED_INDICATOR_BUCKETS,
            records,
            rng,
        );
        let province = self.chart(
            ChartKind::Province,
            &scopes.province,
            &scopes.global,
            &Dimension::Province,
            // Province count is taxonomy-defined, so this check always passes
            self.taxonomy.provinces.len(),
            records,
            rng,
        );
        let status = self.chart(
            ChartKind::Status,
            &scopes.status,
            &scopes.global,
            &Dimension::Status,
            EXPECTED_STATUS_BUCKETS,
            records,
            rng,
        );
        let trend = self.chart(
            ChartKind::Trend,
            &scopes.trend,
            &scopes.global,
            &trend_dimension,
            self.config.trend_months,
            records,
            rng,
        );

        let summary = self.summary(records, &scopes.global, now, rng);

        tracing::debug!(
            records = records.len(),
            synthetic_charts = [&category, &indicator, &province, &status, &trend]
                .iter()
                .filter(|d| d.synthetic)
                .count(),
            synthetic_summary = summary.synthetic,
            "Dashboard pipeline run complete"
        );

        DashboardSnapshot {
            generated_at: now,
            category,
            indicator,
            province,
            status,
            trend,
            summary,
        }
    }

    /// Run with a process entropy source
    pub fn run_with_entropy(
        &self,
        records: &[ViolationRecord],
        scopes: &DashboardScopes,
        now: DateTime<Utc>,
    ) -> DashboardSnapshot {
        self.run(records, scopes, now, &mut rand::rng())
    }

    /// Fetch the full record snapshot from `source`, then run
    pub fn refresh<S, R>(
        &self,
        source: &S,
        scopes: &DashboardScopes,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<DashboardSnapshot>
    where
        S: RecordSource + ?Sized,
        R: Rng + ?Sized,
    {
        let records = source.query(&RecordQuery::default())?;
        Ok(self.run(&records, scopes, now, rng))
    }

    #[allow(clippy::too_many_arguments)]
    fn chart<R: Rng + ?Sized>(
        &self,
        kind: ChartKind,
        chart: &ChartConfig,
        global: &GlobalScope,
        dimension: &Dimension,
        expected_len: usize,
        records: &[ViolationRecord],
        rng: &mut R,
    ) -> ChartDataset {
        let predicate = compose(global, &chart.scope);
        let aggregation = aggregate(records, &predicate, dimension, &self.taxonomy);

        let layout = ChartLayout {
            kind,
            view: chart.view,
            expected_len,
            palette: self.palettes.get(kind),
            fallback: FallbackContext {
                chart_filters_active: chart.scope.is_active(),
                global_province_active: global.province_active(),
            },
        };
        let generator = FallbackGenerator::new(&self.config.fallback);
        assemble(layout, aggregation, &generator, rng)
    }

    fn summary<R: Rng + ?Sized>(
        &self,
        records: &[ViolationRecord],
        global: &GlobalScope,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> SummaryStats {
        let predicate = Predicate::global(global);
        let scoped: Vec<&ViolationRecord> = records
            .iter()
            .filter(|r| predicate.matches(r, &self.taxonomy))
            .collect();

        if scoped.is_empty() {
            let status = self.config.fallback.status;
            return summary_fallback(
                &self.config.fallback.summary,
                (status.base_min, status.base_max),
                &self.taxonomy,
                rng,
            );
        }

        summarize(&scoped, &self.taxonomy, now, self.config.recent_window_days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{ChartScope, DateRange};
    use chrono::{NaiveDate, TimeZone};
    use pretty_assertions::assert_eq;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 10, 19, 9, 30, 0).single().expect("now")
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn engine() -> DashboardEngine {
        DashboardEngine::new(Taxonomy::builtin(), DashboardConfig::default())
    }

    fn records() -> Vec<ViolationRecord> {
        let mut out = Vec::new();
        for (i, (province, category, status, day)) in [
            ("punjab", "women_hrds", "reported", date(2024, 10, 1)),
            ("punjab", "expression", "resolved", date(2024, 9, 12)),
            ("sindh", "women_hrds", "in_court", date(2024, 7, 4)),
            ("balochistan", "physical_attacks", "reported", date(2023, 10, 2)),
        ]
        .into_iter()
        .enumerate()
        {
            let mut r = ViolationRecord::sample(&format!("r{i}"), day);
            r.province_id = province.to_string();
            r.category_id = category.to_string();
            r.status_id = status.to_string();
            out.push(r);
        }
        out
    }

    #[test]
    fn test_engine_shapes() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(1);
        let snap = engine.run(&records(), &DashboardScopes::default(), now(), &mut rng);

        assert_eq!(snap.category.buckets.len(), 6);
        assert_eq!(snap.indicator.buckets.len(), 23);
        assert_eq!(snap.province.buckets.len(), 7);
        assert_eq!(snap.status.buckets.len(), 5);
        assert_eq!(
            snap.trend.labels(),
            vec!["May", "Jun", "Jul", "Aug", "Sep", "Oct"]
        );
        assert!(snap.datasets().iter().all(|d| !d.cardinality_mismatch));
        assert_eq!(snap.generated_at, now());
    }

    #[test]
    fn test_trend_ignores_records_outside_window() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(4);
        let january = vec![ViolationRecord::sample("jan", date(2024, 1, 15))];
        let snap = engine.run(&january, &DashboardScopes::default(), now(), &mut rng);

        assert_eq!(snap.trend.unresolved, 0);
        assert_eq!(snap.category.unresolved, 0);
        assert!(snap.trend.synthetic);
    }

    #[test]
    fn test_oversized_trend_window_has_distinct_months() {
        let config = DashboardConfig {
            trend_months: 14,
            ..DashboardConfig::default()
        };
        let engine = DashboardEngine::new(Taxonomy::builtin(), config);
        let mut rng = StdRng::seed_from_u64(5);
        let snap = engine.run(&records(), &DashboardScopes::default(), now(), &mut rng);

        let labels = snap.trend.labels();
        assert_eq!(labels.len(), 12);
        assert_eq!(labels.first().copied(), Some("Nov"));
        assert_eq!(labels.last().copied(), Some("Oct"));
        // Oct 2024 and Oct 2023 share the final bucket
        assert_eq!(snap.trend.buckets[11].count, 2);
        assert!(!snap.trend.buckets[11].synthetic);
        assert!(snap.trend.cardinality_mismatch);
    }

    #[test]
    fn test_real_counts_shown_where_present() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(2);
        let snap = engine.run(&records(), &DashboardScopes::default(), now(), &mut rng);

        let women = snap.category.bucket("women_hrds").expect("bucket");
        assert_eq!(women.count, 2);
        assert!(!women.synthetic);

        // Oct bucket: 2024-10-01 and 2023-10-02 share the month
        let oct = snap.trend.bucket("10").expect("oct");
        assert_eq!(oct.count, 2);
        assert!(!oct.synthetic);

        assert_eq!(snap.summary.total, 4);
        assert_eq!(snap.summary.distinct_categories, 3);
        assert_eq!(snap.summary.recent, 1);
        assert!(!snap.summary.synthetic);
    }

    #[test]
    fn test_global_scope_narrows_summary() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(3);
        let scopes = DashboardScopes {
            global: GlobalScope {
                province_id: Some("punjab".to_string()),
                date_range: DateRange::default(),
            },
            ..DashboardScopes::default()
        };
        let snap = engine.run(&records(), &scopes, now(), &mut rng);
        assert_eq!(snap.summary.total, 2);
        assert_eq!(snap.summary.status_count("resolved"), Some(1));

        let punjab = snap.province.bucket("punjab").expect("punjab");
        assert_eq!(punjab.count, 2);
        assert!(!punjab.synthetic);
        // Other provinces are placeholders scaled down by the province filter
        let sindh = snap.province.bucket("sindh").expect("sindh");
        assert!(sindh.synthetic);
        assert!((1..=30).contains(&sindh.count));
    }

    #[test]
    fn test_chart_filter_disables_fallback() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(4);
        let mut scopes = DashboardScopes::default();
        scopes.category.scope = ChartScope {
            province_id: Some("sindh".to_string()),
            ..ChartScope::default()
        };
        let snap = engine.run(&records(), &scopes, now(), &mut rng);

        assert!(snap.category.filters_active);
        assert!(!snap.category.synthetic);
        assert_eq!(snap.category.counts(), vec![0, 0, 1, 0, 0, 0]);
        assert_eq!(snap.category.buckets[2].percentage, "100.0");
    }

    #[test]
    fn test_missing_indicator_sub_category_is_flagged_not_fatal() {
        let mut config = DashboardConfig::default();
        config.indicator_chart.sub_category_id = "nope".to_string();
        let engine = DashboardEngine::new(Taxonomy::builtin(), config);
        let mut rng = StdRng::seed_from_u64(5);

        let snap = engine.run(&records(), &DashboardScopes::default(), now(), &mut rng);
        assert!(snap.indicator.cardinality_mismatch);
        assert!(snap.indicator.buckets.is_empty());
        assert_eq!(snap.category.buckets.len(), 6);
    }

    #[test]
    fn test_palette_override() {
        let mut config = DashboardConfig::default();
        config.palettes.category = Some(vec!["#111111".to_string()]);
        let engine = DashboardEngine::new(Taxonomy::builtin(), config);
        let mut rng = StdRng::seed_from_u64(6);

        let snap = engine.run(&[], &DashboardScopes::default(), now(), &mut rng);
        assert!(snap.category.buckets.iter().all(|b| b.color == "#111111"));
        assert!(snap.category.buckets.iter().all(|b| b.color_index == 0));
    }

    #[test]
    fn test_refresh_reads_source() {
        let engine = engine();
        let mut rng = StdRng::seed_from_u64(7);
        let source = records();
        let snap = engine
            .refresh(&source, &DashboardScopes::default(), now(), &mut rng)
            .expect("refresh");
        assert_eq!(snap.summary.total, 4);
    }
}
