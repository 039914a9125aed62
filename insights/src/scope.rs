//! Filter scopes and their composition
//!
//! A dashboard run takes one [`GlobalScope`] plus one [`ChartConfig`] per
//! chart. [`compose`] ANDs a global scope with a chart scope into the
//! [`Predicate`] a record must satisfy to be counted on that chart.

use crate::record::ViolationRecord;
use crate::taxonomy::Taxonomy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive calendar-date range; either side may be open
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        Self { start, end }
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start.is_none_or(|start| date >= start) && self.end.is_none_or(|end| date <= end)
    }
}

/// Dashboard-wide filter applied to every chart and the summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalScope {
    pub province_id: Option<String>,
    #[serde(default)]
    pub date_range: DateRange,
}

impl GlobalScope {
    pub fn province_active(&self) -> bool {
        non_empty(&self.province_id).is_some()
    }

    pub fn is_active(&self) -> bool {
        self.province_active() || !self.date_range.is_unbounded()
    }
}

/// Chart-local filter; every field optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartScope {
    pub province_id: Option<String>,
    pub district_id: Option<String>,
    pub category_id: Option<String>,
    pub status_id: Option<String>,
    #[serde(default)]
    pub date_range: DateRange,
}

impl ChartScope {
    /// Whether the viewer narrowed this chart explicitly
    pub fn is_active(&self) -> bool {
        non_empty(&self.province_id).is_some()
            || non_empty(&self.district_id).is_some()
            || non_empty(&self.category_id).is_some()
            || non_empty(&self.status_id).is_some()
            || !self.date_range.is_unbounded()
    }
}

/// Per-chart view-mode toggle; presentation only, counts are unaffected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartView {
    #[default]
    Bar,
    Pie,
    Line,
    Table,
}

impl ChartView {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bar => "bar",
            Self::Pie => "pie",
            Self::Line => "line",
            Self::Table => "table",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartConfig {
    #[serde(default)]
    pub scope: ChartScope,
    #[serde(default)]
    pub view: ChartView,
}

impl ChartConfig {
    pub fn with_scope(scope: ChartScope) -> Self {
        Self {
            scope,
            view: ChartView::default(),
        }
    }
}

/// Every filter scope and view toggle for one pipeline run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardScopes {
    #[serde(default)]
    pub global: GlobalScope,
    #[serde(default)]
    pub category: ChartConfig,
    #[serde(default)]
    pub indicator: ChartConfig,
    #[serde(default)]
    pub province: ChartConfig,
    #[serde(default)]
    pub status: ChartConfig,
    #[serde(default = "default_trend_config")]
    pub trend: ChartConfig,
}

fn default_trend_config() -> ChartConfig {
    ChartConfig {
        scope: ChartScope::default(),
        view: ChartView::Line,
    }
}

impl Default for DashboardScopes {
    fn default() -> Self {
        Self {
            global: GlobalScope::default(),
            category: ChartConfig::default(),
            indicator: ChartConfig::default(),
            province: ChartConfig::default(),
            status: ChartConfig {
                scope: ChartScope::default(),
                view: ChartView::Pie,
            },
            trend: default_trend_config(),
        }
    }
}

/// Effective predicate: the AND of every non-empty constraint of both scopes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    provinces: Vec<String>,
    districts: Vec<String>,
    categories: Vec<String>,
    statuses: Vec<String>,
    date_ranges: Vec<DateRange>,
}

/// Compose a global and a chart-local scope into one predicate
pub fn compose(global: &GlobalScope, chart: &ChartScope) -> Predicate {
    let mut predicate = Predicate::default();

    predicate.provinces.extend(non_empty(&global.province_id));
    predicate.provinces.extend(non_empty(&chart.province_id));
    predicate.districts.extend(non_empty(&chart.district_id));
    predicate.categories.extend(non_empty(&chart.category_id));
    predicate.statuses.extend(non_empty(&chart.status_id));

    for range in [global.date_range, chart.date_range] {
        if !range.is_unbounded() {
            predicate.date_ranges.push(range);
        }
    }

    predicate
}

impl Predicate {
    /// Predicate with only the global scope applied (summary statistics)
    pub fn global(global: &GlobalScope) -> Self {
        compose(global, &ChartScope::default())
    }

    pub fn matches_all(&self) -> bool {
        self.provinces.is_empty()
            && self.districts.is_empty()
            && self.categories.is_empty()
            && self.statuses.is_empty()
            && self.date_ranges.is_empty()
    }

    pub fn matches(&self, record: &ViolationRecord, taxonomy: &Taxonomy) -> bool {
        if self.provinces.iter().any(|p| *p != record.province_id) {
            return false;
        }

        if !self.districts.is_empty() {
            let Some(district) = record.district_id.as_deref() else {
                return false;
            };
            if self.districts.iter().any(|d| d != district) {
                return false;
            }
            // Province and district both pinned: the district has to sit in that province
            if !self.provinces.is_empty()
                && !taxonomy.district_belongs_to(&record.province_id, district)
            {
                return false;
            }
        }

        if self.categories.iter().any(|c| *c != record.category_id) {
            return false;
        }
        if self.statuses.iter().any(|s| *s != record.status_id) {
            return false;
        }

        self.date_ranges
            .iter()
            .all(|range| range.contains(record.event_date))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
