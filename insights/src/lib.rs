//! Insights pipeline for the rights-violation dashboard
//!
//! Turns a snapshot of violation records into five chart datasets (category,
//! indicator, province, status, monthly trend) and a summary:
//!
//! - Filter: each chart counts records matching its global + chart-local scope
//! - Aggregate: one bucket per taxonomy entry, zero-filled, taxonomy order
//! - Fallback: empty buckets of unfiltered charts get placeholder values
//! - Annotate: percentage shares and palette colours
//!
//! Persistence lives behind [`RecordSource`]; this crate never performs I/O
//! beyond loading its config and taxonomy files.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod aggregate;
pub mod assemble;
pub mod config;
pub mod engine;
pub mod errors;
pub mod fallback;
pub mod recency;
pub mod record;
pub mod scope;
pub mod share;
pub mod summary;
pub mod taxonomy;

pub use aggregate::{Aggregation, BucketTally, Dimension, aggregate, month_label, trailing_months};
pub use assemble::{
    Bucket, ChartDataset, ChartLayout, EXPECTED_CATEGORY_BUCKETS, EXPECTED_INDICATOR_BUCKETS,
    EXPECTED_STATUS_BUCKETS, Palette, assemble,
};
pub use config::{
    DashboardConfig, FallbackConfig, FallbackWindow, IndicatorChartConfig, PaletteConfig,
    SummaryFallbackConfig,
};
pub use engine::{DashboardEngine, DashboardSnapshot};
pub use errors::{ErrorCategory, InsightsError, Result};
pub use fallback::{ChartKind, FallbackContext, FallbackGenerator, Filled};
pub use recency::{RECENT_WINDOW_DAYS, count_recent};
pub use record::{RecordDraft, RecordQuery, RecordSource, ViolationRecord};
pub use scope::{
    ChartConfig, ChartScope, ChartView, DashboardScopes, DateRange, GlobalScope, Predicate,
    compose,
};
pub use share::percentage;
pub use summary::{StatusCount, SummaryStats, summarize, summary_fallback};
pub use taxonomy::{
    Category, District, Indicator, MonitoringStatus, Province, ReferenceIssue, SubCategory,
    Taxonomy,
};

/// Insights crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
