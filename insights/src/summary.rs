//! Roll-up statistics under the global scope

use crate::config::SummaryFallbackConfig;
use crate::fallback::sample_inclusive;
use crate::recency::count_recent;
use crate::record::ViolationRecord;
use crate::taxonomy::Taxonomy;
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    pub status_id: String,
    pub label: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub total: u64,
    pub distinct_categories: usize,
    /// One entry per taxonomy status, in taxonomy order
    pub by_status: Vec<StatusCount>,
    pub recent: u64,
    /// Figures are placeholders, not real data
    pub synthetic: bool,
}

impl SummaryStats {
    pub fn status_count(&self, status_id: &str) -> Option<u64> {
        self.by_status
            .iter()
            .find(|s| s.status_id == status_id)
            .map(|s| s.count)
    }
}

/// Summary over records that already passed the global scope
pub fn summarize(
    scoped: &[&ViolationRecord],
    taxonomy: &Taxonomy,
    now: DateTime<Utc>,
    window_days: u32,
) -> SummaryStats {
    let distinct_categories = scoped
        .iter()
        .filter(|r| taxonomy.category(&r.category_id).is_some())
        .map(|r| r.category_id.as_str())
        .collect::<HashSet<_>>()
        .len();

    let by_status = taxonomy
        .statuses
        .iter()
        .map(|status| StatusCount {
            status_id: status.id.clone(),
            label: status.label.clone(),
            count: scoped.iter().filter(|r| r.status_id == status.id).count() as u64,
        })
        .collect();

    SummaryStats {
        total: scoped.len() as u64,
        distinct_categories,
        by_status,
        recent: count_recent(scoped.iter().copied(), now, window_days) as u64,
        synthetic: false,
    }
}

/// Placeholder summary for an empty dashboard
pub fn summary_fallback<R: Rng + ?Sized>(
    config: &SummaryFallbackConfig,
    status_window: (i64, i64),
    taxonomy: &Taxonomy,
    rng: &mut R,
) -> SummaryStats {
    let by_status = taxonomy
        .statuses
        .iter()
        .map(|status| StatusCount {
            status_id: status.id.clone(),
            label: status.label.clone(),
            count: sample_inclusive(rng, status_window.0, status_window.1).max(1) as u64,
        })
        .collect();

    SummaryStats {
        total: sample_inclusive(rng, config.total_min, config.total_max),
        distinct_categories: taxonomy.categories.len(),
        by_status,
        recent: sample_inclusive(rng, config.recent_min, config.recent_max),
        synthetic: true,
    }
}
