//! Chart dataset assembly
//!
//! Turns an [`Aggregation`] into the finished, ordered bucket list for one
//! chart: fallback values applied, colours assigned by position, percentage
//! shares annotated, and the bucket count checked against the layout the
//! dashboard expects.

use crate::aggregate::Aggregation;
use crate::fallback::{ChartKind, FallbackContext, FallbackGenerator};
use crate::scope::ChartView;
use crate::share;
use crate::taxonomy::Taxonomy;
use rand::Rng;
use serde::Serialize;

/// Bucket counts the dashboard layout is designed for
pub const EXPECTED_CATEGORY_BUCKETS: usize = 6;
pub const EXPECTED_INDICATOR_BUCKETS: usize = 23;
pub const EXPECTED_STATUS_BUCKETS: usize = crate::taxonomy::EXPECTED_STATUS_COUNT;

const CATEGORY_PALETTE: &[&str] = &[
    "#2563EB", "#DC2626", "#9333EA", "#EA580C", "#059669", "#CA8A04",
];

const INDICATOR_PALETTE: &[&str] = &[
    "#BE123C", "#E11D48", "#F43F5E", "#FB7185", "#FDA4AF", "#9D174D", "#DB2777", "#EC4899",
    "#F472B6", "#F9A8D4", "#86198F", "#C026D3", "#D946EF", "#E879F9", "#F0ABFC", "#6B21A8",
    "#9333EA", "#A855F7", "#C084FC", "#D8B4FE", "#4C1D95", "#7C3AED", "#8B5CF6",
];

const PROVINCE_PALETTE: &[&str] = &[
    "#0EA5E9", "#14B8A6", "#22C55E", "#84CC16", "#EAB308", "#F97316", "#EF4444", "#6366F1",
];

const TREND_PALETTE: &[&str] = &["#1D4ED8", "#2563EB", "#3B82F6", "#60A5FA", "#93C5FD", "#BFDBFE"];

/// Fixed colour list indexed by bucket position, cycling past the end
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    pub fn from_colors(colors: Vec<String>) -> Option<Self> {
        if colors.is_empty() {
            None
        } else {
            Some(Self { colors })
        }
    }

    /// Builtin palette for `kind`; the status chart uses each status's own colour
    pub fn builtin(kind: ChartKind, taxonomy: &Taxonomy) -> Self {
        let from_static = |colors: &[&str]| Self {
            colors: colors.iter().map(|c| (*c).to_string()).collect(),
        };
        match kind {
            ChartKind::Category => from_static(CATEGORY_PALETTE),
            ChartKind::Indicator => from_static(INDICATOR_PALETTE),
            ChartKind::Province => from_static(PROVINCE_PALETTE),
            ChartKind::Trend => from_static(TREND_PALETTE),
            ChartKind::Status => Self::from_colors(
                taxonomy.statuses.iter().map(|s| s.color.clone()).collect(),
            )
            .unwrap_or_else(|| from_static(CATEGORY_PALETTE)),
        }
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Palette slot and colour for bucket `index`
    pub fn pick(&self, index: usize) -> (usize, &str) {
        let slot = index % self.colors.len();
        (slot, self.colors[slot].as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub id: String,
    /// Taxonomy display name, verbatim
    pub label: String,
    pub count: u64,
    pub color_index: usize,
    pub color: String,
    pub percentage: String,
    /// Count is a placeholder, not real data
    pub synthetic: bool,
}

impl Bucket {
    #[cfg(test)]
    pub(crate) fn test_bucket(id: &str, count: u64) -> Self {
        Self {
            id: id.to_string(),
            label: id.to_string(),
            count,
            color_index: 0,
            color: String::new(),
            percentage: String::new(),
            synthetic: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartDataset {
    pub kind: ChartKind,
    pub view: ChartView,
    pub buckets: Vec<Bucket>,
    /// Sum of displayed counts
    pub total: u64,
    pub expected_len: usize,
    pub cardinality_mismatch: bool,
    /// A chart-local filter was active for this run
    pub filters_active: bool,
    /// At least one bucket carries a placeholder value
    pub synthetic: bool,
    /// Matched records dropped for unresolvable references
    pub unresolved: usize,
}

impl ChartDataset {
    pub fn labels(&self) -> Vec<&str> {
        self.buckets.iter().map(|b| b.label.as_str()).collect()
    }

    pub fn counts(&self) -> Vec<u64> {
        self.buckets.iter().map(|b| b.count).collect()
    }

    pub fn bucket(&self, id: &str) -> Option<&Bucket> {
        self.buckets.iter().find(|b| b.id == id)
    }
}

/// Per-chart assembly parameters
#[derive(Debug, Clone, Copy)]
pub struct ChartLayout<'a> {
    pub kind: ChartKind,
    pub view: ChartView,
    pub expected_len: usize,
    pub palette: &'a Palette,
    pub fallback: FallbackContext,
}

pub fn assemble<R: Rng + ?Sized>(
    layout: ChartLayout<'_>,
    aggregation: Aggregation,
    generator: &FallbackGenerator<'_>,
    rng: &mut R,
) -> ChartDataset {
    let mut buckets: Vec<Bucket> = aggregation
        .tallies
        .into_iter()
        .enumerate()
        .map(|(index, tally)| {
            let filled = generator.fill(layout.kind, index, tally.count, layout.fallback, rng);
            let (color_index, color) = layout.palette.pick(index);
            Bucket {
                id: tally.id,
                label: tally.label,
                count: filled.count,
                color_index,
                color: color.to_string(),
                percentage: String::new(),
                synthetic: filled.synthetic,
            }
        })
        .collect();

    let total = share::annotate(&mut buckets);

    let cardinality_mismatch = buckets.len() != layout.expected_len;
    if cardinality_mismatch {
        tracing::warn!(
            chart = %layout.kind,
            expected = layout.expected_len,
            actual = buckets.len(),
            "Chart bucket count differs from the expected taxonomy cardinality"
        );
    }

    ChartDataset {
        kind: layout.kind,
        view: layout.view,
        synthetic: buckets.iter().any(|b| b.synthetic),
        buckets,
        total,
        expected_len: layout.expected_len,
        cardinality_mismatch,
        filters_active: layout.fallback.chart_filters_active,
        unresolved: aggregation.unresolved,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::BucketTally;
    use crate::config::FallbackConfig;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn aggregation(counts: &[u64]) -> Aggregation {
        Aggregation {
            tallies: counts
                .iter()
                .enumerate()
                .map(|(i, count)| BucketTally {
                    id: format!("b{i}"),
                    label: format!("Bucket {i}"),
                    count: *count,
                })
                .collect(),
            matched: counts.iter().sum::<u64>() as usize,
            unresolved: 0,
        }
    }

    #[test]
    fn test_palette_cycles() {
        let palette = Palette::from_colors(vec!["#a".into(), "#b".into()]).expect("palette");
        assert_eq!(palette.pick(0), (0, "#a"));
        assert_eq!(palette.pick(1), (1, "#b"));
        assert_eq!(palette.pick(4), (0, "#a"));
        assert!(Palette::from_colors(Vec::new()).is_none());
    }

    #[test]
    fn test_builtin_palettes_match_layout() {
        let t = Taxonomy::builtin();
        assert_eq!(Palette::builtin(ChartKind::Category, &t).len(), EXPECTED_CATEGORY_BUCKETS);
        assert_eq!(Palette::builtin(ChartKind::Indicator, &t).len(), EXPECTED_INDICATOR_BUCKETS);
        assert_eq!(Palette::builtin(ChartKind::Trend, &t).len(), 6);
        let status = Palette::builtin(ChartKind::Status, &t);
        assert_eq!(status.pick(3).1, "#10B981");
    }

    #[test]
    fn test_assemble_real_counts() {
        let cfg = FallbackConfig::default();
        let generator = FallbackGenerator::new(&cfg);
        let t = Taxonomy::builtin();
        let palette = Palette::builtin(ChartKind::Status, &t);
        let mut rng = StdRng::seed_from_u64(5);

        let layout = ChartLayout {
            kind: ChartKind::Status,
            view: ChartView::Pie,
            expected_len: 5,
            palette: &palette,
            fallback: FallbackContext {
                chart_filters_active: true,
                global_province_active: false,
            },
        };
        let dataset = assemble(layout, aggregation(&[0, 0, 0, 3, 0]), &generator, &mut rng);

        assert_eq!(dataset.counts(), vec![0, 0, 0, 3, 0]);
        assert_eq!(dataset.total, 3);
        assert!(!dataset.synthetic);
        assert!(!dataset.cardinality_mismatch);
        assert_eq!(dataset.buckets[3].percentage, "100.0");
        assert_eq!(dataset.buckets[0].percentage, "0.0");
        assert_eq!(dataset.buckets[4].color, "#EF4444");
        assert_eq!(dataset.view, ChartView::Pie);
    }

    #[test]
    fn test_assemble_flags_mismatch_but_returns_data() {
        let cfg = FallbackConfig::default();
        let generator = FallbackGenerator::new(&cfg);
        let t = Taxonomy::builtin();
        let palette = Palette::builtin(ChartKind::Category, &t);
        let mut rng = StdRng::seed_from_u64(5);

        let layout = ChartLayout {
            kind: ChartKind::Category,
            view: ChartView::Bar,
            expected_len: 6,
            palette: &palette,
            fallback: FallbackContext::default(),
        };
        let dataset = assemble(layout, aggregation(&[2, 0, 1]), &generator, &mut rng);

        assert!(dataset.cardinality_mismatch);
        assert_eq!(dataset.buckets.len(), 3);
        assert_eq!(dataset.buckets[0].count, 2);
        assert!(!dataset.buckets[0].synthetic);
        assert!(dataset.buckets[1].synthetic);
        assert!(dataset.buckets[1].count >= 1);
        assert!(dataset.synthetic);
    }
}
