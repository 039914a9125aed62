//! End-to-end dashboard runs over in-memory record snapshots
//!
//! Each test drives [`DashboardEngine`] the way the dashboard does: a record
//! source, a set of scopes, a fixed `now` and a seeded RNG.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use hrdash_insights::{
    ChartKind, ChartScope, DashboardConfig, DashboardEngine, DashboardScopes, DateRange,
    GlobalScope, RecordDraft, Taxonomy, ViolationRecord,
};
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand::rngs::StdRng;

// ─────────────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────────────

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 15, 10, 0, 0).single().expect("now")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn engine() -> DashboardEngine {
    DashboardEngine::new(Taxonomy::builtin(), DashboardConfig::default())
}

fn record(n: usize, event_date: NaiveDate, province: &str, category: &str) -> ViolationRecord {
    let draft = RecordDraft {
        title: format!("Incident {n}"),
        event_date,
        event_time: None,
        province_id: province.to_string(),
        district_id: None,
        category_id: category.to_string(),
        sub_category_id: None,
        indicator_id: None,
        status_id: "reported".to_string(),
        description: String::new(),
    };
    draft.into_record(
        format!("rec-{n}"),
        format!("VR-2024-{n:05}"),
        now(),
        now(),
    )
}

/// One Punjab record per GBV indicator
fn gbv_records() -> Vec<ViolationRecord> {
    let taxonomy = Taxonomy::builtin();
    let gbv = taxonomy
        .sub_category("women_hrds", "gbv")
        .expect("gbv sub-category");
    gbv.indicators
        .iter()
        .enumerate()
        .map(|(n, indicator)| {
            let mut r = record(n, date(2024, 5, 1), "punjab", "women_hrds");
            r.sub_category_id = Some("gbv".to_string());
            r.indicator_id = Some(indicator.id.clone());
            r
        })
        .collect()
}

fn mixed_records() -> Vec<ViolationRecord> {
    let rows = [
        ("punjab", "physical_attacks", "reported", date(2024, 6, 1)),
        ("punjab", "expression", "resolved", date(2024, 5, 20)),
        ("punjab", "expression", "resolved", date(2024, 3, 2)),
        ("sindh", "assembly", "resolved", date(2024, 1, 10)),
        ("sindh", "legal_harassment", "in_court", date(2023, 12, 5)),
        ("balochistan", "physical_attacks", "unresolved", date(2024, 6, 10)),
        ("islamabad", "women_hrds", "under_investigation", date(2024, 4, 4)),
    ];
    rows.into_iter()
        .enumerate()
        .map(|(n, (province, category, status, day))| {
            let mut r = record(n, day, province, category);
            r.status_id = status.to_string();
            r
        })
        .collect()
}

fn shares_sum(values: &[&str]) -> f64 {
    values
        .iter()
        .map(|v| v.parse::<f64>().expect("numeric share"))
        .sum()
}

// ─────────────────────────────────────────────────────────────────────────────
// Scenarios
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_one_record_per_indicator() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(1);
    let records = gbv_records();
    assert_eq!(records.len(), 23);

    let snap = engine.run(&records, &DashboardScopes::default(), now(), &mut rng);

    assert_eq!(snap.indicator.counts(), vec![1; 23]);
    assert!(snap.indicator.buckets.iter().all(|b| b.percentage == "4.3"));
    assert!(!snap.indicator.synthetic);
    assert_eq!(snap.indicator.buckets[0].label, "Rape");

    let women = snap.category.bucket("women_hrds").expect("women_hrds");
    assert_eq!(women.count, 23);
    assert!(!women.synthetic);
    assert_eq!(snap.summary.total, 23);
    assert_eq!(snap.summary.distinct_categories, 1);
}

#[test]
fn test_empty_source_synthesizes_every_chart() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(2);
    let snap = engine
        .refresh(&Vec::<ViolationRecord>::new(), &DashboardScopes::default(), now(), &mut rng)
        .expect("refresh");

    let taxonomy = engine.taxonomy();
    let category_labels: Vec<&str> = taxonomy.categories.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(snap.category.labels(), category_labels);
    assert_eq!(
        snap.trend.labels(),
        vec!["Jan", "Feb", "Mar", "Apr", "May", "Jun"]
    );

    for dataset in snap.datasets() {
        assert!(!dataset.buckets.is_empty(), "{} empty", dataset.kind);
        assert!(dataset.buckets.iter().all(|b| b.count >= 1 && b.synthetic));
        assert!(!dataset.cardinality_mismatch, "{} mismatch", dataset.kind);
    }

    let summary = &snap.summary;
    assert!(summary.synthetic);
    assert!((150..=300).contains(&summary.total));
    assert!((10..=50).contains(&summary.recent));
    assert_eq!(summary.distinct_categories, 6);
    assert_eq!(summary.by_status.len(), 5);
}

#[test]
fn test_global_range_excluding_everything_keeps_trend_placeholders() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(3);
    let scopes = DashboardScopes {
        global: GlobalScope {
            province_id: None,
            date_range: DateRange::new(Some(date(2020, 1, 1)), Some(date(2020, 12, 31))),
        },
        ..DashboardScopes::default()
    };

    let snap = engine.run(&mixed_records(), &scopes, now(), &mut rng);

    assert_eq!(snap.trend.buckets.len(), 6);
    assert!(snap.trend.buckets.iter().all(|b| b.synthetic && b.count >= 1));
    assert!(snap.summary.synthetic);
}

#[test]
fn test_status_chart_filter_shows_truthful_zeros() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(4);
    let mut scopes = DashboardScopes::default();
    scopes.status.scope = ChartScope {
        status_id: Some("resolved".to_string()),
        ..ChartScope::default()
    };

    let snap = engine.run(&mixed_records(), &scopes, now(), &mut rng);

    assert_eq!(snap.status.counts(), vec![0, 0, 0, 3, 0]);
    assert_eq!(snap.status.total, 3);
    assert!(!snap.status.synthetic);
    assert_eq!(
        snap.status.buckets.iter().map(|b| b.percentage.as_str()).collect::<Vec<_>>(),
        vec!["0.0", "0.0", "0.0", "100.0", "0.0"]
    );
    // Other charts are untouched by the status chart's scope
    assert_eq!(snap.summary.total, 7);
}

#[test]
fn test_district_outside_province_matches_nothing() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(5);
    let mut records = mixed_records();
    records[0].district_id = Some("lahore".to_string());

    let mut scopes = DashboardScopes::default();
    scopes.category.scope = ChartScope {
        province_id: Some("sindh".to_string()),
        district_id: Some("lahore".to_string()),
        ..ChartScope::default()
    };
    let snap = engine.run(&records, &scopes, now(), &mut rng);
    assert_eq!(snap.category.total, 0);
    assert!(snap.category.buckets.iter().all(|b| b.percentage == "0.0"));

    scopes.category.scope.province_id = Some("punjab".to_string());
    let snap = engine.run(&records, &scopes, now(), &mut rng);
    assert_eq!(snap.category.bucket("physical_attacks").map(|b| b.count), Some(1));
    assert_eq!(snap.category.total, 1);
}

#[test]
fn test_same_seed_same_snapshot() {
    let engine = engine();
    let records = mixed_records();
    let scopes = DashboardScopes::default();

    let a = engine.run(&records, &scopes, now(), &mut StdRng::seed_from_u64(6));
    let b = engine.run(&records, &scopes, now(), &mut StdRng::seed_from_u64(6));
    assert_eq!(a, b);

    let c = engine.run(&records, &scopes, now(), &mut StdRng::seed_from_u64(7));
    for kind in ChartKind::ALL {
        assert_eq!(a.dataset(kind).labels(), c.dataset(kind).labels());
        for (x, y) in a.dataset(kind).buckets.iter().zip(&c.dataset(kind).buckets) {
            if !x.synthetic {
                assert_eq!(x.count, y.count);
            }
        }
    }
}

#[test]
fn test_shares_sum_to_about_100() {
    let engine = engine();
    let mut rng = StdRng::seed_from_u64(8);
    let snap = engine.run(&mixed_records(), &DashboardScopes::default(), now(), &mut rng);

    for dataset in snap.datasets() {
        let shares: Vec<&str> = dataset.buckets.iter().map(|b| b.percentage.as_str()).collect();
        let sum = shares_sum(&shares);
        let tolerance = 0.05 * shares.len() as f64;
        assert!((sum - 100.0).abs() <= tolerance, "{}: {sum}", dataset.kind);
    }
}

#[test]
fn test_narrowing_never_increases_counts() {
    let engine = engine();
    let records = mixed_records();

    let mut broad = DashboardScopes::default();
    broad.province.scope = ChartScope {
        date_range: DateRange::new(Some(date(2024, 1, 1)), None),
        ..ChartScope::default()
    };
    let mut narrow = broad.clone();
    narrow.province.scope.status_id = Some("resolved".to_string());

    let a = engine.run(&records, &broad, now(), &mut StdRng::seed_from_u64(9));
    let b = engine.run(&records, &narrow, now(), &mut StdRng::seed_from_u64(9));

    assert_eq!(a.province.counts(), vec![3, 1, 0, 1, 1, 0, 0]);
    for (wide, tight) in a.province.counts().into_iter().zip(b.province.counts()) {
        assert!(tight <= wide);
    }
    assert_eq!(b.province.total, 3);
}

#[test]
fn test_global_province_scales_province_placeholders() {
    let mut config = DashboardConfig::default();
    config.fallback.province.base_min = 50;
    config.fallback.province.base_max = 50;
    let engine = DashboardEngine::new(Taxonomy::builtin(), config);
    let mut rng = StdRng::seed_from_u64(10);

    let scopes = DashboardScopes {
        global: GlobalScope {
            province_id: Some("punjab".to_string()),
            date_range: DateRange::default(),
        },
        ..DashboardScopes::default()
    };
    let snap = engine.run(&mixed_records(), &scopes, now(), &mut rng);

    let punjab = snap.province.bucket("punjab").expect("punjab");
    assert_eq!(punjab.count, 3);
    assert!(!punjab.synthetic);
    for bucket in snap.province.buckets.iter().filter(|b| b.id != "punjab") {
        assert!(bucket.synthetic);
        assert_eq!(bucket.count, 30);
    }
    assert_eq!(snap.summary.total, 3);
    assert!(!snap.summary.synthetic);
}
