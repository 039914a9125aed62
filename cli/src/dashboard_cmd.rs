//! `hrdash dashboard` - run the pipeline against the record store

use crate::{Context, GlobalArgs, UsageError, exit_codes};
use chrono::{DateTime, NaiveDate, Utc};
use clap::Parser;
use hrdash_insights::{
    ChartDataset, ChartScope, DashboardScopes, DashboardSnapshot, DateRange, GlobalScope,
    SummaryStats, Taxonomy,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

#[derive(Debug, Parser)]
pub struct DashboardArgs {
    /// Dashboard-wide province filter (id or name)
    #[arg(long, value_name = "PROVINCE")]
    pub province: Option<String>,

    /// Dashboard-wide start date (inclusive, YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Dashboard-wide end date (inclusive, YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Category chart: province filter
    #[arg(long, value_name = "PROVINCE")]
    pub category_province: Option<String>,

    /// Indicator chart: province filter
    #[arg(long, value_name = "PROVINCE")]
    pub indicator_province: Option<String>,

    /// Indicator chart: district filter (requires --indicator-province for names)
    #[arg(long, value_name = "DISTRICT")]
    pub indicator_district: Option<String>,

    /// Province chart: category filter
    #[arg(long, value_name = "CATEGORY")]
    pub province_category: Option<String>,

    /// Status chart: category filter
    #[arg(long, value_name = "CATEGORY")]
    pub status_category: Option<String>,

    /// Status chart: status filter
    #[arg(long, value_name = "STATUS")]
    pub status_filter: Option<String>,

    /// Status chart: start date
    #[arg(long, value_name = "DATE")]
    pub status_from: Option<NaiveDate>,

    /// Status chart: end date
    #[arg(long, value_name = "DATE")]
    pub status_to: Option<NaiveDate>,

    /// Trend chart: category filter
    #[arg(long, value_name = "CATEGORY")]
    pub trend_category: Option<String>,

    /// Evaluate the trend window and recency as of this date (default: today)
    #[arg(long, value_name = "DATE")]
    pub as_of: Option<NaiveDate>,

    /// Seed placeholder values for reproducible output
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output the snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run the dashboard command
pub fn run_dashboard(global: &GlobalArgs, args: DashboardArgs) -> anyhow::Result<i32> {
    let ctx = Context::load(global)?;
    let scopes = build_scopes(&args, ctx.engine.taxonomy())?;
    let now = args
        .as_of
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_else(Utc::now);

    let snapshot = match args.seed {
        Some(seed) => ctx
            .engine
            .refresh(&ctx.store, &scopes, now, &mut StdRng::seed_from_u64(seed))?,
        None => ctx.engine.refresh(&ctx.store, &scopes, now, &mut rand::rng())?,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_human(&snapshot, &scopes);
    }

    Ok(exit_codes::SUCCESS)
}

/// Translate flags into scopes, resolving names to taxonomy ids
pub fn build_scopes(args: &DashboardArgs, taxonomy: &Taxonomy) -> anyhow::Result<DashboardScopes> {
    let province = |flag: &str, value: &Option<String>| -> anyhow::Result<Option<String>> {
        resolve(flag, value.as_deref(), |v| taxonomy.resolve_province(v))
    };
    let category = |flag: &str, value: &Option<String>| -> anyhow::Result<Option<String>> {
        resolve(flag, value.as_deref(), |v| taxonomy.resolve_category(v))
    };

    let mut scopes = DashboardScopes {
        global: GlobalScope {
            province_id: province("--province", &args.province)?,
            date_range: date_range("--from/--to", args.from, args.to)?,
        },
        ..DashboardScopes::default()
    };

    scopes.category.scope = ChartScope {
        province_id: province("--category-province", &args.category_province)?,
        ..ChartScope::default()
    };

    let indicator_province = province("--indicator-province", &args.indicator_province)?;
    let indicator_district = match (&args.indicator_district, &indicator_province) {
        (Some(district), Some(province_id)) => Some(
            taxonomy
                .resolve_district(province_id, district)
                .map(str::to_string)
                .ok_or_else(|| {
                    UsageError(format!(
                        "--indicator-district: '{district}' is not a district of {province_id}"
                    ))
                })?,
        ),
        // Without a province the district can only be matched by id
        (Some(district), None) => Some(district.trim().to_string()),
        (None, _) => None,
    };
    scopes.indicator.scope = ChartScope {
        province_id: indicator_province,
        district_id: indicator_district,
        ..ChartScope::default()
    };

    scopes.province.scope = ChartScope {
        category_id: category("--province-category", &args.province_category)?,
        ..ChartScope::default()
    };

    scopes.status.scope = ChartScope {
        category_id: category("--status-category", &args.status_category)?,
        status_id: resolve("--status-filter", args.status_filter.as_deref(), |v| {
            taxonomy.resolve_status(v)
        })?,
        date_range: date_range("--status-from/--status-to", args.status_from, args.status_to)?,
        ..ChartScope::default()
    };

    scopes.trend.scope = ChartScope {
        category_id: category("--trend-category", &args.trend_category)?,
        ..ChartScope::default()
    };

    Ok(scopes)
}

fn resolve<'t>(
    flag: &str,
    value: Option<&str>,
    lookup: impl Fn(&str) -> Option<&'t str>,
) -> anyhow::Result<Option<String>> {
    let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    match lookup(value) {
        Some(id) => Ok(Some(id.to_string())),
        None => Err(UsageError(format!("{flag}: unknown value '{value}'")).into()),
    }
}

fn date_range(
    flag: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> anyhow::Result<DateRange> {
    if let (Some(s), Some(e)) = (start, end)
        && s > e
    {
        return Err(UsageError(format!("{flag}: start {s} is after end {e}")).into());
    }
    Ok(DateRange::new(start, end))
}

// ─────────────────────────────────────────────────────────────────────────────
// Human output
// ─────────────────────────────────────────────────────────────────────────────

fn print_human(snapshot: &DashboardSnapshot, scopes: &DashboardScopes) {
    println!("\n Rights Violation Dashboard\n");
    if scopes.global.is_active() {
        println!("Scope: {}", describe_global(&scopes.global));
    }
    println!("Generated: {}", format_timestamp(snapshot.generated_at));
    println!();

    print_summary(&snapshot.summary);

    for dataset in snapshot.datasets() {
        print_chart(dataset);
    }

    if snapshot.datasets().iter().any(|d| d.synthetic) || snapshot.summary.synthetic {
        println!("* placeholder value, no matching records");
    }
}

fn describe_global(global: &GlobalScope) -> String {
    let mut parts = Vec::new();
    if let Some(province) = &global.province_id {
        parts.push(format!("province={province}"));
    }
    if let Some(start) = global.date_range.start {
        parts.push(format!("from={start}"));
    }
    if let Some(end) = global.date_range.end {
        parts.push(format!("to={end}"));
    }
    parts.join(" ")
}

fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn print_summary(summary: &SummaryStats) {
    let mark = if summary.synthetic { "*" } else { "" };
    println!("Summary{mark}");
    println!("  Total records:     {}", summary.total);
    println!("  Categories:        {}", summary.distinct_categories);
    println!("  Recent (window):   {}", summary.recent);
    for status in &summary.by_status {
        println!("  {:<18} {}", format!("{}:", status.label), status.count);
    }
    println!();
}

fn print_chart(dataset: &ChartDataset) {
    let mut header = format!("{} ({})", title_case(dataset.kind.as_str()), dataset.view.as_str());
    if dataset.filters_active {
        header.push_str(" [filtered]");
    }
    if dataset.cardinality_mismatch {
        header.push_str(&format!(
            " [expected {} buckets, got {}]",
            dataset.expected_len,
            dataset.buckets.len()
        ));
    }
    println!("{header}");

    let width = dataset
        .buckets
        .iter()
        .map(|b| b.label.chars().count())
        .max()
        .unwrap_or(0);
    for bucket in &dataset.buckets {
        let mark = if bucket.synthetic { "*" } else { "" };
        println!(
            "  {:<width$}  {:>5}{:<1}  {:>5}%",
            bucket.label, bucket.count, mark, bucket.percentage
        );
    }
    println!("  {:<width$}  {:>5}", "Total", dataset.total);
    println!();
}

fn title_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
