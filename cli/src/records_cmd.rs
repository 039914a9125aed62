//! Record management commands: import, export, list, show, delete, check

use crate::{Context, GlobalArgs, UsageError, exit_codes};
use anyhow::Context as _;
use chrono::{NaiveDate, Utc};
use clap::Parser;
use hrdash_insights::{RecordQuery, Taxonomy, ViolationRecord};
use hrdash_store::StoreError;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Debug, Parser)]
pub struct ImportArgs {
    /// JSON file holding an array of records
    pub file: PathBuf,
}

#[derive(Debug, Parser)]
pub struct ExportArgs {
    /// Destination file (default: stdout)
    pub file: Option<PathBuf>,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Only records in this province (id or name)
    #[arg(long)]
    pub province: Option<String>,

    /// Event date lower bound (inclusive)
    #[arg(long, value_name = "DATE")]
    pub from: Option<NaiveDate>,

    /// Event date upper bound (inclusive)
    #[arg(long, value_name = "DATE")]
    pub to: Option<NaiveDate>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct KeyArgs {
    /// Record id or entry number (e.g. VR-2024-00012)
    pub key: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Parser)]
pub struct CheckArgs {
    /// Output as JSON for automation
    #[arg(long)]
    pub json: bool,
}

pub fn run_import(global: &GlobalArgs, args: ImportArgs) -> anyhow::Result<i32> {
    let ctx = Context::load(global)?;
    let file = std::fs::File::open(&args.file)
        .with_context(|| format!("opening {}", args.file.display()))?;

    let created = ctx
        .store
        .import_json(BufReader::new(file), ctx.engine.taxonomy(), Utc::now())
        .with_context(|| format!("importing {}", args.file.display()))?;

    println!("Imported {} records", created.len());
    Ok(exit_codes::SUCCESS)
}

pub fn run_export(global: &GlobalArgs, args: ExportArgs) -> anyhow::Result<i32> {
    let ctx = Context::load(global)?;

    match &args.file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("creating {}", path.display()))?;
            let count = ctx
                .store
                .export_json(std::io::BufWriter::new(file))
                .with_context(|| format!("writing {}", path.display()))?;
            println!("Exported {count} records to {}", path.display());
        }
        None => {
            ctx.store.export_json(std::io::stdout().lock())?;
            println!();
        }
    }
    Ok(exit_codes::SUCCESS)
}

pub fn run_list(global: &GlobalArgs, args: ListArgs) -> anyhow::Result<i32> {
    let ctx = Context::load(global)?;
    let taxonomy = ctx.engine.taxonomy();

    let province_id = match args.province.as_deref() {
        Some(p) => Some(
            taxonomy
                .resolve_province(p)
                .map(str::to_string)
                .ok_or_else(|| UsageError(format!("--province: unknown value '{p}'")))?,
        ),
        None => None,
    };
    let query = RecordQuery {
        province_id,
        start: args.from,
        end: args.to,
    };
    let records = ctx.store.query(&query)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(exit_codes::SUCCESS);
    }

    if records.is_empty() {
        println!("No records");
        return Ok(exit_codes::SUCCESS);
    }
    for record in &records {
        println!(
            "{}  {}  {:<20}  {:<24}  {:<20}  {}",
            record.entry_number,
            record.event_date,
            province_name(taxonomy, record),
            category_name(taxonomy, record),
            status_label(taxonomy, record),
            record.title
        );
    }
    println!("\n{} records", records.len());
    Ok(exit_codes::SUCCESS)
}

pub fn run_show(global: &GlobalArgs, args: KeyArgs) -> anyhow::Result<i32> {
    let ctx = Context::load(global)?;
    let record = find(&ctx, &args.key)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&record)?);
        return Ok(exit_codes::SUCCESS);
    }

    let taxonomy = ctx.engine.taxonomy();
    println!("{} {}", record.entry_number, record.title);
    println!("  Id:        {}", record.id);
    match record.event_time {
        Some(time) => println!("  Event:     {} {}", record.event_date, time),
        None => println!("  Event:     {}", record.event_date),
    }
    println!("  Province:  {}", province_name(taxonomy, &record));
    if let Some(district) = &record.district_id {
        let name = taxonomy
            .district(&record.province_id, district)
            .map(|d| d.name.as_str())
            .unwrap_or(district);
        println!("  District:  {name}");
    }
    println!("  Category:  {}", category_name(taxonomy, &record));
    if let Some(sub) = &record.sub_category_id {
        let name = taxonomy
            .sub_category(&record.category_id, sub)
            .map(|s| s.name.as_str())
            .unwrap_or(sub);
        println!("  Sub-cat:   {name}");
        if let Some(indicator) = &record.indicator_id {
            let name = taxonomy
                .indicator(&record.category_id, sub, indicator)
                .map(|i| i.name.as_str())
                .unwrap_or(indicator);
            println!("  Indicator: {name}");
        }
    }
    println!("  Status:    {}", status_label(taxonomy, &record));
    println!("  Created:   {}", record.created_at.to_rfc3339());
    println!("  Updated:   {}", record.updated_at.to_rfc3339());
    if !record.description.is_empty() {
        println!("\n{}", record.description);
    }
    Ok(exit_codes::SUCCESS)
}

pub fn run_delete(global: &GlobalArgs, args: KeyArgs) -> anyhow::Result<i32> {
    let ctx = Context::load(global)?;
    let record = find(&ctx, &args.key)?;

    ctx.store.delete(&record.id)?;
    tracing::info!(id = %record.id, entry_number = %record.entry_number, "Record deleted");
    println!("Deleted {}", record.entry_number);
    Ok(exit_codes::SUCCESS)
}

pub fn run_check(global: &GlobalArgs, args: CheckArgs) -> anyhow::Result<i32> {
    let ctx = Context::load(global)?;
    let taxonomy = ctx.engine.taxonomy();
    let records = ctx.store.query(&RecordQuery::default())?;

    let findings: Vec<(&ViolationRecord, Vec<String>)> = records
        .iter()
        .map(|r| (r, record_issues(taxonomy, r)))
        .filter(|(_, issues)| !issues.is_empty())
        .collect();

    if args.json {
        let invalid: Vec<serde_json::Value> = findings
            .iter()
            .map(|(r, issues)| {
                serde_json::json!({
                    "id": r.id,
                    "entry_number": r.entry_number,
                    "issues": issues,
                })
            })
            .collect();
        let output = serde_json::json!({
            "checked": records.len(),
            "invalid": findings.len(),
            "records": invalid,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for (record, issues) in &findings {
            for issue in issues {
                println!("\x1b[31m[FAIL]\x1b[0m {}: {issue}", record.entry_number);
            }
        }
        if findings.is_empty() {
            println!("\x1b[32mAll {} records valid\x1b[0m", records.len());
        } else {
            println!(
                "\x1b[31m{}/{} records have unresolvable references\x1b[0m",
                findings.len(),
                records.len()
            );
        }
    }

    if findings.is_empty() {
        Ok(exit_codes::SUCCESS)
    } else {
        Ok(exit_codes::INVALID_INPUT)
    }
}

fn record_issues(taxonomy: &Taxonomy, record: &ViolationRecord) -> Vec<String> {
    let mut issues: Vec<String> = taxonomy
        .check_record(record)
        .iter()
        .map(ToString::to_string)
        .collect();
    if record.title.trim().is_empty() {
        issues.insert(0, "title is empty".to_string());
    }
    issues
}

fn find(ctx: &Context, key: &str) -> anyhow::Result<ViolationRecord> {
    ctx.store
        .find(key)?
        .ok_or_else(|| StoreError::NotFound { id: key.to_string() }.into())
}

fn province_name<'a>(taxonomy: &'a Taxonomy, record: &'a ViolationRecord) -> &'a str {
    taxonomy
        .province(&record.province_id)
        .map(|p| p.name.as_str())
        .unwrap_or(&record.province_id)
}

fn category_name<'a>(taxonomy: &'a Taxonomy, record: &'a ViolationRecord) -> &'a str {
    taxonomy
        .category(&record.category_id)
        .map(|c| c.name.as_str())
        .unwrap_or(&record.category_id)
}

fn status_label<'a>(taxonomy: &'a Taxonomy, record: &'a ViolationRecord) -> &'a str {
    taxonomy
        .status(&record.status_id)
        .map(|s| s.label.as_str())
        .unwrap_or(&record.status_id)
}
