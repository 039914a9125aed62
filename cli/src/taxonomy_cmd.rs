//! `hrdash taxonomy` - print the active taxonomy

use crate::{GlobalArgs, exit_codes, load_engine};
use clap::Parser;
use hrdash_insights::Taxonomy;

#[derive(Debug, Parser)]
pub struct TaxonomyArgs {
    /// Output as JSON (same shape as a taxonomy file)
    #[arg(long)]
    pub json: bool,
}

pub fn run_taxonomy(global: &GlobalArgs, args: TaxonomyArgs) -> anyhow::Result<i32> {
    let engine = load_engine(global)?;
    let taxonomy = engine.taxonomy();

    if args.json {
        println!("{}", serde_json::to_string_pretty(taxonomy)?);
    } else {
        print!("{}", render_tree(taxonomy));
    }
    Ok(exit_codes::SUCCESS)
}

fn render_tree(taxonomy: &Taxonomy) -> String {
    let mut out = String::new();

    out.push_str("Categories\n");
    for category in &taxonomy.categories {
        out.push_str(&format!("  {} ({})\n", category.name, category.id));
        for sub in &category.sub_categories {
            out.push_str(&format!("    {} ({})\n", sub.name, sub.id));
            for indicator in &sub.indicators {
                out.push_str(&format!("      - {} ({})\n", indicator.name, indicator.id));
            }
        }
    }

    out.push_str("\nProvinces\n");
    for province in &taxonomy.provinces {
        let districts: Vec<&str> = province.districts.iter().map(|d| d.name.as_str()).collect();
        out.push_str(&format!("  {} ({})\n", province.name, province.id));
        if !districts.is_empty() {
            out.push_str(&format!("    {}\n", districts.join(", ")));
        }
    }

    out.push_str("\nStatuses\n");
    for status in &taxonomy.statuses {
        out.push_str(&format!("  {} ({}) {}\n", status.label, status.id, status.color));
    }

    out
}
