use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::error;

mod analytics;
mod catalog;
mod enrichment;
mod error;
mod logging;
mod prompt;
mod records;
mod report;
mod validation;

use analytics::{SalesAnalysis, DEFAULT_LOW_THRESHOLD, DEFAULT_TOP_N};
use catalog::{create_product_mapping, fetch_all_products, HttpCatalog, DEFAULT_CATALOG_URL};
use enrichment::{enrich_sales_data, read_enriched_data, save_enriched_data, summarize};
use records::{parse_transactions, read_sales_data};
use report::{format_currency, generate_sales_report};
use validation::{filter_options, validate_and_filter, FilterCriteria};

#[derive(Parser)]
#[command(name = "sales-analytics")]
#[command(about = "Cleans a sales log, enriches it from the product catalog and writes a report")]
#[command(version)]
struct Cli {
    /// Pipe-delimited sales file
    #[arg(long, default_value = "data/sales_data.txt")]
    input: PathBuf,

    /// Where the enriched sales file is written
    #[arg(long, default_value = "data/enriched_sales_data.txt")]
    enriched_output: PathBuf,

    /// Where the text report is written
    #[arg(long, default_value = "output/sales_report.txt")]
    report_output: PathBuf,

    #[arg(long, default_value = DEFAULT_CATALOG_URL)]
    catalog_url: String,

    /// Keep only this region (skips the interactive prompt)
    #[arg(long)]
    region: Option<String>,

    /// Minimum line amount, inclusive (skips the interactive prompt)
    #[arg(long)]
    min_amount: Option<f64>,

    /// Maximum line amount, inclusive (skips the interactive prompt)
    #[arg(long)]
    max_amount: Option<f64>,

    /// Never ask for filters
    #[arg(long)]
    no_prompt: bool,

    #[arg(long, default_value_t = DEFAULT_TOP_N)]
    top_n: usize,

    /// Products selling fewer units than this are reported as low performers
    #[arg(long, default_value_t = DEFAULT_LOW_THRESHOLD)]
    low_threshold: i64,
}

impl Cli {
    fn criteria(&self) -> FilterCriteria {
        FilterCriteria {
            region: self.region.clone(),
            min_amount: self.min_amount,
            max_amount: self.max_amount,
        }
    }
}

fn main() {
    logging::init_logging();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        error!("run aborted: {:#}", e);
        println!("Error: {e:#}");
    }
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    println!("SALES ANALYTICS SYSTEM\n");

    println!("[1/10] Reading sales data ...");
    let raw_lines = read_sales_data(&cli.input).unwrap_or_else(|e| {
        println!("Error: {e}");
        Vec::new()
    });
    println!("✓ Successfully read {} transactions\n", raw_lines.len());

    println!("[2/10] Parsing and cleaning data ...");
    let transactions = parse_transactions(&raw_lines);
    println!("✓ Parsed {} records\n", transactions.len());

    println!("[3/10] Filter Options Available:");
    let options = filter_options(&transactions);
    println!("Regions: {}", options.regions.join(", "));
    match options.amount_range {
        Some((lo, hi)) => println!("Amount Range: {} - {}\n", format_currency(lo), format_currency(hi)),
        None => println!("Amount Range: N/A\n"),
    }

    let criteria = if !cli.criteria().is_empty() || cli.no_prompt {
        cli.criteria()
    } else {
        let stdin = std::io::stdin();
        prompt::prompt_filter(&mut stdin.lock(), &mut std::io::stdout())
            .context("failed to read filter choices")?
    };

    println!("[4/10] Validating transactions ...");
    let (transactions, invalid_count, summary) = validate_and_filter(transactions, &criteria);
    println!("✓ Valid: {} | Invalid: {}", transactions.len(), invalid_count);
    if !criteria.is_empty() {
        println!(
            "  Input: {} | Invalid: {} | Removed by region: {} | Removed by amount: {} | Kept: {}",
            summary.total_input,
            summary.invalid,
            summary.filtered_by_region,
            summary.filtered_by_amount,
            summary.final_count
        );
    }
    println!();

    println!("[5/10] Analyzing sales data ...");
    let analysis = SalesAnalysis::compute(&transactions, cli.top_n, cli.low_threshold);
    println!("✓ Total Revenue: {}\n", format_currency(analysis.total_revenue));

    println!("[6/10] Fetching product data from API ...");
    let products = fetch_all_products(&HttpCatalog::new(cli.catalog_url.as_str()));
    println!("✓ Fetched {} products\n", products.len());

    println!("[7/10] Enriching sales data ...");
    let catalog = create_product_mapping(&products);
    let enriched = enrich_sales_data(&transactions, &catalog);
    let enrichment = summarize(&enriched);
    println!("✓ Enriched {}/{} transactions\n", enrichment.enriched, enrichment.total);

    println!("[8/10] Saving enriched data ...");
    match save_enriched_data(&cli.enriched_output, &enriched)
        .and_then(|()| read_enriched_data(&cli.enriched_output))
    {
        Ok(saved) => println!(
            "✓ Saved {} rows to: {}\n",
            saved.len(),
            cli.enriched_output.display()
        ),
        Err(e) => println!("Error saving enriched data: {e}\n"),
    }

    println!("[9/10] Generating report ...");
    match generate_sales_report(
        &cli.report_output,
        &transactions,
        &enriched,
        &analysis,
        cli.top_n,
        chrono::Local::now().naive_local(),
    ) {
        Ok(()) => println!("✓ Report saved to: {}\n", cli.report_output.display()),
        Err(e) => println!("Error generating report: {e}\n"),
    }

    println!("[10/10] Process Complete!");
    Ok(())
}
