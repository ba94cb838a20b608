use chrono::NaiveDateTime;
use std::{
    fs,
    io::{self, Write},
    path::Path,
};
use tracing::info;

use crate::analytics::SalesAnalysis;
use crate::enrichment::{summarize, EnrichedTransaction};
use crate::error::Result;
use crate::records::Transaction;

pub const CURRENCY_SYMBOL: char = '₹';

/// `1234567.891` -> `1,234,567.89`
pub fn format_thousands(value: f64) -> String {
    let fixed = format!("{:.2}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{frac_part}")
}

pub fn format_currency(value: f64) -> String {
    format!("{CURRENCY_SYMBOL}{}", format_thousands(value))
}

fn section<W: Write>(w: &mut W, title: &str, columns: &str) -> io::Result<()> {
    writeln!(w, "## {title}")?;
    writeln!(w)?;
    writeln!(w, "{columns}")?;
    writeln!(w, "{}", "-".repeat(columns.chars().count()))
}

/// Renders the full report. Every ratio is guarded so an empty record set
/// still produces all sections.
pub fn write_report<W: Write>(
    w: &mut W,
    transactions: &[Transaction],
    enriched: &[EnrichedTransaction],
    analysis: &SalesAnalysis,
    top_n: usize,
    generated_at: NaiveDateTime,
) -> io::Result<()> {
    writeln!(w, "SALES ANALYTICS REPORT")?;
    writeln!(w, "Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(w, "Records Processed: {}", transactions.len())?;
    writeln!(w)?;

    let count = transactions.len();
    let avg_order_value = if count > 0 {
        analysis.total_revenue / count as f64
    } else {
        0.0
    };
    let date_range = match (
        transactions.iter().map(|t| t.date.as_str()).min(),
        transactions.iter().map(|t| t.date.as_str()).max(),
    ) {
        (Some(first), Some(last)) => format!("{first} to {last}"),
        _ => "N/A".to_string(),
    };

    writeln!(w, "# OVERALL SUMMARY")?;
    writeln!(w)?;
    writeln!(w, "Total Revenue: {}", format_currency(analysis.total_revenue))?;
    writeln!(w, "Total Transactions: {count}")?;
    writeln!(w, "Average Order Value: {}", format_currency(avg_order_value))?;
    writeln!(w, "Date Range: {date_range}")?;
    writeln!(w)?;

    section(w, "REGION-WISE PERFORMANCE", "Region | Sales | % of Total | Transactions")?;
    for r in &analysis.regions {
        writeln!(
            w,
            "{} | {} | {:.2}% | {}",
            r.region,
            format_currency(r.total_sales),
            r.percentage,
            r.transaction_count
        )?;
    }
    writeln!(w)?;

    section(w, &format!("TOP {top_n} PRODUCTS"), "Rank | Product | Quantity | Revenue")?;
    for (rank, p) in analysis.top_products.iter().enumerate() {
        writeln!(
            w,
            "{} | {} | {} | {}",
            rank + 1,
            p.product,
            p.total_quantity,
            format_currency(p.total_revenue)
        )?;
    }
    writeln!(w)?;

    section(
        w,
        &format!("TOP {top_n} CUSTOMERS"),
        "Rank | CustomerID | Total Spent | Orders | Avg Order | Products",
    )?;
    for (rank, c) in analysis.customers.iter().take(top_n).enumerate() {
        writeln!(
            w,
            "{} | {} | {} | {} | {} | {}",
            rank + 1,
            c.customer_id,
            format_currency(c.total_spent),
            c.purchase_count,
            format_currency(c.avg_order_value),
            c.products_bought.join(", ")
        )?;
    }
    writeln!(w)?;

    section(w, "DAILY SALES TREND", "Date | Revenue | Transactions | Unique Customers")?;
    for d in &analysis.daily_trend {
        writeln!(
            w,
            "{} | {} | {} | {}",
            d.date,
            format_currency(d.revenue),
            d.transaction_count,
            d.unique_customers
        )?;
    }
    writeln!(w)?;

    let peak = &analysis.peak_day;
    writeln!(w, "## PRODUCT PERFORMANCE ANALYSIS")?;
    writeln!(w)?;
    writeln!(
        w,
        "Best Selling Day: {} | Revenue: {} | Transactions: {}",
        peak.date.as_deref().unwrap_or("N/A"),
        format_currency(peak.revenue),
        peak.transaction_count
    )?;
    writeln!(w, "Low Performing Products:")?;
    for p in &analysis.low_performers {
        writeln!(
            w,
            "- {}: Qty={}, Revenue={}",
            p.product,
            p.total_quantity,
            format_currency(p.total_revenue)
        )?;
    }
    writeln!(w)?;

    let summary = summarize(enriched);
    writeln!(w, "## API ENRICHMENT SUMMARY")?;
    writeln!(w)?;
    writeln!(w, "Total Products Enriched: {}", summary.enriched)?;
    writeln!(w, "Success Rate: {:.2}%", summary.success_rate)?;
    writeln!(w, "Products Not Enriched:")?;
    for name in &summary.unmatched_products {
        writeln!(w, "- {name}")?;
    }

    Ok(())
}

/// Renders the report in memory and writes it in one go, so a failed run
/// never leaves a partial report behind.
pub fn generate_sales_report<P: AsRef<Path>>(
    path: P,
    transactions: &[Transaction],
    enriched: &[EnrichedTransaction],
    analysis: &SalesAnalysis,
    top_n: usize,
    generated_at: NaiveDateTime,
) -> Result<()> {
    let path = path.as_ref();
    let mut buf = Vec::new();
    write_report(&mut buf, transactions, enriched, analysis, top_n, generated_at)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, buf)?;

    info!(path = %path.display(), "report saved");
    Ok(())
}
