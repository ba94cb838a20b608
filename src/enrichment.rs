use std::{fs, path::Path};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;
use crate::error::Result;
use crate::records::{Transaction, FIELD_COUNT};

pub const ENRICHED_HEADER: [&str; 12] = [
    "TransactionID",
    "Date",
    "ProductID",
    "ProductName",
    "Quantity",
    "UnitPrice",
    "CustomerID",
    "Region",
    "API_Category",
    "API_Brand",
    "API_Rating",
    "API_Match",
];

/// Written in place of an absent API field.
pub const MISSING: &str = "None";

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedTransaction {
    pub transaction: Transaction,
    pub api_category: Option<String>,
    pub api_brand: Option<String>,
    pub api_rating: Option<f64>,
    pub api_match: bool,
}

impl EnrichedTransaction {
    fn unmatched(transaction: Transaction) -> Self {
        Self {
            transaction,
            api_category: None,
            api_brand: None,
            api_rating: None,
            api_match: false,
        }
    }
}

/// Catalog id embedded in a product id: everything after the first
/// character, e.g. `P101` -> `101`.
pub fn catalog_id(product_id: &str) -> Option<i64> {
    let mut chars = product_id.chars();
    chars.next()?;
    chars.as_str().parse().ok()
}

pub fn enrich_sales_data(transactions: &[Transaction], catalog: &Catalog) -> Vec<EnrichedTransaction> {
    transactions
        .iter()
        .cloned()
        .map(|t| {
            match catalog_id(&t.product_id).and_then(|id| catalog.get(&id)) {
                Some(entry) => {
                    debug!(product_id = %t.product_id, title = ?entry.title, "matched catalog entry");
                    EnrichedTransaction {
                        api_category: entry.category.clone(),
                        api_brand: entry.brand.clone(),
                        api_rating: entry.rating,
                        api_match: true,
                        transaction: t,
                    }
                }
                None => {
                    debug!(product_id = %t.product_id, "no catalog match");
                    EnrichedTransaction::unmatched(t)
                }
            }
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnrichmentSummary {
    pub enriched: usize,
    pub total: usize,
    pub success_rate: f64,
    pub unmatched_products: Vec<String>,
}

pub fn summarize(enriched: &[EnrichedTransaction]) -> EnrichmentSummary {
    let matched = enriched.iter().filter(|e| e.api_match).count();
    let success_rate = if enriched.is_empty() {
        0.0
    } else {
        matched as f64 / enriched.len() as f64 * 100.0
    };

    EnrichmentSummary {
        enriched: matched,
        total: enriched.len(),
        success_rate,
        unmatched_products: enriched
            .iter()
            .filter(|e| !e.api_match)
            .map(|e| e.transaction.product_name.clone())
            .collect(),
    }
}

/// Catalog text may contain the field delimiter; it is replaced so every
/// row keeps twelve fields.
fn optional<T: ToString>(value: &Option<T>) -> String {
    value
        .as_ref()
        .map_or_else(|| MISSING.to_string(), |v| v.to_string().replace('|', "/"))
}

fn parse_optional<T: std::str::FromStr>(field: &str) -> Option<T> {
    match field {
        MISSING => None,
        other => other.parse().ok(),
    }
}

/// Writes enriched rows as a pipe-delimited file, creating the parent
/// directory if needed.
pub fn save_enriched_data<P: AsRef<Path>>(path: P, enriched: &[EnrichedTransaction]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b'|')
        .quote_style(csv::QuoteStyle::Never)
        .from_path(path)?;

    wtr.write_record(ENRICHED_HEADER)?;
    for e in enriched {
        let t = &e.transaction;
        wtr.write_record([
            t.transaction_id.clone(),
            t.date.clone(),
            t.product_id.clone(),
            t.product_name.clone(),
            t.quantity.to_string(),
            t.unit_price.to_string(),
            t.customer_id.clone(),
            t.region.clone(),
            optional(&e.api_category),
            optional(&e.api_brand),
            optional(&e.api_rating),
            if e.api_match { "True" } else { "False" }.to_string(),
        ])?;
    }

    wtr.flush()?;
    info!(path = %path.display(), rows = enriched.len(), "saved enriched data");
    Ok(())
}

/// Reads back a file produced by [`save_enriched_data`]. Rows that do not
/// have the enriched shape are skipped.
pub fn read_enriched_data<P: AsRef<Path>>(path: P) -> Result<Vec<EnrichedTransaction>> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(b'|')
        .quoting(false)
        .flexible(true)
        .from_path(path)?;

    let mut enriched = Vec::new();
    for record in rdr.records() {
        let record = record?;
        if record.len() != ENRICHED_HEADER.len() {
            warn!(fields = record.len(), "skipping malformed enriched row");
            continue;
        }

        let base: csv::StringRecord = record.iter().take(FIELD_COUNT).collect();
        let transaction: Transaction = match base.deserialize(None) {
            Ok(t) => t,
            Err(e) => {
                warn!("skipping malformed enriched row: {}", e);
                continue;
            }
        };

        enriched.push(EnrichedTransaction {
            transaction,
            api_category: parse_optional(&record[8]),
            api_brand: parse_optional(&record[9]),
            api_rating: parse_optional(&record[10]),
            api_match: &record[11] == "True",
        });
    }

    Ok(enriched)
}
