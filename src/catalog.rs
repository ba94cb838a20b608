use serde::Deserialize;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::error::Result;

pub const DEFAULT_CATALOG_URL: &str = "https://dummyjson.com/products?limit=100";

/// One product as served by the catalog API. Only `id` is needed to build
/// the lookup table; everything else may be missing.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct CatalogProduct {
    pub id: Option<i64>,
    pub title: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub rating: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProductsPage {
    #[serde(default)]
    products: Vec<CatalogProduct>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub title: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub rating: Option<f64>,
}

pub type Catalog = HashMap<i64, CatalogEntry>;

pub trait CatalogSource {
    fn fetch_products(&self) -> Result<Vec<CatalogProduct>>;
}

pub struct HttpCatalog {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpCatalog {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            url: url.into(),
        }
    }
}

impl Default for HttpCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_CATALOG_URL)
    }
}

impl CatalogSource for HttpCatalog {
    fn fetch_products(&self) -> Result<Vec<CatalogProduct>> {
        let body = self
            .client
            .get(&self.url)
            .send()?
            .error_for_status()?
            .text()?;
        parse_products(&body)
    }
}

pub fn parse_products(body: &str) -> Result<Vec<CatalogProduct>> {
    let page: ProductsPage = serde_json::from_str(body)?;
    Ok(page.products)
}

/// Fetches the catalog once. Any failure yields an empty product list so the
/// run can continue with every record unmatched.
pub fn fetch_all_products(source: &dyn CatalogSource) -> Vec<CatalogProduct> {
    match source.fetch_products() {
        Ok(products) => {
            info!(count = products.len(), "fetched catalog products");
            products
        }
        Err(e) => {
            warn!("Error fetching products: {}", e);
            Vec::new()
        }
    }
}

pub fn create_product_mapping(products: &[CatalogProduct]) -> Catalog {
    products
        .iter()
        .filter_map(|p| {
            let id = p.id?;
            Some((
                id,
                CatalogEntry {
                    title: p.title.clone(),
                    category: p.category.clone(),
                    brand: p.brand.clone(),
                    rating: p.rating,
                },
            ))
        })
        .collect()
}
