//! Product catalog: a strongly-typed CSV loader and a memoized store.
//!
//! The backing file must have exactly the columns `name`, `category` and
//! `price` (in any order). Anything else is a [`DataLoadError`].
use std::collections::HashSet;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Columns every catalog source must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["name", "category", "price"];

/// Errors raised while reading the catalog source.
#[derive(Error, Debug)]
pub enum DataLoadError {
    #[error("catalog source not found: {0}")]
    NotFound(PathBuf),

    #[error("failed to read catalog: {0}")]
    Csv(#[from] csv::Error),

    #[error("catalog is missing required column {0:?}")]
    MissingColumn(&'static str),

    #[error("catalog has unexpected column {0:?}")]
    UnexpectedColumn(String),

    #[error("catalog repeats column {0:?}")]
    DuplicateColumn(String),

    #[error("invalid product on line {line}: {reason}")]
    InvalidRow { line: u64, reason: String },
}

/// A single catalog entry. Identity is its position in the [`Catalog`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub category: String,
    pub price: f64,
}

/// Ordered, immutable product table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    products: Vec<Product>,
}

impl Catalog {
    /// Build a catalog from already-validated products.
    #[must_use]
    pub fn new(products: Vec<Product>) -> Self {
        Self { products }
    }

    /// Parse a CSV catalog from a file.
    pub fn from_path(path: &Path) -> Result<Self, DataLoadError> {
        if !path.exists() {
            return Err(DataLoadError::NotFound(path.to_path_buf()));
        }
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_path(path)?;
        Self::from_csv(reader)
    }

    /// Parse a CSV catalog from any reader.
    pub fn from_reader<R: Read>(rdr: R) -> Result<Self, DataLoadError> {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(rdr);
        Self::from_csv(reader)
    }

    fn from_csv<R: Read>(mut reader: csv::Reader<R>) -> Result<Self, DataLoadError> {
        let headers = reader.headers()?.clone();
        validate_headers(&headers)?;

        let mut products = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let product: Product =
                record
                    .deserialize(Some(&headers))
                    .map_err(|e| DataLoadError::InvalidRow {
                        line,
                        reason: e.to_string(),
                    })?;
            validate_product(&product, line)?;
            products.push(product);
        }

        debug!("Parsed {} products", products.len());
        Ok(Self { products })
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Distinct categories in first-appearance order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.products
            .iter()
            .map(|p| p.category.as_str())
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// All products whose category equals `category` exactly, in catalog order.
    #[must_use]
    pub fn filter_by_category(&self, category: &str) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| p.category == category)
            .collect()
    }
}

/// Exactly the required columns, each once, in any order.
fn validate_headers(headers: &csv::StringRecord) -> Result<(), DataLoadError> {
    let mut seen = HashSet::new();
    for header in headers {
        if !REQUIRED_COLUMNS.contains(&header) {
            return Err(DataLoadError::UnexpectedColumn(header.to_string()));
        }
        if !seen.insert(header) {
            return Err(DataLoadError::DuplicateColumn(header.to_string()));
        }
    }
    for required in REQUIRED_COLUMNS {
        if !seen.contains(required) {
            return Err(DataLoadError::MissingColumn(required));
        }
    }
    Ok(())
}

fn validate_product(product: &Product, line: u64) -> Result<(), DataLoadError> {
    let reason = if product.name.is_empty() {
        "empty name"
    } else if product.category.is_empty() {
        "empty category"
    } else if !product.price.is_finite() || product.price < 0.0 {
        "price must be a non-negative number"
    } else {
        return Ok(());
    };
    Err(DataLoadError::InvalidRow {
        line,
        reason: reason.to_string(),
    })
}

/// Loads the catalog on first access and serves the cached copy afterwards.
pub struct CatalogStore {
    path: PathBuf,
    cache: OnceLock<Catalog>,
}

impl CatalogStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            cache: OnceLock::new(),
        }
    }

    /// Store pre-populated with an in-memory catalog; never touches disk.
    #[must_use]
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            path: PathBuf::new(),
            cache: OnceLock::from(catalog),
        }
    }

    /// Return the catalog, reading the backing file only on the first call.
    pub fn load(&self) -> Result<&Catalog, DataLoadError> {
        if let Some(catalog) = self.cache.get() {
            return Ok(catalog);
        }

        info!("Loading catalog from {}", self.path.display());
        let catalog = Catalog::from_path(&self.path)?;
        info!("Catalog loaded ({} products)", catalog.len());

        // A concurrent first caller may have won; both parsed the same file.
        Ok(self.cache.get_or_init(|| catalog))
    }

    pub fn categories(&self) -> Result<Vec<String>, DataLoadError> {
        Ok(self
            .load()?
            .categories()
            .into_iter()
            .map(str::to_string)
            .collect())
    }

    pub fn filter_by_category(&self, category: &str) -> Result<Vec<Product>, DataLoadError> {
        Ok(self
            .load()?
            .filter_by_category(category)
            .into_iter()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SAMPLE: &str = "name,category,price\n\
        Running Shoes,Footwear,50\n\
        Lightweight Trainers,Footwear,60\n\
        Winter Coat,Apparel,120\n";

    #[test]
    fn test_parse_sample() {
        let catalog = Catalog::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.products()[2].name, "Winter Coat");
        assert_eq!(catalog.products()[2].price, 120.0);
    }

    #[test]
    fn test_columns_in_any_order() {
        let csv = "price,name,category\n9.5,Socks,Footwear\n";
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.products()[0].name, "Socks");
        assert_eq!(catalog.products()[0].price, 9.5);
    }

    #[test]
    fn test_missing_column() {
        let csv = "name,category\nSocks,Footwear\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataLoadError::MissingColumn("price")));
    }

    #[test]
    fn test_unexpected_column() {
        let csv = "name,category,price,rating\nSocks,Footwear,5,4.2\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataLoadError::UnexpectedColumn(ref c) if c == "rating"));
    }

    #[test]
    fn test_negative_price_rejected() {
        let csv = "name,category,price\nSocks,Footwear,-1\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidRow { line: 2, .. }));
    }

    #[test]
    fn test_non_numeric_price_rejected() {
        let csv = "name,category,price\nSocks,Footwear,cheap\n";
        assert!(matches!(
            Catalog::from_reader(csv.as_bytes()),
            Err(DataLoadError::InvalidRow { .. })
        ));
    }

    #[test]
    fn test_duplicate_column_header_only() {
        let csv = "name,category,price,name\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateColumn(ref c) if c == "name"));
    }

    #[test]
    fn test_duplicate_column_with_rows() {
        let csv = "name,category,price,name\nA,B,1,C\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataLoadError::DuplicateColumn(ref c) if c == "name"));
    }

    #[test]
    fn test_empty_name_rejected() {
        // trimmed to an empty name
        let csv = "name,category,price\n ,Footwear,5\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidRow { ref reason, .. } if reason == "empty name"));
    }

    #[test]
    fn test_non_finite_price_rejected() {
        for price in ["NaN", "inf"] {
            let csv = format!("name,category,price\nSocks,Footwear,{price}\n");
            let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
            assert!(
                matches!(err, DataLoadError::InvalidRow { line: 2, .. }),
                "{price}: {err:?}"
            );
        }
    }

    #[test]
    fn test_invalid_row_line_skips_blank_lines() {
        let csv = "name,category,price\n\nSocks,Footwear,-1\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidRow { line: 3, .. }), "{err:?}");
    }

    #[test]
    fn test_invalid_row_line_after_multiline_field() {
        let csv = "name,category,price\n\"Two\nLines\",Footwear,5\nSocks,Footwear,-1\n";
        let err = Catalog::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DataLoadError::InvalidRow { line: 4, .. }), "{err:?}");
    }

    #[test]
    fn test_empty_category_rejected() {
        let csv = "name,category,price\nSocks,,5\n";
        assert!(Catalog::from_reader(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_categories_first_appearance_order() {
        let csv = "name,category,price\nA,Toys,1\nB,Books,2\nC,Toys,3\nD,Garden,4\n";
        let catalog = Catalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.categories(), vec!["Toys", "Books", "Garden"]);
    }

    #[test]
    fn test_filter_is_exact_and_ordered() {
        let catalog = Catalog::from_reader(SAMPLE.as_bytes()).unwrap();
        let footwear = catalog.filter_by_category("Footwear");
        assert_eq!(footwear.len(), 2);
        assert_eq!(footwear[0].name, "Running Shoes");
        assert_eq!(footwear[1].name, "Lightweight Trainers");

        assert!(catalog.filter_by_category("footwear").is_empty());
        assert!(catalog.filter_by_category("Garden").is_empty());
    }

    #[test]
    fn test_store_missing_file() {
        let store = CatalogStore::new("/nonexistent/products.csv");
        assert!(matches!(store.load(), Err(DataLoadError::NotFound(_))));
    }

    #[test]
    fn test_store_memoizes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("products.csv");
        fs::write(&path, SAMPLE).unwrap();

        let store = CatalogStore::new(&path);
        let first = store.load().unwrap() as *const Catalog;

        // Later calls must not re-read the source.
        fs::remove_file(&path).unwrap();
        let second = store.load().unwrap() as *const Catalog;
        assert_eq!(first, second);
        assert_eq!(store.categories().unwrap(), vec!["Footwear", "Apparel"]);
        assert_eq!(store.filter_by_category("Apparel").unwrap()[0].name, "Winter Coat");
    }
}
