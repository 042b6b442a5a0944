//! Supplier datasets: a JSON document with audit metadata, or a flat CSV.

mod csv_import;

pub use csv_import::read_suppliers_csv;

use crate::scoring::{BandRepository, SupplierRecord};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::path::Path;

/// Audit trail for a dataset. Surfaced to callers, never used in scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetMetadata {
    pub version: String,
    pub bands_version: String,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    pub metadata: DatasetMetadata,
    pub suppliers: Vec<SupplierRecord>,
}

#[derive(Debug, thiserror::Error)]
pub enum DatasetError {
    #[error("failed to read dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("dataset is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid supplier CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("supplier CSV row {row}: {message}")]
    InvalidRow { row: u64, message: String },
    #[error("supplier CSV header: {0}")]
    InvalidHeader(String),
    #[error("duplicate supplier id '{0}'")]
    DuplicateSupplier(String),
}

impl Dataset {
    pub fn new(
        metadata: DatasetMetadata,
        suppliers: Vec<SupplierRecord>,
    ) -> Result<Self, DatasetError> {
        let dataset = Self {
            metadata,
            suppliers,
        };
        dataset.ensure_unique_ids()?;
        Ok(dataset)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let dataset: Dataset = serde_json::from_reader(reader)?;
        dataset.ensure_unique_ids()?;
        tracing::info!(
            version = %dataset.metadata.version,
            suppliers = dataset.suppliers.len(),
            "loaded supplier dataset"
        );
        Ok(dataset)
    }

    /// Imports suppliers from CSV. The file carries no metadata, so the
    /// caller supplies it.
    pub fn from_csv_path<P: AsRef<Path>>(
        path: P,
        metadata: DatasetMetadata,
    ) -> Result<Self, DatasetError> {
        let file = std::fs::File::open(path)?;
        Self::from_csv_reader(file, metadata)
    }

    pub fn from_csv_reader<R: Read>(
        reader: R,
        metadata: DatasetMetadata,
    ) -> Result<Self, DatasetError> {
        let suppliers = read_suppliers_csv(reader)?;
        tracing::info!(suppliers = suppliers.len(), "imported suppliers from csv");
        Self::new(metadata, suppliers)
    }

    /// Loads JSON, or CSV when the path ends in `.csv`.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let is_csv = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            return Self::from_path(path);
        }

        let version = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or("csv-import")
            .to_string();
        Self::from_csv_path(
            path,
            DatasetMetadata {
                version,
                bands_version: "unspecified".to_string(),
                generated_at: Utc::now(),
            },
        )
    }

    /// Whether the dataset was generated against the loaded bands. A mismatch
    /// is logged; it never blocks scoring.
    pub fn matches_bands(&self, bands: &BandRepository) -> bool {
        let matches = bands
            .version()
            .map_or(true, |version| version == self.metadata.bands_version);
        if !matches {
            tracing::warn!(
                dataset_bands = %self.metadata.bands_version,
                loaded_bands = bands.version().unwrap_or_default(),
                "dataset was generated against a different bands version"
            );
        }
        matches
    }

    fn ensure_unique_ids(&self) -> Result<(), DatasetError> {
        let mut seen = BTreeSet::new();
        for supplier in &self.suppliers {
            if !seen.insert(supplier.id.as_str()) {
                return Err(DatasetError::DuplicateSupplier(supplier.id.clone()));
            }
        }
        Ok(())
    }
}
