//! Id-resolving facade over the comparator, the validation engine and the
//! stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::compare::{Comparator, ComparisonResult};
use crate::dataset::Dataset;
use crate::error::{DataproofError, Result};
use crate::store::{MemoryStore, Store};
use crate::validation::{derive_status, DatasetStatus, ValidationEngine, ValidationResult};

/// Results of one validation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationBatch {
    pub dataset_id: String,
    pub method: String,
    pub run_at: DateTime<Utc>,
    pub results: Vec<ValidationResult>,
}

/// A persisted comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredComparison {
    /// `comp_<unix millis>`, suffixed `_<n>` if that id is taken.
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub created_at: DateTime<Utc>,
    pub result: ComparisonResult,
}

/// A validation batch together with the status it yields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationOutcome {
    pub results: Vec<ValidationResult>,
    pub status: DatasetStatus,
}

/// Listing entry for a dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetSummary {
    pub id: String,
    pub name: String,
    /// `File`, `Database` or `Inline`.
    #[serde(rename = "type")]
    pub kind: String,
    pub column_count: usize,
    pub row_count: usize,
    /// Rough footprint, `rows × columns × 10` bytes.
    pub size: String,
    pub status: DatasetStatus,
}

/// Rough storage footprint of a table, e.g. `"600 B"`.
pub fn estimate_size(rows: usize, columns: usize) -> String {
    format!("{} B", rows * columns * 10)
}

/// Resolves ids through stores, runs comparisons and validations, and keeps
/// each dataset's validation history.
pub struct QualityService<D, H, C> {
    datasets: D,
    history: H,
    comparisons: C,
    engine: ValidationEngine,
    comparator: Comparator,
}

impl
    QualityService<
        MemoryStore<Dataset>,
        MemoryStore<Vec<ValidationBatch>>,
        MemoryStore<StoredComparison>,
    >
{
    /// Service backed entirely by in-process stores.
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), MemoryStore::new(), MemoryStore::new())
    }
}

impl<D, H, C> QualityService<D, H, C>
where
    D: Store<Dataset>,
    H: Store<Vec<ValidationBatch>>,
    C: Store<StoredComparison>,
{
    pub fn new(datasets: D, history: H, comparisons: C) -> Self {
        Self {
            datasets,
            history,
            comparisons,
            engine: ValidationEngine::new(),
            comparator: Comparator::new(),
        }
    }

    /// Use a configured validation engine.
    pub fn with_engine(mut self, engine: ValidationEngine) -> Self {
        self.engine = engine;
        self
    }

    /// Use a configured comparator.
    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.comparator = comparator;
        self
    }

    /// Register or replace a dataset.
    pub fn add_dataset(&mut self, dataset: &Dataset) -> Result<()> {
        debug!(dataset = %dataset.id, rows = dataset.row_count(), "storing dataset");
        self.datasets.save(&dataset.id, dataset)
    }

    /// Resolve a dataset by id.
    pub fn dataset(&self, id: &str) -> Result<Dataset> {
        self.datasets
            .load(id)?
            .ok_or_else(|| DataproofError::DatasetNotFound { id: id.to_string() })
    }

    /// Compare two stored datasets and persist the result under a new
    /// `comp_<millis>` id.
    pub fn compare(&mut self, source_id: &str, target_id: &str) -> Result<StoredComparison> {
        let source = self.dataset(source_id)?;
        let target = self.dataset(target_id)?;
        let result = self.comparator.compare(&source, &target)?;

        let created_at = Utc::now();
        let id = self.next_comparison_id(created_at)?;
        let stored = StoredComparison {
            id,
            source_id: source_id.to_string(),
            target_id: target_id.to_string(),
            created_at,
            result,
        };
        self.comparisons.save(&stored.id, &stored)?;

        info!(
            comparison = %stored.id,
            source = source_id,
            target = target_id,
            differences = stored.result.differences.len(),
            "comparison stored"
        );
        Ok(stored)
    }

    /// `comp_<millis>`, or `comp_<millis>_<n>` when that id is already taken.
    fn next_comparison_id(&self, created_at: DateTime<Utc>) -> Result<String> {
        let base = format!("comp_{}", created_at.timestamp_millis());
        let mut id = base.clone();
        let mut n = 2;
        while self.comparisons.load(&id)?.is_some() {
            id = format!("{}_{}", base, n);
            n += 1;
        }
        Ok(id)
    }

    /// Load a stored comparison.
    pub fn comparison(&self, id: &str) -> Result<Option<StoredComparison>> {
        self.comparisons.load(id)
    }

    /// Validate a stored dataset, append the batch to its history and return
    /// the batch with the status it derives.
    pub fn validate(
        &mut self,
        dataset_id: &str,
        method: &str,
        custom_query: Option<&str>,
    ) -> Result<ValidationOutcome> {
        let dataset = self.dataset(dataset_id)?;
        let results = self.engine.validate(&dataset, method, custom_query)?;

        let run_at = results.first().map(|r| r.timestamp).unwrap_or_else(Utc::now);
        let mut history = self.history.load(dataset_id)?.unwrap_or_default();
        history.push(ValidationBatch {
            dataset_id: dataset_id.to_string(),
            method: method.trim().to_string(),
            run_at,
            results: results.clone(),
        });
        self.history.save(dataset_id, &history)?;

        let status = derive_status(&results);
        info!(
            dataset = dataset_id,
            method,
            status = %status,
            runs = history.len(),
            "validation stored"
        );
        Ok(ValidationOutcome { results, status })
    }

    /// All validation batches of a dataset, oldest first.
    pub fn history(&self, dataset_id: &str) -> Result<Vec<ValidationBatch>> {
        Ok(self.history.load(dataset_id)?.unwrap_or_default())
    }

    /// Status derived from the most recent batch only.
    pub fn latest_status(&self, dataset_id: &str) -> Result<DatasetStatus> {
        let history = self.history(dataset_id)?;
        Ok(history
            .last()
            .map(|batch| derive_status(&batch.results))
            .unwrap_or(DatasetStatus::NotValidated))
    }

    /// Listing of every stored dataset with its current status.
    pub fn summaries(&self) -> Result<Vec<DatasetSummary>> {
        let mut summaries = Vec::new();
        for id in self.datasets.ids()? {
            let Some(dataset) = self.datasets.load(&id)? else {
                continue;
            };
            let kind = dataset
                .metadata
                .as_ref()
                .map(|m| m.source.kind_label())
                .unwrap_or("Inline");

            summaries.push(DatasetSummary {
                status: self.latest_status(&dataset.id)?,
                id: dataset.id.clone(),
                name: dataset.name.clone(),
                kind: kind.to_string(),
                column_count: dataset.column_count(),
                row_count: dataset.row_count(),
                size: estimate_size(dataset.row_count(), dataset.column_count()),
            });
        }
        Ok(summaries)
    }
}
