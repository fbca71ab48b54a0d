//! CLI command implementations.

pub mod compare;
pub mod status;
pub mod validate;

use std::path::Path;

use colored::{ColoredString, Colorize};
use dataproof::{
    CheckStatus, Dataset, DatasetStatus, EngineConfig, JsonFileStore, QualityService,
    StoredComparison, ValidationBatch, ValidationEngine,
};

/// Service persisting everything as JSON files under one directory.
pub type FileService = QualityService<
    JsonFileStore<Dataset>,
    JsonFileStore<Vec<ValidationBatch>>,
    JsonFileStore<StoredComparison>,
>;

/// Open (creating if needed) the `datasets/`, `history/` and `comparisons/`
/// stores under `dir`.
pub fn open_store(dir: &Path) -> dataproof::Result<FileService> {
    Ok(QualityService::new(
        JsonFileStore::open(dir.join("datasets"))?,
        JsonFileStore::open(dir.join("history"))?,
        JsonFileStore::open(dir.join("comparisons"))?,
    ))
}

/// Engine with thresholds from an optional JSON config file.
pub fn load_engine(config: Option<&Path>) -> dataproof::Result<ValidationEngine> {
    let config = match config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    Ok(ValidationEngine::with_config(config))
}

pub fn paint_check(status: CheckStatus) -> ColoredString {
    match status {
        CheckStatus::Pass => status.label().green(),
        CheckStatus::Info => status.label().blue(),
        CheckStatus::Warning => status.label().yellow(),
        CheckStatus::Fail => status.label().red().bold(),
    }
}

pub fn paint_dataset(status: DatasetStatus) -> ColoredString {
    match status {
        DatasetStatus::Validated => status.label().green(),
        DatasetStatus::IssuesFound => status.label().yellow(),
        DatasetStatus::NotValidated => status.label().dimmed(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dataproof::Store;

    #[test]
    fn test_open_store_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let mut service = open_store(dir.path()).unwrap();

        for sub in ["datasets", "history", "comparisons"] {
            assert!(dir.path().join(sub).is_dir());
        }

        let dataset = Dataset::from_string_rows(
            "people",
            "people",
            vec!["id".to_string()],
            vec![vec!["1".to_string()]],
        );
        service.add_dataset(&dataset).unwrap();
        service.validate("people", "basic", None).unwrap();

        let reopened = open_store(dir.path()).unwrap();
        assert_eq!(reopened.latest_status("people").unwrap(), DatasetStatus::Validated);
        assert_eq!(
            JsonFileStore::<Dataset>::open(dir.path().join("datasets")).unwrap().ids().unwrap(),
            vec!["people"]
        );
    }

    #[test]
    fn test_load_engine_reads_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{"missing_fail_ratio": 0.2}"#).unwrap();

        let engine = load_engine(Some(path.as_path())).unwrap();
        assert_eq!(engine.config().missing_fail_ratio, 0.2);
        assert!(load_engine(Some(dir.path().join("absent.json").as_path())).is_err());
    }
}
