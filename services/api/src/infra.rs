use crate::cli::StoreArgs;
use doc_scoring::config::{AppConfig, StorageConfig};
use doc_scoring::error::AppError;
use doc_scoring::scoring::{FileSnapshotStore, ProfileStore};
use doc_scoring::telemetry;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Loads configuration for a one-shot command and starts telemetry unless a subscriber is
/// already installed. `--store-dir` wins over the environment.
pub(crate) fn storage_config(args: &StoreArgs) -> Result<StorageConfig, AppError> {
    let config = AppConfig::load()?;
    if !tracing::dispatcher::has_been_set() {
        telemetry::init(&config.telemetry)?;
    }

    let mut storage = config.storage;
    apply_store_override(&mut storage, args);
    Ok(storage)
}

pub(crate) fn apply_store_override(storage: &mut StorageConfig, args: &StoreArgs) {
    if let Some(directory) = args.store_dir.clone() {
        storage.directory = directory;
    }
}

pub(crate) fn open_profile_store(storage: &StorageConfig) -> ProfileStore<FileSnapshotStore> {
    let backend = FileSnapshotStore::new(storage.directory.clone());
    let store = ProfileStore::hydrate(backend, storage.key.clone());
    info!(
        directory = %storage.directory.display(),
        key = %storage.key,
        profiles = store.profiles().len(),
        "profile store hydrated"
    );
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn commands_start_telemetry_and_honor_the_store_override() {
        let args = StoreArgs {
            store_dir: Some(PathBuf::from("/tmp/scoring-override")),
        };

        let storage = storage_config(&args).expect("config loads");
        assert_eq!(storage.directory, PathBuf::from("/tmp/scoring-override"));
        assert!(tracing::dispatcher::has_been_set());

        // A second command in the same process reuses the installed subscriber.
        assert!(storage_config(&args).is_ok());
    }
}
