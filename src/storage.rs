use crate::errors::AppError;
use crate::store::KvStore;
use std::path::Path;
use tokio::fs;
use tracing::error;

/// Reads the persisted key-value file. A missing or corrupt file starts an empty store.
pub async fn load_store(path: &Path) -> KvStore {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(store) => store,
            Err(err) => {
                error!("failed to parse data file: {err}");
                KvStore::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => KvStore::default(),
        Err(err) => {
            error!("failed to read data file: {err}");
            KvStore::default()
        }
    }
}

/// Writes the whole store in one go; a reader never sees half an update.
pub async fn persist_store(path: &Path, store: &KvStore) -> Result<(), AppError> {
    let payload = serde_json::to_vec_pretty(store).map_err(AppError::internal)?;
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, payload).await.map_err(AppError::internal)?;
    fs::rename(&staging, path).await.map_err(AppError::internal)?;
    Ok(())
}
