use crate::models::PracticeProgress;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{error, warn};

const KEY_PREFIX: &str = "japProgress_";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to encode progress: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("failed to write progress file: {0}")]
    Io(#[from] std::io::Error),
}

/// Namespaced key under which a practice's progress is kept.
pub fn storage_key(practice_id: &str) -> String {
    format!("{KEY_PREFIX}{practice_id}")
}

/// File-backed progress records, one per practice.
///
/// The in-memory copy is authoritative for the session: a failed write leaves
/// it updated, so taps keep working when the file cannot be written.
#[derive(Debug)]
pub struct ProgressStore {
    path: PathBuf,
    records: BTreeMap<String, PracticeProgress>,
}

impl ProgressStore {
    pub async fn open(path: PathBuf) -> Self {
        let records = load_records(&path).await;
        Self { path, records }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, practice_id: &str) -> Option<PracticeProgress> {
        self.records.get(&storage_key(practice_id)).copied()
    }

    /// Progress for `practice_id`, or the zero state when nothing is stored.
    pub fn load(&self, practice_id: &str) -> PracticeProgress {
        self.get(practice_id).unwrap_or_default()
    }

    pub async fn save(&mut self, practice_id: &str, state: PracticeProgress) -> Result<(), StoreError> {
        self.records.insert(storage_key(practice_id), state);
        persist_records(&self.path, &self.records).await
    }
}

async fn load_records(path: &Path) -> BTreeMap<String, PracticeProgress> {
    match fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice::<BTreeMap<String, Value>>(&bytes) {
            Ok(raw) => raw
                .into_iter()
                .filter_map(|(key, value)| decode_record(key, value))
                .collect(),
            Err(err) => {
                error!("failed to parse progress file: {err}");
                BTreeMap::new()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
        Err(err) => {
            error!("failed to read progress file: {err}");
            BTreeMap::new()
        }
    }
}

fn decode_record(key: String, value: Value) -> Option<(String, PracticeProgress)> {
    if !key.starts_with(KEY_PREFIX) {
        warn!(%key, "ignoring unknown progress key");
        return None;
    }

    match serde_json::from_value::<PracticeProgress>(value) {
        Ok(progress) if progress.is_valid() => Some((key, progress)),
        Ok(progress) => {
            warn!(%key, current_taps = progress.current_taps, "discarding out-of-range progress record");
            None
        }
        Err(err) => {
            warn!(%key, "discarding malformed progress record: {err}");
            None
        }
    }
}

async fn persist_records(
    path: &Path,
    records: &BTreeMap<String, PracticeProgress>,
) -> Result<(), StoreError> {
    let payload = serde_json::to_vec_pretty(records)?;
    fs::write(path, payload).await?;
    Ok(())
}
