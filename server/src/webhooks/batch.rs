//! Batch Ingestion
//!
//! Replays archived webhook payloads through the normalizer, one at a time and
//! in order, under the best-effort ingestion policy. Unreadable files, malformed
//! payloads and storage failures are skipped; the batch always runs to the end.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};
use wa_common::Message;

use super::normalizer::Normalizer;

/// Batch source errors. Per-payload problems never surface here.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("Samples directory not found")]
    DirectoryNotFound(PathBuf),
    #[error("No sample files found")]
    NoSamples(PathBuf),
    #[error("Failed to read samples directory: {0}")]
    Io(#[from] std::io::Error),
}

/// Result of one stored payload from a directory batch.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SampleResult {
    /// Source file name
    pub file: String,
    pub result: Message,
}

/// Summary of a batch run.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<T> {
    pub success: bool,
    /// Number of payloads that created or updated a record
    pub processed: usize,
    pub results: Vec<T>,
}

impl<T> BatchReport<T> {
    fn from_results(results: Vec<T>) -> Self {
        Self {
            success: true,
            processed: results.len(),
            results,
        }
    }
}

/// Ingest a list of payloads in order, keeping the records that were stored.
pub async fn ingest_payloads(
    normalizer: &Normalizer,
    payloads: &[serde_json::Value],
) -> BatchReport<Message> {
    let mut results = Vec::new();
    for payload in payloads {
        if let Some(message) = normalizer.ingest_best_effort(payload).await {
            results.push(message);
        }
    }

    info!(
        total = payloads.len(),
        processed = results.len(),
        "Uploaded payload batch ingested"
    );
    BatchReport::from_results(results)
}

/// Ingest every `*.json` file of a directory, in file-name order.
pub async fn ingest_directory(
    normalizer: &Normalizer,
    dir: &Path,
) -> Result<BatchReport<SampleResult>, SampleError> {
    let files = list_sample_files(dir).await?;

    let mut results = Vec::new();
    for path in &files {
        let file = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let Some(payload) = read_payload(path).await else {
            continue;
        };

        if let Some(message) = normalizer.ingest_best_effort(&payload).await {
            results.push(SampleResult {
                file,
                result: message,
            });
        }
    }

    info!(
        dir = %dir.display(),
        total = files.len(),
        processed = results.len(),
        "Sample directory ingested"
    );
    Ok(BatchReport::from_results(results))
}

/// Sorted list of JSON files in `dir`.
async fn list_sample_files(dir: &Path) -> Result<Vec<PathBuf>, SampleError> {
    if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
        return Err(SampleError::DirectoryNotFound(dir.to_path_buf()));
    }

    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json && entry.file_type().await.is_ok_and(|t| t.is_file()) {
            files.push(path);
        }
    }

    if files.is_empty() {
        return Err(SampleError::NoSamples(dir.to_path_buf()));
    }

    files.sort();
    Ok(files)
}

async fn read_payload(path: &Path) -> Option<serde_json::Value> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Skipping unreadable sample");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(payload) => Some(payload),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Skipping sample with invalid JSON");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;

    use crate::store::MemoryMessageStore;

    fn normalizer() -> (Normalizer, Arc<MemoryMessageStore>) {
        let store = Arc::new(MemoryMessageStore::new());
        (Normalizer::new(store.clone(), None, "918329446654"), store)
    }

    fn message(id: &str) -> serde_json::Value {
        json!({
            "metaData": { "entry": [{ "changes": [{ "value": {
                "messages": [{ "from": "919999999999", "id": id, "timestamp": "1700000000",
                               "text": { "body": id }, "type": "text" }]
            }}]}]}
        })
    }

    #[tokio::test]
    async fn malformed_payloads_are_skipped_not_fatal() {
        let (normalizer, store) = normalizer();
        let payloads = vec![
            message("m1"),
            json!({ "garbage": true }),
            message("m2"),
            json!("not even an object"),
            json!({ "metaData": { "entry": [{ "changes": [{ "value": {
                "statuses": [{ "id": "m1", "status": "read" }]
            }}]}]}}),
        ];

        let report = ingest_payloads(&normalizer, &payloads).await;

        assert!(report.success);
        assert_eq!(report.processed, 3);
        assert_eq!(report.results.len(), 3);
        assert_eq!(report.results[0].external_id, "m1");
        assert_eq!(report.results[1].external_id, "m2");
        assert_eq!(report.results[2].status, wa_common::DeliveryState::Read);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn directory_is_processed_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.json"), message("second").to_string()).unwrap();
        std::fs::write(dir.path().join("a.json"), message("first").to_string()).unwrap();
        std::fs::write(dir.path().join("c.json"), "{ not json").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let (normalizer, store) = normalizer();
        let report = ingest_directory(&normalizer, dir.path()).await.unwrap();

        assert_eq!(report.processed, 2);
        assert_eq!(report.results[0].file, "a.json");
        assert_eq!(report.results[0].result.external_id, "first");
        assert_eq!(report.results[1].file, "b.json");
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn missing_or_empty_directory_is_reported() {
        let (normalizer, _) = normalizer();
        let dir = tempfile::tempdir().unwrap();

        assert!(matches!(
            ingest_directory(&normalizer, dir.path()).await,
            Err(SampleError::NoSamples(_))
        ));
        assert!(matches!(
            ingest_directory(&normalizer, &dir.path().join("missing")).await,
            Err(SampleError::DirectoryNotFound(_))
        ));
    }
}
