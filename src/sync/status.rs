use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::notion::{Record, RemoteStore, StoreError};
use crate::retry::{retry_with_backoff, RetryAction, RetryConfig};
use crate::schema::{describe, detect, FieldEncoding, STATUS_ENCODINGS, TEXT_ENCODINGS};

#[derive(Debug, Error)]
pub enum StatusWriteError {
    /// The property is missing or uses an encoding no payload can be built
    /// for. Nothing was written.
    #[error("property {field:?} has unsupported encoding {found}")]
    UnsupportedSchema { field: String, found: String },

    #[error("record {0} not found")]
    RecordNotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Writes status labels into one status property, shaped for whatever
/// encoding the record uses.
///
/// The encoding is detected before every write. A payload is never built for
/// an encoding that was not observed on the record.
pub struct StatusWriter {
    store: Arc<dyn RemoteStore>,
    field: String,
    retry: RetryConfig,
}

impl StatusWriter {
    pub fn new(store: Arc<dyn RemoteStore>, field: impl Into<String>, retry: RetryConfig) -> Self {
        Self {
            store,
            field: field.into(),
            retry,
        }
    }

    /// Encoding of the status property on `record`.
    pub fn resolve(&self, record: &Record) -> Result<FieldEncoding, StatusWriteError> {
        resolve_property(record, &self.field, STATUS_ENCODINGS)
    }

    /// Write `label` using the record object already in hand.
    pub async fn set_status_for(
        &self,
        record: &Record,
        label: &str,
    ) -> Result<FieldEncoding, StatusWriteError> {
        let encoding = self.resolve(record)?;
        self.write(&record.id, encoding, label).await?;
        Ok(encoding)
    }

    /// Write `label` to the record with `id`, re-reading it first to learn the
    /// current encoding.
    pub async fn set_status(
        &self,
        id: &str,
        label: &str,
    ) -> Result<FieldEncoding, StatusWriteError> {
        let record = retry_with_backoff(&self.retry, classify, || self.store.get_record(id))
            .await?
            .ok_or_else(|| StatusWriteError::RecordNotFound(id.to_string()))?;
        self.set_status_for(&record, label).await
    }

    /// Patch the status property of `id` with a payload for `encoding`.
    /// Retryable store errors are retried with backoff.
    pub async fn write(
        &self,
        id: &str,
        encoding: FieldEncoding,
        label: &str,
    ) -> Result<(), StatusWriteError> {
        let update = encoding.update(&self.field, label);
        tracing::debug!(record_id = %id, "Setting {:?} to {:?} ({})", self.field, label, encoding);
        self.patch(id, &update).await
    }

    /// Store `path` in free-text `property` of `record`. A URL-typed property
    /// receives a `file://` URL.
    pub async fn write_path(
        &self,
        record: &Record,
        property: &str,
        path: &Path,
    ) -> Result<(), StatusWriteError> {
        let encoding = resolve_property(record, property, TEXT_ENCODINGS)?;
        let value = match encoding {
            FieldEncoding::PlainScalar => file_url(path),
            _ => path.display().to_string(),
        };
        self.patch(&record.id, &encoding.update(property, &value))
            .await
    }

    async fn patch(&self, id: &str, update: &serde_json::Value) -> Result<(), StatusWriteError> {
        retry_with_backoff(&self.retry, classify, || self.store.patch_record(id, update)).await?;
        Ok(())
    }
}

fn classify(e: &StoreError) -> RetryAction {
    if e.is_retryable() {
        RetryAction::Retry
    } else {
        RetryAction::Abort
    }
}

fn resolve_property(
    record: &Record,
    field: &str,
    candidates: &[FieldEncoding],
) -> Result<FieldEncoding, StatusWriteError> {
    let property = record.property(field);
    property
        .and_then(|p| detect(p, candidates))
        .ok_or_else(|| StatusWriteError::UnsupportedSchema {
            field: field.to_string(),
            found: property.map_or_else(|| "missing".to_string(), describe),
        })
}

fn file_url(path: &Path) -> String {
    url::Url::from_file_path(path)
        .map(String::from)
        .unwrap_or_else(|()| format!("file://{}", path.display()))
}
