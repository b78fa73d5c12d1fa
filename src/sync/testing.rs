//! Test doubles for the sync pipeline.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::fetch::{FetchAction, FetchRequest, FetchResult};
use crate::notion::{Record, RemoteStore, StoreError};

/// In-memory store. Applies patches to its records so a later query sees
/// them, and evaluates `status`/`select` equality filters like the real one.
#[derive(Default)]
pub(crate) struct MemoryStore {
    records: Mutex<Vec<Record>>,
    patches: Mutex<Vec<(String, Value)>>,
    patch_failures: Mutex<VecDeque<StoreError>>,
    query_failure: Mutex<Option<StoreError>>,
    patch_attempts: AtomicUsize,
    gets: AtomicUsize,
    ignore_filters: bool,
}

impl MemoryStore {
    pub(crate) fn with_records(records: Vec<Record>) -> Self {
        Self {
            records: Mutex::new(records),
            ..Self::default()
        }
    }

    /// Store whose query returns every record regardless of filter, like a
    /// remote that matched on a property this crate cannot read back.
    pub(crate) fn unfiltered(records: Vec<Record>) -> Self {
        Self {
            ignore_filters: true,
            ..Self::with_records(records)
        }
    }

    /// Make the next patch calls fail, one error per call.
    pub(crate) fn fail_patches(&self, errors: Vec<StoreError>) {
        self.patch_failures.lock().unwrap().extend(errors);
    }

    pub(crate) fn fail_next_query(&self, error: StoreError) {
        *self.query_failure.lock().unwrap() = Some(error);
    }

    /// Successful patches, in order.
    pub(crate) fn patches(&self) -> Vec<(String, Value)> {
        self.patches.lock().unwrap().clone()
    }

    pub(crate) fn patch_attempts(&self) -> usize {
        self.patch_attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub(crate) fn record(&self, id: &str) -> Option<Record> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
    }
}

fn filter_matches(filter: &Value, record: &Record) -> bool {
    let Some(property) = filter["property"].as_str() else {
        return true;
    };
    let Some((kind, condition)) = ["status", "select"]
        .iter()
        .find_map(|k| filter.get(*k).map(|c| (*k, c)))
    else {
        return true;
    };
    let actual = record
        .property(property)
        .and_then(|p| p.get(kind))
        .and_then(|v| v.get("name"));
    actual.is_some() && actual == condition.get("equals")
}

#[async_trait]
impl RemoteStore for MemoryStore {
    async fn query(&self, filter: Option<&Value>) -> Result<Vec<Record>, StoreError> {
        if let Some(e) = self.query_failure.lock().unwrap().take() {
            return Err(e);
        }
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| self.ignore_filters || filter.map_or(true, |f| filter_matches(f, r)))
            .cloned()
            .collect())
    }

    async fn get_record(&self, id: &str) -> Result<Option<Record>, StoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        Ok(self.record(id))
    }

    async fn patch_record(&self, id: &str, properties: &Value) -> Result<(), StoreError> {
        self.patch_attempts.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.patch_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| StoreError::RemoteRejected {
                status: 404,
                body: "object_not_found".into(),
            })?;
        record.apply_update(properties);
        self.patches
            .lock()
            .unwrap()
            .push((id.to_string(), properties.clone()));
        Ok(())
    }
}

/// Fetch action returning a canned result and counting calls.
pub(crate) struct StubFetcher {
    result: FetchResult,
    delay: Duration,
    calls: Mutex<Vec<FetchRequest>>,
}

impl StubFetcher {
    pub(crate) fn succeeding(path: &str) -> Self {
        Self::returning(FetchResult::Success {
            path: PathBuf::from(path),
        })
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self::returning(FetchResult::Failure {
            reason: reason.to_string(),
        })
    }

    pub(crate) fn returning(result: FetchResult) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl FetchAction for StubFetcher {
    async fn fetch(&self, request: &FetchRequest) -> FetchResult {
        self.calls.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}

pub(crate) fn record(id: &str, properties: Value) -> Record {
    serde_json::from_value(json!({ "id": id, "properties": properties })).unwrap()
}

/// The record from the concrete scenarios: rich-text URL, select status.
pub(crate) fn pending_select_record(id: &str) -> Record {
    record(
        id,
        json!({
            "url": {"rich_text": [{"text": {"content": "https://example.com/v/1"}}]},
            "status": {"select": {"name": "pending"}}
        }),
    )
}

pub(crate) fn unavailable() -> StoreError {
    StoreError::RemoteRejected {
        status: 503,
        body: "service_unavailable".into(),
    }
}
