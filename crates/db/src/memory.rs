//! In-memory entry store.
//!
//! Backs tests and single-node deployments. A single mutex around the whole
//! map makes `compare_and_set` trivially atomic; contention is not a concern
//! at gate-entry request rates.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::Mutex;

use gatepass_core::approval::{EntryState, ResolvedBy};
use gatepass_core::types::{RequestId, Timestamp};

use crate::models::EntryRequest;
use crate::store::{CasOutcome, EntryStore, StoreError};

#[derive(Default)]
struct Inner {
    requests: HashMap<RequestId, EntryRequest>,
    residents: HashSet<String>,
    delivery_attempts: HashMap<(RequestId, String), u32>,
}

/// `HashMap`-backed [`EntryStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-seeded with known resident ids.
    pub fn with_residents<I, S>(residents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let store = Self::new();
        {
            let mut inner = store.inner.try_lock().expect("fresh store is uncontended");
            inner.residents = residents.into_iter().map(Into::into).collect();
        }
        store
    }

    /// Add a resident to the directory.
    pub async fn register_resident(&self, resident_id: impl Into<String>) {
        self.inner.lock().await.residents.insert(resident_id.into());
    }
}

#[async_trait]
impl EntryStore for MemoryStore {
    async fn insert(&self, request: &EntryRequest) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().await;
        if inner.requests.contains_key(&request.id) {
            return Err(StoreError::DuplicateId(request.id));
        }
        inner.requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn get(&self, id: RequestId) -> Result<Option<EntryRequest>, StoreError> {
        Ok(self.inner.lock().await.requests.get(&id).cloned())
    }

    async fn compare_and_set(
        &self,
        id: RequestId,
        expected: EntryState,
        next: EntryState,
        resolved_by: ResolvedBy,
        resolved_at: Timestamp,
    ) -> Result<CasOutcome, StoreError> {
        let mut inner = self.inner.lock().await;
        let Some(record) = inner.requests.get_mut(&id) else {
            return Ok(CasOutcome::Missing);
        };
        if record.state != expected {
            return Ok(CasOutcome::Conflict(record.clone()));
        }
        record.state = next;
        record.resolved_at = Some(resolved_at);
        record.resolved_by = Some(resolved_by);
        Ok(CasOutcome::Applied(record.clone()))
    }

    async fn list_pending(&self) -> Result<Vec<EntryRequest>, StoreError> {
        let inner = self.inner.lock().await;
        let mut pending: Vec<EntryRequest> = inner
            .requests
            .values()
            .filter(|r| r.state == EntryState::Pending)
            .cloned()
            .collect();
        pending.sort_by_key(|r| r.expires_at);
        Ok(pending)
    }

    async fn resident_exists(&self, resident_id: &str) -> Result<bool, StoreError> {
        Ok(self.inner.lock().await.residents.contains(resident_id))
    }

    async fn record_delivery_attempt(
        &self,
        id: RequestId,
        target: &str,
    ) -> Result<u32, StoreError> {
        let mut inner = self.inner.lock().await;
        let count = inner
            .delivery_attempts
            .entry((id, target.to_string()))
            .or_insert(0);
        *count += 1;
        Ok(*count)
    }

    async fn health(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
