//! PostgreSQL-backed entry store.
//!
//! Thin [`EntryStore`] adapter over [`EntryRequestRepo`]; the conditional
//! `UPDATE ... WHERE state = $expected` is the per-row single writer.

use async_trait::async_trait;

use gatepass_core::approval::{EntryState, ResolvedBy};
use gatepass_core::types::{RequestId, Timestamp};

use crate::models::EntryRequest;
use crate::repositories::EntryRequestRepo;
use crate::store::{CasOutcome, EntryStore, StoreError};
use crate::DbPool;

/// `sqlx`/PostgreSQL [`EntryStore`].
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EntryStore for PgStore {
    async fn insert(&self, request: &EntryRequest) -> Result<(), StoreError> {
        EntryRequestRepo::insert(&self.pool, request).await
    }

    async fn get(&self, id: RequestId) -> Result<Option<EntryRequest>, StoreError> {
        EntryRequestRepo::find_by_id(&self.pool, id).await
    }

    async fn compare_and_set(
        &self,
        id: RequestId,
        expected: EntryState,
        next: EntryState,
        resolved_by: ResolvedBy,
        resolved_at: Timestamp,
    ) -> Result<CasOutcome, StoreError> {
        if let Some(updated) =
            EntryRequestRepo::resolve_if(&self.pool, id, expected, next, resolved_by, resolved_at)
                .await?
        {
            return Ok(CasOutcome::Applied(updated));
        }

        // Zero rows updated: either the id is unknown or another transition
        // won the race. Re-read to tell the two apart.
        match EntryRequestRepo::find_by_id(&self.pool, id).await? {
            Some(current) => Ok(CasOutcome::Conflict(current)),
            None => Ok(CasOutcome::Missing),
        }
    }

    async fn list_pending(&self) -> Result<Vec<EntryRequest>, StoreError> {
        EntryRequestRepo::list_pending(&self.pool).await
    }

    async fn resident_exists(&self, resident_id: &str) -> Result<bool, StoreError> {
        EntryRequestRepo::resident_exists(&self.pool, resident_id).await
    }

    async fn record_delivery_attempt(
        &self,
        id: RequestId,
        target: &str,
    ) -> Result<u32, StoreError> {
        EntryRequestRepo::increment_delivery_attempt(&self.pool, id, target).await
    }

    async fn health(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool).await?;
        Ok(())
    }
}
