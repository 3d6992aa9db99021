//! Repository for the `entry_requests`, `residents`, and
//! `delivery_attempts` tables.

use sqlx::{FromRow, PgPool};

use gatepass_core::approval::{EntryState, ResolvedBy};
use gatepass_core::types::{RequestId, Timestamp};
use gatepass_core::visitor::VisitorPayload;

use crate::models::EntryRequest;
use crate::store::StoreError;

/// Column list for `entry_requests` queries.
const COLUMNS: &str =
    "id, guard_id, resident_id, visitor, state, created_at, expires_at, resolved_at, resolved_by";

/// Raw row shape; state and resolver are TEXT, the visitor is JSONB.
#[derive(FromRow)]
struct EntryRequestRow {
    id: RequestId,
    guard_id: String,
    resident_id: String,
    visitor: serde_json::Value,
    state: String,
    created_at: Timestamp,
    expires_at: Timestamp,
    resolved_at: Option<Timestamp>,
    resolved_by: Option<String>,
}

impl TryFrom<EntryRequestRow> for EntryRequest {
    type Error = StoreError;

    fn try_from(row: EntryRequestRow) -> Result<Self, Self::Error> {
        let state: EntryState = row
            .state
            .parse()
            .map_err(|e: String| StoreError::Corrupt(format!("entry_requests.state: {e}")))?;
        let resolved_by = row
            .resolved_by
            .map(|s| s.parse::<ResolvedBy>())
            .transpose()
            .map_err(|e| StoreError::Corrupt(format!("entry_requests.resolved_by: {e}")))?;
        let visitor: VisitorPayload = serde_json::from_value(row.visitor)
            .map_err(|e| StoreError::Corrupt(format!("entry_requests.visitor: {e}")))?;

        Ok(EntryRequest {
            id: row.id,
            guard_id: row.guard_id,
            resident_id: row.resident_id,
            visitor,
            state,
            created_at: row.created_at,
            expires_at: row.expires_at,
            resolved_at: row.resolved_at,
            resolved_by,
        })
    }
}

/// Provides row operations for entry requests.
pub struct EntryRequestRepo;

impl EntryRequestRepo {
    /// Insert a fresh `pending` record.
    pub async fn insert(pool: &PgPool, request: &EntryRequest) -> Result<(), StoreError> {
        let visitor = serde_json::to_value(&request.visitor)
            .map_err(|e| StoreError::Corrupt(format!("visitor payload: {e}")))?;

        sqlx::query(
            "INSERT INTO entry_requests \
                (id, guard_id, resident_id, visitor, state, created_at, expires_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(request.id)
        .bind(&request.guard_id)
        .bind(&request.resident_id)
        .bind(&visitor)
        .bind(request.state.as_str())
        .bind(request.created_at)
        .bind(request.expires_at)
        .execute(pool)
        .await
        .map_err(|e| match &e {
            // PostgreSQL unique violation on the primary key: id reuse.
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                StoreError::DuplicateId(request.id)
            }
            _ => StoreError::Database(e),
        })?;
        Ok(())
    }

    /// Find a record by its id.
    pub async fn find_by_id(
        pool: &PgPool,
        id: RequestId,
    ) -> Result<Option<EntryRequest>, StoreError> {
        let query = format!("SELECT {COLUMNS} FROM entry_requests WHERE id = $1");
        let row = sqlx::query_as::<_, EntryRequestRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?;
        row.map(EntryRequest::try_from).transpose()
    }

    /// Conditionally resolve a record: the row-level compare-and-set.
    ///
    /// Updates state and resolution fields only when the current state
    /// matches `expected`, returning the updated record, or `None` when the
    /// row is absent or not in the expected state.
    pub async fn resolve_if(
        pool: &PgPool,
        id: RequestId,
        expected: EntryState,
        next: EntryState,
        resolved_by: ResolvedBy,
        resolved_at: Timestamp,
    ) -> Result<Option<EntryRequest>, StoreError> {
        let query = format!(
            "UPDATE entry_requests \
             SET state = $3, resolved_by = $4, resolved_at = $5 \
             WHERE id = $1 AND state = $2 \
             RETURNING {COLUMNS}"
        );
        let row = sqlx::query_as::<_, EntryRequestRow>(&query)
            .bind(id)
            .bind(expected.as_str())
            .bind(next.as_str())
            .bind(resolved_by.as_str())
            .bind(resolved_at)
            .fetch_optional(pool)
            .await?;
        row.map(EntryRequest::try_from).transpose()
    }

    /// Every pending record, oldest expiry first.
    pub async fn list_pending(pool: &PgPool) -> Result<Vec<EntryRequest>, StoreError> {
        let query = format!(
            "SELECT {COLUMNS} FROM entry_requests \
             WHERE state = 'pending' \
             ORDER BY expires_at ASC"
        );
        let rows = sqlx::query_as::<_, EntryRequestRow>(&query)
            .fetch_all(pool)
            .await?;
        rows.into_iter().map(EntryRequest::try_from).collect()
    }

    /// Whether a resident id exists in the society directory.
    pub async fn resident_exists(pool: &PgPool, resident_id: &str) -> Result<bool, StoreError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM residents WHERE id = $1)")
                .bind(resident_id)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    /// Bump the per-target delivery counter and return the new count.
    pub async fn increment_delivery_attempt(
        pool: &PgPool,
        id: RequestId,
        target: &str,
    ) -> Result<u32, StoreError> {
        let attempts: i32 = sqlx::query_scalar(
            "INSERT INTO delivery_attempts (request_id, target, attempts, last_attempt_at) \
             VALUES ($1, $2, 1, NOW()) \
             ON CONFLICT (request_id, target) \
             DO UPDATE SET attempts = delivery_attempts.attempts + 1, last_attempt_at = NOW() \
             RETURNING attempts",
        )
        .bind(id)
        .bind(target)
        .fetch_one(pool)
        .await?;
        Ok(attempts.max(0) as u32)
    }
}
