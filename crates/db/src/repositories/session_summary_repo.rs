use chrono::NaiveDate;
use shared::types::{SessionId, TenantId};
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::SessionSummary;

/// Summaries are batch-fetched in chunks to keep parameter lists bounded.
const BATCH_CHUNK: usize = 100;

const SUMMARY_COLUMNS: &str =
    "tenant_id, session_id, capacity, booked_count, waitlist_count, session_date, updated_at";

/// Per-session capacity ledger, backed by the session_summaries row.
///
/// `reserve_in_tx` and `release_in_tx` are single-row conditional writes;
/// the booking engine composes them with the booking write inside one
/// transaction so the pair commits or fails atomically. A condition failure
/// shows up as zero affected rows, never as a partial write.
pub struct SessionSummaryRepository;

impl SessionSummaryRepository {
    /// Conditionally take one seat on a session.
    ///
    /// Creates the summary row on first booking (also stamping the local
    /// occurrence date), otherwise increments under the capacity bound. The
    /// stored capacity is refreshed on every reservation so it tracks
    /// schedule and override changes. Returns false when the session is full.
    pub async fn reserve_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: &TenantId,
        session_id: &SessionId,
        resolved_capacity: Option<i32>,
        session_date: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO session_summaries (tenant_id, session_id, capacity, booked_count, waitlist_count, session_date)
            VALUES ($1, $2, $3, 1, 0, $4)
            ON CONFLICT (tenant_id, session_id) DO UPDATE
            SET booked_count = session_summaries.booked_count + 1,
                capacity = EXCLUDED.capacity,
                updated_at = NOW()
            WHERE EXCLUDED.capacity IS NULL
               OR session_summaries.booked_count < EXCLUDED.capacity
            "#,
        )
        .bind(tenant_id)
        .bind(session_id)
        .bind(resolved_capacity)
        .bind(session_date)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Give back one seat. Returns false on underflow, which the caller must
    /// treat as a broken invariant rather than a user error.
    pub async fn release_in_tx(
        tx: &mut Transaction<'_, Postgres>,
        tenant_id: &TenantId,
        session_id: &SessionId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE session_summaries
            SET booked_count = booked_count - 1, updated_at = NOW()
            WHERE tenant_id = $1 AND session_id = $2 AND booked_count > 0
            "#,
        )
        .bind(tenant_id)
        .bind(session_id)
        .execute(&mut **tx)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find(
        pool: &PgPool,
        tenant_id: &TenantId,
        session_id: &SessionId,
    ) -> Result<Option<SessionSummary>, sqlx::Error> {
        sqlx::query_as::<_, SessionSummary>(&format!(
            r#"
            SELECT {SUMMARY_COLUMNS}
            FROM session_summaries
            WHERE tenant_id = $1 AND session_id = $2
            "#
        ))
        .bind(tenant_id)
        .bind(session_id)
        .fetch_optional(pool)
        .await
    }

    /// Fetch the summaries for a set of session ids, in chunks of 100.
    pub async fn find_batch(
        pool: &PgPool,
        tenant_id: &TenantId,
        session_ids: &[SessionId],
    ) -> Result<Vec<SessionSummary>, sqlx::Error> {
        let mut summaries = Vec::new();
        for chunk in session_ids.chunks(BATCH_CHUNK) {
            let ids: Vec<String> = chunk.iter().map(|id| id.to_string()).collect();
            let mut rows = sqlx::query_as::<_, SessionSummary>(&format!(
                r#"
                SELECT {SUMMARY_COLUMNS}
                FROM session_summaries
                WHERE tenant_id = $1 AND session_id = ANY($2)
                "#
            ))
            .bind(tenant_id)
            .bind(&ids)
            .fetch_all(pool)
            .await?;
            summaries.append(&mut rows);
        }
        Ok(summaries)
    }
}
