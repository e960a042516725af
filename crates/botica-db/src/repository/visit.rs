//! # Visit Repository
//!
//! Database operations for sales visits.
//!
//! A visit may carry the order taken during it ("quick order"). The link
//! is set once; deleting the order clears it (ON DELETE SET NULL).

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use botica_core::merge::MergeOutcome;
use botica_core::{CoreError, Visit};

const VISIT_COLUMNS: &str = "id, client_id, date, notes, outcome, order_id, created_at";

/// Row shape of the `visits` table.
#[derive(Debug, sqlx::FromRow)]
struct VisitRecord {
    id: String,
    client_id: String,
    date: DateTime<Utc>,
    notes: Option<String>,
    outcome: Option<String>,
    order_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<VisitRecord> for Visit {
    fn from(r: VisitRecord) -> Self {
        Visit {
            id: r.id,
            client_id: r.client_id,
            date: r.date,
            notes: r.notes,
            outcome: r.outcome,
            order_id: r.order_id,
            created_at: r.created_at,
        }
    }
}

/// Repository for visit database operations.
#[derive(Debug, Clone)]
pub struct VisitRepository {
    pool: SqlitePool,
}

impl VisitRepository {
    /// Creates a new VisitRepository.
    pub fn new(pool: SqlitePool) -> Self {
        VisitRepository { pool }
    }

    /// Inserts a visit.
    pub async fn insert(&self, visit: &Visit) -> DbResult<()> {
        debug!(id = %visit.id, client_id = %visit.client_id, "Logging visit");

        sqlx::query(
            r#"
            INSERT INTO visits (id, client_id, date, notes, outcome, order_id, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&visit.id)
        .bind(&visit.client_id)
        .bind(visit.date)
        .bind(&visit.notes)
        .bind(&visit.outcome)
        .bind(&visit.order_id)
        .bind(visit.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Inserts the visit or overwrites the one with the same id.
    pub async fn upsert(&self, visit: &Visit) -> DbResult<MergeOutcome> {
        let outcome = if self.get(&visit.id).await?.is_some() {
            sqlx::query(
                r#"
                UPDATE visits SET
                    client_id = ?2,
                    date = ?3,
                    notes = ?4,
                    outcome = ?5,
                    order_id = ?6
                WHERE id = ?1
                "#,
            )
            .bind(&visit.id)
            .bind(&visit.client_id)
            .bind(visit.date)
            .bind(&visit.notes)
            .bind(&visit.outcome)
            .bind(&visit.order_id)
            .execute(&self.pool)
            .await?;
            MergeOutcome::Updated
        } else {
            self.insert(visit).await?;
            MergeOutcome::Created
        };

        Ok(outcome)
    }

    /// Links the order taken during a visit.
    ///
    /// ## Errors
    /// - `NotFound` when the visit does not exist
    /// - `CoreError::VisitAlreadyOrdered` when it already has an order
    pub async fn link_order(&self, visit_id: &str, order_id: &str) -> DbResult<()> {
        debug!(visit_id = %visit_id, order_id = %order_id, "Linking order to visit");

        let result =
            sqlx::query("UPDATE visits SET order_id = ?2 WHERE id = ?1 AND order_id IS NULL")
                .bind(visit_id)
                .bind(order_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return match self.get(visit_id).await? {
                Some(Visit {
                    order_id: Some(existing),
                    ..
                }) => Err(CoreError::VisitAlreadyOrdered {
                    visit_id: visit_id.to_string(),
                    order_id: existing,
                }
                .into()),
                _ => Err(DbError::not_found("Visit", visit_id)),
            };
        }

        Ok(())
    }

    /// Gets a visit by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Visit>> {
        let sql = format!("SELECT {} FROM visits WHERE id = ?1", VISIT_COLUMNS);
        let record: Option<VisitRecord> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Visit::from))
    }

    /// Visits to one client, newest first.
    pub async fn list_for_client(&self, client_id: &str) -> DbResult<Vec<Visit>> {
        let sql = format!(
            "SELECT {} FROM visits WHERE client_id = ?1 ORDER BY date DESC",
            VISIT_COLUMNS
        );
        let records: Vec<VisitRecord> = sqlx::query_as(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(Visit::from).collect())
    }

    /// Most recent visits across all clients.
    pub async fn list_recent(&self, limit: u32) -> DbResult<Vec<Visit>> {
        let sql = format!(
            "SELECT {} FROM visits ORDER BY date DESC LIMIT ?1",
            VISIT_COLUMNS
        );
        let records: Vec<VisitRecord> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(Visit::from).collect())
    }

    /// Every visit, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Visit>> {
        let sql = format!("SELECT {} FROM visits ORDER BY date DESC", VISIT_COLUMNS);
        let records: Vec<VisitRecord> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(records.into_iter().map(Visit::from).collect())
    }

    /// Deletes a visit. The linked order, if any, is kept.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting visit");

        let result = sqlx::query("DELETE FROM visits WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Visit", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
