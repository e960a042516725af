//! # Order Repository
//!
//! Database operations for orders and their lines.
//!
//! ## Order Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  orders                          order_lines                            │
//! │  ─────────────────────           ──────────────────────────────         │
//! │  id, client_id, date,      1──*  order_id, position, product,           │
//! │  status, total_cents             quantity, unit_price_cents,            │
//! │                                  discount_bps, line_total_cents         │
//! │                                                                         │
//! │  Header and lines are always written in one transaction, and the       │
//! │  header total is recomputed from the lines before every write.         │
//! │  Deleting an order removes its lines (ON DELETE CASCADE).              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::collections::HashMap;
use tracing::debug;

use crate::error::{DbError, DbResult};
use botica_core::merge::{merge_or_insert, MergeOutcome};
use botica_core::{Money, Order, OrderLine, OrderStatus, Percentage};

const ORDER_COLUMNS: &str =
    "o.id, o.client_id, o.date, o.status, o.reference, o.notes, o.total_cents, o.created_at, o.updated_at";

const LINE_COLUMNS: &str =
    "l.order_id, l.position, l.product, l.quantity, l.unit_price_cents, l.discount_bps, l.line_total_cents";

/// Row shape of the `orders` table.
#[derive(Debug, sqlx::FromRow)]
struct OrderRecord {
    id: String,
    client_id: String,
    date: DateTime<Utc>,
    status: OrderStatus,
    reference: Option<String>,
    notes: Option<String>,
    total_cents: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

/// Row shape of the `order_lines` table.
#[derive(Debug, sqlx::FromRow)]
struct LineRecord {
    order_id: String,
    #[allow(dead_code)]
    position: i64,
    product: String,
    quantity: i64,
    unit_price_cents: i64,
    discount_bps: i64,
    line_total_cents: i64,
}

impl From<LineRecord> for OrderLine {
    fn from(r: LineRecord) -> Self {
        OrderLine {
            product: r.product,
            quantity: r.quantity,
            unit_price: Money::from_cents(r.unit_price_cents),
            discount: Percentage::from_bps(r.discount_bps.clamp(0, u32::MAX as i64) as u32),
            line_total: Money::from_cents(r.line_total_cents),
        }
    }
}

impl OrderRecord {
    fn into_order(self, lines: Vec<OrderLine>) -> Order {
        Order {
            id: self.id,
            client_id: self.client_id,
            date: self.date,
            status: self.status,
            reference: self.reference,
            notes: self.notes,
            lines,
            total: Money::from_cents(self.total_cents),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Attaches lines (already sorted by position) to their order records.
fn assemble(records: Vec<OrderRecord>, lines: Vec<LineRecord>) -> Vec<Order> {
    let mut by_order: HashMap<String, Vec<OrderLine>> = HashMap::new();
    for line in lines {
        by_order
            .entry(line.order_id.clone())
            .or_default()
            .push(OrderLine::from(line));
    }

    records
        .into_iter()
        .map(|record| {
            let lines = by_order.remove(&record.id).unwrap_or_default();
            record.into_order(lines)
        })
        .collect()
}

/// Repository for order database operations.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Inserts an order with its lines in one transaction.
    ///
    /// Totals are recomputed from the lines before writing.
    pub async fn insert(&self, order: &Order) -> DbResult<Order> {
        let mut order = order.clone();
        order.recompute_totals();

        debug!(
            id = %order.id,
            client_id = %order.client_id,
            lines = order.lines.len(),
            total = %order.total,
            "Inserting order"
        );

        let mut tx = self.pool.begin().await?;
        insert_header(&mut tx, &order).await?;
        write_lines(&mut tx, &order).await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Keyed merge: inserts the order, or merges it into the one with the
    /// same id. Lines are replaced; reference and notes left blank by the
    /// incoming order keep their stored values.
    pub async fn upsert(&self, order: &Order) -> DbResult<MergeOutcome> {
        let mut incoming = order.clone();
        incoming.recompute_totals();

        let existing = self.get(&incoming.id).await?;
        let (order, outcome) = merge_or_insert(existing, incoming);

        let mut tx = self.pool.begin().await?;

        if outcome == MergeOutcome::Updated {
            sqlx::query(
                r#"
                UPDATE orders SET
                    client_id = ?2,
                    date = ?3,
                    status = ?4,
                    reference = ?5,
                    notes = ?6,
                    total_cents = ?7,
                    updated_at = ?8
                WHERE id = ?1
                "#,
            )
            .bind(&order.id)
            .bind(&order.client_id)
            .bind(order.date)
            .bind(order.status)
            .bind(&order.reference)
            .bind(&order.notes)
            .bind(order.total.cents())
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await?;
        } else {
            insert_header(&mut tx, &order).await?;
        }

        write_lines(&mut tx, &order).await?;
        tx.commit().await?;

        debug!(id = %order.id, outcome = ?outcome, "Order upserted");
        Ok(outcome)
    }

    /// Replaces all lines of an order and recomputes its total.
    ///
    /// ## Returns
    /// The updated order.
    pub async fn replace_lines(
        &self,
        id: &str,
        lines: Vec<OrderLine>,
        now: DateTime<Utc>,
    ) -> DbResult<Order> {
        let mut order = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", id))?;

        order.replace_lines(lines, now);

        debug!(id = %id, lines = order.lines.len(), total = %order.total, "Replacing order lines");

        let mut tx = self.pool.begin().await?;
        sqlx::query("UPDATE orders SET total_cents = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(&order.id)
            .bind(order.total.cents())
            .bind(order.updated_at)
            .execute(&mut *tx)
            .await?;
        write_lines(&mut tx, &order).await?;
        tx.commit().await?;

        Ok(order)
    }

    /// Writes the editable header fields: date, status, reference, notes.
    pub async fn update_header(&self, order: &Order) -> DbResult<()> {
        debug!(id = %order.id, status = order.status.as_str(), "Updating order header");

        let result = sqlx::query(
            r#"
            UPDATE orders SET
                date = ?2,
                status = ?3,
                reference = ?4,
                notes = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
        )
        .bind(&order.id)
        .bind(order.date)
        .bind(order.status)
        .bind(&order.reference)
        .bind(&order.notes)
        .bind(order.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", &order.id));
        }

        Ok(())
    }

    /// Gets an order with its lines.
    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        let sql = format!("SELECT {} FROM orders o WHERE o.id = ?1", ORDER_COLUMNS);
        let Some(record) = sqlx::query_as::<_, OrderRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
        else {
            return Ok(None);
        };

        let sql = format!(
            "SELECT {} FROM order_lines l WHERE l.order_id = ?1 ORDER BY l.position",
            LINE_COLUMNS
        );
        let lines: Vec<LineRecord> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_all(&self.pool)
            .await?;

        Ok(assemble(vec![record], lines).pop())
    }

    /// All orders of a client, newest first.
    pub async fn list_for_client(&self, client_id: &str) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {} FROM orders o WHERE o.client_id = ?1 ORDER BY o.date DESC",
            ORDER_COLUMNS
        );
        let records: Vec<OrderRecord> = sqlx::query_as(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM order_lines l \
             INNER JOIN orders o ON o.id = l.order_id \
             WHERE o.client_id = ?1 ORDER BY l.order_id, l.position",
            LINE_COLUMNS
        );
        let lines: Vec<LineRecord> = sqlx::query_as(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(assemble(records, lines))
    }

    /// Every order, newest first.
    pub async fn list_all(&self) -> DbResult<Vec<Order>> {
        let sql = format!("SELECT {} FROM orders o ORDER BY o.date DESC", ORDER_COLUMNS);
        let records: Vec<OrderRecord> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        let sql = format!(
            "SELECT {} FROM order_lines l ORDER BY l.order_id, l.position",
            LINE_COLUMNS
        );
        let lines: Vec<LineRecord> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(assemble(records, lines))
    }

    /// Orders dated in `[start, end)`, newest first.
    pub async fn list_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<Vec<Order>> {
        let sql = format!(
            "SELECT {} FROM orders o WHERE o.date >= ?1 AND o.date < ?2 ORDER BY o.date DESC",
            ORDER_COLUMNS
        );
        let records: Vec<OrderRecord> = sqlx::query_as(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {} FROM order_lines l \
             INNER JOIN orders o ON o.id = l.order_id \
             WHERE o.date >= ?1 AND o.date < ?2 ORDER BY l.order_id, l.position",
            LINE_COLUMNS
        );
        let lines: Vec<LineRecord> = sqlx::query_as(&sql)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        Ok(assemble(records, lines))
    }

    /// Deletes an order and its lines.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting order");

        let result = sqlx::query("DELETE FROM orders WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", id));
        }

        Ok(())
    }

    /// Counts orders.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

async fn insert_header(tx: &mut Transaction<'_, Sqlite>, order: &Order) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (
            id, client_id, date, status, reference, notes,
            total_cents, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&order.id)
    .bind(&order.client_id)
    .bind(order.date)
    .bind(order.status)
    .bind(&order.reference)
    .bind(&order.notes)
    .bind(order.total.cents())
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Replaces the stored lines of `order` with `order.lines`.
async fn write_lines(tx: &mut Transaction<'_, Sqlite>, order: &Order) -> DbResult<()> {
    sqlx::query("DELETE FROM order_lines WHERE order_id = ?1")
        .bind(&order.id)
        .execute(&mut **tx)
        .await?;

    for (position, line) in order.lines.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_lines (
                order_id, position, product, quantity,
                unit_price_cents, discount_bps, line_total_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&order.id)
        .bind(position as i64)
        .bind(&line.product)
        .bind(line.quantity)
        .bind(line.unit_price.cents())
        .bind(line.discount.bps() as i64)
        .bind(line.line_total.cents())
        .execute(&mut **tx)
        .await?;
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use botica_core::Client;
    use chrono::TimeZone;

    fn at(m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, m, d, 10, 0, 0).unwrap()
    }

    fn line(product: &str, qty: i64, cents: i64) -> OrderLine {
        OrderLine::new(product, qty, Money::from_cents(cents), Percentage::zero())
    }

    async fn db_with_client() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.clients()
            .insert(&Client::new("c1", "Farmacia Sol", at(1, 1)))
            .await
            .unwrap();
        db
    }

    fn order(id: &str, date: DateTime<Utc>, lines: Vec<OrderLine>) -> Order {
        Order::new(id, "c1", date, OrderStatus::Confirmed, lines, date)
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let db = db_with_client().await;
        let repo = db.orders();

        let mut o = order("o1", at(2, 3), vec![line("A", 2, 150), line("B", 1, 999)]);
        o.lines[1].discount = Percentage::from_percentage(10.0);
        o.reference = Some("ALB-1".to_string());
        let stored = repo.insert(&o).await.unwrap();

        assert_eq!(stored.total.cents(), 300 + 899);

        let loaded = repo.get("o1").await.unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.lines[0].product, "A");
        assert_eq!(loaded.lines[1].discount.bps(), 1000);
    }

    #[tokio::test]
    async fn test_insert_for_missing_client_fails() {
        let db = db_with_client().await;
        let mut o = order("o1", at(2, 3), vec![line("A", 1, 1)]);
        o.client_id = "ghost".to_string();

        let err = db.orders().insert(&o).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
        assert_eq!(db.orders().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_replace_lines_recomputes_total() {
        let db = db_with_client().await;
        let repo = db.orders();
        repo.insert(&order("o1", at(2, 3), vec![line("A", 1, 100)])).await.unwrap();

        let updated = repo
            .replace_lines("o1", vec![line("B", 3, 250), line("C", 1, 5)], at(2, 4))
            .await
            .unwrap();

        assert_eq!(updated.total.cents(), 755);
        assert_eq!(updated.updated_at, at(2, 4));

        let loaded = repo.get("o1").await.unwrap().unwrap();
        assert_eq!(loaded.lines.len(), 2);
        assert_eq!(loaded.total.cents(), 755);

        assert!(matches!(
            repo.replace_lines("nope", vec![], at(2, 4)).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_header() {
        let db = db_with_client().await;
        let repo = db.orders();
        let mut o = repo.insert(&order("o1", at(2, 3), vec![line("A", 1, 100)])).await.unwrap();

        o.status = OrderStatus::Draft;
        o.notes = Some("llamar antes".to_string());
        o.date = at(2, 10);
        repo.update_header(&o).await.unwrap();

        let loaded = repo.get("o1").await.unwrap().unwrap();
        assert_eq!(loaded.status, OrderStatus::Draft);
        assert_eq!(loaded.notes.as_deref(), Some("llamar antes"));
        assert_eq!(loaded.date, at(2, 10));
        assert_eq!(loaded.lines.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_replaces_lines() {
        let db = db_with_client().await;
        let repo = db.orders();

        let first = order("o1", at(2, 3), vec![line("A", 1, 100), line("B", 1, 100)]);
        assert_eq!(repo.upsert(&first).await.unwrap(), MergeOutcome::Created);

        let mut second = order("o1", at(2, 3), vec![line("A", 5, 100)]);
        second.created_at = at(3, 1);
        assert_eq!(repo.upsert(&second).await.unwrap(), MergeOutcome::Updated);

        let loaded = repo.get("o1").await.unwrap().unwrap();
        assert_eq!(loaded.lines.len(), 1);
        assert_eq!(loaded.total.cents(), 500);
        assert_eq!(loaded.created_at, at(2, 3));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_keeps_notes_missing_from_incoming() {
        let db = db_with_client().await;
        let repo = db.orders();

        let mut first = order("o1", at(2, 3), vec![line("A", 1, 100)]);
        first.reference = Some("ALB-1".to_string());
        first.notes = Some("entregar por la tarde".to_string());
        repo.upsert(&first).await.unwrap();

        let mut second = order("o1", at(2, 3), vec![line("A", 2, 100)]);
        second.status = OrderStatus::Draft;
        repo.upsert(&second).await.unwrap();

        let loaded = repo.get("o1").await.unwrap().unwrap();
        assert_eq!(loaded.notes.as_deref(), Some("entregar por la tarde"));
        assert_eq!(loaded.reference.as_deref(), Some("ALB-1"));
        assert_eq!(loaded.status, OrderStatus::Draft);
        assert_eq!(loaded.total.cents(), 200);
    }

    #[tokio::test]
    async fn test_listing() {
        let db = db_with_client().await;
        let repo = db.orders();
        repo.insert(&order("jan", at(1, 15), vec![line("A", 1, 100)])).await.unwrap();
        repo.insert(&order("apr", at(4, 2), vec![line("A", 2, 100)])).await.unwrap();
        repo.insert(&order("may", at(5, 20), vec![line("A", 3, 100)])).await.unwrap();

        let all = repo.list_for_client("c1").await.unwrap();
        let ids: Vec<&str> = all.iter().map(|o| o.id.as_str()).collect();
        assert_eq!(ids, vec!["may", "apr", "jan"]);
        assert!(all.iter().all(|o| o.lines.len() == 1));

        let q2 = repo
            .list_between(
                Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2026, 7, 1, 0, 0, 0).unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(q2.len(), 2);
        assert_eq!(q2.iter().map(|o| o.total.cents()).sum::<i64>(), 500);

        assert_eq!(repo.list_all().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_delete_cascades() {
        let db = db_with_client().await;
        let repo = db.orders();
        repo.insert(&order("o1", at(2, 3), vec![line("A", 1, 100)])).await.unwrap();
        repo.insert(&order("o2", at(2, 4), vec![line("A", 1, 100)])).await.unwrap();

        repo.delete("o1").await.unwrap();
        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_lines")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(lines, 1);

        db.clients().delete("c1").await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        let lines: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM order_lines")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(lines, 0);
    }
}
