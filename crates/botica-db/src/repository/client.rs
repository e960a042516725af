//! # Client Repository
//!
//! Database operations for clients (pharmacies).
//!
//! ## Keyed Upsert
//! ```text
//! incoming Client (id = client_key(code))
//!      │
//!      ├── row with same id?    ──► merge into it
//!      ├── row with same code?  ──► merge into it (keeps the older id)
//!      └── neither              ──► insert
//! ```
//!
//! Deleting a client cascades to its orders, order lines and visits.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use botica_core::merge::{merge_or_insert, normalize_code, MergeOutcome};
use botica_core::Client;

const CLIENT_COLUMNS: &str = "id, code, name, address, city, province, postal_code, \
     phone, email, contact_person, notes, created_at, updated_at";

/// Row shape of the `clients` table.
#[derive(Debug, sqlx::FromRow)]
struct ClientRecord {
    id: String,
    code: Option<String>,
    name: String,
    address: Option<String>,
    city: Option<String>,
    province: Option<String>,
    postal_code: Option<String>,
    phone: Option<String>,
    email: Option<String>,
    contact_person: Option<String>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRecord> for Client {
    fn from(r: ClientRecord) -> Self {
        Client {
            id: r.id,
            code: r.code,
            name: r.name,
            address: r.address,
            city: r.city,
            province: r.province,
            postal_code: r.postal_code,
            phone: r.phone,
            email: r.email,
            contact_person: r.contact_person,
            notes: r.notes,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a new client.
    ///
    /// ## Errors
    /// `UniqueViolation` when another client already has the same code.
    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, name = %client.name, "Inserting client");

        let result = sqlx::query(
            r#"
            INSERT INTO clients (
                id, code, name, address, city, province, postal_code,
                phone, email, contact_person, notes, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&client.id)
        .bind(&client.code)
        .bind(&client.name)
        .bind(&client.address)
        .bind(&client.city)
        .bind(&client.province)
        .bind(&client.postal_code)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.contact_person)
        .bind(&client.notes)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(err) => match DbError::from(err) {
                DbError::UniqueViolation { field, .. } if field.ends_with("code") => Err(
                    DbError::duplicate("code", client.code.clone().unwrap_or_default()),
                ),
                other => Err(other),
            },
        }
    }

    /// Updates every field of an existing client (identity and creation
    /// time excepted).
    pub async fn update(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, "Updating client");

        let result = sqlx::query(
            r#"
            UPDATE clients SET
                code = ?2,
                name = ?3,
                address = ?4,
                city = ?5,
                province = ?6,
                postal_code = ?7,
                phone = ?8,
                email = ?9,
                contact_person = ?10,
                notes = ?11,
                updated_at = ?12
            WHERE id = ?1
            "#,
        )
        .bind(&client.id)
        .bind(&client.code)
        .bind(&client.name)
        .bind(&client.address)
        .bind(&client.city)
        .bind(&client.province)
        .bind(&client.postal_code)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.contact_person)
        .bind(&client.notes)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", &client.id));
        }

        Ok(())
    }

    /// Keyed merge: updates the client with the same id (or, failing that,
    /// the same code) field by field, or inserts it.
    pub async fn upsert_by_key(&self, incoming: Client) -> DbResult<(Client, MergeOutcome)> {
        let mut existing = self.get(&incoming.id).await?;
        if existing.is_none() {
            if let Some(code) = incoming.code.as_deref() {
                existing = self.find_by_code(code).await?;
            }
        }

        let (merged, outcome) = merge_or_insert(existing, incoming);
        match outcome {
            MergeOutcome::Created => self.insert(&merged).await?,
            MergeOutcome::Updated => self.update(&merged).await?,
        }

        debug!(id = %merged.id, outcome = ?outcome, "Client upserted");
        Ok((merged, outcome))
    }

    /// Gets a client by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Client>> {
        let sql = format!("SELECT {} FROM clients WHERE id = ?1", CLIENT_COLUMNS);
        let record: Option<ClientRecord> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Client::from))
    }

    /// Gets a client by import code (case-insensitive).
    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Client>> {
        let sql = format!(
            "SELECT {} FROM clients WHERE UPPER(code) = ?1",
            CLIENT_COLUMNS
        );
        let record: Option<ClientRecord> = sqlx::query_as(&sql)
            .bind(normalize_code(code))
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(Client::from))
    }

    /// Resolves what a user typed: an id first, then a code.
    pub async fn find(&self, id_or_code: &str) -> DbResult<Option<Client>> {
        let id_or_code = id_or_code.trim();
        match self.get(id_or_code).await? {
            Some(client) => Ok(Some(client)),
            None => self.find_by_code(id_or_code).await,
        }
    }

    /// Lists clients by name.
    pub async fn list(&self, limit: u32) -> DbResult<Vec<Client>> {
        let sql = format!(
            "SELECT {} FROM clients ORDER BY name COLLATE NOCASE LIMIT ?1",
            CLIENT_COLUMNS
        );
        let records: Vec<ClientRecord> = sqlx::query_as(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(records.into_iter().map(Client::from).collect())
    }

    /// Every client, by name.
    pub async fn list_all(&self) -> DbResult<Vec<Client>> {
        let sql = format!(
            "SELECT {} FROM clients ORDER BY name COLLATE NOCASE",
            CLIENT_COLUMNS
        );
        let records: Vec<ClientRecord> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        Ok(records.into_iter().map(Client::from).collect())
    }

    /// Searches clients by code, name and city (prefix match on each word).
    ///
    /// ## How It Works
    /// Every word of the query becomes a quoted FTS5 prefix term, so
    /// `"sol sev"` matches "Farmacia **Sol**" in "**Sev**illa". An empty
    /// query lists clients by name.
    pub async fn search(&self, query: &str, limit: u32) -> DbResult<Vec<Client>> {
        let query = query.trim();

        debug!(query = %query, limit = %limit, "Searching clients");

        let Some(fts_query) = fts_prefix_query(query) else {
            return self.list(limit).await;
        };

        let records: Vec<ClientRecord> = sqlx::query_as(
            r#"
            SELECT
                c.id, c.code, c.name, c.address, c.city, c.province, c.postal_code,
                c.phone, c.email, c.contact_person, c.notes, c.created_at, c.updated_at
            FROM clients c
            INNER JOIN clients_fts fts ON c.rowid = fts.rowid
            WHERE clients_fts MATCH ?1
            ORDER BY rank
            LIMIT ?2
            "#,
        )
        .bind(fts_query)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        debug!(count = records.len(), "Search returned clients");
        Ok(records.into_iter().map(Client::from).collect())
    }

    /// Deletes a client with its orders and visits.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting client");

        let result = sqlx::query("DELETE FROM clients WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Client", id));
        }

        Ok(())
    }

    /// Counts clients.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

/// Builds `"w1"* "w2"*` from the words of `query`; `None` when empty.
fn fts_prefix_query(query: &str) -> Option<String> {
    let terms: Vec<String> = query
        .split_whitespace()
        .map(|word| format!("\"{}\"*", word.replace('"', "\"\"")))
        .collect();

    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" "))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use botica_core::merge::{client_key, random_key};
    use chrono::TimeZone;

    fn ts(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, day, 9, 0, 0).unwrap()
    }

    fn coded(code: &str, name: &str, city: Option<&str>) -> Client {
        let mut client = Client::new(client_key(code), name, ts(1));
        client.code = Some(code.to_string());
        client.city = city.map(str::to_string);
        client
    }

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[test]
    fn test_fts_prefix_query() {
        assert_eq!(fts_prefix_query("  "), None);
        assert_eq!(fts_prefix_query("sol"), Some("\"sol\"*".to_string()));
        assert_eq!(
            fts_prefix_query("F-01 \"x"),
            Some("\"F-01\"* \"\"\"x\"*".to_string())
        );
    }

    #[tokio::test]
    async fn test_insert_get_and_find_by_code() {
        let db = db().await;
        let repo = db.clients();
        let client = coded("F-01", "Farmacia Sol", Some("Sevilla"));

        repo.insert(&client).await.unwrap();

        assert_eq!(repo.get(&client.id).await.unwrap(), Some(client.clone()));
        assert_eq!(repo.find_by_code("f-01").await.unwrap(), Some(client.clone()));
        assert_eq!(repo.find("F-01").await.unwrap(), Some(client.clone()));
        assert_eq!(repo.find(&client.id).await.unwrap(), Some(client));
        assert_eq!(repo.find("nope").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let db = db().await;
        let repo = db.clients();
        repo.insert(&coded("F-01", "A", None)).await.unwrap();

        let mut other = Client::new(random_key(), "B", ts(1));
        other.code = Some("F-01".to_string());

        let err = repo.insert(&other).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { ref field, .. } if field == "code"));
    }

    #[tokio::test]
    async fn test_upsert_by_key_merges_fields() {
        let db = db().await;
        let repo = db.clients();

        let mut first = coded("F-01", "Farmacia Sol", Some("Sevilla"));
        first.phone = Some("955000000".to_string());
        let (_, outcome) = repo.upsert_by_key(first).await.unwrap();
        assert_eq!(outcome, MergeOutcome::Created);

        let mut second = coded("F-01", "Farmacia del Sol", None);
        second.updated_at = ts(5);
        let (merged, outcome) = repo.upsert_by_key(second).await.unwrap();

        assert_eq!(outcome, MergeOutcome::Updated);
        assert_eq!(merged.name, "Farmacia del Sol");
        assert_eq!(merged.city.as_deref(), Some("Sevilla"));
        assert_eq!(merged.phone.as_deref(), Some("955000000"));
        assert_eq!(merged.created_at, ts(1));
        assert_eq!(merged.updated_at, ts(5));
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_upsert_matches_manual_client_by_code() {
        let db = db().await;
        let repo = db.clients();

        let mut manual = Client::new(random_key(), "Farmacia Luna", ts(1));
        manual.code = Some("F-09".to_string());
        repo.insert(&manual).await.unwrap();

        let (merged, outcome) = repo
            .upsert_by_key(coded("F-09", "Farmacia Luna", Some("Cádiz")))
            .await
            .unwrap();

        assert_eq!(outcome, MergeOutcome::Updated);
        assert_eq!(merged.id, manual.id);
        assert_eq!(repo.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_search() {
        let db = db().await;
        let repo = db.clients();
        repo.insert(&coded("F-01", "Farmacia Sol", Some("Sevilla"))).await.unwrap();
        repo.insert(&coded("F-02", "Farmacia Luna", Some("Cádiz"))).await.unwrap();
        repo.insert(&coded("F-03", "Parafarmacia Soledad", Some("Huelva"))).await.unwrap();

        let hits = repo.search("sol", 10).await.unwrap();
        let names: Vec<&str> = hits.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(hits.len(), 2);
        assert!(names.contains(&"Farmacia Sol"));
        assert!(names.contains(&"Parafarmacia Soledad"));

        assert_eq!(repo.search("sol sev", 10).await.unwrap().len(), 1);
        assert_eq!(repo.search("", 10).await.unwrap().len(), 3);

        // renamed clients are re-indexed
        let mut luna = repo.find("F-02").await.unwrap().unwrap();
        luna.name = "Farmacia Estrella".to_string();
        repo.update(&luna).await.unwrap();
        assert!(repo.search("luna", 10).await.unwrap().is_empty());
        assert_eq!(repo.search("estrella", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = db().await;
        let repo = db.clients();
        let client = coded("F-01", "Farmacia Sol", None);
        repo.insert(&client).await.unwrap();

        repo.delete(&client.id).await.unwrap();
        assert_eq!(repo.count().await.unwrap(), 0);
        assert!(repo.search("sol", 10).await.unwrap().is_empty());
        assert!(matches!(
            repo.delete(&client.id).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
