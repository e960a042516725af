//! # Import / Export
//!
//! Spreadsheet (CSV) import and export, and JSON backup/restore.
//!
//! ## Import Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CSV text                                                               │
//! │     │  strip BOM, sniff ';' vs ',' delimiter                            │
//! │     ▼                                                                   │
//! │  normalize headers (lowercase) → serde rows (aliases: codigo|code ...)  │
//! │     │  malformed records: warn + skip                                   │
//! │     ▼                                                                   │
//! │  botica_core::import (rows → Client / grouped Order)                    │
//! │     │                                                                   │
//! │     ▼                                                                   │
//! │  keyed upsert (deterministic ids) → ImportReport                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Importing the same file twice leaves the counts unchanged.
//!
//! All functions work on in-memory text; the caller owns file access.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::settings::overlay_json;
use botica_core::import::{
    group_order_rows, normalize_header, ClientRow, ImportedOrder, OrderRow,
};
use botica_core::merge::{client_key, MergeOutcome};
use botica_core::{Client, Order, Settings, Visit};

/// Backup layout version written by [`export_json`].
pub const BACKUP_FORMAT_VERSION: u32 = 1;

const CLIENT_HEADERS: [&str; 11] = [
    "codigo",
    "nombre",
    "direccion",
    "ciudad",
    "provincia",
    "cp",
    "telefono",
    "email",
    "contacto",
    "notas",
    "id",
];

const ORDER_HEADERS: [&str; 12] = [
    "codigo",
    "nombre",
    "fecha",
    "referencia",
    "estado",
    "producto",
    "cantidad",
    "precio",
    "descuento",
    "total",
    "pedido_id",
    "cliente_id",
];

// =============================================================================
// Reports
// =============================================================================

/// Outcome counts of an import or restore step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    /// Placeholder clients created for unknown codes (order import only).
    pub clients_created: usize,
}

impl ImportReport {
    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Created => self.created += 1,
            MergeOutcome::Updated => self.updated += 1,
        }
    }
}

/// Outcome of [`restore_json`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RestoreReport {
    pub clients: ImportReport,
    pub orders: ImportReport,
    pub visits: ImportReport,
    pub settings_restored: bool,
}

// =============================================================================
// CSV Reading
// =============================================================================

/// `;` when the header line has more semicolons than commas.
fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().next().unwrap_or("");
    if header.matches(';').count() > header.matches(',').count() {
        b';'
    } else {
        b','
    }
}

/// Reads every record into `T`, skipping (and counting) malformed ones.
fn read_rows<T: DeserializeOwned>(csv_text: &str) -> DbResult<(Vec<T>, usize)> {
    let text = csv_text.trim_start_matches('\u{FEFF}');

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(sniff_delimiter(text))
        .from_reader(text.as_bytes());

    let headers: csv::StringRecord = reader.headers()?.iter().map(normalize_header).collect();
    debug!(headers = ?headers.iter().collect::<Vec<_>>(), "CSV headers");
    reader.set_headers(headers);

    let mut rows = Vec::new();
    let mut malformed = 0;

    for (index, result) in reader.deserialize::<T>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(err) => {
                // +2: header line, 1-based
                warn!(line = index + 2, error = %err, "Skipping malformed CSV record");
                malformed += 1;
            }
        }
    }

    Ok((rows, malformed))
}

// =============================================================================
// CSV Import
// =============================================================================

/// Imports clients, upserting by code.
///
/// Rows with no code or no name are skipped.
pub async fn import_clients_csv(
    db: &Database,
    csv_text: &str,
    now: DateTime<Utc>,
) -> DbResult<ImportReport> {
    let (rows, malformed) = read_rows::<ClientRow>(csv_text)?;
    let mut report = ImportReport {
        skipped: malformed,
        ..Default::default()
    };

    let clients = db.clients();
    for row in rows {
        let Some(client) = row.into_client(now) else {
            report.skipped += 1;
            continue;
        };
        let (_, outcome) = clients.upsert_by_key(client).await?;
        report.record(outcome);
    }

    info!(
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        "Client import finished"
    );
    Ok(report)
}

/// Imports orders (one CSV row per line), upserting by the derived order key.
///
/// Clients are matched by the row's client id, then by code. Unknown
/// clients get a placeholder named after the row's `nombre` column, or the
/// code itself.
pub async fn import_orders_csv(
    db: &Database,
    csv_text: &str,
    now: DateTime<Utc>,
) -> DbResult<ImportReport> {
    let (rows, malformed) = read_rows::<OrderRow>(csv_text)?;
    let grouped = group_order_rows(rows, now);

    let unrecognized: BTreeSet<&str> = grouped
        .unrecognized_statuses
        .iter()
        .map(String::as_str)
        .collect();
    for status in unrecognized {
        warn!(status = %status, "Unrecognized order status; treating as confirmed");
    }

    let mut report = ImportReport {
        skipped: malformed + grouped.skipped_rows,
        ..Default::default()
    };

    let clients = db.clients();
    let orders = db.orders();
    let mut client_ids: HashMap<(Option<String>, Option<String>), String> = HashMap::new();

    for imported in grouped.orders {
        let lookup = (imported.client_id.clone(), imported.client_code.clone());
        let client_id = match client_ids.get(&lookup) {
            Some(id) => id.clone(),
            None => {
                let id = match find_client(db, &imported).await? {
                    Some(existing) => existing.id,
                    None => {
                        let stub = placeholder_client(&imported, now);
                        clients.insert(&stub).await?;
                        report.clients_created += 1;
                        info!(id = %stub.id, code = ?stub.code, "Created placeholder client");
                        stub.id
                    }
                };
                client_ids.insert(lookup, id.clone());
                id
            }
        };

        let mut order = imported.order;
        order.client_id = client_id;
        report.record(orders.upsert(&order).await?);
    }

    info!(
        created = report.created,
        updated = report.updated,
        skipped = report.skipped,
        clients_created = report.clients_created,
        "Order import finished"
    );
    Ok(report)
}

async fn find_client(db: &Database, imported: &ImportedOrder) -> DbResult<Option<Client>> {
    let clients = db.clients();
    if let Some(id) = imported.client_id.as_deref() {
        if let Some(client) = clients.get(id).await? {
            return Ok(Some(client));
        }
    }
    match imported.client_code.as_deref() {
        Some(code) => clients.find_by_code(code).await,
        None => Ok(None),
    }
}

fn placeholder_client(imported: &ImportedOrder, now: DateTime<Utc>) -> Client {
    let id = match (&imported.client_id, &imported.client_code) {
        (Some(id), _) => id.clone(),
        (None, Some(code)) => client_key(code),
        (None, None) => imported.order.client_id.clone(),
    };
    let name = imported
        .client_name
        .clone()
        .or_else(|| imported.client_code.clone())
        .unwrap_or_else(|| id.clone());

    let mut stub = Client::new(id, name, now);
    stub.code = imported.client_code.clone();
    stub
}

// =============================================================================
// CSV Export
// =============================================================================

fn finish_csv(writer: csv::Writer<Vec<u8>>) -> DbResult<String> {
    let bytes = writer
        .into_inner()
        .map_err(|e| DbError::Csv(e.to_string()))?;
    let body = String::from_utf8(bytes).map_err(|e| DbError::Csv(e.to_string()))?;
    // BOM so spreadsheet programs pick UTF-8
    Ok(format!("\u{FEFF}{}", body))
}

fn opt(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}

/// Exports every client, one row each, with the import headers.
pub async fn export_clients_csv(db: &Database) -> DbResult<(String, usize)> {
    let clients = db.clients().list_all().await?;
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(CLIENT_HEADERS)?;
    for c in &clients {
        writer.write_record([
            opt(&c.code),
            c.name.as_str(),
            opt(&c.address),
            opt(&c.city),
            opt(&c.province),
            opt(&c.postal_code),
            opt(&c.phone),
            opt(&c.email),
            opt(&c.contact_person),
            opt(&c.notes),
            c.id.as_str(),
        ])?;
    }

    info!(count = clients.len(), "Exported clients");
    Ok((finish_csv(writer)?, clients.len()))
}

/// Exports every order line, oldest order first, with the import headers
/// (plus a `total` column that import ignores). The order and client ids
/// are written too, so re-importing the file matches the same records.
pub async fn export_orders_csv(db: &Database) -> DbResult<(String, usize)> {
    let clients: HashMap<String, Client> = db
        .clients()
        .list_all()
        .await?
        .into_iter()
        .map(|c| (c.id.clone(), c))
        .collect();

    let mut orders = db.orders().list_all().await?;
    orders.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(ORDER_HEADERS)?;

    for order in &orders {
        let client = clients.get(&order.client_id);
        let code = client.and_then(|c| c.code.as_deref()).unwrap_or("");
        let name = client.map(|c| c.name.as_str()).unwrap_or("");
        let date = order.date.to_rfc3339();

        for line in &order.lines {
            writer.write_record([
                code,
                name,
                date.as_str(),
                opt(&order.reference),
                order.status.as_str(),
                line.product.as_str(),
                line.quantity.to_string().as_str(),
                line.unit_price.to_decimal_string().as_str(),
                line.discount.percentage().to_string().as_str(),
                line.line_total.to_decimal_string().as_str(),
                order.id.as_str(),
                order.client_id.as_str(),
            ])?;
        }
    }

    info!(count = orders.len(), "Exported orders");
    Ok((finish_csv(writer)?, orders.len()))
}

// =============================================================================
// JSON Backup
// =============================================================================

#[derive(Serialize)]
struct BackupOut<'a> {
    format_version: u32,
    exported_at: DateTime<Utc>,
    clients: &'a [Client],
    orders: &'a [Order],
    visits: &'a [Visit],
    settings: &'a Settings,
}

/// Records are read one by one so a single bad record is skipped rather
/// than failing the whole file.
#[derive(Deserialize)]
struct BackupIn {
    #[serde(default)]
    clients: Vec<Value>,
    #[serde(default)]
    orders: Vec<Value>,
    #[serde(default)]
    visits: Vec<Value>,
    #[serde(default)]
    settings: Option<Value>,
}

/// Writes the whole database as pretty JSON.
pub async fn export_json(db: &Database, now: DateTime<Utc>) -> DbResult<String> {
    let snapshot = db.snapshot().await?;
    let backup = BackupOut {
        format_version: BACKUP_FORMAT_VERSION,
        exported_at: now,
        clients: &snapshot.clients,
        orders: &snapshot.orders,
        visits: &snapshot.visits,
        settings: &snapshot.settings,
    };

    let json = serde_json::to_string_pretty(&backup)?;
    info!(
        clients = snapshot.clients.len(),
        orders = snapshot.orders.len(),
        visits = snapshot.visits.len(),
        "Backup written"
    );
    Ok(json)
}

fn parse_record<T: DeserializeOwned>(kind: &str, value: Value) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(record) => Some(record),
        Err(err) => {
            warn!(kind = kind, error = %err, "Skipping unreadable backup record");
            None
        }
    }
}

/// Foreign key failures skip the record; anything else aborts.
fn skip_orphan<T>(kind: &str, id: &str, result: DbResult<T>) -> DbResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(DbError::ForeignKeyViolation { .. }) => {
            warn!(kind = kind, id = %id, "Skipping backup record with missing parent");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Upserts every record of a backup. Numeric fields are read leniently;
/// existing clients and orders are merged, visits are overwritten.
/// Settings targets are merged per quarter.
pub async fn restore_json(
    db: &Database,
    json_text: &str,
    now: DateTime<Utc>,
) -> DbResult<RestoreReport> {
    let backup: BackupIn = serde_json::from_str(json_text.trim_start_matches('\u{FEFF}'))?;
    let mut report = RestoreReport::default();

    let clients = db.clients();
    for value in backup.clients {
        match parse_record::<Client>("client", value) {
            Some(client) => {
                let (_, outcome) = clients.upsert_by_key(client).await?;
                report.clients.record(outcome);
            }
            None => report.clients.skipped += 1,
        }
    }

    let orders = db.orders();
    for value in backup.orders {
        let Some(order) = parse_record::<Order>("order", value) else {
            report.orders.skipped += 1;
            continue;
        };
        match skip_orphan("order", &order.id, orders.upsert(&order).await)? {
            Some(outcome) => report.orders.record(outcome),
            None => report.orders.skipped += 1,
        }
    }

    let visits = db.visits();
    for value in backup.visits {
        let Some(visit) = parse_record::<Visit>("visit", value) else {
            report.visits.skipped += 1;
            continue;
        };
        match skip_orphan("visit", &visit.id, visits.upsert(&visit).await)? {
            Some(outcome) => report.visits.record(outcome),
            None => report.visits.skipped += 1,
        }
    }

    if let Some(value) = backup.settings {
        let settings_repo = db.settings();
        let mut settings = settings_repo.load().await?;
        overlay_json(&value, &mut settings);
        settings_repo.save(&settings, now).await?;
        report.settings_restored = true;
    }

    info!(
        clients = report.clients.created + report.clients.updated,
        orders = report.orders.created + report.orders.updated,
        visits = report.visits.created + report.visits.updated,
        "Backup restored"
    );
    Ok(report)
}

// =============================================================================
// Unit Tests
// =============================================================================
