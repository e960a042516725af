//! # Import Normalization
//!
//! Turns spreadsheet rows into domain records. Reading the file is the
//! database crate's job; this module only sees already-split rows.
//!
//! ## Order Import Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CSV rows (one per product line)                                        │
//! │  codigo  fecha       referencia  estado     producto   cantidad  precio │
//! │  F-01    03/02/2026  ALB-77      enviado    Ibuprofeno 12        2,35   │
//! │  F-01    03/02/2026  ALB-77      enviado    Omeprazol  6         4,10   │
//! │  F-02    2026-02-05              borrador   Gasas      20        0,80   │
//! │                │                                                        │
//! │                ▼ group by (code, reference or date)                     │
//! │  ┌─────────────────────────┐   ┌─────────────────────────┐              │
//! │  │ F-01 / ALB-77           │   │ F-02 / 2026-02-05       │              │
//! │  │ Confirmed, 2 lines      │   │ Draft, 1 line           │              │
//! │  │ id = order_key(..)      │   │ id = order_key(..)      │              │
//! │  └─────────────────────────┘   └─────────────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Numbers are coerced, never rejected. Rows with no client code, no
//! readable date or no product are skipped and counted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::Deserialize;
use std::collections::HashMap;

use crate::coerce;
use crate::error::{CoreError, CoreResult};
use crate::merge::{client_key, normalize_code, order_key};
use crate::types::{Client, LineInput, Order, OrderLine, OrderStatus};
use crate::MAX_LINE_QUANTITY;

// =============================================================================
// Status Normalization
// =============================================================================

/// Whether a free-text status label was understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusMatch {
    Recognized,
    /// Unknown label, treated as confirmed.
    Defaulted,
}

/// Maps a free-text status label to [`OrderStatus`].
///
/// Blank means confirmed. Unknown labels are also confirmed, flagged as
/// [`StatusMatch::Defaulted`] so the caller can warn.
///
/// ```rust
/// use botica_core::import::{normalize_status, StatusMatch};
/// use botica_core::types::OrderStatus;
///
/// assert_eq!(normalize_status("Enviado"), (OrderStatus::Confirmed, StatusMatch::Recognized));
/// assert_eq!(normalize_status("borrador"), (OrderStatus::Draft, StatusMatch::Recognized));
/// assert_eq!(normalize_status("???"), (OrderStatus::Confirmed, StatusMatch::Defaulted));
/// ```
pub fn normalize_status(raw: &str) -> (OrderStatus, StatusMatch) {
    let label = raw.trim().to_lowercase();
    match label.as_str() {
        "" | "confirmed" | "confirmado" | "confirmada" | "exported" | "exportado" | "sent"
        | "enviado" | "enviada" | "servido" | "facturado" | "ok" => {
            (OrderStatus::Confirmed, StatusMatch::Recognized)
        }
        "draft" | "borrador" | "pending" | "pendiente" | "presupuesto" | "quote" => {
            (OrderStatus::Draft, StatusMatch::Recognized)
        }
        _ => (OrderStatus::Confirmed, StatusMatch::Defaulted),
    }
}

// =============================================================================
// Dates
// =============================================================================

/// Parses the date formats found in exported spreadsheets.
///
/// Accepts `YYYY-MM-DD`, `DD/MM/YYYY`, `DD-MM-YYYY`, `YYYY-MM-DD HH:MM[:SS]`
/// and RFC 3339. Dates without a time are midnight UTC.
///
/// ```rust
/// use botica_core::import::parse_import_date;
///
/// let a = parse_import_date("2026-02-03").unwrap();
/// let b = parse_import_date("03/02/2026").unwrap();
/// assert_eq!(a, b);
/// assert!(parse_import_date("mañana").is_none());
/// ```
pub fn parse_import_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&at));
        }
    }

    for format in ["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%Y/%m/%d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)));
        }
    }

    None
}

/// Lowercases and trims a CSV header, dropping a UTF-8 BOM.
pub fn normalize_header(raw: &str) -> String {
    raw.trim_start_matches('\u{FEFF}').trim().to_lowercase()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// =============================================================================
// Client Rows
// =============================================================================

/// One row of a client spreadsheet. Headers must be normalized with
/// [`normalize_header`] first.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientRow {
    /// Record id, written by exports. Matches the existing client directly.
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "codigo", alias = "código")]
    pub code: Option<String>,
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    #[serde(default, alias = "direccion", alias = "dirección")]
    pub address: Option<String>,
    #[serde(default, alias = "ciudad", alias = "poblacion", alias = "población")]
    pub city: Option<String>,
    #[serde(default, alias = "provincia")]
    pub province: Option<String>,
    #[serde(default, alias = "cp", alias = "codigo_postal")]
    pub postal_code: Option<String>,
    #[serde(default, alias = "telefono", alias = "teléfono")]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "contacto", alias = "contact_person")]
    pub contact: Option<String>,
    #[serde(default, alias = "notas")]
    pub notes: Option<String>,
}

impl ClientRow {
    /// Builds the client this row describes, keyed by its id when present,
    /// otherwise by its code. `None` when the row has neither, or no name.
    pub fn into_client(self, now: DateTime<Utc>) -> Option<Client> {
        let code = non_blank(self.code).map(|c| normalize_code(&c));
        let id = match (non_blank(self.id), code.as_deref()) {
            (Some(id), _) => id,
            (None, Some(code)) => client_key(code),
            (None, None) => return None,
        };
        let name = non_blank(self.name)?;

        let mut client = Client::new(id, name, now);
        client.code = code;
        client.address = non_blank(self.address);
        client.city = non_blank(self.city);
        client.province = non_blank(self.province);
        client.postal_code = non_blank(self.postal_code);
        client.phone = non_blank(self.phone);
        client.email = non_blank(self.email);
        client.contact_person = non_blank(self.contact);
        client.notes = non_blank(self.notes);
        Some(client)
    }
}

// =============================================================================
// Order Rows
// =============================================================================

/// One row of an order spreadsheet: a single product line.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderRow {
    #[serde(default, alias = "codigo", alias = "código", alias = "cliente")]
    pub code: Option<String>,
    /// Client name, used only when the code is unknown.
    #[serde(default, alias = "nombre")]
    pub name: Option<String>,
    #[serde(default, alias = "fecha")]
    pub date: Option<String>,
    #[serde(default, alias = "referencia", alias = "albaran", alias = "albarán")]
    pub reference: Option<String>,
    #[serde(default, alias = "estado")]
    pub status: Option<String>,
    #[serde(default, alias = "producto")]
    pub product: Option<String>,
    #[serde(default, alias = "cantidad", alias = "unidades")]
    pub quantity: Option<String>,
    #[serde(default, alias = "precio", alias = "unit_price")]
    pub price: Option<String>,
    #[serde(default, alias = "descuento", alias = "dto")]
    pub discount: Option<String>,
    /// Order id, written by exports. Groups rows one-to-one with orders.
    #[serde(default, alias = "pedido_id")]
    pub order_id: Option<String>,
    /// Client id, written by exports for clients without a code.
    #[serde(default, alias = "cliente_id")]
    pub client_id: Option<String>,
}

impl OrderRow {
    fn line(&self) -> OrderLine {
        let text = |field: &Option<String>| field.as_deref().unwrap_or("").to_string();
        OrderLine::new(
            text(&self.product).trim(),
            coerce::coerce_i64(&text(&self.quantity))
                .clamp(-MAX_LINE_QUANTITY, MAX_LINE_QUANTITY),
            coerce::coerce_money(&text(&self.price)),
            coerce::coerce_percentage(&text(&self.discount)),
        )
    }
}

/// An order assembled from import rows, with the client it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportedOrder {
    /// Normalized client code.
    pub client_code: Option<String>,
    /// Client id carried by the row, tried before the code.
    pub client_id: Option<String>,
    /// First non-blank client name seen for this order.
    pub client_name: Option<String>,
    pub order: Order,
}

/// Result of [`group_order_rows`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupedOrders {
    /// Orders in first-seen sequence.
    pub orders: Vec<ImportedOrder>,
    pub skipped_rows: usize,
    /// Status labels that were not recognized (one entry per order).
    pub unrecognized_statuses: Vec<String>,
}

/// Groups line rows into orders.
///
/// Rows carrying an order id (exports write one) are grouped by that id
/// and keep it. Other rows group by (client code, reference), falling back
/// to (client code, date) when there is no reference, and the order id is
/// derived from the same pair, so importing a file twice yields the same
/// ids. Status and date come from the first row of each group.
pub fn group_order_rows(rows: Vec<OrderRow>, now: DateTime<Utc>) -> GroupedOrders {
    let mut grouped = GroupedOrders::default();
    let mut index: HashMap<(String, String), usize> = HashMap::new();

    for row in rows {
        let code = row
            .code
            .as_deref()
            .map(normalize_code)
            .filter(|c| !c.is_empty());
        let client_id = non_blank(row.client_id.clone());
        let order_id = non_blank(row.order_id.clone());
        let date = row.date.as_deref().and_then(parse_import_date);
        let has_product = row
            .product
            .as_deref()
            .map(|p| !p.trim().is_empty())
            .unwrap_or(false);

        let owner = code.clone().or_else(|| client_id.clone());
        let (Some(date), Some(owner), true) = (date, owner, has_product) else {
            grouped.skipped_rows += 1;
            continue;
        };

        let token = match (&order_id, row.reference.as_deref().map(str::trim)) {
            (Some(id), _) => id.clone(),
            (None, Some(reference)) if !reference.is_empty() => reference.to_string(),
            _ => date.format("%Y-%m-%d").to_string(),
        };

        let line = row.line();
        let key = (owner.clone(), token.clone());

        if let Some(&position) = index.get(&key) {
            let entry = &mut grouped.orders[position];
            if entry.client_name.is_none() {
                entry.client_name = non_blank(row.name);
            }
            entry.order.lines.push(line);
            entry.order.recompute_totals();
            continue;
        }

        let raw_status = row.status.clone().unwrap_or_default();
        let (status, matched) = normalize_status(&raw_status);
        if matched == StatusMatch::Defaulted {
            grouped.unrecognized_statuses.push(raw_status.trim().to_string());
        }

        let id = order_id.unwrap_or_else(|| order_key(&owner, &token));
        let owner_id = match (&client_id, &code) {
            (Some(id), _) => id.clone(),
            (None, Some(code)) => client_key(code),
            (None, None) => owner,
        };
        let mut order = Order::new(
            id,
            owner_id,
            date,
            status,
            vec![line],
            now,
        );
        order.reference = non_blank(row.reference);

        index.insert(key, grouped.orders.len());
        grouped.orders.push(ImportedOrder {
            client_code: code,
            client_id,
            client_name: non_blank(row.name),
            order,
        });
    }

    grouped
}

// =============================================================================
// Line Specs
// =============================================================================

/// Parses a `product:quantity:price[:discount]` line spec as typed on the
/// command line. Unlike imports, unreadable numbers are errors.
///
/// ```rust
/// use botica_core::import::parse_line_spec;
///
/// let line = parse_line_spec("Ibuprofeno 600:12:2,35:5").unwrap();
/// assert_eq!(line.quantity, 12);
/// assert_eq!(line.unit_price.cents(), 235);
/// assert_eq!(line.discount.bps(), 500);
/// assert!(parse_line_spec("Ibuprofeno:doce:2").is_err());
/// ```
pub fn parse_line_spec(spec: &str) -> CoreResult<LineInput> {
    let invalid = |reason: &str| CoreError::InvalidLineSpec {
        spec: spec.to_string(),
        reason: reason.to_string(),
    };

    let parts: Vec<&str> = spec.split(':').map(str::trim).collect();
    if !(3..=4).contains(&parts.len()) {
        return Err(invalid("expected product:quantity:price[:discount]"));
    }

    let product = parts[0];
    if product.is_empty() {
        return Err(invalid("product is empty"));
    }

    let quantity = parts[1]
        .parse::<i64>()
        .map_err(|_| invalid("quantity is not a whole number"))?;

    let unit_price = coerce::parse_cents(parts[2])
        .map(crate::money::Money::from_cents)
        .ok_or_else(|| invalid("price is not a number"))?;

    let discount = match parts.get(3) {
        Some(raw) if !raw.is_empty() => coerce::parse_number(raw)
            .map(crate::types::Percentage::from_percentage)
            .ok_or_else(|| invalid("discount is not a number"))?,
        _ => crate::types::Percentage::zero(),
    };

    Ok(LineInput {
        product: product.to_string(),
        quantity,
        unit_price,
        discount,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    fn row(code: &str, date: &str, reference: &str, product: &str, qty: &str, price: &str) -> OrderRow {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        OrderRow {
            code: opt(code),
            date: opt(date),
            reference: opt(reference),
            product: opt(product),
            quantity: opt(qty),
            price: opt(price),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_status_families() {
        for label in ["confirmed", "Exportado", " ENVIADO ", ""] {
            assert_eq!(normalize_status(label).0, OrderStatus::Confirmed, "{label}");
        }
        for label in ["draft", "Pendiente", "presupuesto"] {
            assert_eq!(normalize_status(label).0, OrderStatus::Draft, "{label}");
        }
        assert_eq!(normalize_status("anulado").1, StatusMatch::Defaulted);
    }

    #[test]
    fn test_parse_import_date_formats() {
        let expected = Utc.with_ymd_and_hms(2026, 2, 3, 0, 0, 0).unwrap();
        assert_eq!(parse_import_date("2026-02-03"), Some(expected));
        assert_eq!(parse_import_date("03/02/2026"), Some(expected));
        assert_eq!(parse_import_date("03-02-2026"), Some(expected));
        assert_eq!(
            parse_import_date("2026-02-03T10:30:00+01:00"),
            Some(Utc.with_ymd_and_hms(2026, 2, 3, 9, 30, 0).unwrap())
        );
        assert_eq!(
            parse_import_date("2026-02-03 08:15"),
            Some(Utc.with_ymd_and_hms(2026, 2, 3, 8, 15, 0).unwrap())
        );
        assert_eq!(parse_import_date(""), None);
        assert_eq!(parse_import_date("31/02/2026"), None);
    }

    #[test]
    fn test_normalize_header() {
        assert_eq!(normalize_header("\u{FEFF}Codigo "), "codigo");
        assert_eq!(normalize_header("NOMBRE"), "nombre");
    }

    #[test]
    fn test_client_row_requires_code_and_name() {
        let full = ClientRow {
            code: Some(" f-01 ".to_string()),
            name: Some("Farmacia Sol".to_string()),
            city: Some("  ".to_string()),
            ..Default::default()
        };
        let client = full.into_client(now()).unwrap();
        assert_eq!(client.id, client_key("F-01"));
        assert_eq!(client.code.as_deref(), Some("F-01"));
        assert_eq!(client.city, None);

        let nameless = ClientRow {
            code: Some("F-02".to_string()),
            ..Default::default()
        };
        assert!(nameless.into_client(now()).is_none());

        let codeless = ClientRow {
            id: Some("c-7".to_string()),
            name: Some("Farmacia Mar".to_string()),
            ..Default::default()
        };
        let client = codeless.into_client(now()).unwrap();
        assert_eq!(client.id, "c-7");
        assert_eq!(client.code, None);
    }

    #[test]
    fn test_group_by_reference() {
        let rows = vec![
            row("F-01", "03/02/2026", "ALB-77", "Ibuprofeno", "12", "2,35"),
            row("f-01", "03/02/2026", "ALB-77", "Omeprazol", "6", "4,10"),
            row("F-02", "2026-02-05", "", "Gasas", "20", "0,80"),
        ];
        let grouped = group_order_rows(rows, now());

        assert_eq!(grouped.orders.len(), 2);
        assert_eq!(grouped.skipped_rows, 0);

        let first = &grouped.orders[0];
        assert_eq!(first.client_code.as_deref(), Some("F-01"));
        assert_eq!(first.order.lines.len(), 2);
        assert_eq!(first.order.total.cents(), 12 * 235 + 6 * 410);
        assert_eq!(first.order.reference.as_deref(), Some("ALB-77"));
        assert_eq!(first.order.id, order_key("F-01", "ALB-77"));
        assert_eq!(first.order.client_id, client_key("F-01"));

        let second = &grouped.orders[1];
        assert_eq!(second.order.id, order_key("F-02", "2026-02-05"));
        assert_eq!(second.order.reference, None);
    }

    #[test]
    fn test_group_is_deterministic() {
        let make = || vec![row("F-01", "2026-02-03", "", "X", "1", "1")];
        let a = group_order_rows(make(), now());
        let b = group_order_rows(make(), now());
        assert_eq!(a, b);
    }

    #[test]
    fn test_group_skips_unusable_rows() {
        let rows = vec![
            row("", "2026-02-03", "", "X", "1", "1"),
            row("F-01", "ayer", "", "X", "1", "1"),
            row("F-01", "2026-02-03", "", "", "1", "1"),
            row("F-01", "2026-02-03", "", "X", "abc", "n/a"),
        ];
        let grouped = group_order_rows(rows, now());

        assert_eq!(grouped.skipped_rows, 3);
        assert_eq!(grouped.orders.len(), 1);
        let line = &grouped.orders[0].order.lines[0];
        assert_eq!(line.quantity, 0);
        assert!(line.unit_price.is_zero());
    }

    #[test]
    fn test_group_clamps_absurd_quantities() {
        let rows = vec![
            row("F-01", "2026-02-03", "A", "Gasas", "1e30", "0,80"),
            row("F-01", "2026-02-03", "A", "Alcohol", "1e30", "9999999999999"),
            row("F-01", "2026-02-03", "A", "Vendas", "-1e30", "1"),
        ];
        let grouped = group_order_rows(rows, now());

        let order = &grouped.orders[0].order;
        assert_eq!(order.lines[0].quantity, MAX_LINE_QUANTITY);
        assert_eq!(order.lines[2].quantity, -MAX_LINE_QUANTITY);
        assert_eq!(order.lines[1].line_total.cents(), i64::MAX);
        assert_eq!(order.total.cents(), i64::MAX - 9_999 * 100);
    }

    #[test]
    fn test_group_by_exported_ids() {
        let mut first = row("", "2026-02-03", "", "Gasas", "1", "1");
        first.order_id = Some("o-1".to_string());
        first.client_id = Some("c-1".to_string());
        let mut second = row("", "2026-02-03", "", "Alcohol", "1", "1");
        second.order_id = Some("o-2".to_string());
        second.client_id = Some("c-1".to_string());
        let mut same = row("", "2026-02-03", "", "Vendas", "1", "1");
        same.order_id = Some("o-1".to_string());
        same.client_id = Some("c-1".to_string());

        let grouped = group_order_rows(vec![first, second, same], now());
        assert_eq!(grouped.skipped_rows, 0);
        assert_eq!(grouped.orders.len(), 2);
        assert_eq!(grouped.orders[0].order.id, "o-1");
        assert_eq!(grouped.orders[0].order.lines.len(), 2);
        assert_eq!(grouped.orders[0].order.client_id, "c-1");
        assert_eq!(grouped.orders[0].client_code, None);
        assert_eq!(grouped.orders[1].order.id, "o-2");
    }

    #[test]
    fn test_group_collects_unknown_statuses() {
        let mut odd = row("F-01", "2026-02-03", "A", "X", "1", "1");
        odd.status = Some("Anulado".to_string());
        let mut draft = row("F-01", "2026-02-04", "B", "X", "1", "1");
        draft.status = Some("borrador".to_string());

        let grouped = group_order_rows(vec![odd, draft], now());
        assert_eq!(grouped.unrecognized_statuses, vec!["Anulado".to_string()]);
        assert_eq!(grouped.orders[0].order.status, OrderStatus::Confirmed);
        assert_eq!(grouped.orders[1].order.status, OrderStatus::Draft);
    }

    #[test]
    fn test_parse_line_spec() {
        let line = parse_line_spec("Gasas:20:0.80").unwrap();
        assert_eq!(line.product, "Gasas");
        assert_eq!(line.quantity, 20);
        assert_eq!(line.unit_price.cents(), 80);
        assert!(line.discount.is_zero());

        assert!(parse_line_spec("Gasas:20").is_err());
        assert!(parse_line_spec(":20:1").is_err());
        assert!(parse_line_spec("Gasas:20:x").is_err());
        assert!(parse_line_spec("Gasas:20:1:y").is_err());
        assert!(parse_line_spec("a:b:c:d:e").is_err());
    }
}
