//! # Client Commands
//!
//! `botica client add|edit|show|list|delete`
//!
//! ## Lookup
//! Every command that takes a client accepts its id or its import code
//! (`F-0042`, case-insensitive). `list --search` goes through the FTS5 index
//! on code, name and city.

use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use super::order::OrderSummary;
use super::visit::VisitDto;
use super::{emit, non_blank, resolve_client, Deleted, Render};
use crate::error::{CliError, CliResult, ErrorCode};
use crate::state::{AppConfig, AppState};
use botica_core::merge::{client_key, normalize_code, random_key};
use botica_core::projection::quarter_sales;
use botica_core::validation::{
    validate_client_code, validate_client_name, validate_email, validate_search_query,
};
use botica_core::{estimate, CadenceEstimate, CadenceStatus, Client, Money, QuarterKey};

/// How many orders and visits `client show` lists.
const HISTORY_ROWS: usize = 5;

// =============================================================================
// Arguments
// =============================================================================

#[derive(Debug, Subcommand)]
pub enum ClientCommand {
    /// Register a pharmacy
    Add {
        /// Pharmacy name
        name: String,
        #[command(flatten)]
        fields: ClientFields,
    },
    /// Change a pharmacy's details (blank value clears a field)
    Edit {
        /// Client id or code
        client: String,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        fields: ClientFields,
    },
    /// Details, ordering rhythm and quarter sales
    Show {
        /// Client id or code
        client: String,
    },
    /// List or search pharmacies
    List {
        /// Search code, name and city
        #[arg(long, short)]
        search: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Delete a pharmacy with its orders and visits
    Delete {
        /// Client id or code
        client: String,
    },
}

/// Optional client fields shared by `add` and `edit`.
#[derive(Debug, Clone, Default, Args)]
pub struct ClientFields {
    /// Distributor code (used to match spreadsheet imports)
    #[arg(long)]
    pub code: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub province: Option<String>,
    #[arg(long)]
    pub postal_code: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    /// Contact person
    #[arg(long)]
    pub contact: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

impl ClientFields {
    fn validate(&self) -> CliResult<()> {
        if let Some(code) = self.code.as_deref().filter(|c| !c.trim().is_empty()) {
            validate_client_code(code)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }

    /// Overwrites the fields that were given; blank clears.
    fn apply(self, client: &mut Client) {
        let slots = [
            (self.code.map(|c| normalize_code(&c)), &mut client.code),
            (self.address, &mut client.address),
            (self.city, &mut client.city),
            (self.province, &mut client.province),
            (self.postal_code, &mut client.postal_code),
            (self.phone, &mut client.phone),
            (self.email, &mut client.email),
            (self.contact, &mut client.contact_person),
            (self.notes, &mut client.notes),
        ];
        for (value, slot) in slots {
            if let Some(value) = value {
                *slot = non_blank(value);
            }
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Client as shown to the user.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDto {
    pub id: String,
    pub code: Option<String>,
    pub name: String,
    pub address: Option<String>,
    pub city: Option<String>,
    pub province: Option<String>,
    pub postal_code: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub contact_person: Option<String>,
    pub notes: Option<String>,
}

impl From<Client> for ClientDto {
    fn from(c: Client) -> Self {
        ClientDto {
            id: c.id,
            code: c.code,
            name: c.name,
            address: c.address,
            city: c.city,
            province: c.province,
            postal_code: c.postal_code,
            phone: c.phone,
            email: c.email,
            contact_person: c.contact_person,
            notes: c.notes,
        }
    }
}

impl ClientDto {
    fn heading(&self) -> String {
        match &self.code {
            Some(code) => format!("{} ({})", self.name, code),
            None => self.name.clone(),
        }
    }
}

impl Render for ClientDto {
    fn render_text(&self, _config: &AppConfig) -> String {
        let mut out = format!("✓ {}\n  id: {}", self.heading(), self.id);
        for (label, value) in self.detail_rows() {
            out.push_str(&format!("\n  {}: {}", label, value));
        }
        out
    }
}

impl ClientDto {
    fn detail_rows(&self) -> Vec<(&'static str, &str)> {
        [
            ("address", &self.address),
            ("city", &self.city),
            ("province", &self.province),
            ("postal code", &self.postal_code),
            ("phone", &self.phone),
            ("email", &self.email),
            ("contact", &self.contact_person),
            ("notes", &self.notes),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.as_deref().map(|v| (label, v)))
        .collect()
    }
}

/// Cadence estimate with its classification against "now".
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CadenceDto {
    pub has_estimate: bool,
    pub confirmed_orders: usize,
    pub avg_interval_days: Option<f64>,
    pub last_order: Option<DateTime<Utc>>,
    pub next_order: Option<DateTime<Utc>>,
    pub days_until_next: Option<i64>,
    pub status: CadenceStatus,
}

impl CadenceDto {
    pub fn new(estimate: &CadenceEstimate, now: DateTime<Utc>, due_soon_days: i64) -> Self {
        CadenceDto {
            has_estimate: estimate.has_estimate,
            confirmed_orders: estimate.count,
            avg_interval_days: estimate.avg_interval_days,
            last_order: estimate.last_date,
            next_order: estimate.next_date,
            days_until_next: estimate.days_until_next(now),
            status: estimate.status(now, due_soon_days),
        }
    }
}

/// `client show` response.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientDetail {
    pub client: ClientDto,
    pub cadence: CadenceDto,
    pub quarter: QuarterKey,
    pub quarter_sales_cents: i64,
    pub recent_orders: Vec<OrderSummary>,
    pub recent_visits: Vec<VisitDto>,
}

impl Render for ClientDetail {
    fn render_text(&self, config: &AppConfig) -> String {
        let mut out = self.client.render_text(config);

        let c = &self.cadence;
        out.push_str("\n\nOrdering rhythm");
        match (c.avg_interval_days, c.next_order) {
            (Some(avg), Some(next)) => {
                out.push_str(&format!(
                    "\n  every {:.1} days over {} confirmed orders",
                    avg, c.confirmed_orders
                ));
                out.push_str(&format!(
                    "\n  next order expected {} ({})",
                    next.format("%Y-%m-%d"),
                    describe_days(c.days_until_next)
                ));
            }
            _ => out.push_str(&format!(
                "\n  not enough history ({} confirmed orders, 3 needed)",
                c.confirmed_orders
            )),
        }
        if let Some(last) = c.last_order {
            out.push_str(&format!("\n  last order {}", last.format("%Y-%m-%d")));
        }

        out.push_str(&format!(
            "\n\nSales {}: {}",
            self.quarter,
            config.format_money(Money::from_cents(self.quarter_sales_cents))
        ));

        if !self.recent_orders.is_empty() {
            out.push_str("\n\nRecent orders");
            for order in &self.recent_orders {
                out.push_str(&format!("\n  {}", order.row(config)));
            }
        }
        if !self.recent_visits.is_empty() {
            out.push_str("\n\nRecent visits");
            for visit in &self.recent_visits {
                out.push_str(&format!("\n  {}", visit.row()));
            }
        }
        out
    }
}

fn describe_days(days: Option<i64>) -> String {
    match days {
        Some(d) if d < 0 => format!("{} days overdue", -d),
        Some(0) => "today".to_string(),
        Some(1) => "tomorrow".to_string(),
        Some(d) => format!("in {} days", d),
        None => "unknown".to_string(),
    }
}

/// `client list` response.
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct ClientList(pub Vec<ClientDto>);

impl Render for ClientList {
    fn render_text(&self, _config: &AppConfig) -> String {
        if self.0.is_empty() {
            return "No clients".to_string();
        }
        let mut out = format!("{:<12} {:<36} {}", "CODE", "NAME", "CITY");
        for c in &self.0 {
            out.push_str(&format!(
                "\n{:<12} {:<36} {}",
                c.code.as_deref().unwrap_or("-"),
                c.name,
                c.city.as_deref().unwrap_or("")
            ));
        }
        out.push_str(&format!("\n{} clients", self.0.len()));
        out
    }
}

// =============================================================================
// Commands
// =============================================================================

/// Registers a client. A code, when given, also fixes the id so later
/// spreadsheet imports update this record.
pub async fn add_client(state: &AppState, name: String, fields: ClientFields) -> CliResult<ClientDto> {
    debug!(name = %name, "add_client command");

    validate_client_name(&name)?;
    fields.validate()?;

    let code = fields
        .code
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(normalize_code);

    let id = match &code {
        Some(code) => {
            if state.db.clients().find_by_code(code).await?.is_some() {
                return Err(CliError::new(
                    ErrorCode::ValidationError,
                    format!("code '{}' already exists", code),
                ));
            }
            client_key(code)
        }
        None => random_key(),
    };

    let mut client = Client::new(id, name.trim(), state.now());
    fields.apply(&mut client);
    state.db.clients().insert(&client).await?;

    info!(id = %client.id, "Client added");
    Ok(client.into())
}

/// Updates the given fields of a client.
pub async fn edit_client(
    state: &AppState,
    id_or_code: &str,
    name: Option<String>,
    fields: ClientFields,
) -> CliResult<ClientDto> {
    debug!(client = %id_or_code, "edit_client command");

    fields.validate()?;
    let mut client = resolve_client(state, id_or_code).await?;

    if let Some(name) = name {
        validate_client_name(&name)?;
        client.name = name.trim().to_string();
    }
    fields.apply(&mut client);
    client.updated_at = state.now();

    state.db.clients().update(&client).await?;

    info!(id = %client.id, "Client updated");
    Ok(client.into())
}

/// Client details with cadence estimate and active-quarter sales.
pub async fn show_client(state: &AppState, id_or_code: &str) -> CliResult<ClientDetail> {
    debug!(client = %id_or_code, "show_client command");

    let client = resolve_client(state, id_or_code).await?;
    let snapshot = state.db.client_snapshot(&client.id).await?;
    let now = state.now();

    let cadence = estimate(&snapshot.orders);
    let quarter = QuarterKey::from_datetime(now);
    let sales = quarter_sales(quarter, &snapshot.orders);

    Ok(ClientDetail {
        client: snapshot.client.into(),
        cadence: CadenceDto::new(&cadence, now, state.config.due_soon_days),
        quarter,
        quarter_sales_cents: sales.cents(),
        recent_orders: snapshot
            .orders
            .iter()
            .take(HISTORY_ROWS)
            .map(OrderSummary::from)
            .collect(),
        recent_visits: snapshot
            .visits
            .into_iter()
            .take(HISTORY_ROWS)
            .map(VisitDto::from)
            .collect(),
    })
}

/// Lists clients by name, or searches them.
pub async fn list_clients(
    state: &AppState,
    search: Option<&str>,
    limit: Option<u32>,
) -> CliResult<ClientList> {
    let limit = state.limit(limit);
    let clients = match search {
        Some(query) => {
            let query = validate_search_query(query)?;
            state.db.clients().search(&query, limit).await?
        }
        None => state.db.clients().list(limit).await?,
    };

    debug!(count = clients.len(), "list_clients command");
    Ok(ClientList(clients.into_iter().map(ClientDto::from).collect()))
}

/// Deletes a client; its orders and visits go with it.
pub async fn delete_client(state: &AppState, id_or_code: &str) -> CliResult<Deleted> {
    let client = resolve_client(state, id_or_code).await?;
    state.db.clients().delete(&client.id).await?;

    info!(id = %client.id, "Client deleted");
    Ok(Deleted {
        entity: "client",
        id: client.id,
    })
}

pub async fn run(state: &AppState, command: ClientCommand, json: bool) -> CliResult<()> {
    let config = &state.config;
    match command {
        ClientCommand::Add { name, fields } => emit(&add_client(state, name, fields).await?, config, json),
        ClientCommand::Edit {
            client,
            name,
            fields,
        } => emit(&edit_client(state, &client, name, fields).await?, config, json),
        ClientCommand::Show { client } => emit(&show_client(state, &client).await?, config, json),
        ClientCommand::List { search, limit } => {
            emit(&list_clients(state, search.as_deref(), limit).await?, config, json)
        }
        ClientCommand::Delete { client } => emit(&delete_client(state, &client).await?, config, json),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::order::{add_order, NewOrder};
    use crate::state::testing::{day, state_at};

    fn fields(code: &str, city: &str) -> ClientFields {
        ClientFields {
            code: Some(code.to_string()),
            city: Some(city.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_add_and_find_by_code() {
        let state = state_at(day(2026, 3, 10)).await;

        let added = add_client(&state, "Farmacia Sol".to_string(), fields("f-01", "Sevilla"))
            .await
            .unwrap();
        assert_eq!(added.code.as_deref(), Some("F-01"));
        assert_eq!(added.id, client_key("F-01"));

        let found = resolve_client(&state, "f-01").await.unwrap();
        assert_eq!(found.name, "Farmacia Sol");
    }

    #[tokio::test]
    async fn test_add_rejects_duplicate_code_and_bad_email() {
        let state = state_at(day(2026, 3, 10)).await;
        add_client(&state, "Farmacia Sol".to_string(), fields("F-01", "Sevilla"))
            .await
            .unwrap();

        let err = add_client(&state, "Otra".to_string(), fields("F-01", "Cádiz"))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);

        let bad = ClientFields {
            email: Some("no-arroba".to_string()),
            ..Default::default()
        };
        assert!(add_client(&state, "Luna".to_string(), bad).await.is_err());
        assert!(add_client(&state, "  ".to_string(), ClientFields::default()).await.is_err());
    }

    #[tokio::test]
    async fn test_edit_sets_and_clears_fields() {
        let state = state_at(day(2026, 3, 10)).await;
        add_client(&state, "Farmacia Sol".to_string(), fields("F-01", "Sevilla"))
            .await
            .unwrap();

        let changes = ClientFields {
            city: Some("".to_string()),
            phone: Some("955 000 111".to_string()),
            ..Default::default()
        };
        let edited = edit_client(&state, "F-01", Some("Farmacia del Sol".to_string()), changes)
            .await
            .unwrap();

        assert_eq!(edited.name, "Farmacia del Sol");
        assert_eq!(edited.city, None);
        assert_eq!(edited.phone.as_deref(), Some("955 000 111"));
        assert_eq!(edited.code.as_deref(), Some("F-01"));
    }

    #[tokio::test]
    async fn test_show_includes_cadence_and_quarter_sales() {
        let state = state_at(day(2026, 3, 10)).await;
        add_client(&state, "Farmacia Sol".to_string(), fields("F-01", "Sevilla"))
            .await
            .unwrap();

        for (d, m) in [(10, 1), (20, 1), (30, 1)] {
            add_order(
                &state,
                NewOrder {
                    client: "F-01".to_string(),
                    date: Some(day(2026, m, d)),
                    lines: vec!["Gasas:10:1".to_string()],
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        }

        let detail = show_client(&state, "F-01").await.unwrap();
        assert!(detail.cadence.has_estimate);
        assert_eq!(detail.cadence.avg_interval_days, Some(10.0));
        // next expected 2026-02-09, a month before "now"
        assert_eq!(detail.cadence.status, CadenceStatus::Overdue);
        assert_eq!(detail.quarter.to_string(), "1T26");
        assert_eq!(detail.quarter_sales_cents, 3000);
        assert_eq!(detail.recent_orders.len(), 3);

        let text = detail.render_text(&state.config);
        assert!(text.contains("every 10.0 days"));
        assert!(text.contains("30.00 €"));
    }

    #[tokio::test]
    async fn test_list_search_and_delete() {
        let state = state_at(day(2026, 3, 10)).await;
        add_client(&state, "Farmacia Sol".to_string(), fields("F-01", "Sevilla"))
            .await
            .unwrap();
        add_client(&state, "Farmacia Luna".to_string(), fields("F-02", "Cádiz"))
            .await
            .unwrap();

        assert_eq!(list_clients(&state, None, None).await.unwrap().0.len(), 2);

        let hits = list_clients(&state, Some("sevi"), None).await.unwrap();
        assert_eq!(hits.0.len(), 1);
        assert_eq!(hits.0[0].name, "Farmacia Sol");

        delete_client(&state, "F-01").await.unwrap();
        let err = show_client(&state, "F-01").await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }
}
