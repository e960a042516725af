//! # botica-db: Database Layer for Botica
//!
//! This crate provides persistence for the Botica sales ledger.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Botica Data Flow                                │
//! │                                                                         │
//! │  CLI command (botica client show F-01)                                  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    botica-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Transfer    │  │   │
//! │  │   │   (pool.rs)   │    │               │    │              │  │   │
//! │  │   │               │    │ ClientRepo    │    │ CSV import   │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo     │◄───│ CSV export   │  │   │
//! │  │   │ Migrations    │    │ VisitRepo     │    │ JSON backup  │  │   │
//! │  │   │ Snapshots     │    │ SettingsRepo  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  │   ~/.local/share/botica/botica.db                               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation, snapshots
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Client, order, visit and settings repositories
//! - [`snapshot`] - In-memory copies handed to the analytics
//! - [`transfer`] - CSV import/export and JSON backups
//!
//! ## Usage
//!
//! ```rust,ignore
//! use botica_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("botica.db")).await?;
//!
//! let hits = db.clients().search("sol", 20).await?;
//! let history = db.client_snapshot(&hits[0].id).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod snapshot;
pub mod transfer;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use snapshot::{ClientSnapshot, Snapshot};
pub use transfer::{
    export_clients_csv, export_json, export_orders_csv, import_clients_csv, import_orders_csv,
    restore_json, ImportReport, RestoreReport,
};

// Repository re-exports for convenience
pub use repository::client::ClientRepository;
pub use repository::order::OrderRepository;
pub use repository::settings::SettingsRepository;
pub use repository::visit::VisitRepository;
