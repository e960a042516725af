//! # Repository Module
//!
//! Database repository implementations for Botica.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  CLI command                                                           │
//! │       │  db.clients().search("sol", 20)                                │
//! │       ▼                                                                 │
//! │  ClientRepository                                                      │
//! │  ├── search(&self, query, limit)                                       │
//! │  ├── get(&self, id)                                                    │
//! │  ├── insert(&self, client)                                             │
//! │  └── upsert_by_key(&self, client)                                      │
//! │       │  SQL (FromRow records → domain types)                          │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`client::ClientRepository`] - Clients, FTS search, keyed upsert
//! - [`order::OrderRepository`] - Orders with their lines
//! - [`visit::VisitRepository`] - Visits and quick-order links
//! - [`settings::SettingsRepository`] - Targets and uplift

pub mod client;
pub mod order;
pub mod settings;
pub mod visit;
