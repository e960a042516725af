//! # botica-core: Pure Domain Logic for Botica
//!
//! This crate holds the domain model of a pharmacy sales representative's
//! ledger (clients, orders, visits, quarterly targets) and the two
//! analytics engines built on it. It has zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Botica Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                      apps/cli (`botica`)                        │   │
//! │  │    client, order, visit, target, dashboard, import/export      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ snapshot + now                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ botica-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  cadence  │  │projection │  │  import   │  │   │
//! │  │   │  Client   │  │ next order│  │  quarter  │  │ CSV rows  │  │   │
//! │  │   │  Order    │  │  estimate │  │  pacing   │  │ → records │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO WALL CLOCK • PURE FUNCTIONS        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   botica-db (Database Layer)                    │   │
//! │  │         SQLite repositories, snapshots, CSV / JSON files        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Client, Order, Visit, Settings)
//! - [`money`] - Money in integer cents
//! - [`quarter`] - `QuarterKey` calendar
//! - [`cadence`] - Next-order estimation
//! - [`projection`] - Quarterly target pacing
//! - [`clock`] - Time source abstraction
//! - [`coerce`] - Lenient numeric parsing
//! - [`merge`] - Deterministic keys and keyed merge
//! - [`import`] - Spreadsheet row normalization
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use botica_core::money::Money;
//! use botica_core::types::{OrderLine, Percentage};
//!
//! // 3 × 12,50 € with a 10% discount
//! let line = OrderLine::new("Crema solar", 3, Money::from_cents(1250), Percentage::from_percentage(10.0));
//! assert_eq!(line.line_total.cents(), 3375);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cadence;
pub mod clock;
pub mod coerce;
pub mod error;
pub mod import;
pub mod merge;
pub mod money;
pub mod projection;
pub mod quarter;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cadence::{estimate, CadenceEstimate, CadenceStatus};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use projection::{project, project_for_settings, QuarterProjection};
pub use quarter::QuarterKey;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines in a manually entered order.
///
/// ## Business Reason
/// Distributor order forms top out well below this; anything larger is a
/// paste accident.
pub const MAX_ORDER_LINES: usize = 200;

/// Maximum units on a single manually entered line.
///
/// ## Business Reason
/// Catches typing 12000 instead of 120. Imports are not limited.
pub const MAX_LINE_QUANTITY: i64 = 9_999;

/// Maximum desired uplift, in basis points (200%).
pub const MAX_UPLIFT_BPS: u32 = 20_000;
