//! # State Module
//!
//! What every command receives.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         AppState                                 │  │
//! │  │                                                                  │  │
//! │  │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────┐   │  │
//! │  │  │   Database   │  │    AppConfig     │  │   Arc<dyn Clock> │   │  │
//! │  │  │  (SQLite     │  │  currency        │  │  SystemClock or  │   │  │
//! │  │  │   pool)      │  │  due_soon_days   │  │  FixedClock      │   │  │
//! │  │  └──────────────┘  └──────────────────┘  └──────────────────┘   │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  Built once per invocation; commands borrow it immutably.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod app;
mod config;

pub use app::AppState;
pub use config::AppConfig;

#[cfg(test)]
pub(crate) use app::testing;
