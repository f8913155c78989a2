//! # aurum-db: Database Layer for the Aurum Back Office
//!
//! This crate provides database access for the Aurum back office.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Aurum Data Flow                                  │
//! │                                                                         │
//! │  Caller (app, seed binary, tests)                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     aurum-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │  item / debt  │    │  (embedded)  │   │   │
//! │  │   │               │    │  order/ledger │    │              │   │   │
//! │  │   │ SqlitePool    │◄───│  engines with │    │ 001_initial_ │   │   │
//! │  │   │ Connection    │    │  transactions │    │  schema.sql  │   │   │
//! │  │   │ Management    │    │  + guards     │    │              │   │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘   │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database (./aurum.db)                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - The engines (item, debt, order, ledger)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use aurum_db::{Database, DbConfig};
//!
//! // Create database with default config
//! let config = DbConfig::new("path/to/aurum.db");
//! let db = Database::new(config).await?;
//!
//! // Use repositories
//! let debts = db.debts().list_by_status(DebtStatus::InProcess).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::debt::DebtRepository;
pub use repository::item::ItemRepository;
pub use repository::ledger::LedgerRepository;
pub use repository::order::OrderRepository;
