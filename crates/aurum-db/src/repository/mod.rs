//! # Repository Module
//!
//! The three transactional engines plus inventory, each behind its own
//! repository.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  The Repository pattern abstracts database access behind a clean API.  │
//! │                                                                         │
//! │  Caller                                                                │
//! │       │                                                                 │
//! │       │  db.debts().apply_payment(id, amount, date, method)            │
//! │       │  ↓                                                              │
//! │       ▼                                                                 │
//! │  DebtRepository                                                        │
//! │  ├── apply_payment(...)     ← one transaction, all-or-nothing          │
//! │  ├── expire_overdue(...)                                               │
//! │  └── cancel(...)                                                       │
//! │       │                                                                 │
//! │       │  SQL (guarded updates)                                         │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • Transaction boundaries live in exactly one place                    │
//! │  • SQL is isolated per engine                                          │
//! │  • Engines compose through pub(crate) tx-scoped helpers, so an         │
//! │    order's ledger posting commits or rolls back with the order         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`item::ItemRepository`] - Inventory CRUD and the stock contract
//! - [`debt::DebtRepository`] - Debt lifecycle engine
//! - [`order::OrderRepository`] - Sale/purchase total engine
//! - [`ledger::LedgerRepository`] - Cash ledger engine

pub mod debt;
pub mod item;
pub mod ledger;
pub mod order;
