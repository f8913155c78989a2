//! # Cash Ledger Entities
//!
//! Accounts, movements, and period closes — the money trail of the shop.
//!
//! ## Posting Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Event                        Direction  Amount                     │
//! │  ─────────────────────────────────────────────────────────────────  │
//! │  Cash sale                    IN         full total                 │
//! │  Credit sale                  IN         0.00 (informational)       │
//! │  Layaway sale                 IN         0.00 (informational)       │
//! │  Cash purchase                OUT        full total                 │
//! │  Credit purchase              OUT        0.00 (informational)       │
//! │  Customer credit installment  IN         installment amount         │
//! │  Supplier credit installment  OUT        installment amount         │
//! │  Layaway installment          IN         installment amount         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Financed orders post a 0.00 movement so the day's activity is visible
//! in the ledger even though no cash changed hands; the money arrives
//! later, one installment at a time.
//!
//! Movements are immutable. A period close claims the movements in its
//! window exactly once, so every movement belongs to at most one close.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Direction
// =============================================================================

/// Whether a movement adds to or removes from an account balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    In,
    Out,
}

// =============================================================================
// Account
// =============================================================================

/// A cash account (physical drawer or payment rail).
///
/// The balance is maintained exclusively by the posting engine and can
/// never go negative: OUT movements that would overdraw are rejected,
/// not clamped.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Account {
    pub id: String,
    /// Unique display name ("Cash", "Nequi", ...).
    pub name: String,
    pub description: Option<String>,
    pub balance: Money,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

/// The account name every payment method resolves to.
///
/// Methods not in the map (and orders with no method at all) fall back to
/// the default cash drawer, which is created on first use.
pub const DEFAULT_ACCOUNT: &str = "Cash";

/// Maps a payment method to the account that receives (or provides) the
/// money.
pub fn account_for_method(payment_method: &str) -> &'static str {
    match payment_method {
        "Cash" => "Cash",
        "Bank Transfer" => "Bank Transfer",
        "Nequi" => "Nequi",
        "Daviplata" => "Daviplata",
        "Addi" => "Addi",
        "Sistecredito" => "Sistecredito",
        _ => DEFAULT_ACCOUNT,
    }
}

// =============================================================================
// Movement Type
// =============================================================================

/// A catalog entry classifying movements ("Cash Sale", "Misc Expense", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct MovementType {
    pub id: String,
    /// Unique catalog name.
    pub name: String,
    pub direction: Direction,
    pub description: Option<String>,
    pub active: bool,
}

/// Catalog names used by the automatic posting policy. Seeded once;
/// `get_or_create` keeps postings working on an unseeded database.
pub mod movement_types {
    pub const CASH_SALE: &str = "Cash Sale";
    pub const CREDIT_SALE: &str = "Credit Sale";
    pub const LAYAWAY_SALE: &str = "Layaway Sale";
    pub const CASH_PURCHASE: &str = "Cash Purchase";
    pub const CREDIT_PURCHASE: &str = "Credit Purchase";
    pub const CREDIT_INSTALLMENT_RECEIVED: &str = "Credit Installment Received";
    pub const CREDIT_INSTALLMENT_PAID: &str = "Credit Installment Paid";
    pub const LAYAWAY_INSTALLMENT_RECEIVED: &str = "Layaway Installment Received";
    pub const MISC_INCOME: &str = "Miscellaneous Income";
    pub const MISC_EXPENSE: &str = "Miscellaneous Expense";
}

// =============================================================================
// Movement
// =============================================================================

/// What business event a movement records, when it is not a manual entry.
///
/// At most one origin per movement; the storage layer enforces one
/// movement per origin, which is what makes posting idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum MovementOrigin {
    Sale(String),
    Purchase(String),
    Installment(String),
}

/// One immutable ledger entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Movement {
    pub id: String,
    pub account_id: String,
    pub movement_type_id: String,
    /// Non-negative; zero only for the informational financed-order
    /// postings.
    pub amount: Money,
    pub description: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub origin: Option<MovementOrigin>,
    /// Set once, when a period close claims this movement.
    pub close_id: Option<String>,
}

// =============================================================================
// Period Close
// =============================================================================

/// Granularity of a period close.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum CloseKind {
    Daily,
    Monthly,
}

/// An immutable snapshot of a closed period.
///
/// `closing_balance = opening_balance + total_in - total_out`, where the
/// opening balance is the net of every movement before the period start.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Close {
    pub id: String,
    pub kind: CloseKind,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub closed_at: DateTime<Utc>,
    pub total_in: Money,
    pub total_out: Money,
    pub opening_balance: Money,
    pub closing_balance: Money,
    pub notes: Option<String>,
    pub closed_by: Option<String>,
}

/// Per-account balance captured at close time, one row per active account.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct AccountSnapshot {
    pub close_id: String,
    pub account_id: String,
    pub balance_at_close: Money,
}

// =============================================================================
// Summaries (read models)
// =============================================================================

/// One row of the account summary report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountBalance {
    pub account_id: String,
    pub name: String,
    pub balance: Money,
}

/// Active accounts with their balances and the grand total.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSummary {
    pub accounts: Vec<AccountBalance>,
    pub total: Money,
}

/// IN/OUT/net totals over an arbitrary window, without closing it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodSummary {
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    pub total_in: Money,
    pub total_out: Money,
    pub net: Money,
    pub movement_count: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================
