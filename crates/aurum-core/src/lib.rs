//! # aurum-core: Pure Business Logic for the Aurum Back Office
//!
//! This crate is the **heart** of the Aurum gold-shop back office. It
//! contains all business logic as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Aurum Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │               ★ aurum-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌────────┐   │   │
//! │  │   │  money  │ │  debt   │ │  order  │ │ ledger  │ │  item  │   │   │
//! │  │   │  Money  │ │  Debt   │ │  Order  │ │ Account │ │ Gold   │   │   │
//! │  │   │ Weight  │ │ Install │ │  Lines  │ │Movement │ │  Item  │   │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                   aurum-db (Database Layer)                     │   │
//! │  │    SQLite, migrations, the three transactional engines:         │   │
//! │  │    Debt Lifecycle • Sale/Purchase Totals • Cash Ledger          │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money and Weight types with integer arithmetic (no floating point!)
//! - [`debt`] - Credit/layaway debts, installments, the lifecycle state machine
//! - [`order`] - Sales and purchases, line subtotal and total formulas
//! - [`ledger`] - Accounts, movements, period closes, the posting policy
//! - [`item`] - Gold inventory items and the stock contract
//! - [`error`] - Domain error types, aggregate validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Money**: All monetary values are in cents (i64) to avoid float errors
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use aurum_core::money::{line_subtotal, Money, Weight};
//!
//! // Create money from cents (never from floats!)
//! let price_per_gram = Money::from_cents(2000); // $20.00/g
//!
//! // A sale line: (4.000g + 0.100g margin) × $20.00/g × 2 units
//! let weight = Weight::from_milligrams(4000) + Weight::from_milligrams(100);
//! let subtotal = line_subtotal(weight, price_per_gram, 2);
//! assert_eq!(subtotal.cents(), 16400); // $164.00
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod debt;
pub mod error;
pub mod item;
pub mod ledger;
pub mod money;
pub mod order;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use aurum_core::Money` instead of
// `use aurum_core::money::Money`

pub use debt::{Debt, DebtKind, DebtRef, DebtStatus, Installment, NewDebt};
pub use error::{CoreError, CoreResult, ValidationError, ValidationErrors};
pub use item::{GoldItem, NewGoldItem};
pub use ledger::{
    Account, AccountSnapshot, Close, CloseKind, Direction, Movement, MovementOrigin, MovementType,
};
pub use money::{line_subtotal, Money, Weight};
pub use order::{NewOrder, Order, OrderKind, OrderLine};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum lines allowed on a single order
///
/// ## Business Reason
/// Prevents runaway orders and keeps receipts printable. Can be made
/// configurable in future versions.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single item on one line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 999;
