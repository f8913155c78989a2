//! # Debt Entities
//!
//! The debt side of the ledger: credits (customer or supplier financing
//! with interest) and layaways (customer reservations paid in
//! installments), plus the installments applied against them.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Debt State Machine                            │
//! │                                                                     │
//! │   Pending ──► InProcess ──┬──► Finalized   (pending_amount == 0)    │
//! │   (created   (order total │                                         │
//! │    with the   assigned)   ├──► Cancelled   (explicit, stock         │
//! │    order)                 │                 restored)               │
//! │                           └──► Expired     (due date passed with    │
//! │                                             money still owed)       │
//! │                                                                     │
//! │   Finalized / Cancelled / Expired are terminal.                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Closure is driven by money, not by installment count: a debt whose
//! `pending_amount` reaches exactly 0.00 finalizes even if installments
//! remain unused, because a customer may pay a debt off early in fewer,
//! larger installments.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationErrors};
use crate::money::Money;

// =============================================================================
// Debt Kind & Status
// =============================================================================

/// Which flavor of financing a debt represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DebtKind {
    /// Installment financing with an interest rate. Attached to a sale
    /// (customer owes us) or a purchase (we owe a supplier).
    Credit,
    /// A reservation paid down in installments. Sale-only; the item
    /// stays in the shop until fully paid.
    Layaway,
}

/// The status of a debt.
///
/// This enum is the single owner of status semantics; no caller hardcodes
/// a status id or string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    /// Created alongside its order; total not yet assigned.
    Pending,
    /// Active: order total assigned, payments being collected.
    InProcess,
    /// Fully paid (`pending_amount == 0.00`).
    Finalized,
    /// Explicitly cancelled; stock restored.
    Cancelled,
    /// Due date passed with money still owed.
    Expired,
}

impl DebtStatus {
    /// Terminal statuses admit no further transitions.
    pub const fn is_terminal(&self) -> bool {
        matches!(
            self,
            DebtStatus::Finalized | DebtStatus::Cancelled | DebtStatus::Expired
        )
    }
}

// =============================================================================
// Debt Reference
// =============================================================================

/// A tagged reference from an order or installment to its debt.
///
/// Exactly one debt, of a known kind — the "credit XOR layaway" pair of
/// nullable foreign keys becomes unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebtRef {
    pub kind: DebtKind,
    pub debt_id: String,
}

impl DebtRef {
    pub fn credit(debt_id: impl Into<String>) -> Self {
        DebtRef {
            kind: DebtKind::Credit,
            debt_id: debt_id.into(),
        }
    }

    pub fn layaway(debt_id: impl Into<String>) -> Self {
        DebtRef {
            kind: DebtKind::Layaway,
            debt_id: debt_id.into(),
        }
    }
}

// =============================================================================
// Debt
// =============================================================================

/// A credit or layaway debt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Debt {
    /// Unique identifier (UUID v4).
    pub id: String,

    pub kind: DebtKind,

    /// Agreed number of installments (≥ 1).
    pub total_installments: i64,

    /// Installments not yet paid. Starts at `total_installments`,
    /// never exceeds it, floored at 0.
    pub pending_installments: i64,

    /// Total owed, assigned from the linked order's total.
    pub total_amount: Money,

    /// Amount still owed. Never exceeds `total_amount`, floored at 0.00.
    pub pending_amount: Money,

    /// Last day a payment is accepted.
    pub due_date: NaiveDate,

    pub status: DebtStatus,

    /// Interest in basis points (825 = 8.25%). Credit only.
    pub interest_rate_bps: Option<u32>,

    pub description: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Debt {
    /// Whether the due date has passed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.due_date < today
    }

    /// Fraction of installments already paid, for display.
    pub fn paid_fraction(&self) -> f64 {
        if self.total_installments == 0 {
            return 0.0;
        }
        (self.total_installments - self.pending_installments) as f64
            / self.total_installments as f64
    }

    /// Checks the structural invariants, reporting every violation.
    pub fn check_invariants(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.total_installments < 1 {
            errors.push(ValidationError::MustBePositive {
                field: "total_installments".to_string(),
            });
        }
        if self.pending_installments < 0 {
            errors.push(ValidationError::MustNotBeNegative {
                field: "pending_installments".to_string(),
            });
        }
        if self.pending_installments > self.total_installments {
            errors.push(ValidationError::ExceedsTotal {
                field: "pending_installments".to_string(),
                limit_field: "total_installments".to_string(),
            });
        }
        if self.total_amount.is_negative() {
            errors.push(ValidationError::MustNotBeNegative {
                field: "total_amount".to_string(),
            });
        }
        if self.pending_amount.is_negative() {
            errors.push(ValidationError::MustNotBeNegative {
                field: "pending_amount".to_string(),
            });
        }
        if self.pending_amount > self.total_amount {
            errors.push(ValidationError::ExceedsTotal {
                field: "pending_amount".to_string(),
                limit_field: "total_amount".to_string(),
            });
        }

        errors.into_result()
    }

    /// Validates a prospective payment against this debt, aggregate-then-raise.
    ///
    /// ## Preconditions checked (all reported together)
    /// - at least one pending installment remains
    /// - `0 < amount ≤ pending_amount`
    /// - `date ≤ due_date`
    pub fn validate_payment(
        &self,
        amount: Money,
        date: NaiveDate,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.pending_installments <= 0 {
            errors.push(ValidationError::NoPendingInstallments {
                field: "debt".to_string(),
            });
        }
        if !amount.is_positive() {
            errors.push(ValidationError::MustBePositive {
                field: "amount".to_string(),
            });
        } else if amount > self.pending_amount {
            errors.push(ValidationError::ExceedsPending {
                field: "amount".to_string(),
                pending: self.pending_amount.to_string(),
            });
        }
        if date > self.due_date {
            errors.push(ValidationError::PastDueDate {
                field: "date".to_string(),
                due_date: self.due_date.to_string(),
            });
        }

        errors.into_result()
    }

    /// Applies a validated payment's effects to the in-memory debt.
    ///
    /// Decrements one installment (floored at 0) and the pending amount
    /// (floored at 0.00); finalizes when the pending amount reaches
    /// exactly zero, regardless of remaining installments.
    ///
    /// The storage engine mirrors these exact effects as a guarded SQL
    /// update; this function is the single pure statement of the rule.
    pub fn apply_payment_effects(&mut self, amount: Money) {
        self.pending_installments = (self.pending_installments - 1).max(0);
        self.pending_amount = self.pending_amount.saturating_sub(amount);
        if self.pending_amount.is_zero() {
            self.status = DebtStatus::Finalized;
        }
    }

    /// Whether the expiration sweep applies to this debt today.
    pub fn should_expire(&self, today: NaiveDate) -> bool {
        self.status == DebtStatus::InProcess
            && self.pending_amount.is_positive()
            && self.is_overdue(today)
    }
}

// =============================================================================
// New Debt (creation parameters)
// =============================================================================

/// Parameters for creating a debt alongside a financed order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewDebt {
    pub kind: DebtKind,
    pub total_installments: i64,
    pub due_date: NaiveDate,
    /// Required for Credit, forbidden for Layaway.
    pub interest_rate_bps: Option<u32>,
    pub description: Option<String>,
}

impl NewDebt {
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.total_installments < 1 {
            errors.push(ValidationError::MustBePositive {
                field: "total_installments".to_string(),
            });
        }
        match (self.kind, self.interest_rate_bps) {
            (DebtKind::Credit, None) => errors.push(ValidationError::Required {
                field: "interest_rate_bps".to_string(),
            }),
            (DebtKind::Layaway, Some(_)) => errors.push(ValidationError::InvalidFormat {
                field: "interest_rate_bps".to_string(),
                reason: "layaways do not carry interest".to_string(),
            }),
            _ => {}
        }

        errors.into_result()
    }
}

// =============================================================================
// Installment
// =============================================================================

/// One payment applied against a debt. Immutable once created: corrections
/// are not performed by editing an installment, which would silently
/// desynchronize the parent debt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Installment {
    pub id: String,
    pub debt_ref: DebtRef,
    /// Paid amount (> 0, ≤ the debt's pending amount at payment time).
    pub amount: Money,
    pub date: NaiveDate,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
