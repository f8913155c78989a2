//! # Debt Lifecycle Engine
//!
//! Creation, activation, payment application, expiration, and cancellation
//! of credit/layaway debts.
//!
//! ## Payment Application
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    apply_payment (one transaction)                      │
//! │                                                                         │
//! │  1. Fetch the debt; flip it to Expired first if overdue (lazy check)   │
//! │  2. Refuse anything not InProcess                                      │
//! │  3. Validate ALL preconditions together:                               │
//! │       pending_installments > 0                                         │
//! │       0 < amount ≤ pending_amount                                      │
//! │       date ≤ due_date                                                  │
//! │  4. Insert the installment (immutable)                                 │
//! │  5. Guarded update: decrement installments and pending amount,         │
//! │     finalize when the pending amount hits exactly 0.00                 │
//! │     (zero rows affected → Conflict, whole transaction rolls back)      │
//! │  6. Post the cash-ledger movement for the installment                  │
//! │  7. Commit                                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Money closes a debt, not installment count: a debt paid off early in
//! fewer installments finalizes the moment pending_amount reaches zero.

use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::item::{release_stock, remove_stock};
use crate::repository::ledger::post_installment_tx;
use crate::repository::order::{find_order_by_debt_tx, lines_for_order_tx};
use aurum_core::{
    CoreError, Debt, DebtRef, DebtStatus, Installment, Money, NewDebt, OrderKind,
};

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat row shape for the installments table; `Installment` carries the
/// parent reference as a tagged `DebtRef`.
#[derive(sqlx::FromRow)]
struct InstallmentRow {
    id: String,
    debt_kind: aurum_core::DebtKind,
    debt_id: String,
    amount: Money,
    date: NaiveDate,
    payment_method: String,
    created_at: chrono::DateTime<Utc>,
}

impl From<InstallmentRow> for Installment {
    fn from(row: InstallmentRow) -> Self {
        Installment {
            id: row.id,
            debt_ref: DebtRef {
                kind: row.debt_kind,
                debt_id: row.debt_id,
            },
            amount: row.amount,
            date: row.date,
            payment_method: row.payment_method,
            created_at: row.created_at,
        }
    }
}

const DEBT_COLUMNS: &str = "id, kind, total_installments, pending_installments, total_amount, \
     pending_amount, due_date, status, interest_rate_bps, description, created_at, updated_at";

const INSTALLMENT_COLUMNS: &str =
    "id, debt_kind, debt_id, amount, date, payment_method, created_at";

// =============================================================================
// Debt Repository
// =============================================================================

/// Repository implementing the debt lifecycle engine.
#[derive(Debug, Clone)]
pub struct DebtRepository {
    pool: SqlitePool,
}

impl DebtRepository {
    /// Creates a new DebtRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DebtRepository { pool }
    }

    /// Creates a standalone debt in `Pending` status.
    ///
    /// Orders normally create their debt through the order engine; this
    /// exists for callers wiring a debt to an order created elsewhere.
    pub async fn create(&self, new_debt: &NewDebt) -> DbResult<Debt> {
        new_debt.validate()?;
        let mut conn = self.pool.acquire().await?;
        insert_debt_tx(&mut conn, new_debt).await
    }

    /// Gets a debt by ID.
    ///
    /// Runs the lazy expiration check first, so an overdue debt is never
    /// observed as `InProcess`.
    pub async fn get(&self, id: &str) -> DbResult<Option<Debt>> {
        let mut conn = self.pool.acquire().await?;
        expire_if_overdue(&mut conn, id, Utc::now().date_naive()).await?;
        find_debt_tx(&mut conn, id).await
    }

    /// Lists all debts, newest first. Sweeps overdue debts first.
    pub async fn list(&self) -> DbResult<Vec<Debt>> {
        self.expire_overdue(Utc::now().date_naive()).await?;

        let debts = sqlx::query_as::<_, Debt>(&format!(
            "SELECT {DEBT_COLUMNS} FROM debts ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(debts)
    }

    /// Lists debts in one status, newest first. Sweeps overdue debts first.
    pub async fn list_by_status(&self, status: DebtStatus) -> DbResult<Vec<Debt>> {
        self.expire_overdue(Utc::now().date_naive()).await?;

        let debts = sqlx::query_as::<_, Debt>(&format!(
            "SELECT {DEBT_COLUMNS} FROM debts WHERE status = ?1 ORDER BY created_at DESC"
        ))
        .bind(status)
        .fetch_all(&self.pool)
        .await?;

        Ok(debts)
    }

    /// Lists a debt's installments, oldest first.
    pub async fn installments(&self, debt_id: &str) -> DbResult<Vec<Installment>> {
        let rows = sqlx::query_as::<_, InstallmentRow>(&format!(
            "SELECT {INSTALLMENT_COLUMNS} FROM installments WHERE debt_id = ?1 ORDER BY created_at"
        ))
        .bind(debt_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Installment::from).collect())
    }

    /// Applies a payment to a debt and posts it to the cash ledger.
    pub async fn apply_payment(
        &self,
        debt_id: &str,
        amount: Money,
        date: NaiveDate,
        payment_method: &str,
    ) -> DbResult<Installment> {
        let mut tx = self.pool.begin().await?;

        // Lazy expiration inside the same transaction: a payment can
        // never slip through on a debt that went overdue since the last
        // read.
        expire_if_overdue(&mut tx, debt_id, Utc::now().date_naive()).await?;

        let debt = find_debt_tx(&mut tx, debt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Debt", debt_id))?;

        if debt.status != DebtStatus::InProcess {
            return Err(DbError::Core(CoreError::InvalidStatus {
                entity: format!("Debt {debt_id}"),
                status: format!("{:?}", debt.status),
            }));
        }

        // Aggregate validation: the caller learns every problem at once.
        debt.validate_payment(amount, date)?;

        let installment = Installment {
            id: Uuid::new_v4().to_string(),
            debt_ref: DebtRef {
                kind: debt.kind,
                debt_id: debt_id.to_string(),
            },
            amount,
            date,
            payment_method: payment_method.to_string(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO installments (id, debt_kind, debt_id, amount, date, payment_method, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&installment.id)
        .bind(installment.debt_ref.kind)
        .bind(debt_id)
        .bind(installment.amount)
        .bind(installment.date)
        .bind(&installment.payment_method)
        .bind(installment.created_at)
        .execute(&mut *tx)
        .await?;

        // Guarded update re-asserting every precondition. The CASE flips
        // the status to finalized exactly when the payment clears the
        // pending amount, regardless of installments left.
        let result = sqlx::query(
            r#"
            UPDATE debts SET
                pending_installments = MAX(pending_installments - 1, 0),
                pending_amount = pending_amount - ?1,
                status = CASE WHEN pending_amount - ?1 = 0 THEN 'finalized' ELSE status END,
                updated_at = ?2
            WHERE id = ?3
              AND status = 'in_process'
              AND pending_amount >= ?1
              AND pending_installments > 0
            "#,
        )
        .bind(amount)
        .bind(Utc::now())
        .bind(debt_id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Validated state vanished under us: concurrent writer.
            return Err(DbError::conflict("Debt", debt_id));
        }

        // Synchronous ledger posting, same transaction. A debt without a
        // linked order has nothing to derive a direction from; record the
        // payment and move on.
        match find_order_by_debt_tx(&mut tx, debt_id).await? {
            Some(order) => {
                post_installment_tx(&mut tx, &installment, &order).await?;
            }
            None => {
                warn!(debt_id, "Debt has no linked order; skipping ledger posting");
            }
        }

        tx.commit().await?;

        info!(
            debt_id,
            amount = %amount,
            "Payment applied"
        );
        Ok(installment)
    }

    /// Expires one debt if it is in process, owing, and past due.
    ///
    /// Returns whether the status changed. Idempotent.
    pub async fn check_and_update_expiration(
        &self,
        debt_id: &str,
        today: NaiveDate,
    ) -> DbResult<bool> {
        let mut conn = self.pool.acquire().await?;
        expire_if_overdue(&mut conn, debt_id, today).await
    }

    /// Batch expiration sweep for an external scheduler.
    ///
    /// Returns the number of debts expired. Idempotent: a second run on
    /// the same day finds nothing left to expire.
    pub async fn expire_overdue(&self, today: NaiveDate) -> DbResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE debts SET status = 'expired', updated_at = ?1
            WHERE status = 'in_process' AND pending_amount > 0 AND due_date < ?2
            "#,
        )
        .bind(Utc::now())
        .bind(today)
        .execute(&self.pool)
        .await?;

        let expired = result.rows_affected();
        if expired > 0 {
            info!(expired, "Expired overdue debts");
        }
        Ok(expired)
    }

    /// Cancels a debt and reverses its order's stock movements.
    ///
    /// Requires an order referencing the debt; sale lines restore stock,
    /// purchase lines remove the intake. Pending amount and installments
    /// are zeroed. Irreversible.
    pub async fn cancel(&self, debt_id: &str) -> DbResult<Debt> {
        let mut tx = self.pool.begin().await?;

        let debt = find_debt_tx(&mut tx, debt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Debt", debt_id))?;

        if debt.status.is_terminal() {
            return Err(DbError::Core(CoreError::InvalidStatus {
                entity: format!("Debt {debt_id}"),
                status: format!("{:?}", debt.status),
            }));
        }

        let order = find_order_by_debt_tx(&mut tx, debt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order financing debt", debt_id))?;

        for line in lines_for_order_tx(&mut tx, &order.id).await? {
            match order.kind {
                OrderKind::Sale => release_stock(&mut tx, &line.item_id, line.quantity).await?,
                OrderKind::Purchase => remove_stock(&mut tx, &line.item_id, line.quantity).await?,
            }
        }

        sqlx::query(
            r#"
            UPDATE debts SET
                status = 'cancelled',
                pending_amount = 0,
                pending_installments = 0,
                updated_at = ?1
            WHERE id = ?2
            "#,
        )
        .bind(Utc::now())
        .bind(debt_id)
        .execute(&mut *tx)
        .await?;

        let cancelled = find_debt_tx(&mut tx, debt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Debt", debt_id))?;

        tx.commit().await?;

        info!(debt_id, order_id = %order.id, "Debt cancelled, stock reversed");
        Ok(cancelled)
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

pub(crate) async fn find_debt_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Debt>> {
    let debt = sqlx::query_as::<_, Debt>(&format!(
        "SELECT {DEBT_COLUMNS} FROM debts WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(debt)
}

/// Inserts a `Pending` debt with zero amounts; activation assigns them.
pub(crate) async fn insert_debt_tx(
    conn: &mut SqliteConnection,
    new_debt: &NewDebt,
) -> DbResult<Debt> {
    let now = Utc::now();
    let debt = Debt {
        id: Uuid::new_v4().to_string(),
        kind: new_debt.kind,
        total_installments: new_debt.total_installments,
        pending_installments: new_debt.total_installments,
        total_amount: Money::zero(),
        pending_amount: Money::zero(),
        due_date: new_debt.due_date,
        status: DebtStatus::Pending,
        interest_rate_bps: new_debt.interest_rate_bps,
        description: new_debt.description.clone(),
        created_at: now,
        updated_at: now,
    };

    debug!(id = %debt.id, kind = ?debt.kind, "Creating debt");

    sqlx::query(
        r#"
        INSERT INTO debts (
            id, kind, total_installments, pending_installments,
            total_amount, pending_amount, due_date, status,
            interest_rate_bps, description, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, 0, 0, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&debt.id)
    .bind(debt.kind)
    .bind(debt.total_installments)
    .bind(debt.pending_installments)
    .bind(debt.due_date)
    .bind(debt.status)
    .bind(debt.interest_rate_bps)
    .bind(&debt.description)
    .bind(debt.created_at)
    .bind(debt.updated_at)
    .execute(&mut *conn)
    .await?;

    Ok(debt)
}

/// Assigns the order total to a `Pending` debt and moves it to `InProcess`.
///
/// Guarded on the status, so finalizing the same financed order twice
/// surfaces instead of silently rewriting amounts.
pub(crate) async fn activate_debt_tx(
    conn: &mut SqliteConnection,
    debt_id: &str,
    total: Money,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE debts SET
            total_amount = ?1,
            pending_amount = ?1,
            status = 'in_process',
            updated_at = ?2
        WHERE id = ?3 AND status = 'pending'
        "#,
    )
    .bind(total)
    .bind(Utc::now())
    .bind(debt_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let debt = find_debt_tx(conn, debt_id)
            .await?
            .ok_or_else(|| DbError::not_found("Debt", debt_id))?;
        return Err(DbError::Core(CoreError::InvalidStatus {
            entity: format!("Debt {debt_id}"),
            status: format!("{:?}", debt.status),
        }));
    }

    debug!(debt_id, total = %total, "Debt activated");
    Ok(())
}

/// Single-row lazy expiration; returns whether the status changed.
async fn expire_if_overdue(
    conn: &mut SqliteConnection,
    debt_id: &str,
    today: NaiveDate,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE debts SET status = 'expired', updated_at = ?1
        WHERE id = ?2 AND status = 'in_process' AND pending_amount > 0 AND due_date < ?3
        "#,
    )
    .bind(Utc::now())
    .bind(debt_id)
    .bind(today)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
