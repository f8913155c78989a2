//! # Cash Ledger Engine
//!
//! Movement posting, account balances, and period closes.
//!
//! ## Posting Guarantees
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Posting a Movement                               │
//! │                                                                         │
//! │  1. IDEMPOTENCY                                                        │
//! │     An existing movement for the same origin (sale / purchase /        │
//! │     installment) is returned unchanged. Balances untouched.            │
//! │                                                                         │
//! │  2. BALANCE SAFETY                                                     │
//! │     IN  → atomic increment                                             │
//! │     OUT → guarded: balance = balance - ? WHERE balance >= ?            │
//! │           zero rows affected → InsufficientBalance, nothing written    │
//! │                                                                         │
//! │  3. IMMUTABILITY                                                       │
//! │     Movements are never updated or deleted. The only later touch is    │
//! │     a period close claiming them via close_id, exactly once.           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The order and debt engines post through the `_tx` helpers so their
//! ledger entries commit or roll back with the business mutation that
//! caused them.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use aurum_core::ledger::{
    account_for_method, movement_types, AccountBalance, AccountSummary, PeriodSummary,
};
use aurum_core::{
    Account, AccountSnapshot, Close, CloseKind, DebtKind, Direction, Installment, Money, Movement,
    MovementOrigin, MovementType, Order, OrderKind, ValidationError,
};

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat row shape for the movements table; `Movement` carries the origin
/// as a tagged enum instead of three nullable columns.
#[derive(sqlx::FromRow)]
struct MovementRow {
    id: String,
    account_id: String,
    movement_type_id: String,
    amount: Money,
    description: Option<String>,
    timestamp: DateTime<Utc>,
    sale_id: Option<String>,
    purchase_id: Option<String>,
    installment_id: Option<String>,
    close_id: Option<String>,
}

impl From<MovementRow> for Movement {
    fn from(row: MovementRow) -> Self {
        let origin = match (row.sale_id, row.purchase_id, row.installment_id) {
            (Some(id), _, _) => Some(MovementOrigin::Sale(id)),
            (_, Some(id), _) => Some(MovementOrigin::Purchase(id)),
            (_, _, Some(id)) => Some(MovementOrigin::Installment(id)),
            _ => None,
        };
        Movement {
            id: row.id,
            account_id: row.account_id,
            movement_type_id: row.movement_type_id,
            amount: row.amount,
            description: row.description,
            timestamp: row.timestamp,
            origin,
            close_id: row.close_id,
        }
    }
}

const MOVEMENT_COLUMNS: &str = "id, account_id, movement_type_id, amount, description, \
     timestamp, sale_id, purchase_id, installment_id, close_id";

// =============================================================================
// Ledger Repository
// =============================================================================

/// Repository implementing the cash ledger engine.
#[derive(Debug, Clone)]
pub struct LedgerRepository {
    pool: SqlitePool,
}

impl LedgerRepository {
    /// Creates a new LedgerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        LedgerRepository { pool }
    }

    // =========================================================================
    // Accounts & Movement Types
    // =========================================================================

    /// Finds an account by name, creating it with a zero balance if absent.
    pub async fn get_or_create_account(&self, name: &str) -> DbResult<Account> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_account(&mut conn, name).await
    }

    /// Gets an account by ID.
    pub async fn get_account(&self, id: &str) -> DbResult<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(
            "SELECT id, name, description, balance, active, created_at FROM accounts WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Lists active accounts by name.
    pub async fn list_active_accounts(&self) -> DbResult<Vec<Account>> {
        let accounts = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, description, balance, active, created_at
            FROM accounts
            WHERE active = 1
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(accounts)
    }

    /// Finds a movement type by name, creating it if absent.
    pub async fn get_or_create_movement_type(
        &self,
        name: &str,
        direction: Direction,
    ) -> DbResult<MovementType> {
        let mut conn = self.pool.acquire().await?;
        get_or_create_movement_type(&mut conn, name, direction).await
    }

    // =========================================================================
    // Posting
    // =========================================================================

    /// Posts a movement and applies it to the account balance, atomically.
    ///
    /// This is the manual / external entry point; the amount must be
    /// strictly positive here. The engines' informational 0.00 postings go
    /// through the internal order path instead.
    pub async fn post_movement(
        &self,
        account_id: &str,
        movement_type_id: &str,
        amount: Money,
        description: Option<&str>,
        origin: Option<MovementOrigin>,
    ) -> DbResult<Movement> {
        if !amount.is_positive() {
            return Err(ValidationError::MustBePositive {
                field: "amount".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;
        let movement = post_movement_tx(
            &mut tx,
            account_id,
            movement_type_id,
            amount,
            description,
            origin,
        )
        .await?;
        tx.commit().await?;

        Ok(movement)
    }

    /// Gets a movement by ID.
    pub async fn get_movement(&self, id: &str) -> DbResult<Option<Movement>> {
        let row = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE id = ?1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Movement::from))
    }

    /// Lists the movements a close claimed, oldest first.
    pub async fn movements_for_close(&self, close_id: &str) -> DbResult<Vec<Movement>> {
        let rows = sqlx::query_as::<_, MovementRow>(&format!(
            "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE close_id = ?1 ORDER BY timestamp"
        ))
        .bind(close_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Movement::from).collect())
    }

    // =========================================================================
    // Period Closes
    // =========================================================================

    /// Closes the period `[start, end]`, claiming its movements.
    ///
    /// ## Preconditions
    /// - `start < end`
    /// - no movement in the window already belongs to a close
    ///   (`PeriodAlreadyClosed` — closes never overlap)
    /// - at least one unclaimed movement in the window (`NoMovements`)
    ///
    /// ## Atomic Effects
    /// - totals IN and OUT over the unclaimed movements in the window
    /// - `opening_balance` = net of every movement before `start`
    /// - `closing_balance = opening + in - out`
    /// - every unclaimed movement in the window gets this close's id
    /// - each active account's balance is snapshotted
    pub async fn close_period(
        &self,
        kind: CloseKind,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        notes: Option<&str>,
        closed_by: Option<&str>,
    ) -> DbResult<Close> {
        if start >= end {
            return Err(ValidationError::InvalidFormat {
                field: "period".to_string(),
                reason: "period_start must precede period_end".to_string(),
            }
            .into());
        }

        let mut tx = self.pool.begin().await?;

        // Overlap check: any already-claimed movement in the window means
        // this period (or part of it) was closed before.
        let claimed_by: Option<String> = sqlx::query_scalar(
            r#"
            SELECT close_id FROM movements
            WHERE timestamp >= ?1 AND timestamp <= ?2 AND close_id IS NOT NULL
            LIMIT 1
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(close_id) = claimed_by {
            return Err(DbError::PeriodAlreadyClosed {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
                close_id,
            });
        }

        #[derive(sqlx::FromRow)]
        struct Totals {
            movement_count: i64,
            total_in: i64,
            total_out: i64,
        }

        let totals = sqlx::query_as::<_, Totals>(
            r#"
            SELECT
                COUNT(*) AS movement_count,
                COALESCE(SUM(CASE WHEN mt.direction = 'in' THEN m.amount ELSE 0 END), 0) AS total_in,
                COALESCE(SUM(CASE WHEN mt.direction = 'out' THEN m.amount ELSE 0 END), 0) AS total_out
            FROM movements m
            JOIN movement_types mt ON mt.id = m.movement_type_id
            WHERE m.timestamp >= ?1 AND m.timestamp <= ?2 AND m.close_id IS NULL
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&mut *tx)
        .await?;

        if totals.movement_count == 0 {
            return Err(DbError::NoMovements {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }

        // Opening balance: the net cash position when the period began,
        // reconstructed from the full movement history before it.
        let opening: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(
                CASE WHEN mt.direction = 'in' THEN m.amount ELSE -m.amount END
            ), 0)
            FROM movements m
            JOIN movement_types mt ON mt.id = m.movement_type_id
            JOIN accounts a ON a.id = m.account_id AND a.active = 1
            WHERE m.timestamp < ?1
            "#,
        )
        .bind(start)
        .fetch_one(&mut *tx)
        .await?;

        let close = Close {
            id: Uuid::new_v4().to_string(),
            kind,
            period_start: start,
            period_end: end,
            closed_at: Utc::now(),
            total_in: Money::from_cents(totals.total_in),
            total_out: Money::from_cents(totals.total_out),
            opening_balance: Money::from_cents(opening),
            closing_balance: Money::from_cents(opening + totals.total_in - totals.total_out),
            notes: notes.map(str::to_string),
            closed_by: closed_by.map(str::to_string),
        };

        sqlx::query(
            r#"
            INSERT INTO closes (
                id, kind, period_start, period_end, closed_at,
                total_in, total_out, opening_balance, closing_balance,
                notes, closed_by
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&close.id)
        .bind(close.kind)
        .bind(close.period_start)
        .bind(close.period_end)
        .bind(close.closed_at)
        .bind(close.total_in)
        .bind(close.total_out)
        .bind(close.opening_balance)
        .bind(close.closing_balance)
        .bind(&close.notes)
        .bind(&close.closed_by)
        .execute(&mut *tx)
        .await?;

        // Claim the window. Only unclaimed movements, so each movement
        // belongs to at most one close forever.
        let claimed = sqlx::query(
            r#"
            UPDATE movements SET close_id = ?1
            WHERE timestamp >= ?2 AND timestamp <= ?3 AND close_id IS NULL
            "#,
        )
        .bind(&close.id)
        .bind(start)
        .bind(end)
        .execute(&mut *tx)
        .await?;

        // Per-account balances at the moment of closing.
        sqlx::query(
            r#"
            INSERT INTO close_account_snapshots (close_id, account_id, balance_at_close)
            SELECT ?1, id, balance FROM accounts WHERE active = 1
            "#,
        )
        .bind(&close.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            close_id = %close.id,
            movements = claimed.rows_affected(),
            total_in = %close.total_in,
            total_out = %close.total_out,
            "Period closed"
        );

        Ok(close)
    }

    /// Gets the most recent close, optionally restricted to one kind.
    pub async fn latest_close(&self, kind: Option<CloseKind>) -> DbResult<Option<Close>> {
        let close = match kind {
            Some(kind) => {
                sqlx::query_as::<_, Close>(
                    r#"
                    SELECT id, kind, period_start, period_end, closed_at,
                           total_in, total_out, opening_balance, closing_balance,
                           notes, closed_by
                    FROM closes WHERE kind = ?1
                    ORDER BY closed_at DESC LIMIT 1
                    "#,
                )
                .bind(kind)
                .fetch_optional(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, Close>(
                    r#"
                    SELECT id, kind, period_start, period_end, closed_at,
                           total_in, total_out, opening_balance, closing_balance,
                           notes, closed_by
                    FROM closes
                    ORDER BY closed_at DESC LIMIT 1
                    "#,
                )
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(close)
    }

    /// Gets the snapshots a close captured, one per account active at the time.
    pub async fn close_snapshots(&self, close_id: &str) -> DbResult<Vec<AccountSnapshot>> {
        let snapshots = sqlx::query_as::<_, AccountSnapshot>(
            r#"
            SELECT close_id, account_id, balance_at_close
            FROM close_account_snapshots
            WHERE close_id = ?1
            "#,
        )
        .bind(close_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(snapshots)
    }

    // =========================================================================
    // Summaries
    // =========================================================================

    /// Active accounts with their balances and the grand total.
    pub async fn account_summary(&self) -> DbResult<AccountSummary> {
        let accounts = self.list_active_accounts().await?;

        let total = accounts
            .iter()
            .fold(Money::zero(), |acc, a| acc + a.balance);
        let accounts = accounts
            .into_iter()
            .map(|a| AccountBalance {
                account_id: a.id,
                name: a.name,
                balance: a.balance,
            })
            .collect();

        Ok(AccountSummary { accounts, total })
    }

    /// IN/OUT/net totals over an arbitrary window, without closing it.
    pub async fn period_summary(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> DbResult<PeriodSummary> {
        #[derive(sqlx::FromRow)]
        struct Totals {
            movement_count: i64,
            total_in: i64,
            total_out: i64,
        }

        let totals = sqlx::query_as::<_, Totals>(
            r#"
            SELECT
                COUNT(*) AS movement_count,
                COALESCE(SUM(CASE WHEN mt.direction = 'in' THEN m.amount ELSE 0 END), 0) AS total_in,
                COALESCE(SUM(CASE WHEN mt.direction = 'out' THEN m.amount ELSE 0 END), 0) AS total_out
            FROM movements m
            JOIN movement_types mt ON mt.id = m.movement_type_id
            WHERE m.timestamp >= ?1 AND m.timestamp <= ?2
            "#,
        )
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(PeriodSummary {
            period_start: start,
            period_end: end,
            total_in: Money::from_cents(totals.total_in),
            total_out: Money::from_cents(totals.total_out),
            net: Money::from_cents(totals.total_in - totals.total_out),
            movement_count: totals.movement_count,
        })
    }
}

// =============================================================================
// Transaction-Scoped Posting
// =============================================================================
// Called by the order and debt engines inside their own transactions, and
// by the public post_movement above.

/// Posts a movement inside an existing transaction.
///
/// Zero amounts are accepted here: financed orders post an informational
/// 0.00 entry so the day's activity shows in the ledger. The public
/// `post_movement` rejects them before reaching this point.
pub(crate) async fn post_movement_tx(
    conn: &mut SqliteConnection,
    account_id: &str,
    movement_type_id: &str,
    amount: Money,
    description: Option<&str>,
    origin: Option<MovementOrigin>,
) -> DbResult<Movement> {
    // Idempotency guard: one movement per origin, ever.
    if let Some(existing) = find_by_origin(conn, origin.as_ref()).await? {
        debug!(movement_id = %existing.id, "Movement for origin already posted, returning existing");
        return Ok(existing);
    }

    let direction: Direction =
        sqlx::query_scalar("SELECT direction FROM movement_types WHERE id = ?1")
            .bind(movement_type_id)
            .fetch_optional(&mut *conn)
            .await?
            .ok_or_else(|| DbError::not_found("MovementType", movement_type_id))?;

    if amount.is_positive() {
        apply_to_balance(conn, account_id, direction, amount).await?;
    }

    let movement = Movement {
        id: Uuid::new_v4().to_string(),
        account_id: account_id.to_string(),
        movement_type_id: movement_type_id.to_string(),
        amount,
        description: description.map(str::to_string),
        timestamp: Utc::now(),
        origin,
        close_id: None,
    };

    let (sale_id, purchase_id, installment_id) = origin_columns(movement.origin.as_ref());
    sqlx::query(
        r#"
        INSERT INTO movements (
            id, account_id, movement_type_id, amount, description,
            timestamp, sale_id, purchase_id, installment_id, close_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)
        "#,
    )
    .bind(&movement.id)
    .bind(&movement.account_id)
    .bind(&movement.movement_type_id)
    .bind(movement.amount)
    .bind(&movement.description)
    .bind(movement.timestamp)
    .bind(sale_id)
    .bind(purchase_id)
    .bind(installment_id)
    .execute(&mut *conn)
    .await?;

    debug!(
        movement_id = %movement.id,
        amount = %movement.amount,
        "Movement posted"
    );

    Ok(movement)
}

/// Posts the ledger entry for a finalized order.
///
/// Cash orders move the full total; financed orders post 0.00 because the
/// money arrives later through installments.
pub(crate) async fn post_order_tx(conn: &mut SqliteConnection, order: &Order) -> DbResult<Movement> {
    let (type_name, direction) = match (order.kind, order.debt_ref.as_ref().map(|r| r.kind)) {
        (OrderKind::Sale, None) => (movement_types::CASH_SALE, Direction::In),
        (OrderKind::Sale, Some(DebtKind::Credit)) => (movement_types::CREDIT_SALE, Direction::In),
        (OrderKind::Sale, Some(DebtKind::Layaway)) => {
            (movement_types::LAYAWAY_SALE, Direction::In)
        }
        (OrderKind::Purchase, None) => (movement_types::CASH_PURCHASE, Direction::Out),
        // NewOrder::validate forbids layaway purchases, so any credit ref
        // on a purchase is supplier financing.
        (OrderKind::Purchase, Some(_)) => (movement_types::CREDIT_PURCHASE, Direction::Out),
    };

    let amount = if order.is_financed() {
        Money::zero()
    } else {
        order.total
    };

    let account = get_or_create_account(conn, account_for_method(&order.payment_method)).await?;
    let movement_type = get_or_create_movement_type(conn, type_name, direction).await?;

    let origin = match order.kind {
        OrderKind::Sale => MovementOrigin::Sale(order.id.clone()),
        OrderKind::Purchase => MovementOrigin::Purchase(order.id.clone()),
    };

    let description = format!("{} for {}", type_name, order.total);
    post_movement_tx(
        conn,
        &account.id,
        &movement_type.id,
        amount,
        Some(&description),
        Some(origin),
    )
    .await
}

/// Posts the ledger entry for an installment payment.
///
/// Direction follows the parent order: installments on a sale bring money
/// in, installments on a purchase pay the supplier out.
pub(crate) async fn post_installment_tx(
    conn: &mut SqliteConnection,
    installment: &Installment,
    order: &Order,
) -> DbResult<Movement> {
    let (type_name, direction) = match (order.kind, installment.debt_ref.kind) {
        (OrderKind::Sale, DebtKind::Credit) => {
            (movement_types::CREDIT_INSTALLMENT_RECEIVED, Direction::In)
        }
        (OrderKind::Sale, DebtKind::Layaway) => {
            (movement_types::LAYAWAY_INSTALLMENT_RECEIVED, Direction::In)
        }
        (OrderKind::Purchase, _) => (movement_types::CREDIT_INSTALLMENT_PAID, Direction::Out),
    };

    let account =
        get_or_create_account(conn, account_for_method(&installment.payment_method)).await?;
    let movement_type = get_or_create_movement_type(conn, type_name, direction).await?;

    let description = format!("{} of {}", type_name, installment.amount);
    post_movement_tx(
        conn,
        &account.id,
        &movement_type.id,
        installment.amount,
        Some(&description),
        Some(MovementOrigin::Installment(installment.id.clone())),
    )
    .await
}

/// Applies a positive amount to an account balance in the given direction.
async fn apply_to_balance(
    conn: &mut SqliteConnection,
    account_id: &str,
    direction: Direction,
    amount: Money,
) -> DbResult<()> {
    match direction {
        Direction::In => {
            let result = sqlx::query("UPDATE accounts SET balance = balance + ?1 WHERE id = ?2")
                .bind(amount)
                .bind(account_id)
                .execute(&mut *conn)
                .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::not_found("Account", account_id));
            }
        }
        Direction::Out => {
            // Guarded decrement: losing a race for the last pesos fails
            // cleanly instead of overdrawing.
            let result = sqlx::query(
                r#"
                UPDATE accounts SET balance = balance - ?1
                WHERE id = ?2 AND balance >= ?1
                "#,
            )
            .bind(amount)
            .bind(account_id)
            .execute(&mut *conn)
            .await?;

            if result.rows_affected() == 0 {
                let account = sqlx::query_as::<_, Account>(
                    "SELECT id, name, description, balance, active, created_at FROM accounts WHERE id = ?1",
                )
                .bind(account_id)
                .fetch_optional(&mut *conn)
                .await?
                .ok_or_else(|| DbError::not_found("Account", account_id))?;

                warn!(
                    account = %account.name,
                    available = %account.balance,
                    requested = %amount,
                    "Rejected overdrawing movement"
                );
                return Err(DbError::InsufficientBalance {
                    account: account.name,
                    available: account.balance.to_string(),
                    requested: amount.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Finds an existing movement for an origin, if any.
async fn find_by_origin(
    conn: &mut SqliteConnection,
    origin: Option<&MovementOrigin>,
) -> DbResult<Option<Movement>> {
    let (column, id) = match origin {
        Some(MovementOrigin::Sale(id)) => ("sale_id", id),
        Some(MovementOrigin::Purchase(id)) => ("purchase_id", id),
        Some(MovementOrigin::Installment(id)) => ("installment_id", id),
        None => return Ok(None),
    };

    let row = sqlx::query_as::<_, MovementRow>(&format!(
        "SELECT {MOVEMENT_COLUMNS} FROM movements WHERE {column} = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Movement::from))
}

/// Splits an origin into the three nullable movement columns.
fn origin_columns(
    origin: Option<&MovementOrigin>,
) -> (Option<&str>, Option<&str>, Option<&str>) {
    match origin {
        Some(MovementOrigin::Sale(id)) => (Some(id.as_str()), None, None),
        Some(MovementOrigin::Purchase(id)) => (None, Some(id.as_str()), None),
        Some(MovementOrigin::Installment(id)) => (None, None, Some(id.as_str())),
        None => (None, None, None),
    }
}

/// Finds an account by name, creating it with a zero balance if absent.
pub(crate) async fn get_or_create_account(
    conn: &mut SqliteConnection,
    name: &str,
) -> DbResult<Account> {
    let existing = sqlx::query_as::<_, Account>(
        "SELECT id, name, description, balance, active, created_at FROM accounts WHERE name = ?1",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(account) = existing {
        return Ok(account);
    }

    let account = Account {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        description: None,
        balance: Money::zero(),
        active: true,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO accounts (id, name, description, balance, active, created_at)
        VALUES (?1, ?2, NULL, 0, 1, ?3)
        "#,
    )
    .bind(&account.id)
    .bind(&account.name)
    .bind(account.created_at)
    .execute(&mut *conn)
    .await?;

    info!(name, "Created account");
    Ok(account)
}

/// Finds a movement type by name, creating it if absent.
pub(crate) async fn get_or_create_movement_type(
    conn: &mut SqliteConnection,
    name: &str,
    direction: Direction,
) -> DbResult<MovementType> {
    let existing = sqlx::query_as::<_, MovementType>(
        "SELECT id, name, direction, description, active FROM movement_types WHERE name = ?1",
    )
    .bind(name)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(movement_type) = existing {
        return Ok(movement_type);
    }

    let movement_type = MovementType {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        direction,
        description: None,
        active: true,
    };

    sqlx::query(
        r#"
        INSERT INTO movement_types (id, name, direction, description, active)
        VALUES (?1, ?2, ?3, NULL, 1)
        "#,
    )
    .bind(&movement_type.id)
    .bind(&movement_type.name)
    .bind(movement_type.direction)
    .execute(&mut *conn)
    .await?;

    info!(name, "Created movement type");
    Ok(movement_type)
}
