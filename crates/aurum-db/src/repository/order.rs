//! # Sale/Purchase Total Engine
//!
//! Two-phase order construction with explicit total recomputation.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Order Lifecycle                                   │
//! │                                                                         │
//! │  1. CREATE SHELL                                                       │
//! │     └── create() → Order { total: 0.00 }                               │
//! │         (financed orders create their Pending debt here too)           │
//! │                                                                         │
//! │  2. ADD LINES                                                          │
//! │     └── add_line() → reserve/intake stock, store subtotal,             │
//! │         recompute order total                                          │
//! │     └── update_line_quantity() / remove_line() → stock delta only,     │
//! │         recompute                                                      │
//! │                                                                         │
//! │  3. FINALIZE                                                           │
//! │     └── finalize() → recompute total, post to the cash ledger,         │
//! │         activate the linked debt (all in ONE transaction)              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Totals are recomputed from the lines after every change and stored
//! read-only; nothing recalculates behind the caller's back.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::debt::{activate_debt_tx, insert_debt_tx};
use crate::repository::item::{release_stock, remove_stock, reserve_stock};
use crate::repository::ledger::post_order_tx;
use aurum_core::order::compute_line_subtotal;
use aurum_core::{
    DebtRef, GoldItem, Money, NewDebt, NewOrder, Order, OrderKind, OrderLine, ValidationError,
    Weight,
};

// =============================================================================
// Row Mapping
// =============================================================================

/// Flat row shape for the orders table; `Order` carries the financing
/// reference as `Option<DebtRef>` instead of two nullable columns.
#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    kind: OrderKind,
    party_id: String,
    payment_method: String,
    debt_kind: Option<aurum_core::DebtKind>,
    debt_id: Option<String>,
    total: Money,
    date: chrono::NaiveDate,
    description: Option<String>,
    created_at: chrono::DateTime<Utc>,
    updated_at: chrono::DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        let debt_ref = match (row.debt_kind, row.debt_id) {
            (Some(kind), Some(debt_id)) => Some(DebtRef { kind, debt_id }),
            _ => None,
        };
        Order {
            id: row.id,
            kind: row.kind,
            party_id: row.party_id,
            payment_method: row.payment_method,
            debt_ref,
            total: row.total,
            date: row.date,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const ORDER_COLUMNS: &str = "id, kind, party_id, payment_method, debt_kind, debt_id, \
     total, date, description, created_at, updated_at";

const LINE_COLUMNS: &str =
    "id, order_id, item_id, quantity, price_per_gram, margin_per_gram, subtotal, created_at";

// =============================================================================
// Order Repository
// =============================================================================

/// Repository implementing the sale/purchase total engine.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates an order shell with a zero total.
    ///
    /// A financed order creates its debt here, in `Pending` status with
    /// zero amounts; `finalize` assigns the real total and activates it.
    /// `new_order.debt_kind` and `financing` must agree: both absent for a
    /// counter order, both present and matching in kind for a financed one.
    pub async fn create(
        &self,
        new_order: &NewOrder,
        financing: Option<&NewDebt>,
    ) -> DbResult<Order> {
        new_order.validate()?;
        match (new_order.debt_kind, financing) {
            (None, None) => {}
            (Some(kind), Some(new_debt)) if new_debt.kind == kind => {
                new_debt.validate()?;
            }
            _ => {
                return Err(ValidationError::InvalidDebtRef {
                    field: "financing".to_string(),
                    reason: "debt_kind and financing must both be absent or agree in kind"
                        .to_string(),
                }
                .into());
            }
        }

        let mut tx = self.pool.begin().await?;

        let debt_ref = match financing {
            Some(new_debt) => {
                let debt = insert_debt_tx(&mut tx, new_debt).await?;
                Some(DebtRef {
                    kind: debt.kind,
                    debt_id: debt.id,
                })
            }
            None => None,
        };

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            kind: new_order.kind,
            party_id: new_order.party_id.clone(),
            payment_method: new_order.payment_method.clone(),
            debt_ref,
            total: Money::zero(),
            date: new_order.date,
            description: new_order.description.clone(),
            created_at: now,
            updated_at: now,
        };

        debug!(id = %order.id, kind = ?order.kind, "Creating order");

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, kind, party_id, payment_method, debt_kind, debt_id,
                total, date, description, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, ?7, ?8, ?9, ?10)
            "#,
        )
        .bind(&order.id)
        .bind(order.kind)
        .bind(&order.party_id)
        .bind(&order.payment_method)
        .bind(order.debt_ref.as_ref().map(|r| r.kind))
        .bind(order.debt_ref.as_ref().map(|r| r.debt_id.as_str()))
        .bind(order.date)
        .bind(&order.description)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Adds a line to an order, moving stock and recomputing the total.
    ///
    /// Sale lines reserve stock (guarded; `InsufficientStock` leaves the
    /// inventory untouched). Purchase lines add intake.
    pub async fn add_line(
        &self,
        order_id: &str,
        item_id: &str,
        quantity: i64,
        price_per_gram: Money,
        margin_per_gram: Weight,
    ) -> DbResult<OrderLine> {
        let mut tx = self.pool.begin().await?;

        let order = find_order_tx(&mut tx, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;
        let item = find_item_tx(&mut tx, item_id)
            .await?
            .ok_or_else(|| DbError::not_found("GoldItem", item_id))?;

        let line_count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM order_lines WHERE order_id = ?1")
                .bind(order_id)
                .fetch_one(&mut *tx)
                .await?;
        if line_count as usize >= aurum_core::MAX_ORDER_LINES {
            return Err(ValidationError::OutOfRange {
                field: "lines".to_string(),
                min: 1,
                max: aurum_core::MAX_ORDER_LINES as i64,
            }
            .into());
        }

        let subtotal = compute_line_subtotal(
            order.kind,
            item.weight,
            quantity,
            price_per_gram,
            margin_per_gram,
        )?;

        match order.kind {
            OrderKind::Sale => reserve_stock(&mut tx, item_id, quantity).await?,
            OrderKind::Purchase => release_stock(&mut tx, item_id, quantity).await?,
        }

        let line = OrderLine {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            item_id: item_id.to_string(),
            quantity,
            price_per_gram,
            margin_per_gram,
            subtotal,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO order_lines (
                id, order_id, item_id, quantity, price_per_gram,
                margin_per_gram, subtotal, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&line.id)
        .bind(&line.order_id)
        .bind(&line.item_id)
        .bind(line.quantity)
        .bind(line.price_per_gram)
        .bind(line.margin_per_gram)
        .bind(line.subtotal)
        .bind(line.created_at)
        .execute(&mut *tx)
        .await?;

        recompute_total_tx(&mut tx, order_id).await?;
        tx.commit().await?;

        debug!(order_id, item_id, quantity, subtotal = %line.subtotal, "Line added");
        Ok(line)
    }

    /// Changes a line's quantity, applying only the stock delta.
    ///
    /// Returning a quantity to its original value leaves the net stock
    /// change at zero.
    pub async fn update_line_quantity(&self, line_id: &str, new_quantity: i64) -> DbResult<OrderLine> {
        let mut tx = self.pool.begin().await?;

        let line = find_line_tx(&mut tx, line_id)
            .await?
            .ok_or_else(|| DbError::not_found("OrderLine", line_id))?;
        let order = find_order_tx(&mut tx, &line.order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &line.order_id))?;
        let item = find_item_tx(&mut tx, &line.item_id)
            .await?
            .ok_or_else(|| DbError::not_found("GoldItem", &line.item_id))?;

        let subtotal = compute_line_subtotal(
            order.kind,
            item.weight,
            new_quantity,
            line.price_per_gram,
            line.margin_per_gram,
        )?;

        let delta = new_quantity - line.quantity;
        match (order.kind, delta) {
            (_, 0) => {}
            // Selling more needs more stock; selling fewer gives it back.
            (OrderKind::Sale, d) if d > 0 => reserve_stock(&mut tx, &line.item_id, d).await?,
            (OrderKind::Sale, d) => release_stock(&mut tx, &line.item_id, -d).await?,
            // Buying more adds intake; buying fewer takes it back out.
            (OrderKind::Purchase, d) if d > 0 => release_stock(&mut tx, &line.item_id, d).await?,
            (OrderKind::Purchase, d) => remove_stock(&mut tx, &line.item_id, -d).await?,
        }

        sqlx::query("UPDATE order_lines SET quantity = ?1, subtotal = ?2 WHERE id = ?3")
            .bind(new_quantity)
            .bind(subtotal)
            .bind(line_id)
            .execute(&mut *tx)
            .await?;

        recompute_total_tx(&mut tx, &line.order_id).await?;
        tx.commit().await?;

        Ok(OrderLine {
            quantity: new_quantity,
            subtotal,
            ..line
        })
    }

    /// Removes a line, reversing its full stock delta.
    pub async fn remove_line(&self, line_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let line = find_line_tx(&mut tx, line_id)
            .await?
            .ok_or_else(|| DbError::not_found("OrderLine", line_id))?;
        let order = find_order_tx(&mut tx, &line.order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &line.order_id))?;

        match order.kind {
            OrderKind::Sale => release_stock(&mut tx, &line.item_id, line.quantity).await?,
            OrderKind::Purchase => remove_stock(&mut tx, &line.item_id, line.quantity).await?,
        }

        sqlx::query("DELETE FROM order_lines WHERE id = ?1")
            .bind(line_id)
            .execute(&mut *tx)
            .await?;

        recompute_total_tx(&mut tx, &line.order_id).await?;
        tx.commit().await?;

        debug!(line_id, order_id = %line.order_id, "Line removed");
        Ok(())
    }

    /// Finalizes an order: recomputes the total, posts it to the cash
    /// ledger, and activates the linked debt — one transaction.
    ///
    /// Cash orders post their full total against the payment-method
    /// account; financed orders post an informational 0.00 movement and
    /// hand the total to the debt instead.
    pub async fn finalize(&self, order_id: &str) -> DbResult<Order> {
        let mut tx = self.pool.begin().await?;

        let order = find_order_tx(&mut tx, order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", order_id))?;

        let total = recompute_total_tx(&mut tx, order_id).await?;
        let order = Order { total, ..order };

        if let Some(debt_ref) = &order.debt_ref {
            activate_debt_tx(&mut tx, &debt_ref.debt_id, total).await?;
        }
        post_order_tx(&mut tx, &order).await?;

        tx.commit().await?;

        debug!(order_id, total = %total, financed = order.is_financed(), "Order finalized");
        Ok(order)
    }

    /// Gets an order by ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        find_order_tx(&mut conn, id).await
    }

    /// Gets an order's lines, oldest first.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let lines = sqlx::query_as::<_, OrderLine>(&format!(
            "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 ORDER BY created_at"
        ))
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(lines)
    }

    /// Total profit of a sale: each line's margin grams priced at its
    /// agreed per-gram rate. Zero for purchases (no margin on intake).
    pub async fn sale_profit(&self, order_id: &str) -> DbResult<Money> {
        let lines = self.get_lines(order_id).await?;
        Ok(lines
            .iter()
            .fold(Money::zero(), |acc, line| acc + line.profit()))
    }

    /// Total grams of gold an order moves (item weight × quantity, summed).
    pub async fn total_grams(&self, order_id: &str) -> DbResult<Weight> {
        let mg: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(gi.weight * ol.quantity), 0)
            FROM order_lines ol
            JOIN gold_items gi ON gi.id = ol.item_id
            WHERE ol.order_id = ?1
            "#,
        )
        .bind(order_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(Weight::from_milligrams(mg))
    }
}

// =============================================================================
// Transaction-Scoped Helpers
// =============================================================================

pub(crate) async fn find_order_tx(
    conn: &mut SqliteConnection,
    id: &str,
) -> DbResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Order::from))
}

/// Finds the order financing a debt, if one exists.
pub(crate) async fn find_order_by_debt_tx(
    conn: &mut SqliteConnection,
    debt_id: &str,
) -> DbResult<Option<Order>> {
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM orders WHERE debt_id = ?1"
    ))
    .bind(debt_id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(row.map(Order::from))
}

pub(crate) async fn lines_for_order_tx(
    conn: &mut SqliteConnection,
    order_id: &str,
) -> DbResult<Vec<OrderLine>> {
    let lines = sqlx::query_as::<_, OrderLine>(&format!(
        "SELECT {LINE_COLUMNS} FROM order_lines WHERE order_id = ?1 ORDER BY created_at"
    ))
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(lines)
}

async fn find_line_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<OrderLine>> {
    let line = sqlx::query_as::<_, OrderLine>(&format!(
        "SELECT {LINE_COLUMNS} FROM order_lines WHERE id = ?1"
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(line)
}

async fn find_item_tx(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<GoldItem>> {
    let item = sqlx::query_as::<_, GoldItem>(
        r#"
        SELECT id, name, weight, available_quantity, active, created_at, updated_at
        FROM gold_items WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(item)
}

/// Recomputes and persists an order's total from its lines.
async fn recompute_total_tx(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Money> {
    let total: i64 = sqlx::query_scalar(
        "SELECT COALESCE(SUM(subtotal), 0) FROM order_lines WHERE order_id = ?1",
    )
    .bind(order_id)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query("UPDATE orders SET total = ?1, updated_at = ?2 WHERE id = ?3")
        .bind(total)
        .bind(Utc::now())
        .bind(order_id)
        .execute(&mut *conn)
        .await?;

    Ok(Money::from_cents(total))
}
