//! # Inventory Repository
//!
//! CRUD for gold items plus the stock contract the order and debt engines
//! consume: `reserve` (guarded decrement, fails without touching stock)
//! and `release` (increment).

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use aurum_core::{CoreError, GoldItem, NewGoldItem};

/// Repository for inventory operations.
#[derive(Debug, Clone)]
pub struct ItemRepository {
    pool: SqlitePool,
}

impl ItemRepository {
    /// Creates a new ItemRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ItemRepository { pool }
    }

    /// Registers a new gold item.
    pub async fn insert(&self, new_item: &NewGoldItem) -> DbResult<GoldItem> {
        new_item.validate()?;

        let now = Utc::now();
        let item = GoldItem {
            id: Uuid::new_v4().to_string(),
            name: new_item.name.clone(),
            weight: new_item.weight,
            available_quantity: new_item.available_quantity,
            active: true,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, name = %item.name, "Inserting gold item");

        sqlx::query(
            r#"
            INSERT INTO gold_items (id, name, weight, available_quantity, active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.weight)
        .bind(item.available_quantity)
        .bind(item.active)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(item)
    }

    /// Gets an item by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<GoldItem>> {
        let item = sqlx::query_as::<_, GoldItem>(
            r#"
            SELECT id, name, weight, available_quantity, active, created_at, updated_at
            FROM gold_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Lists active items, newest first.
    pub async fn list_active(&self) -> DbResult<Vec<GoldItem>> {
        let items = sqlx::query_as::<_, GoldItem>(
            r#"
            SELECT id, name, weight, available_quantity, active, created_at, updated_at
            FROM gold_items
            WHERE active = 1
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts all items.
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM gold_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Activates or retires an item.
    pub async fn set_active(&self, id: &str, active: bool) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE gold_items SET active = ?1, updated_at = ?2 WHERE id = ?3",
        )
        .bind(active)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("GoldItem", id));
        }
        Ok(())
    }

    /// Reserves stock for a sale (standalone, non-transactional).
    pub async fn reserve(&self, item_id: &str, quantity: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        reserve_stock(&mut conn, item_id, quantity).await
    }

    /// Releases previously reserved stock (standalone, non-transactional).
    pub async fn release(&self, item_id: &str, quantity: i64) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        release_stock(&mut conn, item_id, quantity).await
    }
}

// =============================================================================
// Transaction-Scoped Stock Operations
// =============================================================================
// The order and debt engines call these inside their own transactions so a
// failed order never leaves a stock decrement behind.

/// Decrements available stock, guarded against overselling.
///
/// The WHERE clause re-asserts sufficiency, so a concurrent sale of the
/// last unit loses cleanly: zero rows affected, stock untouched, and the
/// caller gets `InsufficientStock` with the real availability.
pub(crate) async fn reserve_stock(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE gold_items
        SET available_quantity = available_quantity - ?1, updated_at = ?2
        WHERE id = ?3 AND active = 1 AND available_quantity >= ?1
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(item_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        // Distinguish a missing item from a short one.
        let available: Option<i64> =
            sqlx::query_scalar("SELECT available_quantity FROM gold_items WHERE id = ?1")
                .bind(item_id)
                .fetch_optional(&mut *conn)
                .await?;

        return match available {
            Some(available) => Err(DbError::Core(CoreError::InsufficientStock {
                item: item_id.to_string(),
                available,
                requested: quantity,
            })),
            None => Err(DbError::not_found("GoldItem", item_id)),
        };
    }

    debug!(item_id, quantity, "Reserved stock");
    Ok(())
}

/// Removes stock without the active-item requirement.
///
/// Used when cancelling a financed purchase: the intake is reversed even
/// if the item was retired in the meantime. Still guarded, because the
/// units may already have been sold on.
pub(crate) async fn remove_stock(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE gold_items
        SET available_quantity = available_quantity - ?1, updated_at = ?2
        WHERE id = ?3 AND available_quantity >= ?1
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(item_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        let available: Option<i64> =
            sqlx::query_scalar("SELECT available_quantity FROM gold_items WHERE id = ?1")
                .bind(item_id)
                .fetch_optional(&mut *conn)
                .await?;

        return match available {
            Some(available) => Err(DbError::Core(CoreError::InsufficientStock {
                item: item_id.to_string(),
                available,
                requested: quantity,
            })),
            None => Err(DbError::not_found("GoldItem", item_id)),
        };
    }

    debug!(item_id, quantity, "Removed stock");
    Ok(())
}

/// Increments available stock (purchase intake, sale reversal).
pub(crate) async fn release_stock(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE gold_items
        SET available_quantity = available_quantity + ?1, updated_at = ?2
        WHERE id = ?3
        "#,
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(item_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("GoldItem", item_id));
    }

    debug!(item_id, quantity, "Released stock");
    Ok(())
}
