//! Shared helpers for the integration tests: an in-memory database and
//! builders for the flows most tests start from.

// Not every test binary uses every helper.
#![allow(dead_code)]

use chrono::{NaiveDate, Utc};

use aurum_core::ledger::movement_types;
use aurum_core::{DebtKind, Direction, Money, NewDebt, NewGoldItem, NewOrder, Order, OrderKind, Weight};
use aurum_db::{Database, DbConfig};

pub async fn setup() -> Database {
    Database::new(DbConfig::in_memory()).await.unwrap()
}

pub fn future_date() -> NaiveDate {
    Utc::now().date_naive() + chrono::Duration::days(90)
}

pub fn past_date() -> NaiveDate {
    Utc::now().date_naive() - chrono::Duration::days(1)
}

pub async fn add_item(db: &Database, name: &str, milligrams: i64, stock: i64) -> String {
    db.items()
        .insert(&NewGoldItem {
            name: name.to_string(),
            weight: Weight::from_milligrams(milligrams),
            available_quantity: stock,
        })
        .await
        .unwrap()
        .id
}

pub async fn stock_of(db: &Database, item_id: &str) -> i64 {
    db.items()
        .get_by_id(item_id)
        .await
        .unwrap()
        .unwrap()
        .available_quantity
}

pub async fn cash_balance(db: &Database) -> Money {
    db.ledger()
        .get_or_create_account("Cash")
        .await
        .unwrap()
        .balance
}

/// Puts money into the Cash account through a manual income movement, so
/// OUT movements in a test have something to draw from.
pub async fn fund_cash(db: &Database, cents: i64) {
    let account = db.ledger().get_or_create_account("Cash").await.unwrap();
    let income = db
        .ledger()
        .get_or_create_movement_type(movement_types::MISC_INCOME, Direction::In)
        .await
        .unwrap();
    db.ledger()
        .post_movement(
            &account.id,
            &income.id,
            Money::from_cents(cents),
            Some("opening float"),
            None,
        )
        .await
        .unwrap();
}

fn order_shell(kind: OrderKind, debt_kind: Option<DebtKind>) -> NewOrder {
    NewOrder {
        kind,
        party_id: "party-1".to_string(),
        payment_method: "Cash".to_string(),
        debt_kind,
        date: Utc::now().date_naive(),
        description: None,
    }
}

/// Cash order over one item line, finalized.
pub async fn cash_order(
    db: &Database,
    kind: OrderKind,
    item_id: &str,
    quantity: i64,
    price_per_gram_cents: i64,
) -> Order {
    let order = db.orders().create(&order_shell(kind, None), None).await.unwrap();
    db.orders()
        .add_line(
            &order.id,
            item_id,
            quantity,
            Money::from_cents(price_per_gram_cents),
            Weight::zero(),
        )
        .await
        .unwrap();
    db.orders().finalize(&order.id).await.unwrap()
}

/// Financed order over one item line, finalized; the debt is InProcess
/// with the order total pending. Returns (order, debt_id).
pub async fn financed_order(
    db: &Database,
    kind: OrderKind,
    debt_kind: DebtKind,
    installments: i64,
    due_date: NaiveDate,
    item_id: &str,
    quantity: i64,
    price_per_gram_cents: i64,
) -> (Order, String) {
    let financing = NewDebt {
        kind: debt_kind,
        total_installments: installments,
        due_date,
        interest_rate_bps: match debt_kind {
            DebtKind::Credit => Some(500),
            DebtKind::Layaway => None,
        },
        description: None,
    };
    let order = db
        .orders()
        .create(&order_shell(kind, Some(debt_kind)), Some(&financing))
        .await
        .unwrap();
    db.orders()
        .add_line(
            &order.id,
            item_id,
            quantity,
            Money::from_cents(price_per_gram_cents),
            Weight::zero(),
        )
        .await
        .unwrap();
    let order = db.orders().finalize(&order.id).await.unwrap();
    let debt_id = order.debt_ref.clone().unwrap().debt_id;
    (order, debt_id)
}
