//! Order engine integration tests: stock interaction, subtotal and total
//! arithmetic, finalization and its ledger posting.

mod common;

use common::*;

use aurum_core::{
    CoreError, DebtKind, Money, NewOrder, OrderKind, Weight,
};
use aurum_db::DbError;

fn shell(kind: OrderKind) -> NewOrder {
    NewOrder {
        kind,
        party_id: "party-1".to_string(),
        payment_method: "Cash".to_string(),
        debt_kind: None,
        date: chrono::Utc::now().date_naive(),
        description: None,
    }
}

/// A sale line over more stock than exists fails with the real
/// availability and leaves the inventory untouched.
#[tokio::test]
async fn test_insufficient_stock_leaves_inventory_intact() {
    let db = setup().await;
    let item = add_item(&db, "18k ring", 4_500, 2).await;
    let order = db.orders().create(&shell(OrderKind::Sale), None).await.unwrap();

    let err = db
        .orders()
        .add_line(&order.id, &item, 3, Money::from_cents(2_000), Weight::zero())
        .await
        .unwrap_err();
    match err {
        DbError::Core(CoreError::InsufficientStock {
            available,
            requested,
            ..
        }) => {
            assert_eq!(available, 2);
            assert_eq!(requested, 3);
        }
        other => panic!("expected InsufficientStock, got {other:?}"),
    }

    assert_eq!(stock_of(&db, &item).await, 2);
    assert!(db.orders().get_lines(&order.id).await.unwrap().is_empty());
    let order = db.orders().get(&order.id).await.unwrap().unwrap();
    assert_eq!(order.total, Money::zero());
}

/// Purchase lines add intake and price at raw weight.
#[tokio::test]
async fn test_purchase_adds_stock_and_prices_raw_weight() {
    let db = setup().await;
    let item = add_item(&db, "scrap ring", 4_000, 1).await;
    let order = db
        .orders()
        .create(&shell(OrderKind::Purchase), None)
        .await
        .unwrap();

    // 4.000g × $15.00/g × 2 = $120.00
    let line = db
        .orders()
        .add_line(&order.id, &item, 2, Money::from_cents(1_500), Weight::zero())
        .await
        .unwrap();

    assert_eq!(line.subtotal, Money::from_cents(12_000));
    assert_eq!(stock_of(&db, &item).await, 3);
}

/// Sale subtotals include the per-gram margin on top of the item weight.
#[tokio::test]
async fn test_sale_subtotal_includes_margin() {
    let db = setup().await;
    let item = add_item(&db, "18k ring", 4_000, 5).await;
    let order = db.orders().create(&shell(OrderKind::Sale), None).await.unwrap();

    // (4.000g + 0.100g) × $20.00/g × 2 = $164.00
    let line = db
        .orders()
        .add_line(
            &order.id,
            &item,
            2,
            Money::from_cents(2_000),
            Weight::from_milligrams(100),
        )
        .await
        .unwrap();

    assert_eq!(line.subtotal, Money::from_cents(16_400));
}

/// Quantity edits apply only the delta; returning to the original
/// quantity nets the stock change to zero.
#[tokio::test]
async fn test_quantity_roundtrip_nets_zero_stock() {
    let db = setup().await;
    let item = add_item(&db, "18k chain", 10_000, 8).await;
    let order = db.orders().create(&shell(OrderKind::Sale), None).await.unwrap();
    let line = db
        .orders()
        .add_line(&order.id, &item, 2, Money::from_cents(2_000), Weight::zero())
        .await
        .unwrap();
    assert_eq!(stock_of(&db, &item).await, 6);

    db.orders().update_line_quantity(&line.id, 5).await.unwrap();
    assert_eq!(stock_of(&db, &item).await, 3);

    let line = db.orders().update_line_quantity(&line.id, 2).await.unwrap();
    assert_eq!(stock_of(&db, &item).await, 6);
    // 10.000g × $20.00/g × 2 = $400.00
    assert_eq!(line.subtotal, Money::from_cents(40_000));
}

/// Removing a line reverses its full stock delta and its share of the total.
#[tokio::test]
async fn test_remove_line_reverses_stock_and_total() {
    let db = setup().await;
    let ring = add_item(&db, "18k ring", 4_000, 5).await;
    let chain = add_item(&db, "18k chain", 10_000, 5).await;
    let order = db.orders().create(&shell(OrderKind::Sale), None).await.unwrap();

    db.orders()
        .add_line(&order.id, &ring, 1, Money::from_cents(2_000), Weight::zero())
        .await
        .unwrap();
    let line = db
        .orders()
        .add_line(&order.id, &chain, 2, Money::from_cents(2_000), Weight::zero())
        .await
        .unwrap();

    let order_before = db.orders().get(&order.id).await.unwrap().unwrap();
    assert_eq!(order_before.total, Money::from_cents(8_000 + 40_000));

    db.orders().remove_line(&line.id).await.unwrap();

    assert_eq!(stock_of(&db, &chain).await, 5);
    let order_after = db.orders().get(&order.id).await.unwrap().unwrap();
    assert_eq!(order_after.total, Money::from_cents(8_000));
}

/// Finalizing a cash sale posts the full total into the mapped account.
/// A second finalize finds the movement already posted and changes nothing.
#[tokio::test]
async fn test_cash_sale_posts_total_idempotently() {
    let db = setup().await;
    let item = add_item(&db, "18k chain", 10_000, 3).await;
    let order = cash_order(&db, OrderKind::Sale, &item, 1, 2_000).await;

    assert_eq!(order.total, Money::from_cents(20_000));
    assert_eq!(cash_balance(&db).await, Money::from_cents(20_000));

    db.orders().finalize(&order.id).await.unwrap();
    assert_eq!(cash_balance(&db).await, Money::from_cents(20_000));
}

/// A cash purchase draws its total out of the account, and fails with
/// the available balance when the drawer is short.
#[tokio::test]
async fn test_cash_purchase_draws_from_account() {
    let db = setup().await;
    let item = add_item(&db, "scrap lot", 10_000, 0).await;

    // 10.000g × $15.00/g = $150.00, but only $100.00 in the drawer.
    fund_cash(&db, 10_000).await;
    let order = db
        .orders()
        .create(&shell(OrderKind::Purchase), None)
        .await
        .unwrap();
    db.orders()
        .add_line(&order.id, &item, 1, Money::from_cents(1_500), Weight::zero())
        .await
        .unwrap();

    let err = db.orders().finalize(&order.id).await.unwrap_err();
    assert!(matches!(err, DbError::InsufficientBalance { .. }));
    assert_eq!(cash_balance(&db).await, Money::from_cents(10_000));

    fund_cash(&db, 5_000).await;
    db.orders().finalize(&order.id).await.unwrap();
    assert_eq!(cash_balance(&db).await, Money::zero());
}

/// Financed orders post an informational 0.00 movement: visible in the
/// ledger, no balance change.
#[tokio::test]
async fn test_financed_sale_posts_zero_amount() {
    let db = setup().await;
    let item = add_item(&db, "18k ring", 5_000, 1).await;
    let (order, _) = financed_order(
        &db,
        OrderKind::Sale,
        DebtKind::Credit,
        3,
        future_date(),
        &item,
        1,
        2_000,
    )
    .await;

    assert_eq!(order.total, Money::from_cents(10_000));
    assert_eq!(cash_balance(&db).await, Money::zero());

    // The movement exists, tied to the sale, with amount 0.00.
    let summary = db
        .ledger()
        .period_summary(
            chrono::Utc::now() - chrono::Duration::hours(1),
            chrono::Utc::now(),
        )
        .await
        .unwrap();
    assert_eq!(summary.movement_count, 1);
    assert_eq!(summary.total_in, Money::zero());
}

/// Profit and gram helpers for sales.
#[tokio::test]
async fn test_sale_profit_and_total_grams() {
    let db = setup().await;
    let item = add_item(&db, "18k ring", 4_000, 5).await;
    let order = db.orders().create(&shell(OrderKind::Sale), None).await.unwrap();
    db.orders()
        .add_line(
            &order.id,
            &item,
            3,
            Money::from_cents(2_000),
            Weight::from_milligrams(100),
        )
        .await
        .unwrap();

    // Profit: 0.100g margin × $20.00/g × 3 = $6.00
    assert_eq!(
        db.orders().sale_profit(&order.id).await.unwrap(),
        Money::from_cents(600)
    );
    // Grams moved: 4.000g × 3 = 12.000g
    assert_eq!(
        db.orders().total_grams(&order.id).await.unwrap(),
        Weight::from_milligrams(12_000)
    );
}

/// An order accepts at most `MAX_ORDER_LINES` lines.
#[tokio::test]
async fn test_order_line_cap_enforced() {
    let db = setup().await;
    let order = db
        .orders()
        .create(&shell(OrderKind::Purchase), None)
        .await
        .unwrap();

    for i in 0..aurum_core::MAX_ORDER_LINES {
        let item = add_item(&db, &format!("scrap lot {i}"), 1_000, 0).await;
        db.orders()
            .add_line(&order.id, &item, 1, Money::from_cents(100), Weight::zero())
            .await
            .unwrap();
    }

    let extra = add_item(&db, "one lot too many", 1_000, 0).await;
    let err = db
        .orders()
        .add_line(&order.id, &extra, 1, Money::from_cents(100), Weight::zero())
        .await
        .unwrap_err();
    match err {
        DbError::Core(CoreError::Validation(errors)) => {
            assert!(errors
                .iter()
                .any(|e| matches!(e, aurum_core::ValidationError::OutOfRange { .. })));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert_eq!(
        db.orders().get_lines(&order.id).await.unwrap().len(),
        aurum_core::MAX_ORDER_LINES
    );
}

/// A purchase cannot be financed with a layaway.
#[tokio::test]
async fn test_layaway_purchase_rejected() {
    let db = setup().await;
    let new_order = NewOrder {
        debt_kind: Some(DebtKind::Layaway),
        ..shell(OrderKind::Purchase)
    };
    let financing = aurum_core::NewDebt {
        kind: DebtKind::Layaway,
        total_installments: 3,
        due_date: future_date(),
        interest_rate_bps: None,
        description: None,
    };

    let err = db.orders().create(&new_order, Some(&financing)).await.unwrap_err();
    assert!(matches!(err, DbError::Core(CoreError::Validation(_))));
}
