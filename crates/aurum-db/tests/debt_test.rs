//! Debt lifecycle integration tests: payment application, closure by
//! money, expiration, and cancellation with stock reversal.

mod common;

use common::*;

use aurum_core::{CoreError, DebtKind, DebtStatus, Money, OrderKind, ValidationError};
use aurum_db::DbError;

/// A $300.00 credit paid in three $100.00 installments ends Finalized
/// with nothing pending, and every installment lands in the ledger.
#[tokio::test]
async fn test_three_payments_finalize_credit() {
    let db = setup().await;
    // 5.000g × $20.00/g × 3 = $300.00
    let item = add_item(&db, "18k chain", 5_000, 3).await;
    let (order, debt_id) = financed_order(
        &db,
        OrderKind::Sale,
        DebtKind::Credit,
        3,
        future_date(),
        &item,
        3,
        2_000,
    )
    .await;

    assert_eq!(order.total, Money::from_cents(30_000));

    let debt = db.debts().get(&debt_id).await.unwrap().unwrap();
    assert_eq!(debt.status, DebtStatus::InProcess);
    assert_eq!(debt.pending_amount, Money::from_cents(30_000));
    assert_eq!(debt.pending_installments, 3);

    for _ in 0..3 {
        db.debts()
            .apply_payment(&debt_id, Money::from_cents(10_000), future_date(), "Cash")
            .await
            .unwrap();
    }

    let debt = db.debts().get(&debt_id).await.unwrap().unwrap();
    assert_eq!(debt.status, DebtStatus::Finalized);
    assert_eq!(debt.pending_amount, Money::zero());
    assert_eq!(debt.pending_installments, 0);

    assert_eq!(db.debts().installments(&debt_id).await.unwrap().len(), 3);
    // Financed sale posted 0.00; the three installments carried the money.
    assert_eq!(cash_balance(&db).await, Money::from_cents(30_000));
}

/// Paying the whole balance in one installment finalizes the debt even
/// though installments remain unused.
#[tokio::test]
async fn test_early_payoff_finalizes_with_installments_left() {
    let db = setup().await;
    let item = add_item(&db, "18k ring", 5_000, 1).await;
    let (_, debt_id) = financed_order(
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

    db.debts()
        .apply_payment(&debt_id, Money::from_cents(10_000), future_date(), "Cash")
        .await
        .unwrap();

    let debt = db.debts().get(&debt_id).await.unwrap().unwrap();
    assert_eq!(debt.status, DebtStatus::Finalized);
    assert_eq!(debt.pending_installments, 2);
}

/// An overpayment is rejected with no installment recorded and the debt
/// untouched.
#[tokio::test]
async fn test_overpayment_rejected_without_side_effects() {
    let db = setup().await;
    let item = add_item(&db, "18k ring", 5_000, 1).await;
    let (_, debt_id) = financed_order(
        &db,
        OrderKind::Sale,
        DebtKind::Layaway,
        4,
        future_date(),
        &item,
        1,
        2_000,
    )
    .await;

    let err = db
        .debts()
        .apply_payment(&debt_id, Money::from_cents(10_001), future_date(), "Cash")
        .await
        .unwrap_err();
    match err {
        DbError::Core(CoreError::Validation(errors)) => {
            assert!(errors
                .iter()
                .any(|e| matches!(e, ValidationError::ExceedsPending { .. })));
        }
        other => panic!("expected validation error, got {other:?}"),
    }

    let debt = db.debts().get(&debt_id).await.unwrap().unwrap();
    assert_eq!(debt.pending_amount, Money::from_cents(10_000));
    assert_eq!(debt.pending_installments, 4);
    assert!(db.debts().installments(&debt_id).await.unwrap().is_empty());
    assert_eq!(cash_balance(&db).await, Money::zero());
}

/// A payment dated after the due date is rejected.
#[tokio::test]
async fn test_payment_past_due_date_rejected() {
    let db = setup().await;
    let item = add_item(&db, "18k ring", 5_000, 1).await;
    let due = future_date();
    let (_, debt_id) = financed_order(
        &db,
        OrderKind::Sale,
        DebtKind::Credit,
        2,
        due,
        &item,
        1,
        2_000,
    )
    .await;

    let err = db
        .debts()
        .apply_payment(
            &debt_id,
            Money::from_cents(5_000),
            due + chrono::Duration::days(1),
            "Cash",
        )
        .await
        .unwrap_err();
    match err {
        DbError::Core(CoreError::Validation(errors)) => {
            assert!(errors
                .iter()
                .any(|e| matches!(e, ValidationError::PastDueDate { .. })));
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

/// Reads never observe a stale InProcess on an overdue debt, and payments
/// against it are refused.
#[tokio::test]
async fn test_overdue_debt_expires_lazily() {
    let db = setup().await;
    let item = add_item(&db, "18k ring", 5_000, 1).await;
    let (_, debt_id) = financed_order(
        &db,
        OrderKind::Sale,
        DebtKind::Credit,
        2,
        past_date(),
        &item,
        1,
        2_000,
    )
    .await;

    let debt = db.debts().get(&debt_id).await.unwrap().unwrap();
    assert_eq!(debt.status, DebtStatus::Expired);

    let err = db
        .debts()
        .apply_payment(&debt_id, Money::from_cents(1_000), past_date(), "Cash")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Core(CoreError::InvalidStatus { .. })
    ));
}

/// The batch sweep expires each overdue debt exactly once.
#[tokio::test]
async fn test_expiration_sweep_is_idempotent() {
    let db = setup().await;
    let item = add_item(&db, "18k ring", 5_000, 2).await;
    for _ in 0..2 {
        financed_order(
            &db,
            OrderKind::Sale,
            DebtKind::Credit,
            2,
            past_date(),
            &item,
            1,
            2_000,
        )
        .await;
    }

    let today = chrono::Utc::now().date_naive();
    assert_eq!(db.debts().expire_overdue(today).await.unwrap(), 2);
    assert_eq!(db.debts().expire_overdue(today).await.unwrap(), 0);

    let expired = db.debts().list_by_status(DebtStatus::Expired).await.unwrap();
    assert_eq!(expired.len(), 2);
}

/// A fully paid debt never expires, no matter how overdue the date gets.
#[tokio::test]
async fn test_finalized_debt_survives_sweep() {
    let db = setup().await;
    let item = add_item(&db, "18k ring", 5_000, 1).await;
    let (_, debt_id) = financed_order(
        &db,
        OrderKind::Sale,
        DebtKind::Credit,
        1,
        future_date(),
        &item,
        1,
        2_000,
    )
    .await;
    db.debts()
        .apply_payment(&debt_id, Money::from_cents(10_000), future_date(), "Cash")
        .await
        .unwrap();

    db.debts()
        .expire_overdue(future_date() + chrono::Duration::days(30))
        .await
        .unwrap();

    let debt = db.debts().get(&debt_id).await.unwrap().unwrap();
    assert_eq!(debt.status, DebtStatus::Finalized);
}

/// Cancelling a layaway sale puts the reserved stock back exactly and
/// zeroes both pendings.
#[tokio::test]
async fn test_cancel_restores_sale_stock() {
    let db = setup().await;
    let item = add_item(&db, "18k bracelet", 9_800, 5).await;
    let (_, debt_id) = financed_order(
        &db,
        OrderKind::Sale,
        DebtKind::Layaway,
        4,
        future_date(),
        &item,
        2,
        2_000,
    )
    .await;

    assert_eq!(stock_of(&db, &item).await, 3);

    let debt = db.debts().cancel(&debt_id).await.unwrap();
    assert_eq!(debt.status, DebtStatus::Cancelled);
    assert_eq!(debt.pending_amount, Money::zero());
    assert_eq!(debt.pending_installments, 0);
    assert_eq!(stock_of(&db, &item).await, 5);
}

/// Cancelling a financed purchase removes the intake again.
#[tokio::test]
async fn test_cancel_removes_purchase_stock() {
    let db = setup().await;
    let item = add_item(&db, "scrap gold lot", 20_000, 1).await;
    let (_, debt_id) = financed_order(
        &db,
        OrderKind::Purchase,
        DebtKind::Credit,
        3,
        future_date(),
        &item,
        4,
        1_500,
    )
    .await;

    assert_eq!(stock_of(&db, &item).await, 5);

    db.debts().cancel(&debt_id).await.unwrap();
    assert_eq!(stock_of(&db, &item).await, 1);
}

/// Cancel is terminal: a second cancel (or any payment) is refused.
#[tokio::test]
async fn test_cancel_is_terminal() {
    let db = setup().await;
    let item = add_item(&db, "18k ring", 5_000, 1).await;
    let (_, debt_id) = financed_order(
        &db,
        OrderKind::Sale,
        DebtKind::Credit,
        2,
        future_date(),
        &item,
        1,
        2_000,
    )
    .await;

    db.debts().cancel(&debt_id).await.unwrap();

    let err = db.debts().cancel(&debt_id).await.unwrap_err();
    assert!(matches!(
        err,
        DbError::Core(CoreError::InvalidStatus { .. })
    ));

    let err = db
        .debts()
        .apply_payment(&debt_id, Money::from_cents(1_000), future_date(), "Cash")
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DbError::Core(CoreError::InvalidStatus { .. })
    ));
}
