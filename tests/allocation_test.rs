mod common;

use assert_matches::assert_matches;
use rust_decimal_macros::dec;

use common::{day, inventory_request, key, other_key, seed_lot, TestContext};
use lotledger::{errors::EngineError, services::allocation::LotSelection};

#[tokio::test]
async fn full_consumption_deletes_the_lot() {
    let ctx = TestContext::new().await;
    let product = key();
    let lot = seed_lot(&ctx, &product, dec!(50), dec!(95), "Gulf Resins", day(1)).await;

    let committed = ctx
        .deals
        .create_deal(inventory_request(
            &product,
            dec!(50),
            vec![LotSelection {
                lot_id: lot.lot_id,
                quantity: dec!(50),
            }],
        ))
        .await
        .expect("deal commits");

    assert_eq!(committed.sources.len(), 1);
    assert_eq!(committed.sources[0].quantity_used, dec!(50));
    assert_eq!(committed.sources[0].cost_per_unit, dec!(95));
    assert_eq!(committed.sources[0].supplier_name, "Gulf Resins");

    let remaining = ctx.lots.get(&*ctx.db, lot.lot_id).await.expect("query");
    assert!(remaining.is_none(), "fully consumed lot must be removed");
}

#[tokio::test]
async fn split_across_two_lots_decrements_each_by_its_selection() {
    let ctx = TestContext::new().await;
    let product = key();
    let lot_a = seed_lot(&ctx, &product, dec!(30), dec!(90), "Gulf Resins", day(1)).await;
    let lot_b = seed_lot(&ctx, &product, dec!(20), dec!(92), "Delta Chem", day(2)).await;

    let committed = ctx
        .deals
        .create_deal(inventory_request(
            &product,
            dec!(40),
            vec![
                LotSelection {
                    lot_id: lot_a.lot_id,
                    quantity: dec!(30),
                },
                LotSelection {
                    lot_id: lot_b.lot_id,
                    quantity: dec!(10),
                },
            ],
        ))
        .await
        .expect("deal commits");

    let used: rust_decimal::Decimal = committed.sources.iter().map(|s| s.quantity_used).sum();
    assert_eq!(used, committed.deal.quantity_sold);
    assert_eq!(committed.sources[0].selection_order, 1);
    assert_eq!(committed.sources[0].lot_id, lot_a.lot_id);
    assert_eq!(committed.sources[1].selection_order, 2);
    assert_eq!(committed.sources[1].lot_id, lot_b.lot_id);

    assert!(ctx.lots.get(&*ctx.db, lot_a.lot_id).await.unwrap().is_none());
    let b = ctx
        .lots
        .get(&*ctx.db, lot_b.lot_id)
        .await
        .unwrap()
        .expect("lot B survives");
    assert_eq!(b.quantity, dec!(10));
}

#[tokio::test]
async fn overdraw_is_rejected_wholesale_and_leaves_the_lot_untouched() {
    let ctx = TestContext::new().await;
    let product = key();
    let lot = seed_lot(&ctx, &product, dec!(10), dec!(90), "Gulf Resins", day(1)).await;

    let err = ctx
        .deals
        .create_deal(inventory_request(
            &product,
            dec!(15),
            vec![LotSelection {
                lot_id: lot.lot_id,
                quantity: dec!(15),
            }],
        ))
        .await
        .expect_err("must be rejected");

    assert_matches!(
        err,
        EngineError::InsufficientQuantity {
            available,
            requested,
            ..
        } if available == dec!(10) && requested == dec!(15)
    );

    let unchanged = ctx
        .lots
        .get(&*ctx.db, lot.lot_id)
        .await
        .unwrap()
        .expect("lot stays");
    assert_eq!(unchanged.quantity, dec!(10));
}

#[tokio::test]
async fn exhausted_lot_disappears_from_availability() {
    let ctx = TestContext::new().await;
    let product = key();
    let lot_a = seed_lot(&ctx, &product, dec!(25), dec!(90), "Gulf Resins", day(1)).await;
    let lot_b = seed_lot(&ctx, &product, dec!(40), dec!(91), "Delta Chem", day(3)).await;

    ctx.deals
        .create_deal(inventory_request(
            &product,
            dec!(25),
            vec![LotSelection {
                lot_id: lot_a.lot_id,
                quantity: dec!(25),
            }],
        ))
        .await
        .expect("deal commits");

    let available = ctx.lots.list_available(&product).await.expect("list");
    assert_eq!(available.len(), 1);
    assert_eq!(available[0].lot_id, lot_b.lot_id);
}

#[tokio::test]
async fn availability_is_newest_first_and_scoped_to_the_product_key() {
    let ctx = TestContext::new().await;
    let product = key();
    let older = seed_lot(&ctx, &product, dec!(10), dec!(90), "Gulf Resins", day(1)).await;
    let newer = seed_lot(&ctx, &product, dec!(10), dec!(90), "Gulf Resins", day(5)).await;
    seed_lot(&ctx, &other_key(), dec!(99), dec!(80), "Sabic Direct", day(2)).await;

    let available = ctx.lots.list_available(&product).await.expect("list");
    assert_eq!(available.len(), 2);
    assert_eq!(available[0].lot_id, newer.lot_id);
    assert_eq!(available[1].lot_id, older.lot_id);
}

#[tokio::test]
async fn empty_selection_set_is_invalid() {
    let ctx = TestContext::new().await;
    let err = ctx
        .deals
        .create_deal(inventory_request(&key(), dec!(10), vec![]))
        .await
        .expect_err("must be rejected");
    assert_matches!(err, EngineError::InvalidInput(_));
}

#[tokio::test]
async fn non_positive_selection_quantity_is_invalid() {
    let ctx = TestContext::new().await;
    let product = key();
    let lot = seed_lot(&ctx, &product, dec!(10), dec!(90), "Gulf Resins", day(1)).await;

    let err = ctx
        .deals
        .create_deal(inventory_request(
            &product,
            dec!(10),
            vec![LotSelection {
                lot_id: lot.lot_id,
                quantity: dec!(0),
            }],
        ))
        .await
        .expect_err("must be rejected");
    assert_matches!(err, EngineError::InvalidInput(_));
}

#[tokio::test]
async fn duplicate_lot_selection_is_invalid() {
    let ctx = TestContext::new().await;
    let product = key();
    let lot = seed_lot(&ctx, &product, dec!(20), dec!(90), "Gulf Resins", day(1)).await;

    let err = ctx
        .deals
        .create_deal(inventory_request(
            &product,
            dec!(10),
            vec![
                LotSelection {
                    lot_id: lot.lot_id,
                    quantity: dec!(5),
                },
                LotSelection {
                    lot_id: lot.lot_id,
                    quantity: dec!(5),
                },
            ],
        ))
        .await
        .expect_err("must be rejected");
    assert_matches!(err, EngineError::InvalidInput(_));
}

#[tokio::test]
async fn selection_sum_must_equal_the_sale_quantity() {
    let ctx = TestContext::new().await;
    let product = key();
    let lot = seed_lot(&ctx, &product, dec!(30), dec!(90), "Gulf Resins", day(1)).await;

    let err = ctx
        .deals
        .create_deal(inventory_request(
            &product,
            dec!(25),
            vec![LotSelection {
                lot_id: lot.lot_id,
                quantity: dec!(20),
            }],
        ))
        .await
        .expect_err("must be rejected");
    assert_matches!(err, EngineError::InvalidInput(_));

    let unchanged = ctx
        .lots
        .get(&*ctx.db, lot.lot_id)
        .await
        .unwrap()
        .expect("lot stays");
    assert_eq!(unchanged.quantity, dec!(30));
}

#[tokio::test]
async fn lot_under_a_different_product_key_is_not_found() {
    let ctx = TestContext::new().await;
    let foreign = seed_lot(&ctx, &other_key(), dec!(50), dec!(80), "Sabic Direct", day(1)).await;

    let err = ctx
        .deals
        .create_deal(inventory_request(
            &key(),
            dec!(10),
            vec![LotSelection {
                lot_id: foreign.lot_id,
                quantity: dec!(10),
            }],
        ))
        .await
        .expect_err("must be rejected");
    assert_matches!(err, EngineError::LotNotFound(id) if id == foreign.lot_id);

    let unchanged = ctx
        .lots
        .get(&*ctx.db, foreign.lot_id)
        .await
        .unwrap()
        .expect("lot stays");
    assert_eq!(unchanged.quantity, dec!(50));
}
