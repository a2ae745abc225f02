//! The harness pool holds a single SQLite connection, so competing units of
//! work here queue on that connection rather than on `SELECT ... FOR UPDATE`.
//! The tests pin down the outcome both paths must produce: serialized
//! balances and no lost updates.

mod common;

use assert_matches::assert_matches;
use common::{dec, line, TestHarness};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use stockflow::{
    config::InventoryConfig,
    db::with_unit_of_work,
    entities::inventory,
    errors::ServiceError,
    repositories::{inventory_repository::NegativeStockPolicy, InventoryFlowLog},
    services::stock_transfer::{CreateTransferRequest, StockTransferService},
};

fn spawn_transfers(
    harness: &TestHarness,
    quantities: &[i64],
) -> Vec<tokio::task::JoinHandle<Result<i32, ServiceError>>> {
    quantities
        .iter()
        .map(|&quantity| {
            let service: StockTransferService = harness.factory.stock_transfer_service();
            let ctx = harness.ctx;
            let request = CreateTransferRequest {
                number: None,
                out_warehouse_id: harness.warehouse_a,
                in_warehouse_id: harness.warehouse_b,
                goods: vec![line(harness.goods_x, quantity)],
                enable_auto_stock_out: true,
                enable_auto_stock_in: true,
                handler_id: None,
                remark: None,
            };
            tokio::spawn(async move {
                service
                    .create_transfer(&ctx, request)
                    .await
                    .map(|detail| detail.order.id)
            })
        })
        .collect()
}

async fn join_all(
    handles: Vec<tokio::task::JoinHandle<Result<i32, ServiceError>>>,
) -> Vec<Result<i32, ServiceError>> {
    futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task completes"))
        .collect()
}

#[tokio::test]
async fn competing_transfers_serialize_when_negative_stock_is_allowed() {
    let harness = TestHarness::new().await;
    harness.stock(harness.warehouse_a, harness.goods_x, 40).await;

    let results = join_all(spawn_transfers(&harness, &[30, 30])).await;
    assert!(results.iter().all(Result::is_ok));

    assert_eq!(harness.balance(harness.warehouse_a, harness.goods_x).await, dec(-20));
    assert_eq!(harness.balance(harness.warehouse_b, harness.goods_x).await, dec(60));

    // The second transfer saw the first one's result, not the stale 40.
    let history = InventoryFlowLog::new(harness.db.clone())
        .list_for_balance(harness.key(harness.warehouse_a, harness.goods_x))
        .await
        .expect("history");
    assert_eq!(history.len(), 2);
    assert_eq!((history[0].quantity_before, history[0].quantity_after), (dec(40), dec(10)));
    assert_eq!((history[1].quantity_before, history[1].quantity_after), (dec(10), dec(-20)));

    let inventory = harness
        .ledger()
        .find(harness.db.as_ref(), harness.key(harness.warehouse_a, harness.goods_x))
        .await
        .expect("row readable")
        .expect("row exists");
    assert!(!inventory.has_stock);
}

#[tokio::test]
async fn second_transfer_fails_when_negative_stock_is_rejected() {
    let harness = TestHarness::with_config(InventoryConfig {
        negative_stock: NegativeStockPolicy::Reject,
        ..Default::default()
    })
    .await;
    harness.stock(harness.warehouse_a, harness.goods_x, 40).await;

    let results = join_all(spawn_transfers(&harness, &[30, 30])).await;
    let succeeded = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(succeeded, 1);
    let failure = results
        .into_iter()
        .find_map(Result::err)
        .expect("one transfer refused");
    assert_matches!(failure, ServiceError::InvariantViolation(_));

    assert_eq!(harness.balance(harness.warehouse_a, harness.goods_x).await, dec(10));
    assert_eq!(harness.balance(harness.warehouse_b, harness.goods_x).await, dec(30));
    // The refused transfer rolled back completely, flows included.
    assert_eq!(harness.all_flows().await.len(), 2);
}

#[tokio::test]
async fn many_small_transfers_lose_no_updates() {
    let harness = TestHarness::new().await;
    harness.stock(harness.warehouse_a, harness.goods_x, 100).await;

    let quantities: Vec<i64> = (1..=12).collect();
    let results = join_all(spawn_transfers(&harness, &quantities)).await;
    assert!(results.iter().all(Result::is_ok));

    let moved: i64 = quantities.iter().sum();
    assert_eq!(
        harness.balance(harness.warehouse_a, harness.goods_x).await,
        dec(100 - moved)
    );
    assert_eq!(harness.balance(harness.warehouse_b, harness.goods_x).await, dec(moved));

    for warehouse_id in [harness.warehouse_a, harness.warehouse_b] {
        let history = InventoryFlowLog::new(harness.db.clone())
            .list_for_balance(harness.key(warehouse_id, harness.goods_x))
            .await
            .expect("history");
        assert_eq!(history.len(), quantities.len());
        for pair in history.windows(2) {
            assert_eq!(pair[0].quantity_after, pair[1].quantity_before);
        }
    }
}

#[tokio::test]
async fn first_lock_on_a_missing_row_creates_it_once() {
    let harness = TestHarness::new().await;
    let key = harness.key(harness.warehouse_b, harness.goods_y);

    for _ in 0..2 {
        let ledger = harness.ledger();
        let locked = with_unit_of_work(&harness.db, None, |uow| {
            Box::pin(async move { ledger.lock_rows(uow.conn(), [key, key]).await })
        })
        .await
        .expect("rows locked");
        assert_eq!(locked.len(), 1);
        assert_eq!(locked[&key].total_quantity, dec(0));
        assert!(!locked[&key].has_stock);
    }

    let rows = inventory::Entity::find()
        .filter(inventory::Column::WarehouseId.eq(harness.warehouse_b))
        .filter(inventory::Column::GoodsId.eq(harness.goods_y))
        .count(harness.db.as_ref())
        .await
        .expect("countable");
    assert_eq!(rows, 1);
}
