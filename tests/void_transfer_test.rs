mod common;

use assert_matches::assert_matches;
use common::{dec, line, TestHarness, USER};
use stockflow::{
    config::InventoryConfig,
    entities::inventory_flow::{FlowReference, FlowType},
    errors::ServiceError,
    events::Event,
    services::{
        stock_movement::FulfillRequest,
        stock_transfer::{CreateTransferRequest, VoidPolicy},
    },
};

fn request(harness: &TestHarness, quantity: i64, auto: bool) -> CreateTransferRequest {
    CreateTransferRequest {
        number: None,
        out_warehouse_id: harness.warehouse_a,
        in_warehouse_id: harness.warehouse_b,
        goods: vec![line(harness.goods_x, quantity)],
        enable_auto_stock_out: auto,
        enable_auto_stock_in: auto,
        handler_id: None,
        remark: Some("restock overflow".into()),
    }
}

#[tokio::test]
async fn compensation_restores_balances_and_logs_offsetting_flows() {
    let mut harness = TestHarness::new().await;
    harness.stock(harness.warehouse_a, harness.goods_x, 50).await;
    harness.stock(harness.warehouse_b, harness.goods_x, 5).await;

    let service = harness.factory.stock_transfer_service();
    let created = service
        .create_transfer(&harness.ctx, request(&harness, 10, true))
        .await
        .expect("transfer created");
    harness.drain_events();

    let voided = service
        .void_transfer(&harness.ctx, created.order.id)
        .await
        .expect("transfer voided");
    assert!(voided.order.is_void);

    assert_eq!(harness.balance(harness.warehouse_a, harness.goods_x).await, dec(50));
    assert_eq!(harness.balance(harness.warehouse_b, harness.goods_x).await, dec(5));

    let flows = harness
        .flows_for(FlowReference::StockTransferOrder, created.order.id)
        .await;
    assert_eq!(flows.len(), 4);
    let types: Vec<FlowType> = flows.iter().map(|f| f.flow_type).collect();
    assert!(types.contains(&FlowType::VoidStockTransferOut));
    assert!(types.contains(&FlowType::VoidStockTransferIn));

    let restore_out = flows
        .iter()
        .find(|f| f.flow_type == FlowType::VoidStockTransferOut)
        .expect("compensating outbound flow");
    assert_eq!(restore_out.warehouse_id, harness.warehouse_a);
    assert_eq!(
        (restore_out.quantity_before, restore_out.quantity_change, restore_out.quantity_after),
        (dec(40), dec(10), dec(50))
    );
    assert_eq!(restore_out.creator_id, USER);

    let net: rust_decimal::Decimal = flows.iter().map(|f| f.quantity_change).sum();
    assert_eq!(net, dec(0));

    let events = harness.drain_events();
    assert_matches!(events.first(), Some(Event::StockTransferVoided { order_id, .. }) if *order_id == created.order.id);
    assert_eq!(events.len(), 3);
}

#[tokio::test]
async fn voiding_a_deferred_transfer_voids_its_pending_orders() {
    let harness = TestHarness::new().await;
    let service = harness.factory.stock_transfer_service();

    let created = service
        .create_transfer(&harness.ctx, request(&harness, 10, false))
        .await
        .expect("transfer created");

    let voided = service
        .void_transfer(&harness.ctx, created.order.id)
        .await
        .expect("transfer voided");

    assert!(voided.order.is_void);
    assert!(voided.stock_out_order.expect("stock-out order").order.is_void);
    assert!(voided.stock_in_order.expect("stock-in order").order.is_void);
    assert!(harness.all_flows().await.is_empty());
}

#[tokio::test]
async fn void_is_refused_once_a_deferred_order_was_fulfilled() {
    let harness = TestHarness::new().await;
    harness.stock(harness.warehouse_a, harness.goods_x, 50).await;

    let service = harness.factory.stock_transfer_service();
    let created = service
        .create_transfer(&harness.ctx, request(&harness, 10, false))
        .await
        .expect("transfer created");
    let stock_out_id = created
        .stock_out_order
        .as_ref()
        .expect("stock-out order")
        .order
        .id;

    harness
        .factory
        .stock_movement_service()
        .fulfill_stock_out(
            &harness.ctx,
            FulfillRequest {
                order_id: stock_out_id,
                goods: vec![line(harness.goods_x, 4)],
            },
        )
        .await
        .expect("partial shipment");

    let result = service.void_transfer(&harness.ctx, created.order.id).await;
    assert_matches!(result, Err(ServiceError::InvalidOperation(_)));

    let still = service
        .get_transfer(&harness.ctx, created.order.id)
        .await
        .expect("transfer readable");
    assert!(!still.order.is_void);
    assert!(!still.stock_out_order.expect("stock-out order").order.is_void);
    assert_eq!(harness.balance(harness.warehouse_a, harness.goods_x).await, dec(46));
}

#[tokio::test]
async fn voiding_twice_is_invalid() {
    let harness = TestHarness::new().await;
    let service = harness.factory.stock_transfer_service();

    let created = service
        .create_transfer(&harness.ctx, request(&harness, 3, false))
        .await
        .expect("transfer created");
    service
        .void_transfer(&harness.ctx, created.order.id)
        .await
        .expect("first void");

    assert_matches!(
        service.void_transfer(&harness.ctx, created.order.id).await,
        Err(ServiceError::InvalidOperation(_))
    );
}

#[tokio::test]
async fn reject_applied_policy_refuses_auto_transfers() {
    let harness = TestHarness::with_config(InventoryConfig {
        void_policy: VoidPolicy::RejectApplied,
        ..Default::default()
    })
    .await;
    harness.stock(harness.warehouse_a, harness.goods_x, 50).await;

    let service = harness.factory.stock_transfer_service();
    assert_eq!(service.void_policy(), VoidPolicy::RejectApplied);

    let applied = service
        .create_transfer(&harness.ctx, request(&harness, 10, true))
        .await
        .expect("auto transfer");
    assert_matches!(
        service.void_transfer(&harness.ctx, applied.order.id).await,
        Err(ServiceError::InvalidOperation(_))
    );
    assert_eq!(harness.balance(harness.warehouse_a, harness.goods_x).await, dec(40));

    let deferred = service
        .create_transfer(&harness.ctx, request(&harness, 10, false))
        .await
        .expect("deferred transfer");
    let voided = service
        .void_transfer(&harness.ctx, deferred.order.id)
        .await
        .expect("untouched deferred transfer can be voided");
    assert!(voided.order.is_void);
}

#[tokio::test]
async fn missing_transfer_is_not_found() {
    let harness = TestHarness::new().await;
    assert_matches!(
        harness
            .factory
            .stock_transfer_service()
            .void_transfer(&harness.ctx, 4_242)
            .await,
        Err(ServiceError::NotFound(_))
    );
}
