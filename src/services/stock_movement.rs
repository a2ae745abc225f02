use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, instrument};
use validator::{Validate, ValidationError};

use crate::{
    common::RequestContext,
    config::InventoryConfig,
    db::{DbPool, UnitOfWork},
    entities::{
        inventory_flow::{FlowReference, FlowType},
        StockOrderType,
    },
    errors::ServiceError,
    events::EventSender,
    quantity,
    repositories::{
        inventory_flow_repository::FlowCause,
        inventory_repository::InventoryKey,
        order_repository::{NewStockOrder, OrderLine, StockInDetail, StockOutDetail},
        CatalogRepository, InventoryFlowLog, InventoryLedger, OrderRepository,
    },
    services::{
        adjustment_events,
        numbering::{NumberScope, NumberingService},
        validate_positive_quantities, AppliedMovement, LineItem,
    },
};

/// A standalone stock-in or stock-out order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_stock_order_request"))]
pub struct CreateStockOrderRequest {
    pub warehouse_id: i32,
    #[validate(length(min = 1, message = "an order needs at least one line item"))]
    pub goods: Vec<LineItem>,
}

fn validate_stock_order_request(request: &CreateStockOrderRequest) -> Result<(), ValidationError> {
    validate_positive_quantities(&request.goods)
}

/// Quantities to draw from a pending order's lines.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_fulfill_request"))]
pub struct FulfillRequest {
    pub order_id: i32,
    #[validate(length(min = 1, message = "nothing to fulfill"))]
    pub goods: Vec<LineItem>,
}

fn validate_fulfill_request(request: &FulfillRequest) -> Result<(), ValidationError> {
    validate_positive_quantities(&request.goods)
}

/// Per-goods totals, so repeated goods in one request draw once.
fn merge_items(items: &[LineItem]) -> Result<BTreeMap<i32, Decimal>, ServiceError> {
    let mut merged = BTreeMap::new();
    for item in items {
        let entry = merged.entry(item.goods_id).or_insert(Decimal::ZERO);
        *entry = quantity::add(*entry, item.quantity)?;
    }
    Ok(merged)
}

/// Splits `wanted` across lines holding `(line_id, remain)`, first line first.
fn allocate_draws(
    goods_id: i32,
    wanted: Decimal,
    remains: &[(i32, Decimal)],
) -> Result<Vec<(i32, Decimal)>, ServiceError> {
    let mut left = wanted;
    let mut draws = Vec::new();
    for &(line_id, remain) in remains {
        if left == Decimal::ZERO {
            break;
        }
        if remain <= Decimal::ZERO {
            continue;
        }
        let take = left.min(remain);
        draws.push((line_id, take));
        left = quantity::subtract(left, take)?;
    }
    if left > Decimal::ZERO {
        return Err(ServiceError::ValidationError(format!(
            "goods {}: quantity {} exceeds what remains on the order",
            goods_id, wanted
        )));
    }
    Ok(draws)
}

/// Manual stock-in/stock-out orders and fulfillment of pending orders.
///
/// Fulfillment moves inventory through the same ledger and flow log as
/// transfers: rows are locked in key order, every balance change gets a
/// flow row, and the whole call is one unit of work.
#[derive(Clone)]
pub struct StockMovementService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    ledger: InventoryLedger,
    flows: InventoryFlowLog,
    orders: OrderRepository,
    catalog: CatalogRepository,
    numbering: NumberingService,
    lock_timeout: Option<Duration>,
}

impl StockMovementService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, settings: &InventoryConfig) -> Self {
        Self {
            ledger: InventoryLedger::new(db_pool.clone(), settings.negative_stock),
            flows: InventoryFlowLog::new(db_pool.clone()),
            orders: OrderRepository::new(db_pool.clone()),
            catalog: CatalogRepository::new(db_pool.clone()),
            numbering: NumberingService::new(db_pool.clone()),
            lock_timeout: settings.lock_timeout(),
            db_pool,
            event_sender,
        }
    }

    async fn validate_targets<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        ctx: &RequestContext,
        request: &CreateStockOrderRequest,
    ) -> Result<(Vec<OrderLine>, Decimal), ServiceError> {
        self.catalog
            .find_warehouse(conn, ctx.team_id, request.warehouse_id)
            .await?;
        let goods_ids: Vec<i32> = request.goods.iter().map(|item| item.goods_id).collect();
        self.catalog
            .ensure_goods_exist(conn, ctx.team_id, &goods_ids)
            .await?;

        let lines: Vec<OrderLine> = request.goods.iter().copied().map(OrderLine::from).collect();
        let total = quantity::sum(lines.iter().map(|line| line.quantity))?;
        Ok((lines, total))
    }

    #[instrument(skip(self, request), fields(team_id = ctx.team_id, warehouse_id = request.warehouse_id))]
    pub async fn create_stock_out_order(
        &self,
        ctx: &RequestContext,
        request: CreateStockOrderRequest,
    ) -> Result<StockOutDetail, ServiceError> {
        request.validate()?;

        let uow = UnitOfWork::begin(&self.db_pool, self.lock_timeout).await?;
        let result = async {
            let conn = uow.conn();
            let (lines, total_quantity) = self.validate_targets(conn, ctx, &request).await?;
            let number = self
                .numbering
                .next_number(conn, ctx.team_id, NumberScope::StockOut)
                .await?;
            let order = self
                .orders
                .insert_stock_out_order(
                    conn,
                    ctx,
                    NewStockOrder {
                        number,
                        warehouse_id: request.warehouse_id,
                        order_type: StockOrderType::Manual,
                        total_quantity,
                        stock_transfer_order_id: None,
                    },
                )
                .await?;
            self.orders
                .insert_stock_out_goods(conn, ctx.team_id, order.id, &lines)
                .await?;
            self.orders
                .load_stock_out_detail(conn, ctx.team_id, order.id)
                .await
        }
        .await;

        let detail = uow.finish(result).await?;
        info!(order_id = detail.order.id, number = %detail.order.number, "Stock-out order created");
        Ok(detail)
    }

    #[instrument(skip(self, request), fields(team_id = ctx.team_id, warehouse_id = request.warehouse_id))]
    pub async fn create_stock_in_order(
        &self,
        ctx: &RequestContext,
        request: CreateStockOrderRequest,
    ) -> Result<StockInDetail, ServiceError> {
        request.validate()?;

        let uow = UnitOfWork::begin(&self.db_pool, self.lock_timeout).await?;
        let result = async {
            let conn = uow.conn();
            let (lines, total_quantity) = self.validate_targets(conn, ctx, &request).await?;
            let number = self
                .numbering
                .next_number(conn, ctx.team_id, NumberScope::StockIn)
                .await?;
            let order = self
                .orders
                .insert_stock_in_order(
                    conn,
                    ctx,
                    NewStockOrder {
                        number,
                        warehouse_id: request.warehouse_id,
                        order_type: StockOrderType::Manual,
                        total_quantity,
                        stock_transfer_order_id: None,
                    },
                )
                .await?;
            self.orders
                .insert_stock_in_goods(conn, ctx.team_id, order.id, &lines)
                .await?;
            self.orders
                .load_stock_in_detail(conn, ctx.team_id, order.id)
                .await
        }
        .await;

        let detail = uow.finish(result).await?;
        info!(order_id = detail.order.id, number = %detail.order.number, "Stock-in order created");
        Ok(detail)
    }

    /// Ships goods out of a pending stock-out order.
    #[instrument(skip(self, request), fields(team_id = ctx.team_id, order_id = request.order_id))]
    pub async fn fulfill_stock_out(
        &self,
        ctx: &RequestContext,
        request: FulfillRequest,
    ) -> Result<StockOutDetail, ServiceError> {
        request.validate()?;

        let uow = UnitOfWork::begin(&self.db_pool, self.lock_timeout).await?;
        let result = self.fulfill_stock_out_in(&uow, ctx, &request).await;
        if let Err(e) = &result {
            error!(error = %e, "Stock-out fulfillment failed");
        }
        let (detail, movements) = uow.finish(result).await?;

        info!(
            remain_quantity = %detail.order.remain_quantity,
            is_completed = detail.order.is_completed,
            "Stock-out order fulfilled"
        );
        self.event_sender
            .publish_all(adjustment_events(ctx.team_id, &movements));
        Ok(detail)
    }

    pub async fn fulfill_stock_out_in(
        &self,
        uow: &UnitOfWork,
        ctx: &RequestContext,
        request: &FulfillRequest,
    ) -> Result<(StockOutDetail, Vec<AppliedMovement>), ServiceError> {
        let conn = uow.conn();
        let order = self
            .orders
            .find_stock_out_locked(conn, ctx.team_id, request.order_id)
            .await?;
        if order.is_void {
            return Err(ServiceError::InvalidOperation(format!(
                "stock-out order {} is void",
                order.number
            )));
        }
        if order.is_completed {
            return Err(ServiceError::InvalidOperation(format!(
                "stock-out order {} is already completed",
                order.number
            )));
        }

        let wanted = merge_items(&request.goods)?;
        let mut lines: BTreeMap<i32, _> = self
            .orders
            .stock_out_lines(conn, order.id)
            .await?
            .into_iter()
            .map(|line| (line.id, line))
            .collect();

        let mut draws = Vec::new();
        for (&goods_id, &quantity) in &wanted {
            let remains: Vec<(i32, Decimal)> = lines
                .values()
                .filter(|line| line.goods_id == goods_id)
                .map(|line| (line.id, line.remain_quantity))
                .collect();
            if remains.is_empty() {
                return Err(ServiceError::ValidationError(format!(
                    "goods {} is not on stock-out order {}",
                    goods_id, order.number
                )));
            }
            draws.extend(allocate_draws(goods_id, quantity, &remains)?);
        }

        self.ledger
            .lock_rows(
                conn,
                wanted
                    .keys()
                    .map(|&goods_id| InventoryKey::new(ctx.team_id, order.warehouse_id, goods_id)),
            )
            .await?;

        for (line_id, take) in draws {
            if let Some(line) = lines.remove(&line_id) {
                let updated = self.orders.consume_stock_out_line(conn, line, take).await?;
                lines.insert(line_id, updated);
            }
        }

        let cause = FlowCause {
            reference_type: FlowReference::StockOutOrder,
            reference_id: order.id,
            creator_id: ctx.user_id,
        };
        let mut movements = Vec::with_capacity(wanted.len());
        let mut entries = Vec::with_capacity(wanted.len());
        for (&goods_id, &quantity) in &wanted {
            let key = InventoryKey::new(ctx.team_id, order.warehouse_id, goods_id);
            let change = self
                .ledger
                .apply_delta(conn, key, quantity::negate(quantity))
                .await?;
            entries.push(InventoryFlowLog::entry(&change, FlowType::StockOut, cause)?);
            movements.push(AppliedMovement {
                flow_type: FlowType::StockOut,
                change,
            });
        }
        self.flows.record_many(conn, entries).await?;

        let drawn = quantity::sum(wanted.values().copied())?;
        let order = self.orders.consume_stock_out_order(conn, order, drawn).await?;

        let detail = self
            .orders
            .load_stock_out_detail(conn, ctx.team_id, order.id)
            .await?;
        Ok((detail, movements))
    }

    /// Receives goods into the warehouse of a pending stock-in order.
    #[instrument(skip(self, request), fields(team_id = ctx.team_id, order_id = request.order_id))]
    pub async fn fulfill_stock_in(
        &self,
        ctx: &RequestContext,
        request: FulfillRequest,
    ) -> Result<StockInDetail, ServiceError> {
        request.validate()?;

        let uow = UnitOfWork::begin(&self.db_pool, self.lock_timeout).await?;
        let result = self.fulfill_stock_in_in(&uow, ctx, &request).await;
        if let Err(e) = &result {
            error!(error = %e, "Stock-in fulfillment failed");
        }
        let (detail, movements) = uow.finish(result).await?;

        info!(
            remain_quantity = %detail.order.remain_quantity,
            is_completed = detail.order.is_completed,
            "Stock-in order fulfilled"
        );
        self.event_sender
            .publish_all(adjustment_events(ctx.team_id, &movements));
        Ok(detail)
    }

    pub async fn fulfill_stock_in_in(
        &self,
        uow: &UnitOfWork,
        ctx: &RequestContext,
        request: &FulfillRequest,
    ) -> Result<(StockInDetail, Vec<AppliedMovement>), ServiceError> {
        let conn = uow.conn();
        let order = self
            .orders
            .find_stock_in_locked(conn, ctx.team_id, request.order_id)
            .await?;
        if order.is_void {
            return Err(ServiceError::InvalidOperation(format!(
                "stock-in order {} is void",
                order.number
            )));
        }
        if order.is_completed {
            return Err(ServiceError::InvalidOperation(format!(
                "stock-in order {} is already completed",
                order.number
            )));
        }

        let wanted = merge_items(&request.goods)?;
        let mut lines: BTreeMap<i32, _> = self
            .orders
            .stock_in_lines(conn, order.id)
            .await?
            .into_iter()
            .map(|line| (line.id, line))
            .collect();

        let mut draws = Vec::new();
        for (&goods_id, &quantity) in &wanted {
            let remains: Vec<(i32, Decimal)> = lines
                .values()
                .filter(|line| line.goods_id == goods_id)
                .map(|line| (line.id, line.remain_quantity))
                .collect();
            if remains.is_empty() {
                return Err(ServiceError::ValidationError(format!(
                    "goods {} is not on stock-in order {}",
                    goods_id, order.number
                )));
            }
            draws.extend(allocate_draws(goods_id, quantity, &remains)?);
        }

        self.ledger
            .lock_rows(
                conn,
                wanted
                    .keys()
                    .map(|&goods_id| InventoryKey::new(ctx.team_id, order.warehouse_id, goods_id)),
            )
            .await?;

        for (line_id, take) in draws {
            if let Some(line) = lines.remove(&line_id) {
                let updated = self.orders.consume_stock_in_line(conn, line, take).await?;
                lines.insert(line_id, updated);
            }
        }

        let cause = FlowCause {
            reference_type: FlowReference::StockInOrder,
            reference_id: order.id,
            creator_id: ctx.user_id,
        };
        let mut movements = Vec::with_capacity(wanted.len());
        let mut entries = Vec::with_capacity(wanted.len());
        for (&goods_id, &quantity) in &wanted {
            let key = InventoryKey::new(ctx.team_id, order.warehouse_id, goods_id);
            let change = self.ledger.apply_delta(conn, key, quantity).await?;
            entries.push(InventoryFlowLog::entry(&change, FlowType::StockIn, cause)?);
            movements.push(AppliedMovement {
                flow_type: FlowType::StockIn,
                change,
            });
        }
        self.flows.record_many(conn, entries).await?;

        let received = quantity::sum(wanted.values().copied())?;
        let order = self.orders.consume_stock_in_order(conn, order, received).await?;

        let detail = self
            .orders
            .load_stock_in_detail(conn, ctx.team_id, order.id)
            .await?;
        Ok((detail, movements))
    }
}
