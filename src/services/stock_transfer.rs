use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use strum::{Display, EnumString};
use tracing::{error, info, instrument, warn};
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
    events::{Event, EventSender},
    quantity,
    repositories::{
        inventory_flow_repository::FlowCause,
        inventory_repository::InventoryKey,
        order_repository::{NewStockOrder, NewTransferOrder, OrderLine, TransferOrderDetail},
        CatalogRepository, InventoryFlowLog, InventoryLedger, OrderRepository,
    },
    services::{
        adjustment_events,
        numbering::{NumberScope, NumberingService},
        validate_positive_quantities, AppliedMovement, LineItem,
    },
};

/// How voiding a transfer treats inventory it has already moved.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VoidPolicy {
    /// Reverse applied deltas with compensating flows and cancel untouched
    /// deferred orders. Rejected once a deferred order has been fulfilled.
    #[default]
    Compensate,
    /// Only transfers that never moved inventory can be voided.
    RejectApplied,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_transfer_request"))]
pub struct CreateTransferRequest {
    /// Caller-chosen number, usually taken from a preview. Allocated when absent.
    #[validate(length(min = 1, max = 32))]
    pub number: Option<String>,
    pub out_warehouse_id: i32,
    pub in_warehouse_id: i32,
    #[validate(length(min = 1, message = "a transfer needs at least one line item"))]
    pub goods: Vec<LineItem>,
    pub enable_auto_stock_out: bool,
    pub enable_auto_stock_in: bool,
    pub handler_id: Option<i32>,
    #[validate(length(max = 256))]
    pub remark: Option<String>,
}

fn validate_transfer_request(request: &CreateTransferRequest) -> Result<(), ValidationError> {
    if request.out_warehouse_id == request.in_warehouse_id {
        let mut err = ValidationError::new("in_warehouse_id");
        err.message = Some("out and in warehouse must differ".into());
        return Err(err);
    }
    validate_positive_quantities(&request.goods)
}

/// A transfer written inside a unit of work, with the balance changes it made.
#[derive(Debug, Clone)]
pub struct TransferOutcome {
    pub detail: TransferOrderDetail,
    pub movements: Vec<AppliedMovement>,
}

/// Creates and voids stock transfers between two warehouses of one team.
#[derive(Clone)]
pub struct StockTransferService {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    ledger: InventoryLedger,
    flows: InventoryFlowLog,
    orders: OrderRepository,
    catalog: CatalogRepository,
    numbering: NumberingService,
    void_policy: VoidPolicy,
    lock_timeout: Option<Duration>,
}

impl StockTransferService {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, settings: &InventoryConfig) -> Self {
        Self {
            ledger: InventoryLedger::new(db_pool.clone(), settings.negative_stock),
            flows: InventoryFlowLog::new(db_pool.clone()),
            orders: OrderRepository::new(db_pool.clone()),
            catalog: CatalogRepository::new(db_pool.clone()),
            numbering: NumberingService::new(db_pool.clone()),
            void_policy: settings.void_policy,
            lock_timeout: settings.lock_timeout(),
            db_pool,
            event_sender,
        }
    }

    pub fn void_policy(&self) -> VoidPolicy {
        self.void_policy
    }

    /// Creates a transfer in its own unit of work.
    ///
    /// Either the header, line items, spawned orders, balance changes and
    /// flow rows all commit, or nothing does.
    #[instrument(skip(self, request), fields(team_id = ctx.team_id, out_warehouse_id = request.out_warehouse_id, in_warehouse_id = request.in_warehouse_id))]
    pub async fn create_transfer(
        &self,
        ctx: &RequestContext,
        request: CreateTransferRequest,
    ) -> Result<TransferOrderDetail, ServiceError> {
        request.validate()?;

        let uow = UnitOfWork::begin(&self.db_pool, self.lock_timeout).await?;
        let result = self.create_transfer_in(&uow, ctx, request).await;
        if let Err(e) = &result {
            error!(error = %e, "Stock transfer creation failed");
        }
        let outcome = uow.finish(result).await?;

        let order = &outcome.detail.order;
        info!(
            order_id = order.id,
            number = %order.number,
            total_quantity = %order.total_quantity,
            movements = outcome.movements.len(),
            "Stock transfer created"
        );

        let mut events = vec![Event::StockTransferCreated {
            team_id: ctx.team_id,
            order_id: order.id,
            number: order.number.clone(),
            total_quantity: order.total_quantity,
            timestamp: Utc::now(),
        }];
        events.extend(adjustment_events(ctx.team_id, &outcome.movements));
        self.event_sender.publish_all(events);

        Ok(outcome.detail)
    }

    /// Writes a transfer through a caller-owned unit of work. Nothing is
    /// committed and no events are sent.
    pub async fn create_transfer_in(
        &self,
        uow: &UnitOfWork,
        ctx: &RequestContext,
        request: CreateTransferRequest,
    ) -> Result<TransferOutcome, ServiceError> {
        request.validate()?;
        let conn = uow.conn();

        self.catalog
            .find_warehouse(conn, ctx.team_id, request.out_warehouse_id)
            .await?;
        self.catalog
            .find_warehouse(conn, ctx.team_id, request.in_warehouse_id)
            .await?;
        let goods_ids: Vec<i32> = request.goods.iter().map(|item| item.goods_id).collect();
        self.catalog
            .ensure_goods_exist(conn, ctx.team_id, &goods_ids)
            .await?;

        let lines: Vec<OrderLine> = request.goods.iter().copied().map(OrderLine::from).collect();
        let total_quantity = quantity::sum(lines.iter().map(|line| line.quantity))?;

        let number = match request.number {
            Some(number) => {
                self.numbering
                    .claim_number(conn, ctx.team_id, NumberScope::StockTransfer, &number)
                    .await?;
                number
            }
            None => {
                self.numbering
                    .next_number(conn, ctx.team_id, NumberScope::StockTransfer)
                    .await?
            }
        };

        let order = self
            .orders
            .insert_transfer(
                conn,
                ctx,
                NewTransferOrder {
                    number,
                    out_warehouse_id: request.out_warehouse_id,
                    in_warehouse_id: request.in_warehouse_id,
                    total_quantity,
                    enable_auto_stock_out: request.enable_auto_stock_out,
                    enable_auto_stock_in: request.enable_auto_stock_in,
                    handler_id: request.handler_id,
                    remark: request.remark,
                },
                &lines,
            )
            .await?;

        let stock_out_order = if order.enable_auto_stock_out {
            None
        } else {
            let number = self
                .numbering
                .next_number(conn, ctx.team_id, NumberScope::StockOut)
                .await?;
            Some(
                self.orders
                    .insert_stock_out_order(
                        conn,
                        ctx,
                        NewStockOrder {
                            number,
                            warehouse_id: order.out_warehouse_id,
                            order_type: StockOrderType::StockTransfer,
                            total_quantity,
                            stock_transfer_order_id: Some(order.id),
                        },
                    )
                    .await?,
            )
        };

        let stock_in_order = if order.enable_auto_stock_in {
            None
        } else {
            let number = self
                .numbering
                .next_number(conn, ctx.team_id, NumberScope::StockIn)
                .await?;
            Some(
                self.orders
                    .insert_stock_in_order(
                        conn,
                        ctx,
                        NewStockOrder {
                            number,
                            warehouse_id: order.in_warehouse_id,
                            order_type: StockOrderType::StockTransfer,
                            total_quantity,
                            stock_transfer_order_id: Some(order.id),
                        },
                    )
                    .await?,
            )
        };

        let order = self
            .orders
            .link_transfer_orders(
                conn,
                order,
                stock_out_order.as_ref().map(|o| o.id),
                stock_in_order.as_ref().map(|o| o.id),
            )
            .await?;

        let out_key = |goods_id| InventoryKey::new(ctx.team_id, order.out_warehouse_id, goods_id);
        let in_key = |goods_id| InventoryKey::new(ctx.team_id, order.in_warehouse_id, goods_id);

        let mut touched = BTreeSet::new();
        for line in &lines {
            if order.enable_auto_stock_out {
                touched.insert(out_key(line.goods_id));
            }
            if order.enable_auto_stock_in {
                touched.insert(in_key(line.goods_id));
            }
        }
        self.ledger.lock_rows(conn, touched).await?;

        let cause = FlowCause {
            reference_type: FlowReference::StockTransferOrder,
            reference_id: order.id,
            creator_id: ctx.user_id,
        };
        let mut movements = Vec::new();
        let mut flow_entries = Vec::new();
        let mut deferred_out = Vec::new();
        let mut deferred_in = Vec::new();

        for line in &lines {
            if order.enable_auto_stock_out {
                let change = self
                    .ledger
                    .apply_delta(conn, out_key(line.goods_id), quantity::negate(line.quantity))
                    .await?;
                flow_entries.push(InventoryFlowLog::entry(
                    &change,
                    FlowType::StockTransferOut,
                    cause,
                )?);
                movements.push(AppliedMovement {
                    flow_type: FlowType::StockTransferOut,
                    change,
                });
            } else {
                deferred_out.push(*line);
            }

            if order.enable_auto_stock_in {
                let change = self
                    .ledger
                    .apply_delta(conn, in_key(line.goods_id), line.quantity)
                    .await?;
                flow_entries.push(InventoryFlowLog::entry(
                    &change,
                    FlowType::StockTransferIn,
                    cause,
                )?);
                movements.push(AppliedMovement {
                    flow_type: FlowType::StockTransferIn,
                    change,
                });
            } else {
                deferred_in.push(*line);
            }
        }

        self.flows.record_many(conn, flow_entries).await?;
        if let Some(stock_out_order) = &stock_out_order {
            self.orders
                .insert_stock_out_goods(conn, ctx.team_id, stock_out_order.id, &deferred_out)
                .await?;
        }
        if let Some(stock_in_order) = &stock_in_order {
            self.orders
                .insert_stock_in_goods(conn, ctx.team_id, stock_in_order.id, &deferred_in)
                .await?;
        }

        let detail = self
            .orders
            .load_transfer_detail(conn, ctx.team_id, order.id)
            .await?;
        Ok(TransferOutcome { detail, movements })
    }

    /// Next transfer number for the team. Read-only; the number may be taken
    /// by the time it is submitted, which surfaces as `Conflict`.
    pub async fn preview_number(&self, ctx: &RequestContext) -> Result<String, ServiceError> {
        self.numbering
            .preview_number(ctx.team_id, NumberScope::StockTransfer)
            .await
    }

    pub async fn get_transfer(
        &self,
        ctx: &RequestContext,
        order_id: i32,
    ) -> Result<TransferOrderDetail, ServiceError> {
        self.orders.get_transfer_detail(ctx.team_id, order_id).await
    }

    /// Voids a transfer according to the configured [`VoidPolicy`].
    #[instrument(skip(self), fields(team_id = ctx.team_id, policy = %self.void_policy))]
    pub async fn void_transfer(
        &self,
        ctx: &RequestContext,
        order_id: i32,
    ) -> Result<TransferOrderDetail, ServiceError> {
        let uow = UnitOfWork::begin(&self.db_pool, self.lock_timeout).await?;
        let result = self.void_transfer_in(&uow, ctx, order_id).await;
        if let Err(e) = &result {
            warn!(error = %e, "Stock transfer void refused");
        }
        let outcome = uow.finish(result).await?;

        info!(
            order_id,
            compensations = outcome.movements.len(),
            "Stock transfer voided"
        );

        let mut events = vec![Event::StockTransferVoided {
            team_id: ctx.team_id,
            order_id,
            timestamp: Utc::now(),
        }];
        events.extend(adjustment_events(ctx.team_id, &outcome.movements));
        self.event_sender.publish_all(events);

        Ok(outcome.detail)
    }

    pub async fn void_transfer_in(
        &self,
        uow: &UnitOfWork,
        ctx: &RequestContext,
        order_id: i32,
    ) -> Result<TransferOutcome, ServiceError> {
        let conn = uow.conn();
        let order = self
            .orders
            .find_transfer_locked(conn, ctx.team_id, order_id)
            .await?;
        if order.is_void {
            return Err(ServiceError::InvalidOperation(format!(
                "stock transfer {} is already void",
                order.number
            )));
        }

        let stock_out_order = match order.stock_out_order_id {
            Some(id) => Some(self.orders.find_stock_out_locked(conn, ctx.team_id, id).await?),
            None => None,
        };
        let stock_in_order = match order.stock_in_order_id {
            Some(id) => Some(self.orders.find_stock_in_locked(conn, ctx.team_id, id).await?),
            None => None,
        };

        let fulfilled_out = stock_out_order
            .as_ref()
            .filter(|o| !o.is_void && !o.is_untouched())
            .map(|o| o.number.clone());
        let fulfilled_in = stock_in_order
            .as_ref()
            .filter(|o| !o.is_void && !o.is_untouched())
            .map(|o| o.number.clone());

        if let Some(number) = fulfilled_out.or(fulfilled_in) {
            return Err(ServiceError::InvalidOperation(format!(
                "stock transfer {} cannot be voided: deferred order {} has been fulfilled",
                order.number, number
            )));
        }

        let applied = order.enable_auto_stock_out || order.enable_auto_stock_in;
        if applied && self.void_policy == VoidPolicy::RejectApplied {
            return Err(ServiceError::InvalidOperation(format!(
                "stock transfer {} already moved inventory and cannot be voided",
                order.number
            )));
        }

        let movements = self.compensate_transfer(conn, ctx, order.id).await?;

        if let Some(stock_out_order) = stock_out_order.filter(|o| !o.is_void) {
            self.orders.mark_stock_out_void(conn, stock_out_order).await?;
        }
        if let Some(stock_in_order) = stock_in_order.filter(|o| !o.is_void) {
            self.orders.mark_stock_in_void(conn, stock_in_order).await?;
        }
        let order = self.orders.mark_transfer_void(conn, order).await?;

        let detail = self
            .orders
            .load_transfer_detail(conn, ctx.team_id, order.id)
            .await?;
        Ok(TransferOutcome { detail, movements })
    }

    /// Reverses every balance change the transfer logged, writing the
    /// offsetting flow for each.
    async fn compensate_transfer<C: sea_orm::ConnectionTrait>(
        &self,
        conn: &C,
        ctx: &RequestContext,
        order_id: i32,
    ) -> Result<Vec<AppliedMovement>, ServiceError> {
        let logged = self
            .flows
            .list_for_reference(conn, ctx.team_id, FlowReference::StockTransferOrder, order_id)
            .await?;

        let reversible: Vec<_> = logged
            .into_iter()
            .filter_map(|flow| flow.flow_type.compensation().map(|void_type| (flow, void_type)))
            .collect();
        if reversible.is_empty() {
            return Ok(Vec::new());
        }

        self.ledger
            .lock_rows(
                conn,
                reversible
                    .iter()
                    .map(|(flow, _)| InventoryKey::new(ctx.team_id, flow.warehouse_id, flow.goods_id)),
            )
            .await?;

        let cause = FlowCause {
            reference_type: FlowReference::StockTransferOrder,
            reference_id: order_id,
            creator_id: ctx.user_id,
        };
        let mut movements = Vec::with_capacity(reversible.len());
        let mut entries = Vec::with_capacity(reversible.len());
        for (flow, void_type) in reversible {
            let key = InventoryKey::new(ctx.team_id, flow.warehouse_id, flow.goods_id);
            let change = self
                .ledger
                .apply_delta(conn, key, quantity::negate(flow.quantity_change))
                .await?;
            entries.push(InventoryFlowLog::entry(&change, void_type, cause)?);
            movements.push(AppliedMovement {
                flow_type: void_type,
                change,
            });
        }
        self.flows.record_many(conn, entries).await?;

        Ok(movements)
    }
}
