use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::common::RequestContext;
use crate::entities::stock_in_goods::{self, Entity as StockInGoods};
use crate::entities::stock_in_order::{self, Entity as StockInOrder};
use crate::entities::stock_out_goods::{self, Entity as StockOutGoods};
use crate::entities::stock_out_order::{self, Entity as StockOutOrder};
use crate::entities::stock_transfer_goods::{self, Entity as StockTransferGoods};
use crate::entities::stock_transfer_order::{self, Entity as StockTransferOrder};
use crate::entities::StockOrderType;
use crate::errors::ServiceError;
use crate::quantity;

use super::{BaseRepository, Repository};

/// One `(goods, quantity)` line of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    pub goods_id: i32,
    pub quantity: Decimal,
}

/// Header fields of a new transfer order.
#[derive(Debug, Clone)]
pub struct NewTransferOrder {
    pub number: String,
    pub out_warehouse_id: i32,
    pub in_warehouse_id: i32,
    pub total_quantity: Decimal,
    pub enable_auto_stock_out: bool,
    pub enable_auto_stock_in: bool,
    pub handler_id: Option<i32>,
    pub remark: Option<String>,
}

/// Header fields of a new pending stock-in or stock-out order.
#[derive(Debug, Clone)]
pub struct NewStockOrder {
    pub number: String,
    pub warehouse_id: i32,
    pub order_type: StockOrderType,
    pub total_quantity: Decimal,
    pub stock_transfer_order_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockOutDetail {
    pub order: stock_out_order::Model,
    pub goods: Vec<stock_out_goods::Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockInDetail {
    pub order: stock_in_order::Model,
    pub goods: Vec<stock_in_goods::Model>,
}

/// A transfer with its line items and any spawned pending orders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransferOrderDetail {
    pub order: stock_transfer_order::Model,
    pub goods: Vec<stock_transfer_goods::Model>,
    pub stock_out_order: Option<StockOutDetail>,
    pub stock_in_order: Option<StockInDetail>,
}

/// Transfer, stock-in and stock-out documents (header + line items).
#[derive(Debug, Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    // ---- transfers -------------------------------------------------------

    #[instrument(skip(self, conn, header), fields(number = %header.number))]
    pub async fn insert_transfer<C: ConnectionTrait>(
        &self,
        conn: &C,
        ctx: &RequestContext,
        header: NewTransferOrder,
        lines: &[OrderLine],
    ) -> Result<stock_transfer_order::Model, ServiceError> {
        let order = stock_transfer_order::ActiveModel {
            number: Set(header.number),
            out_warehouse_id: Set(header.out_warehouse_id),
            in_warehouse_id: Set(header.in_warehouse_id),
            total_quantity: Set(header.total_quantity),
            enable_auto_stock_out: Set(header.enable_auto_stock_out),
            enable_auto_stock_in: Set(header.enable_auto_stock_in),
            stock_out_order_id: Set(None),
            stock_in_order_id: Set(None),
            handler_id: Set(header.handler_id),
            remark: Set(header.remark),
            is_void: Set(false),
            creator_id: Set(ctx.user_id),
            team_id: Set(ctx.team_id),
            create_time: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        let rows = lines.iter().map(|line| stock_transfer_goods::ActiveModel {
            stock_transfer_order_id: Set(order.id),
            goods_id: Set(line.goods_id),
            stock_transfer_quantity: Set(line.quantity),
            team_id: Set(ctx.team_id),
            ..Default::default()
        });
        StockTransferGoods::insert_many(rows).exec(conn).await?;

        debug!(order_id = order.id, lines = lines.len(), "Transfer order persisted");
        Ok(order)
    }

    /// Records the spawned pending orders on the transfer header.
    pub async fn link_transfer_orders<C: ConnectionTrait>(
        &self,
        conn: &C,
        order: stock_transfer_order::Model,
        stock_out_order_id: Option<i32>,
        stock_in_order_id: Option<i32>,
    ) -> Result<stock_transfer_order::Model, ServiceError> {
        if stock_out_order_id.is_none() && stock_in_order_id.is_none() {
            return Ok(order);
        }
        let mut active: stock_transfer_order::ActiveModel = order.into();
        active.stock_out_order_id = Set(stock_out_order_id);
        active.stock_in_order_id = Set(stock_in_order_id);
        Ok(active.update(conn).await?)
    }

    pub async fn find_transfer<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        order_id: i32,
    ) -> Result<stock_transfer_order::Model, ServiceError> {
        StockTransferOrder::find_by_id(order_id)
            .filter(stock_transfer_order::Column::TeamId.eq(team_id))
            .one(conn)
            .await?
            .ok_or_else(|| transfer_not_found(order_id))
    }

    /// Reads the transfer header under `FOR UPDATE`, serializing voids.
    pub async fn find_transfer_locked<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        order_id: i32,
    ) -> Result<stock_transfer_order::Model, ServiceError> {
        StockTransferOrder::find_by_id(order_id)
            .filter(stock_transfer_order::Column::TeamId.eq(team_id))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| transfer_not_found(order_id))
    }

    pub async fn transfer_lines<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: i32,
    ) -> Result<Vec<stock_transfer_goods::Model>, ServiceError> {
        Ok(StockTransferGoods::find()
            .filter(stock_transfer_goods::Column::StockTransferOrderId.eq(order_id))
            .order_by_asc(stock_transfer_goods::Column::Id)
            .all(conn)
            .await?)
    }

    pub async fn mark_transfer_void<C: ConnectionTrait>(
        &self,
        conn: &C,
        order: stock_transfer_order::Model,
    ) -> Result<stock_transfer_order::Model, ServiceError> {
        let mut active: stock_transfer_order::ActiveModel = order.into();
        active.is_void = Set(true);
        Ok(active.update(conn).await?)
    }

    pub async fn load_transfer_detail<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        order_id: i32,
    ) -> Result<TransferOrderDetail, ServiceError> {
        let order = self.find_transfer(conn, team_id, order_id).await?;
        let goods = self.transfer_lines(conn, order.id).await?;

        let stock_out_order = match order.stock_out_order_id {
            Some(id) => Some(self.load_stock_out_detail(conn, team_id, id).await?),
            None => None,
        };
        let stock_in_order = match order.stock_in_order_id {
            Some(id) => Some(self.load_stock_in_detail(conn, team_id, id).await?),
            None => None,
        };

        Ok(TransferOrderDetail {
            order,
            goods,
            stock_out_order,
            stock_in_order,
        })
    }

    /// Read-only detail outside any unit of work.
    pub async fn get_transfer_detail(
        &self,
        team_id: i32,
        order_id: i32,
    ) -> Result<TransferOrderDetail, ServiceError> {
        self.load_transfer_detail(self.base.get_db(), team_id, order_id)
            .await
    }

    // ---- stock-out -------------------------------------------------------

    #[instrument(skip(self, conn, header), fields(number = %header.number))]
    pub async fn insert_stock_out_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        ctx: &RequestContext,
        header: NewStockOrder,
    ) -> Result<stock_out_order::Model, ServiceError> {
        Ok(stock_out_order::ActiveModel {
            number: Set(header.number),
            warehouse_id: Set(header.warehouse_id),
            order_type: Set(header.order_type),
            total_quantity: Set(header.total_quantity),
            remain_quantity: Set(header.total_quantity),
            stock_transfer_order_id: Set(header.stock_transfer_order_id),
            is_completed: Set(false),
            is_void: Set(false),
            creator_id: Set(ctx.user_id),
            team_id: Set(ctx.team_id),
            create_time: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?)
    }

    /// Pending line items, each seeded with `remain = quantity`.
    pub async fn insert_stock_out_goods<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        order_id: i32,
        lines: &[OrderLine],
    ) -> Result<(), ServiceError> {
        if lines.is_empty() {
            return Ok(());
        }
        let rows = lines.iter().map(|line| stock_out_goods::ActiveModel {
            stock_out_order_id: Set(order_id),
            goods_id: Set(line.goods_id),
            stock_out_quantity: Set(line.quantity),
            remain_quantity: Set(line.quantity),
            is_completed: Set(false),
            team_id: Set(team_id),
            ..Default::default()
        });
        StockOutGoods::insert_many(rows).exec(conn).await?;
        Ok(())
    }

    pub async fn find_stock_out_locked<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        order_id: i32,
    ) -> Result<stock_out_order::Model, ServiceError> {
        StockOutOrder::find_by_id(order_id)
            .filter(stock_out_order::Column::TeamId.eq(team_id))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("stock-out order {} not found", order_id)))
    }

    pub async fn stock_out_lines<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: i32,
    ) -> Result<Vec<stock_out_goods::Model>, ServiceError> {
        Ok(StockOutGoods::find()
            .filter(stock_out_goods::Column::StockOutOrderId.eq(order_id))
            .order_by_asc(stock_out_goods::Column::Id)
            .all(conn)
            .await?)
    }

    pub async fn load_stock_out_detail<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        order_id: i32,
    ) -> Result<StockOutDetail, ServiceError> {
        let order = StockOutOrder::find_by_id(order_id)
            .filter(stock_out_order::Column::TeamId.eq(team_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("stock-out order {} not found", order_id)))?;
        let goods = self.stock_out_lines(conn, order.id).await?;
        Ok(StockOutDetail { order, goods })
    }

    /// Draws `quantity` from a line; completes it when nothing remains.
    pub async fn consume_stock_out_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        line: stock_out_goods::Model,
        quantity: Decimal,
    ) -> Result<stock_out_goods::Model, ServiceError> {
        let remain = draw(line.remain_quantity, quantity, line.goods_id)?;
        let mut active: stock_out_goods::ActiveModel = line.into();
        active.remain_quantity = Set(remain);
        active.is_completed = Set(remain == Decimal::ZERO);
        Ok(active.update(conn).await?)
    }

    pub async fn consume_stock_out_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        order: stock_out_order::Model,
        quantity: Decimal,
    ) -> Result<stock_out_order::Model, ServiceError> {
        let remain = quantity::subtract(order.remain_quantity, quantity)?;
        let mut active: stock_out_order::ActiveModel = order.into();
        active.remain_quantity = Set(remain);
        active.is_completed = Set(remain == Decimal::ZERO);
        Ok(active.update(conn).await?)
    }

    pub async fn mark_stock_out_void<C: ConnectionTrait>(
        &self,
        conn: &C,
        order: stock_out_order::Model,
    ) -> Result<stock_out_order::Model, ServiceError> {
        let mut active: stock_out_order::ActiveModel = order.into();
        active.is_void = Set(true);
        Ok(active.update(conn).await?)
    }

    // ---- stock-in --------------------------------------------------------

    #[instrument(skip(self, conn, header), fields(number = %header.number))]
    pub async fn insert_stock_in_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        ctx: &RequestContext,
        header: NewStockOrder,
    ) -> Result<stock_in_order::Model, ServiceError> {
        Ok(stock_in_order::ActiveModel {
            number: Set(header.number),
            warehouse_id: Set(header.warehouse_id),
            order_type: Set(header.order_type),
            total_quantity: Set(header.total_quantity),
            remain_quantity: Set(header.total_quantity),
            stock_transfer_order_id: Set(header.stock_transfer_order_id),
            is_completed: Set(false),
            is_void: Set(false),
            creator_id: Set(ctx.user_id),
            team_id: Set(ctx.team_id),
            create_time: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?)
    }

    pub async fn insert_stock_in_goods<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        order_id: i32,
        lines: &[OrderLine],
    ) -> Result<(), ServiceError> {
        if lines.is_empty() {
            return Ok(());
        }
        let rows = lines.iter().map(|line| stock_in_goods::ActiveModel {
            stock_in_order_id: Set(order_id),
            goods_id: Set(line.goods_id),
            stock_in_quantity: Set(line.quantity),
            remain_quantity: Set(line.quantity),
            is_completed: Set(false),
            team_id: Set(team_id),
            ..Default::default()
        });
        StockInGoods::insert_many(rows).exec(conn).await?;
        Ok(())
    }

    pub async fn find_stock_in_locked<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        order_id: i32,
    ) -> Result<stock_in_order::Model, ServiceError> {
        StockInOrder::find_by_id(order_id)
            .filter(stock_in_order::Column::TeamId.eq(team_id))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("stock-in order {} not found", order_id)))
    }

    pub async fn stock_in_lines<C: ConnectionTrait>(
        &self,
        conn: &C,
        order_id: i32,
    ) -> Result<Vec<stock_in_goods::Model>, ServiceError> {
        Ok(StockInGoods::find()
            .filter(stock_in_goods::Column::StockInOrderId.eq(order_id))
            .order_by_asc(stock_in_goods::Column::Id)
            .all(conn)
            .await?)
    }

    pub async fn load_stock_in_detail<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        order_id: i32,
    ) -> Result<StockInDetail, ServiceError> {
        let order = StockInOrder::find_by_id(order_id)
            .filter(stock_in_order::Column::TeamId.eq(team_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("stock-in order {} not found", order_id)))?;
        let goods = self.stock_in_lines(conn, order.id).await?;
        Ok(StockInDetail { order, goods })
    }

    pub async fn consume_stock_in_line<C: ConnectionTrait>(
        &self,
        conn: &C,
        line: stock_in_goods::Model,
        quantity: Decimal,
    ) -> Result<stock_in_goods::Model, ServiceError> {
        let remain = draw(line.remain_quantity, quantity, line.goods_id)?;
        let mut active: stock_in_goods::ActiveModel = line.into();
        active.remain_quantity = Set(remain);
        active.is_completed = Set(remain == Decimal::ZERO);
        Ok(active.update(conn).await?)
    }

    pub async fn consume_stock_in_order<C: ConnectionTrait>(
        &self,
        conn: &C,
        order: stock_in_order::Model,
        quantity: Decimal,
    ) -> Result<stock_in_order::Model, ServiceError> {
        let remain = quantity::subtract(order.remain_quantity, quantity)?;
        let mut active: stock_in_order::ActiveModel = order.into();
        active.remain_quantity = Set(remain);
        active.is_completed = Set(remain == Decimal::ZERO);
        Ok(active.update(conn).await?)
    }

    pub async fn mark_stock_in_void<C: ConnectionTrait>(
        &self,
        conn: &C,
        order: stock_in_order::Model,
    ) -> Result<stock_in_order::Model, ServiceError> {
        let mut active: stock_in_order::ActiveModel = order.into();
        active.is_void = Set(true);
        Ok(active.update(conn).await?)
    }
}

fn transfer_not_found(order_id: i32) -> ServiceError {
    ServiceError::NotFound(format!("stock transfer order {} not found", order_id))
}

/// `remain - quantity`, refusing to overdraw a line.
fn draw(remain: Decimal, quantity: Decimal, goods_id: i32) -> Result<Decimal, ServiceError> {
    if quantity > remain {
        return Err(ServiceError::ValidationError(format!(
            "goods {}: quantity {} exceeds remaining {}",
            goods_id, quantity, remain
        )));
    }
    quantity::subtract(remain, quantity)
}
