use chrono::{Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::common::RequestContext;
use crate::entities::batch::{self, Entity as Batch, Model as BatchModel};
use crate::entities::DerivedStock;
use crate::errors::ServiceError;
use crate::quantity;

use super::catalog_repository::CatalogRepository;
use super::{BaseRepository, Repository};

#[derive(Debug, Clone)]
pub struct NewBatch {
    pub number: String,
    pub warehouse_id: i32,
    pub goods_id: i32,
    pub total_quantity: Decimal,
    /// Defaults to `total_quantity`
    pub remain_quantity: Option<Decimal>,
    pub production_date: Option<NaiveDate>,
    /// Defaults to the goods' shelf life
    pub shelf_life_days: Option<i32>,
    /// Derived from production date and shelf life when absent
    pub expiration_date: Option<NaiveDate>,
}

/// Batches of batch-controlled goods. Tracks dates and remaining quantity
/// only; no cost allocation.
#[derive(Debug, Clone)]
pub struct BatchRepository {
    base: BaseRepository,
    catalog: CatalogRepository,
}

impl BatchRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            catalog: CatalogRepository::new(db.clone()),
            base: BaseRepository::new(db),
        }
    }

    #[instrument(skip(self, conn, new), fields(team_id = ctx.team_id, number = %new.number))]
    pub async fn create_batch<C: ConnectionTrait>(
        &self,
        conn: &C,
        ctx: &RequestContext,
        new: NewBatch,
    ) -> Result<BatchModel, ServiceError> {
        let goods = self
            .catalog
            .find_goods(conn, ctx.team_id, new.goods_id)
            .await?;
        self.catalog
            .find_warehouse(conn, ctx.team_id, new.warehouse_id)
            .await?;

        if !goods.enable_batch_control {
            return Err(ServiceError::InvalidOperation(format!(
                "goods {} is not under batch control",
                goods.number
            )));
        }

        let remain = new.remain_quantity.unwrap_or(new.total_quantity);
        validate_quantities(new.total_quantity, remain)?;

        let shelf_life_days = new.shelf_life_days.or(goods.shelf_life_days);
        let expiration_date = new
            .expiration_date
            .or_else(|| derive_expiration(new.production_date, shelf_life_days));

        let mut row = batch::ActiveModel {
            number: Set(new.number),
            warehouse_id: Set(new.warehouse_id),
            goods_id: Set(new.goods_id),
            total_quantity: Set(new.total_quantity),
            remain_quantity: Set(remain),
            production_date: Set(new.production_date),
            shelf_life_days: Set(shelf_life_days),
            expiration_date: Set(expiration_date),
            create_time: Set(Utc::now()),
            team_id: Set(ctx.team_id),
            ..Default::default()
        };
        row.sync_has_stock();

        Ok(row.insert(conn).await?)
    }

    /// Takes `quantity` out of a batch under a row lock.
    #[instrument(skip(self, conn))]
    pub async fn consume_batch<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        batch_id: i32,
        quantity: Decimal,
    ) -> Result<BatchModel, ServiceError> {
        if !quantity::is_positive(quantity) || !quantity::fits_scale(quantity) {
            return Err(ServiceError::ValidationError(format!(
                "consumed quantity must be positive with at most {} decimal places",
                quantity::SCALE
            )));
        }

        let row = Batch::find_by_id(batch_id)
            .filter(batch::Column::TeamId.eq(team_id))
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("batch {} not found", batch_id)))?;

        let remain = quantity::subtract(row.remain_quantity, quantity)?;
        if remain < Decimal::ZERO {
            return Err(ServiceError::InvariantViolation(format!(
                "batch {} holds {}, cannot consume {}",
                row.number, row.remain_quantity, quantity
            )));
        }

        let mut active: batch::ActiveModel = row.into();
        active.remain_quantity = Set(remain);
        active.sync_has_stock();

        let updated = active.update(conn).await?;
        debug!(batch_id, %remain, "Batch consumed");
        Ok(updated)
    }

    /// Batches of a goods item at a warehouse that still hold stock.
    pub async fn list_in_stock(
        &self,
        team_id: i32,
        warehouse_id: i32,
        goods_id: i32,
    ) -> Result<Vec<BatchModel>, ServiceError> {
        Ok(Batch::find()
            .filter(batch::Column::TeamId.eq(team_id))
            .filter(batch::Column::WarehouseId.eq(warehouse_id))
            .filter(batch::Column::GoodsId.eq(goods_id))
            .filter(batch::Column::HasStock.eq(true))
            .all(self.base.get_db())
            .await?)
    }
}

fn validate_quantities(total: Decimal, remain: Decimal) -> Result<(), ServiceError> {
    if total < Decimal::ZERO || remain < Decimal::ZERO {
        return Err(ServiceError::ValidationError(
            "batch quantities cannot be negative".into(),
        ));
    }
    if !quantity::fits_scale(total) || !quantity::fits_scale(remain) {
        return Err(ServiceError::ValidationError(format!(
            "batch quantities allow at most {} decimal places",
            quantity::SCALE
        )));
    }
    if remain > total {
        return Err(ServiceError::ValidationError(format!(
            "remain_quantity {} exceeds total_quantity {}",
            remain, total
        )));
    }
    Ok(())
}

fn derive_expiration(production: Option<NaiveDate>, shelf_life_days: Option<i32>) -> Option<NaiveDate> {
    let production = production?;
    let days = shelf_life_days?;
    production.checked_add_signed(Duration::days(i64::from(days)))
}
