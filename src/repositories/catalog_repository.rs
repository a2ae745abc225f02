use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::instrument;

use crate::entities::goods::{self, Entity as Goods, Model as GoodsModel};
use crate::entities::warehouse::{self, Entity as Warehouse, Model as WarehouseModel};
use crate::errors::ServiceError;

use super::{BaseRepository, Repository};

/// Fields needed to register a goods item.
#[derive(Debug, Clone, Default)]
pub struct NewGoods {
    pub number: String,
    pub name: String,
    pub barcode: Option<String>,
    pub enable_batch_control: bool,
    pub shelf_life_days: Option<i32>,
    pub inventory_upper: Option<Decimal>,
    pub inventory_lower: Option<Decimal>,
    pub purchase_price: Decimal,
    pub retail_price: Decimal,
}

/// Tenant-scoped goods and warehouse lookups.
///
/// A row that exists under another team is reported exactly like a missing
/// row.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    base: BaseRepository,
}

impl CatalogRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    pub async fn find_goods<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        goods_id: i32,
    ) -> Result<GoodsModel, ServiceError> {
        Goods::find_by_id(goods_id)
            .filter(goods::Column::TeamId.eq(team_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("goods {} not found", goods_id)))
    }

    pub async fn find_warehouse<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        warehouse_id: i32,
    ) -> Result<WarehouseModel, ServiceError> {
        Warehouse::find_by_id(warehouse_id)
            .filter(warehouse::Column::TeamId.eq(team_id))
            .one(conn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("warehouse {} not found", warehouse_id)))
    }

    /// Checks every id in one query; the error names the lowest missing id.
    pub async fn ensure_goods_exist<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        goods_ids: &[i32],
    ) -> Result<(), ServiceError> {
        let wanted: BTreeSet<i32> = goods_ids.iter().copied().collect();
        if wanted.is_empty() {
            return Ok(());
        }

        let found: BTreeSet<i32> = Goods::find()
            .filter(goods::Column::TeamId.eq(team_id))
            .filter(goods::Column::Id.is_in(wanted.iter().copied()))
            .all(conn)
            .await?
            .into_iter()
            .map(|g| g.id)
            .collect();

        match wanted.difference(&found).next() {
            Some(missing) => Err(ServiceError::NotFound(format!("goods {} not found", missing))),
            None => Ok(()),
        }
    }

    #[instrument(skip(self, conn))]
    pub async fn create_warehouse<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        number: &str,
        name: &str,
    ) -> Result<WarehouseModel, ServiceError> {
        let row = warehouse::ActiveModel {
            number: Set(number.to_string()),
            name: Set(name.to_string()),
            is_active: Set(true),
            team_id: Set(team_id),
            ..Default::default()
        };
        Ok(row.insert(conn).await?)
    }

    /// Inserts a goods item. A duplicate `(number, team)` surfaces as `Conflict`.
    #[instrument(skip(self, conn, goods), fields(number = %goods.number))]
    pub async fn create_goods<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        goods: NewGoods,
    ) -> Result<GoodsModel, ServiceError> {
        if goods.name.trim().is_empty() {
            return Err(ServiceError::ValidationError("goods name is required".into()));
        }
        if let (Some(lower), Some(upper)) = (goods.inventory_lower, goods.inventory_upper) {
            if lower > upper {
                return Err(ServiceError::ValidationError(
                    "inventory_lower cannot exceed inventory_upper".into(),
                ));
            }
        }

        let row = goods::ActiveModel {
            number: Set(goods.number),
            name: Set(goods.name),
            barcode: Set(goods.barcode),
            category_id: Set(None),
            unit_id: Set(None),
            spec: Set(None),
            enable_batch_control: Set(goods.enable_batch_control),
            shelf_life_days: Set(goods.shelf_life_days),
            shelf_life_warning_days: Set(0),
            enable_inventory_warning: Set(
                goods.inventory_upper.is_some() || goods.inventory_lower.is_some()
            ),
            inventory_upper: Set(goods.inventory_upper),
            inventory_lower: Set(goods.inventory_lower),
            purchase_price: Set(goods.purchase_price),
            retail_price: Set(goods.retail_price),
            level_price1: Set(goods.retail_price),
            level_price2: Set(goods.retail_price),
            level_price3: Set(goods.retail_price),
            remark: Set(None),
            sort_order: Set(0),
            is_active: Set(true),
            team_id: Set(team_id),
            ..Default::default()
        };
        Ok(row.insert(conn).await?)
    }

    /// Active goods of a team, for callers outside a unit of work.
    pub async fn list_goods(&self, team_id: i32) -> Result<Vec<GoodsModel>, ServiceError> {
        Ok(Goods::find()
            .filter(goods::Column::TeamId.eq(team_id))
            .filter(goods::Column::IsActive.eq(true))
            .all(self.base.get_db())
            .await?)
    }
}
