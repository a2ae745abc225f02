use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use super::DerivedStock;

/// Dated sub-lot of a goods item at a warehouse, for goods with batch control.
///
/// `remain_quantity <= total_quantity` is enforced by `BatchRepository`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "batches")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub number: String,
    pub warehouse_id: i32,
    pub goods_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub remain_quantity: Decimal,
    pub production_date: Option<Date>,
    pub shelf_life_days: Option<i32>,
    pub expiration_date: Option<Date>,
    pub has_stock: bool,
    pub create_time: DateTime<Utc>,
    pub team_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::goods::Entity",
        from = "Column::GoodsId",
        to = "super::goods::Column::Id"
    )]
    Goods,
}

impl Related<super::goods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn is_in_stock(&self) -> bool {
        super::has_stock(self.remain_quantity)
    }

    pub fn is_expired_on(&self, day: Date) -> bool {
        self.expiration_date.map_or(false, |expires| expires < day)
    }
}

impl DerivedStock for ActiveModel {
    fn stock_quantity(&self) -> Option<Decimal> {
        self.remain_quantity.try_as_ref().copied()
    }

    fn set_has_stock(&mut self, has_stock: bool) {
        self.has_stock = Set(has_stock);
    }
}
