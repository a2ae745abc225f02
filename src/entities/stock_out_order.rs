use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::StockOrderType;

/// Pending outbound movement. `remain_quantity` starts equal to
/// `total_quantity` and is drawn down by fulfillment.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_out_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub number: String,
    pub warehouse_id: i32,
    pub order_type: StockOrderType,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub remain_quantity: Decimal,
    pub stock_transfer_order_id: Option<i32>,
    pub is_completed: bool,
    pub is_void: bool,
    pub creator_id: i32,
    pub team_id: i32,
    pub create_time: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_out_goods::Entity")]
    StockOutGoods,
}

impl Related<super::stock_out_goods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockOutGoods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Nothing has been drawn from this order yet.
    pub fn is_untouched(&self) -> bool {
        self.remain_quantity == self.total_quantity
    }
}
