use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transfer_orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub number: String,
    pub out_warehouse_id: i32,
    pub in_warehouse_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_quantity: Decimal,
    pub enable_auto_stock_out: bool,
    pub enable_auto_stock_in: bool,
    pub stock_out_order_id: Option<i32>,
    pub stock_in_order_id: Option<i32>,
    pub handler_id: Option<i32>,
    pub remark: Option<String>,
    pub is_void: bool,
    pub creator_id: i32,
    pub team_id: i32,
    pub create_time: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::stock_transfer_goods::Entity")]
    StockTransferGoods,
}

impl Related<super::stock_transfer_goods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockTransferGoods.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
