use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_in_goods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub stock_in_order_id: i32,
    pub goods_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub stock_in_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub remain_quantity: Decimal,
    pub is_completed: bool,
    pub team_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_in_order::Entity",
        from = "Column::StockInOrderId",
        to = "super::stock_in_order::Column::Id",
        on_delete = "Cascade"
    )]
    StockInOrder,
}

impl Related<super::stock_in_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockInOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
