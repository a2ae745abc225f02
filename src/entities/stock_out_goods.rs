use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_out_goods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub stock_out_order_id: i32,
    pub goods_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub stock_out_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub remain_quantity: Decimal,
    pub is_completed: bool,
    pub team_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_out_order::Entity",
        from = "Column::StockOutOrderId",
        to = "super::stock_out_order::Column::Id",
        on_delete = "Cascade"
    )]
    StockOutOrder,
}

impl Related<super::stock_out_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockOutOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
