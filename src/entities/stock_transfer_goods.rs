use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Line item of a transfer order. Immutable once the order is created.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_transfer_goods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub stock_transfer_order_id: i32,
    pub goods_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub stock_transfer_quantity: Decimal,
    pub team_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_transfer_order::Entity",
        from = "Column::StockTransferOrderId",
        to = "super::stock_transfer_order::Column::Id",
        on_delete = "Cascade"
    )]
    StockTransferOrder,
}

impl Related<super::stock_transfer_order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StockTransferOrder.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
