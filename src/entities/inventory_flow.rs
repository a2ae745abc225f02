use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of balance change a flow row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    #[sea_orm(string_value = "stock_in")]
    StockIn,
    #[sea_orm(string_value = "stock_out")]
    StockOut,
    #[sea_orm(string_value = "stock_transfer_in")]
    StockTransferIn,
    #[sea_orm(string_value = "stock_transfer_out")]
    StockTransferOut,
    /// Compensates a `StockTransferIn` when its transfer is voided
    #[sea_orm(string_value = "void_stock_transfer_in")]
    VoidStockTransferIn,
    /// Compensates a `StockTransferOut` when its transfer is voided
    #[sea_orm(string_value = "void_stock_transfer_out")]
    VoidStockTransferOut,
}

impl FlowType {
    /// Whether rows of this type add to the balance. Outbound types subtract.
    pub fn is_inbound(&self) -> bool {
        matches!(
            self,
            FlowType::StockIn | FlowType::StockTransferIn | FlowType::VoidStockTransferOut
        )
    }

    /// Type of the offsetting row written when the cause is voided.
    pub fn compensation(&self) -> Option<FlowType> {
        match self {
            FlowType::StockTransferIn => Some(FlowType::VoidStockTransferIn),
            FlowType::StockTransferOut => Some(FlowType::VoidStockTransferOut),
            _ => None,
        }
    }
}

/// Document that caused a flow row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum FlowReference {
    #[sea_orm(string_value = "stock_transfer_order")]
    StockTransferOrder,
    #[sea_orm(string_value = "stock_in_order")]
    StockInOrder,
    #[sea_orm(string_value = "stock_out_order")]
    StockOutOrder,
}

/// Immutable ledger row. `quantity_change` is signed:
/// `quantity_after = quantity_before + quantity_change`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_flows")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub warehouse_id: i32,
    pub goods_id: i32,
    pub flow_type: FlowType,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quantity_before: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quantity_change: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub quantity_after: Decimal,
    pub reference_type: FlowReference,
    pub reference_id: i32,
    pub creator_id: i32,
    pub team_id: i32,
    pub create_time: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
