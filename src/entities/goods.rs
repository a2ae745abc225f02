use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Catalog entry. Never hard-deleted; `is_active` carries the soft state.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "goods")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub number: String,
    pub name: String,
    pub barcode: Option<String>,
    pub category_id: Option<i32>,
    pub unit_id: Option<i32>,
    pub spec: Option<String>,
    pub enable_batch_control: bool,
    pub shelf_life_days: Option<i32>,
    pub shelf_life_warning_days: i32,
    pub enable_inventory_warning: bool,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub inventory_upper: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))", nullable)]
    pub inventory_lower: Option<Decimal>,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub purchase_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub retail_price: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub level_price1: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub level_price2: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub level_price3: Decimal,
    pub remark: Option<String>,
    pub sort_order: i32,
    pub is_active: bool,
    pub team_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::inventory::Entity")]
    Inventories,
    #[sea_orm(has_many = "super::batch::Entity")]
    Batches,
}

impl Related<super::inventory::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Inventories.def()
    }
}

impl Related<super::batch::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Batches.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether a balance falls outside the configured warning band.
    pub fn is_outside_warning_band(&self, quantity: Decimal) -> bool {
        if !self.enable_inventory_warning {
            return false;
        }
        let above = self.inventory_upper.map_or(false, |upper| quantity > upper);
        let below = self.inventory_lower.map_or(false, |lower| quantity < lower);
        above || below
    }
}
