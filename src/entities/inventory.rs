use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

use super::DerivedStock;

/// Current balance of one goods item at one warehouse for one team.
///
/// Exactly one row exists per `(warehouse_id, goods_id, team_id)`; the unique
/// index is created by the migrator. `total_quantity` is only ever written by
/// `InventoryLedger::apply_delta`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub warehouse_id: i32,
    pub goods_id: i32,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub initial_quantity: Decimal,
    #[sea_orm(column_type = "Decimal(Some((16, 4)))")]
    pub total_quantity: Decimal,
    pub has_stock: bool,
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
    #[sea_orm(
        belongs_to = "super::warehouse::Entity",
        from = "Column::WarehouseId",
        to = "super::warehouse::Column::Id"
    )]
    Warehouse,
}

impl Related<super::goods::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Goods.def()
    }
}

impl Related<super::warehouse::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Warehouse.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Flag recomputed from the quantity rather than read from the column.
    pub fn is_in_stock(&self) -> bool {
        super::has_stock(self.total_quantity)
    }
}

impl DerivedStock for ActiveModel {
    fn stock_quantity(&self) -> Option<Decimal> {
        self.total_quantity.try_as_ref().copied()
    }

    fn set_has_stock(&mut self, has_stock: bool) {
        self.has_stock = Set(has_stock);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use sea_orm::ActiveValue;

    fn row(total: Decimal, has_stock: bool) -> Model {
        Model {
            id: 1,
            warehouse_id: 1,
            goods_id: 1,
            initial_quantity: Decimal::ZERO,
            total_quantity: total,
            has_stock,
            team_id: 1,
        }
    }

    #[test]
    fn sync_marks_flag_as_changed_even_for_sparse_updates() {
        let mut active: ActiveModel = row(dec!(3), true).into();
        active.total_quantity = Set(Decimal::ZERO);

        assert!(active.sync_has_stock());
        assert_eq!(active.has_stock, ActiveValue::Set(false));
    }

    #[test]
    fn sync_uses_unchanged_quantity_when_only_loaded() {
        let mut active: ActiveModel = row(dec!(7), false).into();
        assert!(active.sync_has_stock());
        assert_eq!(active.has_stock, ActiveValue::Set(true));
    }

    #[test]
    fn sync_reports_missing_quantity() {
        let mut active = <ActiveModel as std::default::Default>::default();
        assert!(!active.sync_has_stock());
        assert_eq!(active.has_stock, ActiveValue::NotSet);
    }

    #[test]
    fn computed_flag_matches_quantity() {
        assert!(row(dec!(0.5), false).is_in_stock());
        assert!(!row(dec!(-2), true).is_in_stock());
    }
}
