use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

// Catalog
pub mod batch;
pub mod goods;
pub mod warehouse;

// Balances and ledger
pub mod inventory;
pub mod inventory_flow;

// Documents
pub mod number_sequence;
pub mod stock_in_goods;
pub mod stock_in_order;
pub mod stock_out_goods;
pub mod stock_out_order;
pub mod stock_transfer_goods;
pub mod stock_transfer_order;

/// Why a stock-in / stock-out order exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(32))")]
#[serde(rename_all = "snake_case")]
pub enum StockOrderType {
    /// Spawned by a transfer whose auto-apply flag was off
    #[sea_orm(string_value = "stock_transfer")]
    StockTransfer,
    #[sea_orm(string_value = "manual")]
    Manual,
}

/// Derived `has_stock` flag for records that carry a quantity column.
pub fn has_stock(quantity: Decimal) -> bool {
    quantity > Decimal::ZERO
}

/// Active models whose `has_stock` column is derived from a quantity column.
///
/// Repositories call [`DerivedStock::sync_has_stock`] before every insert or
/// update. The flag is always written as `Set`, so it lands in the update set
/// even when the caller only touched the quantity.
pub trait DerivedStock {
    /// The quantity the flag is derived from, if the active model knows it.
    fn stock_quantity(&self) -> Option<Decimal>;

    fn set_has_stock(&mut self, has_stock: bool);

    /// Recomputes the flag. Returns `false` when the quantity is not loaded.
    fn sync_has_stock(&mut self) -> bool {
        match self.stock_quantity() {
            Some(quantity) => {
                self.set_has_stock(has_stock(quantity));
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn has_stock_is_strictly_positive() {
        assert!(has_stock(dec!(0.0001)));
        assert!(!has_stock(Decimal::ZERO));
        assert!(!has_stock(dec!(-4)));
    }

    #[test]
    fn has_stock_is_idempotent() {
        for quantity in [dec!(-1), dec!(0), dec!(1), dec!(12.5)] {
            assert_eq!(has_stock(quantity), has_stock(quantity));
        }
    }
}
