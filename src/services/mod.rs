// Movement engine
pub mod stock_movement;
pub mod stock_transfer;

// Document numbering
pub mod numbering;

// Service factory for dependency injection
pub mod factory;

use serde::Serialize;
use validator::ValidationError;

use crate::entities::inventory_flow::FlowType;
use crate::events::Event;
use crate::quantity;
use crate::repositories::inventory_repository::BalanceChange;
use crate::repositories::order_repository::OrderLine;

/// One balance change a unit of work applied, with the flow type it was
/// logged under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMovement {
    pub flow_type: FlowType,
    pub change: BalanceChange,
}

/// `(goods, quantity)` as callers submit it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, serde::Deserialize)]
pub struct LineItem {
    pub goods_id: i32,
    pub quantity: rust_decimal::Decimal,
}

impl From<LineItem> for OrderLine {
    fn from(item: LineItem) -> Self {
        OrderLine {
            goods_id: item.goods_id,
            quantity: item.quantity,
        }
    }
}

/// Every quantity must be strictly positive and storable without rounding.
pub(crate) fn validate_positive_quantities(items: &[LineItem]) -> Result<(), ValidationError> {
    for item in items {
        let problem = if !quantity::is_positive(item.quantity) {
            "must be greater than zero"
        } else if !quantity::fits_scale(item.quantity) {
            "has more than 4 decimal places"
        } else {
            continue;
        };
        let mut err = ValidationError::new("quantity");
        err.message = Some(
            format!(
                "quantity for goods {} {}, got {}",
                item.goods_id, problem, item.quantity
            )
            .into(),
        );
        return Err(err);
    }
    Ok(())
}

/// `InventoryAdjusted` events for movements that have committed.
pub(crate) fn adjustment_events(team_id: i32, movements: &[AppliedMovement]) -> Vec<Event> {
    movements
        .iter()
        .map(|movement| Event::InventoryAdjusted {
            team_id,
            warehouse_id: movement.change.key.warehouse_id,
            goods_id: movement.change.key.goods_id,
            flow_type: movement.flow_type,
            quantity_before: movement.change.before,
            quantity_after: movement.change.after,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn zero_and_negative_quantities_are_rejected() {
        let ok = [LineItem {
            goods_id: 1,
            quantity: dec!(0.5),
        }];
        assert!(validate_positive_quantities(&ok).is_ok());

        for quantity in [dec!(0), dec!(-3)] {
            let bad = [
                LineItem {
                    goods_id: 1,
                    quantity: dec!(1),
                },
                LineItem {
                    goods_id: 2,
                    quantity,
                },
            ];
            assert!(validate_positive_quantities(&bad).is_err());
        }
    }

    #[test]
    fn quantities_finer_than_the_column_are_rejected() {
        let fine = [LineItem {
            goods_id: 3,
            quantity: dec!(0.00001),
        }];
        let err = validate_positive_quantities(&fine).expect_err("too many decimals");
        assert!(err.message.unwrap_or_default().contains("decimal places"));

        let padded = [LineItem {
            goods_id: 3,
            quantity: dec!(1.250000),
        }];
        assert!(validate_positive_quantities(&padded).is_ok());
    }
}
