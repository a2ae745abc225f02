use chrono::Utc;
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::entities::inventory_flow::{
    self, Entity as InventoryFlow, FlowReference, FlowType, Model as InventoryFlowModel,
};
use crate::errors::ServiceError;
use crate::quantity;

use super::inventory_repository::{BalanceChange, InventoryKey};
use super::{BaseRepository, Repository};

/// Document and actor a flow row is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlowCause {
    pub reference_type: FlowReference,
    pub reference_id: i32,
    pub creator_id: i32,
}

/// A validated, not yet persisted flow row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowEntry {
    pub key: InventoryKey,
    pub flow_type: FlowType,
    pub quantity_before: Decimal,
    pub quantity_change: Decimal,
    pub quantity_after: Decimal,
    pub cause: FlowCause,
}

impl FlowEntry {
    fn into_active_model(self) -> inventory_flow::ActiveModel {
        inventory_flow::ActiveModel {
            warehouse_id: Set(self.key.warehouse_id),
            goods_id: Set(self.key.goods_id),
            flow_type: Set(self.flow_type),
            quantity_before: Set(self.quantity_before),
            quantity_change: Set(self.quantity_change),
            quantity_after: Set(self.quantity_after),
            reference_type: Set(self.cause.reference_type),
            reference_id: Set(self.cause.reference_id),
            creator_id: Set(self.cause.creator_id),
            team_id: Set(self.key.team_id),
            create_time: Set(Utc::now()),
            ..Default::default()
        }
    }
}

/// Append-only ledger of balance changes. Corrections are new rows.
#[derive(Debug, Clone)]
pub struct InventoryFlowLog {
    base: BaseRepository,
}

impl InventoryFlowLog {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Builds the flow row for a balance change.
    ///
    /// The snapshot must be arithmetically consistent and the sign of the
    /// change must match the direction of `flow_type`.
    pub fn entry(
        change: &BalanceChange,
        flow_type: FlowType,
        cause: FlowCause,
    ) -> Result<FlowEntry, ServiceError> {
        if quantity::add(change.before, change.change)? != change.after {
            return Err(ServiceError::InvariantViolation(format!(
                "flow snapshot {} + {} != {}",
                change.before, change.change, change.after
            )));
        }

        let direction_ok = if flow_type.is_inbound() {
            change.change > Decimal::ZERO
        } else {
            change.change < Decimal::ZERO
        };
        if !direction_ok {
            return Err(ServiceError::InvariantViolation(format!(
                "{:?} flow cannot carry change {}",
                flow_type, change.change
            )));
        }

        Ok(FlowEntry {
            key: change.key,
            flow_type,
            quantity_before: change.before,
            quantity_change: change.change,
            quantity_after: change.after,
            cause,
        })
    }

    #[instrument(skip(self, conn, entry), fields(flow_type = ?entry.flow_type))]
    pub async fn record<C: ConnectionTrait>(
        &self,
        conn: &C,
        entry: FlowEntry,
    ) -> Result<(), ServiceError> {
        self.record_many(conn, vec![entry]).await
    }

    /// Inserts all entries in one statement. An empty batch is a no-op.
    #[instrument(skip(self, conn, entries), fields(count = entries.len()))]
    pub async fn record_many<C: ConnectionTrait>(
        &self,
        conn: &C,
        entries: Vec<FlowEntry>,
    ) -> Result<(), ServiceError> {
        if entries.is_empty() {
            return Ok(());
        }

        let count = entries.len() as u64;
        InventoryFlow::insert_many(entries.into_iter().map(FlowEntry::into_active_model))
            .exec(conn)
            .await?;

        counter!("stockflow_inventory.flows_recorded", count);
        debug!(count, "Inventory flows recorded");
        Ok(())
    }

    /// Flow rows a document caused, oldest first.
    pub async fn list_for_reference<C: ConnectionTrait>(
        &self,
        conn: &C,
        team_id: i32,
        reference_type: FlowReference,
        reference_id: i32,
    ) -> Result<Vec<InventoryFlowModel>, ServiceError> {
        Ok(InventoryFlow::find()
            .filter(inventory_flow::Column::TeamId.eq(team_id))
            .filter(inventory_flow::Column::ReferenceType.eq(reference_type))
            .filter(inventory_flow::Column::ReferenceId.eq(reference_id))
            .order_by_asc(inventory_flow::Column::Id)
            .all(conn)
            .await?)
    }

    /// Full history of one balance row, oldest first.
    pub async fn list_for_balance(
        &self,
        key: InventoryKey,
    ) -> Result<Vec<InventoryFlowModel>, ServiceError> {
        Ok(InventoryFlow::find()
            .filter(inventory_flow::Column::TeamId.eq(key.team_id))
            .filter(inventory_flow::Column::WarehouseId.eq(key.warehouse_id))
            .filter(inventory_flow::Column::GoodsId.eq(key.goods_id))
            .order_by_asc(inventory_flow::Column::Id)
            .all(self.base.get_db())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn cause() -> FlowCause {
        FlowCause {
            reference_type: FlowReference::StockTransferOrder,
            reference_id: 1,
            creator_id: 9,
        }
    }

    fn change(before: Decimal, delta: Decimal) -> BalanceChange {
        BalanceChange {
            key: InventoryKey::new(1, 1, 1),
            inventory_id: 1,
            before,
            change: delta,
            after: before + delta,
        }
    }

    #[test]
    fn outbound_entry_carries_negative_change() {
        let entry =
            InventoryFlowLog::entry(&change(dec!(50), dec!(-10)), FlowType::StockTransferOut, cause())
                .unwrap();
        assert_eq!(entry.quantity_before, dec!(50));
        assert_eq!(entry.quantity_change, dec!(-10));
        assert_eq!(entry.quantity_after, dec!(40));
    }

    #[test]
    fn sign_must_match_direction() {
        let err =
            InventoryFlowLog::entry(&change(dec!(5), dec!(-1)), FlowType::StockTransferIn, cause())
                .unwrap_err();
        assert_matches!(err, ServiceError::InvariantViolation(_));

        let err = InventoryFlowLog::entry(&change(dec!(5), dec!(1)), FlowType::StockOut, cause())
            .unwrap_err();
        assert_matches!(err, ServiceError::InvariantViolation(_));
    }

    #[test]
    fn inconsistent_snapshot_is_rejected() {
        let mut bad = change(dec!(5), dec!(10));
        bad.after = dec!(16);
        assert_matches!(
            InventoryFlowLog::entry(&bad, FlowType::StockTransferIn, cause()),
            Err(ServiceError::InvariantViolation(_))
        );
    }

    #[test]
    fn void_out_flow_is_inbound() {
        assert!(InventoryFlowLog::entry(
            &change(dec!(40), dec!(10)),
            FlowType::VoidStockTransferOut,
            cause()
        )
        .is_ok());
    }
}
