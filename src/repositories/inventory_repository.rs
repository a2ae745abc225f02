use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::OnConflict, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection,
    EntityTrait, QueryFilter, QuerySelect, Set,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use strum::{Display, EnumString};
use tracing::{debug, instrument, warn};

use crate::entities::inventory::{self, Entity as Inventory, Model as InventoryModel};
use crate::entities::DerivedStock;
use crate::errors::ServiceError;
use crate::quantity;

use super::{BaseRepository, Repository};

/// Identifies one balance row. Ordering is the lock acquisition order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct InventoryKey {
    pub team_id: i32,
    pub warehouse_id: i32,
    pub goods_id: i32,
}

impl InventoryKey {
    pub fn new(team_id: i32, warehouse_id: i32, goods_id: i32) -> Self {
        Self {
            team_id,
            warehouse_id,
            goods_id,
        }
    }
}

/// Result of one `apply_delta`: `after == before + change`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceChange {
    pub key: InventoryKey,
    pub inventory_id: i32,
    pub before: Decimal,
    pub change: Decimal,
    pub after: Decimal,
}

/// What happens when a movement would push a balance below zero.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NegativeStockPolicy {
    /// Negative balances are stored as-is
    #[default]
    Allow,
    /// The movement fails with `ServiceError::InvariantViolation`
    Reject,
}

/// The only writer of `inventories.total_quantity`.
#[derive(Debug, Clone)]
pub struct InventoryLedger {
    base: BaseRepository,
    negative_stock: NegativeStockPolicy,
}

impl InventoryLedger {
    pub fn new(db: Arc<DatabaseConnection>, negative_stock: NegativeStockPolicy) -> Self {
        Self {
            base: BaseRepository::new(db),
            negative_stock,
        }
    }

    fn by_key(key: InventoryKey) -> sea_orm::Select<Inventory> {
        Inventory::find()
            .filter(inventory::Column::TeamId.eq(key.team_id))
            .filter(inventory::Column::WarehouseId.eq(key.warehouse_id))
            .filter(inventory::Column::GoodsId.eq(key.goods_id))
    }

    /// Unlocked read of a balance row.
    pub async fn find<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: InventoryKey,
    ) -> Result<Option<InventoryModel>, ServiceError> {
        Ok(Self::by_key(key).one(conn).await?)
    }

    /// Current quantity outside any unit of work. Missing rows read as zero.
    pub async fn balance(&self, key: InventoryKey) -> Result<Decimal, ServiceError> {
        Ok(self
            .find(self.base.get_db(), key)
            .await?
            .map(|row| row.total_quantity)
            .unwrap_or(Decimal::ZERO))
    }

    /// Creates a balance row carrying an opening quantity.
    ///
    /// Fails with `InvalidOperation` if the row already exists; opening stock
    /// is only recorded once per `(warehouse, goods, team)`.
    #[instrument(skip(self, conn))]
    pub async fn open_balance<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: InventoryKey,
        initial_quantity: Decimal,
    ) -> Result<InventoryModel, ServiceError> {
        if self.find(conn, key).await?.is_some() {
            return Err(ServiceError::InvalidOperation(format!(
                "inventory for goods {} at warehouse {} already exists",
                key.goods_id, key.warehouse_id
            )));
        }
        self.insert(conn, key, initial_quantity).await
    }

    fn new_row(key: InventoryKey, initial_quantity: Decimal) -> inventory::ActiveModel {
        let mut row = inventory::ActiveModel {
            warehouse_id: Set(key.warehouse_id),
            goods_id: Set(key.goods_id),
            initial_quantity: Set(initial_quantity),
            total_quantity: Set(initial_quantity),
            team_id: Set(key.team_id),
            ..Default::default()
        };
        row.sync_has_stock();
        row
    }

    async fn insert<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: InventoryKey,
        initial_quantity: Decimal,
    ) -> Result<InventoryModel, ServiceError> {
        debug!(?key, %initial_quantity, "Creating inventory row");
        Ok(Self::new_row(key, initial_quantity).insert(conn).await?)
    }

    /// `SELECT ... FOR UPDATE` on one row, creating it first if missing.
    ///
    /// Two units may both miss the row; the insert skips on the unique key,
    /// so the loser re-selects and waits on the winner's lock.
    async fn lock_row<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: InventoryKey,
    ) -> Result<InventoryModel, ServiceError> {
        if let Some(row) = Self::by_key(key).lock_exclusive().one(conn).await? {
            return Ok(row);
        }

        let inserted = Inventory::insert(Self::new_row(key, Decimal::ZERO))
            .on_conflict(
                OnConflict::columns([
                    inventory::Column::WarehouseId,
                    inventory::Column::GoodsId,
                    inventory::Column::TeamId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        debug!(?key, inserted, "Inventory row created on first lock");

        Self::by_key(key)
            .lock_exclusive()
            .one(conn)
            .await?
            .ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "inventory row for goods {} at warehouse {} vanished",
                    key.goods_id, key.warehouse_id
                ))
            })
    }

    /// Locks every row a unit of work is about to touch, in key order.
    ///
    /// Two units locking overlapping sets always take the shared rows in the
    /// same order, so they queue instead of deadlocking.
    #[instrument(skip(self, conn, keys))]
    pub async fn lock_rows<C, I>(
        &self,
        conn: &C,
        keys: I,
    ) -> Result<BTreeMap<InventoryKey, InventoryModel>, ServiceError>
    where
        C: ConnectionTrait,
        I: IntoIterator<Item = InventoryKey>,
    {
        let ordered: BTreeSet<InventoryKey> = keys.into_iter().collect();
        let mut locked = BTreeMap::new();
        for key in ordered {
            let row = self.lock_row(conn, key).await?;
            locked.insert(key, row);
        }
        debug!(rows = locked.len(), "Inventory rows locked");
        Ok(locked)
    }

    /// Adds a signed `change` to one balance under a row lock.
    #[instrument(skip(self, conn), fields(team_id = key.team_id, warehouse_id = key.warehouse_id, goods_id = key.goods_id))]
    pub async fn apply_delta<C: ConnectionTrait>(
        &self,
        conn: &C,
        key: InventoryKey,
        change: Decimal,
    ) -> Result<BalanceChange, ServiceError> {
        let row = self.lock_row(conn, key).await?;
        let before = row.total_quantity;
        let after = quantity::add(before, change)?;

        if after < Decimal::ZERO {
            match self.negative_stock {
                NegativeStockPolicy::Reject => {
                    counter!("stockflow_inventory.negative_rejected", 1);
                    return Err(ServiceError::InvariantViolation(format!(
                        "goods {} at warehouse {} would drop to {} (on hand {})",
                        key.goods_id, key.warehouse_id, after, before
                    )));
                }
                NegativeStockPolicy::Allow => {
                    warn!(%before, %change, %after, "Inventory balance going negative");
                }
            }
        }

        let inventory_id = row.id;
        let mut active: inventory::ActiveModel = row.into();
        active.total_quantity = Set(after);
        active.sync_has_stock();
        active.update(conn).await?;

        counter!("stockflow_inventory.delta_applied", 1);
        debug!(%before, %change, %after, "Inventory delta applied");

        Ok(BalanceChange {
            key,
            inventory_id,
            before,
            change,
            after,
        })
    }
}
