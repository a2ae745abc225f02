#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use stockflow::{
    common::RequestContext,
    config::InventoryConfig,
    db::{self, DbConfig, DbPool},
    entities::inventory_flow::{self, FlowReference},
    events::{Event, EventSender},
    repositories::{
        catalog_repository::NewGoods, inventory_repository::InventoryKey, CatalogRepository,
        InventoryLedger,
    },
    services::{factory::ServiceFactory, LineItem},
};
use tokio::sync::mpsc;

pub const TEAM: i32 = 1;
pub const OTHER_TEAM: i32 = 2;
pub const USER: i32 = 7;

/// Integer quantities only: SQLite hands decimals back through `f64`.
pub fn dec(value: i64) -> Decimal {
    Decimal::from(value)
}

pub fn line(goods_id: i32, quantity: i64) -> LineItem {
    LineItem {
        goods_id,
        quantity: dec(quantity),
    }
}

/// A migrated in-memory database with two warehouses and two goods for
/// [`TEAM`], plus one warehouse owned by [`OTHER_TEAM`].
pub struct TestHarness {
    pub db: Arc<DbPool>,
    pub ctx: RequestContext,
    pub factory: ServiceFactory,
    pub events: mpsc::Receiver<Event>,
    pub warehouse_a: i32,
    pub warehouse_b: i32,
    pub foreign_warehouse: i32,
    pub goods_x: i32,
    pub goods_y: i32,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_config(InventoryConfig::default()).await
    }

    pub async fn with_config(inventory: InventoryConfig) -> Self {
        // One connection, since every `sqlite::memory:` connection is its own database.
        let pool = db::establish_connection_with_config(&DbConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            min_connections: 1,
            ..Default::default()
        })
        .await
        .expect("sqlite connects");
        db::run_migrations(&pool).await.expect("migrations apply");
        let db = Arc::new(pool);

        let catalog = CatalogRepository::new(db.clone());
        let conn = db.as_ref();
        let warehouse_a = catalog
            .create_warehouse(conn, TEAM, "WH-A", "Main")
            .await
            .expect("warehouse a")
            .id;
        let warehouse_b = catalog
            .create_warehouse(conn, TEAM, "WH-B", "Overflow")
            .await
            .expect("warehouse b")
            .id;
        let foreign_warehouse = catalog
            .create_warehouse(conn, OTHER_TEAM, "WH-A", "Someone else's")
            .await
            .expect("foreign warehouse")
            .id;
        let goods_x = catalog
            .create_goods(
                conn,
                TEAM,
                NewGoods {
                    number: "G-X".into(),
                    name: "Widget".into(),
                    ..Default::default()
                },
            )
            .await
            .expect("goods x")
            .id;
        let goods_y = catalog
            .create_goods(
                conn,
                TEAM,
                NewGoods {
                    number: "G-Y".into(),
                    name: "Gadget".into(),
                    enable_batch_control: true,
                    shelf_life_days: Some(30),
                    ..Default::default()
                },
            )
            .await
            .expect("goods y")
            .id;

        let (sender, events) = EventSender::channel(256);
        let factory = ServiceFactory::new(db.clone(), sender, inventory);

        Self {
            db,
            ctx: RequestContext::new(TEAM, USER),
            factory,
            events,
            warehouse_a,
            warehouse_b,
            foreign_warehouse,
            goods_x,
            goods_y,
        }
    }

    pub fn key(&self, warehouse_id: i32, goods_id: i32) -> InventoryKey {
        InventoryKey::new(TEAM, warehouse_id, goods_id)
    }

    pub fn ledger(&self) -> InventoryLedger {
        InventoryLedger::new(self.db.clone(), Default::default())
    }

    /// Opening stock for one balance row.
    pub async fn stock(&self, warehouse_id: i32, goods_id: i32, quantity: i64) {
        self.ledger()
            .open_balance(self.db.as_ref(), self.key(warehouse_id, goods_id), dec(quantity))
            .await
            .expect("opening balance");
    }

    pub async fn balance(&self, warehouse_id: i32, goods_id: i32) -> Decimal {
        self.ledger()
            .balance(self.key(warehouse_id, goods_id))
            .await
            .expect("balance readable")
    }

    pub async fn flows_for(
        &self,
        reference_type: FlowReference,
        reference_id: i32,
    ) -> Vec<inventory_flow::Model> {
        inventory_flow::Entity::find()
            .filter(inventory_flow::Column::TeamId.eq(TEAM))
            .filter(inventory_flow::Column::ReferenceType.eq(reference_type))
            .filter(inventory_flow::Column::ReferenceId.eq(reference_id))
            .order_by_asc(inventory_flow::Column::Id)
            .all(self.db.as_ref())
            .await
            .expect("flows readable")
    }

    pub async fn all_flows(&self) -> Vec<inventory_flow::Model> {
        inventory_flow::Entity::find()
            .order_by_asc(inventory_flow::Column::Id)
            .all(self.db.as_ref())
            .await
            .expect("flows readable")
    }

    /// Everything published so far, without waiting.
    pub fn drain_events(&mut self) -> Vec<Event> {
        let mut seen = Vec::new();
        while let Ok(event) = self.events.try_recv() {
            seen.push(event);
        }
        seen
    }
}
