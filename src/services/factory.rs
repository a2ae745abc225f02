use std::sync::Arc;

use crate::{
    config::InventoryConfig,
    db::DbPool,
    events::EventSender,
    repositories::{BatchRepository, CatalogRepository},
    services::{
        numbering::NumberingService, stock_movement::StockMovementService,
        stock_transfer::StockTransferService,
    },
};

/// Factory for creating service instances with shared dependencies
pub struct ServiceFactory {
    db_pool: Arc<DbPool>,
    event_sender: EventSender,
    inventory: InventoryConfig,
}

impl ServiceFactory {
    pub fn new(db_pool: Arc<DbPool>, event_sender: EventSender, inventory: InventoryConfig) -> Self {
        Self {
            db_pool,
            event_sender,
            inventory,
        }
    }

    pub fn numbering_service(&self) -> NumberingService {
        NumberingService::new(self.db_pool.clone())
    }

    pub fn stock_transfer_service(&self) -> StockTransferService {
        StockTransferService::new(
            self.db_pool.clone(),
            self.event_sender.clone(),
            &self.inventory,
        )
    }

    pub fn stock_movement_service(&self) -> StockMovementService {
        StockMovementService::new(
            self.db_pool.clone(),
            self.event_sender.clone(),
            &self.inventory,
        )
    }

    pub fn batch_repository(&self) -> BatchRepository {
        BatchRepository::new(self.db_pool.clone())
    }

    pub fn catalog_repository(&self) -> CatalogRepository {
        CatalogRepository::new(self.db_pool.clone())
    }

    /// Gets a reference to the database pool
    pub fn db_pool(&self) -> &Arc<DbPool> {
        &self.db_pool
    }

    /// Gets a reference to the event sender
    pub fn event_sender(&self) -> &EventSender {
        &self.event_sender
    }
}

/// Service container holding all service instances
#[derive(Clone)]
pub struct ServiceContainer {
    pub numbering: Arc<NumberingService>,
    pub transfers: Arc<StockTransferService>,
    pub movements: Arc<StockMovementService>,
    pub batches: Arc<BatchRepository>,
    pub catalog: Arc<CatalogRepository>,
}

impl ServiceContainer {
    pub fn new(factory: &ServiceFactory) -> Self {
        Self {
            numbering: Arc::new(factory.numbering_service()),
            transfers: Arc::new(factory.stock_transfer_service()),
            movements: Arc::new(factory.stock_movement_service()),
            batches: Arc::new(factory.batch_repository()),
            catalog: Arc::new(factory.catalog_repository()),
        }
    }
}
