use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod batch_repository;
pub mod catalog_repository;
pub mod inventory_flow_repository;
pub mod inventory_repository;
pub mod order_repository;

pub use batch_repository::BatchRepository;
pub use catalog_repository::CatalogRepository;
pub use inventory_flow_repository::InventoryFlowLog;
pub use inventory_repository::InventoryLedger;
pub use order_repository::OrderRepository;

/// Repository trait for common database operations
///
/// Writes always take the caller's connection (normally
/// `UnitOfWork::conn()`); the pooled connection is for reads outside a unit
/// of work.
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}
