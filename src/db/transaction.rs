/*!
 * Unit of work
 *
 * Explicit transaction boundary handed to the inventory processors. Every
 * header, line-item, balance and flow write of one operation goes through the
 * same `UnitOfWork`, and either all of them commit or none do.
 */

use metrics::{counter, histogram};
use sea_orm::{
    ConnectionTrait, DatabaseConnection, DatabaseTransaction, DbBackend, TransactionTrait,
};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::ServiceError;

pub use futures::future::BoxFuture;

/// One atomic unit of inventory work.
///
/// Dropping a `UnitOfWork` without calling [`UnitOfWork::commit`] rolls it
/// back, so an early `?` return can never leave a partial transfer behind.
pub struct UnitOfWork {
    txn: DatabaseTransaction,
    id: Uuid,
    started: Instant,
}

impl UnitOfWork {
    /// Opens a transaction. On Postgres the row-lock wait is bounded by
    /// `lock_timeout`; a timeout surfaces as `ServiceError::Conflict`.
    pub async fn begin(
        db: &DatabaseConnection,
        lock_timeout: Option<Duration>,
    ) -> Result<Self, ServiceError> {
        let txn = db.begin().await?;
        let id = Uuid::new_v4();

        if let Some(timeout) = lock_timeout {
            if txn.get_database_backend() == DbBackend::Postgres {
                txn.execute_unprepared(&format!(
                    "SET LOCAL lock_timeout = '{}ms'",
                    timeout.as_millis()
                ))
                .await?;
            }
        }

        debug!(unit_of_work = %id, "Unit of work started");
        counter!("stockflow_db.transaction.started", 1);

        Ok(Self {
            txn,
            id,
            started: Instant::now(),
        })
    }

    /// Connection every write of this unit must go through.
    pub fn conn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    pub async fn commit(self) -> Result<(), ServiceError> {
        let elapsed = self.started.elapsed();
        let id = self.id;
        self.txn.commit().await?;

        counter!("stockflow_db.transaction.committed", 1);
        histogram!("stockflow_db.transaction.duration", elapsed);
        debug!(unit_of_work = %id, "Unit of work committed in {:?}", elapsed);
        Ok(())
    }

    pub async fn rollback(self) -> Result<(), ServiceError> {
        let elapsed = self.started.elapsed();
        let id = self.id;
        self.txn.rollback().await?;

        counter!("stockflow_db.transaction.rolled_back", 1);
        warn!(unit_of_work = %id, "Unit of work rolled back after {:?}", elapsed);
        Ok(())
    }

    /// Commits on `Ok`, rolls back on `Err` and hands the original error back.
    pub async fn finish<T>(self, result: Result<T, ServiceError>) -> Result<T, ServiceError> {
        match result {
            Ok(value) => {
                self.commit().await?;
                Ok(value)
            }
            Err(err) => {
                if let Err(rollback_err) = self.rollback().await {
                    warn!(error = %rollback_err, "Rollback failed; transaction is discarded on drop");
                }
                Err(err)
            }
        }
    }
}

/// Runs `f` inside a fresh unit of work and commits only if it succeeds.
///
/// ```rust,ignore
/// let order = with_unit_of_work(&db, None, |uow| {
///     Box::pin(async move { processor.create_transfer_in(uow, &ctx, request).await })
/// })
/// .await?;
/// ```
pub async fn with_unit_of_work<F, T>(
    db: &DatabaseConnection,
    lock_timeout: Option<Duration>,
    f: F,
) -> Result<T, ServiceError>
where
    F: for<'a> FnOnce(&'a UnitOfWork) -> BoxFuture<'a, Result<T, ServiceError>>,
{
    let uow = UnitOfWork::begin(db, lock_timeout).await?;
    let result = f(&uow).await;
    uow.finish(result).await
}
