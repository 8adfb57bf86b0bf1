//! # Buyer Repository
//!
//! Database operations for buyer records.
//!
//! Buyers are insert-only: a row is minted per bill save when the entry form
//! captured a name or phone, and no update or delete path exists. There is
//! deliberately no dedup by name/phone: two visits by the same customer
//! produce two rows, and every bill keeps pointing at the row minted with it.

use sqlx::{Row, Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use retail_core::Buyer;

/// Repository for buyer database operations.
#[derive(Debug, Clone)]
pub struct BuyerRepository {
    pool: SqlitePool,
}

impl BuyerRepository {
    /// Creates a new BuyerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BuyerRepository { pool }
    }

    /// Inserts a buyer within the caller's transaction.
    ///
    /// This is how the bill save protocol creates its buyer row: the insert
    /// commits or rolls back together with the bill header and items.
    ///
    /// ## Returns
    /// The generated `buyer_id`. Zero affected rows is a fatal
    /// [`DbError::InsertFailed`]; the save protocol needs this id.
    pub async fn insert(&self, tx: &mut Transaction<'_, Sqlite>, buyer: &Buyer) -> DbResult<i64> {
        debug!(name = ?buyer.name, "Inserting buyer");

        let result = sqlx::query("INSERT INTO Buyers (name, phone) VALUES (?1, ?2)")
            .bind(&buyer.name)
            .bind(&buyer.phone)
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::insert_failed("Buyers"));
        }

        Ok(result.last_insert_rowid())
    }

    /// Inserts a buyer in its own short transaction.
    ///
    /// Convenience for callers that are not inside a bill save.
    pub async fn insert_standalone(&self, buyer: &Buyer) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;
        let id = self.insert(&mut tx, buyer).await?;
        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;
        Ok(id)
    }

    /// Gets a buyer by id.
    ///
    /// A missing row is `Ok(None)`, not an error.
    pub async fn get_by_id(&self, buyer_id: i64) -> DbResult<Option<Buyer>> {
        let row = sqlx::query("SELECT buyer_id, name, phone FROM Buyers WHERE buyer_id = ?1")
            .bind(buyer_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Buyer {
                id: Some(row.try_get("buyer_id")?),
                name: row.try_get("name")?,
                phone: row.try_get("phone")?,
            })),
            None => Ok(None),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_standalone_insert_roundtrip() {
        let db = test_db().await;
        let repo = db.buyers();

        let id = repo
            .insert_standalone(&Buyer::new("Alice", "0301-1234567"))
            .await
            .unwrap();

        let loaded = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.id, Some(id));
        assert_eq!(loaded.name.as_deref(), Some("Alice"));
        assert_eq!(loaded.phone.as_deref(), Some("0301-1234567"));
    }

    #[tokio::test]
    async fn test_get_by_id_miss_is_none() {
        let db = test_db().await;
        assert!(db.buyers().get_by_id(9999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_insert_always_mints_a_new_row() {
        // No dedup: the same name/phone twice yields two distinct ids.
        let db = test_db().await;
        let repo = db.buyers();
        let buyer = Buyer::new("Bob", "042-111");

        let first = repo.insert_standalone(&buyer).await.unwrap();
        let second = repo.insert_standalone(&buyer).await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let db = test_db().await;
        let repo = db.buyers();

        {
            let mut tx = db.pool().begin().await.unwrap();
            let id = repo.insert(&mut tx, &Buyer::new("Ghost", "")).await.unwrap();
            assert!(id > 0);
            // tx dropped without commit
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Buyers")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(count, 0);
    }
}
