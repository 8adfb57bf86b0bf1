//! # Bill Repository
//!
//! Database operations for bills and their line items.
//!
//! ## Save Protocol
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    save_bill: one atomic unit                           │
//! │                                                                         │
//! │  BEGIN TRANSACTION                                                     │
//! │       │                                                                 │
//! │       ├── 1. buyer present + non-blank? INSERT INTO Buyers → buyer_id  │
//! │       │                                                                 │
//! │       ├── 2. stamp bill_date with save-time (caller value overwritten) │
//! │       │                                                                 │
//! │       ├── 3. INSERT INTO Bills (date, grand total, buyer_id) → bill_id │
//! │       │                                                                 │
//! │       ├── 4. INSERT every item row keyed to bill_id, in order          │
//! │       │                                                                 │
//! │  COMMIT ← all-or-nothing: any failure drops the transaction,           │
//! │           which rolls back: no partial bill is ever visible           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Reload Derivation
//! Only `total_amount` is stored. `get_bill_by_id` re-sums the item rows
//! into a subtotal and back-derives the discount from the difference, so a
//! reloaded bill's discount fields may differ from the save-time entries by
//! floating-point dust. Inherent to the storage design, not a defect.

use chrono::{Local, NaiveDate};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::repository::buyer::BuyerRepository;
use retail_core::{derive_discount, Bill, BillItem, Buyer};

/// Bill date stamp format: fixed-width, millisecond precision, so that
/// lexicographic order over the stored TEXT equals chronological order.
///
/// Example: `2026-08-28T14:03:07.412`
pub const BILL_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";

// =============================================================================
// Filter
// =============================================================================

/// Optional predicates for [`BillRepository::list_bills`].
///
/// Absent filters contribute nothing to the query: they are omitted from
/// the predicate entirely rather than matched as wildcards. Present filters
/// combine with logical AND.
///
/// ## Example
/// ```rust,ignore
/// let filter = BillFilter::new()
///     .buyer_name("ali")
///     .date_from(NaiveDate::from_ymd_opt(2026, 8, 1).unwrap());
/// let bills = db.bills().list_bills(&filter).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct BillFilter {
    /// Exact bill id match.
    pub bill_id: Option<i64>,

    /// Case-insensitive substring match against the joined buyer's name.
    /// Blank or whitespace-only input is treated as absent.
    pub buyer_name: Option<String>,

    /// Inclusive first calendar day; expanded to start-of-day before
    /// comparison against the stored timestamps.
    pub date_from: Option<NaiveDate>,

    /// Inclusive last calendar day; expanded to end-of-day.
    pub date_to: Option<NaiveDate>,
}

impl BillFilter {
    /// Creates an empty filter (matches every bill).
    pub fn new() -> Self {
        BillFilter::default()
    }

    /// Sets an exact bill id.
    pub fn bill_id(mut self, id: i64) -> Self {
        self.bill_id = Some(id);
        self
    }

    /// Sets the buyer name substring.
    pub fn buyer_name(mut self, name: impl Into<String>) -> Self {
        self.buyer_name = Some(name.into());
        self
    }

    /// Sets the inclusive start day.
    pub fn date_from(mut self, date: NaiveDate) -> Self {
        self.date_from = Some(date);
        self
    }

    /// Sets the inclusive end day.
    pub fn date_to(mut self, date: NaiveDate) -> Self {
        self.date_to = Some(date);
        self
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for bill database operations.
#[derive(Debug, Clone)]
pub struct BillRepository {
    pool: SqlitePool,
}

impl BillRepository {
    /// Creates a new BillRepository.
    pub fn new(pool: SqlitePool) -> Self {
        BillRepository { pool }
    }

    /// Saves a bill (with items and optional buyer) in a single transaction.
    ///
    /// ## What This Does
    /// 1. Inserts a buyer row when the bill carries one with a non-blank
    ///    name or phone (within the same transaction; the generated id is
    ///    written back into the bill's buyer)
    /// 2. Stamps `bill_date` with the current local time. Any
    ///    caller-supplied date is overwritten
    /// 3. Inserts the header (`total_amount` = the declared grand total)
    /// 4. Inserts every item row in original sequence order
    ///
    /// ## Guarantee
    /// On `Ok`, the full bill (header + buyer row if applicable + all items)
    /// is durably visible to subsequent reads and the generated id is both
    /// returned and written into `bill.id`. On `Err`, the dropped
    /// transaction has rolled back and no trace of the attempt is visible.
    ///
    /// An empty item list is a valid, persistable bill (rejecting it is the
    /// entry form's concern, not this layer's).
    pub async fn save_bill(&self, bill: &mut Bill) -> DbResult<i64> {
        debug!(items = bill.items.len(), "Saving bill");

        let mut tx = self.pool.begin().await?;

        // Buyer first: the header insert needs the generated buyer_id.
        let buyer_id = match bill.buyer.as_mut() {
            Some(buyer) if buyer.has_identity() => {
                let id = BuyerRepository::new(self.pool.clone())
                    .insert(&mut tx, buyer)
                    .await?;
                buyer.id = Some(id);
                Some(id)
            }
            _ => None,
        };

        // Save-time stamp. Whatever the caller put here is ignored.
        bill.bill_date = Local::now().format(BILL_DATE_FORMAT).to_string();

        let result =
            sqlx::query("INSERT INTO Bills (bill_date, total_amount, buyer_id) VALUES (?1, ?2, ?3)")
                .bind(&bill.bill_date)
                .bind(bill.grand_total)
                .bind(buyer_id)
                .execute(&mut *tx)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::insert_failed("Bills"));
        }
        let bill_id = result.last_insert_rowid();

        // Items keyed to the generated bill_id, in original order. item_id
        // autoincrement preserves that order for reloads.
        for item in &bill.items {
            sqlx::query(
                "INSERT INTO BillItems (bill_id, item_name, quantity, price) VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(bill_id)
            .bind(&item.product_name)
            .bind(item.quantity)
            .bind(item.unit_price)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        bill.id = Some(bill_id);
        info!(bill_id, grand_total = bill.grand_total, "Bill saved");
        Ok(bill_id)
    }

    /// Lists bill headers matching the filter, most recent first.
    ///
    /// Headers only: each returned bill carries id, date, grand total and
    /// the buyer's id + name. Items are not hydrated; the detail view
    /// fetches a single selection via [`get_bill_by_id`](Self::get_bill_by_id)
    /// instead of N+1 eager loads.
    pub async fn list_bills(&self, filter: &BillFilter) -> DbResult<Vec<Bill>> {
        let mut qb = QueryBuilder::<Sqlite>::new(
            "SELECT b.bill_id, b.bill_date, b.total_amount, b.buyer_id, br.name AS buyer_name \
             FROM Bills b LEFT JOIN Buyers br ON b.buyer_id = br.buyer_id WHERE 1=1",
        );

        if let Some(id) = filter.bill_id {
            qb.push(" AND b.bill_id = ").push_bind(id);
        }

        if let Some(name) = filter.buyer_name.as_deref() {
            let needle = name.trim();
            if !needle.is_empty() {
                qb.push(" AND LOWER(br.name) LIKE ")
                    .push_bind(format!("%{}%", needle.to_lowercase()));
            }
        }

        if let Some(from) = filter.date_from {
            // Inclusive day bounds against the fixed-width TEXT stamps.
            qb.push(" AND b.bill_date >= ")
                .push_bind(format!("{}T00:00:00.000", from.format("%Y-%m-%d")));
        }

        if let Some(to) = filter.date_to {
            qb.push(" AND b.bill_date <= ")
                .push_bind(format!("{}T23:59:59.999", to.format("%Y-%m-%d")));
        }

        qb.push(" ORDER BY b.bill_date DESC");

        let rows = qb.build().fetch_all(&self.pool).await?;

        let mut bills = Vec::with_capacity(rows.len());
        for row in rows {
            let buyer_id: Option<i64> = row.try_get("buyer_id")?;
            let buyer = match buyer_id {
                Some(id) => Some(Buyer {
                    id: Some(id),
                    name: row.try_get("buyer_name")?,
                    phone: None,
                }),
                None => None,
            };

            bills.push(Bill {
                id: Some(row.try_get("bill_id")?),
                bill_date: row.try_get("bill_date")?,
                grand_total: row.try_get("total_amount")?,
                buyer,
                ..Bill::default()
            });
        }

        debug!(count = bills.len(), "Listed bills");
        Ok(bills)
    }

    /// Gets a bill by id with items and buyer fully hydrated.
    ///
    /// A missing bill is `Ok(None)`, not an error.
    ///
    /// The returned snapshot carries the derivation chain recomputed from
    /// storage: subtotal from the reloaded item rows, discount amount and
    /// percent back-derived against the stored grand total (amount clamped
    /// at zero; percent zero when the subtotal is zero).
    pub async fn get_bill_by_id(&self, bill_id: i64) -> DbResult<Option<Bill>> {
        let row = sqlx::query(
            "SELECT bill_id, bill_date, total_amount, buyer_id FROM Bills WHERE bill_id = ?1",
        )
        .bind(bill_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let buyer = match row.try_get::<Option<i64>, _>("buyer_id")? {
            Some(id) => BuyerRepository::new(self.pool.clone()).get_by_id(id).await?,
            None => None,
        };

        let items = self.get_bill_items(bill_id).await?;

        let grand_total: f64 = row.try_get("total_amount")?;
        let subtotal: f64 = items.iter().map(BillItem::item_total).sum();
        let (discount_amount, discount_percent) = derive_discount(subtotal, grand_total);

        Ok(Some(Bill {
            id: Some(row.try_get("bill_id")?),
            bill_date: row.try_get("bill_date")?,
            subtotal,
            discount_percent,
            discount_amount,
            grand_total,
            buyer,
            items,
        }))
    }

    /// Loads the items of a bill in original insertion order.
    pub async fn get_bill_items(&self, bill_id: i64) -> DbResult<Vec<BillItem>> {
        let rows = sqlx::query(
            "SELECT item_name, quantity, price FROM BillItems WHERE bill_id = ?1 ORDER BY item_id ASC",
        )
        .bind(bill_id)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            items.push(BillItem {
                product_name: row.try_get("item_name")?,
                quantity: row.try_get("quantity")?,
                unit_price: row.try_get("price")?,
            });
        }

        Ok(items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use chrono::NaiveDateTime;
    use std::time::Duration;

    async fn test_db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    /// The worked scenario: two items, declared grand total 22.5, no buyer.
    fn widget_gadget_bill() -> Bill {
        let mut bill = Bill::new();
        bill.add_item(BillItem::new("Widget", 2.0, 10.0));
        bill.add_item(BillItem::new("Gadget", 1.0, 5.0));
        bill.recalculate(10.0); // subtotal 25.0, grand total 22.5
        bill
    }

    #[tokio::test]
    async fn test_save_and_reload_derives_discount() {
        let db = test_db().await;
        let repo = db.bills();

        let mut bill = widget_gadget_bill();
        let id = repo.save_bill(&mut bill).await.unwrap();
        assert_eq!(bill.id, Some(id));

        let loaded = repo.get_bill_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.subtotal, 25.0);
        assert_eq!(loaded.grand_total, 22.5);
        assert_eq!(loaded.discount_amount, 2.5);
        assert_eq!(loaded.discount_percent, 10.0);

        // original insertion order, preserved by item_id
        let names: Vec<&str> = loaded
            .items
            .iter()
            .map(|i| i.product_name.as_str())
            .collect();
        assert_eq!(names, ["Widget", "Gadget"]);
    }

    #[tokio::test]
    async fn test_null_buyer_path() {
        let db = test_db().await;
        let repo = db.bills();

        // blank buyer fields: no row minted, buyer_id stays NULL
        let mut bill = widget_gadget_bill();
        bill.buyer = Some(Buyer::new("  ", ""));
        let id = repo.save_bill(&mut bill).await.unwrap();

        let loaded = repo.get_bill_by_id(id).await.unwrap().unwrap();
        assert!(loaded.buyer.is_none());

        let buyers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Buyers")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(buyers, 0);
    }

    #[tokio::test]
    async fn test_buyer_hydrated_on_reload() {
        let db = test_db().await;
        let repo = db.bills();

        let mut bill = widget_gadget_bill();
        bill.buyer = Some(Buyer::new("Alice", "0301-1234567"));
        let id = repo.save_bill(&mut bill).await.unwrap();

        // the generated buyer id was written back during save
        let buyer_id = bill.buyer.as_ref().unwrap().id.unwrap();

        let loaded = repo.get_bill_by_id(id).await.unwrap().unwrap();
        let buyer = loaded.buyer.unwrap();
        assert_eq!(buyer.id, Some(buyer_id));
        assert_eq!(buyer.name.as_deref(), Some("Alice"));
        assert_eq!(buyer.phone.as_deref(), Some("0301-1234567"));
    }

    #[tokio::test]
    async fn test_bill_date_is_save_time_stamped_and_sortable() {
        let db = test_db().await;
        let repo = db.bills();

        let mut first = widget_gadget_bill();
        first.bill_date = "PLACEHOLDER".to_string();
        repo.save_bill(&mut first).await.unwrap();

        assert_ne!(first.bill_date, "PLACEHOLDER");
        assert!(
            NaiveDateTime::parse_from_str(&first.bill_date, BILL_DATE_FORMAT).is_ok(),
            "stamp should parse back: {}",
            first.bill_date
        );

        // fixed-width stamps: later saves sort lexicographically after
        std::thread::sleep(Duration::from_millis(5));
        let mut second = widget_gadget_bill();
        repo.save_bill(&mut second).await.unwrap();
        assert!(second.bill_date > first.bill_date);

        // listing returns most recent first
        let listed = repo.list_bills(&BillFilter::new()).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_empty_item_list_is_persistable() {
        let db = test_db().await;
        let repo = db.bills();

        let mut bill = Bill::new();
        bill.recalculate(0.0);
        let id = repo.save_bill(&mut bill).await.unwrap();

        let loaded = repo.get_bill_by_id(id).await.unwrap().unwrap();
        assert!(loaded.items.is_empty());
        assert_eq!(loaded.subtotal, 0.0);
        assert_eq!(loaded.discount_amount, 0.0);
        assert_eq!(loaded.discount_percent, 0.0);
    }

    #[tokio::test]
    async fn test_get_missing_bill_is_none() {
        let db = test_db().await;
        assert!(db.bills().get_bill_by_id(424242).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_values_persist_verbatim() {
        // no gatekeeping: zero and negative values round-trip untouched
        let db = test_db().await;
        let repo = db.bills();

        let mut bill = Bill::new();
        bill.add_item(BillItem::new("", 0.0, -3.5));
        bill.recalculate(0.0);
        let id = repo.save_bill(&mut bill).await.unwrap();

        let loaded = repo.get_bill_by_id(id).await.unwrap().unwrap();
        assert_eq!(loaded.items[0].product_name, "");
        assert_eq!(loaded.items[0].quantity, 0.0);
        assert_eq!(loaded.items[0].unit_price, -3.5);
    }

    #[tokio::test]
    async fn test_filter_buyer_name_substring_case_insensitive() {
        let db = test_db().await;
        let repo = db.bills();

        for name in ["Alice", "Bob", "alicia"] {
            let mut bill = widget_gadget_bill();
            bill.buyer = Some(Buyer::new(name, ""));
            repo.save_bill(&mut bill).await.unwrap();
        }

        let hits = repo
            .list_bills(&BillFilter::new().buyer_name("ali"))
            .await
            .unwrap();

        let mut names: Vec<String> = hits
            .iter()
            .map(|b| b.buyer.as_ref().unwrap().name.clone().unwrap())
            .collect();
        names.sort();
        assert_eq!(names, ["Alice", "alicia"]);
    }

    #[tokio::test]
    async fn test_blank_name_filter_is_ignored() {
        let db = test_db().await;
        let repo = db.bills();

        // one bill with a buyer, one without; a blank filter matches both
        let mut with_buyer = widget_gadget_bill();
        with_buyer.buyer = Some(Buyer::new("Alice", ""));
        repo.save_bill(&mut with_buyer).await.unwrap();
        repo.save_bill(&mut widget_gadget_bill()).await.unwrap();

        let all = repo
            .list_bills(&BillFilter::new().buyer_name("   "))
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_filter_by_id_and_date_range() {
        let db = test_db().await;
        let repo = db.bills();

        let mut first = widget_gadget_bill();
        repo.save_bill(&mut first).await.unwrap();
        let mut second = widget_gadget_bill();
        repo.save_bill(&mut second).await.unwrap();

        // exact id
        let hits = repo
            .list_bills(&BillFilter::new().bill_id(first.id.unwrap()))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, first.id);

        // inclusive range covering today matches both
        let today = Local::now().date_naive();
        let hits = repo
            .list_bills(&BillFilter::new().date_from(today).date_to(today))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);

        // a range ending yesterday matches nothing
        let yesterday = today.pred_opt().unwrap();
        let hits = repo
            .list_bills(&BillFilter::new().date_to(yesterday))
            .await
            .unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_listing_returns_headers_only() {
        let db = test_db().await;
        let repo = db.bills();

        let mut bill = widget_gadget_bill();
        repo.save_bill(&mut bill).await.unwrap();

        let listed = repo.list_bills(&BillFilter::new()).await.unwrap();
        assert!(listed[0].items.is_empty());
        assert_eq!(listed[0].grand_total, 22.5);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_no_trace() {
        let db = test_db().await;
        let repo = db.bills();

        // Fault injection: with the item table gone, the save fails after
        // the buyer and header inserts have already executed in-transaction.
        sqlx::query("DROP TABLE BillItems")
            .execute(db.pool())
            .await
            .unwrap();

        let mut bill = widget_gadget_bill();
        bill.buyer = Some(Buyer::new("Alice", "0301-1234567"));
        let err = repo.save_bill(&mut bill).await;
        assert!(err.is_err());

        // rollback: neither the header nor the buyer row survived
        let bills: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Bills")
            .fetch_one(db.pool())
            .await
            .unwrap();
        let buyers: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM Buyers")
            .fetch_one(db.pool())
            .await
            .unwrap();
        assert_eq!(bills, 0);
        assert_eq!(buyers, 0);
    }
}
