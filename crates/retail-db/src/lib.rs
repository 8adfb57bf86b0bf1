//! # retail-db: Persistence Layer for the Billing System
//!
//! This crate provides database access for the retail billing core.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billing Data Flow                                │
//! │                                                                         │
//! │  Entry form builds a Bill (retail-core) and calls save_bill            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     retail-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (bill.rs,    │    │  (embedded)  │  │   │
//! │  │   │               │    │   buyer.rs)   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ BillRepo      │    │ 001_init.sql │  │   │
//! │  │   │ WAL + FK on   │    │ BuyerRepo     │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              SQLite Database (retailshop.db)                    │   │
//! │  │        Buyers ◄── Bills ◄── BillItems (generated id chain)      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations (bill, buyer)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use retail_db::{BillFilter, Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/retailshop.db")).await?;
//!
//! let bill_id = db.bills().save_bill(&mut bill).await?;
//! let snapshot = db.bills().get_bill_by_id(bill_id).await?;
//! let today = db.bills().list_bills(&BillFilter::new().date_from(date)).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::bill::{BillFilter, BillRepository, BILL_DATE_FORMAT};
pub use repository::buyer::BuyerRepository;
