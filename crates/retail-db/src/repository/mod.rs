//! # Repository Module
//!
//! Database repository implementations for the billing system.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern Explained                         │
//! │                                                                         │
//! │  Caller (entry form / records browser)                                 │
//! │       │                                                                 │
//! │       │  db.bills().save_bill(&mut bill)                               │
//! │       ▼                                                                 │
//! │  BillRepository                                                        │
//! │  ├── save_bill(&self, &mut bill)                                       │
//! │  ├── get_bill_by_id(&self, id)                                         │
//! │  ├── list_bills(&self, filter)                                         │
//! │  └── get_bill_items(&self, bill_id)                                    │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Benefits:                                                              │
//! │  • SQL is isolated in one place                                        │
//! │  • Transaction boundaries live next to the statements they wrap        │
//! │  • Callers deal in entity types, never rows                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`buyer::BuyerRepository`] - Buyer insert and lookup
//! - [`bill::BillRepository`] - Atomic bill save, hydrating lookup, filtered listing

pub mod bill;
pub mod buyer;
