//! # retail-core: Pure Entity Model for the Billing System
//!
//! This crate holds the in-memory shape of a sales transaction and every
//! derived-value computation, as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Billing Data Flow                                │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Presentation Layer (out of scope)                  │   │
//! │  │    Bill entry form ──► Records browser ──► Receipt / PDF        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ retail-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   Buyer • BillItem • Bill • recalculate() • derive_discount()  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  retail-db (Persistence Layer)                  │   │
//! │  │            SQLite queries, migrations, repositories             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every computation is deterministic
//! 2. **No Gatekeeping**: validation belongs to the entry form; this model
//!    accepts and carries whatever values arrive, verbatim
//! 3. **Derived Values Stay Derived**: item totals and subtotals are never
//!    cached, so no staleness is possible

pub mod model;

pub use model::{derive_discount, Bill, BillItem, Buyer};
