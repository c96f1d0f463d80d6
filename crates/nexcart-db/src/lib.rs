//! # nexcart-db: Database Layer for NexCart
//!
//! SQLite storage for carts, orders and payments, plus the read-only
//! product and address lookups checkout depends on.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        NexCart Data Flow                                │
//! │                                                                         │
//! │  shop-api service (create_from_cart)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     nexcart-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ CartRepo      │    │ 001_initial_ │  │   │
//! │  │   │ SqlitePool    │◄───│ OrderRepo     │    │   schema.sql │  │   │
//! │  │   │ begin()       │    │ PaymentRepo   │    │              │  │   │
//! │  │   │ acquire()     │    │ Catalog/Addr  │    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database (WAL)                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use nexcart_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./nexcart.db")).await?;
//!
//! let mut tx = db.begin().await?;
//! let cart = db.carts().claim(&mut tx, "user-1").await?;
//! tx.commit().await?;
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

pub use repository::{
    AddressRepository, CartRepository, CatalogRepository, NewAddress, NewOrder, NewOrderLine,
    NewPayment, NewProduct, OrderRepository, PaymentRepository, PAYMENT_ORDER_UNIQUE,
};
