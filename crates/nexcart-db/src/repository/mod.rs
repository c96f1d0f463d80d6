//! # Repository Module
//!
//! Database repository implementations for NexCart.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repositories and Transactions                        │
//! │                                                                         │
//! │  Service                                                               │
//! │       │  let mut tx = db.begin().await?;                               │
//! │       │  db.carts().touch(&mut tx, user).await?;                       │
//! │       │  db.orders().insert(&mut tx, new_order).await?;                │
//! │       │  db.carts().clear(&mut tx, cart_id).await?;                    │
//! │       │  tx.commit().await?;                                           │
//! │       ▼                                                                 │
//! │  Repositories are stateless. Every method takes the connection it      │
//! │  runs on, so one transaction can span several repositories.            │
//! │  A pool connection (`db.acquire()`) works the same for plain reads.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CartRepository`] - Carts and cart lines
//! - [`OrderRepository`] - Orders and snapshotted order lines
//! - [`PaymentRepository`] - Payments and Stripe sub-records
//! - [`CatalogRepository`] - Product lookup
//! - [`AddressRepository`] - Address book lookup

pub mod address;
pub mod cart;
pub mod catalog;
pub mod order;
pub mod payment;

pub use address::{AddressRepository, NewAddress};
pub use cart::CartRepository;
pub use catalog::{CatalogRepository, NewProduct};
pub use order::{NewOrder, NewOrderLine, OrderRepository};
pub use payment::{NewPayment, PaymentRepository, PAYMENT_ORDER_UNIQUE};
