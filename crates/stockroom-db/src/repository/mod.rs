//! # Repository Module
//!
//! SQL for every table, written once.
//!
//! ## Two Entry Points, One Query
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  db.items().insert(item)             SqliteScope::insert_item(item)    │
//! │       │ (pool: acquire a conn)             │ (inside BEGIN IMMEDIATE)   │
//! │       └──────────────┬─────────────────────┘                           │
//! │                      ▼                                                  │
//! │      item::insert(&mut SqliteConnection, item)                         │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │               SQLite Database                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each module exposes free functions over `&mut SqliteConnection`.
//! Services reach them only through [`SqliteScope`](crate::SqliteScope).
//! Items also have a pool-backed [`ItemRepository`](item::ItemRepository)
//! for the seeding tool and the startup summary, which run outside any
//! unit of work.
//!
//! ## Modules
//!
//! - [`item`] - Catalog items and stock
//! - [`sale`] - Sale headers and lines
//! - [`user`] - User accounts
//! - [`session`] - Login sessions

pub mod item;
pub mod sale;
pub mod session;
pub mod user;
