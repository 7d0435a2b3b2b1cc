//! # stockroom-service: Services for Stockroom
//!
//! Authorization, sessions, and the transactional sale workflow, written
//! against the store traits of `stockroom-db` so every service runs over
//! SQLite or the in-memory store.
//!
//! ## Request Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  bearer token                                                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AuthService::authenticate ──► Actor { user_id, role, session token }  │
//! │       │                                                                 │
//! │       ├──► SaleService::create_sale    (one unit of work, all or none) │
//! │       ├──► SaleService::list/get/update                                │
//! │       ├──► CatalogService::add_item / set_stock / set_price / low_stock│
//! │       └──► AuthService::register_user / change_role / deactivate_user  │
//! │                                                                         │
//! │  Every call re-checks the actor's session expiry and asks the          │
//! │  injected PermissionPolicy before touching storage. Writes re-read     │
//! │  the session inside their unit of work, so a logout lands at once.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`auth`] - Login, token resolution, account management
//! - [`sale`] - Sale recording and lookup
//! - [`catalog`] - Item maintenance
//! - [`config`] - Environment configuration
//! - [`telemetry`] - Tracing setup
//! - [`error`] - Service error types

pub mod auth;
pub mod catalog;
pub mod config;
pub mod error;
pub mod sale;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod testing;

pub use auth::{authorize, require_live_session, Actor, AuthService, LoginGrant, NewUser};
pub use catalog::CatalogService;
pub use config::{BootstrapAdmin, ConfigError, ServiceConfig};
pub use error::{ServiceError, ServiceResult};
pub use sale::SaleService;
pub use telemetry::init_tracing;
