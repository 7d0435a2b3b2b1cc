//! # Stockroom
//!
//! Prepares a deployment: loads configuration, opens the database, applies
//! migrations, and creates the first super admin when the user table is
//! empty and `BOOTSTRAP_ADMIN_*` is set.
//!
//! ## Usage
//! ```bash
//! DATABASE_PATH=./stockroom.db \
//! BOOTSTRAP_ADMIN_USERNAME=root \
//! BOOTSTRAP_ADMIN_EMAIL=root@example.com \
//! BOOTSTRAP_ADMIN_PASSWORD=change-me-now \
//!     cargo run -p stockroom-service --bin stockroom
//! ```

use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use stockroom_core::RolePolicy;
use stockroom_db::Database;
use stockroom_service::{init_tracing, AuthService, ServiceConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::load().context("loading configuration")?;
    init_tracing(&config.log_level);

    info!(app = %config.app_name, path = %config.database_path, "Starting");

    let db = Database::new(config.db_config())
        .await
        .context("opening database")?;

    if !db.health_check().await {
        anyhow::bail!("database health check failed");
    }

    let auth = AuthService::new(db.clone(), Arc::new(RolePolicy), config.session_lifetime());

    match &config.bootstrap_admin {
        Some(admin) => {
            match auth
                .bootstrap_super_admin(&admin.username, &admin.email, &admin.password)
                .await
                .context("creating bootstrap super admin")?
            {
                Some(user) => info!(user = %user.username, "Super admin created"),
                None => info!("Users already exist, bootstrap skipped"),
            }
        }
        None => warn!("BOOTSTRAP_ADMIN_* not set, no super admin created"),
    }

    let catalog = db.items().count().await.context("counting items")?;
    info!(items = catalog, "Stockroom ready");

    db.close().await;
    Ok(())
}
