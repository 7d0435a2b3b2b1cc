//! Catalog maintenance: new items, stock corrections, price changes, and
//! the reorder list.

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use stockroom_core::validation::{
    validate_new_item, validate_price_cents, validate_stock_level, validate_uuid,
};
use stockroom_core::{Action, Item, Money, NewItem, PermissionPolicy};
use stockroom_db::{CatalogStore, TransactionManager, UnitOfWork};

use crate::auth::{authorize, require_live_session, Actor};
use crate::error::ServiceResult;

/// Upper bound on the reorder list.
const LOW_STOCK_LIMIT: i64 = 500;

#[derive(Clone)]
pub struct CatalogService<T> {
    store: T,
    policy: Arc<dyn PermissionPolicy>,
}

impl<T: TransactionManager> CatalogService<T> {
    pub fn new(store: T, policy: Arc<dyn PermissionPolicy>) -> Self {
        CatalogService { store, policy }
    }

    pub async fn add_item(&self, actor: &Actor, new_item: NewItem) -> ServiceResult<Item> {
        let now = Utc::now();
        authorize(self.policy.as_ref(), actor, Action::CreateMasterData, now)?;
        validate_new_item(&new_item)?;

        let item = new_item.into_item(Some(actor.user_id.clone()), now);

        let mut scope = self.store.begin().await?;
        require_live_session(&mut scope, actor, now).await?;
        scope.insert_item(&item).await?;
        scope.commit().await?;

        info!(item_id = %item.id, sku = %item.sku, user = %actor.username, "Item added");
        Ok(item)
    }

    /// Sets an absolute stock level (stock take, receiving).
    pub async fn set_stock(&self, actor: &Actor, item_id: &str, stock: i64) -> ServiceResult<Item> {
        let now = Utc::now();
        authorize(self.policy.as_ref(), actor, Action::UpdateStock, now)?;
        validate_uuid("item_id", item_id)?;
        validate_stock_level(stock)?;

        let mut scope = self.store.begin().await?;
        require_live_session(&mut scope, actor, now).await?;
        let item = scope.set_stock(item_id, stock).await?;
        scope.commit().await?;

        info!(item_id = %item.id, stock, user = %actor.username, "Stock set");
        Ok(item)
    }

    /// Changes the selling price. Recorded sale lines keep their price.
    pub async fn set_price(&self, actor: &Actor, item_id: &str, price: Money) -> ServiceResult<Item> {
        let now = Utc::now();
        authorize(self.policy.as_ref(), actor, Action::UpdateMasterData, now)?;
        validate_uuid("item_id", item_id)?;
        validate_price_cents(price.cents())?;

        let mut scope = self.store.begin().await?;
        require_live_session(&mut scope, actor, now).await?;
        let item = scope.set_price(item_id, price.cents()).await?;
        scope.commit().await?;

        info!(item_id = %item.id, price = %price, user = %actor.username, "Price changed");
        Ok(item)
    }

    /// Active items at or below their minimum stock.
    pub async fn low_stock(&self, actor: &Actor) -> ServiceResult<Vec<Item>> {
        authorize(self.policy.as_ref(), actor, Action::CheckMinimumStock, Utc::now())?;

        let mut scope = self.store.begin().await?;
        let items = scope.list_low_stock(LOW_STOCK_LIMIT).await?;
        scope.rollback().await?;
        Ok(items)
    }
}
