//! # Sale Service
//!
//! Records sales atomically: validate, authorize, then price every line,
//! write the header and lines, and decrement stock inside one unit of work.
//!
//! ## Sale Workflow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(actor, request)                                           │
//! │                                                                         │
//! │  1. request.validate()          shape only, no storage                 │
//! │  2. authorize(CreateSale)       cached expiry, role allowed            │
//! │  3. tm.begin()  ─────────────────────────────────────────────┐          │
//! │     re-read session: unrevoked, unexpired, user active      │          │
//! │  4. per line, in order:                                      │          │
//! │       load item (missing/inactive → NotFound)                │          │
//! │       aggregate qty per item, stock < total → Insufficient   │  one     │
//! │       subtotal = price × qty − line discount (checked)       │  unit of │
//! │  5. grand = total − discount + tax (checked)                 │  work    │
//! │  6. insert header (pending)                                  │          │
//! │  7. per line: insert line, guarded reduce_stock              │          │
//! │  8. commit ◄─────────────────────────────────────────────────┘          │
//! │                                                                         │
//! │  Any error before 8 drops the scope: nothing is persisted.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use stockroom_core::sale::{price_line, SaleTotals, StockDemand};
use stockroom_core::validation::{validate_email, validate_uuid};
use stockroom_core::{
    Action, CreateSaleRequest, Item, PageRequest, Paginated, PaymentStatus, PermissionPolicy,
    RecordedSale, Sale, SaleLine, SaleUpdate, ValidationError,
};
use stockroom_db::{CatalogStore, SaleLedger, StockReduction, TransactionManager, UnitOfWork};

use crate::auth::{authorize, require_live_session, Actor};
use crate::error::{ServiceError, ServiceResult};

/// Sale recording and lookup.
#[derive(Clone)]
pub struct SaleService<T> {
    store: T,
    policy: Arc<dyn PermissionPolicy>,
    page_limit: i64,
}

impl<T: TransactionManager> SaleService<T> {
    pub fn new(store: T, policy: Arc<dyn PermissionPolicy>, page_limit: i64) -> Self {
        SaleService {
            store,
            policy,
            page_limit,
        }
    }

    /// Records a sale and decrements stock, all or nothing.
    pub async fn create_sale(
        &self,
        actor: &Actor,
        request: CreateSaleRequest,
    ) -> ServiceResult<RecordedSale> {
        request.validate()?;
        let now = Utc::now();
        authorize(self.policy.as_ref(), actor, Action::CreateSale, now)?;

        let mut scope = self.store.begin().await?;

        match record(&mut scope, actor, &request, now).await {
            Ok(recorded) => {
                scope.commit().await?;
                info!(
                    sale_id = %recorded.sale.id,
                    invoice = %recorded.sale.invoice_number,
                    lines = recorded.lines.len(),
                    grand_total = recorded.sale.grand_total_cents,
                    user = %actor.username,
                    "Sale recorded"
                );
                Ok(recorded)
            }
            Err(err) => {
                warn!(
                    invoice = %request.invoice_number,
                    user = %actor.username,
                    error = %err,
                    "Sale rolled back"
                );
                if let Err(rollback) = scope.rollback().await {
                    warn!(error = %rollback, "Rollback failed");
                }
                Err(err)
            }
        }
    }

    /// One page of sales, newest first.
    pub async fn list_sales(&self, actor: &Actor, page: i64) -> ServiceResult<Paginated<Sale>> {
        authorize(self.policy.as_ref(), actor, Action::ViewSale, Utc::now())?;

        let request = PageRequest::new(page, self.page_limit);
        let mut scope = self.store.begin().await?;
        let (sales, total_rows) = scope.list_sales(request).await?;
        scope.rollback().await?;

        Ok(Paginated::new(sales, request, total_rows))
    }

    /// A sale with its lines.
    pub async fn get_sale(&self, actor: &Actor, sale_id: &str) -> ServiceResult<RecordedSale> {
        authorize(self.policy.as_ref(), actor, Action::ViewSale, Utc::now())?;
        validate_uuid("sale_id", sale_id)?;

        let mut scope = self.store.begin().await?;
        let sale = scope
            .find_sale(sale_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Sale", sale_id))?;
        let lines = scope.sale_lines(sale_id).await?;
        scope.rollback().await?;

        Ok(RecordedSale { sale, lines })
    }

    /// Edits customer details, payment method, notes, or payment status.
    /// Totals and lines never change.
    pub async fn update_sale(
        &self,
        actor: &Actor,
        sale_id: &str,
        update: SaleUpdate,
    ) -> ServiceResult<Sale> {
        authorize(self.policy.as_ref(), actor, Action::UpdateSale, Utc::now())?;
        validate_uuid("sale_id", sale_id)?;
        if update.is_empty() {
            return Err(ValidationError::Empty {
                field: "update".to_string(),
            }
            .into());
        }
        if let Some(email) = update.customer_email.as_deref().filter(|e| !e.is_empty()) {
            validate_email(email)?;
        }

        let mut scope = self.store.begin().await?;
        require_live_session(&mut scope, actor, Utc::now()).await?;
        let sale = scope.update_sale_details(sale_id, &update).await?;
        scope.commit().await?;

        info!(
            sale_id = %sale.id,
            status = %sale.payment_status,
            user = %actor.username,
            "Sale updated"
        );
        Ok(sale)
    }
}

/// Steps 3-7 of the workflow against any unit of work. The caller commits.
async fn record<S: UnitOfWork>(
    scope: &mut S,
    actor: &Actor,
    request: &CreateSaleRequest,
    now: DateTime<Utc>,
) -> ServiceResult<RecordedSale> {
    require_live_session(scope, actor, now).await?;

    let sale_id = Uuid::new_v4().to_string();
    let mut demand = StockDemand::new();
    let mut lines = Vec::with_capacity(request.lines.len());

    for line in &request.lines {
        let item = load_sellable(scope, &line.item_id).await?;

        let requested = demand.add(&item.id, line.quantity);
        if !item.can_supply(requested) {
            return Err(ServiceError::InsufficientStock {
                item_id: item.id,
                available: item.stock,
                requested,
            });
        }

        let subtotal = price_line(item.price(), line.quantity, line.discount)?;
        lines.push(SaleLine {
            id: Uuid::new_v4().to_string(),
            sale_id: sale_id.clone(),
            item_id: item.id,
            quantity: line.quantity,
            unit_price_cents: item.price_cents,
            discount_cents: line.discount.cents(),
            subtotal_cents: subtotal.cents(),
            created_at: now,
        });
    }

    let totals = SaleTotals::compute(
        lines.iter().map(SaleLine::subtotal),
        request.discount,
        request.tax,
    )?;

    let sale = Sale {
        id: sale_id,
        invoice_number: request.invoice_number.trim().to_string(),
        customer_name: request.customer_name.clone(),
        customer_phone: request.customer_phone.clone(),
        customer_email: request.customer_email.clone(),
        sale_date: now,
        total_amount_cents: totals.total_amount.cents(),
        discount_cents: totals.discount.cents(),
        tax_cents: totals.tax.cents(),
        grand_total_cents: totals.grand_total.cents(),
        payment_method: request.payment_method.clone(),
        payment_status: PaymentStatus::Pending,
        notes: request.notes.clone(),
        created_by: actor.user_id.clone(),
        created_at: now,
        updated_at: now,
    };
    scope.insert_sale(&sale).await?;

    for line in &lines {
        scope.insert_line(line).await?;
        match scope.reduce_stock(&line.item_id, line.quantity).await? {
            StockReduction::Reduced => {}
            StockReduction::Insufficient { available } => {
                return Err(ServiceError::InsufficientStock {
                    item_id: line.item_id.clone(),
                    available,
                    requested: demand.requested(&line.item_id),
                });
            }
        }
    }

    Ok(RecordedSale { sale, lines })
}

/// Loads an item that can still be sold.
async fn load_sellable<S: CatalogStore>(scope: &mut S, item_id: &str) -> ServiceResult<Item> {
    scope
        .find_item(item_id)
        .await?
        .filter(|item| item.is_active)
        .ok_or_else(|| ServiceError::not_found("Item", item_id))
}

// =============================================================================
// Unit Tests
// =============================================================================
