use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::TransitionPolicy;
use crate::entities::{order, order::OrderState, order_line, supplier};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::{CatalogRepository, DraftSummary, OrderRepository};

/// Feedback for the caller after adding an article to a supplier's draft.
#[derive(Debug, Clone, Serialize)]
pub struct AddToDraftResult {
    pub order_id: Uuid,
    pub supplier_name: String,
    pub line_count: usize,
}

/// Pending-draft aggregation across all suppliers.
#[derive(Debug, Clone, Serialize)]
pub struct DraftCounts {
    pub total_lines: u64,
    pub per_supplier: Vec<DraftSummary>,
}

/// One received quantity to record against an order line.
#[derive(Debug, Clone)]
pub struct ReceiveLine {
    pub line_id: Uuid,
    pub quantity_received: Decimal,
}

/// Owns order state transitions, per-supplier draft accumulation, and
/// receipt reconciliation. Constructed against repository interfaces so
/// tests can substitute in-memory fakes.
#[derive(Clone)]
pub struct OrderService {
    catalog: Arc<dyn CatalogRepository>,
    orders: Arc<dyn OrderRepository>,
    events: Option<EventSender>,
    stock_tracking: bool,
    transition_policy: TransitionPolicy,
}

impl OrderService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        orders: Arc<dyn OrderRepository>,
        events: Option<EventSender>,
        stock_tracking: bool,
        transition_policy: TransitionPolicy,
    ) -> Self {
        Self {
            catalog,
            orders,
            events,
            stock_tracking,
            transition_policy,
        }
    }

    /// Adds an article to its supplier's draft order, lazily creating the
    /// draft when none exists. Adding the same article again merges
    /// quantities instead of appending a second line. Safe to call
    /// concurrently for the same supplier: the repository's find-or-create
    /// is atomic.
    #[instrument(skip(self), fields(article_id = %article_id))]
    pub async fn add_item_to_draft(
        &self,
        article_id: Uuid,
        qty: Option<Decimal>,
    ) -> Result<AddToDraftResult, ServiceError> {
        let qty = qty.unwrap_or(Decimal::ONE);
        if qty <= Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "Quantity must be greater than zero".to_string(),
            ));
        }

        let article = self
            .catalog
            .find_article_by_id(article_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Article {} not found", article_id)))?;

        let supplier = self
            .catalog
            .find_supplier_by_id(article.supplier_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Supplier {} not found", article.supplier_id))
            })?;

        let (draft, created) = self.orders.find_or_create_draft(supplier.id).await?;
        if created {
            if let Some(events) = &self.events {
                events
                    .send_or_log(Event::DraftCreated {
                        order_id: draft.id,
                        supplier_id: supplier.id,
                    })
                    .await;
            }
        }

        let (_, merged) = self
            .orders
            .merge_or_append_line(draft.id, article.id, qty)
            .await?;

        let line_count = self.orders.lines_for_order(draft.id).await?.len();

        info!(
            order_id = %draft.id,
            supplier = %supplier.name,
            merged,
            line_count,
            "article added to draft"
        );

        Ok(AddToDraftResult {
            order_id: draft.id,
            supplier_name: supplier.name,
            line_count,
        })
    }

    /// Total pending draft line count plus a per-supplier breakdown.
    /// Purely a read; no side effects.
    #[instrument(skip(self))]
    pub async fn count_drafts(&self) -> Result<DraftCounts, ServiceError> {
        let per_supplier = self.orders.draft_summaries().await?;
        let total_lines = per_supplier.iter().map(|s| s.line_count).sum();
        Ok(DraftCounts {
            total_lines,
            per_supplier,
        })
    }

    /// Moves an order to a new state. Transitions outside the workflow
    /// graph are rejected or merely logged depending on the configured
    /// policy; same-state requests are no-ops.
    #[instrument(skip(self), fields(order_id = %order_id, new_state = %new_state))]
    pub async fn update_state(
        &self,
        order_id: Uuid,
        new_state: OrderState,
    ) -> Result<order::Model, ServiceError> {
        let existing = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let old_state = existing.state().map_err(|_| {
            ServiceError::InternalError(format!(
                "order {} carries unknown state '{}'",
                existing.id, existing.state
            ))
        })?;

        if old_state == new_state {
            return Ok(existing);
        }

        if !old_state.can_transition_to(new_state) {
            match self.transition_policy {
                TransitionPolicy::Strict => {
                    return Err(ServiceError::InvalidStatus(format!(
                        "Cannot transition from '{}' to '{}'",
                        old_state, new_state
                    )));
                }
                TransitionPolicy::Permissive => {
                    warn!(
                        order_id = %order_id,
                        from = %old_state,
                        to = %new_state,
                        "applying transition outside the order workflow"
                    );
                }
            }
        }

        let updated = self.orders.set_order_state(order_id, new_state).await?;

        if let Some(events) = &self.events {
            events
                .send_or_log(Event::OrderStateChanged {
                    order_id,
                    old_state: old_state.to_string(),
                    new_state: new_state.to_string(),
                })
                .await;
        }

        info!(order_id = %order_id, from = %old_state, to = %new_state, "order state updated");
        Ok(updated)
    }

    /// Records delivered quantities against an order's lines. Received
    /// quantities are overwritten, never incremented. When every line ends
    /// up fully received the order archives itself; under-delivery leaves
    /// the order in its prior state indefinitely.
    #[instrument(skip(self, lines), fields(order_id = %order_id, lines = lines.len()))]
    pub async fn receive(
        &self,
        order_id: Uuid,
        lines: Vec<ReceiveLine>,
    ) -> Result<order::Model, ServiceError> {
        let order = self
            .orders
            .find_order(order_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        // Resolve and validate every line before the first write.
        let mut staged: Vec<(order_line::Model, Decimal)> = Vec::with_capacity(lines.len());
        for entry in &lines {
            if entry.quantity_received < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "Received quantity cannot be negative".to_string(),
                ));
            }

            let line = self
                .orders
                .find_line(entry.line_id)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Order line {} not found", entry.line_id))
                })?;

            if line.order_id != order.id {
                return Err(ServiceError::NotFound(format!(
                    "Order line {} does not belong to order {}",
                    entry.line_id, order_id
                )));
            }

            staged.push((line, entry.quantity_received));
        }

        let mut received: Vec<(Uuid, Decimal)> = Vec::with_capacity(staged.len());
        for (line, qty_received) in staged {
            let updated = self.orders.set_line_received(line.id, qty_received).await?;

            if self.stock_tracking {
                let delta = qty_received - line.qty_received;
                if !delta.is_zero() {
                    self.catalog.adjust_stock(line.article_id, delta).await?;
                }
            }

            received.push((updated.id, qty_received));
        }

        if let Some(events) = &self.events {
            events
                .send_or_log(Event::OrderLinesReceived {
                    order_id,
                    lines: received,
                })
                .await;
        }

        // Fully received orders archive themselves.
        let all_lines = self.orders.lines_for_order(order.id).await?;
        let fully_received = !all_lines.is_empty()
            && all_lines.iter().all(|l| l.qty_received >= l.qty_ordered);

        if fully_received {
            let archived = self
                .orders
                .set_order_state(order.id, OrderState::Archived)
                .await?;
            if let Some(events) = &self.events {
                events.send_or_log(Event::OrderArchived(order.id)).await;
            }
            info!(order_id = %order.id, "order fully received, archived");
            return Ok(archived);
        }

        Ok(order)
    }
}

// ---------------------------------------------------------------------------
// Administrative CRUD, outside the lifecycle engine
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct OrderInput {
    pub supplier_id: Uuid,
    pub order_date: Option<NaiveDate>,
    pub state: Option<OrderState>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct OrderFilter {
    pub state: Option<OrderState>,
    pub supplier_id: Option<Uuid>,
}

/// An order joined with its lines, for detail views.
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithLines {
    #[serde(flatten)]
    pub order: order::Model,
    pub supplier_name: String,
    pub lines: Vec<order_line::Model>,
}

/// Plain order CRUD for administrative screens. Deleting orders or lines
/// is an administrative action; the lifecycle engine itself never
/// hard-deletes anything.
#[derive(Clone)]
pub struct OrderAdminService {
    db: Arc<DatabaseConnection>,
}

impl OrderAdminService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        filter: OrderFilter,
    ) -> Result<(Vec<order::Model>, u64), ServiceError> {
        let mut query = order::Entity::find().order_by_desc(order::Column::CreatedAt);

        if let Some(state) = filter.state {
            query = query.filter(order::Column::State.eq(state.to_string()));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(order::Column::SupplierId.eq(supplier_id));
        }

        let paginator = query.paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get_with_lines(&self, id: Uuid) -> Result<OrderWithLines, ServiceError> {
        let order = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let supplier_name = supplier::Entity::find_by_id(order.supplier_id)
            .one(&*self.db)
            .await?
            .map(|s| s.name)
            .unwrap_or_else(|| order.supplier_id.to_string());

        let lines = order_line::Entity::find()
            .filter(order_line::Column::OrderId.eq(order.id))
            .order_by_asc(order_line::Column::CreatedAt)
            .all(&*self.db)
            .await?;

        Ok(OrderWithLines {
            order,
            supplier_name,
            lines,
        })
    }

    #[instrument(skip(self, input), fields(supplier_id = %input.supplier_id))]
    pub async fn create(&self, input: OrderInput) -> Result<order::Model, ServiceError> {
        supplier::Entity::find_by_id(input.supplier_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Supplier {} does not exist",
                    input.supplier_id
                ))
            })?;

        let now = Utc::now();
        let active = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            supplier_id: Set(input.supplier_id),
            order_date: Set(input.order_date.unwrap_or_else(|| now.date_naive())),
            state: Set(input.state.unwrap_or(OrderState::New).to_string()),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = active.insert(&*self.db).await?;
        info!(order_id = %created.id, "order created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        order::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        info!(order_id = %id, "order deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete_line(&self, order_id: Uuid, line_id: Uuid) -> Result<(), ServiceError> {
        let line = order_line::Entity::find_by_id(line_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order line {} not found", line_id)))?;

        if line.order_id != order_id {
            return Err(ServiceError::NotFound(format!(
                "Order line {} does not belong to order {}",
                line_id, order_id
            )));
        }

        order_line::Entity::delete_by_id(line.id)
            .exec(&*self.db)
            .await?;
        info!(order_id = %order_id, line_id = %line_id, "order line deleted");
        Ok(())
    }
}
