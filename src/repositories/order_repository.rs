use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, SqlErr, TransactionTrait,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::{order, order::OrderState, order_line, supplier};
use crate::errors::ServiceError;

use super::{DraftSummary, OrderRepository};

/// Order repository backed by the relational store. The single-draft and
/// single-line-per-article invariants lean on unique indexes; both create
/// paths catch the constraint violation and retry as a lookup.
#[derive(Clone)]
pub struct SeaOrmOrderRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmOrderRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_draft_for_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Option<order::Model>, ServiceError> {
        let found = order::Entity::find()
            .filter(order::Column::SupplierId.eq(supplier_id))
            .filter(order::Column::State.eq(OrderState::Draft.to_string()))
            .one(&*self.db)
            .await?;
        Ok(found)
    }
}

#[async_trait]
impl OrderRepository for SeaOrmOrderRepository {
    async fn find_order(&self, id: Uuid) -> Result<Option<order::Model>, ServiceError> {
        let found = order::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(found)
    }

    async fn find_or_create_draft(
        &self,
        supplier_id: Uuid,
    ) -> Result<(order::Model, bool), ServiceError> {
        if let Some(existing) = self.find_draft_for_supplier(supplier_id).await? {
            return Ok((existing, false));
        }

        let now = Utc::now();
        let active = order::ActiveModel {
            id: Set(Uuid::new_v4()),
            supplier_id: Set(supplier_id),
            order_date: Set(now.date_naive()),
            state: Set(OrderState::Draft.to_string()),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match active.insert(&*self.db).await {
            Ok(created) => {
                info!(order_id = %created.id, supplier_id = %supplier_id, "draft order created");
                Ok((created, true))
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // Lost the create race; the winner's draft is the one we want.
                warn!(supplier_id = %supplier_id, "concurrent draft creation detected, retrying as lookup");
                let existing = self.find_draft_for_supplier(supplier_id).await?.ok_or_else(|| {
                    ServiceError::Conflict(format!(
                        "Draft for supplier {} vanished during creation",
                        supplier_id
                    ))
                })?;
                Ok((existing, false))
            }
            Err(err) => Err(err.into()),
        }
    }

    async fn merge_or_append_line(
        &self,
        order_id: Uuid,
        article_id: Uuid,
        qty: Decimal,
    ) -> Result<(order_line::Model, bool), ServiceError> {
        let txn = self.db.begin().await?;

        let existing = order_line::Entity::find()
            .filter(order_line::Column::OrderId.eq(order_id))
            .filter(order_line::Column::ArticleId.eq(article_id))
            .one(&txn)
            .await?;

        if let Some(line) = existing {
            let merged_qty = line.qty_ordered + qty;
            let mut active: order_line::ActiveModel = line.into();
            active.qty_ordered = Set(merged_qty);
            active.updated_at = Set(Utc::now());
            let updated = active.update(&txn).await?;
            txn.commit().await?;
            return Ok((updated, true));
        }

        let now = Utc::now();
        let active = order_line::ActiveModel {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id),
            article_id: Set(article_id),
            qty_ordered: Set(qty),
            qty_received: Set(Decimal::ZERO),
            notes: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        };

        match active.insert(&txn).await {
            Ok(created) => {
                txn.commit().await?;
                Ok((created, false))
            }
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                // A concurrent call appended the line first; merge into it.
                txn.rollback().await?;
                let line = order_line::Entity::find()
                    .filter(order_line::Column::OrderId.eq(order_id))
                    .filter(order_line::Column::ArticleId.eq(article_id))
                    .one(&*self.db)
                    .await?
                    .ok_or_else(|| {
                        ServiceError::Conflict(format!(
                            "Line for article {} on order {} vanished during creation",
                            article_id, order_id
                        ))
                    })?;

                let merged_qty = line.qty_ordered + qty;
                let mut active: order_line::ActiveModel = line.into();
                active.qty_ordered = Set(merged_qty);
                active.updated_at = Set(Utc::now());
                let updated = active.update(&*self.db).await?;
                Ok((updated, true))
            }
            Err(err) => {
                txn.rollback().await?;
                Err(err.into())
            }
        }
    }

    async fn lines_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<order_line::Model>, ServiceError> {
        let lines = order_line::Entity::find()
            .filter(order_line::Column::OrderId.eq(order_id))
            .all(&*self.db)
            .await?;
        Ok(lines)
    }

    async fn find_line(&self, id: Uuid) -> Result<Option<order_line::Model>, ServiceError> {
        let found = order_line::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(found)
    }

    async fn set_line_received(
        &self,
        id: Uuid,
        qty_received: Decimal,
    ) -> Result<order_line::Model, ServiceError> {
        let existing = order_line::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order line {} not found", id)))?;

        let mut active: order_line::ActiveModel = existing.into();
        active.qty_received = Set(qty_received);
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }

    async fn set_order_state(
        &self,
        id: Uuid,
        state: OrderState,
    ) -> Result<order::Model, ServiceError> {
        let existing = order::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;

        let mut active: order::ActiveModel = existing.into();
        active.state = Set(state.to_string());
        active.updated_at = Set(Utc::now());
        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }

    async fn draft_summaries(&self) -> Result<Vec<DraftSummary>, ServiceError> {
        let drafts = order::Entity::find()
            .filter(order::Column::State.eq(OrderState::Draft.to_string()))
            .all(&*self.db)
            .await?;

        let mut summaries = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let line_count = order_line::Entity::find()
                .filter(order_line::Column::OrderId.eq(draft.id))
                .count(&*self.db)
                .await?;

            let supplier_name = supplier::Entity::find_by_id(draft.supplier_id)
                .one(&*self.db)
                .await?
                .map(|s| s.name)
                .unwrap_or_else(|| draft.supplier_id.to_string());

            summaries.push(DraftSummary {
                order_id: draft.id,
                supplier_id: draft.supplier_id,
                supplier_name,
                line_count,
            });
        }

        Ok(summaries)
    }
}
