use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::{article, supplier};
use crate::errors::ServiceError;

#[derive(Debug, Clone)]
pub struct ArticleInput {
    pub name: String,
    pub category: Option<String>,
    pub supplier_id: Uuid,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

#[derive(Debug, Clone, Default)]
pub struct ArticleFilter {
    pub search: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub category: Option<String>,
}

/// Catalog article CRUD.
#[derive(Clone)]
pub struct ArticleService {
    db: Arc<DatabaseConnection>,
}

impl ArticleService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        filter: ArticleFilter,
    ) -> Result<(Vec<article::Model>, u64), ServiceError> {
        let mut query = article::Entity::find().order_by_asc(article::Column::Name);

        if let Some(needle) = filter.search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(article::Column::Name.contains(needle.trim()));
        }
        if let Some(supplier_id) = filter.supplier_id {
            query = query.filter(article::Column::SupplierId.eq(supplier_id));
        }
        if let Some(category) = filter.category.filter(|c| !c.trim().is_empty()) {
            query = query.filter(article::Column::Category.eq(category.trim()));
        }

        let paginator = query.paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<article::Model, ServiceError> {
        article::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Article {} not found", id)))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: ArticleInput) -> Result<article::Model, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Article name is required".to_string(),
            ));
        }

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
        let active = article::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            category: Set(input.category),
            supplier_id: Set(input.supplier_id),
            purchase_price: Set(input.purchase_price),
            sale_price: Set(input.sale_price),
            stock_quantity: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = active.insert(&*self.db).await?;
        info!(article_id = %created.id, "article created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: ArticleInput,
    ) -> Result<article::Model, ServiceError> {
        let existing = self.get(id).await?;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Article name is required".to_string(),
            ));
        }

        if input.supplier_id != existing.supplier_id {
            supplier::Entity::find_by_id(input.supplier_id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "Supplier {} does not exist",
                        input.supplier_id
                    ))
                })?;
        }

        let mut active: article::ActiveModel = existing.into();
        active.name = Set(name);
        active.category = Set(input.category);
        active.supplier_id = Set(input.supplier_id);
        active.purchase_price = Set(input.purchase_price);
        active.sale_price = Set(input.sale_price);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        article::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        info!(article_id = %id, "article deleted");
        Ok(())
    }
}
