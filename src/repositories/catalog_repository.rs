use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use tracing::info;
use uuid::Uuid;

use crate::entities::{article, supplier};
use crate::errors::ServiceError;

use super::{ArticleChanges, CatalogRepository, NewArticle, NewSupplier};

/// Catalog repository backed by the relational store.
#[derive(Clone)]
pub struct SeaOrmCatalogRepository {
    db: Arc<DatabaseConnection>,
}

impl SeaOrmCatalogRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CatalogRepository for SeaOrmCatalogRepository {
    async fn find_supplier_by_id(&self, id: Uuid) -> Result<Option<supplier::Model>, ServiceError> {
        let found = supplier::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(found)
    }

    async fn find_supplier_by_name(
        &self,
        name: &str,
    ) -> Result<Option<supplier::Model>, ServiceError> {
        let needle = name.trim().to_lowercase();
        let found = supplier::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col((
                    supplier::Entity,
                    supplier::Column::Name,
                ))))
                .eq(needle),
            )
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    async fn create_supplier(&self, new: NewSupplier) -> Result<supplier::Model, ServiceError> {
        let now = Utc::now();
        let active = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name.trim().to_string()),
            contact: Set(new.contact),
            email: Set(new.email),
            notes: Set(new.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = active.insert(&*self.db).await?;
        info!(supplier_id = %created.id, name = %created.name, "supplier created");
        Ok(created)
    }

    async fn find_article_by_id(&self, id: Uuid) -> Result<Option<article::Model>, ServiceError> {
        let found = article::Entity::find_by_id(id).one(&*self.db).await?;
        Ok(found)
    }

    async fn find_article_by_supplier_and_name(
        &self,
        supplier_id: Uuid,
        name: &str,
    ) -> Result<Option<article::Model>, ServiceError> {
        let needle = name.trim().to_lowercase();
        let found = article::Entity::find()
            .filter(article::Column::SupplierId.eq(supplier_id))
            .filter(
                Expr::expr(Func::lower(Expr::col((
                    article::Entity,
                    article::Column::Name,
                ))))
                .eq(needle),
            )
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    async fn create_article(&self, new: NewArticle) -> Result<article::Model, ServiceError> {
        let now = Utc::now();
        let active = article::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(new.name.trim().to_string()),
            category: Set(new.category),
            supplier_id: Set(new.supplier_id),
            purchase_price: Set(new.purchase_price),
            sale_price: Set(new.sale_price),
            stock_quantity: Set(Decimal::ZERO),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = active.insert(&*self.db).await?;
        info!(article_id = %created.id, name = %created.name, "article created");
        Ok(created)
    }

    async fn update_article(
        &self,
        id: Uuid,
        changes: ArticleChanges,
    ) -> Result<article::Model, ServiceError> {
        let existing = article::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Article {} not found", id)))?;

        let mut active: article::ActiveModel = existing.into();
        active.category = Set(changes.category);
        if let Some(price) = changes.purchase_price {
            active.purchase_price = Set(Some(price));
        }
        if let Some(price) = changes.sale_price {
            active.sale_price = Set(Some(price));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }

    async fn adjust_stock(&self, article_id: Uuid, delta: Decimal) -> Result<(), ServiceError> {
        let existing = article::Entity::find_by_id(article_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Article {} not found", article_id)))?;

        let new_quantity = existing.stock_quantity + delta;
        let mut active: article::ActiveModel = existing.into();
        active.stock_quantity = Set(new_quantity);
        active.updated_at = Set(Utc::now());
        active.update(&*self.db).await?;

        Ok(())
    }
}
