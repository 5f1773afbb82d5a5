use std::sync::Arc;

use chrono::Utc;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::entities::supplier;
use crate::errors::ServiceError;

#[derive(Debug, Clone, Default)]
pub struct SupplierInput {
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

/// Supplier master-data CRUD.
#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DatabaseConnection>,
}

impl SupplierService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn find_by_name_ci(&self, name: &str) -> Result<Option<supplier::Model>, ServiceError> {
        let found = supplier::Entity::find()
            .filter(
                Expr::expr(Func::lower(Expr::col((
                    supplier::Entity,
                    supplier::Column::Name,
                ))))
                .eq(name.trim().to_lowercase()),
            )
            .one(&*self.db)
            .await?;
        Ok(found)
    }

    #[instrument(skip(self))]
    pub async fn list(
        &self,
        page: u64,
        limit: u64,
        search: Option<String>,
    ) -> Result<(Vec<supplier::Model>, u64), ServiceError> {
        let mut query = supplier::Entity::find().order_by_asc(supplier::Column::Name);
        if let Some(needle) = search.filter(|s| !s.trim().is_empty()) {
            query = query.filter(supplier::Column::Name.contains(needle.trim()));
        }

        let paginator = query.paginate(&*self.db, limit.max(1));
        let total = paginator.num_items().await?;
        let items = paginator.fetch_page(page.saturating_sub(1)).await?;
        Ok((items, total))
    }

    #[instrument(skip(self))]
    pub async fn get(&self, id: Uuid) -> Result<supplier::Model, ServiceError> {
        supplier::Entity::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Supplier {} not found", id)))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: SupplierInput) -> Result<supplier::Model, ServiceError> {
        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Supplier name is required".to_string(),
            ));
        }

        if self.find_by_name_ci(&name).await?.is_some() {
            return Err(ServiceError::Conflict(format!(
                "Supplier '{}' already exists",
                name
            )));
        }

        let now = Utc::now();
        let active = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name),
            contact: Set(input.contact),
            email: Set(input.email),
            notes: Set(input.notes),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = active.insert(&*self.db).await?;
        info!(supplier_id = %created.id, "supplier created");
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update(
        &self,
        id: Uuid,
        input: SupplierInput,
    ) -> Result<supplier::Model, ServiceError> {
        let existing = self.get(id).await?;

        let name = input.name.trim().to_string();
        if name.is_empty() {
            return Err(ServiceError::ValidationError(
                "Supplier name is required".to_string(),
            ));
        }

        if !name.eq_ignore_ascii_case(&existing.name) {
            if let Some(other) = self.find_by_name_ci(&name).await? {
                if other.id != id {
                    return Err(ServiceError::Conflict(format!(
                        "Supplier '{}' already exists",
                        name
                    )));
                }
            }
        }

        let mut active: supplier::ActiveModel = existing.into();
        active.name = Set(name);
        active.contact = Set(input.contact);
        active.email = Set(input.email);
        active.notes = Set(input.notes);
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let existing = self.get(id).await?;
        supplier::Entity::delete_by_id(existing.id)
            .exec(&*self.db)
            .await?;
        info!(supplier_id = %id, "supplier deleted");
        Ok(())
    }
}
