//! Repository interfaces for the import reconciler and the order lifecycle
//! manager. Both engines are constructed with trait objects rather than a
//! live connection so tests can substitute in-memory fakes.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::{article, order, order_line, supplier, order::OrderState};
use crate::errors::ServiceError;

pub mod catalog_repository;
pub mod order_repository;

pub use catalog_repository::SeaOrmCatalogRepository;
pub use order_repository::SeaOrmOrderRepository;

/// Fields for a supplier created through CRUD or import.
#[derive(Debug, Clone, Default)]
pub struct NewSupplier {
    pub name: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
}

/// Fields for an article created through CRUD or import.
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub name: String,
    pub category: Option<String>,
    pub supplier_id: Uuid,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

/// Article fields an import record is allowed to touch. `category` is
/// always written (a record without one clears it); prices are written only
/// when the record supplies them.
#[derive(Debug, Clone, Default)]
pub struct ArticleChanges {
    pub category: Option<String>,
    pub purchase_price: Option<Decimal>,
    pub sale_price: Option<Decimal>,
}

/// Per-supplier slice of the pending-draft aggregation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DraftSummary {
    pub order_id: Uuid,
    pub supplier_id: Uuid,
    pub supplier_name: String,
    pub line_count: u64,
}

/// Catalog lookups and mutations used by the import reconciler and by the
/// lifecycle manager's article/supplier resolution.
#[async_trait]
pub trait CatalogRepository: Send + Sync {
    async fn find_supplier_by_id(&self, id: Uuid) -> Result<Option<supplier::Model>, ServiceError>;

    /// Case-insensitive, trimmed name lookup.
    async fn find_supplier_by_name(
        &self,
        name: &str,
    ) -> Result<Option<supplier::Model>, ServiceError>;

    async fn create_supplier(&self, new: NewSupplier) -> Result<supplier::Model, ServiceError>;

    async fn find_article_by_id(&self, id: Uuid) -> Result<Option<article::Model>, ServiceError>;

    /// Natural-key lookup: (supplier, case-insensitive trimmed name).
    async fn find_article_by_supplier_and_name(
        &self,
        supplier_id: Uuid,
        name: &str,
    ) -> Result<Option<article::Model>, ServiceError>;

    async fn create_article(&self, new: NewArticle) -> Result<article::Model, ServiceError>;

    async fn update_article(
        &self,
        id: Uuid,
        changes: ArticleChanges,
    ) -> Result<article::Model, ServiceError>;

    /// Applies a signed delta to an article's stock quantity. Only called
    /// when stock tracking is enabled.
    async fn adjust_stock(&self, article_id: Uuid, delta: Decimal) -> Result<(), ServiceError>;
}

/// Order and order-line operations used by the lifecycle manager.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn find_order(&self, id: Uuid) -> Result<Option<order::Model>, ServiceError>;

    /// Returns the supplier's current draft, creating one when none exists.
    /// Must behave as a single atomic operation: concurrent callers for the
    /// same supplier observe exactly one draft. The boolean is true when
    /// this call created the draft.
    async fn find_or_create_draft(
        &self,
        supplier_id: Uuid,
    ) -> Result<(order::Model, bool), ServiceError>;

    /// Adds `qty` of an article to an order: increments the existing line
    /// for that article, or appends a new one. Atomic per (order, article);
    /// the boolean is true when an existing line was merged into.
    async fn merge_or_append_line(
        &self,
        order_id: Uuid,
        article_id: Uuid,
        qty: Decimal,
    ) -> Result<(order_line::Model, bool), ServiceError>;

    async fn lines_for_order(&self, order_id: Uuid)
        -> Result<Vec<order_line::Model>, ServiceError>;

    async fn find_line(&self, id: Uuid) -> Result<Option<order_line::Model>, ServiceError>;

    /// Overwrites (never increments) a line's received quantity.
    async fn set_line_received(
        &self,
        id: Uuid,
        qty_received: Decimal,
    ) -> Result<order_line::Model, ServiceError>;

    async fn set_order_state(
        &self,
        id: Uuid,
        state: OrderState,
    ) -> Result<order::Model, ServiceError>;

    /// Line counts of every order currently in draft state.
    async fn draft_summaries(&self) -> Result<Vec<DraftSummary>, ServiceError>;
}
