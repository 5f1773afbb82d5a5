//! In-memory repository fakes shared by the integration suites. Each fake
//! guards its state with a single mutex, so the find-or-create and
//! merge-or-append operations are atomic exactly as the repository
//! contracts require.
#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use barnode_api::entities::{article, order, order::OrderState, order_line, supplier};
use barnode_api::errors::ServiceError;
use barnode_api::repositories::{
    ArticleChanges, CatalogRepository, DraftSummary, NewArticle, NewSupplier, OrderRepository,
};

#[derive(Default)]
struct CatalogState {
    suppliers: Vec<supplier::Model>,
    articles: Vec<article::Model>,
    /// Article names whose creation should fail, to exercise per-row
    /// recovery in the import reconciler.
    poisoned_articles: Vec<String>,
}

#[derive(Default)]
pub struct InMemoryCatalog {
    state: Mutex<CatalogState>,
}

impl InMemoryCatalog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_on_article(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .poisoned_articles
            .push(name.to_string());
    }

    pub fn supplier_count(&self) -> usize {
        self.state.lock().unwrap().suppliers.len()
    }

    pub fn article_count(&self) -> usize {
        self.state.lock().unwrap().articles.len()
    }

    pub fn supplier_named(&self, name: &str) -> Option<supplier::Model> {
        self.state
            .lock()
            .unwrap()
            .suppliers
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn article_named(&self, name: &str) -> Option<article::Model> {
        self.state
            .lock()
            .unwrap()
            .articles
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .cloned()
    }

    pub fn stock_of(&self, article_id: Uuid) -> Decimal {
        self.state
            .lock()
            .unwrap()
            .articles
            .iter()
            .find(|a| a.id == article_id)
            .map(|a| a.stock_quantity)
            .unwrap_or_default()
    }

    pub fn seed_supplier(&self, name: &str) -> supplier::Model {
        let now = Utc::now();
        let model = supplier::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            contact: Some("+39 333 000 0000".to_string()),
            email: None,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().suppliers.push(model.clone());
        model
    }

    pub fn seed_article(&self, name: &str, supplier_id: Uuid) -> article::Model {
        let now = Utc::now();
        let model = article::Model {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: None,
            supplier_id,
            purchase_price: None,
            sale_price: None,
            stock_quantity: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().articles.push(model.clone());
        model
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalog {
    async fn find_supplier_by_id(&self, id: Uuid) -> Result<Option<supplier::Model>, ServiceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .suppliers
            .iter()
            .find(|s| s.id == id)
            .cloned())
    }

    async fn find_supplier_by_name(
        &self,
        name: &str,
    ) -> Result<Option<supplier::Model>, ServiceError> {
        let needle = name.trim().to_lowercase();
        Ok(self
            .state
            .lock()
            .unwrap()
            .suppliers
            .iter()
            .find(|s| s.name.trim().to_lowercase() == needle)
            .cloned())
    }

    async fn create_supplier(&self, new: NewSupplier) -> Result<supplier::Model, ServiceError> {
        let now = Utc::now();
        let model = supplier::Model {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            contact: new.contact,
            email: new.email,
            notes: new.notes,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().suppliers.push(model.clone());
        Ok(model)
    }

    async fn find_article_by_id(&self, id: Uuid) -> Result<Option<article::Model>, ServiceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .articles
            .iter()
            .find(|a| a.id == id)
            .cloned())
    }

    async fn find_article_by_supplier_and_name(
        &self,
        supplier_id: Uuid,
        name: &str,
    ) -> Result<Option<article::Model>, ServiceError> {
        let needle = name.trim().to_lowercase();
        Ok(self
            .state
            .lock()
            .unwrap()
            .articles
            .iter()
            .find(|a| a.supplier_id == supplier_id && a.name.trim().to_lowercase() == needle)
            .cloned())
    }

    async fn create_article(&self, new: NewArticle) -> Result<article::Model, ServiceError> {
        let mut state = self.state.lock().unwrap();
        if state.poisoned_articles.iter().any(|p| p == &new.name) {
            return Err(ServiceError::DatabaseError(sea_orm::DbErr::Custom(
                "simulated storage failure".to_string(),
            )));
        }

        let now = Utc::now();
        let model = article::Model {
            id: Uuid::new_v4(),
            name: new.name.trim().to_string(),
            category: new.category,
            supplier_id: new.supplier_id,
            purchase_price: new.purchase_price,
            sale_price: new.sale_price,
            stock_quantity: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        state.articles.push(model.clone());
        Ok(model)
    }

    async fn update_article(
        &self,
        id: Uuid,
        changes: ArticleChanges,
    ) -> Result<article::Model, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let article = state
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("Article {} not found", id)))?;

        article.category = changes.category;
        if let Some(price) = changes.purchase_price {
            article.purchase_price = Some(price);
        }
        if let Some(price) = changes.sale_price {
            article.sale_price = Some(price);
        }
        article.updated_at = Utc::now();
        Ok(article.clone())
    }

    async fn adjust_stock(&self, article_id: Uuid, delta: Decimal) -> Result<(), ServiceError> {
        let mut state = self.state.lock().unwrap();
        let article = state
            .articles
            .iter_mut()
            .find(|a| a.id == article_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Article {} not found", article_id)))?;
        article.stock_quantity += delta;
        Ok(())
    }
}

#[derive(Default)]
struct OrdersState {
    orders: Vec<order::Model>,
    lines: Vec<order_line::Model>,
}

pub struct InMemoryOrders {
    state: Mutex<OrdersState>,
    catalog: Arc<InMemoryCatalog>,
}

impl InMemoryOrders {
    pub fn new(catalog: Arc<InMemoryCatalog>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(OrdersState::default()),
            catalog,
        })
    }

    pub fn order_count(&self) -> usize {
        self.state.lock().unwrap().orders.len()
    }

    pub fn drafts_for_supplier(&self, supplier_id: Uuid) -> Vec<order::Model> {
        self.state
            .lock()
            .unwrap()
            .orders
            .iter()
            .filter(|o| {
                o.supplier_id == supplier_id && o.state == OrderState::Draft.to_string()
            })
            .cloned()
            .collect()
    }

    pub fn order(&self, id: Uuid) -> Option<order::Model> {
        self.state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned()
    }
}

#[async_trait]
impl OrderRepository for InMemoryOrders {
    async fn find_order(&self, id: Uuid) -> Result<Option<order::Model>, ServiceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .orders
            .iter()
            .find(|o| o.id == id)
            .cloned())
    }

    async fn find_or_create_draft(
        &self,
        supplier_id: Uuid,
    ) -> Result<(order::Model, bool), ServiceError> {
        let mut state = self.state.lock().unwrap();

        if let Some(existing) = state
            .orders
            .iter()
            .find(|o| o.supplier_id == supplier_id && o.state == OrderState::Draft.to_string())
        {
            return Ok((existing.clone(), false));
        }

        let now = Utc::now();
        let model = order::Model {
            id: Uuid::new_v4(),
            supplier_id,
            order_date: now.date_naive(),
            state: OrderState::Draft.to_string(),
            notes: None,
            created_at: now,
            updated_at: now,
        };
        state.orders.push(model.clone());
        Ok((model, true))
    }

    async fn merge_or_append_line(
        &self,
        order_id: Uuid,
        article_id: Uuid,
        qty: Decimal,
    ) -> Result<(order_line::Model, bool), ServiceError> {
        let mut state = self.state.lock().unwrap();

        if let Some(line) = state
            .lines
            .iter_mut()
            .find(|l| l.order_id == order_id && l.article_id == article_id)
        {
            line.qty_ordered += qty;
            line.updated_at = Utc::now();
            return Ok((line.clone(), true));
        }

        let now = Utc::now();
        let model = order_line::Model {
            id: Uuid::new_v4(),
            order_id,
            article_id,
            qty_ordered: qty,
            qty_received: Decimal::ZERO,
            notes: None,
            created_at: now,
            updated_at: now,
        };
        state.lines.push(model.clone());
        Ok((model, false))
    }

    async fn lines_for_order(
        &self,
        order_id: Uuid,
    ) -> Result<Vec<order_line::Model>, ServiceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .lines
            .iter()
            .filter(|l| l.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn find_line(&self, id: Uuid) -> Result<Option<order_line::Model>, ServiceError> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .lines
            .iter()
            .find(|l| l.id == id)
            .cloned())
    }

    async fn set_line_received(
        &self,
        id: Uuid,
        qty_received: Decimal,
    ) -> Result<order_line::Model, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let line = state
            .lines
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order line {} not found", id)))?;
        line.qty_received = qty_received;
        line.updated_at = Utc::now();
        Ok(line.clone())
    }

    async fn set_order_state(
        &self,
        id: Uuid,
        new_state: OrderState,
    ) -> Result<order::Model, ServiceError> {
        let mut state = self.state.lock().unwrap();
        let order = state
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", id)))?;
        order.state = new_state.to_string();
        order.updated_at = Utc::now();
        Ok(order.clone())
    }

    async fn draft_summaries(&self) -> Result<Vec<DraftSummary>, ServiceError> {
        let state = self.state.lock().unwrap();
        let mut summaries = Vec::new();

        for order in state
            .orders
            .iter()
            .filter(|o| o.state == OrderState::Draft.to_string())
        {
            let line_count = state
                .lines
                .iter()
                .filter(|l| l.order_id == order.id)
                .count() as u64;

            let supplier_name = self
                .catalog
                .state
                .lock()
                .unwrap()
                .suppliers
                .iter()
                .find(|s| s.id == order.supplier_id)
                .map(|s| s.name.clone())
                .unwrap_or_else(|| order.supplier_id.to_string());

            summaries.push(DraftSummary {
                order_id: order.id,
                supplier_id: order.supplier_id,
                supplier_name,
                line_count,
            });
        }

        Ok(summaries)
    }
}
