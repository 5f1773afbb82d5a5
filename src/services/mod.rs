use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::import::ImportService;
use crate::repositories::{SeaOrmCatalogRepository, SeaOrmOrderRepository};

pub mod articles;
pub mod orders;
pub mod suppliers;

pub use articles::ArticleService;
pub use orders::{OrderAdminService, OrderService};
pub use suppliers::SupplierService;

/// All services the handlers reach through the app state.
#[derive(Clone)]
pub struct AppServices {
    pub suppliers: Arc<SupplierService>,
    pub articles: Arc<ArticleService>,
    pub orders: Arc<OrderService>,
    pub order_admin: Arc<OrderAdminService>,
    pub imports: Arc<ImportService>,
}

impl AppServices {
    pub fn build(
        db: Arc<DatabaseConnection>,
        config: &AppConfig,
        events: EventSender,
    ) -> Self {
        let catalog_repo = Arc::new(SeaOrmCatalogRepository::new(db.clone()));
        let order_repo = Arc::new(SeaOrmOrderRepository::new(db.clone()));

        Self {
            suppliers: Arc::new(SupplierService::new(db.clone())),
            articles: Arc::new(ArticleService::new(db.clone())),
            orders: Arc::new(OrderService::new(
                catalog_repo.clone(),
                order_repo,
                Some(events.clone()),
                config.stock_tracking,
                config.transition_policy,
            )),
            order_admin: Arc::new(OrderAdminService::new(db)),
            imports: Arc::new(ImportService::new(
                catalog_repo,
                Some(events),
                config.import_max_rows,
            )),
        }
    }
}
