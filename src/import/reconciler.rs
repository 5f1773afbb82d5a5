use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::entities::supplier;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::repositories::{ArticleChanges, CatalogRepository, NewArticle, NewSupplier};

use super::header_map::{map_record, MappedRow, ParsedProduct};
use super::source::TabularSource;

/// Warnings reported back to the caller are capped regardless of how many
/// rows actually failed.
pub const MAX_WARNINGS: usize = 10;

/// Default cap on valid rows per import run.
pub const DEFAULT_MAX_ROWS: usize = 200;

/// What happened during an import run. The import always reports counters,
/// even on partial success — never a bare success/failure flag.
#[derive(Debug, Default, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImportReport {
    pub created: u64,
    pub updated: u64,
    pub skipped: u64,
    pub suppliers_created: u64,
    pub warnings: Vec<String>,
}

impl ImportReport {
    fn warn(&mut self, message: String) {
        if self.warnings.len() < MAX_WARNINGS {
            self.warnings.push(message);
        }
    }
}

/// Drives the end-to-end import: read rows, map headers, normalize values,
/// resolve or create the supplier, upsert the article.
///
/// Two phases. Staging maps and normalizes every record without touching
/// the store, so the row cap rejects oversized sources before any write.
/// Reconciliation then walks the staged rows strictly sequentially — later
/// rows must observe suppliers created by earlier rows through the per-run
/// cache — and recovers from per-row failures by counting them.
#[derive(Clone)]
pub struct ImportService {
    catalog: Arc<dyn CatalogRepository>,
    events: Option<EventSender>,
    max_rows: usize,
}

impl ImportService {
    pub fn new(
        catalog: Arc<dyn CatalogRepository>,
        events: Option<EventSender>,
        max_rows: usize,
    ) -> Self {
        Self {
            catalog,
            events,
            max_rows,
        }
    }

    /// Imports a staged tabular source.
    #[instrument(skip(self, source))]
    pub async fn run(&self, source: TabularSource) -> Result<ImportReport, ServiceError> {
        let mut report = ImportReport::default();
        let mut staged: Vec<(usize, ParsedProduct)> = Vec::new();

        for item in source.records()? {
            let record = item?;
            match map_record(&record) {
                MappedRow::Recognized(product) => staged.push((record.row_number, product)),
                MappedRow::Rejected { row_number, reason } => {
                    report.skipped += 1;
                    report.warn(format!("row {}: {}", row_number, reason));
                }
            }
        }

        if staged.len() > self.max_rows {
            return Err(ServiceError::RowLimitExceeded {
                limit: self.max_rows,
                actual: staged.len(),
            });
        }

        // Per-run supplier cache; must never leak across import invocations.
        let mut suppliers: HashMap<String, supplier::Model> = HashMap::new();

        for (row_number, product) in staged {
            if let Err(err) = self
                .reconcile_row(&product, &mut suppliers, &mut report)
                .await
            {
                report.skipped += 1;
                report.warn(format!("row {}: {}", row_number, err));
            }
        }

        info!(
            created = report.created,
            updated = report.updated,
            skipped = report.skipped,
            suppliers_created = report.suppliers_created,
            "import finished"
        );

        if let Some(events) = &self.events {
            events
                .send_or_log(Event::ImportCompleted {
                    created: report.created,
                    updated: report.updated,
                    skipped: report.skipped,
                    suppliers_created: report.suppliers_created,
                })
                .await;
        }

        Ok(report)
    }

    /// Imports an uploaded byte payload with its declared media type.
    /// `sheet` selects a named worksheet; the first one is read otherwise.
    pub async fn import_upload(
        &self,
        bytes: Vec<u8>,
        media_type: Option<&str>,
        filename: Option<&str>,
        sheet: Option<String>,
    ) -> Result<ImportReport, ServiceError> {
        let source = TabularSource::from_upload(bytes, media_type, filename)?.with_sheet(sheet);
        self.run(source).await
    }

    /// Imports from a remote delimited-text export URL. The URL shape is
    /// validated before anything is fetched.
    pub async fn import_remote(&self, url: &str) -> Result<ImportReport, ServiceError> {
        let url = super::source::validate_remote_export_url(url)?;
        let source = super::source::fetch_remote(&url).await?;
        self.run(source).await
    }

    async fn reconcile_row(
        &self,
        product: &ParsedProduct,
        suppliers: &mut HashMap<String, supplier::Model>,
        report: &mut ImportReport,
    ) -> Result<(), ServiceError> {
        let cache_key = product.supplier.to_lowercase();

        let supplier = match suppliers.get(&cache_key) {
            Some(cached) => cached.clone(),
            None => {
                let resolved = match self.catalog.find_supplier_by_name(&product.supplier).await? {
                    Some(existing) => existing,
                    None => {
                        let created = self
                            .catalog
                            .create_supplier(NewSupplier {
                                name: product.supplier.clone(),
                                notes: Some("Auto-created during catalog import".to_string()),
                                ..Default::default()
                            })
                            .await?;
                        report.suppliers_created += 1;
                        if let Some(events) = &self.events {
                            events.send_or_log(Event::SupplierCreated(created.id)).await;
                        }
                        created
                    }
                };
                suppliers.insert(cache_key, resolved.clone());
                resolved
            }
        };

        match self
            .catalog
            .find_article_by_supplier_and_name(supplier.id, &product.name)
            .await?
        {
            Some(existing) => {
                let updated = self
                    .catalog
                    .update_article(
                        existing.id,
                        ArticleChanges {
                            category: product.category.clone(),
                            purchase_price: product.purchase_price,
                            sale_price: product.sale_price,
                        },
                    )
                    .await?;
                report.updated += 1;
                if let Some(events) = &self.events {
                    events.send_or_log(Event::ArticleUpdated(updated.id)).await;
                }
            }
            None => {
                let created = self
                    .catalog
                    .create_article(NewArticle {
                        name: product.name.clone(),
                        category: product.category.clone(),
                        supplier_id: supplier.id,
                        purchase_price: product.purchase_price,
                        sale_price: product.sale_price,
                    })
                    .await?;
                report.created += 1;
                if let Some(events) = &self.events {
                    events.send_or_log(Event::ArticleCreated(created.id)).await;
                }
            }
        }

        Ok(())
    }
}
