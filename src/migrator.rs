// The `MigrationTrait::up`/`down` signatures use a late-bound elided lifetime
// on `&SchemaManager`; spelling it `<'_>` would make it early-bound and break
// the trait impl, so opt this module out of the 2018-idioms lint.
#![allow(elided_lifetimes_in_paths)]

use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_suppliers_table::Migration),
            Box::new(m20250301_000002_create_articles_table::Migration),
            Box::new(m20250301_000003_create_orders_table::Migration),
            Box::new(m20250301_000004_create_order_lines_table::Migration),
        ]
    }
}

// Migration implementations

mod m20250301_000001_create_suppliers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000001_create_suppliers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Suppliers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Suppliers::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Suppliers::Name).string().not_null())
                        .col(ColumnDef::new(Suppliers::Contact).string().null())
                        .col(ColumnDef::new(Suppliers::Email).string().null())
                        .col(ColumnDef::new(Suppliers::Notes).string().null())
                        .col(
                            ColumnDef::new(Suppliers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Suppliers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // Supplier names are unique case-insensitively; import lookups go
            // through lower(name).
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_suppliers_name_lower \
                     ON suppliers (LOWER(name))",
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Suppliers::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Suppliers {
        Table,
        Id,
        Name,
        Contact,
        Email,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250301_000002_create_articles_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000002_create_articles_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Articles::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Articles::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Articles::Name).string().not_null())
                        .col(ColumnDef::new(Articles::Category).string().null())
                        .col(ColumnDef::new(Articles::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(Articles::PurchasePrice).decimal().null())
                        .col(ColumnDef::new(Articles::SalePrice).decimal().null())
                        .col(
                            ColumnDef::new(Articles::StockQuantity)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Articles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Articles::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_articles_supplier")
                                .from(Articles::Table, Articles::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_articles_supplier_id")
                        .table(Articles::Table)
                        .col(Articles::SupplierId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_articles_category")
                        .table(Articles::Table)
                        .col(Articles::Category)
                        .to_owned(),
                )
                .await?;

            // Import reconciliation resolves articles by (supplier, lower(name)).
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE INDEX IF NOT EXISTS idx_articles_supplier_name_lower \
                     ON articles (supplier_id, LOWER(name))",
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Articles::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Articles {
        Table,
        Id,
        Name,
        Category,
        SupplierId,
        PurchasePrice,
        SalePrice,
        StockQuantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Suppliers {
        Table,
        Id,
    }
}

mod m20250301_000003_create_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000003_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::SupplierId).uuid().not_null())
                        .col(ColumnDef::new(Orders::OrderDate).date().not_null())
                        .col(ColumnDef::new(Orders::State).string().not_null())
                        .col(ColumnDef::new(Orders::Notes).string().null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_supplier")
                                .from(Orders::Table, Orders::SupplierId)
                                .to(Suppliers::Table, Suppliers::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_supplier_state")
                        .table(Orders::Table)
                        .col(Orders::SupplierId)
                        .col(Orders::State)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_state")
                        .table(Orders::Table)
                        .col(Orders::State)
                        .to_owned(),
                )
                .await?;

            // One draft per supplier. Concurrent find-or-create relies on this
            // constraint: the losing insert gets a unique violation and retries
            // as a lookup.
            manager
                .get_connection()
                .execute_unprepared(
                    "CREATE UNIQUE INDEX IF NOT EXISTS idx_orders_one_draft_per_supplier \
                     ON orders (supplier_id) WHERE state = 'draft'",
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
        SupplierId,
        OrderDate,
        State,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Suppliers {
        Table,
        Id,
    }
}

mod m20250301_000004_create_order_lines_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250301_000004_create_order_lines_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderLines::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderLines::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderLines::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderLines::ArticleId).uuid().not_null())
                        .col(ColumnDef::new(OrderLines::QtyOrdered).decimal().not_null())
                        .col(
                            ColumnDef::new(OrderLines::QtyReceived)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(OrderLines::Notes).string().null())
                        .col(
                            ColumnDef::new(OrderLines::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderLines::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_lines_order")
                                .from(OrderLines::Table, OrderLines::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_lines_article")
                                .from(OrderLines::Table, OrderLines::ArticleId)
                                .to(Articles::Table, Articles::Id),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_lines_order_id")
                        .table(OrderLines::Table)
                        .col(OrderLines::OrderId)
                        .to_owned(),
                )
                .await?;

            // At most one line per article on an order; merge-or-append
            // resolves races through this constraint.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_lines_order_article")
                        .table(OrderLines::Table)
                        .col(OrderLines::OrderId)
                        .col(OrderLines::ArticleId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderLines::Table).to_owned())
                .await
        }
    }

    #[derive(Iden)]
    enum OrderLines {
        Table,
        Id,
        OrderId,
        ArticleId,
        QtyOrdered,
        QtyReceived,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(Iden)]
    enum Orders {
        Table,
        Id,
    }

    #[derive(Iden)]
    enum Articles {
        Table,
        Id,
    }
}
