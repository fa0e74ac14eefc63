use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_inventory_lots_table::Migration),
            Box::new(m20240301_000002_create_deals_table::Migration),
            Box::new(m20240301_000003_create_deal_sources_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_inventory_lots_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_inventory_lots_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(InventoryLots::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryLots::LotId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::ProductCode)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryLots::Grade).string().not_null())
                        .col(ColumnDef::new(InventoryLots::Company).string().not_null())
                        .col(
                            ColumnDef::new(InventoryLots::SpecificGrade)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::Quantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::OriginalQuantity)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::UnitCost)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::SupplierName)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryLots::DateAdded).date().not_null())
                        .col(ColumnDef::new(InventoryLots::SourceDealId).uuid().null())
                        .col(
                            ColumnDef::new(InventoryLots::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryLots::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-inventory_lots-product-key")
                        .table(InventoryLots::Table)
                        .col(InventoryLots::ProductCode)
                        .col(InventoryLots::Grade)
                        .col(InventoryLots::Company)
                        .col(InventoryLots::SpecificGrade)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-inventory_lots-source-deal")
                        .table(InventoryLots::Table)
                        .col(InventoryLots::SourceDealId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryLots::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum InventoryLots {
        Table,
        LotId,
        ProductCode,
        Grade,
        Company,
        SpecificGrade,
        Quantity,
        OriginalQuantity,
        UnitCost,
        SupplierName,
        DateAdded,
        SourceDealId,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240301_000002_create_deals_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_deals_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Deals::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Deals::DealId).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Deals::SaleParty).string().not_null())
                        .col(
                            ColumnDef::new(Deals::QuantitySold)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Deals::SaleRate)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Deals::ProductCode).string().not_null())
                        .col(ColumnDef::new(Deals::Grade).string().not_null())
                        .col(ColumnDef::new(Deals::Company).string().not_null())
                        .col(ColumnDef::new(Deals::SpecificGrade).string().not_null())
                        .col(ColumnDef::new(Deals::DeliveryTerms).string().null())
                        .col(ColumnDef::new(Deals::DealDate).date().not_null())
                        .col(ColumnDef::new(Deals::SourceMode).string().not_null())
                        .col(ColumnDef::new(Deals::PurchaseParty).string().null())
                        .col(
                            ColumnDef::new(Deals::PurchaseQuantity)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Deals::PurchaseRate)
                                .decimal_len(19, 4)
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Deals::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-deals-product-key")
                        .table(Deals::Table)
                        .col(Deals::ProductCode)
                        .col(Deals::Grade)
                        .col(Deals::Company)
                        .col(Deals::SpecificGrade)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-deals-source-mode")
                        .table(Deals::Table)
                        .col(Deals::SourceMode)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Deals::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Deals {
        Table,
        DealId,
        SaleParty,
        QuantitySold,
        SaleRate,
        ProductCode,
        Grade,
        Company,
        SpecificGrade,
        DeliveryTerms,
        DealDate,
        SourceMode,
        PurchaseParty,
        PurchaseQuantity,
        PurchaseRate,
        CreatedAt,
    }
}

mod m20240301_000003_create_deal_sources_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_deal_sources_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(DealSources::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DealSources::SourceId)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DealSources::DealId).uuid().not_null())
                        .col(ColumnDef::new(DealSources::LotId).uuid().not_null())
                        .col(
                            ColumnDef::new(DealSources::QuantityUsed)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DealSources::CostPerUnit)
                                .decimal_len(19, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DealSources::SupplierName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DealSources::SelectionOrder)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DealSources::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk-deal_sources-deal_id")
                                .from(DealSources::Table, DealSources::DealId)
                                .to(Deals::Table, Deals::DealId)
                                .on_delete(ForeignKeyAction::Restrict),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-deal_sources-deal_id")
                        .table(DealSources::Table)
                        .col(DealSources::DealId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .name("idx-deal_sources-lot_id")
                        .table(DealSources::Table)
                        .col(DealSources::LotId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DealSources::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum DealSources {
        Table,
        SourceId,
        DealId,
        LotId,
        QuantityUsed,
        CostPerUnit,
        SupplierName,
        SelectionOrder,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Deals {
        Table,
        DealId,
    }
}
