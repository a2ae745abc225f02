use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_catalog_tables::Migration),
            Box::new(m20240301_000002_create_inventory_tables::Migration),
            Box::new(m20240301_000003_create_stock_order_tables::Migration),
            Box::new(m20240301_000004_create_number_sequences_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240301_000001_create_catalog_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Goods::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Goods::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Goods::Number).string().not_null())
                        .col(ColumnDef::new(Goods::Name).string().not_null())
                        .col(ColumnDef::new(Goods::Barcode).string().null())
                        .col(ColumnDef::new(Goods::CategoryId).integer().null())
                        .col(ColumnDef::new(Goods::UnitId).integer().null())
                        .col(ColumnDef::new(Goods::Spec).string().null())
                        .col(
                            ColumnDef::new(Goods::EnableBatchControl)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Goods::ShelfLifeDays).integer().null())
                        .col(
                            ColumnDef::new(Goods::ShelfLifeWarningDays)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Goods::EnableInventoryWarning)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Goods::InventoryUpper).decimal_len(16, 4).null())
                        .col(ColumnDef::new(Goods::InventoryLower).decimal_len(16, 4).null())
                        .col(
                            ColumnDef::new(Goods::PurchasePrice)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Goods::RetailPrice)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Goods::LevelPrice1)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Goods::LevelPrice2)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Goods::LevelPrice3)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Goods::Remark).string().null())
                        .col(ColumnDef::new(Goods::SortOrder).integer().not_null().default(0))
                        .col(ColumnDef::new(Goods::IsActive).boolean().not_null().default(true))
                        .col(ColumnDef::new(Goods::TeamId).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_goods_team_number")
                        .table(Goods::Table)
                        .col(Goods::TeamId)
                        .col(Goods::Number)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Warehouses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Warehouses::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Warehouses::Number).string().not_null())
                        .col(ColumnDef::new(Warehouses::Name).string().not_null())
                        .col(
                            ColumnDef::new(Warehouses::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(ColumnDef::new(Warehouses::TeamId).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_warehouses_team_id")
                        .table(Warehouses::Table)
                        .col(Warehouses::TeamId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Batches::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Batches::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Batches::Number).string().not_null())
                        .col(ColumnDef::new(Batches::WarehouseId).integer().not_null())
                        .col(ColumnDef::new(Batches::GoodsId).integer().not_null())
                        .col(ColumnDef::new(Batches::TotalQuantity).decimal_len(16, 4).not_null())
                        .col(ColumnDef::new(Batches::RemainQuantity).decimal_len(16, 4).not_null())
                        .col(ColumnDef::new(Batches::ProductionDate).date().null())
                        .col(ColumnDef::new(Batches::ShelfLifeDays).integer().null())
                        .col(ColumnDef::new(Batches::ExpirationDate).date().null())
                        .col(ColumnDef::new(Batches::HasStock).boolean().not_null())
                        .col(
                            ColumnDef::new(Batches::CreateTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Batches::TeamId).integer().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_batches_number_warehouse_goods_team")
                        .table(Batches::Table)
                        .col(Batches::Number)
                        .col(Batches::WarehouseId)
                        .col(Batches::GoodsId)
                        .col(Batches::TeamId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Batches::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Warehouses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Goods::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Goods {
        Table,
        Id,
        Number,
        Name,
        Barcode,
        CategoryId,
        UnitId,
        Spec,
        EnableBatchControl,
        ShelfLifeDays,
        ShelfLifeWarningDays,
        EnableInventoryWarning,
        InventoryUpper,
        InventoryLower,
        PurchasePrice,
        RetailPrice,
        LevelPrice1,
        LevelPrice2,
        LevelPrice3,
        Remark,
        SortOrder,
        IsActive,
        TeamId,
    }

    #[derive(DeriveIden)]
    enum Warehouses {
        Table,
        Id,
        Number,
        Name,
        IsActive,
        TeamId,
    }

    #[derive(DeriveIden)]
    enum Batches {
        Table,
        Id,
        Number,
        WarehouseId,
        GoodsId,
        TotalQuantity,
        RemainQuantity,
        ProductionDate,
        ShelfLifeDays,
        ExpirationDate,
        HasStock,
        CreateTime,
        TeamId,
    }
}

mod m20240301_000002_create_inventory_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_inventory_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Inventories::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Inventories::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Inventories::WarehouseId).integer().not_null())
                        .col(ColumnDef::new(Inventories::GoodsId).integer().not_null())
                        .col(
                            ColumnDef::new(Inventories::InitialQuantity)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Inventories::TotalQuantity)
                                .decimal_len(16, 4)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Inventories::HasStock)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(Inventories::TeamId).integer().not_null())
                        .to_owned(),
                )
                .await?;

            // One balance row per (warehouse, goods, team)
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_inventories_warehouse_goods_team")
                        .table(Inventories::Table)
                        .col(Inventories::WarehouseId)
                        .col(Inventories::GoodsId)
                        .col(Inventories::TeamId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(InventoryFlows::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(InventoryFlows::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(InventoryFlows::WarehouseId).integer().not_null())
                        .col(ColumnDef::new(InventoryFlows::GoodsId).integer().not_null())
                        .col(ColumnDef::new(InventoryFlows::FlowType).string_len(32).not_null())
                        .col(
                            ColumnDef::new(InventoryFlows::QuantityBefore)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryFlows::QuantityChange)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryFlows::QuantityAfter)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(InventoryFlows::ReferenceType)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(ColumnDef::new(InventoryFlows::ReferenceId).integer().not_null())
                        .col(ColumnDef::new(InventoryFlows::CreatorId).integer().not_null())
                        .col(ColumnDef::new(InventoryFlows::TeamId).integer().not_null())
                        .col(
                            ColumnDef::new(InventoryFlows::CreateTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_flows_reference")
                        .table(InventoryFlows::Table)
                        .col(InventoryFlows::TeamId)
                        .col(InventoryFlows::ReferenceType)
                        .col(InventoryFlows::ReferenceId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_inventory_flows_balance")
                        .table(InventoryFlows::Table)
                        .col(InventoryFlows::WarehouseId)
                        .col(InventoryFlows::GoodsId)
                        .col(InventoryFlows::TeamId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(InventoryFlows::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Inventories::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Inventories {
        Table,
        Id,
        WarehouseId,
        GoodsId,
        InitialQuantity,
        TotalQuantity,
        HasStock,
        TeamId,
    }

    #[derive(DeriveIden)]
    enum InventoryFlows {
        Table,
        Id,
        WarehouseId,
        GoodsId,
        FlowType,
        QuantityBefore,
        QuantityChange,
        QuantityAfter,
        ReferenceType,
        ReferenceId,
        CreatorId,
        TeamId,
        CreateTime,
    }
}

mod m20240301_000003_create_stock_order_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_stock_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockTransferOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockTransferOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockTransferOrders::Number).string().not_null())
                        .col(
                            ColumnDef::new(StockTransferOrders::OutWarehouseId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferOrders::InWarehouseId)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferOrders::TotalQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferOrders::EnableAutoStockOut)
                                .boolean()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockTransferOrders::EnableAutoStockIn)
                                .boolean()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransferOrders::StockOutOrderId).integer().null())
                        .col(ColumnDef::new(StockTransferOrders::StockInOrderId).integer().null())
                        .col(ColumnDef::new(StockTransferOrders::HandlerId).integer().null())
                        .col(ColumnDef::new(StockTransferOrders::Remark).string().null())
                        .col(
                            ColumnDef::new(StockTransferOrders::IsVoid)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(StockTransferOrders::CreatorId).integer().not_null())
                        .col(ColumnDef::new(StockTransferOrders::TeamId).integer().not_null())
                        .col(
                            ColumnDef::new(StockTransferOrders::CreateTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_stock_transfer_orders_team_number")
                        .table(StockTransferOrders::Table)
                        .col(StockTransferOrders::TeamId)
                        .col(StockTransferOrders::Number)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockTransferGoods::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockTransferGoods::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StockTransferGoods::StockTransferOrderId)
                                .integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransferGoods::GoodsId).integer().not_null())
                        .col(
                            ColumnDef::new(StockTransferGoods::StockTransferQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockTransferGoods::TeamId).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_transfer_goods_order")
                                .from(
                                    StockTransferGoods::Table,
                                    StockTransferGoods::StockTransferOrderId,
                                )
                                .to(StockTransferOrders::Table, StockTransferOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_transfer_goods_order_id")
                        .table(StockTransferGoods::Table)
                        .col(StockTransferGoods::StockTransferOrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockOutOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockOutOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockOutOrders::Number).string().not_null())
                        .col(ColumnDef::new(StockOutOrders::WarehouseId).integer().not_null())
                        .col(ColumnDef::new(StockOutOrders::OrderType).string_len(32).not_null())
                        .col(
                            ColumnDef::new(StockOutOrders::TotalQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockOutOrders::RemainQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockOutOrders::StockTransferOrderId).integer().null())
                        .col(
                            ColumnDef::new(StockOutOrders::IsCompleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(StockOutOrders::IsVoid)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(StockOutOrders::CreatorId).integer().not_null())
                        .col(ColumnDef::new(StockOutOrders::TeamId).integer().not_null())
                        .col(
                            ColumnDef::new(StockOutOrders::CreateTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_stock_out_orders_team_number")
                        .table(StockOutOrders::Table)
                        .col(StockOutOrders::TeamId)
                        .col(StockOutOrders::Number)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockOutGoods::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockOutGoods::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockOutGoods::StockOutOrderId).integer().not_null())
                        .col(ColumnDef::new(StockOutGoods::GoodsId).integer().not_null())
                        .col(
                            ColumnDef::new(StockOutGoods::StockOutQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockOutGoods::RemainQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockOutGoods::IsCompleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(StockOutGoods::TeamId).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_out_goods_order")
                                .from(StockOutGoods::Table, StockOutGoods::StockOutOrderId)
                                .to(StockOutOrders::Table, StockOutOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockInOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockInOrders::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockInOrders::Number).string().not_null())
                        .col(ColumnDef::new(StockInOrders::WarehouseId).integer().not_null())
                        .col(ColumnDef::new(StockInOrders::OrderType).string_len(32).not_null())
                        .col(
                            ColumnDef::new(StockInOrders::TotalQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockInOrders::RemainQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockInOrders::StockTransferOrderId).integer().null())
                        .col(
                            ColumnDef::new(StockInOrders::IsCompleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(StockInOrders::IsVoid)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(StockInOrders::CreatorId).integer().not_null())
                        .col(ColumnDef::new(StockInOrders::TeamId).integer().not_null())
                        .col(
                            ColumnDef::new(StockInOrders::CreateTime)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_stock_in_orders_team_number")
                        .table(StockInOrders::Table)
                        .col(StockInOrders::TeamId)
                        .col(StockInOrders::Number)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockInGoods::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockInGoods::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(StockInGoods::StockInOrderId).integer().not_null())
                        .col(ColumnDef::new(StockInGoods::GoodsId).integer().not_null())
                        .col(
                            ColumnDef::new(StockInGoods::StockInQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockInGoods::RemainQuantity)
                                .decimal_len(16, 4)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockInGoods::IsCompleted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(ColumnDef::new(StockInGoods::TeamId).integer().not_null())
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_in_goods_order")
                                .from(StockInGoods::Table, StockInGoods::StockInOrderId)
                                .to(StockInOrders::Table, StockInOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockInGoods::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockInOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockOutGoods::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockOutOrders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockTransferGoods::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockTransferOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockTransferOrders {
        Table,
        Id,
        Number,
        OutWarehouseId,
        InWarehouseId,
        TotalQuantity,
        EnableAutoStockOut,
        EnableAutoStockIn,
        StockOutOrderId,
        StockInOrderId,
        HandlerId,
        Remark,
        IsVoid,
        CreatorId,
        TeamId,
        CreateTime,
    }

    #[derive(DeriveIden)]
    enum StockTransferGoods {
        Table,
        Id,
        StockTransferOrderId,
        GoodsId,
        StockTransferQuantity,
        TeamId,
    }

    #[derive(DeriveIden)]
    enum StockOutOrders {
        Table,
        Id,
        Number,
        WarehouseId,
        OrderType,
        TotalQuantity,
        RemainQuantity,
        StockTransferOrderId,
        IsCompleted,
        IsVoid,
        CreatorId,
        TeamId,
        CreateTime,
    }

    #[derive(DeriveIden)]
    enum StockOutGoods {
        Table,
        Id,
        StockOutOrderId,
        GoodsId,
        StockOutQuantity,
        RemainQuantity,
        IsCompleted,
        TeamId,
    }

    #[derive(DeriveIden)]
    enum StockInOrders {
        Table,
        Id,
        Number,
        WarehouseId,
        OrderType,
        TotalQuantity,
        RemainQuantity,
        StockTransferOrderId,
        IsCompleted,
        IsVoid,
        CreatorId,
        TeamId,
        CreateTime,
    }

    #[derive(DeriveIden)]
    enum StockInGoods {
        Table,
        Id,
        StockInOrderId,
        GoodsId,
        StockInQuantity,
        RemainQuantity,
        IsCompleted,
        TeamId,
    }
}

mod m20240301_000004_create_number_sequences_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_number_sequences_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(NumberSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(NumberSequences::Id)
                                .integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(NumberSequences::TeamId).integer().not_null())
                        .col(ColumnDef::new(NumberSequences::Scope).string_len(32).not_null())
                        .col(ColumnDef::new(NumberSequences::LastNumber).string().not_null())
                        .col(
                            ColumnDef::new(NumberSequences::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_number_sequences_team_scope")
                        .table(NumberSequences::Table)
                        .col(NumberSequences::TeamId)
                        .col(NumberSequences::Scope)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(NumberSequences::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum NumberSequences {
        Table,
        Id,
        TeamId,
        Scope,
        LastNumber,
        UpdatedAt,
    }
}
