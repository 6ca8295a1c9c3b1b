use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Gauge::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Gauge::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Gauge::Name).string().not_null())
                    .col(ColumnDef::new(Gauge::Value).double().not_null())
                    .col(
                        ColumnDef::new(Gauge::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_gauge_name_recorded_at")
                    .table(Gauge::Table)
                    .col(Gauge::Name)
                    .col(Gauge::RecordedAt)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Gauge::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Gauge {
    Table,
    Id,
    Name,
    Value,
    RecordedAt,
}
