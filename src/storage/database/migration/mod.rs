use sea_orm_migration::prelude::*;

mod m20240101_000001_create_gauge_table;
mod m20240101_000002_create_counter_table;

/// Schema migrator for the metric tables
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_gauge_table::Migration),
            Box::new(m20240101_000002_create_counter_table::Migration),
        ]
    }
}
