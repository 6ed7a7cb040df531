pub use sea_orm_migration::prelude::*;

mod m20250618_000001_create_directory_tables;
mod m20250618_000002_create_predictions;
mod m20250722_000003_add_campaign_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250618_000001_create_directory_tables::Migration),
            Box::new(m20250618_000002_create_predictions::Migration),
            Box::new(m20250722_000003_add_campaign_tables::Migration),
        ]
    }
}
