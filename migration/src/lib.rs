pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_drivers;
mod m20240301_000002_create_passengers;
mod m20240301_000003_create_credentials;
mod m20240301_000004_create_order_details;
mod m20240301_000005_create_orders;
mod m20240301_000006_create_notifications;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_drivers::Migration),
            Box::new(m20240301_000002_create_passengers::Migration),
            Box::new(m20240301_000003_create_credentials::Migration),
            Box::new(m20240301_000004_create_order_details::Migration),
            Box::new(m20240301_000005_create_orders::Migration),
            Box::new(m20240301_000006_create_notifications::Migration),
        ]
    }
}
