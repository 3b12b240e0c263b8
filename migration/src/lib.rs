pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_users_and_vendors;
mod m20250901_000002_create_deals;
mod m20250901_000003_create_deal_claims;
mod m20250901_000004_create_wishlists_and_help_tickets;
mod m20250901_000005_create_pos_sessions;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_users_and_vendors::Migration),
            Box::new(m20250901_000002_create_deals::Migration),
            Box::new(m20250901_000003_create_deal_claims::Migration),
            Box::new(m20250901_000004_create_wishlists_and_help_tickets::Migration),
            Box::new(m20250901_000005_create_pos_sessions::Migration),
        ]
    }
}
