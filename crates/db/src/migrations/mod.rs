//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250101_000001_create_user_table;
mod m20250101_000002_create_user_profile_table;
mod m20250101_000003_create_device_table;
mod m20250101_000004_create_device_document_table;
mod m20250101_000005_create_issue_request_table;
mod m20250101_000006_create_password_reset_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_user_table::Migration),
            Box::new(m20250101_000002_create_user_profile_table::Migration),
            Box::new(m20250101_000003_create_device_table::Migration),
            Box::new(m20250101_000004_create_device_document_table::Migration),
            Box::new(m20250101_000005_create_issue_request_table::Migration),
            Box::new(m20250101_000006_create_password_reset_table::Migration),
        ]
    }
}
