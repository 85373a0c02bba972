//! Database migrations.
//!
//! Schema migrations for the database.

#![allow(missing_docs)]

use sea_orm_migration::prelude::*;

mod m20250601_000001_create_user_table;
mod m20250601_000002_create_profile_table;
mod m20250601_000003_create_category_and_tag_tables;
mod m20250601_000004_create_restaurant_table;
mod m20250601_000005_create_dish_table;
mod m20250601_000006_create_review_table;
mod m20250601_000007_create_rating_table;
mod m20250601_000008_create_comment_tables;
mod m20250601_000009_create_like_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_user_table::Migration),
            Box::new(m20250601_000002_create_profile_table::Migration),
            Box::new(m20250601_000003_create_category_and_tag_tables::Migration),
            Box::new(m20250601_000004_create_restaurant_table::Migration),
            Box::new(m20250601_000005_create_dish_table::Migration),
            Box::new(m20250601_000006_create_review_table::Migration),
            Box::new(m20250601_000007_create_rating_table::Migration),
            Box::new(m20250601_000008_create_comment_tables::Migration),
            Box::new(m20250601_000009_create_like_tables::Migration),
        ]
    }
}
