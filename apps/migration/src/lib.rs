//! Yatube schema: users, groups, posts, comments and follows.

pub use sea_orm_migration::prelude::*;

mod m20240101_000001_create_users;
mod m20240101_000002_create_groups;
mod m20240101_000003_create_posts;
mod m20240101_000004_create_comments;
mod m20240101_000005_create_follows;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_users::Migration),
            Box::new(m20240101_000002_create_groups::Migration),
            Box::new(m20240101_000003_create_posts::Migration),
            Box::new(m20240101_000004_create_comments::Migration),
            Box::new(m20240101_000005_create_follows::Migration),
        ]
    }
}
