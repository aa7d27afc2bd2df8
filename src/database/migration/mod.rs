pub use sea_orm_migration::prelude::*;

mod m20250610_093045_create_users;
mod m20250610_093102_create_followers;
mod m20250610_093110_create_articles;
mod m20250610_093118_create_tags;
mod m20250610_093127_create_article_tags;
mod m20250610_093135_create_favorites;
mod m20250610_093142_create_comments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250610_093045_create_users::Migration),
            Box::new(m20250610_093102_create_followers::Migration),
            Box::new(m20250610_093110_create_articles::Migration),
            Box::new(m20250610_093118_create_tags::Migration),
            Box::new(m20250610_093127_create_article_tags::Migration),
            Box::new(m20250610_093135_create_favorites::Migration),
            Box::new(m20250610_093142_create_comments::Migration),
        ]
    }
}
