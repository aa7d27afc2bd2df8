use log::info;
use migration::{Migrator, MigratorTrait};
use sea_orm::Database as SeaDatabase;
use std::{
    fs::{File, create_dir_all},
    path::Path,
};

pub mod entity;
mod migration;

// Re-exports of database types
pub use sea_orm::DatabaseConnection;
pub use sea_orm::DbErr;

/// Database error result type
pub type DbResult<T> = Result<T, DbErr>;

const DATABASE_PATH: &str = "data/conduit.db";
const DATABASE_PATH_URL: &str = "sqlite:data/conduit.db";

pub async fn init() -> DatabaseConnection {
    let connection = connect_database().await;
    info!("Connected to database..");
    connection
}

/// Connects to the database
async fn connect_database() -> DatabaseConnection {
    let path = Path::new(&DATABASE_PATH);

    // Create path to database file if missing
    if let Some(parent) = path.parent()
        && !parent.exists()
    {
        create_dir_all(parent).expect("Unable to create parent directory for sqlite database");
    }

    // Create the database if file is missing
    if !path.exists() {
        File::create(path).expect("Unable to create sqlite database file");
    }

    // Connect to database
    let connection = SeaDatabase::connect(DATABASE_PATH_URL)
        .await
        .expect("Unable to create database connection");

    // Run migrations
    Migrator::up(&connection, None)
        .await
        .expect("Unable to run database migrations");

    connection
}

/// Connects to an isolated in-memory database with the migrations
/// applied. The pool is limited to a single connection as every new
/// sqlite :memory: connection is a different database
#[cfg(test)]
pub async fn connect_test_database() -> DatabaseConnection {
    use sea_orm::ConnectOptions;

    let mut options = ConnectOptions::new("sqlite::memory:");
    options.max_connections(1);

    let connection = SeaDatabase::connect(options)
        .await
        .expect("Unable to create test database connection");

    Migrator::up(&connection, None)
        .await
        .expect("Unable to run database migrations");

    connection
}
