//! Test utilities for database operations.
//!
//! Helpers for connecting to, migrating and tearing down a PostgreSQL test database.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, DbErr, Set,
    Statement,
};
use sea_orm_migration::MigratorTrait;
use tracing::info;

use crate::entities::{restaurant, user};
use crate::migrations::Migrator;

/// Tables created by the migrations, dependents before the rows they reference.
const APP_TABLES: [&str; 14] = [
    "comment_reaction",
    "comment_reply",
    "comment",
    "review_like",
    "post_like",
    "rating",
    "review",
    "dish",
    "restaurant_tag",
    "restaurant",
    "tag",
    "category",
    "profile",
    "user",
];

/// Test database configuration.
#[derive(Debug, Clone)]
pub struct TestDbConfig {
    /// Database host.
    pub host: String,
    /// Database port.
    pub port: u16,
    /// Database username.
    pub username: String,
    /// Database password.
    pub password: String,
    /// Database name.
    pub database: String,
}

impl Default for TestDbConfig {
    fn default() -> Self {
        Self {
            host: std::env::var("TEST_DB_HOST").unwrap_or_else(|_| "localhost".to_string()),
            port: std::env::var("TEST_DB_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5433),
            username: std::env::var("TEST_DB_USER").unwrap_or_else(|_| "riviu_test".to_string()),
            password: std::env::var("TEST_DB_PASSWORD")
                .unwrap_or_else(|_| "riviu_test".to_string()),
            database: std::env::var("TEST_DB_NAME").unwrap_or_else(|_| "riviu_test".to_string()),
        }
    }
}

impl TestDbConfig {
    /// Get the database URL.
    #[must_use]
    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database
        )
    }

    /// URL of the maintenance database, used to create and drop test databases.
    #[must_use]
    pub fn postgres_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/postgres",
            self.username, self.password, self.host, self.port
        )
    }
}

/// A migrated test database.
pub struct TestDatabase {
    /// Database connection, shareable with repositories.
    pub conn: Arc<DatabaseConnection>,
    /// Database configuration.
    pub config: TestDbConfig,
}

impl TestDatabase {
    /// Connect to the configured test database and bring its schema up to date.
    pub async fn new() -> Result<Self, DbErr> {
        let config = TestDbConfig::default();
        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Connected to test database");

        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Create a uniquely named database so tests can run in parallel.
    pub async fn create_unique() -> Result<Self, DbErr> {
        let mut config = TestDbConfig::default();
        let unique_suffix = uuid::Uuid::new_v4().simple().to_string();
        config.database = format!("riviu_test_{}", &unique_suffix[..8]);

        let postgres_conn = Database::connect(&config.postgres_url()).await?;
        postgres_conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("CREATE DATABASE \"{}\"", config.database),
            ))
            .await?;
        postgres_conn.close().await?;

        let conn = Database::connect(&config.database_url()).await?;
        Migrator::up(&conn, None).await?;

        info!(database = %config.database, "Created unique test database");

        Ok(Self {
            conn: Arc::new(conn),
            config,
        })
    }

    /// Get the database connection.
    #[must_use]
    pub fn connection(&self) -> &DatabaseConnection {
        self.conn.as_ref()
    }

    /// Empty every application table, children first.
    pub async fn cleanup(&self) -> Result<(), DbErr> {
        for table in APP_TABLES {
            self.conn
                .as_ref()
                .execute(Statement::from_string(
                    DatabaseBackend::Postgres,
                    format!("TRUNCATE TABLE \"{table}\" CASCADE"),
                ))
                .await?;
        }

        info!(tables = APP_TABLES.len(), "Cleaned up test database");
        Ok(())
    }

    /// Insert a plain user `id` with email `{id}@example.com` and token `token_{id}`.
    pub async fn seed_user(&self, id: &str) -> Result<user::Model, DbErr> {
        user::ActiveModel {
            id: Set(id.to_string()),
            email: Set(format!("{id}@example.com")),
            password_hash: Set("hash".to_string()),
            token: Set(Some(format!("token_{id}"))),
            role: Set(user::Role::User),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Insert an uncategorized restaurant owned by `owner_id`.
    pub async fn seed_restaurant(
        &self,
        id: &str,
        owner_id: &str,
    ) -> Result<restaurant::Model, DbErr> {
        restaurant::ActiveModel {
            id: Set(id.to_string()),
            owner_id: Set(owner_id.to_string()),
            name: Set("Trattoria".to_string()),
            address: Set("1 Via Roma".to_string()),
            description: Set("Fresh pasta".to_string()),
            phone: Set(None),
            image_url: Set(None),
            category_id: Set(None),
            created_at: Set(Utc::now().into()),
            updated_at: Set(None),
        }
        .insert(self.conn.as_ref())
        .await
    }

    /// Drop a database created with [`TestDatabase::create_unique`].
    pub async fn drop_database(self) -> Result<(), DbErr> {
        // Repositories may still hold clones; their sessions are terminated below
        if let Ok(conn) = Arc::try_unwrap(self.conn) {
            conn.close().await?;
        }

        let postgres_conn = Database::connect(&self.config.postgres_url()).await?;

        // Other sessions would block the DROP
        postgres_conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!(
                    "SELECT pg_terminate_backend(pid) FROM pg_stat_activity WHERE datname = '{}'",
                    self.config.database
                ),
            ))
            .await
            .ok();

        postgres_conn
            .execute(Statement::from_string(
                DatabaseBackend::Postgres,
                format!("DROP DATABASE IF EXISTS \"{}\"", self.config.database),
            ))
            .await?;
        postgres_conn.close().await?;

        info!(database = %self.config.database, "Dropped test database");
        Ok(())
    }
}
