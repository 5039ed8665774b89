use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use finder_core::config::DatabaseConfig;

use crate::seed::example_humans;
use crate::types::Human;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Read access to the `humans` table, plus the one-time seed.
pub struct HumanStore {
    pool: SqlitePool,
}

impl HumanStore {
    /// Open a pool for `config.url`, creating the database file if needed.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(&config.url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect_with(options)
            .await?;
        info!(url = %config.url, "Database connected");
        Ok(Self { pool })
    }

    /// Private in-memory database with the schema applied.
    ///
    /// Uses a single long-lived connection: every new in-memory connection
    /// would otherwise see its own empty database.
    #[cfg(any(test, feature = "test-utils"))]
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Apply pending schema migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        debug!("Database migrations applied");
        Ok(())
    }

    /// All humans, in insertion order.
    pub async fn get_humans(&self) -> Result<Vec<Human>, StoreError> {
        let humans = sqlx::query_as::<_, Human>(
            "SELECT first_name, last_name, date_of_birth, has_allergies, bio \
             FROM humans ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        debug!(count = humans.len(), "Loaded humans");
        Ok(humans)
    }

    pub async fn count(&self) -> Result<i64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM humans")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Insert the example humans in one transaction.
    ///
    /// Any failed insert rolls the whole batch back. Returns the number of
    /// rows written.
    pub async fn seed_humans(&self) -> Result<usize, StoreError> {
        self.insert_humans(&example_humans()).await
    }

    pub async fn insert_humans(&self, humans: &[Human]) -> Result<usize, StoreError> {
        let now = chrono::Utc::now();
        // Dropping an uncommitted transaction rolls it back.
        let mut tx = self.pool.begin().await?;
        for h in humans {
            sqlx::query(
                "INSERT INTO humans \
                 (first_name, last_name, date_of_birth, has_allergies, bio, created_at, updated_at) \
                 VALUES (?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(&h.first_name)
            .bind(&h.last_name)
            .bind(&h.date_of_birth)
            .bind(h.has_allergies)
            .bind(&h.bio)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        info!(count = humans.len(), "Inserted humans");
        Ok(humans.len())
    }

    /// Close the pool; later queries fail.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
