//! SQLite account store.

use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{migrate::MigrateDatabase, Row, Sqlite};
use tracing::{debug, info, instrument};

use super::{AccountStore, StoreError};
use crate::account::{Account, AccountId, AccountPayload};
use crate::metrics;

/// Pool size for file-backed databases.
const MAX_CONNECTIONS: u32 = 5;

/// Account store backed by a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `url`, creating the database file and schema if needed.
    ///
    /// In-memory URLs (`sqlite::memory:`, `mode=memory`) are pinned to a
    /// single connection that is never recycled, since each SQLite
    /// connection would otherwise see its own empty database.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = if is_memory_url(url) {
            SqlitePoolOptions::new()
                .min_connections(1)
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect(url)
                .await?
        } else {
            if !Sqlite::database_exists(url).await? {
                info!(url, "Creating database");
                Sqlite::create_database(url).await?;
            }
            SqlitePoolOptions::new()
                .max_connections(MAX_CONNECTIONS)
                .connect(url)
                .await?
        };

        Self::setup_schema(&pool).await?;
        info!(url, "Database initialized");
        Ok(Self { pool })
    }

    async fn setup_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        // AUTOINCREMENT keeps ids of deleted rows from being reissued.
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT,
                address TEXT,
                phone_number TEXT,
                active BOOLEAN
            );
            "#,
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

fn is_memory_url(url: &str) -> bool {
    url.contains(":memory:") || url.contains("mode=memory")
}

fn account_from_row(row: &SqliteRow) -> Result<Account, sqlx::Error> {
    Ok(Account {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        address: row.try_get("address")?,
        phone_number: row.try_get("phone_number")?,
        active: row.try_get("active")?,
    })
}

#[async_trait]
impl AccountStore for SqliteStore {
    #[instrument(skip(self, payload))]
    async fn create(&self, payload: AccountPayload) -> Result<Account, StoreError> {
        let _timer = metrics::timer_store("create");
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (name, email, address, phone_number, active)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&payload.name)
        .bind(&payload.email)
        .bind(&payload.address)
        .bind(&payload.phone_number)
        .bind(payload.active)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        debug!(id, "Account stored");
        Ok(Account::from_payload(id, payload))
    }

    async fn find(&self, id: AccountId) -> Result<Option<Account>, StoreError> {
        let _timer = metrics::timer_store("find");
        let row = sqlx::query(
            r#"
            SELECT id, name, email, address, phone_number, active
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(account_from_row).transpose()?)
    }

    async fn all(&self) -> Result<Vec<Account>, StoreError> {
        let _timer = metrics::timer_store("all");
        let rows = sqlx::query(
            r#"
            SELECT id, name, email, address, phone_number, active
            FROM accounts
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let accounts = rows
            .iter()
            .map(account_from_row)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(accounts)
    }

    #[instrument(skip(self, account), fields(id = account.id))]
    async fn update(&self, account: &Account) -> Result<Account, StoreError> {
        let _timer = metrics::timer_store("update");
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET name = ?, email = ?, address = ?, phone_number = ?, active = ?
            WHERE id = ?
            "#,
        )
        .bind(&account.name)
        .bind(&account.email)
        .bind(&account.address)
        .bind(&account.phone_number)
        .bind(account.active)
        .bind(account.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(account.id));
        }
        Ok(account.clone())
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: AccountId) -> Result<bool, StoreError> {
        let _timer = metrics::timer_store("delete");
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM accounts").execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(())
    }
}
