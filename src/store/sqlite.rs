//! SQLite-backed store.
//!
//! Uniqueness of `shop` and `checkout_id` is enforced by the schema, so
//! several processes sharing one database file still see one installation per
//! storefront and one record per checkout. Timestamps are stored as RFC 3339
//! text with nanoseconds, so a record reads back exactly as it was written.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::config::{AccessToken, StorefrontId};

use super::{
    AbandonedCheckout, CheckoutStatus, CheckoutStore, InsertOutcome, Installation,
    NewAbandonedCheckout, NewInstallation, ShopStore, StoreError, MAX_RECOVERY_URL_LEN,
};

/// Connections kept by a file-backed store.
const POOL_SIZE: u32 = 10;

/// How long a writer waits on another connection's lock.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const INSTALLATION_COLS: &str = "id, shop, access_token, scope, active, installed_at";

const CHECKOUT_COLS: &str =
    "id, checkout_id, shop_domain, customer_email, recovery_url, status, created_at";

fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(&format!(
        r"
        CREATE TABLE IF NOT EXISTS installations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            shop TEXT NOT NULL UNIQUE,
            access_token TEXT NOT NULL CHECK (length(access_token) > 0),
            scope TEXT NOT NULL DEFAULT '',
            active INTEGER NOT NULL DEFAULT 1,
            installed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS abandoned_checkouts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            checkout_id TEXT NOT NULL UNIQUE,
            shop_domain TEXT,
            customer_email TEXT,
            recovery_url TEXT CHECK (recovery_url IS NULL OR length(recovery_url) <= {MAX_RECOVERY_URL_LEN}),
            status TEXT NOT NULL CHECK (status IN ('PENDING', 'SENT', 'RECOVERED')),
            created_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_abandoned_checkouts_shop ON abandoned_checkouts(shop_domain);
        "
    ))
}

fn invalid_column(col: usize, name: &str) -> rusqlite::Error {
    rusqlite::Error::InvalidColumnType(col, name.to_string(), rusqlite::types::Type::Text)
}

fn to_sql_time(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn timestamp(row: &Row, col: usize, name: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(&row.get::<_, String>(col)?)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| invalid_column(col, name))
}

fn installation_from_row(row: &Row) -> rusqlite::Result<Installation> {
    Ok(Installation {
        id: row.get(0)?,
        shop: StorefrontId::new(row.get::<_, String>(1)?).map_err(|_| invalid_column(1, "shop"))?,
        access_token: AccessToken::new(row.get::<_, String>(2)?)
            .map_err(|_| invalid_column(2, "access_token"))?,
        scope: row.get(3)?,
        active: row.get(4)?,
        installed_at: timestamp(row, 5, "installed_at")?,
    })
}

fn checkout_from_row(row: &Row) -> rusqlite::Result<AbandonedCheckout> {
    Ok(AbandonedCheckout {
        id: row.get(0)?,
        checkout_id: row.get(1)?,
        shop_domain: row.get(2)?,
        customer_email: row.get(3)?,
        recovery_url: row.get(4)?,
        status: row
            .get::<_, String>(5)?
            .parse::<CheckoutStatus>()
            .map_err(|_| invalid_column(5, "status"))?,
        created_at: timestamp(row, 6, "created_at")?,
    })
}

/// [`ShopStore`] and [`CheckoutStore`] over an `r2d2` pool of SQLite
/// connections.
pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.pool.state();
        f.debug_struct("SqliteStore")
            .field("connections", &state.connections)
            .field("idle_connections", &state.idle_connections)
            .finish()
    }
}

impl SqliteStore {
    /// Opens (or creates) a database file and ensures the schema exists.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the pool cannot open its
    /// connections and [`StoreError::Database`] if the schema cannot be
    /// created.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let manager =
            SqliteConnectionManager::file(path).with_init(|c| c.busy_timeout(BUSY_TIMEOUT));
        Self::from_pool(Pool::builder().max_size(POOL_SIZE).build(manager)?)
    }

    /// Opens a private in-memory database.
    ///
    /// Every in-memory connection is its own database, so the pool holds
    /// exactly one.
    ///
    /// # Errors
    ///
    /// See [`SqliteStore::open`].
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let manager = SqliteConnectionManager::memory();
        Self::from_pool(Pool::builder().max_size(1).build(manager)?)
    }

    fn from_pool(pool: Pool<SqliteConnectionManager>) -> Result<Self, StoreError> {
        init_schema(&*pool.get()?)?;
        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, StoreError> {
        Ok(self.pool.get()?)
    }
}

impl ShopStore for SqliteStore {
    fn find_by_shop(&self, shop: &StorefrontId) -> Result<Option<Installation>, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {INSTALLATION_COLS} FROM installations WHERE shop = ?1"),
            params![shop.as_ref()],
            installation_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    fn upsert(&self, installation: NewInstallation) -> Result<Installation, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!(
                "INSERT INTO installations (shop, access_token, scope, active, installed_at)
                 VALUES (?1, ?2, ?3, 1, ?4)
                 ON CONFLICT(shop) DO UPDATE SET
                    access_token = excluded.access_token,
                    scope = excluded.scope,
                    active = 1,
                    installed_at = excluded.installed_at
                 RETURNING {INSTALLATION_COLS}"
            ),
            params![
                installation.shop.as_ref(),
                installation.access_token.as_ref(),
                installation.scope,
                to_sql_time(installation.installed_at),
            ],
            installation_from_row,
        )
        .map_err(Into::into)
    }
}

impl CheckoutStore for SqliteStore {
    fn insert_if_absent(&self, checkout: NewAbandonedCheckout) -> Result<InsertOutcome, StoreError> {
        if !checkout.recovery_url_fits() {
            return Err(StoreError::Constraint {
                reason: "recovery_url exceeds maximum length".to_string(),
            });
        }

        let conn = self.conn()?;
        let affected = conn.execute(
            "INSERT INTO abandoned_checkouts
                (checkout_id, shop_domain, customer_email, recovery_url, status, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(checkout_id) DO NOTHING",
            params![
                checkout.checkout_id,
                checkout.shop_domain,
                checkout.customer_email,
                checkout.recovery_url,
                checkout.status.as_str(),
                to_sql_time(checkout.created_at),
            ],
        )?;

        if affected == 0 {
            return Ok(InsertOutcome::Duplicate);
        }
        Ok(InsertOutcome::Inserted(
            checkout.into_record(conn.last_insert_rowid()),
        ))
    }

    fn find_by_checkout_id(
        &self,
        checkout_id: &str,
    ) -> Result<Option<AbandonedCheckout>, StoreError> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {CHECKOUT_COLS} FROM abandoned_checkouts WHERE checkout_id = ?1"),
            params![checkout_id],
            checkout_from_row,
        )
        .optional()
        .map_err(Into::into)
    }

    fn count(&self) -> Result<usize, StoreError> {
        let conn = self.conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM abandoned_checkouts", [], |row| row.get(0))?;
        usize::try_from(count).map_err(|_| StoreError::Constraint {
            reason: format!("negative row count {count}"),
        })
    }
}

// Verify SqliteStore is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<SqliteStore>();
};
