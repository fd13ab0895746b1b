use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{Row, SqlitePool};
use thiserror::Error;
use tracing::{debug, info};

use crate::domain::{Cents, CompleteSalesDay, SalesDay, SalesEntry, SalesEntryStats};

use super::MIGRATION_001_INITIAL;

/// Key under which the hashed admin password lives in `secrets`.
pub const ADMIN_PASS_KEY: &str = "admin-pass";

/// Password seeded for a freshly created store.
pub const DEFAULT_ADMIN_PASS: &str = "admin";

/// bcrypt cost factor for stored password hashes.
pub const PASS_HASH_COST: u32 = 10;

/// Typed failures raised by the store.
///
/// Write operations fail with a variant; read operations return
/// `Option`/empty values for missing rows instead of erroring.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("a sales day for {0} already exists")]
    DuplicateDay(NaiveDate),

    #[error("sales day {0} is closed")]
    DayClosed(NaiveDate),

    #[error("no sales day for {0}")]
    DayNotFound(NaiveDate),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("storage failure: {0}")]
    Io(#[from] sqlx::Error),
}

/// Repository for persisting and querying sales days, entries and secrets.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given URL.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = SqlitePool::connect(database_url).await?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(MIGRATION_001_INITIAL).execute(&self.pool).await?;
        Ok(())
    }

    /// Bring the store to its ready state: create missing tables, seed the
    /// default admin secret if absent and close every day other than
    /// `today`. Safe to run against a pre-populated store.
    pub async fn initialize(&self, today: NaiveDate) -> Result<(), StoreError> {
        self.migrate().await?;

        if self.get_secret(ADMIN_PASS_KEY).await?.is_none() {
            let hashed = bcrypt::hash(DEFAULT_ADMIN_PASS, PASS_HASH_COST)?;
            sqlx::query("INSERT OR IGNORE INTO secrets (key, value) VALUES (?, ?)")
                .bind(ADMIN_PASS_KEY)
                .bind(&hashed)
                .execute(&self.pool)
                .await?;
        }

        self.close_other_days(today).await?;
        info!(%today, "store initialized");
        Ok(())
    }

    /// Connect + initialize in one step, with `today` taken from the
    /// local clock.
    pub async fn init(database_url: &str) -> Result<Self, StoreError> {
        let repo = Self::connect(database_url).await?;
        repo.initialize(chrono::Local::now().date_naive()).await?;
        Ok(repo)
    }

    /// Release the underlying connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    // ========================
    // Sales day operations
    // ========================

    /// Exact-match lookup of a sales day by date.
    pub async fn get_sales_day(&self, date: NaiveDate) -> Result<Option<SalesDay>, StoreError> {
        let row = sqlx::query("SELECT id, date, open FROM sales_day WHERE date = ?")
            .bind(date.to_string())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(Some(Self::row_to_day(&row)?)),
            None => Ok(None),
        }
    }

    /// Insert a new sales day. Fails with [`StoreError::DuplicateDay`] if a
    /// row for that date already exists.
    pub async fn insert_sales_day(&self, date: NaiveDate, open: bool) -> Result<(), StoreError> {
        sqlx::query("INSERT INTO sales_day (date, open) VALUES (?, ?)")
            .bind(date.to_string())
            .bind(open as i64)
            .execute(&self.pool)
            .await
            .map_err(|e| match e.as_database_error() {
                Some(db) if db.is_unique_violation() => StoreError::DuplicateDay(date),
                _ => StoreError::Io(e),
            })?;
        Ok(())
    }

    /// Close every open day whose date differs from `date`.
    ///
    /// This sweep, not a uniqueness constraint, maintains the
    /// single-open-day invariant. It runs at initialization and on every
    /// day-open.
    pub async fn close_other_days(&self, date: NaiveDate) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE sales_day SET open = 0 WHERE open = 1 AND date != ?")
            .bind(date.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            debug!(closed = result.rows_affected(), %date, "closed stale sales days");
        }
        Ok(())
    }

    /// Page through all sales days, newest first, each joined with the
    /// aggregates over its entries. Days without entries appear with
    /// zeroed stats.
    pub async fn paged_complete_sales_days(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CompleteSalesDay>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT
                sd.id,
                sd.date,
                sd.open,
                COUNT(se.id) AS entry_count,
                COALESCE(SUM(CASE WHEN se.value > 0 THEN se.value ELSE 0 END), 0) AS income,
                COALESCE(SUM(CASE WHEN se.value < 0 THEN se.value ELSE 0 END), 0) AS outcome,
                COALESCE(SUM(se.value), 0) AS balance
            FROM sales_day sd
            LEFT JOIN sales_entry se ON sd.id = se.sales_day_id
            GROUP BY sd.id, sd.date, sd.open
            ORDER BY sd.date DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(CompleteSalesDay {
                    day: Self::row_to_day(row)?,
                    stats: SalesEntryStats {
                        count: row.get("entry_count"),
                        income: row.get("income"),
                        outcome: row.get("outcome"),
                        balance: row.get("balance"),
                    },
                })
            })
            .collect()
    }

    /// Number of pages needed to list every sales day at `limit` rows per
    /// page. A non-positive limit yields 0 pages.
    pub async fn sales_day_page_count(&self, limit: i64) -> Result<i64, StoreError> {
        if limit <= 0 {
            return Ok(0);
        }

        let count: i64 = sqlx::query("SELECT COUNT(id) AS count FROM sales_day")
            .fetch_one(&self.pool)
            .await?
            .get("count");

        Ok((count + limit - 1) / limit)
    }

    // ========================
    // Sales entry operations
    // ========================

    /// Page through the entries of the day at `date`, most recent id
    /// first. A missing day yields an empty page, not an error.
    pub async fn paged_sales_entries(
        &self,
        date: NaiveDate,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<SalesEntry>, StoreError> {
        let Some(day) = self.get_sales_day(date).await? else {
            return Ok(Vec::new());
        };

        let rows = sqlx::query(
            r#"
            SELECT id, sales_day_id, value, timestamp
            FROM sales_entry
            WHERE sales_day_id = ?
            ORDER BY id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(day.id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::row_to_entry).collect()
    }

    /// Number of entry pages for the day at `date`; 0 if the day is
    /// absent or the limit non-positive.
    pub async fn sales_entries_page_count(
        &self,
        date: NaiveDate,
        limit: i64,
    ) -> Result<i64, StoreError> {
        if limit <= 0 {
            return Ok(0);
        }

        let Some(day) = self.get_sales_day(date).await? else {
            return Ok(0);
        };

        let count: i64 = sqlx::query("SELECT COUNT(id) AS count FROM sales_entry WHERE sales_day_id = ?")
            .bind(day.id)
            .fetch_one(&self.pool)
            .await?
            .get("count");

        Ok((count + limit - 1) / limit)
    }

    /// Aggregate stats for the day at `date`. A missing day yields the
    /// zero-valued stats, treated as a valid empty day.
    pub async fn sales_entries_stats(&self, date: NaiveDate) -> Result<SalesEntryStats, StoreError> {
        let Some(day) = self.get_sales_day(date).await? else {
            return Ok(SalesEntryStats::default());
        };

        let row = sqlx::query(
            r#"
            SELECT
                COUNT(id) AS count,
                COALESCE(SUM(CASE WHEN value > 0 THEN value ELSE 0 END), 0) AS income,
                COALESCE(SUM(CASE WHEN value < 0 THEN value ELSE 0 END), 0) AS outcome,
                COALESCE(SUM(value), 0) AS balance
            FROM sales_entry
            WHERE sales_day_id = ?
            "#,
        )
        .bind(day.id)
        .fetch_one(&self.pool)
        .await?;

        Ok(SalesEntryStats {
            count: row.get("count"),
            income: row.get("income"),
            outcome: row.get("outcome"),
            balance: row.get("balance"),
        })
    }

    /// Insert an entry into the day at `date`. The timestamp is assigned
    /// by the store. Fails with [`StoreError::DayNotFound`] if the day
    /// does not exist and [`StoreError::DayClosed`] if it is not open.
    pub async fn insert_sales_entry(&self, date: NaiveDate, value: Cents) -> Result<(), StoreError> {
        let Some(day) = self.get_sales_day(date).await? else {
            return Err(StoreError::DayNotFound(date));
        };
        if !day.open {
            return Err(StoreError::DayClosed(date));
        }

        sqlx::query("INSERT INTO sales_entry (sales_day_id, value) VALUES (?, ?)")
            .bind(day.id)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Delete an entry by id. Deleting a non-existent id is a no-op.
    /// There is no closed-day guard: corrections on closed days are
    /// allowed.
    pub async fn delete_sales_entry(&self, id: i64) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM sales_entry WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // ========================
    // Secret operations
    // ========================

    /// Fetch a secret value by key.
    pub async fn get_secret(&self, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT value FROM secrets WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|row| row.get("value")))
    }

    /// Insert-or-replace a secret.
    pub async fn set_secret(&self, key: &str, value: &str) -> Result<(), StoreError> {
        sqlx::query("INSERT OR REPLACE INTO secrets (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    fn row_to_day(row: &sqlx::sqlite::SqliteRow) -> Result<SalesDay, StoreError> {
        let date_str: String = row.get("date");

        Ok(SalesDay {
            id: row.get("id"),
            date: date_str
                .parse()
                .map_err(|e| StoreError::Corrupt(format!("invalid date {date_str:?}: {e}")))?,
            open: row.get::<i64, _>("open") != 0,
        })
    }

    fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<SalesEntry, StoreError> {
        // SQLite CURRENT_TIMESTAMP is "YYYY-MM-DD HH:MM:SS" in UTC.
        let timestamp_str: String = row.get("timestamp");
        let timestamp = NaiveDateTime::parse_from_str(&timestamp_str, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| StoreError::Corrupt(format!("invalid timestamp {timestamp_str:?}: {e}")))?
            .and_utc();

        Ok(SalesEntry {
            id: row.get("id"),
            sales_day_id: row.get("sales_day_id"),
            value: row.get("value"),
            timestamp,
        })
    }
}
