use chrono::NaiveDate;
use tokio::sync::broadcast;
use tracing::warn;

use crate::domain::{Cents, SalesDay};
use crate::storage::{ADMIN_PASS_KEY, PASS_HASH_COST, Repository, StoreError};

use super::{AppError, messages};

/// Views that need re-rendering after a mutation, the crate's stand-in
/// for the web layer's path revalidation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshTarget {
    /// The paginated list of sales days.
    DayList,
    /// The detail view of one day.
    Day(NaiveDate),
}

/// Caller-facing result of a mutating intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub success: bool,
    pub message: Option<String>,
}

impl Outcome {
    pub fn ok() -> Self {
        Self { success: true, message: None }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: Some(message.into()) }
    }
}

/// Application service orchestrating the register's intents.
/// This is the primary interface for any client (web, TUI, etc.);
/// read-only queries go straight to [`Repository`].
pub struct LedgerService {
    repo: Repository,
    refresh_tx: broadcast::Sender<RefreshTarget>,
}

impl LedgerService {
    /// Create a new service over the given repository.
    pub fn new(repo: Repository) -> Self {
        let (refresh_tx, _) = broadcast::channel(16);
        Self { repo, refresh_tx }
    }

    /// Initialize a database at the given path (created if missing).
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database without re-initializing it.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// The underlying store, for read-only queries (paging, stats).
    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    /// Subscribe to view refresh signals.
    pub fn subscribe(&self) -> broadcast::Receiver<RefreshTarget> {
        self.refresh_tx.subscribe()
    }

    /// Release the underlying store, at process shutdown.
    pub async fn close(&self) {
        self.repo.close().await;
    }

    fn notify(&self, target: RefreshTarget) {
        // Nobody listening is fine.
        let _ = self.refresh_tx.send(target);
    }

    // ========================
    // Day operations
    // ========================

    /// Open the register for `date`. Idempotent: an existing day is left
    /// alone. Every other day is closed so that at most one day stays
    /// open.
    pub async fn open_day(&self, date: NaiveDate) -> Outcome {
        match self.try_open_day(date).await {
            Ok(()) => {
                self.notify(RefreshTarget::DayList);
                Outcome::ok()
            }
            Err(err) => {
                warn!(%date, %err, "open day failed");
                Outcome::failure(messages::OPEN_DAY_FAILED)
            }
        }
    }

    async fn try_open_day(&self, date: NaiveDate) -> Result<(), AppError> {
        if self.repo.get_sales_day(date).await?.is_none() {
            self.repo.insert_sales_day(date, true).await?;
        }
        self.repo.close_other_days(date).await?;
        Ok(())
    }

    /// Fetch a day by date.
    pub async fn get_sales_day(&self, date: NaiveDate) -> Result<Option<SalesDay>, AppError> {
        Ok(self.repo.get_sales_day(date).await?)
    }

    // ========================
    // Entry operations
    // ========================

    /// Record a signed entry into the day at `date`. Zero values are
    /// rejected here; the day must exist and be open.
    pub async fn record_entry(&self, date: NaiveDate, value: Cents) -> Outcome {
        match self.try_record_entry(date, value).await {
            Ok(()) => {
                self.notify(RefreshTarget::Day(date));
                Outcome::ok()
            }
            Err(err) => {
                warn!(%date, value, %err, "record entry failed");
                Outcome::failure(match err {
                    AppError::ZeroValue => messages::ZERO_VALUE,
                    AppError::Store(StoreError::DayClosed(_)) => messages::DAY_CLOSED,
                    AppError::Store(StoreError::DayNotFound(_)) => messages::DAY_NOT_FOUND,
                    _ => messages::SAVE_ENTRY_FAILED,
                })
            }
        }
    }

    async fn try_record_entry(&self, date: NaiveDate, value: Cents) -> Result<(), AppError> {
        if value == 0 {
            return Err(AppError::ZeroValue);
        }
        self.repo.insert_sales_entry(date, value).await?;
        Ok(())
    }

    /// Delete an entry by id. Succeeds even if the id no longer exists.
    pub async fn remove_entry(&self, id: i64, date: NaiveDate) -> Outcome {
        match self.repo.delete_sales_entry(id).await {
            Ok(()) => {
                self.notify(RefreshTarget::Day(date));
                Outcome::ok()
            }
            Err(err) => {
                warn!(id, %date, %err, "delete entry failed");
                Outcome::failure(messages::DELETE_ENTRY_FAILED)
            }
        }
    }

    // ========================
    // Admin password
    // ========================

    /// Hash and persist a new admin password.
    pub async fn set_admin_password(&self, pass: &str) -> Result<(), AppError> {
        let hashed = bcrypt::hash(pass, PASS_HASH_COST)?;
        self.repo.set_secret(ADMIN_PASS_KEY, &hashed).await?;
        Ok(())
    }

    /// Check a candidate password against the stored hash. A missing
    /// hash never matches.
    pub async fn check_admin_password(&self, candidate: &str) -> Result<bool, AppError> {
        let Some(hashed) = self.repo.get_secret(ADMIN_PASS_KEY).await? else {
            return Ok(false);
        };
        Ok(bcrypt::verify(candidate, &hashed)?)
    }
}
