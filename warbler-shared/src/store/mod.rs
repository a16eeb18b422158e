/// Storage abstraction for Warbler
///
/// Services never talk to a database directly. They receive a [`Store`]
/// handle at construction and go through it for every read, and through a
/// [`StoreTransaction`] for the one multi-step write (tweet creation).
///
/// # Backends
///
/// - [`postgres::PgStore`]: PostgreSQL via a sqlx connection pool
/// - [`memory::MemoryStore`]: in-process store with the same constraints and
///   transactional behaviour, used for local runs and tests
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use warbler_shared::store::{memory::MemoryStore, Store};
///
/// # async fn example() -> Result<(), warbler_shared::store::StoreError> {
/// let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
///
/// let mut tx = store.begin().await?;
/// // ... writes ...
/// tx.rollback().await?;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;

use crate::models::{
    tag::TagAssociation,
    tweet::{Tweet, TweetFilter, TweetWithAuthor},
    user::{CreateUser, User},
};

pub mod memory;
pub mod postgres;

/// Error type for store operations
///
/// Constraint violations are classified so callers can react to them (for
/// example, a lost registration race surfaces as a unique violation).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Unclassified database or connection failure
    #[error("Database error: {0}")]
    Database(sqlx::Error),

    /// A unique constraint rejected the write
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A foreign key constraint rejected the write
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// A check constraint rejected the write
    #[error("Check constraint violated: {0}")]
    CheckViolation(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind;

        let classified = err.as_database_error().and_then(|db_err| {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.kind() {
                ErrorKind::UniqueViolation => Some(StoreError::UniqueViolation(constraint)),
                ErrorKind::ForeignKeyViolation => Some(StoreError::ForeignKeyViolation(constraint)),
                ErrorKind::CheckViolation => Some(StoreError::CheckViolation(constraint)),
                _ => None,
            }
        });

        classified.unwrap_or_else(|| StoreError::Database(err))
    }
}

/// Store result type alias
pub type StoreResult<T> = Result<T, StoreError>;

/// Read access and transaction entry point for all persisted entities
#[async_trait]
pub trait Store: Send + Sync {
    /// Short backend name, reported by the health endpoint
    fn backend(&self) -> &'static str;

    /// Verifies the store is reachable
    async fn health_check(&self) -> StoreResult<()>;

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Inserts a user; duplicate username or email is a [`StoreError::UniqueViolation`]
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    /// Lists tweets with their author summary, highest ID first
    async fn list_tweets(&self, filter: TweetFilter) -> StoreResult<Vec<TweetWithAuthor>>;

    /// Lists the tag associations of the given tweets, ordered by ID
    async fn list_tags_for_tweets(&self, tweet_ids: &[i64]) -> StoreResult<Vec<TagAssociation>>;

    /// Opens a transaction
    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>>;
}

/// A unit of work whose writes commit together or not at all
///
/// Dropping a transaction without calling [`commit`](Self::commit) discards
/// its writes.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Inserts a tweet
    async fn insert_tweet(&mut self, author_id: i64, content: &str) -> StoreResult<Tweet>;

    /// Resolves usernames to user IDs in one lookup, leaving out `exclude_id`
    ///
    /// Unknown usernames are skipped. Results are ordered by ID.
    async fn find_user_ids_by_usernames(
        &mut self,
        usernames: &[String],
        exclude_id: i64,
    ) -> StoreResult<Vec<i64>>;

    /// Inserts one tag association per user ID
    async fn insert_tags(
        &mut self,
        tweet_id: i64,
        user_ids: &[i64],
    ) -> StoreResult<Vec<TagAssociation>>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;

    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}
