/// PostgreSQL store backed by a sqlx connection pool
///
/// Each trait method delegates to the query functions on the models. The
/// transaction type wraps `sqlx::Transaction`, so dropping it without a
/// commit rolls back on the server.
///
/// # Example
///
/// ```no_run
/// use warbler_shared::db::{migrations::run_migrations, pool::{create_pool, DatabaseConfig}};
/// use warbler_shared::store::postgres::PgStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::new(std::env::var("DATABASE_URL")?, 10)).await?;
/// run_migrations(&pool).await?;
///
/// let store = PgStore::new(pool);
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::{Store, StoreResult, StoreTransaction};
use crate::db::pool;
use crate::models::{
    tag::TagAssociation,
    tweet::{Tweet, TweetFilter, TweetWithAuthor},
    user::{CreateUser, User},
};

/// Store implementation over a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Underlying pool, for lifecycle management
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> StoreResult<()> {
        pool::health_check(&self.pool).await?;
        Ok(())
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, username).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn list_tweets(&self, filter: TweetFilter) -> StoreResult<Vec<TweetWithAuthor>> {
        debug!(?filter, "Listing tweets");
        Ok(Tweet::list_with_authors(&self.pool, filter).await?)
    }

    async fn list_tags_for_tweets(&self, tweet_ids: &[i64]) -> StoreResult<Vec<TagAssociation>> {
        Ok(TagAssociation::list_for_tweets(&self.pool, tweet_ids).await?)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx }))
    }
}

/// Open PostgreSQL transaction
pub struct PgTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn insert_tweet(&mut self, author_id: i64, content: &str) -> StoreResult<Tweet> {
        Ok(Tweet::create(&mut *self.tx, author_id, content).await?)
    }

    async fn find_user_ids_by_usernames(
        &mut self,
        usernames: &[String],
        exclude_id: i64,
    ) -> StoreResult<Vec<i64>> {
        Ok(User::ids_by_usernames(&mut *self.tx, usernames, exclude_id).await?)
    }

    async fn insert_tags(
        &mut self,
        tweet_id: i64,
        user_ids: &[i64],
    ) -> StoreResult<Vec<TagAssociation>> {
        Ok(TagAssociation::bulk_create(&mut *self.tx, tweet_id, user_ids).await?)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        self.tx.rollback().await?;
        Ok(())
    }
}
