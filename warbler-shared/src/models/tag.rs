/// Tag association model ("tweet mentions user")
///
/// Rows are only ever created as a side effect of tweet creation and are
/// never updated or deleted independently.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tagged_users (
///     id BIGSERIAL PRIMARY KEY,
///     tagged_user_id BIGINT NOT NULL REFERENCES users(id),
///     tweet_id BIGINT NOT NULL REFERENCES tweets(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (tweet_id, tagged_user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

/// Join entity linking a tweet to a mentioned user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TagAssociation {
    pub id: i64,

    /// The mentioned user; never the tweet's author
    pub tagged_user_id: i64,

    pub tweet_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TagAssociation {
    /// Inserts one association per user ID in a single statement
    ///
    /// Returns the inserted rows ordered by ID. An empty `user_ids` slice
    /// issues no query.
    pub async fn bulk_create<'e>(
        executor: impl PgExecutor<'e>,
        tweet_id: i64,
        user_ids: &[i64],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut tags = sqlx::query_as::<_, TagAssociation>(
            r#"
            INSERT INTO tagged_users (tweet_id, tagged_user_id)
            SELECT $1, UNNEST($2::BIGINT[])
            RETURNING id, tagged_user_id, tweet_id, created_at, updated_at
            "#,
        )
        .bind(tweet_id)
        .bind(user_ids)
        .fetch_all(executor)
        .await?;

        tags.sort_by_key(|tag| tag.id);
        Ok(tags)
    }

    /// Lists the associations of a set of tweets, ordered by ID
    pub async fn list_for_tweets<'e>(
        executor: impl PgExecutor<'e>,
        tweet_ids: &[i64],
    ) -> Result<Vec<Self>, sqlx::Error> {
        if tweet_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, TagAssociation>(
            r#"
            SELECT id, tagged_user_id, tweet_id, created_at, updated_at
            FROM tagged_users
            WHERE tweet_id = ANY($1)
            ORDER BY id
            "#,
        )
        .bind(tweet_ids)
        .fetch_all(executor)
        .await
    }
}
