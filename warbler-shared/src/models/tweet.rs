/// Tweet model and database operations
///
/// Tweets are immutable once created. They are inserted inside the tweet
/// creation transaction together with their tag associations, and read back
/// joined with either their author or their tags.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tweets (
///     id BIGSERIAL PRIMARY KEY,
///     author_id BIGINT NOT NULL REFERENCES users(id),
///     content TEXT NOT NULL
///         CHECK (char_length(content) BETWEEN 1 AND 280),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgExecutor;

use super::tag::TagAssociation;
use super::user::UserSummary;

/// Maximum tweet length in characters
pub const MAX_CONTENT_CHARS: usize = 280;

/// A persisted tweet, without joins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tweet {
    /// Unique tweet ID; monotonic, so it doubles as a recency key
    pub id: i64,

    /// Author of the tweet
    pub author_id: i64,

    /// Free text, 1 to 280 characters
    pub content: String,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tweet joined with the minimal projection of its author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetWithAuthor {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Author summary
    pub user: UserSummary,
}

/// A tweet joined with the users it tags
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TweetWithTags {
    pub id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    /// Tag associations for this tweet, ordered by ID
    pub tagged_users: Vec<TagAssociation>,
}

impl TweetWithTags {
    /// Builds the tagged view of an authored tweet
    pub fn new(tweet: TweetWithAuthor, tagged_users: Vec<TagAssociation>) -> Self {
        Self {
            id: tweet.id,
            content: tweet.content,
            created_at: tweet.created_at,
            updated_at: tweet.updated_at,
            tagged_users,
        }
    }
}

/// Row selector for tweet listings
///
/// Every filter returns tweets in descending ID order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TweetFilter {
    /// Every tweet
    All,

    /// Tweets written by the given user
    AuthoredBy(i64),

    /// Tweets in which the given user is tagged
    Tagging(i64),
}

/// Flat row produced by the tweet/author join
#[derive(Debug, sqlx::FromRow)]
struct TweetAuthorRow {
    id: i64,
    content: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    author_id: i64,
    author_username: String,
    author_email: String,
}

impl From<TweetAuthorRow> for TweetWithAuthor {
    fn from(row: TweetAuthorRow) -> Self {
        Self {
            id: row.id,
            content: row.content,
            created_at: row.created_at,
            updated_at: row.updated_at,
            user: UserSummary {
                id: row.author_id,
                username: row.author_username,
                email: row.author_email,
            },
        }
    }
}

const TWEET_AUTHOR_SELECT: &str = r#"
    SELECT t.id, t.content, t.created_at, t.updated_at,
           u.id AS author_id, u.username AS author_username, u.email AS author_email
    FROM tweets t
    JOIN users u ON u.id = t.author_id
"#;

impl Tweet {
    /// Inserts a tweet
    ///
    /// Meant to be called on a transaction connection so the tweet and its
    /// tag associations commit together.
    ///
    /// # Errors
    ///
    /// Returns an error if the author does not exist (foreign key violation),
    /// the content breaks the length check, or the connection fails.
    pub async fn create<'e>(
        executor: impl PgExecutor<'e>,
        author_id: i64,
        content: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Tweet>(
            r#"
            INSERT INTO tweets (author_id, content)
            VALUES ($1, $2)
            RETURNING id, author_id, content, created_at, updated_at
            "#,
        )
        .bind(author_id)
        .bind(content)
        .fetch_one(executor)
        .await
    }

    /// Lists tweets joined with their author, newest (highest ID) first
    ///
    /// The tagging filter joins through `tagged_users`; the unique key on
    /// `(tweet_id, tagged_user_id)` keeps that join free of duplicates.
    pub async fn list_with_authors<'e>(
        executor: impl PgExecutor<'e>,
        filter: TweetFilter,
    ) -> Result<Vec<TweetWithAuthor>, sqlx::Error> {
        let rows = match filter {
            TweetFilter::All => {
                sqlx::query_as::<_, TweetAuthorRow>(&format!(
                    "{TWEET_AUTHOR_SELECT} ORDER BY t.id DESC"
                ))
                .fetch_all(executor)
                .await?
            }
            TweetFilter::AuthoredBy(user_id) => {
                sqlx::query_as::<_, TweetAuthorRow>(&format!(
                    "{TWEET_AUTHOR_SELECT} WHERE t.author_id = $1 ORDER BY t.id DESC"
                ))
                .bind(user_id)
                .fetch_all(executor)
                .await?
            }
            TweetFilter::Tagging(user_id) => {
                sqlx::query_as::<_, TweetAuthorRow>(&format!(
                    "{TWEET_AUTHOR_SELECT} JOIN tagged_users tu ON tu.tweet_id = t.id \
                     WHERE tu.tagged_user_id = $1 ORDER BY t.id DESC"
                ))
                .bind(user_id)
                .fetch_all(executor)
                .await?
            }
        };

        Ok(rows.into_iter().map(TweetWithAuthor::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tweet_with_tags_keeps_tweet_fields() {
        let now = Utc::now();
        let tweet = TweetWithAuthor {
            id: 3,
            content: "hi @bob".to_string(),
            created_at: now,
            updated_at: now,
            user: UserSummary {
                id: 1,
                username: "alice".to_string(),
                email: "alice@example.org".to_string(),
            },
        };
        let tag = TagAssociation {
            id: 9,
            tagged_user_id: 2,
            tweet_id: 3,
            created_at: now,
            updated_at: now,
        };

        let tagged = TweetWithTags::new(tweet, vec![tag.clone()]);

        assert_eq!(tagged.id, 3);
        assert_eq!(tagged.content, "hi @bob");
        assert_eq!(tagged.tagged_users, vec![tag]);
    }

    #[test]
    fn test_tweet_with_author_serializes_nested_user() {
        let now = Utc::now();
        let tweet = TweetWithAuthor {
            id: 1,
            content: "hello".to_string(),
            created_at: now,
            updated_at: now,
            user: UserSummary {
                id: 4,
                username: "dan".to_string(),
                email: "dan@example.org".to_string(),
            },
        };

        let json = serde_json::to_value(&tweet).unwrap();
        assert_eq!(json["user"]["username"], "dan");
        assert!(json.get("author_id").is_none());
    }
}
