//! Tweet creation
//!
//! A tweet and its tag associations are written in one transaction: either
//! the tweet and every tag become visible together, or nothing does.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::models::tweet::Tweet;
use crate::store::{Store, StoreResult, StoreTransaction};
use crate::tagging::{extract_mentions, resolve_mentions, tag};

/// Write side of the tweet timeline
#[derive(Clone)]
pub struct TweetService {
    store: Arc<dyn Store>,
}

impl TweetService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Creates a tweet for `author_id` and tags every mentioned user
    ///
    /// Mentions of unknown users and of the author are ignored. Any failure
    /// rolls the transaction back and is returned to the caller unchanged.
    ///
    /// # Errors
    ///
    /// - [`StoreError::ForeignKeyViolation`](crate::store::StoreError) if the author does not exist
    /// - [`StoreError::CheckViolation`](crate::store::StoreError) if the content is empty or too long
    pub async fn create_tweet(&self, author_id: i64, content: &str) -> StoreResult<Tweet> {
        let mut tx = self.store.begin().await?;

        match write_tweet(tx.as_mut(), author_id, content).await {
            Ok((tweet, tagged)) => {
                tx.commit().await?;
                info!(tweet_id = tweet.id, author_id, tagged, "Created tweet");
                Ok(tweet)
            }
            Err(err) => {
                error!(author_id, error = %err, "Failed to create tweet");
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed tweet creation also failed");
                }
                Err(err)
            }
        }
    }
}

/// Inserts the tweet and its tags, returning the tweet and the tag count
async fn write_tweet(
    tx: &mut dyn StoreTransaction,
    author_id: i64,
    content: &str,
) -> StoreResult<(Tweet, usize)> {
    let tweet = tx.insert_tweet(author_id, content).await?;

    let handles = extract_mentions(content);
    let user_ids = resolve_mentions(tx, &handles, author_id).await?;
    let tags = tag(tx, tweet.id, &user_ids).await?;

    Ok((tweet, tags.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tweet::TweetFilter;
    use crate::models::user::CreateUser;
    use crate::store::{memory::MemoryStore, StoreError};

    async fn seeded() -> (Arc<MemoryStore>, Vec<i64>) {
        let store = Arc::new(MemoryStore::new());
        let mut ids = Vec::new();
        for name in ["alice", "bob", "chris"] {
            let user = store
                .create_user(CreateUser {
                    username: name.to_string(),
                    email: format!("{name}@example.org"),
                    password_hash: "hash".to_string(),
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        (store, ids)
    }

    #[tokio::test]
    async fn test_create_tweet_tags_mentioned_users() {
        let (store, ids) = seeded().await;
        let service = TweetService::new(store.clone());

        let tweet = service
            .create_tweet(ids[0], "hello @bob and @chris")
            .await
            .unwrap();

        let tags = store.list_tags_for_tweets(&[tweet.id]).await.unwrap();
        let tagged: Vec<i64> = tags.iter().map(|t| t.tagged_user_id).collect();
        assert_eq!(tagged, vec![ids[1], ids[2]]);
    }

    #[tokio::test]
    async fn test_create_tweet_ignores_self_and_unknown_mentions() {
        let (store, ids) = seeded().await;
        let service = TweetService::new(store.clone());

        let tweet = service
            .create_tweet(ids[0], "@alice talking to @nobody")
            .await
            .unwrap();

        assert!(store.list_tags_for_tweets(&[tweet.id]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_tweet_for_unknown_author_writes_nothing() {
        let (store, _) = seeded().await;
        let service = TweetService::new(store.clone());

        let result = service.create_tweet(999, "hi @bob").await;

        assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));
        assert!(store.list_tweets(TweetFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_tweet_rejects_oversized_content() {
        let (store, ids) = seeded().await;
        let service = TweetService::new(store.clone());

        let result = service.create_tweet(ids[0], &"a".repeat(281)).await;

        assert!(matches!(result, Err(StoreError::CheckViolation(_))));
        assert!(store.list_tweets(TweetFilter::All).await.unwrap().is_empty());
    }
}
