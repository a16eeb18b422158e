/// In-process store with PostgreSQL-like semantics
///
/// Mirrors the schema constraints of the SQL migrations (unique usernames
/// and emails, foreign keys, the content length check, one tag per user per
/// tweet) and reports violations with the same [`StoreError`] variants.
///
/// Transactions stage their writes and apply them on commit. IDs are drawn
/// from shared sequences when a row is staged, so a rolled-back transaction
/// leaves a gap, just like a PostgreSQL sequence.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::debug;

use super::{Store, StoreError, StoreResult, StoreTransaction};
use crate::models::{
    tag::TagAssociation,
    tweet::{Tweet, TweetFilter, TweetWithAuthor, MAX_CONTENT_CHARS},
    user::{CreateUser, User},
};

#[derive(Debug, Default)]
struct MemoryState {
    users: Vec<User>,
    tweets: Vec<Tweet>,
    tags: Vec<TagAssociation>,
    user_seq: i64,
    tweet_seq: i64,
    tag_seq: i64,
}

impl MemoryState {
    fn user(&self, id: i64) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    fn with_author(&self, tweet: &Tweet) -> Option<TweetWithAuthor> {
        let author = self.user(tweet.author_id)?;
        Some(TweetWithAuthor {
            id: tweet.id,
            content: tweet.content.clone(),
            created_at: tweet.created_at,
            updated_at: tweet.updated_at,
            user: author.summary(),
        })
    }
}

/// In-memory [`Store`]; clones share the same data
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn find_user_by_id(&self, id: i64) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.user(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;

        if state.users.iter().any(|u| u.username == data.username) {
            return Err(StoreError::UniqueViolation("users_username_key".to_string()));
        }
        if state.users.iter().any(|u| u.email == data.email) {
            return Err(StoreError::UniqueViolation("users_email_key".to_string()));
        }

        state.user_seq += 1;
        let now = Utc::now();
        let user = User {
            id: state.user_seq,
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());

        Ok(user)
    }

    async fn list_tweets(&self, filter: TweetFilter) -> StoreResult<Vec<TweetWithAuthor>> {
        let state = self.state.lock().await;

        let tagged_in: HashSet<i64> = match filter {
            TweetFilter::Tagging(user_id) => state
                .tags
                .iter()
                .filter(|tag| tag.tagged_user_id == user_id)
                .map(|tag| tag.tweet_id)
                .collect(),
            _ => HashSet::new(),
        };

        let mut tweets: Vec<TweetWithAuthor> = state
            .tweets
            .iter()
            .filter(|tweet| match filter {
                TweetFilter::All => true,
                TweetFilter::AuthoredBy(user_id) => tweet.author_id == user_id,
                TweetFilter::Tagging(_) => tagged_in.contains(&tweet.id),
            })
            .filter_map(|tweet| state.with_author(tweet))
            .collect();
        tweets.sort_by(|a, b| b.id.cmp(&a.id));

        debug!(?filter, count = tweets.len(), "Listed tweets");
        Ok(tweets)
    }

    async fn list_tags_for_tweets(&self, tweet_ids: &[i64]) -> StoreResult<Vec<TagAssociation>> {
        let state = self.state.lock().await;

        let mut tags: Vec<TagAssociation> = state
            .tags
            .iter()
            .filter(|tag| tweet_ids.contains(&tag.tweet_id))
            .cloned()
            .collect();
        tags.sort_by_key(|tag| tag.id);

        Ok(tags)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTransaction>> {
        Ok(Box::new(MemoryTransaction {
            state: Arc::clone(&self.state),
            tweets: Vec::new(),
            tags: Vec::new(),
        }))
    }
}

/// Staged writes of an open in-memory transaction
struct MemoryTransaction {
    state: Arc<Mutex<MemoryState>>,
    tweets: Vec<Tweet>,
    tags: Vec<TagAssociation>,
}

impl MemoryTransaction {
    fn tweet_visible(&self, state: &MemoryState, tweet_id: i64) -> bool {
        self.tweets.iter().any(|t| t.id == tweet_id) || state.tweets.iter().any(|t| t.id == tweet_id)
    }

    fn tag_exists(&self, state: &MemoryState, tweet_id: i64, user_id: i64) -> bool {
        self.tags
            .iter()
            .chain(state.tags.iter())
            .any(|tag| tag.tweet_id == tweet_id && tag.tagged_user_id == user_id)
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn insert_tweet(&mut self, author_id: i64, content: &str) -> StoreResult<Tweet> {
        let mut state = self.state.lock().await;

        let chars = content.chars().count();
        if chars == 0 || chars > MAX_CONTENT_CHARS {
            return Err(StoreError::CheckViolation(
                "tweets_content_length_check".to_string(),
            ));
        }
        if state.user(author_id).is_none() {
            return Err(StoreError::ForeignKeyViolation(
                "tweets_author_id_fkey".to_string(),
            ));
        }

        state.tweet_seq += 1;
        let now = Utc::now();
        let tweet = Tweet {
            id: state.tweet_seq,
            author_id,
            content: content.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.tweets.push(tweet.clone());

        Ok(tweet)
    }

    async fn find_user_ids_by_usernames(
        &mut self,
        usernames: &[String],
        exclude_id: i64,
    ) -> StoreResult<Vec<i64>> {
        let state = self.state.lock().await;

        let mut ids: Vec<i64> = state
            .users
            .iter()
            .filter(|user| user.id != exclude_id && usernames.contains(&user.username))
            .map(|user| user.id)
            .collect();
        ids.sort_unstable();

        Ok(ids)
    }

    async fn insert_tags(
        &mut self,
        tweet_id: i64,
        user_ids: &[i64],
    ) -> StoreResult<Vec<TagAssociation>> {
        let mut state = self.state.lock().await;

        // Validate the whole batch first; a failing statement writes nothing.
        if !user_ids.is_empty() && !self.tweet_visible(&state, tweet_id) {
            return Err(StoreError::ForeignKeyViolation(
                "tagged_users_tweet_id_fkey".to_string(),
            ));
        }
        let mut batch = HashSet::new();
        for &user_id in user_ids {
            if state.user(user_id).is_none() {
                return Err(StoreError::ForeignKeyViolation(
                    "tagged_users_tagged_user_id_fkey".to_string(),
                ));
            }
            if !batch.insert(user_id) || self.tag_exists(&state, tweet_id, user_id) {
                return Err(StoreError::UniqueViolation(
                    "tagged_users_tweet_user_key".to_string(),
                ));
            }
        }

        let now = Utc::now();
        let mut inserted = Vec::with_capacity(user_ids.len());
        for &user_id in user_ids {
            state.tag_seq += 1;
            inserted.push(TagAssociation {
                id: state.tag_seq,
                tagged_user_id: user_id,
                tweet_id,
                created_at: now,
                updated_at: now,
            });
        }
        self.tags.extend(inserted.iter().cloned());

        Ok(inserted)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction { state: shared, tweets, tags } = *self;
        let mut state = shared.lock().await;

        debug!(
            tweets = tweets.len(),
            tags = tags.len(),
            "Committing in-memory transaction"
        );
        state.tweets.extend(tweets);
        state.tags.extend(tags);

        Ok(())
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        debug!(
            tweets = self.tweets.len(),
            tags = self.tags.len(),
            "Discarding in-memory transaction"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(name: &str) -> CreateUser {
        CreateUser {
            username: name.to_string(),
            email: format!("{name}@example.org"),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_user_assigns_increasing_ids() {
        let store = MemoryStore::new();

        let alice = store.create_user(new_user("alice")).await.unwrap();
        let bob = store.create_user(new_user("bob")).await.unwrap();

        assert_eq!(alice.id, 1);
        assert_eq!(bob.id, 2);

        let found = store.find_user_by_id(bob.id).await.unwrap().unwrap();
        assert_eq!(found.username, "bob");
        assert!(store.find_user_by_id(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_user_rejects_duplicate_username_and_email() {
        let store = MemoryStore::new();
        store.create_user(new_user("alice")).await.unwrap();

        let same_name = store.create_user(new_user("alice")).await;
        assert!(matches!(same_name, Err(StoreError::UniqueViolation(c)) if c == "users_username_key"));

        let same_email = store
            .create_user(CreateUser {
                username: "alice2".to_string(),
                ..new_user("alice")
            })
            .await;
        assert!(matches!(same_email, Err(StoreError::UniqueViolation(c)) if c == "users_email_key"));
    }

    #[tokio::test]
    async fn test_uncommitted_writes_are_invisible() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        tx.insert_tweet(alice.id, "draft").await.unwrap();
        assert!(store.list_tweets(TweetFilter::All).await.unwrap().is_empty());

        tx.rollback().await.unwrap();
        assert!(store.list_tweets(TweetFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_dropped_transaction_discards_writes() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();

        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_tweet(alice.id, "never committed").await.unwrap();
        }

        assert!(store.list_tweets(TweetFilter::All).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rolled_back_ids_are_not_reused() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let discarded = tx.insert_tweet(alice.id, "one").await.unwrap();
        tx.rollback().await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let kept = tx.insert_tweet(alice.id, "two").await.unwrap();
        tx.commit().await.unwrap();

        assert!(kept.id > discarded.id);
    }

    #[tokio::test]
    async fn test_insert_tweet_enforces_constraints() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        let mut tx = store.begin().await.unwrap();

        let empty = tx.insert_tweet(alice.id, "").await;
        assert!(matches!(empty, Err(StoreError::CheckViolation(_))));

        let too_long = tx.insert_tweet(alice.id, &"x".repeat(281)).await;
        assert!(matches!(too_long, Err(StoreError::CheckViolation(_))));

        let max = tx.insert_tweet(alice.id, &"é".repeat(280)).await;
        assert!(max.is_ok(), "280 multi-byte characters fit");

        let orphan = tx.insert_tweet(999, "who am I").await;
        assert!(matches!(orphan, Err(StoreError::ForeignKeyViolation(_))));
    }

    #[tokio::test]
    async fn test_insert_tags_validates_whole_batch() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        let bob = store.create_user(new_user("bob")).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let tweet = tx.insert_tweet(alice.id, "hi @bob").await.unwrap();

        let result = tx.insert_tags(tweet.id, &[bob.id, 404]).await;
        assert!(matches!(result, Err(StoreError::ForeignKeyViolation(_))));

        let duplicate = tx.insert_tags(tweet.id, &[bob.id, bob.id]).await;
        assert!(matches!(duplicate, Err(StoreError::UniqueViolation(_))));

        let tags = tx.insert_tags(tweet.id, &[bob.id]).await.unwrap();
        assert_eq!(tags.len(), 1);
        tx.commit().await.unwrap();

        let stored = store.list_tags_for_tweets(&[tweet.id]).await.unwrap();
        assert_eq!(stored, tags);
    }

    #[tokio::test]
    async fn test_find_user_ids_excludes_author_and_unknown_names() {
        let store = MemoryStore::new();
        let alice = store.create_user(new_user("alice")).await.unwrap();
        let bob = store.create_user(new_user("bob")).await.unwrap();

        let mut tx = store.begin().await.unwrap();
        let names = vec!["alice".to_string(), "bob".to_string(), "ghost".to_string()];
        let ids = tx.find_user_ids_by_usernames(&names, alice.id).await.unwrap();

        assert_eq!(ids, vec![bob.id]);
    }
}
