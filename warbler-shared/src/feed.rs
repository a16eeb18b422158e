//! Feed composition
//!
//! Builds the tweet listings served to users. Tweet IDs are assigned in
//! insertion order, so every listing sorts by descending ID as its recency
//! order instead of comparing timestamps.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tracing::debug;

use crate::models::tag::TagAssociation;
use crate::models::tweet::{TweetFilter, TweetWithAuthor, TweetWithTags};
use crate::store::{Store, StoreResult};

/// Read side of the tweet timeline
#[derive(Clone)]
pub struct FeedComposer {
    store: Arc<dyn Store>,
}

impl FeedComposer {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Tweets written by `user_id` plus tweets tagging `user_id`, newest first
    ///
    /// A tweet appears once even if it matches both queries. Authors are
    /// never tagged in their own tweets, but the merge does not rely on it.
    pub async fn compose_feed(&self, user_id: i64) -> StoreResult<Vec<TweetWithAuthor>> {
        let authored = self.store.list_tweets(TweetFilter::AuthoredBy(user_id)).await?;
        let tagged = self.store.list_tweets(TweetFilter::Tagging(user_id)).await?;

        debug!(
            user_id,
            authored = authored.len(),
            tagged = tagged.len(),
            "Composing feed"
        );
        Ok(merge_newest_first(authored, tagged))
    }

    /// Every tweet with its author, newest first
    pub async fn list_all_tweets(&self) -> StoreResult<Vec<TweetWithAuthor>> {
        self.store.list_tweets(TweetFilter::All).await
    }

    /// Tweets written by `user_id`, newest first, each with its tag associations
    ///
    /// An unknown user simply has no tweets.
    pub async fn list_user_tweets(&self, user_id: i64) -> StoreResult<Vec<TweetWithTags>> {
        let tweets = self.store.list_tweets(TweetFilter::AuthoredBy(user_id)).await?;
        let tweet_ids: Vec<i64> = tweets.iter().map(|tweet| tweet.id).collect();
        let tags = self.store.list_tags_for_tweets(&tweet_ids).await?;

        let mut tags_by_tweet: HashMap<i64, Vec<TagAssociation>> = HashMap::new();
        for tag in tags {
            tags_by_tweet.entry(tag.tweet_id).or_default().push(tag);
        }

        Ok(tweets
            .into_iter()
            .map(|tweet| {
                let tagged_users = tags_by_tweet.remove(&tweet.id).unwrap_or_default();
                TweetWithTags::new(tweet, tagged_users)
            })
            .collect())
    }
}

/// Unions two tweet lists by ID and orders the result by descending ID
fn merge_newest_first(
    first: Vec<TweetWithAuthor>,
    second: Vec<TweetWithAuthor>,
) -> Vec<TweetWithAuthor> {
    let by_id: BTreeMap<i64, TweetWithAuthor> = first
        .into_iter()
        .chain(second)
        .map(|tweet| (tweet.id, tweet))
        .collect();

    by_id.into_values().rev().collect()
}
