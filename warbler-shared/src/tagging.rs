//! Mention tagging
//!
//! Turns `@handle` tokens in tweet text into tag associations. The three
//! steps run inside the tweet creation transaction:
//!
//! 1. [`extract_mentions`] finds candidate handles in the text
//! 2. [`resolve_mentions`] maps handles to user IDs in one batch lookup,
//!    dropping unknown handles and the author
//! 3. [`tag`] bulk-inserts one association per resolved user
//!
//! A handle is whatever follows the `@` up to the next whitespace. No
//! character-class rules are applied, so `@bob,` looks up the username
//! `bob,` and simply resolves to nobody.

use std::collections::HashSet;

use tracing::debug;

use crate::models::tag::TagAssociation;
use crate::store::{StoreResult, StoreTransaction};

/// Extracts the distinct mention handles of `content`, in order of first use
///
/// # Example
///
/// ```
/// use warbler_shared::tagging::extract_mentions;
///
/// let handles = extract_mentions("hi @bob and @carol, bye @bob");
/// assert_eq!(handles, vec!["bob", "carol,"]);
/// ```
pub fn extract_mentions(content: &str) -> Vec<String> {
    let mut seen = HashSet::new();

    content
        .split_whitespace()
        .filter_map(|token| token.strip_prefix('@'))
        .filter(|handle| !handle.is_empty())
        .filter(|handle| seen.insert(*handle))
        .map(str::to_string)
        .collect()
}

/// Resolves handles to the IDs of existing users other than the author
///
/// Unknown handles are not an error; they resolve to nothing. Issues no
/// query when `handles` is empty.
pub async fn resolve_mentions(
    tx: &mut dyn StoreTransaction,
    handles: &[String],
    author_id: i64,
) -> StoreResult<Vec<i64>> {
    if handles.is_empty() {
        return Ok(Vec::new());
    }

    let user_ids = tx.find_user_ids_by_usernames(handles, author_id).await?;

    debug!(
        mentioned = handles.len(),
        resolved = user_ids.len(),
        "Resolved mentions"
    );
    Ok(user_ids)
}

/// Creates one tag association per user for `tweet_id`
///
/// No-op for an empty `user_ids`.
pub async fn tag(
    tx: &mut dyn StoreTransaction,
    tweet_id: i64,
    user_ids: &[i64],
) -> StoreResult<Vec<TagAssociation>> {
    if user_ids.is_empty() {
        return Ok(Vec::new());
    }

    tx.insert_tags(tweet_id, user_ids).await
}
