/// Tweet endpoints
///
/// Every endpoint requires a bearer token; the author of a new tweet and the
/// owner of the feed are always the token holder.
///
/// # Endpoints
///
/// - `GET /v1/tweets` - All tweets with their author, newest first
/// - `POST /v1/tweets` - Create a tweet, tagging mentioned users
/// - `GET /v1/my-feed` - Tweets by or tagging the caller, newest first
/// - `GET /v1/users/:id/tweets` - Tweets by one user, with tag associations

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::debug;
use validator::Validate;
use warbler_shared::{
    auth::middleware::AuthContext,
    models::tweet::{Tweet, TweetWithAuthor, TweetWithTags},
};

use crate::{app::AppState, error::ApiResult};

/// Create tweet request
#[derive(Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct CreateTweetRequest {
    /// Tweet text; `@username` tokens tag other users
    #[validate(length(min = 1, max = 280, message = "Content must be 1 to 280 characters"))]
    pub content: String,
}

/// Lists every tweet
pub async fn list_tweets(State(state): State<AppState>) -> ApiResult<Json<Vec<TweetWithAuthor>>> {
    Ok(Json(state.feed.list_all_tweets().await?))
}

/// Create a tweet
///
/// # Endpoint
///
/// ```text
/// POST /v1/tweets
/// Authorization: Bearer eyJ...
/// Content-Type: application/json
///
/// { "content": "lunch with @bob?" }
/// ```
///
/// # Response
///
/// `201 Created` with the stored tweet. Tag associations are written in the
/// same transaction but not echoed back.
///
/// # Errors
///
/// - `422 Unprocessable Entity`: Content empty or longer than 280 characters
/// - `500 Internal Server Error`: Storage failure; nothing was written
pub async fn create_tweet(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateTweetRequest>,
) -> ApiResult<(StatusCode, Json<Tweet>)> {
    req.validate()?;

    let tweet = state.tweets.create_tweet(auth.user_id, &req.content).await?;
    Ok((StatusCode::CREATED, Json(tweet)))
}

/// Feed of the caller
pub async fn my_feed(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<TweetWithAuthor>>> {
    let feed = state.feed.compose_feed(auth.user_id).await?;
    debug!(user_id = auth.user_id, tweets = feed.len(), "Served feed");
    Ok(Json(feed))
}

/// Tweets written by user `id`; empty for an unknown user
pub async fn user_tweets(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<TweetWithTags>>> {
    Ok(Json(state.feed.list_user_tweets(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_length_is_counted_in_characters() {
        let emoji = CreateTweetRequest {
            content: "🐦".repeat(280),
        };
        assert!(emoji.validate().is_ok());

        let too_long = CreateTweetRequest {
            content: "🐦".repeat(281),
        };
        assert!(too_long.validate().is_err());

        let empty = CreateTweetRequest {
            content: String::new(),
        };
        assert!(empty.validate().is_err());
    }
}
