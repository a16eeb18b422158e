/// Demo data for local runs
///
/// Registers `alice`, `bob`, `chris` and `dan` (password `<name>@password`)
/// and gives each new account two plain tweets plus one tweet tagging every
/// other demo user. Everything goes through the regular services, so
/// passwords are hashed and mentions are tagged exactly as for real traffic.
///
/// Seeding is idempotent: accounts that already exist are left alone and get
/// no new tweets.

use tracing::info;

use crate::credentials::{CredentialError, CredentialService, Registration};
use crate::models::user::User;
use crate::store::StoreError;
use crate::tweets::TweetService;

/// Usernames of the demo accounts, in creation order
pub const DEMO_USERNAMES: [&str; 4] = ["alice", "bob", "chris", "dan"];

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("Failed to register demo user: {0}")]
    Credentials(#[from] CredentialError),

    #[error("Failed to create demo tweet: {0}")]
    Store(#[from] StoreError),
}

/// What a seeding run added
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub users_created: usize,
    pub users_skipped: usize,
    pub tweets_created: usize,
}

/// Seeds the demo accounts and their tweets
pub async fn seed_demo_data(
    credentials: &CredentialService,
    tweets: &TweetService,
) -> Result<SeedReport, SeedError> {
    let mut report = SeedReport::default();
    let mut created: Vec<User> = Vec::new();

    for name in DEMO_USERNAMES {
        let outcome = credentials
            .register_if_available(name, &format!("{name}@example.org"), &format!("{name}@password"))
            .await?;

        match outcome {
            Registration::Created(user) => {
                report.users_created += 1;
                created.push(user);
            }
            Registration::Conflict => report.users_skipped += 1,
        }
    }

    // Tweets go in after every account exists so all mentions resolve.
    for user in &created {
        for content in demo_tweets(&user.username) {
            tweets.create_tweet(user.id, &content).await?;
            report.tweets_created += 1;
        }
    }

    info!(
        users_created = report.users_created,
        users_skipped = report.users_skipped,
        tweets_created = report.tweets_created,
        "Seeded demo data"
    );
    Ok(report)
}

fn demo_tweets(username: &str) -> Vec<String> {
    let mut contents = vec![
        format!("First tweet from {username}"),
        format!("Second tweet from {username}"),
    ];
    contents.extend(
        DEMO_USERNAMES
            .iter()
            .filter(|other| **other != username)
            .map(|other| format!("Tweet from {username} tagging @{other}")),
    );
    contents
}
