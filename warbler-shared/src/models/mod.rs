/// Database models for Warbler
///
/// This module contains the persisted entities and the SQL the PostgreSQL
/// store runs for each of them. Relationships are explicit: tweets carry an
/// `author_id`, and mentions live in the `tagged_users` join table.
///
/// # Models
///
/// - `user`: registered accounts and the author summary projection
/// - `tweet`: tweets plus the author/tag joined views
/// - `tag`: tweet-mentions-user associations

pub mod tag;
pub mod tweet;
pub mod user;
