//! # Warbler Shared Library
//!
//! Domain logic for the Warbler microblogging backend: accounts, tweets,
//! `@mention` tagging and feeds. The HTTP server in `warbler-api` is a thin
//! layer over the services defined here.
//!
//! ## Module Organization
//!
//! - `models`: users, tweets and tag associations, with their SQL queries
//! - `store`: storage abstraction with PostgreSQL and in-memory backends
//! - `auth`: password hashing, session tokens and the bearer middleware
//! - `credentials`: registration and login
//! - `tagging`: mention extraction, resolution and association
//! - `tweets`: atomic tweet creation
//! - `feed`: tweet listings and the personal feed
//! - `db`: connection pool, migrations and demo data

pub mod auth;
pub mod credentials;
pub mod db;
pub mod feed;
pub mod models;
pub mod store;
pub mod tagging;
pub mod tweets;

/// Current version of the Warbler shared library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
