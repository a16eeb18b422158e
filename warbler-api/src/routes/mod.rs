/// API route handlers
///
/// This module contains all route handlers organized by resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login and the current user
/// - `tweets`: Tweet creation, listings and the personal feed

pub mod auth;
pub mod health;
pub mod tweets;
