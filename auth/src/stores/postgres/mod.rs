//! PostgreSQL storage implementations.
//!
//! The relational store owns user accounts only; verification codes and
//! sessions live in the cache.

pub mod user;

// Re-exports
pub use user::PostgresUserRepository;
