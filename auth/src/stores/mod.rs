//! Storage implementations for the auth system.
//!
//! - **Cache** (Redis) - verification codes and live sessions with TTL
//! - **User Repository** (PostgreSQL) - persistent user accounts

#[cfg(feature = "postgres")]
pub mod postgres;
pub mod redis_cache;

// Re-exports
#[cfg(feature = "postgres")]
pub use postgres::PostgresUserRepository;
pub use redis_cache::RedisCache;
