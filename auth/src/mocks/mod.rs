//! Mock provider implementations for testing.
//!
//! Simple, in-memory implementations of all provider traits for use in unit
//! and integration tests. Every mock is `Clone` with shared state, and offers
//! switches to simulate an unreachable backend.

pub mod cache;
pub mod email;
pub mod storage;
pub mod user;

pub use cache::MockCache;
pub use email::{MockEmailProvider, SentEmail};
pub use storage::MockStorageProvider;
pub use user::MockUserRepository;
