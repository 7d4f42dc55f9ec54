//! Mock user repository for testing.

use crate::error::{AuthError, ConflictField, Result};
use crate::providers::{NewUser, User, UserRepository};
use crate::state::UserId;
use chrono::Utc;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Mock user repository.
///
/// In-memory table with the same unique constraints as the `users` table.
/// Ids are assigned sequentially from 1.
#[derive(Debug, Clone, Default)]
pub struct MockUserRepository {
    users: Arc<Mutex<BTreeMap<i32, User>>>,
    unavailable: Arc<AtomicBool>,
}

type Table<'a> = MutexGuard<'a, BTreeMap<i32, User>>;

impl MockUserRepository {
    /// Create an empty mock user repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with `ServiceUnavailable` until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Snapshot of the row with `email`, deregistered or not.
    #[must_use]
    pub fn by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .find(|user| user.email == email)
            .cloned()
    }

    /// Number of rows.
    #[must_use]
    pub fn count(&self) -> usize {
        self.users.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn table<'a>(users: &'a Mutex<BTreeMap<i32, User>>, unavailable: &AtomicBool) -> Result<Table<'a>> {
        if unavailable.load(Ordering::SeqCst) {
            return Err(AuthError::ServiceUnavailable("mock database offline".to_string()));
        }
        users
            .lock()
            .map_err(|_| AuthError::Internal("Mutex lock failed".to_string()))
    }
}

fn taken_by_other(table: &Table<'_>, id: i32, field: ConflictField, value: &str) -> bool {
    table.values().any(|user| {
        user.id.0 != id
            && match field {
                ConflictField::Email => user.email == value,
                ConflictField::Username => user.username == value,
            }
    })
}

fn active_mut<'a>(table: &'a mut Table<'_>, id: UserId) -> Result<&'a mut User> {
    table
        .get_mut(&id.0)
        .filter(|user| !user.deregistered)
        .ok_or(AuthError::UserNotFound)
}

impl UserRepository for MockUserRepository {
    fn find_active_by_email(&self, email: &str) -> impl Future<Output = Result<Option<User>>> + Send {
        let users = Arc::clone(&self.users);
        let unavailable = Arc::clone(&self.unavailable);
        let email = email.to_string();

        async move {
            let table = Self::table(&users, &unavailable)?;
            Ok(table
                .values()
                .find(|user| user.email == email && !user.deregistered)
                .cloned())
        }
    }

    fn find_by_id(&self, id: UserId) -> impl Future<Output = Result<Option<User>>> + Send {
        let users = Arc::clone(&self.users);
        let unavailable = Arc::clone(&self.unavailable);

        async move {
            let table = Self::table(&users, &unavailable)?;
            Ok(table.get(&id.0).cloned())
        }
    }

    fn username_taken(&self, username: &str) -> impl Future<Output = Result<bool>> + Send {
        let users = Arc::clone(&self.users);
        let unavailable = Arc::clone(&self.unavailable);
        let username = username.to_string();

        async move {
            let table = Self::table(&users, &unavailable)?;
            Ok(table.values().any(|user| user.username == username))
        }
    }

    fn upsert(&self, user: &NewUser) -> impl Future<Output = Result<UserId>> + Send {
        let users = Arc::clone(&self.users);
        let unavailable = Arc::clone(&self.unavailable);
        let new = user.clone();

        async move {
            let mut table = Self::table(&users, &unavailable)?;
            let now = Utc::now();

            let existing = table
                .values()
                .find(|user| user.email == new.email)
                .map(|user| user.id.0);

            let id = existing.unwrap_or_else(|| table.keys().next_back().map_or(1, |last| last + 1));

            if taken_by_other(&table, id, ConflictField::Username, &new.username) {
                return Err(AuthError::AlreadyInUse(ConflictField::Username));
            }

            match table.get_mut(&id) {
                Some(row) => {
                    row.username = new.username;
                    row.alias = Some(new.alias);
                    row.deregistered = false;
                    row.updated_at = now;
                }
                None => {
                    table.insert(
                        id,
                        User {
                            id: UserId(id),
                            username: new.username,
                            email: new.email,
                            alias: Some(new.alias),
                            deregistered: false,
                            created_at: now,
                            updated_at: now,
                        },
                    );
                }
            }

            Ok(UserId(id))
        }
    }

    fn update_username(&self, id: UserId, username: &str) -> impl Future<Output = Result<()>> + Send {
        let users = Arc::clone(&self.users);
        let unavailable = Arc::clone(&self.unavailable);
        let username = username.to_string();

        async move {
            let mut table = Self::table(&users, &unavailable)?;
            if taken_by_other(&table, id.0, ConflictField::Username, &username) {
                return Err(AuthError::AlreadyInUse(ConflictField::Username));
            }
            let row = active_mut(&mut table, id)?;
            row.username = username;
            row.updated_at = Utc::now();
            Ok(())
        }
    }

    fn update_email(&self, id: UserId, email: &str) -> impl Future<Output = Result<()>> + Send {
        let users = Arc::clone(&self.users);
        let unavailable = Arc::clone(&self.unavailable);
        let email = email.to_string();

        async move {
            let mut table = Self::table(&users, &unavailable)?;
            if taken_by_other(&table, id.0, ConflictField::Email, &email) {
                return Err(AuthError::AlreadyInUse(ConflictField::Email));
            }
            let row = active_mut(&mut table, id)?;
            row.email = email;
            row.updated_at = Utc::now();
            Ok(())
        }
    }

    fn deregister(&self, id: UserId) -> impl Future<Output = Result<()>> + Send {
        let users = Arc::clone(&self.users);
        let unavailable = Arc::clone(&self.unavailable);

        async move {
            let mut table = Self::table(&users, &unavailable)?;
            let row = table.get_mut(&id.0).ok_or(AuthError::UserNotFound)?;
            if row.deregistered {
                return Err(AuthError::AlreadyDeregistered);
            }
            row.deregistered = true;
            row.updated_at = Utc::now();
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn new_user(email: &str, username: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            username: username.to_string(),
            alias: "Al".to_string(),
        }
    }

    #[tokio::test]
    async fn test_upsert_reuses_row_for_same_email() {
        let repo = MockUserRepository::new();
        let first = repo.upsert(&new_user("a@example.com", "a")).await.unwrap();
        repo.deregister(first).await.unwrap();

        let second = repo.upsert(&new_user("a@example.com", "a2")).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(repo.count(), 1);
        assert!(!repo.by_email("a@example.com").unwrap().deregistered);
    }

    #[tokio::test]
    async fn test_unique_username() {
        let repo = MockUserRepository::new();
        repo.upsert(&new_user("a@example.com", "a")).await.unwrap();

        assert_eq!(
            repo.upsert(&new_user("b@example.com", "a")).await,
            Err(AuthError::AlreadyInUse(ConflictField::Username))
        );
    }

    #[tokio::test]
    async fn test_deregister_twice() {
        let repo = MockUserRepository::new();
        let id = repo.upsert(&new_user("a@example.com", "a")).await.unwrap();

        repo.deregister(id).await.unwrap();
        assert_eq!(repo.deregister(id).await, Err(AuthError::AlreadyDeregistered));
    }
}
