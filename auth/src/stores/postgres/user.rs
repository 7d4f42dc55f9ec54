//! PostgreSQL user repository implementation.
//!
//! Reads and writes the `users` table created by `migrations/`. Every write
//! runs in its own transaction at `SERIALIZABLE` isolation. Dropping the
//! transaction on an error path rolls it back, so partial writes are never
//! committed.
//!
//! # Example
//!
//! ```no_run
//! use orchid_auth::stores::postgres::PostgresUserRepository;
//! use sqlx::postgres::PgPoolOptions;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPoolOptions::new()
//!     .acquire_timeout(Duration::from_secs(2))
//!     .connect("postgresql://localhost/orchid")
//!     .await?;
//! let repo = PostgresUserRepository::new(pool);
//! repo.migrate().await?;
//! # Ok(())
//! # }
//! ```

use crate::error::{AuthError, ConflictField, Result};
use crate::providers::{NewUser, User, UserRepository};
use crate::state::UserId;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

const USER_COLUMNS: &str = "id, username, email, alias, deregistered, created_at, updated_at";

/// SQLSTATE for `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";

/// PostgreSQL user repository.
#[derive(Clone)]
pub struct PostgresUserRepository {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Create a new PostgreSQL user repository.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run database migrations.
    ///
    /// # Errors
    ///
    /// Returns error if migrations fail.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AuthError::ServiceUnavailable(format!("migration failed: {e}")))?;
        Ok(())
    }

    async fn begin_serializable(&self) -> Result<Transaction<'static, Postgres>> {
        let mut tx = self.pool.begin().await.map_err(map_db_error)?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        Ok(tx)
    }

    /// Single-column update of an active user.
    async fn update_column(&self, id: UserId, sql: &str, value: &str) -> Result<()> {
        let mut tx = self.begin_serializable().await?;

        let result = sqlx::query(sql)
            .bind(value)
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }

        tx.commit().await.map_err(map_db_error)
    }
}

fn user_from_row(row: &PgRow) -> std::result::Result<User, sqlx::Error> {
    Ok(User {
        id: UserId(row.try_get("id")?),
        username: row.try_get("username")?,
        email: row.try_get("email")?,
        alias: row.try_get("alias")?,
        deregistered: row.try_get("deregistered")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Map a driver error onto the auth taxonomy.
fn map_db_error(e: sqlx::Error) -> AuthError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or_default();
            let field = if constraint.contains("username") {
                ConflictField::Username
            } else {
                ConflictField::Email
            };
            return AuthError::AlreadyInUse(field);
        }
        if db_err.code().as_deref() == Some(SERIALIZATION_FAILURE) {
            tracing::warn!(error = %db_err, "Serializable transaction aborted");
            return AuthError::ServiceUnavailable("concurrent update, retry".to_string());
        }
    }

    tracing::error!(error = %e, "Database operation failed");
    AuthError::ServiceUnavailable(format!("database error: {e}"))
}

impl UserRepository for PostgresUserRepository {
    async fn find_active_by_email(&self, email: &str) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deregistered = false");

        let row = sqlx::query(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(map_db_error)
    }

    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");

        let row = sqlx::query(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        row.as_ref()
            .map(user_from_row)
            .transpose()
            .map_err(map_db_error)
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)
    }

    async fn upsert(&self, user: &NewUser) -> Result<UserId> {
        let mut tx = self.begin_serializable().await?;

        let id: i32 = sqlx::query_scalar(
            r"
            INSERT INTO users (email, username, alias)
            VALUES ($1, $2, $3)
            ON CONFLICT (email)
            DO UPDATE SET username = EXCLUDED.username, alias = EXCLUDED.alias, deregistered = false
            RETURNING id
            ",
        )
        .bind(&user.email)
        .bind(&user.username)
        .bind(&user.alias)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        tracing::info!(user_id = id, "User upserted");

        Ok(UserId(id))
    }

    async fn update_username(&self, id: UserId, username: &str) -> Result<()> {
        self.update_column(
            id,
            "UPDATE users SET username = $1 WHERE id = $2 AND deregistered = false",
            username,
        )
        .await
    }

    async fn update_email(&self, id: UserId, email: &str) -> Result<()> {
        self.update_column(
            id,
            "UPDATE users SET email = $1 WHERE id = $2 AND deregistered = false",
            email,
        )
        .await
    }

    async fn deregister(&self, id: UserId) -> Result<()> {
        let mut tx = self.begin_serializable().await?;

        let deregistered: Option<bool> =
            sqlx::query_scalar("SELECT deregistered FROM users WHERE id = $1 FOR UPDATE")
                .bind(id.0)
                .fetch_optional(&mut *tx)
                .await
                .map_err(map_db_error)?;

        match deregistered {
            None => return Err(AuthError::UserNotFound),
            Some(true) => return Err(AuthError::AlreadyDeregistered),
            Some(false) => {}
        }

        sqlx::query("UPDATE users SET deregistered = true WHERE id = $1")
            .bind(id.0)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        tracing::info!(user_id = id.0, "User deregistered");

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)] // Test code
mod tests {
    use super::*;

    async fn repo() -> PostgresUserRepository {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgresql://localhost/orchid_test".to_string());
        let pool = PgPool::connect(&url).await.expect("Failed to connect");
        let repo = PostgresUserRepository::new(pool);
        repo.migrate().await.expect("Failed to migrate");
        repo
    }

    fn unique(prefix: &str) -> String {
        format!("{prefix}{}", &uuid::Uuid::new_v4().simple().to_string()[..12])
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL (DATABASE_URL)
    async fn test_upsert_reactivates_deregistered_user() {
        let repo = repo().await;
        let email = format!("{}@example.com", unique("u"));

        let id = repo
            .upsert(&NewUser {
                email: email.clone(),
                username: unique("a"),
                alias: "Al".into(),
            })
            .await
            .unwrap();

        repo.deregister(id).await.unwrap();
        assert_eq!(repo.deregister(id).await, Err(AuthError::AlreadyDeregistered));
        assert!(repo.find_active_by_email(&email).await.unwrap().is_none());

        let again = repo
            .upsert(&NewUser {
                email: email.clone(),
                username: unique("b"),
                alias: "Bo".into(),
            })
            .await
            .unwrap();

        assert_eq!(again, id);
        let user = repo.find_active_by_email(&email).await.unwrap().unwrap();
        assert_eq!(user.alias.as_deref(), Some("Bo"));
        assert!(!user.deregistered);
    }

    #[tokio::test]
    #[ignore] // Requires PostgreSQL (DATABASE_URL)
    async fn test_username_conflict_is_already_in_use() {
        let repo = repo().await;
        let taken = unique("t");

        repo.upsert(&NewUser {
            email: format!("{}@example.com", unique("x")),
            username: taken.clone(),
            alias: "X".into(),
        })
        .await
        .unwrap();

        let other = repo
            .upsert(&NewUser {
                email: format!("{}@example.com", unique("y")),
                username: unique("y"),
                alias: "Y".into(),
            })
            .await
            .unwrap();

        assert!(repo.username_taken(&taken).await.unwrap());
        assert_eq!(
            repo.update_username(other, &taken).await,
            Err(AuthError::AlreadyInUse(ConflictField::Username))
        );
    }
}
