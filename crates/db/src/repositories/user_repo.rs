//! Repository for the `users` table.

use ccw_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::user::{CreateUser, User};

const COLUMNS: &str = "id, username, email, password_hash, is_staff, is_superuser, is_active, \
                        last_login_at, failed_login_count, locked_until, created_at, updated_at";

const INSERT: &str = "INSERT INTO users (username, email, password_hash, is_staff, is_superuser) \
                      VALUES ($1, $2, $3, $4, $5)";

/// Account storage and login bookkeeping.
pub struct UserRepo;

impl UserRepo {
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!("{INSERT} RETURNING {COLUMNS}");
        bind_insert(sqlx::query_as::<_, User>(&query), input)
            .fetch_one(pool)
            .await
    }

    /// Insert unless the username is taken; `None` means it already existed.
    pub async fn create_if_absent(
        pool: &PgPool,
        input: &CreateUser,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!(
            "{INSERT} ON CONFLICT ON CONSTRAINT uq_users_username DO NOTHING RETURNING {COLUMNS}"
        );
        bind_insert(sqlx::query_as::<_, User>(&query), input)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE id = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Usernames compare case-sensitively.
    pub async fn find_by_username(
        pool: &PgPool,
        username: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE username = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(pool)
            .await
    }

    /// Every account, newest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users ORDER BY created_at DESC, id DESC");
        sqlx::query_as::<_, User>(&query).fetch_all(pool).await
    }

    /// Count a bad password and, once the count reaches `lock_after`, lock
    /// the account until `lock_until`.
    ///
    /// Both happen in one statement so concurrent failures cannot skip the
    /// lock. Returns the new failure count and the lock, if one is set.
    pub async fn record_failed_login(
        pool: &PgPool,
        id: DbId,
        lock_after: i32,
        lock_until: Timestamp,
    ) -> Result<(i32, Option<Timestamp>), sqlx::Error> {
        sqlx::query_as(
            "UPDATE users SET
                failed_login_count = failed_login_count + 1,
                locked_until = CASE
                    WHEN failed_login_count + 1 >= $2 THEN $3
                    ELSE locked_until
                END
             WHERE id = $1
             RETURNING failed_login_count, locked_until",
        )
        .bind(id)
        .bind(lock_after)
        .bind(lock_until)
        .fetch_one(pool)
        .await
    }

    /// Clear failure tracking and stamp `last_login_at`.
    pub async fn record_successful_login(pool: &PgPool, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE users
             SET failed_login_count = 0, locked_until = NULL, last_login_at = NOW()
             WHERE id = $1",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(())
    }
}

type UserQuery<'q> = sqlx::query::QueryAs<'q, sqlx::Postgres, User, sqlx::postgres::PgArguments>;

fn bind_insert<'q>(query: UserQuery<'q>, input: &'q CreateUser) -> UserQuery<'q> {
    query
        .bind(&input.username)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.is_staff)
        .bind(input.is_superuser)
}

