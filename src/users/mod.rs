//! Credential store: user rows keyed by unique username and email.
//!
//! The UNIQUE indexes on `users.username` and `users.email` are the source
//! of truth for uniqueness. Callers may pre-check with the finders for a
//! friendlier message, but a lost race still surfaces the right duplicate
//! error from the INSERT itself.

use rusqlite::{params, OptionalExtension, Row};

use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at";

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

pub fn find_by_username(pool: &DbPool, username: &str) -> AppResult<Option<User>> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn find_by_email(pool: &DbPool, email: &str) -> AppResult<Option<User>> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            params![email],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

pub fn find_by_id(pool: &DbPool, id: &str) -> AppResult<Option<User>> {
    let conn = pool.get()?;
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
            params![id],
            row_to_user,
        )
        .optional()?;
    Ok(user)
}

/// Insert a new user. A concurrent create that already claimed the username
/// or email loses here with the corresponding duplicate error.
pub fn create_user(
    pool: &DbPool,
    username: &str,
    email: &str,
    password_hash: &str,
) -> AppResult<User> {
    let conn = pool.get()?;
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO users (id, username, email, password_hash) VALUES (?1, ?2, ?3, ?4)",
        params![id, username, email, password_hash],
    )
    .map_err(map_unique_violation)?;

    let user = conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        row_to_user,
    )?;
    Ok(user)
}

fn map_unique_violation(err: rusqlite::Error) -> AppError {
    if let rusqlite::Error::SqliteFailure(e, Some(msg)) = &err {
        if e.code == rusqlite::ErrorCode::ConstraintViolation {
            if msg.contains("users.username") {
                return AppError::DuplicateUsername;
            }
            if msg.contains("users.email") {
                return AppError::DuplicateEmail;
            }
        }
    }
    AppError::Database(err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2d2::Pool;
    use r2d2_sqlite::SqliteConnectionManager;

    fn test_pool() -> DbPool {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        crate::db::run_migrations(&pool).unwrap();
        pool
    }

    #[test]
    fn create_and_find_round_trip() {
        let pool = test_pool();
        let created = create_user(&pool, "alice", "alice@example.com", "hash").unwrap();

        let by_username = find_by_username(&pool, "alice").unwrap().unwrap();
        assert_eq!(by_username.id, created.id);
        assert_eq!(by_username.email, "alice@example.com");

        let by_email = find_by_email(&pool, "alice@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, created.id);

        let by_id = find_by_id(&pool, &created.id).unwrap().unwrap();
        assert_eq!(by_id.username, "alice");
    }

    #[test]
    fn missing_user_finds_none() {
        let pool = test_pool();
        assert!(find_by_username(&pool, "ghost").unwrap().is_none());
        assert!(find_by_email(&pool, "ghost@example.com").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_maps_to_typed_error() {
        let pool = test_pool();
        create_user(&pool, "alice", "alice@example.com", "hash").unwrap();

        let err = create_user(&pool, "alice", "other@example.com", "hash").unwrap_err();
        assert!(matches!(err, AppError::DuplicateUsername));
    }

    #[test]
    fn duplicate_email_maps_to_typed_error() {
        let pool = test_pool();
        create_user(&pool, "alice", "alice@example.com", "hash").unwrap();

        let err = create_user(&pool, "bob", "alice@example.com", "hash").unwrap_err();
        assert!(matches!(err, AppError::DuplicateEmail));
    }
}
