use rand::Rng;
use rusqlite::{params, OptionalExtension};

use crate::error::AppResult;
use crate::state::DbPool;

/// Create a new session for a user. Returns the session token.
/// The session row carries only the user id; whoever validates the token
/// re-fetches the user for current data.
pub fn create_session(pool: &DbPool, user_id: &str, hours: u64) -> AppResult<String> {
    let conn = pool.get()?;

    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Resolve a token to the owning user id. Expired sessions never validate.
pub fn validate_session(pool: &DbPool, token: &str) -> AppResult<Option<String>> {
    let conn = pool.get()?;
    let user_id = conn
        .query_row(
            "SELECT user_id FROM sessions WHERE token = ?1 AND expires_at > datetime('now')",
            params![token],
            |row| row.get(0),
        )
        .optional()?;
    Ok(user_id)
}

/// Destroy a session by token. A store failure propagates to the caller;
/// only a successful delete may be reported as "logged out".
pub fn destroy_session(pool: &DbPool, token: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
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

    fn seed_user(pool: &DbPool, id: &str) {
        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (id, username, email, password_hash) VALUES (?1, ?1, ?1, 'h')",
            params![id],
        )
        .unwrap();
    }

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn create_then_validate_resolves_user_id() {
        let pool = test_pool();
        seed_user(&pool, "u1");

        let token = create_session(&pool, "u1", 1).unwrap();
        let resolved = validate_session(&pool, &token).unwrap();
        assert_eq!(resolved.as_deref(), Some("u1"));
    }

    #[test]
    fn destroyed_session_no_longer_validates() {
        let pool = test_pool();
        seed_user(&pool, "u1");

        let token = create_session(&pool, "u1", 1).unwrap();
        destroy_session(&pool, &token).unwrap();
        assert!(validate_session(&pool, &token).unwrap().is_none());
    }

    #[test]
    fn expired_session_does_not_validate() {
        let pool = test_pool();
        seed_user(&pool, "u1");

        let conn = pool.get().unwrap();
        conn.execute(
            "INSERT INTO sessions (id, user_id, token, expires_at) VALUES ('s1', 'u1', 'stale', datetime('now', '-1 hours'))",
            [],
        )
        .unwrap();
        drop(conn);

        assert!(validate_session(&pool, "stale").unwrap().is_none());
    }

    #[test]
    fn unknown_token_does_not_validate() {
        let pool = test_pool();
        assert!(validate_session(&pool, "nope").unwrap().is_none());
    }

    #[test]
    fn multiple_sessions_per_user_coexist() {
        let pool = test_pool();
        seed_user(&pool, "u1");

        let t1 = create_session(&pool, "u1", 1).unwrap();
        let t2 = create_session(&pool, "u1", 1).unwrap();
        assert_ne!(t1, t2);
        assert!(validate_session(&pool, &t1).unwrap().is_some());
        assert!(validate_session(&pool, &t2).unwrap().is_some());

        // Destroying one leaves the other intact
        destroy_session(&pool, &t1).unwrap();
        assert!(validate_session(&pool, &t1).unwrap().is_none());
        assert!(validate_session(&pool, &t2).unwrap().is_some());
    }
}
