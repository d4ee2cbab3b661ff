//! Keeps the user/craft favorite relation consistent.
//!
//! The relation is stored exactly once, in the `favorites` table; a user's
//! favorites and a craft's fans are both views over the same rows. A toggle
//! is therefore a single write, and the two directions cannot diverge.

use rusqlite::params;

use crate::db::models::Craft;
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

/// Add a craft to a user's favorites. Idempotent: favoriting the same
/// craft twice leaves the same single row.
pub fn add_favorite(pool: &DbPool, user_id: &str, craft_id: &str) -> AppResult<()> {
    let conn = pool.get()?;

    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM crafts WHERE id = ?1",
        params![craft_id],
        |row| row.get(0),
    )?;
    if !exists {
        return Err(AppError::NotFound);
    }

    conn.execute(
        "INSERT OR IGNORE INTO favorites (user_id, craft_id) VALUES (?1, ?2)",
        params![user_id, craft_id],
    )?;
    Ok(())
}

/// Remove a craft from a user's favorites. Removing an absent pair is a
/// no-op, per set semantics.
pub fn remove_favorite(pool: &DbPool, user_id: &str, craft_id: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "DELETE FROM favorites WHERE user_id = ?1 AND craft_id = ?2",
        params![user_id, craft_id],
    )?;
    Ok(())
}

/// The user's favorites resolved to full craft rows, oldest favorite first.
pub fn favorites_of(pool: &DbPool, user_id: &str) -> AppResult<Vec<Craft>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT c.id, c.title, c.category, c.description, c.materials, c.instructions, \
                c.image_url, c.created_by, c.created_at \
         FROM crafts c \
         JOIN favorites f ON f.craft_id = c.id \
         WHERE f.user_id = ?1 \
         ORDER BY f.created_at, c.id",
    )?;
    let crafts = stmt
        .query_map(params![user_id], |row| {
            Ok(Craft {
                id: row.get(0)?,
                title: row.get(1)?,
                category: row.get(2)?,
                description: row.get(3)?,
                materials: row.get(4)?,
                instructions: row.get(5)?,
                image_url: row.get(6)?,
                created_by: row.get(7)?,
                created_at: row.get(8)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(crafts)
}

/// Ids of the users who favorited a craft: the inverse view, computed by
/// query rather than materialized.
pub fn favorited_by(pool: &DbPool, craft_id: &str) -> AppResult<Vec<String>> {
    let conn = pool.get()?;
    let mut stmt =
        conn.prepare("SELECT user_id FROM favorites WHERE craft_id = ?1 ORDER BY created_at, user_id")?;
    let users = stmt
        .query_map(params![craft_id], |row| row.get(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

pub fn is_favorited(pool: &DbPool, user_id: &str, craft_id: &str) -> AppResult<bool> {
    let conn = pool.get()?;
    let favorited: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM favorites WHERE user_id = ?1 AND craft_id = ?2",
        params![user_id, craft_id],
        |row| row.get(0),
    )?;
    Ok(favorited)
}
