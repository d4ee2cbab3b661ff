//! Craft post store and ownership.
//!
//! `created_by` is set once at creation and never reassigned; a user's
//! authored sequence is derived by query in creation order.

pub mod favorites;
pub mod handlers;

use rusqlite::{params, OptionalExtension, Row};

use crate::db::models::Craft;
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

const CRAFT_COLUMNS: &str =
    "id, title, category, description, materials, instructions, image_url, created_by, created_at";

fn row_to_craft(row: &Row) -> rusqlite::Result<Craft> {
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
}

/// Content fields for a new or edited craft.
#[derive(Debug, Default)]
pub struct CraftContent {
    pub title: String,
    pub category: String,
    pub description: String,
    pub materials: String,
    pub instructions: String,
    /// `None` means "no new image": creation stores no URL, edits keep the
    /// previously stored one.
    pub image_url: Option<String>,
}

pub fn create_craft(pool: &DbPool, content: &CraftContent, created_by: &str) -> AppResult<Craft> {
    let conn = pool.get()?;
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO crafts (id, title, category, description, materials, instructions, image_url, created_by) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            content.title,
            content.category,
            content.description,
            content.materials,
            content.instructions,
            content.image_url,
            created_by
        ],
    )?;

    let craft = conn.query_row(
        &format!("SELECT {CRAFT_COLUMNS} FROM crafts WHERE id = ?1"),
        params![id],
        row_to_craft,
    )?;
    Ok(craft)
}

pub fn find_craft(pool: &DbPool, id: &str) -> AppResult<Option<Craft>> {
    let conn = pool.get()?;
    let craft = conn
        .query_row(
            &format!("SELECT {CRAFT_COLUMNS} FROM crafts WHERE id = ?1"),
            params![id],
            row_to_craft,
        )
        .optional()?;
    Ok(craft)
}

pub fn list_by_category(pool: &DbPool, category: &str) -> AppResult<Vec<Craft>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {CRAFT_COLUMNS} FROM crafts WHERE category = ?1 ORDER BY created_at DESC, id DESC"
    ))?;
    let crafts = stmt
        .query_map(params![category], row_to_craft)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(crafts)
}

/// Case-insensitive substring match on the title.
pub fn search_by_title(pool: &DbPool, term: &str) -> AppResult<Vec<Craft>> {
    let conn = pool.get()?;
    let pattern = format!(
        "%{}%",
        term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
    );
    let mut stmt = conn.prepare(&format!(
        "SELECT {CRAFT_COLUMNS} FROM crafts WHERE title LIKE ?1 ESCAPE '\\' ORDER BY created_at DESC, id DESC"
    ))?;
    let crafts = stmt
        .query_map(params![pattern], row_to_craft)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(crafts)
}

/// A user's authored crafts, in creation order.
pub fn crafts_created_by(pool: &DbPool, user_id: &str) -> AppResult<Vec<Craft>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {CRAFT_COLUMNS} FROM crafts WHERE created_by = ?1 ORDER BY created_at, id"
    ))?;
    let crafts = stmt
        .query_map(params![user_id], row_to_craft)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(crafts)
}

/// Update a craft's content. Only the owner may edit; an absent image
/// keeps the stored URL.
pub fn update_craft(
    pool: &DbPool,
    id: &str,
    owner_id: &str,
    content: &CraftContent,
) -> AppResult<Craft> {
    let conn = pool.get()?;
    require_owner(&conn, id, owner_id)?;

    conn.execute(
        "UPDATE crafts SET title = ?1, category = ?2, description = ?3, materials = ?4, \
         instructions = ?5, image_url = COALESCE(?6, image_url) WHERE id = ?7",
        params![
            content.title,
            content.category,
            content.description,
            content.materials,
            content.instructions,
            content.image_url,
            id
        ],
    )?;

    let craft = conn.query_row(
        &format!("SELECT {CRAFT_COLUMNS} FROM crafts WHERE id = ?1"),
        params![id],
        row_to_craft,
    )?;
    Ok(craft)
}

/// Delete a craft. Only the owner may delete. The favorites rows pointing
/// at the craft go in the same transaction, so no user is left holding a
/// dangling favorite.
pub fn delete_craft(pool: &DbPool, id: &str, owner_id: &str) -> AppResult<()> {
    let mut conn = pool.get()?;
    let tx = conn.transaction()?;

    let created_by: Option<String> = tx
        .query_row(
            "SELECT created_by FROM crafts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    let created_by = created_by.ok_or(AppError::NotFound)?;
    if created_by != owner_id {
        return Err(AppError::Unauthenticated);
    }

    tx.execute("DELETE FROM favorites WHERE craft_id = ?1", params![id])?;
    tx.execute("DELETE FROM crafts WHERE id = ?1", params![id])?;
    tx.commit()?;
    Ok(())
}

fn require_owner(conn: &rusqlite::Connection, id: &str, owner_id: &str) -> AppResult<()> {
    let created_by: Option<String> = conn
        .query_row(
            "SELECT created_by FROM crafts WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;
    let created_by = created_by.ok_or(AppError::NotFound)?;
    if created_by != owner_id {
        return Err(AppError::Unauthenticated);
    }
    Ok(())
}
