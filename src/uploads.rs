//! Image intake for the add/edit forms.
//!
//! Stand-in for an external object store: uploaded files land in the
//! configured uploads directory and the handler receives the resulting
//! public URL. A form posted without a file yields `image_url: None`,
//! which edits interpret as "keep the stored image".

use std::path::Path;

use axum::extract::Multipart;

use crate::crafts::CraftContent;
use crate::error::{AppError, AppResult};

/// Fields carried by the multipart add/edit craft forms.
#[derive(Debug, Default)]
pub struct CraftForm {
    /// Present on edit submissions only.
    pub id: String,
    pub content: CraftContent,
}

pub async fn read_craft_form(mut multipart: Multipart, uploads_dir: &Path) -> AppResult<CraftForm> {
    let mut form = CraftForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "image" => {
                // Browsers post the part even when no file was chosen;
                // an empty filename or empty body means "no new image".
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid upload: {e}")))?;
                if !file_name.is_empty() && !data.is_empty() {
                    form.content.image_url = Some(store_image(uploads_dir, &file_name, &data)?);
                }
            }
            "id" => form.id = read_text(field).await?,
            "title" => form.content.title = read_text(field).await?,
            "category" => form.content.category = read_text(field).await?,
            "description" => form.content.description = read_text(field).await?,
            "materials" => form.content.materials = read_text(field).await?,
            "instructions" => form.content.instructions = read_text(field).await?,
            _ => {}
        }
    }

    Ok(form)
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid form data: {e}")))
}

/// Write the bytes under a fresh name and return the public URL.
pub fn store_image(uploads_dir: &Path, original_name: &str, data: &[u8]) -> AppResult<String> {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| e.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or("bin");

    let name = format!("{}.{}", uuid::Uuid::now_v7(), ext);
    let path = uploads_dir.join(&name);
    std::fs::write(&path, data)
        .map_err(|e| AppError::Internal(format!("Failed to store upload: {e}")))?;

    Ok(format!("/uploads/{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_image_writes_file_and_returns_url() {
        let tmp = tempfile::tempdir().unwrap();
        let url = store_image(tmp.path(), "photo.jpg", b"fake-jpeg-bytes").unwrap();

        assert!(url.starts_with("/uploads/"));
        assert!(url.ends_with(".jpg"));

        let file_name = url.strip_prefix("/uploads/").unwrap();
        let stored = std::fs::read(tmp.path().join(file_name)).unwrap();
        assert_eq!(stored, b"fake-jpeg-bytes");
    }

    #[test]
    fn store_image_falls_back_for_odd_extensions() {
        let tmp = tempfile::tempdir().unwrap();
        let url = store_image(tmp.path(), "weird.name.../.", b"data").unwrap();
        assert!(url.ends_with(".bin"));
    }

    #[test]
    fn stored_names_are_unique() {
        let tmp = tempfile::tempdir().unwrap();
        let a = store_image(tmp.path(), "a.png", b"one").unwrap();
        let b = store_image(tmp.path(), "a.png", b"two").unwrap();
        assert_ne!(a, b);
    }
}
