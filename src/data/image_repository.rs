use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::AppError;
use crate::models::image::{ImageMetadata, ImageRow, NewImage};

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<(ImageRow, Option<String>)> {
    let metadata_json: Option<String> = row.get(9)?;
    Ok((
        ImageRow {
            id: row.get(0)?,
            user_id: row.get(1)?,
            image_uri: row.get(2)?,
            filename: row.get(3)?,
            file_size: row.get(4)?,
            width: row.get(5)?,
            height: row.get(6)?,
            created_at: row.get(7)?,
            is_deleted: row.get::<_, i64>(8)? != 0,
            metadata: None,
        },
        metadata_json,
    ))
}

fn decode_metadata(json: Option<String>) -> Result<Option<ImageMetadata>, AppError> {
    match json {
        Some(text) => Ok(Some(serde_json::from_str(&text)?)),
        None => Ok(None),
    }
}

const IMAGE_COLUMNS: &str =
    "id, user_id, image_uri, filename, file_size, width, height, created_at, is_deleted, metadata";

pub fn insert_image(conn: &Connection, user_id: i64, image: &NewImage) -> Result<i64, AppError> {
    let metadata_json = image
        .metadata
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        "INSERT INTO images (user_id, image_uri, filename, file_size, width, height, metadata)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_id,
            image.image_uri,
            image.filename,
            image.file_size,
            image.width,
            image.height,
            metadata_json,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_image(conn: &Connection, image_id: i64) -> Result<Option<ImageRow>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {IMAGE_COLUMNS} FROM images WHERE id = ?1"
    ))?;
    let found = stmt
        .query_row(params![image_id], image_from_row)
        .optional()?;
    match found {
        Some((mut row, metadata_json)) => {
            row.metadata = decode_metadata(metadata_json)?;
            Ok(Some(row))
        }
        None => Ok(None),
    }
}

pub fn user_images(conn: &Connection, user_id: i64, limit: i64) -> Result<Vec<ImageRow>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {IMAGE_COLUMNS} FROM images
         WHERE user_id = ?1 AND is_deleted = 0
         ORDER BY created_at DESC, id DESC LIMIT ?2"
    ))?;
    let raw = stmt
        .query_map(params![user_id, limit], image_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    let mut images = Vec::with_capacity(raw.len());
    for (mut row, metadata_json) in raw {
        row.metadata = decode_metadata(metadata_json)?;
        images.push(row);
    }
    Ok(images)
}

/// Soft delete: the row survives so history screens can show a tombstone.
pub fn mark_deleted(conn: &Connection, image_id: i64) -> Result<bool, AppError> {
    let updated = conn.execute(
        "UPDATE images SET is_deleted = 1 WHERE id = ?1",
        params![image_id],
    )?;
    Ok(updated > 0)
}

/// Hard delete; detected objects go with the image via cascade.
pub fn delete_image(conn: &Connection, image_id: i64) -> Result<usize, AppError> {
    let count = conn.execute("DELETE FROM images WHERE id = ?1", params![image_id])?;
    Ok(count)
}
