use rusqlite::{params, Connection, Row};
use tracing::warn;

use crate::error::AppError;
use crate::models::detection::{BoundingBox, DetectedObjectRow, DetectionWithWord};

/// A detection about to be persisted; the bounding box is encoded to JSON
/// here and nowhere else.
#[derive(Debug, Clone)]
pub struct NewDetection {
    pub word_id: Option<i64>,
    pub image_id: i64,
    pub object_name: String,
    pub translation: Option<String>,
    pub confidence: f64,
    pub bounding_box: Option<BoundingBox>,
}

fn detection_from_row(row: &Row<'_>) -> rusqlite::Result<DetectedObjectRow> {
    let bounding_box_json: Option<String> = row.get(7)?;
    let id: i64 = row.get(0)?;
    let bounding_box = bounding_box_json.and_then(|json| {
        serde_json::from_str::<BoundingBox>(&json)
            .map_err(|e| warn!(detection_id = id, error = %e, "Dropping undecodable bounding box"))
            .ok()
    });
    Ok(DetectedObjectRow {
        id,
        user_id: row.get(1)?,
        word_id: row.get(2)?,
        image_id: row.get(3)?,
        object_name: row.get(4)?,
        translation: row.get(5)?,
        confidence: row.get(6)?,
        bounding_box,
        created_at: row.get(8)?,
    })
}

const DETECTION_COLUMNS: &str = "id, user_id, word_id, image_id, object_name, translation, \
                                 confidence, bounding_box, created_at";

pub fn insert_detection(
    conn: &Connection,
    user_id: i64,
    detection: &NewDetection,
) -> Result<i64, AppError> {
    if let Some(bb) = &detection.bounding_box {
        if !bb.is_valid() {
            return Err(AppError::InvalidRegion(format!(
                "bounding box out of range for \"{}\"",
                detection.object_name
            )));
        }
    }
    let bounding_box_json = detection
        .bounding_box
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    conn.execute(
        "INSERT INTO detected_objects
             (user_id, word_id, image_id, object_name, translation, confidence, bounding_box)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            user_id,
            detection.word_id,
            detection.image_id,
            detection.object_name,
            detection.translation,
            detection.confidence,
            bounding_box_json,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// All detections for one image, joined with the favorite state of the word
/// each detection was linked to.
pub fn detections_for_image(
    conn: &Connection,
    image_id: i64,
) -> Result<Vec<DetectionWithWord>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT d.id, d.user_id, d.word_id, d.image_id, d.object_name, d.translation, \
                d.confidence, d.bounding_box, d.created_at, COALESCE(w.is_favorite, 0)
         FROM detected_objects d
         LEFT JOIN words w ON w.id = d.word_id
         WHERE d.image_id = ?1
         ORDER BY d.id ASC"
    ))?;
    let detections = stmt
        .query_map(params![image_id], |row| {
            let object = detection_from_row(row)?;
            let is_favorite: i64 = row.get(9)?;
            Ok(DetectionWithWord {
                object,
                is_favorite: is_favorite != 0,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(detections)
}

pub fn recent_detections(
    conn: &Connection,
    user_id: i64,
    limit: i64,
) -> Result<Vec<DetectedObjectRow>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DETECTION_COLUMNS} FROM detected_objects
         WHERE user_id = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2"
    ))?;
    let detections = stmt
        .query_map(params![user_id, limit], detection_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(detections)
}

pub fn search_by_label(
    conn: &Connection,
    user_id: i64,
    term: &str,
) -> Result<Vec<DetectedObjectRow>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {DETECTION_COLUMNS} FROM detected_objects
         WHERE user_id = ?1 AND object_name LIKE ?2
         ORDER BY created_at DESC, id DESC"
    ))?;
    let pattern = format!("%{term}%");
    let detections = stmt
        .query_map(params![user_id, pattern], detection_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(detections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::image_repository;
    use crate::data::migrations::{run_migrations, DEFAULT_USER_ID};
    use crate::data::word_repository;
    use crate::models::image::NewImage;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn insert_test_image(conn: &Connection) -> i64 {
        image_repository::insert_image(
            conn,
            DEFAULT_USER_ID,
            &NewImage {
                image_uri: "file:///photos/desk.jpg".to_string(),
                filename: None,
                file_size: None,
                width: None,
                height: None,
                metadata: None,
            },
        )
        .unwrap()
    }

    fn detection(image_id: i64, word_id: Option<i64>, name: &str) -> NewDetection {
        NewDetection {
            word_id,
            image_id,
            object_name: name.to_string(),
            translation: None,
            confidence: 0.95,
            bounding_box: BoundingBox::from_edges(0.1, 0.1, 0.4, 0.3),
        }
    }

    #[test]
    fn test_bounding_box_round_trips() {
        let conn = setup_db();
        let image_id = insert_test_image(&conn);

        insert_detection(&conn, DEFAULT_USER_ID, &detection(image_id, None, "cup")).unwrap();

        let rows = detections_for_image(&conn, image_id).unwrap();
        assert_eq!(rows.len(), 1);
        let bb = rows[0].object.bounding_box.unwrap();
        assert_eq!(bb, BoundingBox::from_edges(0.1, 0.1, 0.4, 0.3).unwrap());
    }

    #[test]
    fn test_invalid_bounding_box_is_rejected() {
        let conn = setup_db();
        let image_id = insert_test_image(&conn);

        let mut bad = detection(image_id, None, "cup");
        bad.bounding_box = Some(BoundingBox {
            top: 0.5,
            left: 0.9,
            bottom: 0.2,
            right: 0.1,
            center_x: 0.5,
            center_y: 0.35,
        });
        let err = insert_detection(&conn, DEFAULT_USER_ID, &bad).unwrap_err();
        assert!(matches!(err, AppError::InvalidRegion(_)));
    }

    #[test]
    fn test_detections_join_word_favorite_state() {
        let conn = setup_db();
        let image_id = insert_test_image(&conn);
        let word = word_repository::ensure_word(&conn, DEFAULT_USER_ID, "cup").unwrap();
        word_repository::set_favorite(&conn, word.id, true).unwrap();

        insert_detection(
            &conn,
            DEFAULT_USER_ID,
            &detection(image_id, Some(word.id), "cup"),
        )
        .unwrap();
        insert_detection(&conn, DEFAULT_USER_ID, &detection(image_id, None, "plate")).unwrap();

        let rows = detections_for_image(&conn, image_id).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].is_favorite);
        assert!(!rows[1].is_favorite);
    }

    #[test]
    fn test_search_by_label_matches_substring() {
        let conn = setup_db();
        let image_id = insert_test_image(&conn);

        insert_detection(&conn, DEFAULT_USER_ID, &detection(image_id, None, "teacup")).unwrap();
        insert_detection(&conn, DEFAULT_USER_ID, &detection(image_id, None, "plate")).unwrap();

        let hits = search_by_label(&conn, DEFAULT_USER_ID, "cup").unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].object_name, "teacup");
    }
}
