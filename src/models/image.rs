use serde::{Deserialize, Serialize};

use crate::models::language::DisplayLanguage;

/// Structured metadata stored alongside an image row. Encoded to JSON once,
/// inside the image repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageMetadata {
    pub detection_language: String,
    pub target_language: DisplayLanguage,
}

impl ImageMetadata {
    pub fn new(target_language: DisplayLanguage) -> Self {
        Self {
            // Detection labels always arrive in English.
            detection_language: "en".to_string(),
            target_language,
        }
    }
}

/// A new image about to be persisted.
#[derive(Debug, Clone)]
pub struct NewImage {
    pub image_uri: String,
    pub filename: Option<String>,
    pub file_size: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub metadata: Option<ImageMetadata>,
}

/// One row of the `images` table.
#[derive(Debug, Clone, Serialize)]
pub struct ImageRow {
    pub id: i64,
    pub user_id: i64,
    pub image_uri: String,
    pub filename: Option<String>,
    pub file_size: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub created_at: Option<String>,
    pub is_deleted: bool,
    pub metadata: Option<ImageMetadata>,
}
