//! The detection pipeline: image in, labeled regions persisted as candidate
//! vocabulary words out.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::data::detection_repository::{self, NewDetection};
use crate::data::{image_repository, word_repository};
use crate::error::AppError;
use crate::models::detection::{DetectedObjectRow, DetectedRegion, DetectionWithWord};
use crate::models::image::{ImageMetadata, ImageRow, NewImage};
use crate::models::language::DisplayLanguage;
use crate::models::word::normalize_word;
use crate::services::detection_gateway::ImageInput;
use crate::services::translation_gateway::{is_translation_failure, translate_display};
use crate::state::AppState;

/// Cap on regions kept per distinct label, to bound UI clutter. Tunable.
pub const MAX_DETECTIONS_PER_LABEL: usize = 3;

#[derive(Debug, Clone, Serialize)]
pub struct SavedDetection {
    pub detection_id: i64,
    pub word_id: i64,
    pub label: String,
    pub confidence: f64,
    pub translation: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedDetection {
    pub label: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct DetectionReport {
    pub image_id: i64,
    pub saved: Vec<SavedDetection>,
    pub failures: Vec<FailedDetection>,
}

/// An empty detection result is a legitimate outcome, not an error.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DetectionOutcome {
    NoObjects,
    Detected(DetectionReport),
}

/// Detect objects in an image, keep the strongest regions per label, persist
/// the image and then each detection. Per-item persistence is best-effort:
/// one failed item lands in `failures` and the batch continues.
pub async fn detect_and_persist(
    state: &AppState,
    owner_id: i64,
    image: ImageInput,
    display_language: DisplayLanguage,
) -> Result<DetectionOutcome, AppError> {
    let regions = state.detector.detect(&image).await;
    if regions.is_empty() {
        debug!("No objects detected");
        return Ok(DetectionOutcome::NoObjects);
    }

    let retained = retain_top_per_label(regions, MAX_DETECTIONS_PER_LABEL);

    // Image row goes in first; detections reference it.
    let new_image = describe_image(&image, display_language);
    let image_id = {
        let conn = state.db();
        image_repository::insert_image(&conn, owner_id, &new_image)?
    };

    let mut saved = Vec::new();
    let mut failures = Vec::new();
    for region in retained {
        match persist_region(state, owner_id, image_id, &region, display_language).await {
            Ok(item) => saved.push(item),
            Err(e) => {
                warn!(label = %region.label, error = %e, "Detection item failed, continuing batch");
                failures.push(FailedDetection {
                    label: region.label,
                    error: e.to_string(),
                });
            }
        }
    }

    debug!(image_id, saved = saved.len(), failed = failures.len(), "Detection batch persisted");
    Ok(DetectionOutcome::Detected(DetectionReport {
        image_id,
        saved,
        failures,
    }))
}

async fn persist_region(
    state: &AppState,
    owner_id: i64,
    image_id: i64,
    region: &DetectedRegion,
    display_language: DisplayLanguage,
) -> Result<SavedDetection, AppError> {
    let word = normalize_word(&region.label)
        .ok_or_else(|| AppError::InvalidWord(region.label.clone()))?;

    // Labels arrive in English; an English display target needs no overlay
    // translation at all.
    let translation = if display_language.is_english() {
        None
    } else {
        let t = translate_display(state.translator.as_ref(), &word, display_language).await;
        (!is_translation_failure(&t) && !t.is_empty()).then_some(t)
    };

    let mut conn = state.db();
    let tx = conn.transaction()?;
    let word_row = word_repository::ensure_word(&tx, owner_id, &word)?;
    let detection_id = detection_repository::insert_detection(
        &tx,
        owner_id,
        &NewDetection {
            word_id: Some(word_row.id),
            image_id,
            object_name: word.clone(),
            translation: translation.clone(),
            confidence: region.confidence,
            bounding_box: Some(region.bounding_box),
        },
    )?;
    tx.commit()?;

    Ok(SavedDetection {
        detection_id,
        word_id: word_row.id,
        label: word,
        confidence: region.confidence,
        translation,
    })
}

/// Keep at most `cap` regions per label, preferring higher confidence;
/// surviving regions stay ordered by confidence.
fn retain_top_per_label(mut regions: Vec<DetectedRegion>, cap: usize) -> Vec<DetectedRegion> {
    regions.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut counts: HashMap<String, usize> = HashMap::new();
    regions
        .into_iter()
        .filter(|region| {
            let seen = counts.entry(region.label.to_lowercase()).or_default();
            *seen += 1;
            *seen <= cap
        })
        .collect()
}

fn describe_image(image: &ImageInput, display_language: DisplayLanguage) -> NewImage {
    let metadata = Some(ImageMetadata::new(display_language));
    match image {
        ImageInput::Url(url) => NewImage {
            image_uri: url.clone(),
            filename: filename_from_uri(url),
            file_size: None,
            width: None,
            height: None,
            metadata,
        },
        ImageInput::Bytes { data, uri } => {
            let image_uri = uri
                .clone()
                .unwrap_or_else(|| format!("capture://{}.jpg", Uuid::new_v4()));
            let (width, height) = match image::load_from_memory(data) {
                Ok(decoded) => (Some(decoded.width() as i64), Some(decoded.height() as i64)),
                Err(e) => {
                    warn!(error = %e, "Could not decode captured image for dimensions");
                    (None, None)
                }
            };
            NewImage {
                filename: filename_from_uri(&image_uri),
                image_uri,
                file_size: Some(data.len() as i64),
                width,
                height,
                metadata,
            }
        }
    }
}

fn filename_from_uri(uri: &str) -> Option<String> {
    uri.rsplit('/')
        .next()
        .filter(|name| !name.is_empty() && *name != uri)
        .map(str::to_string)
}

/// Saved regions for one image, with the favorite state of their words.
pub fn detections_for_image(
    state: &AppState,
    image_id: i64,
) -> Result<Vec<DetectionWithWord>, AppError> {
    let conn = state.db();
    detection_repository::detections_for_image(&conn, image_id)
}

/// Gallery view: the owner's images, newest first, soft-deleted excluded.
pub fn recent_images(
    state: &AppState,
    owner_id: i64,
    limit: i64,
) -> Result<Vec<ImageRow>, AppError> {
    let conn = state.db();
    image_repository::user_images(&conn, owner_id, limit)
}

/// History view: the owner's detected objects across all images, newest
/// first.
pub fn recent_detections(
    state: &AppState,
    owner_id: i64,
    limit: i64,
) -> Result<Vec<DetectedObjectRow>, AppError> {
    let conn = state.db();
    detection_repository::recent_detections(&conn, owner_id, limit)
}

/// Remove an image and, via cascade, all of its detected objects.
pub fn delete_image(state: &AppState, image_id: i64) -> Result<(), AppError> {
    let conn = state.db();
    image_repository::delete_image(&conn, image_id)?;
    Ok(())
}
