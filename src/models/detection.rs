use serde::{Deserialize, Serialize};

/// Normalized bounding box in unit-interval coordinates.
///
/// Center coordinates are derived, never supplied; the struct is encoded to
/// JSON exactly once, at the detection repository boundary.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub top: f64,
    pub left: f64,
    pub bottom: f64,
    pub right: f64,
    pub center_x: f64,
    pub center_y: f64,
}

impl BoundingBox {
    /// Build a box from raw gateway coordinates, clamping each edge into
    /// [0, 1]. Returns `None` for inverted boxes (`left > right` or
    /// `top > bottom`), which the detection gateway drops with a warning.
    pub fn from_edges(top: f64, left: f64, bottom: f64, right: f64) -> Option<Self> {
        let clamp = |v: f64| v.clamp(0.0, 1.0);
        let (top, left, bottom, right) = (clamp(top), clamp(left), clamp(bottom), clamp(right));
        if left > right || top > bottom {
            return None;
        }
        Some(Self {
            top,
            left,
            bottom,
            right,
            center_x: (left + right) / 2.0,
            center_y: (top + bottom) / 2.0,
        })
    }

    pub fn is_valid(&self) -> bool {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        in_unit(self.top)
            && in_unit(self.left)
            && in_unit(self.bottom)
            && in_unit(self.right)
            && self.left <= self.right
            && self.top <= self.bottom
    }
}

/// One labeled region returned by the detection gateway.
#[derive(Debug, Clone, Serialize)]
pub struct DetectedRegion {
    pub label: String,
    pub confidence: f64,
    pub bounding_box: BoundingBox,
}

/// One row of the `detected_objects` table.
#[derive(Debug, Clone, Serialize)]
pub struct DetectedObjectRow {
    pub id: i64,
    pub user_id: i64,
    pub word_id: Option<i64>,
    pub image_id: i64,
    pub object_name: String,
    pub translation: Option<String>,
    pub confidence: f64,
    pub bounding_box: Option<BoundingBox>,
    pub created_at: Option<String>,
}

/// A detected object joined with the favorite state of its word.
#[derive(Debug, Clone, Serialize)]
pub struct DetectionWithWord {
    pub object: DetectedObjectRow,
    pub is_favorite: bool,
}
