use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::config::GatewayConfig;
use crate::error::AppError;
use crate::services::detection_gateway::{ClarifaiDetector, ObjectDetector};
use crate::services::dictionary_gateway::{DictionaryProvider, FreeDictionary};
use crate::services::translation_gateway::{DeeplTranslator, Translator};

/// Everything one user action needs: the store handle plus the three
/// gateway seams. Gateways are trait objects so tests swap in mocks.
pub struct AppState {
    db: Mutex<Connection>,
    pub db_path: PathBuf,
    pub detector: Arc<dyn ObjectDetector>,
    pub dictionary: Arc<dyn DictionaryProvider>,
    pub translator: Arc<dyn Translator>,
}

impl AppState {
    pub fn new(
        conn: Connection,
        db_path: PathBuf,
        detector: Arc<dyn ObjectDetector>,
        dictionary: Arc<dyn DictionaryProvider>,
        translator: Arc<dyn Translator>,
    ) -> Self {
        Self {
            db: Mutex::new(conn),
            db_path,
            detector,
            dictionary,
            translator,
        }
    }

    /// Production wiring: HTTP gateways from environment-derived config.
    pub fn with_http_gateways(
        conn: Connection,
        db_path: PathBuf,
        config: &GatewayConfig,
    ) -> Result<Self, AppError> {
        Ok(Self::new(
            conn,
            db_path,
            Arc::new(ClarifaiDetector::new(config)?),
            Arc::new(FreeDictionary::new(config)?),
            Arc::new(DeeplTranslator::new(config)?),
        ))
    }

    /// The store is the only shared mutable resource; the guard is never
    /// held across an await.
    pub fn db(&self) -> MutexGuard<'_, Connection> {
        self.db.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
