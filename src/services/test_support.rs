//! Deterministic gateway mocks shared by the service tests.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::Connection;

use crate::data::migrations::run_migrations;
use crate::error::AppError;
use crate::models::detection::DetectedRegion;
use crate::models::language::DisplayLanguage;
use crate::services::detection_gateway::{ImageInput, ObjectDetector};
use crate::services::dictionary_gateway::{
    DictionaryDefinition, DictionaryEntry, DictionaryProvider, NO_DEFINITION,
};
use crate::services::translation_gateway::Translator;
use crate::state::AppState;

#[derive(Default)]
pub struct MockDetector {
    pub regions: Vec<DetectedRegion>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl ObjectDetector for MockDetector {
    async fn detect(&self, _image: &ImageInput) -> Vec<DetectedRegion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.regions.clone()
    }
}

#[derive(Default)]
pub struct MockDictionary {
    pub entries: HashMap<String, DictionaryEntry>,
    /// Number of upcoming lookups that answer with a degraded placeholder,
    /// simulating an unreachable gateway that later recovers.
    pub degrade_remaining: AtomicUsize,
    pub calls: AtomicUsize,
}

impl MockDictionary {
    pub fn with_entry(word: &str, definitions: &[(&str, Option<&str>)]) -> Self {
        let mut entries = HashMap::new();
        entries.insert(
            word.to_string(),
            DictionaryEntry {
                word: word.to_string(),
                phonetic: Some(format!("/{word}/")),
                definitions: definitions
                    .iter()
                    .map(|(definition, example)| DictionaryDefinition {
                        part_of_speech: Some("noun".to_string()),
                        definition: definition.to_string(),
                        example: example.map(str::to_string),
                    })
                    .collect(),
                degraded: false,
            },
        );
        Self {
            entries,
            ..Default::default()
        }
    }

    pub fn degraded_for(self, lookups: usize) -> Self {
        self.degrade_remaining.store(lookups, Ordering::SeqCst);
        self
    }
}

#[async_trait]
impl DictionaryProvider for MockDictionary {
    async fn lookup(&self, word: &str) -> Result<DictionaryEntry, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self
            .degrade_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
        {
            return Ok(DictionaryEntry {
                word: word.to_string(),
                phonetic: None,
                definitions: vec![DictionaryDefinition {
                    part_of_speech: None,
                    definition: NO_DEFINITION.to_string(),
                    example: None,
                }],
                degraded: true,
            });
        }
        self.entries
            .get(word)
            .cloned()
            .ok_or_else(|| AppError::WordNotFound(word.to_string()))
    }
}

/// Translates by tagging with the gateway code, e.g. `ZH:hello`. Texts in
/// `fail_on` error instead.
#[derive(Default)]
pub struct MockTranslator {
    pub fail_on: Vec<String>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(&self, text: &str, target: DisplayLanguage) -> Result<String, AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.iter().any(|t| t == text) {
            return Err(AppError::gateway("translation", "mock failure"));
        }
        Ok(format!("{}:{}", target.gateway_code(), text))
    }
}

pub fn test_state(
    detector: Arc<MockDetector>,
    dictionary: Arc<MockDictionary>,
    translator: Arc<MockTranslator>,
) -> AppState {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let conn = Connection::open_in_memory().unwrap();
    run_migrations(&conn).unwrap();
    AppState::new(conn, PathBuf::new(), detector, dictionary, translator)
}
