use serde::{Deserialize, Serialize};

use crate::models::language::DisplayLanguage;

/// One row of the `words` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WordRow {
    pub id: i64,
    pub user_id: i64,
    pub word: String,
    pub phonetic: Option<String>,
    pub translation: Option<String>,
    pub language: Option<DisplayLanguage>,
    pub is_favorite: bool,
    pub created_at: Option<String>,
}

/// One definition attached to a word, ordered by insertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Definition {
    pub part_of_speech: Option<String>,
    pub definition: String,
    pub translation: Option<String>,
    pub example: Option<String>,
    pub example_translation: Option<String>,
}

/// Where a resolved record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordSource {
    Cache,
    Remote,
}

/// The display-ready result of resolving a word.
#[derive(Debug, Clone, Serialize)]
pub struct WordRecord {
    pub word_id: i64,
    pub word: String,
    pub phonetic: Option<String>,
    pub translation: Option<String>,
    pub definitions: Vec<Definition>,
    pub language: DisplayLanguage,
    pub is_favorite: bool,
    pub source: RecordSource,
}

/// Caller-supplied data when favoriting a word the store has never seen.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FavoritePayload {
    pub phonetic: Option<String>,
    pub translation: Option<String>,
    pub language: Option<DisplayLanguage>,
    pub definitions: Vec<Definition>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FavoriteStatus {
    pub word_id: i64,
    pub is_favorite: bool,
}

/// Canonical identity of a word: trimmed, lowercased, never empty.
pub fn normalize_word(word: &str) -> Option<String> {
    let normalized = word.trim().to_lowercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}
