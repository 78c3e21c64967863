//! The word cache / favorites manager: resolve a word into a display-ready
//! record (store first, gateways as fallback) and manage the favorite flag.

use tracing::debug;

use crate::data::{search_repository, word_repository};
use crate::error::AppError;
use crate::models::language::DisplayLanguage;
use crate::models::word::{
    normalize_word, Definition, FavoritePayload, FavoriteStatus, RecordSource, WordRecord, WordRow,
};
use crate::services::dictionary_gateway::DictionaryEntry;
use crate::services::translation_gateway::{is_translation_failure, translate_display};
use crate::state::AppState;

/// Placeholder substituted for a single failed definition translation; a
/// per-definition failure never aborts the resolve.
pub const TRANSLATION_UNAVAILABLE: &str = "Translation unavailable";

fn record_from_cache(row: WordRow, definitions: Vec<Definition>, language: DisplayLanguage) -> WordRecord {
    WordRecord {
        word_id: row.id,
        word: row.word,
        phonetic: row.phonetic,
        translation: row.translation,
        definitions,
        language,
        is_favorite: row.is_favorite,
        source: RecordSource::Cache,
    }
}

/// Resolve a word for display: cached record when the store already holds it
/// in the requested language, dictionary + translation gateways otherwise,
/// upserting the fresh result back. Every successful resolve appends to the
/// search history.
pub async fn resolve(
    state: &AppState,
    owner_id: i64,
    word: &str,
    display_language: DisplayLanguage,
) -> Result<WordRecord, AppError> {
    let normalized =
        normalize_word(word).ok_or_else(|| AppError::InvalidWord(word.to_string()))?;

    // Store lookup first; the guard must not survive into the network calls.
    {
        let conn = state.db();
        if let Some((row, definitions)) =
            word_repository::get_word_with_definitions(&conn, owner_id, &normalized)?
        {
            if row.language == Some(display_language) {
                debug!(word = %normalized, "Cache hit");
                search_repository::record_search(&conn, owner_id, &normalized)?;
                return Ok(record_from_cache(row, definitions, display_language));
            }
            debug!(word = %normalized, "Cached language differs, refreshing");
        }
    }

    let entry = state.dictionary.lookup(&normalized).await?;

    // A degraded entry means the gateway was unreachable. Render it, but do
    // not translate the placeholder text and do not cache it as definitions:
    // the next resolve must consult the dictionary again once it recovers.
    if entry.degraded {
        debug!(word = %normalized, "Degraded dictionary entry, skipping cache write");
        let mut conn = state.db();
        let tx = conn.transaction()?;
        let row = word_repository::ensure_word(&tx, owner_id, &normalized)?;
        search_repository::record_search(&tx, owner_id, &normalized)?;
        tx.commit()?;
        let definitions = entry
            .definitions
            .into_iter()
            .map(|def| Definition {
                part_of_speech: def.part_of_speech,
                definition: def.definition,
                translation: None,
                example: def.example,
                example_translation: None,
            })
            .collect();
        return Ok(WordRecord {
            word_id: row.id,
            word: normalized,
            phonetic: None,
            translation: None,
            definitions,
            language: display_language,
            is_favorite: row.is_favorite,
            source: RecordSource::Remote,
        });
    }

    let (translation, definitions) =
        translate_entry(state, &normalized, &entry, display_language).await;

    let mut conn = state.db();
    let tx = conn.transaction()?;
    let word_id = word_repository::upsert_word(
        &tx,
        owner_id,
        &normalized,
        entry.phonetic.as_deref(),
        translation.as_deref(),
        Some(display_language),
    )?;
    word_repository::replace_definitions(&tx, word_id, &definitions)?;
    search_repository::record_search(&tx, owner_id, &normalized)?;
    let row = word_repository::get_word(&tx, owner_id, &normalized)?
        .ok_or_else(|| AppError::General(format!("word \"{normalized}\" missing after upsert")))?;
    tx.commit()?;

    Ok(WordRecord {
        word_id,
        word: normalized,
        phonetic: entry.phonetic.clone(),
        translation,
        definitions,
        language: display_language,
        is_favorite: row.is_favorite,
        source: RecordSource::Remote,
    })
}

async fn translate_entry(
    state: &AppState,
    word: &str,
    entry: &DictionaryEntry,
    display_language: DisplayLanguage,
) -> (Option<String>, Vec<Definition>) {
    let translator = state.translator.as_ref();

    let headword = translate_display(translator, word, display_language).await;
    let translation = (!is_translation_failure(&headword)).then_some(headword);

    let mut definitions = Vec::with_capacity(entry.definitions.len());
    for def in &entry.definitions {
        let translated = translate_display(translator, &def.definition, display_language).await;
        let translated = if is_translation_failure(&translated) {
            TRANSLATION_UNAVAILABLE.to_string()
        } else {
            translated
        };

        let example_translation = match &def.example {
            Some(example) => {
                let t = translate_display(translator, example, display_language).await;
                (!is_translation_failure(&t) && !t.is_empty()).then_some(t)
            }
            None => None,
        };

        definitions.push(Definition {
            part_of_speech: def.part_of_speech.clone(),
            definition: def.definition.clone(),
            translation: Some(translated),
            example: def.example.clone(),
            example_translation,
        });
    }
    (translation, definitions)
}

/// Flip the favorite flag for (owner, word), creating the row when absent.
/// Un-favoriting clears the flag and keeps the word with its definitions.
pub fn toggle_favorite(
    state: &AppState,
    owner_id: i64,
    word: &str,
    payload: FavoritePayload,
) -> Result<FavoriteStatus, AppError> {
    let normalized =
        normalize_word(word).ok_or_else(|| AppError::InvalidWord(word.to_string()))?;

    let mut conn = state.db();
    let tx = conn.transaction()?;

    let status = match word_repository::get_word(&tx, owner_id, &normalized)? {
        Some(row) => {
            let next = !row.is_favorite;
            word_repository::set_favorite(&tx, row.id, next)?;
            FavoriteStatus {
                word_id: row.id,
                is_favorite: next,
            }
        }
        None => {
            // The language tag is what makes later resolves trust the cached
            // row; only set it when the payload actually carries definitions.
            let language = if payload.definitions.is_empty() {
                None
            } else {
                payload.language
            };
            let word_id = word_repository::upsert_word(
                &tx,
                owner_id,
                &normalized,
                payload.phonetic.as_deref(),
                payload.translation.as_deref(),
                language,
            )?;
            if !payload.definitions.is_empty() {
                word_repository::insert_definitions(&tx, word_id, &payload.definitions)?;
            }
            word_repository::set_favorite(&tx, word_id, true)?;
            FavoriteStatus {
                word_id,
                is_favorite: true,
            }
        }
    };

    tx.commit()?;
    debug!(word = %normalized, is_favorite = status.is_favorite, "Favorite toggled");
    Ok(status)
}

/// All favorited words with their definitions, newest first.
pub fn favorites(state: &AppState, owner_id: i64) -> Result<Vec<WordRecord>, AppError> {
    let conn = state.db();
    let rows = word_repository::favorite_words(&conn, owner_id)?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let definitions = word_repository::get_definitions(&conn, row.id)?;
        let language = row.language.unwrap_or(DisplayLanguage::DEFAULT);
        records.push(record_from_cache(row, definitions, language));
    }
    Ok(records)
}
