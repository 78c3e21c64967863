use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::AppError;
use crate::models::language::DisplayLanguage;
use crate::models::word::{Definition, WordRow};

fn word_from_row(row: &Row<'_>) -> rusqlite::Result<WordRow> {
    let language: Option<String> = row.get(5)?;
    Ok(WordRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        word: row.get(2)?,
        phonetic: row.get(3)?,
        translation: row.get(4)?,
        language: language.as_deref().and_then(DisplayLanguage::from_locale),
        is_favorite: row.get::<_, i64>(6)? != 0,
        created_at: row.get(7)?,
    })
}

const WORD_COLUMNS: &str =
    "id, user_id, word, phonetic, translation, language, is_favorite, created_at";

pub fn get_word(conn: &Connection, user_id: i64, word: &str) -> Result<Option<WordRow>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WORD_COLUMNS} FROM words WHERE user_id = ?1 AND word = ?2"
    ))?;
    let row = stmt
        .query_row(params![user_id, word], word_from_row)
        .optional()?;
    Ok(row)
}

pub fn get_definitions(conn: &Connection, word_id: i64) -> Result<Vec<Definition>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT part_of_speech, definition, translation, example, example_translation
         FROM word_definitions WHERE word_id = ?1 ORDER BY id ASC",
    )?;
    let definitions = stmt
        .query_map(params![word_id], |row| {
            Ok(Definition {
                part_of_speech: row.get(0)?,
                definition: row.get(1)?,
                translation: row.get(2)?,
                example: row.get(3)?,
                example_translation: row.get(4)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(definitions)
}

pub fn get_word_with_definitions(
    conn: &Connection,
    user_id: i64,
    word: &str,
) -> Result<Option<(WordRow, Vec<Definition>)>, AppError> {
    match get_word(conn, user_id, word)? {
        Some(row) => {
            let definitions = get_definitions(conn, row.id)?;
            Ok(Some((row, definitions)))
        }
        None => Ok(None),
    }
}

/// Insert-or-update keyed on (user_id, word). The favorite flag of an
/// existing row is preserved; lookup metadata is refreshed.
pub fn upsert_word(
    conn: &Connection,
    user_id: i64,
    word: &str,
    phonetic: Option<&str>,
    translation: Option<&str>,
    language: Option<DisplayLanguage>,
) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO words (user_id, word, phonetic, translation, language)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (user_id, word) DO UPDATE SET
             phonetic = excluded.phonetic,
             translation = excluded.translation,
             language = excluded.language",
        params![
            user_id,
            word,
            phonetic,
            translation,
            language.map(|l| l.locale()),
        ],
    )?;
    let id: i64 = conn.query_row(
        "SELECT id FROM words WHERE user_id = ?1 AND word = ?2",
        params![user_id, word],
        |row| row.get(0),
    )?;
    Ok(id)
}

/// Resolve-or-create used by the detection pipeline: returns the existing
/// row untouched, or inserts a bare unfavorited word.
pub fn ensure_word(conn: &Connection, user_id: i64, word: &str) -> Result<WordRow, AppError> {
    if let Some(existing) = get_word(conn, user_id, word)? {
        return Ok(existing);
    }
    conn.execute(
        "INSERT INTO words (user_id, word) VALUES (?1, ?2)
         ON CONFLICT (user_id, word) DO NOTHING",
        params![user_id, word],
    )?;
    get_word(conn, user_id, word)?
        .ok_or_else(|| AppError::General(format!("word \"{word}\" missing after insert")))
}

pub fn insert_definitions(
    conn: &Connection,
    word_id: i64,
    definitions: &[Definition],
) -> Result<(), AppError> {
    let mut stmt = conn.prepare(
        "INSERT INTO word_definitions
             (word_id, part_of_speech, definition, translation, example, example_translation)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for def in definitions {
        stmt.execute(params![
            word_id,
            def.part_of_speech,
            def.definition,
            def.translation,
            def.example,
            def.example_translation,
        ])?;
    }
    Ok(())
}

pub fn replace_definitions(
    conn: &Connection,
    word_id: i64,
    definitions: &[Definition],
) -> Result<(), AppError> {
    conn.execute(
        "DELETE FROM word_definitions WHERE word_id = ?1",
        params![word_id],
    )?;
    insert_definitions(conn, word_id, definitions)
}

pub fn set_favorite(conn: &Connection, word_id: i64, favorite: bool) -> Result<bool, AppError> {
    let updated = conn.execute(
        "UPDATE words SET is_favorite = ?1 WHERE id = ?2",
        params![favorite as i64, word_id],
    )?;
    Ok(updated > 0)
}

pub fn favorite_words(conn: &Connection, user_id: i64) -> Result<Vec<WordRow>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {WORD_COLUMNS} FROM words
         WHERE user_id = ?1 AND is_favorite = 1
         ORDER BY created_at DESC, id DESC"
    ))?;
    let rows = stmt
        .query_map(params![user_id], word_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn delete_word(conn: &Connection, word_id: i64) -> Result<usize, AppError> {
    let count = conn.execute("DELETE FROM words WHERE id = ?1", params![word_id])?;
    Ok(count)
}
