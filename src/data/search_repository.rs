use rusqlite::{params, Connection};

use crate::error::AppError;
use crate::models::search::{RecentSearch, SearchHistoryEntry};

/// Append-only: repeated searches for the same word get their own rows.
/// Timestamps are written explicitly for sub-second ordering.
pub fn record_search(conn: &Connection, user_id: i64, word: &str) -> Result<i64, AppError> {
    conn.execute(
        "INSERT INTO search_history (user_id, word, created_at) VALUES (?1, ?2, ?3)",
        params![user_id, word, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn search_history(
    conn: &Connection,
    user_id: i64,
    limit: i64,
) -> Result<Vec<SearchHistoryEntry>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, word, created_at FROM search_history
         WHERE user_id = ?1 ORDER BY created_at DESC, id DESC LIMIT ?2",
    )?;
    let entries = stmt
        .query_map(params![user_id, limit], |row| {
            Ok(SearchHistoryEntry {
                id: row.get(0)?,
                user_id: row.get(1)?,
                word: row.get(2)?,
                created_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

/// Deduplicated view over the log: one row per word with its latest search
/// time, newest first.
pub fn recent_unique_searches(
    conn: &Connection,
    user_id: i64,
    limit: i64,
) -> Result<Vec<RecentSearch>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT word, MAX(created_at) AS latest_search FROM search_history
         WHERE user_id = ?1 GROUP BY word
         ORDER BY latest_search DESC, MAX(id) DESC LIMIT ?2",
    )?;
    let entries = stmt
        .query_map(params![user_id, limit], |row| {
            Ok(RecentSearch {
                word: row.get(0)?,
                latest_search: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(entries)
}

pub fn remove_entry(conn: &Connection, entry_id: i64) -> Result<usize, AppError> {
    let count = conn.execute("DELETE FROM search_history WHERE id = ?1", params![entry_id])?;
    Ok(count)
}

pub fn clear_history(conn: &Connection, user_id: i64) -> Result<usize, AppError> {
    let count = conn.execute(
        "DELETE FROM search_history WHERE user_id = ?1",
        params![user_id],
    )?;
    Ok(count)
}

/// Completion suggestions drawn from both saved words and past searches.
pub fn suggestions(conn: &Connection, user_id: i64, term: &str) -> Result<Vec<String>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT word FROM
           (SELECT word FROM words WHERE user_id = ?1 AND word LIKE ?2
            UNION
            SELECT word FROM search_history WHERE user_id = ?1 AND word LIKE ?2)
         ORDER BY word ASC",
    )?;
    let pattern = format!("%{term}%");
    let words = stmt
        .query_map(params![user_id, pattern], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::migrations::{run_migrations, DEFAULT_USER_ID};
    use crate::data::word_repository;

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_history_is_append_only() {
        let conn = setup_db();
        record_search(&conn, DEFAULT_USER_ID, "cup").unwrap();
        record_search(&conn, DEFAULT_USER_ID, "cup").unwrap();

        let entries = search_history(&conn, DEFAULT_USER_ID, 10).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_recent_unique_groups_by_word() {
        let conn = setup_db();
        record_search(&conn, DEFAULT_USER_ID, "cup").unwrap();
        record_search(&conn, DEFAULT_USER_ID, "plate").unwrap();
        record_search(&conn, DEFAULT_USER_ID, "cup").unwrap();

        let recent = recent_unique_searches(&conn, DEFAULT_USER_ID, 10).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].word, "cup");
    }

    #[test]
    fn test_clear_and_remove_scoped_to_owner() {
        let conn = setup_db();
        conn.execute("INSERT INTO users (id, username) VALUES (2, 'other')", [])
            .unwrap();
        record_search(&conn, DEFAULT_USER_ID, "cup").unwrap();
        let other = record_search(&conn, 2, "plate").unwrap();

        assert_eq!(clear_history(&conn, DEFAULT_USER_ID).unwrap(), 1);
        assert_eq!(search_history(&conn, 2, 10).unwrap().len(), 1);

        remove_entry(&conn, other).unwrap();
        assert!(search_history(&conn, 2, 10).unwrap().is_empty());
    }

    #[test]
    fn test_suggestions_union_words_and_history() {
        let conn = setup_db();
        word_repository::ensure_word(&conn, DEFAULT_USER_ID, "teacup").unwrap();
        record_search(&conn, DEFAULT_USER_ID, "cupboard").unwrap();
        record_search(&conn, DEFAULT_USER_ID, "plate").unwrap();

        let hits = suggestions(&conn, DEFAULT_USER_ID, "cup").unwrap();
        assert_eq!(hits, vec!["cupboard".to_string(), "teacup".to_string()]);
    }
}
