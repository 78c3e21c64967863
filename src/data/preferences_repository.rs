use rusqlite::{params, Connection, OptionalExtension};

use crate::error::AppError;
use crate::models::language::DisplayLanguage;

/// Missing row falls back to the default locale rather than erroring.
pub fn display_language(conn: &Connection, user_id: i64) -> Result<DisplayLanguage, AppError> {
    let stored: Option<String> = conn
        .query_row(
            "SELECT display_language FROM user_preferences WHERE user_id = ?1",
            params![user_id],
            |row| row.get(0),
        )
        .optional()?;
    Ok(stored
        .as_deref()
        .and_then(DisplayLanguage::from_locale)
        .unwrap_or(DisplayLanguage::DEFAULT))
}

pub fn set_display_language(
    conn: &Connection,
    user_id: i64,
    language: DisplayLanguage,
) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO user_preferences (user_id, display_language, updated_at)
         VALUES (?1, ?2, CURRENT_TIMESTAMP)
         ON CONFLICT (user_id) DO UPDATE SET
             display_language = excluded.display_language,
             updated_at = CURRENT_TIMESTAMP",
        params![user_id, language.locale()],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::migrations::{run_migrations, DEFAULT_USER_ID};

    fn setup_db() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn test_defaults_to_en_us() {
        let conn = setup_db();
        assert_eq!(
            display_language(&conn, DEFAULT_USER_ID).unwrap(),
            DisplayLanguage::EnUs
        );
    }

    #[test]
    fn test_set_then_update_keeps_single_row() {
        let conn = setup_db();
        set_display_language(&conn, DEFAULT_USER_ID, DisplayLanguage::ChineseSimplified).unwrap();
        set_display_language(&conn, DEFAULT_USER_ID, DisplayLanguage::French).unwrap();

        assert_eq!(
            display_language(&conn, DEFAULT_USER_ID).unwrap(),
            DisplayLanguage::French
        );
        let rows: i64 = conn
            .query_row("SELECT COUNT(*) FROM user_preferences", [], |r| r.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }
}
