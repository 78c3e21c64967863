use serde::Serialize;

/// One row of the append-only `search_history` table.
#[derive(Debug, Clone, Serialize)]
pub struct SearchHistoryEntry {
    pub id: i64,
    pub user_id: i64,
    pub word: String,
    pub created_at: Option<String>,
}

/// A word grouped out of the history with its most recent search time.
#[derive(Debug, Clone, Serialize)]
pub struct RecentSearch {
    pub word: String,
    pub latest_search: String,
}
