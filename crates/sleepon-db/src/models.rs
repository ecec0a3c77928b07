use chrono::{DateTime, Utc};

/// Rows as stored in SQLite. API shapes live in sleepon-types.
#[derive(Debug, Clone)]
pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub display_name: String,
    pub avatar: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EntryRow {
    pub id: String,
    pub username: String,
    pub title: String,
    pub content: String,
    pub mood: String,
    pub reflection: String,
    pub ai_response: String,
    /// `None` until the first reflection.
    pub status: Option<String>,
    pub need_help_count: u32,
    pub unlock_at: DateTime<Utc>,
    pub is_public: bool,
    pub is_anonymous: bool,
    pub is_finished: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ReflectionRow {
    pub id: String,
    pub entry_id: String,
    pub content: String,
    pub status: String,
    pub ai_response: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CommentRow {
    pub id: String,
    pub entry_id: String,
    pub username: String,
    pub content: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PreferenceRow {
    pub id: String,
    pub username: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

/// Fields for inserting a new entry.
pub struct NewEntry<'a> {
    pub id: &'a str,
    pub username: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub mood: &'a str,
    pub unlock_at: DateTime<Utc>,
    pub is_public: bool,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

/// One reflection applied to an entry: the history record plus the entry's
/// new denormalised state.
pub struct ReflectionUpdate<'a> {
    pub history_id: &'a str,
    pub entry_id: &'a str,
    pub reflection: &'a str,
    pub status: &'a str,
    pub ai_response: &'a str,
    pub need_help_count: u32,
    pub unlock_at: DateTime<Utc>,
    pub is_finished: bool,
    pub created_at: DateTime<Utc>,
}
