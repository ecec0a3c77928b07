use crate::Database;
use crate::models::{
    CommentRow, EntryRow, NewEntry, PreferenceRow, ReflectionRow, ReflectionUpdate, UserRow,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::{Connection, Row, params};

const ENTRY_COLUMNS: &str = "id, username, title, content, mood, reflection, ai_response, status, \
     need_help_count, unlock_at, is_public, is_anonymous, is_finished, created_at";

impl Database {
    // -- Users --

    /// Insert a user. Returns false, leaving the table untouched, when the
    /// username is already taken.
    pub fn create_user(
        &self,
        id: &str,
        username: &str,
        password_hash: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, password, created_at) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(username) DO NOTHING",
                params![id, username, password_hash, created_at],
            )?;
            Ok(inserted > 0)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    /// Replace display name and avatar. Returns false when the user is gone.
    pub fn update_profile(&self, username: &str, display_name: &str, avatar: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE users SET display_name = ?1, avatar = ?2 WHERE username = ?3",
                params![display_name, avatar, username],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Entries --

    pub fn insert_entry(&self, entry: &NewEntry<'_>) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO entries (id, username, title, content, mood, unlock_at, is_public, is_anonymous, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    entry.id,
                    entry.username,
                    entry.title,
                    entry.content,
                    entry.mood,
                    entry.unlock_at,
                    entry.is_public,
                    entry.is_anonymous,
                    entry.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Entry by id, only if `username` owns it.
    pub fn get_entry(&self, id: &str, username: &str) -> Result<Option<EntryRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1 AND username = ?2");
            conn.query_row(&sql, params![id, username], map_entry).optional()
        })
    }

    /// Entry by id regardless of owner. Comment routes use this.
    pub fn get_entry_by_id(&self, id: &str) -> Result<Option<EntryRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1");
            conn.query_row(&sql, [id], map_entry).optional()
        })
    }

    /// The owner's private entries, newest first. Public ones live in the feed.
    pub fn list_private_entries(&self, username: &str) -> Result<Vec<EntryRow>> {
        self.with_conn(|conn| {
            query_entries(
                conn,
                "WHERE username = ?1 AND is_public = 0 ORDER BY created_at DESC",
                params![username],
            )
        })
    }

    /// Every entry the user owns, oldest first.
    pub fn list_all_entries(&self, username: &str) -> Result<Vec<EntryRow>> {
        self.with_conn(|conn| {
            query_entries(conn, "WHERE username = ?1 ORDER BY created_at ASC", params![username])
        })
    }

    pub fn recent_entries(&self, username: &str, limit: u32) -> Result<Vec<EntryRow>> {
        self.with_conn(|conn| {
            query_entries(
                conn,
                "WHERE username = ?1 ORDER BY created_at DESC LIMIT ?2",
                params![username, limit],
            )
        })
    }

    pub fn entries_since(&self, username: &str, since: DateTime<Utc>) -> Result<Vec<EntryRow>> {
        self.with_conn(|conn| {
            query_entries(
                conn,
                "WHERE username = ?1 AND created_at >= ?2 ORDER BY created_at ASC",
                params![username, since],
            )
        })
    }

    /// Public entries whose unlock time has passed, newest first.
    pub fn public_entries(&self, now: DateTime<Utc>) -> Result<Vec<EntryRow>> {
        self.with_conn(|conn| {
            query_entries(
                conn,
                "WHERE is_public = 1 AND unlock_at <= ?1 ORDER BY created_at DESC",
                params![now],
            )
        })
    }

    /// Append the history record and update the entry in one transaction.
    pub fn apply_reflection(&self, update: &ReflectionUpdate<'_>) -> Result<()> {
        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            tx.execute(
                "INSERT INTO reflection_history (id, entry_id, content, status, ai_response, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    update.history_id,
                    update.entry_id,
                    update.reflection,
                    update.status,
                    update.ai_response,
                    update.created_at,
                ],
            )?;
            tx.execute(
                "UPDATE entries
                 SET status = ?1, reflection = ?2, ai_response = ?3, need_help_count = ?4,
                     unlock_at = ?5, is_finished = ?6
                 WHERE id = ?7",
                params![
                    update.status,
                    update.reflection,
                    update.ai_response,
                    update.need_help_count,
                    update.unlock_at,
                    update.is_finished,
                    update.entry_id,
                ],
            )?;
            tx.commit()?;
            Ok(())
        })
    }

    pub fn get_reflections(&self, entry_id: &str) -> Result<Vec<ReflectionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, entry_id, content, status, ai_response, created_at
                 FROM reflection_history WHERE entry_id = ?1 ORDER BY created_at ASC",
            )?;

            let rows = stmt
                .query_map([entry_id], |row| {
                    Ok(ReflectionRow {
                        id: row.get(0)?,
                        entry_id: row.get(1)?,
                        content: row.get(2)?,
                        status: row.get(3)?,
                        ai_response: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    /// Set unlock time to `now`. Returns false when the entry is absent or not owned.
    pub fn unlock_entry(&self, id: &str, username: &str, now: DateTime<Utc>) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE entries SET unlock_at = ?1 WHERE id = ?2 AND username = ?3",
                params![now, id, username],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn set_visibility(
        &self,
        id: &str,
        username: &str,
        is_public: bool,
        is_anonymous: bool,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE entries SET is_public = ?1, is_anonymous = ?2 WHERE id = ?3 AND username = ?4",
                params![is_public, is_anonymous, id, username],
            )?;
            Ok(changed > 0)
        })
    }

    /// Delete an owned entry; history and comments go with it.
    pub fn delete_entry(&self, id: &str, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM entries WHERE id = ?1 AND username = ?2",
                params![id, username],
            )?;
            Ok(changed > 0)
        })
    }

    // -- Comments --

    pub fn insert_comment(&self, comment: &CommentRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (id, entry_id, username, content, is_anonymous, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    comment.id,
                    comment.entry_id,
                    comment.username,
                    comment.content,
                    comment.is_anonymous,
                    comment.created_at,
                ],
            )?;
            Ok(())
        })
    }

    /// Comments on an entry, oldest first.
    pub fn get_comments(&self, entry_id: &str) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, entry_id, username, content, is_anonymous, created_at
                 FROM comments WHERE entry_id = ?1 ORDER BY created_at ASC",
            )?;

            let rows = stmt
                .query_map([entry_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        entry_id: row.get(1)?,
                        username: row.get(2)?,
                        content: row.get(3)?,
                        is_anonymous: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Preferences --

    pub fn insert_preference(&self, pref: &PreferenceRow) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO preferences (id, username, question, answer, category, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    pref.id,
                    pref.username,
                    pref.question,
                    pref.answer,
                    pref.category,
                    pref.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_preferences(&self, username: &str) -> Result<Vec<PreferenceRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, username, question, answer, category, created_at
                 FROM preferences WHERE username = ?1 ORDER BY created_at ASC",
            )?;

            let rows = stmt
                .query_map([username], |row| {
                    Ok(PreferenceRow {
                        id: row.get(0)?,
                        username: row.get(1)?,
                        question: row.get(2)?,
                        answer: row.get(3)?,
                        category: row.get(4)?,
                        created_at: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password, display_name, avatar, created_at FROM users WHERE username = ?1",
    )?;

    let row = stmt
        .query_row([username], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                display_name: row.get(3)?,
                avatar: row.get(4)?,
                created_at: row.get(5)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_entries(
    conn: &Connection,
    clause: &str,
    params: impl rusqlite::Params,
) -> Result<Vec<EntryRow>> {
    let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries {clause}");
    let mut stmt = conn.prepare(&sql)?;

    let rows = stmt
        .query_map(params, map_entry)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_entry(row: &Row<'_>) -> rusqlite::Result<EntryRow> {
    Ok(EntryRow {
        id: row.get(0)?,
        username: row.get(1)?,
        title: row.get(2)?,
        content: row.get(3)?,
        mood: row.get(4)?,
        reflection: row.get(5)?,
        ai_response: row.get(6)?,
        status: row.get(7)?,
        need_help_count: row.get(8)?,
        unlock_at: row.get(9)?,
        is_public: row.get(10)?,
        is_anonymous: row.get(11)?,
        is_finished: row.get(12)?,
        created_at: row.get(13)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;

    fn db() -> Database {
        Database::open_in_memory().unwrap()
    }

    fn add_entry(db: &Database, username: &str, is_public: bool, unlock_at: DateTime<Utc>) -> String {
        let id = Uuid::new_v4().to_string();
        db.insert_entry(&NewEntry {
            id: &id,
            username,
            title: "Rough meeting",
            content: "Everyone talked over me again.",
            mood: "😤",
            unlock_at,
            is_public,
            is_anonymous: false,
            created_at: Utc::now(),
        })
        .unwrap();
        id
    }

    fn reflect(db: &Database, entry_id: &str, status: &str) {
        let history_id = Uuid::new_v4().to_string();
        db.apply_reflection(&ReflectionUpdate {
            history_id: &history_id,
            entry_id,
            reflection: "Slept on it",
            status,
            ai_response: "Thanks for sharing",
            need_help_count: 0,
            unlock_at: Utc::now(),
            is_finished: status == "over_it",
            created_at: Utc::now(),
        })
        .unwrap();
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let db = db();
        assert!(db.create_user("1", "mali", "hash", Utc::now()).unwrap());
        assert!(!db.create_user("2", "mali", "other", Utc::now()).unwrap());

        let user = db.get_user_by_username("mali").unwrap().unwrap();
        assert_eq!(user.id, "1");
        assert!(user.display_name.is_empty());
    }

    #[test]
    fn profile_update_targets_existing_user() {
        let db = db();
        db.create_user("1", "mali", "hash", Utc::now()).unwrap();
        assert!(db.update_profile("mali", "Mali", "https://img/a.png").unwrap());
        assert!(!db.update_profile("ghost", "Ghost", "").unwrap());

        let user = db.get_user_by_username("mali").unwrap().unwrap();
        assert_eq!(user.display_name, "Mali");
        assert_eq!(user.avatar, "https://img/a.png");
    }

    #[test]
    fn entries_are_scoped_by_owner() {
        let db = db();
        let id = add_entry(&db, "mali", false, Utc::now());

        assert!(db.get_entry(&id, "mali").unwrap().is_some());
        assert!(db.get_entry(&id, "niran").unwrap().is_none());
        assert!(!db.unlock_entry(&id, "niran", Utc::now()).unwrap());
        assert!(!db.delete_entry(&id, "niran").unwrap());
        assert!(db.get_entry_by_id(&id).unwrap().is_some());
    }

    #[test]
    fn private_list_excludes_public_entries() {
        let db = db();
        add_entry(&db, "mali", false, Utc::now());
        add_entry(&db, "mali", true, Utc::now());

        assert_eq!(db.list_private_entries("mali").unwrap().len(), 1);
        assert_eq!(db.list_all_entries("mali").unwrap().len(), 2);
    }

    #[test]
    fn public_feed_only_shows_unlocked_entries() {
        let db = db();
        let now = Utc::now();
        let open = add_entry(&db, "mali", true, now - Duration::minutes(1));
        add_entry(&db, "mali", true, now + Duration::hours(3));
        add_entry(&db, "mali", false, now - Duration::minutes(1));

        let feed = db.public_entries(now).unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].id, open);
    }

    #[test]
    fn reflection_updates_entry_and_appends_history() {
        let db = db();
        let id = add_entry(&db, "mali", false, Utc::now());

        reflect(&db, &id, "still_dealing");
        reflect(&db, &id, "over_it");

        let entry = db.get_entry(&id, "mali").unwrap().unwrap();
        assert_eq!(entry.status.as_deref(), Some("over_it"));
        assert_eq!(entry.reflection, "Slept on it");
        assert!(entry.is_finished);

        let history = db.get_reflections(&id).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].status, "still_dealing");
        assert_eq!(history[1].status, "over_it");
    }

    #[test]
    fn deleting_entry_cascades() {
        let db = db();
        let id = add_entry(&db, "mali", true, Utc::now());
        reflect(&db, &id, "still_dealing");
        db.insert_comment(&CommentRow {
            id: Uuid::new_v4().to_string(),
            entry_id: id.clone(),
            username: "niran".into(),
            content: "You've got this".into(),
            is_anonymous: false,
            created_at: Utc::now(),
        })
        .unwrap();

        assert!(db.delete_entry(&id, "mali").unwrap());
        assert!(db.get_reflections(&id).unwrap().is_empty());
        assert!(db.get_comments(&id).unwrap().is_empty());
    }

    #[test]
    fn entries_since_filters_by_creation_time() {
        let db = db();
        let now = Utc::now();
        add_entry(&db, "mali", false, now);

        assert_eq!(db.entries_since("mali", now - Duration::days(7)).unwrap().len(), 1);
        assert!(db.entries_since("mali", now + Duration::days(1)).unwrap().is_empty());
    }

    #[test]
    fn preferences_round_trip_per_user() {
        let db = db();
        db.insert_preference(&PreferenceRow {
            id: Uuid::new_v4().to_string(),
            username: "mali".into(),
            question: "What calms you down?".into(),
            answer: "Long walks".into(),
            category: "coping".into(),
            created_at: Utc::now(),
        })
        .unwrap();

        assert_eq!(db.get_preferences("mali").unwrap().len(), 1);
        assert!(db.get_preferences("niran").unwrap().is_empty());
    }
}
