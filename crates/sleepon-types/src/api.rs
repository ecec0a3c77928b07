use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::EntryStatus;

// -- JWT Claims --

/// Bearer token claims. The username is the only identity carried; every
/// per-user query is scoped by it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub message: String,
    pub username: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub username: String,
    pub display_name: String,
    pub avatar: String,
}

// -- Profile --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub username: String,
    pub display_name: String,
    pub avatar: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UpdateProfileRequest {
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub avatar: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileResponse {
    pub message: String,
    pub display_name: String,
    pub avatar: String,
}

// -- Entries --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateEntryRequest {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub mood: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryResponse {
    pub id: Uuid,
    pub username: String,
    pub title: String,
    pub content: String,
    pub mood: String,
    pub reflection: String,
    pub ai_response: String,
    pub status: Option<EntryStatus>,
    pub need_help_count: u32,
    pub preview: String,
    pub is_locked: bool,
    pub unlock_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_public: bool,
    pub is_anonymous: bool,
    pub is_finished: bool,
    pub reflections: Vec<ReflectionResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReflectionResponse {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub content: String,
    pub status: EntryStatus,
    pub ai_response: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RespondRequest {
    pub status: EntryStatus,
    #[serde(default)]
    pub reflection: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RespondResponse {
    pub entry: EntryResponse,
    pub ai_response: String,
}

/// Acknowledgement for unlock and delete.
#[derive(Debug, Serialize)]
pub struct EntryActionResponse {
    pub message: String,
    pub id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TogglePublicRequest {
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub is_anonymous: bool,
}

// -- Comments --

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CreateCommentRequest {
    pub content: String,
    #[serde(default)]
    pub is_anonymous: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: Uuid,
    pub entry_id: Uuid,
    pub username: String,
    pub content: String,
    pub is_anonymous: bool,
    pub created_at: DateTime<Utc>,
}

// -- Preferences --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SavePreferenceRequest {
    pub question: String,
    pub answer: String,
    #[serde(default)]
    pub category: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreferenceResponse {
    pub id: Uuid,
    pub username: String,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub created_at: DateTime<Utc>,
}

// -- Summary --

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryStats {
    pub total: usize,
    pub over_it: usize,
    pub still_dealing: usize,
    pub need_help: usize,
    /// Entries that have not been reflected on yet.
    pub pending: usize,
    /// Highest need-help streak across all entries.
    pub need_help_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryResponse {
    pub stats: SummaryStats,
    pub mental_score: u32,
    pub mental_state: String,
    pub mental_emoji: String,
    pub ai_summary: String,
}

// -- Insights --

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptsResponse {
    pub prompts: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyDigestResponse {
    pub digest: String,
    pub has_data: bool,
    pub entry_count: usize,
    pub moods: BTreeMap<String, usize>,
    pub statuses: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Critical,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    #[serde(rename = "type")]
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertsResponse {
    pub alerts: Vec<Alert>,
    pub need_help_rate: f64,
    pub max_streak: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: u32,
    pub text: String,
    pub category: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct QuestionsResponse {
    pub questions: Vec<Question>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_fields_are_camel_case() {
        let now = Utc::now();
        let entry = EntryResponse {
            id: Uuid::new_v4(),
            username: "mali".into(),
            title: "t".into(),
            content: "c".into(),
            mood: String::new(),
            reflection: String::new(),
            ai_response: String::new(),
            status: Some(EntryStatus::NeedHelp),
            need_help_count: 2,
            preview: String::new(),
            is_locked: false,
            unlock_at: now,
            created_at: now,
            is_public: false,
            is_anonymous: false,
            is_finished: false,
            reflections: vec![],
        };

        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["needHelpCount"], 2);
        assert_eq!(value["status"], "need_help");
        assert!(value.get("unlockAt").is_some());
        assert!(value.get("aiResponse").is_some());
    }

    #[test]
    fn create_entry_defaults_optional_flags() {
        let req: CreateEntryRequest =
            serde_json::from_str(r#"{"title":"Bad day","content":"..."}"#).unwrap();
        assert!(!req.is_public);
        assert!(!req.is_anonymous);
        assert!(req.mood.is_empty());
    }

    #[test]
    fn respond_rejects_unknown_status() {
        let res = serde_json::from_str::<RespondRequest>(r#"{"status":"meh"}"#);
        assert!(res.is_err());
    }

    #[test]
    fn alert_level_serializes_as_type() {
        let alert = Alert {
            level: AlertLevel::Critical,
            title: "x".into(),
            message: "y".into(),
        };
        let value = serde_json::to_value(&alert).unwrap();
        assert_eq!(value["type"], "critical");
    }
}
