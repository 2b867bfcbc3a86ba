//! Client-facing JSON shapes. Database rows use snake_case; the wire uses camelCase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::database::models::{Note, NoteStats, User};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub color: Option<String>,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Note> for NoteView {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            content: note.content,
            category: note.category,
            color: note.color,
            is_pinned: note.is_pinned,
            created_at: note.created_at,
            updated_at: note.updated_at,
        }
    }
}

pub fn notes_to_views(notes: Vec<Note>) -> Vec<NoteView> {
    notes.into_iter().map(NoteView::from).collect()
}

/// User summary returned by the auth endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub tos_version_accepted: Option<String>,
    pub tos_accepted_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needs_tos_update: Option<bool>,
    pub created_at: DateTime<Utc>,
}

impl UserView {
    pub fn new(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            tos_version_accepted: user.tos_version_accepted.clone(),
            tos_accepted_at: user.tos_accepted_at,
            needs_tos_update: None,
            created_at: user.created_at,
        }
    }

    /// Include the re-consent flag computed against `current_tos`
    pub fn with_tos_status(user: &User, current_tos: &str) -> Self {
        Self {
            needs_tos_update: Some(user.needs_tos_update(current_tos)),
            ..Self::new(user)
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileView {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for ProfileView {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub total_notes: i64,
    pub pinned_notes: i64,
    pub unique_categories: i64,
    pub oldest_note: Option<DateTime<Utc>>,
    pub newest_note: Option<DateTime<Utc>>,
}

impl From<NoteStats> for StatsView {
    fn from(stats: NoteStats) -> Self {
        Self {
            total_notes: stats.total_notes,
            pinned_notes: stats.pinned_notes,
            unique_categories: stats.unique_categories,
            oldest_note: stats.oldest_note,
            newest_note: stats.newest_note,
        }
    }
}
