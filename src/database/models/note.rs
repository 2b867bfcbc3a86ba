use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: i64,
    /// NULL once the owning account has been deleted with anonymization
    pub user_id: Option<i64>,
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub color: Option<String>,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Note {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == Some(user_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewNote {
    pub title: String,
    pub content: String,
    pub category: Option<String>,
    pub color: Option<String>,
    pub is_pinned: bool,
}

/// Partial update. Outer `None` = leave unchanged; `Some(None)` = set NULL.
#[derive(Debug, Clone, Default)]
pub struct NoteChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<Option<String>>,
    pub color: Option<Option<String>>,
    pub is_pinned: Option<bool>,
}

impl NoteChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.content.is_none()
            && self.category.is_none()
            && self.color.is_none()
            && self.is_pinned.is_none()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    Title,
    #[default]
    CreatedAt,
    UpdatedAt,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::Title => "title",
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn to_sql(self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

/// Validated listing filter for one user's notes
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub category: Option<String>,
    pub is_pinned: Option<bool>,
    pub search: Option<String>,
    pub sort_by: SortField,
    pub order: SortOrder,
}

/// Aggregates over one user's notes
#[derive(Debug, Clone, FromRow)]
pub struct NoteStats {
    pub total_notes: i64,
    pub pinned_notes: i64,
    pub unique_categories: i64,
    pub oldest_note: Option<DateTime<Utc>>,
    pub newest_note: Option<DateTime<Utc>>,
}
