use serde::Deserialize;
use tracing::info;

use crate::api::deserialize_some;
use crate::database::models::{NewNote, Note, NoteChanges, NoteFilter, SortField, SortOrder};
use crate::database::NoteRepository;
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{
    char_len, is_valid_color, trimmed, Validator, CATEGORY_MAX_LEN, CONTENT_MAX_LEN, SEARCH_MAX_LEN, TITLE_MAX_LEN,
};

const COLOR_MESSAGE: &str = "Color must be in hex format (#RRGGBB)";

/// Raw `GET /api/notes` query string; every value arrives as text
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNotesQuery {
    pub category: Option<String>,
    pub is_pinned: Option<String>,
    pub search: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub is_pinned: Option<bool>,
}

/// Partial update body. Explicit `null` clears category or color.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub category: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_some")]
    pub color: Option<Option<String>>,
    #[serde(default)]
    pub is_pinned: Option<bool>,
}

pub struct NoteService {
    notes: NoteRepository,
}

impl NoteService {
    pub fn new(state: &AppState) -> Self {
        Self { notes: state.notes() }
    }

    pub async fn list(&self, user_id: i64, query: ListNotesQuery) -> Result<Vec<Note>, ApiError> {
        let filter = parse_filter(query)?;
        Ok(self.notes.list(user_id, &filter).await?)
    }

    pub async fn get(&self, user_id: i64, note_id: i64) -> Result<Note, ApiError> {
        self.owned_note(user_id, note_id).await
    }

    pub async fn create(&self, user_id: i64, request: CreateNoteRequest) -> Result<Note, ApiError> {
        let note = validate_create(request)?;
        let created = self.notes.create(user_id, note).await?;
        info!("User {} created note {}", user_id, created.id);
        Ok(created)
    }

    pub async fn update(&self, user_id: i64, note_id: i64, request: UpdateNoteRequest) -> Result<Note, ApiError> {
        self.owned_note(user_id, note_id).await?;

        let changes = validate_update(request)?;
        if changes.is_empty() {
            return Err(ApiError::bad_request("No fields to update"));
        }

        self.notes
            .update(note_id, &changes)
            .await?
            .ok_or_else(|| ApiError::not_found("Note not found"))
    }

    pub async fn delete(&self, user_id: i64, note_id: i64) -> Result<(), ApiError> {
        self.owned_note(user_id, note_id).await?;

        if !self.notes.delete(note_id).await? {
            return Err(ApiError::not_found("Note not found"));
        }
        info!("User {} deleted note {}", user_id, note_id);
        Ok(())
    }

    /// 404 when the note does not exist, 403 when it belongs to someone else or nobody
    async fn owned_note(&self, user_id: i64, note_id: i64) -> Result<Note, ApiError> {
        let note = self
            .notes
            .find(note_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Note not found"))?;

        if !note.is_owned_by(user_id) {
            tracing::warn!("User {} denied access to note {}", user_id, note_id);
            return Err(ApiError::forbidden("You do not have permission to access this note"));
        }
        Ok(note)
    }
}

/// Path ids must be positive integers
pub fn parse_note_id(raw: &str) -> Result<i64, ApiError> {
    match raw.trim().parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ApiError::field("id", "Note ID must be a positive integer")),
    }
}

fn parse_filter(query: ListNotesQuery) -> Result<NoteFilter, ApiError> {
    let mut v = Validator::new();

    let category = trimmed(query.category.as_deref());
    if let Some(category) = &category {
        v.check(
            "category",
            char_len(category) <= CATEGORY_MAX_LEN,
            format!("Category must be {} characters or less", CATEGORY_MAX_LEN),
        );
    }

    let is_pinned = match query.is_pinned.as_deref().map(str::trim) {
        None | Some("") => None,
        Some("true") => Some(true),
        Some("false") => Some(false),
        Some(_) => {
            v.fail("isPinned", "isPinned must be true or false");
            None
        }
    };

    let search = trimmed(query.search.as_deref());
    if let Some(search) = &search {
        v.check(
            "search",
            char_len(search) <= SEARCH_MAX_LEN,
            format!("Search query must be {} characters or less", SEARCH_MAX_LEN),
        );
    }

    let sort_by = match query.sort_by.as_deref().map(str::trim) {
        None | Some("") => SortField::default(),
        Some("title") => SortField::Title,
        Some("created_at") => SortField::CreatedAt,
        Some("updated_at") => SortField::UpdatedAt,
        Some(_) => {
            v.fail("sortBy", "sortBy must be one of: title, created_at, updated_at");
            SortField::default()
        }
    };

    let order = match query.order.as_deref().map(|o| o.trim().to_ascii_lowercase()) {
        None => SortOrder::default(),
        Some(o) if o.is_empty() => SortOrder::default(),
        Some(o) if o == "asc" => SortOrder::Asc,
        Some(o) if o == "desc" => SortOrder::Desc,
        Some(_) => {
            v.fail("order", "order must be asc or desc");
            SortOrder::default()
        }
    };

    v.finish()?;
    Ok(NoteFilter {
        category,
        is_pinned,
        search,
        sort_by,
        order,
    })
}

fn check_title(v: &mut Validator, title: &str) {
    v.check("title", !title.is_empty(), "Title is required");
    v.check(
        "title",
        char_len(title) <= TITLE_MAX_LEN,
        format!("Title must be {} characters or less", TITLE_MAX_LEN),
    );
}

fn check_content(v: &mut Validator, content: &str) {
    v.check(
        "content",
        char_len(content) <= CONTENT_MAX_LEN,
        format!("Content must not exceed {} characters", CONTENT_MAX_LEN),
    );
}

fn check_category(v: &mut Validator, category: Option<&str>) {
    if let Some(category) = category {
        v.check(
            "category",
            char_len(category) <= CATEGORY_MAX_LEN,
            format!("Category must be {} characters or less", CATEGORY_MAX_LEN),
        );
    }
}

/// Blank colors clear the field; anything else must be #RRGGBB
fn normalize_color(v: &mut Validator, color: Option<&str>) -> Option<String> {
    let color = trimmed(color)?;
    v.check("color", is_valid_color(&color), COLOR_MESSAGE);
    Some(color)
}

fn validate_create(request: CreateNoteRequest) -> Result<NewNote, ApiError> {
    let mut v = Validator::new();

    let title = request.title.as_deref().map(str::trim).unwrap_or_default().to_string();
    check_title(&mut v, &title);

    let content = v
        .required("content", request.content.as_deref(), "Content is required")
        .unwrap_or_default()
        .to_string();
    check_content(&mut v, &content);

    let category = trimmed(request.category.as_deref());
    check_category(&mut v, category.as_deref());

    let color = normalize_color(&mut v, request.color.as_deref());

    v.finish()?;
    Ok(NewNote {
        title,
        content,
        category,
        color,
        is_pinned: request.is_pinned.unwrap_or(false),
    })
}

fn validate_update(request: UpdateNoteRequest) -> Result<NoteChanges, ApiError> {
    let mut v = Validator::new();

    let title = request.title.map(|t| t.trim().to_string());
    if let Some(title) = &title {
        check_title(&mut v, title);
    }

    if let Some(content) = &request.content {
        check_content(&mut v, content);
    }

    let category = request.category.map(|c| trimmed(c.as_deref()));
    if let Some(category) = &category {
        check_category(&mut v, category.as_deref());
    }

    let color = request.color.map(|c| normalize_color(&mut v, c.as_deref()));

    v.finish()?;
    Ok(NoteChanges {
        title,
        content: request.content,
        category,
        color,
        is_pinned: request.is_pinned,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create(title: &str, content: Option<&str>) -> CreateNoteRequest {
        CreateNoteRequest {
            title: Some(title.into()),
            content: content.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn note_ids_must_be_positive_integers() {
        assert_eq!(parse_note_id("42").unwrap(), 42);
        for raw in ["0", "-3", "abc", "1.5", ""] {
            let err = parse_note_id(raw).unwrap_err();
            assert_eq!(err.status_code(), 400, "{raw}");
        }
    }

    #[test]
    fn create_trims_title_and_blank_category() {
        let request = CreateNoteRequest {
            category: Some("   ".into()),
            color: Some("#aabbcc".into()),
            ..create("  Groceries  ", Some("milk"))
        };
        let note = validate_create(request).unwrap();
        assert_eq!(note.title, "Groceries");
        assert_eq!(note.category, None);
        assert_eq!(note.color.as_deref(), Some("#aabbcc"));
        assert!(!note.is_pinned);
    }

    #[test]
    fn create_rejects_missing_and_oversized_fields() {
        let err = validate_create(create("   ", None)).unwrap_err();
        let body = err.to_json();
        assert_eq!(body["field_errors"]["title"], "Title is required");
        assert_eq!(body["field_errors"]["content"], "Content is required");

        let err = validate_create(create(&"t".repeat(201), Some("x"))).unwrap_err();
        assert_eq!(err.message(), "Title must be 200 characters or less");

        let err = validate_create(create("t", Some(&"c".repeat(10_001)))).unwrap_err();
        assert_eq!(err.message(), "Content must not exceed 10000 characters");
    }

    #[test]
    fn empty_content_is_allowed() {
        assert!(validate_create(create("title", Some(""))).is_ok());
    }

    #[test]
    fn bad_color_is_rejected() {
        let request = CreateNoteRequest { color: Some("blue".into()), ..create("t", Some("c")) };
        assert_eq!(validate_create(request).unwrap_err().message(), COLOR_MESSAGE);
    }

    #[test]
    fn update_distinguishes_null_from_absent() {
        let request: UpdateNoteRequest =
            serde_json::from_str(r#"{"category": null, "isPinned": true}"#).unwrap();
        let changes = validate_update(request).unwrap();
        assert_eq!(changes.category, Some(None));
        assert_eq!(changes.color, None);
        assert_eq!(changes.is_pinned, Some(true));
        assert!(changes.title.is_none());
    }

    #[test]
    fn empty_update_has_no_changes() {
        let request: UpdateNoteRequest = serde_json::from_str("{}").unwrap();
        assert!(validate_update(request).unwrap().is_empty());
    }

    #[test]
    fn update_rejects_blank_title() {
        let request: UpdateNoteRequest = serde_json::from_str(r#"{"title": "  "}"#).unwrap();
        assert_eq!(validate_update(request).unwrap_err().message(), "Title is required");
    }

    #[test]
    fn filter_defaults() {
        let filter = parse_filter(ListNotesQuery::default()).unwrap();
        assert_eq!(filter.sort_by, SortField::CreatedAt);
        assert_eq!(filter.order, SortOrder::Desc);
        assert!(filter.category.is_none() && filter.search.is_none() && filter.is_pinned.is_none());
    }

    #[test]
    fn filter_parses_values() {
        let filter = parse_filter(ListNotesQuery {
            category: Some(" Work ".into()),
            is_pinned: Some("false".into()),
            search: Some("milk".into()),
            sort_by: Some("title".into()),
            order: Some("ASC".into()),
        })
        .unwrap();
        assert_eq!(filter.category.as_deref(), Some("Work"));
        assert_eq!(filter.is_pinned, Some(false));
        assert_eq!(filter.sort_by, SortField::Title);
        assert_eq!(filter.order, SortOrder::Asc);
    }

    #[test]
    fn filter_rejects_unknown_sort_and_pin_values() {
        let err = parse_filter(ListNotesQuery {
            sort_by: Some("password_hash".into()),
            is_pinned: Some("yes".into()),
            ..Default::default()
        })
        .unwrap_err();
        let body = err.to_json();
        assert!(body["field_errors"]["sortBy"].is_string());
        assert!(body["field_errors"]["isPinned"].is_string());
    }

    #[test]
    fn filter_rejects_long_search() {
        let err = parse_filter(ListNotesQuery { search: Some("s".repeat(101)), ..Default::default() }).unwrap_err();
        assert_eq!(err.message(), "Search query must be 100 characters or less");
    }
}
