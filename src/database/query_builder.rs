use sqlx::{Postgres, QueryBuilder};

use crate::database::models::{NoteChanges, NoteFilter};

pub const NOTE_COLUMNS: &str =
    "id, user_id, title, content, category, color, is_pinned, created_at, updated_at";

/// SELECT over one user's notes with optional category, pin and text filters.
///
/// Sort column and direction come from closed enums, never from user text.
pub fn select_notes(user_id: i64, filter: &NoteFilter) -> QueryBuilder<'static, Postgres> {
    let mut qb = QueryBuilder::new(format!("SELECT {} FROM notes WHERE user_id = ", NOTE_COLUMNS));
    qb.push_bind(user_id);

    if let Some(category) = &filter.category {
        qb.push(" AND LOWER(category) = LOWER(");
        qb.push_bind(category.clone());
        qb.push(")");
    }

    if let Some(is_pinned) = filter.is_pinned {
        qb.push(" AND is_pinned = ");
        qb.push_bind(is_pinned);
    }

    if let Some(search) = &filter.search {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (title ILIKE ");
        qb.push_bind(pattern.clone());
        qb.push(" OR content ILIKE ");
        qb.push_bind(pattern);
        qb.push(")");
    }

    qb.push(format!(
        " ORDER BY {} {}, id {}",
        filter.sort_by.column(),
        filter.order.to_sql(),
        filter.order.to_sql()
    ));
    qb
}

/// UPDATE for the fields present in `changes`, bumping updated_at.
/// Returns None when there is nothing to update.
pub fn update_note(note_id: i64, changes: &NoteChanges) -> Option<QueryBuilder<'static, Postgres>> {
    if changes.is_empty() {
        return None;
    }

    let mut qb = QueryBuilder::new("UPDATE notes SET ");
    {
        let mut set = qb.separated(", ");
        if let Some(title) = &changes.title {
            set.push("title = ");
            set.push_bind_unseparated(title.clone());
        }
        if let Some(content) = &changes.content {
            set.push("content = ");
            set.push_bind_unseparated(content.clone());
        }
        if let Some(category) = &changes.category {
            set.push("category = ");
            set.push_bind_unseparated(category.clone());
        }
        if let Some(color) = &changes.color {
            set.push("color = ");
            set.push_bind_unseparated(color.clone());
        }
        if let Some(is_pinned) = changes.is_pinned {
            set.push("is_pinned = ");
            set.push_bind_unseparated(is_pinned);
        }
        set.push("updated_at = CURRENT_TIMESTAMP");
    }
    qb.push(" WHERE id = ");
    qb.push_bind(note_id);
    qb.push(format!(" RETURNING {}", NOTE_COLUMNS));
    Some(qb)
}

/// Escape LIKE metacharacters so user search text matches literally
fn escape_like(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
