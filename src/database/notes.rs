use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{NewNote, Note, NoteChanges, NoteFilter, NoteStats};
use crate::database::query_builder::{self, NOTE_COLUMNS};

/// Parameterized access to the `notes` table
#[derive(Clone)]
pub struct NoteRepository {
    pool: PgPool,
}

impl NoteRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, user_id: i64, filter: &NoteFilter) -> Result<Vec<Note>, DatabaseError> {
        let mut qb = query_builder::select_notes(user_id, filter);
        let notes = qb.build_query_as::<Note>().fetch_all(&self.pool).await?;
        Ok(notes)
    }

    pub async fn find(&self, note_id: i64) -> Result<Option<Note>, DatabaseError> {
        let note = sqlx::query_as::<_, Note>(&format!("SELECT {} FROM notes WHERE id = $1", NOTE_COLUMNS))
            .bind(note_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(note)
    }

    pub async fn create(&self, user_id: i64, note: NewNote) -> Result<Note, DatabaseError> {
        let created = sqlx::query_as::<_, Note>(&format!(
            r#"
            INSERT INTO notes (user_id, title, content, category, color, is_pinned)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {}
            "#,
            NOTE_COLUMNS
        ))
        .bind(user_id)
        .bind(note.title)
        .bind(note.content)
        .bind(note.category)
        .bind(note.color)
        .bind(note.is_pinned)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    /// Ok(None) when the note vanished between the ownership check and the update
    pub async fn update(&self, note_id: i64, changes: &NoteChanges) -> Result<Option<Note>, DatabaseError> {
        let Some(mut qb) = query_builder::update_note(note_id, changes) else {
            return self.find(note_id).await;
        };
        let updated = qb.build_query_as::<Note>().fetch_optional(&self.pool).await?;
        Ok(updated)
    }

    pub async fn delete(&self, note_id: i64) -> Result<bool, DatabaseError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(note_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn count_for_user(&self, user_id: i64) -> Result<i64, DatabaseError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notes WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn stats(&self, user_id: i64) -> Result<NoteStats, DatabaseError> {
        let stats = sqlx::query_as::<_, NoteStats>(
            r#"
            SELECT
                COUNT(*) AS total_notes,
                COUNT(*) FILTER (WHERE is_pinned) AS pinned_notes,
                COUNT(DISTINCT category) AS unique_categories,
                MIN(created_at) AS oldest_note,
                MAX(created_at) AS newest_note
            FROM notes
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(stats)
    }
}
