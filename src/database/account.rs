use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{info, warn};

use crate::database::manager::DatabaseError;

/// What happens to a departing user's notes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoteDisposition {
    /// Remove the rows
    Delete,
    /// Keep the rows with `user_id` set to NULL
    Anonymize,
}

impl NoteDisposition {
    pub fn from_delete_flag(delete_notes: bool) -> Self {
        if delete_notes {
            NoteDisposition::Delete
        } else {
            NoteDisposition::Anonymize
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DeletionOutcome {
    pub disposition: NoteDisposition,
    pub notes_affected: u64,
}

/// Multi-statement account operations
#[derive(Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Dispose of the user's notes, mark the user deleted, then remove the row.
    /// All statements commit together or not at all.
    pub async fn delete_account(
        &self,
        user_id: i64,
        disposition: NoteDisposition,
    ) -> Result<DeletionOutcome, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        match Self::delete_within(&mut tx, user_id, disposition).await {
            Ok(outcome) => {
                tx.commit().await?;
                info!(
                    "Deleted account {} ({:?}, {} notes affected)",
                    user_id, outcome.disposition, outcome.notes_affected
                );
                Ok(outcome)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!("Rollback after failed account deletion also failed: {}", rollback_err);
                }
                Err(e)
            }
        }
    }

    async fn delete_within(
        tx: &mut Transaction<'_, Postgres>,
        user_id: i64,
        disposition: NoteDisposition,
    ) -> Result<DeletionOutcome, DatabaseError> {
        let notes = match disposition {
            NoteDisposition::Delete => {
                sqlx::query("DELETE FROM notes WHERE user_id = $1")
                    .bind(user_id)
                    .execute(&mut **tx)
                    .await?
            }
            NoteDisposition::Anonymize => {
                sqlx::query("UPDATE notes SET user_id = NULL WHERE user_id = $1")
                    .bind(user_id)
                    .execute(&mut **tx)
                    .await?
            }
        };

        // deleted_at is stamped before the row goes away
        sqlx::query("UPDATE users SET deleted_at = CURRENT_TIMESTAMP WHERE id = $1")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        let removed = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&mut **tx)
            .await?;

        if removed.rows_affected() == 0 {
            return Err(DatabaseError::NotFound("User account not found".to_string()));
        }

        Ok(DeletionOutcome {
            disposition,
            notes_affected: notes.rows_affected(),
        })
    }
}
