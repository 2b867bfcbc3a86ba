use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::api::{notes_to_views, NoteView, ProfileView, StatsView};
use crate::database::models::{NoteFilter, ProfileChanges, User};
use crate::database::{AccountRepository, DatabaseError, NoteDisposition, NoteRepository, UserRepository};
use crate::error::ApiError;
use crate::state::AppState;
use crate::validation::{is_valid_email, is_valid_username, trimmed, Validator, EMAIL_MESSAGE, USERNAME_MESSAGE};

pub const EXPORT_VERSION: &str = "1.0.0";

#[derive(Debug, Default, Deserialize)]
pub struct ProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Body of `DELETE /api/account`; notes are deleted unless told otherwise
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountRequest {
    pub delete_notes: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionSummary {
    pub deleted_notes: u64,
    pub anonymized_notes: u64,
}

/// Portable copy of everything stored about one user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportDocument {
    pub export_date: DateTime<Utc>,
    pub export_version: &'static str,
    pub user: ExportedUser,
    pub notes: Vec<NoteView>,
    pub statistics: ExportStatistics,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedUser {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub tos_version_accepted: Option<String>,
    pub tos_accepted_at: Option<DateTime<Utc>>,
    pub account_created: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl From<User> for ExportedUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            tos_version_accepted: user.tos_version_accepted,
            tos_accepted_at: user.tos_accepted_at,
            account_created: user.created_at,
            last_updated: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportStatistics {
    pub total_notes: usize,
    pub pinned_notes: usize,
    pub category_counts: BTreeMap<String, usize>,
}

impl ExportStatistics {
    fn from_notes(notes: &[NoteView]) -> Self {
        let mut category_counts = BTreeMap::new();
        for note in notes {
            let key = note.category.clone().unwrap_or_else(|| "uncategorized".to_string());
            *category_counts.entry(key).or_insert(0) += 1;
        }
        Self {
            total_notes: notes.len(),
            pinned_notes: notes.iter().filter(|n| n.is_pinned).count(),
            category_counts,
        }
    }
}

pub struct AccountService {
    users: UserRepository,
    notes: NoteRepository,
    accounts: AccountRepository,
}

impl AccountService {
    pub fn new(state: &AppState) -> Self {
        Self {
            users: state.users(),
            notes: state.notes(),
            accounts: state.accounts(),
        }
    }

    pub async fn update_profile(&self, user_id: i64, request: ProfileRequest) -> Result<ProfileView, ApiError> {
        let changes = validate_profile(request)?;

        if let Some(username) = &changes.username {
            if self.users.username_taken_by_other(username, user_id).await? {
                return Err(ApiError::conflict("This username is already taken"));
            }
        }
        if let Some(email) = &changes.email {
            if self.users.email_taken_by_other(email, user_id).await? {
                return Err(ApiError::conflict("This email is already registered"));
            }
        }

        let user = self
            .users
            .update_profile(user_id, &changes)
            .await?
            .ok_or_else(|| ApiError::not_found("User account not found"))?;
        info!("User {} updated their profile", user_id);
        Ok(ProfileView::from(user))
    }

    pub async fn export(&self, user_id: i64) -> Result<ExportDocument, ApiError> {
        let user = self
            .users
            .find_active_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User account not found"))?;

        let notes = notes_to_views(self.notes.list(user_id, &NoteFilter::default()).await?);
        let statistics = ExportStatistics::from_notes(&notes);

        info!("User {} exported {} notes", user_id, notes.len());
        Ok(ExportDocument {
            export_date: Utc::now(),
            export_version: EXPORT_VERSION,
            user: ExportedUser::from(user),
            notes,
            statistics,
        })
    }

    pub async fn stats(&self, user_id: i64) -> Result<StatsView, ApiError> {
        Ok(StatsView::from(self.notes.stats(user_id).await?))
    }

    /// Runs the deletion transaction; failures roll back and surface a generic 500
    pub async fn delete(&self, user_id: i64, request: DeleteAccountRequest) -> Result<DeletionSummary, ApiError> {
        let disposition = NoteDisposition::from_delete_flag(request.delete_notes.unwrap_or(true));

        match self.accounts.delete_account(user_id, disposition).await {
            Ok(outcome) => Ok(match outcome.disposition {
                NoteDisposition::Delete => DeletionSummary {
                    deleted_notes: outcome.notes_affected,
                    anonymized_notes: 0,
                },
                NoteDisposition::Anonymize => DeletionSummary {
                    deleted_notes: 0,
                    anonymized_notes: outcome.notes_affected,
                },
            }),
            Err(DatabaseError::NotFound(message)) => Err(ApiError::not_found(message)),
            Err(e) => {
                error!("Account deletion for user {} failed: {}", user_id, e);
                Err(ApiError::internal_server_error(
                    "An error occurred while deleting your account. Please try again.",
                ))
            }
        }
    }
}

/// Blank fields count as absent
fn validate_profile(request: ProfileRequest) -> Result<ProfileChanges, ApiError> {
    let username = trimmed(request.username.as_deref());
    let email = trimmed(request.email.as_deref()).map(|e| e.to_lowercase());
    if username.is_none() && email.is_none() {
        return Err(ApiError::bad_request("Please provide username or email to update"));
    }

    let mut v = Validator::new();
    if let Some(username) = &username {
        v.check("username", is_valid_username(username), USERNAME_MESSAGE);
    }
    if let Some(email) = &email {
        v.check("email", is_valid_email(email), EMAIL_MESSAGE);
    }
    v.finish()?;

    Ok(ProfileChanges { username, email })
}

/// `Content-Disposition` value for an export taken at `at`
pub fn export_filename(at: DateTime<Utc>) -> String {
    format!("attachment; filename=\"mini-notes-data-export-{}.json\"", at.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(category: Option<&str>, pinned: bool) -> NoteView {
        let now = Utc::now();
        NoteView {
            id: 1,
            title: "t".into(),
            content: "c".into(),
            category: category.map(str::to_string),
            color: None,
            is_pinned: pinned,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn statistics_bucket_missing_categories() {
        let notes = vec![note(Some("Work"), true), note(None, false), note(Some("Work"), false)];
        let stats = ExportStatistics::from_notes(&notes);
        assert_eq!(stats.total_notes, 3);
        assert_eq!(stats.pinned_notes, 1);
        assert_eq!(stats.category_counts["Work"], 2);
        assert_eq!(stats.category_counts["uncategorized"], 1);
    }

    #[test]
    fn profile_needs_at_least_one_field() {
        let err = validate_profile(ProfileRequest::default()).unwrap_err();
        assert_eq!(err.status_code(), 400);
        assert_eq!(err.message(), "Please provide username or email to update");
    }

    #[test]
    fn profile_email_is_normalized() {
        let changes = validate_profile(ProfileRequest {
            username: None,
            email: Some(" New@Example.com".into()),
        })
        .unwrap();
        assert_eq!(changes.email.as_deref(), Some("new@example.com"));
        assert!(changes.username.is_none());
    }

    #[test]
    fn blank_profile_fields_are_ignored() {
        let changes = validate_profile(ProfileRequest {
            username: Some(String::new()),
            email: Some("x@y.io".into()),
        })
        .unwrap();
        assert!(changes.username.is_none());
        assert_eq!(changes.email.as_deref(), Some("x@y.io"));

        let err = validate_profile(ProfileRequest {
            username: Some("  ".into()),
            email: Some(String::new()),
        })
        .unwrap_err();
        assert_eq!(err.message(), "Please provide username or email to update");
    }

    #[test]
    fn profile_rejects_invalid_username() {
        let err = validate_profile(ProfileRequest { username: Some("x".into()), email: None }).unwrap_err();
        assert_eq!(err.message(), USERNAME_MESSAGE);
    }

    #[test]
    fn delete_body_defaults_to_deleting_notes() {
        let request: DeleteAccountRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.delete_notes, None);
        let request: DeleteAccountRequest = serde_json::from_str(r#"{"deleteNotes": false}"#).unwrap();
        assert_eq!(request.delete_notes, Some(false));
    }

    #[test]
    fn export_filename_uses_millis() {
        let at = DateTime::parse_from_rfc3339("2024-01-02T03:04:05.678Z").unwrap().with_timezone(&Utc);
        assert_eq!(
            export_filename(at),
            "attachment; filename=\"mini-notes-data-export-1704164645678.json\""
        );
    }
}
