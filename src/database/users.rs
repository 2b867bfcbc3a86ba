use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, ProfileChanges, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, tos_accepted_at, \
     tos_version_accepted, created_at, updated_at, deleted_at";

/// Queries over the `users` table. "Active" means `deleted_at IS NULL`.
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_active_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_active_by_id(&self, user_id: i64) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1 AND deleted_at IS NULL",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn email_in_use(&self, email: &str) -> Result<bool, DatabaseError> {
        self.exists("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND deleted_at IS NULL)", email)
            .await
    }

    pub async fn username_in_use(&self, username: &str) -> Result<bool, DatabaseError> {
        self.exists(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND deleted_at IS NULL)",
            username,
        )
        .await
    }

    async fn exists(&self, sql: &str, value: &str) -> Result<bool, DatabaseError> {
        let (exists,): (bool,) = sqlx::query_as(sql).bind(value).fetch_one(&self.pool).await?;
        Ok(exists)
    }

    /// True if another account (any state) already holds the value
    pub async fn email_taken_by_other(&self, email: &str, user_id: i64) -> Result<bool, DatabaseError> {
        let (taken,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1 AND id <> $2)")
                .bind(email)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    pub async fn username_taken_by_other(&self, username: &str, user_id: i64) -> Result<bool, DatabaseError> {
        let (taken,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 AND id <> $2)")
                .bind(username)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;
        Ok(taken)
    }

    /// Insert an account with ToS consent recorded at creation time
    pub async fn create(&self, user: NewUser) -> Result<User, DatabaseError> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, tos_accepted_at, tos_version_accepted)
            VALUES ($1, $2, $3, CURRENT_TIMESTAMP, $4)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(user.username)
        .bind(user.email)
        .bind(user.password_hash)
        .bind(user.tos_version)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    pub async fn accept_tos(&self, user_id: i64, version: &str) -> Result<Option<User>, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET tos_version_accepted = $1, tos_accepted_at = CURRENT_TIMESTAMP, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND deleted_at IS NULL
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(version)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        changes: &ProfileChanges,
    ) -> Result<Option<User>, DatabaseError> {
        if changes.is_empty() {
            return self.find_active_by_id(user_id).await;
        }

        let mut qb: QueryBuilder<'_, Postgres> = QueryBuilder::new("UPDATE users SET ");
        {
            let mut set = qb.separated(", ");
            if let Some(username) = &changes.username {
                set.push("username = ");
                set.push_bind_unseparated(username.clone());
            }
            if let Some(email) = &changes.email {
                set.push("email = ");
                set.push_bind_unseparated(email.clone());
            }
            set.push("updated_at = CURRENT_TIMESTAMP");
        }
        qb.push(" WHERE deleted_at IS NULL AND id = ");
        qb.push_bind(user_id);
        qb.push(format!(" RETURNING {}", USER_COLUMNS));

        let user = qb.build_query_as::<User>().fetch_optional(&self.pool).await?;
        Ok(user)
    }
}
