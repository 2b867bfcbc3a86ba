use sqlx::PgPool;
use tracing::info;

use crate::auth::password::hash_password;
use crate::database::manager::DatabaseError;
use crate::database::models::{NewNote, NewUser};
use crate::database::notes::NoteRepository;
use crate::database::users::UserRepository;

pub const DEMO_EMAIL: &str = "demo@test.com";
pub const DEMO_USERNAME: &str = "demo";
pub const DEMO_PASSWORD: &str = "Demo123!";

/// Create the demo account and its starter notes if they are missing. Safe to rerun.
pub async fn seed_demo_account(pool: &PgPool, bcrypt_cost: u32, tos_version: &str) -> anyhow::Result<()> {
    let users = UserRepository::new(pool.clone());
    let notes = NoteRepository::new(pool.clone());

    let user = match users.find_active_by_email(DEMO_EMAIL).await? {
        Some(user) => {
            info!("Demo account already exists: {}", DEMO_EMAIL);
            user
        }
        None => {
            let password_hash = hash_password(DEMO_PASSWORD.to_string(), bcrypt_cost).await?;
            let created = users
                .create(NewUser {
                    username: DEMO_USERNAME.to_string(),
                    email: DEMO_EMAIL.to_string(),
                    password_hash,
                    tos_version: tos_version.to_string(),
                })
                .await;
            match created {
                Ok(user) => {
                    info!("Demo account created: {}", DEMO_EMAIL);
                    user
                }
                // A concurrent seeder won the insert
                Err(DatabaseError::UniqueViolation(_)) => users
                    .find_active_by_email(DEMO_EMAIL)
                    .await?
                    .ok_or_else(|| anyhow::anyhow!("demo account vanished during seeding"))?,
                Err(e) => return Err(e.into()),
            }
        }
    };

    if notes.count_for_user(user.id).await? > 0 {
        info!("Demo account already has notes");
        return Ok(());
    }

    for note in demo_notes() {
        notes.create(user.id, note).await?;
    }
    info!("Demo notes created for {}", DEMO_EMAIL);
    Ok(())
}

fn demo_notes() -> Vec<NewNote> {
    vec![
        NewNote {
            title: "Welcome to Mini Notes!".to_string(),
            content: "This is a demo note. Feel free to create, edit, or delete notes.".to_string(),
            category: Some("Personal".to_string()),
            color: None,
            is_pinned: true,
        },
        NewNote {
            title: "Getting Started".to_string(),
            content: "Try searching, filtering by category, or pinning important notes.".to_string(),
            category: Some("Tips".to_string()),
            color: None,
            is_pinned: false,
        },
    ]
}
