//! bcrypt hashing, run on the blocking pool so request workers stay responsive.

use once_cell::sync::OnceCell;

static DUMMY_HASH: OnceCell<String> = OnceCell::new();

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("bcrypt error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),
    #[error("hashing task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub async fn hash_password(password: String, cost: u32) -> Result<String, PasswordError> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Returns Ok(false) on mismatch; malformed stored hashes are errors.
pub async fn verify_password(password: String, password_hash: String) -> Result<bool, PasswordError> {
    let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &password_hash)).await??;
    Ok(valid)
}

/// Pay for one bcrypt verification when there is no stored hash to check,
/// so unknown accounts take as long to reject as wrong passwords.
pub async fn verify_dummy(password: String, cost: u32) -> Result<(), PasswordError> {
    tokio::task::spawn_blocking(move || -> Result<(), bcrypt::BcryptError> {
        let hash = DUMMY_HASH.get_or_try_init(|| bcrypt::hash("mini-notes-unknown-account", cost))?;
        bcrypt::verify(password, hash)?;
        Ok(())
    })
    .await??;
    Ok(())
}
