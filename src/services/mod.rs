pub mod account_service;
pub mod auth_service;
pub mod note_service;

pub use account_service::AccountService;
pub use auth_service::AuthService;
pub use note_service::NoteService;
