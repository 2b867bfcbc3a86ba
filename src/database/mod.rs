pub mod account;
pub mod manager;
pub mod models;
pub mod notes;
pub mod query_builder;
pub mod seed;
pub mod users;

pub use account::{AccountRepository, DeletionOutcome, NoteDisposition};
pub use manager::{DatabaseError, DatabaseManager};
pub use notes::NoteRepository;
pub use users::UserRepository;
