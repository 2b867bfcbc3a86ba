pub mod note;
pub mod user;

pub use note::{NewNote, Note, NoteChanges, NoteFilter, NoteStats, SortField, SortOrder};
pub use user::{NewUser, ProfileChanges, User};
