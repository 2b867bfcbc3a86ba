pub mod extract;
pub mod format;

pub use extract::{deserialize_some, optional_json, ApiJson, ApiQuery};
pub use format::{notes_to_views, NoteView, ProfileView, StatsView, UserView};
