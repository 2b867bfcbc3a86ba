pub mod collection;
pub mod record;

pub use collection::{notes_get, notes_post};
pub use record::{note_delete, note_get, note_put};
