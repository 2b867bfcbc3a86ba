pub mod delete;
pub mod export;
pub mod profile;
pub mod stats;

pub use delete::account_delete;
pub use export::export_get;
pub use profile::profile_patch;
pub use stats::stats_get;
