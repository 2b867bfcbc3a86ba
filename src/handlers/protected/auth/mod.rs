pub mod me;
pub mod tos;

pub use me::me_get;
pub use tos::accept_tos_post;
