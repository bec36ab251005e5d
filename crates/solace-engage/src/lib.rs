pub mod chat;
pub mod comments;
pub mod error;
pub mod likes;
pub mod moderation;
pub mod posts;

pub use error::EngageError;
pub use moderation::{Actor, RemovalKind};
