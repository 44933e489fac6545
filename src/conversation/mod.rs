//! Role-tagged messages and the immutable chat history built from them

mod history;
mod message;

pub use history::ChatHistory;
pub use message::{Message, Role};
