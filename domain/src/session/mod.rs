//! Model session domain.
//!
//! - [`entities::Session`]: locally held conversation history
//! - [`entities::Message`]: a single message within a session
//! - [`stream::StreamEvent`]: chunks of a streamed reply

pub mod entities;
pub mod stream;

pub use entities::{Message, Role, Session};
pub use stream::{StreamEvent, chunk_text};
