//! Wire protocol between quiz-forms clients and the server.

mod messages;

pub use messages::{
    ClientMessage, ErrorCode, PublicForm, PublicQuestion, ServerMessage, DEFAULT_PORT,
};
