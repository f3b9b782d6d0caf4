//! Quiz-forms server module.
//!
//! Serves the JSON protocol over WebSocket, one request and one reply at a
//! time per connection.

mod handlers;
mod server;
mod state;

pub use handlers::handle_message;
pub use server::{run, serve};
pub use state::{Connection, ServerState, SharedState};
