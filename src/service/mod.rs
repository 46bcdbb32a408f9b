//! HTTP surface: upload handling, the verification pipeline and the server.

mod context;
mod error;
mod handlers;
mod server;

pub use context::*;
pub use error::*;
pub use handlers::*;
pub use server::*;
