//! Tool-invocation subsystem: command rendering, stream draining and
//! process supervision.

mod command;
mod drain;
mod supervisor;

pub use command::*;
pub use drain::*;
pub use supervisor::*;
