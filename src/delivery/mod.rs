//! Delivery of verification reports to the original caller.

mod coordinator;
mod state;

pub use coordinator::*;
pub use state::*;
