//! Service configuration loading and types.

mod loader;
mod types;

pub use loader::*;
pub use types::*;
