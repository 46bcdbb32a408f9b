//! Report classification and rendering.

mod classify;
mod render;

pub use classify::*;
pub use render::*;
