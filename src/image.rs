pub mod bitmap;
pub mod color;
pub mod grid;

pub use bitmap::*;
pub use color::*;
pub use grid::*;
