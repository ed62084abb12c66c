pub mod median_cut;
pub mod nearest;
pub mod reduce;
pub mod summarize;

pub use nearest::*;
pub use reduce::*;
pub use summarize::*;
