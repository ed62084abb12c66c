//! Turns photographs into cross-stitch patterns.
//!
//! The pipeline resizes a bitmap, picks a working palette of thread colors from a catalog,
//! reduces the bitmap to that palette and resolves every pixel into a grid of thread cells that
//! can be rendered or printed as a stitch pattern.

pub mod catalog;
pub mod color_mapping;
pub mod core;
pub mod image;
pub mod stitch_images;

pub use crate::catalog::{Catalog, ThreadColor, ThreadId};
pub use crate::color_mapping::{
    color_distance, nearest, nearest_index, reduce, summarize, summarize_with_strategy,
    tally_threads, PaletteStrategy, ThreadTally,
};
pub use crate::core::{Error, Result};
pub use crate::image::{build_grid, label_grid, Bitmap, Cell, Grid, PixelRGBA};
pub use crate::stitch_images::{
    generate, legend, preview, render_pattern, symbol_text, LegendEntry, Pattern,
    PatternSettings, PatternStyle,
};
