use super::bitmap::Bitmap;
use super::color::PixelRGBA;
use crate::catalog::{ThreadColor, ThreadId};
use crate::color_mapping::nearest_index;
use crate::core::{Error, Result};

use indexmap::IndexMap;
use log::debug;

use std::collections::HashMap;

/// A row-major 2-D array of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T> {
    pub width: u32,
    pub height: u32,
    pub cells: Vec<T>,
}

impl<T> Grid<T> {
    pub fn new_from_cells(width: u32, height: u32, cells: Vec<T>) -> Result<Grid<T>> {
        if cells.len() != width as usize * height as usize {
            return Err(Error::InvalidDimension(format!(
                "{} cells do not fill a {}x{} grid",
                cells.len(),
                width,
                height
            )));
        }
        Ok(Grid {
            width,
            height,
            cells,
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> &T {
        &self.cells[y as usize * self.width as usize + x as usize]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        self.cells.chunks_exact(self.width.max(1) as usize)
    }

    pub fn map<U, F: FnMut(&T) -> U>(&self, f: F) -> Grid<U> {
        Grid {
            width: self.width,
            height: self.height,
            cells: self.cells.iter().map(f).collect(),
        }
    }
}

/// One stitch of a pattern
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell<'a> {
    /// The catalog thread nearest to the source pixel
    Thread(&'a ThreadColor),
    /// The unresolved source pixel, used for cheap previews
    Raw(PixelRGBA),
}

impl<'a> Cell<'a> {
    pub fn color(&self) -> PixelRGBA {
        match self {
            Cell::Thread(thread) => thread.color,
            Cell::Raw(color) => *color,
        }
    }

    pub fn thread(&self) -> Option<&'a ThreadColor> {
        match self {
            Cell::Thread(thread) => Some(*thread),
            Cell::Raw(_) => None,
        }
    }

    pub fn symbol(&self) -> Option<char> {
        self.thread().and_then(|thread| thread.symbol)
    }
}

impl<'a> Grid<Cell<'a>> {
    /// Number of cells per thread id, in order of first appearance. Raw cells are not counted.
    pub fn thread_counts(&self) -> IndexMap<ThreadId, (&'a ThreadColor, usize)> {
        let mut counts = IndexMap::new();
        for thread in self.cells.iter().filter_map(|cell| cell.thread()) {
            counts.entry(thread.id).or_insert((thread, 0)).1 += 1;
        }
        counts
    }
}

/// Builds one cell per pixel. With `resolve` every cell is the nearest catalog thread of its
/// pixel, otherwise cells carry the raw pixel color and `catalog` is not consulted.
pub fn build_grid<'a>(
    image: &Bitmap,
    catalog: &'a [ThreadColor],
    resolve: bool,
) -> Result<Grid<Cell<'a>>> {
    let cells = if resolve {
        let mut nearest_cache: HashMap<PixelRGBA, usize> = HashMap::new();
        let mut cells = Vec::with_capacity(image.data.len());
        for pixel in &image.data {
            let sample = pixel.to_opaque();
            let index = match nearest_cache.get(&sample) {
                Some(index) => *index,
                None => {
                    let index = nearest_index(sample, catalog)?;
                    nearest_cache.insert(sample, index);
                    index
                }
            };
            cells.push(Cell::Thread(&catalog[index]));
        }
        cells
    } else {
        image.data.iter().map(|pixel| Cell::Raw(*pixel)).collect()
    };

    debug!(
        "Built {}x{} grid ({})",
        image.width,
        image.height,
        if resolve { "resolved" } else { "raw" }
    );
    Grid::new_from_cells(image.width, image.height, cells)
}

/// Names every pixel by the catalog thread with exactly its color, or by its `#rrggbb` hex code
/// when no thread matches. Meant for images that were already reduced to catalog colors.
pub fn label_grid(image: &Bitmap, catalog: &[ThreadColor]) -> Grid<String> {
    let names: HashMap<PixelRGBA, &str> = catalog
        .iter()
        .rev() // The first thread of a color wins
        .map(|thread| (thread.color, thread.name.as_str()))
        .collect();

    Grid {
        width: image.width,
        height: image.height,
        cells: image
            .data
            .iter()
            .map(|pixel| match names.get(&pixel.to_opaque()) {
                Some(name) => (*name).to_owned(),
                None => pixel.to_string(),
            })
            .collect(),
    }
}
