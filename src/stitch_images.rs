use crate::catalog::ThreadColor;
use crate::color_mapping::{reduce, summarize};
use crate::core::{Error, Result};
use crate::image::{build_grid, Bitmap, Cell, Grid, PixelRGBA};

use log::{debug, info};
use serde_derive::{Deserialize, Serialize};

use std::path::{Path, PathBuf};

////////////////////////////////////////////////////////////////////////////////////////////////////
// Constants

const DEFAULT_CELL_SIZE: u32 = 20;
const MIN_CELL_SIZE: u32 = 3;
const MAX_HEIGHT: u32 = 200;
const MAX_COLOR_COUNT: usize = 200;

const COLOR_CELL_BORDER: PixelRGBA = PixelRGBA::black();
const COLOR_BACKGROUND: PixelRGBA = PixelRGBA::white();

const SYMBOL_MISSING: char = '?';
const SYMBOL_RAW: char = '·';

////////////////////////////////////////////////////////////////////////////////////////////////////
// Settings

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternStyle {
    /// Every cell is filled with its thread color
    #[serde(rename = "filled_color")]
    FilledColor,
    /// Every cell shows an X in its thread color on a white background
    #[serde(rename = "x_stitch")]
    CrossStitch,
}

impl PatternStyle {
    /// Suffix used for the file name of a rendered pattern
    pub fn file_suffix(self) -> &'static str {
        match self {
            PatternStyle::FilledColor => "filled_color",
            PatternStyle::CrossStitch => "x_stitch",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternSettings {
    /// Pattern height in stitches
    pub height: u32,
    /// Number of threads in the working palette
    pub color_count: usize,
    /// Edge length of one rendered cell in pixels
    pub cell_size: u32,
    pub stitch_thickness: u32,
    pub styles: Vec<PatternStyle>,
    pub catalog_path: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for PatternSettings {
    fn default() -> Self {
        PatternSettings {
            height: 30,
            color_count: 30,
            cell_size: DEFAULT_CELL_SIZE,
            stitch_thickness: 3,
            styles: vec![PatternStyle::FilledColor, PatternStyle::CrossStitch],
            catalog_path: PathBuf::from("assets/thread_colors.txt"),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl PatternSettings {
    /// Reads settings from a JSON file. Missing fields take their default value.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<PatternSettings> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let settings: PatternSettings = serde_json::from_str(&content)?;
        debug!("Loaded settings from '{}'", path.as_ref().display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.height == 0 || self.height > MAX_HEIGHT {
            return Err(Error::InvalidDimension(format!(
                "pattern height {} is outside 1..={}",
                self.height, MAX_HEIGHT
            )));
        }
        if self.color_count == 0 || self.color_count > MAX_COLOR_COUNT {
            return Err(Error::InvalidDimension(format!(
                "color count {} is outside 1..={}",
                self.color_count, MAX_COLOR_COUNT
            )));
        }
        if self.cell_size < MIN_CELL_SIZE {
            return Err(Error::InvalidDimension(format!(
                "cell size {} is smaller than {}",
                self.cell_size, MIN_CELL_SIZE
            )));
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Pipeline

/// A generated pattern. The cells of `grid` borrow their threads from the catalog the pattern was
/// generated with.
#[derive(Debug, Clone)]
pub struct Pattern<'a> {
    pub resized: Bitmap,
    pub reduced: Bitmap,
    /// Working palette, most used thread first
    pub palette: Vec<ThreadColor>,
    pub grid: Grid<Cell<'a>>,
}

/// Resizes `image` to the configured height, picks a working palette of `color_count` threads,
/// reduces the image to that palette and resolves every stitch against the full catalog.
pub fn generate<'a>(
    image: &Bitmap,
    catalog: &'a [ThreadColor],
    settings: &PatternSettings,
) -> Result<Pattern<'a>> {
    settings.validate()?;

    let resized = image.resized_to_height(settings.height)?;
    debug!(
        "Resized {}x{} image to {}x{}",
        image.width, image.height, resized.width, resized.height
    );

    let palette = summarize(&resized, catalog, settings.color_count)?;
    let reduced = reduce(&resized, &palette)?;
    let grid = build_grid(&reduced, catalog, true)?;

    info!(
        "Generated {}x{} pattern with {} threads",
        grid.width,
        grid.height,
        palette.len()
    );
    Ok(Pattern {
        resized,
        reduced,
        palette,
        grid,
    })
}

/// Quick look at how `image` would be stitched at `height` without any palette matching
pub fn preview(image: &Bitmap, height: u32) -> Result<Bitmap> {
    let resized = image.resized_to_height(height)?;
    let grid = build_grid(&resized, &[], false)?;
    render_pattern(&grid, PatternStyle::FilledColor, DEFAULT_CELL_SIZE, 0)
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Rendering

/// Renders every cell as a `cell_size` square with a 1px black border
pub fn render_pattern(
    grid: &Grid<Cell>,
    style: PatternStyle,
    cell_size: u32,
    stitch_thickness: u32,
) -> Result<Bitmap> {
    if cell_size == 0 {
        return Err(Error::InvalidDimension("cell size must be positive".to_owned()));
    }
    if grid.is_empty() {
        return Err(Error::InvalidDimension(format!(
            "cannot render an empty {}x{} grid",
            grid.width, grid.height
        )));
    }
    let (width, height) = match (
        grid.width.checked_mul(cell_size),
        grid.height.checked_mul(cell_size),
    ) {
        (Some(width), Some(height)) => (width, height),
        _ => {
            return Err(Error::InvalidDimension(format!(
                "{}x{} grid with cell size {} is too large",
                grid.width, grid.height, cell_size
            )))
        }
    };

    let mut bitmap = Bitmap::new_filled(width, height, COLOR_BACKGROUND);
    for (y, row) in grid.rows().enumerate() {
        for (x, cell) in row.iter().enumerate() {
            let cell_x = x as u32 * cell_size;
            let cell_y = y as u32 * cell_size;
            let color = cell_color(cell);

            match style {
                PatternStyle::FilledColor => {
                    bitmap.draw_rect_filled(cell_x, cell_y, cell_size, cell_size, color)
                }
                PatternStyle::CrossStitch => {
                    draw_cross(&mut bitmap, cell_x, cell_y, cell_size, stitch_thickness, color)
                }
            }
            draw_cell_border(&mut bitmap, cell_x, cell_y, cell_size);
        }
    }

    debug!(
        "Rendered {}x{} grid as {:?} into {}x{} bitmap",
        grid.width, grid.height, style, width, height
    );
    Ok(bitmap)
}

fn cell_color(cell: &Cell) -> PixelRGBA {
    let color = cell.color();
    if color.a == 0 {
        COLOR_BACKGROUND
    } else {
        color.to_opaque()
    }
}

/// Two diagonals, each `thickness` pixels wide, clipped to the cell
fn draw_cross(
    bitmap: &mut Bitmap,
    cell_x: u32,
    cell_y: u32,
    cell_size: u32,
    thickness: u32,
    color: PixelRGBA,
) {
    for i in 0..cell_size {
        let mirrored = cell_size - 1 - i;
        for t in 0..thickness.min(cell_size) {
            if i + t < cell_size {
                bitmap.set(cell_x + i, cell_y + i + t, color);
                bitmap.set(cell_x + i + t, cell_y + i, color);
                bitmap.set(cell_x + i + t, cell_y + mirrored, color);
            }
            if t <= mirrored {
                bitmap.set(cell_x + i, cell_y + mirrored - t, color);
            }
        }
    }
}

fn draw_cell_border(bitmap: &mut Bitmap, cell_x: u32, cell_y: u32, cell_size: u32) {
    let last = cell_size - 1;
    bitmap.draw_rect_filled(cell_x, cell_y, cell_size, 1, COLOR_CELL_BORDER);
    bitmap.draw_rect_filled(cell_x, cell_y + last, cell_size, 1, COLOR_CELL_BORDER);
    bitmap.draw_rect_filled(cell_x, cell_y, 1, cell_size, COLOR_CELL_BORDER);
    bitmap.draw_rect_filled(cell_x + last, cell_y, 1, cell_size, COLOR_CELL_BORDER);
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Legend

#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry<'a> {
    pub thread: &'a ThreadColor,
    /// Number of stitches in this thread
    pub count: usize,
}

/// Threads used by `grid`, most stitches first. Threads with equal counts keep the order they
/// first appear in.
pub fn legend<'a>(grid: &Grid<Cell<'a>>) -> Vec<LegendEntry<'a>> {
    let mut entries: Vec<LegendEntry<'a>> = grid
        .thread_counts()
        .into_iter()
        .map(|(_id, (thread, count))| LegendEntry { thread, count })
        .collect();
    // NOTE: `sort_by` is stable which keeps first appearance order for ties
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries
}

/// The grid as text, one line per row and one symbol per stitch
pub fn symbol_text(grid: &Grid<Cell>) -> String {
    let mut text = String::with_capacity(grid.cells.len() * 3 + grid.height as usize);
    for row in grid.rows() {
        for cell in row {
            text.push(match cell {
                Cell::Thread(thread) => thread.symbol.unwrap_or(SYMBOL_MISSING),
                Cell::Raw(_) => SYMBOL_RAW,
            });
        }
        text.push('\n');
    }
    text
}
