use super::median_cut::median_cut;
use super::nearest::nearest_index;
use crate::catalog::{ThreadColor, ThreadId};
use crate::core::Result;
use crate::image::{Bitmap, PixelRGBA};

use indexmap::IndexMap;
use log::debug;

use std::collections::HashMap;

/// How a working palette is picked from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaletteStrategy {
    /// Resolve every pixel to its nearest catalog thread and keep the most used threads
    Frequency,
    /// Median-cut the image colors and resolve each box average to its nearest catalog thread
    MedianCut,
}

impl Default for PaletteStrategy {
    fn default() -> Self {
        PaletteStrategy::Frequency
    }
}

/// How often one catalog thread is the nearest match of an image pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadTally {
    /// Position of the thread in the catalog
    pub index: usize,
    pub count: usize,
}

/// Resolves every pixel to its nearest catalog thread and counts the pixels per thread id.
/// Entries appear in the order their thread was first seen.
pub fn tally_threads(image: &Bitmap, catalog: &[ThreadColor]) -> Result<IndexMap<ThreadId, ThreadTally>> {
    let mut tallies: IndexMap<ThreadId, ThreadTally> = IndexMap::new();
    let mut nearest_cache: HashMap<PixelRGBA, usize> = HashMap::new();

    for row in image.rows() {
        for pixel in row {
            let sample = pixel.to_opaque();
            let index = match nearest_cache.get(&sample) {
                Some(index) => *index,
                None => {
                    let index = nearest_index(sample, catalog)?;
                    nearest_cache.insert(sample, index);
                    index
                }
            };

            tallies
                .entry(catalog[index].id)
                .or_insert(ThreadTally { index, count: 0 })
                .count += 1;
        }
    }

    Ok(tallies)
}

/// Picks up to `k` catalog threads that best represent `image`, most used first
pub fn summarize(image: &Bitmap, catalog: &[ThreadColor], k: usize) -> Result<Vec<ThreadColor>> {
    summarize_with_strategy(image, catalog, k, PaletteStrategy::Frequency)
}

pub fn summarize_with_strategy(
    image: &Bitmap,
    catalog: &[ThreadColor],
    k: usize,
    strategy: PaletteStrategy,
) -> Result<Vec<ThreadColor>> {
    if k == 0 {
        return Ok(Vec::new());
    }

    let palette = match strategy {
        PaletteStrategy::Frequency => summarize_by_frequency(image, catalog, k)?,
        PaletteStrategy::MedianCut => summarize_by_median_cut(image, catalog, k)?,
    };
    debug!(
        "Summarized {}x{} image into {} of {} requested threads ({:?})",
        image.width,
        image.height,
        palette.len(),
        k,
        strategy
    );
    Ok(palette)
}

fn summarize_by_frequency(
    image: &Bitmap,
    catalog: &[ThreadColor],
    k: usize,
) -> Result<Vec<ThreadColor>> {
    let mut tallies = tally_threads(image, catalog)?;

    // Most used first, equally used threads keep their catalog order
    tallies.sort_by(|_id_a, tally_a, _id_b, tally_b| {
        tally_b
            .count
            .cmp(&tally_a.count)
            .then(tally_a.index.cmp(&tally_b.index))
    });

    Ok(tallies
        .values()
        .take(k)
        .map(|tally| catalog[tally.index].clone())
        .collect())
}

fn summarize_by_median_cut(
    image: &Bitmap,
    catalog: &[ThreadColor],
    k: usize,
) -> Result<Vec<ThreadColor>> {
    let mut palette: IndexMap<ThreadId, ThreadColor> = IndexMap::new();
    for representative in median_cut(image, k) {
        let thread = &catalog[nearest_index(representative, catalog)?];
        palette.entry(thread.id).or_insert_with(|| thread.clone());
    }
    Ok(palette.into_iter().map(|(_id, thread)| thread).collect())
}
