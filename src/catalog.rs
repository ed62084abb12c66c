//! Thread color catalog loading.
//!
//! A catalog is a flat text file with one thread per line and tab separated fields:
//!
//! ```text
//! [id] [name words...] [R] [G] [B]
//! ```
//!
//! Every entry gets a display symbol after loading. Symbols are handed out in catalog order from
//! the Arrows, Mathematical Operators and Box Drawing blocks (in that order), so loading the same
//! catalog always yields the same symbols.

use crate::core::{Error, Result};
use crate::image::PixelRGBA;

use log::{debug, warn};

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, RangeInclusive};
use std::path::Path;

static SYMBOL_RANGES: [RangeInclusive<u32>; 3] = [
    0x2190..=0x21FF, // Arrows
    0x2200..=0x22FF, // Mathematical Operators
    0x2500..=0x257F, // Box Drawing
];

/// Number of entries that can receive a symbol. Later catalog entries have none.
pub fn symbol_capacity() -> usize {
    SYMBOL_RANGES
        .iter()
        .map(|range| (range.end() - range.start() + 1) as usize)
        .sum()
}

fn symbols() -> impl Iterator<Item = char> {
    SYMBOL_RANGES
        .iter()
        .cloned()
        .flat_map(|range| range.filter_map(std::char::from_u32))
}

/// Catalog key of a thread. Any integer is accepted, including negative ones.
pub type ThreadId = i64;

/// A catalog entry. Two thread colors are equal when their ids are equal.
#[derive(Debug, Clone)]
pub struct ThreadColor {
    pub id: ThreadId,
    pub name: String,
    pub color: PixelRGBA,
    pub symbol: Option<char>,
}

impl ThreadColor {
    pub fn new(id: ThreadId, name: &str, color: PixelRGBA) -> ThreadColor {
        ThreadColor {
            id,
            name: name.to_owned(),
            color: color.to_opaque(),
            symbol: None,
        }
    }
}

impl PartialEq for ThreadColor {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ThreadColor {}

impl Hash for ThreadColor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// The ordered, read-only list of known thread colors
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    threads: Vec<ThreadColor>,
}

impl Deref for Catalog {
    type Target = [ThreadColor];

    fn deref(&self) -> &[ThreadColor] {
        &self.threads
    }
}

impl Catalog {
    /// Builds a catalog from already parsed entries and assigns their symbols
    pub fn from_threads(threads: Vec<ThreadColor>) -> Catalog {
        let mut catalog = Catalog { threads };
        catalog.assign_symbols();
        catalog
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Catalog> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        let catalog = Catalog::parse(&source)?;
        debug!(
            "Loaded {} thread colors from '{}'",
            catalog.len(),
            path.display()
        );
        Ok(catalog)
    }

    /// Parses catalog text.
    ///
    /// A row with fewer than four fields, a non numeric id or an id that was already used aborts
    /// the whole load. Color channels are lenient: a channel that is not an integer in 0..=255 is
    /// logged and read as 0 so that a partially damaged catalog stays usable.
    pub fn parse(source: &str) -> Result<Catalog> {
        let mut threads = Vec::new();
        let mut seen_ids = HashSet::new();

        for (line_index, line) in source.lines().enumerate() {
            let line_number = line_index + 1;
            if line.trim().is_empty() {
                continue;
            }

            let thread = parse_line(line, line_number)?;
            if !seen_ids.insert(thread.id) {
                return Err(Error::Parse {
                    line: line_number,
                    reason: format!("duplicate thread id {}", thread.id),
                });
            }
            threads.push(thread);
        }

        Ok(Catalog::from_threads(threads))
    }

    pub fn threads(&self) -> &[ThreadColor] {
        &self.threads
    }

    pub fn by_id(&self, id: ThreadId) -> Option<&ThreadColor> {
        self.threads.iter().find(|thread| thread.id == id)
    }

    fn assign_symbols(&mut self) {
        let mut symbols = symbols();
        for thread in self.threads.iter_mut() {
            thread.symbol = symbols.next();
        }
        if self.threads.len() > symbol_capacity() {
            warn!(
                "Catalog has {} entries but only {} symbols, the last {} entries have no symbol",
                self.threads.len(),
                symbol_capacity(),
                self.threads.len() - symbol_capacity()
            );
        }
    }
}

fn parse_line(line: &str, line_number: usize) -> Result<ThreadColor> {
    // NOTE: Consecutive tabs do not produce empty fields
    let fields: Vec<&str> = line
        .trim_end_matches(|c: char| c == '\r' || c == '\n')
        .split('\t')
        .filter(|field| !field.is_empty())
        .collect();

    if fields.len() < 4 {
        return Err(Error::Parse {
            line: line_number,
            reason: format!("expected at least 4 tab separated fields, found {}", fields.len()),
        });
    }

    let id = fields[0].trim().parse::<ThreadId>().map_err(|error| Error::Parse {
        line: line_number,
        reason: format!("thread id '{}' is not a number: {}", fields[0], error),
    })?;

    let rgb_start = fields.len() - 3;
    let name = fields[1..rgb_start].join(" ");
    let color = PixelRGBA::opaque(
        parse_channel(fields[rgb_start], line_number),
        parse_channel(fields[rgb_start + 1], line_number),
        parse_channel(fields[rgb_start + 2], line_number),
    );

    Ok(ThreadColor {
        id,
        name,
        color,
        symbol: None,
    })
}

fn parse_channel(field: &str, line_number: usize) -> u8 {
    match field.trim().parse::<u8>() {
        Ok(value) => value,
        Err(error) => {
            warn!(
                "Catalog line {}: color channel '{}' is invalid ({}), using 0",
                line_number, field, error
            );
            0
        }
    }
}
