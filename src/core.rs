use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A catalog row could not be turned into a thread color. `line` is 1-based.
    #[error("catalog line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("cannot match a color against an empty palette")]
    EmptyPalette,

    #[error("invalid dimensions: {0}")]
    InvalidDimension(String),

    #[error("unsupported file format '{0}' (expected .png, .jpg or .jpeg)")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("cannot decode png: {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("cannot encode png: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("image codec error: {0}")]
    Image(#[from] ::image::ImageError),

    #[error("invalid settings: {0}")]
    Settings(#[from] serde_json::Error),
}

////////////////////////////////////////////////////////////////////////////////////////////////////
// Paths

/// Lowercased extension without the dot, or an empty string if there is none
pub fn path_to_extension<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

pub fn path_to_filename<P: AsRef<Path>>(path: P) -> String {
    path.as_ref()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Example:
/// path: "photos/cat.png"
/// prefix: "reduced_"
///
/// This returns:
/// "photos/reduced_cat.png"
pub fn path_with_prefixed_filename<P: AsRef<Path>>(path: P, prefix: &str) -> PathBuf {
    let path = path.as_ref();
    let filename = prefix.to_owned() + &path_to_filename(path);
    match path.parent() {
        Some(parent) => parent.join(filename),
        None => PathBuf::from(filename),
    }
}
