use super::nearest::nearest;
use crate::catalog::ThreadColor;
use crate::core::{Error, Result};
use crate::image::{Bitmap, PixelRGBA};

use log::debug;

use std::collections::HashMap;

/// Replaces every pixel with the color of its nearest palette thread. The result has the same
/// dimensions as `image` and is fully opaque.
pub fn reduce(image: &Bitmap, palette: &[ThreadColor]) -> Result<Bitmap> {
    if palette.is_empty() {
        return Err(Error::EmptyPalette);
    }

    let mut reduced_colors: HashMap<PixelRGBA, PixelRGBA> = HashMap::new();
    let data = image
        .data
        .iter()
        .map(|pixel| -> Result<PixelRGBA> {
            let sample = pixel.to_opaque();
            if let Some(reduced) = reduced_colors.get(&sample) {
                return Ok(*reduced);
            }
            let reduced = nearest(sample, palette)?.color.to_opaque();
            reduced_colors.insert(sample, reduced);
            Ok(reduced)
        })
        .collect::<Result<Vec<PixelRGBA>>>()?;

    debug!(
        "Reduced {}x{} image with {} distinct colors onto {} threads",
        image.width,
        image.height,
        reduced_colors.len(),
        palette.len()
    );
    Bitmap::new_from_buffer(image.width, image.height, data)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn palette() -> Vec<ThreadColor> {
        vec![
            ThreadColor::new(1, "Red", PixelRGBA::opaque(255, 0, 0)),
            ThreadColor::new(2, "Green", PixelRGBA::opaque(0, 255, 0)),
            ThreadColor::new(3, "Blue", PixelRGBA::opaque(0, 0, 255)),
            ThreadColor::new(4, "White", PixelRGBA::opaque(255, 255, 255)),
        ]
    }

    fn noise(width: u32, height: u32) -> Bitmap {
        // Deterministic pseudo random colors
        let mut state = 0x2545_f491u32;
        let data = (0..width * height)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 17;
                state ^= state << 5;
                let [r, g, b, a] = state.to_le_bytes();
                PixelRGBA::new(r, g, b, a)
            })
            .collect();
        Bitmap::new_from_buffer(width, height, data).unwrap()
    }

    #[test]
    fn output_uses_only_palette_colors() {
        let image = noise(17, 9);
        let palette = palette();
        let reduced = reduce(&image, &palette).unwrap();

        assert_eq!((reduced.width, reduced.height), (image.width, image.height));
        for pixel in &reduced.data {
            assert_eq!(pixel.a, 255);
            assert!(palette.iter().any(|thread| thread.color == *pixel));
        }
    }

    #[test]
    fn each_pixel_is_its_nearest_match() {
        let image = noise(8, 8);
        let palette = palette();
        let reduced = reduce(&image, &palette).unwrap();
        for (source, target) in image.data.iter().zip(reduced.data.iter()) {
            assert_eq!(nearest(*source, &palette).unwrap().color, *target);
        }
    }

    #[test]
    fn reduction_is_deterministic() {
        let image = noise(12, 12);
        let palette = palette();
        assert_eq!(
            reduce(&image, &palette).unwrap(),
            reduce(&image, &palette).unwrap()
        );
    }

    #[test]
    fn transparent_pixels_become_opaque() {
        let image = Bitmap::new_filled(2, 2, PixelRGBA::new(250, 250, 250, 0));
        let reduced = reduce(&image, &palette()).unwrap();
        assert!(reduced.data.iter().all(|pixel| *pixel == PixelRGBA::white()));
    }

    #[test]
    fn empty_palette_is_an_error() {
        assert!(matches!(
            reduce(&noise(3, 3), &[]),
            Err(Error::EmptyPalette)
        ));
        assert!(matches!(
            reduce(&Bitmap::new(0, 0), &[]),
            Err(Error::EmptyPalette)
        ));
    }
}
