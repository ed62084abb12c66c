use crate::catalog::ThreadColor;
use crate::core::{Error, Result};
use crate::image::PixelRGBA;

/// Euclidean distance of two colors in raw 8-bit RGB space
#[inline]
pub fn color_distance(a: PixelRGBA, b: PixelRGBA) -> f64 {
    a.distance(b)
}

/// Position of the palette entry closest to `sample`. The first of several equally close entries
/// wins.
pub fn nearest_index(sample: PixelRGBA, palette: &[ThreadColor]) -> Result<usize> {
    // NOTE: Comparing squared distances orders entries exactly like `color_distance` does
    palette
        .iter()
        .enumerate()
        .min_by_key(|(_, thread)| sample.distance_squared(thread.color))
        .map(|(index, _)| index)
        .ok_or(Error::EmptyPalette)
}

pub fn nearest(sample: PixelRGBA, palette: &[ThreadColor]) -> Result<&ThreadColor> {
    nearest_index(sample, palette).map(|index| &palette[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread(id: i64, name: &str, r: u8, g: u8, b: u8) -> ThreadColor {
        ThreadColor::new(id, name, PixelRGBA::opaque(r, g, b))
    }

    fn primaries() -> Vec<ThreadColor> {
        vec![
            thread(1, "Red", 255, 0, 0),
            thread(2, "Green", 0, 255, 0),
            thread(3, "Blue", 0, 0, 255),
        ]
    }

    #[test]
    fn reddish_sample_matches_red() {
        let palette = primaries();
        let found = nearest(PixelRGBA::opaque(250, 10, 5), &palette).unwrap();
        assert_eq!(found.id, 1);
        assert_eq!(found.name, "Red");
    }

    #[test]
    fn empty_palette_is_an_error() {
        for sample in &[PixelRGBA::black(), PixelRGBA::white(), PixelRGBA::new(1, 2, 3, 0)] {
            assert!(matches!(nearest(*sample, &[]), Err(Error::EmptyPalette)));
            assert!(matches!(nearest_index(*sample, &[]), Err(Error::EmptyPalette)));
        }
    }

    #[test]
    fn first_entry_wins_a_tie() {
        let palette = vec![thread(10, "Dark", 0, 0, 0), thread(11, "Light", 20, 20, 20)];
        let found = nearest(PixelRGBA::opaque(10, 10, 10), &palette).unwrap();
        assert_eq!(found.id, 10);

        let reversed = vec![palette[1].clone(), palette[0].clone()];
        let found = nearest(PixelRGBA::opaque(10, 10, 10), &reversed).unwrap();
        assert_eq!(found.id, 11);
    }

    #[test]
    fn alpha_does_not_affect_matching() {
        let palette = primaries();
        let found = nearest(PixelRGBA::new(0, 0, 240, 0), &palette).unwrap();
        assert_eq!(found.id, 3);
    }

    #[test]
    fn nearest_is_never_farther_than_any_entry() {
        let palettes = vec![
            primaries(),
            vec![
                thread(1, "Black", 0, 0, 0),
                thread(2, "Grey", 128, 128, 128),
                thread(3, "White", 255, 255, 255),
            ],
            vec![
                thread(1, "Teal", 0, 128, 128),
                thread(2, "Olive", 128, 128, 0),
                thread(3, "Purple", 128, 0, 128),
                thread(4, "Peach", 255, 200, 160),
                thread(5, "Teal Again", 0, 128, 128),
            ],
        ];

        for palette in &palettes {
            for r in (0..=255u32).step_by(51) {
                for g in (0..=255u32).step_by(51) {
                    for b in (0..=255u32).step_by(51) {
                        let sample = PixelRGBA::opaque(r as u8, g as u8, b as u8);
                        let found = nearest(sample, palette).unwrap();
                        assert!(palette.iter().any(|entry| entry.id == found.id));

                        let best = color_distance(sample, found.color);
                        for entry in palette {
                            assert!(best <= color_distance(sample, entry.color));
                        }
                    }
                }
            }
        }
    }
}
