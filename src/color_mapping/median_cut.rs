//! Median cut color quantization in RGB space.

use crate::image::{Bitmap, PixelRGBA};

use indexmap::IndexMap;

#[derive(Clone, Copy, Debug)]
struct WeightedColor {
    color: PixelRGBA,
    count: usize,
}

impl WeightedColor {
    #[inline]
    fn channel(&self, axis: usize) -> u8 {
        match axis {
            0 => self.color.r,
            1 => self.color.g,
            _ => self.color.b,
        }
    }
}

/// Splits the distinct colors of `image` into at most `target` boxes and returns the
/// pixel-weighted average of each box, heaviest box first. The result is fully opaque and
/// deterministic for a given image.
pub fn median_cut(image: &Bitmap, target: usize) -> Vec<PixelRGBA> {
    let mut color_counts: IndexMap<PixelRGBA, usize> = IndexMap::new();
    for pixel in &image.data {
        *color_counts.entry(pixel.to_opaque()).or_insert(0) += 1;
    }
    if color_counts.is_empty() || target == 0 {
        return Vec::new();
    }

    let colors: Vec<WeightedColor> = color_counts
        .into_iter()
        .map(|(color, count)| WeightedColor { color, count })
        .collect();
    let mut buckets = vec![colors];

    while buckets.len() < target {
        let widest = buckets
            .iter()
            .enumerate()
            .filter(|(_, bucket)| bucket.len() > 1)
            .map(|(index, bucket)| (index, largest_axis(bucket)))
            .fold(None, |best: Option<(usize, (usize, u8))>, candidate| match best {
                Some(best) if (best.1).1 >= (candidate.1).1 => Some(best),
                _ => Some(candidate),
            });

        match widest {
            Some((index, (axis, _))) => {
                let bucket = buckets.remove(index);
                let (left, right) = split_bucket(bucket, axis);
                buckets.push(left);
                buckets.push(right);
            }
            None => break,
        }
    }

    let mut averages: Vec<(usize, PixelRGBA)> = buckets
        .iter()
        .map(|bucket| (bucket_weight(bucket), bucket_average(bucket)))
        .collect();
    averages.sort_by(|(weight_a, _), (weight_b, _)| weight_b.cmp(weight_a));
    averages.into_iter().map(|(_, color)| color).collect()
}

/// Channel with the widest value range and that range
fn largest_axis(colors: &[WeightedColor]) -> (usize, u8) {
    let mut best = (0, 0);
    for axis in 0..3 {
        let min = colors.iter().map(|c| c.channel(axis)).min().unwrap_or(0);
        let max = colors.iter().map(|c| c.channel(axis)).max().unwrap_or(0);
        if axis == 0 || max - min > best.1 {
            best = (axis, max - min);
        }
    }
    best
}

/// Splits at the weighted median along `axis`. Both halves are non-empty for two or more colors.
fn split_bucket(
    mut colors: Vec<WeightedColor>,
    axis: usize,
) -> (Vec<WeightedColor>, Vec<WeightedColor>) {
    colors.sort_by_key(|c| c.channel(axis));

    let half = bucket_weight(&colors) as f64 / 2.0;
    let mut cumulative = 0.0;
    let mut split = colors.len() / 2;
    for (index, c) in colors.iter().enumerate() {
        cumulative += c.count as f64;
        if cumulative >= half {
            split = index + 1;
            break;
        }
    }

    let split = split.max(1).min(colors.len() - 1);
    let right = colors.split_off(split);
    (colors, right)
}

fn bucket_weight(colors: &[WeightedColor]) -> usize {
    colors.iter().map(|c| c.count).sum()
}

fn bucket_average(colors: &[WeightedColor]) -> PixelRGBA {
    let total = bucket_weight(colors).max(1) as u64;
    let (r, g, b) = colors.iter().fold((0u64, 0u64, 0u64), |acc, c| {
        let weight = c.count as u64;
        (
            acc.0 + u64::from(c.color.r) * weight,
            acc.1 + u64::from(c.color.g) * weight,
            acc.2 + u64::from(c.color.b) * weight,
        )
    });
    // Rounded integer division
    PixelRGBA::opaque(
        ((r + total / 2) / total) as u8,
        ((g + total / 2) / total) as u8,
        ((b + total / 2) / total) as u8,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_image_has_no_representatives() {
        assert!(median_cut(&Bitmap::new(0, 0), 4).is_empty());
    }

    #[test]
    fn never_exceeds_target_or_distinct_colors() {
        let data = vec![
            PixelRGBA::opaque(0, 0, 0),
            PixelRGBA::opaque(255, 255, 255),
            PixelRGBA::opaque(255, 0, 0),
            PixelRGBA::opaque(0, 0, 0),
        ];
        let image = Bitmap::new_from_buffer(2, 2, data).unwrap();
        assert_eq!(median_cut(&image, 2).len(), 2);
        assert_eq!(median_cut(&image, 10).len(), 3);
        assert!(median_cut(&image, 0).is_empty());
    }

    #[test]
    fn single_box_is_the_weighted_average() {
        let data = vec![
            PixelRGBA::opaque(0, 0, 0),
            PixelRGBA::opaque(0, 0, 0),
            PixelRGBA::opaque(0, 0, 0),
            PixelRGBA::opaque(100, 200, 40),
        ];
        let image = Bitmap::new_from_buffer(4, 1, data).unwrap();
        assert_eq!(median_cut(&image, 1), vec![PixelRGBA::opaque(25, 50, 10)]);
    }

    #[test]
    fn heaviest_box_comes_first() {
        let mut data = vec![PixelRGBA::opaque(10, 10, 10); 2];
        data.extend(vec![PixelRGBA::opaque(240, 240, 240); 6]);
        let image = Bitmap::new_from_buffer(8, 1, data).unwrap();
        assert_eq!(
            median_cut(&image, 2),
            vec![PixelRGBA::opaque(240, 240, 240), PixelRGBA::opaque(10, 10, 10)]
        );
    }

    #[test]
    fn alpha_is_ignored() {
        let data = vec![PixelRGBA::new(9, 9, 9, 0), PixelRGBA::new(9, 9, 9, 255)];
        let image = Bitmap::new_from_buffer(2, 1, data).unwrap();
        assert_eq!(median_cut(&image, 4), vec![PixelRGBA::opaque(9, 9, 9)]);
    }
}
