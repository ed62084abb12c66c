use super::color::PixelRGBA;
use crate::core::{path_to_extension, Error, Result};

use ::image::codecs::jpeg::{JpegDecoder, JpegEncoder};
use ::image::imageops::{self, FilterType};
use ::image::{DynamicImage, Rgb, RgbImage, RgbaImage};
use log::debug;

use std::convert::TryFrom;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

const JPEG_QUALITY: u8 = 90;

enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    fn from_path(path: &Path) -> Result<ImageFormat> {
        match path_to_extension(path).as_str() {
            "png" => Ok(ImageFormat::Png),
            "jpg" | "jpeg" => Ok(ImageFormat::Jpeg),
            _ => Err(Error::UnsupportedFormat(path.display().to_string())),
        }
    }
}

/// A row-major RGBA raster. Pipeline stages never mutate their input bitmap, they return a new one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    pub data: Vec<PixelRGBA>,
}

impl Bitmap {
    pub fn new(width: u32, height: u32) -> Bitmap {
        Bitmap::new_filled(width, height, PixelRGBA::transparent())
    }

    pub fn new_filled(width: u32, height: u32, fill_color: PixelRGBA) -> Bitmap {
        Bitmap {
            width,
            height,
            data: vec![fill_color; width as usize * height as usize],
        }
    }

    pub fn new_from_buffer(width: u32, height: u32, buffer: Vec<PixelRGBA>) -> Result<Bitmap> {
        if buffer.len() != width as usize * height as usize {
            return Err(Error::InvalidDimension(format!(
                "{} pixels do not fill a {}x{} bitmap",
                buffer.len(),
                width,
                height
            )));
        }
        Ok(Bitmap {
            width,
            height,
            data: buffer,
        })
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    #[inline]
    pub fn get(&self, x: u32, y: u32) -> PixelRGBA {
        self.data[self.index(x, y)]
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: PixelRGBA) {
        let index = self.index(x, y);
        self.data[index] = color;
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y as usize * self.width as usize + x as usize
    }

    /// Iterates rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[PixelRGBA]> {
        // NOTE: `chunks_exact` panics on a zero chunk size, an empty bitmap simply has no rows
        self.data.chunks_exact(self.width.max(1) as usize)
    }

    /// Fills the given rectangle, clipped to the bitmap
    pub fn draw_rect_filled(&mut self, x: u32, y: u32, width: u32, height: u32, color: PixelRGBA) {
        let x_end = x.saturating_add(width).min(self.width);
        let y_end = y.saturating_add(height).min(self.height);
        for pos_y in y..y_end {
            for pos_x in x..x_end {
                self.set(pos_x, pos_y, color);
            }
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // Resizing

    /// Scales the bitmap to `new_height` rows keeping the aspect ratio, using a Catmull-Rom
    /// filter. The new width is `new_height * width / height`, rounded down.
    pub fn resized_to_height(&self, new_height: u32) -> Result<Bitmap> {
        if self.is_empty() {
            return Err(Error::InvalidDimension(format!(
                "cannot resize a {}x{} bitmap",
                self.width, self.height
            )));
        }
        if new_height == 0 {
            return Err(Error::InvalidDimension(
                "target height must be positive".to_owned(),
            ));
        }

        let new_width =
            u64::from(new_height) * u64::from(self.width) / u64::from(self.height);
        let new_width = u32::try_from(new_width).map_err(|_| {
            Error::InvalidDimension(format!("target width {} is too large", new_width))
        })?;
        if new_width == 0 {
            return Err(Error::InvalidDimension(format!(
                "a {}x{} bitmap scaled to height {} has no columns left",
                self.width, self.height, new_height
            )));
        }

        debug!(
            "Resizing {}x{} -> {}x{}",
            self.width, self.height, new_width, new_height
        );
        if new_width == self.width && new_height == self.height {
            return Ok(self.clone());
        }

        let resized = imageops::resize(
            &self.to_rgba_image(),
            new_width,
            new_height,
            FilterType::CatmullRom,
        );
        Ok(Bitmap::from_rgba_image(&resized))
    }

    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| self.get(x, y).into())
    }

    pub fn from_rgba_image(image: &RgbaImage) -> Bitmap {
        Bitmap {
            width: image.width(),
            height: image.height(),
            data: image.pixels().map(|pixel| PixelRGBA::from(*pixel)).collect(),
        }
    }

    ////////////////////////////////////////////////////////////////////////////////////////////////
    // File I/O

    /// Decodes a `.png`, `.jpg` or `.jpeg` file into an 8-bit RGBA bitmap
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Bitmap> {
        let path = path.as_ref();
        let bitmap = match ImageFormat::from_path(path)? {
            ImageFormat::Png => Bitmap::from_png_file(path)?,
            ImageFormat::Jpeg => Bitmap::from_jpeg_file(path)?,
        };
        debug!(
            "Opened '{}' ({}x{})",
            path.display(),
            bitmap.width,
            bitmap.height
        );
        Ok(bitmap)
    }

    /// Encodes the bitmap by file extension. JPEG output drops the alpha channel.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        match ImageFormat::from_path(path)? {
            ImageFormat::Png => self.write_to_png_file(path)?,
            ImageFormat::Jpeg => self.write_to_jpeg_file(path)?,
        }
        debug!("Wrote '{}'", path.display());
        Ok(())
    }

    pub fn from_png_file(path: &Path) -> Result<Bitmap> {
        let mut decoder = png::Decoder::new(BufReader::new(File::open(path)?));
        // Palette and low bit depth images are expanded, 16 bit channels are reduced to 8 bit
        decoder.set_transformations(png::Transformations::EXPAND | png::Transformations::STRIP_16);
        let (info, mut reader) = decoder.read_info()?;
        let mut buffer = vec![0; info.buffer_size()];
        reader.next_frame(&mut buffer)?;

        let channels = match info.color_type {
            png::ColorType::Grayscale => 1,
            png::ColorType::GrayscaleAlpha => 2,
            png::ColorType::RGB => 3,
            png::ColorType::RGBA => 4,
            png::ColorType::Indexed => {
                return Err(Error::UnsupportedFormat(format!(
                    "{} (unexpanded indexed png)",
                    path.display()
                )))
            }
        };
        let pixel_count = info.width as usize * info.height as usize;
        let data: Vec<PixelRGBA> = buffer
            .chunks_exact(channels)
            .take(pixel_count)
            .map(|sample| match sample {
                [l] => PixelRGBA::opaque(*l, *l, *l),
                [l, a] => PixelRGBA::new(*l, *l, *l, *a),
                [r, g, b] => PixelRGBA::opaque(*r, *g, *b),
                [r, g, b, a] => PixelRGBA::new(*r, *g, *b, *a),
                _ => unreachable!("chunks_exact yields {} samples", channels),
            })
            .collect();

        Bitmap::new_from_buffer(info.width, info.height, data)
    }

    pub fn from_jpeg_file(path: &Path) -> Result<Bitmap> {
        let decoder = JpegDecoder::new(BufReader::new(File::open(path)?))?;
        let image = DynamicImage::from_decoder(decoder)?.to_rgba8();
        Ok(Bitmap::from_rgba_image(&image))
    }

    pub fn write_to_png_file(&self, path: &Path) -> Result<()> {
        // NOTE: The png writer finishes the stream on drop and swallows errors there, so we
        //       encode into memory and only touch the file once everything is encoded
        let mut encoded = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut encoded, self.width, self.height);
            encoder.set_color(png::ColorType::RGBA);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.to_rgba_bytes())?;
        }
        std::fs::write(path, &encoded)?;
        Ok(())
    }

    pub fn write_to_jpeg_file(&self, path: &Path) -> Result<()> {
        let image = RgbImage::from_fn(self.width, self.height, |x, y| {
            let pixel = self.get(x, y);
            Rgb([pixel.r, pixel.g, pixel.b])
        });
        let mut encoded = Vec::new();
        JpegEncoder::new_with_quality(&mut encoded, JPEG_QUALITY).encode_image(&image)?;
        std::fs::write(path, &encoded)?;
        Ok(())
    }

    pub fn to_rgba_bytes(&self) -> Vec<u8> {
        self.data
            .iter()
            .flat_map(|pixel| [pixel.r, pixel.g, pixel.b, pixel.a])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient(width: u32, height: u32) -> Bitmap {
        let mut bitmap = Bitmap::new(width, height);
        for y in 0..height {
            for x in 0..width {
                bitmap.set(
                    x,
                    y,
                    PixelRGBA::opaque((x * 255 / width) as u8, (y * 255 / height) as u8, 128),
                );
            }
        }
        bitmap
    }

    #[test]
    fn resize_keeps_aspect_ratio() {
        let bitmap = gradient(100, 50);
        let resized = bitmap.resized_to_height(25).unwrap();
        assert_eq!((resized.width, resized.height), (50, 25));
        assert_eq!(resized.data.len(), 50 * 25);
    }

    #[test]
    fn resize_uses_true_height_for_ratio() {
        // A portrait image must get narrower, not stay square
        let bitmap = gradient(40, 80);
        let resized = bitmap.resized_to_height(20).unwrap();
        assert_eq!((resized.width, resized.height), (10, 20));
    }

    #[test]
    fn resize_to_same_height_is_a_fixed_point() {
        let bitmap = gradient(64, 48);
        let once = bitmap.resized_to_height(30).unwrap();
        let twice = once.resized_to_height(30).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn resize_rejects_zero_height() {
        let bitmap = gradient(10, 10);
        assert!(matches!(
            bitmap.resized_to_height(0),
            Err(Error::InvalidDimension(_))
        ));
    }

    #[test]
    fn resize_rejects_degenerate_source() {
        let bitmap = Bitmap::new(0, 10);
        assert!(matches!(
            bitmap.resized_to_height(5),
            Err(Error::InvalidDimension(_))
        ));
    }

    #[test]
    fn resize_rejects_collapsed_width() {
        let bitmap = gradient(1, 100);
        assert!(matches!(
            bitmap.resized_to_height(10),
            Err(Error::InvalidDimension(_))
        ));
    }

    #[test]
    fn solid_color_survives_resize() {
        let bitmap = Bitmap::new_filled(30, 20, PixelRGBA::opaque(12, 200, 99));
        let resized = bitmap.resized_to_height(7).unwrap();
        assert!(resized
            .data
            .iter()
            .all(|pixel| *pixel == PixelRGBA::opaque(12, 200, 99)));
    }

    #[test]
    fn unknown_extension_is_unsupported() {
        let bitmap = Bitmap::new_filled(2, 2, PixelRGBA::white());
        assert!(matches!(
            bitmap.save("pattern.gif"),
            Err(Error::UnsupportedFormat(_))
        ));
        assert!(matches!(
            Bitmap::open("photo.bmp"),
            Err(Error::UnsupportedFormat(_))
        ));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn failed_write_is_reported() {
        let bitmap = Bitmap::new_filled(8, 8, PixelRGBA::white());
        for extension in &["png", "jpg"] {
            let path = std::env::temp_dir().join(format!(
                "pixie_pattern_full_disk_{}.{}",
                std::process::id(),
                extension
            ));
            std::fs::remove_file(&path).ok();
            std::os::unix::fs::symlink("/dev/full", &path).unwrap();

            let result = bitmap.save(&path);
            std::fs::remove_file(&path).ok();
            assert!(
                matches!(result, Err(Error::Io(_))),
                "saving {} to a full disk gave {:?}",
                extension,
                result
            );
        }
    }

    #[test]
    fn buffer_must_match_dimensions() {
        assert!(matches!(
            Bitmap::new_from_buffer(2, 2, vec![PixelRGBA::white(); 3]),
            Err(Error::InvalidDimension(_))
        ));
        let bitmap = Bitmap::new_from_buffer(3, 1, vec![PixelRGBA::black(); 3]).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (3, 1));
    }

    #[test]
    fn draw_rect_is_clipped() {
        let mut bitmap = Bitmap::new_filled(4, 4, PixelRGBA::white());
        bitmap.draw_rect_filled(2, 2, 10, 10, PixelRGBA::black());
        assert_eq!(bitmap.get(1, 1), PixelRGBA::white());
        assert_eq!(bitmap.get(3, 3), PixelRGBA::black());
        assert_eq!(bitmap.get(2, 3), PixelRGBA::black());
    }

    #[test]
    fn rows_of_empty_bitmap() {
        assert_eq!(Bitmap::new(0, 0).rows().count(), 0);
        assert_eq!(gradient(3, 2).rows().count(), 2);
    }
}
