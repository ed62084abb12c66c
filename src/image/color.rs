use std::fmt;

/// An 8-bit RGBA sample. Catalog colors and reduced pixels are always fully opaque.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRGBA {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl PixelRGBA {
    #[inline]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> PixelRGBA {
        PixelRGBA { r, g, b, a }
    }

    #[inline]
    pub const fn opaque(r: u8, g: u8, b: u8) -> PixelRGBA {
        PixelRGBA { r, g, b, a: 255 }
    }

    #[inline]
    pub const fn black() -> PixelRGBA {
        PixelRGBA::opaque(0, 0, 0)
    }

    #[inline]
    pub const fn white() -> PixelRGBA {
        PixelRGBA::opaque(255, 255, 255)
    }

    #[inline]
    pub const fn transparent() -> PixelRGBA {
        PixelRGBA::new(0, 0, 0, 0)
    }

    /// Same color with alpha forced to 255
    #[inline]
    pub const fn to_opaque(self) -> PixelRGBA {
        PixelRGBA::opaque(self.r, self.g, self.b)
    }

    /// Squared euclidean distance over the RGB channels. Alpha is ignored.
    #[inline]
    pub fn distance_squared(self, other: PixelRGBA) -> u32 {
        let dr = i32::from(self.r) - i32::from(other.r);
        let dg = i32::from(self.g) - i32::from(other.g);
        let db = i32::from(self.b) - i32::from(other.b);
        (dr * dr + dg * dg + db * db) as u32
    }

    #[inline]
    pub fn distance(self, other: PixelRGBA) -> f64 {
        f64::from(self.distance_squared(other)).sqrt()
    }
}

impl fmt::Display for PixelRGBA {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl From<::image::Rgba<u8>> for PixelRGBA {
    fn from(pixel: ::image::Rgba<u8>) -> Self {
        let [r, g, b, a] = pixel.0;
        PixelRGBA::new(r, g, b, a)
    }
}

impl From<PixelRGBA> for ::image::Rgba<u8> {
    fn from(pixel: PixelRGBA) -> Self {
        ::image::Rgba([pixel.r, pixel.g, pixel.b, pixel.a])
    }
}
