use crate::error::StoreError;
use image::{imageops, ImageFormat, Rgba, RgbaImage};
use rayon::prelude::*;
use std::path::Path;

/// A straight (non-premultiplied) RGBA colour.
pub type Colour = Rgba<u8>;

/// Fully transparent black, returned for reads outside an image.
pub const TRANSPARENT: Colour = Rgba([0, 0, 0, 0]);

/// File extensions recognised as editable assets.
pub const IMAGE_EXTENSIONS: &[&str] = &["png"];

/// Returns true if `path` names a file with an image extension.
pub fn is_image_path(path: &str) -> bool {
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        })
}

/// A row-major grid of RGBA pixels.
///
/// Two grids are equal when their dimensions match and every pixel matches exactly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PixelGrid {
    image: RgbaImage,
}

impl PixelGrid {
    /// Creates a fully transparent grid.
    pub fn new(width: u32, height: u32) -> Self {
        Self::filled(width, height, TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, colour: Colour) -> Self {
        Self {
            image: RgbaImage::from_pixel(width, height, colour),
        }
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Wraps raw RGBA bytes. Returns None unless `pixels.len() == width * height * 4`.
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        RgbaImage::from_raw(width, height, pixels).map(Self::from_image)
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn size(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn same_size(&self, other: &PixelGrid) -> bool {
        self.size() == other.size()
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x < self.width() && y < self.height()
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Colour> {
        self.image.get_pixel_checked(x, y).copied()
    }

    /// Writes one pixel. Returns false, leaving the grid untouched, when out of bounds.
    pub fn set(&mut self, x: u32, y: u32, colour: Colour) -> bool {
        match self.image.get_pixel_mut_checked(x, y) {
            Some(pixel) => {
                *pixel = colour;
                true
            }
            None => false,
        }
    }

    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.image
    }

    /// Decodes an encoded image. `name` is used for format detection fallback and errors.
    pub fn decode(bytes: &[u8], name: &str) -> Result<Self, StoreError> {
        let format = image::guess_format(bytes)
            .or_else(|_| ImageFormat::from_path(name))
            .map_err(|source| StoreError::Decode {
                path: name.to_string(),
                source,
            })?;
        let decoded = image::load_from_memory_with_format(bytes, format).map_err(|source| {
            StoreError::Decode {
                path: name.to_string(),
                source,
            }
        })?;
        Ok(Self::from_image(decoded.to_rgba8()))
    }

    pub fn load(path: &Path) -> Result<Self, StoreError> {
        let bytes = std::fs::read(path).map_err(|err| StoreError::io(path, err))?;
        Self::decode(&bytes, &path.to_string_lossy())
    }

    /// Writes the grid as PNG regardless of the extension of `path`.
    pub fn save_png(&self, path: &Path) -> Result<(), StoreError> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .map_err(|source| match source {
                image::ImageError::IoError(err) => StoreError::io(path, err),
                source => StoreError::Encode {
                    path: path.to_path_buf(),
                    source,
                },
            })
    }

    /// Returns a copy with every alpha channel multiplied by `alpha / 255`.
    pub fn with_alpha_scaled(&self, alpha: u8) -> Self {
        let mut image = self.image.clone();
        if alpha != u8::MAX {
            image.par_chunks_mut(4).for_each(|pixel| {
                pixel[3] = (u16::from(pixel[3]) * u16::from(alpha) / 255) as u8;
            });
        }
        Self { image }
    }

    /// Nearest-neighbour preview that fits in a `max` x `max` square, keeping aspect ratio.
    pub fn thumbnail(&self, max: u32) -> Self {
        let (w, h) = self.size();
        let longest = w.max(h).max(1);
        let scale = |v: u32| ((u64::from(v) * u64::from(max)) / u64::from(longest)).max(1) as u32;
        Self {
            image: imageops::resize(&self.image, scale(w), scale(h), imageops::FilterType::Nearest),
        }
    }

    pub fn to_color_image(&self) -> egui::ColorImage {
        let size = [self.width() as usize, self.height() as usize];
        egui::ColorImage::from_rgba_unmultiplied(size, self.as_raw())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RED: Colour = Rgba([255, 0, 0, 255]);

    #[test]
    fn test_get_set_bounds() {
        let mut grid = PixelGrid::new(2, 3);
        assert!(grid.set(1, 2, RED));
        assert_eq!(grid.get(1, 2), Some(RED));
        assert_eq!(grid.get(0, 0), Some(TRANSPARENT));
        assert!(!grid.set(2, 0, RED));
        assert_eq!(grid.get(0, 3), None);
        assert_eq!(grid.as_raw().len(), 2 * 3 * 4);
    }

    #[test]
    fn test_equality_requires_same_size_and_pixels() {
        let a = PixelGrid::filled(4, 4, RED);
        let mut b = a.clone();
        assert_eq!(a, b);

        b.set(3, 3, Rgba([255, 0, 0, 254]));
        assert_ne!(a, b);

        let c = PixelGrid::filled(2, 8, RED);
        assert_eq!(a.as_raw().len(), c.as_raw().len());
        assert_ne!(a, c);
    }

    #[test]
    fn test_from_raw_rejects_wrong_length() {
        assert!(PixelGrid::from_raw(2, 2, vec![0; 15]).is_none());
        assert!(PixelGrid::from_raw(2, 2, vec![0; 16]).is_some());
    }

    #[test]
    fn test_alpha_scaling() {
        let grid = PixelGrid::filled(2, 2, Rgba([10, 20, 30, 200]));
        let half = grid.with_alpha_scaled(128);
        assert_eq!(half.get(1, 1), Some(Rgba([10, 20, 30, 100])));
        assert_eq!(grid.with_alpha_scaled(0).get(0, 0), Some(Rgba([10, 20, 30, 0])));
        assert_eq!(grid.with_alpha_scaled(255), grid);
    }

    #[test]
    fn test_png_bytes_decode() {
        let mut grid = PixelGrid::new(3, 2);
        grid.set(2, 1, RED);
        let mut bytes = std::io::Cursor::new(Vec::new());
        grid.as_image()
            .write_to(&mut bytes, ImageFormat::Png)
            .unwrap();

        let decoded = PixelGrid::decode(bytes.get_ref(), "x.png").unwrap();
        assert_eq!(decoded, grid);
        assert!(matches!(
            PixelGrid::decode(b"not an image", "x.txt"),
            Err(StoreError::Decode { .. })
        ));
    }

    #[test]
    fn test_thumbnail_keeps_aspect() {
        let grid = PixelGrid::new(16, 8);
        assert_eq!(grid.thumbnail(32).size(), (32, 16));
        assert_eq!(PixelGrid::new(1, 64).thumbnail(32).size(), (1, 32));
    }

    #[test]
    fn test_image_extension_filter() {
        assert!(is_image_path("assets/minecraft/textures/item/apple.png"));
        assert!(is_image_path("PACK.PNG"));
        assert!(!is_image_path("assets/minecraft/lang/en_us.json"));
        assert!(!is_image_path("png"));
    }
}
