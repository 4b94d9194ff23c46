/// Lunar disk rendering
///
/// Draws a simplified picture of the Moon for a given illumination: a white
/// disk on a black background, partly covered by a black "shadow" disk of the
/// same radius that slides horizontally as illumination changes.
///
/// # Geometry
///
/// Coordinates are in a unit square, origin at the left edge:
///
/// - lunar disk: center `(0.5, 0.5)`, radius `0.4`
/// - shadow disk: center `(shadow_x, 0.5)`, radius `0.4`
/// - `offset = (1 - 2 * illumination / 100) * 0.4`
/// - `shadow_x = 0.5 + offset` when illumination <= 50, else `0.5 - offset`
///
/// This is a 2D visual approximation, not a terminator curve. The formula is
/// kept as-is so rendered images stay comparable with existing clients.
///
/// # Example
///
/// ```
/// use moonphase_shared::lunar::render::DiskRenderer;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let renderer = DiskRenderer::new(200);
/// let encoded = renderer.render_base64(42.0)?;
/// assert!(!encoded.is_empty());
/// # Ok(())
/// # }
/// ```

use base64::{engine::general_purpose, Engine as _};
use image::{codecs::png::PngEncoder, ColorType, GrayImage, ImageEncoder, Luma};
use std::f64::consts::PI;

/// Radius of both disks in unit-square coordinates
pub const DISK_RADIUS: f64 = 0.4;

/// Center of the lunar disk on both axes
pub const DISK_CENTER: f64 = 0.5;

/// Default canvas edge length in pixels
pub const DEFAULT_CANVAS_SIZE: u32 = 600;

const LIT: Luma<u8> = Luma([255]);
const DARK: Luma<u8> = Luma([0]);

/// Error type for rendering
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Illumination outside [0, 100] or not a number
    #[error("Illumination must be within 0..=100, got {0}")]
    IlluminationOutOfRange(f64),

    /// PNG encoding failed
    #[error("Failed to encode image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Horizontal shadow offset for an illumination percentage
///
/// 0% gives `+0.4`, 50% gives `0.0`, 100% gives `-0.4`.
pub fn shadow_offset(illumination_percent: f64) -> f64 {
    (1.0 - 2.0 * illumination_percent / 100.0) * DISK_RADIUS
}

/// X coordinate of the shadow disk center
pub fn shadow_center_x(illumination_percent: f64) -> f64 {
    let offset = shadow_offset(illumination_percent);
    if illumination_percent <= 50.0 {
        DISK_CENTER + offset
    } else {
        DISK_CENTER - offset
    }
}

/// Share of the lunar disk left uncovered by the shadow disk
///
/// Exact area of the disk minus the lens where the two equal circles overlap.
/// Rendered images approach this value as the canvas grows.
pub fn lit_fraction(illumination_percent: f64) -> f64 {
    let d = (shadow_center_x(illumination_percent) - DISK_CENTER).abs();
    let r = DISK_RADIUS;

    if d >= 2.0 * r {
        return 1.0;
    }

    let lens = 2.0 * r * r * (d / (2.0 * r)).acos() - (d / 2.0) * (4.0 * r * r - d * d).sqrt();
    1.0 - lens / (PI * r * r)
}

/// Renders lunar disk images at a fixed canvas size
#[derive(Debug, Clone, Copy)]
pub struct DiskRenderer {
    size: u32,
}

impl Default for DiskRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CANVAS_SIZE)
    }
}

impl DiskRenderer {
    /// Creates a renderer producing `size` x `size` images
    pub fn new(size: u32) -> Self {
        Self { size: size.max(1) }
    }

    /// Canvas edge length in pixels
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Rasterizes the disk for the given illumination
    ///
    /// A pixel is lit when its center lies inside the lunar disk and outside
    /// the shadow disk.
    pub fn render(&self, illumination_percent: f64) -> Result<GrayImage, RenderError> {
        if !(0.0..=100.0).contains(&illumination_percent) {
            return Err(RenderError::IlluminationOutOfRange(illumination_percent));
        }

        let shadow_x = shadow_center_x(illumination_percent);
        let scale = self.size as f64;
        let r2 = DISK_RADIUS * DISK_RADIUS;

        Ok(GrayImage::from_fn(self.size, self.size, |px, py| {
            let x = (px as f64 + 0.5) / scale;
            let y = (py as f64 + 0.5) / scale;
            let dy2 = (y - DISK_CENTER).powi(2);

            let in_disk = (x - DISK_CENTER).powi(2) + dy2 <= r2;
            let in_shadow = (x - shadow_x).powi(2) + dy2 <= r2;

            if in_disk && !in_shadow {
                LIT
            } else {
                DARK
            }
        }))
    }

    /// Renders and encodes as PNG
    pub fn render_png(&self, illumination_percent: f64) -> Result<Vec<u8>, RenderError> {
        let image = self.render(illumination_percent)?;

        let mut bytes = Vec::new();
        PngEncoder::new(&mut bytes).write_image(
            image.as_raw(),
            image.width(),
            image.height(),
            ColorType::L8,
        )?;

        Ok(bytes)
    }

    /// Renders, encodes as PNG, then as standard base64
    pub fn render_base64(&self, illumination_percent: f64) -> Result<String, RenderError> {
        let png = self.render_png(illumination_percent)?;
        Ok(general_purpose::STANDARD.encode(png))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageFormat;

    fn decode(png: &[u8]) -> GrayImage {
        image::load_from_memory_with_format(png, ImageFormat::Png)
            .expect("PNG should decode")
            .to_luma8()
    }

    /// Pixels whose centers fall inside the lunar disk
    fn disk_pixel_count(size: u32) -> usize {
        let scale = size as f64;
        (0..size)
            .flat_map(|py| (0..size).map(move |px| (px, py)))
            .filter(|(px, py)| {
                let x = (*px as f64 + 0.5) / scale;
                let y = (*py as f64 + 0.5) / scale;
                (x - DISK_CENTER).powi(2) + (y - DISK_CENTER).powi(2) <= DISK_RADIUS * DISK_RADIUS
            })
            .count()
    }

    #[test]
    fn test_shadow_offset_endpoints() {
        assert!((shadow_offset(0.0) - 0.4).abs() < 1e-12);
        assert!((shadow_offset(100.0) + 0.4).abs() < 1e-12);
        assert!(shadow_offset(50.0).abs() < 1e-12);
    }

    #[test]
    fn test_shadow_center_branches() {
        // Half illumination sits on the disk center from either branch
        assert!((shadow_center_x(50.0) - 0.5).abs() < 1e-12);

        // Waxing branch moves the shadow left as illumination rises to 50
        assert!((shadow_center_x(0.0) - 0.9).abs() < 1e-12);
        assert!((shadow_center_x(25.0) - 0.7).abs() < 1e-12);

        // Waning branch
        assert!((shadow_center_x(75.0) - 0.7).abs() < 1e-12);
        assert!((shadow_center_x(100.0) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_lit_fraction_at_half_is_zero() {
        assert!(lit_fraction(50.0).abs() < 1e-12);
    }

    #[test]
    fn test_render_rejects_out_of_range() {
        let renderer = DiskRenderer::new(32);
        assert!(matches!(
            renderer.render(-0.1),
            Err(RenderError::IlluminationOutOfRange(_))
        ));
        assert!(matches!(
            renderer.render(100.5),
            Err(RenderError::IlluminationOutOfRange(_))
        ));
        assert!(matches!(
            renderer.render(f64::NAN),
            Err(RenderError::IlluminationOutOfRange(_))
        ));
    }

    #[test]
    fn test_background_is_black() {
        let image = DiskRenderer::new(100).render(80.0).unwrap();
        assert_eq!(image.get_pixel(0, 0), &DARK);
        assert_eq!(image.get_pixel(99, 99), &DARK);
        assert_eq!(image.get_pixel(0, 99), &DARK);
    }

    #[test]
    fn test_half_illumination_is_fully_shadowed() {
        let image = DiskRenderer::new(100).render(50.0).unwrap();
        assert!(image.pixels().all(|p| *p == DARK));
    }

    #[test]
    fn test_png_decodes_for_full_range() {
        let renderer = DiskRenderer::new(64);
        let mut illumination = 0.0;
        while illumination <= 100.0 {
            let png = renderer.render_png(illumination).unwrap();
            let decoded = decode(&png);
            assert_eq!(decoded.dimensions(), (64, 64));
            illumination += 2.5;
        }
    }

    #[test]
    fn test_base64_payload_decodes_to_png() {
        let encoded = DiskRenderer::new(48).render_base64(30.0).unwrap();
        let png = general_purpose::STANDARD.decode(encoded).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
        assert_eq!(decode(&png).dimensions(), (48, 48));
    }

    #[test]
    fn test_decoded_pixels_match_geometry() {
        let size = 300;
        let renderer = DiskRenderer::new(size);
        let disk_pixels = disk_pixel_count(size) as f64;

        for illumination in [0.0, 10.0, 33.3, 50.0, 62.5, 90.0, 100.0] {
            let decoded = decode(&renderer.render_png(illumination).unwrap());
            let lit = decoded.pixels().filter(|p| **p == LIT).count() as f64;
            let dark = decoded.pixels().filter(|p| **p == DARK).count() as f64;

            assert_eq!(lit + dark, (size * size) as f64, "image must be pure black/white");

            let expected = lit_fraction(illumination);
            let measured = lit / disk_pixels;
            assert!(
                (measured - expected).abs() < 0.01,
                "illumination {}: measured {:.4}, expected {:.4}",
                illumination,
                measured,
                expected
            );
        }
    }

    #[test]
    fn test_lit_pixels_grow_toward_either_end() {
        let renderer = DiskRenderer::new(120);
        let lit = |illumination: f64| {
            renderer
                .render(illumination)
                .unwrap()
                .pixels()
                .filter(|p| **p == LIT)
                .count()
        };

        assert!(lit(10.0) > lit(30.0));
        assert!(lit(30.0) > lit(50.0));
        assert!(lit(70.0) > lit(50.0));
        assert!(lit(90.0) > lit(70.0));
    }

    #[test]
    fn test_default_canvas_size() {
        assert_eq!(DiskRenderer::default().size(), DEFAULT_CANVAS_SIZE);
        assert_eq!(DiskRenderer::new(0).size(), 1);
    }
}
