//! In-memory image transforms that prepare edit payloads.
//!
//! Every transform takes an [`ImageBuffer`] by reference and returns a new
//! one; buffers are never mutated in place.

use std::fmt;
use std::io::Cursor;

use easel_contracts::generation::MaskDirective;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};

use crate::config::CANONICAL_MIME_TYPE;
use crate::error::{GenerateError, Result};

pub const MAX_DIMENSION: u32 = 3000;
pub const MIN_MASK_BORDER: u32 = 20;
pub const DEFAULT_QUALITY: f32 = 0.9;
/// Longest side an expanded canvas may reach before encoding.
pub const MAX_CANVAS_DIMENSION: u32 = 4 * MAX_DIMENSION;
const QUALITY_FLOOR: f32 = 0.3;
const QUALITY_STEP: f32 = 0.1;

const OPAQUE_WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// Encoded image bytes plus the facts the pipeline needs about them.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageBuffer {
    bytes: Vec<u8>,
    width: u32,
    height: u32,
    mime_type: String,
}

impl fmt::Debug for ImageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl ImageBuffer {
    /// Sniffs the format and dimensions of already-encoded bytes.
    pub fn decode(bytes: Vec<u8>) -> Result<Self> {
        if bytes.is_empty() {
            return Err(GenerateError::validation("image data is empty"));
        }
        let format = image::guess_format(&bytes)?;
        let decoded = image::load_from_memory_with_format(&bytes, format)?;
        Ok(Self {
            width: decoded.width(),
            height: decoded.height(),
            mime_type: format.to_mime_type().to_string(),
            bytes,
        })
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_canonical(&self) -> bool {
        self.mime_type == CANONICAL_MIME_TYPE
    }

    pub fn file_name(&self, stem: &str) -> String {
        let ext = match self.mime_type.as_str() {
            "image/jpeg" => "jpg",
            "image/webp" => "webp",
            "image/gif" => "gif",
            _ => "png",
        };
        format!("{stem}.{ext}")
    }

    pub fn to_image(&self) -> Result<DynamicImage> {
        Ok(image::load_from_memory(&self.bytes)?)
    }

    fn encode(image: &DynamicImage, encoding: Encoding) -> Result<Self> {
        let mut bytes = Vec::new();
        match encoding {
            Encoding::Png { compression } => {
                let encoder = PngEncoder::new_with_quality(
                    Cursor::new(&mut bytes),
                    compression,
                    PngFilter::Adaptive,
                );
                DynamicImage::ImageRgba8(image.to_rgba8()).write_with_encoder(encoder)?;
            }
            Encoding::Jpeg { quality } => {
                let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
                encoder.encode_image(&DynamicImage::ImageRgb8(image.to_rgb8()))?;
            }
        }
        Ok(Self {
            width: image.width(),
            height: image.height(),
            mime_type: encoding.mime_type().to_string(),
            bytes,
        })
    }

    fn encode_canonical(image: RgbaImage) -> Result<Self> {
        Self::encode(
            &DynamicImage::ImageRgba8(image),
            Encoding::Png {
                compression: CompressionType::Default,
            },
        )
    }
}

#[derive(Debug, Clone, Copy)]
enum Encoding {
    Png { compression: CompressionType },
    Jpeg { quality: u8 },
}

impl Encoding {
    /// JPEG stays JPEG; everything else is re-encoded as the canonical PNG.
    fn for_recompression(mime_type: &str, quality: f32) -> Self {
        if mime_type == "image/jpeg" {
            let quality = (quality * 100.0).round().clamp(1.0, 100.0) as u8;
            return Self::Jpeg { quality };
        }
        let compression = if quality >= 0.7 {
            CompressionType::Default
        } else {
            CompressionType::Best
        };
        Self::Png { compression }
    }

    fn mime_type(&self) -> &'static str {
        match self {
            Self::Png { .. } => ImageFormat::Png.to_mime_type(),
            Self::Jpeg { .. } => ImageFormat::Jpeg.to_mime_type(),
        }
    }
}

/// Rounds half-way values up, the way canvas coordinates are rounded.
fn canvas_round(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn scaled_dimension(value: u32, factor: f64) -> u32 {
    canvas_round(value as f64 * factor).max(1) as u32
}

/// Flattens `buffer` onto opaque white and re-encodes it as PNG.
pub fn convert_to_canonical(buffer: &ImageBuffer) -> Result<ImageBuffer> {
    let rgba = buffer.to_image()?.to_rgba8();
    let mut flattened = RgbaImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let alpha = u16::from(pixel[3]);
        let blend = |channel: u8| -> u8 {
            (((u16::from(channel) * alpha) + (255 * (255 - alpha))) / 255) as u8
        };
        flattened.put_pixel(
            x,
            y,
            Rgba([blend(pixel[0]), blend(pixel[1]), blend(pixel[2]), 255]),
        );
    }
    ImageBuffer::encode_canonical(flattened)
}

pub fn mask_border_width(width: u32, height: u32) -> u32 {
    let proportional = canvas_round(0.10 * f64::from(width.min(height))).max(0) as u32;
    proportional.max(MIN_MASK_BORDER)
}

/// Same-size mask: transparent keeps a pixel, opaque white repaints it.
pub fn synthesize_mask(buffer: &ImageBuffer, directive: MaskDirective) -> Result<ImageBuffer> {
    let (width, height) = (buffer.width(), buffer.height());
    let border = mask_border_width(width, height);
    let rows = border.min(height);
    let cols = border.min(width);
    let mut mask = RgbaImage::from_pixel(width, height, TRANSPARENT);

    let paint_top = matches!(directive, MaskDirective::Top | MaskDirective::All);
    let paint_bottom = matches!(directive, MaskDirective::Bottom | MaskDirective::All);
    let paint_left = matches!(directive, MaskDirective::Left | MaskDirective::All);
    let paint_right = matches!(directive, MaskDirective::Right | MaskDirective::All);

    for (x, y, pixel) in mask.enumerate_pixels_mut() {
        let hit = (paint_top && y < rows)
            || (paint_bottom && y >= height - rows)
            || (paint_left && x < cols)
            || (paint_right && x >= width - cols);
        if hit {
            *pixel = OPAQUE_WHITE;
        }
    }
    ImageBuffer::encode_canonical(mask)
}

/// Mask that repaints every fully transparent pixel of `buffer`.
pub fn mask_from_transparency(buffer: &ImageBuffer) -> Result<ImageBuffer> {
    let rgba = buffer.to_image()?.to_rgba8();
    let mask = RgbaImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        if rgba.get_pixel(x, y)[3] == 0 {
            OPAQUE_WHITE
        } else {
            TRANSPARENT
        }
    });
    ImageBuffer::encode_canonical(mask)
}

/// Brings a caller-supplied mask onto the payload's exact size as PNG.
pub fn fit_mask(mask: &ImageBuffer, width: u32, height: u32) -> Result<ImageBuffer> {
    if mask.width() == width && mask.height() == height && mask.is_canonical() {
        return Ok(mask.clone());
    }
    let resized = mask
        .to_image()?
        .resize_exact(width, height, FilterType::Nearest)
        .to_rgba8();
    ImageBuffer::encode_canonical(resized)
}

/// Centers `buffer` on a transparent canvas `scale_factor` times its size.
pub fn expand_canvas(buffer: &ImageBuffer, scale_factor: f32) -> Result<ImageBuffer> {
    let factor = f64::from(scale_factor);
    if !factor.is_finite() || factor <= 0.0 {
        return Err(GenerateError::validation(format!(
            "scale factor must be a positive number, got {scale_factor}"
        )));
    }
    let (width, height) = (buffer.width(), buffer.height());
    let new_width = canvas_round(f64::from(width) * factor);
    let new_height = canvas_round(f64::from(height) * factor);
    if new_width.max(new_height) > i64::from(MAX_CANVAS_DIMENSION) {
        return Err(GenerateError::validation(format!(
            "scale factor {scale_factor} would grow {width}x{height} past {MAX_CANVAS_DIMENSION}px"
        )));
    }
    let new_width = new_width.max(1) as u32;
    let new_height = new_height.max(1) as u32;
    let source = buffer.to_image()?.to_rgba8();
    let offset_x = canvas_round((f64::from(new_width) - f64::from(width)) / 2.0);
    let offset_y = canvas_round((f64::from(new_height) - f64::from(height)) / 2.0);

    let mut canvas = RgbaImage::from_pixel(new_width, new_height, TRANSPARENT);
    imageops::overlay(&mut canvas, &source, offset_x, offset_y);
    ImageBuffer::encode_canonical(canvas)
}

/// Result of [`recompress_to_budget`]: the image plus how many encode passes
/// it took.
#[derive(Debug, Clone)]
pub struct Recompression {
    pub image: ImageBuffer,
    pub passes: usize,
    pub within_budget: bool,
}

pub fn constrain_to_byte_budget(
    buffer: ImageBuffer,
    max_bytes: usize,
    quality: f32,
) -> Result<ImageBuffer> {
    Ok(recompress_to_budget(buffer, max_bytes, quality)?.image)
}

/// Shrinks and re-encodes until the payload fits `max_bytes`.
///
/// Quality starts at `quality` (capped at 1.0), drops by 0.1 per pass and
/// stops below 0.3; the default 0.9 allows seven passes. Missing the budget is not an error; the smallest encoding
/// seen (never larger than the input) is returned.
pub fn recompress_to_budget(
    buffer: ImageBuffer,
    max_bytes: usize,
    quality: f32,
) -> Result<Recompression> {
    if buffer.size() <= max_bytes {
        return Ok(Recompression {
            image: buffer,
            passes: 0,
            within_budget: true,
        });
    }

    let start_quality = quality.min(1.0);
    let mut step: u16 = 0;
    let mut working = buffer.to_image()?;
    let mut current_size = buffer.size();
    let mut best = buffer;
    let mut passes = 0;

    loop {
        let pass_quality = start_quality - QUALITY_STEP * f32::from(step);
        // 0.9 - 6 * 0.1 lands a hair under 0.3 in f32
        if pass_quality < QUALITY_FLOOR - 1e-4 {
            break;
        }
        working = clamp_longest_side(working, MAX_DIMENSION);

        let factor = ((max_bytes as f64) / (current_size as f64)).sqrt() * 0.9;
        if factor < 1.0 {
            let width = scaled_dimension(working.width(), factor);
            let height = scaled_dimension(working.height(), factor);
            working = working.resize_exact(width, height, FilterType::Triangle);
        }

        let encoding = Encoding::for_recompression(best.mime_type(), pass_quality);
        let candidate = ImageBuffer::encode(&working, encoding)?;
        passes += 1;
        tracing::debug!(
            pass = passes,
            quality = pass_quality,
            size = candidate.size(),
            max_bytes,
            "recompressed image"
        );

        if candidate.size() <= max_bytes {
            return Ok(Recompression {
                image: candidate,
                passes,
                within_budget: true,
            });
        }
        current_size = candidate.size();
        if candidate.size() < best.size() {
            best = candidate;
        }
        step += 1;
    }

    tracing::warn!(
        size = best.size(),
        max_bytes,
        passes,
        "image still over byte budget at quality floor"
    );
    Ok(Recompression {
        image: best,
        passes,
        within_budget: false,
    })
}

pub(crate) fn clamp_longest_side(image: DynamicImage, limit: u32) -> DynamicImage {
    let (width, height) = (image.width(), image.height());
    let longest = width.max(height);
    if longest <= limit {
        return image;
    }
    let factor = f64::from(limit) / f64::from(longest);
    let (new_width, new_height) = if width >= height {
        (limit, scaled_dimension(height, factor))
    } else {
        (scaled_dimension(width, factor), limit)
    };
    image.resize_exact(new_width, new_height, FilterType::Triangle)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn solid_png(width: u32, height: u32, pixel: Rgba<u8>) -> ImageBuffer {
        ImageBuffer::encode_canonical(RgbaImage::from_pixel(width, height, pixel))
            .expect("encode solid png")
    }

    fn noise_image(width: u32, height: u32) -> DynamicImage {
        let mut state: u32 = 0x1234_5678;
        let image = RgbaImage::from_fn(width, height, |_, _| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            let bytes = state.to_le_bytes();
            Rgba([bytes[0], bytes[1], bytes[2], 255])
        });
        DynamicImage::ImageRgba8(image)
    }

    fn noise_png(width: u32, height: u32) -> ImageBuffer {
        ImageBuffer::encode(
            &noise_image(width, height),
            Encoding::Png {
                compression: CompressionType::Default,
            },
        )
        .expect("encode noise png")
    }

    #[test]
    fn decode_reports_format_and_dimensions() -> anyhow::Result<()> {
        let source = solid_png(12, 7, Rgba([1, 2, 3, 255]));
        let decoded = ImageBuffer::decode(source.bytes().to_vec())?;
        assert_eq!((decoded.width(), decoded.height()), (12, 7));
        assert_eq!(decoded.mime_type(), "image/png");
        assert_eq!(decoded.file_name("upload"), "upload.png");
        Ok(())
    }

    #[test]
    fn decode_rejects_empty_input() {
        let err = ImageBuffer::decode(Vec::new()).unwrap_err();
        assert!(matches!(err, GenerateError::Validation(_)));
    }

    #[test]
    fn canonical_conversion_flattens_transparency_onto_white() -> anyhow::Result<()> {
        let mut source = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 255]));
        source.put_pixel(0, 0, TRANSPARENT);
        source.put_pixel(1, 0, Rgba([0, 0, 0, 128]));
        let buffer = ImageBuffer::encode_canonical(source)?;

        let canonical = convert_to_canonical(&buffer)?;
        assert!(canonical.is_canonical());
        let pixels = canonical.to_image()?.to_rgba8();
        assert_eq!(*pixels.get_pixel(0, 0), OPAQUE_WHITE);
        assert_eq!(*pixels.get_pixel(1, 0), Rgba([127, 127, 127, 255]));
        assert_eq!(*pixels.get_pixel(2, 2), Rgba([255, 0, 0, 255]));
        Ok(())
    }

    #[test]
    fn canonical_conversion_turns_jpeg_into_png() -> anyhow::Result<()> {
        let jpeg = ImageBuffer::encode(&noise_image(16, 8), Encoding::Jpeg { quality: 80 })?;
        assert_eq!(jpeg.mime_type(), "image/jpeg");

        let canonical = convert_to_canonical(&jpeg)?;
        assert_eq!(canonical.mime_type(), "image/png");
        assert_eq!((canonical.width(), canonical.height()), (16, 8));
        Ok(())
    }

    #[test]
    fn all_directive_paints_every_edge_independently() -> anyhow::Result<()> {
        let buffer = solid_png(1000, 500, OPAQUE_WHITE);
        assert_eq!(mask_border_width(1000, 500), 50);

        let mask = synthesize_mask(&buffer, MaskDirective::All)?;
        assert!(mask.is_canonical());
        let pixels = mask.to_image()?.to_rgba8();
        assert_eq!(pixels.dimensions(), (1000, 500));

        assert_eq!(*pixels.get_pixel(500, 0), OPAQUE_WHITE);
        assert_eq!(*pixels.get_pixel(500, 49), OPAQUE_WHITE);
        assert_eq!(*pixels.get_pixel(500, 50), TRANSPARENT);
        assert_eq!(*pixels.get_pixel(500, 449), TRANSPARENT);
        assert_eq!(*pixels.get_pixel(500, 450), OPAQUE_WHITE);
        assert_eq!(*pixels.get_pixel(49, 250), OPAQUE_WHITE);
        assert_eq!(*pixels.get_pixel(50, 250), TRANSPARENT);
        assert_eq!(*pixels.get_pixel(949, 250), TRANSPARENT);
        assert_eq!(*pixels.get_pixel(950, 250), OPAQUE_WHITE);
        Ok(())
    }

    #[test]
    fn small_images_get_minimum_border() -> anyhow::Result<()> {
        let buffer = solid_png(100, 100, OPAQUE_WHITE);
        let mask = synthesize_mask(&buffer, MaskDirective::Top)?;
        let pixels = mask.to_image()?.to_rgba8();
        assert_eq!(*pixels.get_pixel(50, 19), OPAQUE_WHITE);
        assert_eq!(*pixels.get_pixel(50, 20), TRANSPARENT);
        assert_eq!(*pixels.get_pixel(0, 99), TRANSPARENT);
        Ok(())
    }

    #[test]
    fn right_directive_only_touches_right_edge() -> anyhow::Result<()> {
        let buffer = solid_png(300, 200, OPAQUE_WHITE);
        let mask = synthesize_mask(&buffer, MaskDirective::Right)?;
        let pixels = mask.to_image()?.to_rgba8();
        assert_eq!(*pixels.get_pixel(299, 0), OPAQUE_WHITE);
        assert_eq!(*pixels.get_pixel(280, 100), OPAQUE_WHITE);
        assert_eq!(*pixels.get_pixel(279, 100), TRANSPARENT);
        assert_eq!(*pixels.get_pixel(0, 0), TRANSPARENT);
        Ok(())
    }

    #[test]
    fn expand_canvas_centers_original() -> anyhow::Result<()> {
        let red = Rgba([255, 0, 0, 255]);
        let buffer = solid_png(100, 100, red);

        let expanded = expand_canvas(&buffer, 2.0)?;
        assert_eq!((expanded.width(), expanded.height()), (200, 200));
        let pixels = expanded.to_image()?.to_rgba8();
        assert_eq!(*pixels.get_pixel(50, 50), red);
        assert_eq!(*pixels.get_pixel(149, 149), red);
        assert_eq!(pixels.get_pixel(49, 49)[3], 0);
        assert_eq!(pixels.get_pixel(150, 150)[3], 0);
        Ok(())
    }

    #[test]
    fn expand_canvas_rounds_odd_growth() -> anyhow::Result<()> {
        let buffer = solid_png(101, 50, OPAQUE_WHITE);
        let expanded = expand_canvas(&buffer, 1.5)?;
        // 151.5 -> 152, 75 -> 75; offsets round(25.5)=26, round(12.5)=13
        assert_eq!((expanded.width(), expanded.height()), (152, 75));
        let pixels = expanded.to_image()?.to_rgba8();
        assert_eq!(pixels.get_pixel(25, 13)[3], 0);
        assert_eq!(pixels.get_pixel(26, 13)[3], 255);
        assert_eq!(pixels.get_pixel(26, 12)[3], 0);
        Ok(())
    }

    #[test]
    fn expand_canvas_rejects_non_positive_factor() {
        let buffer = solid_png(10, 10, OPAQUE_WHITE);
        assert!(matches!(
            expand_canvas(&buffer, 0.0),
            Err(GenerateError::Validation(_))
        ));
        assert!(matches!(
            expand_canvas(&buffer, f32::NAN),
            Err(GenerateError::Validation(_))
        ));
    }

    #[test]
    fn expand_canvas_refuses_oversized_canvas() {
        let buffer = solid_png(10, 10, OPAQUE_WHITE);
        assert!(matches!(
            expand_canvas(&buffer, 100_000.0),
            Err(GenerateError::Validation(_))
        ));
        let large = solid_png(3000, 10, OPAQUE_WHITE);
        assert!(matches!(
            expand_canvas(&large, 4.5),
            Err(GenerateError::Validation(_))
        ));
    }

    #[test]
    fn transparency_mask_marks_new_surround() -> anyhow::Result<()> {
        let buffer = solid_png(10, 10, Rgba([0, 128, 0, 255]));
        let expanded = expand_canvas(&buffer, 2.0)?;
        let mask = mask_from_transparency(&expanded)?;
        let pixels = mask.to_image()?.to_rgba8();
        assert_eq!(*pixels.get_pixel(0, 0), OPAQUE_WHITE);
        assert_eq!(*pixels.get_pixel(10, 10), TRANSPARENT);
        assert_eq!(*pixels.get_pixel(15, 4), OPAQUE_WHITE);
        Ok(())
    }

    #[test]
    fn fit_mask_resizes_to_payload() -> anyhow::Result<()> {
        let mask = solid_png(40, 20, OPAQUE_WHITE);
        let same = fit_mask(&mask, 40, 20)?;
        assert_eq!(same, mask);

        let fitted = fit_mask(&mask, 20, 10)?;
        assert_eq!((fitted.width(), fitted.height()), (20, 10));
        assert_eq!(*fitted.to_image()?.to_rgba8().get_pixel(5, 5), OPAQUE_WHITE);
        Ok(())
    }

    #[test]
    fn budget_is_identity_when_already_small_enough() -> anyhow::Result<()> {
        let buffer = solid_png(32, 32, OPAQUE_WHITE);
        let report = recompress_to_budget(buffer.clone(), buffer.size(), DEFAULT_QUALITY)?;
        assert_eq!(report.passes, 0);
        assert!(report.within_budget);
        assert_eq!(report.image, buffer);
        Ok(())
    }

    #[test]
    fn budget_shrinks_oversized_png() -> anyhow::Result<()> {
        let buffer = noise_png(256, 256);
        let input_size = buffer.size();
        let max_bytes = input_size / 4;

        let report = recompress_to_budget(buffer, max_bytes, DEFAULT_QUALITY)?;
        assert!(report.within_budget);
        assert!(report.passes >= 1 && report.passes <= 7);
        assert!(report.image.size() <= max_bytes);
        assert!(report.image.width() < 256);
        assert_eq!(report.image.mime_type(), "image/png");
        Ok(())
    }

    #[test]
    fn unreachable_budget_stops_at_quality_floor() -> anyhow::Result<()> {
        let buffer = noise_png(64, 64);
        let input_size = buffer.size();

        let report = recompress_to_budget(buffer, 10, DEFAULT_QUALITY)?;
        assert_eq!(report.passes, 7);
        assert!(!report.within_budget);
        assert!(report.image.size() <= input_size);
        Ok(())
    }

    #[test]
    fn fractional_quality_never_rounds_up() -> anyhow::Result<()> {
        let buffer = noise_png(32, 32);
        // 0.35 runs once, then 0.25 is under the floor
        let report = recompress_to_budget(buffer, 10, 0.35)?;
        assert_eq!(report.passes, 1);
        assert!(!report.within_budget);
        Ok(())
    }

    #[test]
    fn quality_below_floor_returns_input_untouched() -> anyhow::Result<()> {
        let buffer = noise_png(32, 32);
        let report = recompress_to_budget(buffer.clone(), 10, 0.2)?;
        assert_eq!(report.passes, 0);
        assert_eq!(report.image, buffer);
        Ok(())
    }

    #[test]
    fn jpeg_stays_jpeg_when_recompressed() -> anyhow::Result<()> {
        let jpeg = ImageBuffer::encode(&noise_image(200, 200), Encoding::Jpeg { quality: 100 })?;
        let max_bytes = jpeg.size() / 3;
        let shrunk = constrain_to_byte_budget(jpeg, max_bytes, DEFAULT_QUALITY)?;
        assert_eq!(shrunk.mime_type(), "image/jpeg");
        assert!(shrunk.size() <= max_bytes);
        Ok(())
    }

    #[test]
    fn longest_side_is_clamped_proportionally() {
        let wide = DynamicImage::ImageRgba8(RgbaImage::new(6000, 1001));
        let clamped = clamp_longest_side(wide, MAX_DIMENSION);
        assert_eq!((clamped.width(), clamped.height()), (3000, 501));

        let small = DynamicImage::ImageRgba8(RgbaImage::new(30, 20));
        let untouched = clamp_longest_side(small, MAX_DIMENSION);
        assert_eq!((untouched.width(), untouched.height()), (30, 20));
    }
}
