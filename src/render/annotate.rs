use std::path::{Path, PathBuf};

use ab_glyph::{FontVec, PxScale};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect;
use tracing::{debug, warn};

use crate::engine::Detection;
use crate::error::{Error, Result};
use crate::render::palette::{color_for, contrasting_text};

const LABEL_FONT_SIZE: f32 = 18.0;
const LABEL_PADDING: i32 = 3;
const LABEL_CHAR_WIDTH: f32 = 9.0; // per-char width estimate when no font is loaded
const BOX_THICKNESS: i32 = 2;
const JPEG_QUALITY: u8 = 90;

const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Draws detections over an image and returns it as base64 JPEG.
pub struct AnnotationRenderer {
    font:      Option<FontVec>,
    font_size: f32,
}

impl AnnotationRenderer {
    /// Loads the font at `font_path`, or the first usable system font.
    pub fn new(font_path: Option<&Path>) -> Self {
        let font = match font_path {
            Some(path) => load_font(path),
            None => FONT_SEARCH_PATHS.iter().map(PathBuf::from).find_map(|p| load_font(&p)),
        };
        if font.is_none() {
            warn!("no label font available; detection labels will be drawn without text");
        }
        AnnotationRenderer { font, font_size: LABEL_FONT_SIZE }
    }

    /// A renderer that draws boxes and label backgrounds only.
    pub fn without_font() -> Self {
        AnnotationRenderer { font: None, font_size: LABEL_FONT_SIZE }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Annotates `image` and encodes it.
    ///
    /// If any box cannot be drawn the source image is encoded unmodified.
    pub fn render(&self, image: &DynamicImage, detections: &[Detection]) -> Result<String> {
        let source = image.to_rgb8();
        let annotated = match self.draw(&source, detections) {
            Ok(canvas) => canvas,
            Err(e) => {
                warn!(error = %e, "could not draw detections; returning the original image");
                source
            }
        };
        encode_jpeg_base64(&annotated)
    }

    /// Draws every detection onto a copy of `image`.
    pub fn draw(&self, image: &RgbImage, detections: &[Detection]) -> Result<RgbImage> {
        let mut canvas = image.clone();
        for (index, det) in detections.iter().enumerate() {
            let rect = box_rect(&det.bbox, canvas.width(), canvas.height())?;
            let color = color_for(index);
            self.draw_box(&mut canvas, rect, color);
            self.draw_label(&mut canvas, rect, color, &label_text(det));
        }
        Ok(canvas)
    }

    fn draw_box(&self, canvas: &mut RgbImage, rect: Rect, color: [u8; 3]) {
        for t in 0..BOX_THICKNESS {
            let w = rect.width() as i32 - 2 * t;
            let h = rect.height() as i32 - 2 * t;
            if w <= 0 || h <= 0 {
                break;
            }
            let inner = Rect::at(rect.left() + t, rect.top() + t).of_size(w as u32, h as u32);
            draw_hollow_rect_mut(canvas, inner, Rgb(color));
        }
    }

    fn draw_label(&self, canvas: &mut RgbImage, rect: Rect, color: [u8; 3], text: &str) {
        let scale = PxScale::from(self.font_size);
        let (text_w, text_h) = match &self.font {
            Some(font) => text_size(scale, font, text),
            None => ((text.chars().count() as f32 * LABEL_CHAR_WIDTH) as u32, self.font_size as u32),
        };
        let bg_w = text_w + 2 * LABEL_PADDING as u32;
        let bg_h = text_h + 2 * LABEL_PADDING as u32;

        // Above the box when there is room, otherwise just inside its top edge.
        let x = rect.left().max(0);
        let above = rect.top().saturating_sub(bg_h as i32);
        let y = if above >= 0 { above } else { rect.top().max(0) };

        draw_filled_rect_mut(canvas, Rect::at(x, y).of_size(bg_w, bg_h), Rgb(color));
        if let Some(font) = &self.font {
            draw_text_mut(
                canvas,
                Rgb(contrasting_text(color)),
                x + LABEL_PADDING,
                y + LABEL_PADDING,
                scale,
                font,
                text,
            );
        }
    }
}

/// `"{class_name} {confidence}%"` with the confidence rounded to a whole percent.
pub fn label_text(det: &Detection) -> String {
    format!("{} {:.0}%", det.class_name, det.confidence * 100.0)
}

/// Encodes `image` as JPEG (quality 90) and base64s the bytes.
pub fn encode_jpeg_base64(image: &RgbImage) -> Result<String> {
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    encoder.encode_image(image)?;
    Ok(STANDARD.encode(&buf))
}

/// Pixel rect for `bbox` on a `canvas_w` x `canvas_h` canvas.
///
/// Coordinates are clamped to just outside the canvas, so edges beyond it
/// stay invisible and the integer math cannot overflow.
fn box_rect(bbox: &[f32; 4], canvas_w: u32, canvas_h: u32) -> Result<Rect> {
    let [x1, y1, x2, y2] = *bbox;
    if !bbox.iter().all(|v| v.is_finite()) || x1 >= x2 || y1 >= y2 {
        return Err(Error::Render(format!("malformed box {:?}", bbox)));
    }
    let margin = (BOX_THICKNESS + 1) as f32;
    let clamp_x = |v: f32| v.clamp(-margin, canvas_w as f32 + margin);
    let clamp_y = |v: f32| v.clamp(-margin, canvas_h as f32 + margin);

    let left = clamp_x(x1).floor() as i32;
    let top = clamp_y(y1).floor() as i32;
    let right = clamp_x(x2).ceil() as i32;
    let bottom = clamp_y(y2).ceil() as i32;
    let width = right.checked_sub(left).ok_or_else(|| Error::Render(format!("box too wide {:?}", bbox)))?;
    let height = bottom.checked_sub(top).ok_or_else(|| Error::Render(format!("box too tall {:?}", bbox)))?;
    Ok(Rect::at(left, top).of_size(width.max(1) as u32, height.max(1) as u32))
}

fn load_font(path: &Path) -> Option<FontVec> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(_) => return None,
    };
    match FontVec::try_from_vec(bytes) {
        Ok(font) => {
            debug!(path = %path.display(), "loaded label font");
            Some(font)
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "not a usable font file");
            None
        }
    }
}
