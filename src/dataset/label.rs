use std::fmt;

use serde::{Deserialize, Serialize};

/// A user-drawn box in absolute pixel coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
    pub label: String,
}

/// Body of the `labeling_data` form field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelingData {
    pub boxes: Vec<LabelBox>,
    pub image_width: f64,
    pub image_height: f64,
}

/// One YOLO annotation line: class id plus center/size as fractions of
/// the image dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct YoloLabel {
    pub class_id: usize,
    pub center_x: f64,
    pub center_y: f64,
    pub width: f64,
    pub height: f64,
}

impl YoloLabel {
    /// Normalizes `b` against an `image_width` × `image_height` image.
    ///
    /// Values are not clamped: a box reaching past the image edge yields
    /// fractions outside [0, 1].
    pub fn from_box(b: &LabelBox, class_id: usize, image_width: f64, image_height: f64) -> Self {
        YoloLabel {
            class_id,
            center_x: (b.x1 + b.x2) / 2.0 / image_width,
            center_y: (b.y1 + b.y2) / 2.0 / image_height,
            width:    (b.x2 - b.x1).abs() / image_width,
            height:   (b.y2 - b.y1).abs() / image_height,
        }
    }

    /// Parses `"{id} {cx} {cy} {w} {h}"`; `None` on any malformed field.
    pub fn parse(line: &str) -> Option<Self> {
        let mut fields = line.split_whitespace();
        let class_id = fields.next()?.parse().ok()?;
        let mut next = || fields.next().and_then(|f| f.parse::<f64>().ok());
        let label = YoloLabel {
            class_id,
            center_x: next()?,
            center_y: next()?,
            width:    next()?,
            height:   next()?,
        };
        Some(label)
    }
}

impl fmt::Display for YoloLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {:.6} {:.6} {:.6} {:.6}",
            self.class_id, self.center_x, self.center_y, self.width, self.height
        )
    }
}
