pub mod annotate;
pub mod palette;

pub use annotate::{encode_jpeg_base64, label_text, AnnotationRenderer};
pub use palette::PALETTE;
