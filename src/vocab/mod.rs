pub mod store;

pub use store::{normalize_classes, VocabularyStore};
