pub mod detect;
pub mod labeling;
pub mod model;
pub mod training;
