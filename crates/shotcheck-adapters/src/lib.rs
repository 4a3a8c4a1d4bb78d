//! Shotcheck adapters: image files on disk and the model cache.

pub mod fs;
pub mod models;

pub use fs::load_image;
pub use models::{model_path_in, models_dir};
