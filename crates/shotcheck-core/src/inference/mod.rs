//! Model inference with candle.
//!
//! Holds the CLIP embedder behind the `EmbeddingService` port, plus weight
//! loading and the vector math shared by the analyzers.

mod clip;
mod device;
mod loader;
mod utils;

pub use clip::{preprocess as clip_preprocess, ClipEmbedder, IMAGE_SIZE as CLIP_IMAGE_SIZE};
pub use device::get_device;
pub use loader::{load_safetensors, LazyModel, ModelBuilder};
pub use utils::{argmax, dot, l2_normalize, softmax};
