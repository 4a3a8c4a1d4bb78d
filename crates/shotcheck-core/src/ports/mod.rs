//! Port definitions for hexagonal architecture.
//!
//! These traits define the boundaries between the domain core and external adapters.

mod embedding;
mod result_output;

pub use embedding::EmbeddingService;
pub use result_output::ResultOutput;
