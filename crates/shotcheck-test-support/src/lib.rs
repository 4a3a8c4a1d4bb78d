//! Test support utilities for shotcheck.
//!
//! Provides synthetic product shots and mocks for the core ports.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use shotcheck_core::{Assessor, AssessorConfig};
//! use shotcheck_test_support::{MockEmbeddingService, SyntheticImageBuilder};
//!
//! let shot = SyntheticImageBuilder::product_on_white(200, 200, 60);
//! let assessor = Assessor::new(
//!     AssessorConfig::default(),
//!     Arc::new(MockEmbeddingService::preferring(0)),
//! );
//! # let _ = (shot, assessor);
//! ```

mod builders;
mod mocks;

pub use builders::SyntheticImageBuilder;
pub use mocks::{MockEmbeddingService, MockResultOutput, MOCK_DIMS};
