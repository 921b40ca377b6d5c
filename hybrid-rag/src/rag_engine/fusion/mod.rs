//! Score normalization and hybrid rank fusion.

pub mod hybrid;
pub mod score_normalizer;

pub use hybrid::{FusionMethod, fuse, fuse_with};
pub use score_normalizer::{DEGENERATE_RANGE_EPSILON, normalize};
