//! Crack segmentation pipeline: preprocess, infer, decode, thin, render.

pub mod decode;
pub mod metrics;
pub mod preprocess;
pub mod render;
mod segment;
pub mod thinning;

pub use decode::{decode_logits, softmax_pair, DecodedScores};
pub use metrics::CrackMetrics;
pub use preprocess::{padded_dim, prepare_tensor, ChannelStats, PreparedInput};
pub use segment::{spawn_segment, Config, Pipeline, SegmentationResult};
pub use thinning::{thin, thin_with_stats, ThinningStats};
