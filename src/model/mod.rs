//! Inference collaborator: the segmentation model seam and its ONNX backend.

mod loader;
mod session;

pub use loader::{ModelCache, DEFAULT_MODEL_FILENAME};
pub use session::OnnxSegmenter;

use crate::error::Result;
use crate::image::{InputTensor, LogitMap};

/// Black-box segmentation model: tensor `[3, H, W]` in, logits `[2, H, W]` out.
///
/// Implementations must preserve `H` and `W` and keep no state between calls
/// that affects the output. A call may block for a long time.
pub trait SegmentationModel {
    /// Run the model on one normalized tensor.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MissingModel`] when the backend is unavailable
    /// and [`crate::Error::Inference`] when execution fails.
    fn infer(&mut self, input: &InputTensor) -> Result<LogitMap>;
}

impl<F> SegmentationModel for F
where
    F: FnMut(&InputTensor) -> Result<LogitMap>,
{
    fn infer(&mut self, input: &InputTensor) -> Result<LogitMap> {
        self(input)
    }
}
