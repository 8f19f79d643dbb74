//! ONNX Runtime backed segmentation model.

use std::path::Path;

use ndarray::{Array3, Axis};
use ort::session::Session;
use ort::value::Tensor;

use crate::error::{Error, Result};
use crate::image::{InputTensor, LogitMap, NUM_CLASSES};

use super::SegmentationModel;

/// Crack segmentation network loaded into an ONNX Runtime session.
///
/// The network takes a single `(1, 3, H, W)` input and its first output is
/// `(1, 2, H, W)` logits.
pub struct OnnxSegmenter {
    session: Session,
}

impl OnnxSegmenter {
    /// Load a model from an ONNX file.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingModel`] if the file does not exist and
    /// [`Error::ModelLoad`] if ONNX Runtime rejects it.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(Error::MissingModel {
                path: path.to_path_buf(),
            });
        }

        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        let session = Session::builder()
            .map_err(|source| Error::ModelLoad {
                name: name.clone(),
                source,
            })?
            .commit_from_file(path)
            .map_err(|source| Error::ModelLoad {
                name: name.clone(),
                source,
            })?;

        tracing::info!("Loaded segmentation model {name}");

        Ok(Self { session })
    }
}

impl SegmentationModel for OnnxSegmenter {
    fn infer(&mut self, input: &InputTensor) -> Result<LogitMap> {
        let batched = input.clone().insert_axis(Axis(0));
        let input_value =
            Tensor::from_array(batched).map_err(|source| Error::inference("input upload", source))?;

        let outputs = self
            .session
            .run(ort::inputs![input_value])
            .map_err(|source| Error::inference("session run", source))?;

        let output = outputs
            .values()
            .next()
            .ok_or_else(|| Error::ShapeMismatch {
                expected: "logits output".to_string(),
                actual: "no output".to_string(),
            })?;

        extract_logits(&output)
    }
}

/// Extract `(1, C, H, W)` logits from an ONNX value, dropping the batch axis.
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
fn extract_logits(value: &ort::value::ValueRef<'_>) -> Result<LogitMap> {
    let (shape_info, data) = value
        .try_extract_tensor::<f32>()
        .map_err(|source| Error::inference("output extraction", source))?;

    // Safe: tensor dimensions are always non-negative
    let dims: Vec<usize> = shape_info.iter().map(|&x| x as usize).collect();

    match dims.as_slice() {
        &[1, classes, height, width] if classes == NUM_CLASSES => {
            Array3::from_shape_vec((classes, height, width), data.to_vec()).map_err(|_| {
                Error::ShapeMismatch {
                    expected: format!("{dims:?}"),
                    actual: "reshape failed".to_string(),
                }
            })
        }
        _ => Err(Error::ShapeMismatch {
            expected: format!("[1, {NUM_CLASSES}, H, W] logits"),
            actual: format!("{dims:?}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_model_file() {
        let err = OnnxSegmenter::from_file("/nonexistent/crackseg/model.onnx")
            .err()
            .unwrap();
        assert!(matches!(err, Error::MissingModel { .. }));
    }
}
