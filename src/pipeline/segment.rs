//! End-to-end crack segmentation pipeline.

use std::path::{Path, PathBuf};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use image::{GrayImage, RgbImage};
use ndarray::Axis;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::error::{Error, Result};
use crate::image::{load_image, save_rasters, SavedRasters};
use crate::model::{ModelCache, OnnxSegmenter, SegmentationModel};

use super::decode::decode_logits;
use super::metrics::CrackMetrics;
use super::preprocess::prepare_tensor;
use super::render::{render_binary, render_probability};
use super::thinning::thin_with_stats;

/// Configuration for the segmentation pipeline.
#[derive(Debug, Clone)]
pub struct Config {
    /// ONNX model file. None uses the platform cache directory.
    pub model_path: Option<PathBuf>,

    /// Where to download the model from if the file is missing.
    pub model_url: Option<String>,

    /// Random seed for zero-pixel substitution. None for random.
    pub seed: Option<u64>,

    /// Render cracks dark on a light background.
    pub invert_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model_path: None,
            model_url: None,
            seed: None,
            invert_output: true,
        }
    }
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if let Some(url) = &self.model_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::InvalidParameter {
                    name: "model_url".to_string(),
                    reason: format!("expected an http(s) URL, got {url:?}"),
                });
            }
        }

        Ok(())
    }
}

/// Rasters and measurements produced by one pipeline run.
#[derive(Debug, Clone)]
pub struct SegmentationResult {
    probability: GrayImage,
    mask: GrayImage,
    skeleton: GrayImage,
    inference_time: Duration,
    metrics: CrackMetrics,
}

impl SegmentationResult {
    /// Assemble a result from rasters of identical size.
    #[must_use]
    pub fn new(
        probability: GrayImage,
        mask: GrayImage,
        skeleton: GrayImage,
        inference_time: Duration,
        metrics: CrackMetrics,
    ) -> Self {
        Self {
            probability,
            mask,
            skeleton,
            inference_time,
            metrics,
        }
    }

    /// Crack probability heat map.
    #[must_use]
    pub fn probability(&self) -> &GrayImage {
        &self.probability
    }

    /// Binary crack mask.
    #[must_use]
    pub fn mask(&self) -> &GrayImage {
        &self.mask
    }

    /// 1-pixel-wide crack centerlines.
    #[must_use]
    pub fn skeleton(&self) -> &GrayImage {
        &self.skeleton
    }

    /// Source image width.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.mask.width()
    }

    /// Source image height.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.mask.height()
    }

    /// Wall-clock time spent inside the model.
    #[must_use]
    pub fn inference_time(&self) -> Duration {
        self.inference_time
    }

    /// Crack measurements.
    #[must_use]
    pub fn metrics(&self) -> &CrackMetrics {
        &self.metrics
    }
}

/// Crack segmentation pipeline around a [`SegmentationModel`].
///
/// Every [`Pipeline::segment`] call draws substitution noise from a fresh
/// RNG, seeded from [`Config::seed`] when set, so repeated calls on the same
/// image see the same tensor.
pub struct Pipeline<M = OnnxSegmenter> {
    config: Config,
    model: M,
}

impl Pipeline<OnnxSegmenter> {
    /// Create a pipeline backed by the ONNX model from the configuration.
    ///
    /// This will download the model if it is missing and a URL is configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingModel`] if no model is available, or an error
    /// if it cannot be loaded.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        tracing::info!("Initializing pipeline with config: {config:?}");

        let cache = ModelCache::new(config.model_path.clone(), config.model_url.clone())?;

        tracing::info!("Loading segmentation model from {}", cache.model_path().display());
        let model = cache.load()?;

        Self::with_model(config, model)
    }
}

impl<M: SegmentationModel> Pipeline<M> {
    /// Create a pipeline around an already constructed model.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_model(config: Config, model: M) -> Result<Self> {
        config.validate()?;

        Ok(Self { config, model })
    }

    /// Pipeline configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Segment one image.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DegenerateInput`] for empty images,
    /// [`Error::MissingModel`] unchanged from the model, and
    /// [`Error::Inference`] or [`Error::ShapeMismatch`] if the model fails or
    /// returns logits of the wrong shape.
    pub fn segment(&mut self, image: &RgbImage) -> Result<SegmentationResult> {
        let mut rng = self
            .config
            .seed
            .map_or_else(StdRng::from_os_rng, StdRng::seed_from_u64);
        let prepared = prepare_tensor(image, &mut rng)?;
        let (height, width) = (prepared.height(), prepared.width());

        tracing::info!("Running inference on {height}x{width} tensor...");
        let started = Instant::now();
        let logits = self.model.infer(&prepared.tensor).map_err(|err| match err {
            Error::MissingModel { .. } | Error::Inference { .. } => err,
            other => Error::inference("model call", other),
        })?;
        let inference_time = started.elapsed();
        tracing::info!("Inference finished in {inference_time:?}");

        if logits.len_of(Axis(1)) != height || logits.len_of(Axis(2)) != width {
            return Err(Error::ShapeMismatch {
                expected: format!("logits of {height}x{width}"),
                actual: format!("{:?}", logits.shape()),
            });
        }

        let decoded = decode_logits(&logits, prepared.original_height, prepared.original_width)?;
        let (skeleton, stats) = thin_with_stats(&decoded.mask);
        let metrics = CrackMetrics::measure(&decoded.mask, &skeleton);

        tracing::debug!("Thinning: {stats:?}, metrics: {metrics:?}");

        let invert = self.config.invert_output;
        Ok(SegmentationResult::new(
            render_probability(&decoded.probability, invert),
            render_binary(&decoded.mask, invert),
            render_binary(&skeleton, invert),
            inference_time,
            metrics,
        ))
    }

    /// Segment an image file and save the rasters into `output_dir`.
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the input image
    /// * `output_dir` - Directory receiving the three PNG rasters
    ///
    /// # Errors
    ///
    /// Returns an error if loading, segmentation or saving fails.
    pub fn process<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input_path: P,
        output_dir: Q,
    ) -> Result<SegmentationResult> {
        let (result, saved) = self.process_and_save(input_path, output_dir)?;
        tracing::info!("Saved {}", saved.skeleton.display());
        Ok(result)
    }

    /// Like [`Pipeline::process`], also returning the written paths.
    ///
    /// # Errors
    ///
    /// Returns an error if loading, segmentation or saving fails.
    pub fn process_and_save<P: AsRef<Path>, Q: AsRef<Path>>(
        &mut self,
        input_path: P,
        output_dir: Q,
    ) -> Result<(SegmentationResult, SavedRasters)> {
        let input_path = input_path.as_ref();

        tracing::info!("Processing image: {}", input_path.display());

        let rgb = load_image(input_path)?;
        let result = self.segment(&rgb)?;

        let stem = input_path
            .file_stem()
            .map_or_else(|| "image".to_string(), |s| s.to_string_lossy().into_owned());
        let saved = save_rasters(&result, output_dir, &stem)?;

        tracing::info!("Processing complete");
        Ok((result, saved))
    }
}

/// Run [`Pipeline::segment`] on a worker thread.
///
/// The pipeline moves to the worker and comes back with the result, so a
/// caller on an interactive thread only has to join the handle.
pub fn spawn_segment<M>(
    mut pipeline: Pipeline<M>,
    image: RgbImage,
) -> JoinHandle<(Pipeline<M>, Result<SegmentationResult>)>
where
    M: SegmentationModel + Send + 'static,
{
    thread::spawn(move || {
        let result = pipeline.segment(&image);
        (pipeline, result)
    })
}
