//! Model location, optional download, and loading.

use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};

use crate::error::{Error, Result};

use super::OnnxSegmenter;

/// File name of the segmentation model inside the cache directory.
pub const DEFAULT_MODEL_FILENAME: &str = "crack_segmentation.onnx";

/// Locates the segmentation model and provisions it on request.
pub struct ModelCache {
    model_path: PathBuf,
    download_url: Option<String>,
}

impl ModelCache {
    /// Create a model cache.
    ///
    /// With no explicit `model_path` the model lives in the platform cache
    /// directory:
    /// - Windows: `%LOCALAPPDATA%\crackseg\models`
    /// - Linux: `~/.cache/crackseg/models`
    /// - macOS: `~/Library/Caches/crackseg/models`
    ///
    /// # Errors
    ///
    /// Returns an error if the default cache directory cannot be created.
    pub fn new(model_path: Option<PathBuf>, download_url: Option<String>) -> Result<Self> {
        let model_path = match model_path {
            Some(path) => path,
            None => {
                let base = dirs::cache_dir().unwrap_or_else(|| PathBuf::from("."));
                let cache_dir = base.join("crackseg").join("models");

                fs::create_dir_all(&cache_dir).map_err(|source| Error::CacheDir {
                    path: cache_dir.clone(),
                    source,
                })?;

                cache_dir.join(DEFAULT_MODEL_FILENAME)
            }
        };

        Ok(Self {
            model_path,
            download_url,
        })
    }

    /// Path the model is expected at.
    #[must_use]
    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    /// Get the path to the model file, downloading it if a URL is configured.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingModel`] if the file is absent and no download
    /// URL is configured, or a download error.
    pub fn resolve(&self) -> Result<&Path> {
        if self.model_path.is_file() {
            return Ok(&self.model_path);
        }

        let Some(url) = self.download_url.as_deref() else {
            return Err(Error::MissingModel {
                path: self.model_path.clone(),
            });
        };

        if let Some(parent) = self.model_path.parent() {
            fs::create_dir_all(parent).map_err(|source| Error::CacheDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        download_file(url, &self.model_path)?;

        Ok(&self.model_path)
    }

    /// Resolve and load the model into an ONNX Runtime session.
    ///
    /// # Errors
    ///
    /// Returns an error if the model is missing or cannot be loaded.
    pub fn load(&self) -> Result<OnnxSegmenter> {
        let path = self.resolve()?;
        OnnxSegmenter::from_file(path)
    }
}

/// Download a file from a URL to a path with progress indication.
fn download_file(url: &str, path: &Path) -> Result<()> {
    let name = path
        .file_name()
        .map_or_else(|| DEFAULT_MODEL_FILENAME.to_string(), |n| n.to_string_lossy().into_owned());

    tracing::info!("Downloading {name} from {url}");

    let download_err = |source| Error::ModelDownload {
        name: name.clone(),
        source,
    };

    let client = reqwest::blocking::Client::new();
    let response = client
        .get(url)
        .send()
        .and_then(reqwest::blocking::Response::error_for_status)
        .map_err(download_err)?;

    let pb = match response.content_length() {
        Some(total) => ProgressBar::new(total),
        None => ProgressBar::new_spinner(),
    };
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
    {
        pb.set_style(style.progress_chars("#>-"));
    }
    pb.set_message(format!("Downloading {name}"));

    match write_atomically(response, path, &pb) {
        Ok(()) => {
            pb.finish_with_message(format!("Downloaded {name}"));
            Ok(())
        }
        Err(err) => {
            pb.abandon_with_message(format!("Failed to download {name}"));
            Err(err)
        }
    }
}

/// Stream `reader` into `<path>.tmp`, then rename it onto `path`.
///
/// The temporary file is removed if any step fails.
fn write_atomically<R: Read>(reader: R, path: &Path, pb: &ProgressBar) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let written = fs::File::create(&temp_path)
        .map_err(Error::from)
        .and_then(|file| copy_with_progress(reader, file, pb))
        .and_then(|()| fs::rename(&temp_path, path).map_err(Error::from));

    if written.is_err() {
        let _ = fs::remove_file(&temp_path);
    }
    written
}

fn copy_with_progress<R: Read>(mut reader: R, mut file: fs::File, pb: &ProgressBar) -> Result<()> {
    let mut downloaded = 0u64;
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        file.write_all(&buffer[..bytes_read])?;
        downloaded += bytes_read as u64;
        pb.set_position(downloaded);
    }
    file.sync_all()?;

    Ok(())
}
