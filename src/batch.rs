//! Directory builds.
//!
//! Runs the loader over every image below a source directory, writing
//! artifacts into an output directory and a `manifest.json` mapping each
//! source path to its descriptor.
//!
//! Assets are independent invocations: they run in parallel on the rayon
//! pool and a failing asset is reported and skipped without affecting the
//! others.

use crate::config::LoaderConfig;
use crate::descriptor::ImageDescriptor;
use crate::imaging::ImageCodec;
use crate::loader::{LoaderError, LoaderInput, load};
use crate::pipeline::{FsPipeline, PipelineError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

pub const MANIFEST_FILENAME: &str = "manifest.json";

/// File extensions picked up by a directory build (compared lowercase).
pub const ASSET_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "svg"];

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct BuiltAsset {
    /// Source path relative to the source directory.
    pub source: String,
    pub descriptor: ImageDescriptor,
    /// Artifact names written for this asset, in emission order.
    pub artifacts: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SkippedAsset {
    pub source: String,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct BatchReport {
    pub assets: Vec<BuiltAsset>,
    pub skipped: Vec<SkippedAsset>,
}

impl BatchReport {
    pub fn artifact_count(&self) -> usize {
        self.assets.iter().map(|a| a.artifacts.len()).sum()
    }
}

fn is_asset(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| ASSET_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
}

/// Image files below `source_dir`, in a stable order.
pub fn find_assets(source_dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let mut assets = Vec::new();
    for entry in WalkDir::new(source_dir).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && is_asset(entry.path()) {
            assets.push(entry.into_path());
        }
    }
    Ok(assets)
}

fn relative_source(path: &Path, source_dir: &Path) -> String {
    path.strip_prefix(source_dir)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

fn build_one(
    codec: &impl ImageCodec,
    path: &Path,
    source_dir: &Path,
    output_dir: &Path,
    config: &LoaderConfig,
) -> Result<BuiltAsset, LoaderError> {
    let bytes = fs::read(path).map_err(|source| PipelineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let host = FsPipeline::new(path, source_dir, output_dir);
    let descriptor = load(codec, &host, &LoaderInput::Raw(bytes), config)?;
    Ok(BuiltAsset {
        source: relative_source(path, source_dir),
        descriptor,
        artifacts: host.written(),
    })
}

/// Build every asset below `source_dir` into `output_dir`.
///
/// Per-asset failures end up in [`BatchReport::skipped`]. Only failures to
/// walk the source or write the manifest are returned as errors.
pub fn build_dir(
    codec: &impl ImageCodec,
    source_dir: &Path,
    output_dir: &Path,
    config: &LoaderConfig,
) -> Result<BatchReport, BatchError> {
    let paths = find_assets(source_dir)?;
    fs::create_dir_all(output_dir)?;
    log::info!("building {} assets from {}", paths.len(), source_dir.display());

    let results: Vec<_> = paths
        .par_iter()
        .map(|path| (path, build_one(codec, path, source_dir, output_dir, config)))
        .collect();

    let mut report = BatchReport::default();
    for (path, result) in results {
        match result {
            Ok(asset) => report.assets.push(asset),
            Err(e) => {
                let source = relative_source(path, source_dir);
                log::warn!("skipping {}: {}", source, e);
                report.skipped.push(SkippedAsset {
                    source,
                    error: e.to_string(),
                });
            }
        }
    }

    write_manifest(&report, output_dir)?;
    Ok(report)
}

/// Write `manifest.json`: source path → descriptor.
fn write_manifest(report: &BatchReport, output_dir: &Path) -> Result<(), BatchError> {
    let manifest: BTreeMap<&str, &ImageDescriptor> = report
        .assets
        .iter()
        .map(|a| (a.source.as_str(), &a.descriptor))
        .collect();
    let json = serde_json::to_string_pretty(&manifest)?;
    fs::write(output_dir.join(MANIFEST_FILENAME), json)?;
    Ok(())
}
