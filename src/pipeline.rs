//! Host pipeline capability.
//!
//! The loader never decides where files go. It asks a [`PipelineContext`]
//! to turn a name template into a concrete output name, and to register the
//! bytes of each produced variant as a build artifact under that name.
//!
//! Two hosts are provided:
//!
//! - [`FsPipeline`] writes artifacts below an output directory (used by the CLI).
//! - [`MemoryPipeline`] keeps them in memory (dry runs and tests).
//!
//! Both resolve names through [`naming::interpolate_name`](crate::naming::interpolate_name)
//! against the path of the asset being loaded.

use crate::naming::{NameSource, NamingError, interpolate_name};
use regex::Regex;
use std::collections::BTreeMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Name resolution failed: {0}")]
    Naming(#[from] NamingError),
    #[error("IO error writing {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Invalid artifact name: {0}")]
    InvalidArtifactName(String),
}

/// Inputs to one name resolution.
#[derive(Debug, Clone, Copy)]
pub struct NameRequest<'a> {
    pub template: &'a str,
    /// Bytes the name may be derived from (content hashes).
    pub content: &'a [u8],
    /// Base path for `[path]`; the host root when `None`.
    pub context: Option<&'a Path>,
    /// Pattern for `[N]` capture tokens.
    pub reg_exp: Option<&'a Regex>,
}

/// The capabilities a host build pipeline gives the loader.
///
/// Implementations must be `Sync`: names are resolved concurrently from
/// the re-encode workers of one invocation.
pub trait PipelineContext: Sync {
    /// Turn a template into a concrete output name.
    fn resolve_name(&self, request: &NameRequest<'_>) -> Result<String, PipelineError>;

    /// Register `bytes` as a build artifact served at `name`.
    fn register_artifact(&self, name: &str, bytes: &[u8]) -> Result<(), PipelineError>;
}

/// Resolve a request for `resource`, defaulting the context to `root`.
fn resolve_for(
    resource: &Path,
    root: &Path,
    request: &NameRequest<'_>,
) -> Result<String, PipelineError> {
    let source = NameSource {
        resource,
        context: request.context.unwrap_or(root),
        content: request.content,
        pattern: request.reg_exp,
    };
    Ok(interpolate_name(request.template, &source)?)
}

/// Reject names that would land outside the output directory.
fn check_artifact_name(name: &str) -> Result<(), PipelineError> {
    let path = Path::new(name);
    let escapes = name.is_empty()
        || path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(PipelineError::InvalidArtifactName(name.to_string()));
    }
    Ok(())
}

/// Filesystem host: artifacts are written to `output_dir/<name>`.
#[derive(Debug)]
pub struct FsPipeline {
    resource: PathBuf,
    root: PathBuf,
    output_dir: PathBuf,
    written: Mutex<Vec<String>>,
}

impl FsPipeline {
    pub fn new(resource: &Path, root: &Path, output_dir: &Path) -> Self {
        Self {
            resource: resource.to_path_buf(),
            root: root.to_path_buf(),
            output_dir: output_dir.to_path_buf(),
            written: Mutex::new(Vec::new()),
        }
    }

    /// Names written so far, in registration order.
    pub fn written(&self) -> Vec<String> {
        self.written
            .lock()
            .map(|w| w.clone())
            .unwrap_or_default()
    }
}

impl PipelineContext for FsPipeline {
    fn resolve_name(&self, request: &NameRequest<'_>) -> Result<String, PipelineError> {
        resolve_for(&self.resource, &self.root, request)
    }

    fn register_artifact(&self, name: &str, bytes: &[u8]) -> Result<(), PipelineError> {
        check_artifact_name(name)?;
        let path = self.output_dir.join(name);
        let io_err = |source| PipelineError::Io {
            path: path.clone(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        std::fs::write(&path, bytes).map_err(io_err)?;
        log::debug!("wrote {} ({} bytes)", path.display(), bytes.len());
        if let Ok(mut written) = self.written.lock() {
            written.push(name.to_string());
        }
        Ok(())
    }
}

/// In-memory host. Registering the same name twice keeps the last bytes.
#[derive(Debug, Default)]
pub struct MemoryPipeline {
    resource: PathBuf,
    root: PathBuf,
    artifacts: Mutex<BTreeMap<String, Vec<u8>>>,
    registrations: Mutex<Vec<String>>,
    resolutions: Mutex<Vec<String>>,
}

impl MemoryPipeline {
    pub fn new(resource: &Path, root: &Path) -> Self {
        Self {
            resource: resource.to_path_buf(),
            root: root.to_path_buf(),
            ..Self::default()
        }
    }

    /// Distinct artifact names, sorted.
    pub fn artifact_names(&self) -> Vec<String> {
        self.artifacts
            .lock()
            .map(|a| a.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn artifact(&self, name: &str) -> Option<Vec<u8>> {
        self.artifacts.lock().ok()?.get(name).cloned()
    }

    /// Every `register_artifact` call, in order, including repeats.
    pub fn registrations(&self) -> Vec<String> {
        self.registrations
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Every name handed out by `resolve_name`, in call order.
    pub fn resolutions(&self) -> Vec<String> {
        self.resolutions
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

impl PipelineContext for MemoryPipeline {
    fn resolve_name(&self, request: &NameRequest<'_>) -> Result<String, PipelineError> {
        let name = resolve_for(&self.resource, &self.root, request)?;
        if let Ok(mut resolutions) = self.resolutions.lock() {
            resolutions.push(name.clone());
        }
        Ok(name)
    }

    fn register_artifact(&self, name: &str, bytes: &[u8]) -> Result<(), PipelineError> {
        check_artifact_name(name)?;
        if let Ok(mut registrations) = self.registrations.lock() {
            registrations.push(name.to_string());
        }
        if let Ok(mut artifacts) = self.artifacts.lock() {
            artifacts.insert(name.to_string(), bytes.to_vec());
        }
        Ok(())
    }
}
