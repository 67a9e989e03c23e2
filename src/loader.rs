//! Variant planning and orchestration for one asset.
//!
//! A single invocation takes the raw bytes of one image and a [`LoaderConfig`]
//! and yields an [`ImageDescriptor`]:
//!
//! ```text
//! bytes ─▶ inspect ─┬─ svg / unknown ─▶ one name, raw bytes emitted ─▶ descriptor
//!                   │
//!                   └─ raster ─▶ plan (format × width) + placeholder
//!                                 │  (rayon: reencode + resolve name per job)
//!                                 ▼
//!                               join ─▶ emit variants in matrix order ─▶ descriptor
//! ```
//!
//! Every job must finish before anything is emitted, so a failing job leaves
//! no artifacts from that invocation behind. The first error wins.
//!
//! [`load`] blocks until the descriptor is ready. [`spawn_load`] checks the
//! input and configuration up front, then finishes on the rayon pool and
//! reports through a channel.

use crate::config::{ConfigError, LoaderConfig};
use crate::descriptor::{ImageDescriptor, ResponsiveImage};
use crate::imaging::{
    CodecError, EncodeJob, ImageCodec, SourceMetadata, default_format, plan_jobs,
};
use crate::pipeline::{NameRequest, PipelineContext, PipelineError};
use base64::{Engine as _, engine::general_purpose};
use rayon::prelude::*;
use regex::Regex;
use std::path::Path;
use std::sync::Arc;
use std::sync::mpsc::Sender;
use thiserror::Error;

/// Prefix of the inline placeholder URI.
pub const PLACEHOLDER_URI_PREFIX: &str = "data:image/png;base64,";

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("Usage error: {0}")]
    Usage(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

/// What the host hands the loader.
#[derive(Debug, Clone)]
pub enum LoaderInput {
    /// Raw file bytes.
    Raw(Vec<u8>),
    /// Text that was decoded before reaching the loader. Always rejected.
    Text(String),
}

impl LoaderInput {
    fn raw_bytes(&self) -> Result<&[u8], LoaderError> {
        match self {
            LoaderInput::Raw(bytes) => Ok(bytes),
            LoaderInput::Text(_) => Err(LoaderError::Usage(
                "image input must be raw bytes, not text".to_string(),
            )),
        }
    }
}

impl From<Vec<u8>> for LoaderInput {
    fn from(bytes: Vec<u8>) -> Self {
        LoaderInput::Raw(bytes)
    }
}

/// Builds output names as `<name_prefix>.<suffix>`.
struct Namer<'a, P> {
    ctx: &'a P,
    prefix: &'a str,
    context: Option<&'a Path>,
    reg_exp: Option<&'a Regex>,
}

impl<P: PipelineContext> Namer<'_, P> {
    fn resolve(&self, suffix: &str, content: &[u8]) -> Result<String, PipelineError> {
        let template = format!("{}.{}", self.prefix, suffix);
        self.ctx.resolve_name(&NameRequest {
            template: &template,
            content,
            context: self.context,
            reg_exp: self.reg_exp,
        })
    }
}

/// A finished job before emission.
struct Encoded {
    job: EncodeJob,
    bytes: Vec<u8>,
    name: String,
}

/// Load one asset and block until its descriptor is ready.
pub fn load(
    codec: &impl ImageCodec,
    ctx: &impl PipelineContext,
    input: &LoaderInput,
    config: &LoaderConfig,
) -> Result<ImageDescriptor, LoaderError> {
    let bytes = input.raw_bytes()?;
    config.validate()?;
    let pattern = config.pattern()?;

    let metadata = codec.inspect(bytes)?;
    let namer = Namer {
        ctx,
        prefix: &config.name_prefix,
        context: config.context.as_deref(),
        reg_exp: pattern.as_ref(),
    };

    if metadata.is_raster() {
        load_raster(codec, &namer, bytes, &metadata, config)
    } else {
        load_passthrough(&namer, bytes, &metadata, config.emit_file)
    }
}

/// Start loading one asset; the result arrives on `done`.
///
/// Text input and invalid configuration are reported here, before any work
/// is scheduled. Once this returns `Ok`, exactly one result is sent.
pub fn spawn_load<C, P>(
    codec: Arc<C>,
    ctx: Arc<P>,
    input: LoaderInput,
    config: LoaderConfig,
    done: Sender<Result<ImageDescriptor, LoaderError>>,
) -> Result<(), LoaderError>
where
    C: ImageCodec + Send + 'static,
    P: PipelineContext + Send + 'static,
{
    input.raw_bytes()?;
    config.validate()?;
    config.pattern()?;

    rayon::spawn(move || {
        let result = load(codec.as_ref(), ctx.as_ref(), &input, &config);
        // A dropped receiver means nobody is waiting for the result.
        let _ = done.send(result);
    });
    Ok(())
}

fn load_passthrough<P: PipelineContext>(
    namer: &Namer<'_, P>,
    bytes: &[u8],
    metadata: &SourceMetadata,
    emit_file: bool,
) -> Result<ImageDescriptor, LoaderError> {
    let name = namer.resolve("[ext]", bytes)?;
    if emit_file {
        namer.ctx.register_artifact(&name, bytes)?;
    }
    log::debug!("passed through {} as {}", name, metadata.passthrough_type());

    Ok(ImageDescriptor {
        src: name,
        width: metadata.width.map_or(-1, i64::from),
        height: metadata.height.map_or(-1, i64::from),
        image_type: metadata.passthrough_type().to_string(),
        placeholder: None,
        responsive_images: None,
    })
}

fn load_raster<P: PipelineContext>(
    codec: &impl ImageCodec,
    namer: &Namer<'_, P>,
    bytes: &[u8],
    metadata: &SourceMetadata,
    config: &LoaderConfig,
) -> Result<ImageDescriptor, LoaderError> {
    let (Some(width), Some(height)) = (metadata.width, metadata.height) else {
        return Err(CodecError::Decode("raster source reported no dimensions".into()).into());
    };

    let jobs = plan_jobs(&config.target_formats, &config.widths, width);
    log::debug!("{}x{} source: {} encode jobs", width, height, jobs.len());

    let encoded = jobs
        .par_iter()
        .map(|job| -> Result<Encoded, LoaderError> {
            let out = codec.reencode(bytes, &job.params())?;
            let name = namer.resolve(&job.name_suffix(), &out)?;
            Ok(Encoded {
                job: *job,
                bytes: out,
                name,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let mut src = String::new();
    let mut placeholder = None;
    let mut responsive_images = Vec::with_capacity(encoded.len());

    for Encoded { job, bytes, name } in encoded {
        match job {
            EncodeJob::Variant { spec, is_default } => {
                if config.emit_file {
                    namer.ctx.register_artifact(&name, &bytes)?;
                }
                if is_default {
                    src.clone_from(&name);
                }
                responsive_images.push(ResponsiveImage {
                    src: name,
                    width: spec.width,
                    mime_type: spec.format.mime_type().to_string(),
                });
            }
            EncodeJob::Placeholder => {
                placeholder = Some(format!(
                    "{}{}",
                    PLACEHOLDER_URI_PREFIX,
                    general_purpose::STANDARD.encode(&bytes)
                ));
            }
        }
    }

    if src.is_empty() {
        log::debug!("no jpeg variant at source width; src left empty");
    }
    log::info!(
        "{} variants ({}x{}){}",
        responsive_images.len(),
        width,
        height,
        if config.emit_file { "" } else { ", not emitted" }
    );

    Ok(ImageDescriptor {
        src,
        width: i64::from(width),
        height: i64::from(height),
        image_type: default_format(&config.target_formats)
            .map_or("", |f| f.tag())
            .to_string(),
        placeholder,
        responsive_images: Some(responsive_images),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockCodec, RecordedOp, mock_bytes};
    use crate::imaging::{DetectedFormat, TargetFormat};
    use crate::naming::content_hash;
    use crate::pipeline::MemoryPipeline;
    use std::sync::mpsc;
    use TargetFormat::{Jpeg, Png, Webp};

    fn host() -> MemoryPipeline {
        MemoryPipeline::new(Path::new("/site/img/dawn.jpg"), Path::new("/site"))
    }

    fn input() -> LoaderInput {
        LoaderInput::Raw(b"source-bytes".to_vec())
    }

    fn config(formats: &[TargetFormat], widths: &[u32]) -> LoaderConfig {
        LoaderConfig {
            target_formats: formats.to_vec(),
            widths: widths.to_vec(),
            ..LoaderConfig::default()
        }
    }

    fn responsive(descriptor: &ImageDescriptor) -> Vec<(String, u32, String)> {
        descriptor
            .responsive_images
            .as_ref()
            .unwrap()
            .iter()
            .map(|r| (r.src.clone(), r.width, r.mime_type.clone()))
            .collect()
    }

    fn entry(src: &str, width: u32, mime: &str) -> (String, u32, String) {
        (src.to_string(), width, mime.to_string())
    }

    // =========================================================================
    // Raster path
    // =========================================================================

    #[test]
    fn full_matrix_for_1280x720_jpeg() {
        let codec = MockCodec::jpeg(1280, 720);
        let ctx = host();

        let descriptor = load(&codec, &ctx, &input(), &config(&[Jpeg, Webp], &[640, 1280])).unwrap();

        assert_eq!(descriptor.src, "dawn.1280.jpg");
        assert_eq!(descriptor.width, 1280);
        assert_eq!(descriptor.height, 720);
        assert_eq!(descriptor.image_type, "jpeg");
        assert_eq!(
            responsive(&descriptor),
            vec![
                entry("dawn.640.jpg", 640, "image/jpeg"),
                entry("dawn.1280.jpg", 1280, "image/jpeg"),
                entry("dawn.640.webp", 640, "image/webp"),
                entry("dawn.1280.webp", 1280, "image/webp"),
            ]
        );

        // Four distinct artifacts; the default is not registered twice.
        assert_eq!(
            ctx.registrations(),
            vec!["dawn.640.jpg", "dawn.1280.jpg", "dawn.640.webp", "dawn.1280.webp"]
        );
        assert_eq!(ctx.artifact_names().len(), 4);
        assert_eq!(ctx.artifact("dawn.640.webp").unwrap(), mock_bytes(Webp, 640));

        // Four variants plus the placeholder, each named once.
        let mut resolved = ctx.resolutions();
        resolved.sort();
        assert_eq!(
            resolved,
            vec![
                "dawn.1280.jpg",
                "dawn.1280.webp",
                "dawn.640.jpg",
                "dawn.640.webp",
                "dawn.placeholder.png"
            ]
        );
    }

    #[test]
    fn every_job_is_reencoded_once() {
        let codec = MockCodec::jpeg(1280, 720);
        load(&codec, &host(), &input(), &config(&[Jpeg, Webp], &[640, 1280])).unwrap();

        let mut reencodes = codec.reencodes();
        reencodes.sort_by_key(|(f, w)| (f.tag(), *w));
        assert_eq!(
            reencodes,
            vec![
                (Jpeg, 640),
                (Jpeg, 1280),
                (Png, 20),
                (Webp, 640),
                (Webp, 1280)
            ]
        );
        // Inspection happens exactly once, first.
        assert_eq!(codec.get_operations()[0], RecordedOp::Inspect(12));
    }

    #[test]
    fn fixed_encode_quality() {
        let codec = MockCodec::jpeg(800, 600);
        load(&codec, &host(), &input(), &config(&[Jpeg, Webp, Png], &[])).unwrap();

        for op in codec.get_operations() {
            if let RecordedOp::Reencode {
                format, quality, ..
            } = op
            {
                match format {
                    Jpeg | Webp => assert_eq!(quality, Some(85)),
                    Png => assert_eq!(quality, None),
                }
            }
        }
    }

    #[test]
    fn narrow_source_uses_source_width_only() {
        let codec = MockCodec::jpeg(400, 300);
        let descriptor = load(&codec, &host(), &input(), &LoaderConfig::default()).unwrap();

        assert_eq!(descriptor.src, "dawn.400.jpg");
        assert_eq!(
            responsive(&descriptor),
            vec![
                entry("dawn.400.jpg", 400, "image/jpeg"),
                entry("dawn.400.webp", 400, "image/webp"),
            ]
        );
    }

    #[test]
    fn placeholder_is_inline_png_and_never_emitted() {
        let codec = MockCodec::jpeg(1280, 720);
        let ctx = host();
        let descriptor = load(&codec, &ctx, &input(), &LoaderConfig::default()).unwrap();

        let expected = format!(
            "data:image/png;base64,{}",
            general_purpose::STANDARD.encode(mock_bytes(Png, 20))
        );
        assert_eq!(descriptor.placeholder.as_deref(), Some(expected.as_str()));
        assert!(
            ctx.registrations()
                .iter()
                .all(|name| !name.contains("placeholder"))
        );
    }

    #[test]
    fn webp_only_has_no_default() {
        let codec = MockCodec::jpeg(1280, 720);
        let descriptor = load(&codec, &host(), &input(), &config(&[Webp], &[1280, 640])).unwrap();

        assert_eq!(descriptor.src, "");
        assert_eq!(descriptor.image_type, "webp");
        assert_eq!(
            responsive(&descriptor),
            vec![
                entry("dawn.640.webp", 640, "image/webp"),
                entry("dawn.1280.webp", 1280, "image/webp"),
            ]
        );
    }

    #[test]
    fn default_type_prefers_jpeg_over_order() {
        let codec = MockCodec::jpeg(640, 480);
        let descriptor = load(&codec, &host(), &input(), &config(&[Webp, Jpeg], &[])).unwrap();
        assert_eq!(descriptor.image_type, "jpeg");
        assert_eq!(descriptor.src, "dawn.640.jpg");
        // Matrix order still follows the configured format order.
        assert_eq!(responsive(&descriptor)[0].0, "dawn.640.webp");
    }

    #[test]
    fn emit_file_false_registers_nothing() {
        let codec = MockCodec::jpeg(3000, 2000);
        let ctx = host();
        let cfg = LoaderConfig {
            emit_file: false,
            ..config(&[Jpeg, Webp, Png], &[320, 640, 1280, 1920])
        };

        let descriptor = load(&codec, &ctx, &input(), &cfg).unwrap();

        assert!(ctx.registrations().is_empty());
        assert_eq!(descriptor.src, "dawn.3000.jpg");
        assert_eq!(descriptor.responsive_images.unwrap().len(), 15);
    }

    #[test]
    fn names_hash_the_variant_bytes() {
        let codec = MockCodec::jpeg(1280, 720);
        let cfg = LoaderConfig {
            name_prefix: "[name].[hash:8]".into(),
            ..config(&[Jpeg], &[640])
        };

        let descriptor = load(&codec, &host(), &input(), &cfg).unwrap();

        let hash = content_hash(&mock_bytes(Jpeg, 1280), "sha256", "hex", Some(8)).unwrap();
        assert_eq!(descriptor.src, format!("dawn.{}.1280.jpg", hash));
        let names: Vec<_> = responsive(&descriptor).into_iter().map(|r| r.0).collect();
        assert_ne!(names[0], names[1]);
    }

    #[test]
    fn context_and_pattern_reach_the_resolver() {
        let codec = MockCodec::jpeg(100, 100);
        let cfg = LoaderConfig {
            name_prefix: "[path][1]-[name]".into(),
            context: Some("/site".into()),
            reg_exp: Some(r"/(\w+)/[^/]+$".into()),
            ..config(&[Jpeg], &[])
        };
        let descriptor = load(&codec, &host(), &input(), &cfg).unwrap();
        assert_eq!(descriptor.src, "img/img-dawn.100.jpg");
    }

    // =========================================================================
    // Failures
    // =========================================================================

    #[test]
    fn failing_job_fails_invocation_without_emission() {
        let codec = MockCodec::jpeg(1280, 720).failing_on(Webp, 640);
        let ctx = host();

        let result = load(&codec, &ctx, &input(), &LoaderConfig::default());

        assert!(matches!(result, Err(LoaderError::Codec(CodecError::Encode { .. }))));
        assert!(ctx.registrations().is_empty());
    }

    #[test]
    fn failing_placeholder_fails_invocation() {
        let codec = MockCodec::jpeg(1280, 720).failing_on(Png, 20);
        let result = load(&codec, &host(), &input(), &LoaderConfig::default());
        assert!(matches!(result, Err(LoaderError::Codec(_))));
    }

    #[test]
    fn name_resolution_failure_is_pipeline_error() {
        let codec = MockCodec::jpeg(1280, 720);
        let cfg = LoaderConfig {
            name_prefix: "[md5:hash]".into(),
            ..LoaderConfig::default()
        };
        let result = load(&codec, &host(), &input(), &cfg);
        assert!(matches!(result, Err(LoaderError::Pipeline(PipelineError::Naming(_)))));
    }

    #[test]
    fn text_input_is_usage_error() {
        let codec = MockCodec::jpeg(1280, 720);
        let result = load(
            &codec,
            &host(),
            &LoaderInput::Text("<svg/>".into()),
            &LoaderConfig::default(),
        );
        assert!(matches!(result, Err(LoaderError::Usage(_))));
        assert!(codec.get_operations().is_empty());
    }

    #[test]
    fn invalid_config_fails_before_inspection() {
        let codec = MockCodec::jpeg(1280, 720);
        let cfg = LoaderConfig {
            reg_exp: Some("(".into()),
            ..LoaderConfig::default()
        };
        let result = load(&codec, &host(), &input(), &cfg);
        assert!(matches!(result, Err(LoaderError::Config(_))));
        assert!(codec.get_operations().is_empty());
    }

    #[test]
    fn raster_without_dimensions_is_codec_error() {
        let codec = MockCodec::with_metadata(SourceMetadata {
            width: None,
            height: None,
            format: DetectedFormat::Raster(image::ImageFormat::Png),
        });
        let result = load(&codec, &host(), &input(), &LoaderConfig::default());
        assert!(matches!(result, Err(LoaderError::Codec(CodecError::Decode(_)))));
    }

    // =========================================================================
    // Pass-through path
    // =========================================================================

    #[test]
    fn svg_passes_through_unchanged() {
        let codec = MockCodec::with_metadata(SourceMetadata {
            width: Some(120),
            height: Some(40),
            format: DetectedFormat::Svg,
        });
        let ctx = MemoryPipeline::new(Path::new("/site/logo.svg"), Path::new("/site"));
        let raw = b"<svg width=\"120\" height=\"40\"/>".to_vec();

        let descriptor = load(&codec, &ctx, &LoaderInput::Raw(raw.clone()), &LoaderConfig::default())
            .unwrap();

        assert_eq!(descriptor.src, "logo.svg");
        assert_eq!((descriptor.width, descriptor.height), (120, 40));
        assert_eq!(descriptor.image_type, "svg");
        assert!(descriptor.placeholder.is_none());
        assert!(descriptor.responsive_images.is_none());
        assert_eq!(ctx.registrations(), vec!["logo.svg"]);
        assert_eq!(ctx.artifact("logo.svg").unwrap(), raw);
        // One name resolved and nothing re-encoded.
        assert_eq!(ctx.resolutions(), vec!["logo.svg"]);
        assert!(codec.reencodes().is_empty());
    }

    #[test]
    fn unknown_format_uses_sentinels() {
        let codec = MockCodec::with_metadata(SourceMetadata::unknown());
        let ctx = MemoryPipeline::new(Path::new("/site/data.bin"), Path::new("/site"));
        let cfg = LoaderConfig {
            emit_file: false,
            ..LoaderConfig::default()
        };

        let descriptor = load(&codec, &ctx, &input(), &cfg).unwrap();

        assert_eq!(descriptor.src, "data.bin");
        assert_eq!((descriptor.width, descriptor.height), (-1, -1));
        assert_eq!(descriptor.image_type, "undefined");
        assert!(ctx.registrations().is_empty());
        assert_eq!(ctx.resolutions(), vec!["data.bin"]);
    }

    // =========================================================================
    // spawn_load
    // =========================================================================

    #[test]
    fn spawn_load_delivers_descriptor() {
        let codec = Arc::new(MockCodec::jpeg(1280, 720));
        let ctx = Arc::new(host());
        let (tx, rx) = mpsc::channel();

        spawn_load(
            codec.clone(),
            ctx.clone(),
            input(),
            LoaderConfig::default(),
            tx,
        )
        .unwrap();

        let descriptor = rx.recv().unwrap().unwrap();
        assert_eq!(descriptor.src, "dawn.1280.jpg");
        assert_eq!(ctx.registrations().len(), 4);
    }

    #[test]
    fn spawn_load_delivers_job_failure() {
        let codec = Arc::new(MockCodec::jpeg(1280, 720).failing_on(Jpeg, 640));
        let (tx, rx) = mpsc::channel();

        spawn_load(codec, Arc::new(host()), input(), LoaderConfig::default(), tx).unwrap();

        assert!(matches!(rx.recv().unwrap(), Err(LoaderError::Codec(_))));
    }

    #[test]
    fn spawn_load_rejects_text_synchronously() {
        let codec = Arc::new(MockCodec::jpeg(1280, 720));
        let (tx, rx) = mpsc::channel();

        let result = spawn_load(
            codec.clone(),
            Arc::new(host()),
            LoaderInput::Text("body".into()),
            LoaderConfig::default(),
            tx,
        );

        assert!(matches!(result, Err(LoaderError::Usage(_))));
        // Sender was dropped without sending.
        assert!(rx.recv().is_err());
        assert!(codec.get_operations().is_empty());
    }

    #[test]
    fn spawn_load_rejects_bad_config_synchronously() {
        let (tx, _rx) = mpsc::channel();
        let result = spawn_load(
            Arc::new(MockCodec::jpeg(10, 10)),
            Arc::new(host()),
            input(),
            config(&[], &[640]),
            tx,
        );
        assert!(matches!(result, Err(LoaderError::Config(_))));
    }
}
