use clap::{Parser, Subcommand, ValueEnum};
use responsive_loader::config::{self, CONFIG_FILENAME, ToolConfig};
use responsive_loader::imaging::RustCodec;
use responsive_loader::loader::{LoaderInput, load};
use responsive_loader::pipeline::{FsPipeline, MemoryPipeline};
use responsive_loader::{batch, output};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "responsive-loader")]
#[command(about = "Responsive image variants and descriptors for asset pipelines")]
#[command(long_about = "\
Responsive image variants and descriptors for asset pipelines

Every raster image is re-encoded into each configured format at each
configured width (never wider than the source, and always at the source
width), plus a 20px PNG placeholder embedded inline. SVG and unrecognized
files pass through unchanged.

Output names come from a template: name_prefix + \".<width>.<ext>\".

  dawn.jpg (1280x720), widths [640], formats [jpeg, webp]
  ├── dawn.640.jpg
  ├── dawn.1280.jpg     ← src (jpeg at source width)
  ├── dawn.640.webp
  └── dawn.1280.webp

Settings are read from responsive-loader.toml in the working directory;
flags override it. Run 'responsive-loader gen-config' for a documented file.")]
#[command(version)]
struct Cli {
    /// Config file
    #[arg(long, default_value = CONFIG_FILENAME, global = true)]
    config: PathBuf,

    #[command(flatten)]
    overrides: Overrides,

    #[command(subcommand)]
    command: Command,
}

/// Flags layered over the config file.
#[derive(clap::Args, Clone)]
struct Overrides {
    /// Candidate widths, comma separated
    #[arg(long, value_delimiter = ',', global = true)]
    widths: Option<Vec<u32>>,

    /// Target formats (jpeg, webp, png), comma separated
    #[arg(long, value_delimiter = ',', global = true)]
    formats: Option<Vec<String>>,

    /// Output name template prefix
    #[arg(long, global = true)]
    name_prefix: Option<String>,

    /// Compute names without writing artifacts
    #[arg(long, global = true)]
    no_emit: bool,

    /// Base directory for [path] in name templates
    #[arg(long, global = true)]
    context: Option<PathBuf>,

    /// Pattern whose captures fill [1], [2], ... in name templates
    #[arg(long, global = true)]
    reg_exp: Option<String>,

    /// Maximum parallel encode workers
    #[arg(long, global = true)]
    jobs: Option<usize>,
}

#[derive(ValueEnum, Clone, Copy)]
enum Emit {
    /// Structured JSON descriptor
    Json,
    /// CommonJS module whose toString() is the URL
    Module,
}

#[derive(Subcommand)]
enum Command {
    /// Load one image and print its descriptor
    Load {
        /// Image file
        file: PathBuf,

        /// Build root; [path] is relative to it unless --context is set
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Artifact output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,

        /// Descriptor serialization
        #[arg(long, value_enum, default_value_t = Emit::Json)]
        emit: Emit,

        /// Keep artifacts in memory and list them instead of writing
        #[arg(long)]
        dry_run: bool,
    },
    /// Load every image below a directory and write a manifest
    Build {
        /// Source directory
        #[arg(long, default_value = "src")]
        source: PathBuf,

        /// Artifact output directory
        #[arg(long, default_value = "dist")]
        output: PathBuf,
    },
    /// Print a stock responsive-loader.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    if let Command::GenConfig = cli.command {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let mut tool_config = resolve_tool_config(&cli.config, &cli.overrides)?;
    if let Some(context) = tool_config.loader.context.as_mut() {
        *context = std::path::absolute(&*context)?;
    }
    init_thread_pool(&tool_config.processing);
    let codec = RustCodec::new();

    match cli.command {
        Command::Load {
            file,
            root,
            output: output_dir,
            emit,
            dry_run,
        } => {
            let file = std::path::absolute(&file)?;
            let root = std::path::absolute(&root)?;
            let input = LoaderInput::Raw(std::fs::read(&file)?);

            let descriptor = if dry_run {
                let host = MemoryPipeline::new(&file, &root);
                let descriptor = load(&codec, &host, &input, &tool_config.loader)?;
                let artifacts: Vec<(String, usize)> = host
                    .artifact_names()
                    .into_iter()
                    .map(|name| {
                        let size = host.artifact(&name).map_or(0, |b| b.len());
                        (name, size)
                    })
                    .collect();
                output::print_artifacts(&artifacts);
                descriptor
            } else {
                let host = FsPipeline::new(&file, &root, &output_dir);
                load(&codec, &host, &input, &tool_config.loader)?
            };

            match emit {
                Emit::Json => println!("{}", descriptor.to_json()?),
                Emit::Module => print!(
                    "{}",
                    descriptor.to_module_source(&tool_config.module.public_path)
                ),
            }
        }
        Command::Build {
            source,
            output: output_dir,
        } => {
            let source = std::path::absolute(&source)?;
            let report = batch::build_dir(&codec, &source, &output_dir, &tool_config.loader)?;
            output::print_build_report(&report);
            if !report.skipped.is_empty() {
                return Err(format!("{} asset(s) failed", report.skipped.len()).into());
            }
        }
        Command::GenConfig => {}
    }

    Ok(())
}

/// Stock defaults, then the config file, then command-line flags.
fn resolve_tool_config(
    path: &Path,
    overrides: &Overrides,
) -> Result<ToolConfig, config::ConfigError> {
    let file = config::load_raw_config(path)?;
    if file.is_some() {
        log::debug!("using config {}", path.display());
    }
    config::resolve_config(
        config::stock_defaults_value(),
        file.into_iter().chain([overrides_value(overrides)]),
    )
}

fn overrides_value(overrides: &Overrides) -> toml::Value {
    let mut loader = toml::Table::new();
    if let Some(widths) = &overrides.widths {
        let widths = widths.iter().map(|&w| toml::Value::Integer(i64::from(w)));
        loader.insert("widths".into(), toml::Value::Array(widths.collect()));
    }
    if let Some(formats) = &overrides.formats {
        let formats = formats.iter().map(|f| toml::Value::String(f.to_lowercase()));
        loader.insert("target_formats".into(), toml::Value::Array(formats.collect()));
    }
    if let Some(prefix) = &overrides.name_prefix {
        loader.insert("name_prefix".into(), toml::Value::String(prefix.clone()));
    }
    if overrides.no_emit {
        loader.insert("emit_file".into(), toml::Value::Boolean(false));
    }
    if let Some(context) = &overrides.context {
        loader.insert(
            "context".into(),
            toml::Value::String(context.to_string_lossy().into_owned()),
        );
    }
    if let Some(reg_exp) = &overrides.reg_exp {
        loader.insert("reg_exp".into(), toml::Value::String(reg_exp.clone()));
    }

    let mut root = toml::Table::new();
    root.insert("loader".into(), toml::Value::Table(loader));
    if let Some(jobs) = overrides.jobs {
        let mut processing = toml::Table::new();
        processing.insert(
            "max_processes".into(),
            toml::Value::Integer(i64::try_from(jobs).unwrap_or(i64::MAX)),
        );
        root.insert("processing".into(), toml::Value::Table(processing));
    }
    toml::Value::Table(root)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Capped at the number of available CPU cores.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
