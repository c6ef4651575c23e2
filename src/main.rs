use clap::{ArgAction, Parser, Subcommand};
use lighttable::output::{self, ClassifiedFile, SkippedFile};
use lighttable::{config, probe, render, resolver};
use lighttable::{AssetId, ImageAsset, OrientationStore, SizeBucket};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "lighttable")]
#[command(about = "Inspect responsive image delivery for a photo catalog")]
#[command(long_about = "\
Inspect responsive image delivery for a photo catalog

A catalog is a JSON array of image assets. Each asset carries a sparse
matrix of variant URLs: two formats (baseline JPEG, next-gen WebP) by four
size buckets (thumbnail, small, regular, original). Either shape is accepted:

  [{ \"id\": \"a1\", \"baseline\": { \"thumbnail\": \"t.jpg\" },
                   \"next_gen\": { \"regular\": \"r.webp\" } },
   { \"id\": \"a2\", \"thumbnailUrl\": \"t.jpg\", \"regularWebpUrl\": \"r.webp\" }]

Settings are read from config.toml in the --config directory. Run
'lighttable gen-config' to generate a documented config.toml.

Set RUST_LOG (e.g. RUST_LOG=lighttable=debug) to override -v.")]
#[command(version)]
struct Cli {
    /// Directory containing config.toml
    #[arg(long, default_value = ".", global = true)]
    config: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve the sources for every asset in a catalog
    Resolve {
        /// JSON catalog file
        #[arg(long)]
        catalog: PathBuf,
        /// Requested size bucket (defaults to resolver.bucket)
        #[arg(long)]
        size: Option<SizeBucket>,
        /// Print <picture> markup instead of a summary
        #[arg(long)]
        html: bool,
    },
    /// Probe image files and classify their orientation
    Classify {
        /// Files or directories to scan
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
    /// Validate config.toml in the --config directory
    CheckConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Resolve {
            catalog,
            size,
            html,
        } => {
            let config = config::load_config(&cli.config)?;
            let assets = read_catalog(&catalog)?;
            let bucket = size.unwrap_or(config.resolver.bucket);
            tracing::debug!(assets = assets.len(), %bucket, "Resolving catalog");

            let resolved: Vec<(AssetId, resolver::ResolvedSources)> = assets
                .iter()
                .map(|asset| {
                    let sources = resolver::resolve_with(asset, bucket, &config.resolver);
                    (asset.id.clone(), sources)
                })
                .collect();

            if html {
                for (id, sources) in &resolved {
                    let markup = render::render_picture(sources, id.as_str(), render::DEFAULT_SIZES);
                    println!("<!-- {} -->", id);
                    println!("{}", markup.into_string());
                }
            } else {
                output::print_resolved(&resolved);
            }
        }
        Command::Classify { paths } => {
            let config = config::load_config(&cli.config)?;
            let store = OrientationStore::from_config(&config.orientation);
            let files = collect_images(&paths);
            tracing::debug!(files = files.len(), "Probing images");

            let results: Vec<Result<ClassifiedFile, SkippedFile>> = files
                .par_iter()
                .map(|path| classify_file(&store, path))
                .collect();
            let (classified, skipped): (Vec<_>, Vec<_>) =
                results.into_iter().partition(Result::is_ok);
            let classified: Vec<ClassifiedFile> =
                classified.into_iter().filter_map(Result::ok).collect();
            let skipped: Vec<SkippedFile> = skipped.into_iter().filter_map(Result::err).collect();

            output::print_classified(&classified, &skipped);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
        Command::CheckConfig => {
            let path = cli.config.join("config.toml");
            config::load_config(&cli.config)?;
            if path.exists() {
                println!("==> {} is valid", path.display());
            } else {
                println!("==> No config.toml in {}, using defaults", cli.config.display());
            }
        }
    }

    Ok(())
}

/// Install the stderr subscriber. `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "lighttable=debug",
        _ => "lighttable=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_catalog(path: &Path) -> Result<Vec<ImageAsset>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// Expand directories into their supported image files, sorted by path.
fn collect_images(paths: &[PathBuf]) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = paths
        .iter()
        .flat_map(|root| {
            WalkDir::new(root)
                .follow_links(true)
                .into_iter()
                .filter_map(|entry| match entry {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        tracing::warn!(error = %e, "Skipping unreadable entry");
                        None
                    }
                })
                .filter(|entry| entry.file_type().is_file())
                .map(|entry| entry.into_path())
                .filter(|path| probe::is_supported(path))
        })
        .collect();
    files.sort();
    files
}

fn classify_file(store: &OrientationStore, path: &Path) -> Result<ClassifiedFile, SkippedFile> {
    let source = path.display().to_string();
    let decoded = probe::probe_file(path).map_err(|e| SkippedFile {
        source: source.clone(),
        reason: e.to_string(),
    })?;
    let id = AssetId::new(
        path.file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| source.clone()),
    );
    let orientation = store.record(&id, decoded.dimensions);
    Ok(ClassifiedFile {
        id,
        source,
        dimensions: decoded.dimensions,
        orientation,
    })
}
