//! ndlayer CLI - band-index map overlays from Landsat archives

mod sink;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ndlayer_cloud::{blocking_request, ArchiveSource, HttpClient, ImageryClient, ImageryRequest};
use ndlayer_core::IndexKind;
use ndlayer_overlay::{
    spawn_run, KindOutcome, MapSession, Pipeline, PipelineConfig, PipelineEvent, RunReport,
};

use crate::sink::DirectorySink;

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "ndlayer")]
#[command(author, version, about = "NDVI and NDWI map overlays from band archives", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute index layers and write them to a directory
    Run {
        #[command(flatten)]
        source: SourceArgs,
        /// Output directory for layer images and descriptors
        #[arg(short, long, default_value = "layers")]
        out: PathBuf,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Show which archive entries match each band and what they contain
    Inspect {
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Print the effective configuration as JSON
    Config {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Archive URL or local path
    #[arg(short, long, conflicts_with = "geojson", required_unless_present = "geojson")]
    archive: Option<String>,
    /// GeoJSON area of interest, sent to the imagery service
    #[arg(short, long, requires = "endpoint")]
    geojson: Option<PathBuf>,
    /// Imagery service URL
    #[arg(long)]
    endpoint: Option<String>,
    /// Image collection requested from the service
    #[arg(long)]
    collection: Option<String>,
    /// First acquisition date (YYYY-MM-DD)
    #[arg(long, requires = "end")]
    start: Option<String>,
    /// Last acquisition date (YYYY-MM-DD)
    #[arg(long, requires = "start")]
    end: Option<String>,
}

#[derive(Args)]
struct ConfigArgs {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Display CRS EPSG code
    #[arg(long)]
    display_epsg: Option<u32>,
    /// CRS EPSG code assumed for bands without one
    #[arg(long, conflicts_with = "no_fallback")]
    fallback_epsg: Option<u32>,
    /// Fail instead of assuming a CRS for bands without one
    #[arg(long)]
    no_fallback: bool,
    /// Index kinds to compute: ndvi, ndwi
    #[arg(short, long, value_delimiter = ',')]
    kinds: Vec<String>,
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn parse_kind(s: &str) -> Result<IndexKind> {
    match s.to_lowercase().as_str() {
        "ndvi" | "vegetation" => Ok(IndexKind::Vegetation),
        "ndwi" | "water" => Ok(IndexKind::Water),
        _ => bail!("Unknown index kind: {}. Use: ndvi, ndwi", s),
    }
}

fn load_config(args: &ConfigArgs) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(code) = args.display_epsg {
        config.display_epsg = code;
    }
    if let Some(code) = args.fallback_epsg {
        config.fallback_source_epsg = Some(code);
    }
    if args.no_fallback {
        config.fallback_source_epsg = None;
    }
    if !args.kinds.is_empty() {
        config.kinds = args
            .kinds
            .iter()
            .map(|k| parse_kind(k))
            .collect::<Result<_>>()?;
    }
    config.validate()?;
    Ok(config)
}

/// Resolve the archive location, asking the imagery service when given an
/// area of interest instead of an archive.
fn resolve_source(args: &SourceArgs, config: &PipelineConfig) -> Result<ArchiveSource> {
    if let Some(archive) = &args.archive {
        return Ok(ArchiveSource::parse(archive));
    }
    let (Some(geojson), Some(endpoint)) = (&args.geojson, &args.endpoint) else {
        bail!("either --archive or --geojson with --endpoint is required");
    };

    let text = std::fs::read_to_string(geojson)
        .with_context(|| format!("Failed to read {}", geojson.display()))?;
    let geojson: serde_json::Value =
        serde_json::from_str(&text).context("Failed to parse GeoJSON")?;
    let mut request = ImageryRequest::new(geojson);
    if let Some(collection) = &args.collection {
        request = request.with_collection(collection);
    }
    if let (Some(start), Some(end)) = (&args.start, &args.end) {
        request = request.with_dates(start, end);
    }

    let pb = spinner("Requesting imagery...");
    let http = HttpClient::new(config.http_options())?;
    let product = blocking_request(&ImageryClient::new(http, endpoint), &request)
        .context("Imagery request failed")?;
    pb.finish_and_clear();
    info!(archive = %product.geotiff_url, "imagery service returned archive");
    Ok(product.archive_source())
}

fn summarize(report: &RunReport, out: &PathBuf, elapsed: std::time::Duration) {
    for (kind, outcome) in &report.outcomes {
        match outcome {
            KindOutcome::Published => println!("{} saved to: {}", kind.layer_title(), out.display()),
            KindOutcome::Superseded => println!("{}: superseded", kind.layer_title()),
            KindOutcome::Failed(failure) => println!("{}: {}", kind.layer_title(), failure),
        }
    }
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Commands ───────────────────────────────────────────────────────────

fn run(source: &SourceArgs, out: PathBuf, config: PipelineConfig) -> Result<()> {
    let archive = resolve_source(source, &config)?;
    let (tx, rx) = crossbeam_channel::unbounded();
    let pipeline = Arc::new(Pipeline::new(config)?.with_events(tx));
    let sink = DirectorySink::new(&out)
        .with_context(|| format!("Failed to create {}", out.display()))?;
    let session = Arc::new(MapSession::new(sink));

    let start = Instant::now();
    let pb = spinner(&format!("Processing {}...", archive));
    let (_token, handle) = spawn_run(pipeline.clone(), archive, session);
    // Sender lives in the pipeline; the loop ends once the run drops its last clone.
    drop(pipeline);
    for event in rx {
        match event {
            PipelineEvent::StageFinished { kind: Some(kind), stage, .. } => {
                pb.set_message(format!("{kind}: {stage} done"))
            }
            PipelineEvent::StageFinished { kind: None, stage, .. } => {
                pb.set_message(format!("{stage} done"))
            }
            PipelineEvent::Failed { message, .. } => pb.println(format!("  failed: {message}")),
            _ => {}
        }
    }
    pb.finish_and_clear();

    let report = match handle.join() {
        Ok(result) => result?,
        Err(_) => bail!("pipeline thread panicked"),
    };
    summarize(&report, &out, start.elapsed());

    if report.published() == 0 {
        bail!("no layers were published");
    }
    Ok(())
}

fn inspect(source: &SourceArgs, config: PipelineConfig) -> Result<()> {
    let archive = resolve_source(source, &config)?;
    let pipeline = Pipeline::new(config)?;

    let pb = spinner("Reading archive...");
    let bytes = pipeline.fetch(&archive)?;
    let cache = pipeline.load(&bytes)?;
    pb.finish_and_clear();

    println!("Archive: {} ({} bytes)", archive, bytes.len());
    for role in pipeline.config().required_roles() {
        println!("{} (pattern {})", role, pipeline.config().pattern(role));
        match cache.get(role) {
            Ok(band) => {
                let extent = band.extent();
                println!("  Entry: {}", band.name());
                println!("  Size: {} x {}", band.width(), band.height());
                println!("  Sample type: {}", band.sample_type());
                match band.crs() {
                    Some(crs) => println!("  CRS: {}", crs),
                    None => println!("  CRS: none"),
                }
                println!(
                    "  Extent: ({:.2}, {:.2}) - ({:.2}, {:.2})",
                    extent.min_x, extent.min_y, extent.max_x, extent.max_y
                );
            }
            Err(e) => println!("  Unavailable: {}", e),
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        Commands::Run {
            source,
            out,
            config,
        } => run(&source, out, load_config(&config)?),

        Commands::Inspect { source, config } => inspect(&source, load_config(&config)?),

        Commands::Config { config } => {
            let config = load_config(&config)?;
            println!("{}", serde_json::to_string_pretty(&config)?);
            Ok(())
        }
    }
}
