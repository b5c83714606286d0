use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use cloud_transform::Gravity;
use image_batch_tools::config::{DEFAULT_HEIGHT, DEFAULT_WIDTH, MAX_DIMENSION, MIN_DIMENSION};
use image_batch_tools::core::format_kib;
use image_batch_tools::processing::{initialize, sweep_stale_resources};
use image_batch_tools::{
    Archive, BatchReport, BatchSession, HasRecoverySuggestion, ImagePayload, LocalOptimizer,
    NoticeKind, RemoteProcessor, ToolConfig, ToolError, ToolKind, archive_file_name, pack_results,
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Batch image tools: local re-compression plus remote canvas expansion and smart crop.
#[derive(Parser, Debug)]
#[command(name = "imgtools")]
#[command(about = "🖼️ Compress, expand or smart-crop a batch of images")]
#[command(long_about = "Apply one tool to a batch of images and collect the results in a ZIP archive.
compress runs locally; expand and crop use the remote image service configured through CLOUDINARY_URL.")]
struct Cli {
    /// Log debug output (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Remote service credentials, cloudinary://<key>:<secret>@<cloud>
    #[arg(long, env = "CLOUDINARY_URL", global = true, hide_env_values = true)]
    cloudinary_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Re-encode images locally, keeping only those that got smaller
    Compress {
        #[command(flatten)]
        batch: BatchArgs,
    },
    /// Expand the canvas with generative fill on the remote service
    Expand {
        #[command(flatten)]
        batch: BatchArgs,
        #[command(flatten)]
        size: SizeArgs,
    },
    /// Content-aware crop on the remote service
    Crop {
        #[command(flatten)]
        batch: BatchArgs,
        #[command(flatten)]
        size: SizeArgs,
        /// Anchor the crop keeps in frame
        #[arg(short, long, value_enum, default_value_t = Gravity::Auto)]
        gravity: Gravity,
    },
    /// Delete every resource stored on the remote service
    Sweep,
}

#[derive(Args, Debug)]
struct BatchArgs {
    /// Images to process
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Directory the archive is written to
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Also write every result as a separate file
    #[arg(long)]
    individual: bool,
}

#[derive(Args, Debug)]
struct SizeArgs {
    /// Target width in px
    #[arg(long, default_value_t = DEFAULT_WIDTH,
          value_parser = clap::value_parser!(u32).range(MIN_DIMENSION as i64..=MAX_DIMENSION as i64))]
    width: u32,

    /// Target height in px
    #[arg(long, default_value_t = DEFAULT_HEIGHT,
          value_parser = clap::value_parser!(u32).range(MIN_DIMENSION as i64..=MAX_DIMENSION as i64))]
    height: u32,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let url = cli.cloudinary_url.as_deref();
    let outcome = match cli.command {
        Command::Compress { batch } => run(ToolConfig::new(ToolKind::Compress), &batch, url),
        Command::Expand { batch, size } => run(
            ToolConfig::new(ToolKind::Expand).with_dimensions(size.width, size.height),
            &batch,
            url,
        ),
        Command::Crop {
            batch,
            size,
            gravity,
        } => run(
            ToolConfig::new(ToolKind::Crop)
                .with_dimensions(size.width, size.height)
                .with_gravity(gravity),
            &batch,
            url,
        ),
        Command::Sweep => initialize(url).map_err(anyhow::Error::from).map(|client| {
            let count = sweep_stale_resources(&client);
            println!("Deleted {count} remote resources");
        }),
    };

    if let Err(error) = &outcome {
        if let Some(tool_error) = error.downcast_ref::<ToolError>() {
            if tool_error.is_batch_fatal() {
                eprintln!("🛑 batch aborted");
            }
            if let Some(hint) = tool_error.recovery_suggestion() {
                eprintln!("💡 {hint}");
            }
        }
    }
    outcome
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run(config: ToolConfig, args: &BatchArgs, cloudinary_url: Option<&str>) -> Result<()> {
    config.validate()?;
    let payloads = load_payloads(&config, &args.files);
    if payloads.is_empty() {
        bail!("no acceptable images to process");
    }

    let report = match config.kind {
        ToolKind::Compress => run_session(&config, &payloads, &LocalOptimizer),
        ToolKind::Expand | ToolKind::Crop => {
            let client = initialize(cloudinary_url)?;
            sweep_stale_resources(&client);
            let processor = RemoteProcessor::new(&client, config.clone())?;
            run_session(&config, &payloads, &processor)
        }
    };

    print_notices(&report);
    if !report.has_results() {
        print_stats(&report);
        println!("Nothing to download.");
        return Ok(());
    }

    // Resolve colliding output names once; files, summary and archive all use these.
    let archive = pack_results(report.results())?;
    print_results(&report, &archive.entry_names);
    print_stats(&report);
    write_outputs(&config, &report, &archive, args)
}

/// Read the files, dropping (and reporting) anything the tool cannot take.
fn load_payloads(config: &ToolConfig, files: &[PathBuf]) -> Vec<ImagePayload> {
    files
        .iter()
        .filter_map(|path| {
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
            let loaded = config
                .check_extension(name)
                .and_then(|()| ImagePayload::from_path_within(path, config.max_upload_bytes));
            match loaded {
                Ok(payload) => Some(payload),
                Err(error) => {
                    eprintln!("⚠️  {error}");
                    if let Some(hint) = error.recovery_suggestion() {
                        eprintln!("   💡 {hint}");
                    }
                    None
                }
            }
        })
        .collect()
}

fn run_session<P>(config: &ToolConfig, payloads: &[ImagePayload], processor: &P) -> BatchReport
where
    P: image_batch_tools::ItemProcessor + ?Sized,
{
    BatchSession::for_tool(config)
        .with_progress(|progress| {
            eprintln!(
                "[{}/{}] {:>3.0}%",
                progress.completed,
                progress.total,
                progress.fraction() * 100.0
            );
            if progress.is_complete() {
                eprintln!("✔ all {} images handled", progress.total);
            }
        })
        .build()
        .run(payloads, processor)
}

fn print_notices(report: &BatchReport) {
    for notice in report.notices() {
        match notice.kind {
            NoticeKind::Skipped => println!("⏭️  {}: {}", notice.name, notice.message),
            NoticeKind::Failed => println!("❌ {}: {}", notice.name, notice.message),
        }
        if let Some(hint) = notice.suggestion {
            println!("   💡 {hint}");
        } else if notice.retryable {
            println!("   💡 try this image again");
        }
    }
}

/// One line per result, under the name it is stored as.
fn print_results(report: &BatchReport, stored_names: &[String]) {
    for (result, stored) in report.results().zip(stored_names) {
        println!(
            "✅ {} → {} ({} saved)",
            result.source_name,
            stored,
            format_kib(result.saved())
        );
    }
}

fn print_stats(report: &BatchReport) {
    let stats = &report.stats;
    println!(
        "{} of {} processed, {} skipped, {} failed",
        stats.processed,
        stats.total(),
        stats.skipped,
        stats.failed
    );
    if stats.processed > 0 {
        println!(
            "Total saved: {} (average {} per image, output is {:.1}% of the original size)",
            format_kib(stats.total_saved),
            format_kib(stats.average_saved().round() as i64),
            stats.size_ratio_percent()
        );
    }
}

fn write_outputs(
    config: &ToolConfig,
    report: &BatchReport,
    archive: &Archive,
    args: &BatchArgs,
) -> Result<()> {
    fs::create_dir_all(&args.output)
        .with_context(|| format!("cannot create {}", args.output.display()))?;

    if args.individual {
        for (result, stored) in report.results().zip(&archive.entry_names) {
            write_file(&args.output.join(stored), &result.bytes)?;
        }
    }

    let path = args
        .output
        .join(archive_file_name(config.kind, &chrono::Local::now()));
    write_file(&path, &archive.bytes)?;
    println!("📦 {} ({} files)", path.display(), archive.len());
    Ok(())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<()> {
    debug!(path = %path.display(), bytes = bytes.len(), "writing output");
    fs::write(path, bytes).with_context(|| format!("cannot write {}", path.display()))
}
