use clap::{Parser, Subcommand};
use emote_slicer::assignments::load_assignments;
use emote_slicer::cache::DetectionCache;
use emote_slicer::export::{SourceImage, build_archive};
use emote_slicer::imaging::RustBackend;
use emote_slicer::imaging::rust_backend::supported_input_extensions;
use emote_slicer::{archive, config, naming, output};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "emote-slicer")]
#[command(about = "Slice an emote and badge sprite sheet into a zip of sized PNGs")]
#[command(long_about = "\
Slice an emote and badge sprite sheet into a zip of sized PNGs

The sheet is a grid of square cells numbered row by row from 1. Detect first
to see which cells hold content, then export with an assignment file:

  [[cell]]
  index = 1
  category = \"Badge\"        # Emote | Badge | Badge Bit | Flair | None
  name = \"Wave\"             # optional, defaults to the cell number
  mirrored = false          # optional, adds flipped B_ copies

  [[row]]                   # every detected cell of row 2 (zero-based)
  row = 2
  category = \"Emote\"

Output layout:

  Cats.zip
  └── Wave/
      ├── Wave_Original.png
      ├── Wave_DiscordSize.png
      ├── Wave_72x72.png
      ├── Wave_36x36.png
      └── Wave_18x18.png

Run 'emote-slicer gen-config' to generate a documented config.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Config file (grid layout, threshold, sizes). Stock defaults when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the cells of a sheet that hold content
    Detect {
        /// Sprite sheet (PNG or JPEG)
        image: PathBuf,
        /// Print the detection as JSON
        #[arg(long)]
        json: bool,
    },
    /// Render every assigned cell into a zip archive
    Export {
        /// Sprite sheet (PNG or JPEG)
        image: PathBuf,
        /// Assignment file (TOML)
        #[arg(long)]
        assignments: PathBuf,
        /// Archive name without extension (default: sheet name minus "Grid")
        #[arg(long)]
        name: Option<String>,
        /// Directory the archive is written to
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("emote_slicer=info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Detect { image, json } => {
            let app_config = config::load_config(cli.config.as_deref())?;
            let source = load_source(&image)?;
            let mut cache = DetectionCache::new();
            let detection = cache.get_or_detect(
                &source,
                &app_config.grid,
                app_config.detection.threshold,
            )?;
            if json {
                println!("{}", serde_json::to_string_pretty(detection)?);
            } else {
                output::print_detection(detection, &app_config.grid);
            }
        }
        Command::Export {
            image,
            assignments,
            name,
            output_dir,
        } => {
            let app_config = config::load_config(cli.config.as_deref())?;
            init_thread_pool(&app_config.processing);

            let source = load_source(&image)?;
            let mut cache = DetectionCache::new();
            let detection = cache.get_or_detect(
                &source,
                &app_config.grid,
                app_config.detection.threshold,
            )?;
            let table = load_assignments(&assignments, &app_config.grid, detection)?;
            for index in table.undetected(detection) {
                warn!(%index, "cell is assigned but detection found it empty");
            }

            let backend = RustBackend::new();
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    output::print_export_event(&event);
                }
            });
            let result = build_archive(
                &source,
                &app_config.grid,
                &table,
                &app_config.render_config(),
                &backend,
                Some(tx),
            );
            printer
                .join()
                .map_err(|_| "progress printer thread panicked")?;
            let result = result?;

            std::fs::create_dir_all(&output_dir)?;
            let archive_path =
                output_dir.join(naming::archive_file_name(name.as_deref(), source.name()));
            archive::persist(&archive_path, &result.bytes)?;
            info!(path = %archive_path.display(), "archive written");
            output::print_export_summary(&archive_path, &result);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Read and decode the sheet, keeping its file name for the archive name.
fn load_source(path: &Path) -> Result<SourceImage, Box<dyn std::error::Error>> {
    let supported = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .is_some_and(|ext| supported_input_extensions().iter().any(|s| *s == ext));
    if !supported {
        warn!(path = %path.display(), "not a .png/.jpg upload, trying to decode anyway");
    }
    let bytes = std::fs::read(path)?;
    let name = path.file_name().map(|n| n.to_string_lossy().into_owned());
    Ok(SourceImage::load(
        &bytes,
        name.as_deref(),
        &RustBackend::new(),
    )?)
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
