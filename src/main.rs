use clap::{Parser, Subcommand};
use gallerist::config::{self, DEFAULT_CONFIG_FILE, Overrides};
use gallerist::pipeline::{Builder, Force};
use gallerist::{metadata, output};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let commit = env!("GALLERIST_COMMIT");
    if commit.is_empty() {
        env!("CARGO_PKG_VERSION")
    } else {
        // Leaked once at startup
        Box::leak(format!("{} ({commit})", env!("CARGO_PKG_VERSION")).into_boxed_str())
    }
}

#[derive(Parser)]
#[command(name = "gallerist")]
#[command(about = "Static gallery generator for photos and videos")]
#[command(long_about = "\
Static gallery generator for photos and videos

Every directory under the source becomes an album, every recognised image or
video becomes a media item. Processed files, thumbnails and one HTML page per
album are written to the destination.

Source structure:

  pictures/
  ├── index.md                 # Root album title and description
  ├── cover.jpg
  ├── 2019/
  │   ├── index.md             # Title:, Thumbnail:, Sort: ... then a description
  │   ├── paris/
  │   │   ├── eiffel.jpg
  │   │   ├── eiffel.md        # Sidecar for eiffel.jpg
  │   │   └── river.ogv        # Transcoded to webm
  │   └── drafts/
  │       └── .nomedia         # Empty marker: album is skipped (nomedia plugin)
  └── 2020/

Metadata resolution (first available wins):
  Title:       Markdown sidecar → IPTC object name → EXIF XPTitle → filename
  Description: Markdown body → IPTC caption → EXIF ImageDescription

Run 'gallerist init' to write a documented gallerist.toml.")]
#[command(version = version_string())]
struct Cli {
    /// Show progress and the album tree
    #[arg(short, long, global = true, conflicts_with_all = ["debug", "quiet"])]
    verbose: bool,

    /// Debug logging; the first media failure aborts the build
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    debug: bool,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct BuildArgs {
    /// Source directory (overrides `source` in the config)
    source: Option<PathBuf>,

    /// Output directory (overrides `destination` in the config)
    destination: Option<PathBuf>,

    /// Config file [default: gallerist.toml when present]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Reprocess every media file
    #[arg(short, long)]
    force: bool,

    /// Reprocess albums matching a glob on the album path or name (repeatable)
    #[arg(short = 'a', long = "force-album", value_name = "PATTERN")]
    force_album: Vec<String>,

    /// Theme name or directory
    #[arg(short, long)]
    theme: Option<String>,

    /// Gallery title
    #[arg(long)]
    title: Option<String>,

    /// Number of worker threads (capped at the number of cores)
    #[arg(short = 'n', long = "ncpu")]
    ncpu: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Build the gallery
    Build(BuildArgs),
    /// Write a documented config file
    Init {
        /// Where to write it
        #[arg(default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
    /// Write Markdown metadata for an album directory or a media file
    SetMeta {
        /// Album directory (writes index.md) or media file (writes <stem>.md)
        target: PathBuf,
        /// Alternating keys and values: KEY VALUE [KEY VALUE...]
        #[arg(required = true, num_args = 2.., value_name = "KEY VALUE")]
        pairs: Vec<String>,
        /// Replace an existing sidecar
        #[arg(long)]
        overwrite: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_logging(&cli);

    match cli.command {
        Command::Build(args) => build(args, cli.debug, cli.verbose)?,
        Command::Init { path } => {
            config::write_stock_config(&path)?;
            println!("Wrote {}", path.display());
        }
        Command::SetMeta {
            target,
            pairs,
            overwrite,
        } => {
            if pairs.len() % 2 != 0 {
                return Err("set-meta expects KEY VALUE pairs".into());
            }
            let pairs: Vec<(String, String)> = pairs
                .chunks_exact(2)
                .map(|kv| (kv[0].clone(), kv[1].clone()))
                .collect();
            let written = metadata::write_meta(&target, &pairs, overwrite)?;
            println!("Wrote {}", written.display());
        }
    }

    Ok(())
}

/// `warn` by default; the verbosity flags pick another level, `RUST_LOG` wins.
fn init_logging(cli: &Cli) {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else if cli.quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn build(args: BuildArgs, debug: bool, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_path = args
        .config
        .or_else(|| Path::new(DEFAULT_CONFIG_FILE).is_file().then(|| PathBuf::from(DEFAULT_CONFIG_FILE)));
    let overrides = Overrides {
        source: args.source,
        destination: args.destination,
        theme: args.theme,
        title: args.title,
        max_processes: args.ncpu,
        debug,
    };
    let settings = config::resolve(config_path.as_deref(), &overrides)?;

    let force = if args.force {
        Force::all()
    } else {
        Force::albums(&args.force_album)?
    };

    let mut builder = Builder::new(settings)?;
    let cancel = builder.cancel_token();
    ctrlc::set_handler(move || {
        log::warn!("Interrupted, stopping workers");
        cancel.cancel();
    })?;

    let report = builder.run(&force)?;
    if verbose {
        output::print_album_tree(&report.gallery);
        println!();
    }
    output::print_build_report(&report);
    Ok(())
}
