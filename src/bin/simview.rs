//! Dump every variable and metadata key of a telemetry region.
//!
//! ```text
//! simview [--config options.yaml] [--latest-tick] [--raw-metadata] [DUMP]
//! ```
//!
//! Without `DUMP` the live shared-memory region is opened (Windows only).
//! Set `RUST_LOG` to control log output.

use anyhow::{Context, Result, bail};
use simview::{BufferPolicy, Entry, Session, SessionOptions, SimView};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Default)]
struct Args {
    config: Option<PathBuf>,
    dump: Option<PathBuf>,
    latest_tick: bool,
    raw_metadata: bool,
}

fn parse_args() -> Result<Args> {
    let mut args = Args::default();
    let mut iter = std::env::args().skip(1);

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--latest-tick" => args.latest_tick = true,
            "--raw-metadata" => args.raw_metadata = true,
            "--config" => {
                let path = iter.next().context("--config requires a path")?;
                args.config = Some(PathBuf::from(path));
            }
            flag if flag.starts_with("--") => bail!("Unknown flag: {}", flag),
            path => {
                if args.dump.is_some() {
                    bail!("Only one dump path may be given");
                }
                args.dump = Some(PathBuf::from(path));
            }
        }
    }

    Ok(args)
}

fn load_options(args: &Args) -> Result<SessionOptions> {
    let mut options = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_yaml_ng::from_str(&text)
                .with_context(|| format!("Invalid config {}", path.display()))?
        }
        None => SessionOptions::default(),
    };

    if args.latest_tick {
        options = options.with_buffer_policy(BufferPolicy::LatestTick);
    }
    if args.raw_metadata {
        options = options.with_metadata_preprocessing(false);
    }
    Ok(options)
}

fn print_entries<S: AsRef<[u8]>>(session: &Session<S>) -> Result<()> {
    let keys = session.keys()?;
    info!(keys = keys.len(), "Dumping region");

    for key in keys {
        match session.get(&key)? {
            Entry::Variable(sample) => println!("{} = {}", key, sample),
            Entry::Metadata(value) => {
                let yaml = serde_yaml_ng::to_string(&value)?;
                println!("{}:", key);
                for line in yaml.lines() {
                    println!("  {}", line);
                }
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = parse_args()?;
    let options = load_options(&args)?;

    match &args.dump {
        Some(path) => {
            let session = SimView::open_dump_with(path, options)
                .with_context(|| format!("Failed to open dump {}", path.display()))?;
            print_entries(&session)
        }
        None => {
            let session =
                SimView::connect_with(options).context("Failed to open live telemetry region")?;
            print_entries(&session)
        }
    }
}
