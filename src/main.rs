// ── CLI host ──────────────────────────────────────────────────────────────────
//
// A minimal stand-in for an editor: opens a file into a `MemoryBuffer`,
// optionally changes its encoding / line endings (which makes it dirty, so
// the estimator runs instead of the filesystem lookup), fires one
// "activated" event and drains the timer queue.  Prints the status text.

#![forbid(unsafe_code)]

use std::{path::PathBuf, process::ExitCode};

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use statusbar_filesize::{
    encoding::LineEnding,
    schedule::TimerQueue,
    status::{StatusLine, KEY_SIZE},
    BufferId, EventListener, FileSizeListener, MemoryBuffer, Settings, TextBuffer, Units,
};

#[derive(Parser)]
#[command(name = "statusbar-filesize")]
#[command(about = "Show the (estimated) on-disk size of a text buffer")]
#[command(version)]
struct Args {
    /// File to load into the buffer.
    path: PathBuf,
    /// Save the buffer with this encoding, e.g. "UTF-16 LE" or "Western (Windows 1252)".
    #[arg(long)]
    encoding: Option<String>,
    /// Save the buffer with these line endings: Unix, Windows or CR.
    #[arg(long)]
    line_endings: Option<String>,
    /// Settings JSON file (defaults to $STATUSBAR_FILESIZE_SETTINGS).
    #[arg(long)]
    settings: Option<PathBuf>,
    /// Override the unit system from the settings.
    #[arg(long)]
    units: Option<Units>,
    /// Also report the zlib-compressed size.
    #[arg(long)]
    compressed: bool,
}

fn main() -> ExitCode {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "statusbar_filesize=warn".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let mut settings = match &args.settings {
        Some(path) => Settings::load(path),
        None => Settings::from_env(),
    };
    if let Some(units) = args.units {
        settings.units = units;
    }
    settings.compute_compressed_size |= args.compressed;

    let mut buffer = match MemoryBuffer::open(BufferId(1), &args.path) {
        Ok(buffer) => buffer,
        Err(e) => {
            eprintln!("statusbar-filesize: {e}");
            return ExitCode::FAILURE;
        }
    };
    if let Some(encoding) = args.encoding {
        buffer.set_encoding(encoding);
    }
    if let Some(name) = args.line_endings.as_deref() {
        match LineEnding::from_name(name) {
            Some(eol) => buffer.set_line_endings(eol),
            None => {
                eprintln!("statusbar-filesize: unknown line endings {name:?} (expected Unix, Windows or CR)");
                return ExitCode::FAILURE;
            }
        }
    }

    let mut listener = FileSizeListener::new(settings, StatusLine::default(), TimerQueue::new());
    tracing::debug!(settings = ?listener.settings(), "effective settings");
    listener.on_activated(&buffer);
    while let Some(id) = listener.scheduler_mut().wait_next() {
        if id == buffer.id() {
            listener.on_deferred(&buffer);
        }
    }

    match listener.status().get(buffer.id(), KEY_SIZE) {
        Some(text) => {
            println!("{text}");
            ExitCode::SUCCESS
        }
        None => {
            eprintln!("statusbar-filesize: no size available for {}", args.path.display());
            ExitCode::FAILURE
        }
    }
}
