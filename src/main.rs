use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgAction, Parser};
use quill_buffer::{Buffer, SaveContext};
use quill_config::Config;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "quill", version, about = "Open a file and write it back through the quill save path")]
struct Cli {
    /// Settings file to use instead of the standard locations
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Write through the privileged helper (`sucmd tee FILE`)
    #[arg(long = "sudo", action = ArgAction::SetTrue)]
    sudo: bool,

    /// Save to this path instead of FILE
    #[arg(long = "as", value_name = "DEST")]
    save_as: Option<PathBuf>,

    /// File to open; a missing file starts an empty buffer
    file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(log_filter())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("failed to load settings from {}", path.display()))?,
        None => Config::load().context("failed to load settings")?,
    };
    let ctx = SaveContext::from_config(&config);

    let mut buffer = open_buffer(&cli, &config)?;
    if let Some(store) = ctx.state_store() {
        match store.restore(&buffer.abs_path) {
            Ok(Some(state)) if buffer.apply_state(&state) => {
                debug!(cursor = ?buffer.cursors().first(), "restored cursor");
            }
            Ok(_) => {}
            Err(e) => debug!(error = %e, "ignoring stored buffer state"),
        }
    }

    let destination = cli.save_as.clone().unwrap_or_else(|| cli.file.clone());
    let outcome = if cli.sudo {
        buffer.save_as_with_sudo(&ctx, &destination)
    } else {
        buffer.save_as(&ctx, &destination)
    }
    .with_context(|| format!("failed to save {}", destination.display()))?;

    info!(
        path = %outcome.path.display(),
        bytes = outcome.bytes_written,
        fastdirty = buffer.settings.fastdirty,
        "done"
    );
    if outcome.fast_dirty_engaged {
        info!("file exceeds the hashing threshold, modification tracking now uses fast dirty mode");
    }

    Ok(())
}

/// `RUST_LOG` when it parses, `info` otherwise
fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

fn open_buffer(cli: &Cli, config: &Config) -> anyhow::Result<Buffer> {
    let target = quill_fs::replace_home(&cli.file);
    if target.exists() {
        let buffer = Buffer::from_file(&cli.file, config.buffer.clone())
            .with_context(|| format!("failed to open {}", cli.file.display()))?;
        info!(path = %cli.file.display(), lines = buffer.line_count(), "opened");
        return Ok(buffer);
    }

    let mut buffer = Buffer::new(config.buffer.clone());
    buffer
        .set_path(&cli.file)
        .with_context(|| format!("invalid path {}", cli.file.display()))?;
    info!(path = %cli.file.display(), "new file");
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_filter_defaults_to_info() {
        // SAFETY: no other test in this binary reads the environment
        unsafe { std::env::remove_var("RUST_LOG") };
        assert_eq!(log_filter().to_string(), "info");

        unsafe { std::env::set_var("RUST_LOG", "quill_buffer=trace") };
        assert_eq!(log_filter().to_string(), "quill_buffer=trace");
        unsafe { std::env::remove_var("RUST_LOG") };
    }
}
