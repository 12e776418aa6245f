//! Privileged save path.
//!
//! The buffer bytes are piped into `<sucmd> tee <path>` instead of being
//! written directly. While the helper runs, SIGINT kills the helper instead
//! of the editor, so Ctrl-C cancels the write. The previous SIGINT
//! disposition is restored as soon as the helper is gone.

use std::io;
use std::path::Path;
use std::process::Stdio;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::buffer::Buffer;
use crate::error::{SaveError, SaveResult};
use crate::interrupt::InterruptForwarder;
use crate::save::{SaveContext, SaveOutcome};

impl Buffer {
    /// Save to the buffer's current path through the privileged helper
    pub fn save_with_sudo(&mut self, ctx: &SaveContext) -> SaveResult<SaveOutcome> {
        if self.is_scratch() {
            return Err(SaveError::Scratch);
        }
        if self.path.as_os_str().is_empty() {
            return Err(SaveError::NoPath);
        }
        let path = self.path.clone();
        self.save_as_with_sudo(ctx, path)
    }

    /// Save to `destination` through the privileged helper.
    ///
    /// The buffer's path fields are switched to `destination` before the
    /// helper runs and stay that way if it fails. Content is sent as is:
    /// no encoding and no whitespace or newline normalization.
    ///
    /// Blocks the calling thread on a private runtime, so it must not be
    /// called from inside an async context.
    pub fn save_as_with_sudo<P: AsRef<Path>>(
        &mut self,
        ctx: &SaveContext,
        destination: P,
    ) -> SaveResult<SaveOutcome> {
        if self.is_scratch() {
            return Err(SaveError::Scratch);
        }

        let destination = destination.as_ref();
        self.set_path(destination)?;
        self.update_rules();

        let abs_path = self.abs_path.clone();
        let program = ctx.global().sucmd.clone();
        let input = self.bytes();
        let size = input.len() as u64;

        let mut command = Command::new(&program);
        command.arg("tee").arg(&abs_path);
        debug!(program = %program, path = %abs_path.display(), size, "starting privileged save");

        run_privileged(command, &program, input)?;

        self.is_modified = false;
        let fast_dirty_engaged = self.refresh_dirty_tracking(size);
        if fast_dirty_engaged {
            warn!(size, "file too large for hash tracking, using fast dirty tracking");
        }
        info!(path = %abs_path.display(), size, helper = %program, "saved with privileges");

        self.finalize_save(ctx, Some(&abs_path))?;
        Ok(SaveOutcome {
            path: abs_path,
            bytes_written: size,
            fast_dirty_engaged,
        })
    }
}

/// Drive one helper process to completion on a private runtime
fn run_privileged(command: Command, program: &str, input: Vec<u8>) -> SaveResult<()> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(SaveError::Runtime)?;

    let forwarder = InterruptForwarder::install().map_err(SaveError::Signal)?;
    runtime.block_on(run_helper(command, program, input, &forwarder))
}

/// Run `command` with `input` on its stdin until it exits. An interrupt
/// delivered through `forwarder` kills it.
async fn run_helper(
    mut command: Command,
    program: &str,
    input: Vec<u8>,
    forwarder: &InterruptForwarder,
) -> SaveResult<()> {
    command
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn().map_err(|source| SaveError::HelperSpawn {
        program: program.to_string(),
        source,
    })?;
    if let Some(pid) = child.id() {
        forwarder.track(pid);
    }
    // Ctrl-C pressed between spawn and track
    if forwarder.interrupted() {
        if let Err(e) = child.start_kill() {
            debug!(program, error = %e, "helper already gone");
        }
    }

    let feeder = child.stdin.take().map(|mut stdin| {
        tokio::spawn(async move {
            stdin.write_all(&input).await?;
            stdin.shutdown().await
        })
    });
    let collector = child.stderr.take().map(|mut stderr| {
        tokio::spawn(async move {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).await.map(|_| buf)
        })
    });

    let waited = child.wait().await;
    forwarder.untrack();

    if forwarder.interrupted() {
        warn!(program, "interrupt received, helper killed");
        abort_all(feeder, collector);
        return Err(SaveError::HelperInterrupted {
            program: program.to_string(),
        });
    }

    let status = match waited {
        Ok(status) => status,
        Err(source) => {
            abort_all(feeder, collector);
            return Err(SaveError::HelperWait {
                program: program.to_string(),
                source,
            });
        }
    };

    let fed = match feeder {
        Some(handle) => flatten(handle.await),
        None => Ok(()),
    };
    let stderr = match collector {
        Some(handle) => flatten(handle.await).unwrap_or_default(),
        None => Vec::new(),
    };

    if !status.success() {
        let message = String::from_utf8_lossy(&stderr);
        let message = message.trim();
        return Err(SaveError::HelperFailed {
            program: program.to_string(),
            status,
            detail: if message.is_empty() {
                String::new()
            } else {
                format!(": {message}")
            },
        });
    }

    fed.map_err(|source| SaveError::HelperInput {
        program: program.to_string(),
        source,
    })
}

fn flatten<T>(joined: Result<io::Result<T>, tokio::task::JoinError>) -> io::Result<T> {
    joined.map_err(io::Error::other)?
}

fn abort_all(feeder: Option<JoinHandle<io::Result<()>>>, collector: Option<JoinHandle<io::Result<Vec<u8>>>>) {
    if let Some(handle) = feeder {
        handle.abort();
    }
    if let Some(handle) = collector {
        handle.abort();
    }
}
