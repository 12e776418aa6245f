//! Scoped interrupt redirection for helper processes.
//!
//! While an [`InterruptForwarder`] is alive, SIGINT no longer terminates the
//! editor: it kills the tracked helper process instead. Dropping the forwarder
//! puts back whatever disposition SIGINT had before, so nothing outlives the
//! helper. Only one forwarder exists at a time; `install` waits for the
//! previous one to be dropped.

use std::io;
use std::sync::{Mutex, MutexGuard};

#[cfg(unix)]
pub(crate) use self::unix::InterruptForwarder;

#[cfg(not(unix))]
pub(crate) use self::fallback::InterruptForwarder;

static FORWARDER_LOCK: Mutex<()> = Mutex::new(());

fn exclusive() -> MutexGuard<'static, ()> {
    FORWARDER_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(unix)]
mod unix {
    use std::ffi::c_int;
    use std::sync::MutexGuard;
    use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};

    use nix::sys::signal::{SaFlags, SigAction, SigHandler, SigSet, Signal, kill, sigaction};
    use nix::unistd::Pid;
    use tracing::{debug, warn};

    use super::{exclusive, io};

    static HELPER_PID: AtomicI32 = AtomicI32::new(0);
    static INTERRUPTED: AtomicBool = AtomicBool::new(false);

    /// Only async-signal-safe work: two atomics and `kill(2)`
    extern "C" fn forward_interrupt(_: c_int) {
        INTERRUPTED.store(true, Ordering::SeqCst);
        let pid = HELPER_PID.load(Ordering::SeqCst);
        if pid > 0 {
            let _ = kill(Pid::from_raw(pid), Signal::SIGKILL);
        }
    }

    pub(crate) struct InterruptForwarder {
        previous: SigAction,
        _exclusive: MutexGuard<'static, ()>,
    }

    impl InterruptForwarder {
        pub(crate) fn install() -> io::Result<Self> {
            let guard = exclusive();
            HELPER_PID.store(0, Ordering::SeqCst);
            INTERRUPTED.store(false, Ordering::SeqCst);

            let action = SigAction::new(
                SigHandler::Handler(forward_interrupt),
                SaFlags::SA_RESTART,
                SigSet::empty(),
            );
            // SAFETY: the handler only touches atomics and calls kill(2)
            let previous = unsafe { sigaction(Signal::SIGINT, &action) }.map_err(io::Error::from)?;
            debug!("interrupts now go to the helper");

            Ok(Self {
                previous,
                _exclusive: guard,
            })
        }

        /// Route interrupts to `pid` until [`untrack`](Self::untrack)
        pub(crate) fn track(&self, pid: u32) {
            HELPER_PID.store(pid as i32, Ordering::SeqCst);
        }

        pub(crate) fn untrack(&self) {
            HELPER_PID.store(0, Ordering::SeqCst);
        }

        /// Whether an interrupt arrived since `install`
        pub(crate) fn interrupted(&self) -> bool {
            INTERRUPTED.load(Ordering::SeqCst)
        }
    }

    impl Drop for InterruptForwarder {
        fn drop(&mut self) {
            self.untrack();
            // SAFETY: restores the action that was in place before install
            if let Err(e) = unsafe { sigaction(Signal::SIGINT, &self.previous) } {
                warn!(error = %e, "could not restore the interrupt handler");
            }
        }
    }

    /// Current SIGINT handler, read while no forwarder is installed
    #[cfg(test)]
    pub(crate) fn current_handler() -> SigHandler {
        let _guard = exclusive();
        let placeholder = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
        // SAFETY: the previous action is put back immediately
        let previous = unsafe { sigaction(Signal::SIGINT, &placeholder) }.expect("read SIGINT action");
        unsafe { sigaction(Signal::SIGINT, &previous) }.expect("restore SIGINT action");
        previous.handler()
    }

    #[cfg(test)]
    pub(crate) fn forwarding_handler() -> SigHandler {
        SigHandler::Handler(forward_interrupt)
    }

    #[cfg(test)]
    pub(crate) fn tracked_pid() -> i32 {
        HELPER_PID.load(Ordering::SeqCst)
    }
}

/// Platforms without POSIX signals keep the default Ctrl-C behavior
#[cfg(not(unix))]
mod fallback {
    use std::sync::MutexGuard;

    use super::{exclusive, io};

    pub(crate) struct InterruptForwarder {
        _exclusive: MutexGuard<'static, ()>,
    }

    impl InterruptForwarder {
        pub(crate) fn install() -> io::Result<Self> {
            Ok(Self {
                _exclusive: exclusive(),
            })
        }

        pub(crate) fn track(&self, _pid: u32) {}

        pub(crate) fn untrack(&self) {}

        pub(crate) fn interrupted(&self) -> bool {
            false
        }
    }
}

#[cfg(all(test, unix))]
pub(crate) use self::unix::{current_handler, forwarding_handler, tracked_pid};
