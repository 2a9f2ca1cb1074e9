use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::{Child, Command};
use tracing::{debug, warn};

/// Put the child at the head of a new process group so everything it starts
/// can be signalled together.
pub(crate) fn isolate(cmd: &mut Command) {
    #[cfg(unix)]
    cmd.process_group(0);
    #[cfg(not(unix))]
    let _ = cmd;
}

/// Stop a running child and its process group: ask them to exit, force them
/// after `grace`, then reap the child.
pub(crate) async fn terminate(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let group = child.id().and_then(ProcessGroup::of);

    if let Some(group) = group {
        if group.signal(Signal::Terminate) {
            if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
                debug!(pgid = group.0, "Process exited after termination request");
                // Descendants may have outlived the leader
                group.signal(Signal::Kill);
                return status;
            }
            warn!(
                pgid = group.0,
                grace_ms = grace.as_millis() as u64,
                "Process ignored termination request, killing"
            );
        }
        group.signal(Signal::Kill);
    }

    // start_kill fails only when the process has already been reaped
    let _ = child.start_kill();
    child.wait().await
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Terminate,
    Kill,
}

#[derive(Debug, Clone, Copy)]
struct ProcessGroup(i32);

impl ProcessGroup {
    fn of(pid: u32) -> Option<Self> {
        i32::try_from(pid).ok().filter(|pid| *pid > 0).map(ProcessGroup)
    }

    /// Signal every process in the group; false if none was reached
    #[cfg(unix)]
    fn signal(self, signal: Signal) -> bool {
        let signal = match signal {
            Signal::Terminate => libc::SIGTERM,
            Signal::Kill => libc::SIGKILL,
        };
        // SAFETY: the group was created by `isolate` for a child this process
        // spawned, and its leader has not been reaped by anyone else
        unsafe { libc::kill(-self.0, signal) == 0 }
    }

    #[cfg(not(unix))]
    fn signal(self, _signal: Signal) -> bool {
        false
    }
}
