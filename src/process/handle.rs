use crate::error::{AutoVersionError, Result};
use crate::process::{OutputBuffer, OutputLine};
use std::process::{Child, ExitStatus};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// A running (or finished) tool invocation.
///
/// Owns the child process and its output buffer. Dropping the handle without
/// waiting leaves the child running; call `wait_for_exit` to reap it.
pub struct ProcessHandle {
    tool: String,
    child: Child,
    output: Arc<OutputBuffer>,
    readers: Vec<JoinHandle<()>>,
    started: Instant,
    timeout: Option<Duration>,
    kill_on_timeout: bool,
    status: Option<ExitStatus>,
}

impl ProcessHandle {
    pub(crate) fn new(
        tool: String,
        child: Child,
        output: Arc<OutputBuffer>,
        readers: Vec<JoinHandle<()>>,
        timeout: Option<Duration>,
        kill_on_timeout: bool,
    ) -> Self {
        ProcessHandle {
            tool,
            child,
            output,
            readers,
            started: Instant::now(),
            timeout,
            kill_on_timeout,
            status: None,
        }
    }

    /// OS process id of the child
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Shared output buffer, readable while the process is still running
    pub fn output(&self) -> Arc<OutputBuffer> {
        Arc::clone(&self.output)
    }

    /// Exit status, once the process has been reaped
    pub fn exit_status(&self) -> Option<ExitStatus> {
        self.status
    }

    /// Non-blocking check whether the child has exited
    pub fn has_exited(&mut self) -> Result<bool> {
        if self.status.is_some() {
            return Ok(true);
        }
        match self.child.try_wait()? {
            Some(status) => {
                self.status = Some(status);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Wait for the child to exit and for both output streams to drain.
    ///
    /// The whole wait, including the drain, is bounded by the timeout given
    /// at start, measured from process start. On expiry the child is killed
    /// (unless `kill_on_timeout` was disabled) and `AutoVersionError::Timeout`
    /// is returned. A child that exits in time while a descendant keeps its
    /// pipes open also times out; the readers are detached in that case.
    pub fn wait_for_exit(&mut self) -> Result<ExitStatus> {
        let status = match self.status {
            Some(status) => status,
            None => {
                let status = match self.timeout {
                    None => self.child.wait()?,
                    Some(timeout) => self.wait_with_deadline(timeout)?,
                };
                self.status = Some(status);
                status
            }
        };

        self.drain_output()?;
        log::debug!("{} exited with {}", self.tool, status);
        Ok(status)
    }

    fn drain_output(&mut self) -> Result<()> {
        if let Some(timeout) = self.timeout {
            let remaining = (self.started + timeout).saturating_duration_since(Instant::now());
            if !self.output.wait_closed(Some(remaining)) {
                log::warn!(
                    "{} exited but its output is still open after {}ms, detaching readers",
                    self.tool,
                    timeout.as_millis()
                );
                self.output.close();
                self.readers.clear();
                return Err(AutoVersionError::Timeout {
                    tool: self.tool.clone(),
                    timeout,
                });
            }
        }

        self.join_readers();
        Ok(())
    }

    fn wait_with_deadline(&mut self, timeout: Duration) -> Result<ExitStatus> {
        let deadline = self.started + timeout;
        loop {
            if let Some(status) = self.child.try_wait()? {
                return Ok(status);
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(self.expire(timeout));
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }

    fn expire(&mut self, timeout: Duration) -> AutoVersionError {
        if self.kill_on_timeout {
            log::warn!(
                "{} (pid {}) exceeded {}ms, terminating",
                self.tool,
                self.child.id(),
                timeout.as_millis()
            );
            if let Err(e) = self.child.kill() {
                log::debug!("kill {} failed: {}", self.child.id(), e);
            }
            if let Ok(status) = self.child.wait() {
                self.status = Some(status);
            }
            // Descendants may still hold the pipes; stop collecting instead of joining.
            self.output.close();
            self.readers.clear();
        } else {
            log::warn!(
                "{} (pid {}) exceeded {}ms, leaving it running",
                self.tool,
                self.child.id(),
                timeout.as_millis()
            );
        }

        AutoVersionError::Timeout {
            tool: self.tool.clone(),
            timeout,
        }
    }

    fn join_readers(&mut self) {
        for reader in self.readers.drain(..) {
            if reader.join().is_err() {
                log::error!("output reader for {} panicked", self.tool);
            }
        }
        self.output.close();
    }

    /// Everything captured so far, in arrival order
    pub fn into_output(self) -> Vec<OutputLine> {
        self.output.snapshot()
    }
}

impl std::fmt::Debug for ProcessHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessHandle")
            .field("tool", &self.tool)
            .field("pid", &self.child.id())
            .field("timeout", &self.timeout)
            .field("status", &self.status)
            .finish()
    }
}
