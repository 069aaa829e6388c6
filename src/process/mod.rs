//! External tool execution with live output capture.
//!
//! [`ToolRunner`] starts one executable per call with piped standard streams.
//! Two reader threads, one per stream, push every line into a shared
//! [`OutputBuffer`] as soon as the child writes it and optionally log it:
//!
//! - stdout lines are logged at the level picked by the classifier
//! - stderr lines are always logged at error level
//! - the output filter only changes what is logged, never what is buffered
//!
//! [`ToolRunner::run`] blocks until the child exits (bounded by the optional
//! timeout) and returns the buffer contents. [`ToolRunner::start`] returns a
//! [`ProcessHandle`] immediately so the caller can watch output while the
//! tool is still running.
//!
//! ```no_run
//! # use git_autoversion::process::{RunOptions, ToolRunner};
//! # use std::time::Duration;
//! # fn example() -> git_autoversion::Result<()> {
//! let git = ToolRunner::new("git");
//! let options = RunOptions::new().with_timeout(Duration::from_secs(30));
//! for line in git.run(["status", "--short"], None, &options)? {
//!     println!("{}", line.text);
//! }
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod filters;
pub mod handle;
pub mod launcher;

pub use buffer::OutputBuffer;
pub use filters::{git_log_level, redact_credentials};
pub use handle::ProcessHandle;
pub use launcher::{ProcessLauncher, SystemLauncher};

use crate::error::{AutoVersionError, Result};
use std::ffi::OsStr;
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Severity assigned to a captured line before it is logged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Normal,
    Warning,
    Error,
}

impl From<LogLevel> for log::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => log::Level::Trace,
            LogLevel::Normal => log::Level::Info,
            LogLevel::Warning => log::Level::Warn,
            LogLevel::Error => log::Level::Error,
        }
    }
}

/// Which standard stream a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputStream {
    Standard,
    Error,
}

impl fmt::Display for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputStream::Standard => write!(f, "stdout"),
            OutputStream::Error => write!(f, "stderr"),
        }
    }
}

/// One captured line, without its line terminator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLine {
    pub text: String,
    pub stream: OutputStream,
}

impl OutputLine {
    pub fn new(text: impl Into<String>, stream: OutputStream) -> Self {
        OutputLine {
            text: text.into(),
            stream,
        }
    }
}

/// Maps a raw stdout line to the level it is logged at
pub type LogLevelClassifier = Arc<dyn Fn(&str) -> LogLevel + Send + Sync>;

/// Rewrites a raw line before it is logged (e.g. redaction)
pub type OutputFilter = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Per-invocation settings for [`ToolRunner`].
///
/// Defaults: no timeout, logging on, every stdout line at `Normal`, identity
/// filter, child killed when the timeout expires.
#[derive(Clone)]
pub struct RunOptions {
    pub timeout: Option<Duration>,
    pub log_output: bool,
    pub log_level_classifier: LogLevelClassifier,
    pub output_filter: OutputFilter,
    pub kill_on_timeout: bool,
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_log_output(mut self, log_output: bool) -> Self {
        self.log_output = log_output;
        self
    }

    pub fn with_classifier<F>(mut self, classifier: F) -> Self
    where
        F: Fn(&str) -> LogLevel + Send + Sync + 'static,
    {
        self.log_level_classifier = Arc::new(classifier);
        self
    }

    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.output_filter = Arc::new(filter);
        self
    }

    pub fn with_kill_on_timeout(mut self, kill_on_timeout: bool) -> Self {
        self.kill_on_timeout = kill_on_timeout;
        self
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        RunOptions {
            timeout: None,
            log_output: true,
            log_level_classifier: Arc::new(|_| LogLevel::Normal),
            output_filter: Arc::new(|line| line.to_string()),
            kill_on_timeout: true,
        }
    }
}

impl fmt::Debug for RunOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunOptions")
            .field("timeout", &self.timeout)
            .field("log_output", &self.log_output)
            .field("kill_on_timeout", &self.kill_on_timeout)
            .finish_non_exhaustive()
    }
}

/// Runs one executable with captured output
#[derive(Clone)]
pub struct ToolRunner {
    tool_path: PathBuf,
    launcher: Arc<dyn ProcessLauncher>,
}

impl ToolRunner {
    /// Runner for `tool_path`, resolved through `PATH` when not absolute
    pub fn new(tool_path: impl Into<PathBuf>) -> Self {
        Self::with_launcher(tool_path, Arc::new(SystemLauncher))
    }

    pub fn with_launcher(tool_path: impl Into<PathBuf>, launcher: Arc<dyn ProcessLauncher>) -> Self {
        ToolRunner {
            tool_path: tool_path.into(),
            launcher,
        }
    }

    pub fn tool_path(&self) -> &Path {
        &self.tool_path
    }

    /// Run the tool to completion and return every captured line.
    ///
    /// # Returns
    /// * `Ok(lines)` - stdout and stderr lines in arrival order
    /// * `Err(WorkingDirectoryMissing)` - before anything is started
    /// * `Err(Spawn)` - the OS refused to start the tool
    /// * `Err(Timeout)` - the tool outlived `options.timeout`
    pub fn run<I, S>(
        &self,
        args: I,
        working_dir: Option<&Path>,
        options: &RunOptions,
    ) -> Result<Vec<OutputLine>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut handle = self.start(args, working_dir, options)?;
        handle.wait_for_exit()?;
        Ok(handle.into_output())
    }

    /// Start the tool and return without waiting
    pub fn start<I, S>(
        &self,
        args: I,
        working_dir: Option<&Path>,
        options: &RunOptions,
    ) -> Result<ProcessHandle>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new(&self.tool_path);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = working_dir.filter(|dir| !dir.as_os_str().is_empty()) {
            if !dir.is_dir() {
                return Err(AutoVersionError::WorkingDirectoryMissing(dir.to_path_buf()));
            }
            command.current_dir(dir);
        }

        let tool = self.tool_name();
        log::debug!("Starting {:?}", command);

        let mut child = self
            .launcher
            .launch(&mut command)
            .map_err(|source| AutoVersionError::Spawn {
                tool: tool.clone(),
                source,
            })?;

        let (stdout, stderr) = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => (stdout, stderr),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(AutoVersionError::process(format!(
                    "{} was started without piped output",
                    tool
                )));
            }
        };

        let output = Arc::new(OutputBuffer::new(2));
        let logger = options.log_output.then(|| LineLogger::from_options(options));

        let readers = [
            spawn_reader(&tool, stdout, OutputStream::Standard, &output, logger.clone()),
            spawn_reader(&tool, stderr, OutputStream::Error, &output, logger),
        ];

        let mut started = Vec::with_capacity(readers.len());
        for reader in readers {
            match reader {
                Ok(reader) => started.push(reader),
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    output.close();
                    return Err(e.into());
                }
            }
        }

        Ok(ProcessHandle::new(
            tool,
            child,
            output,
            started,
            options.timeout,
            options.kill_on_timeout,
        ))
    }

    fn tool_name(&self) -> String {
        self.tool_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.tool_path.display().to_string())
    }
}

impl fmt::Debug for ToolRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolRunner")
            .field("tool_path", &self.tool_path)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct LineLogger {
    classifier: LogLevelClassifier,
    filter: OutputFilter,
}

impl LineLogger {
    fn from_options(options: &RunOptions) -> Self {
        LineLogger {
            classifier: Arc::clone(&options.log_level_classifier),
            filter: Arc::clone(&options.output_filter),
        }
    }

    fn log(&self, stream: OutputStream, line: &str) {
        let level = match stream {
            OutputStream::Standard => (self.classifier)(line).into(),
            OutputStream::Error => log::Level::Error,
        };
        log::log!(level, "{}", (self.filter)(line));
    }
}

fn spawn_reader<R>(
    tool: &str,
    source: R,
    stream: OutputStream,
    output: &Arc<OutputBuffer>,
    logger: Option<LineLogger>,
) -> std::io::Result<JoinHandle<()>>
where
    R: Read + Send + 'static,
{
    let output = Arc::clone(output);
    let tool = tool.to_string();

    thread::Builder::new()
        .name(format!("{}-{}", tool, stream))
        .spawn(move || {
            let mut reader = BufReader::new(source);
            let mut raw = Vec::new();
            loop {
                raw.clear();
                match reader.read_until(b'\n', &mut raw) {
                    Ok(0) => break,
                    Ok(_) => {
                        let text = decode_line(&raw);
                        if let Some(logger) = &logger {
                            logger.log(stream, &text);
                        }
                        output.push(OutputLine::new(text, stream));
                    }
                    Err(e) => {
                        log::debug!("reading {} of {} failed: {}", stream, tool, e);
                        break;
                    }
                }
            }
            output.finish_writer();
        })
}

fn decode_line(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_line_strips_terminators() {
        assert_eq!(decode_line(b"hello\n"), "hello");
        assert_eq!(decode_line(b"hello\r\n"), "hello");
        assert_eq!(decode_line(b"no newline"), "no newline");
        assert_eq!(decode_line(b"\n"), "");
    }

    #[test]
    fn test_decode_line_is_lossy() {
        assert_eq!(decode_line(b"caf\xff\n"), "caf\u{fffd}");
    }

    #[test]
    fn test_log_level_mapping() {
        assert_eq!(log::Level::from(LogLevel::Trace), log::Level::Trace);
        assert_eq!(log::Level::from(LogLevel::Normal), log::Level::Info);
        assert_eq!(log::Level::from(LogLevel::Warning), log::Level::Warn);
        assert_eq!(log::Level::from(LogLevel::Error), log::Level::Error);
    }

    #[test]
    fn test_default_options() {
        let options = RunOptions::default();
        assert!(options.timeout.is_none());
        assert!(options.log_output);
        assert!(options.kill_on_timeout);
        assert_eq!((options.log_level_classifier)("anything"), LogLevel::Normal);
        assert_eq!((options.output_filter)("as is"), "as is");
    }

    #[test]
    fn test_builder_overrides() {
        let options = RunOptions::new()
            .with_timeout(Duration::from_secs(3))
            .with_log_output(false)
            .with_kill_on_timeout(false)
            .with_classifier(|_| LogLevel::Trace)
            .with_filter(|line| line.to_uppercase());

        assert_eq!(options.timeout, Some(Duration::from_secs(3)));
        assert!(!options.log_output);
        assert!(!options.kill_on_timeout);
        assert_eq!((options.log_level_classifier)("x"), LogLevel::Trace);
        assert_eq!((options.output_filter)("abc"), "ABC");
    }

    #[test]
    fn test_output_stream_display() {
        assert_eq!(OutputStream::Standard.to_string(), "stdout");
        assert_eq!(OutputStream::Error.to_string(), "stderr");
    }

    #[test]
    fn test_tool_name_from_path() {
        assert_eq!(ToolRunner::new("/usr/bin/git").tool_name(), "git");
        assert_eq!(ToolRunner::new("git").tool_name(), "git");
    }

    #[cfg(unix)]
    #[test]
    fn test_run_captures_stdout() {
        let runner = ToolRunner::new("sh");
        let lines = runner
            .run(["-c", "echo one; echo two"], None, &RunOptions::default())
            .unwrap();
        let texts: Vec<&str> = lines.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "two"]);
        assert!(lines.iter().all(|l| l.stream == OutputStream::Standard));
    }

    #[test]
    fn test_missing_tool_is_spawn_error() {
        let runner = ToolRunner::new("git-autoversion-no-such-tool");
        let err = runner
            .run(Vec::<&str>::new(), None, &RunOptions::default())
            .unwrap_err();
        assert!(matches!(err, AutoVersionError::Spawn { .. }));
    }
}
