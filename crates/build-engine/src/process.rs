//! External processes
//!
//! The build driver talks to CMake only through [`ExternalProcess`], so a
//! recording double can stand in for it in tests.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tracing::{info, warn};

/// One command to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInvocation {
    pub program: String,
    pub args: Vec<String>,
    /// Working directory
    pub cwd: PathBuf,
}

impl ProcessInvocation {
    pub fn new(program: impl Into<String>, cwd: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: cwd.into(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

impl fmt::Display for ProcessInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            if arg.contains(char::is_whitespace) {
                write!(f, " \"{}\"", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// What a finished process left behind
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// Exit code; `None` when killed by a signal
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Last `n` lines of stderr
    pub fn stderr_tail(&self, n: usize) -> String {
        let lines: Vec<&str> = self.stderr.lines().collect();
        let start = lines.len().saturating_sub(n);
        lines[start..].join("\n")
    }
}

/// Runs a command to completion
#[allow(async_fn_in_trait)]
pub trait ExternalProcess {
    async fn run(&self, invocation: &ProcessInvocation) -> io::Result<ProcessOutput>;
}

/// Spawns real processes, echoing their output through tracing as it arrives
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemProcess;

impl ExternalProcess for SystemProcess {
    async fn run(&self, invocation: &ProcessInvocation) -> io::Result<ProcessOutput> {
        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&invocation.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        // Both pipes are drained while waiting so a chatty tool cannot block on a full pipe
        let (status, stdout, stderr) = tokio::join!(
            child.wait(),
            drain(stdout, Stream::Stdout),
            drain(stderr, Stream::Stderr),
        );

        Ok(ProcessOutput {
            code: status?.code(),
            stdout: stdout?,
            stderr: stderr?,
        })
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

async fn drain<R: AsyncRead + Unpin>(reader: Option<R>, stream: Stream) -> io::Result<String> {
    let Some(reader) = reader else {
        return Ok(String::new());
    };

    // Tools may print bytes that are not UTF-8; keep reading to EOF regardless
    let mut captured = String::new();
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf).await? == 0 {
            break;
        }
        let raw = buf.strip_suffix(b"\n").unwrap_or(&buf);
        let raw = raw.strip_suffix(b"\r").unwrap_or(raw);
        let line = String::from_utf8_lossy(raw);
        match stream {
            Stream::Stdout => info!(target: "ndk_matrix::tool", "{}", line),
            Stream::Stderr => warn!(target: "ndk_matrix::tool", "{}", line),
        }
        captured.push_str(&line);
        captured.push('\n');
    }
    Ok(captured)
}
