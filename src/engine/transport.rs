//! Transports that carry requests to a native engine.

use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use super::protocol::{Envelope, Request};

/// A synchronous request/response channel to a native engine.
pub trait EngineTransport {
    /// Send one request and wait for its envelope.
    fn call(&mut self, request: &Request) -> io::Result<Envelope>;

    /// Human-readable description of where the engine lives.
    fn describe(&self) -> String;
}

/// Newline-delimited JSON over any reader/writer pair.
pub struct LineTransport<R, W> {
    reader: R,
    writer: W,
    line: String,
}

impl<R: BufRead, W: Write> LineTransport<R, W> {
    /// Wrap a reader and writer.
    pub fn new(reader: R, writer: W) -> Self {
        LineTransport {
            reader,
            writer,
            line: String::new(),
        }
    }

    /// Give back the underlying streams.
    pub fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }

    fn exchange(&mut self, request: &Request) -> io::Result<Envelope> {
        let encoded = serde_json::to_string(request)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        self.writer.write_all(encoded.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        // Blocks until the engine answers; there is no read deadline.
        self.line.clear();
        let read = self.reader.read_line(&mut self.line)?;
        if read == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "engine closed its output",
            ));
        }

        serde_json::from_str(self.line.trim_end())
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl<R: BufRead, W: Write> EngineTransport for LineTransport<R, W> {
    fn call(&mut self, request: &Request) -> io::Result<Envelope> {
        self.exchange(request)
    }

    fn describe(&self) -> String {
        "line transport".to_string()
    }
}

/// An engine running as a child process, spoken to over its stdio.
pub struct ProcessTransport {
    path: PathBuf,
    child: Child,
    lines: LineTransport<BufReader<ChildStdout>, ChildStdin>,
}

impl ProcessTransport {
    /// Spawn the engine executable at `path`.
    pub fn spawn(path: &Path, args: &[String]) -> io::Result<Self> {
        let mut child = Command::new(path)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take();
        let (stdin, stdout) = match (stdin, stdout) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(io::Error::other("engine stdio was not captured"));
            }
        };

        tracing::debug!("spawned native engine {} (pid {})", path.display(), child.id());

        Ok(ProcessTransport {
            path: path.to_path_buf(),
            child,
            lines: LineTransport::new(BufReader::new(stdout), stdin),
        })
    }

    /// Path of the running engine executable.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EngineTransport for ProcessTransport {
    fn call(&mut self, request: &Request) -> io::Result<Envelope> {
        self.lines.exchange(request)
    }

    fn describe(&self) -> String {
        format!("process {}", self.path.display())
    }
}

impl Drop for ProcessTransport {
    fn drop(&mut self) {
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
