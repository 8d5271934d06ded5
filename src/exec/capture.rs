// src/exec/capture.rs

//! Output capture: turn a child's raw byte stream into log lines.
//!
//! One [`OutputCapture`] exists per stream (stdout, stderr) per child
//! invocation. Each owns a reader task that splits its stream on `\n` and
//! forwards every complete line, tagged with the executable path, to a
//! [`LineSink`]. A trailing partial line is forwarded once the stream hits
//! EOF. The two captures of one child are independent, so stdout and stderr
//! lines are only ordered within their own stream.

use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, DuplexStream};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::types::OutputStream;

/// Buffer size of the in-memory pipe behind [`OutputCapture::writer`].
const WRITER_PIPE_CAPACITY: usize = 8 * 1024;

/// Destination for captured child output.
///
/// Ordering is only guaranteed per `(exe, stream)`.
pub trait LineSink: Send + Sync + Debug {
    fn line(&self, exe: &Path, stream: OutputStream, line: &str);
}

/// Production sink: every line becomes an `info` event.
#[derive(Debug, Clone, Default)]
pub struct TracingLineSink;

impl LineSink for TracingLineSink {
    fn line(&self, exe: &Path, stream: OutputStream, line: &str) {
        info!(exe = %exe.display(), %stream, "{line}");
    }
}

/// A running line reader attached to one stream of one child.
#[derive(Debug)]
pub struct OutputCapture {
    exe: PathBuf,
    stream: OutputStream,
    reader: JoinHandle<u64>,
}

impl OutputCapture {
    /// Start forwarding lines read from `source`.
    pub fn attach<R>(
        exe: impl Into<PathBuf>,
        stream: OutputStream,
        source: R,
        sink: Arc<dyn LineSink>,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let exe = exe.into();
        let reader = tokio::spawn(forward_lines(source, exe.clone(), stream, sink));
        Self {
            exe,
            stream,
            reader,
        }
    }

    /// Create a capture that is fed by writing into the returned pipe.
    ///
    /// Dropping (or shutting down) the writer ends the stream; call
    /// [`OutputCapture::close`] afterwards to flush the last partial line.
    pub fn writer(
        exe: impl Into<PathBuf>,
        stream: OutputStream,
        sink: Arc<dyn LineSink>,
    ) -> (DuplexStream, Self) {
        let (write_half, read_half) = tokio::io::duplex(WRITER_PIPE_CAPACITY);
        (write_half, Self::attach(exe, stream, read_half, sink))
    }

    /// Wait for the reader to drain the stream and stop.
    ///
    /// Returns the number of lines forwarded. If the stream is still open
    /// after `grace` (for instance a grandchild inherited the pipe), the
    /// reader is aborted and whatever it had not forwarded yet is lost.
    pub async fn close(mut self, grace: Duration) -> u64 {
        match tokio::time::timeout(grace, &mut self.reader).await {
            Ok(Ok(lines)) => lines,
            Ok(Err(err)) => {
                debug!(
                    exe = %self.exe.display(),
                    stream = %self.stream,
                    error = %err,
                    "output reader task failed"
                );
                0
            }
            Err(_) => {
                debug!(
                    exe = %self.exe.display(),
                    stream = %self.stream,
                    "output stream still open after child exit; abandoning reader"
                );
                self.reader.abort();
                0
            }
        }
    }
}

async fn forward_lines<R>(
    source: R,
    exe: PathBuf,
    stream: OutputStream,
    sink: Arc<dyn LineSink>,
) -> u64
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(source);
    let mut buf = Vec::new();
    let mut forwarded = 0;

    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(strip_line_ending(&buf));
                sink.line(&exe, stream, &line);
                forwarded += 1;
            }
            Err(err) => {
                debug!(exe = %exe.display(), %stream, error = %err, "error reading child output");
                break;
            }
        }
    }

    forwarded
}

fn strip_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
