// src/exec/output.rs

//! Capture of a child's stdout / stderr.
//!
//! A reader task forwards chunks over a channel as they arrive. After the
//! process is gone the supervisor gives the reader a bounded grace period to
//! hit EOF; if it does not (an orphaned helper still holding the pipe, or a
//! huge backlog after a forced kill) whatever arrived so far is kept and the
//! rest is dropped.

use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

const CHUNK_SIZE: usize = 8 * 1024;

/// Bytes captured from one stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub bytes: Vec<u8>,
    /// False if the stream was cut off before EOF.
    pub complete: bool,
}

pub struct StreamCapture {
    name: &'static str,
    rx: mpsc::UnboundedReceiver<Vec<u8>>,
    reader: JoinHandle<()>,
}

impl StreamCapture {
    /// Start draining `stream` in the background. A missing stream captures
    /// nothing.
    pub fn spawn<R>(name: &'static str, stream: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel::<Vec<u8>>();
        let reader = tokio::spawn(async move {
            let Some(mut stream) = stream else {
                return;
            };
            loop {
                let mut buf = vec![0u8; CHUNK_SIZE];
                match stream.read(&mut buf).await {
                    Ok(0) => break,
                    Ok(n) => {
                        buf.truncate(n);
                        if tx.send(buf).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        debug!(stream = name, error = %e, "read error on child stream");
                        break;
                    }
                }
            }
        });
        Self { name, rx, reader }
    }

    /// Wait up to `grace` for EOF, then return everything received.
    pub async fn finish(mut self, grace: Duration) -> Captured {
        let complete = tokio::time::timeout(grace, &mut self.reader).await.is_ok();
        if !complete {
            warn!(
                stream = self.name,
                grace_ms = grace.as_millis() as u64,
                "stream did not reach EOF within grace period; keeping partial output"
            );
            self.reader.abort();
        }

        let mut bytes = Vec::new();
        while let Ok(chunk) = self.rx.try_recv() {
            bytes.extend_from_slice(&chunk);
        }
        Captured { bytes, complete }
    }
}
