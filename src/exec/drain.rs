//! Concurrent draining of child output streams.
//!
//! A child process whose stdout or stderr pipe fills up without a reader
//! stalls indefinitely, so each stream gets its own drain task that runs
//! from before the exit wait until the stream closes.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;

/// Line terminator appended after each drained line.
#[cfg(windows)]
const LINE_SEPARATOR: &str = "\r\n";
#[cfg(not(windows))]
const LINE_SEPARATOR: &str = "\n";

/// Drains one child output stream to completion into a growing buffer.
#[derive(Debug)]
pub struct StreamDrainer {
    buffer: Arc<Mutex<String>>,
    handle: JoinHandle<()>,
}

impl StreamDrainer {
    /// Spawn a drain task over the given stream and return immediately.
    pub fn start<R>(stream: R) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buffer = Arc::new(Mutex::new(String::new()));
        let writer = Arc::clone(&buffer);

        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(stream).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let mut buf = writer.lock().expect("drain buffer poisoned");
                        buf.push_str(&line);
                        buf.push_str(LINE_SEPARATOR);
                    }
                    Ok(None) => break,
                    Err(e) => {
                        // The child is being torn down; partial output is
                        // still useful diagnostic text.
                        tracing::debug!(error = %e, "Stream drain ended on read error");
                        break;
                    }
                }
            }
        });

        Self { buffer, handle }
    }

    /// Snapshot of the output accumulated so far.
    ///
    /// Safe to call while the drain is in progress; the snapshot may lag
    /// behind the very latest bytes.
    #[must_use]
    pub fn output(&self) -> String {
        self.buffer.lock().expect("drain buffer poisoned").clone()
    }

    /// Wait for the drain task to observe end-of-stream and return the
    /// final buffer contents.
    ///
    /// If the stream does not close within `grace` the task is aborted
    /// and whatever was captured so far is returned. After this call no
    /// drain task remains and the buffer is frozen.
    pub async fn finish(mut self, grace: Duration) -> String {
        if tokio::time::timeout(grace, &mut self.handle).await.is_err() {
            tracing::debug!("Drain task did not finish within grace period, aborting");
            self.handle.abort();
        }
        let buf = self.buffer.lock().expect("drain buffer poisoned");
        buf.clone()
    }
}
