//! The output sink shared by both content scanners of a run.
//!
//! A sink is created as a pair: the [`OutputSink`] half is handed to
//! [`SubProcess::run`](crate::subprocess::SubProcess::run) and the
//! [`OutputStream`] half is drained by the caller. The sink half cannot be
//! cloned outside this crate, so once it is moved into a run the barrier task
//! holds the last sender and dropping it is the one and only close.

use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use tokio::sync::mpsc;

/// Default number of in-flight content units between the scanners and the consumer.
pub const DEFAULT_CHANNEL_BUFFER: usize = 64;

/// Create a fresh sink/stream pair with the given transport capacity.
///
/// A capacity of zero is raised to one.
#[must_use]
pub fn output_channel(capacity: usize) -> (OutputSink, OutputStream) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (OutputSink { tx }, OutputStream { rx })
}

/// Sending half of the output sink.
#[derive(Debug)]
pub struct OutputSink {
    tx: mpsc::Sender<Bytes>,
}

impl OutputSink {
    /// A producer handle for one content scanner.
    pub(crate) fn producer(&self) -> mpsc::Sender<Bytes> {
        self.tx.clone()
    }

    /// Close the sink. Consumers see the end of the stream once every
    /// producer handle has also been dropped.
    pub(crate) fn close(self) {
        drop(self.tx);
    }

    /// Whether the consumer has gone away.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Receiving half of the output sink.
///
/// Yields one [`Bytes`] per line of combined stdout/stderr output, with the
/// line delimiter stripped. Returns `None` once the process has finished and
/// both streams are drained.
#[derive(Debug)]
pub struct OutputStream {
    rx: mpsc::Receiver<Bytes>,
}

impl OutputStream {
    /// Receive the next content unit.
    pub async fn recv(&mut self) -> Option<Bytes> {
        self.rx.recv().await
    }

    /// Drain the stream to completion, collecting every unit.
    pub async fn collect_all(mut self) -> Vec<Bytes> {
        let mut units = Vec::new();
        while let Some(unit) = self.rx.recv().await {
            units.push(unit);
        }
        units
    }
}

impl futures_core::Stream for OutputStream {
    type Item = Bytes;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}
