//! Line scanner for one captured output stream.
//!
//! Each scanner copies lines into a [`BufferPair`] and sends the frozen result
//! on the shared sink. Units are reference counted, so a buffer is refilled in
//! place only after the consumer has dropped the unit previously built from
//! it; a unit still held by the consumer is never overwritten.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio::sync::mpsc;

use super::StreamKind;

/// Longest line, in bytes excluding the delimiter, a scanner will deliver.
pub const DEFAULT_MAX_UNIT_LEN: usize = 64 * 1024;

/// Two reusable buffers, alternated on every content unit.
#[derive(Debug, Default)]
pub struct BufferPair {
    slots: [BytesMut; 2],
    next: usize,
}

impl BufferPair {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy `unit` into the next buffer and hand it out as an immutable unit.
    pub fn fill(&mut self, unit: &[u8]) -> Bytes {
        let buf = &mut self.slots[self.next];
        self.next ^= 1;

        buf.clear();
        // Reclaims the previous allocation when its unit has been dropped.
        buf.reserve(unit.len());
        buf.extend_from_slice(unit);
        buf.split().freeze()
    }
}

/// Splits a byte stream into lines.
#[derive(Debug)]
pub struct ContentScanner<R> {
    reader: BufReader<R>,
    stream: StreamKind,
    max_unit_len: usize,
    buffers: BufferPair,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> ContentScanner<R> {
    /// Create a scanner for the given stream.
    #[must_use]
    pub fn new(reader: R, stream: StreamKind) -> Self {
        Self {
            reader: BufReader::new(reader),
            stream,
            max_unit_len: DEFAULT_MAX_UNIT_LEN,
            buffers: BufferPair::new(),
            line: Vec::new(),
        }
    }

    /// Set the longest line the scanner accepts before giving up on the stream.
    #[must_use]
    pub fn max_unit_len(mut self, len: usize) -> Self {
        self.max_unit_len = len;
        self
    }

    /// Read the next line, delimiter stripped.
    ///
    /// Returns `None` at end of input. A read error or a line longer than
    /// the configured maximum also ends the scan.
    pub async fn next_unit(&mut self) -> Option<Bytes> {
        self.line.clear();
        let limit = u64::try_from(self.max_unit_len)
            .unwrap_or(u64::MAX)
            .saturating_add(1);

        match (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.line)
            .await
        {
            Ok(0) => return None,
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(stream = %self.stream, error = %e, "Read error, ending scan");
                return None;
            }
        }

        let mut unit: &[u8] = &self.line;
        if let Some(stripped) = unit.strip_suffix(b"\n") {
            unit = stripped;
        } else if unit.len() > self.max_unit_len {
            tracing::warn!(
                stream = %self.stream,
                max_unit_len = self.max_unit_len,
                "Line exceeds maximum length, ending scan"
            );
            return None;
        }
        if let Some(stripped) = unit.strip_suffix(b"\r") {
            unit = stripped;
        }

        Some(self.buffers.fill(unit))
    }

    /// Forward every line to `sink`, then signal `done` exactly once.
    ///
    /// The sink handle is dropped before signalling so that the barrier's
    /// handle is always the last one alive.
    pub async fn run(mut self, sink: mpsc::Sender<Bytes>, done: mpsc::Sender<StreamKind>) {
        let mut units: usize = 0;
        while let Some(unit) = self.next_unit().await {
            if sink.send(unit).await.is_err() {
                tracing::debug!(stream = %self.stream, "Output consumer dropped, ending scan");
                break;
            }
            units = units.saturating_add(1);
        }
        drop(sink);

        tracing::trace!(stream = %self.stream, units, "Scan finished");
        let _ = done.send(self.stream).await;
    }
}
