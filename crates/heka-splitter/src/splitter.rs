use crate::error::SplitError;
use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

/// One delimited record pulled off a byte stream.
#[derive(Debug, Clone)]
pub struct RecordBytes {
    /// Bytes consumed from the stream to produce this record (may exceed
    /// `bytes.len()` when a delimiter or frame envelope was stripped).
    pub consumed: usize,
    pub bytes: Bytes,
    pub truncated: bool,
}

/// Transforms a byte stream into record boundaries.
///
/// A splitter owns whatever buffering it needs across calls; `reader` is only
/// ever read forward. `read_record` returns [`SplitError::EndOfStream`] on a
/// clean EOF with nothing left to deliver — callers must distinguish that from
/// any other `SplitError`, which indicates a transport or framing failure.
#[async_trait]
pub trait Splitter: Send {
    async fn read_record(
        &mut self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<RecordBytes, SplitError>;
}

/// Index of the `n`-th (1-based) occurrence of `byte` in `haystack`, if any.
pub(crate) fn nth_occurrence(haystack: &[u8], byte: u8, n: usize) -> Option<usize> {
    let mut seen = 0;
    for (idx, b) in haystack.iter().enumerate() {
        if *b == byte {
            seen += 1;
            if seen == n {
                return Some(idx);
            }
        }
    }
    None
}
