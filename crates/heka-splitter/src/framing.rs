//! Framing splitter: delimits records using the framed binary wire protocol,
//! optionally requiring a valid HMAC before a record is delivered.

use crate::error::SplitError;
use crate::options::SplitOptions;
use crate::splitter::{RecordBytes, Splitter};
use async_trait::async_trait;
use bytes::{Buf, Bytes, BytesMut};
use heka_core::framing::{self, RECORD_SEPARATOR};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::warn;

/// Counts frames rejected for failing HMAC verification, shared with whoever
/// reports runner statistics.
#[derive(Debug, Default, Clone)]
pub struct AuthFailureCounter(Arc<AtomicU64>);

impl AuthFailureCounter {
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    fn increment(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

pub struct FramingSplitter {
    required_key: Option<Vec<u8>>,
    buf: BytesMut,
    opts: SplitOptions,
    eof: bool,
    auth_failures: AuthFailureCounter,
}

impl FramingSplitter {
    pub fn new(required_key: Option<Vec<u8>>, opts: SplitOptions) -> Self {
        FramingSplitter {
            required_key,
            buf: BytesMut::with_capacity(opts.min_buffer_size),
            opts,
            eof: false,
            auth_failures: AuthFailureCounter::default(),
        }
    }

    pub fn auth_failures(&self) -> AuthFailureCounter {
        self.auth_failures.clone()
    }

    /// Drops bytes up to and including the next record separator, so framing
    /// can attempt to resynchronize after a malformed frame instead of
    /// stalling the stream permanently.
    fn resync(&mut self) {
        if let Some(pos) = self.buf[1..].iter().position(|b| *b == RECORD_SEPARATOR) {
            self.buf.advance(pos + 1);
        } else {
            self.buf.clear();
        }
    }

    fn take_frame(&mut self) -> Result<Option<RecordBytes>, SplitError> {
        loop {
            match framing::decode_frame(&self.buf) {
                Ok(None) => return Ok(None),
                Ok(Some((consumed, frame))) => {
                    if let Some(key) = &self.required_key {
                        if !framing::verify_hmac(&frame, key) {
                            warn!("framing splitter: dropping frame with invalid HMAC");
                            self.auth_failures.increment();
                            self.buf.advance(consumed);
                            continue;
                        }
                    }
                    let payload = Bytes::copy_from_slice(frame.payload);
                    self.buf.advance(consumed);
                    return Ok(Some(RecordBytes {
                        consumed,
                        bytes: payload,
                        truncated: false,
                    }));
                }
                Err(err) => {
                    warn!(%err, "framing splitter: malformed frame, resynchronizing");
                    self.resync();
                    return Err(SplitError::Framing(err));
                }
            }
        }
    }
}

#[async_trait]
impl Splitter for FramingSplitter {
    async fn read_record(
        &mut self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<RecordBytes, SplitError> {
        loop {
            match self.take_frame() {
                Ok(Some(rb)) => return Ok(rb),
                Ok(None) => {}
                Err(e) => return Err(e),
            }

            if self.buf.len() >= self.opts.max_message_size {
                self.buf.clear();
                return Err(SplitError::RecordTooLarge);
            }

            if self.eof {
                return Err(SplitError::EndOfStream);
            }

            let mut chunk = vec![0u8; self.opts.min_buffer_size.max(1)];
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                self.eof = true;
                continue;
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}
