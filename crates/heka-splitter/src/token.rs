//! Token splitter: emits a record at every Nth occurrence of a one-byte
//! delimiter (default: newline, N=1). The delimiter is included as the final
//! byte of the record.

use crate::error::SplitError;
use crate::options::SplitOptions;
use crate::splitter::{nth_occurrence, RecordBytes, Splitter};
use async_trait::async_trait;
use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt};

pub struct TokenSplitter {
    delimiter: u8,
    occurrence: usize,
    buf: BytesMut,
    opts: SplitOptions,
}

impl TokenSplitter {
    pub fn new(delimiter: u8, occurrence: usize, opts: SplitOptions) -> Self {
        TokenSplitter {
            delimiter,
            occurrence: occurrence.max(1),
            buf: BytesMut::with_capacity(opts.min_buffer_size),
            opts,
        }
    }

    pub fn newline(opts: SplitOptions) -> Self {
        Self::new(b'\n', 1, opts)
    }
}

#[async_trait]
impl Splitter for TokenSplitter {
    async fn read_record(
        &mut self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<RecordBytes, SplitError> {
        loop {
            if let Some(idx) = nth_occurrence(&self.buf, self.delimiter, self.occurrence) {
                let record = self.buf.split_to(idx + 1);
                return Ok(RecordBytes {
                    consumed: record.len(),
                    bytes: record.freeze(),
                    truncated: false,
                });
            }

            if self.buf.len() >= self.opts.max_message_size {
                if self.opts.keep_truncated {
                    let record = self.buf.split_to(self.opts.max_message_size);
                    return Ok(RecordBytes {
                        consumed: record.len(),
                        bytes: record.freeze(),
                        truncated: true,
                    });
                }
                self.buf.clear();
                return Err(SplitError::RecordTooLarge);
            }

            let mut chunk = vec![0u8; self.opts.min_buffer_size.max(1)];
            let n = reader.read(&mut chunk).await?;
            if n == 0 {
                if !self.buf.is_empty() && self.opts.deliver_incomplete_final {
                    let record = self.buf.split();
                    return Ok(RecordBytes {
                        consumed: record.len(),
                        bytes: record.freeze(),
                        truncated: false,
                    });
                }
                return Err(SplitError::EndOfStream);
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn splits_on_each_newline_concatenation_equals_source() {
        let source = b"L1\nL2\nL3\n".to_vec();
        let mut reader = Cursor::new(source.clone());
        let mut splitter = TokenSplitter::newline(SplitOptions::default());

        let mut rebuilt = Vec::new();
        loop {
            match splitter.read_record(&mut reader).await {
                Ok(rb) => rebuilt.extend_from_slice(&rb.bytes),
                Err(SplitError::EndOfStream) => break,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(rebuilt, source);
    }

    #[tokio::test]
    async fn delivers_incomplete_final_when_requested() {
        let source = b"L1\nL2".to_vec();
        let mut reader = Cursor::new(source);
        let mut opts = SplitOptions::default();
        opts.deliver_incomplete_final = true;
        let mut splitter = TokenSplitter::newline(opts);

        let r1 = splitter.read_record(&mut reader).await.unwrap();
        assert_eq!(&r1.bytes[..], b"L1\n");
        let r2 = splitter.read_record(&mut reader).await.unwrap();
        assert_eq!(&r2.bytes[..], b"L2");
        assert!(matches!(
            splitter.read_record(&mut reader).await,
            Err(SplitError::EndOfStream)
        ));
    }

    #[tokio::test]
    async fn without_incomplete_final_partial_trailer_is_dropped() {
        let source = b"L1\nL2".to_vec();
        let mut reader = Cursor::new(source);
        let mut splitter = TokenSplitter::newline(SplitOptions::default());

        let r1 = splitter.read_record(&mut reader).await.unwrap();
        assert_eq!(&r1.bytes[..], b"L1\n");
        assert!(matches!(
            splitter.read_record(&mut reader).await,
            Err(SplitError::EndOfStream)
        ));
    }

    #[tokio::test]
    async fn every_nth_occurrence() {
        let source = b"a,b,c,d,e,".to_vec();
        let mut reader = Cursor::new(source);
        let mut splitter = TokenSplitter::new(b',', 2, SplitOptions::default());
        let r1 = splitter.read_record(&mut reader).await.unwrap();
        assert_eq!(&r1.bytes[..], b"a,b,");
        let r2 = splitter.read_record(&mut reader).await.unwrap();
        assert_eq!(&r2.bytes[..], b"c,d,");
    }

    proptest::proptest! {
        // Concatenating every record a splitter emits (with a trailing
        // partial delivered under `deliver_incomplete_final`) reproduces
        // the original stream exactly.
        #[test]
        fn records_concatenate_back_to_the_source(
            lines in proptest::collection::vec("[a-zA-Z0-9 ]{0,24}", 0..16),
            trailer in "[a-zA-Z0-9 ]{0,24}",
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let mut source = Vec::new();
                for line in &lines {
                    source.extend_from_slice(line.as_bytes());
                    source.push(b'\n');
                }
                source.extend_from_slice(trailer.as_bytes());

                let mut reader = Cursor::new(source.clone());
                let mut opts = SplitOptions::default();
                opts.deliver_incomplete_final = true;
                let mut splitter = TokenSplitter::newline(opts);

                let mut rebuilt = Vec::new();
                loop {
                    match splitter.read_record(&mut reader).await {
                        Ok(rb) => rebuilt.extend_from_slice(&rb.bytes),
                        Err(SplitError::EndOfStream) => break,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                proptest::prop_assert_eq!(rebuilt, source);
                Ok(())
            })?;
        }
    }
}
