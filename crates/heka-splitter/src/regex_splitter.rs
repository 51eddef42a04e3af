//! Regex splitter: record boundaries are delimiters matched by a regular
//! expression rather than a single byte.

use crate::error::SplitError;
use crate::options::SplitOptions;
use crate::splitter::{RecordBytes, Splitter};
use async_trait::async_trait;
use bytes::BytesMut;
use regex::bytes::Regex;
use tokio::io::{AsyncRead, AsyncReadExt};

/// Where the matched delimiter text ends up relative to the record it splits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DelimiterLocation {
    /// Delimiter is the tail of the record that precedes it (default).
    End,
    /// Delimiter becomes the head of the following record.
    Start,
}

pub struct RegexSplitter {
    delimiter: Regex,
    location: DelimiterLocation,
    buf: BytesMut,
    opts: SplitOptions,
    eof: bool,
}

impl RegexSplitter {
    pub fn new(delimiter: Regex, location: DelimiterLocation, opts: SplitOptions) -> Self {
        RegexSplitter {
            delimiter,
            location,
            buf: BytesMut::with_capacity(opts.min_buffer_size),
            opts,
            eof: false,
        }
    }

    fn take_match(&mut self) -> Option<RecordBytes> {
        let m = self.delimiter.find(&self.buf)?;
        let record_end = match self.location {
            DelimiterLocation::End => m.end(),
            DelimiterLocation::Start => {
                if m.start() > 0 {
                    m.start()
                } else {
                    // Delimiter opens the buffer: this record carries it as a
                    // prefix, so the boundary is the *next* match's start.
                    let next = self.delimiter.find_at(&self.buf, m.end())?;
                    next.start()
                }
            }
        };
        let record = self.buf.split_to(record_end);
        Some(RecordBytes {
            consumed: record.len(),
            bytes: record.freeze(),
            truncated: false,
        })
    }
}

#[async_trait]
impl Splitter for RegexSplitter {
    async fn read_record(
        &mut self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<RecordBytes, SplitError> {
        loop {
            if let Some(rb) = self.take_match() {
                return Ok(rb);
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

            if self.eof {
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[tokio::test]
    async fn splits_on_blank_line_delimiter() {
        let source = b"rec-one\n\nrec-two\n\nrec-three".to_vec();
        let mut reader = Cursor::new(source);
        let delim = Regex::new(r"\n\n").unwrap();
        let mut opts = SplitOptions::default();
        opts.deliver_incomplete_final = true;
        let mut splitter = RegexSplitter::new(delim, DelimiterLocation::End, opts);

        let r1 = splitter.read_record(&mut reader).await.unwrap();
        assert_eq!(&r1.bytes[..], b"rec-one\n\n");
        let r2 = splitter.read_record(&mut reader).await.unwrap();
        assert_eq!(&r2.bytes[..], b"rec-two\n\n");
        let r3 = splitter.read_record(&mut reader).await.unwrap();
        assert_eq!(&r3.bytes[..], b"rec-three");
    }

    #[tokio::test]
    async fn start_location_prepends_delimiter_to_next_record() {
        let source = b"one>two>three".to_vec();
        let mut reader = Cursor::new(source);
        let delim = Regex::new(r">").unwrap();
        let mut opts = SplitOptions::default();
        opts.deliver_incomplete_final = true;
        let mut splitter = RegexSplitter::new(delim, DelimiterLocation::Start, opts);

        let r1 = splitter.read_record(&mut reader).await.unwrap();
        assert_eq!(&r1.bytes[..], b"one");
        let r2 = splitter.read_record(&mut reader).await.unwrap();
        assert_eq!(&r2.bytes[..], b">two");
    }
}
