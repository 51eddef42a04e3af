//! Pattern-grouping splitter: groups consecutive lines that do NOT match a
//! "new record" pattern onto the preceding record (e.g. stack traces trailing
//! a log line), up to a configurable cap.

use crate::error::SplitError;
use crate::options::SplitOptions;
use crate::splitter::{RecordBytes, Splitter};
use async_trait::async_trait;
use bytes::BytesMut;
use regex::bytes::Regex;
use tokio::io::{AsyncRead, AsyncReadExt};

pub struct PatternGroupingSplitter {
    /// Matches the start of a brand-new record; any line not matching this
    /// is folded into the record currently being accumulated.
    new_record: Regex,
    max_group_size: usize,
    buf: BytesMut,
    opts: SplitOptions,
    eof: bool,
}

impl PatternGroupingSplitter {
    pub fn new(new_record: Regex, max_group_size: usize, opts: SplitOptions) -> Self {
        PatternGroupingSplitter {
            new_record,
            max_group_size: max_group_size.max(1),
            buf: BytesMut::with_capacity(opts.min_buffer_size),
            opts,
            eof: false,
        }
    }

    /// Finds the end of the group starting at the front of `buf`: the offset
    /// of the next line that begins a new record, scanning at most
    /// `max_group_size` lines ahead. Returns `None` if the group is not yet
    /// known to be closed (need more trailing data, and under the cap).
    fn group_end(&self) -> Option<usize> {
        let mut lines_seen = 0usize;
        let mut offset = 0usize;
        let mut first = true;
        loop {
            let newline_at = self.buf[offset..].iter().position(|b| *b == b'\n');
            let line_end = match newline_at {
                Some(rel) => offset + rel + 1,
                None => return None, // incomplete trailing line, need more data
            };
            if !first {
                let line = &self.buf[offset..line_end];
                if self.new_record.is_match(line) {
                    return Some(offset);
                }
                lines_seen += 1;
                if lines_seen >= self.max_group_size {
                    return Some(line_end);
                }
            }
            first = false;
            offset = line_end;
            if offset >= self.buf.len() {
                return None;
            }
        }
    }
}

#[async_trait]
impl Splitter for PatternGroupingSplitter {
    async fn read_record(
        &mut self,
        reader: &mut (dyn AsyncRead + Send + Unpin),
    ) -> Result<RecordBytes, SplitError> {
        loop {
            if !self.buf.is_empty() {
                if let Some(end) = self.group_end() {
                    let record = self.buf.split_to(end);
                    return Ok(RecordBytes {
                        consumed: record.len(),
                        bytes: record.freeze(),
                        truncated: false,
                    });
                }
                if self.eof {
                    if self.opts.deliver_incomplete_final {
                        let record = self.buf.split();
                        return Ok(RecordBytes {
                            consumed: record.len(),
                            bytes: record.freeze(),
                            truncated: false,
                        });
                    }
                    return Err(SplitError::EndOfStream);
                }
            } else if self.eof {
                return Err(SplitError::EndOfStream);
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
                self.eof = true;
                continue;
            }
            self.buf.extend_from_slice(&chunk[..n]);
        }
    }
}
