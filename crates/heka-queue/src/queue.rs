//! Per-destination durable append-only queue.

use crate::config::{CapacityPolicy, QueueConfig};
use crate::cursor::{read_checkpoint, recover_last_segment, write_checkpoint, Cursor};
use crate::error::QueueError;
use crate::segment::{list_segment_ids, segment_path};
use bytes::Bytes;
use heka_core::framing::{decode_frame, encode_frame};
use std::collections::HashMap;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::{Mutex, Notify};

/// One undelivered record pulled off the queue, with the cursor its
/// acknowledgment should advance the checkpoint to.
#[derive(Debug, Clone)]
pub struct QueuedRecord {
    pub cursor_token: String,
    pub payload: Bytes,
}

struct Segments {
    /// Segment id currently open for writing.
    write_id: u64,
    write_offset: u64,
    write_file: File,
    /// Approximate on-disk footprint across every segment, used for the
    /// capacity cap.
    total_bytes: u64,
    sizes: HashMap<u64, u64>,
}

pub struct DurableQueue {
    dir: std::path::PathBuf,
    config: QueueConfig,
    segments: Mutex<Segments>,
    ack_cursor: Mutex<Cursor>,
    space_freed: Notify,
}

impl DurableQueue {
    /// Open (or create) the queue directory, recovering a torn trailing
    /// write from a prior crash, then resuming from the last checkpoint.
    pub async fn open(config: QueueConfig) -> Result<Self, QueueError> {
        fs::create_dir_all(&config.dir).await?;
        let mut ids = list_segment_ids(&config.dir)?;
        let write_id = if let Some(&last) = ids.last() {
            recover_last_segment(&config.dir, last).await?;
            last
        } else {
            ids.push(0);
            0
        };

        let mut sizes = HashMap::new();
        let mut total_bytes = 0u64;
        for id in &ids {
            let meta = fs::metadata(segment_path(&config.dir, *id)).await;
            let len = match meta {
                Ok(m) => m.len(),
                Err(_) => 0,
            };
            sizes.insert(*id, len);
            total_bytes += len;
        }

        let write_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(segment_path(&config.dir, write_id))
            .await?;
        let write_offset = *sizes.get(&write_id).unwrap_or(&0);

        let ack_cursor = read_checkpoint(&config.dir).await?;

        Ok(DurableQueue {
            dir: config.dir.clone(),
            config,
            segments: Mutex::new(Segments {
                write_id,
                write_offset,
                write_file,
                total_bytes,
                sizes,
            }),
            ack_cursor: Mutex::new(ack_cursor),
            space_freed: Notify::new(),
        })
    }

    /// Append `payload` to the queue. Blocks under `CapacityPolicy::Backpressure`
    /// until pruning frees enough space; under `CapacityPolicy::DropOldest`,
    /// discards the oldest segment (even if unacked) to make room instead.
    pub async fn enqueue(&self, payload: &[u8]) -> Result<(), QueueError> {
        loop {
            {
                let segments = self.segments.lock().await;
                if segments.total_bytes < self.config.max_total_bytes {
                    break;
                }
            }
            match self.config.capacity_policy {
                CapacityPolicy::Backpressure => {
                    self.space_freed.notified().await;
                }
                CapacityPolicy::DropOldest => {
                    if !self.drop_oldest_segment().await? {
                        // Nothing left to drop (only the live write segment
                        // remains); accept the write over cap rather than stall.
                        break;
                    }
                }
            }
        }

        let frame = encode_frame(payload, None)?;
        let mut segments = self.segments.lock().await;
        segments.write_file.write_all(&frame).await?;
        segments.write_file.sync_data().await?;
        segments.write_offset += frame.len() as u64;
        segments.total_bytes += frame.len() as u64;
        *segments.sizes.entry(segments.write_id).or_insert(0) += frame.len() as u64;

        if segments.write_offset >= self.config.max_segment_bytes {
            let next_id = segments.write_id + 1;
            let next_file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(segment_path(&self.dir, next_id))
                .await?;
            segments.write_file = next_file;
            segments.write_id = next_id;
            segments.write_offset = 0;
            segments.sizes.insert(next_id, 0);
        }
        Ok(())
    }

    /// Read the record at the current checkpoint without advancing it. Calling
    /// this again before [`DurableQueue::ack`] re-delivers the same record.
    pub async fn dequeue(&self) -> Result<Option<QueuedRecord>, QueueError> {
        let cursor = *self.ack_cursor.lock().await;
        let write_id = self.segments.lock().await.write_id;

        let mut segment_id = cursor.segment_id;
        let mut offset = cursor.offset;
        loop {
            let path = segment_path(&self.dir, segment_id);
            let mut buf = Vec::new();
            match File::open(&path).await {
                Ok(mut f) => {
                    f.read_to_end(&mut buf).await?;
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    return Ok(None);
                }
                Err(e) => return Err(e.into()),
            }
            if (offset as usize) < buf.len() {
                return match decode_frame(&buf[offset as usize..])? {
                    Some((consumed, frame)) => Ok(Some(QueuedRecord {
                        cursor_token: Cursor {
                            segment_id,
                            offset: offset + consumed as u64,
                        }
                        .to_token(),
                        payload: Bytes::copy_from_slice(frame.payload),
                    })),
                    None => Ok(None),
                };
            }
            if segment_id == write_id {
                return Ok(None);
            }
            segment_id += 1;
            offset = 0;
        }
    }

    /// Advance the checkpoint past an acknowledged record and fsync it, then
    /// prune any segment fully behind the new checkpoint.
    pub async fn ack(&self, cursor_token: &str) -> Result<(), QueueError> {
        let cursor = Cursor::parse(cursor_token)?;
        {
            let mut ack_cursor = self.ack_cursor.lock().await;
            *ack_cursor = cursor;
        }
        write_checkpoint(&self.dir, cursor).await?;
        self.prune_acked_segments(cursor.segment_id).await?;
        Ok(())
    }

    async fn prune_acked_segments(&self, ack_segment_id: u64) -> Result<(), QueueError> {
        let mut segments = self.segments.lock().await;
        let stale: Vec<u64> = segments
            .sizes
            .keys()
            .copied()
            .filter(|id| *id < ack_segment_id && *id != segments.write_id)
            .collect();
        for id in stale {
            let path = segment_path(&self.dir, id);
            if fs::remove_file(&path).await.is_ok() {
                if let Some(size) = segments.sizes.remove(&id) {
                    segments.total_bytes = segments.total_bytes.saturating_sub(size);
                }
            }
        }
        drop(segments);
        self.space_freed.notify_waiters();
        Ok(())
    }

    /// Deletes the lowest-numbered non-write segment to reclaim space under
    /// `DropOldest`, advancing the checkpoint past any data it held. Returns
    /// `false` if no segment besides the live write segment remains.
    async fn drop_oldest_segment(&self) -> Result<bool, QueueError> {
        let mut segments = self.segments.lock().await;
        let oldest = segments
            .sizes
            .keys()
            .copied()
            .filter(|id| *id != segments.write_id)
            .min();
        let Some(oldest) = oldest else {
            return Ok(false);
        };
        let path = segment_path(&self.dir, oldest);
        fs::remove_file(&path).await.ok();
        if let Some(size) = segments.sizes.remove(&oldest) {
            segments.total_bytes = segments.total_bytes.saturating_sub(size);
        }
        drop(segments);

        let mut ack_cursor = self.ack_cursor.lock().await;
        if ack_cursor.segment_id <= oldest {
            let advanced = Cursor {
                segment_id: oldest + 1,
                offset: 0,
            };
            *ack_cursor = advanced;
            write_checkpoint(&self.dir, advanced).await?;
            tracing::warn!(
                segment = oldest,
                "dropped unacked segment under DropOldest capacity policy"
            );
        }
        Ok(true)
    }

    pub async fn total_bytes(&self) -> u64 {
        self.segments.lock().await.total_bytes
    }
}
