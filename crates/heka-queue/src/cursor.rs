use crate::error::QueueError;
use crate::segment::{segment_path, CHECKPOINT_FILE};
use std::path::Path;

/// Opaque checkpoint token: `segment-id:offset`, persisted to `checkpoint.txt`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Cursor {
    pub segment_id: u64,
    pub offset: u64,
}

impl Cursor {
    pub const ZERO: Cursor = Cursor {
        segment_id: 0,
        offset: 0,
    };

    pub fn to_token(self) -> String {
        format!("{}:{}", self.segment_id, self.offset)
    }

    pub fn parse(token: &str) -> Result<Self, QueueError> {
        let (seg, off) = token
            .split_once(':')
            .ok_or_else(|| QueueError::MalformedCheckpoint(token.to_string()))?;
        let segment_id = seg
            .parse()
            .map_err(|_| QueueError::MalformedCheckpoint(token.to_string()))?;
        let offset = off
            .parse()
            .map_err(|_| QueueError::MalformedCheckpoint(token.to_string()))?;
        Ok(Cursor { segment_id, offset })
    }
}

pub async fn read_checkpoint(dir: &Path) -> Result<Cursor, QueueError> {
    let path = dir.join(CHECKPOINT_FILE);
    match tokio::fs::read_to_string(&path).await {
        Ok(contents) => Cursor::parse(contents.trim()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Cursor::ZERO),
        Err(e) => Err(e.into()),
    }
}

/// Persist the checkpoint, fsyncing so a crash cannot observe a torn write
/// past what has actually been durably recorded.
pub async fn write_checkpoint(dir: &Path, cursor: Cursor) -> Result<(), QueueError> {
    let path = dir.join(CHECKPOINT_FILE);
    let tmp = dir.join(format!("{CHECKPOINT_FILE}.tmp"));
    let mut file = tokio::fs::File::create(&tmp).await?;
    use tokio::io::AsyncWriteExt;
    file.write_all(cursor.to_token().as_bytes()).await?;
    file.sync_all().await?;
    tokio::fs::rename(&tmp, &path).await?;
    Ok(())
}

/// Truncate `dir`'s highest-numbered segment to the offset of its last fully
/// decodable frame, discarding any torn trailing write left by a crash.
pub async fn recover_last_segment(dir: &Path, segment_id: u64) -> Result<u64, QueueError> {
    let path = segment_path(dir, segment_id);
    let bytes = match tokio::fs::read(&path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut valid_end = 0usize;
    let mut cursor = 0usize;
    loop {
        match heka_core::framing::decode_frame(&bytes[cursor..]) {
            Ok(Some((consumed, _))) => {
                cursor += consumed;
                valid_end = cursor;
            }
            Ok(None) | Err(_) => break,
        }
    }
    if valid_end < bytes.len() {
        tracing::warn!(
            segment = segment_id,
            kept = valid_end,
            discarded = bytes.len() - valid_end,
            "truncating torn segment tail on recovery"
        );
        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .open(&path)
            .await?;
        file.set_len(valid_end as u64).await?;
        file.sync_all().await?;
    }
    Ok(valid_end as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips() {
        let c = Cursor {
            segment_id: 3,
            offset: 128,
        };
        assert_eq!(Cursor::parse(&c.to_token()).unwrap(), c);
    }

    #[test]
    fn malformed_token_is_an_error() {
        assert!(Cursor::parse("not-a-cursor").is_err());
    }

    #[tokio::test]
    async fn missing_checkpoint_defaults_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_checkpoint(dir.path()).await.unwrap(), Cursor::ZERO);
    }

    #[tokio::test]
    async fn checkpoint_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let cursor = Cursor {
            segment_id: 2,
            offset: 64,
        };
        write_checkpoint(dir.path(), cursor).await.unwrap();
        assert_eq!(read_checkpoint(dir.path()).await.unwrap(), cursor);
    }

    #[tokio::test]
    async fn recovery_truncates_torn_trailing_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let mut good = heka_core::framing::encode_frame(b"one", None)
            .unwrap()
            .to_vec();
        good.extend_from_slice(&heka_core::framing::encode_frame(b"two", None).unwrap());
        let valid_len = good.len();

        let mut with_torn_tail = good.clone();
        with_torn_tail.extend_from_slice(b"\x1e\x05xx"); // RS + header-len=5 but only 2 bytes follow
        let path = segment_path(dir.path(), 0);
        tokio::fs::write(&path, &with_torn_tail).await.unwrap();

        let valid = recover_last_segment(dir.path(), 0).await.unwrap();
        assert_eq!(valid as usize, valid_len);
        let recovered = tokio::fs::read(&path).await.unwrap();
        assert_eq!(recovered, good);
    }

    proptest::proptest! {
        // A crash truncating a segment to any byte offset always recovers to
        // a prefix of the pre-crash record sequence, with no torn record left.
        #[test]
        fn recovery_after_crash_at_any_offset_yields_a_clean_prefix(
            payloads in proptest::collection::vec("[a-z0-9]{0,12}", 1..10),
            crash_at_fraction in 0.0f64..1.0,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            rt.block_on(async {
                let dir = tempfile::tempdir().unwrap();
                let mut whole = Vec::new();
                for p in &payloads {
                    whole.extend_from_slice(&heka_core::framing::encode_frame(p.as_bytes(), None).unwrap());
                }
                let crash_offset = ((whole.len() as f64) * crash_at_fraction) as usize;
                let truncated = whole[..crash_offset].to_vec();

                let path = segment_path(dir.path(), 0);
                tokio::fs::write(&path, &truncated).await.unwrap();

                let valid_len = recover_last_segment(dir.path(), 0).await.unwrap() as usize;
                let recovered = tokio::fs::read(&path).await.unwrap();
                proptest::prop_assert_eq!(recovered.len(), valid_len);

                let mut cursor = 0usize;
                let mut recovered_payloads = Vec::new();
                while cursor < recovered.len() {
                    match heka_core::framing::decode_frame(&recovered[cursor..]) {
                        Ok(Some((consumed, frame))) => {
                            recovered_payloads.push(frame.payload.to_vec());
                            cursor += consumed;
                        }
                        other => panic!("recovered segment must contain only whole frames, got {other:?}"),
                    }
                }

                let expected: Vec<Vec<u8>> = payloads
                    .iter()
                    .take(recovered_payloads.len())
                    .map(|p| p.as_bytes().to_vec())
                    .collect();
                proptest::prop_assert_eq!(recovered_payloads, expected);
                Ok(())
            })?;
        }
    }
}
