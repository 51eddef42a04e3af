//! Owns an input's byte stream: pulls records through a [`StreamContext`],
//! hands decoded packs to the router, and forwards cursor updates to the
//! input's checkpoint writer.

use crate::stats::RunnerStats;
use crate::state::RunnerState;
use crate::stream_context::StreamContext;
use heka_core::pack::PackPool;
use heka_decoder::Decoder;
use heka_router::Router;
use heka_splitter::{SplitError, Splitter};
use tokio::io::AsyncRead;
use tokio::sync::mpsc;
use tracing::warn;

pub struct InputRunner {
    name: String,
    pub state: RunnerState,
    pub stats: RunnerStats,
}

impl InputRunner {
    pub fn new(name: impl Into<String>) -> Self {
        InputRunner {
            name: name.into(),
            state: RunnerState::default(),
            stats: RunnerStats::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Drive one pass over `reader` until end-of-stream. Per-record failures
    /// (oversized records, malformed frames, decode failures) are logged and
    /// the offending pack is recycled without aborting the stream; only a
    /// transport-level I/O failure is propagated, so the caller's restart
    /// supervision can back off and retry the whole stream.
    pub async fn run_stream<S, D, R>(
        &self,
        ctx: &mut StreamContext<S, D>,
        mut reader: R,
        pool: &PackPool,
        router: &Router,
        cursor_tx: Option<&mpsc::UnboundedSender<String>>,
    ) -> anyhow::Result<()>
    where
        S: Splitter,
        D: Decoder,
        R: AsyncRead + Unpin + Send,
    {
        let mut consumed_total: u64 = 0;
        loop {
            match ctx.splitter.read_record(&mut reader).await {
                Ok(record) => {
                    consumed_total += record.consumed as u64;
                    let mut pack = pool.acquire().await;
                    if ctx.use_message_bytes {
                        pack.message_mut().set_msg_bytes(record.bytes);
                    } else {
                        pack.message_mut().payload =
                            String::from_utf8_lossy(&record.bytes).into_owned();
                    }
                    let cursor_token = consumed_total.to_string();
                    pack.set_cursor(cursor_token.clone());
                    if let Some(tx) = cursor_tx {
                        let _ = tx.send(cursor_token);
                    }

                    match ctx.decoder.decode(pack, pool).await {
                        Ok(packs) => {
                            for p in packs {
                                router.route(p).await?;
                                self.stats.record_success();
                            }
                        }
                        Err(failure) => {
                            warn!(
                                input = %self.name,
                                error = %failure.error,
                                "decode failed, recycling pack"
                            );
                            self.stats.record_failure();
                            failure.pack.recycle();
                        }
                    }
                }
                Err(SplitError::EndOfStream) => return Ok(()),
                Err(err @ SplitError::RecordTooLarge) => {
                    warn!(input = %self.name, %err, "oversized record dropped");
                    self.stats.record_failure();
                }
                Err(err @ SplitError::Framing(_)) => {
                    warn!(input = %self.name, %err, "malformed frame dropped");
                    self.stats.record_failure();
                }
                Err(err) => {
                    return Err(err.into());
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heka_core::pack::PackPool;
    use heka_decoder::{DecodeFailure, Decoder as _};
    use heka_router::{Sink, Subscription};
    use heka_splitter::{SplitOptions, TokenSplitter};
    use std::io::Cursor as IoCursor;

    struct IdentityDecoder;
    #[async_trait::async_trait]
    impl Decoder for IdentityDecoder {
        async fn decode(
            &mut self,
            pack: heka_core::pack::OwnedPack,
            _pool: &PackPool,
        ) -> Result<Vec<heka_core::pack::OwnedPack>, DecodeFailure> {
            Ok(vec![pack])
        }
    }

    #[tokio::test]
    async fn processes_every_record_and_routes_it() {
        let pool = PackPool::new(4);
        let (tx, mut rx) = mpsc::channel(8);
        let router = Router::new(vec![Subscription::new(
            "catch-all",
            heka_matcher::Specification::compile("TRUE").unwrap(),
            Sink::Inbox(tx),
        )]);

        let mut ctx = StreamContext::new(TokenSplitter::newline(SplitOptions::default()), IdentityDecoder, false);
        let reader = IoCursor::new(b"one\ntwo\n".to_vec());
        let runner = InputRunner::new("test-input");
        runner
            .run_stream(&mut ctx, reader, &pool, &router, None)
            .await
            .unwrap();

        let r1 = rx.recv().await.unwrap();
        assert_eq!(r1.message().payload, "one\n");
        r1.release();
        let r2 = rx.recv().await.unwrap();
        assert_eq!(r2.message().payload, "two\n");
        r2.release();
        assert_eq!(runner.stats.processed(), 2);
    }

    #[tokio::test]
    async fn forwards_cursor_updates() {
        let pool = PackPool::new(4);
        let router = Router::new(vec![]);
        let (cursor_tx, mut cursor_rx) = mpsc::unbounded_channel();

        let mut ctx = StreamContext::new(TokenSplitter::newline(SplitOptions::default()), IdentityDecoder, false);
        let reader = IoCursor::new(b"a\nb\n".to_vec());
        let runner = InputRunner::new("test-input");
        runner
            .run_stream(&mut ctx, reader, &pool, &router, Some(&cursor_tx))
            .await
            .unwrap();

        assert_eq!(cursor_rx.recv().await.unwrap(), "2");
        assert_eq!(cursor_rx.recv().await.unwrap(), "4");
    }

    #[tokio::test]
    async fn scenario_s3_restart_redelivers_only_the_unacknowledged_tail() {
        let pool = PackPool::new(4);
        let router = Router::new(vec![]);

        // Pre-crash: the stream only ever offered "L1\nL2\n" before the
        // process died, and L2 was the last record acknowledged.
        let (cursor_tx, mut cursor_rx) = mpsc::unbounded_channel();
        let mut ctx = StreamContext::new(
            TokenSplitter::newline(SplitOptions::default()),
            IdentityDecoder,
            false,
        );
        let runner = InputRunner::new("tailer");
        runner
            .run_stream(
                &mut ctx,
                IoCursor::new(b"L1\nL2\n".to_vec()),
                &pool,
                &router,
                Some(&cursor_tx),
            )
            .await
            .unwrap();
        assert_eq!(cursor_rx.recv().await.unwrap(), "3");
        let checkpoint: u64 = cursor_rx.recv().await.unwrap().parse().unwrap();
        assert_eq!(checkpoint, 6);

        // Restart: resume from the byte offset of the last acknowledged
        // record. Only the bytes past the checkpoint are ever read, so only
        // L3 is re-delivered, never L1 or L2 again.
        let (tx, mut rx) = mpsc::channel(8);
        let post_restart_router = Router::new(vec![Subscription::new(
            "catch-all",
            heka_matcher::Specification::compile("TRUE").unwrap(),
            Sink::Inbox(tx),
        )]);
        let mut ctx = StreamContext::new(
            TokenSplitter::newline(SplitOptions::default()),
            IdentityDecoder,
            false,
        );
        let full_source = b"L1\nL2\nL3\n".to_vec();
        let remaining = full_source[checkpoint as usize..].to_vec();
        let (cursor_tx2, mut cursor_rx2) = mpsc::unbounded_channel();
        runner
            .run_stream(
                &mut ctx,
                IoCursor::new(remaining),
                &pool,
                &post_restart_router,
                Some(&cursor_tx2),
            )
            .await
            .unwrap();

        let only_record = rx.recv().await.unwrap();
        assert_eq!(only_record.message().payload, "L3\n");
        only_record.release();
        assert!(rx.try_recv().is_err());
        assert_eq!(cursor_rx2.recv().await.unwrap(), "3");
        assert!(cursor_rx2.try_recv().is_err());
    }
}
