//! Reusable message carriers drawn from a fixed-size pool.
//!
//! Lifecycle: [`PackPool::acquire`] yields an [`OwnedPack`] with exclusive,
//! mutable access. The router [`OwnedPack::freeze`]s it into a [`PackRef`] with a
//! refcount of `matches + 1`; [`PackRef::fork`] hands out one reference per
//! matching destination, and [`PackRef::release`] returns the underlying storage
//! to the pool exactly once the count reaches zero.

use crate::message::Message;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex as AsyncMutex};

/// Result of a destination's delivery attempt, sent back to the input that
/// requested acknowledgment.
#[derive(Debug, Clone)]
pub enum DeliveryResult {
    Success,
    Recoverable(String),
}

#[derive(Default)]
struct PackData {
    message: Message,
    cursor: Option<String>,
    buffered: bool,
    error_tx: Option<mpsc::UnboundedSender<DeliveryResult>>,
}

struct PoolInner {
    free_tx: mpsc::Sender<Box<PackData>>,
    free_rx: AsyncMutex<mpsc::Receiver<Box<PackData>>>,
    capacity: usize,
}

/// A bounded set of pre-allocated pack storage. Cloning a `PackPool` is cheap
/// (it's a handle, not a copy of the pool).
#[derive(Clone)]
pub struct PackPool(Arc<PoolInner>);

impl PackPool {
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        for _ in 0..capacity {
            tx.try_send(Box::new(PackData::default()))
                .expect("channel was just sized to capacity");
        }
        PackPool(Arc::new(PoolInner {
            free_tx: tx,
            free_rx: AsyncMutex::new(rx),
            capacity,
        }))
    }

    pub fn capacity(&self) -> usize {
        self.0.capacity
    }

    /// Packs currently sitting free in the pool. `free_tx.capacity()` is a
    /// tokio `mpsc::Sender`'s remaining *send* slots, not its queued item
    /// count, so it reports packs in circulation, not packs free — invert it.
    pub fn free_count(&self) -> usize {
        self.0.capacity - self.0.free_tx.capacity()
    }

    /// Packs currently owned by the pipeline (acquired but not yet recycled).
    pub fn in_circulation(&self) -> usize {
        self.0.capacity - self.free_count()
    }

    /// Obtain a pack, blocking while the pool is empty. This is the pipeline's
    /// sole global backpressure mechanism — there is no drop policy
    /// at this layer.
    pub async fn acquire(&self) -> OwnedPack {
        let data = {
            let mut rx = self.0.free_rx.lock().await;
            rx.recv()
                .await
                .expect("pool's own sender keeps the channel open for its lifetime")
        };
        OwnedPack {
            data,
            pool: self.clone(),
        }
    }

    /// Like [`PackPool::acquire`] but never blocks; used by inject pools,
    /// which must not deadlock against a filter's own inbox.
    pub fn try_acquire(&self) -> Option<OwnedPack> {
        let mut rx = self.0.free_rx.try_lock().ok()?;
        let data = rx.try_recv().ok()?;
        Some(OwnedPack {
            data,
            pool: self.clone(),
        })
    }

    fn recycle(&self, mut data: Box<PackData>) {
        data.message.reset();
        data.cursor = None;
        data.buffered = false;
        // Re-created, not merely dropped, to guarantee no stale listener holds a
        // handle to a channel this pack will reuse under a different identity.
        data.error_tx = None;
        if self.0.free_tx.try_send(data).is_err() {
            tracing::error!("pack pool recycle failed: pool is at capacity, invariant violated");
        }
    }
}

/// A pack with exactly one owner, as it moves from the pool through ingress,
/// splitting, and decoding, up to the moment the router hands it off.
pub struct OwnedPack {
    data: Box<PackData>,
    pool: PackPool,
}

impl OwnedPack {
    pub fn message(&self) -> &Message {
        &self.data.message
    }

    pub fn message_mut(&mut self) -> &mut Message {
        &mut self.data.message
    }

    pub fn cursor(&self) -> Option<&str> {
        self.data.cursor.as_deref()
    }

    pub fn set_cursor(&mut self, cursor: impl Into<String>) {
        self.data.cursor = Some(cursor.into());
    }

    pub fn buffered(&self) -> bool {
        self.data.buffered
    }

    pub fn set_buffered(&mut self, buffered: bool) {
        self.data.buffered = buffered;
    }

    /// Register an error-delivery channel; the input uses the receiving end to
    /// learn whether downstream delivery succeeded before advancing its cursor.
    pub fn request_ack(&mut self, tx: mpsc::UnboundedSender<DeliveryResult>) {
        self.data.error_tx = Some(tx);
    }

    /// Recycle directly without going through the router (e.g. a decode failure
    /// with no error sink configured).
    pub fn recycle(self) {
        self.pool.recycle(self.data);
    }

    /// Hand the pack off to the router, fixing its refcount at `extra_refs + 1`
    /// (the `+1` is this returned reference, conventionally the router's own
    /// hold).
    pub fn freeze(self, extra_refs: usize) -> PackRef {
        let inner = Arc::new(FrozenInner {
            data: *self.data,
            refcount: AtomicUsize::new(extra_refs + 1),
            pool: self.pool,
        });
        PackRef(inner)
    }
}

struct FrozenInner {
    data: PackData,
    refcount: AtomicUsize,
    pool: PackPool,
}

/// One logical reference to a pack that has been handed off to the router. Reads
/// are safe from any number of concurrently-held `PackRef`s because the
/// underlying [`Message`] is never mutated after [`OwnedPack::freeze`].
pub struct PackRef(Arc<FrozenInner>);

impl PackRef {
    pub fn message(&self) -> &Message {
        &self.0.data.message
    }

    pub fn cursor(&self) -> Option<&str> {
        self.0.data.cursor.as_deref()
    }

    pub fn buffered(&self) -> bool {
        self.0.data.buffered
    }

    /// Current refcount, exposed for diagnostics and testing.
    pub fn refcount(&self) -> usize {
        self.0.refcount.load(Ordering::Acquire)
    }

    /// Produce one additional logical reference, incrementing the shared
    /// refcount. Used exclusively by the router when fanning out to N matching
    /// destinations.
    pub fn fork(&self) -> PackRef {
        self.0.refcount.fetch_add(1, Ordering::AcqRel);
        PackRef(Arc::clone(&self.0))
    }

    /// Report this destination's delivery outcome on the pack's error-delivery
    /// channel, if the input requested acknowledgment.
    pub fn deliver_result(&self, result: DeliveryResult) {
        if let Some(tx) = &self.0.data.error_tx {
            let _ = tx.send(result);
        }
    }

    /// Release this reference. The pack is cleared and returned to the pool
    /// exactly once, when the last reference is released.
    pub fn release(self) {
        if self.0.refcount.fetch_sub(1, Ordering::AcqRel) == 1 {
            match Arc::try_unwrap(self.0) {
                Ok(inner) => inner.pool.recycle(Box::new(inner.data)),
                Err(_) => {
                    tracing::error!(
                        "pack refcount reached zero while still shared; recycle skipped"
                    );
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::Message;

    #[tokio::test]
    async fn acquire_blocks_when_pool_empty() {
        let pool = PackPool::new(1);
        let pack = pool.acquire().await;
        assert_eq!(pool.free_count(), 0);

        let pool2 = pool.clone();
        let handle = tokio::spawn(async move {
            let _p = pool2.acquire().await;
        });
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        pack.recycle();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn fan_out_recycles_exactly_once_when_refcount_hits_zero() {
        let pool = PackPool::new(2);
        let mut owned = pool.acquire().await;
        *owned.message_mut() = Message::new("t", "p");

        let matches = 2usize;
        let router_ref = owned.freeze(matches);
        assert_eq!(router_ref.refcount(), matches + 1);

        let d1 = router_ref.fork();
        let d2 = router_ref.fork();
        assert_eq!(router_ref.refcount(), matches + 1);

        router_ref.release(); // router's own hold
        assert_eq!(pool.in_circulation(), 1);

        d1.release();
        assert_eq!(pool.in_circulation(), 1);
        d2.release();
        assert_eq!(pool.in_circulation(), 0);
        assert_eq!(pool.free_count(), pool.capacity());
    }

    #[tokio::test]
    async fn zero_matches_recycles_directly() {
        let pool = PackPool::new(1);
        let owned = pool.acquire().await;
        let router_ref = owned.freeze(0);
        assert_eq!(router_ref.refcount(), 1);
        router_ref.release();
        assert_eq!(pool.free_count(), 1);
    }

    #[tokio::test]
    async fn recycle_clears_message_and_cursor() {
        let pool = PackPool::new(1);
        let mut owned = pool.acquire().await;
        *owned.message_mut() = Message::new("t", "payload");
        owned.set_cursor("abc");
        owned.recycle();

        let reacquired = pool.acquire().await;
        assert_eq!(reacquired.message().type_, "");
        assert!(reacquired.cursor().is_none());
    }

    #[tokio::test]
    async fn scenario_s6_backpressure_blocks_then_drains_all_in_order() {
        let pool = PackPool::new(4);
        let (tx, mut rx) = mpsc::channel::<OwnedPack>(4);

        let producer_pool = pool.clone();
        let producer = tokio::spawn(async move {
            for i in 0..10 {
                let mut pack = producer_pool.acquire().await;
                pack.message_mut().payload = i.to_string();
                tx.send(pack).await.unwrap();
            }
        });

        // Let the producer race ahead; with only 4 packs in the pool and no
        // one draining the channel yet, it must stall after the 4th.
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        assert!(!producer.is_finished());
        assert_eq!(pool.in_circulation(), 4);
        assert_eq!(pool.free_count(), 0);

        // Unblock the output: draining one pack at a time lets the producer
        // make exactly one more step of progress per release.
        let mut seen = Vec::new();
        for _ in 0..10 {
            let pack = rx.recv().await.unwrap();
            seen.push(pack.message().payload.clone());
            pack.recycle();
        }
        producer.await.unwrap();

        assert_eq!(seen, (0..10).map(|i| i.to_string()).collect::<Vec<_>>());
        assert_eq!(pool.free_count(), pool.capacity());
    }

    proptest::proptest! {
        // Packs in circulation plus packs free in the pool always equals the
        // pool's fixed capacity, through any sequence of acquire/fork/release.
        #[test]
        fn circulation_plus_free_equals_capacity(
            matches in proptest::collection::vec(0usize..3, 1..20),
        ) {
            const CAPACITY: usize = 3;
            let pool = PackPool::new(CAPACITY);

            for m in matches {
                let Some(owned) = pool.try_acquire() else {
                    continue;
                };
                proptest::prop_assert_eq!(pool.in_circulation() + pool.free_count(), CAPACITY);

                let router_ref = owned.freeze(m);
                let forks: Vec<_> = (0..m).map(|_| router_ref.fork()).collect();
                proptest::prop_assert_eq!(pool.in_circulation() + pool.free_count(), CAPACITY);

                router_ref.release();
                for f in forks {
                    f.release();
                }
                proptest::prop_assert_eq!(pool.in_circulation() + pool.free_count(), CAPACITY);
            }
        }
    }
}
