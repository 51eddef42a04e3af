//! The router: fans an incoming pack out to every destination
//! whose matcher evaluates true, under a pack-pool refcount it owns for the
//! duration of fan-out.

use crate::error::RouterError;
use crate::subscription::{Sink, Subscription};
use heka_core::pack::{DeliveryResult, OwnedPack, PackRef};
use tracing::{trace, warn};

pub struct Router {
    subscriptions: Vec<Subscription>,
}

impl Router {
    pub fn new(subscriptions: Vec<Subscription>) -> Self {
        Router { subscriptions }
    }

    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Route one pack to every matching destination.
    /// Within a single call, destinations are fanned out in the order
    /// subscriptions were registered — the router never reorders a pack
    /// relative to the ones before or after it in its own input stream.
    pub async fn route(&self, pack: OwnedPack) -> Result<usize, RouterError> {
        let matches: Vec<&Subscription> = self
            .subscriptions
            .iter()
            .filter(|sub| sub.matcher.evaluate(pack.message()).matched)
            .collect();

        if matches.is_empty() {
            trace!("router: no matching destinations, recycling pack directly");
            pack.recycle();
            return Ok(0);
        }

        // `freeze` fixes the refcount at matches.len() + 1, the "+1" being the
        // router's own hold released at the end of this call.
        let router_ref = pack.freeze(matches.len());

        for sub in &matches {
            let dest_ref = router_ref.fork();
            if let Err(err) = deliver(sub, dest_ref).await {
                warn!(destination = %sub.name, %err, "router: delivery failed");
            }
        }

        router_ref.release();
        Ok(matches.len())
    }
}

async fn deliver(sub: &Subscription, dest_ref: PackRef) -> Result<(), RouterError> {
    match &sub.sink {
        Sink::Inbox(tx) => match tx.send(dest_ref).await {
            Ok(()) => Ok(()),
            Err(tokio::sync::mpsc::error::SendError(dropped_ref)) => {
                dropped_ref.release();
                Err(RouterError::DestinationClosed(sub.name.clone()))
            }
        },
        Sink::Queued { inbox, queue } => match inbox.try_send(dest_ref) {
            Ok(()) => Ok(()),
            Err(tokio::sync::mpsc::error::TrySendError::Full(full_ref)) => {
                let bytes = full_ref.message().encode_payload();
                queue.enqueue(&bytes).await?;
                full_ref.deliver_result(DeliveryResult::Success);
                full_ref.release();
                Ok(())
            }
            Err(tokio::sync::mpsc::error::TrySendError::Closed(dropped_ref)) => {
                dropped_ref.release();
                Err(RouterError::DestinationClosed(sub.name.clone()))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heka_core::pack::PackPool;
    use heka_core::Message;
    use heka_matcher::Specification;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn fans_out_to_every_matching_subscription() {
        let pool = PackPool::new(2);
        let (tx_a, mut rx_a) = mpsc::channel(4);
        let (tx_b, mut rx_b) = mpsc::channel(4);

        let router = Router::new(vec![
            Subscription::new(
                "a",
                Specification::compile(r#"Type == "X""#).unwrap(),
                Sink::Inbox(tx_a),
            ),
            Subscription::new(
                "b",
                Specification::compile(r#"Type == "Y""#).unwrap(),
                Sink::Inbox(tx_b),
            ),
        ]);

        let mut pack = pool.acquire().await;
        *pack.message_mut() = Message::new("X", "hi");
        let matched = router.route(pack).await.unwrap();

        assert_eq!(matched, 1);
        let got = rx_a.recv().await.unwrap();
        assert_eq!(got.message().type_, "X");
        got.release();
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn zero_matches_recycles_pack() {
        let pool = PackPool::new(1);
        let router = Router::new(vec![Subscription::new(
            "a",
            Specification::compile(r#"Type == "never""#).unwrap(),
            Sink::Inbox(mpsc::channel(1).0),
        )]);

        let mut pack = pool.acquire().await;
        *pack.message_mut() = Message::new("X", "hi");
        let matched = router.route(pack).await.unwrap();
        assert_eq!(matched, 0);
        assert_eq!(pool.free_count(), 1);
    }

    #[tokio::test]
    async fn preserves_input_order_per_destination() {
        let pool = PackPool::new(4);
        let (tx, mut rx) = mpsc::channel(8);
        let router = Router::new(vec![Subscription::new(
            "a",
            Specification::compile(r#"TRUE"#).unwrap(),
            Sink::Inbox(tx),
        )]);

        for i in 0..4 {
            let mut pack = pool.acquire().await;
            *pack.message_mut() = Message::new("X", i.to_string());
            router.route(pack).await.unwrap();
        }

        for i in 0..4 {
            let got = rx.recv().await.unwrap();
            assert_eq!(got.message().payload, i.to_string());
            got.release();
        }
    }

    #[tokio::test]
    async fn scenario_s1_single_matcher_fan_out() {
        let pool = PackPool::new(3);
        let (tx_o1, mut rx_o1) = mpsc::channel(8);
        let (tx_o2, mut rx_o2) = mpsc::channel(8);
        let router = Router::new(vec![
            Subscription::new(
                "o1",
                Specification::compile(r#"Type == "a""#).unwrap(),
                Sink::Inbox(tx_o1),
            ),
            Subscription::new(
                "o2",
                Specification::compile(r#"Severity < 4"#).unwrap(),
                Sink::Inbox(tx_o2),
            ),
        ]);

        let mut msgs = Vec::new();
        for (type_, severity) in [("a", 7), ("b", 2), ("a", 1)] {
            let mut m = Message::new(type_, "p");
            m.severity = severity;
            msgs.push(m);
        }
        for m in msgs {
            let mut pack = pool.acquire().await;
            *pack.message_mut() = m;
            router.route(pack).await.unwrap();
        }

        let o1_first = rx_o1.recv().await.unwrap();
        assert_eq!(o1_first.message().severity, 7);
        o1_first.release();
        let o1_second = rx_o1.recv().await.unwrap();
        assert_eq!(o1_second.message().severity, 1);
        o1_second.release();
        assert!(rx_o1.try_recv().is_err());

        let o2_first = rx_o2.recv().await.unwrap();
        assert_eq!(o2_first.message().severity, 2);
        o2_first.release();
        let o2_second = rx_o2.recv().await.unwrap();
        assert_eq!(o2_second.message().severity, 1);
        o2_second.release();
        assert!(rx_o2.try_recv().is_err());
    }
}
