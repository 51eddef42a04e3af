use heka_core::pack::PackRef;
use heka_queue::DurableQueue;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Where a matching pack goes once the router has forked a reference for it.
/// `Queued` destinations spill to disk rather than block the router when
/// their inbox is full.
pub enum Sink {
    Inbox(mpsc::Sender<PackRef>),
    Queued {
        inbox: mpsc::Sender<PackRef>,
        queue: Arc<DurableQueue>,
    },
}

/// One routable destination: a compiled matcher plus where its matches go.
pub struct Subscription {
    pub name: String,
    pub matcher: heka_matcher::Specification,
    pub sink: Sink,
}

impl Subscription {
    pub fn new(name: impl Into<String>, matcher: heka_matcher::Specification, sink: Sink) -> Self {
        Subscription {
            name: name.into(),
            matcher,
            sink,
        }
    }
}
