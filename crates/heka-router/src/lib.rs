//! # Heka Router
//!
//! Fans an incoming pack out to every filter/output whose matcher selects it,
//! forking one [`heka_core::pack::PackRef`] per match under a
//! refcount the router owns for the duration of fan-out.

mod error;
mod router;
mod subscription;

pub use error::RouterError;
pub use router::Router;
pub use subscription::{Sink, Subscription};
