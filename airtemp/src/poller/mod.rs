//! Polling cache client for a JSON HTTP endpoint.
//!
//! This module owns the network side of the crate:
//! - [`PollingClient`] decides whether a poll serves the cached payload or
//!   fetches a new one, based on a mutable [`Ttl`]
//! - [`PayloadSource`] is the seam to the network, implemented by
//!   [`HttpSource`] (reqwest) and [`MockSource`] (in-memory)
//! - [`Poll`] tells callers whether the data they got is fresh, cached, or
//!   served after a transient failure

mod cache;
mod client;
mod error;
mod mock;
mod ttl;

pub use cache::{CacheEntry, Payload, Poll, PollerConfig, PollingClient};
pub use client::{HttpSource, HttpSourceConfig, PayloadSource};
pub use error::{ErrorKind, FetchError};
pub(crate) use error::truncate_dump;
pub use mock::MockSource;
pub use ttl::{DEFAULT_TTL, InvalidTtl, Ttl};
