// crates/network/src/lib.rs
//! Remote track metadata: an HTTP client, a duration probe that reads audio
//! headers, and the queue that runs probes in the background

mod cache;
mod client;
mod error;
mod prefetch;
mod probe;

pub use cache::DurationCache;
pub use client::{Client, ClientConfig};
pub use error::{NetworkError, NetworkResult};
pub use prefetch::{DurationUpdate, MetadataPrefetcher, PrefetchSettings};
pub use probe::{duration_from_header, DurationProbe, HttpDurationProbe};
