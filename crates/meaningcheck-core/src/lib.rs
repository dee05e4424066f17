//! meaningcheck-core: answer-verification engine.
//!
//! Decides whether a free-text answer matches a canonical, possibly
//! multi-sense meaning. The local embedding score (best sense wins) and the
//! remote chat-model score are computed concurrently and combined with `min`;
//! results are memoized in a durable [`cache::ResultCache`].

pub mod cache;
pub mod error;
pub mod fanout;
pub mod meaning;
pub mod scorer;
pub mod traits;
pub mod verifier;

pub use cache::ResultCache;
pub use error::{CacheError, VerifyError};
pub use fanout::FanOutScorer;
pub use scorer::{LocalScorer, RemoteScorer, RemoteScorerConfig};
pub use verifier::{Verdict, Verifier};
