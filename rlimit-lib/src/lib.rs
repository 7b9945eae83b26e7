//! `rlimit-lib` is a library for building a rate-limited reverse HTTP proxy.
//!
//! Every inbound request is rewritten to point at a single configured
//! upstream and handed to a [`RateLimitedDispatcher`], which decides whether
//! to forward it now, forward it after waiting for a free slot, or reject it
//! immediately with a `429 Too Many Requests`.
//!
//! ```no_run
//! use rlimit_lib::{ProxyState, Rate, RateLimitedDispatcher, Upstream, router};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let upstream = Upstream::new("http://localhost:8080")?;
//!     let dispatcher =
//!         RateLimitedDispatcher::new(reqwest::Client::new(), Rate::default(), 2);
//!     let app = router(ProxyState::new(dispatcher, upstream));
//!
//!     let listener = tokio::net::TcpListener::bind("127.0.0.1:9000").await?;
//!     axum::serve(
//!         listener,
//!         app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
//!     )
//!     .await?;
//!     Ok(())
//! }
//! ```

mod proxy;
mod types;
mod upstream;

pub mod ratelimit;

pub use proxy::{ProxyState, router};
pub use ratelimit::{Rate, RateLimitedDispatcher};
pub use types::{ErrorKind, Result};
pub use upstream::Upstream;
