//! Global rate limiting and admission control for outbound requests.
//!
//! This module gates every outbound network send behind a fixed pool of
//! slots so that at most `count` sends hold a slot at any time, each hold
//! lasting `window` from the moment of acquisition. Requests that would
//! pile up behind the pool are rejected early with a synthetic `429`.
//!
//! # Architecture
//!
//! - [`Rate`]: Configuration pair of slot count and per-slot hold time
//! - [`RateLimitedDispatcher`]: Admission-controlled wrapper around the
//!   underlying HTTP client

mod dispatcher;
mod rate;

pub use dispatcher::{RateLimitedDispatcher, TOO_MANY_REQUESTS_BODY};
pub use rate::{DEFAULT_RATE_COUNT, DEFAULT_RATE_WINDOW, Rate};
