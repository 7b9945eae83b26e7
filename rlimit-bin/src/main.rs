//! `rlimit` is a reverse HTTP proxy that forwards every inbound request to a
//! single upstream while rate limiting outbound dispatch.
//!
//! Forward everything on port 9000 to a local service:
//!
//! ```sh
//! rlimit http://localhost:8080
//! ```
//!
//! The upstream can also be given as a flag, and the limit tuned:
//!
//! ```sh
//! rlimit --forward http://localhost:8080 --rate 10/1s --max-waiting 5
//! ```
//!
//! At most `COUNT` requests are started per `WINDOW`; requests that pile up
//! beyond `--max-waiting` receive an immediate `429 Too Many Requests`.
#![warn(clippy::all, clippy::pedantic)]
#![deny(missing_docs)]

use anyhow::{Context, Result, bail};
use clap::Parser;
use env_logger::{Builder, Env};
use log::{LevelFilter, info};

use rlimit_lib::{ProxyState, RateLimitedDispatcher, Upstream, router};

mod options;
mod verbosity;

use options::Options;
use verbosity::Verbosity;

/// Initialize the logging system with the given verbosity level.
///
/// `RUST_LOG` takes precedence over the CLI flags when set.
fn init_logging(verbose: &Verbosity) {
    let env = Env::default().filter_or("RUST_LOG", "warn");
    let mut builder = Builder::from_env(env);
    builder
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false);

    if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(LevelFilter::Warn);
        builder
            .filter_module("rlimit", verbose.log_level_filter())
            .filter_module("rlimit_lib", verbose.log_level_filter());
    }

    builder.init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Options::parse();
    init_logging(&opts.verbose);

    let Some(raw_url) = opts.upstream_url() else {
        bail!("no upstream URL given; pass one as an argument or via --forward");
    };
    let upstream = Upstream::new(raw_url).context("invalid upstream URL")?;

    let dispatcher =
        RateLimitedDispatcher::new(reqwest::Client::new(), opts.rate, opts.max_waiting);
    let app = router(ProxyState::new(dispatcher, upstream.clone()));

    let listener = tokio::net::TcpListener::bind(&opts.listen)
        .await
        .with_context(|| format!("cannot listen on {}", opts.listen))?;
    info!(
        "forwarding {} -> {upstream} (rate {}, max waiting {})",
        listener.local_addr().context("listener has no local address")?,
        opts.rate,
        opts.max_waiting
    );

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await
    .context("server error")
}
