use clap::Parser;
use rlimit_lib::Rate;

use crate::verbosity::Verbosity;

pub(crate) const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:9000";
pub(crate) const DEFAULT_RATE: &str = "2/3s";
pub(crate) const DEFAULT_MAX_WAITING: usize = 2;

/// Command-line options for the `rlimit` proxy
#[derive(Parser, Debug)]
#[command(name = "rlimit", version, about = "A rate-limiting reverse HTTP proxy")]
pub(crate) struct Options {
    /// Upstream URL to forward all requests to
    #[arg(value_name = "URL")]
    pub(crate) upstream: Option<String>,

    /// Upstream URL to forward all requests to (flag form; wins over the
    /// positional argument)
    #[arg(short, long, value_name = "URL", env = "RLIMIT_FORWARD")]
    pub(crate) forward: Option<String>,

    /// Address to listen on
    #[arg(
        short,
        long,
        value_name = "ADDR",
        default_value = DEFAULT_LISTEN_ADDR,
        env = "RLIMIT_LISTEN"
    )]
    pub(crate) listen: String,

    /// Outbound rate limit as COUNT/WINDOW: at most COUNT requests started
    /// per WINDOW (e.g. `2/3s`, `10/500ms`)
    #[arg(short, long, value_name = "COUNT/WINDOW", default_value = DEFAULT_RATE)]
    pub(crate) rate: Rate,

    /// Reject requests outright once this many are already waiting for a
    /// free slot
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_WAITING)]
    pub(crate) max_waiting: usize,

    #[command(flatten)]
    pub(crate) verbose: Verbosity,
}

impl Options {
    /// The configured upstream URL, `--forward` taking precedence over the
    /// positional form. `None` when neither was given.
    pub(crate) fn upstream_url(&self) -> Option<&str> {
        self.forward.as_deref().or(self.upstream.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = Options::parse_from(["rlimit", "http://localhost:8080"]);
        assert_eq!(opts.listen, DEFAULT_LISTEN_ADDR);
        assert_eq!(opts.rate, DEFAULT_RATE.parse().unwrap());
        assert_eq!(opts.max_waiting, DEFAULT_MAX_WAITING);
        assert_eq!(opts.upstream_url(), Some("http://localhost:8080"));
    }

    #[test]
    fn test_forward_flag_wins_over_positional() {
        let opts = Options::parse_from([
            "rlimit",
            "http://positional:1",
            "--forward",
            "http://flag:2",
        ]);
        assert_eq!(opts.upstream_url(), Some("http://flag:2"));
    }

    #[test]
    fn test_no_upstream() {
        let opts = Options::parse_from(["rlimit"]);
        assert_eq!(opts.upstream_url(), None);
    }

    #[test]
    fn test_rate_flag() {
        let opts = Options::parse_from(["rlimit", "http://localhost:1", "--rate", "10/500ms"]);
        assert_eq!(opts.rate, "10/500ms".parse().unwrap());
    }
}
