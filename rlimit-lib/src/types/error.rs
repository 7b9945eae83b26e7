use thiserror::Error;

/// Possible errors when interacting with `rlimit_lib`
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The upstream URL was empty
    #[error("empty upstream URL")]
    EmptyUrl,

    /// The given string can not be parsed into a valid URL
    #[error("cannot parse `{0}` as upstream URL: {1}")]
    InvalidUrl(String, url::ParseError),

    /// The upstream URL uses a scheme other than http or https
    #[error("unsupported upstream scheme `{0}`; only http and https can be proxied")]
    UnsupportedScheme(String),

    /// The given string can not be parsed into a rate
    #[error("cannot parse `{0}` as rate; expected COUNT/WINDOW, e.g. `2/3s`")]
    InvalidRate(String),

    /// Network error while forwarding a request to the upstream
    #[error("network error while forwarding to upstream")]
    Upstream(#[from] reqwest::Error),

    /// The capacity pool was closed while a request waited for a slot
    #[error("capacity pool closed while waiting for a slot")]
    PoolClosed,
}
