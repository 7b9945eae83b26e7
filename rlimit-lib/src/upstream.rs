//! Validation of the configured upstream target and rewriting of inbound
//! request destinations to point at it.

use std::fmt;
use std::str::FromStr;

use url::Url;

use crate::types::{ErrorKind, Result};

/// A validated upstream target (scheme + host, optionally a port).
///
/// Only the scheme and authority of the configured URL matter; any path or
/// query baked into it is ignored during rewriting, since the inbound
/// request supplies those.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upstream {
    url: Url,
}

impl Upstream {
    /// Parse and validate an upstream URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is empty, fails to parse as a URL, or
    /// uses a scheme other than http/https. All of these are configuration
    /// errors and fatal at startup.
    pub fn new(s: &str) -> Result<Self> {
        if s.is_empty() {
            return Err(ErrorKind::EmptyUrl);
        }
        let url = Url::parse(s).map_err(|e| ErrorKind::InvalidUrl(s.to_string(), e))?;
        match url.scheme() {
            // A bare `host:port` string parses as a URL whose scheme is the
            // hostname, so this check also catches missing schemes.
            "http" | "https" => Ok(Self { url }),
            other => Err(ErrorKind::UnsupportedScheme(other.to_string())),
        }
    }

    /// Scheme of the upstream target
    #[must_use]
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// Host (and port, if present) of the upstream target
    #[must_use]
    pub fn authority(&self) -> &str {
        self.url.authority()
    }

    /// Graft an inbound request's path and query onto the upstream's scheme
    /// and authority. Everything else about the request (method, headers,
    /// body) is untouched by the rewrite.
    #[must_use]
    pub fn rewrite(&self, path: &str, query: Option<&str>) -> Url {
        let mut target = self.url.clone();
        target.set_path(path);
        target.set_query(query);
        target.set_fragment(None);
        target
    }
}

impl FromStr for Upstream {
    type Err = ErrorKind;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl fmt::Display for Upstream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.url.fmt(f)
    }
}
