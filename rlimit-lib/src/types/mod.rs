mod error;

pub use error::ErrorKind;

/// The result type of `rlimit_lib`
pub type Result<T> = std::result::Result<T, ErrorKind>;
