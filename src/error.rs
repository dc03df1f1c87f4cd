//! Unified error type.

use std::net::AddrParseError;

/// The error type returned by tsu's fallible operations.
///
/// Application-level failures never surface here: a handler that fails hands
/// a [`RawError`](crate::RawError) to the error stage, which turns it into a
/// JSON [`Response`](crate::Response). This type covers infrastructure
/// failures only: parsing the listen address, binding, accepting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid socket address `{addr}`: {source}")]
    Addr {
        addr: String,
        #[source]
        source: AddrParseError,
    },

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}
