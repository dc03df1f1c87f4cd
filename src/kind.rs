//! Error kinds as a typed enum.
//!
//! A kind is identified by its conventional name string (`"NotFoundError"`),
//! not by the concrete type that produced it. Two unrelated libraries that
//! both raise something called `NotFoundError` land in the same bucket.
//!
//! | Kind | Name | Status |
//! |---|---|---|
//! | [`Argument`](ErrorKind::Argument) | `ArgumentError` | 400 |
//! | [`Validation`](ErrorKind::Validation) | `ValidationError` | 400 |
//! | [`AuthenticationRequired`](ErrorKind::AuthenticationRequired) | `AuthenticationRequiredError` | 401 |
//! | [`NotPermitted`](ErrorKind::NotPermitted) | `NotPermittedError` | 403 |
//! | [`NotFound`](ErrorKind::NotFound) | `NotFoundError` | 404 |
//! | [`GenericHttp`](ErrorKind::GenericHttp) | own name | own status |
//! | [`Generic`](ErrorKind::Generic) | own name | 500 |
//! | [`UnknownValue`](ErrorKind::UnknownValue) | `Error` | 500 |

use std::fmt;

use http::StatusCode;

/// Classification tag for a handled error.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    // Mapped kinds ─────────────────────────────────────────────────────────────
    Argument,
    Validation,
    AuthenticationRequired,
    NotPermitted,
    NotFound,
    // Fallbacks ────────────────────────────────────────────────────────────────
    /// Structured error that already carries an HTTP status.
    GenericHttp,
    /// Structured error with a message and stack but no status.
    Generic,
    /// Anything that is not a structured error: bare strings, numbers, plain data.
    UnknownValue,
}

impl ErrorKind {
    /// The five kinds with a fixed status, in match priority order.
    pub const MAPPED: [ErrorKind; 5] = [
        Self::Argument,
        Self::Validation,
        Self::AuthenticationRequired,
        Self::NotPermitted,
        Self::NotFound,
    ];

    /// Returns the conventional name (e.g. `"NotPermittedError"`).
    pub fn name(self) -> &'static str {
        match self {
            Self::Argument               => "ArgumentError",
            Self::Validation             => "ValidationError",
            Self::AuthenticationRequired => "AuthenticationRequiredError",
            Self::NotPermitted           => "NotPermittedError",
            Self::NotFound               => "NotFoundError",
            Self::GenericHttp            => "HttpError",
            Self::Generic                => "Error",
            Self::UnknownValue           => "Error",
        }
    }

    /// Looks up a mapped kind by exact, case-sensitive name.
    ///
    /// Only the five mapped names are recognised; `"Error"` and
    /// `"HttpError"` are not tags, they are what's left over.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::MAPPED.into_iter().find(|kind| kind.name() == name)
    }

    /// Fixed status for the mapped kinds, `None` for the fallbacks.
    pub fn mapped_status(self) -> Option<StatusCode> {
        match self {
            Self::Argument | Self::Validation => Some(StatusCode::BAD_REQUEST),
            Self::AuthenticationRequired      => Some(StatusCode::UNAUTHORIZED),
            Self::NotPermitted                => Some(StatusCode::FORBIDDEN),
            Self::NotFound                    => Some(StatusCode::NOT_FOUND),
            Self::GenericHttp | Self::Generic | Self::UnknownValue => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
