//! The error values handlers hand to the error stage.
//!
//! Handlers fail with whatever they have at hand: a typed error built by this
//! crate, an error from some other library renamed by convention, a plain
//! record with a `statusCode`, or just a string. [`RawError`] holds all of
//! them without assuming anything beyond optional fields.
//!
//! ```rust
//! use tsu_errors::{ErrorObject, RawError, StructuredError};
//!
//! // typed constructor: structural tag and name both say "NotFoundError"
//! let typed: RawError = StructuredError::not_found("no such user").into();
//!
//! // renamed generic error: only the name says "ArgumentError"
//! let renamed: RawError = StructuredError::new("bad id").with_name("ArgumentError").into();
//!
//! // plain record carrying a status
//! let object: RawError = ErrorObject::with_status(401).message("Unauthorized").into();
//!
//! // bare value
//! let bare: RawError = "boom".into();
//! # let _ = (typed, renamed, object, bare);
//! ```

use std::backtrace::{Backtrace, BacktraceStatus};
use std::fmt;

use http::StatusCode;
use serde::Serialize;
use serde_json::Value;

use crate::kind::ErrorKind;

// ── RawError ──────────────────────────────────────────────────────────────────

/// An error as received by the error stage, before classification.
#[derive(Clone, Debug)]
pub enum RawError {
    /// A real error: name, message, stack, maybe a status and a code.
    Structured(StructuredError),
    /// A plain record that is not an error but may expose `statusCode`.
    Object(ErrorObject),
    /// Anything else: a bare string, number, array. A JSON object exposing
    /// a usable `statusCode` or a mapped `name` is read as an [`ErrorObject`].
    Value(Value),
}

impl RawError {
    /// Wraps a standard library error as a generic structured error.
    ///
    /// The message is the error's `Display` output. The stack lists the
    /// `source()` chain followed by a backtrace of the call site.
    pub fn from_std(err: &(dyn std::error::Error + 'static)) -> Self {
        let message = err.to_string();
        let mut causes = String::new();
        let mut source = err.source();
        while let Some(cause) = source {
            causes.push_str(&format!("\ncaused by: {cause}"));
            source = cause.source();
        }
        let stack = format!("{}{causes}", capture_stack("Error", &message));
        Self::Structured(StructuredError {
            name: "Error".to_owned(),
            message,
            stack,
            status_code: None,
            code: None,
            tag: None,
        })
    }

    /// The structured error inside, if any.
    pub fn as_structured(&self) -> Option<&StructuredError> {
        match self {
            Self::Structured(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StructuredError> for RawError {
    fn from(err: StructuredError) -> Self { Self::Structured(err) }
}

impl From<ErrorObject> for RawError {
    fn from(obj: ErrorObject) -> Self { Self::Object(obj) }
}

impl From<Value> for RawError {
    fn from(value: Value) -> Self { Self::Value(value) }
}

impl From<&str> for RawError {
    fn from(s: &str) -> Self { Self::Value(Value::String(s.to_owned())) }
}

impl From<String> for RawError {
    fn from(s: String) -> Self { Self::Value(Value::String(s)) }
}

impl fmt::Display for RawError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structured(err) => fmt::Display::fmt(err, f),
            Self::Object(obj) => {
                f.write_str(obj.name.as_deref().unwrap_or("object error"))?;
                match &obj.message {
                    Some(message) => write!(f, ": {message}"),
                    None => Ok(()),
                }
            }
            Self::Value(Value::String(s)) => f.write_str(s),
            Self::Value(value) => write!(f, "{value}"),
        }
    }
}

// ── StructuredError ───────────────────────────────────────────────────────────

/// A structured error: always has a name, a message and a stack.
///
/// The `tag` is the structural identity set by the typed constructors
/// ([`StructuredError::argument`] and friends). The `name` is the convention
/// other libraries follow. Classification accepts either, so renaming a
/// generic error to `"NotFoundError"` is as good as building one here.
#[derive(Clone, Debug)]
pub struct StructuredError {
    name: String,
    message: String,
    stack: String,
    status_code: Option<u16>,
    code: Option<Value>,
    tag: Option<ErrorKind>,
}

impl StructuredError {
    /// A generic error named `"Error"`.
    pub fn new(message: impl Into<String>) -> Self {
        Self::build("Error", message.into(), None, None)
    }

    /// An error carrying the structural tag and name of `kind`.
    pub fn tagged(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self::build(kind.name(), message.into(), None, Some(kind))
    }

    pub fn argument(message: impl Into<String>) -> Self {
        Self::tagged(ErrorKind::Argument, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::tagged(ErrorKind::Validation, message)
    }

    pub fn authentication_required(message: impl Into<String>) -> Self {
        Self::tagged(ErrorKind::AuthenticationRequired, message)
    }

    pub fn not_permitted(message: impl Into<String>) -> Self {
        Self::tagged(ErrorKind::NotPermitted, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::tagged(ErrorKind::NotFound, message)
    }

    /// An HTTP-shaped error with an explicit status.
    ///
    /// The name is derived from the reason phrase: `404` is
    /// `"NotFoundError"`, `400` is `"BadRequestError"`, `500` is
    /// `"InternalServerError"`. Statuses outside 400–599 become 500.
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        let status = match StatusCode::from_u16(status) {
            Ok(s) if is_error_status(s.as_u16()) => s,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let name = http_error_name(status);
        Self::build(&name, message.into(), Some(status.as_u16()), None)
    }

    fn build(name: &str, message: String, status_code: Option<u16>, tag: Option<ErrorKind>) -> Self {
        Self {
            stack: capture_stack(name, &message),
            name: name.to_owned(),
            message,
            status_code,
            code: None,
            tag,
        }
    }

    /// Renames the error. The stack and any structural tag are kept.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Attaches an explicit status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    /// Attaches an application error code, passed through as-is.
    pub fn with_code(mut self, code: impl Into<Value>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Replaces the captured stack.
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = stack.into();
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn message(&self) -> &str { &self.message }
    pub fn stack(&self) -> &str { &self.stack }
    pub fn status_code(&self) -> Option<u16> { self.status_code }
    pub fn code(&self) -> Option<&Value> { self.code.as_ref() }
    pub fn tag(&self) -> Option<ErrorKind> { self.tag }

    /// True if either the structural tag or the name identifies `kind`.
    pub fn is(&self, kind: ErrorKind) -> bool {
        self.tag == Some(kind) || self.name == kind.name()
    }
}

impl fmt::Display for StructuredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.message)
    }
}

impl std::error::Error for StructuredError {}

// ── ErrorObject ───────────────────────────────────────────────────────────────

/// A plain record thrown in place of an error.
///
/// Serialises with the conventional camelCase field names
/// (`{"statusCode":401,"message":"Unauthorized"}`) when echoed back as a bare
/// value.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorObject {
    /// Matched against the mapped kind names like a structured error's name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

impl ErrorObject {
    pub fn with_status(status: u16) -> Self {
        Self { status_code: Some(status), ..Self::default() }
    }

    /// Reads a JSON object as a record, if it looks like one the error stage
    /// can act on: a valid `statusCode` or a `name` naming a mapped kind.
    ///
    /// Anything else returns `None` and stays a bare value, echoed verbatim.
    pub fn from_value(value: &Value) -> Option<Self> {
        let Value::Object(map) = value else {
            return None;
        };
        let text = |key: &str| match map.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Null => None,
            other => Some(other.to_string()),
        };
        let obj = Self {
            name: map.get("name").and_then(Value::as_str).map(str::to_owned),
            status_code: map.get("statusCode")
                .and_then(Value::as_u64)
                .and_then(|n| u16::try_from(n).ok()),
            code: map.get("code").filter(|c| !c.is_null()).cloned(),
            message: text("message"),
            stack: text("stack"),
        };

        let has_status = obj.status_code.is_some_and(|c| StatusCode::from_u16(c).is_ok());
        let has_kind = obj.name.as_deref().and_then(ErrorKind::from_name).is_some();
        (has_status || has_kind).then_some(obj)
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn code(mut self, code: impl Into<Value>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// Statuses [`StructuredError::http`] accepts as-is.
fn is_error_status(code: u16) -> bool {
    (400..=599).contains(&code)
}

/// `"<name>: <message>"`, followed by a backtrace of the caller when
/// `RUST_BACKTRACE` enables one. The header line alone keeps it non-empty.
pub(crate) fn capture_stack(name: &str, message: &str) -> String {
    let backtrace = Backtrace::capture();
    match backtrace.status() {
        BacktraceStatus::Captured => format!("{name}: {message}\n{backtrace}"),
        _ => format!("{name}: {message}"),
    }
}

/// `Not Found` → `NotFoundError`, `Internal Server Error` → `InternalServerError`.
fn http_error_name(status: StatusCode) -> String {
    let Some(reason) = status.canonical_reason() else {
        return "HttpError".to_owned();
    };
    let mut name: String = reason
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars().filter(|c| c.is_ascii_alphanumeric());
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.collect::<String>(),
                None => String::new(),
            }
        })
        .collect();
    if !name.ends_with("Error") {
        name.push_str("Error");
    }
    name
}
