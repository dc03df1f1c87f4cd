//! Terminal error stage: classify any [`RawError`] and answer with JSON.
//!
//! # What gets written
//!
//! ```text
//! { "error": { "type": "NotFoundError", "code": …, "message": …, "stack": … } }
//! ```
//!
//! `message` and `stack` only appear in *full* mode, which is meant for
//! debugging and should stay off in production. `code` appears whenever the
//! error carries one.
//!
//! # How the status is chosen
//!
//! 1. The error is matched against the mapped kinds, first match wins:
//!    `ArgumentError` / `ValidationError` → 400, `AuthenticationRequiredError`
//!    → 401, `NotPermittedError` → 403, `NotFoundError` → 404. Either the
//!    structural tag or the name string is enough.
//! 2. A status the error already carries beats the mapped one and is kept
//!    verbatim, as long as it is a valid HTTP status (100–999).
//! 3. Structured errors with neither get 500, keeping their own name as `type`.
//! 4. A plain record with a `statusCode` keeps that status, `type` is `"Error"`.
//!    A record named after a mapped kind is treated like that kind. Plain JSON
//!    objects are read as records too.
//! 5. Anything else (a bare string, a record without a usable status) is a
//!    500 with `type` `"Error"` and the value itself as the message.
//!
//! # Example
//!
//! ```rust
//! use http::StatusCode;
//! use tsu_errors::{ErrorHandler, StructuredError};
//!
//! let handler = ErrorHandler::builder()
//!     .full(false)
//!     .on_error(|err| tracing::warn!(%err, "request failed"))
//!     .build();
//!
//! let res = handler.respond(StructuredError::not_found("no such user").into());
//! assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
//! assert_eq!(res.body(), br#"{"error":{"type":"NotFoundError"}}"#);
//! ```

use std::fmt;
use std::sync::Arc;

use http::StatusCode;
use serde_json::Value;
use tracing::{debug, error};

use crate::envelope::{ErrorBody, ErrorEnvelope};
use crate::kind::ErrorKind;
use crate::raw::{capture_stack, ErrorObject, RawError, StructuredError};
use crate::request::RequestHead;
use crate::response::Response;

/// Callback run once per handled error, before classification.
pub type OnError = Arc<dyn Fn(&RawError) + Send + Sync + 'static>;

// ── Response writing ──────────────────────────────────────────────────────────

/// Where the error stage sends its one response.
pub trait ResponseWriter {
    fn write(&mut self, response: Response);
}

/// A single-slot writer: the last write wins.
impl ResponseWriter for Option<Response> {
    fn write(&mut self, response: Response) {
        *self = Some(response);
    }
}

/// Continuation to the next error stage.
///
/// The error handler is terminal and never calls it; it exists so the stage
/// has the same shape as every other one in the pipeline.
#[derive(Debug, Default)]
pub struct Next(());

impl Next {
    pub fn terminal() -> Self { Self(()) }
}

// ── Resolution ────────────────────────────────────────────────────────────────

/// Everything decided about one error: its status, its kind and the body.
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    pub status: StatusCode,
    pub kind: ErrorKind,
    pub envelope: ErrorEnvelope,
}

impl Resolution {
    /// Serialises the envelope into a JSON response at the resolved status.
    ///
    /// Never fails: if serialisation does, a bare `{"error":{"type":"Error"}}`
    /// goes out at 500.
    pub fn into_response(self) -> Response {
        match self.envelope.to_json() {
            Ok(body) => Response::builder().status(self.status).json(body),
            Err(e) => {
                error!("failed to serialise error envelope: {e}");
                Response::builder()
                    .status(StatusCode::INTERNAL_SERVER_ERROR)
                    .json(ErrorEnvelope::FALLBACK_JSON)
            }
        }
    }
}

// ── ErrorHandler ──────────────────────────────────────────────────────────────

/// The error-normalizing stage.
///
/// Configured once, immutable afterwards, and cheap to clone: the hook is
/// shared behind an `Arc`.
#[derive(Clone, Default)]
pub struct ErrorHandler {
    full: bool,
    on_error: Option<OnError>,
}

impl ErrorHandler {
    /// A handler with the given output mode and no hook.
    pub fn new(full: bool) -> Self {
        Self { full, on_error: None }
    }

    pub fn builder() -> ErrorHandlerBuilder {
        ErrorHandlerBuilder::default()
    }

    /// True if `message` and `stack` are written.
    pub fn is_full(&self) -> bool { self.full }

    /// Handles one error and writes exactly one response to `res`.
    ///
    /// The request head and `next` are part of the stage's shape but unused.
    /// A panic inside the `on_error` hook is not caught.
    pub fn handle<W>(&self, err: RawError, _req: &RequestHead, res: &mut W, _next: Next)
    where
        W: ResponseWriter + ?Sized,
    {
        res.write(self.respond(err));
    }

    /// Runs the hook, resolves the error and returns the response.
    pub fn respond(&self, err: RawError) -> Response {
        if let Some(hook) = &self.on_error {
            hook(&err);
        }
        let resolution = self.resolve(&err);
        debug!(
            kind = %resolution.kind,
            status = resolution.status.as_u16(),
            error = %err,
            "handling error"
        );
        resolution.into_response()
    }

    /// Decides status, kind and body for `err` without side effects.
    pub fn resolve(&self, err: &RawError) -> Resolution {
        match err {
            RawError::Structured(e) => self.resolve_structured(e),
            RawError::Object(obj) => self.resolve_object(obj),
            RawError::Value(value) => match ErrorObject::from_value(value) {
                Some(obj) => self.resolve_object(&obj),
                None => self.resolve_value(value.clone()),
            },
        }
    }

    fn resolve_structured(&self, err: &StructuredError) -> Resolution {
        let mapped = ErrorKind::MAPPED.into_iter().find(|&kind| err.is(kind));
        let explicit = err.status_code().and_then(explicit_status);

        let status = explicit
            .or_else(|| mapped.and_then(ErrorKind::mapped_status))
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let kind = match (mapped, explicit) {
            (Some(kind), _) => kind,
            (None, Some(_)) => ErrorKind::GenericHttp,
            (None, None) => ErrorKind::Generic,
        };

        self.resolution(status, kind, ErrorBody {
            kind: err.name().to_owned(),
            code: err.code().cloned(),
            message: self.full.then(|| Value::String(err.message().to_owned())),
            stack: self.full.then(|| err.stack().to_owned()),
        })
    }

    fn resolve_object(&self, obj: &ErrorObject) -> Resolution {
        let mapped = obj.name.as_deref().and_then(ErrorKind::from_name);
        let explicit = obj.status_code.and_then(explicit_status);
        let Some(status) = explicit.or_else(|| mapped.and_then(ErrorKind::mapped_status)) else {
            return self.resolve_value(object_value(obj));
        };

        // A record named after a mapped kind has been promoted to an HTTP
        // error and keeps that name; any other record reports plain "Error".
        let type_name = match (mapped, &obj.name) {
            (Some(_), Some(name)) => name.clone(),
            _ => "Error".to_owned(),
        };
        self.resolution(status, mapped.unwrap_or(ErrorKind::GenericHttp), ErrorBody {
            kind: type_name,
            code: obj.code.clone(),
            message: self.full.then(|| obj.message.clone().map(Value::String)).flatten(),
            stack: self.full.then(|| {
                obj.stack.clone().unwrap_or_else(|| {
                    capture_stack("Error", obj.message.as_deref().unwrap_or_default())
                })
            }),
        })
    }

    fn resolve_value(&self, value: Value) -> Resolution {
        let stack = self.full.then(|| capture_stack("Error", &display_value(&value)));
        self.resolution(StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::UnknownValue, ErrorBody {
            kind: "Error".to_owned(),
            code: None,
            message: self.full.then_some(value),
            stack,
        })
    }

    fn resolution(&self, status: StatusCode, kind: ErrorKind, body: ErrorBody) -> Resolution {
        Resolution { status, kind, envelope: ErrorEnvelope { error: body } }
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("full", &self.full)
            .field("on_error", &self.on_error.is_some())
            .finish()
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for [`ErrorHandler`]. Defaults to sparse output, no hook.
#[derive(Default)]
pub struct ErrorHandlerBuilder {
    full: bool,
    on_error: Option<OnError>,
}

impl ErrorHandlerBuilder {
    /// Include `message` and `stack` in every response.
    pub fn full(mut self, full: bool) -> Self {
        self.full = full;
        self
    }

    /// Called with each error as received, before it is classified.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RawError) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    pub fn build(self) -> ErrorHandler {
        ErrorHandler { full: self.full, on_error: self.on_error }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// An explicit status is kept verbatim unless it is not an HTTP status at all
/// (`0`, anything above 999).
fn explicit_status(code: u16) -> Option<StatusCode> {
    StatusCode::from_u16(code).ok()
}

/// A record without a usable status is echoed back as the value it is.
fn object_value(obj: &ErrorObject) -> Value {
    serde_json::to_value(obj).unwrap_or(Value::Null)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use http::Method;
    use serde_json::json;

    use super::*;

    fn sparse() -> ErrorHandler { ErrorHandler::new(false) }
    fn full() -> ErrorHandler { ErrorHandler::new(true) }

    fn body_json(res: &Response) -> Value {
        serde_json::from_slice(res.body()).expect("response body is JSON")
    }

    /// Records every write so the single-write rule can be checked.
    #[derive(Default)]
    struct Recorder(Vec<Response>);

    impl ResponseWriter for Recorder {
        fn write(&mut self, response: Response) {
            self.0.push(response);
        }
    }

    #[test]
    fn generic_error_sparse() {
        let res = sparse().respond(StructuredError::new("Generic Error").into());
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(body_json(&res), json!({ "error": { "type": "Error" } }));
    }

    #[test]
    fn argument_error_full() {
        let res = full().respond(StructuredError::argument("Invalid argument").into());
        assert_eq!(res.status_code(), StatusCode::BAD_REQUEST);
        let body = body_json(&res);
        assert_eq!(body["error"]["type"], "ArgumentError");
        assert_eq!(body["error"]["message"], "Invalid argument");
        assert!(body["error"]["stack"].as_str().is_some_and(|s| !s.is_empty()));
    }

    #[test]
    fn object_with_status_sparse() {
        let raw = ErrorObject::with_status(401).message("Unauthorized").into();
        let res = sparse().respond(raw);
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(&res), json!({ "error": { "type": "Error" } }));
    }

    #[test]
    fn custom_name_keeps_its_type() {
        let raw = StructuredError::new("Custom error").with_name("CustomError").into();
        let res = sparse().respond(raw);
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_json(&res), json!({ "error": { "type": "CustomError" } }));
    }

    #[test]
    fn tag_and_name_both_classify() {
        let cases = [
            (ErrorKind::Argument, StatusCode::BAD_REQUEST),
            (ErrorKind::Validation, StatusCode::BAD_REQUEST),
            (ErrorKind::AuthenticationRequired, StatusCode::UNAUTHORIZED),
            (ErrorKind::NotPermitted, StatusCode::FORBIDDEN),
            (ErrorKind::NotFound, StatusCode::NOT_FOUND),
        ];
        for (kind, status) in cases {
            let by_tag = sparse().resolve(&StructuredError::tagged(kind, "x").into());
            let by_name = sparse().resolve(&StructuredError::new("x").with_name(kind.name()).into());
            assert_eq!((by_tag.status, by_tag.kind), (status, kind));
            assert_eq!((by_name.status, by_name.kind), (status, kind));
            assert_eq!(by_name.envelope.error.kind, kind.name());
        }
    }

    #[test]
    fn explicit_status_beats_mapped_kind() {
        let raw = StructuredError::not_found("gone").with_status(410).into();
        let r = sparse().resolve(&raw);
        assert_eq!(r.status, StatusCode::GONE);
        assert_eq!(r.kind, ErrorKind::NotFound);
        assert_eq!(r.envelope.error.kind, "NotFoundError");
    }

    #[test]
    fn http_error_keeps_status_and_name() {
        let r = sparse().resolve(&StructuredError::http(409, "dup").with_code("E_DUP").into());
        assert_eq!(r.status, StatusCode::CONFLICT);
        assert_eq!(r.kind, ErrorKind::GenericHttp);
        assert_eq!(r.envelope.error.kind, "ConflictError");
        assert_eq!(r.envelope.error.code, Some(json!("E_DUP")));
    }

    #[test]
    fn explicit_status_is_kept_verbatim() {
        let r = sparse().resolve(&StructuredError::argument("x").with_status(302).into());
        assert_eq!((r.status, r.kind), (StatusCode::FOUND, ErrorKind::Argument));

        let r = sparse().resolve(&StructuredError::new("x").with_status(200).into());
        assert_eq!((r.status, r.kind), (StatusCode::OK, ErrorKind::GenericHttp));
        assert_eq!(r.envelope.error.kind, "Error");
    }

    #[test]
    fn invalid_explicit_status_falls_back() {
        let r = sparse().resolve(&StructuredError::argument("x").with_status(0).into());
        assert_eq!(r.status, StatusCode::BAD_REQUEST);

        let r = sparse().resolve(&StructuredError::new("x").with_status(1000).into());
        assert_eq!((r.status, r.kind), (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Generic));
    }

    #[test]
    fn object_keeps_a_redirect_status() {
        let res = full().respond(ErrorObject::with_status(302).message("Found").into());
        assert_eq!(res.status_code(), StatusCode::FOUND);
        let body = body_json(&res);
        assert_eq!(body["error"]["type"], "Error");
        assert_eq!(body["error"]["message"], "Found");
    }

    #[test]
    fn object_with_zero_status_has_no_status() {
        let r = sparse().resolve(&ErrorObject::with_status(0).message("x").into());
        assert_eq!((r.status, r.kind), (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::UnknownValue));
    }

    #[test]
    fn generic_error_keeps_its_code() {
        let raw = StructuredError::new("db down").with_code("E_DB").into();
        let r = full().resolve(&raw);
        assert_eq!((r.status, r.kind), (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::Generic));
        assert_eq!(r.envelope.error.kind, "Error");
        assert_eq!(r.envelope.error.code, Some(json!("E_DB")));
        assert_eq!(r.envelope.error.message, Some(json!("db down")));
    }

    #[test]
    fn json_object_with_status_code_is_a_record() {
        let res = sparse().respond(json!({ "statusCode": 401, "message": "Unauthorized" }).into());
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(body_json(&res), json!({ "error": { "type": "Error" } }));
    }

    #[test]
    fn record_named_after_a_kind_classifies() {
        let r = full().resolve(&json!({ "name": "NotFoundError", "message": "nope" }).into());
        assert_eq!((r.status, r.kind), (StatusCode::NOT_FOUND, ErrorKind::NotFound));
        assert_eq!(r.envelope.error.kind, "NotFoundError");
        assert_eq!(r.envelope.error.message, Some(json!("nope")));
        assert!(r.envelope.error.stack.is_some());

        let obj = ErrorObject::default().name("ValidationError").code("E_SCHEMA");
        let r = sparse().resolve(&obj.into());
        assert_eq!((r.status, r.kind), (StatusCode::BAD_REQUEST, ErrorKind::Validation));
        assert_eq!(r.envelope.error.code, Some(json!("E_SCHEMA")));
    }

    #[test]
    fn record_with_unmapped_name_and_no_status_is_echoed() {
        let value = json!({ "name": "CustomError", "detail": [1, 2] });
        let r = full().resolve(&value.clone().into());
        assert_eq!((r.status, r.kind), (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::UnknownValue));
        assert_eq!(r.envelope.error.message, Some(value));
    }

    #[test]
    fn bare_string_full_echoes_value() {
        let r = full().resolve(&"something broke".into());
        assert_eq!(r.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(r.kind, ErrorKind::UnknownValue);
        assert_eq!(r.envelope.error.kind, "Error");
        assert_eq!(r.envelope.error.message, Some(json!("something broke")));
        assert!(r.envelope.error.stack.as_deref().is_some_and(|s| !s.is_empty()));
        assert_eq!(r.envelope.error.code, None);
    }

    #[test]
    fn object_without_status_is_a_bare_value() {
        let raw: RawError = ErrorObject::default().message("no status").code(7).into();
        let r = full().resolve(&raw);
        assert_eq!((r.status, r.kind), (StatusCode::INTERNAL_SERVER_ERROR, ErrorKind::UnknownValue));
        assert_eq!(r.envelope.error.message, Some(json!({ "code": 7, "message": "no status" })));
    }

    #[test]
    fn object_with_status_full_gets_a_stack() {
        let raw: RawError = ErrorObject::with_status(429).message("slow down").code("E_RATE").into();
        let r = full().resolve(&raw);
        assert_eq!(r.status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(r.envelope.error.message, Some(json!("slow down")));
        assert_eq!(r.envelope.error.code, Some(json!("E_RATE")));
        assert!(r.envelope.error.stack.is_some());
    }

    #[test]
    fn sparse_mode_never_writes_message_or_stack() {
        let inputs: Vec<RawError> = vec![
            StructuredError::new("a").into(),
            StructuredError::validation("b").into(),
            StructuredError::http(503, "c").into(),
            ErrorObject::with_status(401).message("d").stack("e").into(),
            ErrorObject::default().message("f").into(),
            "g".into(),
            json!(42).into(),
        ];
        for raw in inputs {
            let body = body_json(&sparse().respond(raw));
            assert!(body["error"].get("message").is_none(), "{body}");
            assert!(body["error"].get("stack").is_none(), "{body}");
        }
    }

    #[test]
    fn hook_sees_unclassified_error_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let handler = ErrorHandler::builder()
            .on_error(move |err| {
                let tag = err.as_structured().and_then(StructuredError::tag);
                sink.lock().expect("lock").push(tag);
            })
            .build();

        let mut res = Recorder::default();
        let head = RequestHead::new(Method::GET, "/x");
        handler.handle(StructuredError::not_found("nope").into(), &head, &mut res, Next::terminal());

        assert_eq!(*seen.lock().expect("lock"), vec![Some(ErrorKind::NotFound)]);
        assert_eq!(res.0.len(), 1);
        assert_eq!(res.0[0].status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    #[should_panic(expected = "hook failed")]
    fn hook_panics_propagate() {
        let handler = ErrorHandler::builder().on_error(|_| panic!("hook failed")).build();
        handler.respond("x".into());
    }

    #[test]
    fn option_writer_holds_the_response() {
        let mut slot: Option<Response> = None;
        let head = RequestHead::new(Method::GET, "/");
        sparse().handle("x".into(), &head, &mut slot, Next::terminal());
        assert_eq!(slot.map(|r| r.status_code()), Some(StatusCode::INTERNAL_SERVER_ERROR));
    }
}
