//! # tsu-errors
//!
//! Error normalization for HTTP services. Whatever a handler fails with, the
//! client gets the same thing back: a status code and a JSON envelope.
//!
//! ```text
//! { "error": { "type": "ValidationError", "code": "E_SCHEMA" } }
//! ```
//!
//! ## The contract
//!
//! - Handlers fail with anything convertible to a [`RawError`]: a typed
//!   [`StructuredError`], an error renamed by convention, a plain
//!   [`ErrorObject`] with a `statusCode`, or a bare string.
//! - The [`ErrorHandler`] classifies it by kind *name*, not by concrete type,
//!   and picks the status: 400, 401, 403, 404, the error's own status, or 500.
//! - Exactly one JSON response goes out per error. A malformed error degrades
//!   to a 500, never to a crash.
//! - `message` and `stack` are only written in full mode. Keep it off in
//!   production.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use tsu_errors::{ErrorHandler, Request, Response, Router, Server, StructuredError};
//!
//! #[tokio::main]
//! async fn main() {
//!     let errors = ErrorHandler::builder()
//!         .full(cfg!(debug_assertions))
//!         .on_error(|err| tracing::warn!(%err, "request failed"))
//!         .build();
//!
//!     let app = Router::new()
//!         .get("/users/{id}", get_user)
//!         .error_handler(errors);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await.unwrap();
//! }
//!
//! async fn get_user(req: Request) -> Result<Response, StructuredError> {
//!     match req.param("id") {
//!         Some("42") => Ok(Response::json(br#"{"id":42}"#.to_vec())),
//!         Some(_) => Err(StructuredError::not_found("no such user")),
//!         None => Err(StructuredError::argument("missing id")),
//!     }
//! }
//! ```

mod envelope;
mod error;
mod handler;
mod kind;
mod raw;
mod request;
mod response;
mod router;
mod server;

pub mod middleware;

pub use envelope::{ErrorBody, ErrorEnvelope};
pub use error::Error;
pub use handler::{Handler, HandlerResult};
pub use kind::ErrorKind;
pub use middleware::error_handler::{
    ErrorHandler, ErrorHandlerBuilder, Next, OnError, Resolution, ResponseWriter,
};
pub use raw::{ErrorObject, RawError, StructuredError};
pub use request::{Request, RequestHead};
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::Router;
pub use server::Server;
