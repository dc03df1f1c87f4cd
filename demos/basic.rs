//! Minimal tsu-errors example — handlers that fail in every supported way.
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i http://localhost:3000/users/7          # 404 NotFoundError
//!   curl -i -X POST http://localhost:3000/users    # 400 ValidationError
//!   curl -i http://localhost:3000/admin            # 403, renamed error
//!   curl -i http://localhost:3000/legacy           # 401, plain record
//!   curl -i http://localhost:3000/panic-ish        # 500, bare string

use tsu_errors::{ErrorHandler, ErrorObject, Request, Response, Router, Server, StructuredError};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let errors = ErrorHandler::builder()
        .full(std::env::var_os("TSU_ERRORS_FULL").is_some())
        .on_error(|err| tracing::warn!(%err, "request failed"))
        .build();

    let app = Router::new()
        .get("/users/{id}", get_user)
        .post("/users", create_user)
        .get("/admin", admin)
        .get("/legacy", legacy)
        .get("/panic-ish", panic_ish)
        .error_handler(errors);

    if let Err(e) = Server::bind("0.0.0.0:3000").serve(app).await {
        tracing::error!("server error: {e}");
    }
}

// GET /users/{id}
async fn get_user(req: Request) -> Result<Response, StructuredError> {
    match req.param("id") {
        Some("42") => Ok(Response::json(br#"{"id":"42","name":"alice"}"#.to_vec())),
        Some(id) => Err(StructuredError::not_found(format!("user {id} does not exist"))),
        None => Err(StructuredError::argument("missing id")),
    }
}

// POST /users
async fn create_user(req: Request) -> Result<Response, StructuredError> {
    if req.body().is_empty() {
        return Err(StructuredError::validation("body must not be empty").with_code("E_EMPTY"));
    }
    Ok(Response::builder()
        .status(http::StatusCode::CREATED)
        .header("location", "/users/99")
        .json(br#"{"id":"99"}"#.to_vec()))
}

// GET /admin — an error from "another library" that only shares the name.
async fn admin(_req: Request) -> Result<Response, StructuredError> {
    Err(StructuredError::new("admins only").with_name("NotPermittedError"))
}

// GET /legacy — a plain record with a status.
async fn legacy(_req: Request) -> Result<Response, ErrorObject> {
    Err(ErrorObject::with_status(401).message("Unauthorized"))
}

// GET /panic-ish — a bare string.
async fn panic_ish(_req: Request) -> Result<Response, String> {
    Err("something went sideways".to_owned())
}
