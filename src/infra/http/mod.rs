mod middleware;
mod public;

pub use middleware::{REQUEST_ID_HEADER, RequestContext};
pub use public::{HttpState, build_router};

use axum::http::StatusCode;

use crate::application::error::HttpError;

fn not_found(path: &str) -> HttpError {
    HttpError::new(
        "infra::http::fallback",
        StatusCode::NOT_FOUND,
        "Not found",
        format!("no route for `{path}`"),
    )
}
