use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{
        StatusCode, Uri,
        header::{CACHE_CONTROL, CONTENT_TYPE},
    },
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};

use crate::{
    application::{error::HttpError, listing::ListingService, render::THEME_CSS},
    presentation::views::{ListingPageView, ListingTemplate, render_template_response},
};

use super::{
    middleware::{log_responses, set_request_context},
    not_found,
};

#[derive(Clone)]
pub struct HttpState {
    pub snippets: Arc<ListingService>,
    pub posts: Arc<ListingService>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(snippets_page))
        .route("/posts", get(posts_page))
        .route("/api/snippets", get(snippets_json))
        .route("/api/posts", get(posts_json))
        .route("/styles/code.css", get(code_css))
        .route("/health", get(health))
        .fallback(fallback)
        .with_state(state)
        .layer(middleware::from_fn(log_responses))
        .layer(middleware::from_fn(set_request_context))
}

async fn snippets_page(State(state): State<HttpState>) -> Response {
    listing_page(&state.snippets).await
}

async fn posts_page(State(state): State<HttpState>) -> Response {
    listing_page(&state.posts).await
}

async fn listing_page(listing: &ListingService) -> Response {
    match listing.load().await {
        Ok(artifact) => {
            let view = ListingPageView::new(
                listing.kind(),
                &listing.layout().container_class,
                artifact,
            );
            render_template_response(ListingTemplate { view }, StatusCode::OK)
        }
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn snippets_json(State(state): State<HttpState>) -> Response {
    listing_json(&state.snippets).await
}

async fn posts_json(State(state): State<HttpState>) -> Response {
    listing_json(&state.posts).await
}

async fn listing_json(listing: &ListingService) -> Response {
    match listing.load().await {
        Ok(artifact) => Json(artifact).into_response(),
        Err(err) => HttpError::from(err).into_response(),
    }
}

async fn code_css() -> Response {
    (
        StatusCode::OK,
        [
            (CONTENT_TYPE, "text/css; charset=utf-8"),
            (CACHE_CONTROL, "public, max-age=3600"),
        ],
        THEME_CSS,
    )
        .into_response()
}

async fn health() -> StatusCode {
    StatusCode::NO_CONTENT
}

async fn fallback(uri: Uri) -> Response {
    not_found(uri.path()).into_response()
}
