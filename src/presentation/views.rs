use crate::application::{
    error::HttpError,
    listing::{ListingArtifact, ListingItem},
};
use crate::domain::snippets::ContentKind;
use askama::{Error as AskamaError, Template};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use thiserror::Error;

const SITE_TITLE: &str = "Codebases Snippet";
const SITE_DESCRIPTION: &str = "Welcome to Codebases Snippet! Here you can find code snippets.";

#[derive(Debug, Error)]
#[error("{public_message}")]
pub struct TemplateRenderError {
    pub(crate) source: &'static str,
    pub(crate) public_message: &'static str,
    #[source]
    pub(crate) error: AskamaError,
}

impl TemplateRenderError {
    pub fn new(source: &'static str, public_message: &'static str, error: AskamaError) -> Self {
        Self {
            source,
            public_message,
            error,
        }
    }
}

impl From<TemplateRenderError> for HttpError {
    fn from(err: TemplateRenderError) -> Self {
        let TemplateRenderError {
            source,
            public_message,
            error,
        } = err;

        HttpError::from_error(
            source,
            StatusCode::INTERNAL_SERVER_ERROR,
            public_message,
            &error,
        )
    }
}

pub fn render_template<T: Template>(template: T) -> Result<Html<String>, HttpError> {
    template.render().map(Html).map_err(|err| {
        TemplateRenderError::new(
            "presentation::views::render_template",
            "Template rendering failed",
            err,
        )
        .into()
    })
}

pub fn render_template_response<T: Template>(template: T, status: StatusCode) -> Response {
    match render_template(template) {
        Ok(html) => (status, html).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Clone)]
pub struct PageMetaView {
    pub title: String,
    pub description: &'static str,
}

impl PageMetaView {
    pub fn for_kind(kind: ContentKind) -> Self {
        let title = match kind {
            ContentKind::Snippets => SITE_TITLE.to_string(),
            ContentKind::Posts => format!("Posts | {SITE_TITLE}"),
        };
        Self {
            title,
            description: SITE_DESCRIPTION,
        }
    }
}

#[derive(Clone)]
pub struct NavLinkView {
    pub label: &'static str,
    pub href: &'static str,
    pub active: bool,
}

fn navigation(kind: ContentKind) -> Vec<NavLinkView> {
    vec![
        NavLinkView {
            label: "Snippets",
            href: "/",
            active: kind == ContentKind::Snippets,
        },
        NavLinkView {
            label: "Posts",
            href: "/posts",
            active: kind == ContentKind::Posts,
        },
    ]
}

/// One card of the grid. `code_html` is trusted highlighter output.
#[derive(Clone)]
pub struct CardView {
    pub area: String,
    pub title: String,
    pub language: String,
    pub posted_at: String,
    pub posted_on: String,
    pub code_html: String,
}

impl From<ListingItem> for CardView {
    fn from(item: ListingItem) -> Self {
        let area = item.area_name();
        let posted_at = item
            .posted_at
            .format(&time::format_description::well_known::Rfc3339)
            .unwrap_or_default();
        Self {
            area,
            title: item.title,
            language: item.language,
            posted_at,
            posted_on: item.posted_on,
            code_html: item.code_html,
        }
    }
}

#[derive(Clone)]
pub struct ListingPageView {
    pub meta: PageMetaView,
    pub nav: Vec<NavLinkView>,
    pub container_class: String,
    /// Grid rules assembled for exactly these cards.
    pub stylesheet: String,
    pub cards: Vec<CardView>,
}

impl ListingPageView {
    pub fn new(kind: ContentKind, container_class: &str, artifact: ListingArtifact) -> Self {
        let ListingArtifact { items, stylesheet } = artifact;
        Self {
            meta: PageMetaView::for_kind(kind),
            nav: navigation(kind),
            container_class: container_class.to_string(),
            stylesheet,
            cards: items.into_iter().map(CardView::from).collect(),
        }
    }
}

#[derive(Template)]
#[template(path = "listing.html")]
pub struct ListingTemplate {
    pub view: ListingPageView,
}
