use std::{process, sync::Arc};

use codebases::{
    application::{
        error::AppError,
        listing::{ListingConfig, ListingService},
        render::{GridStyleConfig, GridStylesheet, Highlighter, syntect_highlighter},
        repos::SnippetSource,
    },
    cache::{CacheConfig, KvStore, MemoryKvStore},
    config,
    domain::snippets::ContentKind,
    infra::{
        error::InfraError,
        http::{self, HttpState},
        telemetry,
        upstream::{GraphqlSnippetSource, StaticPostSource},
    },
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::from(InfraError::configuration(err.to_string())))?;

    let command = cli_args
        .command
        .unwrap_or(config::Command::Serve(Box::<config::ServeArgs>::default()));

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match command {
        config::Command::Serve(_) => run_serve(settings).await,
        config::Command::Render(args) => run_render(settings, args).await,
    }
}

struct ApplicationContext {
    snippets: Arc<ListingService>,
    posts: Arc<ListingService>,
}

fn build_application_context(settings: &config::Settings) -> Result<ApplicationContext, AppError> {
    let highlighter: Arc<dyn Highlighter> = syntect_highlighter();
    let stylesheet = GridStylesheet::new(GridStyleConfig {
        container_class: settings.layout.container_class.clone(),
        card_width_rem: settings.layout.card_width_rem,
    });
    let listing_config = ListingConfig {
        max_code_lines: settings.listing.max_code_lines,
        highlight_concurrency: settings.listing.highlight_concurrency,
    };

    // Both feeds share one store; keys are namespaced by content kind.
    let cache_config = CacheConfig::from(&settings.cache);
    let cache: Option<Arc<dyn KvStore>> = cache_config
        .is_enabled()
        .then(|| Arc::new(MemoryKvStore::new(&cache_config)) as Arc<dyn KvStore>);

    let graphql: Arc<dyn SnippetSource> = Arc::new(
        GraphqlSnippetSource::new(settings.upstream.api_url.clone()).map_err(AppError::from)?,
    );
    let static_posts: Arc<dyn SnippetSource> =
        Arc::new(StaticPostSource::new(settings.upstream.posts_file.clone()));

    let build = |kind: ContentKind, source: Arc<dyn SnippetSource>| {
        Arc::new(
            ListingService::new(
                kind,
                source,
                Arc::clone(&highlighter),
                stylesheet.clone(),
                listing_config,
            )
            .with_cache_opt(cache.clone()),
        )
    };

    Ok(ApplicationContext {
        snippets: build(ContentKind::Snippets, graphql),
        posts: build(ContentKind::Posts, static_posts),
    })
}

async fn run_serve(settings: config::Settings) -> Result<(), AppError> {
    let app = build_application_context(&settings)?;

    info!(
        target = "codebases::serve",
        addr = %settings.server.addr,
        api_url = %settings.upstream.api_url,
        posts_file = %settings.upstream.posts_file.display(),
        cache_enabled = settings.cache.enabled,
        "Starting HTTP server"
    );

    let state = HttpState {
        snippets: app.snippets,
        posts: app.posts,
    };
    serve_http(&settings, state).await
}

async fn run_render(settings: config::Settings, args: config::RenderArgs) -> Result<(), AppError> {
    let app = build_application_context(&settings)?;
    let listing = match args.kind {
        ContentKind::Snippets => app.snippets,
        ContentKind::Posts => app.posts,
    };

    info!(target = "codebases::render", kind = %args.kind, "Assembling listing");

    let artifact = listing.load().await?;
    let json = serde_json::to_string_pretty(&artifact)
        .map_err(|err| AppError::unexpected(format!("failed to encode listing: {err}")))?;
    println!("{json}");
    Ok(())
}

async fn serve_http(settings: &config::Settings, state: HttpState) -> Result<(), AppError> {
    let router = http::build_router(state);

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .map_err(|err| AppError::from(InfraError::from(err)))?;

    axum::serve(listener, router.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|err| AppError::unexpected(format!("server error: {err}")))?;

    info!(target = "codebases::serve", "HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(
            target = "codebases::serve",
            error = %err,
            "failed to listen for shutdown signal"
        );
        std::future::pending::<()>().await;
    }
}
