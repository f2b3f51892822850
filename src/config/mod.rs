//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{
    net::SocketAddr,
    num::{NonZeroU32, NonZeroUsize},
    path::PathBuf,
    str::FromStr,
};

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::{
    application::{
        listing::{DEFAULT_HIGHLIGHT_CONCURRENCY, DEFAULT_MAX_CODE_LINES},
        render::stylesheet::{DEFAULT_CARD_WIDTH_REM, DEFAULT_CONTAINER_CLASS},
    },
    cache::{DEFAULT_CAPACITY as DEFAULT_CACHE_CAPACITY, MIN_CAPACITY as MIN_CACHE_CAPACITY},
    domain::snippets::ContentKind,
};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "codebases";
const ENV_PREFIX: &str = "CODEBASES";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_API_URL: &str = "http://127.0.0.1:8787/graphql";
const DEFAULT_POSTS_FILE: &str = "content/posts.toml";

/// Command-line arguments for the Codebases binary.
#[derive(Debug, Parser)]
#[command(name = "codebases", version, about = "Codebases snippet listing server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "CODEBASES_CONFIG_FILE", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub config_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(Box<ServeArgs>),
    /// Assemble one listing and print it as JSON.
    Render(RenderArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Clone)]
pub struct RenderArgs {
    #[command(flatten)]
    pub overrides: ListingOverrides,

    /// Feed to assemble (snippets|posts).
    #[arg(long, value_name = "KIND", default_value = "snippets")]
    pub kind: ContentKind,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ListingOverrides {
    /// Override the GraphQL endpoint snippets are fetched from.
    #[arg(long = "upstream-api-url", value_name = "URL", value_hint = ValueHint::Url)]
    pub api_url: Option<String>,

    /// Override the TOML file posts are read from.
    #[arg(long = "upstream-posts-file", value_name = "PATH", value_hint = ValueHint::FilePath)]
    pub posts_file: Option<PathBuf>,

    /// Override how many leading lines of each snippet are shown.
    #[arg(long = "listing-max-code-lines", value_name = "COUNT")]
    pub max_code_lines: Option<u64>,

    /// Override how many snippets are highlighted concurrently.
    #[arg(long = "listing-highlight-concurrency", value_name = "COUNT")]
    pub highlight_concurrency: Option<u64>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    #[command(flatten)]
    pub listing: ListingOverrides,

    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Toggle the listing cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_enabled: Option<bool>,
}

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub upstream: UpstreamSettings,
    pub listing: ListingSettings,
    pub layout: LayoutSettings,
    pub cache: CacheSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct UpstreamSettings {
    pub api_url: Url,
    pub posts_file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ListingSettings {
    pub max_code_lines: NonZeroUsize,
    pub highlight_concurrency: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct LayoutSettings {
    pub container_class: String,
    pub card_width_rem: NonZeroU32,
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enabled: bool,
    pub capacity: usize,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Render(args)) => raw.apply_listing_overrides(&args.overrides),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    upstream: RawUpstreamSettings,
    listing: RawListingSettings,
    layout: RawLayoutSettings,
    cache: RawCacheSettings,
}

impl RawSettings {
    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.cache.enabled = Some(enabled);
        }

        self.apply_listing_overrides(&overrides.listing);
    }

    fn apply_listing_overrides(&mut self, overrides: &ListingOverrides) {
        if let Some(url) = overrides.api_url.as_ref() {
            self.upstream.api_url = Some(url.clone());
        }
        if let Some(path) = overrides.posts_file.as_ref() {
            self.upstream.posts_file = Some(path.clone());
        }
        if let Some(lines) = overrides.max_code_lines {
            self.listing.max_code_lines = Some(lines);
        }
        if let Some(concurrency) = overrides.highlight_concurrency {
            self.listing.highlight_concurrency = Some(concurrency);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            upstream,
            listing,
            layout,
            cache,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            upstream: build_upstream_settings(upstream)?,
            listing: build_listing_settings(listing)?,
            layout: build_layout_settings(layout)?,
            cache: build_cache_settings(cache)?,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    Ok(ServerSettings { addr })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_upstream_settings(upstream: RawUpstreamSettings) -> Result<UpstreamSettings, LoadError> {
    let raw_url = upstream
        .api_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let api_url = Url::parse(&raw_url)
        .map_err(|err| LoadError::invalid("upstream.api_url", format!("`{raw_url}`: {err}")))?;
    if !matches!(api_url.scheme(), "http" | "https") {
        return Err(LoadError::invalid(
            "upstream.api_url",
            format!("unsupported scheme `{}`", api_url.scheme()),
        ));
    }

    let posts_file = upstream
        .posts_file
        .unwrap_or_else(|| PathBuf::from(DEFAULT_POSTS_FILE));

    Ok(UpstreamSettings {
        api_url,
        posts_file,
    })
}

fn build_listing_settings(listing: RawListingSettings) -> Result<ListingSettings, LoadError> {
    let max_code_lines = match listing.max_code_lines {
        Some(lines) => non_zero_usize(lines, "listing.max_code_lines")?,
        None => non_zero_default(DEFAULT_MAX_CODE_LINES),
    };
    let highlight_concurrency = match listing.highlight_concurrency {
        Some(concurrency) => non_zero_usize(concurrency, "listing.highlight_concurrency")?,
        None => non_zero_default(DEFAULT_HIGHLIGHT_CONCURRENCY),
    };

    Ok(ListingSettings {
        max_code_lines,
        highlight_concurrency,
    })
}

fn build_layout_settings(layout: RawLayoutSettings) -> Result<LayoutSettings, LoadError> {
    let container_class = layout
        .container_class
        .map(|value| value.trim().to_string())
        .unwrap_or_else(|| DEFAULT_CONTAINER_CLASS.to_string());
    if container_class.is_empty() {
        return Err(LoadError::invalid(
            "layout.container_class",
            "must not be empty",
        ));
    }
    if let Some(invalid) = container_class
        .chars()
        .find(|ch| !(ch.is_ascii_alphanumeric() || *ch == '-' || *ch == '_'))
    {
        return Err(LoadError::invalid(
            "layout.container_class",
            format!("`{invalid}` is not allowed in a CSS class name"),
        ));
    }
    if !starts_css_identifier(&container_class) {
        return Err(LoadError::invalid(
            "layout.container_class",
            format!("`{container_class}` must start with a letter, `_` or `-` plus a letter"),
        ));
    }

    let card_width_rem = non_zero_u32(
        layout
            .card_width_rem
            .unwrap_or(u64::from(DEFAULT_CARD_WIDTH_REM)),
        "layout.card_width_rem",
    )?;

    Ok(LayoutSettings {
        container_class,
        card_width_rem,
    })
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let capacity = match cache.capacity {
        Some(capacity) => non_zero_usize(capacity, "cache.capacity")?.get(),
        None => DEFAULT_CACHE_CAPACITY,
    };
    // Every feed stores two entries in the one shared store.
    if capacity < MIN_CACHE_CAPACITY {
        return Err(LoadError::invalid(
            "cache.capacity",
            format!("must be at least {MIN_CACHE_CAPACITY} to hold every listing entry"),
        ));
    }

    Ok(CacheSettings {
        enabled: cache.enabled.unwrap_or(true),
        capacity,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawUpstreamSettings {
    api_url: Option<String>,
    posts_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawListingSettings {
    max_code_lines: Option<u64>,
    highlight_concurrency: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLayoutSettings {
    container_class: Option<String>,
    card_width_rem: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enabled: Option<bool>,
    capacity: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;
    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// A class selector name may not start with a digit, nor with `-` followed by a digit.
fn starts_css_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => true,
        Some('-') => chars
            .next()
            .is_some_and(|second| second.is_ascii_alphabetic() || second == '_' || second == '-'),
        _ => false,
    }
}

fn non_zero_default(value: usize) -> NonZeroUsize {
    NonZeroUsize::new(value).unwrap_or(NonZeroUsize::MIN)
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<NonZeroUsize, LoadError> {
    let value_usize: usize = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))?;
    NonZeroUsize::new(value_usize)
        .ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_card_layout() {
        let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

        assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
        assert_eq!(settings.listing.max_code_lines.get(), DEFAULT_MAX_CODE_LINES);
        assert_eq!(
            settings.listing.highlight_concurrency.get(),
            DEFAULT_HIGHLIGHT_CONCURRENCY
        );
        assert_eq!(settings.layout.container_class, DEFAULT_CONTAINER_CLASS);
        assert_eq!(settings.layout.card_width_rem.get(), DEFAULT_CARD_WIDTH_REM);
        assert!(settings.cache.enabled);
        assert_eq!(settings.cache.capacity, DEFAULT_CACHE_CAPACITY);
        assert_eq!(settings.upstream.api_url.as_str(), DEFAULT_API_URL);
    }

    #[test]
    fn cli_overrides_take_highest_precedence() {
        let mut raw = RawSettings::default();
        raw.server.port = Some(4000);
        raw.logging.level = Some("info".to_string());
        raw.listing.max_code_lines = Some(10);

        let overrides = ServeOverrides {
            server_port: Some(4321),
            log_level: Some("debug".to_string()),
            listing: ListingOverrides {
                max_code_lines: Some(5),
                ..Default::default()
            },
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert_eq!(settings.server.addr.port(), 4321);
        assert_eq!(settings.logging.level, LevelFilter::DEBUG);
        assert_eq!(settings.listing.max_code_lines.get(), 5);
    }

    #[test]
    fn cli_json_logging_enforces_format() {
        let mut raw = RawSettings::default();
        let overrides = ServeOverrides {
            log_json: Some(true),
            ..Default::default()
        };

        raw.apply_serve_overrides(&overrides);
        let settings = Settings::from_raw(raw).expect("valid settings");

        assert!(matches!(settings.logging.format, LogFormat::Json));
    }

    #[test]
    fn zero_values_name_the_offending_key() {
        let mut raw = RawSettings::default();
        raw.listing.highlight_concurrency = Some(0);
        let err = Settings::from_raw(raw).expect_err("zero concurrency rejected");
        assert!(matches!(
            err,
            LoadError::Invalid { key: "listing.highlight_concurrency", .. }
        ));

        let mut raw = RawSettings::default();
        raw.layout.card_width_rem = Some(0);
        let err = Settings::from_raw(raw).expect_err("zero width rejected");
        assert!(matches!(
            err,
            LoadError::Invalid { key: "layout.card_width_rem", .. }
        ));
    }

    #[test]
    fn container_class_must_be_a_css_identifier() {
        for class in ["card list", "1cards", "-1cards", "-"] {
            let mut raw = RawSettings::default();
            raw.layout.container_class = Some(class.to_string());
            let err = Settings::from_raw(raw).expect_err("invalid class rejected");
            assert!(
                matches!(err, LoadError::Invalid { key: "layout.container_class", .. }),
                "{class}"
            );
        }

        for class in ["cards", "_cards", "-cards", "--cards", "cards-2"] {
            let mut raw = RawSettings::default();
            raw.layout.container_class = Some(class.to_string());
            let settings = Settings::from_raw(raw).expect("valid class");
            assert_eq!(settings.layout.container_class, class);
        }
    }

    #[test]
    fn cache_capacity_must_hold_every_listing_entry() {
        for capacity in [0, 1, 3] {
            let mut raw = RawSettings::default();
            raw.cache.capacity = Some(capacity);
            let err = Settings::from_raw(raw).expect_err("small capacity rejected");
            assert!(
                matches!(err, LoadError::Invalid { key: "cache.capacity", .. }),
                "{capacity}"
            );
        }

        let mut raw = RawSettings::default();
        raw.cache.capacity = Some(MIN_CACHE_CAPACITY as u64);
        let settings = Settings::from_raw(raw).expect("minimum capacity accepted");
        assert_eq!(settings.cache.capacity, MIN_CACHE_CAPACITY);
    }

    #[test]
    fn api_url_requires_http_scheme() {
        let mut raw = RawSettings::default();
        raw.upstream.api_url = Some("ftp://example.com/graphql".to_string());
        assert!(Settings::from_raw(raw).is_err());

        let mut raw = RawSettings::default();
        raw.upstream.api_url = Some("not a url".to_string());
        assert!(Settings::from_raw(raw).is_err());
    }

    #[test]
    fn default_to_serve_command() {
        let cli = CliArgs::try_parse_from(["codebases"]).expect("parse defaults");
        assert!(cli.command.is_none());
    }

    #[test]
    fn parse_render_arguments() {
        let cli = CliArgs::try_parse_from([
            "codebases",
            "render",
            "--kind",
            "posts",
            "--upstream-posts-file",
            "/tmp/posts.toml",
        ])
        .expect("parse render");

        match cli.command {
            Some(Command::Render(args)) => {
                assert_eq!(args.kind, ContentKind::Posts);
                assert_eq!(
                    args.overrides.posts_file,
                    Some(PathBuf::from("/tmp/posts.toml"))
                );
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn render_rejects_unknown_kind() {
        assert!(CliArgs::try_parse_from(["codebases", "render", "--kind", "feeds"]).is_err());
    }

    #[test]
    fn parse_serve_overrides() {
        let cli = CliArgs::try_parse_from([
            "codebases",
            "serve",
            "--server-port",
            "8080",
            "--cache-enabled",
            "false",
            "--listing-highlight-concurrency",
            "2",
        ])
        .expect("parse serve");

        let Some(Command::Serve(args)) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(args.overrides.server_port, Some(8080));
        assert_eq!(args.overrides.cache_enabled, Some(false));
        assert_eq!(args.overrides.listing.highlight_concurrency, Some(2));
    }
}
