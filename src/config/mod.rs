//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::{net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use chrono_tz::Tz;
use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::links::ForumOptions;

mod cli;

pub use cli::{CliArgs, Command, DatabaseOverride, GenerateArgs, ServeArgs, ServeOverrides};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "forum-sitemap";
const ENV_PREFIX: &str = "FORUM_SITEMAP";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 4;
const DEFAULT_TABLE_PREFIX: &str = "wp_";
const DEFAULT_SITE_URL: &str = "http://localhost/";
const DEFAULT_VIEW_NAME_FORUM: &str = "forum";
const DEFAULT_VIEW_NAME_TOPIC: &str = "topic";
const DEFAULT_POSTS_PER_PAGE: u32 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 60 * 60;
const DEFAULT_REST_NAMESPACE: &str = "wp-json/asgaros/v1";
const DEFAULT_VIRTUAL_PATH: &str = "/forum-sitemap.xml";
const DEFAULT_QUERY_VAR: &str = "forum_sitemap";
const DEFAULT_AVAILABILITY_RECHECK_SECS: u64 = 30;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub database: DatabaseSettings,
    pub forum: ForumSettings,
    pub sitemap: SitemapSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
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
pub struct DatabaseSettings {
    pub url: Option<String>,
    pub max_connections: NonZeroU32,
    /// WordPress table prefix; only `[A-Za-z0-9_]`.
    pub table_prefix: String,
}

#[derive(Debug, Clone)]
pub struct ForumSettings {
    pub site_url: String,
    pub home_url: Option<String>,
    pub location_url: Option<String>,
    pub pretty_permalinks: bool,
    pub view_name_forum: String,
    pub view_name_topic: String,
    pub posts_per_page: NonZeroU32,
    pub timezone: Tz,
}

impl ForumSettings {
    pub fn options(&self) -> ForumOptions {
        ForumOptions {
            site_url: self.site_url.clone(),
            location_url: self.location_url.clone(),
            view_name_forum: self.view_name_forum.clone(),
            view_name_topic: self.view_name_topic.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SitemapSettings {
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    /// REST namespace without surrounding slashes.
    pub rest_namespace: String,
    /// Absolute request path answered with the sitemap.
    pub virtual_path: String,
    pub query_var: String,
    /// How long a failed availability probe is trusted; zero re-probes every request.
    pub availability_recheck: Duration,
}

impl SitemapSettings {
    pub fn endpoint_path(&self) -> String {
        format!("/{}/forum-sitemap", self.rest_namespace)
    }
}

impl Default for SitemapSettings {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            cache_ttl: Duration::from_secs(DEFAULT_CACHE_TTL_SECS),
            rest_namespace: DEFAULT_REST_NAMESPACE.to_string(),
            virtual_path: DEFAULT_VIRTUAL_PATH.to_string(),
            query_var: DEFAULT_QUERY_VAR.to_string(),
            availability_recheck: Duration::from_secs(DEFAULT_AVAILABILITY_RECHECK_SECS),
        }
    }
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
        Some(Command::Generate(args)) => raw.apply_generate_overrides(args),
        None => raw.apply_serve_overrides(&ServeOverrides::default()),
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    database: RawDatabaseSettings,
    forum: RawForumSettings,
    sitemap: RawSitemapSettings,
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
        if let Some(max) = overrides.database_max_connections {
            self.database.max_connections = Some(max);
        }
        if let Some(url) = overrides.site_url.as_ref() {
            self.forum.site_url = Some(url.clone());
        }
        if let Some(enabled) = overrides.cache_enabled {
            self.sitemap.cache_enabled = Some(enabled);
        }
        if let Some(ttl) = overrides.cache_ttl_seconds {
            self.sitemap.cache_ttl_seconds = Some(ttl);
        }

        self.apply_database_override(&overrides.database);
    }

    fn apply_generate_overrides(&mut self, args: &GenerateArgs) {
        if let Some(url) = args.site_url.as_ref() {
            self.forum.site_url = Some(url.clone());
        }
        self.apply_database_override(&args.database);
    }

    fn apply_database_override(&mut self, overrides: &DatabaseOverride) {
        if let Some(url) = overrides.database_url.as_ref() {
            self.database.url = Some(url.clone());
        }
        if let Some(prefix) = overrides.table_prefix.as_ref() {
            self.database.table_prefix = Some(prefix.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            database,
            forum,
            sitemap,
        } = raw;

        Ok(Self {
            server: build_server_settings(server)?,
            logging: build_logging_settings(logging)?,
            database: build_database_settings(database)?,
            forum: build_forum_settings(forum)?,
            sitemap: build_sitemap_settings(sitemap)?,
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

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
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

fn build_database_settings(database: RawDatabaseSettings) -> Result<DatabaseSettings, LoadError> {
    let url = non_blank(database.url);

    let max_value = database
        .max_connections
        .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
    let max_connections = non_zero_u32(max_value.into(), "database.max_connections")?;

    let table_prefix = database
        .table_prefix
        .unwrap_or_else(|| DEFAULT_TABLE_PREFIX.to_string());
    if !table_prefix
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return Err(LoadError::invalid(
            "database.table_prefix",
            "only ASCII letters, digits and `_` are allowed",
        ));
    }

    Ok(DatabaseSettings {
        url,
        max_connections,
        table_prefix,
    })
}

fn build_forum_settings(forum: RawForumSettings) -> Result<ForumSettings, LoadError> {
    let site_url = non_blank(forum.site_url).unwrap_or_else(|| DEFAULT_SITE_URL.to_string());
    validate_url(&site_url, "forum.site_url")?;

    let home_url = non_blank(forum.home_url);
    if let Some(home) = home_url.as_deref() {
        validate_url(home, "forum.home_url")?;
    }
    let location_url = non_blank(forum.location_url);
    if let Some(location) = location_url.as_deref() {
        validate_url(location, "forum.location_url")?;
    }

    let view_name_forum = view_name(
        forum.view_name_forum,
        DEFAULT_VIEW_NAME_FORUM,
        "forum.view_name_forum",
    )?;
    let view_name_topic = view_name(
        forum.view_name_topic,
        DEFAULT_VIEW_NAME_TOPIC,
        "forum.view_name_topic",
    )?;

    let posts_per_page = non_zero_u32(
        forum
            .posts_per_page
            .unwrap_or(DEFAULT_POSTS_PER_PAGE)
            .into(),
        "forum.posts_per_page",
    )?;

    let timezone = match non_blank(forum.timezone) {
        Some(name) => Tz::from_str(&name)
            .map_err(|err| LoadError::invalid("forum.timezone", format!("`{name}`: {err}")))?,
        None => Tz::UTC,
    };

    Ok(ForumSettings {
        site_url,
        home_url,
        location_url,
        pretty_permalinks: forum.pretty_permalinks.unwrap_or(true),
        view_name_forum,
        view_name_topic,
        posts_per_page,
        timezone,
    })
}

fn build_sitemap_settings(sitemap: RawSitemapSettings) -> Result<SitemapSettings, LoadError> {
    let ttl_secs = sitemap
        .cache_ttl_seconds
        .unwrap_or(DEFAULT_CACHE_TTL_SECS);
    if ttl_secs == 0 {
        return Err(LoadError::invalid(
            "sitemap.cache_ttl_seconds",
            "must be greater than zero",
        ));
    }

    let rest_namespace = sitemap
        .rest_namespace
        .unwrap_or_else(|| DEFAULT_REST_NAMESPACE.to_string())
        .trim()
        .trim_matches('/')
        .to_string();
    if rest_namespace.is_empty() {
        return Err(LoadError::invalid(
            "sitemap.rest_namespace",
            "namespace must not be empty",
        ));
    }

    let virtual_path = sitemap
        .virtual_path
        .unwrap_or_else(|| DEFAULT_VIRTUAL_PATH.to_string())
        .trim()
        .to_string();
    if !virtual_path.starts_with('/') || virtual_path.len() < 2 {
        return Err(LoadError::invalid(
            "sitemap.virtual_path",
            "path must start with `/` and name a resource",
        ));
    }

    let query_var = sitemap
        .query_var
        .unwrap_or_else(|| DEFAULT_QUERY_VAR.to_string());
    if query_var.is_empty()
        || !query_var
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
    {
        return Err(LoadError::invalid(
            "sitemap.query_var",
            "expected a non-empty name of letters, digits, `_` or `-`",
        ));
    }

    Ok(SitemapSettings {
        cache_enabled: sitemap.cache_enabled.unwrap_or(true),
        cache_ttl: Duration::from_secs(ttl_secs),
        rest_namespace,
        virtual_path,
        query_var,
        availability_recheck: Duration::from_secs(
            sitemap
                .availability_recheck_seconds
                .unwrap_or(DEFAULT_AVAILABILITY_RECHECK_SECS),
        ),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawDatabaseSettings {
    url: Option<String>,
    max_connections: Option<u32>,
    table_prefix: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawForumSettings {
    site_url: Option<String>,
    home_url: Option<String>,
    location_url: Option<String>,
    pretty_permalinks: Option<bool>,
    view_name_forum: Option<String>,
    view_name_topic: Option<String>,
    posts_per_page: Option<u32>,
    timezone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSitemapSettings {
    cache_enabled: Option<bool>,
    cache_ttl_seconds: Option<u64>,
    rest_namespace: Option<String>,
    virtual_path: Option<String>,
    query_var: Option<String>,
    availability_recheck_seconds: Option<u64>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn validate_url(value: &str, key: &'static str) -> Result<(), LoadError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|err| LoadError::invalid(key, format!("invalid URL `{value}`: {err}")))
}

fn view_name(
    value: Option<String>,
    default: &str,
    key: &'static str,
) -> Result<String, LoadError> {
    let name = non_blank(value).unwrap_or_else(|| default.to_string());
    if name.contains('/') {
        return Err(LoadError::invalid(key, "view name must not contain `/`"));
    }
    Ok(name)
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

#[cfg(test)]
mod tests;
